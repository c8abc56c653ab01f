use crate::error::ConfigError;
use crate::types::RestartPolicy;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DELAY_SECS: f64 = 0.1;

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
	#[serde(default = "default_delay")]
	pub delay: f64,
	#[serde(default)]
	pub restart: RestartPolicy,
	#[serde(default = "default_kill_grace")]
	pub kill_grace_secs: u64,
	#[serde(default = "default_true")]
	pub kill_on_exit: bool,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

impl Default for GlobalConfig {
	fn default() -> Self {
		Self {
			delay: default_delay(),
			restart: RestartPolicy::default(),
			kill_grace_secs: default_kill_grace(),
			kill_on_exit: true,
			log_level: default_log_level(),
		}
	}
}

fn default_delay() -> f64 {
	DEFAULT_DELAY_SECS
}
fn default_kill_grace() -> u64 {
	3
}
fn default_true() -> bool {
	true
}
fn default_log_level() -> String {
	"warn".into()
}

impl GlobalConfig {
	pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseFile {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
			path: path.to_path_buf(),
			message: e.to_string(),
		})
	}
}

/// Loads `config.toml` from the config dir. A missing file yields defaults;
/// an unreadable one is reported on stderr and also yields defaults.
pub fn load_global_config() -> GlobalConfig {
	let path = config_dir().join("config.toml");
	if path.exists() {
		match GlobalConfig::load_from(&path) {
			Ok(config) => return config,
			Err(e) => eprintln!("warning: {}", e),
		}
	}
	GlobalConfig::default()
}

pub fn config_dir() -> PathBuf {
	if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
		PathBuf::from(dir).join("rerun")
	} else if let Some(home) = home_dir() {
		home.join(".config").join("rerun")
	} else {
		PathBuf::from("/tmp/rerun/config")
	}
}

fn home_dir() -> Option<PathBuf> {
	std::env::var("HOME").ok().map(PathBuf::from)
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
	pub roots: Vec<PathBuf>,
	pub command: Vec<String>,
	pub debounce: Duration,
	pub verbose: bool,
	pub restart: RestartPolicy,
	pub kill_grace: Duration,
	pub kill_on_exit: bool,
}

impl PipelineConfig {
	pub fn new(roots: Vec<PathBuf>, command: Vec<String>, delay_secs: f64) -> Result<Self, ConfigError> {
		let cwd = std::env::current_dir().map_err(|e| ConfigError::InvalidRoot {
			path: PathBuf::from("."),
			message: e.to_string(),
		})?;
		Self::with_base(&cwd, roots, command, delay_secs)
	}

	pub fn with_base(
		base: &Path,
		roots: Vec<PathBuf>,
		command: Vec<String>,
		delay_secs: f64,
	) -> Result<Self, ConfigError> {
		if command.is_empty() || command[0].is_empty() {
			return Err(ConfigError::EmptyCommand);
		}

		let debounce = delay_from_secs(delay_secs)?;

		let mut resolved: Vec<PathBuf> = Vec::with_capacity(roots.len());
		for root in &roots {
			let abs = resolve_root(base, root);
			if !resolved.contains(&abs) {
				resolved.push(abs);
			}
		}
		if resolved.is_empty() {
			return Err(ConfigError::NoRoots);
		}

		Ok(Self {
			roots: resolved,
			command,
			debounce,
			verbose: false,
			restart: RestartPolicy::default(),
			kill_grace: Duration::from_secs(default_kill_grace()),
			kill_on_exit: true,
		})
	}

	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	pub fn restart(mut self, policy: RestartPolicy) -> Self {
		self.restart = policy;
		self
	}

	pub fn kill_grace(mut self, grace: Duration) -> Self {
		self.kill_grace = grace;
		self
	}

	pub fn kill_on_exit(mut self, kill: bool) -> Self {
		self.kill_on_exit = kill;
		self
	}
}

pub fn delay_from_secs(secs: f64) -> Result<Duration, ConfigError> {
	Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDelay { value: secs })
}

// lexical only, symlinks are left alone
pub fn resolve_root(base: &Path, path: &Path) -> PathBuf {
	let joined = if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	};

	let mut out = PathBuf::new();
	for component in joined.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let at_root = matches!(
					out.components().next_back(),
					None | Some(Component::RootDir) | Some(Component::Prefix(_))
				);
				if !at_root {
					out.pop();
				}
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}
