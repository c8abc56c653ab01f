use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rerun_core::{ConfigError, GlobalConfig, PipelineConfig, RestartPolicy};

#[derive(Debug, Parser)]
#[command(name = "rerun", version, about = "Run command on files change")]
pub struct Cli {
	/// Paths to watch. Defaults to current directory.
	#[arg(short = 'p', long = "path", value_name = "DIR", default_value = "./")]
	pub paths: Vec<PathBuf>,

	/// Delay in seconds before rerunning the command.
	#[arg(short, long, value_name = "SECS", allow_negative_numbers = true)]
	pub delay: Option<f64>,

	/// Print resolved paths that are being watched.
	#[arg(short, long)]
	pub verbose: bool,

	/// Stop the previous run (SIGTERM, then SIGKILL) before starting the next.
	#[arg(short, long, conflicts_with = "overlap")]
	pub kill: bool,

	/// Start the next run even if the previous one is still going.
	#[arg(long)]
	pub overlap: bool,

	/// Seconds between SIGTERM and SIGKILL when stopping a run.
	#[arg(long, value_name = "SECS")]
	pub grace: Option<u64>,

	/// Command to execute when files change
	#[arg(
		value_name = "COMMAND",
		required = true,
		trailing_var_arg = true,
		allow_hyphen_values = true
	)]
	pub command: Vec<String>,
}

impl Cli {
	/// Flags win over the config file, which wins over built-in defaults.
	pub fn pipeline_config(&self, global: &GlobalConfig) -> Result<PipelineConfig, ConfigError> {
		let delay = self.delay.unwrap_or(global.delay);
		let restart = if self.kill {
			RestartPolicy::KillPrevious
		} else if self.overlap {
			RestartPolicy::Overlap
		} else {
			global.restart
		};
		let grace = Duration::from_secs(self.grace.unwrap_or(global.kill_grace_secs));

		Ok(PipelineConfig::new(self.paths.clone(), self.command.clone(), delay)?
			.verbose(self.verbose)
			.restart(restart)
			.kill_grace(grace)
			.kill_on_exit(global.kill_on_exit))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> Cli {
		Cli::try_parse_from(std::iter::once("rerun").chain(args.iter().copied())).unwrap()
	}

	#[test]
	fn defaults() {
		let cli = parse(&["make"]);
		assert_eq!(cli.paths, vec![PathBuf::from("./")]);
		assert_eq!(cli.delay, None);
		assert!(!cli.verbose);
		assert_eq!(cli.command, vec!["make".to_string()]);

		let cfg = cli.pipeline_config(&GlobalConfig::default()).unwrap();
		assert_eq!(cfg.roots, vec![std::env::current_dir().unwrap()]);
		assert_eq!(cfg.debounce, Duration::from_millis(100));
		assert_eq!(cfg.restart, RestartPolicy::Overlap);
		assert_eq!(cfg.kill_grace, Duration::from_secs(3));
	}

	#[test]
	fn repeated_paths_and_short_flags() {
		let cli = parse(&["-p", "/tmp/a", "--path", "/tmp/b", "-d", "0.5", "-v", "echo", "hi"]);
		assert_eq!(cli.paths, vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
		assert_eq!(cli.delay, Some(0.5));
		assert!(cli.verbose);
		assert_eq!(cli.command, vec!["echo".to_string(), "hi".to_string()]);
	}

	#[test]
	fn command_keeps_its_own_flags() {
		let cli = parse(&["-p", "src", "cargo", "test", "--release", "-q"]);
		assert_eq!(cli.command, vec!["cargo", "test", "--release", "-q"]);
	}

	#[test]
	fn command_is_required() {
		assert!(Cli::try_parse_from(["rerun", "-p", "src"]).is_err());
	}

	#[test]
	fn kill_and_overlap_conflict() {
		assert!(Cli::try_parse_from(["rerun", "--kill", "--overlap", "make"]).is_err());
	}

	#[test]
	fn flags_override_config_file() {
		let global = GlobalConfig {
			delay: 2.0,
			restart: RestartPolicy::KillPrevious,
			kill_grace_secs: 10,
			..GlobalConfig::default()
		};

		let cfg = parse(&["make"]).pipeline_config(&global).unwrap();
		assert_eq!(cfg.debounce, Duration::from_secs(2));
		assert_eq!(cfg.restart, RestartPolicy::KillPrevious);
		assert_eq!(cfg.kill_grace, Duration::from_secs(10));

		let cfg = parse(&["-d", "0", "--overlap", "--grace", "1", "make"]).pipeline_config(&global).unwrap();
		assert_eq!(cfg.debounce, Duration::ZERO);
		assert_eq!(cfg.restart, RestartPolicy::Overlap);
		assert_eq!(cfg.kill_grace, Duration::from_secs(1));

		let cfg = parse(&["-k", "make"]).pipeline_config(&GlobalConfig::default()).unwrap();
		assert_eq!(cfg.restart, RestartPolicy::KillPrevious);
	}

	#[test]
	fn negative_delay_is_a_config_error() {
		let err = parse(&["-d", "-1", "make"]).pipeline_config(&GlobalConfig::default()).unwrap_err();
		assert_eq!(err, ConfigError::InvalidDelay { value: -1.0 });
	}
}
