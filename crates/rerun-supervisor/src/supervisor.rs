use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use rerun_core::{ConfigError, PipelineConfig, RestartPolicy, SpawnError, Trigger};
use tokio::process::{Child, Command};

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
	pub restart: RestartPolicy,
	pub kill_grace: Duration,
	pub kill_on_exit: bool,
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		Self {
			restart: RestartPolicy::Overlap,
			kill_grace: Duration::from_secs(3),
			kill_on_exit: true,
		}
	}
}

impl From<&PipelineConfig> for SupervisorConfig {
	fn from(cfg: &PipelineConfig) -> Self {
		Self {
			restart: cfg.restart,
			kill_grace: cfg.kill_grace,
			kill_on_exit: cfg.kill_on_exit,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
	pub spawned: u64,
	pub spawn_failures: u64,
}

pub struct RunningProcess {
	pub pid: u32,
	pub started_at: Instant,
	own_group: bool,
	child: Child,
}

impl RunningProcess {
	/// Exit status if the process already finished. Reaps it.
	pub fn try_status(&mut self) -> Option<ExitStatus> {
		self.child.try_wait().ok().flatten()
	}

	pub async fn wait(&mut self) -> io::Result<ExitStatus> {
		self.child.wait().await
	}

	fn signal(&self, signal: Signal) {
		if self.own_group {
			signal_process_tree(self.pid, signal);
		} else {
			let _ = kill(Pid::from_raw(self.pid as i32), signal);
		}
	}
}

/// Owns the single "current run" slot. Driven from one task only.
pub struct ProcessSupervisor {
	program: String,
	args: Vec<String>,
	config: SupervisorConfig,
	current: Option<RunningProcess>,
	stats: SupervisorStats,
}

impl ProcessSupervisor {
	pub fn new(command: &[String], config: SupervisorConfig) -> Result<Self, ConfigError> {
		let (program, args) = command.split_first().ok_or(ConfigError::EmptyCommand)?;
		if program.is_empty() {
			return Err(ConfigError::EmptyCommand);
		}
		Ok(Self {
			program: program.clone(),
			args: args.to_vec(),
			config,
			current: None,
			stats: SupervisorStats::default(),
		})
	}

	pub fn from_pipeline(cfg: &PipelineConfig) -> Result<Self, ConfigError> {
		Self::new(&cfg.command, SupervisorConfig::from(cfg))
	}

	pub fn command_line(&self) -> String {
		std::iter::once(&self.program)
			.chain(self.args.iter())
			.map(|s| s.as_str())
			.collect::<Vec<_>>()
			.join(" ")
	}

	pub fn current(&self) -> Option<&RunningProcess> {
		self.current.as_ref()
	}

	pub fn current_mut(&mut self) -> Option<&mut RunningProcess> {
		self.current.as_mut()
	}

	pub fn current_pid(&self) -> Option<u32> {
		self.current.as_ref().map(|p| p.pid)
	}

	pub fn stats(&self) -> SupervisorStats {
		self.stats
	}

	/// Does not wait for the child. On failure the slot keeps whatever it
	/// held (nothing, under `KillPrevious`).
	///
	/// Not cancel-safe while a previous run is being stopped: follow a dropped
	/// call with [`ProcessSupervisor::kill_current`] or `shutdown`.
	pub async fn on_trigger(&mut self, trigger: &Trigger) -> Result<u32, SpawnError> {
		tracing::debug!("trigger: {}", trigger.cause);

		self.reap_current();

		if self.config.restart.kills_previous() {
			// stays in the slot while stopping so `kill_current` can reach it
			if let Some(previous) = self.current.as_mut() {
				terminate(previous, self.config.kill_grace).await;
			}
			self.current = None;
		}

		let (child, pid) = match self.spawn() {
			Ok(spawned) => spawned,
			Err(e) => {
				self.stats.spawn_failures += 1;
				let err = SpawnError::SpawnFailed {
					command: self.command_line(),
					message: e.to_string(),
				};
				tracing::error!("{}", err);
				return Err(err);
			}
		};

		self.stats.spawned += 1;
		tracing::info!("started `{}` (pid {})", self.command_line(), pid);

		self.current = Some(RunningProcess {
			pid,
			started_at: Instant::now(),
			own_group: self.config.restart.kills_previous(),
			child,
		});

		Ok(pid)
	}

	pub async fn shutdown(&mut self) {
		self.reap_current();
		if !self.config.kill_on_exit {
			if let Some(running) = self.current.take() {
				tracing::info!("leaving pid {} running", running.pid);
			}
			return;
		}
		if let Some(running) = self.current.as_mut() {
			terminate(running, self.config.kill_grace).await;
		}
		self.current = None;
	}

	/// SIGKILL for the current run, no grace period.
	pub async fn kill_current(&mut self) {
		let Some(mut running) = self.current.take() else {
			return;
		};
		if running.try_status().is_some() {
			return;
		}
		tracing::warn!("killing pid {}", running.pid);
		running.signal(Signal::SIGKILL);
		if let Err(e) = running.wait().await {
			tracing::warn!("failed to wait for pid {}: {}", running.pid, e);
		}
	}

	fn spawn(&self) -> io::Result<(Child, u32)> {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args)
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit());

		// Own group so the whole tree can be signalled on replacement.
		if self.config.restart.kills_previous() {
			cmd.process_group(0);
		}

		let child = cmd.spawn()?;
		let pid = child_pid(&child)?;
		Ok((child, pid))
	}

	/// Logs and clears the slot if the current run already exited.
	fn reap_current(&mut self) {
		let exited = match self.current.as_mut() {
			Some(running) => running.try_status().map(|status| (running.pid, running.started_at, status)),
			None => None,
		};
		if let Some((pid, started_at, status)) = exited {
			tracing::info!(
				"pid {} exited ({}) after {:.1}s",
				pid,
				describe_status(&status),
				started_at.elapsed().as_secs_f64()
			);
			self.current = None;
		}
	}
}

/// SIGTERM, wait up to `grace`, then SIGKILL.
async fn terminate(running: &mut RunningProcess, grace: Duration) {
	if let Some(status) = running.try_status() {
		tracing::debug!("pid {} already exited ({})", running.pid, describe_status(&status));
		return;
	}

	tracing::info!("stopping pid {}", running.pid);
	running.signal(Signal::SIGTERM);

	match tokio::time::timeout(grace, running.wait()).await {
		Ok(Ok(status)) => {
			tracing::debug!("pid {} stopped ({})", running.pid, describe_status(&status));
		}
		Ok(Err(e)) => {
			tracing::warn!("failed to wait for pid {}: {}", running.pid, e);
		}
		Err(_) => {
			tracing::warn!("pid {} ignored SIGTERM for {:?}, killing", running.pid, grace);
			running.signal(Signal::SIGKILL);
			let _ = running.wait().await;
		}
	}
}

// pid 0 would make kill/killpg hit our own process group
fn child_pid(child: &Child) -> io::Result<u32> {
	match child.id() {
		Some(pid) if pid != 0 => Ok(pid),
		_ => Err(io::Error::other("child exited before its pid was read")),
	}
}

fn describe_status(status: &ExitStatus) -> String {
	match status.code() {
		Some(code) => format!("exit {}", code),
		None => "killed by signal".into(),
	}
}

pub fn signal_process_tree(pid: u32, signal: Signal) {
	let pgid = Pid::from_raw(pid as i32);
	let _ = killpg(pgid, signal);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cmd(parts: &[&str]) -> Vec<String> {
		parts.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn empty_command_fails_fast() {
		assert_eq!(
			ProcessSupervisor::new(&[], SupervisorConfig::default()).err(),
			Some(ConfigError::EmptyCommand)
		);
		assert_eq!(
			ProcessSupervisor::new(&cmd(&[""]), SupervisorConfig::default()).err(),
			Some(ConfigError::EmptyCommand)
		);
	}

	#[test]
	fn command_line_joins_program_and_args() {
		let sup = ProcessSupervisor::new(&cmd(&["cargo", "test", "--", "--nocapture"]), SupervisorConfig::default())
			.unwrap();
		assert_eq!(sup.command_line(), "cargo test -- --nocapture");
		assert!(sup.current().is_none());
		assert_eq!(sup.stats(), SupervisorStats::default());
	}

	#[tokio::test]
	async fn reaped_child_has_no_pid() {
		let mut child = Command::new("true").spawn().unwrap();
		assert!(child_pid(&child).unwrap() > 0);

		child.wait().await.unwrap();
		let err = child_pid(&child).unwrap_err();
		assert_eq!(err.to_string(), "child exited before its pid was read");
	}

	#[tokio::test]
	async fn kill_current_skips_grace() {
		let config = SupervisorConfig {
			restart: RestartPolicy::KillPrevious,
			kill_grace: Duration::from_secs(30),
			kill_on_exit: true,
		};
		let mut sup = ProcessSupervisor::new(&cmd(&["sh", "-c", "trap '' TERM; sleep 30"]), config).unwrap();
		let trigger = Trigger {
			cause: rerun_core::ChangeEvent::without_path(rerun_core::ChangeKind::Unknown),
		};
		sup.on_trigger(&trigger).await.unwrap();

		let started = Instant::now();
		sup.kill_current().await;
		assert!(sup.current().is_none());
		assert!(started.elapsed() < Duration::from_secs(5));
	}

	#[test]
	fn describe_exit_codes() {
		use std::os::unix::process::ExitStatusExt;
		assert_eq!(describe_status(&ExitStatus::from_raw(0)), "exit 0");
		assert_eq!(describe_status(&ExitStatus::from_raw(256)), "exit 1");
		assert_eq!(describe_status(&ExitStatus::from_raw(9)), "killed by signal");
	}
}
