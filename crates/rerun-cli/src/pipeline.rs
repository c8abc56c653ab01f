use std::io::{self, Write};

use rerun_core::{ConfigError, PipelineConfig, WatchError};
use rerun_supervisor::ProcessSupervisor;
use rerun_watch::{watch_all, Debouncer, WatchOptions};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
	pub triggers: u64,
	pub spawned: u64,
	pub spawn_failures: u64,
}

/// roots -> watchers -> merge -> debounce -> supervisor, stopped as a unit
/// through a [`CancellationToken`]. The `Watching:` block and one line per
/// trigger go to `out`.
pub struct Pipeline<W = io::Stdout> {
	config: PipelineConfig,
	supervisor: ProcessSupervisor,
	out: W,
}

impl Pipeline {
	pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
		Self::with_output(config, io::stdout())
	}
}

impl<W: Write> Pipeline<W> {
	pub fn with_output(config: PipelineConfig, out: W) -> Result<Self, ConfigError> {
		let supervisor = ProcessSupervisor::from_pipeline(&config)?;
		Ok(Self {
			config,
			supervisor,
			out,
		})
	}

	fn emit(&mut self, text: &str) {
		let written = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush());
		if let Err(e) = written {
			tracing::warn!("failed to write output: {}", e);
		}
	}

	/// Runs until `cancel` fires (a clean stop) or a watch fails.
	///
	/// Spawn failures are logged and counted; they never end the run.
	pub async fn run(mut self, cancel: CancellationToken) -> Result<PipelineReport, WatchError> {
		if self.config.verbose {
			let mut block = String::from("Watching:\n");
			for root in &self.config.roots {
				block.push_str(&format!("{}\n", root.display()));
			}
			block.push('\n');
			self.emit(&block);
		}

		let events = watch_all(&self.config.roots, WatchOptions::default())?;
		let mut debouncer = Debouncer::new(events, self.config.debounce);
		tracing::info!(
			"watching {} root(s), delay {:?}, policy {:?}",
			self.config.roots.len(),
			self.config.debounce,
			self.config.restart
		);

		let mut triggers = 0;
		let result = loop {
			let next = tokio::select! {
				_ = cancel.cancelled() => break Ok(()),
				next = debouncer.next_trigger() => next,
			};

			match next {
				Some(Ok(trigger)) => {
					triggers += 1;
					self.emit(&format!("{}\n", trigger.cause));
					// spawn errors are already logged by the supervisor
					// only a pending stop of the previous run can be interrupted
					let cancelled = tokio::select! {
						biased;
						_ = self.supervisor.on_trigger(&trigger) => false,
						_ = cancel.cancelled() => true,
					};
					if cancelled {
						// the run being replaced gets no further grace
						self.supervisor.kill_current().await;
						break Ok(());
					}
				}
				Some(Err(e)) => break Err(e),
				None => break Ok(()),
			}
		};

		// closes every native watch and the pending timer
		drop(debouncer);
		self.supervisor.shutdown().await;

		let stats = self.supervisor.stats();
		let report = PipelineReport {
			triggers,
			spawned: stats.spawned,
			spawn_failures: stats.spawn_failures,
		};
		tracing::info!(
			"stopped after {} trigger(s), {} run(s), {} spawn failure(s)",
			report.triggers,
			report.spawned,
			report.spawn_failures
		);

		result.map(|_| report)
	}
}
