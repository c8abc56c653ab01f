mod cli;
mod logging;
mod pipeline;

use std::fmt::Display;
use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use cli::Cli;
use pipeline::Pipeline;

const EXIT_WATCH: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	let global = rerun_core::config::load_global_config();
	logging::init(&global.log_level, cli.verbose);

	let config = match cli.pipeline_config(&global) {
		Ok(c) => c,
		Err(e) => return fail(e, EXIT_CONFIG),
	};
	let pipeline = match Pipeline::new(config) {
		Ok(p) => p,
		Err(e) => return fail(e, EXIT_CONFIG),
	};

	let cancel = CancellationToken::new();
	tokio::spawn(cancel_on_signal(cancel.clone()));

	match pipeline.run(cancel).await {
		Ok(_) => ExitCode::SUCCESS,
		Err(e) => fail(e, EXIT_WATCH),
	}
}

fn fail(err: impl Display, code: u8) -> ExitCode {
	eprintln!("{} {}", "error:".red().bold(), err);
	ExitCode::from(code)
}

/// SIGINT or SIGTERM stops the pipeline.
async fn cancel_on_signal(cancel: CancellationToken) {
	let mut term = match signal(SignalKind::terminate()) {
		Ok(s) => s,
		Err(e) => {
			tracing::warn!("cannot listen for SIGTERM: {}", e);
			let _ = tokio::signal::ctrl_c().await;
			cancel.cancel();
			return;
		}
	};

	tokio::select! {
		_ = tokio::signal::ctrl_c() => {},
		_ = term.recv() => {},
	}
	tracing::info!("shutting down");
	cancel.cancel();
}
