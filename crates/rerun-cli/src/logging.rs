//! Diagnostics go to stderr through `tracing`; stdout is reserved for the
//! event lines and the `Watching:` block.
//!
//! `RUST_LOG` takes precedence over the config file:
//! ```bash
//! RUST_LOG=rerun_watch=trace rerun cargo check
//! ```

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// `verbose` raises the level to at least `info`.
pub fn init(log_level: &str, verbose: bool) {
	let filter = if std::env::var("RUST_LOG").is_ok() {
		EnvFilter::from_default_env()
	} else {
		EnvFilter::new(level(log_level, verbose).to_string())
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn level(log_level: &str, verbose: bool) -> LevelFilter {
	let base = log_level.parse().unwrap_or(LevelFilter::WARN);
	if verbose {
		base.max(LevelFilter::INFO)
	} else {
		base
	}
}
