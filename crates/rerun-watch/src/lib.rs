//! # rerun-watch
//!
//! Watch several directory trees as one event stream and collapse bursts
//! of changes into triggers.
//!
//! ```text
//! PathWatcher(root 1) --\
//! PathWatcher(root 2) ---+--> merge --> Debouncer --> Trigger
//! PathWatcher(root N) --/
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use rerun_watch::{watch_all, Debouncer, WatchOptions};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let roots = vec!["/tmp/a".into(), "/tmp/b".into()];
//! let events = watch_all(&roots, WatchOptions::default()).unwrap();
//! let mut debouncer = Debouncer::new(events, Duration::from_millis(100));
//!
//! while let Some(Ok(trigger)) = debouncer.next_trigger().await {
//!     println!("{}", trigger.cause);
//! }
//! # }
//! ```

mod debounce;
mod merge;
mod watcher;

use std::path::PathBuf;

use rerun_core::WatchError;

pub use debounce::Debouncer;
pub use merge::{merge, MergedEvents};
pub use watcher::{EventSource, PathWatcher, WatchOptions, WatchStream};

/// Opens one watch per root and merges them.
///
/// All roots must be watchable: on the first failure every handle opened so
/// far is closed and the error is returned.
pub fn watch_all(roots: &[PathBuf], options: WatchOptions) -> Result<MergedEvents, WatchError> {
	let mut streams = Vec::with_capacity(roots.len());
	for root in roots {
		streams.push(PathWatcher::with_options(root.clone(), options).subscribe()?);
	}
	Ok(merge(streams))
}
