use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rerun_core::config::resolve_root;
use rerun_core::{ChangeEvent, ChangeKind, WatchError};
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;

/// After yielding an `Err` a source is finished and is not polled again.
pub trait EventSource: Send + 'static {
	fn next_event(&mut self) -> impl Future<Output = Option<Result<ChangeEvent, WatchError>>> + Send;
}

impl EventSource for mpsc::Receiver<Result<ChangeEvent, WatchError>> {
	async fn next_event(&mut self) -> Option<Result<ChangeEvent, WatchError>> {
		self.recv().await
	}
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
	pub recursive: bool,
}

impl Default for WatchOptions {
	fn default() -> Self {
		Self { recursive: true }
	}
}

#[derive(Debug, Clone)]
pub struct PathWatcher {
	root: PathBuf,
	options: WatchOptions,
}

impl PathWatcher {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self::with_options(root, WatchOptions::default())
	}

	pub fn with_options(root: impl Into<PathBuf>, options: WatchOptions) -> Self {
		Self {
			root: root.into(),
			options,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn subscribe(&self) -> Result<WatchStream, WatchError> {
		let (tx, rx) = mpsc::channel(EVENT_BUFFER);

		let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
			let _ = tx.blocking_send(res);
		})
		.map_err(|e| setup_failed(&self.root, e))?;

		let mode = if self.options.recursive {
			RecursiveMode::Recursive
		} else {
			RecursiveMode::NonRecursive
		};
		watcher.watch(&self.root, mode).map_err(|e| setup_failed(&self.root, e))?;

		tracing::debug!("watching {}", self.root.display());

		Ok(WatchStream {
			root: self.root.clone(),
			rx,
			queued: VecDeque::new(),
			started: false,
			finished: false,
			_watcher: Some(watcher),
		})
	}
}

// dropping it closes the native handle
pub struct WatchStream {
	root: PathBuf,
	rx: mpsc::Receiver<notify::Result<Event>>,
	queued: VecDeque<ChangeEvent>,
	started: bool,
	finished: bool,
	_watcher: Option<RecommendedWatcher>,
}

impl WatchStream {
	#[cfg(test)]
	fn from_receiver(root: impl Into<PathBuf>, rx: mpsc::Receiver<notify::Result<Event>>) -> Self {
		Self {
			root: root.into(),
			rx,
			queued: VecDeque::new(),
			started: false,
			finished: false,
			_watcher: None,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Next event, `None` once the stream is over. A native error before any
	/// event was yielded is reported as `SetupFailed`, later ones as `StreamFailed`.
	pub async fn next(&mut self) -> Option<Result<ChangeEvent, WatchError>> {
		loop {
			if let Some(event) = self.queued.pop_front() {
				return Some(Ok(event));
			}
			if self.finished {
				return None;
			}

			match self.rx.recv().await {
				Some(Ok(event)) => {
					tracing::trace!("{:?} {:?}", event.kind, event.paths);
					let changes = classify(&self.root, event);
					self.started |= !changes.is_empty();
					self.queued.extend(changes);
				}
				Some(Err(e)) => {
					self.finished = true;
					let message = e.to_string();
					let path = self.root.clone();
					return Some(Err(if self.started {
						WatchError::StreamFailed { path, message }
					} else {
						WatchError::SetupFailed { path, message }
					}));
				}
				None => {
					self.finished = true;
					return None;
				}
			}
		}
	}
}

impl EventSource for WatchStream {
	async fn next_event(&mut self) -> Option<Result<ChangeEvent, WatchError>> {
		self.next().await
	}
}

fn setup_failed(root: &Path, err: notify::Error) -> WatchError {
	WatchError::SetupFailed {
		path: root.to_path_buf(),
		message: err.to_string(),
	}
}

pub(crate) fn classify(root: &Path, event: Event) -> Vec<ChangeEvent> {
	let kind = match event.kind {
		// reads by the command itself must not retrigger it
		EventKind::Access(_) => return Vec::new(),
		EventKind::Create(_) => ChangeKind::Created,
		EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
		EventKind::Modify(_) => ChangeKind::Modified,
		EventKind::Remove(_) => ChangeKind::Deleted,
		EventKind::Any | EventKind::Other => ChangeKind::Unknown,
	};

	if event.paths.is_empty() {
		return vec![ChangeEvent::without_path(kind)];
	}

	event
		.paths
		.iter()
		.map(|p| ChangeEvent::new(kind, resolve_root(root, p)))
		.collect()
}
