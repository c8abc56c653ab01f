//! Sliding-window debouncing of change events into triggers.
//!
//! One timer is pending at most. Every event replaces it with a fresh
//! `window` timer, so a stream of events closer together than `window`
//! never fires; the trigger comes `window` after the last one. The last
//! event of the burst is reported as the trigger's cause.

use std::pin::Pin;
use std::time::Duration;

use rerun_core::{ChangeEvent, Trigger, WatchError};
use tokio::time::{sleep, Sleep};

use crate::watcher::EventSource;

pub struct Debouncer<S> {
	source: S,
	window: Duration,
	pending: Option<ChangeEvent>,
	timer: Option<Pin<Box<Sleep>>>,
	exhausted: bool,
}

enum Step {
	Elapsed,
	Event(Option<Result<ChangeEvent, WatchError>>),
}

impl<S: EventSource> Debouncer<S> {
	pub fn new(source: S, window: Duration) -> Self {
		Self {
			source,
			window,
			pending: None,
			timer: None,
			exhausted: false,
		}
	}

	pub fn has_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Waits for the next settled burst. Cancel-safe: dropping the future
	/// keeps the pending window intact.
	///
	/// When the source ends, a pending burst is flushed first. A source error
	/// discards the pending burst and is returned as is.
	pub async fn next_trigger(&mut self) -> Option<Result<Trigger, WatchError>> {
		if self.exhausted {
			return None;
		}

		loop {
			let step = match self.timer.as_mut() {
				Some(timer) => tokio::select! {
					biased;
					_ = timer => Step::Elapsed,
					item = self.source.next_event() => Step::Event(item),
				},
				None => Step::Event(self.source.next_event().await),
			};

			match step {
				Step::Elapsed => {
					self.timer = None;
					if let Some(cause) = self.pending.take() {
						return Some(Ok(Trigger { cause }));
					}
				}
				Step::Event(Some(Ok(event))) => {
					if self.window.is_zero() {
						return Some(Ok(Trigger { cause: event }));
					}
					tracing::trace!("debounce restarted by {}", event);
					self.pending = Some(event);
					self.timer = Some(Box::pin(sleep(self.window)));
				}
				Step::Event(Some(Err(e))) => {
					self.exhausted = true;
					self.timer = None;
					self.pending = None;
					return Some(Err(e));
				}
				Step::Event(None) => {
					self.exhausted = true;
					self.timer = None;
					return self.pending.take().map(|cause| Ok(Trigger { cause }));
				}
			}
		}
	}
}
