//! Fan-in of independent event sources.
//!
//! Every source gets its own producer task feeding one channel. Order is
//! kept per source; across sources it follows arrival. The first error
//! closes the merge: it is handed to the reader and all producers are
//! aborted, which drops (and closes) their sources.

use rerun_core::{ChangeEvent, WatchError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::watcher::EventSource;

const MERGE_BUFFER: usize = 256;

pub struct MergedEvents {
	rx: mpsc::Receiver<Result<ChangeEvent, WatchError>>,
	producers: JoinSet<()>,
	closed: bool,
}

/// Must be called from within a tokio runtime.
pub fn merge<S: EventSource>(sources: Vec<S>) -> MergedEvents {
	let (tx, rx) = mpsc::channel(MERGE_BUFFER);
	let mut producers = JoinSet::new();

	for (index, mut source) in sources.into_iter().enumerate() {
		let tx = tx.clone();
		producers.spawn(async move {
			while let Some(item) = source.next_event().await {
				let failed = item.is_err();
				if tx.send(item).await.is_err() || failed {
					return;
				}
			}
			tracing::debug!("event source {} ended", index);
		});
	}

	MergedEvents {
		rx,
		producers,
		closed: false,
	}
}

impl MergedEvents {
	/// `None` once every source has ended, or after an error was returned.
	pub async fn next(&mut self) -> Option<Result<ChangeEvent, WatchError>> {
		if self.closed {
			return None;
		}
		match self.rx.recv().await {
			Some(Ok(event)) => Some(Ok(event)),
			Some(Err(e)) => {
				self.close();
				Some(Err(e))
			}
			None => {
				self.closed = true;
				None
			}
		}
	}

	pub fn close(&mut self) {
		self.closed = true;
		self.producers.abort_all();
		self.rx.close();
	}
}

impl EventSource for MergedEvents {
	async fn next_event(&mut self) -> Option<Result<ChangeEvent, WatchError>> {
		self.next().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rerun_core::ChangeKind;
	use std::path::PathBuf;
	use std::time::Duration;

	type Tx = mpsc::Sender<Result<ChangeEvent, WatchError>>;
	type Rx = mpsc::Receiver<Result<ChangeEvent, WatchError>>;

	fn source() -> (Tx, Rx) {
		mpsc::channel(16)
	}

	fn ev(path: &str) -> ChangeEvent {
		ChangeEvent::new(ChangeKind::Modified, path)
	}

	#[tokio::test]
	async fn merges_all_events_and_keeps_per_source_order() {
		let (tx_a, rx_a) = source();
		let (tx_b, rx_b) = source();
		let mut merged = merge(vec![rx_a, rx_b]);

		for i in 0..5 {
			tx_a.send(Ok(ev(&format!("/a/{}", i)))).await.unwrap();
			tx_b.send(Ok(ev(&format!("/b/{}", i)))).await.unwrap();
		}
		drop(tx_a);
		drop(tx_b);

		let mut from_a = Vec::new();
		let mut from_b = Vec::new();
		while let Some(item) = merged.next().await {
			let path = item.unwrap().path.unwrap();
			if path.starts_with("/a") {
				from_a.push(path);
			} else {
				from_b.push(path);
			}
		}

		let expect = |root: &str| (0..5).map(|i| PathBuf::from(format!("/{}/{}", root, i))).collect::<Vec<_>>();
		assert_eq!(from_a, expect("a"));
		assert_eq!(from_b, expect("b"));
	}

	#[tokio::test]
	async fn ends_only_when_every_source_ends() {
		let (tx_a, rx_a) = source();
		let (tx_b, rx_b) = source();
		let mut merged = merge(vec![rx_a, rx_b]);

		drop(tx_a);
		let pending = tokio::time::timeout(Duration::from_millis(100), merged.next()).await;
		assert!(pending.is_err(), "merge ended while a source was still open");

		tx_b.send(Ok(ev("/b/x"))).await.unwrap();
		drop(tx_b);
		assert_eq!(merged.next().await.unwrap().unwrap(), ev("/b/x"));
		assert!(merged.next().await.is_none());
	}

	#[tokio::test]
	async fn first_failure_closes_the_merge() {
		let (tx_a, rx_a) = source();
		let (tx_b, rx_b) = source();
		let mut merged = merge(vec![rx_a, rx_b]);

		tx_a.send(Err(WatchError::StreamFailed {
			path: "/a".into(),
			message: "queue overflow".into(),
		}))
		.await
		.unwrap();

		match merged.next().await {
			Some(Err(WatchError::StreamFailed { path, .. })) => assert_eq!(path, PathBuf::from("/a")),
			other => panic!("expected failure, got {:?}", other),
		}
		assert!(merged.next().await.is_none());

		// The other producer was aborted, so its source is dropped.
		tokio::time::timeout(Duration::from_secs(1), tx_b.closed())
			.await
			.expect("source b still being consumed");
	}

	#[tokio::test]
	async fn no_sources_ends_immediately() {
		let mut merged = merge(Vec::<Rx>::new());
		assert!(merged.next().await.is_none());
	}
}
