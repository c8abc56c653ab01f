//! # rerun-supervisor
//!
//! Runs the watched command once per trigger and keeps the handle of the
//! latest run. What happens to a run that is still alive when the next
//! trigger arrives is a [`RestartPolicy`](rerun_core::RestartPolicy):
//! leave it running (`Overlap`) or stop its process group first
//! (`KillPrevious`).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rerun_core::{ChangeEvent, ChangeKind, RestartPolicy, Trigger};
//! use rerun_supervisor::{ProcessSupervisor, SupervisorConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut sup = ProcessSupervisor::new(
//!     &["cargo".into(), "test".into()],
//!     SupervisorConfig {
//!         restart: RestartPolicy::KillPrevious,
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//!
//! let trigger = Trigger { cause: ChangeEvent::new(ChangeKind::Modified, "/src/lib.rs") };
//! sup.on_trigger(&trigger).await.unwrap();
//! sup.shutdown().await;
//! # }
//! ```

pub mod supervisor;

pub use supervisor::{
	signal_process_tree, ProcessSupervisor, RunningProcess, SupervisorConfig, SupervisorStats,
};
