pub mod config;
pub mod error;
pub mod types;

pub use config::{GlobalConfig, PipelineConfig};
pub use error::{ConfigError, RerunError, SpawnError, WatchError};
pub use types::*;
