//! Error taxonomy shared by the watch, supervisor and CLI crates.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
	#[error("no command given")]
	EmptyCommand,

	#[error("no paths to watch")]
	NoRoots,

	#[error("invalid delay {value}: must be a finite number of seconds >= 0")]
	InvalidDelay { value: f64 },

	#[error("cannot resolve {path}: {message}")]
	InvalidRoot { path: PathBuf, message: String },

	#[error("failed to parse {path}: {message}")]
	ParseFile { path: PathBuf, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WatchError {
	#[error("cannot watch {path}: {message}")]
	SetupFailed { path: PathBuf, message: String },

	#[error("watch on {path} failed: {message}")]
	StreamFailed { path: PathBuf, message: String },
}

/// A single trigger could not start the command. Never fatal to the pipeline.
#[derive(Error, Debug)]
pub enum SpawnError {
	#[error("failed to spawn `{command}`: {message}")]
	SpawnFailed { command: String, message: String },
}

#[derive(Error, Debug)]
pub enum RerunError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Watch(#[from] WatchError),

	#[error(transparent)]
	Spawn(#[from] SpawnError),
}
