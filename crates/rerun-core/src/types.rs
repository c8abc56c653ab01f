use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
	Created,
	Modified,
	Renamed,
	Deleted,
	Unknown,
}

impl ChangeKind {
	pub fn label(&self) -> &'static str {
		match self {
			ChangeKind::Created => "CREATED",
			ChangeKind::Modified => "MODIFIED",
			ChangeKind::Renamed => "RENAMED",
			ChangeKind::Deleted => "DELETED",
			ChangeKind::Unknown => "UNKNOWN",
		}
	}
}

impl fmt::Display for ChangeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
	pub kind: ChangeKind,
	pub path: Option<PathBuf>,
}

impl ChangeEvent {
	pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
		Self {
			kind,
			path: Some(path.into()),
		}
	}

	pub fn without_path(kind: ChangeKind) -> Self {
		Self { kind, path: None }
	}
}

impl fmt::Display for ChangeEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.path {
			Some(path) => write!(f, "{}\t{}", self.kind, path.display()),
			None => write!(f, "{}\t", self.kind),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
	pub cause: ChangeEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
	#[default]
	Overlap,
	#[serde(alias = "kill")]
	KillPrevious,
}

impl RestartPolicy {
	pub fn kills_previous(&self) -> bool {
		matches!(self, RestartPolicy::KillPrevious)
	}
}
