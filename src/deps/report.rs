//! Per-dependency outcomes returned by the manager.
//!
//! The manager never prints; the CLI renders these through [`crate::ui`].

use crate::error::DepsError;
use crate::lock::Dependency;
use crate::spec::DependencyKey;
use std::path::PathBuf;

/// Result of a successful `get`.
#[derive(Debug)]
pub struct GetReport {
    pub key: DependencyKey,
    /// Ref recorded in the lock file (the canonical ref when none was given).
    pub recorded_ref: String,
    pub canonical_ref: String,
    pub sha: String,
    pub path: PathBuf,
    pub warning: Option<DepsError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Present,
    Missing,
}

#[derive(Debug)]
pub enum InstallStatus {
    AlreadyInstalled,
    Installed,
    Failed(DepsError),
}

#[derive(Debug)]
pub enum UpdateStatus {
    UpToDate,
    Updated {
        from: String,
        to: String,
        canonical_ref: String,
    },
    Failed(DepsError),
}

/// One lock file entry and what happened to it.
#[derive(Debug)]
pub struct Entry<S> {
    /// Key as written in the lock file.
    pub key: String,
    pub dependency: Dependency,
    pub status: S,
}

/// Outcome of `check`, `install` or `update` across the targeted entries.
#[derive(Debug)]
pub struct Report<S> {
    pub entries: Vec<Entry<S>>,
    /// Set when the lock file was unreadable and treated as empty.
    pub warning: Option<DepsError>,
}

impl<S> Default for Report<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            warning: None,
        }
    }
}

impl<S> Report<S> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status_of(&self, key: &str) -> Option<&S> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.status)
    }
}

pub type CheckReport = Report<CheckStatus>;
pub type InstallReport = Report<InstallStatus>;

impl CheckReport {
    pub fn all_present(&self) -> bool {
        self.entries.iter().all(|e| e.status == CheckStatus::Present)
    }
}

impl InstallReport {
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, InstallStatus::Failed(_)))
            .count()
    }
}

#[derive(Debug, Default)]
pub struct UpdateReport {
    pub report: Report<UpdateStatus>,
    /// Whether the lock file was rewritten.
    pub saved: bool,
}

impl UpdateReport {
    pub fn updated(&self) -> usize {
        self.report
            .entries
            .iter()
            .filter(|e| matches!(e.status, UpdateStatus::Updated { .. }))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.report
            .entries
            .iter()
            .filter(|e| matches!(e.status, UpdateStatus::Failed(_)))
            .count()
    }
}
