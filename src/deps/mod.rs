//! Dependency orchestration.
//!
//! [`DependencyManager`] ties the resolver, the archive extractor and the
//! lock store together:
//!
//! - `deps get <spec>` - resolve, download and pin one dependency
//! - `deps check` - report which pinned dependencies exist on disk
//! - `deps install` - download missing dependencies at their pinned commit
//! - `deps update [key]` - move dependencies to the current tip of their ref

mod manager;
mod report;

pub use manager::DependencyManager;
pub use report::{
    CheckReport, CheckStatus, Entry, GetReport, InstallReport, InstallStatus, Report,
    UpdateReport, UpdateStatus,
};
