//! # deps - Source Dependency Fetcher
//!
//! deps pins source dependencies hosted on GitHub to exact commits and
//! materializes them into a local directory tree.
//!
//! ## Features
//!
//! - **Ref Resolution**: Branch, tag or commit; branches win over tags of the same name
//! - **Tarball Snapshots**: One archive download per commit, no git checkout needed
//! - **Lock File**: `.deps.lock` records the requested ref and resolved commit
//! - **Reconciliation**: `check`, `install` and `update` work from the lock file
//!
//! ## Quick Start
//!
//! ```bash
//! deps get github.com/nlohmann/json@v3.11.2
//! deps check
//! deps install
//! deps update
//! ```
//!
//! ## Module Organization
//!
//! - [`resolve`] - Ref to commit resolution
//! - [`archive`] - Tarball extraction
//! - [`lock`] - Lock file (`.deps.lock`) management
//! - [`deps`] - `get`/`check`/`install`/`update` orchestration

/// Tarball extraction with wrapper-directory stripping.
pub mod archive;

/// Configuration (`deps.toml` and environment).
pub mod config;

/// Dependency orchestration.
pub mod deps;

/// Error types.
pub mod error;

/// Lock file (`.deps.lock`) management.
pub mod lock;

/// Remote API seam and GitHub client.
pub mod remote;

/// Ref resolution.
pub mod resolve;

/// Dependency keys and spec strings.
pub mod spec;

/// Terminal output.
pub mod ui;
