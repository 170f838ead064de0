//! Terminal output for command reports.
//!
//! Every dependency gets one line (`✓`, `✗` or `!`), followed by a one-line
//! summary for `check`, `install` and `update`.

use crate::deps::{
    CheckReport, CheckStatus, GetReport, InstallReport, InstallStatus, Report, UpdateReport,
    UpdateStatus,
};
use crate::error::DepsError;
use colored::*;
use std::path::Path;

/// First eight characters of a commit id.
pub fn short_hash(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

pub fn print_warning(warning: &Option<DepsError>) {
    if let Some(w) = warning {
        println!("{} Warning: {}", "!".yellow(), w);
    }
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("{} {}", "x".red(), err);
}

fn print_no_dependencies<S>(report: &Report<S>, lockfile: &Path) -> bool {
    if report.is_empty() {
        println!(
            "{} No dependencies found in {}",
            "ℹ".blue(),
            lockfile.display()
        );
        return true;
    }
    false
}

pub fn print_get(report: &GetReport) {
    print_warning(&report.warning);
    println!(
        "{} Resolved to {}@{}",
        "📦".blue(),
        report.canonical_ref,
        short_hash(&report.sha)
    );
    println!("   Downloaded to {}", report.path.display());
    println!(
        "{} Added {}@{} ({})",
        "✓".green(),
        report.key.to_string().bold(),
        report.canonical_ref,
        short_hash(&report.sha).dimmed()
    );
}

/// Prints the check report. Returns `true` when everything is present.
pub fn print_check(report: &CheckReport, lockfile: &Path) -> bool {
    print_warning(&report.warning);
    if print_no_dependencies(report, lockfile) {
        return true;
    }

    println!("Checking {} dependencies:\n", report.entries.len());
    for entry in &report.entries {
        match entry.status {
            CheckStatus::Present => println!(
                "{} {}@{} ({})",
                "✓".green(),
                entry.key,
                entry.dependency.requested_ref,
                short_hash(&entry.dependency.resolved_id).dimmed()
            ),
            CheckStatus::Missing => println!(
                "{} {}: {} - run 'deps install'",
                "✗".red(),
                entry.key,
                "MISSING".red()
            ),
        }
    }

    let ok = report.all_present();
    if ok {
        println!("\n{} All dependencies are up to date", "✓".green());
    } else {
        println!("\n{} Some dependencies need attention", "✗".red());
    }
    ok
}

pub fn print_install(report: &InstallReport, lockfile: &Path) {
    print_warning(&report.warning);
    if print_no_dependencies(report, lockfile) {
        return;
    }

    println!("Installing {} dependencies:\n", report.entries.len());
    for entry in &report.entries {
        let dep = &entry.dependency;
        match &entry.status {
            InstallStatus::AlreadyInstalled => println!(
                "{} {}@{} ({}) - already installed",
                "✓".green(),
                entry.key,
                dep.requested_ref,
                short_hash(&dep.resolved_id).dimmed()
            ),
            InstallStatus::Installed => println!(
                "{} Installed {}@{} ({})",
                "✓".green(),
                entry.key,
                dep.requested_ref,
                short_hash(&dep.resolved_id).dimmed()
            ),
            InstallStatus::Failed(e) => {
                println!("{} {}: {} - {}", "✗".red(), entry.key, "ERROR".red(), e)
            }
        }
    }

    match report.failures() {
        0 => println!("\n{} Installation complete", "✓".green()),
        n => println!(
            "\n{} Installation finished with {} failure(s)",
            "!".yellow(),
            n
        ),
    }
}

pub fn print_update(update: &UpdateReport, lockfile: &Path) {
    let report = &update.report;
    print_warning(&report.warning);
    if print_no_dependencies(report, lockfile) {
        return;
    }

    println!(
        "Checking for updates to {} dependencies:\n",
        report.entries.len()
    );
    for entry in &report.entries {
        let dep = &entry.dependency;
        match &entry.status {
            UpdateStatus::UpToDate => println!(
                "{} {}@{} ({}) - no update available",
                "✓".green(),
                entry.key,
                dep.requested_ref,
                short_hash(&dep.resolved_id).dimmed()
            ),
            UpdateStatus::Updated {
                from,
                to,
                canonical_ref,
            } => {
                println!("Update available for {}:", entry.key.as_str().bold());
                println!("  Current: {} ({})", short_hash(from), dep.requested_ref);
                println!("  Latest:  {} ({})", short_hash(to), canonical_ref);
                println!(
                    "{} Updated {} to {} ({})",
                    "✓".green(),
                    entry.key,
                    canonical_ref,
                    short_hash(to)
                );
            }
            UpdateStatus::Failed(e) => {
                println!("{} {}: {} - {}", "✗".red(), entry.key, "ERROR".red(), e)
            }
        }
    }

    let failures = update.failures();
    if update.updated() == 0 && failures == 0 {
        println!("\n{} All dependencies are up to date", "✓".green());
    } else if failures > 0 {
        println!(
            "\n{} {} updated, {} failed",
            "!".yellow(),
            update.updated(),
            failures
        );
    } else {
        println!("\n{} {} updated", "✓".green(), update.updated());
    }
}
