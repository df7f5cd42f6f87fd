//! The diff and policy engine: compares each candidate directory's current
//! surface against its stored baseline and decides what counts as a change,
//! a warning, or a fatal finding.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;

use crate::baseline::{self, BaselineError};
use crate::config::{Config, Project};
use crate::extractor::SymbolExtractor;
use crate::resolver::{self, FileFilter};
use crate::surface::ApiSurface;

/// One directory whose current surface differs from its baseline, or whose
/// baseline could not be read in a non-exempt way. Consumed by exactly one
/// reporter per invocation.
#[derive(Debug)]
pub struct PackageChange {
    /// Display name of the package, derived from the directory path.
    pub name: String,
    /// Name of the owning project.
    pub project: String,
    /// Where the baseline for this directory lives.
    pub baseline_path: PathBuf,
    pub old_entries: BTreeSet<String>,
    pub new_entries: BTreeSet<String>,
    /// Raw extractor output the new entry set was parsed from; fix mode
    /// writes exactly these bytes.
    pub new_raw: Vec<u8>,
    /// Set when the baseline could not be read and the failure is fatal for
    /// this project.
    pub baseline_error: Option<BaselineError>,
}

impl PackageChange {
    /// Entries present in the baseline but absent from the current surface.
    pub fn removed_entries(&self) -> Vec<&str> {
        self.old_entries
            .difference(&self.new_entries)
            .map(String::as_str)
            .collect()
    }

    /// Entries present in the current surface but absent from the baseline.
    pub fn added_entries(&self) -> Vec<&str> {
        self.new_entries
            .difference(&self.old_entries)
            .map(String::as_str)
            .collect()
    }
}

/// Package display name: the path components after the first `root_marker`
/// component, joined with `/`. Falls back to the full path when the marker
/// is absent or nothing follows it.
pub fn display_name(dir: &Path, root_marker: &str) -> String {
    let components: Vec<&str> = dir
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    match components.iter().position(|c| *c == root_marker) {
        Some(index) if index + 1 < components.len() => components[index + 1..].join("/"),
        _ => dir.display().to_string(),
    }
}

/// Compare one directory's current surface against its baseline.
///
/// Returns `Ok(None)` when the directory needs no attention: surfaces are
/// set-equal, or the baseline is absent in an exempt way. Extraction
/// failures propagate; baseline failures never abort the run here — when
/// fatal for the project they ride inside the returned change.
pub fn compare(
    dir: &Path,
    project: &str,
    policy: &BTreeSet<String>,
    root_marker: &str,
    extractor: &dyn SymbolExtractor,
) -> Result<Option<PackageChange>> {
    let raw = extractor
        .extract(dir)
        .with_context(|| format!("failed to extract API surface of {}", dir.display()))?;
    let current = ApiSurface::parse(raw);
    let baseline_path = baseline::baseline_path(dir);

    match baseline::load(&baseline_path) {
        Ok(old) => {
            if old.same_entries(&current) {
                debug!(dir = %dir.display(), "surface unchanged");
                return Ok(None);
            }
            Ok(Some(change_for(
                dir,
                project,
                root_marker,
                baseline_path,
                old.entries().clone(),
                current,
                None,
            )))
        }
        Err(err) => {
            let exempt = err.is_not_found() && !policy.contains(project);
            if exempt {
                if current.raw().is_empty() {
                    // No public symbols and no baseline: nothing to compare.
                    debug!(dir = %dir.display(), "empty surface without baseline");
                    return Ok(None);
                }
                eprintln!(
                    "{} could not read public API from {}: {err}",
                    "WARNING:".yellow().bold(),
                    baseline_path.display()
                );
                eprintln!(
                    "{} skipping public API check for {}",
                    "WARNING:".yellow().bold(),
                    dir.display()
                );
                return Ok(None);
            }
            Ok(Some(change_for(
                dir,
                project,
                root_marker,
                baseline_path,
                BTreeSet::new(),
                current,
                Some(err),
            )))
        }
    }
}

fn change_for(
    dir: &Path,
    project: &str,
    root_marker: &str,
    baseline_path: PathBuf,
    old_entries: BTreeSet<String>,
    current: ApiSurface,
    baseline_error: Option<BaselineError>,
) -> PackageChange {
    let (new_raw, new_entries) = current.into_parts();
    PackageChange {
        name: display_name(dir, root_marker),
        project: project.to_string(),
        baseline_path,
        old_entries,
        new_entries,
        new_raw,
        baseline_error,
    }
}

/// Drive the full pipeline: resolve each selected project's candidate
/// directories and gather every change, in discovery order. Resolution and
/// extraction failures abort the whole run.
pub fn collect_changes(
    config: &Config,
    projects: &[&Project],
    extractor: &dyn SymbolExtractor,
) -> Result<Vec<PackageChange>> {
    let filter = FileFilter::from_config(config);
    let policy = config.policy_set();
    let mut changes = Vec::new();
    for (project, dirs) in resolver::resolve(config, projects, &filter)? {
        for dir in dirs {
            if let Some(change) = compare(
                &dir,
                &project.name,
                &policy,
                &config.root_marker,
                extractor,
            )? {
                changes.push(change);
            }
        }
    }
    Ok(changes)
}
