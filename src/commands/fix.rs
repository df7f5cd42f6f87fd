//! The mutating reporter: reconcile baseline files with the current surface.
//!
//! Idempotent by construction — a second run against unchanged sources finds
//! no changes and therefore performs no writes.

use std::io::Write;

use anyhow::{Context, Result};

use crate::baseline;
use crate::config::{Config, DefaultSelection};
use crate::engine;
use crate::extractor::SymbolExtractor;

/// Run the gate in fix mode. Fixes apply directory by directory; the first
/// unrecoverable I/O error aborts and leaves already-applied fixes in
/// place. A change carrying a baseline read error is fixed like any other:
/// the current content wins, since the point of fix mode is to (re)establish
/// the baseline.
pub fn execute(
    config: &Config,
    project_names: &[String],
    extractor: &dyn SymbolExtractor,
    out: &mut dyn Write,
) -> Result<()> {
    let projects = config.select_projects(project_names, DefaultSelection::AllProjects)?;
    let changes = engine::collect_changes(config, &projects, extractor)?;
    for change in &changes {
        if change.new_raw.is_empty() {
            let existed = change.baseline_path.exists();
            baseline::delete(&change.baseline_path).with_context(|| {
                format!("failed to remove {}", change.baseline_path.display())
            })?;
            if existed {
                writeln!(out, "Removed {}.", change.baseline_path.display())?;
            }
        } else {
            baseline::save(&change.baseline_path, &change.new_raw).with_context(|| {
                format!("failed to write {}", change.baseline_path.display())
            })?;
            writeln!(out, "Updated {}.", change.baseline_path.display())?;
        }
    }
    Ok(())
}
