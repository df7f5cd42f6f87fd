//! The non-mutating reporter: print every finding, touch nothing.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, DefaultSelection};
use crate::engine::{self, PackageChange};
use crate::extractor::SymbolExtractor;

/// How much of each change the report spells out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Every added and removed entry, grouped under counts.
    Detailed,
    /// Per-package counts only.
    Summary,
}

/// Run the gate in check mode. All directories are enumerated before
/// anything is reported, and no state is mutated regardless of what is
/// found. Returns true when findings exist (changed surfaces or fatally
/// missing baselines); the caller maps that to the exit status.
pub fn execute(
    config: &Config,
    project_names: &[String],
    mode: OutputMode,
    extractor: &dyn SymbolExtractor,
    out: &mut dyn Write,
) -> Result<bool> {
    let projects = config.select_projects(project_names, DefaultSelection::PolicyProjects)?;
    let changes = engine::collect_changes(config, &projects, extractor)?;
    for change in &changes {
        report_change(change, mode, out)?;
    }
    Ok(!changes.is_empty())
}

fn report_change(change: &PackageChange, mode: OutputMode, out: &mut dyn Write) -> Result<()> {
    if let Some(err) = &change.baseline_error {
        writeln!(
            out,
            "{} package {}: could not read the package's .api file: {err}",
            "ERROR:".red().bold(),
            change.name
        )?;
        writeln!(
            out,
            "{} a readable .api file is required for all packages in project {}",
            "ERROR:".red().bold(),
            change.project
        )?;
        return Ok(());
    }

    let removed = change.removed_entries();
    let added = change.added_entries();
    match mode {
        OutputMode::Detailed => {
            writeln!(out, "{}", format!("Changes for package {}", change.name).bold())?;
            if !removed.is_empty() {
                writeln!(out, "The following {} entries were removed:", removed.len())?;
                for entry in &removed {
                    writeln!(out, "\t{}", entry.red())?;
                }
            }
            if !added.is_empty() {
                writeln!(out, "The following {} entries were added:", added.len())?;
                for entry in &added {
                    writeln!(out, "\t{}", entry.green())?;
                }
            }
        }
        OutputMode::Summary => {
            writeln!(
                out,
                "package {}: {} entries removed, {} entries added",
                change.name,
                removed.len(),
                added.len()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineError;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn entries(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn change() -> PackageChange {
        PackageChange {
            name: "pkg/a".to_string(),
            project: "core".to_string(),
            baseline_path: PathBuf::from("/repo/src/pkg/a/.api"),
            old_entries: entries(&["func A() int"]),
            new_entries: entries(&["func A() int", "func B() string"]),
            new_raw: b"func A() int\nfunc B() string\n".to_vec(),
            baseline_error: None,
        }
    }

    fn render(change: &PackageChange, mode: OutputMode) -> String {
        let mut out = Vec::new();
        report_change(change, mode, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn detailed_report_lists_every_entry() {
        let text = render(&change(), OutputMode::Detailed);
        assert!(text.contains("Changes for package pkg/a"));
        assert!(text.contains("The following 1 entries were added:"));
        assert!(text.contains("func B() string"));
        assert!(!text.contains("entries were removed"));
    }

    #[test]
    fn summary_report_only_counts() {
        let text = render(&change(), OutputMode::Summary);
        assert!(text.contains("package pkg/a: 0 entries removed, 1 entries added"));
        assert!(!text.contains("func B() string"));
    }

    #[test]
    fn baseline_errors_render_as_error_lines() {
        let mut broken = change();
        broken.baseline_error = Some(BaselineError::NotFound {
            path: broken.baseline_path.clone(),
        });
        let text = render(&broken, OutputMode::Detailed);
        assert!(text.contains("could not read the package's .api file"));
        assert!(text.contains("a readable .api file is required for all packages in project core"));
    }
}
