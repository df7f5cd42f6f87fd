//! Change-set resolution: which directories of which projects can have a
//! changed public surface, derived from the version-control diff against the
//! base branch.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{Config, Project};
use crate::gitutil::GitRepo;

/// Decides which modified files can affect a public API surface.
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// Stored without the leading dot.
    source_extension: String,
    reserved_components: Vec<String>,
}

impl FileFilter {
    pub fn new(source_extension: &str, reserved_components: &[String]) -> Self {
        Self {
            source_extension: source_extension.trim_start_matches('.').to_string(),
            reserved_components: reserved_components.to_vec(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.source_extension, &config.reserved_components)
    }

    /// True when `file` cannot contribute to the public surface: wrong
    /// extension, or any path component names fixtures or
    /// implementation-private code.
    pub fn is_ignored(&self, file: &Path) -> bool {
        let matches_extension = file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.source_extension);
        if !matches_extension {
            return true;
        }
        file.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|name| self.reserved_components.iter().any(|r| r == name)),
            _ => false,
        })
    }
}

/// Map each project to the set of directories containing at least one
/// modified, non-ignored source file. Any branch lookup or diff failure
/// aborts the whole run; a partial change set is unsafe for a gate to act
/// on.
pub fn resolve<'a>(
    config: &Config,
    projects: &[&'a Project],
    filter: &FileFilter,
) -> Result<Vec<(&'a Project, BTreeSet<PathBuf>)>> {
    let mut resolved = Vec::with_capacity(projects.len());
    for project in projects {
        let root = config.project_root(project);
        let repo = GitRepo::new(&root);
        let branch = repo.current_branch().with_context(|| {
            format!("failed to determine current branch of project {}", project.name)
        })?;
        let files = repo
            .modified_files(&config.base_branch, &branch)
            .with_context(|| format!("failed to compute change set of project {}", project.name))?;

        let mut dirs = BTreeSet::new();
        for file in files {
            if filter.is_ignored(&file) {
                continue;
            }
            // The surface is extracted per directory, aggregating all files
            // in it, so the file itself is not interesting.
            let parent = file.parent().unwrap_or_else(|| Path::new(""));
            dirs.insert(root.join(parent));
        }
        resolved.push((*project, dirs));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FileFilter {
        FileFilter::new(".go", &["testdata".to_string(), "internal".to_string()])
    }

    #[test]
    fn wrong_extensions_are_ignored() {
        assert!(filter().is_ignored(Path::new("pkg/a/readme.md")));
        assert!(filter().is_ignored(Path::new("pkg/a/Makefile")));
        assert!(!filter().is_ignored(Path::new("pkg/a/a.go")));
    }

    #[test]
    fn reserved_components_are_ignored_anywhere_in_the_path() {
        assert!(filter().is_ignored(Path::new("pkg/testdata/fixture.go")));
        assert!(filter().is_ignored(Path::new("internal/pkg/a.go")));
        assert!(filter().is_ignored(Path::new("pkg/internal/deep/nested/a.go")));
        assert!(!filter().is_ignored(Path::new("pkg/internals/a.go")));
    }

    #[test]
    fn extension_match_is_exact() {
        let f = filter();
        assert!(f.is_ignored(Path::new("pkg/a.gol")));
        assert!(f.is_ignored(Path::new("pkg/a.go.orig")));
        assert!(f.is_ignored(Path::new("pkg/go")));
    }
}
