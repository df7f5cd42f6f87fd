//! Gate configuration: projects, baseline policy, change-set filters, and
//! extractor settings, loaded from a TOML file at the repository root.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors from loading or interpreting the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown project {0:?}")]
    UnknownProject(String),
}

/// A checkable unit of the repository: a named project rooted at a path.
/// Relative paths are anchored at the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
}

/// Projects for which a missing or unreadable baseline is a hard failure
/// rather than a skippable warning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub require_baseline: Vec<String>,
}

/// How to obtain and invoke the symbol-extraction binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorConfig {
    /// Explicit binary; bare names are resolved through PATH. When set, no
    /// build happens and nothing is cleaned up.
    #[serde(default)]
    pub bin: Option<String>,

    /// Build command producing the binary when `bin` is unset. Every
    /// occurrence of `{out}` is replaced with the output path.
    #[serde(default)]
    pub build: Vec<String>,

    /// Arguments placed before the target directory on every invocation.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment overlay applied to the build and to every invocation.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Which projects a command falls back to when none are named on the
/// command line.
#[derive(Debug, Clone, Copy)]
pub enum DefaultSelection {
    /// Projects whose baseline is required by policy (check mode).
    PolicyProjects,
    /// Every configured project (fix mode).
    AllProjects,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Extension of files that can contribute to a public surface.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Path components marking fixtures or implementation-private code;
    /// files under them never affect the public surface.
    #[serde(default = "default_reserved_components")]
    pub reserved_components: Vec<String>,

    /// Well-known segment separating repository layout from package names.
    #[serde(default = "default_root_marker")]
    pub root_marker: String,

    /// Branch the change set is computed against.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Directory the config file was loaded from; anchors relative project
    /// paths.
    #[serde(skip)]
    root: PathBuf,
}

fn default_source_extension() -> String {
    ".go".to_string()
}

fn default_reserved_components() -> Vec<String> {
    vec!["testdata".to_string(), "internal".to_string()]
}

fn default_root_marker() -> String {
    "src".to_string()
}

fn default_base_branch() -> String {
    "master".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(config)
    }

    /// Absolute-or-anchored root directory of a project's checkout.
    pub fn project_root(&self, project: &Project) -> PathBuf {
        if project.path.is_absolute() {
            project.path.clone()
        } else {
            self.root.join(&project.path)
        }
    }

    /// The policy set: names of projects that must carry baselines.
    pub fn policy_set(&self) -> BTreeSet<String> {
        self.policy.require_baseline.iter().cloned().collect()
    }

    /// Resolve command-line project names against the configured projects.
    /// An empty list falls back to `default`; unknown names are an error.
    pub fn select_projects(
        &self,
        names: &[String],
        default: DefaultSelection,
    ) -> Result<Vec<&Project>, ConfigError> {
        if names.is_empty() {
            return Ok(match default {
                DefaultSelection::AllProjects => self.projects.iter().collect(),
                DefaultSelection::PolicyProjects => {
                    let policy = self.policy_set();
                    self.projects
                        .iter()
                        .filter(|project| policy.contains(&project.name))
                        .collect()
                }
            });
        }
        names
            .iter()
            .map(|name| {
                self.projects
                    .iter()
                    .find(|project| &project.name == name)
                    .ok_or_else(|| ConfigError::UnknownProject(name.clone()))
            })
            .collect()
    }
}
