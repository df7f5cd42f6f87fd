//! Locating, building, and invoking the symbol-extraction binary.
//!
//! The extractor is an external tool that prints the API surface of a
//! directory to stdout. It is resolved or built once per run and reused for
//! every directory; when it had to be built, the build directory lives
//! exactly as long as the [`ToolExtractor`], so artifacts are removed on
//! every exit path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::debug;

use crate::config::ExtractorConfig;

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("no extractor binary configured and no build command given")]
    NotConfigured,

    #[error("extractor binary {name:?} not found in PATH: {source}")]
    Lookup {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to create extractor build directory: {0}")]
    BuildDir(#[source] std::io::Error),

    #[error("extractor build `{command}` failed: {message}")]
    BuildFailed { command: String, message: String },

    #[error("extractor invocation `{command}` failed: {message}")]
    Invocation { command: String, message: String },
}

/// Produces the current API surface bytes for a package directory.
///
/// Modeled as a plain function interface so the diff engine never cares
/// whether symbols come from a subprocess, an in-process library, or a test
/// double.
pub trait SymbolExtractor {
    fn extract(&self, dir: &Path) -> Result<Vec<u8>, ExtractorError>;
}

/// Subprocess-backed extractor.
#[derive(Debug)]
pub struct ToolExtractor {
    bin: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    // Owned so Drop removes the built binary whichever way the run ends.
    _build_dir: Option<TempDir>,
}

impl ToolExtractor {
    /// Resolve or build the extractor binary. An explicit override (the
    /// `--extractor-bin` flag) wins over the configured binary, which wins
    /// over building from the configured build command.
    pub fn prepare(
        config: &ExtractorConfig,
        bin_override: Option<&Path>,
    ) -> Result<Self, ExtractorError> {
        if let Some(bin) = bin_override {
            let bin = resolve_binary(bin)?;
            return Ok(Self::with_binary(bin, config, None));
        }
        if let Some(name) = config.bin.as_deref().filter(|name| !name.is_empty()) {
            let bin = resolve_binary(Path::new(name))?;
            return Ok(Self::with_binary(bin, config, None));
        }
        if config.build.is_empty() {
            return Err(ExtractorError::NotConfigured);
        }

        let build_dir = TempDir::new().map_err(ExtractorError::BuildDir)?;
        let bin = build_dir.path().join("extractor");
        run_build(&config.build, &bin, &config.env)?;
        Ok(Self::with_binary(bin, config, Some(build_dir)))
    }

    fn with_binary(bin: PathBuf, config: &ExtractorConfig, build_dir: Option<TempDir>) -> Self {
        Self {
            bin,
            args: config.args.clone(),
            env: config.env.clone(),
            _build_dir: build_dir,
        }
    }

    /// Path of the binary every extraction runs.
    pub fn binary(&self) -> &Path {
        &self.bin
    }
}

impl SymbolExtractor for ToolExtractor {
    fn extract(&self, dir: &Path) -> Result<Vec<u8>, ExtractorError> {
        let command = format!(
            "{} {} {}",
            self.bin.display(),
            self.args.join(" "),
            dir.display()
        );
        debug!(%command, "extracting API surface");
        let output = Command::new(&self.bin)
            .args(&self.args)
            .arg(dir)
            .envs(&self.env)
            .output()
            .map_err(|err| ExtractorError::Invocation {
                command: command.clone(),
                message: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ExtractorError::Invocation {
                command,
                message: stderr_message(&output.stderr),
            });
        }
        Ok(output.stdout)
    }
}

/// Bare names go through PATH; anything with a directory component is taken
/// as given.
fn resolve_binary(bin: &Path) -> Result<PathBuf, ExtractorError> {
    if bin.is_absolute() || bin.components().count() > 1 {
        return Ok(bin.to_path_buf());
    }
    which::which(bin).map_err(|source| ExtractorError::Lookup {
        name: bin.display().to_string(),
        source,
    })
}

fn run_build(
    build: &[String],
    out: &Path,
    env: &BTreeMap<String, String>,
) -> Result<(), ExtractorError> {
    let out_str = out.to_string_lossy();
    let argv: Vec<String> = build
        .iter()
        .map(|arg| arg.replace("{out}", &out_str))
        .collect();
    let (program, rest) = argv.split_first().ok_or(ExtractorError::NotConfigured)?;
    let command = argv.join(" ");
    debug!(%command, "building extractor");
    let output = Command::new(program)
        .args(rest)
        .envs(env)
        .output()
        .map_err(|err| ExtractorError::BuildFailed {
            command: command.clone(),
            message: err.to_string(),
        })?;
    if !output.status.success() {
        return Err(ExtractorError::BuildFailed {
            command,
            message: stderr_message(&output.stderr),
        });
    }
    Ok(())
}

fn stderr_message(stderr: &[u8]) -> String {
    let message = String::from_utf8_lossy(stderr).trim().to_string();
    if message.is_empty() {
        "unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    #[test]
    fn prepare_without_binary_or_build_command_fails() {
        let config = ExtractorConfig::default();
        let err = ToolExtractor::prepare(&config, None).unwrap_err();
        assert!(matches!(err, ExtractorError::NotConfigured));
    }

    #[test]
    fn explicit_paths_skip_the_path_lookup() {
        let config = ExtractorConfig::default();
        let extractor =
            ToolExtractor::prepare(&config, Some(Path::new("/opt/tools/extractor"))).unwrap();
        assert_eq!(extractor.binary(), Path::new("/opt/tools/extractor"));
    }

    #[test]
    fn missing_bare_binary_name_is_a_lookup_error() {
        let config = ExtractorConfig {
            bin: Some("apiguard-no-such-extractor".to_string()),
            ..ExtractorConfig::default()
        };
        let err = ToolExtractor::prepare(&config, None).unwrap_err();
        assert!(matches!(err, ExtractorError::Lookup { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn built_extractor_runs_and_captures_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("extractor.sh");
        std::fs::write(&source, "#!/bin/sh\necho \"func A() int\"\n").unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o755)).unwrap();

        // cp preserves the executable bit, which is all a build needs here.
        let config = ExtractorConfig {
            build: vec![
                "cp".to_string(),
                source.to_string_lossy().into_owned(),
                "{out}".to_string(),
            ],
            ..ExtractorConfig::default()
        };
        let extractor = ToolExtractor::prepare(&config, None).unwrap();
        let raw = extractor.extract(tmp.path()).unwrap();
        assert_eq!(raw, b"func A() int\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_invocation_surfaces_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let bin = tmp.path().join("extractor.sh");
        std::fs::write(&bin, "#!/bin/sh\necho \"boom\" >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = ExtractorConfig::default();
        let extractor = ToolExtractor::prepare(&config, Some(&bin)).unwrap();
        let err = extractor.extract(tmp.path()).unwrap_err();
        match err {
            ExtractorError::Invocation { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
