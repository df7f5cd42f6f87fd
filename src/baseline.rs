//! On-disk baseline store: one `.api` file per package directory.
//!
//! The file holds newline-delimited signature lines with no header or other
//! metadata. Comment and blank lines are ignored when loading for comparison
//! but survive in the file until fix mode next rewrites it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::surface::ApiSurface;

/// File name of the persisted API snapshot inside a package directory.
pub const BASELINE_FILE_NAME: &str = ".api";

/// Baseline read failures, split so callers can tell "no file" from
/// everything else. The distinction drives the gate's fatal/warning policy.
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("no baseline file at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read baseline {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BaselineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BaselineError::NotFound { .. })
    }
}

/// Path of the baseline file for a package directory.
pub fn baseline_path(dir: &Path) -> PathBuf {
    dir.join(BASELINE_FILE_NAME)
}

/// Read a baseline file into a surface: raw bytes kept verbatim, entry set
/// built from the semantic lines only.
pub fn load(path: &Path) -> Result<ApiSurface, BaselineError> {
    match fs::read(path) {
        Ok(raw) => Ok(ApiSurface::parse(raw)),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Err(BaselineError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(BaselineError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replace the baseline contents: the bytes land in a temporary
/// file next to the target and are renamed into place, so readers never see
/// a partial write. Empty content removes the file instead — an empty API
/// surface has no baseline file by convention.
pub fn save(path: &Path, raw: &[u8]) -> io::Result<()> {
    if raw.is_empty() {
        return delete(path);
    }
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("baseline path {} has no parent directory", path.display()),
        )
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(raw)?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Remove the baseline file if present. Absence is not an error, so repeated
/// deletes converge on "no file".
pub fn delete(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_classifies_as_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        let err = load(&path).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn load_unreadable_file_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        // A directory at the baseline path fails with something other than
        // NotFound, independent of the invoking user's privileges.
        fs::create_dir(&path).unwrap();
        let err = load(&path).unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn save_then_load_round_trips_the_entry_set() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        let raw = b"# header\nfunc A() int\nfunc B() string\n";
        save(&path, raw).unwrap();
        let surface = load(&path).unwrap();
        assert_eq!(surface.raw(), raw.as_slice());
        assert_eq!(surface.entries().len(), 2);
        assert!(surface.entries().contains("func A() int"));
        assert!(surface.entries().contains("func B() string"));
    }

    #[test]
    fn save_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        save(&path, b"func A() int\n").unwrap();
        save(&path, b"func B() string\n").unwrap();
        let surface = load(&path).unwrap();
        assert_eq!(surface.raw(), b"func B() string\n".as_slice());
    }

    #[test]
    fn save_empty_content_removes_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        save(&path, b"func A() int\n").unwrap();
        save(&path, b"").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn delete_is_a_no_op_when_absent() {
        let tmp = TempDir::new().unwrap();
        let path = baseline_path(tmp.path());
        delete(&path).unwrap();
        save(&path, b"func A() int\n").unwrap();
        delete(&path).unwrap();
        assert!(!path.exists());
        delete(&path).unwrap();
    }
}
