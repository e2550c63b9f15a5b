//! Per-conversion scratch directories.
//!
//! A [`Workspace`] owns a temporary directory holding the stored upload and
//! the encoder output. Everything inside is removed when it is dropped, so a
//! failed conversion leaves nothing behind.

use crate::InputKind;
use m4bforge_common::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory for one conversion.
///
/// # Example
///
/// ```no_run
/// use m4bforge_av::{InputKind, Workspace};
///
/// let workspace = Workspace::new()?;
/// let input = workspace.input_file(InputKind::Mp3);
/// let output = workspace.output_file("book.m4b");
/// // ... write the upload to `input`, run the encoder into `output` ...
/// workspace.cleanup();
/// # Ok::<(), m4bforge_common::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("m4bforge-").map_err(workspace_error)?;
        Ok(Self { temp_dir })
    }

    /// Create a workspace under `base`, which must already exist.
    pub fn in_dir(base: &Path) -> Result<Self> {
        let temp_dir = TempDir::with_prefix_in("m4bforge-", base).map_err(workspace_error)?;
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A fresh, uniquely named path for a stored upload of the given kind.
    pub fn input_file(&self, kind: InputKind) -> PathBuf {
        self.temp_dir.path().join(format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            kind.input_extension()
        ))
    }

    /// Path for the produced file, kept in an `out` subdirectory so it never
    /// collides with the stored upload.
    pub fn output_file(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join("out").join(file_name)
    }

    /// Remove the directory and everything in it.
    pub fn cleanup(self) {
        if let Err(e) = self.temp_dir.close() {
            tracing::warn!("Failed to remove workspace: {}", e);
        }
    }
}

fn workspace_error(e: std::io::Error) -> Error {
    Error::Internal(format!("failed to create workspace: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_inside_workspace() {
        let workspace = Workspace::new().unwrap();
        let input = workspace.input_file(InputKind::M3u8);
        let output = workspace.output_file("book.mkv");

        assert!(input.starts_with(workspace.path()));
        assert_eq!(input.extension().unwrap(), "m3u8");
        assert!(output.starts_with(workspace.path().join("out")));
        assert_eq!(output.file_name().unwrap(), "book.mkv");
    }

    #[test]
    fn input_files_are_unique() {
        let workspace = Workspace::new().unwrap();
        assert_ne!(
            workspace.input_file(InputKind::Mp3),
            workspace.input_file(InputKind::Mp3)
        );
    }

    #[test]
    fn cleanup_removes_directory() {
        let base = tempfile::tempdir().unwrap();
        let workspace = Workspace::in_dir(base.path()).unwrap();
        let dir = workspace.path().to_path_buf();
        std::fs::write(dir.join("upload.mp3"), b"data").unwrap();
        assert!(dir.exists());

        workspace.cleanup();
        assert!(!dir.exists());
    }

    #[test]
    fn missing_base_is_an_error() {
        let base = tempfile::tempdir().unwrap();
        let missing = base.path().join("not-created");
        assert!(Workspace::in_dir(&missing).is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let dir = {
            let workspace = Workspace::new().unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!dir.exists());
    }
}
