//! Staging area for handler files.
//!
//! Every write to the live path goes through a temporary file created in the
//! same directory and renamed into place, so the interpreter never observes a
//! partially written handler.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Mode applied to installed handlers.
#[cfg(unix)]
pub(crate) const HANDLER_MODE: u32 = 0o755;

/// A temporary file that becomes the live handler once installed.
///
/// Dropping a staged file without installing it removes it.
#[derive(Debug)]
pub(crate) struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Creates an empty staging file beside `target`, creating the parent
    /// directory when it does not exist yet.
    pub(crate) fn beside(target: &Path) -> io::Result<Self> {
        let parent = target.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "target path did not have a parent directory",
            )
        })?;
        let directory = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        fs::create_dir_all(directory)?;

        let mut builder = Builder::new();
        builder.prefix(".handoff-");
        builder.suffix(".partial");
        let file = builder.tempfile_in(directory)?;
        Ok(Self { file })
    }

    /// Path the staged content lives at until it is installed.
    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of whatever currently sits at the staging path.
    ///
    /// External tools may replace the file rather than writing through the
    /// open handle, so this inspects the path.
    pub(crate) fn len(&self) -> io::Result<u64> {
        fs::metadata(self.path()).map(|metadata| metadata.len())
    }

    /// Writes `contents` through the staging handle.
    pub(crate) fn write_all(&mut self, contents: &[u8]) -> io::Result<()> {
        self.file.write_all(contents)?;
        self.file.flush()
    }

    /// Marks the staged file executable, syncs it and renames it over
    /// `target`.
    pub(crate) fn install(self, target: &Path) -> io::Result<()> {
        #[cfg(unix)]
        fs::set_permissions(self.path(), fs::Permissions::from_mode(HANDLER_MODE))?;
        File::open(self.path())?.sync_all()?;
        self.file.persist(target).map_err(|error| error.error)?;
        Ok(())
    }
}
