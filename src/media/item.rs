use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// One file inside a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    file_name: String,
    extension: String,
    path: PathBuf,
}

/// What happened to an item asked to relocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Copied to the destination and removed from the source.
    Moved,
    /// The destination already existed; nothing was touched.
    SkippedExisting,
}

impl MediaItem {
    pub fn new(directory: &Path, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            extension: extension_of(file_name).to_string(),
            path: directory.join(file_name),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size on disk. Re-reads metadata on every call so a file that
    /// is still being written reports its latest length.
    pub fn size_bytes(&self, fs: &dyn FileSystem) -> io::Result<u64> {
        Ok(fs.metadata(&self.path)?.len)
    }

    /// Copy the file to `destination`, then delete the source. An existing
    /// destination is left alone and reported as `SkippedExisting`.
    ///
    /// Not atomic: a crash between copy and delete leaves both copies.
    pub fn relocate(&self, fs: &dyn FileSystem, destination: &Path) -> io::Result<Relocation> {
        if fs.exists(destination) {
            warn!(
                "File already exists, skipping: {} -> {}",
                self.file_name,
                destination.display()
            );
            return Ok(Relocation::SkippedExisting);
        }

        debug!("Copying file: {} to {}", self.file_name, destination.display());
        let copied = fs.copy_file(&self.path, destination)?;
        fs.remove_file(&self.path)?;
        debug!(
            "Moved file: {} to {} ({} bytes)",
            self.file_name,
            destination.display(),
            copied
        );

        Ok(Relocation::Moved)
    }
}

/// Substring after the last `.`, or empty when there is none.
pub fn extension_of(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
}
