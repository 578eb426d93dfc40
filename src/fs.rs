use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Filesystem primitives used by the watcher, with POSIX-like semantics.
pub trait FileSystem: Send + Sync {
    /// Names of the direct children of `path`, sorted.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    fn metadata(&self, path: &Path) -> io::Result<FsMetadata>;

    fn exists(&self, path: &Path) -> bool;

    /// Create a single directory. Fails with `AlreadyExists` if it is there.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Copy bytes from `src` to a new file at `dst`. Never overwrites.
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory, only if it is empty.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// Lightweight metadata needed by scans.
#[derive(Debug, Clone, Copy)]
pub struct FsMetadata {
    pub is_dir: bool,
    pub len: u64,
    /// Last modified time if available
    pub modified: Option<SystemTime>,
}

/// Real filesystem implementation backed by std::fs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn metadata(&self, path: &Path) -> io::Result<FsMetadata> {
        let md = fs::metadata(path)?;
        Ok(FsMetadata {
            is_dir: md.is_dir(),
            len: md.len(),
            modified: md.modified().ok(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        // Unreadable paths count as existing.
        path.try_exists().unwrap_or(true)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        let mut reader = File::open(src)?;
        let mut writer = OpenOptions::new().write(true).create_new(true).open(dst)?;
        let copied = io::copy(&mut reader, &mut writer).and_then(|copied| {
            writer.sync_all()?;
            Ok(copied)
        });
        if copied.is_err() {
            // Never leave a partial target behind.
            let _ = fs::remove_file(dst);
        }
        copied
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}
