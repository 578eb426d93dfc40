//! Per-directory lifecycle: scan, wait for a name, wait for the contents to
//! settle, then move everything into the output location exactly once.
//!
//! ```text
//! Discovering -> AwaitingName -> AwaitingStability -> Completed(Relocated)
//!                     |                  \
//!                     |                   `-> Completed(Abandoned)  (extras dir failed)
//!                     `-> Completed(Abandoned)  (destination already existed)
//! ```
//!
//! A failed naming request leaves the directory in `AwaitingName` for good.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use super::item::{MediaItem, Relocation};
use crate::config::{WatchSettings, EXTRAS_DIR_NAME};
use crate::fs::FileSystem;
use crate::naming::{ItemDescriptor, NamingDecision, NamingMode, NamingRequest, OracleError};

/// How the principal item is found at relocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalSelection {
    /// The oracle named the file and its new name (extension included).
    Named {
        current_name: String,
        new_name: String,
    },
    /// Largest file wins; the first one seen breaks ties.
    Largest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingResult {
    pub title: String,
    pub principal: PrincipalSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Relocated { title: String },
    /// Gave up without relocating; the reason is only informational.
    Abandoned { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    Discovering,
    AwaitingName,
    /// Named and the destination directory was created by us.
    AwaitingStability(NamingResult),
    Completed(Completion),
}

impl NamingResult {
    /// Combine a validated decision with the run's naming mode.
    pub fn for_mode(decision: NamingDecision, mode: NamingMode) -> Result<Self, OracleError> {
        let principal = match mode {
            NamingMode::DirectoryName => PrincipalSelection::Largest,
            NamingMode::FileListing => {
                let principal = decision
                    .principal
                    .ok_or(OracleError::MissingField("oldMainTitleName"))?;
                PrincipalSelection::Named {
                    current_name: principal.current_name,
                    new_name: principal.new_name,
                }
            }
        };

        Ok(Self {
            title: decision.title,
            principal,
        })
    }

    fn principal_target_name(&self, item: &MediaItem) -> String {
        match &self.principal {
            PrincipalSelection::Named { new_name, .. } => new_name.clone(),
            PrincipalSelection::Largest if item.extension().is_empty() => self.title.clone(),
            PrincipalSelection::Largest => format!("{}.{}", self.title, item.extension()),
        }
    }
}

pub struct WatchedDirectory {
    name: String,
    path: PathBuf,
    /// In first-seen order; file names are unique.
    items: Vec<MediaItem>,
    last_modified: SystemTime,
    state: DirectoryState,
    /// Set once the destination is created; survives completion.
    destination_initialized: bool,
    settings: Arc<WatchSettings>,
    fs: Arc<dyn FileSystem>,
}

impl WatchedDirectory {
    /// Create the directory entry and run its first scan synchronously.
    pub fn discover(name: &str, settings: Arc<WatchSettings>, fs: Arc<dyn FileSystem>) -> Self {
        debug!("Creating directory entry for \"{}\"", name);

        let mut directory = Self {
            name: name.to_string(),
            path: settings.source_path(name),
            items: Vec::new(),
            // The staleness clock starts at discovery, so even files with old
            // timestamps get a full window to finish arriving.
            last_modified: SystemTime::now(),
            state: DirectoryState::Discovering,
            destination_initialized: false,
            settings,
            fs,
        };

        if let Err(e) = directory.scan() {
            error!("Error scanning new directory {}: {}", directory.name, e);
        }
        directory.state = DirectoryState::AwaitingName;
        info!(
            "Discovered directory {} with {} file(s)",
            directory.name,
            directory.items.len()
        );

        directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn item(&self, file_name: &str) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.file_name() == file_name)
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    pub fn naming(&self) -> Option<&NamingResult> {
        match &self.state {
            DirectoryState::AwaitingStability(naming) => Some(naming),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, DirectoryState::Completed(_))
    }

    /// True if this directory created its destination, whatever state it
    /// ended in.
    pub fn is_destination_initialized(&self) -> bool {
        self.destination_initialized
    }

    /// True once nothing in the directory has changed for the stale window.
    pub fn is_stale(&self) -> bool {
        SystemTime::now()
            .duration_since(self.last_modified)
            .map(|age| age >= self.settings.stale_time)
            .unwrap_or(false)
    }

    /// What to ask the oracle about this directory under the configured mode.
    pub fn naming_request(&self) -> NamingRequest {
        match self.settings.naming_mode {
            NamingMode::DirectoryName => NamingRequest::Directory {
                directory_name: self.name.clone(),
            },
            NamingMode::FileListing => NamingRequest::Listing {
                items: self
                    .items
                    .iter()
                    .map(|item| ItemDescriptor {
                        file_name: item.file_name().to_string(),
                        file_size: item.size_bytes(self.fs.as_ref()).unwrap_or_else(|e| {
                            warn!("Could not read size of {}: {}", item.path().display(), e);
                            0
                        }),
                    })
                    .collect(),
            },
        }
    }

    /// Feed the oracle's answer in. On success the destination is created
    /// once; if it already exists the directory is given up.
    pub fn apply_naming(&mut self, result: Result<NamingDecision, OracleError>) {
        match &self.state {
            DirectoryState::Discovering | DirectoryState::AwaitingName => {}
            DirectoryState::AwaitingStability(_) => {
                warn!("Output is already initialized for {}, skipping...", self.name);
                return;
            }
            DirectoryState::Completed(_) => {
                warn!("Directory {} is already completed, skipping...", self.name);
                return;
            }
        }

        let naming = match result
            .and_then(NamingDecision::validated)
            .and_then(|decision| NamingResult::for_mode(decision, self.settings.naming_mode))
        {
            Ok(naming) => naming,
            Err(e) => {
                error!(
                    "Naming failed for {}: {}. The directory will not be processed.",
                    self.name, e
                );
                return;
            }
        };

        info!("Named {} as \"{}\"", self.name, naming.title);
        self.initialize_destination(naming);
    }

    fn initialize_destination(&mut self, naming: NamingResult) {
        let destination = self.settings.destination_path(&naming.title);
        info!("Initializing output dir {}", destination.display());

        match self.fs.create_dir(&destination) {
            Ok(()) => {
                self.destination_initialized = true;
                self.state = DirectoryState::AwaitingStability(naming);
            }
            Err(e) => {
                error!(
                    "Error initializing output dir {}: {} - giving up on {}",
                    destination.display(),
                    e,
                    self.name
                );
                self.state = DirectoryState::Completed(Completion::Abandoned {
                    reason: format!("could not create {}: {}", destination.display(), e),
                });
            }
        }
    }

    /// One polling step: rescan, then relocate if named, initialized and
    /// stale. Safe to call any number of times; a no-op once completed.
    pub fn refresh(&mut self) {
        if self.is_completed() {
            debug!("Directory {} is already completed, skipping...", self.name);
            return;
        }

        info!("Updating files for dir: {}", self.name);
        if let Err(e) = self.scan() {
            error!("Error scanning {}: {}", self.path.display(), e);
            return;
        }

        let naming = match &self.state {
            DirectoryState::AwaitingStability(naming) => naming.clone(),
            _ => {
                debug!("Output not initialized for {}, waiting...", self.name);
                return;
            }
        };

        if !self.is_stale() {
            info!(
                "{} last modified too recently ({}), waiting...",
                self.name,
                DateTime::<Local>::from(self.last_modified).format("%Y-%m-%d %H:%M:%S")
            );
            return;
        }

        self.relocate_contents(&naming);
    }

    fn scan(&mut self) -> io::Result<()> {
        let names = self.fs.list_dir(&self.path)?;
        debug!("Read {} entries from {}", names.len(), self.path.display());

        let before = self.items.len();
        self.items.retain(|item| names.iter().any(|n| n == item.file_name()));
        if self.items.len() != before {
            debug!(
                "Dropped {} vanished file(s) from {}",
                before - self.items.len(),
                self.name
            );
        }

        for file_name in &names {
            if !file_name.contains('.') {
                warn!("File {} has no extension, ignoring...", file_name);
                continue;
            }
            if self.settings.is_ignored(file_name) {
                debug!("File {} matches an ignore pattern, ignoring...", file_name);
                continue;
            }

            let metadata = match self.fs.metadata(&self.path.join(file_name)) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Could not stat {}: {}", file_name, e);
                    continue;
                }
            };
            if metadata.is_dir {
                warn!("Found directory: {}... Ignoring...", file_name);
                continue;
            }

            if let Some(modified) = metadata.modified {
                self.observe_modified(modified);
            }
            self.add_item(file_name);
        }

        Ok(())
    }

    fn observe_modified(&mut self, modified: SystemTime) {
        if modified > self.last_modified {
            self.last_modified = modified;
        }
    }

    fn add_item(&mut self, file_name: &str) {
        if self.item(file_name).is_some() {
            return;
        }
        debug!("Adding file: {}", file_name);
        self.items.push(MediaItem::new(&self.path, file_name));
    }

    fn drop_item(&mut self, file_name: &str) {
        let before = self.items.len();
        self.items.retain(|item| item.file_name() != file_name);
        if self.items.len() == before {
            warn!("Tried to drop a file that isn't tracked: {}", file_name);
        }
    }

    /// The item that would be renamed if relocation ran now.
    pub fn principal_item(&self) -> Option<&MediaItem> {
        let naming = self.naming()?;
        self.select_principal(naming).map(|idx| &self.items[idx])
    }

    fn select_principal(&self, naming: &NamingResult) -> Option<usize> {
        match &naming.principal {
            PrincipalSelection::Named { current_name, .. } => self
                .items
                .iter()
                .position(|item| item.file_name() == current_name),
            PrincipalSelection::Largest => {
                let mut largest: Option<(usize, u64)> = None;
                for (idx, item) in self.items.iter().enumerate() {
                    match item.size_bytes(self.fs.as_ref()) {
                        Ok(size) if largest.map_or(true, |(_, max)| size > max) => {
                            largest = Some((idx, size));
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Could not read size of {}: {}", item.path().display(), e),
                    }
                }
                largest.map(|(idx, _)| idx)
            }
        }
    }

    fn relocate_contents(&mut self, naming: &NamingResult) {
        info!("Starting rename process for {}", naming.title);
        let destination = self.settings.destination_path(&naming.title);

        let principal = match self.select_principal(naming) {
            Some(idx) => self.items[idx].clone(),
            None => {
                error!(
                    "Could not find main title file in {} ({:?}), waiting...",
                    self.name, naming.principal
                );
                return;
            }
        };

        let target = destination.join(naming.principal_target_name(&principal));
        info!(
            "Renaming main title file: {} -> {}",
            principal.file_name(),
            target.display()
        );
        match principal.relocate(self.fs.as_ref(), &target) {
            Ok(Relocation::Moved) => self.drop_item(principal.file_name()),
            Ok(Relocation::SkippedExisting) => {}
            Err(e) => {
                error!(
                    "Error moving main title file {}: {} - will retry",
                    principal.path().display(),
                    e
                );
                return;
            }
        }

        let extras: Vec<MediaItem> = self
            .items
            .iter()
            .filter(|item| item.file_name() != principal.file_name())
            .cloned()
            .collect();

        if !extras.is_empty() {
            let extras_dir = destination.join(EXTRAS_DIR_NAME);
            match self.fs.create_dir(&extras_dir) {
                Ok(()) => debug!("Created extras dir: {}", extras_dir.display()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Extras dir already exists: {}", extras_dir.display())
                }
                Err(e) => {
                    error!(
                        "Error creating extras dir {}: {} - giving up on {}",
                        extras_dir.display(),
                        e,
                        self.name
                    );
                    self.state = DirectoryState::Completed(Completion::Abandoned {
                        reason: format!("could not create {}: {}", extras_dir.display(), e),
                    });
                    return;
                }
            }

            info!("Moving {} extra file(s) to {}", extras.len(), extras_dir.display());
            for item in extras {
                match item.relocate(self.fs.as_ref(), &extras_dir.join(item.file_name())) {
                    Ok(Relocation::Moved) => self.drop_item(item.file_name()),
                    Ok(Relocation::SkippedExisting) => {}
                    Err(e) => error!("Error moving extra file {}: {}", item.path().display(), e),
                }
            }
        }

        if self.settings.remove_empty_source && self.items.is_empty() {
            self.remove_source();
        }

        info!("Completed directory: {} -> {}", self.name, naming.title);
        self.state = DirectoryState::Completed(Completion::Relocated {
            title: naming.title.clone(),
        });
    }

    fn remove_source(&self) {
        match self.fs.remove_dir(&self.path) {
            Ok(()) => debug!("Removed drained source dir: {}", self.path.display()),
            Err(e) => warn!(
                "Could not remove source dir {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFs;
    use std::fs::{self, File};
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::{tempdir, TempDir};

    const NOT_YET: Duration = Duration::from_secs(3600);

    struct Fixture {
        input: TempDir,
        output: TempDir,
    }

    impl Fixture {
        fn new(dir_name: &str) -> Self {
            let input = tempdir().unwrap();
            let output = tempdir().unwrap();
            fs::create_dir(input.path().join(dir_name)).unwrap();
            Self { input, output }
        }

        fn settings(&self, stale_time: Duration) -> Arc<WatchSettings> {
            Arc::new(
                WatchSettings::new(self.input.path(), self.output.path())
                    .with_stale_time(stale_time),
            )
        }

        fn write(&self, dir_name: &str, file_name: &str, len: usize) {
            fs::write(self.input.path().join(dir_name).join(file_name), vec![7u8; len]).unwrap();
        }

        fn discover(&self, dir_name: &str, settings: Arc<WatchSettings>) -> WatchedDirectory {
            WatchedDirectory::discover(dir_name, settings, Arc::new(RealFs::new()))
        }
    }

    fn names(directory: &WatchedDirectory) -> Vec<&str> {
        directory.items().iter().map(|i| i.file_name()).collect()
    }

    #[test]
    fn test_scan_filters_entries() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "title_t00.mkv", 10);
        fx.write("ALIEN", "README", 10);
        fx.write("ALIEN", "title_t01.mkv.part", 10);
        fs::create_dir(fx.input.path().join("ALIEN").join("BDMV.d")).unwrap();

        let settings = WatchSettings::new(fx.input.path(), fx.output.path())
            .with_ignore_patterns(vec![glob::Pattern::new("*.part").unwrap()]);
        let dir = fx.discover("ALIEN", Arc::new(settings));

        assert_eq!(names(&dir), vec!["title_t00.mkv"]);
        assert_eq!(dir.state(), &DirectoryState::AwaitingName);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        fx.write("ALIEN", "b.srt", 5);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));

        dir.refresh();
        let items = dir.items().to_vec();
        let modified = dir.last_modified();

        dir.refresh();
        assert_eq!(dir.items(), items.as_slice());
        assert_eq!(dir.last_modified(), modified);
    }

    #[test]
    fn test_last_modified_never_decreases() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));
        let first = dir.last_modified();

        let file = File::options()
            .write(true)
            .open(fx.input.path().join("ALIEN").join("a.mkv"))
            .unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        dir.refresh();
        assert!(dir.last_modified() >= first);

        let later = SystemTime::now() + Duration::from_secs(120);
        file.set_modified(later).unwrap();
        dir.refresh();
        assert!(dir.last_modified() > first + Duration::from_secs(60));
        assert!(!dir.is_stale());
    }

    #[test]
    fn test_vanished_files_are_dropped() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", ".a.mkv.tmp", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));
        assert_eq!(names(&dir), vec![".a.mkv.tmp"]);

        fs::rename(
            fx.input.path().join("ALIEN").join(".a.mkv.tmp"),
            fx.input.path().join("ALIEN").join("a.mkv"),
        )
        .unwrap();
        dir.refresh();
        assert_eq!(names(&dir), vec!["a.mkv"]);
    }

    #[test]
    fn test_naming_failure_stalls() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(Duration::ZERO));

        dir.apply_naming(Err(OracleError::Transport("connection refused".into())));
        for _ in 0..3 {
            dir.refresh();
        }

        assert_eq!(dir.state(), &DirectoryState::AwaitingName);
        assert!(!dir.is_destination_initialized());
        assert!(fx.input.path().join("ALIEN").join("a.mkv").exists());
        assert_eq!(fs::read_dir(fx.output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_decision_is_a_naming_failure() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(Duration::ZERO));

        dir.apply_naming(Ok(NamingDecision::titled("../../escape")));

        assert_eq!(dir.state(), &DirectoryState::AwaitingName);
        assert_eq!(fs::read_dir(fx.output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_listing_mode_requires_principal() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let settings = WatchSettings::new(fx.input.path(), fx.output.path())
            .with_naming_mode(NamingMode::FileListing);
        let mut dir = fx.discover("ALIEN", Arc::new(settings));

        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));

        assert_eq!(dir.state(), &DirectoryState::AwaitingName);
    }

    #[test]
    fn test_existing_destination_gives_up() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        fs::create_dir(fx.output.path().join("Alien (1979)")).unwrap();
        let mut dir = fx.discover("ALIEN", fx.settings(Duration::ZERO));

        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));

        assert!(dir.is_completed());
        assert!(!dir.is_destination_initialized());
        assert!(matches!(
            dir.state(),
            DirectoryState::Completed(Completion::Abandoned { .. })
        ));

        dir.refresh();
        assert!(fx.input.path().join("ALIEN").join("a.mkv").exists());
    }

    #[test]
    fn test_naming_applies_once() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));

        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));
        dir.apply_naming(Ok(NamingDecision::titled("Aliens (1986)")));

        assert_eq!(dir.naming().unwrap().title, "Alien (1979)");
        assert!(!fx.output.path().join("Aliens (1986)").exists());
    }

    #[test]
    fn test_waits_until_stale() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));
        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));

        dir.refresh();

        assert!(dir.is_destination_initialized());
        assert!(!dir.is_completed());
        assert!(fx.input.path().join("ALIEN").join("a.mkv").exists());
    }

    #[test]
    fn test_size_tie_picks_first_seen() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "b.mkv", 100);
        fx.write("ALIEN", "a.mkv", 100);
        fx.write("ALIEN", "c.srt", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(NOT_YET));
        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));

        for _ in 0..3 {
            assert_eq!(dir.principal_item().unwrap().file_name(), "a.mkv");
            dir.refresh();
        }
    }

    #[test]
    fn test_missing_named_principal_stalls() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "title_t00.mkv", 10);
        let settings = WatchSettings::new(fx.input.path(), fx.output.path())
            .with_stale_time(Duration::ZERO)
            .with_naming_mode(NamingMode::FileListing);
        let mut dir = fx.discover("ALIEN", Arc::new(settings));
        dir.apply_naming(Ok(NamingDecision::with_principal(
            "Alien (1979)",
            "title_t09.mkv",
            "Alien (1979).mkv",
        )));

        dir.refresh();
        dir.refresh();

        assert!(dir.is_destination_initialized());
        assert!(!dir.is_completed());
        assert!(fx.input.path().join("ALIEN").join("title_t00.mkv").exists());
        assert_eq!(
            fs::read_dir(fx.output.path().join("Alien (1979)")).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_skipped_principal_is_not_moved_to_extras() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 100);
        fx.write("ALIEN", "b.mkv", 10);
        let mut dir = fx.discover("ALIEN", fx.settings(Duration::ZERO));
        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));
        fs::write(fx.output.path().join("Alien (1979)").join("Alien (1979).mkv"), "x").unwrap();

        dir.refresh();

        assert!(dir.is_completed());
        assert_eq!(names(&dir), vec!["a.mkv"]);
        let extras = fx.output.path().join("Alien (1979)").join(EXTRAS_DIR_NAME);
        assert!(extras.join("b.mkv").exists());
        assert!(!extras.join("a.mkv").exists());
        assert!(fx.input.path().join("ALIEN").exists());
    }

    /// Real filesystem that refuses to create any `extras` directory.
    struct NoExtrasFs;

    impl FileSystem for NoExtrasFs {
        fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
            RealFs.list_dir(path)
        }

        fn metadata(&self, path: &Path) -> io::Result<crate::fs::FsMetadata> {
            RealFs.metadata(path)
        }

        fn exists(&self, path: &Path) -> bool {
            RealFs.exists(path)
        }

        fn create_dir(&self, path: &Path) -> io::Result<()> {
            if path.ends_with(EXTRAS_DIR_NAME) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            RealFs.create_dir(path)
        }

        fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64> {
            RealFs.copy_file(src, dst)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            RealFs.remove_file(path)
        }

        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            RealFs.remove_dir(path)
        }
    }

    #[test]
    fn test_extras_failure_keeps_destination_initialized() {
        let fx = Fixture::new("ALIEN");
        fx.write("ALIEN", "a.mkv", 100);
        fx.write("ALIEN", "b.srt", 10);
        let mut dir =
            WatchedDirectory::discover("ALIEN", fx.settings(Duration::ZERO), Arc::new(NoExtrasFs));
        dir.apply_naming(Ok(NamingDecision::titled("Alien (1979)")));

        dir.refresh();

        assert!(matches!(
            dir.state(),
            DirectoryState::Completed(Completion::Abandoned { .. })
        ));
        assert!(dir.is_destination_initialized());
        assert!(fx.output.path().join("Alien (1979)").join("Alien (1979).mkv").exists());
        assert_eq!(names(&dir), vec!["b.srt"]);
    }
}
