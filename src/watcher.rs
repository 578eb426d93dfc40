use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::WatchSettings;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::naming::NamingOracle;
use crate::registry::DirectoryRegistry;

/// Cooperative stop signal for [`InputWatcher::watch`]. Cloneable, so a
/// signal handler can hold one while the loop runs.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop. A running cycle finishes first; a sleeping loop
    /// wakes immediately.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Polls the input root, registers new directories and re-evaluates all of
/// them, once per interval.
pub struct InputWatcher {
    registry: DirectoryRegistry,
    settings: Arc<WatchSettings>,
    fs: Arc<dyn FileSystem>,
    shutdown: ShutdownHandle,
}

impl InputWatcher {
    pub fn new(
        settings: Arc<WatchSettings>,
        fs: Arc<dyn FileSystem>,
        oracle: Arc<dyn NamingOracle>,
    ) -> Self {
        Self {
            registry: DirectoryRegistry::new(Arc::clone(&settings), Arc::clone(&fs), oracle),
            settings,
            fs,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn stop(&self) {
        self.shutdown.stop();
    }

    pub fn registry(&self) -> &DirectoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DirectoryRegistry {
        &mut self.registry
    }

    /// Run cycles until stopped. The stop flag is checked before each cycle.
    ///
    /// Cycles copy files with blocking I/O, so this needs the multi-threaded
    /// runtime.
    pub async fn watch(&mut self) {
        info!(
            "Starting input dir watcher on {} (every {:?})",
            self.settings.input_dir.display(),
            self.settings.poll_interval
        );

        loop {
            if self.shutdown.is_stopped() {
                info!("Input dir watcher stopped");
                break;
            }

            tokio::task::block_in_place(|| self.run_cycle());

            tokio::select! {
                _ = sleep(self.settings.poll_interval) => {}
                _ = self.shutdown.wake.notified() => {
                    debug!("Input dir watcher woken by stop request");
                }
            }
        }
    }

    /// One cycle: list the root, register what is new, re-evaluate everyone.
    pub fn run_cycle(&mut self) {
        info!("Checking input dir...");
        match self.discover() {
            Ok(count) => debug!("{} directories present in input dir", count),
            Err(e) => error!(
                "Error reading input dir {}: {}",
                self.settings.input_dir.display(),
                e
            ),
        }

        self.registry.reevaluate_all();
    }

    fn discover(&mut self) -> Result<usize, Error> {
        let names = self.fs.list_dir(&self.settings.input_dir)?;

        let mut directories = 0;
        for name in names {
            let path = self.settings.source_path(&name);
            match self.fs.metadata(&path) {
                Ok(metadata) if metadata.is_dir => {
                    self.registry.register(&name);
                    directories += 1;
                }
                Ok(_) => debug!("Ignoring non-directory entry in input dir: {}", name),
                Err(e) => warn!("Could not stat {}: {}", path.display(), e),
            }
        }

        Ok(directories)
    }
}
