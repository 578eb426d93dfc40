use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::WatchSettings;
use crate::fs::FileSystem;
use crate::media::WatchedDirectory;
use crate::naming::{NamingDecision, NamingOracle, OracleError};

/// Result of one naming request, sent back from the oracle task.
#[derive(Debug)]
pub struct NamingOutcome {
    pub directory: String,
    pub result: Result<NamingDecision, OracleError>,
}

/// Every directory ever seen under the input root, by name.
///
/// Naming requests run as independent tasks and report back over a channel.
/// Their outcomes are only applied from `&mut self` methods, so a directory
/// is never mutated by two parties at once.
pub struct DirectoryRegistry {
    directories: HashMap<String, WatchedDirectory>,
    settings: Arc<WatchSettings>,
    fs: Arc<dyn FileSystem>,
    oracle: Arc<dyn NamingOracle>,
    outcomes_tx: UnboundedSender<NamingOutcome>,
    outcomes_rx: UnboundedReceiver<NamingOutcome>,
    in_flight: usize,
}

impl DirectoryRegistry {
    pub fn new(
        settings: Arc<WatchSettings>,
        fs: Arc<dyn FileSystem>,
        oracle: Arc<dyn NamingOracle>,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            directories: HashMap::new(),
            settings,
            fs,
            oracle,
            outcomes_tx,
            outcomes_rx,
            in_flight: 0,
        }
    }

    /// Return the directory called `name`, discovering it first if it is new.
    /// Discovery scans synchronously and starts the single naming request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(&mut self, name: &str) -> &WatchedDirectory {
        if self.directories.contains_key(name) {
            debug!("Directory already registered: {}", name);
            return &self.directories[name];
        }

        let directory =
            WatchedDirectory::discover(name, Arc::clone(&self.settings), Arc::clone(&self.fs));
        self.request_naming(&directory);

        self.directories
            .entry(name.to_string())
            .or_insert(directory)
    }

    fn request_naming(&mut self, directory: &WatchedDirectory) {
        let request = directory.naming_request();
        let name = directory.name().to_string();
        let oracle = Arc::clone(&self.oracle);
        let outcomes = self.outcomes_tx.clone();

        debug!("Requesting name for {}", name);
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = oracle.name_directory(&request).await;
            if outcomes.send(NamingOutcome { directory: name, result }).is_err() {
                warn!("Registry is gone, dropping naming result");
            }
        });
    }

    /// Apply every naming outcome that has arrived so far. Returns how many.
    pub fn apply_naming_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Wait until every naming request issued so far has reported back, and
    /// apply the outcomes.
    pub async fn wait_for_naming(&mut self) {
        while self.in_flight > 0 {
            match self.outcomes_rx.recv().await {
                Some(outcome) => self.apply_outcome(outcome),
                None => break,
            }
        }
    }

    fn apply_outcome(&mut self, outcome: NamingOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match self.directories.get_mut(&outcome.directory) {
            Some(directory) => directory.apply_naming(outcome.result),
            None => warn!(
                "Naming result for unknown directory {}, ignoring",
                outcome.directory
            ),
        }
    }

    /// Apply pending naming outcomes, then refresh every directory that is
    /// not completed.
    pub fn reevaluate_all(&mut self) {
        self.apply_naming_outcomes();

        let pending = self
            .directories
            .values()
            .filter(|directory| !directory.is_completed())
            .count();
        info!(
            "Checking {} of {} directories...",
            pending,
            self.directories.len()
        );

        for directory in self.directories.values_mut() {
            if directory.is_completed() {
                continue;
            }
            directory.refresh();
        }
    }

    pub fn get(&self, name: &str) -> Option<&WatchedDirectory> {
        self.directories.get(name)
    }

    pub fn directories(&self) -> impl Iterator<Item = &WatchedDirectory> {
        self.directories.values()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Naming requests started but not yet applied.
    pub fn pending_naming(&self) -> usize {
        self.in_flight
    }
}
