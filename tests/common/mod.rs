#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

use dewey::{
    DirectoryRegistry, NamingDecision, NamingOracle, NamingRequest, OracleError, RealFs,
    WatchSettings,
};

/// Always answers with the same decision and records what it was asked.
pub struct FixedOracle {
    decision: NamingDecision,
    requests: Mutex<Vec<NamingRequest>>,
    calls: AtomicUsize,
}

impl FixedOracle {
    pub fn new(decision: NamingDecision) -> Arc<Self> {
        Arc::new(Self {
            decision,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<NamingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NamingOracle for FixedOracle {
    async fn name_directory(&self, request: &NamingRequest) -> Result<NamingDecision, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.decision.clone())
    }
}

/// Fails every request like an unreachable endpoint.
pub struct FailingOracle;

#[async_trait]
impl NamingOracle for FailingOracle {
    async fn name_directory(&self, _request: &NamingRequest) -> Result<NamingDecision, OracleError> {
        Err(OracleError::Transport("connection refused".to_string()))
    }
}

/// Input and output roots that live for the duration of a test.
pub struct Roots {
    pub input: TempDir,
    pub output: TempDir,
}

impl Roots {
    pub fn new() -> Self {
        Self {
            input: tempdir().unwrap(),
            output: tempdir().unwrap(),
        }
    }

    pub fn settings(&self) -> WatchSettings {
        WatchSettings::new(self.input.path(), self.output.path()).with_stale_time(Duration::ZERO)
    }

    pub fn source(&self, dir_name: &str) -> PathBuf {
        self.input.path().join(dir_name)
    }

    pub fn destination(&self, title: &str) -> PathBuf {
        self.output.path().join(title)
    }

    pub fn write(&self, dir_name: &str, file_name: &str, len: usize) -> PathBuf {
        let dir = self.source(dir_name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        fs::write(&path, vec![0x5Au8; len]).unwrap();
        path
    }

    pub fn registry(
        &self,
        settings: WatchSettings,
        oracle: Arc<dyn NamingOracle>,
    ) -> DirectoryRegistry {
        DirectoryRegistry::new(Arc::new(settings), Arc::new(RealFs::new()), oracle)
    }
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn file_len(path: &Path) -> u64 {
    fs::metadata(path).unwrap().len()
}
