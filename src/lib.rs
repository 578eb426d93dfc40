pub mod config;
pub mod error;
pub mod fs;
pub mod media;
pub mod naming;
pub mod registry;
pub mod watcher;

pub use crate::config::{AppConfig, WatchSettings};
pub use crate::error::Error;
pub use crate::fs::{FileSystem, RealFs};
pub use crate::media::{DirectoryState, MediaItem, WatchedDirectory};
pub use crate::naming::{NamingDecision, NamingMode, NamingOracle, NamingRequest, OracleError};
pub use crate::registry::DirectoryRegistry;
pub use crate::watcher::{InputWatcher, ShutdownHandle};
