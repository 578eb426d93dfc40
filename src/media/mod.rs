pub mod directory;
pub mod item;

pub use directory::{Completion, DirectoryState, NamingResult, PrincipalSelection, WatchedDirectory};
pub use item::{MediaItem, Relocation};
