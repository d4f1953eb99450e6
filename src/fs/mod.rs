pub mod search;
pub mod watcher;
pub mod workspace;
