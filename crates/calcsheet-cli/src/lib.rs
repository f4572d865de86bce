pub mod grid;
pub mod menu;
pub mod storage;

pub use storage::{load, save, StorageError};
