pub mod batch_persister;
pub mod cell_classifier;
pub mod column_locator;
pub mod error;
pub mod executor;
pub mod grid;
pub mod progress_tracker;
pub mod reducer;
pub mod source_reader;

#[cfg(test)]
mod memory_store;

pub use error::ImportError;
pub use executor::ImportExecutor;
pub use progress_tracker::ProgressTracker;
