pub mod repository;
pub mod store;

pub use store::{EstimateItemStore, SeaOrmEstimateItemStore, StoreError};
