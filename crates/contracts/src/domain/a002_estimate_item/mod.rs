pub mod aggregate;

pub use aggregate::{EstimateItem, EstimateRecord};
