pub mod aggregate;

pub use aggregate::{Estimate, EstimateDto, EstimateId};
