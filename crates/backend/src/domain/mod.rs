pub mod a001_estimate;
pub mod a002_estimate_item;
