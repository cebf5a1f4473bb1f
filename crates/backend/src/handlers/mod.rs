pub mod a001_estimate;
pub mod usecases;
