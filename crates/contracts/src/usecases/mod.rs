pub mod u101_import_estimate;
