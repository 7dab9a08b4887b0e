pub mod attributes;
pub mod dataset;
pub mod estimators;
pub mod instance;
pub mod instance_header;
