pub mod arff;

pub use arff::ArffFileStream;
