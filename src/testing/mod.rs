//! Test doubles for the classifier and transport seams.

pub mod dummies;
pub mod spies;
pub mod transports;
