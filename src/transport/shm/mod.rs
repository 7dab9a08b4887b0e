//! Shared-memory transport over a file mapped with `MAP_SHARED`.
//!
//! Both sides exchange one request and one response at a time through two
//! flag words: the host raises `request`, the worker answers by lowering
//! `request` and raising `response`, the host lowers `response` once read.

mod host;
mod layout;
mod segment;
mod worker;

pub use host::{HostResponse, ShmHost};
pub use layout::{Layout, MESSAGE_CAPACITY};
pub use worker::ShmTransport;
