//! Prompt service backends.

pub mod http;
pub mod memory;

pub use http::HttpVersionClient;
pub use memory::{ClientCall, InMemoryVersionClient, PublishRule};
