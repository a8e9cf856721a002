//! Prompt service client crate for promptops.
//!
//! Provides a backend-agnostic [`VersionClient`] trait for the version
//! workflow of a remote prompt service (create draft, push, publish, list
//! and fetch documents), together with its backends.
//!
//! # Backends
//! - **http**: the prompt service over HTTP (default)
//! - **memory**: an in-process service used by tests and dry runs
//!
//! # Example
//! ```no_run
//! use promptops_client::{providers::InMemoryVersionClient, DocumentChange, VersionClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InMemoryVersionClient::new();
//! let draft = client.create_version("Draft").await?;
//! client.push_changes(&draft.uuid, &[DocumentChange::added("a", "Hi")]).await?;
//! client.publish_version(&draft.uuid).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{transmittable, VersionClient};
pub use factory::create_client;
pub use providers::{ClientCall, HttpVersionClient, InMemoryVersionClient};
pub use types::{
    ChangeStatus, Document, DocumentChange, PushResult, Version, VersionStatus, LIVE_VERSION,
};
