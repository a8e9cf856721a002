//! Deploy pipeline for promptops.
//!
//! Takes local prompt documents to the remote live version:
//! - Content hashing and diffing against live
//! - All-or-nothing local validation before any remote call
//! - Draft → push → publish through a [`promptops_client::VersionClient`]
//! - Localization of the documents behind a rejected publish
//!
//! # Example
//! ```no_run
//! use promptops_client::InMemoryVersionClient;
//! use promptops_deploy::Deployer;
//! use promptops_prompt::LocalDocument;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let deployer = Deployer::new(Arc::new(InMemoryVersionClient::new()));
//! let documents = vec![LocalDocument::new("greet", "<user>Hello {{name}}</user>")];
//! let result = deployer.deploy_documents(&documents, Some("First deploy")).await?;
//! println!("Published {} ({} documents)", result.version.uuid, result.documents_processed);
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod hash;
pub mod localizer;
pub mod orchestrator;
pub mod report;

// Re-export main types
pub use diff::{compute_diff, normalize_path, paths_with_status};
pub use hash::content_hash;
pub use localizer::{
    FailedDocument, Localizer, Probe, ProbeOutcome, RemoteProbe, LINEAR_PROBE_LIMIT,
};
pub use orchestrator::{DeployPlan, DeployResult, Deployer};
pub use report::{flatten_error_details, format_failures, format_issue, format_validation_report};
