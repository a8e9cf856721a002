//! Prompt document handling for promptops.
//!
//! This crate covers everything that happens to a prompt document before it
//! reaches the remote service:
//! - Loading documents from a local directory
//! - Static checking of the configuration block, template body and message tags
//! - Enriching diagnostics with root causes, suggestions and code frames
//! - All-or-nothing batch validation

pub mod catalog;
pub mod checker;
pub mod frame;
pub mod loader;
pub mod types;
pub mod validator;

// Re-export main types
pub use catalog::{explain, Explanation};
pub use checker::{PromptChecker, StaticChecker, MESSAGE_TAGS};
pub use frame::code_frame;
pub use loader::load_documents;
pub use types::{
    Diagnostic, DocumentIssues, IssueType, LocalDocument, SourceLocation, ValidationIssue,
    ValidationReport,
};
pub use validator::{enrich, Validator, PARSE_ERROR_CODE};
