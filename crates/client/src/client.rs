//! Version client abstraction.
//!
//! This module defines the thin, stateless contract the deploy pipeline
//! uses to talk to the prompt service.

use crate::types::{Document, DocumentChange, PushResult, Version};
use promptops_core::AppResult;

/// Trait for prompt service backends.
///
/// Every failure is reported as `AppError::Api` carrying the normalized
/// [`promptops_core::ApiError`] shape, or `AppError::Config` when the
/// client was built without usable credentials.
#[async_trait::async_trait]
pub trait VersionClient: Send + Sync {
    /// Get the backend name (e.g., "http", "memory").
    fn backend_name(&self) -> &str;

    /// Create a new draft version.
    ///
    /// Either succeeds or fails as a whole; never partially applies.
    async fn create_version(&self, name: &str) -> AppResult<Version>;

    /// Push a batch of changes to a draft in one call.
    ///
    /// `unchanged` entries are never transmitted.
    async fn push_changes(
        &self,
        version_uuid: &str,
        changes: &[DocumentChange],
    ) -> AppResult<PushResult>;

    /// Promote a draft (or its resulting commit) to live.
    async fn publish_version(&self, version_ref: &str) -> AppResult<Version>;

    /// List documents of a version. A project without a live version
    /// yields an empty list for `"live"`.
    async fn list_documents(&self, version_ref: &str) -> AppResult<Vec<Document>>;

    /// Fetch a single document by path.
    async fn get_document(&self, version_ref: &str, path: &str) -> AppResult<Document>;

    /// List versions of the project.
    async fn list_versions(&self) -> AppResult<Vec<Version>>;

    /// Fetch a single version by uuid (or `"live"`).
    async fn get_version(&self, version_ref: &str) -> AppResult<Version>;
}

/// Drop entries that must never reach the remote.
pub fn transmittable(changes: &[DocumentChange]) -> Vec<DocumentChange> {
    changes
        .iter()
        .filter(|change| change.status.is_transmitted())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeStatus;

    #[test]
    fn test_transmittable_filters_unchanged() {
        let changes = vec![
            DocumentChange::added("a", "x"),
            DocumentChange::new("b", "y", ChangeStatus::Unchanged),
            DocumentChange::deleted("c"),
        ];

        let filtered = transmittable(&changes);
        let paths: Vec<&str> = filtered.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "c"]);
    }
}
