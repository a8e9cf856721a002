//! Domain and wire types shared with the prompt service.
//!
//! Field names follow the service's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pseudo version reference that always resolves to the published snapshot.
pub const LIVE_VERSION: &str = "live";

/// Lifecycle state of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    /// Mutable, unpublished
    #[default]
    Draft,
    /// The current published snapshot
    Live,
    /// A previously published snapshot
    Merged,
}

impl VersionStatus {
    /// Pushes are only accepted while the version is a draft.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

/// A named snapshot of a document set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// Numeric identifier
    #[serde(default)]
    pub id: i64,

    /// Stable identifier used to address the version
    pub uuid: String,

    /// Version title (the service may call it `message`)
    #[serde(default, alias = "message")]
    pub title: String,

    #[serde(default)]
    pub status: VersionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl Version {
    /// Synthetic version describing "nothing happened, live is unchanged".
    pub fn live_placeholder() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            uuid: LIVE_VERSION.to_string(),
            title: LIVE_VERSION.to_string(),
            status: VersionStatus::Live,
            created_at: Some(now),
            updated_at: Some(now),
            merged_at: None,
        }
    }
}

/// A named unit of prompt content living in a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Slash-separated document path, as stored remotely
    pub path: String,

    #[serde(default)]
    pub content: String,

    /// Hex digest of `content`, when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uuid: Option<String>,
}

impl Document {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            content_hash: None,
            document_uuid: None,
        }
    }
}

/// Status of a pending document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl ChangeStatus {
    /// Whether the change must be sent to the remote.
    pub fn is_transmitted(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// A pending mutation to apply to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChange {
    pub path: String,

    /// New content; empty for deletions
    pub content: String,

    pub status: ChangeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DocumentChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            status,
            content_hash: None,
        }
    }

    pub fn added(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(path, content, ChangeStatus::Added)
    }

    pub fn modified(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(path, content, ChangeStatus::Modified)
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self::new(path, String::new(), ChangeStatus::Deleted)
    }

    /// Attach a precomputed content digest.
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }
}

/// Result of pushing a change batch to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    /// Reference to the commit produced by the push
    pub commit_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_processed: Option<usize>,
}
