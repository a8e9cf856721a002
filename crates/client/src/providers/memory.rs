//! In-process prompt service.
//!
//! Keeps versions and documents in memory and mimics the remote's rules:
//! drafts fork from live, pushes are only accepted by drafts, publishing
//! runs a pluggable validation rule and moves the live pointer. Every call
//! is recorded so tests can assert on what reached the "remote".

use crate::client::{transmittable, VersionClient};
use crate::types::{
    ChangeStatus, Document, DocumentChange, PushResult, Version, VersionStatus, LIVE_VERSION,
};
use chrono::Utc;
use promptops_core::{ApiError, AppResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Publish-time validation hook. Receives every document of the version
/// being published; returning an error rejects the publish.
pub type PublishRule = Arc<dyn Fn(&[Document]) -> Option<ApiError> + Send + Sync>;

/// A call received by [`InMemoryVersionClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    CreateVersion(String),
    PushChanges {
        version_uuid: String,
        paths: Vec<String>,
    },
    PublishVersion(String),
    ListDocuments(String),
    GetDocument {
        version_ref: String,
        path: String,
    },
    ListVersions,
    GetVersion(String),
}

impl ClientCall {
    /// Whether the call mutates remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateVersion(_) | Self::PushChanges { .. } | Self::PublishVersion(_)
        )
    }
}

#[derive(Debug, Clone)]
struct StoredVersion {
    version: Version,
    documents: BTreeMap<String, Document>,
}

#[derive(Default)]
struct State {
    versions: Vec<StoredVersion>,
    live: Option<usize>,
    commits: u64,
    calls: Vec<ClientCall>,
}

/// In-memory prompt service backend.
#[derive(Default)]
pub struct InMemoryVersionClient {
    state: Mutex<State>,
    publish_rule: Option<PublishRule>,
    create_failure: Option<ApiError>,
    push_failure: Option<ApiError>,
}

impl InMemoryVersionClient {
    /// Empty project without a live version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a published live version holding `documents`.
    ///
    /// Seeding is not recorded as a call.
    pub fn with_live_documents(self, documents: Vec<Document>) -> Self {
        {
            let mut state = self.state();
            let id = state.versions.len() as i64 + 1;
            let now = Utc::now();
            let version = Version {
                id,
                uuid: format!("version-{}", id),
                title: "Initial version".to_string(),
                status: VersionStatus::Live,
                created_at: Some(now),
                updated_at: Some(now),
                merged_at: Some(now),
            };
            let documents = documents
                .into_iter()
                .map(|doc| (doc.path.clone(), doc))
                .collect();
            state.versions.push(StoredVersion { version, documents });
            state.live = Some(state.versions.len() - 1);
        }
        self
    }

    /// Install a publish-time validation rule.
    pub fn with_publish_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&[Document]) -> Option<ApiError> + Send + Sync + 'static,
    {
        self.publish_rule = Some(Arc::new(rule));
        self
    }

    /// Make every `create_version` call fail with `error`.
    pub fn with_create_failure(mut self, error: ApiError) -> Self {
        self.create_failure = Some(error);
        self
    }

    /// Make every `push_changes` call fail with `error`.
    pub fn with_push_failure(mut self, error: ApiError) -> Self {
        self.push_failure = Some(error);
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.state().calls.clone()
    }

    /// Number of calls that mutated remote state.
    pub fn mutation_count(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Documents currently published as live.
    pub fn live_documents(&self) -> Vec<Document> {
        let state = self.state();
        state
            .live
            .map(|idx| state.versions[idx].documents.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every version, oldest first.
    pub fn versions(&self) -> Vec<Version> {
        self.state()
            .versions
            .iter()
            .map(|stored| stored.version.clone())
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl State {
    fn record(&mut self, call: ClientCall) {
        self.calls.push(call);
    }

    fn resolve(&self, version_ref: &str) -> Result<usize, ApiError> {
        let found = if version_ref == LIVE_VERSION {
            self.live
        } else {
            self.versions
                .iter()
                .position(|stored| stored.version.uuid == version_ref)
        };

        found.ok_or_else(|| {
            ApiError::remote(
                404,
                "NOT_FOUND",
                format!("Version not found: {}", version_ref),
            )
        })
    }
}

#[async_trait::async_trait]
impl VersionClient for InMemoryVersionClient {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn create_version(&self, name: &str) -> AppResult<Version> {
        let mut state = self.state();
        state.record(ClientCall::CreateVersion(name.to_string()));

        if let Some(err) = &self.create_failure {
            return Err(err.clone().into());
        }

        let id = state.versions.len() as i64 + 1;
        let now = Utc::now();
        let version = Version {
            id,
            uuid: format!("version-{}", id),
            title: name.to_string(),
            status: VersionStatus::Draft,
            created_at: Some(now),
            updated_at: Some(now),
            merged_at: None,
        };

        let documents = state
            .live
            .map(|idx| state.versions[idx].documents.clone())
            .unwrap_or_default();

        state.versions.push(StoredVersion {
            version: version.clone(),
            documents,
        });

        Ok(version)
    }

    async fn push_changes(
        &self,
        version_uuid: &str,
        changes: &[DocumentChange],
    ) -> AppResult<PushResult> {
        let changes = transmittable(changes);
        let mut state = self.state();
        state.record(ClientCall::PushChanges {
            version_uuid: version_uuid.to_string(),
            paths: changes.iter().map(|c| c.path.clone()).collect(),
        });

        if let Some(err) = &self.push_failure {
            return Err(err.clone().into());
        }

        let idx = state.resolve(version_uuid)?;
        if !state.versions[idx].version.status.is_mutable() {
            return Err(ApiError::remote(
                409,
                "VERSION_NOT_DRAFT",
                format!("Version {} is not a draft", version_uuid),
            )
            .into());
        }

        state.commits += 1;
        let commit_ref = format!("{}-commit-{}", version_uuid, state.commits);

        let stored = &mut state.versions[idx];
        for change in &changes {
            match change.status {
                ChangeStatus::Added | ChangeStatus::Modified => {
                    stored.documents.insert(
                        change.path.clone(),
                        Document {
                            path: change.path.clone(),
                            content: change.content.clone(),
                            content_hash: change.content_hash.clone(),
                            document_uuid: None,
                        },
                    );
                }
                ChangeStatus::Deleted => {
                    stored.documents.remove(&change.path);
                }
                ChangeStatus::Unchanged => {}
            }
        }
        stored.version.updated_at = Some(Utc::now());

        Ok(PushResult {
            commit_ref,
            documents_processed: Some(changes.len()),
        })
    }

    async fn publish_version(&self, version_ref: &str) -> AppResult<Version> {
        let mut state = self.state();
        state.record(ClientCall::PublishVersion(version_ref.to_string()));

        let idx = state.resolve(version_ref)?;
        if !state.versions[idx].version.status.is_mutable() {
            return Err(ApiError::remote(
                409,
                "VERSION_NOT_DRAFT",
                format!("Version {} is already published", version_ref),
            )
            .into());
        }

        if let Some(rule) = &self.publish_rule {
            let documents: Vec<Document> =
                state.versions[idx].documents.values().cloned().collect();
            if let Some(err) = rule(&documents) {
                return Err(err.into());
            }
        }

        let now = Utc::now();
        if let Some(previous) = state.live {
            state.versions[previous].version.status = VersionStatus::Merged;
        }

        let stored = &mut state.versions[idx];
        stored.version.status = VersionStatus::Live;
        stored.version.merged_at = Some(now);
        stored.version.updated_at = Some(now);
        let published = stored.version.clone();
        state.live = Some(idx);

        Ok(published)
    }

    async fn list_documents(&self, version_ref: &str) -> AppResult<Vec<Document>> {
        let mut state = self.state();
        state.record(ClientCall::ListDocuments(version_ref.to_string()));

        match state.resolve(version_ref) {
            Ok(idx) => Ok(state.versions[idx].documents.values().cloned().collect()),
            Err(_) if version_ref == LIVE_VERSION => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_document(&self, version_ref: &str, path: &str) -> AppResult<Document> {
        let mut state = self.state();
        state.record(ClientCall::GetDocument {
            version_ref: version_ref.to_string(),
            path: path.to_string(),
        });

        let idx = state.resolve(version_ref)?;
        state.versions[idx]
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ApiError::remote(404, "NOT_FOUND", format!("Document not found: {}", path)).into()
            })
    }

    async fn list_versions(&self) -> AppResult<Vec<Version>> {
        let mut state = self.state();
        state.record(ClientCall::ListVersions);
        Ok(state.versions.iter().map(|s| s.version.clone()).collect())
    }

    async fn get_version(&self, version_ref: &str) -> AppResult<Version> {
        let mut state = self.state();
        state.record(ClientCall::GetVersion(version_ref.to_string()));
        let idx = state.resolve(version_ref)?;
        Ok(state.versions[idx].version.clone())
    }
}
