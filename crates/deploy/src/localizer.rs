//! Failure localization.
//!
//! When the remote rejects a batch publish, the localizer works out which
//! documents caused it. Offline problems are found by re-running the
//! validator; only a locally clean batch is probed against the remote,
//! either one document at a time (small batches) or by bisection.

use crate::report::flatten_error_details;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use promptops_client::{ChangeStatus, DocumentChange, VersionClient};
use promptops_core::{ApiError, ApiErrorKind, AppError};
use promptops_prompt::{explain, SourceLocation, ValidationIssue, Validator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Batches up to this size are probed one document at a time.
pub const LINEAR_PROBE_LIMIT: usize = 5;

/// A document blamed for a rejected publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDocument {
    pub path: String,
    pub code: String,
    pub message: String,
    pub root_cause: String,
    pub suggestion: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_frame: Option<String>,
}

impl FailedDocument {
    /// Blame a document for its local validation errors.
    fn from_local(path: &str, errors: &[ValidationIssue]) -> Option<Self> {
        let first = errors.first()?;
        let message = errors
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        Some(Self {
            path: path.to_string(),
            code: first.code.clone(),
            message,
            root_cause: first.root_cause.clone(),
            suggestion: first.suggestion.clone(),
            location: first.location,
            code_frame: first.code_frame.clone(),
        })
    }

    /// Blame a document for a remote rejection, folding in whatever the
    /// local validator still has to say about it.
    fn from_remote(path: &str, error: &ApiError, warnings: &[ValidationIssue]) -> Self {
        let explanation = explain(&error.code);

        let mut message = error.message.clone();
        if let Some(details) = &error.details {
            let lines = flatten_error_details(details);
            if !lines.is_empty() {
                message = format!("{} ({})", message, lines.join("; "));
            }
        }

        let mut suggestion = explanation.suggestion.to_string();
        for warning in warnings {
            suggestion.push_str(&format!(
                " Also check [{}]: {}",
                warning.code, warning.suggestion
            ));
        }

        let located = warnings.iter().find(|w| w.location.is_some());

        Self {
            path: path.to_string(),
            code: error.code.clone(),
            message,
            root_cause: explanation.root_cause.to_string(),
            suggestion,
            location: located.and_then(|w| w.location),
            code_frame: located.and_then(|w| w.code_frame.clone()),
        }
    }
}

/// Result of test-publishing a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The remote accepted the batch
    Passed,
    /// The remote rejected the batch
    Rejected(ApiError),
    /// The probe could not reach a verdict on the documents
    Inconclusive(String),
}

/// Capability to test whether the remote accepts a batch of changes.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, batch: &[DocumentChange]) -> ProbeOutcome;
}

/// Probe that pushes the batch to a throwaway draft and tries to publish it.
///
/// Probe drafts are left behind in the remote.
pub struct RemoteProbe {
    client: Arc<dyn VersionClient>,
}

impl RemoteProbe {
    pub fn new(client: Arc<dyn VersionClient>) -> Self {
        Self { client }
    }

    async fn try_publish(&self, batch: &[DocumentChange]) -> ProbeOutcome {
        let name = probe_name();
        let draft = match self.client.create_version(&name).await {
            Ok(draft) => draft,
            Err(err) => return ProbeOutcome::Inconclusive(format!("create failed: {}", err)),
        };
        if let Err(err) = self.client.push_changes(&draft.uuid, batch).await {
            return ProbeOutcome::Inconclusive(format!("push failed: {}", err));
        }

        match self.client.publish_version(&draft.uuid).await {
            Ok(_) => ProbeOutcome::Passed,
            Err(AppError::Api(err)) if blames_documents(&err) => ProbeOutcome::Rejected(err),
            Err(err) => ProbeOutcome::Inconclusive(err.to_string()),
        }
    }
}

/// Whether a publish error is a verdict on the published documents.
///
/// Auth, rate limiting, missing resources and server-side failures say
/// nothing about content.
fn blames_documents(err: &ApiError) -> bool {
    match err.kind {
        ApiErrorKind::DocumentValidation => true,
        ApiErrorKind::Remote => {
            (400..500).contains(&err.status) && !matches!(err.status, 401 | 403 | 404 | 408 | 429)
        }
        _ => false,
    }
}

fn probe_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "Localization probe {} {}",
        Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        &id[..8]
    )
}

#[async_trait]
impl Probe for RemoteProbe {
    async fn probe(&self, batch: &[DocumentChange]) -> ProbeOutcome {
        self.try_publish(batch).await
    }
}

/// Identifies the documents responsible for a rejected publish.
pub struct Localizer {
    probe: Arc<dyn Probe>,
    validator: Validator,
}

impl Localizer {
    pub fn new(probe: Arc<dyn Probe>, validator: Validator) -> Self {
        Self { probe, validator }
    }

    /// Find the failing documents among `changes`.
    ///
    /// Deletions and unchanged entries are never blamed. Each failing
    /// document is reported once; an empty result means the rejection
    /// could not be attributed to any document.
    pub async fn identify_failing_documents(
        &self,
        changes: &[DocumentChange],
    ) -> Vec<FailedDocument> {
        let candidates: Vec<DocumentChange> = changes
            .iter()
            .filter(|c| matches!(c.status, ChangeStatus::Added | ChangeStatus::Modified))
            .cloned()
            .collect();

        let local = self.local_failures(&candidates);
        if !local.is_empty() {
            tracing::info!(
                "Localized {} failing document(s) without probing",
                local.len()
            );
            return local;
        }

        tracing::info!("Probing {} document(s) against the remote", candidates.len());

        let failures = if candidates.len() <= LINEAR_PROBE_LIMIT {
            let mut failures = Vec::new();
            for change in &candidates {
                failures.extend(self.probe_one(change).await);
            }
            failures
        } else {
            self.bisect(&candidates).await
        };

        tracing::info!("Localized {} failing document(s)", failures.len());
        failures
    }

    fn local_failures(&self, candidates: &[DocumentChange]) -> Vec<FailedDocument> {
        candidates
            .iter()
            .filter_map(|change| {
                let errors = self.validator.errors(&change.content, &change.path);
                FailedDocument::from_local(&change.path, &errors)
            })
            .collect()
    }

    async fn probe_one(&self, change: &DocumentChange) -> Option<FailedDocument> {
        match self.probe.probe(std::slice::from_ref(change)).await {
            ProbeOutcome::Passed => None,
            ProbeOutcome::Rejected(err) => {
                tracing::debug!("Probe rejected {}: {}", change.path, err);
                let warnings = self.validator.validate(&change.content, &change.path);
                Some(FailedDocument::from_remote(&change.path, &err, &warnings))
            }
            ProbeOutcome::Inconclusive(reason) => {
                tracing::warn!("Probe for {} was inconclusive: {}", change.path, reason);
                None
            }
        }
    }

    fn bisect<'a>(&'a self, batch: &'a [DocumentChange]) -> BoxFuture<'a, Vec<FailedDocument>> {
        async move {
            match batch {
                [] => return Vec::new(),
                [single] => return self.probe_one(single).await.into_iter().collect(),
                _ => {}
            }

            match self.probe.probe(batch).await {
                ProbeOutcome::Passed => Vec::new(),
                ProbeOutcome::Inconclusive(reason) => {
                    tracing::warn!(
                        "Probe for {} document(s) was inconclusive: {}",
                        batch.len(),
                        reason
                    );
                    Vec::new()
                }
                ProbeOutcome::Rejected(_) => {
                    let (left, right) = batch.split_at(batch.len() / 2);
                    let (mut failures, rest) =
                        futures::join!(self.bisect(left), self.bisect(right));
                    failures.extend(rest);
                    failures
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptops_client::{ClientCall, InMemoryVersionClient};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rejects any batch containing a poisoned path.
    struct PoisonedProbe {
        poisoned: HashSet<String>,
        calls: AtomicUsize,
    }

    impl PoisonedProbe {
        fn new(poisoned: &[String]) -> Self {
            Self {
                poisoned: poisoned.iter().cloned().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Probe for PoisonedProbe {
        async fn probe(&self, batch: &[DocumentChange]) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if batch.iter().any(|c| self.poisoned.contains(&c.path)) {
                ProbeOutcome::Rejected(ApiError::remote(400, "PUBLISH_FAILED", "rejected"))
            } else {
                ProbeOutcome::Passed
            }
        }
    }

    struct FlakyProbe;

    #[async_trait]
    impl Probe for FlakyProbe {
        async fn probe(&self, _batch: &[DocumentChange]) -> ProbeOutcome {
            ProbeOutcome::Inconclusive("connection reset".to_string())
        }
    }

    fn batch(n: usize) -> Vec<DocumentChange> {
        (0..n)
            .map(|i| DocumentChange::added(format!("doc-{}", i), format!("Prompt number {}", i)))
            .collect()
    }

    fn localizer(probe: Arc<dyn Probe>) -> Localizer {
        Localizer::new(probe, Validator::new())
    }

    fn failing_paths(failures: &[FailedDocument]) -> HashSet<String> {
        failures.iter().map(|f| f.path.clone()).collect()
    }

    #[tokio::test]
    async fn test_finds_exactly_poisoned_documents() {
        for n in 1..=16 {
            let changes = batch(n);
            let subsets: Vec<Vec<usize>> = vec![
                vec![0],
                vec![n - 1],
                vec![n / 2],
                (0..n).step_by(3).collect(),
                (0..n).collect(),
            ];

            for subset in subsets {
                let poisoned: Vec<String> =
                    subset.iter().map(|i| changes[*i].path.clone()).collect();
                let probe = Arc::new(PoisonedProbe::new(&poisoned));
                let failures = localizer(probe).identify_failing_documents(&changes).await;

                assert_eq!(failures.len(), failing_paths(&failures).len(), "n={}", n);
                assert_eq!(
                    failing_paths(&failures),
                    poisoned.into_iter().collect::<HashSet<_>>(),
                    "n={}",
                    n
                );
            }
        }
    }

    #[tokio::test]
    async fn test_sparse_failure_uses_fewer_probes_than_documents() {
        let changes = batch(16);
        let probe = Arc::new(PoisonedProbe::new(&[changes[7].path.clone()]));
        let failures = localizer(probe.clone())
            .identify_failing_documents(&changes)
            .await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code, "PUBLISH_FAILED");
        assert!(probe.calls.load(Ordering::SeqCst) < changes.len());
    }

    #[tokio::test]
    async fn test_small_batches_probe_each_document() {
        let changes = batch(4);
        let probe = Arc::new(PoisonedProbe::new(&[changes[2].path.clone()]));
        let failures = localizer(probe.clone())
            .identify_failing_documents(&changes)
            .await;

        assert_eq!(failing_paths(&failures), HashSet::from(["doc-2".to_string()]));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_local_errors_skip_probing() {
        let mut changes = batch(3);
        changes[1].content = "<user>never closed".to_string();
        let probe = Arc::new(PoisonedProbe::new(&[]));

        let failures = localizer(probe.clone())
            .identify_failing_documents(&changes)
            .await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "doc-1");
        assert_eq!(failures[0].code, "unclosed-message-tag");
        assert!(failures[0].code_frame.is_some());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deletions_are_never_blamed() {
        let changes = vec![DocumentChange::deleted("gone")];
        let probe = Arc::new(PoisonedProbe::new(&["gone".to_string()]));

        let failures = localizer(probe.clone())
            .identify_failing_documents(&changes)
            .await;

        assert!(failures.is_empty());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inconclusive_probes_blame_nothing() {
        let failures = localizer(Arc::new(FlakyProbe))
            .identify_failing_documents(&batch(8))
            .await;
        assert!(failures.is_empty());
    }

    fn publish_rejecting(status: u16) -> Arc<InMemoryVersionClient> {
        Arc::new(InMemoryVersionClient::new().with_publish_rule(move |_| {
            Some(ApiError::remote(status, "PUBLISH_FAILED", "rejected"))
        }))
    }

    #[tokio::test]
    async fn test_publish_verdicts_by_status() {
        for status in [400, 409, 422] {
            let probe = RemoteProbe::new(publish_rejecting(status));
            let outcome = probe.probe(&batch(1)).await;
            assert!(
                matches!(outcome, ProbeOutcome::Rejected(ref e) if e.status == status),
                "status {}",
                status
            );
        }

        for status in [401, 403, 404, 429, 500, 503] {
            let probe = RemoteProbe::new(publish_rejecting(status));
            let outcome = probe.probe(&batch(1)).await;
            assert!(
                matches!(outcome, ProbeOutcome::Inconclusive(_)),
                "status {}",
                status
            );
        }
    }

    #[tokio::test]
    async fn test_create_and_push_failures_are_inconclusive() {
        let create = Arc::new(
            InMemoryVersionClient::new()
                .with_create_failure(ApiError::remote(400, "BAD_NAME", "bad name")),
        );
        let push = Arc::new(
            InMemoryVersionClient::new()
                .with_push_failure(ApiError::remote(422, "BAD_PUSH", "bad push")),
        );

        for client in [create, push] {
            let outcome = RemoteProbe::new(client.clone()).probe(&batch(2)).await;
            assert!(matches!(outcome, ProbeOutcome::Inconclusive(_)));
            assert!(!client
                .calls()
                .iter()
                .any(|c| matches!(c, ClientCall::PublishVersion(_))));
        }
    }

    #[tokio::test]
    async fn test_accepted_batch_passes() {
        let client = Arc::new(InMemoryVersionClient::new());
        let outcome = RemoteProbe::new(client.clone()).probe(&batch(2)).await;

        assert_eq!(outcome, ProbeOutcome::Passed);
        let title = &client.versions()[0].title;
        assert!(title.starts_with("Localization probe "), "{}", title);
    }

    #[test]
    fn test_remote_failure_folds_in_warnings_and_details() {
        let error = ApiError::remote(422, "UNKNOWN_MODEL", "Model not available")
            .with_details(serde_json::json!([{ "path": "p", "message": "model gpt-9" }]));
        let warnings = Validator::new().validate("---\ntemperature: 1\n---\nHi", "p");

        let failure = FailedDocument::from_remote("p", &error, &warnings);

        assert_eq!(failure.code, "UNKNOWN_MODEL");
        assert_eq!(failure.message, "Model not available (p: model gpt-9)");
        assert!(failure.suggestion.contains("[missing-model]"));
        assert_eq!(failure.location, Some(SourceLocation::new(1, 1)));
    }
}
