//! Deploy orchestrator.
//!
//! Drives validate → diff → draft → push → publish. A rejected publish is
//! handed to the [`Localizer`] so the caller gets a per-document report
//! instead of the remote's batch error.

use crate::diff::{compute_diff, paths_with_status};
use crate::localizer::{Localizer, Probe, RemoteProbe};
use crate::report::{format_failures, format_validation_report};
use chrono::Utc;
use promptops_client::{
    transmittable, ChangeStatus, DocumentChange, Version, VersionClient, LIVE_VERSION,
};
use promptops_core::{ApiError, ApiErrorKind, AppError, AppResult};
use promptops_prompt::{LocalDocument, ValidationReport, Validator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a deploy.
///
/// Path lists are the changes that were sent, not re-derived from the
/// remote's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub version: Version,
    pub documents_processed: usize,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,

    /// Commit produced by the push, for draft-only deploys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_ref: Option<String>,
}

impl DeployResult {
    /// Result of a deploy with nothing to do: live is left untouched.
    pub fn noop() -> Self {
        Self {
            version: Version::live_placeholder(),
            documents_processed: 0,
            added: Vec::new(),
            modified: Vec::new(),
            deleted: Vec::new(),
            commit_ref: None,
        }
    }

    fn applied(version: Version, processed: usize, changes: &[DocumentChange]) -> Self {
        Self {
            version,
            documents_processed: processed,
            added: paths_with_status(changes, ChangeStatus::Added),
            modified: paths_with_status(changes, ChangeStatus::Modified),
            deleted: paths_with_status(changes, ChangeStatus::Deleted),
            commit_ref: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.documents_processed == 0
            && self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
    }
}

/// What a deploy would do, computed without mutating the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPlan {
    pub validation: ValidationReport,
    pub changes: Vec<DocumentChange>,
}

impl DeployPlan {
    pub fn paths(&self, status: ChangeStatus) -> Vec<String> {
        paths_with_status(&self.changes, status)
    }
}

/// Deploys prompt documents through a [`VersionClient`].
pub struct Deployer {
    client: Arc<dyn VersionClient>,
    validator: Validator,
    localizer: Localizer,
}

impl Deployer {
    /// Deployer that localizes failures by probing the same client.
    pub fn new(client: Arc<dyn VersionClient>) -> Self {
        let probe: Arc<dyn Probe> = Arc::new(RemoteProbe::new(client.clone()));
        Self::with_probe(client, probe)
    }

    /// Deployer with a custom localization probe.
    pub fn with_probe(client: Arc<dyn VersionClient>, probe: Arc<dyn Probe>) -> Self {
        let validator = Validator::new();
        Self {
            client,
            localizer: Localizer::new(probe, validator.clone()),
            validator,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate, diff against live and deploy a full document set.
    ///
    /// Documents missing from `incoming` are deleted from live. Nothing
    /// reaches the remote unless every document validates.
    pub async fn deploy_documents(
        &self,
        incoming: &[LocalDocument],
        name: Option<&str>,
    ) -> AppResult<DeployResult> {
        self.gate(incoming.iter().map(|d| (d.path.as_str(), d.content.as_str())))?;

        let existing = self.client.list_documents(LIVE_VERSION).await?;
        let changes = compute_diff(incoming, &existing);

        self.publish_changes(transmittable(&changes), name).await
    }

    /// Validate and diff without touching remote state.
    pub async fn plan(&self, incoming: &[LocalDocument]) -> AppResult<DeployPlan> {
        let validation = self
            .validator
            .validate_all(incoming.iter().map(|d| (d.path.as_str(), d.content.as_str())));
        let existing = self.client.list_documents(LIVE_VERSION).await?;

        Ok(DeployPlan {
            validation,
            changes: compute_diff(incoming, &existing),
        })
    }

    /// Apply `changes` to a new draft and publish it.
    ///
    /// An empty change set (after dropping `unchanged` entries) makes no
    /// remote calls and returns [`DeployResult::noop`].
    pub async fn deploy_to_live(
        &self,
        changes: &[DocumentChange],
        name: Option<&str>,
    ) -> AppResult<DeployResult> {
        let changes = transmittable(changes);
        self.gate_changes(&changes)?;
        self.publish_changes(changes, name).await
    }

    /// Apply `changes` to a new draft without publishing it.
    ///
    /// Returns `None` when there is nothing to push.
    pub async fn deploy_to_draft(
        &self,
        changes: &[DocumentChange],
        name: Option<&str>,
    ) -> AppResult<Option<DeployResult>> {
        let changes = transmittable(changes);
        if changes.is_empty() {
            tracing::info!("No changes to push; skipping draft");
            return Ok(None);
        }
        self.gate_changes(&changes)?;

        let name = deploy_name(name);
        let draft = self.client.create_version(&name).await?;
        tracing::info!("Created draft {} ({})", draft.uuid, name);

        let pushed = self.client.push_changes(&draft.uuid, &changes).await?;
        tracing::info!("Pushed {} change(s) to {}", changes.len(), draft.uuid);

        let processed = pushed.documents_processed.unwrap_or(changes.len());
        let mut result = DeployResult::applied(draft, processed, &changes);
        result.commit_ref = Some(pushed.commit_ref);
        Ok(Some(result))
    }

    async fn publish_changes(
        &self,
        changes: Vec<DocumentChange>,
        name: Option<&str>,
    ) -> AppResult<DeployResult> {
        if changes.is_empty() {
            tracing::info!("Live is up to date; nothing to deploy");
            return Ok(DeployResult::noop());
        }

        let name = deploy_name(name);
        let draft = self.client.create_version(&name).await?;
        tracing::info!("Created draft {} ({})", draft.uuid, name);

        let pushed = self.client.push_changes(&draft.uuid, &changes).await?;
        tracing::info!("Pushed {} change(s) to {}", changes.len(), draft.uuid);

        let version = match self.client.publish_version(&draft.uuid).await {
            Ok(version) => version,
            Err(AppError::Api(err)) if err.kind == ApiErrorKind::Remote => {
                tracing::warn!("Publish of {} rejected: {}", draft.uuid, err);
                return Err(self.localize(&changes, err).await);
            }
            Err(err) => return Err(err),
        };
        tracing::info!("Published {} as live", version.uuid);

        let processed = pushed.documents_processed.unwrap_or(changes.len());
        Ok(DeployResult::applied(version, processed, &changes))
    }

    /// Replace a publish rejection with a per-document report when possible.
    async fn localize(&self, changes: &[DocumentChange], original: ApiError) -> AppError {
        let failures = self.localizer.identify_failing_documents(changes).await;
        if failures.is_empty() {
            tracing::info!("Could not attribute the rejection to a document");
            return original.into();
        }

        let mut error = ApiError::document_validation(format_failures(&failures));
        if let Ok(details) = serde_json::to_value(&failures) {
            error = error.with_details(details);
        }
        error.into()
    }

    fn gate_changes(&self, changes: &[DocumentChange]) -> AppResult<()> {
        self.gate(
            changes
                .iter()
                .filter(|c| c.status != ChangeStatus::Deleted)
                .map(|c| (c.path.as_str(), c.content.as_str())),
        )
    }

    fn gate<'a, I>(&self, documents: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let report = self.validator.validate_all(documents);
        if report.valid {
            return Ok(());
        }

        tracing::warn!(
            "Validation failed for {} document(s); aborting deploy",
            report.errors.len()
        );
        Err(AppError::Validation(format_validation_report(&report)))
    }
}

fn deploy_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Deploy {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptops_client::{ClientCall, InMemoryVersionClient};

    #[test]
    fn test_deploy_name() {
        assert_eq!(deploy_name(Some("Release 3")), "Release 3");
        assert!(deploy_name(None).starts_with("Deploy "));
        assert!(deploy_name(Some("  ")).starts_with("Deploy "));
    }

    #[tokio::test]
    async fn test_deploy_to_draft_does_not_publish() {
        let client = Arc::new(InMemoryVersionClient::new());
        let deployer = Deployer::new(client.clone());

        let result = deployer
            .deploy_to_draft(&[DocumentChange::added("a", "Hello")], Some("wip"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.added, vec!["a"]);
        assert!(result.commit_ref.is_some());
        assert!(!client
            .calls()
            .iter()
            .any(|c| matches!(c, ClientCall::PublishVersion(_))));
    }

    #[tokio::test]
    async fn test_deploy_to_draft_without_changes() {
        let client = Arc::new(InMemoryVersionClient::new());
        let deployer = Deployer::new(client.clone());

        let result = deployer
            .deploy_to_draft(&[DocumentChange::new("a", "x", ChangeStatus::Unchanged)], None)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plan_is_read_only() {
        let client = Arc::new(
            InMemoryVersionClient::new()
                .with_live_documents(vec![promptops_client::Document::new("old", "x")]),
        );
        let deployer = Deployer::new(client.clone());

        let plan = deployer
            .plan(&[LocalDocument::new("new", "<user>oops")])
            .await
            .unwrap();

        assert!(!plan.validation.valid);
        assert_eq!(plan.paths(ChangeStatus::Added), vec!["new"]);
        assert_eq!(plan.paths(ChangeStatus::Deleted), vec!["old"]);
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_network_publish_error_is_not_localized() {
        let client = Arc::new(
            InMemoryVersionClient::new()
                .with_publish_rule(|_| Some(ApiError::network("connection reset"))),
        );
        let deployer = Deployer::new(client.clone());

        let err = deployer
            .deploy_to_live(&[DocumentChange::added("a", "Hello")], None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(client.mutation_count(), 3);
    }
}
