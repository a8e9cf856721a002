//! End-to-end deploy scenarios against the in-memory prompt service.

use promptops_client::{
    ChangeStatus, ClientCall, Document, DocumentChange, InMemoryVersionClient, VersionClient,
    LIVE_VERSION,
};
use promptops_core::{ApiError, ApiErrorKind, AppError};
use promptops_deploy::{Deployer, FailedDocument};
use promptops_prompt::LocalDocument;
use std::collections::HashSet;
use std::sync::Arc;

fn prompt(text: &str) -> String {
    format!("---\nmodel: gpt-4o\n---\n<user>{}</user>\n", text)
}

/// Remote that rejects any version containing one of `poisoned`.
fn poisoned_client(poisoned: &[&str]) -> Arc<InMemoryVersionClient> {
    let poisoned: HashSet<String> = poisoned.iter().map(|p| p.to_string()).collect();
    Arc::new(InMemoryVersionClient::new().with_publish_rule(move |docs| {
        docs.iter()
            .find(|doc| poisoned.contains(&doc.path))
            .map(|doc| {
                ApiError::remote(
                    400,
                    "PUBLISH_VALIDATION_FAILED",
                    format!("Document {} references an unknown tool", doc.path),
                )
            })
    }))
}

fn deployer(client: &Arc<InMemoryVersionClient>) -> Deployer {
    Deployer::new(client.clone())
}

#[tokio::test]
async fn test_first_deploy_publishes_one_document() {
    let client = Arc::new(InMemoryVersionClient::new());
    let incoming = vec![LocalDocument::new("a", "x")];

    let result = deployer(&client)
        .deploy_documents(&incoming, Some("First"))
        .await
        .unwrap();

    assert_eq!(result.added, vec!["a"]);
    assert!(result.modified.is_empty());
    assert!(result.deleted.is_empty());
    assert_eq!(result.documents_processed, 1);

    let calls = client.calls();
    assert_eq!(
        calls,
        vec![
            ClientCall::ListDocuments(LIVE_VERSION.to_string()),
            ClientCall::CreateVersion("First".to_string()),
            ClientCall::PushChanges {
                version_uuid: result.version.uuid.clone(),
                paths: vec!["a".to_string()],
            },
            ClientCall::PublishVersion(result.version.uuid.clone()),
        ]
    );
    let live = client.live_documents();
    assert_eq!(live.len(), 1);
    assert_eq!((live[0].path.as_str(), live[0].content.as_str()), ("a", "x"));
}

#[tokio::test]
async fn test_redeploy_applies_only_the_diff() {
    let client = Arc::new(InMemoryVersionClient::new().with_live_documents(vec![
        Document::new("keep", prompt("same")),
        Document::new("edit", prompt("old")),
        Document::new("drop", prompt("bye")),
    ]));
    let incoming = vec![
        LocalDocument::new("keep", prompt("same")),
        LocalDocument::new("/edit/", prompt("new")),
        LocalDocument::new("fresh", prompt("hi")),
    ];

    let result = deployer(&client)
        .deploy_documents(&incoming, None)
        .await
        .unwrap();

    assert_eq!(result.added, vec!["fresh"]);
    assert_eq!(result.modified, vec!["edit"]);
    assert_eq!(result.deleted, vec!["drop"]);
    assert_eq!(result.documents_processed, 3);
    assert!(result.version.title.starts_with("Deploy "));

    let live: Vec<String> = client.live_documents().into_iter().map(|d| d.path).collect();
    assert_eq!(live, vec!["edit", "fresh", "keep"]);
}

#[tokio::test]
async fn test_invalid_batch_never_reaches_the_remote() {
    let client = Arc::new(InMemoryVersionClient::new());
    let incoming = vec![
        LocalDocument::new("one", prompt("fine")),
        LocalDocument::new("two", "<user>never closed"),
        LocalDocument::new("three", prompt("also fine")),
    ];

    let err = deployer(&client)
        .deploy_documents(&incoming, None)
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => {
            assert!(message.contains("two"));
            assert!(message.contains("unclosed-message-tag"));
            assert!(!message.contains("three"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_changes_are_gated_in_deploy_to_live() {
    let client = Arc::new(InMemoryVersionClient::new());
    let changes = vec![
        DocumentChange::added("ok", prompt("fine")),
        DocumentChange::added("bad", "{{#if x}}unterminated"),
    ];

    let err = deployer(&client)
        .deploy_to_live(&changes, None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_noop_deploys_make_no_calls() {
    let client = Arc::new(InMemoryVersionClient::new());
    let deployer = deployer(&client);

    let empty = deployer.deploy_to_live(&[], None).await.unwrap();
    let unchanged = deployer
        .deploy_to_live(
            &[DocumentChange::new("a", "x", ChangeStatus::Unchanged)],
            None,
        )
        .await
        .unwrap();

    for result in [empty, unchanged] {
        assert_eq!(result.documents_processed, 0);
        assert_eq!(result.version.id, 0);
        assert_eq!(result.version.uuid, LIVE_VERSION);
        assert!(result.is_noop());
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_deploying_live_contents_is_a_noop() {
    let client = Arc::new(
        InMemoryVersionClient::new().with_live_documents(vec![Document::new("a", prompt("x"))]),
    );

    let result = deployer(&client)
        .deploy_documents(&[LocalDocument::new("a", prompt("x"))], None)
        .await
        .unwrap();

    assert!(result.is_noop());
    assert_eq!(client.mutation_count(), 0);
}

#[tokio::test]
async fn test_rejected_publish_names_only_the_failing_document() {
    let client = poisoned_client(&["gamma"]);
    let incoming: Vec<LocalDocument> = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .map(|path| LocalDocument::new(*path, prompt(path)))
        .collect();

    let err = deployer(&client)
        .deploy_documents(&incoming, Some("Release"))
        .await
        .unwrap_err();

    let api = err.api().unwrap();
    assert_eq!(api.kind, ApiErrorKind::DocumentValidation);
    assert_eq!(api.code, "DOCUMENT_VALIDATION_FAILED");
    assert_eq!(api.status, 422);
    assert!(api.message.contains("gamma"));
    assert!(api.message.contains("PUBLISH_VALIDATION_FAILED"));
    for clean in ["alpha", "beta", "delta"] {
        assert!(!api.message.contains(clean), "{} blamed", clean);
    }

    let failures: Vec<FailedDocument> =
        serde_json::from_value(api.details.clone().unwrap()).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, "gamma");
}

#[tokio::test]
async fn test_localization_finds_exactly_the_poisoned_set() {
    for n in 1..=16usize {
        let paths: Vec<String> = (0..n).map(|i| format!("doc-{:02}", i)).collect();
        let poisoned: Vec<&str> = paths
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 5 == 2 || *i == n - 1)
            .map(|(_, p)| p.as_str())
            .collect();

        let client = poisoned_client(&poisoned);
        let changes: Vec<DocumentChange> = paths
            .iter()
            .map(|p| DocumentChange::added(p.as_str(), prompt(p)))
            .collect();

        let err = deployer(&client)
            .deploy_to_live(&changes, None)
            .await
            .unwrap_err();

        let failures: Vec<FailedDocument> =
            serde_json::from_value(err.api().unwrap().details.clone().unwrap()).unwrap();
        let blamed: HashSet<&str> = failures.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(failures.len(), blamed.len(), "n={}", n);
        assert_eq!(blamed, poisoned.iter().copied().collect(), "n={}", n);
    }
}

#[tokio::test]
async fn test_unattributable_rejection_is_rethrown() {
    let client = Arc::new(InMemoryVersionClient::new().with_publish_rule(|_| {
        Some(ApiError::remote(503, "SERVICE_BUSY", "Try again later"))
    }));

    let err = deployer(&client)
        .deploy_to_live(&[DocumentChange::added("a", prompt("x"))], None)
        .await
        .unwrap_err();

    let api = err.api().unwrap();
    assert_eq!(api.kind, ApiErrorKind::Remote);
    assert_eq!(api.code, "SERVICE_BUSY");
    assert_eq!(api.status, 503);
    assert_eq!(api.message, "Try again later");
    assert!(api.details.is_none());
}

#[tokio::test]
async fn test_transient_rejection_is_rethrown_for_large_batches() {
    for status in [401, 429, 500] {
        let client = Arc::new(InMemoryVersionClient::new().with_publish_rule(move |_| {
            Some(ApiError::remote(status, "UNAVAILABLE", "not now"))
        }));
        let changes: Vec<DocumentChange> = (0..9)
            .map(|i| DocumentChange::added(format!("doc-{}", i), prompt("x")))
            .collect();

        let err = deployer(&client)
            .deploy_to_live(&changes, None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "UNAVAILABLE", "status {}", status);
        assert_eq!(err.status(), status);
    }
}

#[tokio::test]
async fn test_push_failure_propagates_without_localization() {
    let client = Arc::new(
        InMemoryVersionClient::new()
            .with_push_failure(ApiError::remote(500, "INTERNAL", "push exploded")),
    );

    let err = deployer(&client)
        .deploy_to_live(&[DocumentChange::added("a", prompt("x"))], Some("Broken"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INTERNAL");
    assert_eq!(err.status(), 500);

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], ClientCall::CreateVersion("Broken".to_string()));
    assert!(matches!(calls[1], ClientCall::PushChanges { .. }));
}

#[tokio::test]
async fn test_create_failure_propagates() {
    let client = Arc::new(
        InMemoryVersionClient::new()
            .with_create_failure(ApiError::remote(403, "FORBIDDEN", "no access")),
    );

    let err = deployer(&client)
        .deploy_to_live(&[DocumentChange::added("a", prompt("x"))], None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "FORBIDDEN");
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_deletions_are_pushed_with_stored_path() {
    let client = Arc::new(
        InMemoryVersionClient::new().with_live_documents(vec![Document::new("/legacy//doc", "x")]),
    );

    let result = deployer(&client).deploy_documents(&[], None).await.unwrap();

    assert_eq!(result.deleted, vec!["/legacy//doc"]);
    assert!(client.list_documents(LIVE_VERSION).await.unwrap().is_empty());
}
