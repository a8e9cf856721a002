//! Diff engine.
//!
//! Compares local documents against the remote document list and produces
//! the change batch to push. Documents are matched by normalized path and
//! compared by content hash.

use crate::hash::content_hash;
use promptops_client::{ChangeStatus, Document, DocumentChange};
use promptops_prompt::LocalDocument;
use std::collections::{HashMap, HashSet};

/// Normalize a document path: trim whitespace, strip leading and trailing
/// slashes and collapse repeated slashes.
///
/// ```
/// use promptops_deploy::normalize_path;
///
/// assert_eq!(normalize_path(" /support//reply/ "), "support/reply");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A remote document as seen by the diff.
struct Existing<'a> {
    /// Literal path the remote stores the document under
    path: &'a str,
    hash: String,
}

/// Compute the changes that turn `existing` into `incoming`.
///
/// New documents are `added` under their normalized path. Changed and
/// removed documents are addressed by the path the remote stores them
/// under. Added and modified entries come first in input order, followed
/// by deletions in remote order. Unchanged documents are omitted, as are
/// local documents whose path normalizes to nothing.
pub fn compute_diff(incoming: &[LocalDocument], existing: &[Document]) -> Vec<DocumentChange> {
    let mut remote: HashMap<String, Existing<'_>> = HashMap::new();
    for doc in existing {
        let key = normalize_path(&doc.path);
        if remote.contains_key(&key) {
            tracing::warn!("Remote has several documents normalizing to {}", key);
            continue;
        }
        let hash = doc
            .content_hash
            .clone()
            .unwrap_or_else(|| content_hash(&doc.content));
        remote.insert(
            key,
            Existing {
                path: &doc.path,
                hash,
            },
        );
    }

    let mut changes = Vec::new();
    let mut seen = HashSet::new();

    for doc in incoming {
        let key = normalize_path(&doc.path);
        if key.is_empty() {
            tracing::warn!("Ignoring local document with empty path {:?}", doc.path);
            continue;
        }
        if !seen.insert(key.clone()) {
            tracing::warn!("Ignoring duplicate local document {}", doc.path);
            continue;
        }

        let hash = content_hash(&doc.content);
        match remote.get(&key) {
            None => {
                changes.push(DocumentChange::added(key, doc.content.clone()).with_content_hash(hash))
            }
            Some(found) if found.hash != hash => changes.push(
                DocumentChange::modified(found.path, doc.content.clone()).with_content_hash(hash),
            ),
            Some(_) => {}
        }
    }

    let mut deleted = HashSet::new();
    for doc in existing {
        let key = normalize_path(&doc.path);
        if !seen.contains(&key) && deleted.insert(key) {
            changes.push(DocumentChange::deleted(doc.path.clone()));
        }
    }

    tracing::debug!(
        "Diff: {} added, {} modified, {} deleted",
        count(&changes, ChangeStatus::Added),
        count(&changes, ChangeStatus::Modified),
        count(&changes, ChangeStatus::Deleted)
    );

    changes
}

fn count(changes: &[DocumentChange], status: ChangeStatus) -> usize {
    changes.iter().filter(|c| c.status == status).count()
}

/// Paths of the changes with `status`, in order.
pub fn paths_with_status(changes: &[DocumentChange], status: ChangeStatus) -> Vec<String> {
    changes
        .iter()
        .filter(|c| c.status == status)
        .map(|c| c.path.clone())
        .collect()
}
