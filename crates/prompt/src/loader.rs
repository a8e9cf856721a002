//! Loader for local prompt documents.

use crate::types::LocalDocument;
use promptops_core::{AppError, AppResult};
use std::path::Path;

/// Load every prompt document under `dir` with the given extension.
///
/// Documents are keyed by their slash-separated path relative to `dir`,
/// without the extension, and returned sorted by that path. A missing
/// directory is an error; an empty one yields no documents.
///
/// # Example
/// ```no_run
/// use promptops_prompt::load_documents;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let documents = load_documents(Path::new("prompts"), "promptl")?;
/// for doc in &documents {
///     println!("{}", doc.path);
/// }
/// # Ok(())
/// # }
/// ```
pub fn load_documents(dir: &Path, extension: &str) -> AppResult<Vec<LocalDocument>> {
    if !dir.is_dir() {
        return Err(AppError::Config(format!(
            "Prompts directory not found: {:?}",
            dir
        )));
    }

    tracing::debug!("Loading prompt documents from: {:?}", dir);

    let extension = extension.trim_start_matches('.');
    let mut documents = Vec::new();

    for entry in walkdir::WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| AppError::Other(format!("Failed to walk {:?}: {}", dir, e)))?;
        let path = entry.path();

        if !entry.file_type().is_file()
            || path.extension().and_then(|s| s.to_str()) != Some(extension)
        {
            continue;
        }

        let Some(name) = document_path(dir, path) else {
            tracing::warn!("Skipping document with non UTF-8 path: {:?}", path);
            continue;
        };

        let content = std::fs::read_to_string(path)?;
        documents.push(LocalDocument::new(name, content));
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!("Loaded {} prompt documents from {:?}", documents.len(), dir);

    Ok(documents)
}

/// Relative slash-separated path of `file` without its extension.
fn document_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
