//! Command handlers for the promptops CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod deploy;
pub mod diff;
pub mod documents;
pub mod show;
pub mod validate;

// Re-export command types for convenience
pub use deploy::DeployCommand;
pub use diff::DiffCommand;
pub use documents::DocumentsCommand;
pub use show::ShowCommand;
pub use validate::ValidateCommand;

use promptops_core::{config::AppConfig, AppError, AppResult};
use promptops_prompt::{load_documents, LocalDocument};
use serde::Serialize;
use std::path::PathBuf;

/// Load local documents from `dir`, or the configured prompts directory.
pub(crate) fn load_local(config: &AppConfig, dir: Option<&PathBuf>) -> AppResult<Vec<LocalDocument>> {
    let dir = dir.cloned().unwrap_or_else(|| config.prompts_path());
    load_documents(&dir, &config.extension)
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", output);
    Ok(())
}
