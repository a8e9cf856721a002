//! Validate command handler.
//!
//! Checks local prompt documents without contacting the prompt service.

use super::{load_local, print_json};
use clap::Args;
use promptops_core::{config::AppConfig, AppError, AppResult};
use promptops_deploy::{format_issue, format_validation_report};
use promptops_prompt::Validator;
use std::path::PathBuf;

/// Validate local prompt documents
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Directory holding the documents (default: configured prompts directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing validate command");

        let documents = load_local(config, self.dir.as_ref())?;
        let report = Validator::new()
            .validate_all(documents.iter().map(|d| (d.path.as_str(), d.content.as_str())));

        if self.json {
            print_json(&report)?;
        } else if report.valid {
            println!("{} document(s) valid", documents.len());
            for doc in &report.warnings {
                println!("\n{}", doc.name);
                for issue in &doc.issues {
                    print!("{}", format_issue(issue));
                }
            }
        } else {
            println!("{}", format_validation_report(&report));
        }

        if report.valid {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "{} document(s) failed validation",
                report.errors.len()
            )))
        }
    }
}
