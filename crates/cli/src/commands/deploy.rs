//! Deploy command handler.
//!
//! Validates local documents, diffs them against live and publishes the
//! changes (or only pushes them to a draft with `--draft`).

use super::{load_local, print_json};
use clap::Args;
use promptops_core::{config::AppConfig, ApiErrorKind, AppError, AppResult};
use promptops_deploy::{flatten_error_details, format_validation_report, DeployResult, Deployer};
use promptops_prompt::LocalDocument;
use std::path::PathBuf;

/// Deploy local prompt documents
#[derive(Args, Debug)]
pub struct DeployCommand {
    /// Directory holding the documents (default: configured prompts directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Version name (default: "Deploy <timestamp>")
    #[arg(short, long)]
    pub name: Option<String>,

    /// Push to a new draft without publishing
    #[arg(long)]
    pub draft: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DeployCommand {
    pub async fn execute(&self, config: &AppConfig, backend: &str) -> AppResult<()> {
        tracing::info!("Executing deploy command");
        tracing::debug!("Deploy options: {:?}", self);

        let documents = load_local(config, self.dir.as_ref())?;
        let client = promptops_client::create_client(backend, config)?;
        let deployer = Deployer::new(client);

        let result = if self.draft {
            self.deploy_draft(&deployer, &documents).await
        } else {
            deployer
                .deploy_documents(&documents, self.name.as_deref())
                .await
                .map(Some)
        };

        match result {
            Ok(Some(result)) => self.print_result(&result),
            Ok(None) => {
                println!("Live is up to date; no draft created");
                Ok(())
            }
            Err(err) => {
                report_error(&err);
                Err(err)
            }
        }
    }

    async fn deploy_draft(
        &self,
        deployer: &Deployer,
        documents: &[LocalDocument],
    ) -> AppResult<Option<DeployResult>> {
        let plan = deployer.plan(documents).await?;
        if !plan.validation.valid {
            return Err(AppError::Validation(format_validation_report(
                &plan.validation,
            )));
        }
        deployer
            .deploy_to_draft(&plan.changes, self.name.as_deref())
            .await
    }

    fn print_result(&self, result: &DeployResult) -> AppResult<()> {
        if self.json {
            return print_json(result);
        }

        if result.is_noop() {
            println!("Live is up to date; nothing deployed");
            return Ok(());
        }

        let action = if self.draft { "Pushed to draft" } else { "Published" };
        println!(
            "{} {} ({}): {} document(s) processed",
            action, result.version.title, result.version.uuid, result.documents_processed
        );
        for path in &result.added {
            println!("  + {}", path);
        }
        for path in &result.modified {
            println!("  ~ {}", path);
        }
        for path in &result.deleted {
            println!("  - {}", path);
        }

        Ok(())
    }
}

/// Print the structured details of a remote failure on stderr.
///
/// Localized failures already carry a full report in their message.
fn report_error(err: &AppError) {
    let Some(api) = err.api() else {
        return;
    };
    if api.kind == ApiErrorKind::DocumentValidation {
        return;
    }
    if let Some(details) = &api.details {
        for line in flatten_error_details(details) {
            eprintln!("  {}", line);
        }
    }
}
