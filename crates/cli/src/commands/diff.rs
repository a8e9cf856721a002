//! Diff command handler.
//!
//! Shows what a deploy would change on live, without changing it.

use super::{load_local, print_json};
use clap::Args;
use promptops_client::ChangeStatus;
use promptops_core::{config::AppConfig, AppResult};
use promptops_deploy::Deployer;
use std::path::PathBuf;

/// Show the changes a deploy would apply
#[derive(Args, Debug)]
pub struct DiffCommand {
    /// Directory holding the documents (default: configured prompts directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DiffCommand {
    pub async fn execute(&self, config: &AppConfig, backend: &str) -> AppResult<()> {
        tracing::info!("Executing diff command");

        let documents = load_local(config, self.dir.as_ref())?;
        let client = promptops_client::create_client(backend, config)?;
        let plan = Deployer::new(client).plan(&documents).await?;

        if self.json {
            return print_json(&plan);
        }

        if plan.changes.is_empty() {
            println!("Live is up to date");
        }
        for change in &plan.changes {
            let marker = match change.status {
                ChangeStatus::Added => '+',
                ChangeStatus::Modified => '~',
                ChangeStatus::Deleted => '-',
                ChangeStatus::Unchanged => ' ',
            };
            println!("{} {}", marker, change.path);
        }

        if !plan.validation.valid {
            println!(
                "\n{} document(s) fail validation and would block the deploy",
                plan.validation.errors.len()
            );
        }

        Ok(())
    }
}
