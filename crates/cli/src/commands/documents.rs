//! Documents command handler.

use super::print_json;
use clap::Args;
use promptops_client::LIVE_VERSION;
use promptops_core::{config::AppConfig, AppResult};

/// List the documents of a remote version
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    /// Version uuid (default: live)
    #[arg(long, default_value = LIVE_VERSION)]
    pub version: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocumentsCommand {
    pub async fn execute(&self, config: &AppConfig, backend: &str) -> AppResult<()> {
        tracing::info!("Executing documents command");

        let client = promptops_client::create_client(backend, config)?;
        let documents = client.list_documents(&self.version).await?;

        if self.json {
            return print_json(&documents);
        }

        if documents.is_empty() {
            println!("No documents in {}", self.version);
        }
        for doc in &documents {
            println!("{}", doc.path);
        }

        Ok(())
    }
}
