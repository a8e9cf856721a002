//! Show command handler.

use super::print_json;
use clap::Args;
use promptops_client::LIVE_VERSION;
use promptops_core::{config::AppConfig, AppResult};

/// Print a remote document
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Document path
    pub path: String,

    /// Version uuid (default: live)
    #[arg(long, default_value = LIVE_VERSION)]
    pub version: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    pub async fn execute(&self, config: &AppConfig, backend: &str) -> AppResult<()> {
        tracing::info!("Executing show command");

        let client = promptops_client::create_client(backend, config)?;
        let path = promptops_deploy::normalize_path(&self.path);
        let document = client.get_document(&self.version, &path).await?;

        if self.json {
            print_json(&document)
        } else {
            print!("{}", document.content);
            Ok(())
        }
    }
}
