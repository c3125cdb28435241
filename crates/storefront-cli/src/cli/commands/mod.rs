//! CLI command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use storefront_core::config::Config;
use storefront_core::context::AppContext;
use storefront_core::error::{ClientError, ClientErrorKind};
use storefront_core::tokens::{FileTokenStore, TokenStore};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod config;
pub mod products;

/// Builds a listener-free context over the on-disk token store.
pub fn open(config: Config) -> Result<AppContext> {
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::default_location());
    AppContext::detached(config, tokens).context("build API client")
}

/// Validates the stored token before a protected command.
pub async fn require_session(ctx: &AppContext) -> Result<()> {
    if ctx.start().await {
        Ok(())
    } else {
        anyhow::bail!("Not logged in. Run `storefront login` first.")
    }
}

/// Converts a client error for display. A 401 ends the stored session the
/// same way the background listener would.
pub fn client_failure(ctx: &AppContext, action: &str, err: ClientError) -> anyhow::Error {
    if err.kind == ClientErrorKind::Unauthorized {
        ctx.session.handle_unauthorized();
        return anyhow::Error::new(err)
            .context(format!("{action}: session expired, log in again"));
    }
    anyhow::Error::new(err).context(action.to_string())
}

/// Table with the shared look used by every listing.
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}
