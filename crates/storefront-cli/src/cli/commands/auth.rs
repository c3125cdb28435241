//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use storefront_core::config::paths;
use storefront_core::context::AppContext;
use storefront_core::session::AuthMode;
use storefront_core::tokens::mask_token;

use super::require_session;

pub async fn login(ctx: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_secret("Password: ")?,
    };

    let session = &ctx.session;
    session.open_auth_modal(AuthMode::Login);
    session.set_email(email);
    session.set_password(password);
    submit(ctx).await?;

    println!("✓ Logged in as {email}");
    println!("  Tokens saved to: {}", paths::tokens_path().display());
    Ok(())
}

pub async fn register(
    ctx: &AppContext,
    email: &str,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_secret("Password: ")?,
    };
    let confirm_password = match confirm_password {
        Some(confirm) => confirm,
        None => read_secret("Confirm password: ")?,
    };

    let session = &ctx.session;
    session.open_auth_modal(AuthMode::Register);
    session.set_email(email);
    session.set_password(password);
    session.set_confirm_password(confirm_password);
    submit(ctx).await?;

    println!("✓ Registered and logged in as {email}");
    println!("  Tokens saved to: {}", paths::tokens_path().display());
    Ok(())
}

/// Submits the auth form and surfaces whatever message the form shows.
async fn submit(ctx: &AppContext) -> Result<()> {
    if let Err(err) = ctx.session.handle_auth().await {
        let modal = ctx.session.modal();
        let message = modal
            .password_error
            .or(modal.error)
            .unwrap_or_else(|| err.user_message().to_string());
        anyhow::bail!("{message}");
    }
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if ctx.session.snapshot().tokens.is_none() {
        println!("Not logged in (no stored tokens).");
        return Ok(());
    }

    ctx.session.logout().await;
    println!("✓ Logged out");
    println!("  Tokens removed from: {}", paths::tokens_path().display());
    Ok(())
}

pub async fn refresh(ctx: &AppContext) -> Result<()> {
    match ctx.session.refresh_token().await {
        Ok(pair) => {
            println!("✓ Token refreshed (token: {})", mask_token(&pair.access_token));
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err).context("refresh failed; logged out")),
    }
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;
    let session = ctx.session.snapshot();
    match session.user {
        Some(user) => {
            println!("{} ({})", user.email, user.role);
            println!("  id: {}", user.id);
            if let Some(name) = user.full_name.filter(|n| !n.is_empty()) {
                println!("  name: {name}");
            }
        }
        None => println!("Logged in (profile unavailable)."),
    }
    Ok(())
}

/// Reads one line from stdin, prompting on stderr when interactive.
fn read_secret(prompt: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(line)
}
