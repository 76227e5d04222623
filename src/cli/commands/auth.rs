//! cli::commands::auth
//!
//! Store remote credentials for push, pull and clone.
//!
//! # Design
//!
//! - Tokens go to the configured credential store via the service
//! - Tokens are NEVER printed to stdout/stderr
//! - Interactive use prompts with hidden input
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! gitward auth
//!
//! # Check status
//! gitward auth --status
//!
//! # Remove stored credentials
//! gitward auth --logout
//! ```

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};
use serde_json::json;

use super::{print_json, service, Context};
use crate::core::config::Config;
use crate::git::auth::{CREDENTIAL_SERVICE, TOKEN_KEY, USERNAME_KEY};
use crate::secrets::{self, SecretStore};

/// Run the auth command.
///
/// This function NEVER prints the token value. It only confirms success or failure.
pub fn auth(
    ctx: &Context,
    token: Option<&str>,
    username: Option<&str>,
    status: bool,
    logout: bool,
) -> Result<()> {
    if status || logout {
        let config = Config::load(None).context("failed to load configuration")?.config;
        let store = secrets::create_store(config.secrets_provider())
            .context("failed to initialize secret store")?;

        return if status {
            show_status(ctx, store.as_ref())
        } else {
            do_logout(ctx, store.as_ref())
        };
    }

    let token = get_token(ctx, token)?;
    validate_token(&token)?;

    service()?.configure_remote_auth(&token, username)?;
    ctx.say("Remote credentials saved.");
    Ok(())
}

fn show_status(ctx: &Context, store: &dyn SecretStore) -> Result<()> {
    let has_token = store.exists(CREDENTIAL_SERVICE, TOKEN_KEY)?;
    let has_username = store.exists(CREDENTIAL_SERVICE, USERNAME_KEY)?;

    if ctx.json {
        return print_json(&json!({ "token": has_token, "username": has_username }));
    }
    if has_token {
        println!("Token stored.");
    } else {
        println!("No token stored. Run 'gitward auth' to add one.");
    }
    Ok(())
}

fn do_logout(ctx: &Context, store: &dyn SecretStore) -> Result<()> {
    store
        .delete(CREDENTIAL_SERVICE, TOKEN_KEY)
        .context("failed to remove stored token")?;
    store
        .delete(CREDENTIAL_SERVICE, USERNAME_KEY)
        .context("failed to remove stored username")?;
    ctx.say("Remote credentials removed.");
    Ok(())
}

/// Token from the argument, else a hidden prompt.
fn get_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.to_string());
    }

    if ctx.quiet || !io::stdin().is_terminal() {
        bail!("token required: use --token, GITWARD_TOKEN, or run interactively");
    }

    print!("Access token: ");
    io::stdout().flush()?;
    let token = rpassword::read_password().context("failed to read token")?;
    Ok(token.trim().to_string())
}

/// Shape checks only; nothing is sent anywhere.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("token cannot be empty");
    }
    if token.len() < 10 {
        bail!("token appears to be too short");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("token should not contain whitespace");
    }
    Ok(())
}
