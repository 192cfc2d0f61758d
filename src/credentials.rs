//! Bot token loading: environment first, then a `.env` file.

use std::env;
use std::path::Path;

use tracing::debug;

use crate::error::ExtensionError;

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Load the bot token from the process environment or `./.env`.
///
/// The token itself is never logged.
pub fn load_token() -> Result<String, ExtensionError> {
    resolve_token(env::var(TOKEN_VAR).ok(), Path::new(".env"))
}

/// Explicit precedence rule: a non-empty environment value always beats the
/// `.env` file.
///
/// The file is read without touching the process environment; malformed
/// lines are skipped rather than treated as fatal.
pub fn resolve_token(
    env_value: Option<String>,
    dotenv_path: &Path,
) -> Result<String, ExtensionError> {
    if let Some(token) = env_value {
        if !token.trim().is_empty() {
            debug!("Bot token loaded from environment");
            return Ok(token);
        }
    }

    if dotenv_path.is_file() {
        if let Ok(entries) = dotenvy::from_path_iter(dotenv_path) {
            for (key, value) in entries.flatten() {
                if key == TOKEN_VAR && !value.trim().is_empty() {
                    debug!("Bot token loaded from {}", dotenv_path.display());
                    return Ok(value);
                }
            }
        }
    }

    Err(ExtensionError::MissingToken)
}
