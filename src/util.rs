use std::path::Path;

use anyhow::Context;

use crate::config::StoreConfig;

const STORE_TOKEN: &str = "PULSEWATCH_TOKEN";

/// Bearer token from the environment, if set. Takes precedence over the
/// credential file.
pub fn get_token_from_env() -> Option<String> {
    std::env::var(STORE_TOKEN).ok()
}

fn read_token_file(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read credential file {}", path.display()))?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("credential file {} is empty", path.display());
    }
    Ok(token)
}

/// Resolve the bearer token for the document store: environment first, then
/// the configured credential file.
pub fn resolve_token(config: &StoreConfig) -> anyhow::Result<String> {
    if let Some(token) = get_token_from_env() {
        return Ok(token);
    }

    match &config.credential_file {
        Some(path) => read_token_file(path),
        None => anyhow::bail!("no credential file configured and {STORE_TOKEN} is not set"),
    }
}
