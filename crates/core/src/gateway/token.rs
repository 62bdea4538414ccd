//! API token loading.

use std::path::Path;

use tracing::info;

use super::GatewayError;

/// Read the API token from `path`, trimming surrounding whitespace.
pub fn read_token(path: &Path) -> Result<String, GatewayError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GatewayError::TokenFile {
        path: path.display().to_string(),
        source,
    })?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(GatewayError::EmptyToken(path.display().to_string()));
    }

    info!(path = %path.display(), "API token read from file");
    Ok(token.to_string())
}
