//! Google Sheets credentials
//!
//! A sink is authorized with a bearer token minted from a service-account key
//! file. An already minted token can be supplied instead, in which case the
//! key file is not read.

use std::path::Path;

use tracing::{debug, instrument};
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::export::ExportError;

/// Scope required to read and append spreadsheet values
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Key file looked up when none is configured
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// Environment variable holding a ready-made access token
pub const SHEETS_TOKEN_ENV: &str = "SITESIFT_SHEETS_TOKEN";

/// Read and parse a service-account key file
pub async fn load_service_account_key(path: &Path) -> Result<ServiceAccountKey, ExportError> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        ExportError::Auth(format!(
            "Could not read service account key {}: {e}",
            path.display()
        ))
    })?;

    yup_oauth2::parse_service_account_key(raw).map_err(|e| {
        ExportError::Auth(format!(
            "Invalid service account key {}: {e}",
            path.display()
        ))
    })
}

/// Exchange a service-account key for an access token with the spreadsheets
/// scope
#[instrument(skip(key), fields(client_email = %key.client_email))]
pub async fn mint_access_token(key: ServiceAccountKey) -> Result<String, ExportError> {
    let authenticator = ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| ExportError::Auth(format!("Could not build authenticator: {e}")))?;

    let token = authenticator
        .token(&[SHEETS_SCOPE])
        .await
        .map_err(|e| ExportError::Auth(format!("Token request rejected: {e}")))?;

    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| ExportError::Auth("Token response carried no access token".to_string()))
}

/// Resolve the token a `SheetsSink` should use.
///
/// A non-empty `override_token` wins; otherwise the key at `credentials` is
/// loaded and exchanged.
pub async fn resolve_access_token(
    credentials: &Path,
    override_token: Option<String>,
) -> Result<String, ExportError> {
    if let Some(token) = override_token.filter(|t| !t.trim().is_empty()) {
        debug!("Using access token from {}", SHEETS_TOKEN_ENV);
        return Ok(token);
    }

    let key = load_service_account_key(credentials).await?;
    debug!("Loaded service account {}", key.client_email);
    mint_access_token(key).await
}
