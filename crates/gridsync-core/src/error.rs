//! Core error types for gridsync-core.
//!
//! One enum per failure domain, wired together with thiserror. The sync
//! engine distinguishes fatal errors (no schedule, no existing-event set)
//! from per-action write failures, which are collected in the run summary
//! instead of aborting the run.

use std::path::PathBuf;
use thiserror::Error;

/// A raw schedule record that cannot be keyed.
///
/// Skipping the record is always safe: without a round number and season
/// there is no stable weekend identity, so nothing can be reconciled.
#[derive(Debug, Error)]
pub enum MalformedRecordError {
    #[error("schedule record is missing its round number")]
    MissingRound,

    #[error("schedule record for round {round} is missing its season")]
    MissingSeason { round: u32 },
}

/// The remote schedule could not be fetched or parsed. Fatal for the run.
#[derive(Debug, Error)]
pub enum SourceUnavailableError {
    #[error("schedule request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("schedule endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("schedule payload could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reading from the calendar store failed. Fatal for the run: without the
/// existing-event set the engine cannot distinguish create from update.
///
/// `ensure_calendar` failures land here too -- a missing calendar ref has
/// the same blast radius as a failed event listing.
#[derive(Debug, Error)]
pub enum StoreReadError {
    #[error("calendar store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("calendar store API error: {0}")]
    Api(String),

    #[error("calendar {name:?} could not be resolved")]
    CalendarUnavailable { name: String },

    #[error("calendar authentication failed: {0}")]
    Auth(#[from] OAuthError),
}

/// A single create/update was rejected by the calendar store. Non-fatal:
/// recorded against the action's sync key, the run continues.
#[derive(Debug, Error)]
pub enum StoreWriteError {
    #[error("calendar store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("calendar store API error: {0}")]
    Api(String),

    #[error("event {external_id} no longer exists in the calendar store")]
    NotFound { external_id: String },

    #[error("calendar store rate limit hit")]
    RateLimited,

    #[error("calendar authentication failed: {0}")]
    Auth(#[from] OAuthError),
}

/// Configuration load/save errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
}

/// OAuth2 flow errors for the Google Calendar store.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("invalid OAuth callback: {0}")]
    InvalidCallback(String),

    #[error("access token expired and no refresh token available")]
    TokenExpired,

    #[error("not authenticated with Google; run `gridsync auth login` first")]
    NotAuthenticated,

    #[error("OAuth client credentials not configured")]
    CredentialsNotConfigured,

    #[error("credential store error: {0}")]
    CredentialStore(String),
}

impl From<keyring::Error> for OAuthError {
    fn from(err: keyring::Error) -> Self {
        OAuthError::CredentialStore(err.to_string())
    }
}

/// Top-level fatal error for one sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("schedule source unavailable: {0}")]
    Source(#[from] SourceUnavailableError),

    #[error("calendar store read failed: {0}")]
    StoreRead(#[from] StoreReadError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SyncError
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
