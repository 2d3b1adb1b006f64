//! Access-token sources for [`BigQueryClient`](crate::client::BigQueryClient).
//!
//! Obtaining and refreshing OAuth tokens is left to an external credentials
//! provider (gcloud, a metadata-server sidecar, a secret manager). These
//! providers only hand over whatever token that process has made available.

use async_trait::async_trait;
use bqrun_core::EnvProfile;

use crate::error::ServiceError;

/// Primary env var holding a bearer token.
pub const ACCESS_TOKEN_VAR: &str = "BIGQUERY_ACCESS_TOKEN";
/// Fallback env var, as exported by common Google tooling.
pub const GOOGLE_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ServiceError>;
}

/// A fixed token, e.g. handed in by an embedding application.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, ServiceError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from the environment on every call, so a refresher
/// process can rotate it underneath a long-lived client.
///
/// Tries the profiled `BIGQUERY_ACCESS_TOKEN`, then `GOOGLE_OAUTH_ACCESS_TOKEN`.
pub struct EnvToken {
    profile: EnvProfile,
}

impl EnvToken {
    /// Uses the profile named by `BQRUN_PROFILE`.
    pub fn new() -> Self {
        Self {
            profile: EnvProfile::active(),
        }
    }

    pub fn with_profile(profile: &str) -> Self {
        Self {
            profile: EnvProfile::named(profile),
        }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn access_token(&self) -> Result<String, ServiceError> {
        self.profile
            .first_of(&[ACCESS_TOKEN_VAR, GOOGLE_TOKEN_VAR])
            .ok_or_else(|| {
                ServiceError::Auth(format!(
                    "no access token found in {} or {}",
                    ACCESS_TOKEN_VAR, GOOGLE_TOKEN_VAR
                ))
            })
    }
}
