use std::time::Duration;

use bqrun_core::EnvProfile;
use serde::{Deserialize, Serialize};

/// Default REST endpoint of the BigQuery v2 API.
pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Default upper bound on waiting for a job, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECONDS: u64 = 300;

/// Default upper bound on a single HTTP request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

// ── BigQueryConfig ───────────────────────────────────────────────

/// Configuration for the BigQuery query runner.
///
/// Reads from environment variables with optional profile prefix.
/// When `BQRUN_PROFILE=PROD`, checks `PROD_BIGQUERY_PROJECT_ID` before
/// `BIGQUERY_PROJECT_ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigQueryConfig {
    /// Project that owns (and is billed for) the query jobs.
    pub project_id: String,
    /// Dataset location, e.g. "US" or "europe-west1". `None` lets the
    /// service infer it from the referenced tables.
    pub location: Option<String>,
    /// REST API root; overridable for emulators.
    pub base_url: String,
    /// Upper bound on waiting for a job to finish.
    pub wait_timeout_seconds: u64,
    /// Rows per result page. `None` uses the service default.
    pub page_size: Option<u32>,
    /// Upper bound on any single REST call.
    pub request_timeout_seconds: u64,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_timeout_seconds: DEFAULT_WAIT_TIMEOUT_SECONDS,
            page_size: None,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl BigQueryConfig {
    /// Build config from environment variables (call
    /// [`bqrun_core::load_dotenv`] first to pick up a `.env` file).
    ///
    /// Reads `BQRUN_PROFILE` to determine the profile prefix.
    /// `BIGQUERY_PROJECT_ID` falls back to `GOOGLE_CLOUD_PROJECT`.
    pub fn from_env() -> Self {
        Self::from_profile(&EnvProfile::active())
    }

    /// Build config for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        Self::from_profile(&EnvProfile::named(profile))
    }

    fn from_profile(env: &EnvProfile) -> Self {
        let project_id = env
            .first_of(&["BIGQUERY_PROJECT_ID", "GOOGLE_CLOUD_PROJECT"])
            .unwrap_or_default();

        // Zero would mean "never wait", which can only ever time out.
        let positive = |key: &str, default: u64| match env.parse::<u64>(key) {
            Some(0) | None => default,
            Some(n) => n,
        };

        Self {
            project_id,
            location: env.var("BIGQUERY_LOCATION"),
            base_url: env
                .var("BIGQUERY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            wait_timeout_seconds: positive("BIGQUERY_WAIT_TIMEOUT_SECONDS", DEFAULT_WAIT_TIMEOUT_SECONDS),
            page_size: env.parse::<u32>("BIGQUERY_PAGE_SIZE").filter(|&n| n > 0),
            request_timeout_seconds: positive(
                "BIGQUERY_REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            ),
        }
    }

    /// Returns `true` once a project has been set.
    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty()
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

// ── Tests ────────────────────────────────────────────────────────
