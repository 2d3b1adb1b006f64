//! Job-side types: identifiers, submission requests, and the local handle
//! to a job the service owns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-generated job identifier.
///
/// A fresh random v4 UUID per submission. It doubles as the idempotency key
/// of the insert call and as the lookup key for status and results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state reported by the service. `Done` is terminal, whether the
/// job succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    /// Map the service's `status.state` string. Unknown states count as pending.
    pub fn from_api(state: &str) -> Self {
        match state {
            "DONE" => JobState::Done,
            "RUNNING" => JobState::Running,
            _ => JobState::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == JobState::Done
    }
}

/// Error payload as reported by the service. Kept as-is; no classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
}

impl fmt::Display for ErrorProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => write!(f, "{}: {}", reason, message)?,
            (Some(only), None) | (None, Some(only)) => write!(f, "{}", only)?,
            (None, None) => write!(f, "unknown error")?,
        }
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

/// Execution statistics, informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatistics {
    pub total_bytes_processed: Option<u64>,
    pub cache_hit: Option<bool>,
    pub creation_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// One query submission. Always standard SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJobRequest {
    pub job_id: JobId,
    pub query: String,
    pub use_legacy_sql: bool,
}

impl QueryJobRequest {
    /// Build a standard-SQL request bound to a freshly generated [`JobId`].
    pub fn standard(query: &str) -> Self {
        Self {
            job_id: JobId::new(),
            query: query.to_string(),
            use_legacy_sql: false,
        }
    }
}

/// Local handle to a job owned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: JobId,
    pub project_id: String,
    pub location: Option<String>,
    pub state: JobState,
    /// Set when the job finished in a failed state.
    pub error_result: Option<ErrorProto>,
    /// Every error the job ran into, not just the final one.
    pub errors: Vec<ErrorProto>,
    pub statistics: JobStatistics,
}

impl JobHandle {
    /// A handle for a freshly submitted job with no status yet.
    pub fn pending(job_id: JobId, project_id: &str, location: Option<&str>) -> Self {
        Self {
            job_id,
            project_id: project_id.to_string(),
            location: location.map(str::to_string),
            state: JobState::Pending,
            error_result: None,
            errors: Vec::new(),
            statistics: JobStatistics::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn error(&self) -> Option<&ErrorProto> {
        self.error_result.as_ref()
    }
}
