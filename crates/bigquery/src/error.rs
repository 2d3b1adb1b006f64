use std::time::Duration;

use crate::job::{ErrorProto, JobId};

/// Errors raised by a [`QueryService`](crate::service::QueryService)
/// implementation: transport, credentials, API status, payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The HTTP request itself failed (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("BigQuery API error {status}: {body}")]
    Api { status: u16, body: String },

    /// No access token could be obtained from the credential provider.
    #[error("Credential error: {0}")]
    Auth(String),

    /// A response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors returned by [`QueryRunner::run`](crate::runner::QueryRunner::run)
/// and by the row stream it hands back.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The wait finished but the service no longer knows the job.
    #[error("Job {job_id} no longer exists")]
    JobLost { job_id: JobId },

    /// The job reached a terminal failed state. `error` is the service's
    /// payload, untouched.
    #[error("Job {job_id} failed: {error}")]
    JobExecution { job_id: JobId, error: ErrorProto },

    /// The job did not reach a terminal state within the configured wait.
    #[error("Job {job_id} did not finish within {waited:?}")]
    Timeout { job_id: JobId, waited: Duration },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl QueryError {
    /// The job id this error refers to, when it concerns a specific job.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            QueryError::JobLost { job_id }
            | QueryError::JobExecution { job_id, .. }
            | QueryError::Timeout { job_id, .. } => Some(job_id),
            QueryError::Service(_) => None,
        }
    }
}
