//! Submit, wait, fetch: the one-call query protocol.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{BigQueryConfig, DEFAULT_WAIT_TIMEOUT_SECONDS};
use crate::error::QueryError;
use crate::job::QueryJobRequest;
use crate::service::QueryService;
use crate::stream::RowStream;

/// How long a cancel issued after a wait timeout may take before the runner
/// gives up on it.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs standard-SQL queries against an injected [`QueryService`].
///
/// Each [`run`](Self::run) is one submission under a fresh job id, one
/// bounded wait, and one result stream. The runner keeps no state between
/// calls, so concurrent `run`s on a shared runner are independent.
pub struct QueryRunner<S> {
    service: Arc<S>,
    wait_timeout: Duration,
    cancel_timeout: Duration,
}

impl<S: QueryService + 'static> QueryRunner<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECONDS),
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }

    pub fn from_config(service: Arc<S>, config: &BigQueryConfig) -> Self {
        Self::new(service).with_wait_timeout(config.wait_timeout())
    }

    /// Upper bound on waiting for the job to finish.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Upper bound on the cancel request sent after a wait timeout.
    pub fn with_cancel_timeout(mut self, cancel_timeout: Duration) -> Self {
        self.cancel_timeout = cancel_timeout;
        self
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Execute `query` and return its rows.
    ///
    /// The query text goes to the service verbatim. A query the service
    /// rejects at submission (legacy-only syntax, parse errors caught by
    /// `jobs.insert`) comes back as [`QueryError::Service`], typically an
    /// `Api { status: 400, .. }`; one that fails while running comes back as
    /// [`QueryError::JobExecution`]. The first result page is fetched before
    /// returning, later pages as the stream is consumed.
    pub async fn run(&self, query: &str) -> Result<RowStream, QueryError> {
        let request = QueryJobRequest::standard(query);
        let job_id = request.job_id.clone();

        info!(job_id = %job_id, "Submitting query job");
        let submitted = self.service.submit(&request).await?;
        debug!(job_id = %job_id, state = ?submitted.state, "Query job submitted");

        let waited = tokio::time::timeout(
            self.wait_timeout,
            self.service.wait_for(submitted.clone()),
        )
        .await;

        let finished = match waited {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    job_id = %job_id,
                    timeout_ms = self.wait_timeout.as_millis() as u64,
                    "Query job timed out, cancelling"
                );
                // Best-effort cancel; the timeout is what gets reported.
                match tokio::time::timeout(self.cancel_timeout, self.service.cancel(&submitted))
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!(job_id = %job_id, error = %e, "Cancel request failed")
                    }
                    Err(_) => debug!(
                        job_id = %job_id,
                        timeout_ms = self.cancel_timeout.as_millis() as u64,
                        "Cancel request timed out"
                    ),
                }
                return Err(QueryError::Timeout {
                    job_id,
                    waited: self.wait_timeout,
                });
            }
        };

        let job = match finished {
            Some(job) => job,
            None => {
                warn!(job_id = %job_id, "Query job no longer exists");
                return Err(QueryError::JobLost { job_id });
            }
        };

        if let Some(err) = job.error_result.clone() {
            error!(job_id = %job_id, error = %err, "Query job failed");
            return Err(QueryError::JobExecution { job_id, error: err });
        }

        info!(
            job_id = %job_id,
            bytes_processed = ?job.statistics.total_bytes_processed,
            cache_hit = ?job.statistics.cache_hit,
            "Query job completed"
        );

        let first = self.service.fetch_page(&job, None).await?;
        debug!(
            job_id = %job_id,
            rows = first.rows.len(),
            total_rows = ?first.total_rows,
            has_more = first.page_token.is_some(),
            "Fetched first result page"
        );

        Ok(RowStream::new(Arc::clone(&self.service), job, first))
    }
}

impl<S> Clone for QueryRunner<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            wait_timeout: self.wait_timeout,
            cancel_timeout: self.cancel_timeout,
        }
    }
}
