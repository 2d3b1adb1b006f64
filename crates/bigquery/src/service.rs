use async_trait::async_trait;

use crate::error::ServiceError;
use crate::job::{JobHandle, QueryJobRequest};
use crate::result::ResultPage;

/// The remote query service as seen by [`QueryRunner`](crate::runner::QueryRunner).
///
/// [`BigQueryClient`](crate::client::BigQueryClient) talks to the real REST
/// API; tests plug in in-memory doubles.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query job bound to `request.job_id`. Returns as soon as the
    /// service has accepted the job.
    async fn submit(&self, request: &QueryJobRequest) -> Result<JobHandle, ServiceError>;

    /// Wait until the job reaches a terminal state.
    ///
    /// Resolves to `None` when the service no longer knows the job. Carries
    /// no deadline of its own; callers bound it.
    async fn wait_for(&self, job: JobHandle) -> Result<Option<JobHandle>, ServiceError>;

    /// Fetch one page of a finished job's results. `None` asks for the first page.
    async fn fetch_page(
        &self,
        job: &JobHandle,
        page_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError>;

    /// Ask the service to stop a job. Best-effort; the default does nothing.
    async fn cancel(&self, _job: &JobHandle) -> Result<(), ServiceError> {
        Ok(())
    }
}
