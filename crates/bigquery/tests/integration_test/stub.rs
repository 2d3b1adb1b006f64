//! In-memory `QueryService` that records every call it receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bqrun_bigquery::*;
use bqrun_core::FieldValue;

/// How the stub's `wait_for` resolves.
#[derive(Clone)]
pub enum WaitOutcome {
    Done,
    Lost,
    Failed(ErrorProto),
    /// Never resolves.
    Hang,
}

pub struct StubService {
    outcome: WaitOutcome,
    pages: Vec<ResultPage>,
    submit_status: Option<u16>,
    failing_page: Option<usize>,
    hanging_cancel: bool,
    submitted: Mutex<Vec<QueryJobRequest>>,
    waits: AtomicUsize,
    fetches: AtomicUsize,
    cancels: AtomicUsize,
}

fn token_for(page: usize) -> String {
    format!("page-{}", page)
}

impl StubService {
    /// A service whose jobs succeed and whose results are `pages`, chained
    /// together with page tokens.
    pub fn new(schema: Arc<Schema>, pages: Vec<Vec<Vec<FieldValue>>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, rows)| {
                let next = (i + 1 < count).then(|| token_for(i + 1));
                ResultPage::from_values(Arc::clone(&schema), rows, next)
            })
            .collect();

        Self {
            outcome: WaitOutcome::Done,
            pages,
            submit_status: None,
            failing_page: None,
            hanging_cancel: false,
            submitted: Mutex::new(Vec::new()),
            waits: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Single-column `x INTEGER` result with one page per inner vec.
    pub fn integers(pages: Vec<Vec<i64>>) -> Self {
        let schema = Arc::new(Schema::new(vec![FieldSchema::new("x", "INTEGER")]));
        let pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|x| vec![FieldValue::Integer(x)])
                    .collect()
            })
            .collect();
        Self::new(schema, pages)
    }

    pub fn with_outcome(mut self, outcome: WaitOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Reject submissions with the given HTTP status.
    pub fn rejecting_submit(mut self, status: u16) -> Self {
        self.submit_status = Some(status);
        self
    }

    /// Fail the fetch of page `index` (0-based).
    pub fn failing_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    /// Make `cancel` never resolve, like a request to an unreachable host.
    pub fn hanging_cancel(mut self) -> Self {
        self.hanging_cancel = true;
        self
    }

    pub fn submitted(&self) -> Vec<QueryJobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_ids(&self) -> Vec<JobId> {
        self.submitted().into_iter().map(|r| r.job_id).collect()
    }

    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for StubService {
    async fn submit(&self, request: &QueryJobRequest) -> Result<JobHandle, ServiceError> {
        self.submitted.lock().unwrap().push(request.clone());

        if let Some(status) = self.submit_status {
            return Err(ServiceError::Api {
                status,
                body: "Access Denied: Project stub-project".into(),
            });
        }
        Ok(JobHandle::pending(request.job_id.clone(), "stub-project", None))
    }

    async fn wait_for(&self, mut job: JobHandle) -> Result<Option<JobHandle>, ServiceError> {
        self.waits.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            WaitOutcome::Done => {
                job.state = JobState::Done;
                Ok(Some(job))
            }
            WaitOutcome::Lost => Ok(None),
            WaitOutcome::Failed(err) => {
                job.state = JobState::Done;
                job.error_result = Some(err.clone());
                job.errors = vec![err.clone()];
                Ok(Some(job))
            }
            WaitOutcome::Hang => std::future::pending().await,
        }
    }

    async fn fetch_page(
        &self,
        _job: &JobHandle,
        page_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let index = match page_token {
            None => 0,
            Some(token) => (0..self.pages.len())
                .find(|&i| token_for(i) == token)
                .ok_or_else(|| ServiceError::Parse(format!("unknown page token {}", token)))?,
        };

        if self.failing_page == Some(index) {
            return Err(ServiceError::Api {
                status: 503,
                body: "backendError".into(),
            });
        }

        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| ServiceError::Parse("no result pages configured".into()))
    }

    async fn cancel(&self, _job: &JobHandle) -> Result<(), ServiceError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.hanging_cancel {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
