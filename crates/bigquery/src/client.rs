//! BigQuery REST v2 client.
//!
//! Provides [`BigQueryClient`], the production [`QueryService`]: job insert,
//! exponential-backoff polling until the job is `DONE`, and paged result
//! fetches through `jobs.getQueryResults`.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, info};

use crate::auth::{EnvToken, TokenProvider};
use crate::config::BigQueryConfig;
use crate::error::ServiceError;
use crate::job::{JobHandle, QueryJobRequest};
use crate::result::ResultPage;
use crate::service::QueryService;
use crate::wire::{query_job_body, JobResource, QueryResultsResponse};

const INITIAL_POLL_DELAY_MS: u64 = 200;
const MAX_POLL_DELAY_MS: u64 = 2000;
const POLL_BACKOFF_FACTOR: f64 = 1.5;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for running query jobs against the BigQuery REST API.
///
/// Credentials come from the injected [`TokenProvider`]; the client never
/// runs an OAuth flow itself.
pub struct BigQueryClient {
    config: BigQueryConfig,
    http: reqwest::Client,
    tokens: Box<dyn TokenProvider>,
}

impl BigQueryClient {
    pub fn new(config: BigQueryConfig, tokens: Box<dyn TokenProvider>) -> Self {
        info!(
            project_id = %config.project_id,
            location = ?config.location,
            base_url = %config.base_url,
            request_timeout_s = config.request_timeout_seconds,
            "BigQueryClient initialised"
        );

        Self {
            config,
            http: reqwest::Client::new(),
            tokens,
        }
    }

    /// Client using ambient credentials from the environment (see [`EnvToken`]).
    pub fn from_config(config: BigQueryConfig) -> Self {
        Self::new(config, Box::new(EnvToken::new()))
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // URLs
    // -----------------------------------------------------------------------

    fn project_url(&self, project_id: &str) -> String {
        format!(
            "{}/projects/{}",
            self.config.base_url.trim_end_matches('/'),
            project_id
        )
    }

    fn jobs_url(&self, project_id: &str) -> String {
        format!("{}/jobs", self.project_url(project_id))
    }

    fn job_url(&self, job: &JobHandle) -> String {
        format!("{}/{}", self.jobs_url(&job.project_id), job.job_id)
    }

    fn results_url(&self, job: &JobHandle) -> String {
        format!("{}/queries/{}", self.project_url(&job.project_id), job.job_id)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Attach the bearer token and the per-request timeout, then send.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let token = self.tokens.access_token().await?;
        Ok(request
            .bearer_auth(token)
            .timeout(self.config.request_timeout())
            .send()
            .await?)
    }

    /// Turn a non-success response into [`ServiceError::Api`].
    async fn check(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Parse(e.to_string()))
    }

    /// `jobs.get`. `None` when the service answers 404.
    async fn get_job(&self, job: &JobHandle) -> Result<Option<JobHandle>, ServiceError> {
        let mut request = self.http.get(self.job_url(job));
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource: JobResource = Self::decode(Self::check(response).await?).await?;
        Ok(Some(resource.apply_to(job.clone())))
    }
}

/// Next backoff delay with up to 100 ms of jitter.
fn next_delay(delay_ms: u64) -> (Duration, u64) {
    // Jitter without rand: nanosecond fraction of the current time.
    let jitter_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        % 100;

    let sleep = Duration::from_millis(delay_ms + jitter_ms as u64);
    let advanced = ((delay_ms as f64 * POLL_BACKOFF_FACTOR) as u64).min(MAX_POLL_DELAY_MS);
    (sleep, advanced)
}

#[async_trait]
impl QueryService for BigQueryClient {
    async fn submit(&self, request: &QueryJobRequest) -> Result<JobHandle, ServiceError> {
        let location = self.config.location.as_deref();
        let body = query_job_body(request, &self.config.project_id, location);

        debug!(job_id = %request.job_id, "Inserting query job");

        let response = self
            .send(self.http.post(self.jobs_url(&self.config.project_id)).json(&body))
            .await?;
        let resource: JobResource = Self::decode(Self::check(response).await?).await?;

        let pending = JobHandle::pending(
            request.job_id.clone(),
            &self.config.project_id,
            location,
        );
        Ok(resource.apply_to(pending))
    }

    /// Poll `jobs.get` with exponential backoff until the job is `DONE`.
    async fn wait_for(&self, job: JobHandle) -> Result<Option<JobHandle>, ServiceError> {
        if job.is_done() {
            return Ok(Some(job));
        }

        let start = Instant::now();
        let mut delay_ms = INITIAL_POLL_DELAY_MS;
        let mut current = job;

        loop {
            let (sleep, advanced) = next_delay(delay_ms);
            tokio::time::sleep(sleep).await;
            delay_ms = advanced;

            current = match self.get_job(&current).await? {
                Some(job) => job,
                None => return Ok(None),
            };

            debug!(
                job_id = %current.job_id,
                state = ?current.state,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling job status"
            );

            if current.is_done() {
                return Ok(Some(current));
            }
        }
    }

    async fn fetch_page(
        &self,
        job: &JobHandle,
        page_token: Option<&str>,
    ) -> Result<ResultPage, ServiceError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(max) = self.config.page_size {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }

        let response = self
            .send(self.http.get(self.results_url(job)).query(&params))
            .await?;
        let results: QueryResultsResponse = Self::decode(Self::check(response).await?).await?;
        results.into_page()
    }

    async fn cancel(&self, job: &JobHandle) -> Result<(), ServiceError> {
        info!(job_id = %job.job_id, "Cancelling job");

        let mut request = self.http.post(format!("{}/cancel", self.job_url(job)));
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }
        Self::check(self.send(request).await?).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests — URL building and backoff only, no network calls
// ---------------------------------------------------------------------------
