//! Serde shapes of the REST payloads the client reads and writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::convert::decode_rows;
use crate::error::ServiceError;
use crate::job::{ErrorProto, JobHandle, JobState, JobStatistics, QueryJobRequest};
use crate::result::{ResultPage, Schema};

/// Body of `jobs.insert` for a query job.
pub(crate) fn query_job_body(
    request: &QueryJobRequest,
    project_id: &str,
    location: Option<&str>,
) -> Value {
    let mut job_reference = json!({
        "projectId": project_id,
        "jobId": request.job_id.as_str(),
    });
    if let Some(location) = location {
        job_reference["location"] = json!(location);
    }

    json!({
        "jobReference": job_reference,
        "configuration": {
            "query": {
                "query": request.query,
                "useLegacySql": request.use_legacy_sql,
            }
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobResource {
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub status: Option<JobStatusWire>,
    #[serde(default)]
    pub statistics: Option<JobStatisticsWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatusWire {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error_result: Option<ErrorProto>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// Int64 values travel as JSON strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatisticsWire {
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub total_bytes_processed: Option<String>,
    #[serde(default)]
    pub query: Option<QueryStatisticsWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryStatisticsWire {
    #[serde(default)]
    pub cache_hit: Option<bool>,
    #[serde(default)]
    pub total_bytes_processed: Option<String>,
}

fn millis_to_utc(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

impl JobResource {
    /// Fold a job resource into `prior`, keeping its identity fields.
    pub fn apply_to(self, prior: JobHandle) -> JobHandle {
        let status = self.status;
        let stats = self.statistics;

        let location = self
            .job_reference
            .and_then(|r| r.location)
            .or(prior.location);

        let state = status
            .as_ref()
            .and_then(|s| s.state.as_deref())
            .map(JobState::from_api)
            .unwrap_or(prior.state);

        let (error_result, errors) = match status {
            Some(s) => (s.error_result, s.errors),
            None => (None, Vec::new()),
        };

        let statistics = match stats {
            Some(s) => {
                let query = s.query.as_ref();
                JobStatistics {
                    total_bytes_processed: query
                        .and_then(|q| q.total_bytes_processed.as_deref())
                        .or(s.total_bytes_processed.as_deref())
                        .and_then(|v| v.parse().ok()),
                    cache_hit: query.and_then(|q| q.cache_hit),
                    creation_time: millis_to_utc(s.creation_time.as_deref()),
                    end_time: millis_to_utc(s.end_time.as_deref()),
                }
            }
            None => prior.statistics,
        };

        JobHandle {
            job_id: prior.job_id,
            project_id: prior.project_id,
            location,
            state,
            error_result,
            errors,
            statistics,
        }
    }
}

/// Response of `jobs.getQueryResults`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResultsResponse {
    #[serde(default)]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub total_rows: Option<String>,
    #[serde(default)]
    pub job_complete: Option<bool>,
}

impl QueryResultsResponse {
    pub fn into_page(self) -> Result<ResultPage, ServiceError> {
        if self.job_complete == Some(false) {
            return Err(ServiceError::Parse(
                "results requested before the job completed".into(),
            ));
        }

        let schema = Arc::new(self.schema.unwrap_or_default());
        let rows = decode_rows(&schema, &self.rows)?;

        Ok(ResultPage {
            schema,
            rows,
            page_token: self.page_token.filter(|t| !t.is_empty()),
            total_rows: self.total_rows.and_then(|v| v.parse().ok()),
        })
    }
}
