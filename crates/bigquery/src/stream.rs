use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tracing::debug;

use crate::error::QueryError;
use crate::job::JobHandle;
use crate::result::{ResultPage, ResultRow, Schema};
use crate::service::QueryService;

/// Lazy, forward-only sequence of result rows.
///
/// Holds at most one page in memory. When the buffered page runs out and
/// the service handed back a page token, the next page is fetched on the
/// following poll. A page fetch error is yielded once and ends the stream.
/// The stream cannot be restarted; run the query again for a second pass.
pub struct RowStream {
    schema: Arc<Schema>,
    total_rows: Option<u64>,
    job: JobHandle,
    inner: BoxStream<'static, Result<ResultRow, QueryError>>,
}

struct PageCursor<S> {
    service: Arc<S>,
    job: JobHandle,
    buffer: VecDeque<ResultRow>,
    page_token: Option<String>,
    pages_fetched: usize,
}

impl RowStream {
    /// Wrap the already fetched first page of `job`.
    pub fn new<S: QueryService + 'static>(service: Arc<S>, job: JobHandle, first: ResultPage) -> Self {
        let schema = Arc::clone(&first.schema);
        let total_rows = first.total_rows;

        let cursor = PageCursor {
            service,
            job: job.clone(),
            buffer: first.rows.into(),
            page_token: first.page_token,
            pages_fetched: 1,
        };

        let inner = stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(row) = cursor.buffer.pop_front() {
                    return Some((Ok(row), cursor));
                }

                // Buffer drained: stop on the last page, else fetch the next.
                let token = cursor.page_token.take()?;
                match cursor.service.fetch_page(&cursor.job, Some(token.as_str())).await {
                    Ok(page) => {
                        cursor.pages_fetched += 1;
                        debug!(
                            job_id = %cursor.job.job_id,
                            page = cursor.pages_fetched,
                            rows = page.rows.len(),
                            has_more = page.page_token.is_some(),
                            "Fetched result page"
                        );
                        cursor.buffer.extend(page.rows);
                        cursor.page_token = page.page_token;
                    }
                    Err(e) => return Some((Err(QueryError::from(e)), cursor)),
                }
            }
        })
        // `Unfold` panics if polled again after it has finished.
        .fuse()
        .boxed();

        Self {
            schema,
            total_rows,
            job,
            inner,
        }
    }

    /// Column layout of the result set.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Total row count across all pages, if the service reported it.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    /// The finished job these rows belong to.
    pub fn job(&self) -> &JobHandle {
        &self.job
    }
}

impl Stream for RowStream {
    type Item = Result<ResultRow, QueryError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("job_id", &self.job.job_id)
            .field("columns", &self.schema.len())
            .field("total_rows", &self.total_rows)
            .finish()
    }
}
