//! Synchronous facade over [`QueryRunner`] for callers without an async runtime.

use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::{Builder, Runtime};

use crate::error::QueryError;
use crate::job::JobHandle;
use crate::result::{ResultRow, Schema};
use crate::runner::QueryRunner;
use crate::service::QueryService;
use crate::stream::RowStream;

/// Blocks the calling thread for each step of the query protocol.
///
/// Owns a current-thread runtime. Must not be used from inside another
/// tokio runtime: `block_on` panics there.
pub struct BlockingQueryRunner<S> {
    runtime: Arc<Runtime>,
    inner: QueryRunner<S>,
}

impl<S: QueryService + 'static> BlockingQueryRunner<S> {
    pub fn new(inner: QueryRunner<S>) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    /// Submit `query`, block until the job is finished, and return an
    /// iterator over its rows. Later pages are fetched as the iterator advances.
    pub fn run(&self, query: &str) -> Result<BlockingRows, QueryError> {
        let stream = self.runtime.block_on(self.inner.run(query))?;
        Ok(BlockingRows {
            runtime: Arc::clone(&self.runtime),
            stream,
        })
    }

    pub fn runner(&self) -> &QueryRunner<S> {
        &self.inner
    }
}

/// Blocking, single-pass iterator over a query's rows.
#[derive(Debug)]
pub struct BlockingRows {
    runtime: Arc<Runtime>,
    stream: RowStream,
}

impl BlockingRows {
    pub fn schema(&self) -> &Schema {
        self.stream.schema()
    }

    pub fn total_rows(&self) -> Option<u64> {
        self.stream.total_rows()
    }

    pub fn job(&self) -> &JobHandle {
        self.stream.job()
    }
}

impl Iterator for BlockingRows {
    type Item = Result<ResultRow, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
