pub mod auth;
pub mod blocking;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod result;
pub mod runner;
pub mod service;
pub mod stream;
mod wire;

pub use auth::{EnvToken, StaticToken, TokenProvider};
pub use blocking::{BlockingQueryRunner, BlockingRows};
pub use client::BigQueryClient;
pub use config::BigQueryConfig;
pub use error::{QueryError, ServiceError};
pub use job::{ErrorProto, JobHandle, JobId, JobState, JobStatistics, QueryJobRequest};
pub use result::{FieldSchema, ResultPage, ResultRow, Schema};
pub use runner::QueryRunner;
pub use service::QueryService;
pub use stream::RowStream;
