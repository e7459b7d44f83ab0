use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error(transparent)]
    Client(#[from] kbc_client::Error),

    #[error("Invalid table configuration: {0}")]
    InvalidSpec(String),

    #[error("Storage job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Storage job {0} succeeded without reporting a table id")]
    MissingJobResult(String),

    #[error("Storage job {job_id} created table {table_id}, but the table could not be read back")]
    CreatedTableNotFound { job_id: String, table_id: String },

    #[error("Storage job {job_id} still running after {attempts} status checks")]
    PollAttemptsExhausted { job_id: String, attempts: u32 },

    #[error("Storage job {job_id} still running after {elapsed:?}")]
    PollTimedOut { job_id: String, elapsed: Duration },

    #[error("Waiting for Storage job {0} was cancelled")]
    Cancelled(String),
}
