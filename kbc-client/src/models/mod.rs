pub mod files;
pub mod form;
pub mod jobs;
pub mod tables;

pub use files::UploadFileResult;
pub use form::FormFields;
pub use jobs::{JobError, JobReference, JobResults, JobStatus, StorageJob};
pub use tables::StorageTable;
