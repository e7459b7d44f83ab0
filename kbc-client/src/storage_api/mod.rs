//! The [`StorageApi`] trait is the handle resource code is given to talk to Keboola. It covers the
//! two endpoint families a table resource needs (file import and Storage API) and layers typed
//! calls for the individual endpoints on top.

#[cfg(any(test, feature = "test-utils"))]
mod in_memory;

#[cfg(any(test, feature = "test-utils"))]
pub use in_memory::{Endpoint, InMemoryStorageApi, RecordedRequest, RequestMethod};

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::models::{FormFields, JobReference, StorageJob, StorageTable, UploadFileResult};

/// File name Storage records for header-only uploads.
pub const UPLOAD_FILE_NAME: &str = "from-text-input.csv";

pub trait StorageApi: Send + Sync {
    /// Sends `fields` as a multipart body to a path under the file import URL.
    fn post_to_file_import<T>(
        &self,
        path: &str,
        fields: FormFields,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    /// Sends `form` url-encoded to a path under the Storage API URL.
    fn post_to_storage<T>(
        &self,
        path: &str,
        form: FormFields,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    fn get_from_storage<T>(&self, path: &str) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    fn delete_from_storage(&self, path: &str) -> impl Future<Output = Result<()>> + Send;

    /// Uploads `data` as a CSV file and returns the id Storage assigned to it.
    fn upload_file(
        &self,
        name: &str,
        data: String,
    ) -> impl Future<Output = Result<UploadFileResult>> + Send {
        let fields = FormFields::new().with("name", name).with("data", data);
        self.post_to_file_import("upload-file", fields)
    }

    /// Starts an asynchronous table create in `bucket_id`.
    fn create_table_async(
        &self,
        bucket_id: &str,
        form: FormFields,
    ) -> impl Future<Output = Result<JobReference>> + Send {
        let path = format!("storage/buckets/{}/tables-async", bucket_id);
        async move { self.post_to_storage(&path, form).await }
    }

    fn get_job(&self, job_id: &str) -> impl Future<Output = Result<StorageJob>> + Send {
        let path = format!("storage/jobs/{}", job_id);
        async move { self.get_from_storage(&path).await }
    }

    /// Fetches table detail. A 404 is reported as [`Error::TableNotFound`].
    fn get_table(&self, table_id: &str) -> impl Future<Output = Result<StorageTable>> + Send {
        let path = format!("storage/tables/{}", table_id);
        let table_id = table_id.to_string();
        async move {
            match self.get_from_storage(&path).await {
                Err(Error::ApiError { status: 404, .. }) => Err(Error::TableNotFound(table_id)),
                other => other,
            }
        }
    }

    fn delete_table(&self, table_id: &str) -> impl Future<Output = Result<()>> + Send {
        let path = format!("storage/tables/{}", table_id);
        async move { self.delete_from_storage(&path).await }
    }
}
