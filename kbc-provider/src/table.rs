//! The `keboola_storage_table` resource.

use kbc_client::models::JobStatus;
use kbc_client::storage_api::UPLOAD_FILE_NAME;
use kbc_client::StorageApi;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ResourceError, Result};
use crate::poll::{wait_for_job, JobPollPolicy};
use crate::schema::{FieldSchema, FieldType, ResourceSchema};
use crate::state::{TableSpec, TableState};

pub const RESOURCE_TYPE: &str = "keboola_storage_table";

/// Creates, reads and deletes Storage tables. Tables cannot be updated in place; every field in
/// [`TableResource::schema`] forces a replacement.
pub struct TableResource<'a, C: StorageApi> {
    client: &'a C,
    poll_policy: JobPollPolicy,
}

impl<'a, C: StorageApi> TableResource<'a, C> {
    pub fn new(client: &'a C) -> Self {
        TableResource {
            client,
            poll_policy: JobPollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll_policy: JobPollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    pub fn schema() -> ResourceSchema {
        ResourceSchema {
            type_name: RESOURCE_TYPE,
            fields: vec![
                FieldSchema::required("bucket_id", FieldType::String).force_new(),
                FieldSchema::required("name", FieldType::String).force_new(),
                FieldSchema::optional("delimiter", FieldType::String).force_new(),
                FieldSchema::optional("enclosure", FieldType::String).force_new(),
                FieldSchema::optional("transactional", FieldType::Bool).force_new(),
                FieldSchema::optional("primaryKey", FieldType::StringList).force_new(),
                FieldSchema::optional("columns", FieldType::StringList).force_new(),
                FieldSchema::optional("indexedColumns", FieldType::StringList).force_new(),
            ],
        }
    }

    /// Creates the table described by `spec` and returns its state as read back from Storage.
    pub async fn create(&self, spec: TableSpec) -> Result<TableState> {
        self.create_with_cancel(spec, &CancellationToken::new()).await
    }

    /// Like [`create`](Self::create), but stops waiting for the create job once `cancel` fires.
    /// The job keeps running remotely.
    pub async fn create_with_cancel(
        &self,
        spec: TableSpec,
        cancel: &CancellationToken,
    ) -> Result<TableState> {
        info!(bucket_id = %spec.bucket_id, name = %spec.name, "Creating Storage table");
        spec.validate()?;

        let upload = self
            .client
            .upload_file(UPLOAD_FILE_NAME, spec.header_line())
            .await?;

        let job = self
            .client
            .create_table_async(&spec.bucket_id, spec.create_form(upload.id))
            .await?;
        info!(job_id = %job.id, file_id = upload.id, "Waiting for table create job");

        let job_id = job.id;
        let job = wait_for_job(self.client, &job_id, &self.poll_policy, cancel).await?;
        let table_id = match job.status {
            JobStatus::Success => job
                .result_id()
                .ok_or_else(|| ResourceError::MissingJobResult(job_id.clone()))?
                .to_string(),
            _ => {
                return Err(ResourceError::JobFailed {
                    job_id,
                    message: job
                        .error_message()
                        .unwrap_or("no error detail reported")
                        .to_string(),
                })
            }
        };

        let mut state = TableState::new(spec);
        state.set_id(table_id.as_str());
        // the job created the table, so a missing table is an error here rather than drift
        let refreshed = self.refresh(&mut state, &table_id).await;
        match refreshed {
            Err(ResourceError::Client(kbc_client::Error::TableNotFound(_))) => {
                Err(ResourceError::CreatedTableNotFound { job_id, table_id })
            }
            other => other.map(|()| state),
        }
    }

    /// Refreshes `state` from Storage.
    ///
    /// Nothing happens when `state` has no id. If Storage reports a different id for the
    /// configured bucket and name, `state` is left as is. If the table no longer exists the id is
    /// cleared so the table gets recreated.
    pub async fn read(&self, state: &mut TableState) -> Result<()> {
        let Some(id) = state.id().map(str::to_string) else {
            return Ok(());
        };
        info!(table_id = %id, "Reading Storage table");

        let refreshed = self.refresh(state, &id).await;
        match refreshed {
            Err(ResourceError::Client(kbc_client::Error::TableNotFound(_))) => {
                warn!(table_id = %id, "Storage table no longer exists");
                state.clear_id();
                Ok(())
            }
            other => other,
        }
    }

    /// Fetches the table configured in `state` and applies it when Storage reports `id` for it.
    async fn refresh(&self, state: &mut TableState, id: &str) -> Result<()> {
        let table = self.client.get_table(&state.spec.table_id()).await?;

        if table.id == id {
            state.apply_remote(table);
        } else {
            warn!(
                table_id = %id,
                remote_id = %table.id,
                "Storage returned a different table, keeping local state"
            );
        }
        Ok(())
    }

    /// Deletes the table. The id is only cleared once Storage confirmed the delete.
    pub async fn delete(&self, state: &mut TableState) -> Result<()> {
        let Some(id) = state.id().map(str::to_string) else {
            return Ok(());
        };
        info!(table_id = %id, "Deleting Storage table");

        self.client.delete_table(&id).await?;
        state.clear_id();
        Ok(())
    }
}
