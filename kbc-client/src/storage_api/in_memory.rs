//! In-memory implementation of [`StorageApi`] for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::models::{FormFields, StorageTable};

use super::StorageApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    FileImport,
    Storage,
}

/// A request as the in-memory API received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: RequestMethod,
    pub endpoint: Endpoint,
    pub path: String,
    pub fields: FormFields,
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone)]
enum JobOutcome {
    CreateTable(StorageTable),
    Fail(String),
}

#[derive(Debug, Clone)]
struct JobData {
    id: String,
    polls_remaining: u32,
    outcome: JobOutcome,
    /// Set once the job reached a terminal status.
    finished: Option<Value>,
}

// ============================================================================
// InMemoryStorageApi
// ============================================================================

#[derive(Default)]
struct State {
    next_file_id: u64,
    next_job_id: u64,
    // file id -> uploaded data
    files: HashMap<u64, String>,
    jobs: HashMap<String, JobData>,
    // table id -> table
    tables: HashMap<String, StorageTable>,
    requests: Vec<RecordedRequest>,
    // path -> canned response, returned instead of the simulated one
    overrides: HashMap<String, Value>,
    // path -> (status, message)
    failures: HashMap<String, (u16, String)>,
    polls_before_completion: u32,
    fail_next_job: Option<String>,
}

/// Simulates the file import and Storage API endpoints used by table resources.
///
/// Table create jobs report `waiting`/`processing` for a configurable number of polls, then
/// either create the table and report `success`, or report `error`.
pub struct InMemoryStorageApi {
    state: RwLock<State>,
}

impl InMemoryStorageApi {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_file_id: 1,
                next_job_id: 1,
                polls_before_completion: 1,
                ..Default::default()
            }),
        }
    }

    /// Number of job status reads that report the job as still running.
    pub fn with_polls_before_completion(self, polls: u32) -> Self {
        self.state.write().unwrap().polls_before_completion = polls;
        self
    }

    /// Id handed out to the next uploaded file.
    pub fn with_next_file_id(self, id: u64) -> Self {
        self.state.write().unwrap().next_file_id = id;
        self
    }

    /// The next table create job ends with status `error` and this message.
    pub fn fail_next_job(&self, message: impl Into<String>) {
        self.state.write().unwrap().fail_next_job = Some(message.into());
    }

    /// Every request to `path` answers with `status` and `message`.
    pub fn fail_requests_to(
        &self,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert(path.into(), (status, message.into()));
    }

    /// Requests to `path` answer with `body` instead of the simulated response.
    pub fn set_response(&self, path: impl Into<String>, body: Value) {
        self.state
            .write()
            .unwrap()
            .overrides
            .insert(path.into(), body);
    }

    pub fn insert_table(&self, table: StorageTable) {
        self.state
            .write()
            .unwrap()
            .tables
            .insert(table.id.clone(), table);
    }

    pub fn table(&self, table_id: &str) -> Option<StorageTable> {
        self.state.read().unwrap().tables.get(table_id).cloned()
    }

    pub fn uploaded_file(&self, file_id: u64) -> Option<String> {
        self.state.read().unwrap().files.get(&file_id).cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// Requests whose path starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    fn handle(
        &self,
        method: RequestMethod,
        endpoint: Endpoint,
        path: &str,
        fields: FormFields,
    ) -> Result<Value> {
        let mut state = self.state.write().unwrap();
        state.requests.push(RecordedRequest {
            method,
            endpoint,
            path: path.to_string(),
            fields: fields.clone(),
        });

        if let Some((status, message)) = state.failures.get(path) {
            return Err(Error::ApiError {
                status: *status,
                message: message.clone(),
            });
        }
        if let Some(body) = state.overrides.get(path) {
            return Ok(body.clone());
        }

        match (method, endpoint) {
            (RequestMethod::Post, Endpoint::FileImport) if path == "upload-file" => {
                Ok(state.upload_file(&fields))
            }
            (RequestMethod::Post, Endpoint::Storage) => {
                let bucket_id = path
                    .strip_prefix("storage/buckets/")
                    .and_then(|p| p.strip_suffix("/tables-async"))
                    .ok_or_else(|| not_found(path))?;
                state.create_table_job(bucket_id, &fields)
            }
            (RequestMethod::Get, Endpoint::Storage) => {
                if let Some(job_id) = path.strip_prefix("storage/jobs/") {
                    state.poll_job(job_id).ok_or_else(|| not_found(path))
                } else if let Some(table_id) = path.strip_prefix("storage/tables/") {
                    let table = state.tables.get(table_id).ok_or_else(|| not_found(path))?;
                    Ok(json!(table))
                } else {
                    Err(not_found(path))
                }
            }
            (RequestMethod::Delete, Endpoint::Storage) => {
                let table_id = path
                    .strip_prefix("storage/tables/")
                    .ok_or_else(|| not_found(path))?;
                state
                    .tables
                    .remove(table_id)
                    .map(|_| Value::Null)
                    .ok_or_else(|| not_found(path))
            }
            _ => Err(not_found(path)),
        }
    }
}

impl Default for InMemoryStorageApi {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn upload_file(&mut self, fields: &FormFields) -> Value {
        let id = self.next_file_id;
        self.next_file_id += 1;
        self.files
            .insert(id, fields.get("data").unwrap_or_default().to_string());
        json!({ "id": id })
    }

    fn create_table_job(&mut self, bucket_id: &str, form: &FormFields) -> Result<Value> {
        let name = form.get("name").unwrap_or_default();
        let file_id = form
            .get("dataFileId")
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or_else(|| bad_request("dataFileId is required"))?;
        let header = self
            .files
            .get(&file_id)
            .ok_or_else(|| bad_request(&format!("File {file_id} not found")))?;
        let delimiter = form.get("delimiter").unwrap_or(",");

        let table_id = StorageTable::table_id(bucket_id, name);
        let outcome = match self.fail_next_job.take() {
            Some(message) => JobOutcome::Fail(message),
            None if self.tables.contains_key(&table_id) => {
                JobOutcome::Fail(format!("Table {table_id} already exists"))
            }
            None => JobOutcome::CreateTable(StorageTable {
                id: table_id,
                name: name.to_string(),
                delimiter: delimiter.to_string(),
                enclosure: form.get("enclosure").unwrap_or("\"").to_string(),
                transactional: false,
                // header uploads are always comma-joined
                columns: split_list(header, ","),
                primary_key: split_list(form.get("primaryKey").unwrap_or_default(), ","),
                indexed_columns: split_list(form.get("indexedColumns").unwrap_or_default(), ","),
            }),
        };

        let id = self.next_job_id.to_string();
        self.next_job_id += 1;
        self.jobs.insert(
            id.clone(),
            JobData {
                id: id.clone(),
                polls_remaining: self.polls_before_completion,
                outcome,
                finished: None,
            },
        );
        Ok(json!({ "id": id, "status": "waiting" }))
    }

    fn poll_job(&mut self, job_id: &str) -> Option<Value> {
        let job = self.jobs.get_mut(job_id)?;
        if let Some(finished) = &job.finished {
            return Some(finished.clone());
        }
        if job.polls_remaining > 0 {
            let status = if job.polls_remaining == self.polls_before_completion {
                "waiting"
            } else {
                "processing"
            };
            job.polls_remaining -= 1;
            return Some(json!({ "id": job.id, "status": status, "results": [] }));
        }

        let finished = match job.outcome.clone() {
            JobOutcome::CreateTable(table) => {
                let body = json!({
                    "id": job.id,
                    "status": "success",
                    "results": { "id": table.id, "name": table.name },
                });
                self.tables.insert(table.id.clone(), table);
                body
            }
            JobOutcome::Fail(message) => json!({
                "id": job.id,
                "status": "error",
                "results": [],
                "error": { "code": "storage.jobFailed", "message": message },
            }),
        };
        job.finished = Some(finished.clone());
        Some(finished)
    }
}

fn split_list(value: &str, delimiter: &str) -> Vec<String> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn not_found(path: &str) -> Error {
    Error::ApiError {
        status: 404,
        message: format!("{path} not found"),
    }
}

fn bad_request(message: &str) -> Error {
    Error::ApiError {
        status: 400,
        message: message.to_string(),
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|source| Error::Decode {
        path: path.to_string(),
        source,
    })
}

impl StorageApi for InMemoryStorageApi {
    async fn post_to_file_import<T>(&self, path: &str, fields: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let body = self.handle(RequestMethod::Post, Endpoint::FileImport, path, fields)?;
        decode(path, body)
    }

    async fn post_to_storage<T>(&self, path: &str, form: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let body = self.handle(RequestMethod::Post, Endpoint::Storage, path, form)?;
        decode(path, body)
    }

    async fn get_from_storage<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let body = self.handle(RequestMethod::Get, Endpoint::Storage, path, FormFields::new())?;
        decode(path, body)
    }

    async fn delete_from_storage(&self, path: &str) -> Result<()> {
        self.handle(
            RequestMethod::Delete,
            Endpoint::Storage,
            path,
            FormFields::new(),
        )
        .map(|_| ())
    }
}

// ============================================================================
// Tests
// ============================================================================
