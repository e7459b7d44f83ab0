//! Drives the table resource against a scripted Storage API that answers each path with a fixed
//! sequence of responses.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use kbc_client::models::FormFields;
use kbc_client::{Error, Result, StorageApi};
use kbc_provider::{ResourceError, TableResource, TableSpec};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

// ============================================================================
// Test Setup
// ============================================================================

#[derive(Default)]
struct ScriptedStorage {
    // path -> responses, the last one repeats
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    // (path, fields) in request order
    sent: Mutex<Vec<(String, FormFields)>>,
}

impl ScriptedStorage {
    fn respond(self, path: &str, bodies: impl IntoIterator<Item = Value>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), bodies.into_iter().collect());
        self
    }

    fn sent(&self) -> Vec<(String, FormFields)> {
        self.sent.lock().unwrap().clone()
    }

    fn next<T: DeserializeOwned>(&self, path: &str, fields: FormFields) -> Result<T> {
        self.sent.lock().unwrap().push((path.to_string(), fields));
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(path).ok_or_else(|| Error::ApiError {
            status: 404,
            message: format!("no response scripted for {path}"),
        })?;
        let body = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
        .unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        })
    }
}

impl StorageApi for ScriptedStorage {
    async fn post_to_file_import<T>(&self, path: &str, fields: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.next(path, fields)
    }

    async fn post_to_storage<T>(&self, path: &str, form: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.next(path, form)
    }

    async fn get_from_storage<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.next(path, FormFields::new())
    }

    async fn delete_from_storage(&self, path: &str) -> Result<()> {
        self.next::<Value>(path, FormFields::new()).map(|_| ())
    }
}

fn table_body(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "delimiter": ",",
        "enclosure": "\"",
        "transactional": false,
        "columns": ["a", "b", "c"],
        "primaryKey": ["a"],
        "indexedColumns": [],
    })
}

fn mytable_spec() -> TableSpec {
    TableSpec::new("in.c-bucket", "mytable")
        .with_columns(["a", "b", "c"])
        .with_primary_key(["a"])
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn create_waits_for_job_and_reads_table_back() {
    let storage = ScriptedStorage::default()
        .respond("upload-file", [json!({"id": 42})])
        .respond(
            "storage/buckets/in.c-bucket/tables-async",
            [json!({"id": "job-7"})],
        )
        .respond(
            "storage/jobs/job-7",
            [
                json!({"status": "waiting"}),
                json!({"status": "success", "results": {"id": "in.c-bucket.mytable"}}),
            ],
        )
        .respond(
            "storage/tables/in.c-bucket.mytable",
            [table_body("in.c-bucket.mytable", "mytable")],
        );

    let tables = TableResource::new(&storage);
    let mut state = tables.create(mytable_spec()).await.unwrap();
    assert_eq!(state.id(), Some("in.c-bucket.mytable"));

    // a later refresh still sees the same table
    tables.read(&mut state).await.unwrap();
    assert_eq!(state.spec.name, "mytable");
    assert_eq!(state.spec.primary_key, vec!["a"]);

    let sent = storage.sent();
    let paths: Vec<_> = sent.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "upload-file",
            "storage/buckets/in.c-bucket/tables-async",
            "storage/jobs/job-7",
            "storage/jobs/job-7",
            "storage/tables/in.c-bucket.mytable",
            "storage/tables/in.c-bucket.mytable",
        ]
    );
    assert_eq!(sent[0].1.get("data"), Some("a,b,c"));
    assert_eq!(sent[1].1.get("dataFileId"), Some("42"));
    assert_eq!(sent[1].1.get("delimiter"), Some(","));
    assert_eq!(sent[1].1.get("enclosure"), Some("\""));
}

#[tokio::test(start_paused = true)]
async fn error_status_never_assigns_an_id() {
    let storage = ScriptedStorage::default()
        .respond("upload-file", [json!({"id": 42})])
        .respond(
            "storage/buckets/in.c-bucket/tables-async",
            [json!({"id": 7})],
        )
        .respond(
            "storage/jobs/7",
            [
                json!({"status": "processing"}),
                json!({
                    "status": "error",
                    "results": {"id": ""},
                    "error": {"message": "Column names must be unique"}
                }),
            ],
        );

    let err = TableResource::new(&storage)
        .create(mytable_spec())
        .await
        .unwrap_err();

    match err {
        ResourceError::JobFailed { job_id, message } => {
            assert_eq!(job_id, "7");
            assert_eq!(message, "Column names must be unique");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
    assert!(storage
        .sent()
        .iter()
        .all(|(path, _)| !path.starts_with("storage/tables/")));
}

#[tokio::test]
async fn delete_then_read_of_deleted_table() {
    let storage =
        ScriptedStorage::default().respond("storage/tables/in.c-bucket.mytable", [Value::Null]);

    let tables = TableResource::new(&storage);
    let mut state = kbc_provider::TableState::new(mytable_spec());
    state.set_id("in.c-bucket.mytable");

    tables.delete(&mut state).await.unwrap();
    assert_eq!(state.id(), None);

    // nothing to refresh once the id is gone
    tables.read(&mut state).await.unwrap();
    assert_eq!(storage.sent().len(), 1);
}
