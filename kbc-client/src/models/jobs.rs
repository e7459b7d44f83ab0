use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Reference to an asynchronous Storage job, as returned by `*-async` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Waiting,
    Processing,
    Success,
    Error,
    /// Any status this client does not know about. Treated as still running.
    Other(String),
}

impl JobStatus {
    /// `success` and `error` are the only statuses a job never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Processing => "processing",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "waiting" => JobStatus::Waiting,
            "processing" => JobStatus::Processing,
            "success" => JobStatus::Success,
            "error" => JobStatus::Error,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResults {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageJob {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "results_object")]
    pub results: Option<JobResults>,
    #[serde(default)]
    pub error: Option<JobError>,
    #[serde(default)]
    pub created_time: Option<String>,
}

impl StorageJob {
    /// Id of the object the job produced, e.g. the table id for a table create job.
    pub fn result_id(&self) -> Option<&str> {
        self.results
            .as_ref()
            .and_then(|r| r.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Storage reports times as `2024-03-01T10:15:00+0100`.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%z").ok())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

// unfinished jobs report `"results": []` instead of an object
fn results_object<'de, D>(deserializer: D) -> Result<Option<JobResults>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::string(json!({"id": "job-7"}), "job-7")]
    #[case::number(json!({"id": 123456}), "123456")]
    fn job_reference_accepts_string_and_number(
        #[case] body: serde_json::Value,
        #[case] expected: &str,
    ) {
        let job: JobReference = serde_json::from_value(body).unwrap();
        assert_eq!(job.id, expected);
    }

    #[rstest]
    #[case("waiting", JobStatus::Waiting, false)]
    #[case("processing", JobStatus::Processing, false)]
    #[case("success", JobStatus::Success, true)]
    #[case("error", JobStatus::Error, true)]
    #[case("cancelled", JobStatus::Other("cancelled".to_string()), false)]
    fn parses_status(#[case] raw: &str, #[case] expected: JobStatus, #[case] terminal: bool) {
        let job: StorageJob = serde_json::from_value(json!({"id": 1, "status": raw})).unwrap();
        assert_eq!(job.status, expected);
        assert_eq!(job.status.is_terminal(), terminal);
        assert_eq!(job.status.to_string(), raw);
    }

    #[test]
    fn waiting_job_with_empty_results_array() {
        let job: StorageJob =
            serde_json::from_value(json!({"id": "7", "status": "waiting", "results": []}))
                .unwrap();
        assert_eq!(job.results, None);
        assert_eq!(job.result_id(), None);
    }

    #[test]
    fn successful_job_exposes_result_id() {
        let job: StorageJob = serde_json::from_value(json!({
            "id": "7",
            "status": "success",
            "results": {"id": "in.c-bucket.mytable", "name": "mytable"},
            "createdTime": "2024-03-01T10:15:00+0100"
        }))
        .unwrap();
        assert_eq!(job.result_id(), Some("in.c-bucket.mytable"));
        let created = job.created_at().unwrap();
        assert_eq!(created.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn failed_job_exposes_error_message() {
        let job: StorageJob = serde_json::from_value(json!({
            "id": "7",
            "status": "error",
            "results": {},
            "error": {"code": "storage.tables.validation", "message": "Invalid columns"}
        }))
        .unwrap();
        assert_eq!(job.result_id(), None);
        assert_eq!(job.error_message(), Some("Invalid columns"));
    }
}
