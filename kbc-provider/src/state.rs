use kbc_client::models::{FormFields, StorageTable};
use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};

pub const DEFAULT_DELIMITER: &str = ",";
pub const DEFAULT_ENCLOSURE: &str = "\"";

/// Configuration of a Storage table, as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    #[serde(rename = "bucket_id")]
    pub bucket_id: String,
    pub name: String,
    /// Empty means [`DEFAULT_DELIMITER`].
    #[serde(default)]
    pub delimiter: String,
    /// Empty means [`DEFAULT_ENCLOSURE`].
    #[serde(default)]
    pub enclosure: String,
    #[serde(default)]
    pub transactional: bool,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub indexed_columns: Vec<String>,
}

impl TableSpec {
    pub fn new(bucket_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_primary_key<I, S>(mut self, primary_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = primary_key.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_indexed_columns<I, S>(mut self, indexed_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexed_columns = indexed_columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_enclosure(mut self, enclosure: impl Into<String>) -> Self {
        self.enclosure = enclosure.into();
        self
    }

    pub fn with_transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_id.trim().is_empty() {
            return Err(ResourceError::InvalidSpec("bucket_id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ResourceError::InvalidSpec("name is required".to_string()));
        }
        Ok(())
    }

    /// Id Storage will assign to this table.
    pub fn table_id(&self) -> String {
        StorageTable::table_id(&self.bucket_id, &self.name)
    }

    pub fn delimiter_or_default(&self) -> &str {
        non_empty_or(&self.delimiter, DEFAULT_DELIMITER)
    }

    pub fn enclosure_or_default(&self) -> &str {
        non_empty_or(&self.enclosure, DEFAULT_ENCLOSURE)
    }

    /// CSV header line uploaded as the table's initial data file. Joined with `,` whatever
    /// `delimiter` is.
    pub fn header_line(&self) -> String {
        self.columns.join(",")
    }

    /// Form body for `storage/buckets/{bucket}/tables-async`.
    pub fn create_form(&self, data_file_id: u64) -> FormFields {
        FormFields::new()
            .with("name", self.name.as_str())
            .with("primaryKey", self.primary_key.join(","))
            .with("indexedColumns", self.indexed_columns.join(","))
            .with("dataFileId", data_file_id.to_string())
            .with("delimiter", self.delimiter_or_default())
            .with("enclosure", self.enclosure_or_default())
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Persisted state of one table resource: the remote id, once known, plus the last observed
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub spec: TableSpec,
}

impl TableState {
    pub fn new(spec: TableSpec) -> Self {
        Self { id: None, spec }
    }

    /// The remote id, treating an empty string as unset.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Overwrites every field the remote table reports.
    pub(crate) fn apply_remote(&mut self, table: StorageTable) {
        self.id = Some(table.id);
        self.spec.name = table.name;
        self.spec.delimiter = table.delimiter;
        self.spec.enclosure = table.enclosure;
        self.spec.transactional = table.transactional;
        self.spec.primary_key = table.primary_key;
        self.spec.indexed_columns = table.indexed_columns;
        self.spec.columns = table.columns;
    }
}
