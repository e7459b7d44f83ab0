use serde::{Deserialize, Serialize};

// note this is a subset of the actual table detail response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTable {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub delimiter: String,
    #[serde(default)]
    pub enclosure: String,
    #[serde(default)]
    pub transactional: bool,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexed_columns: Vec<String>,
}

impl StorageTable {
    /// Composite table id as assigned by Storage: `<bucket id>.<table name>`.
    pub fn table_id(bucket_id: &str, name: &str) -> String {
        format!("{}.{}", bucket_id, name)
    }
}
