use serde::Serialize;

/// Ordered `key=value` pairs sent either as `application/x-www-form-urlencoded` or as the text
/// parts of a multipart body. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FormFields {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_first_value() {
        let form = FormFields::new()
            .with("name", "orders")
            .with("delimiter", ",")
            .with("name", "ignored");
        assert_eq!(form.get("name"), Some("orders"));
        assert_eq!(form.get("missing"), None);
        assert_eq!(
            form.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["name", "delimiter", "name"]
        );
    }

    #[test]
    fn serializes_as_sequence_of_pairs() {
        let form = FormFields::new().with("a", "1").with("b", "2");
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            serde_json::json!([["a", "1"], ["b", "2"]])
        );
    }
}
