use crate::error::{FenrirError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Read-only glossary mapping a concept keyword to its definition payload.
///
/// Built once from two source documents; on key collision the second source
/// wins. There is no mutation API, so a store can be shared behind an `Arc`
/// and read concurrently.
#[derive(Debug, Clone, Default)]
pub struct ConceptStore {
    entries: BTreeMap<String, Value>,
}

impl ConceptStore {
    /// Merge two in-memory sources, `secondary` overriding `primary`.
    pub fn from_sources(primary: Map<String, Value>, secondary: Map<String, Value>) -> Self {
        let mut entries: BTreeMap<String, Value> = primary.into_iter().collect();
        for (keyword, entry) in secondary {
            if entries.insert(keyword.clone(), entry).is_some() {
                debug!("Concept '{}' overridden by secondary source", keyword);
            }
        }
        Self { entries }
    }

    /// Load and merge the two concept documents.
    ///
    /// Either document failing to read or parse aborts the load; no partial
    /// store is returned.
    pub fn load(primary: &Path, secondary: &Path) -> Result<Self> {
        let first = Self::read_source(primary)?;
        let second = Self::read_source(secondary)?;
        let (first_len, second_len) = (first.len(), second.len());
        let store = Self::from_sources(first, second);

        info!(
            "Loaded {} concepts ({} from {}, {} from {})",
            store.len(),
            first_len,
            primary.display(),
            second_len,
            secondary.display()
        );
        Ok(store)
    }

    fn read_source(path: &Path) -> Result<Map<String, Value>> {
        let content = std::fs::read_to_string(path).map_err(|e| FenrirError::ConceptLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(FenrirError::ConceptLoad {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(FenrirError::ConceptLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.entries.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    /// The keyword vocabulary the extraction stage is restricted to.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
