//! Search and pagination parameters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query-string parameters for list and count calls.
pub trait SearchParams: Send + Sync {
    fn offset(&self) -> u64;

    fn limit(&self) -> u32;

    fn set_offset(&mut self, offset: u64);

    fn set_limit(&mut self, limit: u32);

    /// Ordered `(key, value)` pairs. Failing here fails the call before any I/O.
    fn to_query(&self) -> Result<Vec<(String, String)>>;
}

/// Check `limit` against a page size ceiling.
pub fn validate_limit(limit: u32, max: u32) -> Result<()> {
    if limit == 0 || limit > max {
        return Err(Error::InvalidPageLimit { limit, max });
    }
    Ok(())
}

/// Flatten a serializable value into sorted query pairs.
///
/// Scalars become one pair, arrays of scalars repeat the key, nulls are
/// skipped. Nested objects have no query-string form and are rejected.
pub fn query_pairs<T: Serialize>(value: &T) -> Result<Vec<(String, String)>> {
    let Value::Object(map) = serde_json::to_value(value).map_err(|e| Error::Query(e.to_string()))? else {
        return Err(Error::Query("search parameters must serialize to an object".to_string()));
    };

    let sorted: BTreeMap<String, Value> = map.into_iter().collect();
    let mut pairs = Vec::with_capacity(sorted.len());
    for (key, value) in sorted {
        match value {
            Value::Null => {},
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar(&key, item)?));
                }
            },
            other => pairs.push((key.clone(), scalar(&key, other)?)),
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Error::Query(format!(
            "parameter '{}' is nested and has no query-string form",
            key
        ))),
    }
}

/// General purpose offset/limit parameters with free-form filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub offset: u64,
    pub limit: u32,
    #[serde(flatten)]
    pub filters: BTreeMap<String, String>,
}

impl PageQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

impl SearchParams for PageQuery {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn limit(&self) -> u32 {
        self.limit
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    fn to_query(&self) -> Result<Vec<(String, String)>> {
        query_pairs(self)
    }
}
