//! Ballot parsing and canonicalization
//!
//! A ballot is one raw vote record from the vote log. Two ballots vote for
//! the same candidate when their canonical keys are byte-identical.

use serde::Serialize;
use serde_json::Value;

/// Comparison-relevant projection of a vote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-order projection of an object ballot. Field order here is the
/// serialized order.
#[derive(Serialize)]
struct Projection<'a> {
    action: &'a Value,
    result: &'a Value,
}

/// A parsed vote record paired with its canonical key
#[derive(Debug, Clone, PartialEq)]
pub struct Ballot {
    key: CanonicalKey,
    record: Value,
}

impl Ballot {
    /// Parse a raw vote record.
    ///
    /// Returns `None` for blank or unparsable input; such records are not
    /// votes.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let record: Value = serde_json::from_str(trimmed).ok()?;
        let key = canonical_key(&record);
        Some(Self { key, record })
    }

    pub fn key(&self) -> &CanonicalKey {
        &self.key
    }

    /// The decoded record as it was written, extra fields included
    pub fn record(&self) -> &Value {
        &self.record
    }

    pub fn into_record(self) -> Value {
        self.record
    }
}

/// Normalize a raw vote record into its canonical key.
///
/// Object records project to `{"action":…,"result":…}` (missing fields become
/// `""`, every other field such as `step_id` is dropped). Any other JSON value
/// is keyed by its own compact serialization.
///
/// # Example
///
/// ```
/// use maker_domain::voting::normalize;
///
/// let a = normalize(r#"{"action":"x","result":"y","step_id":"s1"}"#);
/// let b = normalize(r#"{ "result": "y", "action": "x" }"#);
/// assert_eq!(a, b);
/// assert!(normalize("{not json").is_none());
/// ```
pub fn normalize(raw: &str) -> Option<CanonicalKey> {
    Ballot::parse(raw).map(|ballot| ballot.key)
}

fn canonical_key(record: &Value) -> CanonicalKey {
    let empty = Value::String(String::new());
    let serialized = match record {
        Value::Object(map) => serde_json::to_string(&Projection {
            action: &sort_keys(map.get("action").unwrap_or(&empty)),
            result: &sort_keys(map.get("result").unwrap_or(&empty)),
        }),
        other => serde_json::to_string(&sort_keys(other)),
    };
    // Serializing an in-memory Value cannot fail; fall back to Display anyway
    CanonicalKey(serialized.unwrap_or_else(|_| record.to_string()))
}

/// Rebuild nested objects with keys in sorted order, whatever map
/// implementation serde_json was compiled with.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
