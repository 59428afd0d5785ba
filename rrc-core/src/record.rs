//! Auxiliary information attached to environment steps and episode records.
//!
//! A [`Record`] is a flat key-value container whose values are restricted to
//! primitives ([`RecordValue`]), so it can always be serialized into the JSON
//! evaluation report.
//!
//! ```rust
//! use rrc_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("object_distance", RecordValue::Scalar(0.12));
//! record.insert("goal", RecordValue::Array1(vec![0.0, 0.0, 0.0325]));
//! assert_eq!(record.get_scalar("object_distance").unwrap(), 0.12);
//! ```
use crate::error::RrcError;
use serde::Serialize;
use std::collections::{btree_map::Iter, BTreeMap};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f32),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A container for storing key-value pairs of various data types.
///
/// Keys are kept in sorted order so that the serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(BTreeMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// If both records contain the same key, the value from the second record wins.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RrcError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(RrcError::RecordValueTypeError("Scalar".to_string())),
            None => Err(RrcError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RrcError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(RrcError::RecordValueTypeError("Array1".to_string())),
            None => Err(RrcError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, RrcError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(RrcError::RecordValueTypeError("String".to_string())),
            None => Err(RrcError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_second() {
        let a = Record::from_slice(&[
            ("x", RecordValue::Scalar(1.0)),
            ("y", RecordValue::String("a".into())),
        ]);
        let b = Record::from_scalar("x", 2.0);
        let merged = a.merge(b);
        assert_eq!(merged.get_scalar("x").unwrap(), 2.0);
        assert_eq!(merged.get_string("y").unwrap(), "a");
    }

    #[test]
    fn test_typed_getters_report_errors() {
        let r = Record::from_scalar("x", 1.0);
        assert!(matches!(r.get_array1("x"), Err(RrcError::RecordValueTypeError(_))));
        assert!(matches!(r.get_scalar("z"), Err(RrcError::RecordKeyError(_))));
    }

    #[test]
    fn test_serializes_to_plain_json() {
        let r = Record::from_slice(&[
            ("b", RecordValue::Array1(vec![1.0, 2.0])),
            ("a", RecordValue::Scalar(0.5)),
        ]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"a":0.5,"b":[1.0,2.0]}"#);
    }
}
