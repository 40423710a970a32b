use crate::level::LogLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute map attached to a log call. Keys iterate in lexicographic order.
pub type Attrs = BTreeMap<String, serde_json::Value>;

/// A single log event as seen by a template.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub attrs: Attrs,
    pub message: String,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        attrs: Attrs,
        message: impl Into<String>,
    ) -> Self {
        LogRecord {
            timestamp,
            level,
            attrs,
            message: message.into(),
        }
    }
}

/// Overlay `call` on top of `base`. Keys present in `call` win.
pub fn merge_attrs(base: Option<&Attrs>, call: Option<&Attrs>) -> Attrs {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(call) = call {
        merged.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn call_attrs_override_base_attrs() {
        let base = attrs(&[("attr1", json!(7890)), ("attr2", json!("val2"))]);
        let call = attrs(&[("attr1", json!(4321)), ("attr3", json!("val3"))]);

        let merged = merge_attrs(Some(&base), Some(&call));

        assert_eq!(merged.len(), 3);
        for (key, value) in &merged {
            let expected = call.get(key).or_else(|| base.get(key)).unwrap();
            assert_eq!(value, expected);
        }
        assert_eq!(merged["attr1"], json!(4321));
        assert_eq!(merged["attr2"], json!("val2"));
    }

    #[test]
    fn merge_tolerates_missing_sides() {
        let base = attrs(&[("a", json!(1))]);
        assert_eq!(merge_attrs(Some(&base), None), base);
        assert_eq!(merge_attrs(None, Some(&base)), base);
        assert!(merge_attrs(None, None).is_empty());
    }

    #[test]
    fn merged_keys_iterate_sorted() {
        let base = attrs(&[("zeta", json!(1)), ("base_attr", json!("foo"))]);
        let call = attrs(&[("alpha", json!(2))]);
        let keys: Vec<_> = merge_attrs(Some(&base), Some(&call)).into_keys().collect();
        assert_eq!(keys, vec!["alpha", "base_attr", "zeta"]);
    }
}
