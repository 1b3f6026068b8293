//! Primary key ordering.

use serde_json::Value;

/// A primary key as stored in a table. Numbers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum RowKey {
    Number(i64),
    Text(String),
}

impl RowKey {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RowKey::Number),
            Value::String(s) => Some(RowKey::Text(s.clone())),
            _ => None,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            RowKey::Number(n) => Value::from(*n),
            RowKey::Text(s) => Value::String(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_sort_before_strings() {
        let mut keys = vec![
            RowKey::Text("a".into()),
            RowKey::Number(10),
            RowKey::Number(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                RowKey::Number(2),
                RowKey::Number(10),
                RowKey::Text("a".into())
            ]
        );
    }

    #[test]
    fn rejects_non_scalar_keys() {
        assert!(RowKey::from_value(&json!(1.5)).is_none());
        assert!(RowKey::from_value(&json!(null)).is_none());
        assert!(RowKey::from_value(&json!([1])).is_none());
        assert_eq!(RowKey::from_value(&json!(3)).unwrap().to_value(), json!(3));
    }
}
