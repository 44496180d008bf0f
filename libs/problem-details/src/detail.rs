//! Detail payload shapes and their canonical form.
//!
//! An error payload is a [`Detail`], usually converted from JSON.
//! [`PayloadShape::detect`] sorts it into exactly one shape and [`normalize`] turns it into an [`ErrorTree`] in
//! which every message leaf carries a machine-readable code.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// A single message with its machine-readable code.
///
/// Serializes as `{"string": "...", "code": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct ErrorDetail {
    pub string: String,
    pub code: String,
}

impl ErrorDetail {
    pub fn new(string: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            code: code.into(),
        }
    }

    /// JSON form of a typed leaf, useful for payloads that set per-field codes.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("string".to_owned(), Value::String(self.string.clone()));
        map.insert("code".to_owned(), Value::String(self.code.clone()));
        Value::Object(map)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}

/// Detail payload as raised by application code.
///
/// JSON values convert structurally: objects are always mappings. A leaf with
/// its own code can only be built from an [`ErrorDetail`].
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    /// Message inheriting the error's code.
    Message(String),
    /// Message with its own code.
    Typed(ErrorDetail),
    List(Vec<Detail>),
    Map(BTreeMap<String, Detail>),
    /// Numbers, booleans and null.
    Opaque(Value),
}

impl Detail {
    /// Mapping from `(field, detail)` pairs.
    #[must_use]
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Detail>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// JSON view; typed leaves render as `{"string", "code"}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Message(message) => Value::String(message.clone()),
            Self::Typed(detail) => detail.to_value(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Self::Opaque(value) => value.clone(),
        }
    }
}

impl From<Value> for Detail {
    fn from(value: Value) -> Self {
        match value {
            Value::String(message) => Self::Message(message),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
            other @ (Value::Null | Value::Bool(_) | Value::Number(_)) => Self::Opaque(other),
        }
    }
}

impl From<String> for Detail {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for Detail {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl From<ErrorDetail> for Detail {
    fn from(detail: ErrorDetail) -> Self {
        Self::Typed(detail)
    }
}

impl<T: Into<Detail>> From<Vec<T>> for Detail {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Shape of a payload. Detection is total: every detail has exactly one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// A message, optionally typed with its own code.
    Scalar {
        message: &'a str,
        code: Option<&'a str>,
    },
    List(&'a [Detail]),
    /// Mapping whose values are scalars, lists or opaque values.
    FlatMap(&'a BTreeMap<String, Detail>),
    /// Mapping with at least one mapping value.
    NestedMap(&'a BTreeMap<String, Detail>),
    /// Numbers, booleans and null.
    Opaque(&'a Value),
}

impl<'a> PayloadShape<'a> {
    #[must_use]
    pub fn detect(detail: &'a Detail) -> Self {
        match detail {
            Detail::Message(message) => Self::Scalar {
                message,
                code: None,
            },
            Detail::Typed(leaf) => Self::Scalar {
                message: &leaf.string,
                code: Some(&leaf.code),
            },
            Detail::List(items) => Self::List(items),
            Detail::Map(map) => {
                if map.values().any(|v| matches!(v, Detail::Map(_))) {
                    Self::NestedMap(map)
                } else {
                    Self::FlatMap(map)
                }
            }
            Detail::Opaque(value) => Self::Opaque(value),
        }
    }
}

/// Canonical payload: same nesting as the input, message leaves typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorTree {
    Leaf(ErrorDetail),
    List(Vec<ErrorTree>),
    Map(BTreeMap<String, ErrorTree>),
    /// Carried through unchanged.
    Opaque(Value),
}

impl ErrorTree {
    /// Messages of all leaves in depth-first, key-ordered traversal.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Leaf(detail) => out.push(&detail.string),
            Self::List(items) => {
                for item in items {
                    item.collect_messages(out);
                }
            }
            Self::Map(map) => {
                for item in map.values() {
                    item.collect_messages(out);
                }
            }
            Self::Opaque(_) => {}
        }
    }

    /// Drops the codes again, giving back the plain payload.
    #[must_use]
    pub fn to_plain(&self) -> Value {
        match self {
            Self::Leaf(detail) => Value::String(detail.string.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_plain).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            Self::Opaque(value) => value.clone(),
        }
    }
}

/// Normalizes a payload, giving untyped message leaves `default_code`.
#[must_use]
pub fn normalize(detail: &Detail, default_code: &str) -> ErrorTree {
    match PayloadShape::detect(detail) {
        PayloadShape::Scalar { message, code } => {
            ErrorTree::Leaf(ErrorDetail::new(message, code.unwrap_or(default_code)))
        }
        PayloadShape::List(items) => ErrorTree::List(
            items
                .iter()
                .map(|item| normalize(item, default_code))
                .collect(),
        ),
        PayloadShape::FlatMap(map) | PayloadShape::NestedMap(map) => {
            ErrorTree::Map(normalize_members(map, default_code))
        }
        PayloadShape::Opaque(value) => ErrorTree::Opaque(value.clone()),
    }
}

pub(crate) fn normalize_members(
    map: &BTreeMap<String, Detail>,
    default_code: &str,
) -> BTreeMap<String, ErrorTree> {
    map.iter()
        .map(|(key, value)| (key.clone(), normalize(value, default_code)))
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detect_scalar() {
        let detail = Detail::from("oops");
        assert_eq!(
            PayloadShape::detect(&detail),
            PayloadShape::Scalar {
                message: "oops",
                code: None
            }
        );
    }

    #[test]
    fn detect_typed_leaf_as_scalar_with_code() {
        let detail = Detail::from(ErrorDetail::new("taken", "unique"));
        assert_eq!(
            PayloadShape::detect(&detail),
            PayloadShape::Scalar {
                message: "taken",
                code: Some("unique")
            }
        );
    }

    #[test]
    fn json_object_with_string_and_code_fields_is_a_mapping() {
        let detail = Detail::from(json!({
            "string": "This field is required.",
            "code": "Enter a valid code."
        }));
        let PayloadShape::FlatMap(map) = PayloadShape::detect(&detail) else {
            panic!("expected a flat mapping");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), ["code", "string"]);

        assert_eq!(
            serde_json::to_value(normalize(&detail, "invalid")).unwrap(),
            json!({
                "code": {"string": "Enter a valid code.", "code": "invalid"},
                "string": {"string": "This field is required.", "code": "invalid"}
            })
        );
    }

    #[test]
    fn detect_flat_and_nested_maps() {
        let flat = Detail::map([
            ("name", Detail::from("required")),
            ("tags", Detail::from(vec!["too many"])),
            ("leaf", ErrorDetail::new("x", "y").into()),
        ]);
        assert!(matches!(PayloadShape::detect(&flat), PayloadShape::FlatMap(_)));

        let nested = Detail::from(json!({"address": {"city": "required"}}));
        assert!(matches!(
            PayloadShape::detect(&nested),
            PayloadShape::NestedMap(_)
        ));
    }

    #[test]
    fn detect_opaque_values() {
        for value in [json!(null), json!(true), json!(3)] {
            let detail = Detail::from(value);
            assert!(matches!(PayloadShape::detect(&detail), PayloadShape::Opaque(_)));
        }
    }

    #[test]
    fn normalize_list_preserves_order_and_duplicates() {
        let tree = normalize(&Detail::from(vec!["b", "a", "b"]), "invalid");
        assert_eq!(tree.messages(), vec!["b", "a", "b"]);
    }

    #[test]
    fn normalize_keeps_leaf_codes_and_opaque_values() {
        let detail = Detail::map([
            ("email", Detail::from(ErrorDetail::new("taken", "unique"))),
            ("age", Detail::from(json!(7))),
            ("name", Detail::from("required")),
        ]);
        let tree = normalize(&detail, "invalid");

        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "age": 7,
                "email": {"string": "taken", "code": "unique"},
                "name": {"string": "required", "code": "invalid"}
            })
        );
    }

    #[test]
    fn to_plain_recovers_nested_input() {
        let value = json!({"user": {"emails": ["bad", "dup"], "name": "required"}, "n": null});
        let tree = normalize(&Detail::from(value.clone()), "invalid");
        assert_eq!(tree.to_plain(), value);
    }

    #[test]
    fn detail_json_view_renders_typed_leaves() {
        let detail = Detail::map([
            ("a", Detail::from(ErrorDetail::new("x", "y"))),
            ("b", Detail::from("z")),
        ]);
        assert_eq!(
            detail.to_value(),
            json!({"a": {"string": "x", "code": "y"}, "b": "z"})
        );
    }

    #[test]
    fn error_detail_displays_message() {
        let detail = ErrorDetail::new("testing error", "error");
        assert_eq!(detail.to_string(), "testing error");
        assert_eq!(
            detail.to_value(),
            json!({"string": "testing error", "code": "error"})
        );
    }
}
