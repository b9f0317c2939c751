//! Schema tree
//!
//! A schema is a tagged tree: structural nodes (`Object`, `Array`, `Tuple`, `Map`, `Union`),
//! `Leaf` nodes for scalars, and the single-level modifiers `Optional`, `Nullable` and
//! `Default` that wrap another node. Every walker in this crate (validation, skip-pattern
//! discovery, JSON Schema export) is one recursive visitor over this enum.
//!
//! Objects are always strict: keys that are not declared are rejected.

use regex::Regex;
use serde_json::Value;

/// Scalar schemas
#[derive(Debug, Clone)]
pub enum Leaf {
    /// Accepts any value
    Any,
    Null,
    Boolean,
    /// Whole number, optionally bounded on either side
    Integer { min: Option<i64>, max: Option<i64> },
    Number,
    /// String, optionally constrained by a regex
    String { pattern: Option<Regex> },
    /// Exactly this value
    Literal(Value),
}

/// A node in the schema tree
#[derive(Debug, Clone)]
pub enum Schema {
    /// Field may be absent from its parent object
    Optional(Box<Schema>),
    /// Value may be `null`
    Nullable(Box<Schema>),
    /// Field may be absent; the validator then fills in the value
    Default(Box<Schema>, Value),
    /// Strict record with declared fields, in declaration order
    Object(Vec<(String, Schema)>),
    /// Homogeneous sequence
    Array { element: Box<Schema>, min_items: usize },
    /// Fixed-length sequence
    Tuple(Vec<Schema>),
    /// Keyed map with arbitrary string keys
    Map(Box<Schema>),
    /// First matching variant wins
    Union(Vec<Schema>),
    Leaf(Leaf),
}

impl Schema {
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Schema)>) -> Self {
        Self::Object(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn array(element: Schema) -> Self {
        Self::Array {
            element: Box::new(element),
            min_items: 0,
        }
    }

    pub fn non_empty_array(element: Schema) -> Self {
        Self::Array {
            element: Box::new(element),
            min_items: 1,
        }
    }

    pub fn tuple(elements: Vec<Schema>) -> Self {
        Self::Tuple(elements)
    }

    pub fn map(value: Schema) -> Self {
        Self::Map(Box::new(value))
    }

    pub fn union(variants: Vec<Schema>) -> Self {
        Self::Union(variants)
    }

    /// Union of string literals
    pub fn enumeration(values: &[&str]) -> Self {
        Self::Union(values.iter().map(|v| Self::literal(Value::from(*v))).collect())
    }

    pub fn any() -> Self {
        Self::Leaf(Leaf::Any)
    }

    pub fn null() -> Self {
        Self::Leaf(Leaf::Null)
    }

    pub fn boolean() -> Self {
        Self::Leaf(Leaf::Boolean)
    }

    pub fn integer() -> Self {
        Self::Leaf(Leaf::Integer { min: None, max: None })
    }

    pub fn integer_min(min: i64) -> Self {
        Self::Leaf(Leaf::Integer {
            min: Some(min),
            max: None,
        })
    }

    /// Whole number in `min..=max`
    pub fn integer_range(min: i64, max: i64) -> Self {
        Self::Leaf(Leaf::Integer {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn number() -> Self {
        Self::Leaf(Leaf::Number)
    }

    pub fn string() -> Self {
        Self::Leaf(Leaf::String { pattern: None })
    }

    pub fn matching(pattern: Regex) -> Self {
        Self::Leaf(Leaf::String { pattern: Some(pattern) })
    }

    pub fn literal(value: Value) -> Self {
        Self::Leaf(Leaf::Literal(value))
    }

    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    pub fn with_default(self, value: Value) -> Self {
        Self::Default(Box::new(self), value)
    }

    /// Strip `Optional`/`Nullable`/`Default` wrappers down to the structural node
    pub fn unwrap_modifiers(&self) -> &Schema {
        let mut current = self;
        while let Self::Optional(inner) | Self::Nullable(inner) | Self::Default(inner, _) = current {
            current = &**inner;
        }
        current
    }

    /// Whether an enclosing object may omit this field
    pub fn is_omittable(&self) -> bool {
        match self {
            Self::Optional(_) | Self::Default(..) => true,
            Self::Nullable(inner) => inner.is_omittable(),
            _ => false,
        }
    }

    /// Declared field of an object schema (modifiers unwrapped first)
    pub fn field(&self, name: &str) -> Option<&Schema> {
        match self.unwrap_modifiers() {
            Self::Object(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, s)| s),
            _ => None,
        }
    }

    /// Object schema with extra fields appended; non-objects are returned unchanged
    pub fn extend<K: Into<String>>(self, extra: impl IntoIterator<Item = (K, Schema)>) -> Self {
        match self {
            Self::Object(mut fields) => {
                for (key, schema) in extra {
                    let key = key.into();
                    fields.retain(|(k, _)| *k != key);
                    fields.push((key, schema));
                }
                Self::Object(fields)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_modifiers_peels_nested_wrappers() {
        let schema = Schema::string().nullable().with_default(Value::from("x")).optional();
        assert!(matches!(
            schema.unwrap_modifiers(),
            Schema::Leaf(Leaf::String { pattern: None })
        ));
    }

    #[test]
    fn test_is_omittable() {
        assert!(Schema::string().optional().is_omittable());
        assert!(Schema::integer().with_default(Value::from(1)).is_omittable());
        assert!(Schema::string().optional().nullable().is_omittable());
        assert!(!Schema::string().nullable().is_omittable());
        assert!(!Schema::string().is_omittable());
    }

    #[test]
    fn test_extend_replaces_existing_field() {
        let schema = Schema::object([("a", Schema::string()), ("b", Schema::boolean())])
            .extend([("a", Schema::integer()), ("c", Schema::null())]);
        let Schema::Object(fields) = &schema else {
            panic!("expected object");
        };
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert!(matches!(schema.field("a"), Some(Schema::Leaf(Leaf::Integer { .. }))));
    }

    #[test]
    fn test_field_on_optional_object() {
        let schema = Schema::object([("inner", Schema::boolean())]).optional();
        assert!(schema.field("inner").is_some());
        assert!(schema.field("missing").is_none());
    }
}
