//! Strict validation with batched violations
//!
//! Validation never stops at the first problem: every violation in the document is
//! collected with its full path, so one run reports everything that needs fixing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::comments::strip_comments;
use crate::path::{Path, PathSegment, display_path};
use crate::schema::{Leaf, Schema};

/// One problem found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Where the problem is; keys and array indices are distinct segments
    pub path: Path,

    /// What is wrong
    pub message: String,
}

impl Violation {
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", display_path(&self.path), self.message)
    }
}

/// All violations found while validating one document
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation failed: {}", format_line(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Render as one `"; "`-joined line
    pub fn to_line(&self) -> String {
        format_line(&self.violations)
    }

    /// Render as one block per violation
    pub fn to_blocks(&self) -> String {
        format_blocks(&self.violations)
    }
}

/// `path: message; path: message`
pub fn format_line(violations: &[Violation]) -> String {
    violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ")
}

/// One block per violation: the path on its own line, the message indented below it
pub fn format_blocks(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("at {}\n  {}", display_path(&v.path), v.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Domain check run over a document that has already been shape-checked
pub type Refinement = Box<dyn Fn(&Value, &mut Vec<Violation>) + Send + Sync>;

/// A schema plus the domain refinements that apply to documents of that schema
pub struct Validator {
    schema: Schema,
    refinements: Vec<Refinement>,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            refinements: Vec::new(),
        }
    }

    pub fn with_refinement<F>(mut self, refinement: F) -> Self
    where
        F: Fn(&Value, &mut Vec<Violation>) + Send + Sync + 'static,
    {
        self.refinements.push(Box::new(refinement));
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Strip comments, check structure and run every refinement
    ///
    /// On success returns the document with defaults filled in.
    pub fn validate(&self, doc: &Value) -> Result<Value, ValidationError> {
        debug!(refinements = self.refinements.len(), "Validator::validate: called");
        let stripped = strip_comments(doc);
        let (normalized, mut violations) = check(&self.schema, &stripped);
        for refinement in &self.refinements {
            refinement(&normalized, &mut violations);
        }
        if violations.is_empty() {
            debug!("Validator::validate: document accepted");
            Ok(normalized)
        } else {
            debug!(count = violations.len(), "Validator::validate: document rejected");
            Err(ValidationError::new(violations))
        }
    }
}

/// Strip comments and check `doc` against `schema`
pub fn validate(schema: &Schema, doc: &Value) -> Result<Value, ValidationError> {
    Validator::new(schema.clone()).validate(doc)
}

/// Check `value` against `schema` without stripping comments
///
/// Returns the normalized value (defaults applied) together with every violation found.
pub fn check(schema: &Schema, value: &Value) -> (Value, Vec<Violation>) {
    let mut violations = Vec::new();
    let mut path = Vec::new();
    let normalized = check_node(schema, value, &mut path, &mut violations);
    (normalized, violations)
}

enum Missing {
    Skip,
    Fill(Value),
    Required,
}

fn missing_field(schema: &Schema) -> Missing {
    match schema {
        Schema::Optional(_) => Missing::Skip,
        Schema::Default(_, value) => Missing::Fill(value.clone()),
        Schema::Nullable(inner) => missing_field(inner),
        _ => Missing::Required,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push(out: &mut Vec<Violation>, path: &[PathSegment], message: String) {
    out.push(Violation::new(path.to_vec(), message));
}

fn check_node(schema: &Schema, value: &Value, path: &mut Path, out: &mut Vec<Violation>) -> Value {
    match schema {
        Schema::Optional(inner) | Schema::Default(inner, _) => check_node(inner, value, path, out),
        Schema::Nullable(inner) => {
            if value.is_null() {
                Value::Null
            } else {
                check_node(inner, value, path, out)
            }
        }
        Schema::Object(fields) => check_object(fields, value, path, out),
        Schema::Array { element, min_items } => {
            let Some(items) = value.as_array() else {
                push(out, path, format!("Expected array, received {}", kind(value)));
                return value.clone();
            };
            if items.len() < *min_items {
                push(
                    out,
                    path,
                    format!("Array must contain at least {} element(s)", min_items),
                );
            }
            let mut checked = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                checked.push(check_node(element, item, path, out));
                path.pop();
            }
            Value::Array(checked)
        }
        Schema::Tuple(elements) => {
            let Some(items) = value.as_array() else {
                push(out, path, format!("Expected array, received {}", kind(value)));
                return value.clone();
            };
            if items.len() != elements.len() {
                push(
                    out,
                    path,
                    format!(
                        "Expected array of length {}, received {}",
                        elements.len(),
                        items.len()
                    ),
                );
                return value.clone();
            }
            let mut checked = Vec::with_capacity(items.len());
            for (index, (element, item)) in elements.iter().zip(items).enumerate() {
                path.push(PathSegment::Index(index));
                checked.push(check_node(element, item, path, out));
                path.pop();
            }
            Value::Array(checked)
        }
        Schema::Map(value_schema) => {
            let Some(map) = value.as_object() else {
                push(out, path, format!("Expected object, received {}", kind(value)));
                return value.clone();
            };
            let mut checked = Map::with_capacity(map.len());
            for (key, item) in map {
                path.push(PathSegment::Key(key.clone()));
                checked.insert(key.clone(), check_node(value_schema, item, path, out));
                path.pop();
            }
            Value::Object(checked)
        }
        Schema::Union(variants) => check_union(variants, value, path, out),
        Schema::Leaf(leaf) => {
            check_leaf(leaf, value, path, out);
            value.clone()
        }
    }
}

fn check_object(fields: &[(String, Schema)], value: &Value, path: &mut Path, out: &mut Vec<Violation>) -> Value {
    let Some(map) = value.as_object() else {
        push(out, path, format!("Expected object, received {}", kind(value)));
        return value.clone();
    };

    let mut checked = Map::with_capacity(fields.len());
    for (key, field_schema) in fields {
        path.push(PathSegment::Key(key.clone()));
        match map.get(key) {
            Some(item) => {
                checked.insert(key.clone(), check_node(field_schema, item, path, out));
            }
            None => match missing_field(field_schema) {
                Missing::Skip => {}
                Missing::Fill(default) => {
                    checked.insert(key.clone(), default);
                }
                Missing::Required => push(out, path, "Required".to_string()),
            },
        }
        path.pop();
    }

    for key in map.keys() {
        if !fields.iter().any(|(declared, _)| declared == key) {
            path.push(PathSegment::Key(key.clone()));
            push(out, path, format!("Unrecognized key: \"{}\"", key));
            path.pop();
        }
    }

    Value::Object(checked)
}

fn check_union(variants: &[Schema], value: &Value, path: &mut Path, out: &mut Vec<Violation>) -> Value {
    let mut closest: Option<(Value, Vec<Violation>)> = None;
    for variant in variants {
        let mut local = Vec::new();
        let checked = check_node(variant, value, path, &mut local);
        if local.is_empty() {
            return checked;
        }
        if closest.as_ref().is_none_or(|(_, best)| local.len() < best.len()) {
            closest = Some((checked, local));
        }
    }

    let literals: Option<Vec<String>> = variants
        .iter()
        .map(|v| match v.unwrap_modifiers() {
            Schema::Leaf(Leaf::Literal(lit)) => Some(format!("'{}'", render(lit))),
            _ => None,
        })
        .collect();
    if let Some(literals) = literals
        && !literals.is_empty()
    {
        push(
            out,
            path,
            format!(
                "Invalid enum value. Expected {}, received '{}'",
                literals.join(" | "),
                render(value)
            ),
        );
        return value.clone();
    }

    match closest {
        Some((checked, local)) => {
            out.extend(local);
            checked
        }
        None => {
            push(out, path, "Invalid input: no union variant declared".to_string());
            value.clone()
        }
    }
}

fn check_leaf(leaf: &Leaf, value: &Value, path: &[PathSegment], out: &mut Vec<Violation>) {
    match leaf {
        Leaf::Any => {}
        Leaf::Null => {
            if !value.is_null() {
                push(out, path, format!("Expected null, received {}", kind(value)));
            }
        }
        Leaf::Boolean => {
            if !value.is_boolean() {
                push(out, path, format!("Expected boolean, received {}", kind(value)));
            }
        }
        Leaf::Integer { min, max } => {
            let Some(n) = value
                .as_i64()
                .map(i128::from)
                .or_else(|| value.as_u64().map(i128::from))
            else {
                push(out, path, format!("Expected integer, received {}", kind(value)));
                return;
            };
            if let Some(min) = min
                && n < i128::from(*min)
            {
                push(out, path, format!("Number must be greater than or equal to {}", min));
            }
            if let Some(max) = max
                && n > i128::from(*max)
            {
                push(out, path, format!("Number must be less than or equal to {}", max));
            }
        }
        Leaf::Number => {
            if !value.is_number() {
                push(out, path, format!("Expected number, received {}", kind(value)));
            }
        }
        Leaf::String { pattern } => {
            let Some(s) = value.as_str() else {
                push(out, path, format!("Expected string, received {}", kind(value)));
                return;
            };
            if let Some(re) = pattern
                && !re.is_match(s)
            {
                push(out, path, format!("String must match pattern /{}/", re.as_str()));
            }
        }
        Leaf::Literal(expected) => {
            if !literal_matches(expected, value) {
                push(
                    out,
                    path,
                    format!("Invalid literal value, expected {}", expected),
                );
            }
        }
    }
}

/// Numbers compare by value so `1` and `1.0` pin the same literal
fn literal_matches(expected: &Value, value: &Value) -> bool {
    match (expected, value) {
        (Value::Number(a), Value::Number(b)) if a.is_f64() || b.is_f64() => a.as_f64() == b.as_f64(),
        _ => expected == value,
    }
}
