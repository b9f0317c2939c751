//! Locked schema construction
//!
//! A locked schema pins one concrete instance: every value becomes a literal, every array a
//! fixed-length tuple and every object a strict record of exactly the keys present. The only
//! freedom left is in skip-approval fields, which become optional booleans wherever a
//! discovered pattern says they may occur, whether or not the instance set them.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::path::{Path, PathPattern, PathSegment};
use crate::schema::Schema;

/// Build the schema that accepts `instance` and nothing else, except for skip-approval fields
pub fn build_locked_schema(instance: &Value, patterns: &BTreeSet<PathPattern>) -> Schema {
    debug!(patterns = patterns.len(), "build_locked_schema: called");
    let mut path = Vec::new();
    lock(instance, &mut path, patterns)
}

fn skip_flag() -> Schema {
    Schema::boolean().optional()
}

fn lock(value: &Value, path: &mut Path, patterns: &BTreeSet<PathPattern>) -> Schema {
    if patterns.iter().any(|p| p.matches(path)) {
        return skip_flag();
    }

    match value {
        Value::Null => Schema::null(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Schema::literal(value.clone()),
        Value::Array(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                elements.push(lock(item, path, patterns));
                path.pop();
            }
            Schema::tuple(elements)
        }
        Value::Object(map) => {
            let mut fields = Vec::with_capacity(map.len());
            for (key, item) in map {
                path.push(PathSegment::Key(key.clone()));
                fields.push((key.clone(), lock(item, path, patterns)));
                path.pop();
            }
            for pattern in patterns.iter().filter(|p| p.is_child_of(path)) {
                if let Some(key) = pattern.leaf_key()
                    && !map.contains_key(key)
                    && !fields.iter().any(|(k, _)| k == key)
                {
                    debug!(%pattern, "build_locked_schema: offering absent skip flag");
                    fields.push((key.to_string(), skip_flag()));
                }
            }
            Schema::Object(fields)
        }
    }
}
