//! Comment-key stripping
//!
//! Authors annotate documents with keys such as `"// why"` or `"#note"`. These are dropped
//! before validation so that strict objects do not reject them.

use serde_json::{Map, Value};

/// Key prefixes that mark a key as a comment
pub const COMMENT_PREFIXES: [&str; 2] = ["//", "#"];

/// Whether a map key is a comment
pub fn is_comment_key(key: &str) -> bool {
    COMMENT_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Return a copy of `doc` with every comment key removed, at any depth
///
/// Order of the remaining keys and of sequence elements is preserved.
pub fn strip_comments(doc: &Value) -> Value {
    match doc {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if is_comment_key(key) {
                    continue;
                }
                out.insert(key.clone(), strip_comments(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_comments).collect()),
        scalar => scalar.clone(),
    }
}
