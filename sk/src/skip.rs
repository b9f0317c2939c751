//! Skip-approval field discovery
//!
//! Walks a schema (never an instance) and records where the boolean fields that bypass
//! a human-approval step can occur, as wildcard path patterns.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::path::{PathPattern, PatternSegment};
use crate::schema::Schema;

static SKIP_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(skip)?[A-Za-z0-9]*Approvals?$").expect("valid skip field regex"));

/// Whether a field name follows the skip-approval naming convention
pub fn is_skip_field(name: &str) -> bool {
    SKIP_FIELD_RE.is_match(name)
}

/// Every location in `schema` where a skip-approval field is declared
pub fn find_skip_patterns(schema: &Schema) -> BTreeSet<PathPattern> {
    debug!("find_skip_patterns: called");
    let mut patterns = BTreeSet::new();
    walk(schema, &PathPattern::default(), &mut patterns);
    debug!(count = patterns.len(), "find_skip_patterns: complete");
    patterns
}

fn walk(schema: &Schema, path: &PathPattern, patterns: &mut BTreeSet<PathPattern>) {
    match schema.unwrap_modifiers() {
        Schema::Object(fields) => {
            for (key, field) in fields {
                let child = path.child(PatternSegment::Literal(key.clone()));
                if is_skip_field(key) {
                    debug!(pattern = %child, "find_skip_patterns: skip field");
                    patterns.insert(child.clone());
                }
                walk(field, &child, patterns);
            }
        }
        Schema::Array { element, .. } => walk(element, &path.child(PatternSegment::Wildcard), patterns),
        Schema::Map(value) => walk(value, &path.child(PatternSegment::Wildcard), patterns),
        Schema::Tuple(elements) => {
            let child = path.child(PatternSegment::Wildcard);
            for element in elements {
                walk(element, &child, patterns);
            }
        }
        Schema::Union(variants) => {
            for variant in variants {
                walk(variant, path, patterns);
            }
        }
        Schema::Leaf(_) | Schema::Optional(_) | Schema::Nullable(_) | Schema::Default(..) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(patterns: &BTreeSet<PathPattern>) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_skip_field_convention() {
        assert!(is_skip_field("skipApproval"));
        assert!(is_skip_field("skipApprovals"));
        assert!(is_skip_field("skipMetadataApproval"));
        assert!(!is_skip_field("skip"));
        assert!(!is_skip_field("approval"));
        assert!(!is_skip_field("skipApprovalFlag"));
    }

    #[test]
    fn test_finds_fields_through_arrays_maps_and_modifiers() {
        let step = Schema::object([("name", Schema::string()), ("skipApproval", Schema::boolean().optional())]);
        let schema = Schema::object([
            ("skipApprovals", Schema::boolean().optional()),
            ("steps", Schema::map(step.clone())),
            ("list", Schema::array(step.clone()).optional()),
            ("nested", Schema::object([("deep", step)]).with_default(serde_json::json!({}))),
        ]);
        assert_eq!(
            rendered(&find_skip_patterns(&schema)),
            vec![
                "list.*.skipApproval",
                "nested.deep.skipApproval",
                "skipApprovals",
                "steps.*.skipApproval",
            ]
        );
    }

    #[test]
    fn test_union_variants_share_the_path() {
        let schema = Schema::object([(
            "auth",
            Schema::union(vec![
                Schema::object([("skipApproval", Schema::boolean())]),
                Schema::object([("skipRotationApproval", Schema::boolean())]),
            ]),
        )]);
        assert_eq!(
            rendered(&find_skip_patterns(&schema)),
            vec!["auth.skipApproval", "auth.skipRotationApproval"]
        );
    }

    #[test]
    fn test_no_patterns_for_plain_schema() {
        let schema = Schema::object([("a", Schema::array(Schema::string()))]);
        assert!(find_skip_patterns(&schema).is_empty());
    }
}
