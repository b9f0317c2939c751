//! SchemaKit - strict schema trees for human-authored configuration
//!
//! SchemaKit models a schema as data so that one schema can be used three ways:
//! to validate documents (collecting every violation with its path), to discover where
//! skip-approval flags may occur, and to derive a *locked* schema that pins a concrete
//! document for a later approval step.
//!
//! # Modules
//!
//! - [`schema`] - The schema tree and its builders
//! - [`validate`] - Strict validation with batched violations and domain refinements
//! - [`comments`] - Comment-key stripping
//! - [`skip`] - Skip-approval pattern discovery
//! - [`lock`] - Locked schema construction
//! - [`path`] - Concrete paths and wildcard path patterns
//!
//! # Example
//!
//! ```
//! use schemakit::{Schema, build_locked_schema, find_skip_patterns, validate};
//! use serde_json::json;
//!
//! let schema = Schema::object([
//!     ("name", Schema::string()),
//!     ("skipApproval", Schema::boolean().optional()),
//! ]);
//! let doc = json!({ "name": "backfill" });
//!
//! let locked = build_locked_schema(&doc, &find_skip_patterns(&schema));
//! assert!(validate(&locked, &json!({ "name": "backfill", "skipApproval": true })).is_ok());
//! assert!(validate(&locked, &json!({ "name": "replay" })).is_err());
//! ```

pub mod comments;
mod json_schema;
pub mod lock;
pub mod path;
pub mod schema;
pub mod skip;
pub mod validate;

pub use comments::{COMMENT_PREFIXES, is_comment_key, strip_comments};
pub use json_schema::JSON_SCHEMA_DIALECT;
pub use lock::build_locked_schema;
pub use path::{Path, PathPattern, PathSegment, PatternSegment, display_path, path_matches};
pub use schema::{Leaf, Schema};
pub use skip::{find_skip_patterns, is_skip_field};
pub use validate::{Refinement, ValidationError, Validator, Violation, check, format_blocks, format_line, validate};
