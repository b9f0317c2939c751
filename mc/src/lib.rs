//! migconfig - migration topology validator and transformer
//!
//! A migration document names source and target clusters once and then binds them
//! together. This crate validates such a document strictly, resolves every name into a
//! full copy and emits one self-contained [`ParameterizedConfig`] per binding for the
//! workflow that executes it.
//!
//! # Modules
//!
//! - [`model`] - Input document and output types
//! - [`schemas`] - General input and output schemas
//! - [`validation`] - Input validation with cross-reference checks, output re-validation
//! - [`resolver`] - `localstack://` endpoint rewriting
//! - [`transform`] - Denormalization into parameterized configs
//! - [`pipeline`] - Read, validate and transform in one call; locked schemas
//! - [`latch`] - Per-target completion latches for downstream coordination
//! - [`reader`] - Document input from files or stdin
//! - [`error`] - Pipeline errors and exit codes
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line definitions

pub mod cli;
pub mod config;
pub mod error;
pub mod latch;
pub mod model;
pub mod pipeline;
pub mod reader;
pub mod resolver;
pub mod schemas;
pub mod transform;
pub mod validation;

pub use error::{ErrorCategory, PipelineError};
pub use latch::{LatchError, LatchStore, MemoryLatchStore, target_latches};
pub use model::{MigrationDocument, ParameterizedConfig};
pub use pipeline::{Pipeline, lock_document, locked_schema};
pub use reader::{DocumentSource, ReadError};
pub use resolver::{LocalEndpointResolver, NameResolver, ResolveError, SystemResolver};
pub use schemas::SchemaId;
pub use transform::{MigrationConfigTransformer, TransformError};
pub use validation::{validate_input, validate_output};
