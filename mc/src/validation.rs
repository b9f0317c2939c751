//! Input and output validation
//!
//! Input validation is the strict schema plus the cross-reference refinements that the
//! schema alone cannot express. Output validation is an internal consistency check: a
//! correct transformer always passes it.

use schemakit::{PathSegment, ValidationError, Validator, Violation};
use serde_json::Value;
use tracing::debug;

use crate::model::{MigrationDocument, ParameterizedConfig};
use crate::schemas::{migration_config_schema, parameterized_output_schema};

/// Validator for human-authored migration documents
pub fn input_validator() -> Validator {
    Validator::new(migration_config_schema()).with_refinement(check_cluster_references)
}

/// Validate a raw document and convert it into the typed model
pub fn validate_input(raw: &Value) -> Result<MigrationDocument, ValidationError> {
    debug!("validate_input: called");
    let normalized = input_validator().validate(raw)?;
    serde_json::from_value(normalized).map_err(|e| {
        debug!(error = %e, "validate_input: typed conversion failed");
        ValidationError::new(vec![Violation::new(Vec::new(), e.to_string())])
    })
}

/// Validate transformer output against the strict output schema
pub fn validate_output(configs: &[ParameterizedConfig]) -> Result<Value, ValidationError> {
    debug!(count = configs.len(), "validate_output: called");
    let value = serde_json::to_value(configs)
        .map_err(|e| ValidationError::new(vec![Violation::new(Vec::new(), e.to_string())]))?;
    Validator::new(parameterized_output_schema()).validate(&value)
}

/// Bindings must name declared clusters, and snapshot entries must name repos on their source
fn check_cluster_references(doc: &Value, out: &mut Vec<Violation>) {
    let sources = doc.get("sourceClusters").and_then(Value::as_object);
    let targets = doc.get("targetClusters").and_then(Value::as_object);
    let Some(bindings) = doc.get("migrationConfigs").and_then(Value::as_array) else {
        return;
    };

    for (index, binding) in bindings.iter().enumerate() {
        let base = [PathSegment::from("migrationConfigs"), PathSegment::Index(index)];

        let source_name = binding.get("fromSource").and_then(Value::as_str);
        let source = match (source_name, sources) {
            (Some(name), Some(sources)) => {
                let found = sources.get(name);
                if found.is_none() {
                    let mut path = base.to_vec();
                    path.push("fromSource".into());
                    out.push(Violation::new(
                        path,
                        format!("Source cluster '{}' is not defined in sourceClusters", name),
                    ));
                }
                found
            }
            _ => None,
        };

        if let (Some(name), Some(targets)) = (binding.get("toTarget").and_then(Value::as_str), targets)
            && !targets.contains_key(name)
        {
            let mut path = base.to_vec();
            path.push("toTarget".into());
            out.push(Violation::new(
                path,
                format!("Target cluster '{}' is not defined in targetClusters", name),
            ));
        }

        let (Some(source), Some(source_name)) = (source, source_name) else {
            continue;
        };
        let Some(entries) = binding.get("snapshotExtractAndLoadConfigs").and_then(Value::as_array) else {
            continue;
        };
        let repos = source.get("snapshotRepos").and_then(Value::as_object);
        for (entry_index, entry) in entries.iter().enumerate() {
            let Some(repo_name) = entry
                .get("snapshotConfig")
                .and_then(|c| c.get("repoName"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            if repos.is_some_and(|r| r.contains_key(repo_name)) {
                continue;
            }
            let mut path = base.to_vec();
            path.extend([
                PathSegment::from("snapshotExtractAndLoadConfigs"),
                PathSegment::Index(entry_index),
                PathSegment::from("snapshotConfig"),
                PathSegment::from("repoName"),
            ]);
            out.push(Violation::new(
                path,
                format!(
                    "Snapshot repo '{}' is not defined on source cluster '{}'",
                    repo_name, source_name
                ),
            ));
        }
    }
}
