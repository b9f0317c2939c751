//! End-to-end processing: read, validate, transform

use std::collections::BTreeSet;
use std::io::Read;

use schemakit::{PathPattern, Schema, Validator, build_locked_schema, find_skip_patterns, strip_comments};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::model::ParameterizedConfig;
use crate::reader::{DocumentSource, load_document, parse_document, read_document};
use crate::resolver::{NameResolver, SystemResolver};
use crate::schemas::SchemaId;
use crate::transform::MigrationConfigTransformer;
use crate::validation::{input_validator, validate_input};

/// Validates and transforms migration documents
pub struct Pipeline<R: NameResolver = SystemResolver> {
    transformer: MigrationConfigTransformer<R>,
}

impl Default for Pipeline<SystemResolver> {
    fn default() -> Self {
        Self::new(MigrationConfigTransformer::default())
    }
}

impl<R: NameResolver> Pipeline<R> {
    pub fn new(transformer: MigrationConfigTransformer<R>) -> Self {
        Self { transformer }
    }

    /// Read a whole YAML or JSON stream and process it
    pub async fn process<Rd: Read>(&self, reader: Rd) -> Result<Vec<ParameterizedConfig>, PipelineError> {
        let text = read_document(reader, "<input>")?;
        let raw = parse_document(&text, "<input>")?;
        self.process_value(&raw).await
    }

    /// Process a document from stdin or a file
    pub async fn process_path(&self, source: &DocumentSource) -> Result<Vec<ParameterizedConfig>, PipelineError> {
        debug!(%source, "process_path: called");
        let raw = load_document(source)?;
        self.process_value(&raw).await
    }

    /// Validate then transform an already-parsed document
    pub async fn process_value(&self, raw: &Value) -> Result<Vec<ParameterizedConfig>, PipelineError> {
        let doc = validate_input(raw)?;
        info!(bindings = doc.migration_configs.len(), "Migration document is valid");
        let configs = self.transformer.transform(doc).await?;
        Ok(configs)
    }
}

/// Locked schema for a document that passes the general schema
///
/// Migration documents must also pass the cross-reference checks that `transform` applies.
///
/// The lock is derived from the document as written (comments removed, defaults not filled)
/// so that approving it pins exactly what the author saw.
pub fn locked_schema(raw: &Value, schema_id: SchemaId) -> Result<Schema, PipelineError> {
    debug!(?schema_id, "locked_schema: called");
    let validator = match schema_id {
        SchemaId::MigrationConfig => input_validator(),
        SchemaId::ParameterizedOutput => Validator::new(schema_id.schema()),
    };
    let patterns: BTreeSet<PathPattern> = find_skip_patterns(validator.schema());
    validator.validate(raw)?;
    let instance = strip_comments(raw);
    let locked = build_locked_schema(&instance, &patterns);
    info!(skip_patterns = patterns.len(), "Built locked schema");
    Ok(locked)
}

/// [`locked_schema`] rendered as a JSON Schema document
pub fn lock_document(raw: &Value, schema_id: SchemaId) -> Result<Value, PipelineError> {
    Ok(locked_schema(raw, schema_id)?.to_json_schema_document())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"
sourceClusters:
  s1:
    endpoint: https://source:9200
targetClusters:
  t1:
    endpoint: https://target:9200
migrationConfigs:
  - fromSource: s1
    toTarget: t1
"#;

    #[tokio::test]
    async fn test_process_reads_yaml_stream() {
        let configs = Pipeline::default().process(DOC.as_bytes()).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].label(), "s1 => t1");
    }

    #[tokio::test]
    async fn test_process_reports_parse_errors() {
        let err = Pipeline::default().process("a: [".as_bytes()).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_process_reports_validation_errors() {
        let err = Pipeline::default()
            .process_value(&json!({ "sourceClusters": {} }))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let paths: Vec<String> = err.violations().iter().map(|v| v.to_string()).collect();
        assert_eq!(paths, vec!["targetClusters: Required", "migrationConfigs: Required"]);
    }

    #[test]
    fn test_lock_document_pins_values() {
        let raw: Value = serde_yaml::from_str(DOC).unwrap();
        let locked = lock_document(&raw, SchemaId::MigrationConfig).unwrap();
        assert_eq!(locked["$schema"], json!(schemakit::JSON_SCHEMA_DIALECT));
        assert_eq!(
            locked["properties"]["sourceClusters"]["properties"]["s1"]["properties"]["endpoint"],
            json!({ "const": "https://source:9200" })
        );
        assert_eq!(
            locked["properties"]["skipApprovals"],
            json!({ "type": "boolean" })
        );
    }

    #[test]
    fn test_lock_document_applies_reference_checks() {
        let mut raw: Value = serde_yaml::from_str(DOC).unwrap();
        raw["migrationConfigs"][0]["fromSource"] = json!("ghost");
        let err = lock_document(&raw, SchemaId::MigrationConfig).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            err.violations()[0].to_string(),
            "migrationConfigs[0].fromSource: Source cluster 'ghost' is not defined in sourceClusters"
        );
    }

    #[tokio::test]
    async fn test_empty_snapshot_prefix_fails_input_validation() {
        let mut raw: Value = serde_yaml::from_str(DOC).unwrap();
        raw["sourceClusters"]["s1"]["snapshotRepos"] =
            json!({ "r": { "awsRegion": "us-east-1", "s3RepoPathUri": "s3://bucket/p" } });
        raw["migrationConfigs"][0]["snapshotExtractAndLoadConfigs"] = json!([
            { "snapshotConfig": { "repoName": "r", "snapshotNameConfig": { "snapshotNamePrefix": "" } } }
        ]);
        let err = Pipeline::default().process_value(&raw).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            err.violations()[0].to_string(),
            "migrationConfigs[0].snapshotExtractAndLoadConfigs[0].snapshotConfig.snapshotNameConfig.snapshotNamePrefix: String must match pattern /^\\S+$/"
        );
    }

    #[tokio::test]
    async fn test_overflowing_integers_keep_their_paths() {
        let mut raw: Value = serde_yaml::from_str(DOC).unwrap();
        raw["sourceClusters"]["s1"]["proxy"] = json!({ "listenPort": 70000 });
        raw["migrationConfigs"][0]["replayerConfig"] = json!({ "podReplicas": 5_000_000_000u64 });
        let err = Pipeline::default().process_value(&raw).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        let paths: Vec<String> = err
            .violations()
            .iter()
            .map(|v| schemakit::display_path(&v.path))
            .collect();
        assert_eq!(
            paths,
            vec!["sourceClusters.s1.proxy.listenPort", "migrationConfigs[0].replayerConfig.podReplicas"]
        );
    }

    #[test]
    fn test_lock_document_rejects_invalid_input() {
        let err = lock_document(&json!({ "bogus": true }), SchemaId::MigrationConfig).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
