//! Input document types
//!
//! These are the strongly-shaped form of a document that has already passed schema
//! validation, so serde only has to map fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Topology-level migration document as authored by a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MigrationDocument {
    /// Bypass every approval step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approvals: Option<bool>,

    /// Named source clusters
    pub source_clusters: BTreeMap<String, SourceClusterConfig>,

    /// Named target clusters
    pub target_clusters: BTreeMap<String, TargetClusterConfig>,

    /// Source to target bindings
    pub migration_configs: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceClusterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,

    /// Snapshot repositories by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_repos: Option<BTreeMap<String, S3RepoConfig>>,

    /// Capture proxy in front of the source; required for live replay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl SourceClusterConfig {
    pub fn repo(&self, name: &str) -> Option<&S3RepoConfig> {
        self.snapshot_repos.as_ref().and_then(|repos| repos.get(name))
    }

    pub fn has_capture_proxy(&self) -> bool {
        self.proxy.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetClusterConfig {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
}

/// Cluster authentication, exactly one mechanism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthConfig {
    Basic(BasicAuth),
    Sigv4(SigV4Auth),
    Mtls(MtlsAuth),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BasicAuth {
    /// Kubernetes secret holding username and password
    pub secret_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SigV4Auth {
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MtlsAuth {
    pub ca_cert: String,
    pub client_secret_name: String,
}

/// S3 snapshot repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct S3RepoConfig {
    pub aws_region: String,

    /// `s3://bucket/path`
    pub s3_repo_path_uri: String,

    /// S3 endpoint override; `localstack://` and `localstacks://` are resolved before use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Set by endpoint resolution only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_local_stack: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
}

/// One source to target migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Binding {
    pub from_source: String,
    pub to_target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_extract_and_load_configs: Option<Vec<SnapshotExtractConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replayer_config: Option<ReplayerConfig>,
}

impl Binding {
    /// `source => target`
    pub fn label(&self) -> String {
        binding_label(&self.from_source, &self.to_target)
    }
}

pub fn binding_label(source: &str, target: &str) -> String {
    format!("{} => {}", source, target)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SnapshotExtractConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_snapshot_config: Option<CreateSnapshotConfig>,

    pub snapshot_config: SnapshotConfig,

    #[serde(default)]
    pub migrations: Vec<PerIndicesMigrationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSnapshotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_allowlist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_snapshot_rate_mb_per_node: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approval: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Key into the source cluster's `snapshotRepos`
    pub repo_name: String,
    pub snapshot_name_config: SnapshotNameConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotNameConfig {
    /// Snapshot already exists and is owned by someone else
    ExternallyManagedSnapshot(String),
    /// Snapshot is created by the workflow under this prefix
    SnapshotNamePrefix(String),
}

impl SnapshotNameConfig {
    /// Snapshot name as the workflow uses it (snapshot names must be lower case)
    pub fn resolved_name(&self) -> String {
        match self {
            Self::ExternallyManagedSnapshot(name) | Self::SnapshotNamePrefix(name) => name.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PerIndicesMigrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_migration_config: Option<MetadataMigrationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_backfill_config: Option<DocumentBackfillConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultiTypeBehavior {
    None,
    Union,
    Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetadataMigrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_allowlist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_template_allowlist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_template_allowlist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_type_behavior: Option<MultiTypeBehavior>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_loose_version_matching: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approval: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentBackfillConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_allowlist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_replicas: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_per_bulk_request: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shard_size_bytes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_loose_version_matching: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approval: Option<bool>,
}

/// Live traffic replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplayerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_replicas: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedup_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_auth_header: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approval: Option<bool>,
}
