//! Transformer output types
//!
//! One [`ParameterizedConfig`] per binding, with every name reference replaced by the full
//! object it named.

use serde::Serialize;

use super::input::{
    CreateSnapshotConfig, PerIndicesMigrationConfig, ReplayerConfig, S3RepoConfig, SnapshotNameConfig,
    SourceClusterConfig, TargetClusterConfig,
};

/// A cluster config copy tagged with the name it was declared under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCluster<T> {
    pub name: String,

    #[serde(flatten)]
    pub config: T,
}

/// Fully resolved execution config for one source to target binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterizedConfig {
    pub source_config: NamedCluster<SourceClusterConfig>,

    pub target_config: NamedCluster<TargetClusterConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_extract_and_load_configs: Option<Vec<ResolvedSnapshotConfig>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replayer_config: Option<ReplayerConfig>,
}

impl ParameterizedConfig {
    pub fn label(&self) -> String {
        super::input::binding_label(&self.source_config.name, &self.target_config.name)
    }
}

/// Snapshot extract entry with its repository merged in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSnapshotConfig {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_snapshot_config: Option<CreateSnapshotConfig>,

    pub snapshot_config: ResolvedSnapshotSource,

    /// Per-index migrations; every entry carries a name
    pub migrations: Vec<PerIndicesMigrationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSnapshotSource {
    /// Lower-cased snapshot name
    pub snapshot_name: String,

    pub snapshot_name_config: SnapshotNameConfig,

    pub repo_config: NamedRepo,
}

/// Repository config with the name it was declared under, serialized as `repoName`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRepo {
    pub repo_name: String,

    #[serde(flatten)]
    pub config: S3RepoConfig,
}
