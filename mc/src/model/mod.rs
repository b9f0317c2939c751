//! Migration document model

mod input;
mod output;

pub use input::{
    AuthConfig, BasicAuth, Binding, CreateSnapshotConfig, DocumentBackfillConfig, MetadataMigrationConfig,
    MigrationDocument, MtlsAuth, MultiTypeBehavior, PerIndicesMigrationConfig, ProxyConfig, ReplayerConfig,
    S3RepoConfig, SigV4Auth, SnapshotConfig, SnapshotExtractConfig, SnapshotNameConfig, SourceClusterConfig,
    TargetClusterConfig, binding_label,
};
pub use output::{NamedCluster, NamedRepo, ParameterizedConfig, ResolvedSnapshotConfig, ResolvedSnapshotSource};
