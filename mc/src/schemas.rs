//! Schemas for migration documents and transformer output
//!
//! The input and output schemas share their building blocks; the output variants add the
//! names and resolved fields the transformer fills in and narrow what the resolver rewrote.

use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use schemakit::Schema;
use serde_json::json;

static CLUSTER_ENDPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/]+/?$").expect("valid cluster endpoint regex"));

static REPO_ENDPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?|localstacks?)://[^\s/]+/?$").expect("valid repo endpoint regex"));

static S3_URI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^s3://\S+$").expect("valid s3 uri regex"));

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ES|OS) [0-9]+(\.[0-9]+){0,2}$").expect("valid version regex"));

static SNAPSHOT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+$").expect("valid snapshot name regex"));

static LOWERCASE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^A-Z]+$").expect("valid snapshot name regex"));

/// Which general schema a document is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaId {
    /// Human-authored migration document
    MigrationConfig,
    /// Transformer output array
    ParameterizedOutput,
}

impl SchemaId {
    pub fn schema(self) -> Schema {
        match self {
            Self::MigrationConfig => migration_config_schema(),
            Self::ParameterizedOutput => parameterized_output_schema(),
        }
    }
}

const MAX_U16: i64 = u16::MAX as i64;
const MAX_U32: i64 = u32::MAX as i64;

fn string_list() -> Schema {
    Schema::array(Schema::string()).optional()
}

fn auth_config() -> Schema {
    Schema::union(vec![
        Schema::object([("basic", Schema::object([("secretName", Schema::string())]))]),
        Schema::object([(
            "sigv4",
            Schema::object([
                ("region", Schema::string()),
                ("service", Schema::string().with_default(json!("es"))),
            ]),
        )]),
        Schema::object([(
            "mtls",
            Schema::object([("caCert", Schema::string()), ("clientSecretName", Schema::string())]),
        )]),
    ])
}

fn repo_config(resolved: bool) -> Schema {
    let endpoint = if resolved {
        Schema::matching(CLUSTER_ENDPOINT_RE.clone())
    } else {
        Schema::matching(REPO_ENDPOINT_RE.clone())
    };
    let base = Schema::object([
        ("awsRegion", Schema::string()),
        ("s3RepoPathUri", Schema::matching(S3_URI_RE.clone())),
        ("endpoint", endpoint.optional()),
    ]);
    if resolved {
        base.extend([("useLocalStack", Schema::boolean().optional())])
    } else {
        base
    }
}

fn proxy_config() -> Schema {
    Schema::object([
        ("endpoint", Schema::matching(CLUSTER_ENDPOINT_RE.clone()).optional()),
        ("listenPort", Schema::integer_range(1, MAX_U16).optional()),
        ("tls", Schema::boolean().optional()),
    ])
}

fn source_cluster(resolved: bool) -> Schema {
    Schema::object([
        ("endpoint", Schema::matching(CLUSTER_ENDPOINT_RE.clone()).optional()),
        ("allowInsecure", Schema::boolean().optional()),
        ("version", Schema::matching(VERSION_RE.clone()).optional()),
        ("authConfig", auth_config().optional()),
        ("snapshotRepos", Schema::map(repo_config(resolved)).optional()),
        ("proxy", proxy_config().optional()),
    ])
}

fn target_cluster() -> Schema {
    Schema::object([
        ("endpoint", Schema::matching(CLUSTER_ENDPOINT_RE.clone())),
        ("allowInsecure", Schema::boolean().optional()),
        ("version", Schema::matching(VERSION_RE.clone()).optional()),
        ("authConfig", auth_config().optional()),
    ])
}

fn snapshot_name_config() -> Schema {
    Schema::union(vec![
        Schema::object([("externallyManagedSnapshot", Schema::matching(SNAPSHOT_NAME_RE.clone()))]),
        Schema::object([("snapshotNamePrefix", Schema::matching(SNAPSHOT_NAME_RE.clone()))]),
    ])
}

fn create_snapshot_config() -> Schema {
    Schema::object([
        ("indexAllowlist", string_list()),
        ("maxSnapshotRateMbPerNode", Schema::integer_range(1, MAX_U32).optional()),
        ("skipApproval", Schema::boolean().optional()),
    ])
}

fn metadata_migration_config() -> Schema {
    Schema::object([
        ("indexAllowlist", string_list()),
        ("indexTemplateAllowlist", string_list()),
        ("componentTemplateAllowlist", string_list()),
        ("multiTypeBehavior", Schema::enumeration(&["NONE", "UNION", "SPLIT"]).optional()),
        ("allowLooseVersionMatching", Schema::boolean().optional()),
        ("skipApproval", Schema::boolean().optional()),
    ])
}

fn document_backfill_config() -> Schema {
    Schema::object([
        ("indexAllowlist", string_list()),
        ("podReplicas", Schema::integer_range(1, MAX_U32).with_default(json!(1))),
        ("maxConnections", Schema::integer_range(1, MAX_U32).optional()),
        ("documentsPerBulkRequest", Schema::integer_range(1, MAX_U32).optional()),
        ("maxShardSizeBytes", Schema::integer_min(1).optional()),
        ("allowLooseVersionMatching", Schema::boolean().optional()),
        ("skipApproval", Schema::boolean().optional()),
    ])
}

fn replayer_config() -> Schema {
    Schema::object([
        ("podReplicas", Schema::integer_range(1, MAX_U32).with_default(json!(1))),
        ("speedupFactor", Schema::number().optional()),
        ("removeAuthHeader", Schema::boolean().optional()),
        ("skipApproval", Schema::boolean().optional()),
    ])
}

fn per_indices_migration(resolved: bool) -> Schema {
    let name = if resolved {
        Schema::string()
    } else {
        Schema::string().optional()
    };
    Schema::object([
        ("name", name),
        ("metadataMigrationConfig", metadata_migration_config().optional()),
        ("documentBackfillConfig", document_backfill_config().optional()),
    ])
}

fn snapshot_extract_config() -> Schema {
    Schema::object([
        ("name", Schema::string().optional()),
        ("createSnapshotConfig", create_snapshot_config().optional()),
        (
            "snapshotConfig",
            Schema::object([
                ("repoName", Schema::string()),
                ("snapshotNameConfig", snapshot_name_config()),
            ]),
        ),
        (
            "migrations",
            Schema::array(per_indices_migration(false)).with_default(json!([])),
        ),
    ])
}

fn resolved_snapshot_config() -> Schema {
    Schema::object([
        ("name", Schema::string()),
        ("createSnapshotConfig", create_snapshot_config().optional()),
        (
            "snapshotConfig",
            Schema::object([
                ("snapshotName", Schema::matching(LOWERCASE_NAME_RE.clone())),
                ("snapshotNameConfig", snapshot_name_config()),
                (
                    "repoConfig",
                    repo_config(true).extend([("repoName", Schema::string())]),
                ),
            ]),
        ),
        ("migrations", Schema::array(per_indices_migration(true))),
    ])
}

fn binding() -> Schema {
    Schema::object([
        ("fromSource", Schema::string()),
        ("toTarget", Schema::string()),
        (
            "snapshotExtractAndLoadConfigs",
            Schema::array(snapshot_extract_config()).optional(),
        ),
        ("replayerConfig", replayer_config().optional()),
    ])
}

/// General schema for a human-authored migration document
pub fn migration_config_schema() -> Schema {
    Schema::object([
        ("skipApprovals", Schema::boolean().optional()),
        ("sourceClusters", Schema::map(source_cluster(false))),
        ("targetClusters", Schema::map(target_cluster())),
        ("migrationConfigs", Schema::non_empty_array(binding())),
    ])
}

/// Strict schema for one transformer output element
pub fn parameterized_config_schema() -> Schema {
    let named = [("name", Schema::string())];
    Schema::object([
        ("sourceConfig", source_cluster(true).extend(named.clone())),
        ("targetConfig", target_cluster().extend(named)),
        (
            "snapshotExtractAndLoadConfigs",
            Schema::array(resolved_snapshot_config()).optional(),
        ),
        ("replayerConfig", replayer_config().optional()),
    ])
}

/// Strict schema for the whole transformer output
pub fn parameterized_output_schema() -> Schema {
    Schema::array(parameterized_config_schema())
}
