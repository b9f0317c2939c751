//! Migration config transformer
//!
//! Turns a validated topology document into one self-contained [`ParameterizedConfig`] per
//! binding: names are resolved to full copies, repos are merged into the snapshot entries
//! that use them and anonymous entries get positional names.

use std::collections::BTreeMap;

use schemakit::ValidationError;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{
    Binding, MigrationDocument, NamedCluster, NamedRepo, ParameterizedConfig, PerIndicesMigrationConfig,
    ResolvedSnapshotConfig, ResolvedSnapshotSource, SnapshotExtractConfig, SourceClusterConfig, TargetClusterConfig,
    binding_label,
};
use crate::resolver::{LocalEndpointResolver, NameResolver, ResolveError, SystemResolver};
use crate::validation::validate_output;

/// Errors from the transformation step
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Source cluster '{0}' is not defined in sourceClusters")]
    UnknownSourceCluster(String),

    #[error("Target cluster '{0}' is not defined in targetClusters")]
    UnknownTargetCluster(String),

    #[error(
        "Binding '{binding}' snapshot entry '{entry}' references repo '{repo_name}', which is not defined on source cluster '{source_name}'"
    )]
    MissingSnapshotRepo {
        binding: String,
        entry: String,
        repo_name: String,
        source_name: String,
    },

    #[error("Duplicate migration bindings: {}", pairs.join(", "))]
    DuplicateBindings { pairs: Vec<String> },

    #[error("Failed to resolve endpoint of repo '{repo_name}' on source cluster '{source_name}'")]
    EndpointResolution {
        source_name: String,
        repo_name: String,
        #[source]
        source: ResolveError,
    },

    #[error("Transformer produced invalid output: {0}")]
    OutputValidation(#[from] ValidationError),
}

impl TransformError {
    /// Name resolution failures are environmental, not document problems
    pub fn is_resolution(&self) -> bool {
        matches!(self, TransformError::EndpointResolution { .. })
    }
}

/// Denormalizes migration documents
pub struct MigrationConfigTransformer<R: NameResolver = SystemResolver> {
    endpoints: LocalEndpointResolver<R>,
}

impl Default for MigrationConfigTransformer<SystemResolver> {
    fn default() -> Self {
        Self::new(LocalEndpointResolver::default())
    }
}

impl<R: NameResolver> MigrationConfigTransformer<R> {
    pub fn new(endpoints: LocalEndpointResolver<R>) -> Self {
        Self { endpoints }
    }

    /// Produce one parameterized config per binding, in binding order
    ///
    /// The result has already been checked against the strict output schema.
    pub async fn transform(&self, doc: MigrationDocument) -> Result<Vec<ParameterizedConfig>, TransformError> {
        debug!(bindings = doc.migration_configs.len(), "transform: called");
        let MigrationDocument {
            source_clusters,
            target_clusters,
            migration_configs,
            ..
        } = doc;

        let sources = self.resolve_sources(source_clusters).await?;

        let mut configs = Vec::with_capacity(migration_configs.len());
        for binding in migration_configs {
            let source = sources
                .get(&binding.from_source)
                .ok_or_else(|| TransformError::UnknownSourceCluster(binding.from_source.clone()))?;
            let target = target_clusters
                .get(&binding.to_target)
                .ok_or_else(|| TransformError::UnknownTargetCluster(binding.to_target.clone()))?;
            configs.push(parameterize(binding, source, target.clone())?);
        }

        check_duplicates(&configs)?;

        validate_output(&configs)?;
        info!(count = configs.len(), "Transformed migration bindings");
        Ok(configs)
    }

    /// Rewrite local-test endpoints on every snapshot repo, one lookup at a time
    async fn resolve_sources(
        &self,
        sources: BTreeMap<String, SourceClusterConfig>,
    ) -> Result<BTreeMap<String, SourceClusterConfig>, TransformError> {
        let mut resolved = BTreeMap::new();
        for (source_name, mut source) in sources {
            if let Some(repos) = source.snapshot_repos.take() {
                let mut rewritten = BTreeMap::new();
                for (repo_name, repo) in repos {
                    let repo = if repo.endpoint.is_some() {
                        self.endpoints
                            .resolve(repo)
                            .await
                            .map_err(|source| TransformError::EndpointResolution {
                                source_name: source_name.clone(),
                                repo_name: repo_name.clone(),
                                source,
                            })?
                    } else {
                        repo
                    };
                    rewritten.insert(repo_name, repo);
                }
                source.snapshot_repos = Some(rewritten);
            }
            resolved.insert(source_name, source);
        }
        Ok(resolved)
    }
}

fn parameterize(
    binding: Binding,
    source: &SourceClusterConfig,
    target: TargetClusterConfig,
) -> Result<ParameterizedConfig, TransformError> {
    let label = binding.label();
    debug!(%label, "parameterize: called");

    let snapshot_extract_and_load_configs = match binding.snapshot_extract_and_load_configs {
        Some(entries) => Some(
            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| resolve_snapshot_entry(&label, &binding.from_source, source, index, entry))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    let replayer_config = match binding.replayer_config {
        Some(_) if !source.has_capture_proxy() => {
            warn!(%label, "Dropping replayerConfig: source cluster has no capture proxy");
            None
        }
        other => other,
    };

    Ok(ParameterizedConfig {
        source_config: NamedCluster {
            name: binding.from_source,
            config: source.clone(),
        },
        target_config: NamedCluster {
            name: binding.to_target,
            config: target,
        },
        snapshot_extract_and_load_configs,
        replayer_config,
    })
}

fn resolve_snapshot_entry(
    label: &str,
    source_name: &str,
    source: &SourceClusterConfig,
    index: usize,
    entry: SnapshotExtractConfig,
) -> Result<ResolvedSnapshotConfig, TransformError> {
    let name = entry.name.unwrap_or_else(|| index.to_string());
    let repo_name = entry.snapshot_config.repo_name;
    let repo = source
        .repo(&repo_name)
        .cloned()
        .ok_or_else(|| TransformError::MissingSnapshotRepo {
            binding: label.to_string(),
            entry: name.clone(),
            repo_name: repo_name.clone(),
            source_name: source_name.to_string(),
        })?;

    let name_config = entry.snapshot_config.snapshot_name_config;
    Ok(ResolvedSnapshotConfig {
        name,
        create_snapshot_config: entry.create_snapshot_config,
        snapshot_config: ResolvedSnapshotSource {
            snapshot_name: name_config.resolved_name(),
            snapshot_name_config: name_config,
            repo_config: NamedRepo {
                repo_name,
                config: repo,
            },
        },
        migrations: name_migrations(entry.migrations),
    })
}

/// Anonymous migrations are named by their zero-based position
fn name_migrations(migrations: Vec<PerIndicesMigrationConfig>) -> Vec<PerIndicesMigrationConfig> {
    migrations
        .into_iter()
        .enumerate()
        .map(|(index, migration)| PerIndicesMigrationConfig {
            name: Some(migration.name.unwrap_or_else(|| index.to_string())),
            ..migration
        })
        .collect()
}

fn check_duplicates(configs: &[ParameterizedConfig]) -> Result<(), TransformError> {
    let mut counts: Vec<(&str, &str, usize)> = Vec::new();
    for config in configs {
        let key = (config.source_config.name.as_str(), config.target_config.name.as_str());
        match counts.iter_mut().find(|(s, t, _)| (*s, *t) == key) {
            Some(entry) => entry.2 += 1,
            None => counts.push((key.0, key.1, 1)),
        }
    }
    let pairs: Vec<String> = counts
        .into_iter()
        .filter(|(_, _, n)| *n > 1)
        .map(|(s, t, _)| binding_label(s, t))
        .collect();
    if pairs.is_empty() {
        Ok(())
    } else {
        debug!(?pairs, "check_duplicates: duplicates found");
        Err(TransformError::DuplicateBindings { pairs })
    }
}
