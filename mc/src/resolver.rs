//! Local-test endpoint resolution
//!
//! Snapshot repos used in local test environments point at an S3 emulator with the reserved
//! schemes `localstack://` (plaintext) and `localstacks://` (TLS). Workers cannot use those
//! names directly, so the host is resolved once here and the endpoint is rewritten to a
//! concrete `http(s)://ip[:port]` address.

use std::io;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::S3RepoConfig;

static LOCAL_ENDPOINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(localstacks?)://(\[[0-9A-Fa-f:.]+\]|[^\s/:\[\]]+)(?::([0-9]+))?/?$")
        .expect("valid local endpoint regex")
});

/// Errors from endpoint resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid local endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to resolve {host}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("No address found for {host}")]
    NoAddress { host: String },

    #[error("Resolving {host} timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },
}

/// Name resolution backend
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// All addresses for `host`; `port` is passed through for resolvers that need one
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl NameResolver for SystemResolver {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        debug!(%host, port, "SystemResolver::lookup: called");
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Parts of a `localstack://` or `localstacks://` endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEndpoint {
    /// `http` or `https`
    pub scheme: &'static str,
    /// Host without IPv6 brackets
    pub host: String,
    pub port: Option<u16>,
}

impl LocalEndpoint {
    /// Parse a reserved local endpoint; `Ok(None)` for any other endpoint
    pub fn parse(endpoint: &str) -> Result<Option<Self>, ResolveError> {
        if !endpoint.starts_with("localstack://") && !endpoint.starts_with("localstacks://") {
            return Ok(None);
        }
        let caps = LOCAL_ENDPOINT_RE
            .captures(endpoint)
            .ok_or_else(|| ResolveError::InvalidEndpoint(endpoint.to_string()))?;
        let scheme = if &caps[1] == "localstacks" { "https" } else { "http" };
        let host = caps[2].trim_start_matches('[').trim_end_matches(']').to_string();
        let port = match caps.get(3) {
            Some(port) => Some(
                port.as_str()
                    .parse::<u16>()
                    .map_err(|_| ResolveError::InvalidEndpoint(endpoint.to_string()))?,
            ),
            None => None,
        };
        Ok(Some(Self { scheme, host, port }))
    }

    /// Port used for the lookup itself
    pub fn lookup_port(&self) -> u16 {
        self.port.unwrap_or(if self.scheme == "https" { 443 } else { 80 })
    }

    /// `scheme://ip[:port]`, with IPv6 addresses bracketed
    pub fn format_with(&self, ip: IpAddr) -> String {
        let host = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        };
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, host, port),
            None => format!("{}://{}", self.scheme, host),
        }
    }
}

/// Rewrites reserved local-test endpoints on snapshot repos
pub struct LocalEndpointResolver<R: NameResolver = SystemResolver> {
    resolver: R,
    timeout: Option<Duration>,
}

impl Default for LocalEndpointResolver<SystemResolver> {
    fn default() -> Self {
        Self::new(SystemResolver)
    }
}

impl<R: NameResolver> LocalEndpointResolver<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            timeout: None,
        }
    }

    /// Bound every lookup; a timeout is reported like any other resolution failure
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve a repo's endpoint if it uses a reserved local scheme
    ///
    /// Other repos come back unchanged with `useLocalStack` unset.
    pub async fn resolve(&self, repo: S3RepoConfig) -> Result<S3RepoConfig, ResolveError> {
        debug!(endpoint = ?repo.endpoint, "LocalEndpointResolver::resolve: called");
        let Some(endpoint) = repo.endpoint.as_deref() else {
            return Ok(repo);
        };
        let Some(local) = LocalEndpoint::parse(endpoint)? else {
            debug!("resolve: not a local endpoint, unchanged");
            return Ok(repo);
        };

        let ip = self.lookup_first(&local).await?;
        let rewritten = local.format_with(ip);
        info!(from = %endpoint, to = %rewritten, "Resolved local snapshot endpoint");
        Ok(S3RepoConfig {
            endpoint: Some(rewritten),
            use_local_stack: Some(true),
            ..repo
        })
    }

    async fn lookup_first(&self, local: &LocalEndpoint) -> Result<IpAddr, ResolveError> {
        let lookup = self.resolver.lookup(&local.host, local.lookup_port());
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup).await.map_err(|_| {
                debug!(host = %local.host, "lookup_first: timed out");
                ResolveError::Timeout {
                    host: local.host.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => lookup.await,
        };
        let addrs = result.map_err(|source| ResolveError::Lookup {
            host: local.host.clone(),
            source,
        })?;
        addrs.into_iter().next().ok_or_else(|| ResolveError::NoAddress {
            host: local.host.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::{Ipv4Addr, Ipv6Addr};

    struct FakeResolver {
        table: HashMap<String, Vec<IpAddr>>,
    }

    impl FakeResolver {
        fn with(host: &str, ips: Vec<IpAddr>) -> Self {
            Self {
                table: HashMap::from([(host.to_string(), ips)]),
            }
        }
    }

    #[async_trait]
    impl NameResolver for FakeResolver {
        async fn lookup(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
            self.table
                .get(host)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown host"))
        }
    }

    struct SlowResolver;

    #[async_trait]
    impl NameResolver for SlowResolver {
        async fn lookup(&self, _host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
    }

    fn repo(endpoint: Option<&str>) -> S3RepoConfig {
        S3RepoConfig {
            aws_region: "us-east-1".to_string(),
            s3_repo_path_uri: "s3://bucket/path".to_string(),
            endpoint: endpoint.map(str::to_string),
            use_local_stack: None,
        }
    }

    #[test]
    fn test_parse_local_endpoints() {
        let plain = LocalEndpoint::parse("localstack://localstack:4566").unwrap().unwrap();
        assert_eq!(plain.scheme, "http");
        assert_eq!(plain.host, "localstack");
        assert_eq!(plain.port, Some(4566));

        let tls = LocalEndpoint::parse("localstacks://s3.local").unwrap().unwrap();
        assert_eq!(tls.scheme, "https");
        assert_eq!(tls.port, None);
        assert_eq!(tls.lookup_port(), 443);

        let v6 = LocalEndpoint::parse("localstack://[::1]:4566").unwrap().unwrap();
        assert_eq!(v6.host, "::1");

        assert!(LocalEndpoint::parse("https://s3.amazonaws.com").unwrap().is_none());
        assert!(LocalEndpoint::parse("localstack://host:99999").is_err());
        assert!(LocalEndpoint::parse("localstack://").is_err());
    }

    #[test]
    fn test_format_brackets_ipv6() {
        let local = LocalEndpoint::parse("localstacks://s3:4566").unwrap().unwrap();
        assert_eq!(
            local.format_with(IpAddr::V6(Ipv6Addr::LOCALHOST)),
            "https://[::1]:4566"
        );
        let no_port = LocalEndpoint::parse("localstack://s3").unwrap().unwrap();
        assert_eq!(
            no_port.format_with(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))),
            "http://10.0.0.7"
        );
    }

    #[tokio::test]
    async fn test_resolve_rewrites_local_endpoint() {
        let resolver = LocalEndpointResolver::new(FakeResolver::with(
            "localstack",
            vec![IpAddr::V4(Ipv4Addr::new(172, 17, 0, 2))],
        ));
        let resolved = resolver.resolve(repo(Some("localstack://localstack:4566"))).await.unwrap();
        assert_eq!(resolved.endpoint.as_deref(), Some("http://172.17.0.2:4566"));
        assert_eq!(resolved.use_local_stack, Some(true));
        assert_eq!(resolved.s3_repo_path_uri, "s3://bucket/path");
    }

    #[tokio::test]
    async fn test_resolve_leaves_other_endpoints_alone() {
        let resolver = LocalEndpointResolver::new(FakeResolver::with("x", vec![]));
        let input = repo(Some("https://s3.us-east-1.amazonaws.com"));
        assert_eq!(resolver.resolve(input.clone()).await.unwrap(), input);
        let bare = repo(None);
        assert_eq!(resolver.resolve(bare.clone()).await.unwrap(), bare);
    }

    #[tokio::test]
    async fn test_resolve_failures() {
        let resolver = LocalEndpointResolver::new(FakeResolver::with("empty", vec![]));
        let err = resolver.resolve(repo(Some("localstack://unknown:4566"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::Lookup { ref host, .. } if host == "unknown"));

        let err = resolver.resolve(repo(Some("localstack://empty"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoAddress { .. }));
    }

    #[tokio::test]
    async fn test_resolve_timeout() {
        let resolver = LocalEndpointResolver::new(SlowResolver).with_timeout(Duration::from_millis(20));
        let err = resolver.resolve(repo(Some("localstack://slow:4566"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { timeout_ms: 20, .. }));
    }

    #[tokio::test]
    async fn test_system_resolver_resolves_localhost_literal() {
        let resolver = LocalEndpointResolver::default();
        let resolved = resolver.resolve(repo(Some("localstack://127.0.0.1:4566"))).await.unwrap();
        assert_eq!(resolved.endpoint.as_deref(), Some("http://127.0.0.1:4566"));
    }
}
