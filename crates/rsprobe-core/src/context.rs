use crate::CoreError;
use rsprobe_client::{discover, Discovery, StorageClient, SuiteConfig, Tokens};
use rsprobe_policy::{policy_for, VersionPolicy};
use serde::Serialize;
use tracing::{debug, info};

/// Everything known about one server under test.
///
/// Built once after discovery and never mutated. Clients for other tokens,
/// scopes or accounts are derived copies.
#[derive(Debug, Clone, Serialize)]
pub struct ServerContext {
    pub server: String,
    pub account: String,
    pub base_url: String,
    /// Version the server announced through WebFinger.
    pub declared_version: Option<u32>,
    pub scope: String,
    #[serde(skip)]
    pub tokens: Tokens,
    pub auth_endpoint: Option<String>,
    pub policy: VersionPolicy,
}

impl ServerContext {
    /// Discover `server` and build its context. A configured `spec_version`
    /// replaces the declared one.
    pub fn resolve(config: &SuiteConfig, server: &str) -> Result<Self, CoreError> {
        let discovery = discover(server, &config.account)?;
        Self::from_discovery(config, server, discovery)
    }

    pub fn from_discovery(
        config: &SuiteConfig,
        server: &str,
        discovery: Discovery,
    ) -> Result<Self, CoreError> {
        if config.tokens.read_write.is_none() {
            return Err(CoreError::Config(
                "a read-write token is required (set TOKEN_READ_WRITE)".to_owned(),
            ));
        }
        let version = config.spec_version.or(discovery.version);
        if config.spec_version.is_some() && discovery.version != config.spec_version {
            debug!(
                "{server}: version override {:?} replaces declared {:?}",
                config.spec_version, discovery.version
            );
        }
        let policy = policy_for(version)?;
        info!(
            "{server}: storage at {} (draft {})",
            discovery.href, policy.version
        );

        Ok(Self {
            server: server.to_owned(),
            account: config.account.clone(),
            base_url: discovery.href.trim_end_matches('/').to_owned(),
            declared_version: discovery.version,
            scope: config.scope.clone(),
            tokens: config.tokens.clone(),
            auth_endpoint: discovery.auth_endpoint,
            policy,
        })
    }

    pub fn version(&self) -> u32 {
        self.policy.version
    }

    fn client(&self, token: Option<&str>) -> StorageClient {
        StorageClient::new(&self.base_url, &self.scope, token)
    }

    pub fn read_write(&self) -> StorageClient {
        self.client(self.tokens.read_write.as_deref())
    }

    pub fn read_only(&self) -> Option<StorageClient> {
        self.tokens.read_only.as_deref().map(|t| self.client(Some(t)))
    }

    /// Client for the storage root with the global token.
    pub fn global(&self) -> Option<StorageClient> {
        self.tokens
            .global
            .as_deref()
            .map(|t| StorageClient::new(&self.base_url, "", Some(t)))
    }

    pub fn anonymous(&self) -> StorageClient {
        self.client(None)
    }

    /// The public folder of the scope, `{base}/public/{scope}/`.
    pub fn public(&self, token: Option<&str>) -> StorageClient {
        self.client(token).with_scope(&self.public_scope())
    }

    pub fn public_scope(&self) -> String {
        format!("public/{}", self.scope)
    }

    /// Read-write client aimed at a sibling account's storage. `None` when
    /// the account name is not a segment of the base URL.
    pub fn other_account(&self, suffix: &str) -> Option<StorageClient> {
        other_account_url(&self.base_url, &self.account, suffix)
            .map(|url| self.read_write().with_base_url(&url))
    }
}

fn other_account_url(base_url: &str, account: &str, suffix: &str) -> Option<String> {
    let user = account.split('@').next().unwrap_or(account);
    if user.is_empty() {
        return None;
    }
    let (prefix, path) = match base_url.find("://") {
        Some(idx) => base_url.split_at(idx + 3),
        None => ("", base_url),
    };
    let replacement = format!("{user}{suffix}");
    let mut segments: Vec<&str> = path.split('/').collect();
    // Skip the authority; only path segments name the account.
    let pos = segments.iter().skip(1).rposition(|s| *s == user)? + 1;
    segments[pos] = &replacement;
    Some(format!("{prefix}{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(version: Option<u32>) -> SuiteConfig {
        SuiteConfig {
            servers: vec!["https://h.example".to_owned()],
            account: "alice".to_owned(),
            tokens: Tokens {
                read_write: Some("rw".to_owned()),
                read_only: Some("ro".to_owned()),
                global: None,
            },
            spec_version: version,
            ..SuiteConfig::default()
        }
    }

    fn discovery(version: Option<u32>) -> Discovery {
        Discovery {
            href: "https://h.example/storage/alice/".to_owned(),
            version,
            auth_endpoint: Some("https://h.example/oauth/alice".to_owned()),
        }
    }

    #[test]
    fn declared_version_selects_policy() {
        let ctx =
            ServerContext::from_discovery(&config(None), "https://h.example", discovery(Some(6)))
                .unwrap();
        assert_eq!(ctx.version(), 6);
        assert_eq!(ctx.declared_version, Some(6));
        assert_eq!(ctx.base_url, "https://h.example/storage/alice");
    }

    #[test]
    fn override_replaces_declared_version() {
        let ctx =
            ServerContext::from_discovery(&config(Some(2)), "https://h.example", discovery(Some(11)))
                .unwrap();
        assert_eq!(ctx.version(), 2);
        assert_eq!(ctx.declared_version, Some(11));
    }

    #[test]
    fn unresolved_version_is_policy_error() {
        let err = ServerContext::from_discovery(&config(None), "https://h.example", discovery(None))
            .unwrap_err();
        assert!(matches!(err, CoreError::Policy(_)));
    }

    #[test]
    fn read_write_token_required() {
        let mut cfg = config(Some(2));
        cfg.tokens.read_write = None;
        let err = ServerContext::from_discovery(&cfg, "https://h.example", discovery(None))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn derived_clients() {
        let ctx =
            ServerContext::from_discovery(&config(None), "https://h.example", discovery(Some(2)))
                .unwrap();
        assert!(ctx.read_write().has_token());
        assert!(ctx.read_only().is_some());
        assert!(ctx.global().is_none());
        assert!(!ctx.anonymous().has_token());
        assert_eq!(
            ctx.public(None).url("doc"),
            "https://h.example/storage/alice/public/api-test-suite/doc"
        );
        assert_eq!(
            ctx.other_account("-other").map(|c| c.url("doc")),
            Some("https://h.example/storage/alice-other/api-test-suite/doc".to_owned())
        );
    }

    #[test]
    fn other_account_needs_account_segment() {
        assert_eq!(
            other_account_url("https://alice.example/storage", "alice", "x"),
            None
        );
        assert_eq!(
            other_account_url("https://h/alice/data", "alice@h", "-2"),
            Some("https://h/alice-2/data".to_owned())
        );
    }
}
