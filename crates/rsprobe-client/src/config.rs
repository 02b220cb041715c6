use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_SERVER_URL: &str = "SERVER_URL";
pub const ENV_ACCOUNT: &str = "ACCOUNT";
pub const ENV_ACCOUNT_HANDLE: &str = "ACCOUNT_HANDLE";
pub const ENV_TOKEN_SCOPE: &str = "TOKEN_SCOPE";
pub const ENV_TOKEN_READ_WRITE: &str = "TOKEN_READ_WRITE";
pub const ENV_TOKEN_READ_ONLY: &str = "TOKEN_READ_ONLY";
pub const ENV_TOKEN_GLOBAL: &str = "TOKEN_GLOBAL";
pub const ENV_SPEC_VERSION: &str = "SPEC_VERSION";

/// Category the scoped tokens are issued for.
pub const DEFAULT_SCOPE: &str = "api-test-suite";

fn default_scope() -> String {
    DEFAULT_SCOPE.to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub read_write: Option<String>,
    #[serde(default)]
    pub read_only: Option<String>,
    /// Token for the root scope (`*:rw`).
    #[serde(default)]
    pub global: Option<String>,
}

/// Everything a run needs to know before discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub servers: Vec<String>,
    #[serde(default)]
    pub account: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub tokens: Tokens,
    /// Replaces the version the server declares.
    #[serde(default)]
    pub spec_version: Option<u32>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            account: String::new(),
            scope: default_scope(),
            tokens: Tokens::default(),
            spec_version: None,
        }
    }
}

impl SuiteConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let servers = var(ENV_SERVER_URL)
            .map(|v| split_servers(&v))
            .unwrap_or_default();
        let account = var(ENV_ACCOUNT)
            .or_else(|| var(ENV_ACCOUNT_HANDLE))
            .unwrap_or_default();
        let spec_version = match var(ENV_SPEC_VERSION) {
            Some(v) => Some(v.trim().parse::<u32>().map_err(|_| {
                ClientError::Config(format!("{ENV_SPEC_VERSION} must be a number, got '{v}'"))
            })?),
            None => None,
        };

        Ok(Self {
            servers,
            account,
            scope: var(ENV_TOKEN_SCOPE).unwrap_or_else(default_scope),
            tokens: Tokens {
                read_write: var(ENV_TOKEN_READ_WRITE),
                read_only: var(ENV_TOKEN_READ_ONLY),
                global: var(ENV_TOKEN_GLOBAL),
            },
            spec_version,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| ClientError::Config(format!("invalid suite config: {e}")))?;
        config.servers = config
            .servers
            .iter()
            .map(|s| s.trim().trim_end_matches('/').to_owned())
            .collect();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that a run can start: at least one parseable server URL and an
    /// account.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.servers.is_empty() {
            return Err(ClientError::Config(format!(
                "no server configured (set {ENV_SERVER_URL})"
            )));
        }
        for server in &self.servers {
            let parsed = url::Url::parse(server)
                .map_err(|e| ClientError::Config(format!("invalid server URL '{server}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ClientError::Config(format!(
                    "server URL '{server}' must use http or https"
                )));
            }
        }
        if self.account.is_empty() {
            return Err(ClientError::Config(format!(
                "no account configured (set {ENV_ACCOUNT} or {ENV_ACCOUNT_HANDLE})"
            )));
        }
        if self.scope.is_empty() || self.scope.contains('/') {
            return Err(ClientError::Config(format!(
                "token scope '{}' must be a single category name",
                self.scope
            )));
        }
        Ok(())
    }
}

fn split_servers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
