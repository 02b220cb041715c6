//! OAuth implicit-grant URLs for obtaining the suite's tokens.

use crate::CoreError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permission {
    #[serde(rename = "rw")]
    ReadWrite,
    #[serde(rename = "r")]
    ReadOnly,
    /// Read-write on every category.
    #[serde(rename = "*")]
    Global,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "rw",
            Self::ReadOnly => "r",
            Self::Global => "*",
        }
    }

    /// The OAuth scope requested for `category`.
    pub fn scope(self, category: &str) -> String {
        match self {
            Self::ReadWrite | Self::ReadOnly => format!("{category}:{}", self.as_str()),
            Self::Global => "*:rw".to_owned(),
        }
    }

    /// The variable the resulting token belongs in.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::ReadWrite => rsprobe_client::config::ENV_TOKEN_READ_WRITE,
            Self::ReadOnly => rsprobe_client::config::ENV_TOKEN_READ_ONLY,
            Self::Global => rsprobe_client::config::ENV_TOKEN_GLOBAL,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rw" => Ok(Self::ReadWrite),
            "r" => Ok(Self::ReadOnly),
            "*" | "global" => Ok(Self::Global),
            other => Err(CoreError::Config(format!(
                "unknown permission '{other}' (expected rw, r or *)"
            ))),
        }
    }
}

#[derive(Serialize)]
struct State<'a> {
    account: &'a str,
    permission: Permission,
}

/// Build the authorization URL a browser opens to grant `permission`.
///
/// `state` carries the account and permission as base64-encoded JSON so the
/// redirect target can tell which token it received.
pub fn authorization_url(
    endpoint: &str,
    account: &str,
    category: &str,
    permission: Permission,
    redirect_uri: &str,
) -> Result<String, CoreError> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| CoreError::Config(format!("invalid auth endpoint '{endpoint}': {e}")))?;
    let state = serde_json::to_vec(&State {
        account,
        permission,
    })
    .map_err(|e| CoreError::Config(format!("cannot encode OAuth state: {e}")))?;

    url.query_pairs_mut()
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &permission.scope(category))
        .append_pair("response_type", "token")
        .append_pair("client_id", redirect_uri)
        .append_pair("state", &STANDARD.encode(state));
    Ok(url.into())
}
