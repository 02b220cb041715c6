//! HTTP plumbing for the remoteStorage conformance suite.
//!
//! This crate resolves an account to a storage root through WebFinger
//! (`discovery`), issues raw storage requests with bearer tokens and
//! pass-through headers (`storage`), and loads the suite configuration from
//! the environment or a JSON file (`config`). Every non-2xx status is a
//! normal `ResponseEnvelope`: the client reports what the server did and
//! never retries.

pub mod config;
pub mod discovery;
pub mod response;
pub mod storage;

pub use config::{SuiteConfig, Tokens, DEFAULT_SCOPE};
pub use discovery::{discover, parse_webfinger, webfinger_url, Discovery};
pub use response::ResponseEnvelope;
pub use storage::{Body, StorageClient};

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid server URL '{url}': {reason}")]
    InvalidServer { url: String, reason: String },
    #[error("WebFinger request failed: {0}")]
    Transport(String),
    #[error("WebFinger at {url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid WebFinger document: {0}")]
    InvalidDocument(String),
    #[error("no remoteStorage link in WebFinger response for {0}")]
    NoStorageLink(String),
    #[error("malformed remoteStorage version tag '{0}'")]
    MalformedVersion(String),
}

/// The HTTP operations a storage endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Put,
    Delete,
    Head,
    Options,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::Put,
        Operation::Delete,
        Operation::Head,
        Operation::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent that hands every status back as a response.
pub(crate) fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}
