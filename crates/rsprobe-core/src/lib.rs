//! Conformance engine for remoteStorage servers.
//!
//! This crate turns a resolved account into an immutable `ServerContext`,
//! generates collision-free fixtures, and drives the scenario groups
//! (authorization, create, read, list, update, delete, CORS, public folder)
//! against the server. Every expectation that depends on the declared draft
//! version comes from the context's `VersionPolicy`. Results are collected
//! per case into a serializable `RunReport`; nothing short-circuits across
//! cases, groups or servers.

pub mod assert;
pub mod auth;
pub mod context;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod scenarios;

pub use assert::{AssertionFailure, CaseError};
pub use auth::{authorization_url, Permission};
pub use context::ServerContext;
pub use fixture::{Fixture, FixtureGenerator};
pub use report::{CaseOutcome, CaseReport, GroupReport, RunReport, ServerReport, Summary};
pub use runner::{resolve_and_run, run_server, run_suite, ScenarioGroup};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("policy error: {0}")]
    Policy(#[from] rsprobe_policy::PolicyError),
    #[error("client error: {0}")]
    Client(#[from] rsprobe_client::ClientError),
    #[error("discovery error: {0}")]
    Discovery(#[from] rsprobe_client::DiscoveryError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown scenario group '{0}'")]
    UnknownGroup(String),
}
