//! Conformance scenarios, one module per group.
//!
//! A case is a plain function over a `CaseEnv`: it creates its own fixtures,
//! issues requests and returns the first violated expectation. Cases never
//! share fixtures, so groups can run side by side.

/// Build the case table of a group.
macro_rules! cases {
    ($($name:ident),* $(,)?) => {
        &[$($crate::scenarios::CaseDef { name: stringify!($name), run: $name }),*]
    };
}

pub mod authorization;
pub mod cors;
pub mod create;
pub mod delete;
pub mod list;
pub mod public;
pub mod read;
pub mod update;

use crate::assert::{ensure, expect_etag, expect_status, fail, CaseError};
use crate::{FixtureGenerator, ServerContext};
use rsprobe_client::{Body, ResponseEnvelope, StorageClient};
use rsprobe_policy::{ancestors, Listing, VersionPolicy};
use tracing::warn;

pub type CaseFn = fn(&mut CaseEnv<'_>) -> Result<(), CaseError>;

#[derive(Debug, Clone, Copy)]
pub struct CaseDef {
    pub name: &'static str,
    pub run: CaseFn,
}

/// What a running case can reach: the server, the fixture generator and a
/// sink for tolerated deviations.
pub struct CaseEnv<'a> {
    pub ctx: &'a ServerContext,
    pub fixtures: &'a FixtureGenerator,
    warnings: Vec<String>,
}

impl<'a> CaseEnv<'a> {
    pub fn new(ctx: &'a ServerContext, fixtures: &'a FixtureGenerator) -> Self {
        Self {
            ctx,
            fixtures,
            warnings: Vec::new(),
        }
    }

    pub fn policy(&self) -> &VersionPolicy {
        &self.ctx.policy
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {message}", self.ctx.server);
        self.warnings.push(message);
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Fail with a skip unless the declared version supports conditional
    /// requests.
    pub fn require_conditional(&self) -> Result<(), CaseError> {
        if self.policy().supports_conditional_headers {
            Ok(())
        } else {
            Err(crate::assert::skip(format!(
                "conditional requests are unspecified for draft {}",
                self.policy().version
            )))
        }
    }

    /// PUT `body` at `path` and return the new version-valid ETag.
    pub fn put(&self, client: &StorageClient, path: &str, body: &Body) -> Result<String, CaseError> {
        let step = format!("PUT {path}");
        let resp = client.put(path, body, &[])?;
        expect_status(&step, &resp, &[200, 201])?;
        expect_etag(&step, &resp, self.policy())
    }

    /// GET the folder at `path` and parse it in the policy's envelope.
    pub fn list(
        &self,
        client: &StorageClient,
        path: &str,
    ) -> Result<(ResponseEnvelope, Listing), CaseError> {
        let resp = client.get(path, &[])?;
        expect_status(&format!("GET {path}"), &resp, &[200])?;
        let listing = Listing::parse(self.policy(), resp.body())?;
        Ok((resp, listing))
    }

    /// The ETag of every folder above `path`, innermost first. A missing
    /// folder reads as `None`.
    pub fn ancestor_etags(&self, path: &str) -> Result<Vec<(String, Option<String>)>, CaseError> {
        let client = self.ctx.read_write();
        let mut out = Vec::new();
        for folder in ancestors(path) {
            let resp = client.get(&folder, &[])?;
            let etag = match resp.status {
                200 => match resp.etag() {
                    Some(etag) => {
                        ensure(
                            self.policy().etag_valid(etag),
                            &format!("GET {folder}"),
                            format!("ETag in draft {} syntax", self.policy().version),
                            format!("ETag: {etag}"),
                        )?;
                        Some(etag.to_owned())
                    }
                    None => None,
                },
                404 => None,
                other => {
                    return Err(fail(
                        &format!("GET {folder}"),
                        "HTTP 200 or 404",
                        format!("HTTP {other}"),
                    ))
                }
            };
            out.push((folder, etag));
        }
        Ok(out)
    }

    /// Check that every ancestor's ETag moved between two snapshots. A folder
    /// that appears or disappears counts as changed.
    pub fn expect_ancestors_changed(
        &mut self,
        step: &str,
        before: &[(String, Option<String>)],
        after: &[(String, Option<String>)],
    ) -> Result<(), CaseError> {
        for ((folder, old), (_, new)) in before.iter().zip(after) {
            match (old, new) {
                (Some(old), Some(new)) if old == new => {
                    return Err(fail(
                        &format!("{step}: ETag of {folder}"),
                        format!("a value other than {old}"),
                        new,
                    ));
                }
                (None, None) if self.policy().requires_folder_etag() => {
                    return Err(fail(
                        &format!("{step}: GET {folder}"),
                        "an ETag header",
                        "none",
                    ));
                }
                (None, None) => {
                    self.warn(format!("{folder} carries no ETag, change after {step} not checked"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
