//! Version policy table, listing envelopes, HTTP dates, and URL composition
//! for the remoteStorage conformance suite.
//!
//! This crate is the pure layer of the suite: it holds no I/O. `VersionPolicy`
//! maps a declared draft version (`draft-dejong-remotestorage-NN`) to the
//! behaviors a conforming server must show, `Listing` parses folder
//! descriptions in the shape the policy selects, `http_date` validates
//! RFC 1123 timestamps, and `path` composes request URLs.

pub mod http_date;
pub mod listing;
pub mod path;
pub mod version;

pub use http_date::{is_rfc1123, parse_http_date, within_tolerance};
pub use listing::{Listing, ListingEntry, FOLDER_DESCRIPTION_CONTEXT};
pub use path::{ancestors, basename, compose_url, parent_folder};
pub use version::{
    policy_for, EtagSyntax, ListingShape, VersionPolicy, CACHE_CONTROL_SINCE, CONDITIONAL_SINCE,
    CONTENT_METADATA_SINCE, EXPIRES_UNTIL, LAST_MODIFIED_SINCE, LAST_MODIFIED_TOLERANCE_SECS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("no protocol version resolved; run discovery or set SPEC_VERSION first")]
    UnresolvedVersion,
    #[error("malformed folder listing: {0}")]
    MalformedListing(String),
    #[error("invalid HTTP date: {0}")]
    InvalidDate(String),
}
