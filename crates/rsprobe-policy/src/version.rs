//! The version policy table.
//!
//! The protocol is additive across drafts, so a policy is composed from range
//! thresholds rather than spelled out per version. Scenario code asks the
//! policy; it never compares version numbers itself.

use crate::PolicyError;
use serde::Serialize;

/// First draft with conditional requests (`If-Match`, `If-None-Match`, 412).
pub const CONDITIONAL_SINCE: u32 = 2;
/// First draft with `Content-Length`/`Content-Type` metadata, items-wrapped
/// listings, 409 path collisions, and `Content-Range` rejection.
pub const CONTENT_METADATA_SINCE: u32 = 2;
/// Last draft that requires `Expires: 0` on document responses.
pub const EXPIRES_UNTIL: u32 = 5;
/// First draft that requires `Cache-Control: no-cache`.
pub const CACHE_CONTROL_SINCE: u32 = 6;
/// First draft that requires `Last-Modified` on documents.
pub const LAST_MODIFIED_SINCE: u32 = 11;
/// Allowed clock skew between the suite and the server for `Last-Modified`.
pub const LAST_MODIFIED_TOLERANCE_SECS: i64 = 10;

const SUCCESS_PUT: &[u16] = &[200, 201];
const CONFLICT: &[u16] = &[409];
const BAD_REQUEST: &[u16] = &[400];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EtagSyntax {
    /// Draft 00: a bare decimal timestamp.
    BareDigits,
    /// Draft 01 onward: an HTTP quoted-string.
    QuotedString,
}

impl EtagSyntax {
    /// Validate an `ETag` response header value.
    pub fn matches(self, value: &str) -> bool {
        match self {
            Self::BareDigits => is_digits(value),
            Self::QuotedString => value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .is_some_and(is_opaque_tag),
        }
    }

    /// Validate the version token of a listing entry. Servers disagree on
    /// whether listings quote it, so both forms are accepted.
    pub fn matches_entry(self, value: &str) -> bool {
        let bare = unquote(value);
        match self {
            Self::BareDigits => is_digits(bare),
            Self::QuotedString => is_opaque_tag(bare),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingShape {
    /// `{ "name": "etag", "folder/": "etag" | { ... } }`
    FlatMap,
    /// `{ "@context": ..., "items": { "name": { "ETag": ..., ... } } }`
    ItemsWrapped,
}

/// Expected behaviors for one declared draft version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionPolicy {
    pub version: u32,
    pub etag_syntax: EtagSyntax,
    pub listing_shape: ListingShape,
    pub listing_context: Option<&'static str>,
    pub conflict_status_for_path_collision: u16,
    pub supports_conditional_headers: bool,
    pub rejects_content_range: bool,
    pub supports_content_length: bool,
    pub expires_zero: bool,
    pub supports_cache_control: bool,
    pub supports_last_modified: bool,
}

impl VersionPolicy {
    pub fn for_version(version: u32) -> Self {
        let metadata = version >= CONTENT_METADATA_SINCE;
        Self {
            version,
            etag_syntax: if version == 0 {
                EtagSyntax::BareDigits
            } else {
                EtagSyntax::QuotedString
            },
            listing_shape: if metadata {
                ListingShape::ItemsWrapped
            } else {
                ListingShape::FlatMap
            },
            listing_context: metadata.then_some(crate::FOLDER_DESCRIPTION_CONTEXT),
            conflict_status_for_path_collision: if metadata { 409 } else { 200 },
            supports_conditional_headers: version >= CONDITIONAL_SINCE,
            rejects_content_range: metadata,
            supports_content_length: metadata,
            expires_zero: metadata && version <= EXPIRES_UNTIL,
            supports_cache_control: version >= CACHE_CONTROL_SINCE,
            supports_last_modified: version >= LAST_MODIFIED_SINCE,
        }
    }

    /// The `etagPattern` predicate over `ETag` headers.
    pub fn etag_valid(&self, value: &str) -> bool {
        self.etag_syntax.matches(value)
    }

    /// The `namePattern` predicate over listing entry version tokens.
    pub fn name_valid(&self, value: &str) -> bool {
        self.etag_syntax.matches_entry(value)
    }

    /// Accepted statuses for a PUT that collides with an existing folder or
    /// file. Before draft 02 the collision is unspecified, so success stands.
    pub fn path_collision_statuses(&self) -> &'static [u16] {
        if self.conflict_status_for_path_collision == 409 {
            CONFLICT
        } else {
            SUCCESS_PUT
        }
    }

    /// Accepted statuses for a PUT carrying `Content-Range`.
    pub fn content_range_statuses(&self) -> &'static [u16] {
        if self.rejects_content_range {
            BAD_REQUEST
        } else {
            SUCCESS_PUT
        }
    }

    /// Folder responses carry an `ETag` once conditional requests exist.
    pub fn requires_folder_etag(&self) -> bool {
        self.supports_conditional_headers
    }

    pub fn expected_cache_control(&self) -> Option<&'static str> {
        self.supports_cache_control.then_some("no-cache")
    }

    pub fn expected_expires(&self) -> Option<&'static str> {
        self.expires_zero.then_some("0")
    }

    /// Compare a listing entry token with an `ETag` header, ignoring quoting.
    pub fn entry_matches_etag(&self, entry: &str, header: &str) -> bool {
        unquote(entry) == unquote(header)
    }
}

/// Select the policy for a resolved version.
pub fn policy_for(version: Option<u32>) -> Result<VersionPolicy, PolicyError> {
    version
        .map(VersionPolicy::for_version)
        .ok_or(PolicyError::UnresolvedVersion)
}

fn unquote(value: &str) -> &str {
    let v = value.strip_prefix("W/").unwrap_or(value);
    v.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(v)
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

// etagc = %x21 / %x23-7E / obs-text
fn is_opaque_tag(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b == 0x21 || (0x23..=0x7E).contains(&b) || b >= 0x80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_zero_uses_bare_digits_and_flat_map() {
        let p = VersionPolicy::for_version(0);
        assert_eq!(p.etag_syntax, EtagSyntax::BareDigits);
        assert_eq!(p.listing_shape, ListingShape::FlatMap);
        assert!(p.etag_valid("1382694048000"));
        assert!(!p.etag_valid("\"1382694048000\""));
        assert!(!p.etag_valid(""));
        assert!(!p.supports_content_length);
    }

    #[test]
    fn version_one_quotes_but_stays_flat() {
        let p = VersionPolicy::for_version(1);
        assert_eq!(p.etag_syntax, EtagSyntax::QuotedString);
        assert_eq!(p.listing_shape, ListingShape::FlatMap);
        assert!(p.etag_valid("\"abc123\""));
        assert!(!p.etag_valid("abc123"));
        assert!(!p.supports_conditional_headers);
        assert_eq!(p.path_collision_statuses(), &[200, 201]);
        assert_eq!(p.content_range_statuses(), &[200, 201]);
    }

    #[test]
    fn version_two_through_five_expires_zero() {
        for v in 2..=5 {
            let p = VersionPolicy::for_version(v);
            assert_eq!(p.listing_shape, ListingShape::ItemsWrapped);
            assert_eq!(p.expected_expires(), Some("0"), "v{v}");
            assert_eq!(p.expected_cache_control(), None, "v{v}");
            assert_eq!(p.path_collision_statuses(), &[409]);
            assert_eq!(p.content_range_statuses(), &[400]);
            assert!(p.supports_content_length);
            assert!(p.supports_conditional_headers);
        }
    }

    #[test]
    fn version_six_switches_to_cache_control() {
        let p = VersionPolicy::for_version(6);
        assert_eq!(p.expected_cache_control(), Some("no-cache"));
        assert_eq!(p.expected_expires(), None);
        assert!(!p.supports_last_modified);
    }

    #[test]
    fn version_eleven_requires_last_modified() {
        let p = VersionPolicy::for_version(11);
        assert!(p.supports_last_modified);
        assert!(p.supports_cache_control);
        assert!(VersionPolicy::for_version(21).supports_last_modified);
        assert!(!VersionPolicy::for_version(10).supports_last_modified);
    }

    #[test]
    fn listing_context_only_for_wrapped_listings() {
        assert_eq!(VersionPolicy::for_version(1).listing_context, None);
        assert_eq!(
            VersionPolicy::for_version(2).listing_context,
            Some("http://remotestorage.io/spec/folder-description")
        );
    }

    #[test]
    fn quoted_etag_rejects_inner_quote_and_empty() {
        let p = VersionPolicy::for_version(4);
        assert!(!p.etag_valid("\"\""));
        assert!(!p.etag_valid("\"a\"b\""));
        assert!(!p.etag_valid("\"a b\""));
        assert!(p.etag_valid("\"1f-8d7a\""));
    }

    #[test]
    fn entry_names_accept_quoted_and_bare() {
        let p = VersionPolicy::for_version(2);
        assert!(p.name_valid("abc"));
        assert!(p.name_valid("\"abc\""));
        assert!(!p.name_valid(""));
        let p0 = VersionPolicy::for_version(0);
        assert!(p0.name_valid("1234"));
        assert!(!p0.name_valid("12ab"));
    }

    #[test]
    fn entry_matches_etag_ignores_quoting() {
        let p = VersionPolicy::for_version(2);
        assert!(p.entry_matches_etag("abc", "\"abc\""));
        assert!(p.entry_matches_etag("\"abc\"", "\"abc\""));
        assert!(!p.entry_matches_etag("abd", "\"abc\""));
    }

    #[test]
    fn policy_for_requires_resolved_version() {
        assert!(matches!(
            policy_for(None),
            Err(PolicyError::UnresolvedVersion)
        ));
        assert_eq!(policy_for(Some(6)).unwrap().version, 6);
    }

    #[test]
    fn policy_serializes_snake_case() {
        let json = serde_json::to_value(VersionPolicy::for_version(0)).unwrap();
        assert_eq!(json["etag_syntax"], "bare_digits");
        assert_eq!(json["listing_shape"], "flat_map");
    }
}
