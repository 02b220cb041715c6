use rsprobe_client::{ClientError, ResponseEnvelope};
use rsprobe_policy::{PolicyError, VersionPolicy};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One violated expectation: what was checked, what should have been seen
/// and what the server actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionFailure {
    pub step: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.step, self.expected, self.actual
        )
    }
}

impl std::error::Error for AssertionFailure {}

/// Why a case did not pass.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("{0}")]
    Assertion(#[from] AssertionFailure),
    #[error("transport error: {0}")]
    Transport(#[from] ClientError),
    #[error("{0}")]
    Listing(#[from] PolicyError),
    /// The case's precondition is absent; this is not a failure.
    #[error("skipped: {0}")]
    Skip(String),
}

pub fn fail(step: &str, expected: impl fmt::Display, actual: impl fmt::Display) -> CaseError {
    CaseError::Assertion(AssertionFailure {
        step: step.to_owned(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

pub fn skip(reason: impl Into<String>) -> CaseError {
    CaseError::Skip(reason.into())
}

pub fn ensure(
    cond: bool,
    step: &str,
    expected: impl fmt::Display,
    actual: impl fmt::Display,
) -> Result<(), CaseError> {
    if cond {
        Ok(())
    } else {
        Err(fail(step, expected, actual))
    }
}

pub fn expect_eq<T>(step: &str, expected: &T, actual: &T) -> Result<(), CaseError>
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    ensure(
        expected == actual,
        step,
        format!("{expected:?}"),
        format!("{actual:?}"),
    )
}

fn statuses(accepted: &[u16]) -> String {
    let list: Vec<String> = accepted.iter().map(u16::to_string).collect();
    format!("HTTP {}", list.join(" or "))
}

pub fn expect_status(step: &str, resp: &ResponseEnvelope, accepted: &[u16]) -> Result<(), CaseError> {
    ensure(
        accepted.contains(&resp.status),
        step,
        statuses(accepted),
        format!("HTTP {}", resp.status),
    )
}

pub fn expect_header<'a>(step: &str, resp: &'a ResponseEnvelope, name: &str) -> Result<&'a str, CaseError> {
    resp.header(name)
        .ok_or_else(|| fail(step, format!("{name} header"), "no such header"))
}

pub fn expect_header_eq(
    step: &str,
    resp: &ResponseEnvelope,
    name: &str,
    expected: &str,
) -> Result<(), CaseError> {
    let value = expect_header(step, resp, name)?;
    ensure(
        value == expected,
        step,
        format!("{name}: {expected}"),
        format!("{name}: {value}"),
    )
}

/// The response's `ETag`, checked against the policy's syntax.
pub fn expect_etag(step: &str, resp: &ResponseEnvelope, policy: &VersionPolicy) -> Result<String, CaseError> {
    let etag = expect_header(step, resp, "ETag")?;
    ensure(
        policy.etag_valid(etag),
        step,
        format!("ETag in draft {} syntax", policy.version),
        format!("ETag: {etag}"),
    )?;
    Ok(etag.to_owned())
}

pub fn expect_empty_body(step: &str, resp: &ResponseEnvelope) -> Result<(), CaseError> {
    ensure(
        resp.body().is_empty(),
        step,
        "empty body",
        format!("{} bytes", resp.body().len()),
    )
}

/// `Content-Type` equals `expected` once parameters such as `charset` are
/// dropped.
pub fn expect_media_type(step: &str, resp: &ResponseEnvelope, expected: &str) -> Result<(), CaseError> {
    let value = expect_header(step, resp, "Content-Type")?;
    ensure(
        media_type(value).eq_ignore_ascii_case(expected),
        step,
        format!("Content-Type: {expected}"),
        format!("Content-Type: {value}"),
    )
}

pub fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or(value).trim()
}

/// Whether a comma-separated header value lists `item`, ignoring case.
pub fn lists(value: &str, item: &str) -> bool {
    value
        .split(',')
        .map(str::trim)
        .any(|v| v == "*" || v.eq_ignore_ascii_case(item))
}

pub fn expect_listed(step: &str, resp: &ResponseEnvelope, header: &str, item: &str) -> Result<(), CaseError> {
    let value = expect_header(step, resp, header)?;
    ensure(
        lists(value, item),
        step,
        format!("{header} listing {item}"),
        format!("{header}: {value}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display() {
        let e = fail("GET doc", "HTTP 200", "HTTP 404");
        assert_eq!(e.to_string(), "GET doc: expected HTTP 200, got HTTP 404");
    }

    #[test]
    fn status_accepts_any_listed() {
        let resp = ResponseEnvelope::new(201, &[], Vec::new());
        assert!(expect_status("put", &resp, &[200, 201]).is_ok());
        let err = expect_status("put", &resp, &[409]).unwrap_err();
        assert_eq!(err.to_string(), "put: expected HTTP 409, got HTTP 201");
    }

    #[test]
    fn etag_checked_against_policy() {
        let quoted = ResponseEnvelope::new(200, &[("ETag", "\"abc\"")], Vec::new());
        let bare = ResponseEnvelope::new(200, &[("ETag", "1382694048000")], Vec::new());
        let v0 = VersionPolicy::for_version(0);
        let v2 = VersionPolicy::for_version(2);
        assert_eq!(expect_etag("s", &quoted, &v2).unwrap(), "\"abc\"");
        assert!(expect_etag("s", &quoted, &v0).is_err());
        assert!(expect_etag("s", &bare, &v0).is_ok());
        assert!(expect_etag("s", &ResponseEnvelope::new(200, &[], Vec::new()), &v2).is_err());
    }

    #[test]
    fn media_type_ignores_parameters() {
        let resp = ResponseEnvelope::new(
            200,
            &[("Content-Type", "application/json; charset=UTF-8")],
            Vec::new(),
        );
        assert!(expect_media_type("s", &resp, "application/json").is_ok());
        assert!(expect_media_type("s", &resp, "text/plain").is_err());
    }

    #[test]
    fn header_lists() {
        assert!(lists("GET, PUT, DELETE", "put"));
        assert!(lists("*", "If-Match"));
        assert!(!lists("GET, HEAD", "PUT"));
    }

    #[test]
    fn skip_is_not_assertion() {
        assert!(matches!(skip("no token"), CaseError::Skip(_)));
    }
}
