use super::{CaseDef, CaseEnv};
use crate::assert::{
    ensure, expect_empty_body, expect_eq, expect_etag, expect_header, expect_header_eq,
    expect_media_type, expect_status, fail, CaseError,
};
use chrono::Utc;
use rsprobe_client::storage::JSON_CONTENT_TYPE;
use rsprobe_client::Body;
use rsprobe_policy::{is_rfc1123, parse_http_date, within_tolerance, LAST_MODIFIED_TOLERANCE_SECS};

pub const CASES: &[CaseDef] = cases![
    get_returns_stored_document,
    get_carries_version_headers,
    head_returns_etag_without_body,
    get_missing_document_is_not_found,
    if_none_match_current_etag_is_not_modified,
    if_none_match_other_etag_returns_document,
    binary_document_round_trip,
];

fn get_returns_stored_document(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let body = fixture.body();
    let etag = env.put(&client, &path, &body)?;

    let step = format!("GET {path}");
    let resp = client.get(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    expect_eq(&format!("{step} ETag"), etag.as_str(), expect_etag(&step, &resp, env.policy())?.as_str())?;
    expect_media_type(&step, &resp, JSON_CONTENT_TYPE)?;
    let sent = body.to_bytes()?;
    ensure(
        resp.body() == sent.as_slice(),
        &format!("{step} body"),
        String::from_utf8_lossy(&sent),
        String::from_utf8_lossy(resp.body()),
    )
}

fn get_carries_version_headers(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.flat();
    let path = fixture.path();
    let body = fixture.body();
    env.put(&client, &path, &body)?;

    let step = format!("GET {path}");
    let resp = client.get(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    let policy = env.policy();

    if policy.supports_content_length {
        let expected = body.to_bytes()?.len().to_string();
        expect_header_eq(&step, &resp, "Content-Length", &expected)?;
    }
    if let Some(expected) = policy.expected_cache_control() {
        let value = expect_header(&step, &resp, "Cache-Control")?;
        ensure(
            value.to_ascii_lowercase().contains(expected),
            &step,
            format!("Cache-Control: {expected}"),
            format!("Cache-Control: {value}"),
        )?;
    }
    if let Some(expected) = policy.expected_expires() {
        expect_header_eq(&step, &resp, "Expires", expected)?;
    }
    if policy.supports_last_modified {
        let value = expect_header(&step, &resp, "Last-Modified")?;
        ensure(
            is_rfc1123(value),
            &step,
            "Last-Modified in RFC 1123 format",
            format!("Last-Modified: {value}"),
        )?;
        let date = parse_http_date(value)?;
        ensure(
            within_tolerance(date, Utc::now(), LAST_MODIFIED_TOLERANCE_SECS),
            &step,
            format!("Last-Modified within {LAST_MODIFIED_TOLERANCE_SECS} s of now"),
            format!("Last-Modified: {value}"),
        )?;
    }
    Ok(())
}

fn head_returns_etag_without_body(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let body = fixture.body();
    let etag = env.put(&client, &path, &body)?;

    let step = format!("HEAD {path}");
    let resp = client.head(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    let head_etag = expect_etag(&step, &resp, env.policy())?;
    expect_eq(&format!("{step} ETag"), etag.as_str(), head_etag.as_str())?;
    if env.policy().supports_content_length {
        // HEAD reports the length GET would send.
        expect_header_eq(&step, &resp, "Content-Length", &body.to_bytes()?.len().to_string())?;
    }
    expect_empty_body(&step, &resp)
}

fn get_missing_document_is_not_found(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let resp = env.ctx.read_write().get(&path, &[])?;
    expect_status(&format!("GET missing {path}"), &resp, &[404])
}

fn if_none_match_current_etag_is_not_modified(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let etag = env.put(&client, &path, &fixture.body())?;

    let step = format!("GET {path} If-None-Match: {etag}");
    let resp = client.get(&path, &[("If-None-Match", etag.as_str())])?;
    expect_status(&step, &resp, &[304])?;
    expect_empty_body(&step, &resp)?;

    let list = format!("\"{}-stale\", {etag}", fixture.id);
    let step = format!("GET {path} If-None-Match: {list}");
    let resp = client.get(&path, &[("If-None-Match", list.as_str())])?;
    expect_status(&step, &resp, &[304])?;
    expect_empty_body(&step, &resp)
}

fn if_none_match_other_etag_returns_document(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let others = format!("\"{0}-a\", \"{0}-b\"", fixture.id);
    let step = format!("GET {path} If-None-Match: {others}");
    let resp = client.get(&path, &[("If-None-Match", others.as_str())])?;
    expect_status(&step, &resp, &[200])?;
    ensure(!resp.body().is_empty(), &step, "the document body", "an empty body")
}

fn binary_document_round_trip(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let body = fixture.binary();
    let Body::Binary { content_type, data } = &body else {
        return Err(fail("binary fixture", "a binary body", "JSON"));
    };
    let etag = env.put(&client, &path, &body)?;

    let step = format!("GET {path}");
    let resp = client.get(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    expect_eq(&format!("{step} ETag"), etag.as_str(), expect_etag(&step, &resp, env.policy())?.as_str())?;
    expect_media_type(&step, &resp, content_type)?;
    if env.policy().supports_content_length {
        expect_header_eq(&step, &resp, "Content-Length", &data.len().to_string())?;
    }
    ensure(
        resp.body() == data.as_slice(),
        &format!("{step} body"),
        format!("{} bytes as sent", data.len()),
        format!("{} different bytes", resp.body().len()),
    )
}
