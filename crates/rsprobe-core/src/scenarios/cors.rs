//! CORS preflight and simple-response headers.

use super::{CaseDef, CaseEnv};
use crate::assert::{ensure, expect_empty_body, expect_header, expect_listed, expect_status, CaseError};
use rsprobe_client::{Operation, ResponseEnvelope};

/// Request headers a browser client sends and the server must allow.
const REQUESTED_HEADERS: [&str; 5] = [
    "Authorization",
    "Content-Type",
    "Origin",
    "If-Match",
    "If-None-Match",
];

pub const CASES: &[CaseDef] = cases![
    preflight_get,
    preflight_put,
    preflight_delete,
    responses_allow_origin,
];

fn preflight_get(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    preflight(env, Operation::Get)
}

fn preflight_put(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    preflight(env, Operation::Put)
}

fn preflight_delete(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    preflight(env, Operation::Delete)
}

fn expect_allow_origin(step: &str, resp: &ResponseEnvelope, origin: &str) -> Result<(), CaseError> {
    let allowed = expect_header(step, resp, "Access-Control-Allow-Origin")?;
    ensure(
        allowed == "*" || allowed == origin,
        step,
        format!("Access-Control-Allow-Origin: * or {origin}"),
        format!("Access-Control-Allow-Origin: {allowed}"),
    )
}

fn preflight(env: &mut CaseEnv<'_>, method: Operation) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let origin = fixture.origin();
    let requested = REQUESTED_HEADERS.join(", ");

    let step = format!("OPTIONS {path} for {method}");
    let resp = env.ctx.anonymous().options(
        &path,
        &[
            ("Origin", origin.as_str()),
            ("Access-Control-Request-Method", method.as_str()),
            ("Access-Control-Request-Headers", requested.as_str()),
        ],
    )?;
    expect_status(&step, &resp, &[200, 204])?;
    expect_allow_origin(&step, &resp, &origin)?;
    expect_listed(&step, &resp, "Access-Control-Expose-Headers", "ETag")?;
    expect_listed(&step, &resp, "Access-Control-Allow-Methods", method.as_str())?;
    for header in REQUESTED_HEADERS {
        expect_listed(&step, &resp, "Access-Control-Allow-Headers", header)?;
    }
    expect_empty_body(&step, &resp)
}

fn responses_allow_origin(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let origin = fixture.origin();
    env.put(&client, &path, &fixture.body())?;

    let step = format!("GET {path} with Origin");
    let resp = client.get(&path, &[("Origin", origin.as_str())])?;
    expect_status(&step, &resp, &[200])?;
    expect_allow_origin(&step, &resp, &origin)?;
    expect_listed(&step, &resp, "Access-Control-Expose-Headers", "ETag")
}
