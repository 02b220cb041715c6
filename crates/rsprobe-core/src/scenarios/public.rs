//! The public folder: documents readable by anyone, folders listable by
//! nobody without a token.

use super::{CaseDef, CaseEnv};
use crate::assert::{ensure, expect_empty_body, expect_header_eq, expect_status, CaseError};

const DENIED: &[u16] = &[401, 403];

pub const CASES: &[CaseDef] = cases![
    public_document_readable_without_token,
    public_document_not_writable_without_token,
    public_folder_not_listable_without_token,
    denied_listing_reveals_nothing,
];

fn public_document_readable_without_token(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let writer = env.ctx.public(env.ctx.tokens.read_write.as_deref());
    let reader = env.ctx.public(None);
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let body = fixture.body();
    env.put(&writer, &path, &body)?;

    let step = format!("GET {} without token", reader.url(&path));
    let resp = reader.get(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    let sent = body.to_bytes()?;
    ensure(
        resp.body() == sent.as_slice(),
        &format!("{step} body"),
        String::from_utf8_lossy(&sent),
        String::from_utf8_lossy(resp.body()),
    )?;

    let step = format!("HEAD {} without token", reader.url(&path));
    let resp = reader.head(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    if env.policy().supports_content_length {
        expect_header_eq(&step, &resp, "Content-Length", &sent.len().to_string())?;
    }
    expect_empty_body(&step, &resp)
}

fn public_document_not_writable_without_token(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let writer = env.ctx.public(env.ctx.tokens.read_write.as_deref());
    let anonymous = env.ctx.public(None);
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&writer, &path, &fixture.body())?;

    let resp = anonymous.put(&path, &fixture.revised_body(), &[])?;
    expect_status(&format!("PUT {} without token", anonymous.url(&path)), &resp, DENIED)?;
    let resp = anonymous.delete(&path, &[])?;
    expect_status(&format!("DELETE {} without token", anonymous.url(&path)), &resp, DENIED)
}

fn public_folder_not_listable_without_token(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let writer = env.ctx.public(env.ctx.tokens.read_write.as_deref());
    let anonymous = env.ctx.public(None);
    let fixture = env.fixtures.nested();
    env.put(&writer, &fixture.path(), &fixture.body())?;

    let folder = fixture.folder();
    let resp = anonymous.get(&folder, &[])?;
    expect_status(&format!("GET {} without token", anonymous.url(&folder)), &resp, DENIED)
}

/// An anonymous listing of an empty public folder must look exactly like the
/// listing of a populated one.
fn denied_listing_reveals_nothing(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let writer = env.ctx.public(env.ctx.tokens.read_write.as_deref());
    let anonymous = env.ctx.public(None);
    let populated = env.fixtures.nested();
    let empty = env.fixtures.nested();
    env.put(&writer, &populated.path(), &populated.body())?;

    let full = anonymous.get(&populated.folder(), &[])?;
    let bare = anonymous.get(&empty.folder(), &[])?;
    let step = format!("GET {} without token", anonymous.url(&empty.folder()));
    expect_status(&step, &bare, DENIED)?;
    ensure(
        full.status == bare.status,
        &step,
        format!("HTTP {} as for a populated folder", full.status),
        format!("HTTP {}", bare.status),
    )?;
    ensure(
        full.body() == bare.body(),
        &step,
        String::from_utf8_lossy(full.body()),
        String::from_utf8_lossy(bare.body()),
    )
}
