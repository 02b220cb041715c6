use super::{CaseDef, CaseEnv};
use crate::assert::{expect_etag, expect_status, CaseError};

pub const CASES: &[CaseDef] = cases![
    put_document_without_folder,
    put_document_with_folder,
    put_document_where_folder_exists,
    put_document_beneath_document,
    if_none_match_star_rejects_existing,
    if_none_match_star_creates_absent,
    content_range_is_rejected,
    put_changes_ancestor_etags,
];

fn put_document_without_folder(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.flat();
    env.put(&env.ctx.read_write(), &fixture.path(), &fixture.body())?;
    Ok(())
}

fn put_document_with_folder(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    env.put(&env.ctx.read_write(), &fixture.path(), &fixture.body())?;
    Ok(())
}

fn put_document_where_folder_exists(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    env.put(&client, &fixture.path(), &fixture.body())?;

    let resp = client.put(&fixture.id, &fixture.body(), &[])?;
    expect_status(
        &format!("PUT {} over an existing folder", fixture.id),
        &resp,
        env.policy().path_collision_statuses(),
    )
}

fn put_document_beneath_document(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.flat();
    env.put(&client, &fixture.path(), &fixture.body())?;

    let below = format!("{}/child", fixture.id);
    let resp = client.put(&below, &fixture.body(), &[])?;
    expect_status(
        &format!("PUT {below} beneath a document"),
        &resp,
        env.policy().path_collision_statuses(),
    )
}

fn if_none_match_star_rejects_existing(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let resp = client.put(&path, &fixture.revised_body(), &[("If-None-Match", "*")])?;
    expect_status(&format!("PUT {path} If-None-Match: * on existing"), &resp, &[412])
}

fn if_none_match_star_creates_absent(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();

    let step = format!("PUT {path} If-None-Match: * on absent");
    let resp = client.put(&path, &fixture.body(), &[("If-None-Match", "*")])?;
    expect_status(&step, &resp, &[200, 201])?;
    expect_etag(&step, &resp, env.policy())?;
    Ok(())
}

fn content_range_is_rejected(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.flat();
    let path = fixture.path();
    let body = fixture.body();
    let len = body.to_bytes()?.len();
    let range = format!("bytes 0-{}/{len}", len.saturating_sub(1));

    let resp = client.put(&path, &body, &[("Content-Range", range.as_str())])?;
    expect_status(
        &format!("PUT {path} with Content-Range"),
        &resp,
        env.policy().content_range_statuses(),
    )
}

fn put_changes_ancestor_etags(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    env.put(&client, &fixture.sibling("first"), &fixture.body())?;

    let path = fixture.path();
    let before = env.ancestor_etags(&path)?;
    env.put(&client, &path, &fixture.body())?;
    let after = env.ancestor_etags(&path)?;
    env.expect_ancestors_changed(&format!("PUT {path}"), &before, &after)
}
