use super::{CaseDef, CaseEnv};
use crate::assert::{ensure, expect_etag, expect_status, fail, CaseError};
use rsprobe_policy::basename;

pub const CASES: &[CaseDef] = cases![
    put_replaces_document,
    update_changes_ancestor_etags,
    parent_listing_carries_new_etag,
    if_match_mismatch_is_precondition_failed,
    if_match_on_absent_document_is_precondition_failed,
    if_match_current_etag_updates,
];

fn put_replaces_document(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let first = env.put(&client, &path, &fixture.body())?;
    let revised = fixture.revised_body();
    let second = env.put(&client, &path, &revised)?;
    ensure(
        first != second,
        &format!("PUT {path} again"),
        format!("an ETag other than {first}"),
        &second,
    )?;

    let step = format!("GET {path}");
    let resp = client.get(&path, &[])?;
    expect_status(&step, &resp, &[200])?;
    let expected = revised.to_bytes()?;
    ensure(
        resp.body() == expected.as_slice(),
        &format!("{step} body"),
        String::from_utf8_lossy(&expected),
        String::from_utf8_lossy(resp.body()),
    )?;
    let current = expect_etag(&step, &resp, env.policy())?;
    ensure(current == second, &step, format!("ETag {second}"), current)
}

fn update_changes_ancestor_etags(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let before = env.ancestor_etags(&path)?;
    env.put(&client, &path, &fixture.revised_body())?;
    let after = env.ancestor_etags(&path)?;
    env.expect_ancestors_changed(&format!("PUT {path} again"), &before, &after)
}

fn parent_listing_carries_new_etag(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;
    let etag = env.put(&client, &path, &fixture.revised_body())?;

    let folder = fixture.folder();
    let (_, listing) = env.list(&client, &folder)?;
    let name = basename(&path);
    let step = format!("GET {folder} entry {name}");
    let entry_etag = listing
        .get(&name)
        .and_then(|e| e.etag())
        .ok_or_else(|| fail(&step, format!("an entry for {name}"), "none"))?;
    ensure(
        env.policy().entry_matches_etag(entry_etag, &etag),
        &step,
        format!("the updated ETag {etag}"),
        entry_etag,
    )
}

fn if_match_mismatch_is_precondition_failed(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let stale = format!("\"{}-stale\"", fixture.id);
    let resp = client.put(&path, &fixture.revised_body(), &[("If-Match", stale.as_str())])?;
    expect_status(&format!("PUT {path} If-Match: {stale}"), &resp, &[412])
}

fn if_match_on_absent_document_is_precondition_failed(
    env: &mut CaseEnv<'_>,
) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();

    let stale = format!("\"{}-stale\"", fixture.id);
    let resp = client.put(&path, &fixture.body(), &[("If-Match", stale.as_str())])?;
    expect_status(&format!("PUT absent {path} If-Match: {stale}"), &resp, &[412])
}

fn if_match_current_etag_updates(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let etag = env.put(&client, &path, &fixture.body())?;

    let step = format!("PUT {path} If-Match: {etag}");
    let resp = client.put(&path, &fixture.revised_body(), &[("If-Match", etag.as_str())])?;
    expect_status(&step, &resp, &[200, 201])?;
    let updated = expect_etag(&step, &resp, env.policy())?;
    ensure(
        updated != etag,
        &step,
        format!("an ETag other than {etag}"),
        updated,
    )
}
