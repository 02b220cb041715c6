use super::{CaseDef, CaseEnv};
use crate::assert::{ensure, expect_status, fail, CaseError};
use rsprobe_policy::Listing;

pub const CASES: &[CaseDef] = cases![
    delete_existing_document,
    delete_changes_ancestor_etags,
    delete_last_document_removes_folder,
    delete_missing_document_is_not_found,
    delete_if_match_mismatch_is_precondition_failed,
    delete_if_match_on_absent_document_is_precondition_failed,
    delete_if_match_current_etag_deletes,
];

fn delete_existing_document(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let resp = client.delete(&path, &[])?;
    expect_status(&format!("DELETE {path}"), &resp, &[200, 204])?;
    let resp = client.head(&path, &[])?;
    expect_status(&format!("HEAD {path} after DELETE"), &resp, &[404])
}

fn delete_changes_ancestor_etags(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &fixture.sibling("keep"), &fixture.body())?;
    env.put(&client, &path, &fixture.body())?;

    let before = env.ancestor_etags(&path)?;
    let resp = client.delete(&path, &[])?;
    expect_status(&format!("DELETE {path}"), &resp, &[200, 204])?;
    let after = env.ancestor_etags(&path)?;
    env.expect_ancestors_changed(&format!("DELETE {path}"), &before, &after)
}

fn delete_last_document_removes_folder(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let resp = client.delete(&path, &[])?;
    expect_status(&format!("DELETE {path}"), &resp, &[200, 204])?;

    let folder = fixture.folder();
    let step = format!("GET {folder} after deleting its last document");
    let resp = client.get(&folder, &[])?;
    match resp.status {
        404 => Ok(()),
        200 => {
            let listing = Listing::parse(env.policy(), resp.body())?;
            ensure(
                listing.is_empty(),
                &step,
                "an empty listing",
                format!("{} entries", listing.len()),
            )
        }
        other => Err(fail(&step, "HTTP 404 or an empty listing", format!("HTTP {other}"))),
    }
}

fn delete_missing_document_is_not_found(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let resp = env.ctx.read_write().delete(&path, &[])?;
    expect_status(&format!("DELETE missing {path}"), &resp, &[404])
}

fn delete_if_match_mismatch_is_precondition_failed(
    env: &mut CaseEnv<'_>,
) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&client, &path, &fixture.body())?;

    let stale = format!("\"{}-stale\"", fixture.id);
    let resp = client.delete(&path, &[("If-Match", stale.as_str())])?;
    expect_status(&format!("DELETE {path} If-Match: {stale}"), &resp, &[412])?;
    let resp = client.head(&path, &[])?;
    expect_status(&format!("HEAD {path} after refused DELETE"), &resp, &[200])
}

fn delete_if_match_on_absent_document_is_precondition_failed(
    env: &mut CaseEnv<'_>,
) -> Result<(), CaseError> {
    env.require_conditional()?;
    let fixture = env.fixtures.nested();
    let path = fixture.path();

    let stale = format!("\"{}-stale\"", fixture.id);
    let resp = env.ctx.read_write().delete(&path, &[("If-Match", stale.as_str())])?;
    expect_status(&format!("DELETE absent {path} If-Match: {stale}"), &resp, &[412])
}

fn delete_if_match_current_etag_deletes(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    env.require_conditional()?;
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let etag = env.put(&client, &path, &fixture.body())?;

    let resp = client.delete(&path, &[("If-Match", etag.as_str())])?;
    expect_status(&format!("DELETE {path} If-Match: {etag}"), &resp, &[200, 204])?;
    let resp = client.head(&path, &[])?;
    expect_status(&format!("HEAD {path} after DELETE"), &resp, &[404])
}
