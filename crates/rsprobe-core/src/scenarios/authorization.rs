//! Token handling: missing, read-only, foreign account, foreign category
//! and global tokens.

use super::{CaseDef, CaseEnv};
use crate::assert::{expect_status, skip, CaseError};
use rsprobe_client::Operation;

const DENIED: &[u16] = &[401, 403];

pub const CASES: &[CaseDef] = cases![
    requests_without_token_are_unauthorized,
    read_only_token_can_read,
    read_only_token_cannot_write,
    token_rejected_for_other_account,
    token_rejected_outside_its_category,
    global_token_lists_storage_root,
];

fn requests_without_token_are_unauthorized(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&env.ctx.read_write(), &path, &fixture.body())?;

    let anonymous = env.ctx.anonymous();
    let body = fixture.revised_body();
    for op in Operation::ALL {
        let resp = match op {
            Operation::Options => continue,
            Operation::Put => anonymous.send(op, &path, Some(&body), &[])?,
            Operation::Get | Operation::Delete | Operation::Head => {
                anonymous.send(op, &path, None, &[])?
            }
        };
        expect_status(&format!("{op} {path} without token"), &resp, &[401])?;
    }
    Ok(())
}

fn read_only_token_can_read(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let reader = env
        .ctx
        .read_only()
        .ok_or_else(|| skip("no read-only token configured"))?;
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&env.ctx.read_write(), &path, &fixture.body())?;

    let resp = reader.get(&path, &[])?;
    expect_status(&format!("GET {path} with read-only token"), &resp, &[200, 204])?;
    let resp = reader.head(&path, &[])?;
    expect_status(&format!("HEAD {path} with read-only token"), &resp, &[200, 204])
}

fn read_only_token_cannot_write(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let reader = env
        .ctx
        .read_only()
        .ok_or_else(|| skip("no read-only token configured"))?;
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    env.put(&env.ctx.read_write(), &path, &fixture.body())?;

    let resp = reader.put(&path, &fixture.revised_body(), &[])?;
    expect_status(&format!("PUT {path} with read-only token"), &resp, DENIED)?;
    let resp = reader.delete(&path, &[])?;
    expect_status(&format!("DELETE {path} with read-only token"), &resp, DENIED)
}

fn token_rejected_for_other_account(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.flat();
    let other = env
        .ctx
        .other_account(&format!("-{}", fixture.id))
        .ok_or_else(|| skip("account name is not part of the storage URL"))?;
    let path = fixture.path();

    let resp = other.put(&path, &fixture.body(), &[])?;
    expect_status(&format!("PUT {path} on another account"), &resp, DENIED)?;
    let resp = other.get(&path, &[])?;
    expect_status(&format!("GET {path} on another account"), &resp, DENIED)
}

fn token_rejected_outside_its_category(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.flat();
    let outside = env
        .ctx
        .read_write()
        .with_scope(&format!("{}-outside", env.ctx.scope));
    let path = fixture.path();

    let resp = outside.put(&path, &fixture.body(), &[])?;
    expect_status(&format!("PUT {} outside the token's category", outside.url(&path)), &resp, DENIED)?;
    let resp = outside.get(&path, &[])?;
    expect_status(&format!("GET {} outside the token's category", outside.url(&path)), &resp, DENIED)
}

fn global_token_lists_storage_root(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let global = env
        .ctx
        .global()
        .ok_or_else(|| skip("no global token configured"))?;
    let fixture = env.fixtures.flat();
    env.put(&env.ctx.read_write(), &fixture.path(), &fixture.body())?;

    let resp = global.get("/", &[])?;
    expect_status("GET / with global token", &resp, &[200])
}
