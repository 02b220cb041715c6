use super::{CaseDef, CaseEnv};
use crate::assert::{
    ensure, expect_eq, expect_etag, expect_header, expect_status, fail, media_type, CaseError,
};
use rsprobe_client::storage::JSON_CONTENT_TYPE;
use rsprobe_policy::{basename, Listing, ListingEntry};

const LD_JSON: &str = "application/ld+json";

pub const CASES: &[CaseDef] = cases![
    listing_uses_version_envelope,
    listing_describes_documents,
    listing_describes_subfolders,
    missing_folder_is_absent_or_empty,
];

fn listing_uses_version_envelope(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    env.put(&client, &fixture.path(), &fixture.body())?;

    let folder = fixture.folder();
    let step = format!("GET {folder}");
    let (resp, listing) = env.list(&client, &folder)?;
    if env.policy().requires_folder_etag() {
        expect_etag(&step, &resp, env.policy())?;
    }

    let content_type = expect_header(&step, &resp, "Content-Type")?.to_owned();
    let media = media_type(&content_type).to_ascii_lowercase();
    if media == JSON_CONTENT_TYPE {
        if env.policy().listing_context.is_some() {
            env.warn(format!("{step} answered {JSON_CONTENT_TYPE} instead of {LD_JSON}"));
        }
    } else if media != LD_JSON {
        return Err(fail(
            &step,
            format!("Content-Type: {LD_JSON} or {JSON_CONTENT_TYPE}"),
            format!("Content-Type: {content_type}"),
        ));
    }

    if let Some(context) = env.policy().listing_context {
        expect_eq(
            &format!("{step} @context"),
            &Some(context),
            &listing.context.as_deref(),
        )?;
    }
    ensure(
        listing.len() == 1,
        &format!("{step} entries"),
        "exactly one entry",
        listing.len(),
    )
}

fn listing_describes_documents(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let path = fixture.path();
    let body = fixture.body();
    let etag = env.put(&client, &path, &body)?;

    let folder = fixture.folder();
    let (_, listing) = env.list(&client, &folder)?;
    let name = basename(&path);
    let step = format!("GET {folder} entry {name}");
    let entry = listing
        .get(&name)
        .ok_or_else(|| fail(&step, format!("an entry named {name}"), entry_names(&listing)))?;

    let ListingEntry::Document {
        etag: entry_etag,
        content_length,
        content_type,
    } = entry
    else {
        return Err(fail(&step, "a document entry", "a folder entry"));
    };
    let policy = env.policy();
    ensure(
        policy.name_valid(entry_etag),
        &step,
        format!("version token in draft {} syntax", policy.version),
        entry_etag,
    )?;
    ensure(
        policy.entry_matches_etag(entry_etag, &etag),
        &step,
        format!("the ETag of PUT {path} ({etag})"),
        entry_etag,
    )?;

    if policy.supports_content_length {
        let expected = body.to_bytes()?.len() as u64;
        expect_eq(&format!("{step} Content-Length"), &Some(expected), content_length)?;
        let actual = content_type.as_deref().unwrap_or("none");
        ensure(
            media_type(actual).eq_ignore_ascii_case(JSON_CONTENT_TYPE),
            &format!("{step} Content-Type"),
            JSON_CONTENT_TYPE,
            actual,
        )?;
    }
    Ok(())
}

fn listing_describes_subfolders(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let client = env.ctx.read_write();
    let fixture = env.fixtures.nested();
    let sub = format!("{}sub/", fixture.folder());
    env.put(&client, &format!("{sub}{}", fixture.id), &fixture.body())?;

    let folder = fixture.folder();
    let (_, listing) = env.list(&client, &folder)?;
    let step = format!("GET {folder} entry sub/");
    let entry = listing
        .get("sub/")
        .ok_or_else(|| fail(&step, "an entry named sub/", entry_names(&listing)))?;

    let ListingEntry::Folder {
        etag,
        has_content_metadata,
    } = entry
    else {
        return Err(fail(&step, "a folder entry", "a document entry"));
    };
    ensure(
        !has_content_metadata,
        &step,
        "only an ETag",
        "Content-Length or Content-Type",
    )?;

    let Some(etag) = etag else {
        if env.policy().requires_folder_etag() {
            return Err(fail(&step, "an ETag", "none"));
        }
        return Ok(());
    };
    ensure(
        env.policy().name_valid(etag),
        &step,
        format!("version token in draft {} syntax", env.policy().version),
        etag,
    )?;

    let resp = client.get(&sub, &[])?;
    expect_status(&format!("GET {sub}"), &resp, &[200])?;
    if let Some(header) = resp.etag() {
        ensure(
            env.policy().entry_matches_etag(etag, header),
            &step,
            format!("the ETag of GET {sub} ({header})"),
            etag,
        )?;
    }
    Ok(())
}

fn missing_folder_is_absent_or_empty(env: &mut CaseEnv<'_>) -> Result<(), CaseError> {
    let fixture = env.fixtures.nested();
    let folder = fixture.folder();
    let step = format!("GET missing {folder}");
    let resp = env.ctx.read_write().get(&folder, &[])?;
    match resp.status {
        404 => Ok(()),
        200 => {
            let listing = Listing::parse(env.policy(), resp.body())?;
            ensure(listing.is_empty(), &step, "an empty listing", entry_names(&listing))
        }
        other => Err(fail(&step, "HTTP 404 or an empty listing", format!("HTTP {other}"))),
    }
}

fn entry_names(listing: &Listing) -> String {
    if listing.is_empty() {
        return "no entries".to_owned();
    }
    listing.entries.keys().cloned().collect::<Vec<_>>().join(", ")
}
