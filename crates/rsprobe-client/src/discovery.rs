//! WebFinger discovery of a remoteStorage account.
//!
//! `GET {server}/.well-known/webfinger?resource=acct:{account}@{host}` returns
//! a JRD document. The storage link is the one whose `rel` is the short
//! (`remotestorage`) or long (`http://tools.ietf.org/id/draft-dejong-remotestorage`)
//! relation; its `href` is the storage root. Older drafts put the version
//! in the link's `type`, newer ones in the `http://remotestorage.io/spec/version`
//! property.

use crate::DiscoveryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::debug;
use url::Url;

pub const WEBFINGER_PATH: &str = "/.well-known/webfinger";
pub const LINK_REL_SHORT: &str = "remotestorage";
pub const LINK_REL_LONG: &str = "http://tools.ietf.org/id/draft-dejong-remotestorage";
pub const VERSION_PROPERTY: &str = "http://remotestorage.io/spec/version";
pub const AUTH_PROPERTY: &str = "http://tools.ietf.org/html/rfc6749#section-4.2";
const LEGACY_AUTH_PROPERTY: &str = "auth-endpoint";
const VERSION_TAG: &str = "draft-dejong-remotestorage-";

#[derive(Debug, Deserialize)]
struct Jrd {
    #[serde(default)]
    links: Vec<JrdLink>,
}

#[derive(Debug, Deserialize)]
struct JrdLink {
    #[serde(default)]
    rel: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default, rename = "type")]
    link_type: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

/// What discovery learned about a storage account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub href: String,
    /// `None` when the server declares no draft version.
    pub version: Option<u32>,
    pub auth_endpoint: Option<String>,
}

/// The `acct:` resource for `account` on `server`'s host. A full `user@host`
/// account is used as given.
pub fn account_resource(server: &str, account: &str) -> Result<String, DiscoveryError> {
    if account.contains('@') {
        return Ok(format!("acct:{account}"));
    }
    let parsed = Url::parse(server).map_err(|e| DiscoveryError::InvalidServer {
        url: server.to_owned(),
        reason: e.to_string(),
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| DiscoveryError::InvalidServer {
            url: server.to_owned(),
            reason: "no host".to_owned(),
        })?;
    Ok(format!("acct:{account}@{host}"))
}

pub fn webfinger_url(server: &str, account: &str) -> Result<String, DiscoveryError> {
    let resource = account_resource(server, account)?;
    let base = format!("{}{WEBFINGER_PATH}", server.trim_end_matches('/'));
    let mut url = Url::parse(&base).map_err(|e| DiscoveryError::InvalidServer {
        url: server.to_owned(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("resource", &resource);
    Ok(url.into())
}

/// Extract the draft number from a `draft-dejong-remotestorage-NN` tag.
/// Returns `Ok(None)` when the tag does not name a draft at all.
pub fn parse_version_tag(tag: &str) -> Result<Option<u32>, DiscoveryError> {
    let Some(idx) = tag.find(VERSION_TAG) else {
        return Ok(None);
    };
    let digits: String = tag[idx + VERSION_TAG.len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits
        .parse()
        .map(Some)
        .map_err(|_| DiscoveryError::MalformedVersion(tag.to_owned()))
}

fn is_storage_rel(rel: &str) -> bool {
    rel.eq_ignore_ascii_case(LINK_REL_SHORT) || rel == LINK_REL_LONG
}

pub fn parse_webfinger(body: &[u8], resource: &str) -> Result<Discovery, DiscoveryError> {
    let jrd: Jrd =
        serde_json::from_slice(body).map_err(|e| DiscoveryError::InvalidDocument(e.to_string()))?;

    let link = jrd
        .links
        .into_iter()
        .find(|l| is_storage_rel(&l.rel) && l.href.is_some())
        .ok_or_else(|| DiscoveryError::NoStorageLink(resource.to_owned()))?;

    let mut version = match link.link_type.as_deref() {
        Some(t) => parse_version_tag(t)?,
        None => None,
    };
    if version.is_none() {
        if let Some(tag) = link.properties.get(VERSION_PROPERTY).and_then(Value::as_str) {
            version = parse_version_tag(tag)?;
        }
    }

    let auth_endpoint = [AUTH_PROPERTY, LEGACY_AUTH_PROPERTY]
        .iter()
        .find_map(|key| link.properties.get(*key).and_then(Value::as_str))
        .map(str::to_owned);

    Ok(Discovery {
        href: link.href.unwrap_or_default(),
        version,
        auth_endpoint,
    })
}

/// Look up `account` on `server`. Nothing is cached.
pub fn discover(server: &str, account: &str) -> Result<Discovery, DiscoveryError> {
    let url = webfinger_url(server, account)?;
    let resource = account_resource(server, account)?;
    debug!("GET {url}");

    let resp = crate::agent()
        .get(url.as_str())
        .header("Accept", "application/jrd+json, application/json")
        .call()
        .map_err(|e| DiscoveryError::Transport(format!("{url}: {e}")))?;

    let status = resp.status().as_u16();
    if status != 200 {
        return Err(DiscoveryError::Status { url, status });
    }

    let mut body = Vec::new();
    resp.into_body()
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| DiscoveryError::Transport(e.to_string()))?;

    let found = parse_webfinger(&body, &resource)?;
    debug!(
        "discovered {} (version {:?}) for {resource}",
        found.href, found.version
    );
    Ok(found)
}
