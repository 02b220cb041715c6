//! In-process remoteStorage server for driving the suite in tests.
//!
//! Serves WebFinger and one storage account over `tiny_http` on a random
//! port, behaving as the configured draft requires. `Faults` switch off
//! individual behaviors so failure reporting can be tested too.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rsprobe_client::{SuiteConfig, Tokens};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Request, Response, Server};

pub const ACCOUNT: &str = "alice";
pub const SCOPE: &str = "api-test-suite";
pub const TOKEN_RW: &str = "token-read-write";
pub const TOKEN_RO: &str = "token-read-only";
pub const TOKEN_GLOBAL: &str = "token-global";

const DENIED_BODY: &[u8] = b"Unauthorized";
const FORBIDDEN_BODY: &[u8] = b"Forbidden";
const FOLDER_CONTEXT: &str = "http://remotestorage.io/spec/folder-description";

#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// Skip every token check.
    pub open_access: bool,
    /// Keep a document's ETag when it is overwritten.
    pub frozen_etags: bool,
    /// Never send CORS headers.
    pub no_cors: bool,
    /// Report a longer `Content-Length` on HEAD than GET sends.
    pub wrong_head_length: bool,
    /// Send a folder `ETag` no draft accepts.
    pub bad_folder_etag: bool,
    /// Store documents over folders and beneath documents.
    pub no_conflict: bool,
    /// Store `Content-Range` PUTs instead of rejecting them.
    pub accept_content_range: bool,
    /// Deny empty public folders with a different body.
    pub leaky_public_listing: bool,
    pub no_last_modified: bool,
    /// Send `Last-Modified` in RFC 850 form.
    pub rfc850_last_modified: bool,
    /// Send `Last-Modified` an hour in the past.
    pub stale_last_modified: bool,
    pub no_expires: bool,
    pub no_cache_control: bool,
    /// Send the draft 00 flat map whatever the version.
    pub flat_listing: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub version: u32,
    /// Whether WebFinger names the draft version.
    pub announce_version: bool,
    pub faults: Faults,
}

impl Options {
    pub fn version(version: u32) -> Self {
        Self {
            version,
            announce_version: true,
            faults: Faults::default(),
        }
    }
}

struct Doc {
    data: Vec<u8>,
    content_type: String,
    version: u64,
    modified: DateTime<Utc>,
}

#[derive(Default)]
struct Store {
    docs: BTreeMap<String, Doc>,
    counter: u64,
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }
}

struct Incoming {
    method: Method,
    path: String,
    query: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Incoming {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn is_write(&self) -> bool {
        matches!(self.method, Method::Put | Method::Delete)
    }
}

pub struct FixtureServer {
    pub url: String,
    pub storage_url: String,
    options: Options,
    server: Arc<Server>,
}

impl FixtureServer {
    pub fn start(version: u32) -> Self {
        Self::start_with(Options::version(version))
    }

    pub fn start_with(options: Options) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let storage_url = format!("{url}/storage/{ACCOUNT}");

        let srv = Arc::clone(&server);
        let base = storage_url.clone();
        let store = Mutex::new(Store::default());
        std::thread::spawn(move || {
            for req in srv.incoming_requests() {
                handle(&store, &options, &base, req);
            }
        });

        Self {
            url,
            storage_url,
            options,
            server,
        }
    }

    /// A config with every token and no version override.
    pub fn config(&self) -> SuiteConfig {
        SuiteConfig {
            servers: vec![self.url.clone()],
            account: ACCOUNT.to_owned(),
            scope: SCOPE.to_owned(),
            tokens: Tokens {
                read_write: Some(TOKEN_RW.to_owned()),
                read_only: Some(TOKEN_RO.to_owned()),
                global: Some(TOKEN_GLOBAL.to_owned()),
            },
            spec_version: None,
        }
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn handle(store: &Mutex<Store>, options: &Options, base: &str, mut req: Request) {
    let mut body = Vec::new();
    let _ = req.as_reader().read_to_end(&mut body);
    let (path, query) = match req.url().split_once('?') {
        Some((p, q)) => (p.to_owned(), q.to_owned()),
        None => (req.url().to_owned(), String::new()),
    };
    let incoming = Incoming {
        method: req.method().clone(),
        path,
        query,
        headers: req
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_owned(), h.value.as_str().to_owned()))
            .collect(),
        body,
    };

    let reply = if incoming.path == "/.well-known/webfinger" {
        webfinger(options, base, &incoming)
    } else if let Some(rest) = incoming.path.strip_prefix("/storage/") {
        let rest = rest.to_owned();
        let mut reply = storage(store, options, &incoming, &rest);
        if !options.faults.no_cors {
            if let Some(origin) = incoming.header("Origin") {
                reply = reply
                    .header("Access-Control-Allow-Origin", origin)
                    .header(
                        "Access-Control-Expose-Headers",
                        "ETag, Content-Length, Content-Type, Last-Modified",
                    );
            }
        }
        reply
    } else {
        Reply::new(404, "not found")
    };

    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    for (name, value) in reply.headers {
        response = response.with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap());
    }
    let _ = req.respond(response);
}

fn webfinger(options: &Options, base: &str, req: &Incoming) -> Reply {
    let parsed = url::Url::parse(&format!("http://localhost/?{}", req.query)).unwrap();
    let resource = parsed
        .query_pairs()
        .find(|(k, _)| k == "resource")
        .map(|(_, v)| v.into_owned());
    let expected = format!("acct:{ACCOUNT}@127.0.0.1");
    if resource.as_deref() != Some(expected.as_str()) {
        return Reply::new(404, "unknown resource");
    }

    let tag = format!("draft-dejong-remotestorage-{:02}", options.version);
    let root = base.trim_end_matches(&format!("/storage/{ACCOUNT}")).to_owned();
    let auth = format!("{root}/oauth/{ACCOUNT}");
    let link = match (options.announce_version, options.version) {
        (false, _) => json!({ "rel": "remotestorage", "href": base }),
        (true, v) if v < 6 => json!({
            "rel": "remotestorage",
            "href": base,
            "type": tag,
            "properties": { "auth-endpoint": auth },
        }),
        (true, _) => json!({
            "rel": "http://tools.ietf.org/id/draft-dejong-remotestorage",
            "href": base,
            "properties": {
                "http://remotestorage.io/spec/version": tag,
                "http://tools.ietf.org/html/rfc6749#section-4.2": auth,
            },
        }),
    };
    let doc = json!({ "subject": expected, "links": [link] });
    Reply::new(200, serde_json::to_vec(&doc).unwrap()).header("Content-Type", "application/jrd+json")
}

/// `Err` carries the denial status.
fn authorize(options: &Options, req: &Incoming, rest: &str) -> Result<(), u16> {
    if options.faults.open_access {
        return Ok(());
    }
    let is_folder = rest.is_empty() || rest.ends_with('/');
    if rest.starts_with("public/") && !is_folder && matches!(req.method, Method::Get | Method::Head) {
        return Ok(());
    }
    let token = req
        .header("Authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(401u16)?;
    let (scope, writable) = match token {
        TOKEN_GLOBAL => ("", true),
        TOKEN_RW => (SCOPE, true),
        TOKEN_RO => (SCOPE, false),
        _ => return Err(401),
    };
    let covered = scope.is_empty()
        || rest.starts_with(&format!("{scope}/"))
        || rest.starts_with(&format!("public/{scope}/"));
    if !covered || (req.is_write() && !writable) {
        return Err(403);
    }
    Ok(())
}

fn storage(store: &Mutex<Store>, options: &Options, req: &Incoming, rest: &str) -> Reply {
    if req.method == Method::Options {
        let reply = Reply::new(204, Vec::new());
        if options.faults.no_cors {
            return reply;
        }
        return reply
            .header("Access-Control-Allow-Methods", "GET, PUT, DELETE, HEAD, OPTIONS")
            .header(
                "Access-Control-Allow-Headers",
                "Authorization, Content-Length, Content-Type, Origin, X-Requested-With, If-Match, If-None-Match",
            )
            .header("Access-Control-Max-Age", "600");
    }

    let (user, path) = rest.split_once('/').unwrap_or((rest, ""));
    if user != ACCOUNT {
        return Reply::new(401, DENIED_BODY);
    }
    match authorize(options, req, path) {
        Err(401)
            if options.faults.leaky_public_listing
                && path.starts_with("public/")
                && path.ends_with('/') =>
        {
            let empty = folder_token(&store.lock().unwrap(), path).is_none();
            let body: &[u8] = if empty { b"Unauthorized: no such folder" } else { DENIED_BODY };
            return Reply::new(401, body);
        }
        Err(401) => return Reply::new(401, DENIED_BODY),
        Err(status) => return Reply::new(status, FORBIDDEN_BODY),
        Ok(()) => {}
    }

    let mut store = store.lock().unwrap();
    let is_folder = path.is_empty() || path.ends_with('/');
    match (&req.method, is_folder) {
        (Method::Get | Method::Head, true) => get_folder(&store, options, req, path),
        (Method::Get | Method::Head, false) => get_document(&store, options, req, path),
        (Method::Put, false) => put_document(&mut store, options, req, path),
        (Method::Delete, false) => delete_document(&mut store, options, req, path),
        _ => Reply::new(405, "method not allowed"),
    }
}

fn format_etag(version: u32, token: u64) -> String {
    if version == 0 {
        token.to_string()
    } else {
        format!("\"{token}\"")
    }
}

fn if_none_match(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|v| v == "*" || v == etag)
}

fn get_document(store: &Store, options: &Options, req: &Incoming, path: &str) -> Reply {
    let v = options.version;
    let Some(doc) = store.docs.get(path) else {
        return Reply::new(404, "not found");
    };
    let etag = format_etag(v, doc.version);
    if v >= 2 {
        if let Some(header) = req.header("If-None-Match") {
            if if_none_match(header, &etag) {
                return Reply::new(304, Vec::new()).header("ETag", etag);
            }
        }
    }

    let faults = &options.faults;
    let mut data = doc.data.clone();
    if faults.wrong_head_length && req.method == Method::Head {
        // tiny_http sizes Content-Length from the data and sends no body on HEAD.
        data.extend_from_slice(b"padding");
    }
    let mut reply = Reply::new(200, data)
        .header("Content-Type", doc.content_type.clone())
        .header("ETag", etag);
    if v >= 6 {
        if !faults.no_cache_control {
            reply = reply.header("Cache-Control", "no-cache");
        }
    } else if v >= 2 && !faults.no_expires {
        reply = reply.header("Expires", "0");
    }
    if v >= 11 && !faults.no_last_modified {
        let modified = if faults.stale_last_modified {
            doc.modified - chrono::Duration::hours(1)
        } else {
            doc.modified
        };
        let format = if faults.rfc850_last_modified {
            "%A, %d-%b-%y %H:%M:%S GMT"
        } else {
            "%a, %d %b %Y %H:%M:%S GMT"
        };
        reply = reply.header("Last-Modified", modified.format(format).to_string());
    }
    reply
}

/// Version token of a folder: a digest of every document beneath it.
fn folder_token(store: &Store, prefix: &str) -> Option<u64> {
    let mut hasher = blake3::Hasher::new();
    let mut any = false;
    for (path, doc) in store.docs.range(prefix.to_owned()..) {
        if !path.starts_with(prefix) {
            break;
        }
        any = true;
        hasher.update(path.as_bytes());
        hasher.update(&doc.version.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    any.then(|| u64::from_le_bytes(bytes) % 1_000_000_000_000)
}

fn get_folder(store: &Store, options: &Options, req: &Incoming, prefix: &str) -> Reply {
    let v = options.version;
    let Some(token) = folder_token(store, prefix) else {
        return if v >= 2 {
            Reply::new(404, "not found")
        } else {
            Reply::new(200, b"{}".to_vec()).header("Content-Type", "application/json")
        };
    };
    let etag = if options.faults.bad_folder_etag {
        format!("bad etag {token} \"")
    } else {
        format_etag(v, token)
    };
    if v >= 2 {
        if let Some(header) = req.header("If-None-Match") {
            if if_none_match(header, &etag) {
                return Reply::new(304, Vec::new()).header("ETag", etag);
            }
        }
    }

    let mut entries = Map::new();
    for (path, doc) in store.docs.range(prefix.to_owned()..) {
        let Some(tail) = path.strip_prefix(prefix) else {
            break;
        };
        let (name, entry) = match tail.split_once('/') {
            Some((dir, _)) => {
                let name = format!("{dir}/");
                if entries.contains_key(&name) {
                    continue;
                }
                let sub = folder_token(store, &format!("{prefix}{name}")).unwrap_or_default();
                let entry = if v >= 2 {
                    json!({ "ETag": sub.to_string() })
                } else {
                    Value::String(sub.to_string())
                };
                (name, entry)
            }
            None => {
                let entry = match v {
                    0 => json!(doc.version),
                    1 => Value::String(doc.version.to_string()),
                    _ => json!({
                        "ETag": doc.version.to_string(),
                        "Content-Type": doc.content_type,
                        "Content-Length": doc.data.len(),
                    }),
                };
                (tail.to_owned(), entry)
            }
        };
        entries.insert(name, entry);
    }

    let (body, content_type) = if options.faults.flat_listing {
        (Value::Object(entries), "application/json")
    } else if v >= 2 {
        (
            json!({ "@context": FOLDER_CONTEXT, "items": entries }),
            "application/ld+json",
        )
    } else {
        (Value::Object(entries), "application/json")
    };
    Reply::new(200, serde_json::to_vec(&body).unwrap())
        .header("Content-Type", content_type)
        .header("ETag", etag)
}

fn put_document(store: &mut Store, options: &Options, req: &Incoming, path: &str) -> Reply {
    let v = options.version;
    let existing = store.docs.get(path).map(|d| format_etag(v, d.version));

    if v >= 2 {
        if req.header("If-None-Match") == Some("*") && existing.is_some() {
            return Reply::new(412, "precondition failed");
        }
        if let Some(expected) = req.header("If-Match") {
            if existing.as_deref() != Some(expected) {
                return Reply::new(412, "precondition failed");
            }
        }
        if req.header("Content-Range").is_some() && !options.faults.accept_content_range {
            return Reply::new(400, "Content-Range is not supported");
        }
        let folder_exists = store
            .docs
            .range(format!("{path}/")..)
            .next()
            .is_some_and(|(p, _)| p.starts_with(&format!("{path}/")));
        let beneath_document = path
            .match_indices('/')
            .any(|(idx, _)| store.docs.contains_key(&path[..idx]));
        if (folder_exists || beneath_document) && !options.faults.no_conflict {
            return Reply::new(409, "conflict");
        }
    }

    store.counter += 1;
    let version = match store.docs.get(path) {
        Some(doc) if options.faults.frozen_etags => doc.version,
        _ => store.counter,
    };
    let content_type = req
        .header("Content-Type")
        .unwrap_or("application/octet-stream")
        .to_owned();
    store.docs.insert(
        path.to_owned(),
        Doc {
            data: req.body.clone(),
            content_type,
            version,
            modified: Utc::now(),
        },
    );
    let status = if existing.is_some() { 200 } else { 201 };
    Reply::new(status, Vec::new()).header("ETag", format_etag(v, version))
}

fn delete_document(store: &mut Store, options: &Options, req: &Incoming, path: &str) -> Reply {
    let v = options.version;
    let existing = store.docs.get(path).map(|d| format_etag(v, d.version));
    if v >= 2 {
        if let Some(expected) = req.header("If-Match") {
            if existing.as_deref() != Some(expected) {
                return Reply::new(412, "precondition failed");
            }
        }
    }
    match existing {
        Some(etag) => {
            store.docs.remove(path);
            Reply::new(200, Vec::new()).header("ETag", etag)
        }
        None => Reply::new(404, "not found"),
    }
}
