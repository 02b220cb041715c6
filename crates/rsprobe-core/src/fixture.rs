//! Per-case test data: object ids, document bodies, CORS origins.
//!
//! Ids are `{run}{n}` where `run` is a hash of the start time and process id
//! and `n` a per-run counter, so no two fixtures of a run collide and
//! separate runs against the same account never reuse a path.

use rsprobe_client::Body;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct FixtureGenerator {
    run: String,
    counter: AtomicU64,
}

impl Default for FixtureGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureGenerator {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let seed = format!(
            "{}:{}",
            now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros()),
            std::process::id()
        );
        Self::with_seed(&seed)
    }

    /// A generator whose ids derive from `seed`.
    pub fn with_seed(seed: &str) -> Self {
        let hash = blake3::hash(seed.as_bytes()).to_hex();
        Self {
            run: hash[..10].to_owned(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run
    }

    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{n:x}", self.run)
    }

    /// A document directly under the scope root.
    pub fn flat(&self) -> Fixture {
        Fixture {
            id: self.next_id(),
            folder_depth: 0,
        }
    }

    /// A document inside its own folder.
    pub fn nested(&self) -> Fixture {
        Fixture {
            id: self.next_id(),
            folder_depth: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub id: String,
    pub folder_depth: u8,
}

impl Fixture {
    /// Document path relative to the scope: `{id}` or `{id}/{id}`.
    pub fn path(&self) -> String {
        if self.folder_depth == 0 {
            self.id.clone()
        } else {
            format!("{}/{}", self.id, self.id)
        }
    }

    /// The fixture's own folder, `{id}/`.
    pub fn folder(&self) -> String {
        format!("{}/", self.id)
    }

    /// Another document next to `path()`.
    pub fn sibling(&self, name: &str) -> String {
        if self.folder_depth == 0 {
            format!("{}-{name}", self.id)
        } else {
            format!("{}/{name}", self.id)
        }
    }

    pub fn document(&self) -> Value {
        json!({ "id": self.id })
    }

    pub fn body(&self) -> Body {
        Body::Json(self.document())
    }

    /// A second document, distinct from `document()`.
    pub fn revised_body(&self) -> Body {
        Body::Json(json!({ "id": self.id, "revision": 2 }))
    }

    pub fn binary(&self) -> Body {
        let mut data = blake3::hash(self.id.as_bytes()).as_bytes().to_vec();
        data.extend_from_slice(&[0x00, 0xff, 0xfe, 0x80]);
        Body::binary("application/octet-stream", data)
    }

    pub fn origin(&self) -> String {
        format!("https://{}.example", self.id)
    }
}
