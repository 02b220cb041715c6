//! Folder description parsing.
//!
//! Drafts 00 and 01 return a flat JSON object mapping names to version
//! tokens (or nested objects for folders). Draft 02 onward wraps the entries
//! in `items` next to an `@context` URI and attaches content metadata to
//! documents.

use crate::{ListingShape, PolicyError, VersionPolicy};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const FOLDER_DESCRIPTION_CONTEXT: &str = "http://remotestorage.io/spec/folder-description";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Document {
        etag: String,
        content_length: Option<u64>,
        content_type: Option<String>,
    },
    Folder {
        /// `None` when a flat listing nests the folder's children inline.
        etag: Option<String>,
        /// Set when the entry carries `Content-Length` or `Content-Type`.
        has_content_metadata: bool,
    },
}

impl ListingEntry {
    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Document { etag, .. } => Some(etag),
            Self::Folder { etag, .. } => etag.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub context: Option<String>,
    pub entries: BTreeMap<String, ListingEntry>,
}

impl Listing {
    /// Parse a listing body in the envelope `policy` expects.
    pub fn parse(policy: &VersionPolicy, body: &[u8]) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PolicyError::MalformedListing(format!("invalid JSON: {e}")))?;
        let Value::Object(root) = value else {
            return Err(PolicyError::MalformedListing(
                "top level is not an object".to_owned(),
            ));
        };

        match policy.listing_shape {
            ListingShape::FlatMap => Ok(Self {
                context: None,
                entries: parse_flat(&root)?,
            }),
            ListingShape::ItemsWrapped => {
                let context = root
                    .get("@context")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let items = match root.get("items") {
                    Some(Value::Object(items)) => items,
                    Some(_) => {
                        return Err(PolicyError::MalformedListing(
                            "items is not an object".to_owned(),
                        ))
                    }
                    None => {
                        return Err(PolicyError::MalformedListing(
                            "missing items member".to_owned(),
                        ))
                    }
                };
                Ok(Self {
                    context,
                    entries: parse_items(items)?,
                })
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ListingEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        // Draft 00 servers emit millisecond timestamps as numbers.
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_flat(root: &Map<String, Value>) -> Result<BTreeMap<String, ListingEntry>, PolicyError> {
    let mut entries = BTreeMap::new();
    for (name, value) in root {
        let entry = if name.ends_with('/') {
            match value {
                Value::Object(_) => ListingEntry::Folder {
                    etag: None,
                    has_content_metadata: false,
                },
                other => ListingEntry::Folder {
                    etag: Some(token(other).ok_or_else(|| bad_entry(name))?),
                    has_content_metadata: false,
                },
            }
        } else {
            ListingEntry::Document {
                etag: token(value).ok_or_else(|| bad_entry(name))?,
                content_length: None,
                content_type: None,
            }
        };
        entries.insert(name.clone(), entry);
    }
    Ok(entries)
}

fn parse_items(items: &Map<String, Value>) -> Result<BTreeMap<String, ListingEntry>, PolicyError> {
    let mut entries = BTreeMap::new();
    for (name, value) in items {
        let Value::Object(fields) = value else {
            return Err(bad_entry(name));
        };
        let etag = fields.get("ETag").and_then(token);
        let content_length = fields.get("Content-Length").and_then(Value::as_u64);
        let content_type = fields
            .get("Content-Type")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let entry = if name.ends_with('/') {
            ListingEntry::Folder {
                etag,
                has_content_metadata: fields.contains_key("Content-Length")
                    || fields.contains_key("Content-Type"),
            }
        } else {
            ListingEntry::Document {
                etag: etag.ok_or_else(|| bad_entry(name))?,
                content_length,
                content_type,
            }
        };
        entries.insert(name.clone(), entry);
    }
    Ok(entries)
}

fn bad_entry(name: &str) -> PolicyError {
    PolicyError::MalformedListing(format!("entry '{name}' has no usable ETag"))
}
