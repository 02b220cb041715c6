use crate::ClientError;
use std::collections::BTreeMap;
use std::io::Read;

/// Status, headers and body of one storage response.
///
/// Header names are stored lowercased, so lookups are case-insensitive.
/// Repeated headers are joined with `", "`. The body is read eagerly and
/// decoded only when `text()` or `json()` is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl ResponseEnvelope {
    pub fn new(status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> Self {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            insert_header(&mut map, name, value);
        }
        Self {
            status,
            headers: map,
            body: body.into(),
        }
    }

    pub(crate) fn from_http(resp: ureq::http::Response<ureq::Body>) -> Result<Self, ClientError> {
        let status = resp.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in resp.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            insert_header(&mut headers, name.as_str(), &value);
        }

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| ClientError::Transport(format!("reading response body: {e}")))?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Result<&str, ClientError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| ClientError::Serialization(format!("response body is not UTF-8: {e}")))
    }

    pub fn json(&self) -> Result<serde_json::Value, ClientError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ClientError::Serialization(format!("response body is not JSON: {e}")))
    }
}

fn insert_header(map: &mut BTreeMap<String, String>, name: &str, value: &str) {
    map.entry(name.to_ascii_lowercase())
        .and_modify(|existing| {
            existing.push_str(", ");
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_owned());
}
