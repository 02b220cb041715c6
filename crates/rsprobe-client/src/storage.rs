use crate::{ClientError, Operation, ResponseEnvelope};
use rsprobe_policy::compose_url;
use tracing::debug;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A PUT payload.
///
/// `Json` is serialized and sent as `application/json`. `Binary` bytes are
/// sent unmodified under the given content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Binary { content_type: String, data: Vec<u8> },
}

impl Body {
    pub fn json(value: &impl serde::Serialize) -> Result<Self, ClientError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }

    pub fn binary(content_type: &str, data: impl Into<Vec<u8>>) -> Self {
        Body::Binary {
            content_type: content_type.to_owned(),
            data: data.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            Body::Json(_) => JSON_CONTENT_TYPE,
            Body::Binary { content_type, .. } => content_type,
        }
    }

    /// The exact bytes that go on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClientError> {
        match self {
            Body::Json(value) => {
                serde_json::to_vec(value).map_err(|e| ClientError::Serialization(e.to_string()))
            }
            Body::Binary { data, .. } => Ok(data.clone()),
        }
    }
}

/// Storage endpoint client bound to one base URL, scope and token.
///
/// Requests go to `{base_url}/{scope}/{path}`. The `with_*` methods return
/// derived copies; a client is never changed in place.
#[derive(Clone)]
pub struct StorageClient {
    base_url: String,
    scope: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url)
            .field("scope", &self.scope)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    pub fn new(base_url: &str, scope: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            scope: scope.to_owned(),
            token: token.map(str::to_owned),
            agent: crate::agent(),
        }
    }

    #[must_use]
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            token: token.map(str::to_owned),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_scope(&self, scope: &str) -> Self {
        Self {
            scope: scope.to_owned(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_base_url(&self, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        compose_url(&self.base_url, &self.scope, path)
    }

    pub fn get(&self, path: &str, headers: &[(&str, &str)]) -> Result<ResponseEnvelope, ClientError> {
        self.send(Operation::Get, path, None, headers)
    }

    pub fn put(
        &self,
        path: &str,
        body: &Body,
        headers: &[(&str, &str)],
    ) -> Result<ResponseEnvelope, ClientError> {
        self.send(Operation::Put, path, Some(body), headers)
    }

    pub fn delete(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<ResponseEnvelope, ClientError> {
        self.send(Operation::Delete, path, None, headers)
    }

    pub fn head(&self, path: &str, headers: &[(&str, &str)]) -> Result<ResponseEnvelope, ClientError> {
        self.send(Operation::Head, path, None, headers)
    }

    pub fn options(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<ResponseEnvelope, ClientError> {
        self.send(Operation::Options, path, None, headers)
    }

    /// Issue `op` against `path`. A PUT without a body sends an empty JSON
    /// object; bodies on other operations are ignored.
    pub fn send(
        &self,
        op: Operation,
        path: &str,
        body: Option<&Body>,
        headers: &[(&str, &str)],
    ) -> Result<ResponseEnvelope, ClientError> {
        let url = self.url(path);
        debug!("{op} {url}");

        let result = match op {
            Operation::Get => self.decorate(self.agent.get(url.as_str()), headers).call(),
            Operation::Delete => self.decorate(self.agent.delete(url.as_str()), headers).call(),
            Operation::Head => self.decorate(self.agent.head(url.as_str()), headers).call(),
            Operation::Options => self.decorate(self.agent.options(url.as_str()), headers).call(),
            Operation::Put => {
                let empty = Body::Json(serde_json::json!({}));
                let body = body.unwrap_or(&empty);
                let data = body.to_bytes()?;
                let mut req = self.agent.put(url.as_str());
                if !has_header(headers, "content-type") {
                    req = req.header("Content-Type", body.content_type());
                }
                self.decorate(req, headers).send(&data[..])
            }
        };

        let resp = result.map_err(|e| ClientError::Transport(format!("{op} {url}: {e}")))?;
        let envelope = ResponseEnvelope::from_http(resp)?;
        debug!("{op} {url} -> {}", envelope.status);
        Ok(envelope)
    }

    fn decorate<B>(
        &self,
        mut req: ureq::RequestBuilder<B>,
        headers: &[(&str, &str)],
    ) -> ureq::RequestBuilder<B> {
        if let Some(ref token) = self.token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req
    }
}

fn has_header(headers: &[(&str, &str)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}
