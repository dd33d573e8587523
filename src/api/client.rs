//! Authenticated HTTP client for the platform REST API
//!
//! Wraps reqwest::Client with bearer-token injection and status checking.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::auth::SessionContext;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("401 Unauthorized for {url}. Session may be invalid -- run 'debra-cli login'.")]
    Unauthorized { url: String },
    #[error("{detail}")]
    Status {
        status: u16,
        url: String,
        detail: String,
    },
    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Not logged in. Run 'debra-cli login' first.")]
    NotAuthenticated,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Upper bound for a single request, so a hung backend cannot stall the TUI queue.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client bound to one backend and, optionally, one bearer token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Client carrying the token of the given session (if any).
    pub fn for_session(base_url: impl Into<String>, session: &SessionContext) -> Self {
        Self::new(base_url, session.token().map(String::from))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Fail early for endpoints that make no sense without a session.
    pub fn require_token(&self) -> Result<(), ApiError> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request, attaching `Authorization: Bearer` when a token is held.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let resp = builder.send().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;

        check_response(resp, &url).await
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = resp.url().to_string();
        resp.json::<T>().await.map_err(|source| {
            tracing::debug!("Decoding {} failed", path);
            ApiError::Decode { url, source }
        })
    }

    /// GET and decode a JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(self.request(Method::GET, path), &Method::GET, path)
            .await?;
        Self::decode(resp, path).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        let resp = self.send(builder, &Method::POST, path).await?;
        Self::decode(resp, path).await
    }

    /// POST without a body; the reply is checked but not decoded.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, path), &Method::POST, path)
            .await?;
        Ok(())
    }

    /// PUT a JSON body and decode the JSON reply.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        let resp = self.send(builder, &Method::PUT, path).await?;
        Self::decode(resp, path).await
    }

    /// PUT a JSON body; the reply is checked but not decoded.
    pub async fn put_checked<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(builder, &Method::PUT, path).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers `{"detail": "..."}` for most errors, `{"error": "..."}`
/// for payment failures, and a list of field errors for validation failures.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("error"))?;
    match field {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(
    resp: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .unwrap_or_else(|| format!("HTTP {} for {}: {}", status.as_u16(), url, body));
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            detail,
        });
    }
    Ok(resp)
}

/// Minimal HTTP responder for contract tests: serves canned replies to
/// consecutive connections and hands back the raw requests it saw.
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve `replies` in order, one per connection.
    pub async fn serve(replies: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        serve_delayed(std::time::Duration::ZERO, replies).await
    }

    /// Like `serve`, but hold each reply back for `delay` after the request.
    pub async fn serve_delayed(
        delay: std::time::Duration,
        replies: Vec<(u16, String)>,
    ) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut stream).await);
                tokio::time::sleep(delay).await;
                let resp = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(resp.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
            seen
        });

        (base, handle)
    }

    /// A base URL nothing is listening on.
    pub async fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}
