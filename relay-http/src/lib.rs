//! Minimal HTTP client with safe logging and explicit timeouts.
//!
//! - Request options: absolute URLs, secret URLs
//! - `get_text` for pages and `post_json_text` for JSON payloads
//! - Never logs the path or query of a request marked `sensitive`
//! - Optional *raw* request/response logging via `RELAY_HTTP_RAW=1`
//!
//! There is no retry loop: a failed request is reported once and the caller
//! decides what to do with it.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), relay_http::HttpError> {
//! let client = relay_http::HttpClient::new("https://chat.stackoverflow.com")?;
//! let page = client
//!     .get_text("transcript/11/2024/05/01", relay_http::RequestOpts::default())
//!     .await?;
//! # let _ = page;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `RELAY_HTTP_RAW=1`.

use relay_common::RelayError;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "RELAY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

const USER_AGENT: &str = concat!("room-relay/", env!("CARGO_PKG_VERSION"));

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug.
fn make_curl(method: &Method, shown_url: &str, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            parts.push("-H 'content-type: application/json'".to_string());
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                truncate_on_char(&mut s, RAW_MAX_BODY);
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{}'", shown_url));
    parts.join(" ")
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl From<HttpError> for RelayError {
    fn from(err: HttpError) -> Self {
        RelayError::Transport(err.to_string())
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request knobs. The timeout is client-wide, see [`HttpClient::with_timeout`].
///
/// ```
/// use relay_http::RequestOpts;
///
/// let opts = RequestOpts {
///     sensitive: true,
///     ..Default::default()
/// };
///
/// assert!(opts.sensitive);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestOpts {
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
    /// The URL itself is a secret (e.g. a webhook); log the host only.
    pub sensitive: bool,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use relay_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://chat.stackoverflow.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use relay_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://chat.stackoverflow.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a page and return the body as text (lossy UTF-8).
    pub async fn get_text(&self, path: &str, opts: RequestOpts) -> Result<String, HttpError> {
        let bytes = self
            .request_internal::<()>(Method::GET, path, None, opts)
            .await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// POST JSON and return the response body as text.
    ///
    /// Webhooks commonly answer with a plain `ok`, which is not JSON.
    pub async fn post_json_text<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts,
    ) -> Result<String, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let bytes = self
            .request_internal(Method::POST, path, Some(body), opts)
            .await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_internal<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts,
    ) -> Result<Vec<u8>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let shown = shown_url(&url, opts.sensitive);

        // ----- Build request -----
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = self.default_timeout;
        rb = rb.timeout(timeout);

        // serialize up front so the exact bytes can be logged
        let mut request_body_bytes: Option<Vec<u8>> = None;
        if let Some(b) = body {
            let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
            rb = rb
                .header(
                    reqwest::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )
                .body(bytes.clone());
            request_body_bytes = Some(bytes);
        }

        // ----- Safe request logging (pre-send) -----
        let req_id = next_request_id();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            url=%shown,
            timeout_ms=timeout.as_millis() as u64,
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let body_for_log = if opts.sensitive {
                None
            } else {
                request_body_bytes.as_deref()
            };
            let curl = make_curl(&method, &shown, body_for_log);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = describe_reqwest_error(&err, opts.sensitive);
            tracing::warn!(req_id=%req_id, url=%shown, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = describe_reqwest_error(&err, opts.sensitive);
            tracing::warn!(req_id=%req_id, url=%shown, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            content_type=%content_type,
            "http.response.headers"
        );
        if raw_enabled() {
            log_raw_response(&req_id, status, dur_ms, &bytes);
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if !status.is_success() {
            tracing::warn!(req_id=%req_id, %status, url=%shown, body_snippet=%snippet, "http.error");
            return Err(HttpError::Api {
                status,
                message: snippet,
            });
        }
        Ok(bytes.to_vec())
    }
}

// ==============================
// Helpers
// ==============================

/// Short per-process request id used to correlate log lines.
fn next_request_id() -> String {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    format!("r{}", NEXT.fetch_add(1, Ordering::Relaxed))
}

fn log_raw_response(req_id: &str, status: StatusCode, dur_ms: u64, body: &[u8]) {
    let truncated = body.len() > RAW_MAX_BODY;
    let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
    tracing::info!(
        target: "http.raw",
        %req_id,
        %status,
        duration_ms = dur_ms,
        body = %text,
        truncated,
        "response"
    );
}

/// Host + path for ordinary requests; scheme + host only for secret URLs.
fn shown_url(url: &Url, sensitive: bool) -> String {
    let host = url.host_str().unwrap_or("-");
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    if sensitive {
        format!("{}://{}{}/<redacted>", url.scheme(), host, port)
    } else {
        format!("{}://{}{}{}", url.scheme(), host, port, url.path())
    }
}

/// reqwest embeds the full URL in its error text; strip it for secret URLs.
fn describe_reqwest_error(err: &reqwest::Error, sensitive: bool) -> String {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else {
        "request"
    };
    if sensitive {
        format!("{kind} error")
    } else {
        format!("{kind} error: {err}")
    }
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        truncate_on_char(&mut snip, 500);
        snip.push_str("...");
    }
    snip
}

fn truncate_on_char(s: &mut String, max: usize) {
    let mut cut = max.min(s.len());
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
