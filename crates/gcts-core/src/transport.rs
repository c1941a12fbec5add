//! HTTP boundary shared by every step.
//!
//! Steps talk to the ABAP system and to hosting providers through the
//! [`HttpSender`] trait, one request at a time. [`ReqwestSender`] is the
//! production implementation; [`crate::fakes::ScriptedSender`] replays canned
//! responses in tests.
//!
//! A response with any status code is an `Ok`; only a request that never
//! produced a response is an error. Callers decide which statuses they accept.

use std::time::Duration;

use async_trait::async_trait;
pub use reqwest::Method;
use tracing::debug;

use crate::config::Credentials;
use crate::error::Result;

/// Outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of a request header, matched case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Received response, fully buffered.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a response header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Performs a single request/response cycle.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Options for [`ReqwestSender`].
#[derive(Debug, Clone, Default)]
pub struct SenderOptions {
    /// Basic-auth credentials attached to every request.
    pub credentials: Option<Credentials>,
    /// Overall request timeout. Unset means whatever reqwest defaults to.
    pub timeout: Option<Duration>,
}

impl SenderOptions {
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// [`HttpSender`] backed by a reqwest client with a cookie store, so the
/// session cookie issued alongside a CSRF token is replayed on later calls.
pub struct ReqwestSender {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ReqwestSender {
    pub fn new(options: SenderOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("gcts-core/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ReqwestSender {
            client: builder.build()?,
            credentials: options.credentials,
        })
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(status, url = %request.url, "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
