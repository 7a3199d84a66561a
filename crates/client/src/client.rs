use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::http;

/// Cookie the backend sets with the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header that echoes the token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";
/// Per-request correlation id, also logged.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the audit backend.
///
/// Cheap to clone; clones share the cookie jar and the cached CSRF token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: String,
    base_url: Url,
    timeout_secs: u64,
    csrf: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base = config.base_url.trim().trim_end_matches('/').to_string();
        let base_url = Url::parse(&format!("{base}/")).map_err(|e| ApiError::Config(e.to_string()))?;

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(concat!("auditdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            jar,
            base,
            base_url,
            timeout_secs: config.timeout.as_secs(),
            csrf: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Cookies currently held for the backend, as a `Cookie` header value.
    pub fn export_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Restore cookies saved by [`ApiClient::export_cookies`].
    pub fn import_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(pair, &self.base_url);
        }
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.export_cookies()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    fn cached_csrf(&self) -> Option<String> {
        self.csrf.read().ok().and_then(|guard| guard.clone())
    }

    fn remember_csrf(&self, token: Option<String>) {
        if let Ok(mut guard) = self.csrf.write() {
            *guard = token;
        }
    }

    /// CSRF token for a mutating call: cookie, then cached body token, then
    /// a fresh `GET /csrf/`.
    pub async fn csrf_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.cookie(CSRF_COOKIE).or_else(|| self.cached_csrf()) {
            return Ok(token);
        }

        debug!(path = "csrf/", "fetching csrf token");
        let resp = self
            .http
            .get(self.url("csrf/"))
            .send()
            .await
            .map_err(|e| ApiError::Csrf(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| ApiError::Csrf(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Csrf(format!("token endpoint returned {status}")));
        }

        let body = http::lenient_json(&text);
        let from_body = ["csrfToken", "csrf_token", "token"]
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .map(str::to_string);

        let token = self
            .cookie(CSRF_COOKIE)
            .or(from_body)
            .ok_or_else(|| ApiError::Csrf("no token in cookie or response body".to_string()))?;

        self.remember_csrf(Some(token.clone()));
        Ok(token)
    }

    /// Send one request and return the body of a 2xx response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<String, ApiError> {
        let request_id = Uuid::now_v7();
        let mut req = self
            .http
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !query.is_empty() {
            req = req.query(query);
        }
        if method != Method::GET && method != Method::HEAD {
            req = req.header(CSRF_HEADER, self.csrf_token().await?);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        debug!(%request_id, %method, path, "sending request");
        let resp = req.send().await.map_err(|e| {
            let err = ApiError::from_transport(e, self.timeout_secs);
            warn!(%request_id, %method, path, error = %err, "request failed");
            err
        })?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_secs))?;
        debug!(%request_id, %method, path, status, "response received");

        if (200..300).contains(&status) {
            return Ok(text);
        }

        let err = http::status_error(status, &text);
        if matches!(err, ApiError::Csrf(_)) {
            self.remember_csrf(None);
        }
        warn!(%request_id, %method, path, status, error = %err, "request rejected");
        Err(err)
    }

    fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::GET, path, query, None).await?;
        http::decode(&text)
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = Self::to_body(body)?;
        let text = self.execute(method, path, &[], Some(body)).await?;
        http::decode(&text)
    }

    /// Mutation whose response body is ignored.
    pub(crate) async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let body = body.map(Self::to_body).transpose()?;
        self.execute(method, path, &[], body).await.map(|_| ())
    }

    /// Body-less `POST` returning a payload (lifecycle actions).
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.execute(Method::POST, path, &[], None).await?;
        http::decode(&text)
    }
}
