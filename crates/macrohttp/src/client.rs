//! HTTP client implementation

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde_json::{json, Map, Value};
use tracing::{debug, trace, warn};

use crate::{
    business,
    config::HttpConfig,
    context::HttpContext,
    env::Environment,
    error::{HttpError, Result},
    hooks::{RequestHook, ResponseHook},
    request::{RequestBody, RequestConfig, RequestOptions},
    response::ApiResponse,
    rewrite::UrlTemplateHook,
};

/// Mockable HTTP client trait
///
/// Only `request` is required; the verb helpers build a [`RequestConfig`]
/// and forward to it.
#[async_trait]
pub trait HttpApi: Send + Sync {
    /// Execute a request through the interceptor chain
    async fn request(&self, request: RequestConfig) -> Result<ApiResponse>;

    /// Execute a GET request
    async fn get(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        debug!("HTTP GET: {}", url);
        self.request(options.into_request(Method::GET, url, None)).await
    }

    /// Execute a DELETE request
    async fn delete(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        debug!("HTTP DELETE: {}", url);
        self.request(options.into_request(Method::DELETE, url, None))
            .await
    }

    /// Execute a HEAD request
    async fn head(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        debug!("HTTP HEAD: {}", url);
        self.request(options.into_request(Method::HEAD, url, None)).await
    }

    /// Execute an OPTIONS request
    async fn options(&self, url: &str, options: RequestOptions) -> Result<ApiResponse> {
        debug!("HTTP OPTIONS: {}", url);
        self.request(options.into_request(Method::OPTIONS, url, None))
            .await
    }

    /// Execute a POST request; missing data is sent as `{}`
    async fn post(
        &self,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        debug!("HTTP POST: {}", url);
        let data = data.unwrap_or_else(|| json!({}));
        self.request(options.into_request(Method::POST, url, Some(data)))
            .await
    }

    /// Execute a PUT request
    async fn put(
        &self,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        debug!("HTTP PUT: {}", url);
        self.request(options.into_request(Method::PUT, url, data)).await
    }

    /// Execute a PATCH request
    async fn patch(
        &self,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        debug!("HTTP PATCH: {}", url);
        self.request(options.into_request(Method::PATCH, url, data))
            .await
    }
}

/// Production HTTP client
///
/// The interceptor chain is fixed at construction: URL template rewrite,
/// then registered request hooks, then registered response hooks, each in
/// registration order.
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
    shared_env: Arc<RwLock<Environment>>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig, context: &HttpContext) -> Result<Self> {
        Self::with_environment(config, context, Environment::new())
    }

    /// Create a client with instance-level environment overrides
    pub fn with_environment(
        config: HttpConfig,
        context: &HttpContext,
        env: Environment,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_store(config.with_credentials)
            .default_headers(default_headers(&config)?)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::BuildError(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        let shared_env = context.shared_env();
        let mut request_hooks: Vec<Arc<dyn RequestHook>> = vec![Arc::new(UrlTemplateHook::new(
            Arc::clone(&shared_env),
            env,
        ))];
        request_hooks.extend(context.hooks().request_hooks());
        let response_hooks = context.hooks().response_hooks();

        debug!(
            "Built HTTP client for {} ({} request hooks, {} response hooks)",
            config.base_url,
            request_hooks.len() - 1,
            response_hooks.len()
        );

        Ok(Self {
            inner,
            config,
            shared_env,
            request_hooks,
            response_hooks,
        })
    }

    /// Create HTTP client with default configuration and an empty context
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default(), &HttpContext::default())
    }

    /// Get underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Current shared environment, as seen by this client
    pub fn shared_environment(&self) -> Environment {
        self.shared_env.read().clone()
    }

    /// Full URL for a request: base URL, request URL and params.
    ///
    /// Interceptors are not applied.
    pub fn get_uri(&self, request: &RequestConfig) -> String {
        build_uri(&self.config.base_url, &request.url, request.params.as_ref())
    }

    async fn run_request_chain(&self, request: RequestConfig) -> Result<RequestConfig> {
        let mut state = Ok(request);
        for (stage, hook) in self.request_hooks.iter().enumerate() {
            trace!("Request stage {}", stage);
            state = match state {
                Ok(request) => hook.on_request(request).await,
                Err(err) => business::recover(err),
            };
        }
        state
    }

    async fn run_response_chain(&self, outcome: Result<ApiResponse>) -> Result<ApiResponse> {
        let mut state = outcome;
        for (stage, hook) in self.response_hooks.iter().enumerate() {
            trace!("Response stage {}", stage);
            state = match state {
                Ok(response) => hook.on_response(response).await,
                Err(err) => business::recover(err),
            };
        }
        state
    }

    async fn dispatch(&self, request: RequestConfig) -> Result<ApiResponse> {
        let uri = self.get_uri(&request);
        let url = url::Url::parse(&uri).map_err(|e| HttpError::InvalidUrl(format!("{uri}: {e}")))?;

        debug!("Dispatching {} {}", request.method, url);
        let mut builder = self.inner.request(request.method, url);

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Multipart(form)) => builder.multipart(form.into_reqwest()?),
            None => builder,
        };

        let response = builder.send().await?;

        if self.config.validate_status && !response.status().is_success() {
            let status = response.status();
            warn!("HTTP {} from {}", status, response.url());
            return Err(HttpError::Status {
                status,
                body: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            });
        }

        ApiResponse::from_reqwest(response).await
    }
}

#[async_trait]
impl HttpApi for HttpClient {
    async fn request(&self, request: RequestConfig) -> Result<ApiResponse> {
        // A rejected request skips dispatch and goes straight to the
        // response stages, which settle it like any other failure.
        let outcome = match self.run_request_chain(request).await {
            Ok(request) => self.dispatch(request).await,
            Err(err) => Err(err),
        };

        match self.run_response_chain(outcome).await {
            Ok(response) => Ok(response),
            Err(err) => business::recover(err),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("request_hooks", &self.request_hooks.len())
            .field("response_hooks", &self.response_hooks.len())
            .finish()
    }
}

/// Create a shared HTTP client (Arc-wrapped for cloning)
pub fn shared_client(config: HttpConfig, context: &HttpContext) -> Result<Arc<dyn HttpApi>> {
    Ok(Arc::new(HttpClient::new(config, context)?))
}

fn default_headers(config: &HttpConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::BuildError(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::BuildError(format!("invalid header value: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Scheme of an absolute URL (`https` in `https://h.test`)
fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

fn combine_url(base: &str, url: &str) -> String {
    // Protocol-relative URLs take the base URL's scheme
    if let Some(rest) = url.strip_prefix("//") {
        return match url_scheme(base) {
            Some(scheme) => format!("{scheme}://{rest}"),
            None => url.to_string(),
        };
    }
    if base.is_empty() || url_scheme(url).is_some() {
        return url.to_string();
    }
    if url.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

fn build_uri(base: &str, url: &str, params: Option<&Map<String, Value>>) -> String {
    let full = combine_url(base, url);
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut has_pairs = false;

    for (key, value) in params.into_iter().flatten() {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let key = format!("{key}[]");
                for item in items.iter().filter(|v| !v.is_null()) {
                    serializer.append_pair(&key, &render_param(item));
                    has_pairs = true;
                }
            }
            other => {
                serializer.append_pair(key, &render_param(other));
                has_pairs = true;
            }
        }
    }

    if !has_pairs {
        return full;
    }

    let full = match full.split_once('#') {
        Some((before, _)) => before.to_string(),
        None => full,
    };
    let separator = if full.contains('?') { '&' } else { '?' };
    format!("{}{}{}", full, separator, serializer.finish())
}

fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
