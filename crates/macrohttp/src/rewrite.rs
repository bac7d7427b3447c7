//! Built-in request hook that expands URL templates

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    env::Environment,
    error::Result,
    hooks::RequestHook,
    request::RequestConfig,
    template,
};

/// Rewrites `${key}` placeholders in the request URL.
///
/// Runs only when the URL has placeholders and the request carries params or
/// a body. An empty params map counts as params. Keys resolve against, in increasing precedence: shared
/// environment, instance environment, request params, JSON object body.
pub struct UrlTemplateHook {
    shared: Arc<RwLock<Environment>>,
    instance: Environment,
}

impl UrlTemplateHook {
    pub fn new(shared: Arc<RwLock<Environment>>, instance: Environment) -> Self {
        Self { shared, instance }
    }

    /// Merged lookup object for a request
    pub fn lookup_object(&self, request: &RequestConfig) -> Value {
        let mut data = Map::new();
        self.shared.read().merge_into(&mut data);
        self.instance.merge_into(&mut data);

        for (key, value) in request.params.iter().flatten() {
            data.insert(key.clone(), value.clone());
        }
        if let Some(fields) = request.body.as_ref().and_then(|b| b.lookup_fields()) {
            for (key, value) in fields {
                data.insert(key.clone(), value.clone());
            }
        }

        Value::Object(data)
    }
}

#[async_trait]
impl RequestHook for UrlTemplateHook {
    async fn on_request(&self, mut request: RequestConfig) -> Result<RequestConfig> {
        if !template::has_placeholders(&request.url) {
            return Ok(request);
        }
        if !request.has_params() && !request.has_body() {
            return Ok(request);
        }

        let lookup = self.lookup_object(&request);
        let url = template::try_substitute(&request.url, |_, key| {
            template::resolve_segment(&lookup, key)
        })?;

        debug!("Rewrote URL template {} -> {}", request.url, url);
        request.url = url;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::HttpError, request::MultipartForm};
    use serde_json::json;

    fn hook(shared: &[(&str, i64)], instance: &[(&str, i64)]) -> UrlTemplateHook {
        let shared: Environment = shared.iter().copied().collect();
        let instance: Environment = instance.iter().copied().collect();
        UrlTemplateHook::new(Arc::new(RwLock::new(shared)), instance)
    }

    #[test]
    fn test_precedence() {
        let h = hook(&[("k", 1)], &[("k", 2)]);

        let request = RequestConfig::get("/x${k}");
        assert_eq!(h.lookup_object(&request)["k"], json!(2));

        let request = request.param("k", 3);
        assert_eq!(h.lookup_object(&request)["k"], json!(3));

        let request = request.json(json!({"k": 4}));
        assert_eq!(h.lookup_object(&request)["k"], json!(4));
    }

    #[test]
    fn test_multipart_body_excluded() {
        let h = hook(&[], &[]);
        let request = RequestConfig::post("/x")
            .param("k", 3)
            .multipart(MultipartForm::new().text("k", "form"));

        assert_eq!(h.lookup_object(&request)["k"], json!(3));
    }

    #[tokio::test]
    async fn test_rewrites_with_params() {
        let h = hook(&[("ver", 2)], &[]);
        let request = RequestConfig::get("/api${ver}/users${id}").param("id", 42);

        let request = h.on_request(request).await.unwrap();
        assert_eq!(request.url, "/api/2/users/42");
    }

    #[tokio::test]
    async fn test_skips_without_params_or_body() {
        let h = hook(&[("ver", 2)], &[]);
        let request = h.on_request(RequestConfig::get("/api${ver}")).await.unwrap();
        assert_eq!(request.url, "/api${ver}");
    }

    #[tokio::test]
    async fn test_missing_key_fails() {
        let h = hook(&[], &[]);
        let result = h
            .on_request(RequestConfig::get("/users${id}").param("other", 1))
            .await;
        assert!(matches!(result, Err(HttpError::MissingVariable(k)) if k == "id"));
    }

    #[tokio::test]
    async fn test_rewrites_with_empty_params() {
        let h = hook(&[("ver", 2)], &[]);
        let request = RequestConfig::get("/api${ver}").params(Map::new());

        let request = h.on_request(request).await.unwrap();
        assert_eq!(request.url, "/api/2");
    }
}
