//! Request and response interceptors

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{error::Result, request::RequestConfig, response::ApiResponse};

/// Mutates every outgoing request
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, request: RequestConfig) -> Result<RequestConfig>;
}

/// Mutates every incoming response
#[async_trait]
pub trait ResponseHook: Send + Sync {
    async fn on_response(&self, response: ApiResponse) -> Result<ApiResponse>;
}

struct FnRequestHook<F>(F);

#[async_trait]
impl<F> RequestHook for FnRequestHook<F>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    async fn on_request(&self, request: RequestConfig) -> Result<RequestConfig> {
        (self.0)(request)
    }
}

struct FnResponseHook<F>(F);

#[async_trait]
impl<F> ResponseHook for FnResponseHook<F>
where
    F: Fn(ApiResponse) -> Result<ApiResponse> + Send + Sync,
{
    async fn on_response(&self, response: ApiResponse) -> Result<ApiResponse> {
        (self.0)(response)
    }
}

/// Wrap a closure as a request hook
pub fn request_fn<F>(f: F) -> Arc<dyn RequestHook>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync + 'static,
{
    Arc::new(FnRequestHook(f))
}

/// Wrap a closure as a response hook
pub fn response_fn<F>(f: F) -> Arc<dyn ResponseHook>
where
    F: Fn(ApiResponse) -> Result<ApiResponse> + Send + Sync + 'static,
{
    Arc::new(FnResponseHook(f))
}

/// Ordered request/response hook sets
///
/// Registration order is execution order. Entries are never removed;
/// registering `None` or a handle that is already present does nothing.
/// Clones share the same sets.
#[derive(Clone, Default)]
pub struct HookRegistry {
    request: Arc<RwLock<Vec<Arc<dyn RequestHook>>>>,
    response: Arc<RwLock<Vec<Arc<dyn ResponseHook>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request hook. Returns `true` if it was added.
    pub fn register_request_hook(&self, hook: Option<Arc<dyn RequestHook>>) -> bool {
        match hook {
            Some(hook) => insert_unique(&mut *self.request.write(), hook),
            None => false,
        }
    }

    /// Append a response hook. Returns `true` if it was added.
    pub fn register_response_hook(&self, hook: Option<Arc<dyn ResponseHook>>) -> bool {
        match hook {
            Some(hook) => insert_unique(&mut *self.response.write(), hook),
            None => false,
        }
    }

    /// Snapshot of the request hooks in registration order
    pub fn request_hooks(&self) -> Vec<Arc<dyn RequestHook>> {
        self.request.read().clone()
    }

    /// Snapshot of the response hooks in registration order
    pub fn response_hooks(&self) -> Vec<Arc<dyn ResponseHook>> {
        self.response.read().clone()
    }

    pub fn request_len(&self) -> usize {
        self.request.read().len()
    }

    pub fn response_len(&self) -> usize {
        self.response.read().len()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("request", &self.request_len())
            .field("response", &self.response_len())
            .finish()
    }
}

// Identity is the allocation, not the vtable
fn insert_unique<T: ?Sized>(hooks: &mut Vec<Arc<T>>, hook: Arc<T>) -> bool {
    let ptr = Arc::as_ptr(&hook) as *const ();
    if hooks.iter().any(|h| Arc::as_ptr(h) as *const () == ptr) {
        return false;
    }
    hooks.push(hook);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_noop() {
        let registry = HookRegistry::new();
        assert!(!registry.register_request_hook(None));
        assert!(!registry.register_response_hook(None));
        assert_eq!(registry.request_len(), 0);
        assert_eq!(registry.response_len(), 0);
    }

    #[test]
    fn test_duplicate_handle_is_noop() {
        let registry = HookRegistry::new();
        let hook = request_fn(Ok);

        assert!(registry.register_request_hook(Some(hook.clone())));
        assert!(!registry.register_request_hook(Some(hook)));
        assert_eq!(registry.request_len(), 1);
    }

    #[test]
    fn test_distinct_handles_keep_order() {
        let registry = HookRegistry::new();
        let first = response_fn(Ok);
        let second = response_fn(Ok);

        registry.register_response_hook(Some(first.clone()));
        registry.register_response_hook(Some(second.clone()));

        let hooks = registry.response_hooks();
        assert_eq!(hooks.len(), 2);
        assert!(Arc::ptr_eq(&hooks[0], &first));
        assert!(Arc::ptr_eq(&hooks[1], &second));
    }

    #[tokio::test]
    async fn test_closure_hook_runs() {
        let hook = request_fn(|mut req| {
            req.headers.insert("X-Hook".to_string(), "1".to_string());
            Ok(req)
        });

        let request = hook.on_request(RequestConfig::get("/a")).await.unwrap();
        assert_eq!(request.headers.get("X-Hook"), Some(&"1".to_string()));
    }

    #[test]
    fn test_clones_share_sets() {
        let registry = HookRegistry::new();
        let clone = registry.clone();
        clone.register_request_hook(Some(request_fn(Ok)));
        assert_eq!(registry.request_len(), 1);
    }
}
