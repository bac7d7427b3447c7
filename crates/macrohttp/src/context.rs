//! Shared configuration injected into every client
//!
//! Holds the environment map and the hook registries that clients built
//! from it share. Set it up before building clients: hooks are captured when
//! a client is constructed, the environment is read on every request.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    env::{EnvValue, Environment},
    hooks::{HookRegistry, RequestHook, ResponseHook},
};

#[derive(Debug, Clone, Default)]
pub struct HttpContext {
    env: Arc<RwLock<Environment>>,
    hooks: HookRegistry,
}

impl HttpContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge variables into the shared environment
    pub fn set_environment<I, K, V>(&self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<EnvValue>,
    {
        self.env.write().extend(vars);
    }

    /// Copy of the current shared environment
    pub fn environment(&self) -> Environment {
        self.env.read().clone()
    }

    pub fn register_request_hook(&self, hook: Option<Arc<dyn RequestHook>>) -> bool {
        self.hooks.register_request_hook(hook)
    }

    pub fn register_response_hook(&self, hook: Option<Arc<dyn ResponseHook>>) -> bool {
        self.hooks.register_response_hook(hook)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub(crate) fn shared_env(&self) -> Arc<RwLock<Environment>> {
        Arc::clone(&self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::request_fn;

    #[test]
    fn test_set_environment_merges() {
        let context = HttpContext::new();
        context.set_environment([("a", EnvValue::from(1)), ("b", EnvValue::from("x"))]);
        context.set_environment([("a", 2)]);

        let env = context.environment();
        assert_eq!(env.get("a"), Some(&EnvValue::from(2)));
        assert_eq!(env.get("b"), Some(&EnvValue::from("x")));
    }

    #[test]
    fn test_clones_share_state() {
        let context = HttpContext::new();
        let clone = context.clone();

        clone.set_environment([("k", "v")]);
        clone.register_request_hook(Some(request_fn(Ok)));

        assert_eq!(context.environment().len(), 1);
        assert_eq!(context.hooks().request_len(), 1);
    }
}
