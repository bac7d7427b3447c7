//! Async state error types

use std::sync::Arc;

use thiserror::Error;

/// Errors published by an [`AsyncState`](crate::AsyncState)
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// The loader returned an error
    #[error("Loader failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl StateError {
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StateError::Failed(Arc::new(error))
    }

    /// Underlying loader error, if it is an `E`
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            StateError::Failed(inner) => inner.downcast_ref::<E>(),
        }
    }
}

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;
