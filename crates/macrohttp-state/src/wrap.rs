//! Convenience constructors for binding API calls to state

use std::future::Future;

use crate::{
    source::Source,
    state::{AsyncState, AsyncStateOptions},
};

/// Bind a value or loader to a new state.
///
/// `initial` falls back to `T::default()` and `options` to
/// [`AsyncStateOptions::default`] (runs immediately, resets on execute).
pub fn wrap_state<T, A>(
    source: Source<T, A>,
    initial: Option<T>,
    options: Option<AsyncStateOptions<T>>,
) -> AsyncState<T, A>
where
    T: Clone + Default + Send + Sync + 'static,
    A: Default + Send + 'static,
{
    AsyncState::new(
        source,
        initial.unwrap_or_default(),
        options.unwrap_or_default(),
    )
}

/// Bind a list loader to a new state.
///
/// Without explicit options nothing runs until `execute` is called, and the
/// previous data stays visible while a new execution is in flight.
pub fn wrap_list_state<T, A, F, Fut, E>(
    loader: F,
    initial: Option<T>,
    options: Option<AsyncStateOptions<T>>,
) -> AsyncState<T, A>
where
    T: Clone + Default + Send + Sync + 'static,
    A: Default + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    wrap_state(
        Source::loader(loader),
        initial,
        Some(options.unwrap_or_else(AsyncStateOptions::deferred)),
    )
}
