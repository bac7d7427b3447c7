//! Where an async state gets its data from

use std::{future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};

use crate::error::{Result, StateError};

type LoaderFn<T, A> = dyn Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync;

/// A ready value or a loader producing one per call
pub enum Source<T, A = ()> {
    /// Resolves to a clone of the value on every execution
    Value(T),
    /// Invoked with the execution arguments on every execution
    Loader(Arc<LoaderFn<T, A>>),
}

impl<T, A> Source<T, A>
where
    T: Clone + Send + 'static,
    A: 'static,
{
    pub fn value(value: T) -> Self {
        Source::Value(value)
    }

    /// Wrap an async function; its error is kept as [`StateError::Failed`]
    pub fn loader<F, Fut, E>(loader: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Source::Loader(Arc::new(move |args: A| {
            loader(args).map(|r| r.map_err(StateError::failed)).boxed()
        }))
    }

    pub(crate) fn load(&self, args: A) -> BoxFuture<'static, Result<T>> {
        match self {
            Source::Value(value) => futures::future::ready(Ok(value.clone())).boxed(),
            Source::Loader(loader) => loader(args),
        }
    }
}

impl<T: Clone, A> Clone for Source<T, A> {
    fn clone(&self) -> Self {
        match self {
            Source::Value(value) => Source::Value(value.clone()),
            Source::Loader(loader) => Source::Loader(Arc::clone(loader)),
        }
    }
}

impl<T: std::fmt::Debug, A> std::fmt::Debug for Source<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Source::Loader(_) => f.write_str("Loader"),
        }
    }
}
