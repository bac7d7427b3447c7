//! Observable async state

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::{Result, StateError},
    source::Source,
};

/// Point-in-time view of an [`AsyncState`]
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Last published data, or the initial value
    pub state: T,
    pub is_loading: bool,
    /// Set once an execution has published data; cleared when a new one starts
    pub is_ready: bool,
    pub error: Option<StateError>,
}

type SuccessFn<T> = dyn Fn(&T) + Send + Sync;
type ErrorFn = dyn Fn(&StateError) + Send + Sync;

/// Execution options
pub struct AsyncStateOptions<T> {
    /// Execute once on construction (needs a running tokio runtime)
    pub immediate: bool,
    /// Delay applied to the construction-time execution
    pub delay: Duration,
    /// Put the initial value back when an execution starts
    pub reset_on_execute: bool,
    /// Return loader errors from `execute` instead of only publishing them
    pub throw_error: bool,
    /// Called with the data of every published execution
    pub on_success: Option<Arc<SuccessFn<T>>>,
    /// Called with the error of every published execution
    pub on_error: Option<Arc<ErrorFn>>,
}

impl<T> Default for AsyncStateOptions<T> {
    fn default() -> Self {
        Self {
            immediate: true,
            delay: Duration::ZERO,
            reset_on_execute: true,
            throw_error: false,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for AsyncStateOptions<T> {
    fn clone(&self) -> Self {
        Self {
            immediate: self.immediate,
            delay: self.delay,
            reset_on_execute: self.reset_on_execute,
            throw_error: self.throw_error,
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AsyncStateOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStateOptions")
            .field("immediate", &self.immediate)
            .field("delay", &self.delay)
            .field("reset_on_execute", &self.reset_on_execute)
            .field("throw_error", &self.throw_error)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T> AsyncStateOptions<T> {
    /// Manual execution that keeps stale data between runs
    pub fn deferred() -> Self {
        Self {
            immediate: false,
            reset_on_execute: false,
            ..Default::default()
        }
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_reset_on_execute(mut self, reset: bool) -> Self {
        self.reset_on_execute = reset;
        self
    }

    pub fn with_throw_error(mut self, throw: bool) -> Self {
        self.throw_error = throw;
        self
    }

    pub fn with_on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn with_on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StateError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

struct Inner<T, A> {
    source: Source<T, A>,
    initial: T,
    options: AsyncStateOptions<T>,
    tx: watch::Sender<Snapshot<T>>,
    /// Id of the latest started execution; only read or bumped under the
    /// watch lock
    generation: AtomicU64,
}

/// Clears `is_loading` when the latest execution is dropped before it
/// publishes
struct LoadingGuard<'a, T, A> {
    inner: &'a Inner<T, A>,
    generation: u64,
    armed: bool,
}

impl<T, A> Drop for LoadingGuard<'_, T, A> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let inner = self.inner;
        let generation = self.generation;
        let cleared = inner.tx.send_if_modified(|s| {
            if inner.generation.load(Ordering::SeqCst) != generation || !s.is_loading {
                return false;
            }
            s.is_loading = false;
            true
        });
        if cleared {
            debug!("Execution {} dropped before completing", generation);
        }
    }
}

/// Loading/data/error state bound to a [`Source`]
///
/// Clones share the same state. Only the most recently started execution
/// publishes its outcome and runs the `on_success`/`on_error` callbacks.
pub struct AsyncState<T, A = ()> {
    inner: Arc<Inner<T, A>>,
}

impl<T, A> Clone for AsyncState<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, A> AsyncState<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn new(source: Source<T, A>, initial: T, options: AsyncStateOptions<T>) -> Self
    where
        A: Default,
    {
        let (tx, _rx) = watch::channel(Snapshot {
            state: initial.clone(),
            is_loading: false,
            is_ready: false,
            error: None,
        });

        let immediate = options.immediate;
        let state = Self {
            inner: Arc::new(Inner {
                source,
                initial,
                options,
                tx,
                generation: AtomicU64::new(0),
            }),
        };

        if immediate {
            state.spawn_initial();
        }
        state
    }

    fn spawn_initial(&self)
    where
        A: Default,
    {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime, skipping immediate execution");
                return;
            }
        };

        self.inner.tx.send_modify(|s| s.is_loading = true);
        let state = self.clone();
        handle.spawn(async move {
            let delay = state.inner.options.delay;
            let _ = state.execute_after(delay, A::default()).await;
        });
    }

    /// Run the source now
    pub async fn execute(&self, args: A) -> Result<T> {
        self.execute_after(Duration::ZERO, args).await
    }

    /// Mark the state loading, wait `delay`, then run the source.
    ///
    /// Returns the loaded data. A failure is published as `error`; it is
    /// returned only with `throw_error`, otherwise the current state is.
    /// Dropping the returned future before it completes clears `is_loading`
    /// unless a newer execution has started since.
    pub async fn execute_after(&self, delay: Duration, args: A) -> Result<T> {
        let inner = &*self.inner;

        let mut generation = 0;
        inner.tx.send_modify(|s| {
            generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if inner.options.reset_on_execute {
                s.state = inner.initial.clone();
            }
            s.error = None;
            s.is_ready = false;
            s.is_loading = true;
        });
        let mut guard = LoadingGuard {
            inner,
            generation,
            armed: true,
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = inner.source.load(args).await;
        guard.armed = false;

        let published = inner.tx.send_if_modified(|s| {
            if inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &outcome {
                Ok(data) => {
                    s.state = data.clone();
                    s.is_ready = true;
                }
                Err(err) => s.error = Some(err.clone()),
            }
            s.is_loading = false;
            true
        });
        if !published {
            debug!("Discarding outcome of superseded execution {}", generation);
        }

        match outcome {
            Ok(data) => {
                if let (true, Some(on_success)) = (published, &inner.options.on_success) {
                    on_success(&data);
                }
                Ok(data)
            }
            Err(err) => {
                warn!("Async state execution failed: {}", err);
                if let (true, Some(on_error)) = (published, &inner.options.on_error) {
                    on_error(&err);
                }
                if inner.options.throw_error {
                    Err(err)
                } else {
                    Ok(self.state())
                }
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.inner.tx.borrow().clone()
    }

    pub fn state(&self) -> T {
        self.inner.tx.borrow().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.tx.borrow().is_loading
    }

    pub fn is_ready(&self) -> bool {
        self.inner.tx.borrow().is_ready
    }

    pub fn error(&self) -> Option<StateError> {
        self.inner.tx.borrow().error.clone()
    }

    pub fn options(&self) -> &AsyncStateOptions<T> {
        &self.inner.options
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.tx.subscribe()
    }

    /// Wait until no execution is in flight
    pub async fn settled(&self) -> Snapshot<T> {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|s| !s.is_loading).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl<T: std::fmt::Debug, A> std::fmt::Debug for AsyncState<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncState")
            .field("snapshot", &*self.inner.tx.borrow())
            .field("options", &self.inner.options)
            .finish()
    }
}
