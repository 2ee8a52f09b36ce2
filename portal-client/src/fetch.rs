//! Resource fetch controller.
//!
//! A [`FetchController`] wraps one read call and exposes its progress as a
//! [`FetchState`]. Each started fetch takes a new generation; a completion is
//! applied only while its generation is still the latest, so results land in
//! start order no matter when the responses arrive.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use futures::{FutureExt, future::BoxFuture};
use tokio::sync::watch;
use tracing::debug;

use crate::error::ClientError;

/// Observable state of one controller.
#[derive(Debug, PartialEq)]
pub enum FetchState<T> {
    /// Nothing has been requested, or the dependencies do not allow a fetch.
    Idle,
    /// A fetch is in flight. `previous` is the last successful payload, if
    /// the controller had one.
    Loading {
        /// Payload retained from the last success.
        previous: Option<Arc<T>>,
    },
    /// The latest fetch succeeded.
    Success(Arc<T>),
    /// Human-readable error message.
    Failure(String),
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading { previous } => Self::Loading {
                previous: previous.clone(),
            },
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Failure(message) => Self::Failure(message.clone()),
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> FetchState<T> {
    /// Payload to render: the success data, or the retained payload while
    /// reloading. Never present alongside an error.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.shared_data().map(AsRef::as_ref)
    }

    /// Shared handle to the payload returned by [`Self::data`].
    #[must_use]
    pub fn shared_data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Success(data) => Some(data),
            Self::Loading { previous } => previous.as_ref(),
            Self::Idle | Self::Failure(_) => None,
        }
    }

    /// Message of a failed fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// True while a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// True before the first fetch and while gated.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What happened to a fetch's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result became the controller's state.
    Applied,
    /// A newer fetch started, or the controller was dropped, first.
    Superseded,
}

/// A started fetch. Await it (or spawn it) to perform the read.
#[must_use = "a fetch does nothing until awaited or spawned"]
pub struct PendingFetch {
    generation: u64,
    inner: BoxFuture<'static, FetchOutcome>,
}

impl PendingFetch {
    /// Generation this fetch was started with.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Future for PendingFetch {
    type Output = FetchOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

type Fetcher<D, T> = Box<dyn Fn(D) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;
type Gate<D> = Box<dyn Fn(&D) -> bool + Send + Sync>;

struct Tracking<D> {
    generation: u64,
    deps: Option<D>,
}

struct Shared<D, T> {
    label: &'static str,
    fallback: &'static str,
    tracking: Mutex<Tracking<D>>,
    state: watch::Sender<FetchState<T>>,
}

impl<D, T> Shared<D, T> {
    fn lock(&self) -> MutexGuard<'_, Tracking<D>> {
        self.tracking.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, generation: u64, result: Result<T, ClientError>) -> FetchOutcome {
        let tracking = self.lock();
        if tracking.generation != generation {
            debug!(
                resource = self.label,
                generation,
                current = tracking.generation,
                "discarding superseded fetch result"
            );
            return FetchOutcome::Superseded;
        }

        let next = match result {
            Ok(data) => FetchState::Success(Arc::new(data)),
            Err(err) => {
                debug!(resource = self.label, error = %err, "fetch failed");
                FetchState::Failure(err.message_or(self.fallback))
            }
        };
        self.state.send_replace(next);
        FetchOutcome::Applied
    }
}

/// Drives one read resource from its dependencies.
///
/// `D` is the dependency value compared by equality; `T` is the payload.
pub struct FetchController<D, T> {
    shared: Arc<Shared<D, T>>,
    fetcher: Fetcher<D, T>,
    gate: Option<Gate<D>>,
}

impl<D, T> fmt::Debug for FetchController<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchController")
            .field("resource", &self.shared.label)
            .field("generation", &self.shared.lock().generation)
            .finish_non_exhaustive()
    }
}

impl<D, T> FetchController<D, T>
where
    D: Clone + PartialEq + Send + 'static,
    T: Send + Sync + 'static,
{
    /// Controller for the resource `label`, reporting `fallback` for errors
    /// without a message of their own.
    pub fn new<F, Fut>(label: &'static str, fallback: &'static str, fetcher: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            shared: Arc::new(Shared {
                label,
                fallback,
                tracking: Mutex::new(Tracking {
                    generation: 0,
                    deps: None,
                }),
                state,
            }),
            fetcher: Box::new(move |deps| fetcher(deps).boxed()),
            gate: None,
        }
    }

    /// Only fetch while `gate` accepts the dependencies; otherwise the
    /// controller stays [`FetchState::Idle`].
    #[must_use]
    pub fn with_gate(mut self, gate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.gate = Some(Box::new(gate));
        self
    }

    /// Resource label used in logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.shared.label
    }

    /// Report the current dependencies.
    ///
    /// Starts a fetch on first activation and whenever `deps` differs from
    /// the previous value. Equal dependencies are a no-op.
    #[must_use]
    pub fn update(&self, deps: D) -> Option<PendingFetch> {
        let mut tracking = self.shared.lock();
        if tracking.deps.as_ref() == Some(&deps) {
            return None;
        }
        tracking.deps = Some(deps.clone());
        self.begin(tracking, deps)
    }

    /// Re-run the fetch with the current dependencies.
    ///
    /// Returns `None` before the first [`Self::update`] or while the gate
    /// rejects the dependencies.
    #[must_use]
    pub fn refetch(&self) -> Option<PendingFetch> {
        let tracking = self.shared.lock();
        let deps = tracking.deps.clone()?;
        self.begin(tracking, deps)
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    fn begin(&self, mut tracking: MutexGuard<'_, Tracking<D>>, deps: D) -> Option<PendingFetch> {
        tracking.generation += 1;
        let generation = tracking.generation;

        if self.gate.as_ref().is_some_and(|gate| !gate(&deps)) {
            debug!(resource = self.shared.label, "dependencies not ready; not fetching");
            self.shared.state.send_replace(FetchState::Idle);
            return None;
        }

        self.shared.state.send_modify(|state| {
            let previous = state.shared_data().cloned();
            *state = FetchState::Loading { previous };
        });
        drop(tracking);

        debug!(resource = self.shared.label, generation, "fetch started");
        let request = (self.fetcher)(deps);
        let shared = Arc::clone(&self.shared);
        Some(PendingFetch {
            generation,
            inner: async move {
                let result = request.await;
                shared.complete(generation, result)
            }
            .boxed(),
        })
    }
}

impl<D, T> Drop for FetchController<D, T> {
    fn drop(&mut self) {
        self.shared.lock().generation += 1;
    }
}
