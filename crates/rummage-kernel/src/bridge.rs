//! Adapters between the three calling conventions.
//!
//! Every operation is written once, as an `async fn` returning
//! [`OpResult`]. This module turns that future into:
//!
//! - a **blocking** call ([`wait`]), which drives the future to completion
//!   before returning;
//! - a **callback** call ([`dispatch`]), which returns
//!   [`Status::Pending`] at once and later settles exactly one of the
//!   caller's callbacks;
//!
//! and, the other way round, turns a callback-style starter back into a
//! future ([`promisify`]) without touching status semantics.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};

use rummage_types::{Envelope, Status};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use crate::error::{Failure, FsError, OpResult};

type SuccessFn<T> = Box<dyn FnOnce(Envelope<T>) + Send + 'static>;
type FailureFn = Box<dyn FnOnce(Failure) + Send + 'static>;

/// Completion callbacks for a callback-form call.
///
/// The success callback receives the final envelope, including
/// operation-level statuses such as `PATH_NOT_FOUND`. The failure
/// callback receives a [`Failure`]. At most one of them runs, at most once.
pub struct Callbacks<T> {
    on_success: Option<SuccessFn<T>>,
    on_failure: Option<FailureFn>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_failure: None,
        }
    }
}

impl<T> fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

impl<T: Send + 'static> Callbacks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl FnOnce(Envelope<T>) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl FnOnce(Failure) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    pub fn has_success(&self) -> bool {
        self.on_success.is_some()
    }

    /// Callbacks for an operation producing `U`, whose success payload is
    /// converted with `f` before reaching these callbacks.
    pub fn map<U: Send + 'static>(self, f: impl FnOnce(U) -> T + Send + 'static) -> Callbacks<U> {
        let on_success = self.on_success.map(|success| -> SuccessFn<U> {
            Box::new(move |envelope: Envelope<U>| success(envelope.map(f)))
        });
        Callbacks {
            on_success,
            on_failure: self.on_failure,
        }
    }

    /// Deliver the outcome to exactly one callback.
    pub(crate) fn settle(self, result: OpResult<T>) {
        match result {
            Ok(envelope) => {
                if let Some(success) = self.on_success {
                    success(envelope);
                }
            }
            Err(failure) => match self.on_failure {
                Some(fail) => fail(failure),
                None => tracing::warn!(error = %failure, "no failure callback, dropping error"),
            },
        }
    }
}

static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

/// Private runtime used when the caller is not inside one.
fn bridge_runtime() -> Result<&'static Runtime, FsError> {
    RUNTIME
        .get_or_init(|| {
            Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("rummage-bridge")
                .enable_all()
                .build()
                .map_err(|err| err.to_string())
        })
        .as_ref()
        .map_err(|err| FsError::Runtime(err.clone()))
}

/// Where callback-form work is spawned: the caller's runtime if there is
/// one, the bridge runtime otherwise.
fn executor() -> Result<Handle, FsError> {
    match Handle::try_current() {
        Ok(handle) => Ok(handle),
        Err(_) => bridge_runtime().map(|rt| rt.handle().clone()),
    }
}

/// Run `work` to completion on the current thread.
///
/// Safe to call from inside another tokio runtime: the future is then
/// driven on a scoped helper thread instead of nesting runtimes.
pub fn block_on<F>(work: F) -> Result<F::Output, FsError>
where
    F: Future + Send,
    F::Output: Send,
{
    let runtime = bridge_runtime()?;
    if Handle::try_current().is_err() {
        return Ok(runtime.block_on(work));
    }
    std::thread::scope(|scope| scope.spawn(|| runtime.block_on(work)).join())
        .map_err(|_| FsError::Runtime("blocking call panicked".to_string()))
}

/// Blocking form of an operation.
pub fn wait<T, F>(work: F) -> OpResult<T>
where
    F: Future<Output = OpResult<T>> + Send,
    T: Send,
{
    block_on(work)?
}

/// Callback form of an operation whose synchronous preconditions have
/// already passed.
///
/// Returns [`Status::Pending`]; the outcome of `work` is delivered later to
/// `callbacks`. Callbacks run on the blocking pool, never on a runtime
/// worker, so they may themselves use the blocking form.
pub(crate) fn dispatch<T, F>(callbacks: Callbacks<T>, work: F) -> Status
where
    T: Send + 'static,
    F: Future<Output = OpResult<T>> + Send + 'static,
{
    match executor() {
        Ok(handle) => {
            handle.spawn(async move {
                let result = work.await;
                if let Err(err) = tokio::task::spawn_blocking(move || callbacks.settle(result)).await {
                    tracing::warn!(error = %err, "callback did not complete");
                }
            });
        }
        Err(err) => callbacks.settle(Err(Failure::Io(err))),
    }
    Status::Pending
}

/// Callback form of an operation, preconditions included.
///
/// `gate` is the outcome of the synchronous checks that precede the
/// callback check (options, trust). A refusal there, or a missing success
/// callback, is returned synchronously and no callback ever runs.
/// Otherwise `work` is started on a clone of `entity` and `PENDING` is
/// returned.
pub(crate) fn start<E, O, T, W, Fut>(
    entity: &E,
    gate: Result<O, Status>,
    callbacks: Callbacks<T>,
    work: W,
) -> Status
where
    E: Clone + Send + 'static,
    O: Send + 'static,
    T: Send + 'static,
    W: FnOnce(E, O) -> Fut,
    Fut: Future<Output = OpResult<T>> + Send + 'static,
{
    let options = match gate {
        Ok(options) => options,
        Err(status) => return status,
    };
    if !callbacks.has_success() {
        return Status::MissingCallback;
    }
    dispatch(callbacks, work(entity.clone(), options))
}

/// Turn a callback-style starter into a future.
///
/// A starter that refuses synchronously (any status other than `PENDING`)
/// resolves at once to an envelope carrying that status.
pub async fn promisify<T, S>(start: S) -> OpResult<T>
where
    T: Send + 'static,
    S: FnOnce(Callbacks<T>) -> Status,
{
    let (tx, rx) = oneshot::channel::<OpResult<T>>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let tx_failure = tx.clone();

    let callbacks = Callbacks::new()
        .on_success(move |envelope| send_once(&tx, Ok(envelope)))
        .on_failure(move |failure| send_once(&tx_failure, Err(failure)));

    let status = start(callbacks);
    if !status.is_pending() {
        return Ok(Envelope::status(status));
    }

    rx.await
        .map_err(|_| Failure::Io(FsError::Runtime("operation dropped its callbacks".to_string())))?
}

fn send_once<T>(slot: &Mutex<Option<oneshot::Sender<T>>>, value: T) {
    let sender = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(sender) = sender {
        let _ = sender.send(value);
    }
}
