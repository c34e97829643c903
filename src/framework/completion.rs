//! # Completion Adapter
//!
//! A service's `start` and `stop` can signal completion in one of two ways:
//!
//! - **Callback**: the operation receives a trailing [`Completion`] handle and signals it
//!   (possibly from another task) with `Ok(())` or an error.
//! - **Deferred**: the operation returns a future that resolves to the outcome.
//!
//! [`Operation`] is the tagged variant that records which convention an operation uses.
//! The tag is chosen once, when the [`ServiceDescriptor`](crate::framework::ServiceDescriptor)
//! is built, and [`Operation::invoke`] normalizes both shapes into one [`ServiceResult`].
//! Sequencing code above this module never looks at the tag.

use crate::framework::error::{BoxError, CompletionDropped, ServiceResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Single-use completion handle handed to callback-style operations.
///
/// Signalling consumes the handle, so an operation can complete at most once.
/// Dropping it without signalling completes the operation with [`CompletionDropped`].
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<ServiceResult>,
}

impl Completion {
    /// Creates a handle together with the receiver its signal arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<ServiceResult>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Signal the outcome of the operation.
    pub fn complete(self, result: ServiceResult) {
        // The receiver is gone only if the walk itself was dropped.
        let _ = self.sender.send(result);
    }

    /// Signal success.
    pub fn ok(self) {
        self.complete(Ok(()));
    }

    /// Signal failure with the given error.
    pub fn fail(self, error: impl Into<BoxError>) {
        self.complete(Err(error.into()));
    }
}

/// The calling convention an operation was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    Callback,
    Deferred,
}

/// Callback-style operation body.
pub type CallbackFn<I> = Arc<dyn Fn(I, Completion) + Send + Sync>;

/// Deferred-style operation body.
pub type DeferredFn<I> = Arc<dyn Fn(I) -> BoxFuture<'static, ServiceResult> + Send + Sync>;

/// A lifecycle operation tagged with its calling convention.
///
/// `I` is the operation's input: the dependency clients for `start`, `()` for `stop`.
pub enum Operation<I> {
    Callback(CallbackFn<I>),
    Deferred(DeferredFn<I>),
}

impl<I: Send + 'static> Operation<I> {
    /// Wrap a callback-style body.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(I, Completion) + Send + Sync + 'static,
    {
        Operation::Callback(Arc::new(f))
    }

    /// Wrap a deferred-style body.
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        Operation::Deferred(Arc::new(move |input| f(input).boxed()))
    }

    pub fn convention(&self) -> Convention {
        match self {
            Operation::Callback(_) => Convention::Callback,
            Operation::Deferred(_) => Convention::Deferred,
        }
    }

    /// Run the operation and wait for its single completion signal.
    pub async fn invoke(&self, input: I) -> ServiceResult {
        match self {
            Operation::Callback(body) => {
                let (done, signal) = Completion::channel();
                body(input, done);
                match signal.await {
                    Ok(result) => result,
                    Err(_) => Err(CompletionDropped.into()),
                }
            }
            Operation::Deferred(body) => body(input).await,
        }
    }
}

impl<I> Clone for Operation<I> {
    fn clone(&self) -> Self {
        match self {
            Operation::Callback(body) => Operation::Callback(Arc::clone(body)),
            Operation::Deferred(body) => Operation::Deferred(Arc::clone(body)),
        }
    }
}

impl<I> fmt::Debug for Operation<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Callback(_) => f.write_str("Operation::Callback"),
            Operation::Deferred(_) => f.write_str("Operation::Deferred"),
        }
    }
}
