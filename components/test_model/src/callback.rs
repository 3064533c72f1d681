//! Test callbacks.

use core_types::EasyTestsResult;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a [`TestCallback`]
pub type CallbackFuture = Pin<Box<dyn Future<Output = EasyTestsResult<bool>>>>;

/// Zero-argument operation producing a pass/fail result.
///
/// `Ok(true)` passes, `Ok(false)` fails; an error means the callback itself
/// broke and is propagated instead of becoming a status.
pub trait TestCallback {
    /// Start the callback.
    ///
    /// Synchronous work happens before this returns; the future only
    /// waits for the result.
    fn call(&self) -> CallbackFuture;
}

type BoxedFn = Box<dyn Fn() -> CallbackFuture>;

/// Adapts Rust closures into [`TestCallback`]s.
///
/// # Examples
///
/// ```
/// use test_model::{FnCallback, Test};
///
/// let sync = Test::new("adds", FnCallback::sync(|| 1 + 1 == 2));
/// let later = Test::new("waits", FnCallback::new(|| async { true }));
/// assert_eq!(sync.name(), "adds");
/// assert_eq!(later.name(), "waits");
/// ```
pub struct FnCallback {
    inner: BoxedFn,
}

impl FnCallback {
    /// Closure returning a future of `bool`
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = bool> + 'static,
    {
        Self {
            inner: Box::new(move || -> CallbackFuture {
                let future = f();
                Box::pin(async move { Ok(future.await) })
            }),
        }
    }

    /// Closure returning `bool` directly
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Self::new(move || std::future::ready(f()))
    }

    /// Closure whose future may fail
    pub fn fallible<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = EasyTestsResult<bool>> + 'static,
    {
        Self {
            inner: Box::new(move || -> CallbackFuture { Box::pin(f()) }),
        }
    }
}

impl TestCallback for FnCallback {
    fn call(&self) -> CallbackFuture {
        (self.inner)()
    }
}

impl std::fmt::Debug for FnCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnCallback")
    }
}
