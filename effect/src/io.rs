//! Io - Deferred Computations
//!
//! An [`Io`] describes a computation without starting it. Nothing happens
//! until [`Io::run`] is awaited, and every `run` starts the computation
//! again from the beginning.

use conflux_core::{BoxFuture, Error, Flow};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Thunk<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

pub struct Io<T, E = Error> {
    thunk: Thunk<T, E>,
}

impl<T, E> Clone for Io<T, E> {
    fn clone(&self) -> Self {
        Self {
            thunk: self.thunk.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Io<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Io").finish_non_exhaustive()
    }
}

impl<T, E> Io<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Defer an async computation.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            thunk: Arc::new(move || -> BoxFuture<'static, Result<T, E>> { Box::pin(f()) }),
        }
    }

    /// Defer a synchronous computation.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(move || std::future::ready(f()))
    }

    /// An Io that yields `value` every time it runs.
    pub fn pure(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move || std::future::ready(Ok(value.clone())))
    }

    /// Defer calling `flow` on `input`.
    pub fn from_flow<In>(flow: Flow<In, T, E>, input: In) -> Self
    where
        In: Clone + Send + Sync + 'static,
    {
        Self::new(move || flow.call(input.clone()))
    }

    pub fn map<U, F>(&self, f: F) -> Io<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let thunk = self.thunk.clone();
        let f = Arc::new(f);
        Io::new(move || {
            let run = thunk();
            let f = f.clone();
            async move { run.await.map(|value| f(value)) }
        })
    }

    /// Chain a dependent Io built from this one's result.
    pub fn flat_map<U, F>(&self, f: F) -> Io<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Io<U, E> + Send + Sync + 'static,
    {
        let thunk = self.thunk.clone();
        let f = Arc::new(f);
        Io::new(move || {
            let run = thunk();
            let f = f.clone();
            async move {
                let value = run.await?;
                f(value).run().await
            }
        })
    }

    /// Execute the deferred computation.
    pub fn run(&self) -> BoxFuture<'static, Result<T, E>> {
        (self.thunk)()
    }
}
