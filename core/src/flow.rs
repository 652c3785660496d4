//! # Flow: Composable Async Transformation
//!
//! A `Flow<In, Out, E>` maps an `In` to a `Result<Out, E>`, possibly
//! suspending along the way. Flows are immutable handles: cloning one shares
//! the same body, and every combinator returns a new Flow.
//!
//! ```rust,ignore
//! use conflux_core::{Error, Flow};
//!
//! let double = Flow::<i32, i32, Error>::from_fn(|x| x * 2).named("double");
//! let inc = Flow::from_fn(|x: i32| x + 1).named("inc");
//!
//! let chain = double.pipe(&inc);
//! assert_eq!(chain.call(5).await.unwrap(), 11);
//! assert_eq!(chain.name(), Some("double >> inc"));
//! ```

use crate::error::Error;
use crate::flags::EffectFlags;
use crate::metadata::FlowMetadata;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for async boxed futures used in Flow execution.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The shared body of a Flow.
pub type Executor<In, Out, E> =
    Arc<dyn Fn(In) -> BoxFuture<'static, Result<Out, E>> + Send + Sync>;

/// A composable unary transformation.
pub struct Flow<In, Out, E = Error> {
    metadata: FlowMetadata,
    executor: Executor<In, Out, E>,
}

impl<In, Out, E> Clone for Flow<In, Out, E> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<In, Out, E> fmt::Debug for Flow<In, Out, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl<In, Out, E> Flow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    /// Build a flow from an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, E>> + Send + 'static,
    {
        Self::from_executor(
            Arc::new(move |input: In| -> BoxFuture<'static, Result<Out, E>> {
                Box::pin(f(input))
            }),
            FlowMetadata::default(),
        )
    }

    /// Build a flow from an infallible synchronous function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        Self::from_executor(
            Arc::new(move |input: In| -> BoxFuture<'static, Result<Out, E>> {
                Box::pin(std::future::ready(Ok(f(input))))
            }),
            FlowMetadata::default(),
        )
    }

    /// Build a flow from a fallible synchronous function.
    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: Fn(In) -> Result<Out, E> + Send + Sync + 'static,
    {
        Self::from_executor(
            Arc::new(move |input: In| -> BoxFuture<'static, Result<Out, E>> {
                Box::pin(std::future::ready(f(input)))
            }),
            FlowMetadata::default(),
        )
    }

    pub fn from_executor(executor: Executor<In, Out, E>, metadata: FlowMetadata) -> Self {
        Self { metadata, executor }
    }

    pub fn with_metadata(mut self, metadata: FlowMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.insert(tag.into());
        self
    }

    /// Declare the flow pure. Not verified.
    pub fn assert_pure(mut self) -> Self {
        self.metadata.pure = true;
        self
    }

    /// Declare the flow safe to memoize. Not verified.
    pub fn assert_memoizable(mut self) -> Self {
        self.metadata.memoizable = true;
        self
    }

    /// Replace the effect-flag field of the metadata.
    pub fn with_effects(mut self, effects: EffectFlags) -> Self {
        self.metadata.effects = Some(effects);
        self
    }

    pub fn metadata(&self) -> &FlowMetadata {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn executor(&self) -> &Executor<In, Out, E> {
        &self.executor
    }

    /// Invoke the flow.
    pub fn call(&self, input: In) -> BoxFuture<'static, Result<Out, E>> {
        (self.executor)(input)
    }

    /// Sequential composition: run `self`, then feed its output to `next`.
    ///
    /// A failure in either stage is returned as-is and skips the rest.
    pub fn pipe<Next>(&self, next: &Flow<Out, Next, E>) -> Flow<In, Next, E>
    where
        Next: Send + 'static,
    {
        tracing::trace!(
            from = self.metadata.display_name(),
            to = next.metadata.display_name(),
            "Piping flows"
        );

        let prev = self.executor.clone();
        let then = next.executor.clone();
        let executor: Executor<In, Next, E> = Arc::new(move |input: In| -> BoxFuture<'static, Result<Next, E>> {
            let prev = prev.clone();
            let then = then.clone();
            Box::pin(async move {
                let mid = prev(input).await?;
                then(mid).await
            })
        });

        Flow {
            metadata: self.metadata.merge(&next.metadata),
            executor,
        }
    }

    /// Pipe into a synchronous function.
    pub fn map_output<Next, F>(&self, f: F) -> Flow<In, Next, E>
    where
        Next: Send + 'static,
        F: Fn(Out) -> Next + Send + Sync + 'static,
    {
        self.pipe(&Flow::from_fn(f))
    }

    /// Convert the error type, keeping body and metadata.
    pub fn map_err<E2, F>(&self, f: F) -> Flow<In, Out, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Send + Sync + 'static,
    {
        let inner = self.executor.clone();
        let f = Arc::new(f);
        let executor: Executor<In, Out, E2> = Arc::new(move |input: In| -> BoxFuture<'static, Result<Out, E2>> {
            let inner = inner.clone();
            let f = f.clone();
            Box::pin(async move { inner(input).await.map_err(|e| f(e)) })
        });
        Flow::from_executor(executor, self.metadata.clone())
    }
}

/// A flow returning its input unchanged.
pub fn identity<T, E>() -> Flow<T, T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    Flow::from_fn(|input: T| input).with_metadata(FlowMetadata::pure("identity"))
}

/// A flow that ignores its input and always yields `value`.
pub fn constant<In, T, E>(value: T) -> Flow<In, T, E>
where
    In: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    Flow::from_fn(move |_input: In| value.clone()).with_metadata(FlowMetadata::pure("constant"))
}

/// Left fold of `pipe` over same-typed flows.
///
/// No flows yields `identity()`; a single flow is returned unchanged.
/// For stages with differing types use [`compose!`](crate::compose!).
pub fn compose<T, E, I>(flows: I) -> Flow<T, T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Flow<T, T, E>>,
{
    let mut flows = flows.into_iter();
    match flows.next() {
        None => identity(),
        Some(first) => flows.fold(first, |acc, next| acc.pipe(&next)),
    }
}

/// Pipe any number of flows left to right.
///
/// `compose!(f, g, h)` is `f.pipe(&g).pipe(&h)`; `compose!()` is `identity()`.
#[macro_export]
macro_rules! compose {
    () => {
        $crate::identity()
    };
    ($first:expr $(, $rest:expr)* $(,)?) => {{
        let flow = ::core::clone::Clone::clone(&$first);
        $( let flow = flow.pipe(&$rest); )*
        flow
    }};
}
