//! Ambient Context Propagation
//!
//! The active Context lives in a task-local slot. [`Context::run`] and
//! [`Context::scope`] install a context for the duration of one future,
//! across every `.await` inside it, and put the previous value back when the
//! future completes, fails, or is dropped. Nested scopes stack; separate tasks
//! never see each other's slot.
//!
//! Flows built with [`contextual`] read the slot when they execute, so
//! application code never has to thread a Context through its signatures.

use crate::context::Context;
use conflux_core::{BoxFuture, Flow};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

tokio::task_local! {
    static CURRENT: Context;
}

impl Context {
    /// The context installed by the innermost enclosing scope, or the
    /// shared frozen empty context when none is active.
    pub fn current() -> Context {
        CURRENT
            .try_with(Context::clone)
            .unwrap_or_else(|_| Context::empty())
    }

    /// Whether any context is installed for the current task.
    pub fn is_active() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Evaluate `flow` with this context installed as the ambient context.
    pub async fn run<In, Out, E>(&self, flow: &Flow<In, Out, E>, input: In) -> Result<Out, E>
    where
        In: Send + 'static,
        Out: Send + 'static,
        E: Send + 'static,
    {
        tracing::trace!(flow = flow.metadata().display_name(), "Running flow in context");
        // the call itself must happen inside the scope: sync bodies run eagerly
        CURRENT
            .scope(self.clone(), async move { flow.call(input).await })
            .await
    }

    /// Poll `future` with this context installed as the ambient context.
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        CURRENT.scope(self.clone(), future).await
    }

    /// Run a synchronous closure with this context installed.
    pub fn sync_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self.clone(), f)
    }

    /// Spawn `future` on the tokio runtime with this context installed in the
    /// new task. Plain `tokio::spawn` starts with no ambient context.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(CURRENT.scope(self.clone(), future))
    }
}

/// Build a flow whose async body also receives the ambient context.
pub fn contextual<In, Out, E, F, Fut>(f: F) -> Flow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
    F: Fn(In, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Out, E>> + Send + 'static,
{
    let f = Arc::new(f);
    Flow::from_executor(
        Arc::new(move |input: In| -> BoxFuture<'static, Result<Out, E>> {
            let f = f.clone();
            Box::pin(async move { f(input, Context::current()).await })
        }),
        Default::default(),
    )
    .tagged("contextual")
}

/// Build a flow whose synchronous body also receives the ambient context.
pub fn contextual_fn<In, Out, E, F>(f: F) -> Flow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
    F: Fn(In, &Context) -> Result<Out, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    contextual(move |input: In, ctx: Context| {
        let f = f.clone();
        async move { f(input, &ctx) }
    })
}
