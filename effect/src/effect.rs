//! Effect descriptors.
//!
//! An [`Effect`] names one capability a flow needs: an identifier, the flag
//! bits it sets, a handler that can perform it, and an optional cleanup
//! callback.

use async_trait::async_trait;
use conflux_core::EffectFlags;
use conflux_runtime::Context;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Performs an effect on a JSON payload.
///
/// Implemented for every `Fn(Value, Context) -> impl Future<Output =
/// anyhow::Result<Value>>` closure.
#[async_trait]
pub trait EffectHandler: Send + Sync + 'static {
    async fn handle(&self, value: Value, ctx: &Context) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> EffectHandler for F
where
    F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn handle(&self, value: Value, ctx: &Context) -> anyhow::Result<Value> {
        self(value, ctx.clone()).await
    }
}

type Cleanup = Arc<dyn Fn() + Send + Sync>;

/// Descriptor of a side effect a flow may perform.
#[derive(Clone)]
pub struct Effect {
    id: String,
    flags: EffectFlags,
    handler: Arc<dyn EffectHandler>,
    cleanup: Option<Cleanup>,
}

impl Effect {
    pub fn new(id: impl Into<String>, flags: EffectFlags, handler: impl EffectHandler) -> Self {
        Self {
            id: id.into(),
            flags,
            handler: Arc::new(handler),
            cleanup: None,
        }
    }

    /// Attach a callback to run once a flow declaring this effect finishes
    /// under an interpreter.
    pub fn with_cleanup(mut self, cleanup: impl Fn() + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    pub fn handler(&self) -> Arc<dyn EffectHandler> {
        self.handler.clone()
    }

    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Invoke this effect's own handler.
    pub async fn handle(&self, value: Value, ctx: &Context) -> anyhow::Result<Value> {
        self.handler.handle(value, ctx).await
    }

    pub fn cleanup(&self) {
        if let Some(cleanup) = &self.cleanup {
            cleanup();
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Shorthand for [`Effect::new`].
pub fn effect(id: impl Into<String>, flags: EffectFlags, handler: impl EffectHandler) -> Effect {
    Effect::new(id, flags, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn handler_receives_value_and_context() {
        let log = effect(
            "log",
            EffectFlags::IO,
            |value: Value, ctx: Context| async move {
                let prefix = ctx.get_named::<String>("prefix").cloned().unwrap_or_default();
                anyhow::Ok(json!(format!("{prefix}{}", value.as_str().unwrap_or_default())))
            },
        );
        let ctx = Context::new().with_value("prefix", "> ".to_string()).unwrap();

        assert_eq!(log.id(), "log");
        assert_eq!(log.flags(), EffectFlags::IO);
        assert_eq!(log.handle(json!("hello"), &ctx).await.unwrap(), json!("> hello"));
    }

    #[test]
    fn cleanup_is_optional() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let plain = effect("noop", EffectFlags::NONE, |v: Value, _: Context| async move { anyhow::Ok(v) });
        let tracked = plain.clone().with_cleanup(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        plain.cleanup();
        tracked.cleanup();
        assert!(!plain.has_cleanup());
        assert!(tracked.has_cleanup());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
