//! EffectInterpreter - Effect Handler Registry
//!
//! The interpreter maps effect ids to handlers. Running an [`EffectFlow`]
//! through it checks that every declared effect has a registered handler,
//! evaluates the flow inside the given Context, and then runs each declared
//! effect's cleanup callback.
//!
//! Handlers are not substituted into the flow body: a body that wants an
//! effect performed calls [`EffectInterpreter::handle`] itself (typically
//! through an `Arc<EffectInterpreter>` bound in the Context).

use crate::effect::{Effect, EffectHandler};
use crate::flow::EffectFlow;
use crate::standard;
use ahash::AHashMap;
use conflux_core::InterpretationError;
use conflux_runtime::Context;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Runs each effect's cleanup when dropped, so cleanups fire on success,
/// failure, and cancellation alike.
struct CleanupGuard<'a> {
    effects: &'a [Effect],
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        for effect in self.effects.iter().filter(|effect| effect.has_cleanup()) {
            tracing::trace!(effect = effect.id(), "Running effect cleanup");
            effect.cleanup();
        }
    }
}

/// Registry of effect handlers.
#[derive(Default)]
pub struct EffectInterpreter {
    handlers: RwLock<AHashMap<String, Arc<dyn EffectHandler>>>,
}

impl EffectInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter with deterministic handlers for every standard effect.
    ///
    /// | effect    | result                |
    /// |-----------|-----------------------|
    /// | `read`    | `null`                |
    /// | `write`   | the payload           |
    /// | `io`      | `null`                |
    /// | `network` | `null`                |
    /// | `random`  | `0.5`                 |
    /// | `time`    | `0`                   |
    /// | `throw`   | the payload           |
    /// | `async`   | the payload           |
    pub fn pure() -> Self {
        let interpreter = Self::new();
        interpreter.register_handler(standard::READ, standard::returning(Value::Null));
        interpreter.register_handler(standard::WRITE, standard::passthrough());
        interpreter.register_handler(standard::IO, standard::returning(Value::Null));
        interpreter.register_handler(standard::NETWORK, standard::returning(Value::Null));
        interpreter.register_handler(standard::RANDOM, standard::returning(json!(0.5)));
        interpreter.register_handler(standard::TIME, standard::returning(json!(0)));
        interpreter.register_handler(standard::THROW, standard::passthrough());
        interpreter.register_handler(standard::ASYNC, standard::passthrough());
        interpreter
    }

    /// Register `effect`'s own handler under its id, replacing any previous
    /// handler for that id.
    pub fn register(&self, effect: &Effect) -> &Self {
        self.insert(effect.id().to_owned(), effect.handler());
        self
    }

    pub fn register_handler(&self, id: impl Into<String>, handler: impl EffectHandler) -> &Self {
        self.insert(id.into(), Arc::new(handler));
        self
    }

    fn insert(&self, id: String, handler: Arc<dyn EffectHandler>) {
        tracing::debug!(effect = %id, "Registering effect handler");
        self.handlers.write().insert(id, handler);
    }

    /// Remove the handler for `id`, returning whether one was registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.handlers.write().remove(id).is_some()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.handlers.read().contains_key(id)
    }

    /// Registered effect ids, sorted.
    pub fn registered(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn handler(&self, id: &str) -> Option<Arc<dyn EffectHandler>> {
        self.handlers.read().get(id).cloned()
    }

    /// Perform effect `id` on `value` with the registered handler.
    pub async fn handle(
        &self,
        id: &str,
        value: Value,
        ctx: &Context,
    ) -> Result<Value, InterpretationError> {
        // clone out so the lock is not held across the handler's await
        let handler = self
            .handler(id)
            .ok_or_else(|| InterpretationError::MissingHandler {
                effect: id.to_owned(),
            })?;
        handler
            .handle(value, ctx)
            .await
            .map_err(|err| InterpretationError::HandlerFailed {
                effect: id.to_owned(),
                message: format!("{err:#}"),
            })
    }

    /// Check that every effect declared by `flow` has a handler. Reports the
    /// first missing id in declaration order.
    pub fn validate<In, Out, E>(&self, flow: &EffectFlow<In, Out, E>) -> Result<(), InterpretationError>
    where
        In: Send + 'static,
        Out: Send + 'static,
        E: Send + 'static,
    {
        let handlers = self.handlers.read();
        match flow.effect_ids().find(|id| !handlers.contains_key(*id)) {
            Some(missing) => {
                tracing::warn!(
                    effect = missing,
                    flow = flow.metadata().display_name(),
                    "No handler registered for declared effect"
                );
                Err(InterpretationError::MissingHandler {
                    effect: missing.to_owned(),
                })
            }
            None => Ok(()),
        }
    }

    /// Validate `flow`'s declared effects, then evaluate it with `ctx` as the
    /// ambient context.
    ///
    /// Every declared effect's cleanup runs exactly once afterwards, whether
    /// validation failed, the flow failed, or it succeeded.
    pub async fn run<In, Out, E>(
        &self,
        flow: &EffectFlow<In, Out, E>,
        input: In,
        ctx: &Context,
    ) -> Result<Out, E>
    where
        In: Send + 'static,
        Out: Send + 'static,
        E: From<InterpretationError> + Send + 'static,
    {
        let _cleanup = CleanupGuard {
            effects: flow.effects(),
        };
        self.validate(flow)?;
        tracing::debug!(
            flow = flow.metadata().display_name(),
            effects = %flow.flags(),
            "Interpreting effect flow"
        );
        ctx.run(flow.flow(), input).await
    }
}

impl fmt::Debug for EffectInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectInterpreter")
            .field("registered", &self.registered())
            .finish()
    }
}
