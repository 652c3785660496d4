//! # Conflux
//!
//! Composable async flows with an immutable ambient context and declared
//! side effects.
//!
//! * `conflux-core`: [`Flow`], [`pipe`](Flow::pipe), [`compose`] and the
//!   collection combinators
//! * `conflux-runtime`: [`Context`] and ambient propagation via
//!   [`Context::run`]
//! * `conflux-effect`: [`EffectFlow`], [`EffectInterpreter`] and [`Io`]
//!
//! ```rust,ignore
//! use conflux::prelude::*;
//!
//! let greet = contextual_fn(|name: String, ctx: &Context| {
//!     let greeting = ctx.get_named::<String>("greeting").cloned().unwrap_or_default();
//!     Ok::<_, Error>(format!("{greeting}, {name}"))
//! });
//! let ctx = Context::from_bindings(Bindings::new().bind("greeting", "Hello".to_string()));
//! assert_eq!(ctx.run(&greet, "Ada".into()).await?, "Hello, Ada");
//! ```

pub mod telemetry;

pub use conflux_core::compose;
pub use conflux_effect::standard;
pub use conflux_runtime::config;

pub use conflux_core::{
    BoxFuture, EffectFlags, Error, Flow, FlowMetadata, FlowResult, FrozenContextError,
    InterpretationError, constant, filter, identity, map, parallel, race, reduce,
};
pub use conflux_effect::{
    Effect, EffectFlow, EffectHandler, EffectInterpreter, HasEffects, Io, combine_effects, effect,
    effectful, effectful_with_flags, has_effect, is_pure, pure,
};
pub use conflux_runtime::{
    Bindings, ContextConfig, Context, ContextKey, Key, Symbol, contextual, contextual_fn,
};

pub mod prelude {
    pub use conflux_core::{
        EffectFlags, Error, Flow, FlowResult, compose, constant, filter, identity, map, parallel,
        race, reduce,
    };
    pub use conflux_effect::prelude::*;
    pub use conflux_runtime::prelude::*;
}
