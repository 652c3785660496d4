//! Conflux Runtime - Ambient Context
//!
//! * [`Context`]: immutable, parent-delegating bindings
//! * [`Key`] / [`Symbol`]: named, symbolic and typed binding keys
//! * Ambient propagation: [`Context::run`], [`Context::current`],
//!   [`contextual`] flows
//! * [`ContextConfig`]: root contexts loaded from TOML

pub mod ambient;
pub mod config;
pub mod context;
pub mod key;
mod store;

pub use ambient::{contextual, contextual_fn};
pub use config::{ConfigError, ContextConfig};
pub use context::{Bindings, Context};
pub use conflux_core::FrozenContextError;
pub use key::{ContextKey, Key, Symbol};
pub use store::{MAX_DEPTH, Value};

pub mod prelude {
    pub use crate::ambient::{contextual, contextual_fn};
    pub use crate::context::{Bindings, Context};
    pub use crate::key::{ContextKey, Key, Symbol};
}
