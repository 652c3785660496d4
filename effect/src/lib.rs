//! Conflux Effect - Declared Side Effects
//!
//! * [`Effect`]: a named capability with flag bits, handler and cleanup
//! * [`EffectFlow`]: a Flow plus the Effects it declares; composition unions
//!   effects and ORs their flags
//! * [`EffectInterpreter`]: handler registry that validates declared effects
//!   and runs flows inside a Context
//! * [`Io`]: deferred computations that only run when asked

pub mod effect;
pub mod flow;
pub mod interpreter;
pub mod io;
pub mod standard;

pub use conflux_core::InterpretationError;
pub use effect::{Effect, EffectHandler, effect};
pub use flow::{
    EffectFlow, HasEffects, combine_effects, effectful, effectful_with_flags, has_effect, is_pure,
    pure,
};
pub use interpreter::EffectInterpreter;
pub use io::Io;

pub mod prelude {
    pub use crate::effect::{Effect, EffectHandler, effect};
    pub use crate::flow::{EffectFlow, HasEffects, effectful, has_effect, is_pure, pure};
    pub use crate::interpreter::EffectInterpreter;
    pub use crate::io::Io;
    pub use crate::standard;
}
