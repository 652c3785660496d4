//! Conflux Core - Composable Flows
//!
//! This crate defines the computational core of Conflux:
//! - `Flow`: an async unary transformation with descriptive metadata
//! - `pipe` / `compose`: sequential composition
//! - Collection and fan-out combinators (`map`, `filter`, `reduce`,
//!   `parallel`, `race`)
//! - `EffectFlags`: the side-effect classification carried in metadata
//!
//! Context and effect interpretation live in `conflux-runtime` and
//! `conflux-effect`.

pub mod combinators;
pub mod error;
pub mod flags;
pub mod flow;
pub mod metadata;
pub mod telemetry;

pub use combinators::{filter, map, parallel, race, reduce};
pub use error::{Error, FlowResult, FrozenContextError, InterpretationError};
pub use flags::EffectFlags;
pub use flow::{BoxFuture, Executor, Flow, compose, constant, identity};
pub use metadata::{COMPOSE_MARKER, FlowMetadata};
