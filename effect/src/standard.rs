//! The standard effect set: one descriptor per effect flag.
//!
//! Their default handlers hand the payload back unchanged; real behaviour is
//! supplied by registering handlers on an
//! [`EffectInterpreter`](crate::EffectInterpreter).

use crate::effect::{Effect, EffectHandler};
use conflux_core::EffectFlags;
use conflux_runtime::Context;
use serde_json::Value;

pub const READ: &str = "read";
pub const WRITE: &str = "write";
pub const IO: &str = "io";
pub const NETWORK: &str = "network";
pub const RANDOM: &str = "random";
pub const TIME: &str = "time";
pub const THROW: &str = "throw";
pub const ASYNC: &str = "async";

pub(crate) fn passthrough() -> impl EffectHandler {
    |value: Value, _ctx: Context| std::future::ready(anyhow::Ok(value))
}

pub(crate) fn returning(fixed: Value) -> impl EffectHandler {
    move |_value: Value, _ctx: Context| std::future::ready(anyhow::Ok(fixed.clone()))
}

pub fn read() -> Effect {
    Effect::new(READ, EffectFlags::READ, passthrough())
}

pub fn write() -> Effect {
    Effect::new(WRITE, EffectFlags::WRITE, passthrough())
}

pub fn io() -> Effect {
    Effect::new(IO, EffectFlags::IO, passthrough())
}

pub fn network() -> Effect {
    Effect::new(NETWORK, EffectFlags::NETWORK, passthrough())
}

pub fn random() -> Effect {
    Effect::new(RANDOM, EffectFlags::RANDOM, passthrough())
}

pub fn time() -> Effect {
    Effect::new(TIME, EffectFlags::TIME, passthrough())
}

pub fn throw() -> Effect {
    Effect::new(THROW, EffectFlags::THROW, passthrough())
}

pub fn async_effect() -> Effect {
    Effect::new(ASYNC, EffectFlags::ASYNC, passthrough())
}

/// Every standard effect, in flag order.
pub fn all() -> Vec<Effect> {
    vec![
        read(),
        write(),
        io(),
        network(),
        random(),
        time(),
        throw(),
        async_effect(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_effect_per_flag() {
        let effects = all();
        let flags: Vec<_> = effects.iter().map(Effect::flags).collect();
        let expected: Vec<_> = EffectFlags::ALL.iter().map(|(flag, _)| *flag).collect();
        assert_eq!(flags, expected);
        for (effect, (_, name)) in effects.iter().zip(EffectFlags::ALL) {
            assert_eq!(effect.id(), name.to_lowercase());
        }
    }

    #[tokio::test]
    async fn default_handlers_pass_values_through() {
        let ctx = Context::new();
        assert_eq!(io().handle(json!({"k": 1}), &ctx).await.unwrap(), json!({"k": 1}));
        assert_eq!(
            returning(json!(7)).handle(json!(null), &ctx).await.unwrap(),
            json!(7)
        );
    }
}
