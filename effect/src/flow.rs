//! EffectFlow - Flows With Declared Effects
//!
//! An [`EffectFlow`] pairs a Flow with the Effects it declares and their
//! combined flag. Composition unions the declared effects and ORs the flags,
//! so a composed flow always reports at least every effect of its parts.

use crate::effect::Effect;
use conflux_core::{EffectFlags, Error, Flow, FlowMetadata};
use std::fmt;

/// Anything that may carry effect-flag metadata.
pub trait HasEffects {
    /// `None` when there is no effect metadata at all.
    fn effect_flags(&self) -> Option<EffectFlags>;
}

impl HasEffects for FlowMetadata {
    fn effect_flags(&self) -> Option<EffectFlags> {
        self.effects
    }
}

impl<In, Out, E> HasEffects for Flow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    fn effect_flags(&self) -> Option<EffectFlags> {
        self.metadata().effects
    }
}

/// A Flow together with its declared Effects.
pub struct EffectFlow<In, Out, E = Error> {
    flow: Flow<In, Out, E>,
    effects: Vec<Effect>,
    flags: EffectFlags,
}

impl<In, Out, E> Clone for EffectFlow<In, Out, E> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
            effects: self.effects.clone(),
            flags: self.flags,
        }
    }
}

impl<In, Out, E> fmt::Debug for EffectFlow<In, Out, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectFlow")
            .field("flow", &self.flow)
            .field("effects", &self.effects)
            .field("flags", &self.flags)
            .finish()
    }
}

impl<In, Out, E> HasEffects for EffectFlow<In, Out, E> {
    fn effect_flags(&self) -> Option<EffectFlags> {
        Some(self.flags)
    }
}

fn push_unique(into: &mut Vec<Effect>, effects: impl IntoIterator<Item = Effect>) {
    for effect in effects {
        if !into.iter().any(|known| known.id() == effect.id()) {
            into.push(effect);
        }
    }
}

impl<In, Out, E> EffectFlow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    fn assemble(flow: Flow<In, Out, E>, effects: Vec<Effect>, flags: EffectFlags) -> Self {
        Self {
            flow: flow.with_effects(flags),
            effects,
            flags,
        }
    }

    pub fn flow(&self) -> &Flow<In, Out, E> {
        &self.flow
    }

    pub fn into_flow(self) -> Flow<In, Out, E> {
        self.flow
    }

    /// Declared effects, deduplicated by id, in declaration order.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effect_ids(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(Effect::id)
    }

    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    pub fn metadata(&self) -> &FlowMetadata {
        self.flow.metadata()
    }

    /// Call the underlying flow directly, bypassing any interpreter.
    pub fn call(&self, input: In) -> conflux_core::BoxFuture<'static, Result<Out, E>> {
        self.flow.call(input)
    }

    /// Sequential composition with another EffectFlow.
    pub fn pipe<Next>(&self, next: &EffectFlow<Out, Next, E>) -> EffectFlow<In, Next, E>
    where
        Next: Send + 'static,
    {
        let mut effects = self.effects.clone();
        push_unique(&mut effects, next.effects.iter().cloned());
        EffectFlow::assemble(
            self.flow.pipe(&next.flow),
            effects,
            self.flags | next.flags,
        )
    }

    /// Sequential composition with a plain Flow; its effect metadata, if
    /// any, is folded into the combined flag.
    pub fn pipe_flow<Next>(&self, next: &Flow<Out, Next, E>) -> EffectFlow<In, Next, E>
    where
        Next: Send + 'static,
    {
        let flags = self.flags | next.effect_flags().unwrap_or_default();
        EffectFlow::assemble(self.flow.pipe(next), self.effects.clone(), flags)
    }
}

/// Declare `effects` for `flow`; the combined flag is their OR.
pub fn effectful<In, Out, E>(
    flow: Flow<In, Out, E>,
    effects: impl IntoIterator<Item = Effect>,
) -> EffectFlow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    let mut unique = Vec::new();
    push_unique(&mut unique, effects);
    let flags = unique.iter().map(Effect::flags).collect();
    EffectFlow::assemble(flow, unique, flags)
}

/// Declare `effects` for `flow` with an explicit combined flag.
pub fn effectful_with_flags<In, Out, E>(
    flow: Flow<In, Out, E>,
    effects: impl IntoIterator<Item = Effect>,
    flags: EffectFlags,
) -> EffectFlow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    let mut unique = Vec::new();
    push_unique(&mut unique, effects);
    EffectFlow::assemble(flow, unique, flags)
}

/// Declare `flow` free of side effects: no Effects, `NONE` flag, and the
/// metadata marked pure.
pub fn pure<In, Out, E>(flow: Flow<In, Out, E>) -> EffectFlow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    EffectFlow::assemble(flow.assert_pure(), Vec::new(), EffectFlags::NONE)
}

/// Whether `flow` declares any of the bits in `flag`. Flows without effect
/// metadata report `false`.
pub fn has_effect(flow: &(impl HasEffects + ?Sized), flag: EffectFlags) -> bool {
    flow.effect_flags().is_some_and(|flags| flags.intersects(flag))
}

/// Whether `flow` carries effect metadata equal to `NONE`.
pub fn is_pure(flow: &(impl HasEffects + ?Sized)) -> bool {
    flow.effect_flags() == Some(EffectFlags::NONE)
}

/// OR of every operand's flags; operands without metadata add nothing.
pub fn combine_effects<'a>(flows: impl IntoIterator<Item = &'a dyn HasEffects>) -> EffectFlags {
    flows
        .into_iter()
        .filter_map(HasEffects::effect_flags)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard;

    fn double() -> Flow<i32, i32> {
        Flow::from_fn(|x: i32| x * 2).named("double")
    }

    #[test]
    fn combined_flag_is_or_of_effects() {
        let flow = effectful(double(), [standard::read(), standard::io()]);
        assert_eq!(flow.flags(), EffectFlags::READ | EffectFlags::IO);
        assert_eq!(flow.metadata().effects, Some(flow.flags()));
        assert!(has_effect(&flow, EffectFlags::READ));
        assert!(!has_effect(&flow, EffectFlags::NETWORK));
        assert!(!is_pure(&flow));
    }

    #[test]
    fn duplicate_effects_are_declared_once() {
        let flow = effectful(double(), [standard::io(), standard::io(), standard::read()]);
        assert_eq!(flow.effect_ids().collect::<Vec<_>>(), vec!["io", "read"]);
    }

    #[test]
    fn explicit_flags_override_the_or() {
        let flow = effectful_with_flags(double(), [standard::read()], EffectFlags::NETWORK);
        assert_eq!(flow.flags(), EffectFlags::NETWORK);
        assert_eq!(flow.effects().len(), 1);
    }

    #[test]
    fn pure_flow_carries_none() {
        let flow = pure(double());
        assert_eq!(flow.flags(), EffectFlags::NONE);
        assert!(flow.effects().is_empty());
        assert!(is_pure(&flow));
        assert!(flow.metadata().pure);
    }

    #[tokio::test]
    async fn composing_with_pure_keeps_flags() {
        let reads = effectful(double(), [standard::read(), standard::io()]);
        let chain = reads.pipe(&pure(Flow::from_fn(|x: i32| x + 1)));

        assert_eq!(chain.flags(), EffectFlags::READ | EffectFlags::IO);
        assert_eq!(chain.effect_ids().collect::<Vec<_>>(), vec!["read", "io"]);
        assert_eq!(chain.call(5).await.unwrap(), 11);
    }

    #[test]
    fn pipe_unions_effects_of_both_sides() {
        let a = effectful(double(), [standard::read(), standard::io()]);
        let b = effectful(double(), [standard::io(), standard::network()]);
        let chain = a.pipe(&b);

        assert_eq!(
            chain.flags(),
            EffectFlags::READ | EffectFlags::IO | EffectFlags::NETWORK
        );
        assert_eq!(
            chain.effect_ids().collect::<Vec<_>>(),
            vec!["read", "io", "network"]
        );
        assert_eq!(chain.metadata().effects, Some(chain.flags()));
    }

    #[test]
    fn pipe_flow_folds_plain_flow_metadata() {
        let a = effectful(double(), [standard::read()]);
        let timed = double().with_effects(EffectFlags::TIME);
        assert_eq!(
            a.pipe_flow(&timed).flags(),
            EffectFlags::READ | EffectFlags::TIME
        );
        assert_eq!(a.pipe_flow(&double()).flags(), EffectFlags::READ);
    }

    #[test]
    fn plain_flows_without_metadata_are_neither_effectful_nor_pure() {
        let plain = double();
        assert!(!has_effect(&plain, EffectFlags::READ));
        assert!(!is_pure(&plain));
        assert_eq!(plain.effect_flags(), None);
    }

    #[test]
    fn combine_effects_ors_mixed_operands() {
        let a = effectful(double(), [standard::write()]);
        let b = double().with_effects(EffectFlags::RANDOM);
        let c = double();
        let combined = combine_effects([&a as &dyn HasEffects, &b, &c]);
        assert_eq!(combined, EffectFlags::WRITE | EffectFlags::RANDOM);
        assert_eq!(combine_effects([]), EffectFlags::NONE);
    }
}
