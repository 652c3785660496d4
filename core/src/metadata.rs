use crate::flags::EffectFlags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator placed between stage names when flows are piped.
pub const COMPOSE_MARKER: &str = " >> ";

const ANONYMOUS: &str = "anonymous";

/// Descriptive metadata attached to a Flow.
///
/// Purity and memoizability are assertions made by whoever built the flow;
/// nothing checks them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlowMetadata {
    pub name: Option<String>,
    pub pure: bool,
    pub memoizable: bool,
    pub tags: BTreeSet<String>,
    /// `None` means the flow carries no effect metadata at all.
    pub effects: Option<EffectFlags>,
}

impl FlowMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Metadata for pure, memoizable building blocks such as `identity`.
    pub fn pure(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            pure: true,
            memoizable: true,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_effects(mut self, effects: EffectFlags) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Pointwise merge used by `pipe`: `self` runs first, `next` second.
    pub fn merge(&self, next: &FlowMetadata) -> FlowMetadata {
        let name = match (&self.name, &next.name) {
            (None, None) => None,
            (a, b) => Some(format!(
                "{}{}{}",
                a.as_deref().unwrap_or(ANONYMOUS),
                COMPOSE_MARKER,
                b.as_deref().unwrap_or(ANONYMOUS)
            )),
        };
        let effects = match (self.effects, next.effects) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or_default() | b.unwrap_or_default()),
        };
        FlowMetadata {
            name,
            pure: self.pure && next.pure,
            memoizable: self.memoizable && next.memoizable,
            tags: self.tags.union(&next.tags).cloned().collect(),
            effects,
        }
    }

    /// Name used in spans and diagnostics.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
