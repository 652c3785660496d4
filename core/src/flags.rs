//! EffectFlags - Side-Effect Classification
//!
//! A fixed set of single-bit categories describing what a flow may do beyond
//! computing its output. Flags combine with `|` and never lose bits when
//! combined, which is what lets composition only ever add effects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bitset of effect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectFlags(u32);

impl EffectFlags {
    pub const NONE: EffectFlags = EffectFlags(0);
    pub const READ: EffectFlags = EffectFlags(1 << 0);
    pub const WRITE: EffectFlags = EffectFlags(1 << 1);
    pub const IO: EffectFlags = EffectFlags(1 << 2);
    pub const NETWORK: EffectFlags = EffectFlags(1 << 3);
    pub const RANDOM: EffectFlags = EffectFlags(1 << 4);
    pub const TIME: EffectFlags = EffectFlags(1 << 5);
    pub const THROW: EffectFlags = EffectFlags(1 << 6);
    pub const ASYNC: EffectFlags = EffectFlags(1 << 7);

    /// Every named flag, in bit order.
    pub const ALL: [(EffectFlags, &'static str); 8] = [
        (EffectFlags::READ, "READ"),
        (EffectFlags::WRITE, "WRITE"),
        (EffectFlags::IO, "IO"),
        (EffectFlags::NETWORK, "NETWORK"),
        (EffectFlags::RANDOM, "RANDOM"),
        (EffectFlags::TIME, "TIME"),
        (EffectFlags::THROW, "THROW"),
        (EffectFlags::ASYNC, "ASYNC"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping any bit outside the known set.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        EffectFlags(bits & 0xff)
    }

    pub const fn union(self, other: EffectFlags) -> Self {
        EffectFlags(self.0 | other.0)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    ///
    /// `contains(NONE)` is always true.
    pub const fn contains(self, other: EffectFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: EffectFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Iterate the single-bit flags that are set.
    pub fn iter(self) -> impl Iterator<Item = EffectFlags> {
        EffectFlags::ALL
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }
}

impl BitOr for EffectFlags {
    type Output = EffectFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for EffectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EffectFlags {
    type Output = EffectFlags;

    fn bitand(self, rhs: Self) -> Self::Output {
        EffectFlags(self.0 & rhs.0)
    }
}

impl FromIterator<EffectFlags> for EffectFlags {
    fn from_iter<I: IntoIterator<Item = EffectFlags>>(iter: I) -> Self {
        iter.into_iter().fold(EffectFlags::NONE, BitOr::bitor)
    }
}

impl fmt::Display for EffectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (flag, name) in EffectFlags::ALL {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
