//! Store - Persistent Binding Map
//!
//! Backing storage for a Context's own bindings. Extending a store pushes a
//! new layer that points at the previous one, so the old store stays valid and
//! shares every existing layer with the new one. Once the layer chain grows
//! past [`MAX_DEPTH`] the next extension compacts it into a single layer,
//! which keeps lookups bounded.

use crate::key::ContextKey;
use ahash::AHashMap;
use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A bound value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Layers a lookup may have to walk before compaction kicks in.
pub const MAX_DEPTH: usize = 8;

struct Layer {
    entries: AHashMap<ContextKey, Value>,
    below: Option<Arc<Layer>>,
    depth: usize,
}

#[derive(Clone, Default)]
pub(crate) struct Store {
    top: Option<Arc<Layer>>,
}

impl Store {
    pub(crate) fn get(&self, key: &ContextKey) -> Option<&Value> {
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            if let Some(value) = current.entries.get(key) {
                return Some(value);
            }
            layer = current.below.as_deref();
        }
        None
    }

    pub(crate) fn contains(&self, key: &ContextKey) -> bool {
        self.get(key).is_some()
    }

    /// A new store with `entries` layered over `self`; `self` is unchanged.
    pub(crate) fn extend(&self, entries: AHashMap<ContextKey, Value>) -> Store {
        if entries.is_empty() {
            return self.clone();
        }
        let depth = self.depth() + 1;
        if depth > MAX_DEPTH {
            let mut flat = self.flatten();
            flat.extend(entries);
            return Store {
                top: Some(Arc::new(Layer {
                    entries: flat,
                    below: None,
                    depth: 1,
                })),
            };
        }
        Store {
            top: Some(Arc::new(Layer {
                entries,
                below: self.top.clone(),
                depth,
            })),
        }
    }

    pub(crate) fn keys(&self) -> BTreeSet<ContextKey> {
        let mut keys = BTreeSet::new();
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            keys.extend(current.entries.keys().cloned());
            layer = current.below.as_deref();
        }
        keys
    }

    pub(crate) fn depth(&self) -> usize {
        self.top.as_ref().map_or(0, |layer| layer.depth)
    }

    fn flatten(&self) -> AHashMap<ContextKey, Value> {
        let mut layers = Vec::with_capacity(self.depth());
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            layers.push(current);
            layer = current.below.as_deref();
        }
        let mut flat = AHashMap::new();
        // bottom first so newer layers overwrite older ones
        for current in layers.into_iter().rev() {
            flat.extend(
                current
                    .entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }
        flat
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("depth", &self.depth())
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &'static str, value: i32) -> AHashMap<ContextKey, Value> {
        let mut map = AHashMap::new();
        map.insert(ContextKey::from(name), Arc::new(value) as Value);
        map
    }

    fn read(store: &Store, name: &'static str) -> Option<i32> {
        store
            .get(&ContextKey::from(name))
            .and_then(|v| v.downcast_ref::<i32>())
            .copied()
    }

    #[test]
    fn extend_leaves_original_untouched() {
        let base = Store::default().extend(entry("a", 1));
        let next = base.extend(entry("a", 2));

        assert_eq!(read(&base, "a"), Some(1));
        assert_eq!(read(&next, "a"), Some(2));
        assert!(!base.contains(&ContextKey::from("b")));
    }

    #[test]
    fn extend_shares_lower_layers() {
        let base = Store::default().extend(entry("a", 1));
        let next = base.extend(entry("b", 2));
        let shared = next.top.as_ref().and_then(|l| l.below.clone());
        assert!(Arc::ptr_eq(
            shared.as_ref().expect("lower layer"),
            base.top.as_ref().expect("top layer")
        ));
    }

    #[test]
    fn compaction_bounds_depth_and_keeps_newest_values() {
        let mut store = Store::default();
        for i in 0..(MAX_DEPTH as i32 * 3) {
            store = store.extend(entry("counter", i));
            assert!(store.depth() <= MAX_DEPTH);
        }
        assert_eq!(read(&store, "counter"), Some(MAX_DEPTH as i32 * 3 - 1));
        assert_eq!(store.keys().len(), 1);
    }

    #[test]
    fn empty_extension_is_a_no_op() {
        let base = Store::default().extend(entry("a", 1));
        let same = base.extend(AHashMap::new());
        assert_eq!(same.depth(), base.depth());
    }
}
