//! Context - Immutable Ambient Bindings
//!
//! A `Context` is a read-only set of key/value bindings with an optional
//! parent. Lookups try the local bindings first and then walk up the parent
//! chain, so a child binding shadows a parent binding of the same key.
//!
//! Nothing is ever changed in place: `with` returns a new Context and leaves
//! the receiver as it was. The only state a Context carries is its frozen
//! flag, which only ever goes from open to frozen.
//!
//! ```rust,ignore
//! let base = Context::new().with(Bindings::new().bind("a", 1))?;
//! let next = base.with(Bindings::new().bind("b", 2))?;
//!
//! assert_eq!(next.get_named::<i32>("a"), Some(&1));
//! assert!(!base.has(&"b".into()));
//! ```

use crate::key::{ContextKey, Key};
use crate::store::{Store, Value};
use ahash::AHashMap;
use conflux_core::FrozenContextError;
use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

static EMPTY: LazyLock<Context> = LazyLock::new(|| {
    let empty = Context::new();
    empty.freeze();
    empty
});

/// An ordered batch of bindings handed to [`Context::with`].
///
/// Later entries win over earlier entries with the same key.
#[derive(Clone, Default)]
pub struct Bindings {
    entries: Vec<(ContextKey, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<T: Any + Send + Sync>(mut self, key: impl Into<ContextKey>, value: T) -> Self {
        self.entries.push((key.into(), Arc::new(value)));
        self
    }

    pub fn bind_key<T: Any + Send + Sync>(self, key: &Key<T>, value: T) -> Self {
        self.bind(key, value)
    }

    /// Bind an already shared value without wrapping it again.
    pub fn bind_value(mut self, key: impl Into<ContextKey>, value: Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_map(self) -> AHashMap<ContextKey, Value> {
        self.entries.into_iter().collect()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}

impl FromIterator<(ContextKey, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (ContextKey, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

struct Inner {
    store: Store,
    parent: Option<Context>,
    frozen: AtomicBool,
}

/// Immutable, hierarchically delegating binding store.
///
/// Cloning a Context yields another handle to the same instance, frozen flag
/// included.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// An empty, open context with no parent.
    pub fn new() -> Self {
        Self::build(Store::default(), None)
    }

    /// A root context holding `bindings`.
    pub fn from_bindings(bindings: Bindings) -> Self {
        Self::build(Store::default().extend(bindings.into_map()), None)
    }

    /// The shared frozen empty context used when no context is active.
    pub fn empty() -> Context {
        EMPTY.clone()
    }

    fn build(store: Store, parent: Option<Context>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                parent,
                frozen: AtomicBool::new(false),
            }),
        }
    }

    /// Look up the newest binding for `key`, local bindings first.
    pub fn get_value(&self, key: &ContextKey) -> Option<&Value> {
        match self.inner.store.get(key) {
            Some(value) => Some(value),
            None => self.inner.parent.as_ref()?.get_value(key),
        }
    }

    /// Typed lookup. A binding of a different type reads as absent.
    pub fn get<T: Any>(&self, key: &Key<T>) -> Option<&T> {
        self.get_value(key.raw())?.downcast_ref::<T>()
    }

    pub fn get_named<T: Any>(&self, name: &str) -> Option<&T> {
        let key = ContextKey::Name(Cow::Owned(name.to_owned()));
        self.get_value(&key)?.downcast_ref::<T>()
    }

    /// A new context holding the union of the current bindings and
    /// `bindings`, the new ones winning on collision.
    ///
    /// Fails on a frozen context; the receiver is never modified either way.
    pub fn with(&self, bindings: Bindings) -> Result<Context, FrozenContextError> {
        if self.is_frozen() {
            tracing::debug!(keys = ?bindings, "Rejected extension of frozen context");
            return Err(FrozenContextError);
        }
        let store = self.inner.store.extend(bindings.into_map());
        Ok(Self::build(store, self.inner.parent.clone()))
    }

    pub fn with_value<T: Any + Send + Sync>(
        &self,
        key: impl Into<ContextKey>,
        value: T,
    ) -> Result<Context, FrozenContextError> {
        self.with(Bindings::new().bind(key, value))
    }

    pub fn has(&self, key: &ContextKey) -> bool {
        self.inner.store.contains(key)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(|parent| parent.has(key))
    }

    /// Every key visible from this context, parents included, each once.
    pub fn keys(&self) -> BTreeSet<ContextKey> {
        let mut keys = self.inner.store.keys();
        if let Some(parent) = &self.inner.parent {
            keys.extend(parent.keys());
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.depth() == 0 && self.inner.parent.as_ref().is_none_or(Context::is_empty)
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// A new empty, open child scope delegating to this context.
    pub fn fork(&self) -> Context {
        Self::build(Store::default(), Some(self.clone()))
    }

    /// Refuse all further `with` calls on this context. Ancestors and
    /// existing children are not affected.
    pub fn freeze(&self) -> &Self {
        if !self.inner.frozen.swap(true, Ordering::AcqRel) {
            tracing::trace!("Context frozen");
        }
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    /// True when both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.inner.store.keys())
            .field("frozen", &self.is_frozen())
            .field("parent", &self.inner.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Symbol;

    fn names(ctx: &Context) -> Vec<String> {
        ctx.keys().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn with_returns_a_new_context() {
        let base = Context::from_bindings(Bindings::new().bind("a", 1));
        let next = base.with(Bindings::new().bind("a", 10).bind("b", 2)).unwrap();

        assert_eq!(base.get_named::<i32>("a"), Some(&1));
        assert_eq!(base.get_named::<i32>("b"), None);
        assert_eq!(next.get_named::<i32>("a"), Some(&10));
        assert_eq!(next.get_named::<i32>("b"), Some(&2));
        assert!(!base.ptr_eq(&next));
    }

    #[test]
    fn keys_merge_parent_chain_without_duplicates() {
        let ctx = Context::from_bindings(Bindings::new().bind("a", 1))
            .with_value("b", 2)
            .unwrap();
        assert_eq!(names(&ctx), vec!["a", "b"]);

        let child = ctx.fork().with_value("a", "shadow").unwrap();
        assert_eq!(names(&child), vec!["a", "b"]);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn child_bindings_shadow_parent() {
        let parent = Context::from_bindings(Bindings::new().bind("user", "root"));
        let child = parent.fork().with_value("user", "guest").unwrap();

        assert_eq!(child.get_named::<&str>("user"), Some(&"guest"));
        assert_eq!(parent.get_named::<&str>("user"), Some(&"root"));
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&parent)));
    }

    #[test]
    fn typed_lookup_rejects_wrong_type() {
        let port: Key<u16> = Key::named("port");
        let ctx = Context::from_bindings(Bindings::new().bind_key(&port, 8080));

        assert_eq!(ctx.get(&port), Some(&8080));
        assert_eq!(ctx.get(&Key::<String>::named("port")), None);
        assert!(ctx.has(port.raw()));
    }

    #[test]
    fn symbol_keys_never_collide() {
        let first = Symbol::new("token");
        let second = Symbol::new("token");
        let ctx = Context::new()
            .with(Bindings::new().bind(&first, 1).bind(&second, 2))
            .unwrap();

        assert_eq!(ctx.get_value(&first.clone().into()).and_then(|v| v.downcast_ref::<i32>()), Some(&1));
        assert_eq!(ctx.get_value(&second.into()).and_then(|v| v.downcast_ref::<i32>()), Some(&2));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn frozen_context_rejects_with_but_still_reads_and_forks() {
        let ctx = Context::from_bindings(Bindings::new().bind("a", 1));
        assert!(ctx.freeze().is_frozen());

        assert_eq!(ctx.with_value("b", 2).unwrap_err(), FrozenContextError);
        assert_eq!(ctx.get_named::<i32>("a"), Some(&1));

        let child = ctx.fork();
        assert!(!child.is_frozen());
        let extended = child.with_value("b", 2).unwrap();
        assert_eq!(extended.get_named::<i32>("a"), Some(&1));
        assert_eq!(extended.get_named::<i32>("b"), Some(&2));
    }

    #[test]
    fn freezing_a_child_leaves_ancestors_open() {
        let parent = Context::new();
        let child = parent.fork();
        child.freeze();

        assert!(child.is_frozen());
        assert!(!parent.is_frozen());
        assert!(parent.with_value("x", 1).is_ok());
    }

    #[test]
    fn clones_share_frozen_state() {
        let ctx = Context::new();
        let handle = ctx.clone();
        ctx.freeze();
        assert!(handle.is_frozen());
    }

    #[test]
    fn empty_context_is_frozen_and_empty() {
        let empty = Context::empty();
        assert!(empty.is_frozen());
        assert!(empty.is_empty());
        assert!(empty.keys().is_empty());
        assert!(Context::empty().ptr_eq(&empty));
    }
}
