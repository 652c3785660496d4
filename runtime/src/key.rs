//! Keys - Named and Symbolic Binding Keys
//!
//! A binding is addressed either by a string name or by a [`Symbol`], a
//! token that is unique for the life of the process. [`Key<T>`] wraps either
//! form with the type of value stored under it, so typed lookups need no
//! caller-side downcasting.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// A globally unique token usable as a binding key.
///
/// Two symbols never compare equal, even with the same description.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    id: Uuid,
    description: Option<Arc<str>>,
}

impl Symbol {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: Some(description.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description().unwrap_or("<anonymous>"))
    }
}

/// Untyped key of a context binding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    Name(Cow<'static, str>),
    Symbol(Symbol),
}

impl ContextKey {
    pub const fn from_static(name: &'static str) -> Self {
        ContextKey::Name(Cow::Borrowed(name))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ContextKey::Name(name) => Some(name),
            ContextKey::Symbol(_) => None,
        }
    }
}

impl fmt::Debug for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Name(name) => write!(f, "{name:?}"),
            ContextKey::Symbol(symbol) => fmt::Debug::fmt(symbol, f),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Name(name) => f.write_str(name),
            ContextKey::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&'static str> for ContextKey {
    fn from(name: &'static str) -> Self {
        ContextKey::Name(Cow::Borrowed(name))
    }
}

impl From<String> for ContextKey {
    fn from(name: String) -> Self {
        ContextKey::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for ContextKey {
    fn from(symbol: Symbol) -> Self {
        ContextKey::Symbol(symbol)
    }
}

impl From<&Symbol> for ContextKey {
    fn from(symbol: &Symbol) -> Self {
        ContextKey::Symbol(symbol.clone())
    }
}

impl<T> From<&Key<T>> for ContextKey {
    fn from(key: &Key<T>) -> Self {
        key.key.clone()
    }
}

/// A key that also names the type of the value bound under it.
pub struct Key<T> {
    key: ContextKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: ContextKey::Name(name.into()),
            _marker: PhantomData,
        }
    }

    /// Usable in `const` and `static` items.
    pub const fn from_static(name: &'static str) -> Self {
        Self {
            key: ContextKey::from_static(name),
            _marker: PhantomData,
        }
    }

    /// A fresh key backed by a new [`Symbol`]; no other key can collide with it.
    pub fn unique(description: impl Into<Arc<str>>) -> Self {
        Self {
            key: ContextKey::Symbol(Symbol::new(description)),
            _marker: PhantomData,
        }
    }

    pub fn raw(&self) -> &ContextKey {
        &self.key
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key")
            .field(&self.key)
            .field(&std::any::type_name::<T>())
            .finish()
    }
}
