//! Shared key-value context passed through interactions and workflows.

use crate::error::InteractionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Type-safe context key wrapper.
///
/// Provides compile-time safety for context identifiers, preventing
/// typos and mismatched keys at the API level.
///
/// # Examples
///
/// ```
/// use interflow::ContextKey;
///
/// let key = ContextKey::new("amount");
/// assert_eq!(key.as_str(), "amount");
///
/// // From trait for ergonomic conversion
/// let key: ContextKey = "receipt".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextKey(String);

impl ContextKey {
    /// Creates a new ContextKey.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContextKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContextKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ContextKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ContextKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The shared mutable state of one interaction or workflow run.
///
/// A bag of [`serde_json::Value`]s keyed by [`ContextKey`]. `Value::Null`
/// models a key that is present but holds nothing; an absent key is a
/// distinct state. The accessor ([`require`](Context::require)) and
/// allow-nil needs treat an absent key as `MissingContext`, while value
/// checks treat null and absent alike.
///
/// The context is created by the caller, passed by `&mut` through every
/// interaction of a run, mutated in place, and discarded by the caller
/// afterward. It is never persisted.
///
/// # Examples
///
/// ```
/// use interflow::Context;
/// use serde_json::json;
///
/// let mut ctx = Context::new();
/// ctx.insert("amount", json!(10));
///
/// assert_eq!(ctx.get("amount"), Some(&json!(10)));
/// assert!(ctx.get("receipt").is_none());
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Context {
    data: HashMap<ContextKey, Value>,
}

impl Context {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Inserts a value with the given key.
    ///
    /// If the key already exists, the previous value is replaced.
    pub fn insert(&mut self, key: impl Into<ContextKey>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Returns a reference to the value for the given key.
    ///
    /// Returns `None` if the key is absent. A key holding `Value::Null`
    /// returns `Some(&Value::Null)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns a mutable reference to the value for the given key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// The accessor behind a declared need: returns the value for the
    /// given key, failing with [`InteractionError::MissingContext`] if the
    /// key is absent — independent of whether the value is null.
    pub fn require(&self, key: &str) -> Result<&Value, InteractionError> {
        self.data
            .get(key)
            .ok_or_else(|| InteractionError::MissingContext {
                key: ContextKey::new(key),
            })
    }

    /// Removes a value by key and returns it.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns `true` if the context contains the given key, even when the
    /// stored value is null.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns `true` if the key is absent or holds `Value::Null`.
    pub fn is_null(&self, key: &str) -> bool {
        self.data.get(key).map_or(true, Value::is_null)
    }

    /// Returns an iterator over all keys in the context.
    pub fn keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.data.keys()
    }

    /// Returns the number of entries in the context.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the context contains no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes all entries from the context.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<K: Into<ContextKey>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_data_operations() {
        let mut ctx = Context::new();

        ctx.insert("key1", json!("value1"));
        assert_eq!(ctx.get("key1"), Some(&json!("value1")));
        assert_eq!(ctx.get("nonexistent"), None);
    }

    #[test]
    fn test_require_distinguishes_absent_from_null() {
        let mut ctx = Context::new();
        ctx.insert("memo", Value::Null);

        // Present-but-null reads fine through the accessor.
        assert_eq!(ctx.require("memo").ok(), Some(&Value::Null));

        // An absent key is a MissingContext failure.
        match ctx.require("amount") {
            Err(InteractionError::MissingContext { key }) => {
                assert_eq!(key.as_str(), "amount");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_is_null() {
        let mut ctx = Context::new();
        ctx.insert("a", json!(1));
        ctx.insert("b", Value::Null);

        assert!(!ctx.is_null("a"));
        assert!(ctx.is_null("b"));
        assert!(ctx.is_null("missing"));
    }

    #[test]
    fn test_from_iter() {
        let ctx = Context::from_iter([("amount", json!(10)), ("customer", json!("alice"))]);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("amount"), Some(&json!(10)));
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut ctx = Context::new();
        ctx.insert("count", json!(0));

        if let Some(count) = ctx.get_mut("count") {
            *count = json!(1);
        }
        assert_eq!(ctx.get("count"), Some(&json!(1)));

        assert_eq!(ctx.remove("count"), Some(json!(1)));
        assert!(ctx.is_empty());

        ctx.insert("a", json!(1));
        ctx.insert("b", json!(2));
        assert_eq!(ctx.keys().count(), 2);
        ctx.clear();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_context_key() {
        let key1 = ContextKey::new("test");
        let key2: ContextKey = "test".into();
        assert_eq!(key1, key2);
    }
}
