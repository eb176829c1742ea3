//! Request-scoped key-value context.
//!
//! A [`Context`] is created by the transport layer for every request and
//! threaded explicitly through endpoints and middleware. It is immutable:
//! attaching a value derives a child context that shares its parent chain,
//! so clones are cheap and concurrent requests never observe each other's
//! values.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed key for a value stored on a [`Context`].
///
/// Two keys are the same key only if both the name and the value type match.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

struct Node {
    name: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Node>>,
}

/// Immutable, chainable key-value carrier for a single request.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Node>>,
}

impl Context {
    /// An empty context with no values attached.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context carrying `value` under `key`.
    ///
    /// The receiver is left untouched. A value already attached under the
    /// same key is shadowed in the child.
    pub fn with_value<T>(&self, key: &ContextKey<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            head: Some(Arc::new(Node {
                name: key.name,
                type_id: TypeId::of::<T>(),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Look up the most recently attached value for `key`.
    pub fn value<T: 'static>(&self, key: &ContextKey<T>) -> Option<&T> {
        let wanted = TypeId::of::<T>();
        self.nodes()
            .find(|node| node.name == key.name && node.type_id == wanted)
            .and_then(|node| node.value.downcast_ref::<T>())
    }

    pub fn contains<T: 'static>(&self, key: &ContextKey<T>) -> bool {
        self.value(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns true if both handles point at the same context node.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |node| node.parent.as_deref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.nodes().map(|n| n.name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: ContextKey<String> = ContextKey::new("user");
    const ATTEMPT: ContextKey<u32> = ContextKey::new("attempt");

    #[test]
    fn test_background_is_empty() {
        let ctx = Context::background();
        assert!(ctx.is_empty());
        assert_eq!(ctx.value(&USER), None);
    }

    #[test]
    fn test_with_value_leaves_parent_untouched() {
        let parent = Context::background();
        let child = parent.with_value(&USER, "alice".to_string());

        assert_eq!(child.value(&USER).map(String::as_str), Some("alice"));
        assert!(!parent.contains(&USER));
    }

    #[test]
    fn test_child_shadows_parent() {
        let ctx = Context::background()
            .with_value(&USER, "alice".to_string())
            .with_value(&ATTEMPT, 1)
            .with_value(&USER, "bob".to_string());

        assert_eq!(ctx.value(&USER).map(String::as_str), Some("bob"));
        assert_eq!(ctx.value(&ATTEMPT), Some(&1));
    }

    #[test]
    fn test_same_name_different_type_is_a_different_key() {
        const USER_ID: ContextKey<u64> = ContextKey::new("user");
        let ctx = Context::background().with_value(&USER, "alice".to_string());

        assert_eq!(ctx.value(&USER_ID), None);
    }

    #[test]
    fn test_ptr_eq() {
        let ctx = Context::background().with_value(&ATTEMPT, 3);
        let same = ctx.clone();
        let derived = ctx.with_value(&ATTEMPT, 4);

        assert!(ctx.ptr_eq(&same));
        assert!(!ctx.ptr_eq(&derived));
        assert!(Context::background().ptr_eq(&Context::default()));
    }

    #[test]
    fn test_debug_lists_keys() {
        let ctx = Context::background()
            .with_value(&USER, "alice".to_string())
            .with_value(&ATTEMPT, 2);
        assert_eq!(format!("{:?}", ctx), r#"Context { keys: ["attempt", "user"] }"#);
    }
}
