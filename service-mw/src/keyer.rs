//! Key-value annotations attached to log lines.

use std::sync::Arc;

/// Something that can be spread into a flat list of key-value pairs.
///
/// Keyers describe where a log line comes from (module, service, method)
/// and are applied to every line a [`Logger`](crate::observability::Logger)
/// emits.
pub trait Keyer: Send + Sync {
    fn spread(&self) -> Vec<(String, String)>;
}

/// Ordered list of key-value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keys(Vec<(String, String)>);

impl Keys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, keeping earlier pairs in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Keyer for Keys {
    fn spread(&self) -> Vec<(String, String)> {
        self.0.clone()
    }
}

impl<K, V> FromIterator<(K, V)> for Keys
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Keyer + ?Sized> Keyer for Arc<K> {
    fn spread(&self) -> Vec<(String, String)> {
        (**self).spread()
    }
}

impl<K: Keyer + ?Sized> Keyer for Box<K> {
    fn spread(&self) -> Vec<(String, String)> {
        (**self).spread()
    }
}

/// Extend `keyer` with one more pair.
pub fn with(keyer: &dyn Keyer, key: impl Into<String>, value: impl Into<String>) -> Keys {
    Keys(keyer.spread()).with(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_preserve_order() {
        let keys = Keys::new().with("module", "orders").with("service", "api");
        assert_eq!(
            keys.spread(),
            vec![
                ("module".to_string(), "orders".to_string()),
                ("service".to_string(), "api".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_extends_without_mutating_source() {
        let base: Keys = [("module", "orders")].into_iter().collect();
        let extended = with(&base, "method", "CreateOrder");

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.get("method"), Some("CreateOrder"));
        assert_eq!(extended.get("module"), Some("orders"));
    }

    #[test]
    fn test_arc_keyer_delegates() {
        let keyer: Arc<dyn Keyer> = Arc::new(Keys::new().with("module", "billing"));
        assert_eq!(keyer.spread().len(), 1);
    }
}
