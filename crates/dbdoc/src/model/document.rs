//! Ordered string-keyed documents.

use crate::limits::ID_FIELD;
use crate::model::Value;

/// An ordered mapping from field name to [`Value`].
///
/// Keys are unique. Inserting an existing key replaces its value in place;
/// removing a key keeps the relative order of the others. Equality is
/// order-sensitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends (or replaces) a field, builder style.
    pub fn append(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a field, returning the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.fields[idx].1, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Removes a field, preserving the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.position(key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Returns the index of `key` in field order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == key)
    }

    /// Returns the value of the identity field.
    pub fn id(&self) -> Option<&Value> {
        self.get(ID_FIELD)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a str, &'a Value);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, Value)>,
        fn(&'a (String, Value)) -> (&'a str, &'a Value),
    >;

    fn into_iter(self) -> Self::IntoIter {
        let split: fn(&'a (String, Value)) -> (&'a str, &'a Value) = |(k, v)| (k.as_str(), v);
        self.fields.iter().map(split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let doc = Document::new().append("x", 2).append("_id", 2).append("a", true);
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["x", "_id", "a"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = Document::new().append("a", 1).append("b", 2);
        let old = doc.insert("a", "one");
        assert_eq!(old, Some(Value::Int32(1)));
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(doc.get("a"), Some(&Value::from("one")));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = Document::new().append("a", 1).append("b", 2).append("c", 3);
        assert_eq!(doc.remove("b"), Some(Value::Int32(2)));
        assert_eq!(doc.remove("b"), None);
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Document::new().append("a", 1).append("b", 2);
        let b = Document::new().append("b", 2).append("a", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_lookup() {
        let doc = Document::new().append("x", 1);
        assert!(doc.id().is_none());
        let doc = doc.append("_id", 7);
        assert_eq!(doc.id(), Some(&Value::Int32(7)));
    }

    #[test]
    fn test_from_iter() {
        let doc: Document = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("a"), Some(&Value::Int32(3)));
    }
}
