use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::{BuildHasher, Hash},
};

/// Something that can be asked whether it holds a named property.
pub trait PropertyBag {
    /// Whether `key` is present.
    fn contains_property(&self, key: &str) -> bool;
}

impl<K, V, H> PropertyBag for HashMap<K, V, H>
where
    K: Borrow<str> + Hash + Eq,
    H: BuildHasher,
{
    fn contains_property(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl<K: Borrow<str> + Ord, V> PropertyBag for BTreeMap<K, V> {
    fn contains_property(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl<K, H> PropertyBag for HashSet<K, H>
where
    K: Borrow<str> + Hash + Eq,
    H: BuildHasher,
{
    fn contains_property(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl<K: Borrow<str> + Ord> PropertyBag for BTreeSet<K> {
    fn contains_property(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// Checks whether `key` exists in `properties`, logging at debug level when
/// it does not. `class_name` prefixes the log message.
pub fn is_property<B: PropertyBag + ?Sized>(properties: &B, key: &str, class_name: &str) -> bool {
    if properties.contains_property(key) {
        return true;
    }
    log::debug!("{class_name} - `{key}` does not exist yet.");
    false
}
