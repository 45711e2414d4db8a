//! Keyed debug-object caches.
//!
//! A cache keeps arbitrary values around so they can be dumped in a report.
//! Values are shared (`Arc`) and rendered through `Display` only when a
//! report asks for them.
//!
//! # Key Resolution
//!
//! Keys are optional and collisions never overwrite:
//!
//! 1. An absent or empty key becomes the current collision index, which then
//!    advances.
//! 2. A key already in use gets the collision index appended, which then
//!    advances. This repeats until the key is unused, so a mangled key can
//!    never replace an earlier entry.
//!
//! The key actually used (the *effective key*) is returned from
//! [`Cache::add`]. Only that exact key retrieves the object again.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::host::Timestamp;

/// First value of the collision index.
const INITIAL_COLLISION_INDEX: u64 = 1;

/// A value that can be stored in a cache and rendered in a report.
///
/// Blanket-implemented for every `Display + Send + Sync + 'static` type.
pub trait CacheValue: fmt::Display + Send + Sync + 'static {
    /// Access the concrete value for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: fmt::Display + Send + Sync + 'static> CacheValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for dyn CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheValue({})", self)
    }
}

/// Downcast a shared cache value.
///
/// Goes through the trait object explicitly; `Arc<dyn CacheValue>` is itself
/// a `CacheValue` and would otherwise downcast to the `Arc`.
pub fn downcast_value<T: Any + Clone>(value: &Arc<dyn CacheValue>) -> Option<T> {
    let inner: &dyn CacheValue = value.as_ref();
    inner.as_any().downcast_ref::<T>().cloned()
}

/// One stored value with its insertion metadata.
#[derive(Debug, Clone)]
pub struct CacheObject {
    id: u64,
    key: String,
    value: Arc<dyn CacheValue>,
    timestamp: Timestamp,
}

impl CacheObject {
    /// Insertion order id (1-based, unique within a cache generation).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Effective key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored value.
    pub fn value(&self) -> &Arc<dyn CacheValue> {
        &self.value
    }

    /// Capture time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Keyed store of debug values with insertion-ordered iteration.
#[derive(Debug)]
pub struct Cache {
    name: String,
    objects: HashMap<String, CacheObject>,
    order_index: u64,
    collision_index: u64,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: HashMap::new(),
            order_index: 0,
            collision_index: INITIAL_COLLISION_INDEX,
        }
    }

    /// Local name within the owning profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `value` and return its effective key.
    pub fn add(
        &mut self,
        key: Option<&str>,
        value: Arc<dyn CacheValue>,
        now: Timestamp,
    ) -> String {
        let key = self.effective_key(key);
        self.order_index += 1;
        let object = CacheObject {
            id: self.order_index,
            key: key.clone(),
            value,
            timestamp: now,
        };
        self.objects.insert(key.clone(), object);
        key
    }

    fn effective_key(&mut self, key: Option<&str>) -> String {
        let mut key = match key {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => self.next_collision_index(),
        };

        if self.objects.contains_key(&key) {
            let base = key;
            loop {
                key = format!("{}{}", base, self.next_collision_index());
                if !self.objects.contains_key(&key) {
                    break;
                }
            }
        }
        key
    }

    fn next_collision_index(&mut self) -> String {
        let index = self.collision_index;
        self.collision_index += 1;
        index.to_string()
    }

    /// Value stored under an effective key.
    pub fn get(&self, key: &str) -> Option<Arc<dyn CacheValue>> {
        self.objects.get(key).map(|object| Arc::clone(&object.value))
    }

    /// Every value in insertion order.
    pub fn values(&self) -> Vec<Arc<dyn CacheValue>> {
        self.sorted_objects()
            .into_iter()
            .map(|object| object.value)
            .collect()
    }

    /// Every object in insertion order.
    pub fn sorted_objects(&self) -> Vec<CacheObject> {
        let mut objects: Vec<CacheObject> = self.objects.values().cloned().collect();
        objects.sort_by_key(CacheObject::id);
        objects
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every object and restart both indices.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.order_index = 0;
        self.collision_index = INITIAL_COLLISION_INDEX;
    }

    /// Point-in-time copy tagged with the owning profile.
    pub fn snapshot(&self, profile: &str) -> CacheSnapshot {
        CacheSnapshot {
            profile: profile.to_string(),
            name: self.name.clone(),
            objects: self.sorted_objects(),
        }
    }
}

/// Point-in-time copy of a cache.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    /// Owning profile name.
    pub profile: String,
    /// Cache name.
    pub name: String,
    /// Objects in insertion order.
    pub objects: Vec<CacheObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(cache: &mut Cache, key: Option<&str>, value: &str) -> String {
        cache.add(key, Arc::new(value.to_string()), 0)
    }

    fn rendered(cache: &Cache) -> Vec<String> {
        cache.values().iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_explicit_keys() {
        let mut cache = Cache::new("c");
        assert_eq!(add(&mut cache, Some("First"), "My"), "First");
        assert_eq!(add(&mut cache, Some("Second"), "name"), "Second");

        let value = cache.get("Second").map(|v| v.to_string());
        assert_eq!(value.as_deref(), Some("name"));
        assert!(cache.get("Third").is_none());
    }

    #[test]
    fn test_absent_and_empty_keys_are_synthesized() {
        let mut cache = Cache::new("c");
        assert_eq!(add(&mut cache, None, "a"), "1");
        assert_eq!(add(&mut cache, Some(""), "b"), "2");
        assert_eq!(cache.len(), 2);
        assert_eq!(rendered(&cache), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_key_is_mangled() {
        let mut cache = Cache::new("c");
        assert_eq!(add(&mut cache, Some("k"), "first"), "k");
        assert_eq!(add(&mut cache, Some("k"), "second"), "k1");
        assert_eq!(add(&mut cache, Some("k"), "third"), "k2");

        assert_eq!(cache.get("k").map(|v| v.to_string()).as_deref(), Some("first"));
        assert_eq!(cache.get("k1").map(|v| v.to_string()).as_deref(), Some("second"));
        assert_eq!(rendered(&cache), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_mangled_key_never_overwrites() {
        let mut cache = Cache::new("c");
        // "k1" is taken explicitly, so the collision for "k" must skip it
        add(&mut cache, Some("k1"), "explicit");
        add(&mut cache, Some("k"), "plain");
        assert_eq!(add(&mut cache, Some("k"), "collides"), "k2");
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("k1").map(|v| v.to_string()).as_deref(), Some("explicit"));
    }

    #[test]
    fn test_synthesized_key_collides_with_explicit() {
        let mut cache = Cache::new("c");
        add(&mut cache, Some("1"), "explicit");
        // Synthesized "1" is taken; index 2 is appended
        assert_eq!(add(&mut cache, None, "synth"), "12");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reset_restarts_indices() {
        let mut cache = Cache::new("c");
        add(&mut cache, None, "a");
        add(&mut cache, None, "b");
        cache.reset();
        assert!(cache.is_empty());

        assert_eq!(add(&mut cache, None, "c"), "1");
        assert_eq!(cache.sorted_objects()[0].id(), 1);
    }

    #[test]
    fn test_objects_sorted_by_insertion() {
        let mut cache = Cache::new("c");
        for (i, key) in ["z", "a", "m", "b"].iter().enumerate() {
            cache.add(Some(*key), Arc::new(i), i as i64 * 10);
        }
        let objects = cache.sorted_objects();
        let ids: Vec<_> = objects.iter().map(CacheObject::id).collect();
        let keys: Vec<_> = objects.iter().map(CacheObject::key).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(keys, vec!["z", "a", "m", "b"]);
        assert_eq!(objects[2].timestamp(), 20);
    }

    #[test]
    fn test_downcast_value() {
        let mut cache = Cache::new("c");
        cache.add(Some("n"), Arc::new(42u32), 0);
        let value = cache.get("n").expect("stored");
        assert_eq!(downcast_value::<u32>(&value), Some(42));
        assert_eq!(downcast_value::<String>(&value), None);
    }
}
