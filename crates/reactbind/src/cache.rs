//! Descriptor cache
//!
//! Maps a component tag to the host descriptor already built for it, so that
//! creating many elements of one component type builds its bindings once.

use crate::host::Descriptor;
use std::collections::HashMap;

/// At most one descriptor per tag
#[derive(Default)]
pub struct DescriptorCache {
    /// Built descriptors by tag
    entries: HashMap<String, Descriptor>,
    /// Number of descriptors built through this cache
    builds: usize,
}

impl DescriptorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the descriptor for `tag`, building and storing it on a miss.
    /// A `None` tag always builds and never stores.
    ///
    /// `build` runs while the cache is borrowed; callers whose build may
    /// touch the cache again use [`get`](Self::get) and
    /// [`insert`](Self::insert) instead.
    pub fn get_or_build(&mut self, tag: Option<&str>, build: impl FnOnce() -> Descriptor) -> Descriptor {
        if let Some(found) = tag.and_then(|tag| self.get(tag)) {
            log::trace!("Descriptor cache hit for '{}'", found.display_name());
            return found;
        }

        let descriptor = build();
        self.insert(tag, descriptor.clone());
        descriptor
    }

    /// Record a freshly built descriptor, storing it when `tag` is set.
    /// A later insert under the same tag replaces the earlier one.
    pub fn insert(&mut self, tag: Option<&str>, descriptor: Descriptor) {
        self.builds += 1;
        if let Some(tag) = tag {
            log::debug!("Cached descriptor '{}' under '{}'", descriptor.display_name(), tag);
            self.entries.insert(tag.to_string(), descriptor);
        }
    }

    /// Look up a cached descriptor
    pub fn get(&self, tag: &str) -> Option<Descriptor> {
        self.entries.get(tag).cloned()
    }

    /// Drop the entry for `tag`; the next lookup rebuilds
    pub fn invalidate(&mut self, tag: &str) -> bool {
        let removed = self.entries.remove(tag).is_some();
        if removed {
            log::debug!("Invalidated descriptor for '{}'", tag);
        }
        removed
    }

    /// Drop every entry, used when the root is remounted
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Check if a tag is cached
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of descriptors built so far, cached or not
    pub fn builds(&self) -> usize {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> Descriptor {
        Descriptor::new(name, ())
    }

    #[test]
    fn test_cache_builds_once_per_tag() {
        let mut cache = DescriptorCache::new();
        let mut calls = 0;

        let first = cache.get_or_build(Some("app::Counter"), || {
            calls += 1;
            descriptor("Counter(app)")
        });
        let second = cache.get_or_build(Some("app::Counter"), || {
            calls += 1;
            descriptor("Counter(app)")
        });

        assert_eq!(calls, 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn test_untagged_always_rebuilds() {
        let mut cache = DescriptorCache::new();
        let a = cache.get_or_build(None, || descriptor("Anon"));
        let b = cache.get_or_build(None, || descriptor("Anon"));

        assert!(!a.ptr_eq(&b));
        assert!(cache.is_empty());
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let mut cache = DescriptorCache::new();
        let before = cache.get_or_build(Some("tag"), || descriptor("A"));

        assert!(cache.invalidate("tag"));
        assert!(!cache.invalidate("tag"));
        assert!(!cache.contains("tag"));

        let after = cache.get_or_build(Some("tag"), || descriptor("A"));
        assert!(!before.ptr_eq(&after));
        assert!(cache.get("tag").unwrap().ptr_eq(&after));
    }
}
