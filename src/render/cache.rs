use std::num::NonZeroUsize;

use lru::LruCache;

use crate::backend::RgbFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderedPageKey {
    pub doc_id: u64,
    pub page: usize,
    pub scale_milli: u32,
}

impl RenderedPageKey {
    pub fn new(doc_id: u64, page: usize, scale: f32) -> Self {
        let scale_milli = (scale.max(0.0) * 1000.0).round() as u32;
        Self {
            doc_id,
            page,
            scale_milli,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Memo of the last few rendered frames. A capacity of zero disables it.
#[derive(Debug)]
pub struct RenderedPageCache {
    entries: Option<LruCache<RenderedPageKey, RgbFrame>>,
    counters: CacheCounters,
}

impl RenderedPageCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(max_entries).map(LruCache::new),
            counters: CacheCounters::default(),
        }
    }

    pub fn get(&mut self, key: &RenderedPageKey) -> Option<RgbFrame> {
        let hit = self.entries.as_mut().and_then(|entries| entries.get(key).cloned());
        if hit.is_some() {
            self.counters.hits += 1;
        } else {
            self.counters.misses += 1;
        }
        hit
    }

    pub fn insert(&mut self, key: RenderedPageKey, frame: RgbFrame) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        if entries.push(key, frame).is_some_and(|(evicted, _)| evicted != key) {
            self.counters.evictions += 1;
        }
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            self.counters.evictions += entries.len() as u64;
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::RgbFrame;

    use super::{RenderedPageCache, RenderedPageKey};

    fn frame(tag: u8) -> RgbFrame {
        RgbFrame {
            width: 1,
            height: 1,
            pixels: vec![tag; 3].into(),
        }
    }

    #[test]
    fn key_quantizes_scale_to_milli_units() {
        assert_eq!(
            RenderedPageKey::new(1, 2, 1.2344),
            RenderedPageKey::new(1, 2, 1.2341)
        );
        assert_ne!(
            RenderedPageKey::new(1, 2, 1.2),
            RenderedPageKey::new(1, 2, 1.3)
        );
    }

    #[test]
    fn evicts_least_recently_used_entry() {
        let mut cache = RenderedPageCache::new(2);
        let a = RenderedPageKey::new(1, 0, 1.0);
        let b = RenderedPageKey::new(1, 1, 1.0);
        let c = RenderedPageKey::new(1, 2, 1.0);

        cache.insert(a, frame(1));
        cache.insert(b, frame(2));
        assert!(cache.get(&a).is_some());
        cache.insert(c, frame(3));

        assert!(cache.get(&b).is_none());
        assert_eq!(cache.get(&c), Some(frame(3)));
        assert_eq!(cache.counters().evictions, 1);
        assert_eq!(cache.counters().hits, 2);
    }

    #[test]
    fn zero_capacity_disables_memo() {
        let mut cache = RenderedPageCache::new(0);
        let key = RenderedPageKey::new(1, 0, 1.0);
        cache.insert(key, frame(1));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = RenderedPageCache::new(4);
        cache.insert(RenderedPageKey::new(1, 0, 1.0), frame(1));
        cache.insert(RenderedPageKey::new(1, 1, 1.0), frame(2));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.counters().evictions, 2);
    }
}
