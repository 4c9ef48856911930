//! L1: in-memory LRU cache with TTL, keyed by `location|YYYYMMDDHHMM`.
//!
//! Grounded on `forecast_cache/memory_cache.py`'s `OrderedDict` + `RLock` pattern: an
//! `IndexMap`-like structure would be natural, but the teacher's codebase never pulls in
//! `indexmap`, so this uses `std::collections::VecDeque` of keys alongside a `HashMap` to
//! track LRU order without a new dependency.

use crate::domain::ForecastCacheEntry;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
pub struct L1Stats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl L1Stats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    value: ForecastCacheEntry,
    inserted_at: DateTime<Utc>,
}

struct Inner {
    map: HashMap<String, Entry>,
    order: VecDeque<String>,
    stats: L1Stats,
}

pub struct MemoryCache {
    max_size: usize,
    ttl: chrono::Duration,
    inner: Mutex<Inner>,
}

fn make_key(location: &str, dt: DateTime<Utc>) -> String {
    format!("{location}|{}", dt.format("%Y%m%d%H%M"))
}

impl MemoryCache {
    pub fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            max_size,
            ttl: chrono::Duration::seconds(ttl_secs as i64),
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
                stats: L1Stats::default(),
            }),
        }
    }

    pub fn get(&self, location: &str, target: DateTime<Utc>) -> Option<ForecastCacheEntry> {
        let key = make_key(location, target);
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        let expired = match inner.map.get(&key) {
            Some(e) => now - e.inserted_at > self.ttl,
            None => false,
        };
        if expired {
            inner.map.remove(&key);
            inner.order.retain(|k| k != &key);
        }

        if let Some(entry) = inner.map.get(&key) {
            let value = entry.value.clone();
            inner.order.retain(|k| k != &key);
            inner.order.push_back(key);
            inner.stats.hits += 1;
            Some(value)
        } else {
            inner.stats.misses += 1;
            None
        }
    }

    pub fn put(&self, location: &str, target: DateTime<Utc>, value: ForecastCacheEntry) {
        let key = make_key(location, target);
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        if inner.map.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.map.len() >= self.max_size {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }

        inner.map.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: now,
            },
        );
        inner.order.push_back(key);
    }

    pub fn stats(&self) -> L1Stats {
        let inner = self.inner.lock().unwrap();
        L1Stats {
            hits: inner.stats.hits,
            misses: inner.stats.misses,
            size: inner.map.len(),
        }
    }

    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let ttl = self.ttl;
        let expired: Vec<String> = inner
            .map
            .iter()
            .filter(|(_, e)| now - e.inserted_at > ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.map.remove(key);
            inner.order.retain(|k| k != key);
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherCondition;

    fn entry(loc: &str, dt: DateTime<Utc>) -> ForecastCacheEntry {
        ForecastCacheEntry {
            location_name: loc.into(),
            forecast_datetime: dt,
            cached_at: dt,
            temperature: 20.0,
            max_temperature: None,
            min_temperature: None,
            weather_condition: WeatherCondition::Clear,
            weather_description: "晴れ".into(),
            precipitation: 0.0,
            humidity: 50.0,
            wind_speed: 1.0,
            metadata: String::new(),
        }
    }

    #[test]
    fn put_then_get_hits() {
        let cache = MemoryCache::new(10, 300);
        let dt = Utc::now();
        cache.put("東京", dt, entry("東京", dt));
        assert!(cache.get("東京", dt).is_some());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = MemoryCache::new(10, 300);
        assert!(cache.get("大阪", Utc::now()).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let cache = MemoryCache::new(2, 300);
        let base = Utc::now();
        cache.put("a", base, entry("a", base));
        cache.put("b", base + chrono::Duration::minutes(1), entry("b", base));
        cache.put("c", base + chrono::Duration::minutes(2), entry("c", base));
        assert!(cache.get("a", base).is_none());
        assert!(cache.get("c", base + chrono::Duration::minutes(2)).is_some());
    }

    #[test]
    fn get_refreshes_lru_order() {
        let cache = MemoryCache::new(2, 300);
        let base = Utc::now();
        cache.put("a", base, entry("a", base));
        cache.put("b", base + chrono::Duration::minutes(1), entry("b", base));
        // touch "a" so "b" becomes the LRU victim
        cache.get("a", base);
        cache.put("c", base + chrono::Duration::minutes(2), entry("c", base));
        assert!(cache.get("a", base).is_some());
        assert!(cache.get("b", base + chrono::Duration::minutes(1)).is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = MemoryCache::new(10, 0);
        let dt = Utc::now() - chrono::Duration::seconds(5);
        cache.put("東京", dt, entry("東京", dt));
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get("東京", dt).is_none());
    }
}
