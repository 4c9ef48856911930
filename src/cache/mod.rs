//! Three-tier forecast cache (C3). Grounded on `forecast_cache/manager.py`'s
//! `ForecastCacheManager`: reads fall through L1 → L2 → L3, writes propagate up to all
//! three so a later read at any tier sees the freshest value.

pub mod l1;
pub mod l2;
pub mod l3;

use crate::config::CacheConfig;
use crate::domain::{Forecast, ForecastCacheEntry};
use chrono::{DateTime, Utc};

pub use l1::L1Stats;
pub use l2::L2Stats;
pub use l3::safe_name;

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub l1: L1Stats,
    pub l2: L2Stats,
}

pub struct ForecastCache {
    l1: l1::MemoryCache,
    l2: l2::SpatialCache,
    l3: l3::DiskCache,
    retention_days: i64,
    l3_days_range: i64,
    l3_tolerance_hours: i64,
}

impl ForecastCache {
    pub fn new(config: &CacheConfig, cache_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            l1: l1::MemoryCache::new(config.l1_max_size, config.l1_ttl_secs),
            l2: l2::SpatialCache::new(config.l2_max_distance_km, config.l2_max_neighbors),
            l3: l3::DiskCache::new(cache_dir),
            retention_days: config.retention_days,
            l3_days_range: config.l3_days_range,
            l3_tolerance_hours: config.l3_tolerance_hours,
        }
    }

    pub fn register_location_coordinate(&self, name: &str, latitude: f64, longitude: f64) {
        self.l2.register_location(name, latitude, longitude);
    }

    /// Stores a freshly-fetched forecast in all three tiers.
    pub fn put(&self, forecast: &Forecast) {
        let entry = ForecastCacheEntry::from_forecast(forecast, Utc::now());
        self.l1.put(&forecast.location_name, forecast.datetime, entry.clone());
        self.l2.put(&forecast.location_name, forecast.datetime, entry.clone());
        self.l3.save(&entry, self.retention_days);
    }

    /// Reads through L1 → L2 → L3, back-filling faster tiers on a lower-tier hit so the
    /// next lookup for the same key is served from L1.
    pub fn get(&self, location: &str, target: DateTime<Utc>) -> Option<ForecastCacheEntry> {
        if let Some(hit) = self.l1.get(location, target) {
            return Some(hit);
        }

        if let Some(hit) = self.l2.get(location, target, self.l3_tolerance_hours) {
            self.l1.put(location, target, hit.clone());
            return Some(hit);
        }

        if let Some(hit) = self.l3.get(location, target, self.l3_days_range, self.l3_tolerance_hours) {
            self.l1.put(location, target, hit.clone());
            self.l2.put(location, target, hit.clone());
            return Some(hit);
        }

        None
    }

    pub fn cleanup_expired_l1(&self) -> usize {
        self.l1.cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1: self.l1.stats(),
            l2: self.l2.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindDirection;

    fn forecast(loc: &str, dt: DateTime<Utc>) -> Forecast {
        Forecast {
            location_name: loc.into(),
            datetime: dt,
            temperature: 21.0,
            weather_code: "100".into(),
            weather_condition: crate::domain::WeatherCondition::Clear,
            weather_description: "晴れ".into(),
            precipitation: 0.0,
            humidity: 55.0,
            wind_speed: 2.0,
            wind_direction: WindDirection::N,
            wind_degrees: 0,
        }
    }

    fn temp_cache() -> (ForecastCache, tempdir::TempDir) {
        let dir = tempdir::TempDir::new("cache-mod");
        let cfg = CacheConfig {
            l1_max_size: 10,
            l1_ttl_secs: 300,
            l2_max_distance_km: 10.0,
            l2_max_neighbors: 5,
            l3_tolerance_hours: 3,
            l3_days_range: 2,
            retention_days: 7,
        };
        let cache = ForecastCache::new(&cfg, dir.path());
        (cache, dir)
    }

    mod tempdir {
        use std::path::PathBuf;

        pub struct TempDir(PathBuf);
        impl TempDir {
            pub fn new(tag: &str) -> Self {
                let p = std::env::temp_dir().join(format!(
                    "weather-comment-gen-test-{tag}-{}",
                    std::process::id()
                ));
                let _ = std::fs::remove_dir_all(&p);
                std::fs::create_dir_all(&p).unwrap();
                TempDir(p)
            }
            pub fn path(&self) -> &std::path::Path {
                &self.0
            }
        }
        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    #[test]
    fn put_then_get_hits_l1() {
        let (cache, _dir) = temp_cache();
        let dt = Utc::now();
        cache.put(&forecast("東京", dt));
        assert!(cache.get("東京", dt).is_some());
        assert_eq!(cache.stats().l1.hits, 1);
    }

    #[test]
    fn l3_hit_backfills_l1() {
        let (cache, dir) = temp_cache();
        let dt = Utc::now();
        cache.put(&forecast("東京", dt));

        // Fresh cache instance over the same directory sees only the L3 write.
        let cfg = CacheConfig {
            l1_max_size: 10,
            l1_ttl_secs: 300,
            l2_max_distance_km: 10.0,
            l2_max_neighbors: 5,
            l3_tolerance_hours: 3,
            l3_days_range: 2,
            retention_days: 7,
        };
        let cold = ForecastCache::new(&cfg, dir.path());
        assert!(cold.get("東京", dt).is_some());
        assert_eq!(cold.stats().l1.hits, 0, "first read is served by L3, not L1");
        assert!(cold.get("東京", dt).is_some());
        assert_eq!(cold.stats().l1.hits, 1, "second read should now hit L1 after backfill");
    }

    #[test]
    fn miss_for_unknown_location_and_time() {
        let (cache, _dir) = temp_cache();
        assert!(cache.get("未知の地点", Utc::now()).is_none());
    }
}
