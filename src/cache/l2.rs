//! L2: spatial neighbor cache. Grounded on `forecast_cache/spatial_cache.py`.

use crate::domain::{ForecastCacheEntry, LocationCoordinate};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
pub struct L2Stats {
    pub direct_hits: u64,
    pub neighbor_hits: u64,
    pub misses: u64,
}

struct Inner {
    locations: HashMap<String, LocationCoordinate>,
    entries: HashMap<String, Vec<(DateTime<Utc>, ForecastCacheEntry)>>,
    stats: L2Stats,
}

pub struct SpatialCache {
    max_distance_km: f64,
    max_neighbors: usize,
    inner: Mutex<Inner>,
}

const MAX_ENTRIES_PER_LOCATION: usize = 100;

impl SpatialCache {
    pub fn new(max_distance_km: f64, max_neighbors: usize) -> Self {
        Self {
            max_distance_km,
            max_neighbors,
            inner: Mutex::new(Inner {
                locations: HashMap::new(),
                entries: HashMap::new(),
                stats: L2Stats::default(),
            }),
        }
    }

    pub fn register_location(&self, name: &str, latitude: f64, longitude: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.locations.insert(
            name.to_string(),
            LocationCoordinate {
                name: name.to_string(),
                latitude,
                longitude,
            },
        );
    }

    pub fn put(&self, location: &str, forecast_datetime: DateTime<Utc>, entry: ForecastCacheEntry) {
        let mut inner = self.inner.lock().unwrap();
        let list = inner.entries.entry(location.to_string()).or_default();
        list.retain(|(dt, _)| *dt != forecast_datetime);
        list.push((forecast_datetime, entry));
        if list.len() > MAX_ENTRIES_PER_LOCATION {
            let excess = list.len() - MAX_ENTRIES_PER_LOCATION;
            list.drain(0..excess);
        }
    }

    fn get_direct_locked(
        inner: &Inner,
        location: &str,
        target: DateTime<Utc>,
        tolerance_hours: i64,
    ) -> Option<ForecastCacheEntry> {
        let list = inner.entries.get(location)?;
        let mut best: Option<(&ForecastCacheEntry, f64)> = None;
        for (dt, entry) in list {
            let diff_hours = (*dt - target).num_seconds().abs() as f64 / 3600.0;
            if diff_hours <= tolerance_hours as f64 {
                if best.is_none() || diff_hours < best.unwrap().1 {
                    best = Some((entry, diff_hours));
                }
            }
        }
        best.map(|(e, _)| e.clone())
    }

    pub fn get(
        &self,
        location: &str,
        target: DateTime<Utc>,
        tolerance_hours: i64,
    ) -> Option<ForecastCacheEntry> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(direct) = Self::get_direct_locked(&inner, location, target, tolerance_hours) {
            inner.stats.direct_hits += 1;
            return Some(direct);
        }

        let Some(target_coord) = inner.locations.get(location).cloned() else {
            inner.stats.misses += 1;
            return None;
        };

        let mut neighbors: Vec<(LocationCoordinate, f64)> = inner
            .locations
            .values()
            .filter(|c| c.name != target_coord.name)
            .map(|c| (c.clone(), target_coord.distance_to(c)))
            .filter(|(_, d)| *d <= self.max_distance_km)
            .collect();
        neighbors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        neighbors.truncate(self.max_neighbors);

        for (neighbor, _distance) in neighbors {
            if let Some(found) =
                Self::get_direct_locked(&inner, &neighbor.name, target, tolerance_hours)
            {
                inner.stats.neighbor_hits += 1;
                let mut relabeled = found;
                relabeled.location_name = location.to_string();
                return Some(relabeled);
            }
        }

        inner.stats.misses += 1;
        None
    }

    pub fn stats(&self) -> L2Stats {
        self.inner.lock().unwrap().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherCondition;

    fn entry(loc: &str, dt: DateTime<Utc>, temp: f64) -> ForecastCacheEntry {
        ForecastCacheEntry {
            location_name: loc.into(),
            forecast_datetime: dt,
            cached_at: dt,
            temperature: temp,
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
    fn direct_hit_without_neighbors() {
        let cache = SpatialCache::new(10.0, 5);
        let dt = Utc::now();
        cache.put("東京", dt, entry("東京", dt, 20.0));
        assert!(cache.get("東京", dt, 3).is_some());
        assert_eq!(cache.stats().direct_hits, 1);
    }

    #[test]
    fn neighbor_hit_uses_nearby_registered_location() {
        let cache = SpatialCache::new(50.0, 5);
        cache.register_location("東京", 35.6762, 139.6503);
        cache.register_location("横浜", 35.4437, 139.6380);
        let dt = Utc::now();
        cache.put("横浜", dt, entry("横浜", dt, 21.0));

        let result = cache.get("東京", dt, 3).expect("expected neighbor hit");
        assert_eq!(result.location_name, "東京");
        assert_eq!(result.temperature, 21.0);
        assert_eq!(cache.stats().neighbor_hits, 1);
    }

    #[test]
    fn no_neighbor_hit_for_unregistered_location() {
        let cache = SpatialCache::new(50.0, 5);
        cache.register_location("横浜", 35.4437, 139.6380);
        cache.put("横浜", Utc::now(), entry("横浜", Utc::now(), 21.0));
        assert!(cache.get("未登録の地点", Utc::now(), 3).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn neighbor_beyond_max_distance_is_not_used() {
        let cache = SpatialCache::new(1.0, 5);
        cache.register_location("東京", 35.6762, 139.6503);
        cache.register_location("大阪", 34.6937, 135.5023);
        let dt = Utc::now();
        cache.put("大阪", dt, entry("大阪", dt, 25.0));
        assert!(cache.get("東京", dt, 3).is_none());
    }
}
