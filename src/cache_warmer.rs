//! Cache warmer (A3): proactively fetches and caches forecasts for a configured list of
//! popular locations so the first real request for them is already a cache hit. Grounded
//! on `data/forecast_cache/cache_warmer.py`'s `CacheWarmer`; bounded concurrency follows
//! the corpus's `asyncio.Semaphore`-gated fan-out, ported here as a bounded concurrent
//! stream rather than a manual permit per task (see `services/poller.rs` for the
//! sequential sibling of this pattern).

use crate::cache::ForecastCache;
use crate::weather_client::WeatherClient;
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;

const TOP_LOCATIONS_LIMIT: usize = 20;
const WARM_STEP_HOURS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub access_count: u64,
}

fn default_priority() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
struct PopularLocationsFile {
    locations: Vec<PopularLocation>,
}

#[derive(Debug, Serialize)]
struct PopularLocationsFileOut<'a> {
    updated_at: DateTime<Utc>,
    locations: &'a [PopularLocation],
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheWarmerStats {
    pub warmed_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub total_time_ms: u64,
}

pub struct CacheWarmer {
    popular_locations: Vec<PopularLocation>,
    max_concurrent: usize,
    warm_hours_ahead: i64,
}

impl CacheWarmer {
    pub fn new(max_concurrent: usize, warm_hours_ahead: i64) -> Self {
        Self {
            popular_locations: Vec::new(),
            max_concurrent,
            warm_hours_ahead,
        }
    }

    /// Loads the ranked location list from disk. A missing or malformed file leaves the
    /// warmer with an empty list rather than failing — warming is a best-effort background
    /// task, never a startup precondition.
    pub fn load_popular_locations(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PopularLocationsFile>(&contents) {
                Ok(parsed) => {
                    self.popular_locations = parsed.locations;
                    self.sort_by_rank();
                    tracing::info!("loaded {} popular locations from {}", self.popular_locations.len(), path.display());
                }
                Err(e) => tracing::error!("failed to parse popular locations file {}: {e}", path.display()),
            },
            Err(e) => tracing::warn!("popular locations file {} not readable: {e}", path.display()),
        }
    }

    pub fn save_popular_locations(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!("failed to create directory for {}: {e}", path.display());
                return;
            }
        }
        let out = PopularLocationsFileOut { updated_at: Utc::now(), locations: &self.popular_locations };
        match serde_json::to_string_pretty(&out) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::error!("failed to write popular locations file {}: {e}", path.display());
                }
            }
            Err(e) => tracing::error!("failed to serialize popular locations: {e}"),
        }
    }

    fn sort_by_rank(&mut self) {
        self.popular_locations.sort_by(|a, b| (b.priority, b.access_count).cmp(&(a.priority, a.access_count)));
    }

    /// Adds a location, or bumps an existing one's access count, then re-sorts.
    pub fn add_popular_location(&mut self, location: PopularLocation) {
        if let Some(existing) = self.popular_locations.iter_mut().find(|l| l.name == location.name) {
            existing.access_count += 1;
        } else {
            self.popular_locations.push(location);
        }
        self.sort_by_rank();
    }

    pub fn stats_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "popular_locations_count": self.popular_locations.len(),
            "top_locations": self.popular_locations.iter().take(10).map(|l| serde_json::json!({
                "name": l.name,
                "access_count": l.access_count,
                "priority": l.priority,
            })).collect::<Vec<_>>(),
        })
    }

    /// Fetches and caches forecasts for the top-ranked locations at `WARM_STEP_HOURS`
    /// intervals out to `warm_hours_ahead`, bounded to `max_concurrent` in-flight fetches.
    /// Locations already present in the cache for a given hour are skipped without a
    /// network call.
    pub async fn warm_cache(&self, client: &WeatherClient, cache: &ForecastCache) -> CacheWarmerStats {
        let start = Utc::now();
        let now = Utc::now();

        let mut target_hours = Vec::new();
        let mut offset = 0;
        while offset < self.warm_hours_ahead {
            target_hours.push(now + Duration::hours(offset));
            offset += WARM_STEP_HOURS;
        }

        let top_locations: Vec<&PopularLocation> = self.popular_locations.iter().take(TOP_LOCATIONS_LIMIT).collect();
        for loc in &top_locations {
            cache.register_location_coordinate(&loc.name, loc.latitude, loc.longitude);
        }

        let jobs: Vec<(&PopularLocation, DateTime<Utc>)> =
            top_locations.iter().flat_map(|loc| target_hours.iter().map(move |t| (*loc, *t))).collect();

        let stats = std::sync::Mutex::new(CacheWarmerStats::default());
        futures::stream::iter(jobs)
            .for_each_concurrent(self.max_concurrent.max(1), |(loc, target_time)| {
                let stats = &stats;
                async move {
                    if cache.get(&loc.name, target_time).is_some() {
                        stats.lock().expect("cache warmer stats mutex poisoned").skipped_count += 1;
                        return;
                    }
                    match client.fetch_and_cache(&loc.name, loc.latitude, loc.longitude, cache).await {
                        Ok(_) => stats.lock().expect("cache warmer stats mutex poisoned").warmed_count += 1,
                        Err(e) => {
                            tracing::error!("cache warming failed for {} at {}: {e}", loc.name, target_time);
                            stats.lock().expect("cache warmer stats mutex poisoned").failed_count += 1;
                        }
                    }
                }
            })
            .await;

        let mut stats = stats.into_inner().expect("cache warmer stats mutex poisoned");
        stats.total_time_ms = (Utc::now() - start).num_milliseconds().max(0) as u64;
        tracing::info!(
            warmed = stats.warmed_count,
            skipped = stats.skipped_count,
            failed = stats.failed_count,
            ms = stats.total_time_ms,
            "cache warming complete"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_rank_orders_by_priority_then_access_count() {
        let mut warmer = CacheWarmer::new(5, 48);
        warmer.popular_locations = vec![
            PopularLocation { name: "a".into(), latitude: 0.0, longitude: 0.0, priority: 1, access_count: 5 },
            PopularLocation { name: "b".into(), latitude: 0.0, longitude: 0.0, priority: 2, access_count: 1 },
            PopularLocation { name: "c".into(), latitude: 0.0, longitude: 0.0, priority: 1, access_count: 10 },
        ];
        warmer.sort_by_rank();
        assert_eq!(warmer.popular_locations[0].name, "b");
        assert_eq!(warmer.popular_locations[1].name, "c");
        assert_eq!(warmer.popular_locations[2].name, "a");
    }

    #[test]
    fn add_popular_location_bumps_existing_access_count() {
        let mut warmer = CacheWarmer::new(5, 48);
        warmer.add_popular_location(PopularLocation { name: "東京".into(), latitude: 35.68, longitude: 139.76, priority: 1, access_count: 0 });
        warmer.add_popular_location(PopularLocation { name: "東京".into(), latitude: 35.68, longitude: 139.76, priority: 1, access_count: 0 });
        assert_eq!(warmer.popular_locations.len(), 1);
        assert_eq!(warmer.popular_locations[0].access_count, 1);
    }

    #[test]
    fn load_popular_locations_tolerates_missing_file() {
        let mut warmer = CacheWarmer::new(5, 48);
        warmer.load_popular_locations(Path::new("/nonexistent/popular_locations.json"));
        assert!(warmer.popular_locations.is_empty());
    }
}
