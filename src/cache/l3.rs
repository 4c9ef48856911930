//! L3: append-only per-location CSV log with compaction. Grounded on
//! `forecast_cache/manager.py`'s `get_cache_file_path`/`save_forecast`/`_cleanup_old_data`.

use crate::domain::{ForecastCacheEntry, WeatherCondition};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Strips `[^\w\s-]` and collapses whitespace/dash runs, matching the corpus's
/// `get_cache_file_path` sanitizer exactly (§6 "Cache CSV files").
pub fn safe_name(location: &str) -> String {
    let stripped: String = location
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    let mut out = String::new();
    let mut last_was_sep = false;
    for c in stripped.chars() {
        if c.is_whitespace() || c == '-' {
            if !last_was_sep {
                out.push('-');
                last_was_sep = true;
            }
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }
    out.trim_matches('-').to_string()
}

fn cache_file_path(cache_dir: &Path, location: &str) -> PathBuf {
    cache_dir.join(format!("forecast_cache_{}.csv", safe_name(location)))
}

const HEADER_FIELDS: [&str; 12] = [
    "location_name",
    "forecast_datetime",
    "cached_at",
    "temperature",
    "max_temperature",
    "min_temperature",
    "weather_condition",
    "weather_description",
    "precipitation",
    "humidity",
    "wind_speed",
    "metadata",
];

fn condition_to_str(c: WeatherCondition) -> &'static str {
    use WeatherCondition::*;
    match c {
        Clear => "clear",
        PartlyCloudy => "partly_cloudy",
        Cloudy => "cloudy",
        Fog => "fog",
        Rain => "rain",
        HeavyRain => "heavy_rain",
        Thunder => "thunder",
        Snow => "snow",
        HeavySnow => "heavy_snow",
        Storm => "storm",
        SevereStorm => "severe_storm",
        ExtremeHeat => "extreme_heat",
        Unknown => "unknown",
    }
}

fn condition_from_str(s: &str) -> WeatherCondition {
    use WeatherCondition::*;
    match s {
        "clear" => Clear,
        "partly_cloudy" => PartlyCloudy,
        "cloudy" => Cloudy,
        "fog" => Fog,
        "rain" => Rain,
        "heavy_rain" => HeavyRain,
        "thunder" => Thunder,
        "snow" => Snow,
        "heavy_snow" => HeavySnow,
        "storm" => Storm,
        "severe_storm" => SevereStorm,
        "extreme_heat" => ExtremeHeat,
        _ => Unknown,
    }
}

fn row_to_entry(fields: &csv::StringRecord) -> Option<ForecastCacheEntry> {
    if fields.len() < 6 {
        return None;
    }
    Some(ForecastCacheEntry {
        location_name: fields[0].to_string(),
        forecast_datetime: DateTime::parse_from_rfc3339(&fields[1]).ok()?.with_timezone(&Utc),
        cached_at: DateTime::parse_from_rfc3339(&fields[2]).ok()?.with_timezone(&Utc),
        temperature: fields[3].parse().ok()?,
        max_temperature: fields.get(4).and_then(|s| s.parse().ok()),
        min_temperature: fields.get(5).and_then(|s| s.parse().ok()),
        weather_condition: fields.get(6).map(condition_from_str).unwrap_or(WeatherCondition::Unknown),
        weather_description: fields.get(7).unwrap_or("").to_string(),
        precipitation: fields.get(8).and_then(|s| s.parse().ok()).unwrap_or(0.0),
        humidity: fields.get(9).and_then(|s| s.parse().ok()).unwrap_or(0.0),
        wind_speed: fields.get(10).and_then(|s| s.parse().ok()).unwrap_or(0.0),
        metadata: fields.get(11).unwrap_or("").to_string(),
    })
}

fn entry_to_row(e: &ForecastCacheEntry) -> [String; 12] {
    [
        e.location_name.clone(),
        e.forecast_datetime.to_rfc3339(),
        e.cached_at.to_rfc3339(),
        e.temperature.to_string(),
        e.max_temperature.map(|v| v.to_string()).unwrap_or_default(),
        e.min_temperature.map(|v| v.to_string()).unwrap_or_default(),
        condition_to_str(e.weather_condition).to_string(),
        e.weather_description.clone(),
        e.precipitation.to_string(),
        e.humidity.to_string(),
        e.wind_speed.to_string(),
        e.metadata.clone(),
    ]
}

pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn read_all(&self, location: &str) -> Vec<ForecastCacheEntry> {
        let path = cache_file_path(&self.cache_dir, location);
        let Ok(mut reader) = csv::ReaderBuilder::new().has_headers(true).from_path(&path) else {
            return Vec::new();
        };
        reader
            .records()
            .filter_map(|r| r.ok())
            .filter_map(|record| row_to_entry(&record))
            .collect()
    }

    /// Appends one row, creating the file with a header if it doesn't exist yet, then
    /// compacts (drops entries older than `retention_days`). IO failures are warnings.
    pub fn save(&self, entry: &ForecastCacheEntry, retention_days: i64) {
        if let Err(err) = std::fs::create_dir_all(&self.cache_dir) {
            tracing::warn!("failed to create cache dir: {err}");
            return;
        }
        let path = cache_file_path(&self.cache_dir, &entry.location_name);
        let is_new = !path.exists();

        let append_result = (|| -> Result<(), csv::Error> {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            if is_new {
                writer.write_record(HEADER_FIELDS)?;
            }
            writer.write_record(entry_to_row(entry))?;
            writer.flush()?;
            Ok(())
        })();

        if let Err(err) = append_result {
            tracing::warn!("failed to append forecast cache row: {err}");
            return;
        }

        self.compact(&entry.location_name, retention_days);
    }

    fn compact(&self, location: &str, retention_days: i64) {
        let cutoff = Utc::now() - chrono::Duration::days(retention_days);
        let entries = self.read_all(location);
        let kept: Vec<&ForecastCacheEntry> =
            entries.iter().filter(|e| e.cached_at >= cutoff).collect();
        if kept.len() == entries.len() {
            return;
        }
        let path = cache_file_path(&self.cache_dir, location);
        let write_result = (|| -> Result<(), csv::Error> {
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&path)?;
            writer.write_record(HEADER_FIELDS)?;
            for e in &kept {
                writer.write_record(entry_to_row(e))?;
            }
            writer.flush()?;
            Ok(())
        })();
        if let Err(err) = write_result {
            tracing::warn!("failed to compact forecast cache file: {err}");
        }
    }

    /// Scans the file, filters by ±`days_range` around `target`, returns the entry
    /// minimizing the time gap (tie-broken by newest `cached_at`), rejecting gaps beyond
    /// `tolerance_hours`.
    pub fn get(
        &self,
        location: &str,
        target: DateTime<Utc>,
        days_range: i64,
        tolerance_hours: i64,
    ) -> Option<ForecastCacheEntry> {
        let window = chrono::Duration::days(days_range);
        let lo = target - window;
        let hi = target + window;

        let mut best: Option<(ForecastCacheEntry, i64)> = None;
        for entry in self.read_all(location) {
            if entry.forecast_datetime < lo || entry.forecast_datetime > hi {
                continue;
            }
            let gap = (entry.forecast_datetime - target).num_seconds().abs();
            match &best {
                None => best = Some((entry, gap)),
                Some((current, current_gap)) => {
                    if gap < *current_gap
                        || (gap == *current_gap && entry.cached_at > current.cached_at)
                    {
                        best = Some((entry, gap));
                    }
                }
            }
        }

        best.and_then(|(entry, gap)| {
            if gap <= tolerance_hours * 3600 {
                Some(entry)
            } else {
                None
            }
        })
    }
}
