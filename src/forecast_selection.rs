//! Forecast selection (C5): target-hour extraction and priority-based "the" forecast
//! choice. Grounded on `data_validator.py`'s `select_priority_forecast` and
//! `temperature_analysis_service.py`'s trend/diff helpers.

use crate::config::SelectionConfig;
use crate::domain::{Forecast, ForecastCollection, WeatherCondition};
use crate::jst::jst_hour;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::HashMap;

/// Picks, for each of `config.target_hours`, the forecast in `collection` whose JST hour
/// on `target_date` is closest to that target hour. No tolerance cutoff: the closest entry
/// always wins, mirroring the corpus's unconditional nearest-match behavior.
pub fn extract_target_hour_forecasts<'a>(
    collection: &'a ForecastCollection,
    target_date: NaiveDate,
    config: &SelectionConfig,
) -> Vec<&'a Forecast> {
    let mut picks = Vec::new();
    for &target_hour in &config.target_hours {
        let target_dt = target_date
            .and_hms_opt(target_hour, 0, 0)
            .expect("target hour 0-23 is always valid");

        let best = collection.forecasts.iter().min_by_key(|f| {
            let naive = f.datetime.naive_utc();
            (naive - target_dt).num_seconds().abs()
        });
        if let Some(f) = best {
            picks.push(f);
        }
    }
    picks
}

/// Today if the current JST hour is before `date_boundary_hour`, tomorrow otherwise.
pub fn target_date(now: DateTime<Utc>, config: &SelectionConfig) -> NaiveDate {
    let today = crate::jst::jst_date(now);
    if jst_hour(now) < config.date_boundary_hour {
        today
    } else {
        today.succ_opt().unwrap_or(today)
    }
}

fn is_alert_condition(c: WeatherCondition) -> bool {
    matches!(
        c,
        WeatherCondition::Thunder
            | WeatherCondition::Fog
            | WeatherCondition::Storm
            | WeatherCondition::SevereStorm
    )
}

/// The seven-step priority ladder from §4.3: the first matching step wins, ties within a
/// step broken by the named "highest" metric.
pub fn select_priority_forecast<'a>(hourly: &[&'a Forecast]) -> Option<&'a Forecast> {
    if hourly.is_empty() {
        return None;
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| is_alert_condition(f.weather_condition))
        .max_by_key(|f| f.weather_condition.priority())
    {
        return Some(f);
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| f.precipitation > 10.0)
        .max_by(|a, b| a.precipitation.partial_cmp(&b.precipitation).unwrap())
    {
        return Some(f);
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| f.precipitation > 0.0)
        .max_by(|a, b| a.precipitation.partial_cmp(&b.precipitation).unwrap())
    {
        return Some(f);
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| f.temperature >= 35.0)
        .max_by(|a, b| a.temperature.partial_cmp(&b.temperature).unwrap())
    {
        return Some(f);
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| f.is_severe_weather())
        .max_by(|a, b| a.precipitation.partial_cmp(&b.precipitation).unwrap())
    {
        return Some(f);
    }

    if let Some(f) = hourly
        .iter()
        .filter(|f| f.weather_condition != WeatherCondition::Clear)
        .max_by_key(|f| f.weather_condition.priority())
    {
        return Some(f);
    }

    hourly
        .iter()
        .max_by(|a, b| a.temperature.partial_cmp(&b.temperature).unwrap())
        .copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Deteriorating,
    Stable,
}

/// Compares condition ranks across the ordered hourly forecasts; requires at least
/// `trend_analysis_min_forecasts` entries, else returns `None` (skip, not an error).
pub fn analyze_trend(hourly: &[&Forecast], config: &SelectionConfig) -> Option<TrendDirection> {
    if hourly.len() < config.trend_analysis_min_forecasts {
        return None;
    }
    let first_rank = hourly.first()?.weather_condition.priority();
    let last_rank = hourly.last()?.weather_condition.priority();
    Some(if last_rank > first_rank {
        TrendDirection::Deteriorating
    } else if last_rank < first_rank {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    })
}

/// Temperature differences against cached history: previous-day same-hour, 12h-ago, and
/// the day's min/max range. Any failure to find a comparison point yields an empty map —
/// this is logged by the caller at warn level, never propagated as an error (§4.3).
pub fn compute_temperature_differences(
    current: &Forecast,
    hourly: &[&Forecast],
    cache: &crate::cache::ForecastCache,
) -> HashMap<String, f64> {
    let mut diffs = HashMap::new();

    if let Some(prev_day) = cache.get(&current.location_name, current.datetime - chrono::Duration::days(1)) {
        diffs.insert("vs_previous_day".to_string(), current.temperature - prev_day.temperature);
    }

    if let Some(twelve_hours_ago) = cache.get(&current.location_name, current.datetime - chrono::Duration::hours(12)) {
        diffs.insert("vs_12h_ago".to_string(), current.temperature - twelve_hours_ago.temperature);
    }

    if !hourly.is_empty() {
        let min = hourly.iter().map(|f| f.temperature).fold(f64::INFINITY, f64::min);
        let max = hourly.iter().map(|f| f.temperature).fold(f64::NEG_INFINITY, f64::max);
        diffs.insert("daily_min_temp".to_string(), min);
        diffs.insert("daily_max_temp".to_string(), max);
        diffs.insert("daily_temp_range".to_string(), max - min);
    }

    diffs
}

pub fn month_of(dt: DateTime<Utc>) -> u32 {
    crate::jst::jst_date(dt).month()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindDirection;

    fn forecast(hour: u32, temp: f64, precip: f64, condition: WeatherCondition) -> Forecast {
        let dt = chrono::Utc::now().date_naive().and_hms_opt(hour, 0, 0).unwrap();
        Forecast {
            location_name: "東京".into(),
            datetime: DateTime::from_naive_utc_and_offset(dt, chrono::Utc),
            temperature: temp,
            weather_code: "100".into(),
            weather_condition: condition,
            weather_description: String::new(),
            precipitation: precip,
            humidity: 50.0,
            wind_speed: 1.0,
            wind_direction: WindDirection::N,
            wind_degrees: 0,
        }
    }

    #[test]
    fn priority_ladder_picks_thunder_over_everything() {
        let a = forecast(9, 30.0, 0.0, WeatherCondition::Clear);
        let b = forecast(12, 36.0, 15.0, WeatherCondition::Thunder);
        let picked = select_priority_forecast(&[&a, &b]).unwrap();
        assert_eq!(picked.weather_condition, WeatherCondition::Thunder);
    }

    #[test]
    fn priority_ladder_picks_heaviest_rain_when_no_alert_condition() {
        let a = forecast(9, 20.0, 12.0, WeatherCondition::Rain);
        let b = forecast(12, 20.0, 20.0, WeatherCondition::HeavyRain);
        let picked = select_priority_forecast(&[&a, &b]).unwrap();
        assert_eq!(picked.precipitation, 20.0);
    }

    #[test]
    fn priority_ladder_rain_beats_extreme_heat() {
        let hot = forecast(9, 38.0, 0.0, WeatherCondition::Clear);
        let rainy = forecast(12, 25.0, 2.0, WeatherCondition::Rain);
        let picked = select_priority_forecast(&[&hot, &rainy]).unwrap();
        assert_eq!(picked.precipitation, 2.0);
    }

    #[test]
    fn priority_ladder_falls_back_to_hottest_clear_forecast() {
        let a = forecast(9, 22.0, 0.0, WeatherCondition::Clear);
        let b = forecast(15, 28.0, 0.0, WeatherCondition::Clear);
        let picked = select_priority_forecast(&[&a, &b]).unwrap();
        assert_eq!(picked.temperature, 28.0);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(select_priority_forecast(&[]).is_none());
    }

    #[test]
    fn trend_requires_minimum_forecast_count() {
        let cfg = SelectionConfig::default();
        let a = forecast(9, 20.0, 0.0, WeatherCondition::Clear);
        assert!(analyze_trend(&[&a], &cfg).is_none());
    }

    #[test]
    fn trend_detects_deterioration() {
        let cfg = SelectionConfig::default();
        let a = forecast(9, 20.0, 0.0, WeatherCondition::Clear);
        let b = forecast(18, 20.0, 0.0, WeatherCondition::Thunder);
        assert_eq!(analyze_trend(&[&a, &b], &cfg), Some(TrendDirection::Deteriorating));
    }

    #[test]
    fn temperature_differences_includes_daily_min_max_range() {
        let cache_dir = std::env::temp_dir().join(format!("weather-comment-gen-test-temp-diffs-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&cache_dir);
        std::fs::create_dir_all(&cache_dir).unwrap();
        let cache = crate::cache::ForecastCache::new(&crate::config::CacheConfig::default(), &cache_dir);

        let morning = forecast(9, 18.0, 0.0, WeatherCondition::Clear);
        let noon = forecast(12, 26.0, 0.0, WeatherCondition::Clear);
        let evening = forecast(18, 22.0, 0.0, WeatherCondition::Clear);
        let hourly = [&morning, &noon, &evening];

        let diffs = compute_temperature_differences(&noon, &hourly, &cache);
        assert_eq!(diffs["daily_min_temp"], 18.0);
        assert_eq!(diffs["daily_max_temp"], 26.0);
        assert_eq!(diffs["daily_temp_range"], 8.0);

        let _ = std::fs::remove_dir_all(&cache_dir);
    }
}
