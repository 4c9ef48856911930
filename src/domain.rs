//! Core domain types shared across the pipeline.
//!
//! Character counts in this crate are always Unicode scalar values (`char`), never UTF-8
//! byte length and never grapheme clusters. Japanese text here contains no combining
//! marks or surrogate-pair emoji in practice, so scalar-value counting is both simpler
//! and sufficient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum and maximum accepted values for [`Forecast`] fields.
pub const TEMPERATURE_RANGE: (f64, f64) = (-50.0, 60.0);
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
pub const PRECIPITATION_RANGE: (f64, f64) = (0.0, 500.0);
pub const WIND_SPEED_RANGE: (f64, f64) = (0.0, 200.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Rain,
    HeavyRain,
    Thunder,
    Snow,
    HeavySnow,
    Storm,
    SevereStorm,
    ExtremeHeat,
    Unknown,
}

impl WeatherCondition {
    /// Rank used to pick "the worse" of two conditions within a priority-selection step.
    /// Higher is more editorially urgent. Mirrors the source's `weather_condition.priority`.
    pub fn priority(self) -> u8 {
        use WeatherCondition::*;
        match self {
            SevereStorm => 10,
            Storm => 9,
            Thunder => 8,
            HeavySnow => 7,
            HeavyRain => 6,
            Fog => 5,
            Snow => 4,
            Rain => 3,
            ExtremeHeat => 3,
            Cloudy => 2,
            PartlyCloudy => 1,
            Clear => 0,
            Unknown => 0,
        }
    }

    /// Severe weather per the glossary: heavy rain/storm/severe-storm/thunder/heavy
    /// snow/fog, independent of precipitation amount (precipitation > 10mm/h is checked
    /// separately by callers).
    pub fn is_severe(self) -> bool {
        matches!(
            self,
            WeatherCondition::HeavyRain
                | WeatherCondition::Storm
                | WeatherCondition::SevereStorm
                | WeatherCondition::Thunder
                | WeatherCondition::HeavySnow
                | WeatherCondition::Fog
        )
    }

    pub fn is_rainy(self) -> bool {
        matches!(
            self,
            WeatherCondition::Rain | WeatherCondition::HeavyRain | WeatherCondition::SevereStorm
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    Calm,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
    Unknown,
}

/// An immutable point-in-time weather forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location_name: String,
    /// Always JST; callers normalize via [`crate::jst::ensure_jst`] before constructing.
    pub datetime: DateTime<Utc>,
    pub temperature: f64,
    pub weather_code: String,
    pub weather_condition: WeatherCondition,
    pub weather_description: String,
    pub precipitation: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: WindDirection,
    pub wind_degrees: i32,
}

impl PartialEq<&Forecast> for Forecast {
    fn eq(&self, other: &&Forecast) -> bool {
        self.location_name == other.location_name && self.datetime == other.datetime
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastValidationError {
    #[error("temperature {0} out of range [-50, 60]")]
    Temperature(f64),
    #[error("humidity {0} out of range [0, 100]")]
    Humidity(f64),
    #[error("precipitation {0} out of range [0, 500]")]
    Precipitation(f64),
    #[error("wind speed {0} out of range [0, 200]")]
    WindSpeed(f64),
}

impl Forecast {
    pub fn validate(&self) -> Result<(), ForecastValidationError> {
        let (lo, hi) = TEMPERATURE_RANGE;
        if !(lo..=hi).contains(&self.temperature) {
            return Err(ForecastValidationError::Temperature(self.temperature));
        }
        let (lo, hi) = HUMIDITY_RANGE;
        if !(lo..=hi).contains(&self.humidity) {
            return Err(ForecastValidationError::Humidity(self.humidity));
        }
        let (lo, hi) = PRECIPITATION_RANGE;
        if !(lo..=hi).contains(&self.precipitation) {
            return Err(ForecastValidationError::Precipitation(self.precipitation));
        }
        let (lo, hi) = WIND_SPEED_RANGE;
        if !(lo..=hi).contains(&self.wind_speed) {
            return Err(ForecastValidationError::WindSpeed(self.wind_speed));
        }
        Ok(())
    }

    pub fn is_severe_weather(&self) -> bool {
        self.weather_condition.is_severe() || self.precipitation > 10.0
    }
}

/// Ordered sequence of forecasts for one location, ascending by time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastCollection {
    pub location_name: String,
    pub forecasts: Vec<Forecast>,
}

impl ForecastCollection {
    pub fn new(location_name: impl Into<String>, mut forecasts: Vec<Forecast>) -> Self {
        forecasts.sort_by_key(|f| f.datetime);
        Self {
            location_name: location_name.into(),
            forecasts,
        }
    }
}

/// A [`Forecast`] plus cache bookkeeping; persisted one-row-per-entry in L3 (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCacheEntry {
    pub location_name: String,
    pub forecast_datetime: DateTime<Utc>,
    pub cached_at: DateTime<Utc>,
    pub temperature: f64,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub weather_condition: WeatherCondition,
    pub weather_description: String,
    pub precipitation: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub metadata: String,
}

impl ForecastCacheEntry {
    pub fn from_forecast(forecast: &Forecast, cached_at: DateTime<Utc>) -> Self {
        Self {
            location_name: forecast.location_name.clone(),
            forecast_datetime: forecast.datetime,
            cached_at,
            temperature: forecast.temperature,
            max_temperature: None,
            min_temperature: None,
            weather_condition: forecast.weather_condition,
            weather_description: forecast.weather_description.clone(),
            precipitation: forecast.precipitation,
            humidity: forecast.humidity,
            wind_speed: forecast.wind_speed,
            metadata: String::new(),
        }
    }
}

/// (name, lat, lon) used by the spatial cache (L2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCoordinate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationCoordinate {
    /// Great-circle distance in kilometers, Haversine formula, Earth radius 6371.0 km.
    pub fn distance_to(&self, other: &LocationCoordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentType {
    WeatherComment,
    Advice,
}

/// A previously authored comment from the seasonal corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastComment {
    pub location: String,
    pub datetime: DateTime<Utc>,
    pub weather_condition_text: String,
    pub comment_text: String,
    pub comment_type: CommentType,
    pub temperature: Option<f64>,
    pub usage_count: u32,
    pub season: Option<String>,
    pub region: Option<String>,
}

impl PastComment {
    /// Display-character count, i.e. `char` count (Unicode scalar values).
    pub fn display_len(&self) -> usize {
        self.comment_text.chars().count()
    }
}

/// The atomic output of pair selection: one weather comment plus one advice comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPair {
    pub weather_comment: PastComment,
    pub advice_comment: PastComment,
    pub similarity_score: f64,
    pub selection_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub reason: String,
    pub violating_rule: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            reason: String::new(),
            violating_rule: None,
        }
    }

    pub fn reject(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: reason.into(),
            violating_rule: Some(rule.into()),
        }
    }
}
