//! Weather API client (C4). Grounded on `services/yr.rs`'s `YrClient`: a `reqwest::Client`
//! built once with a fixed timeout and descriptive user-agent, one GET per fetch, typed
//! deserialization of the upstream envelope.
//!
//! Wire format (§6): `{ "wxdata": [{ "srf": [...], "mrf": [...] }] }`. `srf` entries are
//! short-range hourly records, `mrf` entries are mid-range daily records using `maxtemp`.

use crate::cache::ForecastCache;
use crate::config::ApiRetryConfig;
use crate::domain::{Forecast, ForecastCollection};
use crate::errors::{ApiErrorKind, AppError};
use crate::weather_codes::{convert_weather_code, convert_wind_direction, get_weather_description};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const WEATHER_API_URL: &str = "https://weather.example.test/v1/forecast";
const HTTP_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "weather-comment-gen/0.1";

#[derive(Debug, Deserialize)]
struct WxResponse {
    wxdata: Vec<WxDataBlock>,
}

#[derive(Debug, Deserialize)]
struct WxDataBlock {
    #[serde(default)]
    srf: Vec<SrfEntry>,
    #[serde(default)]
    mrf: Vec<MrfEntry>,
}

#[derive(Debug, Deserialize)]
struct SrfEntry {
    date: String,
    wx: String,
    temp: f64,
    prec: f64,
    rhum: f64,
    wndspd: f64,
    wnddir: i32,
}

#[derive(Debug, Deserialize)]
struct MrfEntry {
    date: String,
    wx: String,
    maxtemp: f64,
    #[serde(default)]
    prec: f64,
    #[serde(default)]
    rhum: f64,
    #[serde(default)]
    wndspd: f64,
    #[serde(default)]
    wnddir: i32,
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn srf_to_forecast(location: &str, e: &SrfEntry) -> Option<Forecast> {
    let datetime = parse_iso8601(&e.date)?;
    let (wind_direction, wind_degrees) = convert_wind_direction(e.wnddir);
    Some(Forecast {
        location_name: location.to_string(),
        datetime,
        temperature: e.temp,
        weather_code: e.wx.clone(),
        weather_condition: convert_weather_code(&e.wx),
        weather_description: get_weather_description(&e.wx).to_string(),
        precipitation: e.prec,
        humidity: e.rhum,
        wind_speed: e.wndspd,
        wind_direction,
        wind_degrees,
    })
}

fn mrf_to_forecast(location: &str, e: &MrfEntry) -> Option<Forecast> {
    let datetime = parse_iso8601(&e.date)?;
    let (wind_direction, wind_degrees) = convert_wind_direction(e.wnddir);
    Some(Forecast {
        location_name: location.to_string(),
        datetime,
        temperature: e.maxtemp,
        weather_code: e.wx.clone(),
        weather_condition: convert_weather_code(&e.wx),
        weather_description: get_weather_description(&e.wx).to_string(),
        precipitation: e.prec,
        humidity: e.rhum,
        wind_speed: e.wndspd,
        wind_direction,
        wind_degrees,
    })
}

/// Client for the upstream weather forecast API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    retry: ApiRetryConfig,
}

impl WeatherClient {
    pub fn new(retry: ApiRetryConfig) -> Self {
        Self::with_base_url(WEATHER_API_URL.to_string(), retry)
    }

    pub fn with_base_url(base_url: String, retry: ApiRetryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            retry,
        }
    }

    fn classify_status(status: reqwest::StatusCode) -> ApiErrorKind {
        match status.as_u16() {
            401 => ApiErrorKind::ApiKeyInvalid,
            429 => ApiErrorKind::RateLimit,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Network,
        }
    }

    fn is_retryable(kind: ApiErrorKind) -> bool {
        matches!(kind, ApiErrorKind::Network | ApiErrorKind::Timeout | ApiErrorKind::Server)
    }

    async fn fetch_once(&self, lat: f64, lon: f64) -> Result<WxResponse, AppError> {
        let url = format!("{}?lat={:.4}&lon={:.4}", self.base_url, lat, lon);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                ApiErrorKind::Timeout
            } else {
                ApiErrorKind::Network
            };
            AppError::Api {
                kind,
                message: format!("weather API request failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            let kind = Self::classify_status(response.status());
            return Err(AppError::Api {
                kind,
                message: format!("weather API returned HTTP {}", response.status()),
            });
        }

        let body: WxResponse = response.json().await.map_err(|e| AppError::Api {
            kind: ApiErrorKind::EmptyData,
            message: format!("weather API response parse error: {e}"),
        })?;

        if body.wxdata.is_empty() {
            return Err(AppError::Api {
                kind: ApiErrorKind::EmptyData,
                message: "weather API returned no wxdata".into(),
            });
        }

        Ok(body)
    }

    /// Fetches the next-day hourly forecast collection for a location, retrying
    /// transient failures with exponential backoff per §4.2.
    pub async fn fetch_next_day_hours(
        &self,
        location_name: &str,
        lat: f64,
        lon: f64,
    ) -> Result<ForecastCollection, AppError> {
        let mut delay = self.retry.initial_delay_secs;
        let mut last_err = None;

        for attempt in 0..=self.retry.max_retries {
            match self.fetch_once(lat, lon).await {
                Ok(body) => {
                    let mut forecasts = Vec::new();
                    for block in &body.wxdata {
                        forecasts.extend(block.srf.iter().filter_map(|e| srf_to_forecast(location_name, e)));
                        forecasts.extend(block.mrf.iter().filter_map(|e| mrf_to_forecast(location_name, e)));
                    }
                    if forecasts.is_empty() {
                        last_err = Some(AppError::Api {
                            kind: ApiErrorKind::EmptyData,
                            message: "weather API returned no usable forecast entries".into(),
                        });
                        break;
                    }
                    return Ok(ForecastCollection::new(location_name, forecasts));
                }
                Err(AppError::Api { kind, message }) => {
                    let retryable = Self::is_retryable(kind) && attempt < self.retry.max_retries;
                    last_err = Some(AppError::Api { kind, message });
                    if !retryable {
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
                    delay *= self.retry.backoff_multiplier;
                }
                Err(other) => {
                    last_err = Some(other);
                    break;
                }
            }
        }

        Err(last_err.unwrap_or(AppError::Api {
            kind: ApiErrorKind::Network,
            message: "weather API fetch exhausted retries with no captured error".into(),
        }))
    }

    /// Fetches and, on success, persists every forecast in the collection to the cache.
    pub async fn fetch_and_cache(
        &self,
        location_name: &str,
        lat: f64,
        lon: f64,
        cache: &ForecastCache,
    ) -> Result<ForecastCollection, AppError> {
        let collection = self.fetch_next_day_hours(location_name, lat, lon).await?;
        for forecast in &collection.forecasts {
            cache.put(forecast);
        }
        Ok(collection)
    }
}
