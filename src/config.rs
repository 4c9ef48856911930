//! Externalized numeric thresholds and lexicons (C11), plus environment-derived
//! application configuration.
//!
//! Numeric thresholds follow the teacher's `AppConfig::from_env()` idiom: every value has
//! an environment-variable override and a hard-coded default. String lexicons are loaded
//! from YAML files (§6 Configuration) with a compiled-in fallback table for when the file
//! is absent, mirroring the corpus's `_get_default_tone_words()` pattern.

use std::collections::HashMap;
use std::path::Path;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Application-level configuration (API keys, provider choice, directories).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_provider: String,
    pub corpus_dir: String,
    pub cache_dir: String,
    pub config_dir: String,
    pub locations_file: String,
    pub popular_locations_file: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            llm_provider: std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            corpus_dir: std::env::var("CORPUS_DIR").unwrap_or_else(|_| "./data/corpus".to_string()),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| "./data/cache".to_string()),
            config_dir: std::env::var("CONFIG_DIR").unwrap_or_else(|_| "./config".to_string()),
            locations_file: std::env::var("LOCATIONS_FILE").unwrap_or_else(|_| "./data/locations.json".to_string()),
            popular_locations_file: std::env::var("POPULAR_LOCATIONS_FILE").unwrap_or_else(|_| "./data/popular_locations.json".to_string()),
        }
    }
}

/// Numeric thresholds for the forecast cache (C3).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub l1_max_size: usize,
    pub l1_ttl_secs: u64,
    pub l2_max_distance_km: f64,
    pub l2_max_neighbors: usize,
    pub l3_tolerance_hours: i64,
    pub l3_days_range: i64,
    pub retention_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1_max_size: env_or("CACHE_L1_MAX_SIZE", 500),
            l1_ttl_secs: env_or("CACHE_L1_TTL_SECS", 300),
            l2_max_distance_km: env_or("CACHE_L2_MAX_DISTANCE_KM", 10.0),
            l2_max_neighbors: env_or("CACHE_L2_MAX_NEIGHBORS", 5),
            l3_tolerance_hours: env_or("CACHE_L3_TOLERANCE_HOURS", 3),
            l3_days_range: env_or("CACHE_L3_DAYS_RANGE", 2),
            retention_days: env_or("CACHE_RETENTION_DAYS", 7),
        }
    }
}

/// Retry/backoff policy for the weather API client (C4).
#[derive(Debug, Clone)]
pub struct ApiRetryConfig {
    pub max_retries: u32,
    pub initial_delay_secs: f64,
    pub backoff_multiplier: f64,
}

impl Default for ApiRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: env_or("API_MAX_RETRIES", 3),
            initial_delay_secs: env_or("API_INITIAL_RETRY_DELAY", 1.0),
            backoff_multiplier: env_or("API_RETRY_BACKOFF_MULTIPLIER", 2.0),
        }
    }
}

/// Forecast-selection constants (C5).
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub target_hours: Vec<u32>,
    pub date_boundary_hour: u32,
    pub trend_analysis_min_forecasts: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_hours: vec![9, 12, 15, 18],
            date_boundary_hour: env_or("DATE_BOUNDARY_HOUR", 6),
            trend_analysis_min_forecasts: env_or("TREND_ANALYSIS_MIN_FORECASTS", 2),
        }
    }
}

/// Candidate ranking/capping and retry bounds for the LLM pair selector (C8).
#[derive(Debug, Clone)]
pub struct PairSelectorConfig {
    pub pre_rank_cap: usize,
    pub post_rank_cap: usize,
    pub max_alternative_attempts: usize,
    pub regeneration_min_top: usize,
}

impl Default for PairSelectorConfig {
    fn default() -> Self {
        Self {
            pre_rank_cap: env_or("SELECTOR_PRE_RANK_CAP", 100),
            post_rank_cap: env_or("SELECTOR_POST_RANK_CAP", 50),
            max_alternative_attempts: env_or("SELECTOR_MAX_ALTERNATIVE_ATTEMPTS", 10),
            regeneration_min_top: env_or("SELECTOR_REGENERATION_MIN_TOP", 3),
        }
    }
}

/// Timeout/retry/fallback policy shared by every LLM provider (A1), applied uniformly by
/// `LlmManager` regardless of which backend is selected.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub fallback_text: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: env_or("LLM_TIMEOUT_SECS", 30),
            max_retries: env_or("LLM_MAX_RETRIES", 3),
            retry_delay_secs: env_or("LLM_RETRY_DELAY_SECS", 2.0),
            fallback_text: std::env::var("LLM_FALLBACK_TEXT").unwrap_or_else(|_| "本日の天気情報です".to_string()),
        }
    }
}

/// Maps a provider name to the environment variable holding its API key, mirroring the
/// corpus's `PROVIDER_CONFIGS` dispatch table.
pub fn api_key_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        _ => None,
    }
}

pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "gemini" => "gemini-1.5-flash",
        "anthropic" => "claude-3-5-haiku-20241022",
        _ => "gpt-4o-mini",
    }
}

/// Temperature/humidity/precipitation/wind thresholds used by the validation engine (C7).
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub heatstroke_warning_temp: f64,
    pub heatstroke_severe_temp: f64,
    pub cold_warning_temp: f64,
    pub humidity_dry_threshold: f64,
    pub humidity_humid_threshold: f64,
    pub pollen_wind_threshold: f64,
    pub pollen_humidity_threshold: f64,
    pub coastal_threshold_km: f64,
    pub umbrella_precipitation_threshold: f64,
    pub night_hot_threshold: f64,
    pub day_cold_threshold: f64,
    pub continuous_rain_threshold_hours: usize,
    pub duplication_similarity_threshold: f64,
    pub max_retry_count: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            heatstroke_warning_temp: env_or("HEATSTROKE_WARNING_TEMP", 34.0),
            heatstroke_severe_temp: env_or("HEATSTROKE_SEVERE_TEMP", 37.0),
            cold_warning_temp: env_or("COLD_WARNING_TEMP", 5.0),
            humidity_dry_threshold: env_or("HUMIDITY_DRY_THRESHOLD", 80.0),
            humidity_humid_threshold: env_or("HUMIDITY_HUMID_THRESHOLD", 30.0),
            pollen_wind_threshold: env_or("POLLEN_WIND_THRESHOLD", 15.0),
            pollen_humidity_threshold: env_or("POLLEN_HUMIDITY_THRESHOLD", 85.0),
            coastal_threshold_km: env_or("COASTAL_THRESHOLD_KM", 15.0),
            umbrella_precipitation_threshold: env_or("UMBRELLA_PRECIPITATION_THRESHOLD", 0.1),
            night_hot_threshold: env_or("NIGHT_HOT_THRESHOLD", 25.0),
            day_cold_threshold: env_or("DAY_COLD_THRESHOLD", 10.0),
            continuous_rain_threshold_hours: env_or("CONTINUOUS_RAIN_THRESHOLD_HOURS", 4),
            duplication_similarity_threshold: env_or("DUPLICATION_SIMILARITY_THRESHOLD", 0.7),
            max_retry_count: env_or("MAX_EVALUATION_RETRIES", 3),
        }
    }
}

/// Word lexicons loaded from `config/validator_words.yaml` / `config/weather_forbidden_words.yaml`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LexiconConfig {
    #[serde(default = "default_tone_words")]
    pub tone_words: ToneWords,
    #[serde(default = "default_weather_forbidden")]
    pub weather_forbidden_words: HashMap<String, Vec<String>>,
    #[serde(default = "default_temperature_forbidden")]
    pub temperature_forbidden_words: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ToneWords {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub urgency: Vec<String>,
    #[serde(default)]
    pub casual: Vec<String>,
    #[serde(default)]
    pub encouraging: Vec<String>,
}

fn default_tone_words() -> ToneWords {
    ToneWords {
        positive: vec!["爽やか", "穏やか", "快適", "心地よい"]
            .into_iter()
            .map(String::from)
            .collect(),
        negative: vec!["厳しい", "危険", "注意", "警戒"]
            .into_iter()
            .map(String::from)
            .collect(),
        urgency: vec!["厳重注意", "危険", "警戒", "命に関わる"]
            .into_iter()
            .map(String::from)
            .collect(),
        casual: vec!["のんびり", "ゆったり", "まったり"]
            .into_iter()
            .map(String::from)
            .collect(),
        encouraging: vec!["頑張って", "気をつけて", "備えて"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

fn default_weather_forbidden() -> HashMap<String, Vec<String>> {
    let mut m = HashMap::new();
    m.insert(
        "sunny".to_string(),
        vec!["雨", "にわか雨", "変わりやすい空"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    m.insert(
        "rain".to_string(),
        vec!["青空", "快晴", "穏やか", "お出かけ日和", "カラッと"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    m.insert(
        "cloudy".to_string(),
        vec!["強い日差し", "ギラギラ"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    m.insert(
        "heavy_rain".to_string(),
        vec!["穏やか", "過ごしやすい"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    m
}

fn default_temperature_forbidden() -> HashMap<String, Vec<String>> {
    let mut m = HashMap::new();
    m.insert(
        "very_hot".to_string(),
        vec!["涼しい", "肌寒い"].into_iter().map(String::from).collect(),
    );
    m.insert(
        "hot".to_string(),
        vec!["凍える", "防寒"].into_iter().map(String::from).collect(),
    );
    m.insert(
        "cold".to_string(),
        vec!["熱中症", "猛暑"].into_iter().map(String::from).collect(),
    );
    m.insert(
        "very_cold".to_string(),
        vec!["熱中症", "汗ばむ"].into_iter().map(String::from).collect(),
    );
    m
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            tone_words: default_tone_words(),
            weather_forbidden_words: default_weather_forbidden(),
            temperature_forbidden_words: default_temperature_forbidden(),
        }
    }
}

impl LexiconConfig {
    /// Loads from `{config_dir}/validator_words.yaml`, falling back to defaults if the
    /// file is missing or malformed. A missing config file is a warning, not an error.
    pub fn load(config_dir: &str) -> Self {
        let path = Path::new(config_dir).join("validator_words.yaml");
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse {}: {err}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                tracing::warn!("{} not found, using default lexicons", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_from_env_has_sane_defaults() {
        unsafe {
            std::env::remove_var("LLM_PROVIDER");
            std::env::remove_var("CORPUS_DIR");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.llm_provider, "openai");
        assert!(cfg.corpus_dir.contains("corpus"));
    }

    #[test]
    fn cache_config_respects_env_override() {
        unsafe {
            std::env::set_var("CACHE_L1_MAX_SIZE", "42");
        }
        let cfg = CacheConfig::default();
        assert_eq!(cfg.l1_max_size, 42);
        unsafe {
            std::env::remove_var("CACHE_L1_MAX_SIZE");
        }
    }

    #[test]
    fn validation_config_defaults_match_spec() {
        unsafe {
            std::env::remove_var("HEATSTROKE_WARNING_TEMP");
        }
        let cfg = ValidationConfig::default();
        assert_eq!(cfg.heatstroke_warning_temp, 34.0);
        assert_eq!(cfg.continuous_rain_threshold_hours, 4);
    }

    #[test]
    fn lexicon_config_falls_back_when_file_missing() {
        let cfg = LexiconConfig::load("/nonexistent/path/xyz");
        assert!(!cfg.tone_words.positive.is_empty());
    }
}
