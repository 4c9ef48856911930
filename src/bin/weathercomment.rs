//! CLI entrypoint (A2): runs the generation pipeline once per `--location` argument and
//! prints one JSON line per result to stdout. Grounded on the corpus's `main.py`
//! CLI wrapper around the orchestration graph; argument parsing follows `clap`'s derive
//! style already used elsewhere in the corpus for small tools.

use clap::Parser;
use std::path::Path;
use weather_comment_gen::cache::ForecastCache;
use weather_comment_gen::config::{
    AppConfig, ApiRetryConfig, CacheConfig, LexiconConfig, LlmConfig, PairSelectorConfig,
    SelectionConfig, ValidationConfig,
};
use weather_comment_gen::domain::LocationCoordinate;
use weather_comment_gen::errors::AppError;
use weather_comment_gen::llm::LlmManager;
use weather_comment_gen::location_registry::LocationRegistry;
use weather_comment_gen::pipeline::{self, GenerationState, PipelineDeps};
use weather_comment_gen::repository::CommentRepository;
use weather_comment_gen::weather_client::WeatherClient;

/// Generates weather commentary for one or more locations.
#[derive(Debug, Parser)]
#[command(name = "weathercomment", version, about)]
struct Cli {
    /// Location to generate for. Either a name present in the locations registry, or
    /// `name,latitude,longitude` to supply coordinates directly.
    #[arg(long = "location", required = true)]
    locations: Vec<String>,

    /// Target date and time in RFC 3339 (e.g. `2026-08-02T09:00:00+09:00`). Defaults to now.
    #[arg(long = "datetime")]
    datetime: Option<String>,

    /// LLM provider to use: openai, gemini, or anthropic. Defaults to `LLM_PROVIDER`.
    #[arg(long = "llm-provider")]
    llm_provider: Option<String>,

    /// Exclude comments used in a prior generation for the same location/time.
    #[arg(long = "exclude-previous")]
    exclude_previous: bool,
}

fn parse_location_arg(raw: &str, registry: &LocationRegistry) -> Result<(String, Option<LocationCoordinate>), AppError> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [name] => {
            let coordinate = registry.resolve(name);
            Ok((name.to_string(), coordinate))
        }
        [name, lat, lon] => {
            let latitude: f64 = lat
                .parse()
                .map_err(|_| AppError::Location(format!("invalid latitude '{lat}' for '{name}'")))?;
            let longitude: f64 = lon
                .parse()
                .map_err(|_| AppError::Location(format!("invalid longitude '{lon}' for '{name}'")))?;
            Ok((name.to_string(), Some(LocationCoordinate { name: name.to_string(), latitude, longitude })))
        }
        _ => Err(AppError::Location(format!("malformed --location value '{raw}', expected NAME or NAME,LAT,LON"))),
    }
}

fn parse_target_datetime(raw: &Option<String>) -> chrono::DateTime<chrono::Utc> {
    match raw {
        Some(s) => match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt.with_timezone(&chrono::Utc),
            Err(e) => {
                tracing::warn!("failed to parse --datetime '{s}': {e}, using current time");
                chrono::Utc::now()
            }
        },
        None => chrono::Utc::now(),
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::from_env();
    let llm_provider = cli.llm_provider.unwrap_or_else(|| app_config.llm_provider.clone());
    let target_datetime = parse_target_datetime(&cli.datetime);

    let location_registry = LocationRegistry::load(Path::new(&app_config.locations_file));

    let retry_config = ApiRetryConfig::default();
    let cache_config = CacheConfig::default();
    let selection_config = SelectionConfig::default();
    let validation_config = ValidationConfig::default();
    let lexicon = LexiconConfig::load(&app_config.config_dir);
    let pair_selector_config = PairSelectorConfig::default();
    let llm_config = LlmConfig::default();

    let weather_client = WeatherClient::new(retry_config);
    let forecast_cache = ForecastCache::new(&cache_config, &app_config.cache_dir);
    let comment_repository = CommentRepository::new(&app_config.corpus_dir, &app_config.cache_dir);

    let llm = match LlmManager::from_provider_name(&llm_provider, llm_config) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("failed to initialize LLM provider '{llm_provider}': {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let deps = PipelineDeps {
        weather_client: &weather_client,
        forecast_cache: &forecast_cache,
        comment_repository: &comment_repository,
        llm: &llm,
        selection_config: &selection_config,
        validation_config: &validation_config,
        lexicon: &lexicon,
        pair_selector_config: &pair_selector_config,
        continuous_rain_threshold_hours: validation_config.continuous_rain_threshold_hours,
    };

    let mut exit_code = std::process::ExitCode::SUCCESS;

    for raw_location in &cli.locations {
        let (name, coordinate) = match parse_location_arg(raw_location, &location_registry) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                exit_code = std::process::ExitCode::FAILURE;
                continue;
            }
        };

        let mut state = GenerationState::new(name, coordinate, target_datetime, llm_provider.clone(), validation_config.max_retry_count);
        state.exclude_previous = cli.exclude_previous;

        let result = pipeline::run(state, &deps).await;
        if !result.success {
            exit_code = std::process::ExitCode::FAILURE;
        }

        let output = serde_json::json!({
            "location": result.location_name,
            "success": result.success,
            "final_comment": result.final_comment,
            "metadata": result.metadata,
            "warnings": result.warnings,
            "errors": result.errors,
        });
        println!("{}", serde_json::to_string(&output).expect("metadata is always JSON-serializable"));
    }

    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location_arg_accepts_inline_coordinates() {
        let registry = LocationRegistry::default();
        let (name, coord) = parse_location_arg("東京,35.68,139.76", &registry).unwrap();
        assert_eq!(name, "東京");
        assert_eq!(coord.unwrap().latitude, 35.68);
    }

    #[test]
    fn parse_location_arg_rejects_bad_latitude() {
        let registry = LocationRegistry::default();
        assert!(parse_location_arg("東京,not-a-number,139.76", &registry).is_err());
    }

    #[test]
    fn parse_location_arg_falls_back_to_registry_for_bare_name() {
        let registry = LocationRegistry::default();
        let (name, coord) = parse_location_arg("未登録の地点", &registry).unwrap();
        assert_eq!(name, "未登録の地点");
        assert!(coord.is_none());
    }

    #[test]
    fn parse_target_datetime_defaults_to_now_on_missing_input() {
        let before = chrono::Utc::now();
        let parsed = parse_target_datetime(&None);
        assert!(parsed >= before);
    }
}
