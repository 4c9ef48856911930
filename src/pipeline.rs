//! Pipeline orchestrator (C10): the stage state machine that drives one request from
//! raw inputs to a final comment pair. Grounded on
//! `nodes/{comment_generation_node,unified_comment_generation}.py`'s staged state-machine
//! shape; the naming here (`GenerationState`, stage order) mirrors that module directly.

use crate::cache::ForecastCache;
use crate::config::{LexiconConfig, PairSelectorConfig, SelectionConfig, ValidationConfig};
use crate::domain::{CommentPair, CommentType, Forecast, ForecastCollection, LocationCoordinate, ValidationResult};
use crate::errors::AppError;
use crate::forecast_selection;
use crate::llm::LlmManager;
use crate::pair_selector::{self, SelectionInput};
use crate::repository::CommentRepository;
use crate::safety_rewriter;
use crate::validation::{self, PairContext};
use crate::weather_client::WeatherClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const FALLBACK_FINAL_COMMENT: &str = "本日の天気情報です\u{3000}体調管理にお気をつけください";

/// Mutable record threaded through every stage for the duration of one request. Created
/// per request, discarded after output assembly.
#[derive(Debug)]
pub struct GenerationState {
    // Inputs
    pub location_name: String,
    pub location_coordinate: Option<LocationCoordinate>,
    pub target_datetime: DateTime<Utc>,
    pub llm_provider: String,
    pub exclude_previous: bool,

    // Intermediates
    pub forecast_collection: Option<ForecastCollection>,
    pub period_forecasts: Vec<Forecast>,
    pub weather_data: Option<Forecast>,
    pub weather_candidates: Vec<crate::domain::PastComment>,
    pub advice_candidates: Vec<crate::domain::PastComment>,
    pub selected_pair: Option<CommentPair>,

    // Control
    pub retry_count: u32,
    pub max_retry_count: u32,
    pub validation_result: Option<ValidationResult>,
    pub excluded_pairs: Vec<(String, String)>,

    // Outputs
    pub success: bool,
    pub final_comment: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,

    // Diagnostics
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GenerationState {
    pub fn new(
        location_name: impl Into<String>,
        location_coordinate: Option<LocationCoordinate>,
        target_datetime: DateTime<Utc>,
        llm_provider: impl Into<String>,
        max_retry_count: u32,
    ) -> Self {
        Self {
            location_name: location_name.into(),
            location_coordinate,
            target_datetime,
            llm_provider: llm_provider.into(),
            exclude_previous: false,
            forecast_collection: None,
            period_forecasts: Vec::new(),
            weather_data: None,
            weather_candidates: Vec::new(),
            advice_candidates: Vec::new(),
            selected_pair: None,
            retry_count: 0,
            max_retry_count,
            validation_result: None,
            excluded_pairs: Vec::new(),
            success: false,
            final_comment: None,
            metadata: HashMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn record_fatal(&mut self, stage: &str, err: &AppError) {
        self.errors.push(format!("[{stage}] {err}"));
        self.success = false;
    }

    fn record_warning(&mut self, stage: &str, message: impl Into<String>) {
        self.warnings.push(format!("[{stage}] {}", message.into()));
    }
}

/// Everything the orchestrator needs from the rest of the crate, borrowed for one request.
pub struct PipelineDeps<'a> {
    pub weather_client: &'a WeatherClient,
    pub forecast_cache: &'a ForecastCache,
    pub comment_repository: &'a CommentRepository,
    pub llm: &'a LlmManager,
    pub selection_config: &'a SelectionConfig,
    pub validation_config: &'a ValidationConfig,
    pub lexicon: &'a LexiconConfig,
    pub pair_selector_config: &'a PairSelectorConfig,
    pub continuous_rain_threshold_hours: usize,
}

/// Runs the full staged pipeline for one request. Always returns a state with
/// `success` and `final_comment` set, even on fatal failure (the fallback text).
pub async fn run(mut state: GenerationState, deps: &PipelineDeps<'_>) -> GenerationState {
    if let Err(e) = input_validation(&state) {
        state.record_fatal("input_validation", &e);
        state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
        return state;
    }

    if let Err(e) = fetch_forecast(&mut state, deps).await {
        state.record_fatal("fetch_forecast", &e);
        state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
        return state;
    }

    if let Err(e) = select_hour(&mut state, deps) {
        state.record_fatal("select_hour", &e);
        state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
        return state;
    }

    if let Err(e) = retrieve_comments(&mut state, deps) {
        state.record_fatal("retrieve_comments", &e);
        state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
        return state;
    }

    loop {
        match select_pair_stage(&mut state, deps).await {
            Ok(()) => {}
            Err(e) => {
                state.record_fatal("select_pair", &e);
                state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
                return state;
            }
        }

        let result = evaluate_candidate(&state, deps);
        state.validation_result = Some(result.clone());

        if result.is_valid {
            break;
        }

        let pair = state.selected_pair.take().expect("select_pair_stage always sets selected_pair on success");
        state.excluded_pairs.push((pair.weather_comment.comment_text.clone(), pair.advice_comment.comment_text.clone()));
        state.record_warning(
            "evaluate_candidate",
            format!("rejected by rule '{}': {}", result.violating_rule.as_deref().unwrap_or("?"), result.reason),
        );

        if state.retry_count >= state.max_retry_count {
            state.errors.push(format!(
                "[evaluate_candidate] exhausted {} retries, no candidate survived validation",
                state.max_retry_count
            ));
            state.success = false;
            state.final_comment = Some(FALLBACK_FINAL_COMMENT.to_string());
            return state;
        }
        state.retry_count += 1;
    }

    assemble_output(&mut state, deps);
    state
}

fn input_validation(state: &GenerationState) -> Result<(), AppError> {
    if state.location_name.trim().is_empty() {
        return Err(AppError::Location("location name is empty".to_string()));
    }
    if state.location_coordinate.is_none() {
        return Err(AppError::Location(format!("no coordinates registered for '{}'", state.location_name)));
    }
    Ok(())
}

async fn fetch_forecast(state: &mut GenerationState, deps: &PipelineDeps<'_>) -> Result<(), AppError> {
    let coord = state.location_coordinate.as_ref().expect("checked by input_validation");
    let collection = deps
        .weather_client
        .fetch_and_cache(&state.location_name, coord.latitude, coord.longitude, deps.forecast_cache)
        .await?;
    state.forecast_collection = Some(collection);
    Ok(())
}

fn select_hour(state: &mut GenerationState, deps: &PipelineDeps<'_>) -> Result<(), AppError> {
    let collection = state.forecast_collection.as_ref().expect("fetch_forecast always populates this");
    let target = forecast_selection::target_date(state.target_datetime, deps.selection_config);
    let picks = forecast_selection::extract_target_hour_forecasts(collection, target, deps.selection_config);
    if picks.is_empty() {
        return Err(AppError::DataValidation("no forecasts matched any target hour".to_string()));
    }
    state.period_forecasts = picks.iter().map(|f| (*f).clone()).collect();

    let refs: Vec<&Forecast> = state.period_forecasts.iter().collect();
    let chosen = forecast_selection::select_priority_forecast(&refs).cloned();
    state.weather_data = chosen;
    if state.weather_data.is_none() {
        return Err(AppError::DataValidation("priority selection produced no forecast".to_string()));
    }
    Ok(())
}

fn retrieve_comments(state: &mut GenerationState, deps: &PipelineDeps<'_>) -> Result<(), AppError> {
    let weather = deps.comment_repository.get_all_available_comments(CommentType::WeatherComment, deps.pair_selector_config.pre_rank_cap);
    let advice = deps.comment_repository.get_all_available_comments(CommentType::Advice, deps.pair_selector_config.pre_rank_cap);
    if weather.is_empty() || advice.is_empty() {
        return Err(AppError::Corpus(format!("empty corpus for {}", state.location_name)));
    }
    state.weather_candidates = weather;
    state.advice_candidates = advice;
    Ok(())
}

async fn select_pair_stage(state: &mut GenerationState, deps: &PipelineDeps<'_>) -> Result<(), AppError> {
    let weather = state.weather_data.as_ref().expect("select_hour always populates this");
    let input = SelectionInput {
        weather_candidates: &state.weather_candidates,
        advice_candidates: &state.advice_candidates,
        weather,
        location_name: &state.location_name,
        target_datetime: state.target_datetime,
        period_forecasts: &state.period_forecasts,
        exclude_previous: state.exclude_previous,
        excluded_pairs: &state.excluded_pairs,
    };

    match pair_selector::select_pair(deps.llm, &input, deps.pair_selector_config).await {
        Some(pair) => {
            state.selected_pair = Some(pair);
            Ok(())
        }
        None => Err(AppError::Selection(format!("no candidate pair found for {}", state.location_name))),
    }
}

fn evaluate_candidate(state: &GenerationState, deps: &PipelineDeps<'_>) -> ValidationResult {
    let pair = state.selected_pair.as_ref().expect("select_pair_stage always sets selected_pair on success");
    let weather = state.weather_data.as_ref().expect("select_hour always populates this");
    let hourly: Vec<&Forecast> = state.period_forecasts.iter().collect();

    let ctx = PairContext {
        weather_comment: &pair.weather_comment,
        advice_comment: &pair.advice_comment,
        weather,
        hourly: &hourly,
        hour_jst: crate::jst::jst_hour(state.target_datetime),
        month: forecast_selection::month_of(state.target_datetime),
        config: deps.validation_config,
        lexicon: deps.lexicon,
        location_coordinate: state.location_coordinate.as_ref(),
    };
    validation::validate_pair(&ctx)
}

fn assemble_output(state: &mut GenerationState, deps: &PipelineDeps<'_>) {
    let weather = state.weather_data.clone().expect("select_hour always populates this");
    let pair = state.selected_pair.take().expect("loop only exits with a valid selected_pair");
    let hourly: Vec<&Forecast> = state.period_forecasts.iter().collect();
    let month = forecast_selection::month_of(state.target_datetime);

    let (rewritten, warnings) = safety_rewriter::rewrite(
        pair,
        &weather,
        &hourly,
        month,
        &state.weather_candidates,
        &state.advice_candidates,
        deps.continuous_rain_threshold_hours,
    );
    for w in &warnings {
        state.warnings.push(format!("[{}] {}", "safety_rewrite", w.clone()));
    }

    let final_comment = format!("{}\u{3000}{}", rewritten.weather_comment.comment_text, rewritten.advice_comment.comment_text);

    let diffs = forecast_selection::compute_temperature_differences(&weather, &hourly, deps.forecast_cache);
    state.metadata.insert("target_hour".to_string(), serde_json::json!(crate::jst::jst_hour(state.target_datetime)));
    state.metadata.insert("weather_code".to_string(), serde_json::json!(weather.weather_code));
    state.metadata.insert("temperature".to_string(), serde_json::json!(weather.temperature));
    state.metadata.insert("precipitation".to_string(), serde_json::json!(weather.precipitation));
    state.metadata.insert("humidity".to_string(), serde_json::json!(weather.humidity));
    state.metadata.insert("llm_provider".to_string(), serde_json::json!(state.llm_provider));
    state.metadata.insert("retry_count".to_string(), serde_json::json!(state.retry_count));
    state.metadata.insert("weather_comment_text".to_string(), serde_json::json!(rewritten.weather_comment.comment_text));
    state.metadata.insert("advice_comment_text".to_string(), serde_json::json!(rewritten.advice_comment.comment_text));
    state.metadata.insert("temperature_differences".to_string(), serde_json::json!(diffs));

    state.selected_pair = Some(rewritten);
    state.final_comment = Some(final_comment);
    state.success = true;
}
