//! Safety rewriter (C9): the last-chance fixup pass that runs after pair selection and
//! before output assembly. Infallible by construction — every rewrite rule either swaps
//! in a safer alternative from the candidate pool or leaves the original text in place
//! and records a warning. Grounded on `nodes/helpers/comment_safety.py`.

use crate::domain::{CommentPair, Forecast, PastComment, WeatherCondition};

const CHANGEABLE_SKY_PATTERNS: &[&str] = &["変わりやすい空", "変わりやすい天気", "不安定"];
const RAIN_CALM_PATTERNS: &[&str] = &["穏やか", "快適", "お出かけ日和", "晴れ間"];
const HEATSTROKE_PATTERN: &str = "熱中症";
const MUGGY_PATTERN: &str = "ムシムシ";
const CLOUDY_STRONG_SUN_PATTERNS: &[&str] = &["強い日差し", "ギラギラ"];
const RAIN_ADVICE_WORDS: &[&str] = &["傘", "雨具", "レインコート"];

fn contains_any(text: &str, patterns: &[&'static str]) -> Option<&'static str> {
    patterns.iter().copied().find(|p| text.contains(p))
}

fn find_alternative<'a>(pool: &'a [PastComment], avoid: &[&str]) -> Option<&'a PastComment> {
    pool.iter().find(|c| !avoid.iter().any(|p| c.comment_text.contains(p)))
}

fn find_with_any_word<'a>(pool: &'a [PastComment], words: &[&str]) -> Option<&'a PastComment> {
    pool.iter().find(|c| words.iter().any(|w| c.comment_text.contains(w)))
}

fn continuous_rain(hourly: &[&Forecast], threshold_hours: usize) -> bool {
    if hourly.len() < threshold_hours {
        return false;
    }
    hourly
        .iter()
        .rev()
        .take(threshold_hours)
        .all(|f| f.precipitation >= 0.1 || f.weather_condition.is_rainy())
}

fn seasonal_replacement(text: &str, month: u32) -> String {
    if (6..=8).contains(&month) && text.contains("残暑") {
        text.replace("残暑", "暑さ")
    } else {
        text.to_string()
    }
}

/// Rewrites `pair` in place against `weather`/`hourly`/`month`, drawing replacements from
/// `weather_pool`/`advice_pool` when a rule fires. Never fails: unmatched rules leave the
/// original text and push a warning instead.
pub fn rewrite(
    pair: CommentPair,
    weather: &Forecast,
    hourly: &[&Forecast],
    month: u32,
    weather_pool: &[PastComment],
    advice_pool: &[PastComment],
    continuous_rain_threshold_hours: usize,
) -> (CommentPair, Vec<String>) {
    let mut weather_comment = pair.weather_comment;
    let mut advice_comment = pair.advice_comment;
    let mut warnings = Vec::new();

    let is_sunny = matches!(weather.weather_condition, WeatherCondition::Clear | WeatherCondition::PartlyCloudy)
        && weather.precipitation <= 0.0;
    if is_sunny {
        if let Some(pattern) = contains_any(&weather_comment.comment_text, CHANGEABLE_SKY_PATTERNS) {
            match find_alternative(weather_pool, CHANGEABLE_SKY_PATTERNS) {
                Some(alt) => weather_comment = alt.clone(),
                None => warnings.push(format!("'{pattern}' unsuitable for stable sunny weather, no alternative found")),
            }
        }
    }

    let is_raining = weather.weather_condition.is_rainy() || weather.precipitation > 0.0;
    if is_raining {
        if weather_comment.comment_text.contains(MUGGY_PATTERN) {
            match find_alternative(weather_pool, &[MUGGY_PATTERN]) {
                Some(alt) => weather_comment = alt.clone(),
                None => warnings.push(format!("'{MUGGY_PATTERN}' unsuitable for rain, no alternative found")),
            }
        } else if advice_comment.comment_text.contains(HEATSTROKE_PATTERN) {
            match find_alternative(advice_pool, &[HEATSTROKE_PATTERN]) {
                Some(alt) => advice_comment = alt.clone(),
                None => warnings.push(format!("'{HEATSTROKE_PATTERN}' unsuitable while raining, no alternative found")),
            }
        } else if let Some(pattern) = contains_any(&weather_comment.comment_text, RAIN_CALM_PATTERNS) {
            match find_alternative(weather_pool, RAIN_CALM_PATTERNS) {
                Some(alt) => weather_comment = alt.clone(),
                None => warnings.push(format!("'{pattern}' unsuitable for rain, no alternative found")),
            }
        }
    }

    let is_cloudy = matches!(weather.weather_condition, WeatherCondition::Cloudy);
    if is_cloudy {
        if let Some(pattern) = contains_any(&weather_comment.comment_text, CLOUDY_STRONG_SUN_PATTERNS) {
            match find_alternative(weather_pool, CLOUDY_STRONG_SUN_PATTERNS) {
                Some(alt) => weather_comment = alt.clone(),
                None => warnings.push(format!("'{pattern}' unsuitable for cloudy skies, no alternative found")),
            }
        }
    }

    if continuous_rain(hourly, continuous_rain_threshold_hours) {
        let brief_rain_words = ["にわか雨", "一時的な雨", "急な雨"];
        if let Some(pattern) = contains_any(&weather_comment.comment_text, &brief_rain_words) {
            match find_alternative(weather_pool, &brief_rain_words) {
                Some(alt) => weather_comment = alt.clone(),
                None => warnings.push(format!("'{pattern}' understates continuous rain, no alternative found")),
            }
        }
    }

    let replaced = seasonal_replacement(&weather_comment.comment_text, month);
    if replaced != weather_comment.comment_text {
        weather_comment.comment_text = replaced;
    }

    if advice_comment.comment_text.contains(HEATSTROKE_PATTERN) && weather.temperature < 30.0 && is_raining {
        match find_with_any_word(advice_pool, RAIN_ADVICE_WORDS) {
            Some(alt) => advice_comment = alt.clone(),
            None => warnings.push("heatstroke wording under cool rain, no rain-appropriate advice found".to_string()),
        }
    }

    (
        CommentPair {
            weather_comment,
            advice_comment,
            similarity_score: pair.similarity_score,
            selection_reason: pair.selection_reason,
        },
        warnings,
    )
}
