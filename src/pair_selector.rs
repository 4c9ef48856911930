//! Pair selector (C8): LLM-driven selection of one weather comment and one advice
//! comment from ranked candidate pools, with local contradiction screening, an
//! alternative-selection retry loop, and a keyword-only rain fallback. Grounded on
//! `nodes/comment_selector/llm_selector.py`.

use crate::config::PairSelectorConfig;
use crate::domain::{CommentPair, Forecast, PastComment};
use crate::llm::LlmManager;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

const RAIN_FORBIDDEN_WORDS: &[&str] = &[
    "穏やか", "のどか", "快適", "過ごしやすい", "心地良い", "晴れ", "青空", "日差し", "太陽", "陽射し",
    "お出かけ日和", "散歩日和", "ピクニック", "カラッと", "さっぱり", "爽やか",
];

const CONTRADICTION_PAIRS: &[(&str, &str)] = &[
    ("過ごしやすい", "蒸し暑い"),
    ("涼しい", "暑い"),
    ("爽やか", "じめじめ"),
    ("快適", "厳しい"),
    ("穏やか", "荒れ"),
    ("カラッと", "湿っぽい"),
    ("ひんやり", "汗ばむ"),
];

const SEVERE_MATCH_WORDS: &[&str] = &["雷", "暴風", "警戒", "危険", "大雨", "猛暑", "熱中症", "強風", "大雪"];

const RAIN_FALLBACK_WORDS: &[&str] = &["傘", "雨具", "レインコート", "濡れ"];

/// Everything the selector needs for one request; owns no state across calls.
pub struct SelectionInput<'a> {
    pub weather_candidates: &'a [PastComment],
    pub advice_candidates: &'a [PastComment],
    pub weather: &'a Forecast,
    pub location_name: &'a str,
    pub target_datetime: DateTime<Utc>,
    pub period_forecasts: &'a [Forecast],
    pub exclude_previous: bool,
    /// Weather/advice comment text pairs already tried and rejected this request.
    pub excluded_pairs: &'a [(String, String)],
}

fn rank_tier(candidate: &PastComment, weather: &Forecast) -> u8 {
    let severe = weather.is_severe_weather();
    if severe && SEVERE_MATCH_WORDS.iter().any(|w| candidate.comment_text.contains(w)) {
        return 0;
    }
    if !weather.weather_description.is_empty()
        && candidate
            .weather_condition_text
            .as_str()
            .chars()
            .next()
            .is_some()
        && weather.weather_description.contains(candidate.weather_condition_text.as_str())
    {
        return 1;
    }
    2
}

fn rank_and_cap<'a>(candidates: &'a [PastComment], weather: &Forecast, cfg: &PairSelectorConfig) -> Vec<&'a PastComment> {
    let pre: Vec<&PastComment> = candidates.iter().take(cfg.pre_rank_cap).collect();
    let mut ranked = pre;
    ranked.sort_by_key(|c| rank_tier(c, weather));
    ranked.truncate(cfg.post_rank_cap);
    ranked
}

fn season_of(month: u32) -> &'static str {
    match month {
        3..=5 => "spring",
        6..=8 => "summer",
        9..=11 => "autumn",
        _ => "winter",
    }
}

fn format_candidates(candidates: &[&PastComment]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{i}: {}", c.comment_text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_weather_context(input: &SelectionInput) -> String {
    let w = input.weather;
    let month = crate::forecast_selection::month_of(input.target_datetime);
    let mut context = format!(
        "現在の天気情報:\n- 場所: {}\n- 天気: {}\n- 気温: {}°C\n- 湿度: {}%\n- 降水量: {}mm\n- 風速: {}m/s\n",
        input.location_name, w.weather_description, w.temperature, w.humidity, w.precipitation, w.wind_speed
    );

    match season_of(month) {
        "summer" if w.temperature >= 35.0 => context.push_str("- 猛暑日（35℃以上）です：熱中症に厳重注意\n"),
        "summer" if w.temperature >= 30.0 => context.push_str("- 真夏日（30℃以上）です：暑さ対策を推奨\n"),
        "winter" if w.temperature <= 0.0 => context.push_str("- 氷点下です：凍結や防寒対策必須\n"),
        _ => {}
    }

    let rain_times: Vec<String> = input
        .period_forecasts
        .iter()
        .filter(|f| f.precipitation > 0.0)
        .map(|f| format!("{}時({}mm)", f.datetime.format("%H"), f.precipitation))
        .collect();
    let max_precip = input
        .period_forecasts
        .iter()
        .map(|f| f.precipitation)
        .fold(w.precipitation, f64::max);

    if !rain_times.is_empty() {
        context.push_str(&format!("\n【降水予報】翌日の降水時間帯: {}\n", rain_times.join(", ")));
        context.push_str("\n【厳重注意】雨が降る予報です。晴天表現や外出推奨表現は選ばないでください。\n");
    }
    if max_precip > 10.0 {
        context.push_str("【最重要】雨に関するコメントを最優先で選択してください\n");
    } else if max_precip > 0.0 {
        context.push_str("【重要】雨に関するコメントを優先的に選択してください\n");
    }

    context
}

fn create_prompt(candidates_text: &str, weather_context: &str) -> String {
    format!(
        "以下の天気情報を踏まえ、最も適したコメントを選択してください。\n\n{weather_context}\n候補一覧:\n{candidates_text}\n\n\
選択基準:\n1. 降水がある場合は雨関連、猛暑の場合は熱中症対策を最優先\n2. 気温・天気と矛盾しない表現\n3. 季節感が適切\n\n\
【重要】選択した候補の番号のみを回答してください。数字のみを返してください。\n例: 2\n"
    )
}

/// Parses an index out of an LLM response using the same fallback ladder as the source:
/// exact integer, leading integer, labelled number, then the first in-range number found.
fn extract_selected_index(response: &str, max_index: usize) -> Option<usize> {
    let trimmed = response.trim();

    if let Ok(n) = trimmed.parse::<i64>() {
        if n >= 0 && (n as usize) < max_index {
            return Some(n as usize);
        }
    }

    let leading: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !leading.is_empty() {
        if let Ok(n) = leading.parse::<usize>() {
            if n < max_index {
                return Some(n);
            }
        }
    }

    for marker in ["答え", "選択", "回答", "結果", "インデックス"] {
        if let Some(pos) = trimmed.find(marker) {
            let rest = &trimmed[pos + marker.len()..];
            let digits: String = rest.chars().skip_while(|c| !c.is_ascii_digit()).take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(n) = digits.parse::<usize>() {
                if n < max_index {
                    return Some(n);
                }
            }
        }
    }

    let mut number = String::new();
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
        } else if !number.is_empty() {
            if let Ok(n) = number.parse::<usize>() {
                if n < max_index {
                    return Some(n);
                }
            }
            number.clear();
        }
    }
    if !number.is_empty() {
        if let Ok(n) = number.parse::<usize>() {
            if n < max_index {
                return Some(n);
            }
        }
    }

    None
}

/// Cheap local contradiction pre-screen; `Some(false)` short-circuits before any LLM call.
fn local_contradiction_check(text: &str, weather: &Forecast) -> bool {
    let raining = weather.precipitation > 0.0 || weather.weather_description.contains('雨');
    if raining && RAIN_FORBIDDEN_WORDS.iter().any(|w| text.contains(w)) {
        return false;
    }
    for (a, b) in CONTRADICTION_PAIRS {
        if text.contains(a) && text.contains(b) {
            return false;
        }
    }
    true
}

async fn llm_contradiction_check(llm: &LlmManager, text: &str, weather: &Forecast) -> bool {
    let prompt = format!(
        "以下のコメントが天気条件（天気: {}, 気温: {}°C, 降水量: {}mm）と矛盾していないか判定してください。\n\
コメント: {text}\n矛盾がなければ「OK」、あれば「NG」とだけ回答してください。",
        weather.weather_description, weather.temperature, weather.precipitation
    );
    let response = llm.generate(&prompt).await;
    let upper = response.trim().to_uppercase();
    !upper.contains("NG") || upper.contains("OK")
}

async fn check_comment_contradictions(llm: &LlmManager, text: &str, weather: &Forecast) -> bool {
    if !local_contradiction_check(text, weather) {
        return false;
    }
    llm_contradiction_check(llm, text, weather).await
}

fn rain_fallback_pick<'a>(candidates: &[&'a PastComment]) -> Option<&'a PastComment> {
    candidates.iter().find(|c| RAIN_FALLBACK_WORDS.iter().any(|w| c.comment_text.contains(w))).copied()
}

fn is_excluded(weather: &str, advice: &str, excluded: &[(String, String)]) -> bool {
    excluded.iter().any(|(w, a)| w == weather && a == advice)
}

/// Selects one weather comment and one advice comment for the request. Returns `None`
/// only when every avenue (LLM selection, the alternative-selection loop, and the
/// rain-specific keyword fallback) is exhausted; the orchestrator retries from there.
pub async fn select_pair(llm: &LlmManager, input: &SelectionInput<'_>, cfg: &PairSelectorConfig) -> Option<CommentPair> {
    if input.weather_candidates.is_empty() || input.advice_candidates.is_empty() {
        return None;
    }

    let weather_ranked = rank_and_cap(input.weather_candidates, input.weather, cfg);
    let advice_ranked = rank_and_cap(input.advice_candidates, input.weather, cfg);

    let weather_comment = select_one(llm, &weather_ranked, input, cfg).await?;

    if input.advice_candidates.len() == 1 {
        let advice_comment = advice_ranked[0].clone();
        return Some(CommentPair {
            weather_comment,
            advice_comment,
            similarity_score: 1.0,
            selection_reason: "single_candidate".to_string(),
        });
    }

    let advice_text = format_candidates(&advice_ranked);
    let weather_context = format_weather_context(input);
    let prompt = create_prompt(&advice_text, &weather_context);
    let response = llm.generate(&prompt).await;
    let advice_comment = match extract_selected_index(&response, advice_ranked.len()) {
        Some(i) => advice_ranked[i].clone(),
        None => advice_ranked[0].clone(),
    };

    if !is_excluded(&weather_comment.comment_text, &advice_comment.comment_text, input.excluded_pairs) {
        return Some(CommentPair {
            weather_comment,
            advice_comment,
            similarity_score: 1.0,
            selection_reason: "llm_selected".to_string(),
        });
    }

    alternative_selection_loop(&weather_ranked, &advice_ranked, input, cfg)
        .or_else(|| rain_specific_fallback(&weather_ranked, &advice_ranked, input))
}

async fn select_one(
    llm: &LlmManager,
    ranked: &[&PastComment],
    input: &SelectionInput<'_>,
    cfg: &PairSelectorConfig,
) -> Option<PastComment> {
    if ranked.is_empty() {
        return None;
    }
    if ranked.len() == 1 {
        return Some(ranked[0].clone());
    }

    if input.exclude_previous {
        let top_count = cfg.regeneration_min_top.max(ranked.len() / 3);
        let top = &ranked[..top_count.min(ranked.len())];
        return top.choose(&mut rand::thread_rng()).map(|c| (*c).clone());
    }

    let candidates_text = format_candidates(ranked);
    let weather_context = format_weather_context(input);
    let prompt = create_prompt(&candidates_text, &weather_context);
    let response = llm.generate(&prompt).await;
    let selected_index = extract_selected_index(&response, ranked.len())?;

    let selected = ranked[selected_index];
    if check_comment_contradictions(llm, &selected.comment_text, input.weather).await {
        return Some(selected.clone());
    }

    for (i, candidate) in ranked.iter().enumerate() {
        if i == selected_index {
            continue;
        }
        if check_comment_contradictions(llm, &candidate.comment_text, input.weather).await {
            return Some((*candidate).clone());
        }
    }

    Some(ranked[0].clone())
}

fn alternative_selection_loop(
    weather_ranked: &[&PastComment],
    advice_ranked: &[&PastComment],
    input: &SelectionInput,
    cfg: &PairSelectorConfig,
) -> Option<CommentPair> {
    for attempt in 0..cfg.max_alternative_attempts {
        let w = weather_ranked.get(attempt % weather_ranked.len())?;
        let a = advice_ranked.get(attempt % advice_ranked.len())?;
        if !is_excluded(&w.comment_text, &a.comment_text, input.excluded_pairs) {
            return Some(CommentPair {
                weather_comment: (*w).clone(),
                advice_comment: (*a).clone(),
                similarity_score: 0.5,
                selection_reason: "alternative_selection".to_string(),
            });
        }
    }
    None
}

fn rain_specific_fallback(
    weather_ranked: &[&PastComment],
    advice_ranked: &[&PastComment],
    input: &SelectionInput,
) -> Option<CommentPair> {
    if input.weather.precipitation <= 0.0 && !input.weather.weather_description.contains('雨') {
        return None;
    }
    let advice_comment = rain_fallback_pick(advice_ranked)?.clone();
    let weather_comment = (*weather_ranked.first()?).clone();
    Some(CommentPair {
        weather_comment,
        advice_comment,
        similarity_score: 0.2,
        selection_reason: "rain_keyword_fallback".to_string(),
    })
}
