//! Rule 2: temperature-band forbidden words plus the heatstroke/cold symptom-word
//! contradiction. Grounded on `utils/validators/temperature_validator.py`.

use super::{CommentContext, CommentRule};
use crate::domain::ValidationResult;

const COLD_SYMPTOM_WORDS: &[&str] = &["風邪", "冷え", "寒気", "凍え"];
const HEAT_SYMPTOM_WORDS: &[&str] = &["熱中症", "脱水", "熱射病", "日射病"];

fn band_of(temp: f64, cfg: &crate::config::ValidationConfig) -> &'static str {
    if temp >= cfg.heatstroke_severe_temp {
        "very_hot"
    } else if temp >= cfg.heatstroke_warning_temp {
        "hot"
    } else if temp >= 25.0 {
        "moderate_warm"
    } else if temp >= 12.0 {
        "mild"
    } else if temp >= cfg.cold_warning_temp {
        "cold"
    } else {
        "very_cold"
    }
}

pub struct TemperatureBandRule;

impl CommentRule for TemperatureBandRule {
    fn name(&self) -> &'static str {
        "temperature_band"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let temp = ctx.weather.temperature;
        let band = band_of(temp, ctx.config);
        if let Some(forbidden) = ctx.lexicon.temperature_forbidden_words.get(band) {
            for word in forbidden {
                if ctx.comment.comment_text.contains(word.as_str()) {
                    return ValidationResult::reject(
                        "temperature_band",
                        format!("'{word}' is forbidden in the '{band}' temperature band"),
                    );
                }
            }
        }

        if temp >= ctx.config.heatstroke_warning_temp {
            for word in COLD_SYMPTOM_WORDS {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "temperature_band",
                        format!("cold-symptom word '{word}' contradicts temperature {temp}"),
                    );
                }
            }
        }

        if temp < ctx.config.heatstroke_warning_temp {
            for word in HEAT_SYMPTOM_WORDS {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "temperature_band",
                        format!("heat-symptom word '{word}' contradicts temperature {temp} (below heatstroke warning threshold)"),
                    );
                }
            }
        }

        ValidationResult::ok()
    }
}
