//! Rule 10: tone consistency between the weather comment and advice comment. Grounded on
//! `utils/validators/tone_consistency_validator.py`.

use super::{PairContext, PairRule};
use crate::config::ToneWords;
use crate::domain::ValidationResult;

fn matches_any(text: &str, words: &[String]) -> bool {
    words.iter().any(|w| text.contains(w.as_str()))
}

fn dominant_register(text: &str, words: &ToneWords) -> Vec<&'static str> {
    let mut registers = Vec::new();
    if matches_any(text, &words.positive) {
        registers.push("positive");
    }
    if matches_any(text, &words.negative) {
        registers.push("negative");
    }
    if matches_any(text, &words.urgency) {
        registers.push("urgency");
    }
    if matches_any(text, &words.casual) {
        registers.push("casual");
    }
    registers
}

pub struct ToneConsistencyRule;

impl PairRule for ToneConsistencyRule {
    fn name(&self) -> &'static str {
        "tone_consistency"
    }

    fn check(&self, ctx: &PairContext) -> ValidationResult {
        let words = &ctx.lexicon.tone_words;
        let advice_text = &ctx.advice_comment.comment_text;

        if matches_any(advice_text, &words.encouraging) {
            return ValidationResult::ok();
        }

        let weather_registers = dominant_register(&ctx.weather_comment.comment_text, words);
        let advice_registers = dominant_register(advice_text, words);

        let has_urgency = weather_registers.contains(&"urgency") || advice_registers.contains(&"urgency");
        let has_casual = weather_registers.contains(&"casual") || advice_registers.contains(&"casual");
        if has_urgency && has_casual {
            return ValidationResult::reject(
                "tone_consistency",
                "urgency wording in one comment clashes with casual wording in the other".to_string(),
            );
        }

        let has_positive = weather_registers.contains(&"positive") || advice_registers.contains(&"positive");
        let has_negative = weather_registers.contains(&"negative") || advice_registers.contains(&"negative");
        if has_positive && has_negative {
            return ValidationResult::reject(
                "tone_consistency",
                "positive wording in one comment clashes with negative wording in the other".to_string(),
            );
        }

        ValidationResult::ok()
    }
}
