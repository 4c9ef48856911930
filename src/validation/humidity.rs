//! Rule 3: humidity-band forbidden language. Grounded on
//! `utils/validators/temperature_validator.py`'s humidity branch (humidity bands are
//! checked alongside temperature bands in the corpus, split into their own module here
//! for rule-battery clarity).

use super::{CommentContext, CommentRule};
use crate::domain::ValidationResult;

const DRYING_WORDS: &[&str] = &["乾燥注意", "肌の乾燥", "のどの乾燥"];
const DEHUMIDIFYING_WORDS: &[&str] = &["除湿", "ジメジメ解消"];

pub struct HumidityBandRule;

impl CommentRule for HumidityBandRule {
    fn name(&self) -> &'static str {
        "humidity_band"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let humidity = ctx.weather.humidity;

        if humidity >= ctx.config.humidity_dry_threshold {
            for word in DRYING_WORDS {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "humidity_band",
                        format!("drying wording '{word}' contradicts humidity {humidity}"),
                    );
                }
            }
        }

        if humidity < ctx.config.humidity_humid_threshold {
            for word in DEHUMIDIFYING_WORDS {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "humidity_band",
                        format!("dehumidifying wording '{word}' contradicts humidity {humidity}"),
                    );
                }
            }
        }

        ValidationResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LexiconConfig, ValidationConfig};
    use crate::domain::{CommentType, WeatherCondition};
    use crate::validation::test_support::*;

    #[test]
    fn rejects_drying_language_at_high_humidity() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Cloudy, 20.0, 0.0, 85.0, 1.0);
        let c = comment("肌の乾燥に注意です", CommentType::Advice);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!HumidityBandRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_unrelated_comment_at_any_humidity() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Cloudy, 20.0, 0.0, 85.0, 1.0);
        let c = comment("穏やかな一日です", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(HumidityBandRule.check(&ctx).is_valid);
    }
}
