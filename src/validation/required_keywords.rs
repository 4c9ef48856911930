//! Rule 6: heavy rain and storm forecasts must carry a warning-lexicon keyword. Grounded
//! on `utils/validators/weather_comment_validator.py`'s required-keyword check.

use super::{CommentContext, CommentRule};
use crate::domain::{ValidationResult, WeatherCondition};

const WARNING_WORDS: &[&str] = &["注意", "警戒", "危険", "お気をつけ"];

pub struct RequiredKeywordsRule;

impl CommentRule for RequiredKeywordsRule {
    fn name(&self) -> &'static str {
        "required_keywords"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let needs_warning = matches!(
            ctx.weather.weather_condition,
            WeatherCondition::HeavyRain | WeatherCondition::Storm | WeatherCondition::SevereStorm
        );
        if !needs_warning {
            return ValidationResult::ok();
        }

        let has_warning = WARNING_WORDS.iter().any(|w| ctx.comment.comment_text.contains(w));
        if has_warning {
            ValidationResult::ok()
        } else {
            ValidationResult::reject(
                "required_keywords",
                "heavy rain/storm forecasts require a warning-lexicon keyword".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LexiconConfig, ValidationConfig};
    use crate::domain::CommentType;
    use crate::validation::test_support::*;

    #[test]
    fn rejects_heavy_rain_comment_without_warning_word() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::HeavyRain, 20.0, 25.0, 80.0, 5.0);
        let c = comment("雨が降っています", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 15,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!RequiredKeywordsRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_heavy_rain_comment_with_warning_word() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::HeavyRain, 20.0, 25.0, 80.0, 5.0);
        let c = comment("激しい雨に警戒してください", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 15,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(RequiredKeywordsRule.check(&ctx).is_valid);
    }

    #[test]
    fn does_not_apply_outside_heavy_rain_or_storm() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 20.0, 0.0, 50.0, 1.0);
        let c = comment("穏やかな一日です", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 15,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(RequiredKeywordsRule.check(&ctx).is_valid);
    }
}
