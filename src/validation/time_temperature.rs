//! Rule 12: wording must match the time of day and temperature. Grounded on
//! `utils/validators/time_temperature_validator.py`.

use super::{CommentContext, CommentRule};
use crate::domain::ValidationResult;

const SUNLIGHT_WORDS: &[&str] = &["日差し", "強い日差し", "日射し"];
const NIGHT_SKY_WORDS: &[&str] = &["星空", "月明かり"];
const NIGHT_HOT_WORDS: &[&str] = &["蒸し暑い", "熱帯夜", "寝苦しい"];

fn is_night(hour: u32) -> bool {
    !(5..19).contains(&hour)
}

fn is_daytime(hour: u32) -> bool {
    (10..16).contains(&hour)
}

pub struct TimeTemperatureRule;

impl CommentRule for TimeTemperatureRule {
    fn name(&self) -> &'static str {
        "time_temperature"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let text = &ctx.comment.comment_text;
        let hour = ctx.hour_jst;

        if is_night(hour) {
            if let Some(word) = SUNLIGHT_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("time_temperature", format!("'{word}' does not fit nighttime hours"));
            }
        }

        if is_daytime(hour) {
            if let Some(word) = NIGHT_SKY_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("time_temperature", format!("'{word}' does not fit daytime hours"));
            }
        }

        if is_night(hour) && ctx.weather.temperature < ctx.config.night_hot_threshold {
            if let Some(word) = NIGHT_HOT_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject(
                    "time_temperature",
                    format!("'{word}' requires a night temperature at or above {:.0}°C", ctx.config.night_hot_threshold),
                );
            }
        }

        if is_daytime(hour) && ctx.weather.temperature < ctx.config.day_cold_threshold {
            if let Some(word) = SUNLIGHT_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject(
                    "time_temperature",
                    format!("'{word}' does not fit a daytime temperature below {:.0}°C", ctx.config.day_cold_threshold),
                );
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
    fn rejects_sunlight_wording_at_night() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 18.0, 0.0, 55.0, 1.0);
        let c = comment("強い日差しが降り注ぎます", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 22,
            month: 7,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!TimeTemperatureRule.check(&ctx).is_valid);
    }

    #[test]
    fn rejects_night_hot_wording_when_cool() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 18.0, 0.0, 55.0, 1.0);
        let c = comment("今夜は熱帯夜になりそうです", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 23,
            month: 7,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!TimeTemperatureRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_daytime_sunlight_when_warm() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 24.0, 0.0, 45.0, 2.0);
        let c = comment("強い日差しにご注意ください", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 13,
            month: 8,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(TimeTemperatureRule.check(&ctx).is_valid);
    }
}
