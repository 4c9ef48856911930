//! Rule 13: "brief shower" wording is rejected when rain has been continuous across the
//! report window. Grounded on `utils/validators/continuous_rain_validator.py`.

use super::{PairContext, PairRule};
use crate::domain::ValidationResult;

const BRIEF_RAIN_WORDS: &[&str] = &["にわか雨", "一時的な雨", "急な雨"];

fn is_raining(f: &crate::domain::Forecast) -> bool {
    f.precipitation >= 0.1 || f.weather_condition.is_rainy()
}

pub struct ContinuousRainRule;

impl PairRule for ContinuousRainRule {
    fn name(&self) -> &'static str {
        "continuous_rain"
    }

    fn check(&self, ctx: &PairContext) -> ValidationResult {
        let threshold = ctx.config.continuous_rain_threshold_hours;
        if ctx.hourly.len() < threshold {
            return ValidationResult::ok();
        }

        let continuous = ctx.hourly.iter().rev().take(threshold).all(|f| is_raining(f));
        if !continuous {
            return ValidationResult::ok();
        }

        for word in BRIEF_RAIN_WORDS {
            if ctx.weather_comment.comment_text.contains(word) || ctx.advice_comment.comment_text.contains(word) {
                return ValidationResult::reject(
                    "continuous_rain",
                    format!("'{word}' understates rain that has been continuous for {threshold}+ hours"),
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
    fn rejects_brief_rain_wording_under_continuous_rain() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Rain, 19.0, 3.0, 80.0, 4.0);
        let hourly = [&w, &w, &w, &w];
        let wc = comment("にわか雨が続く見込みです", CommentType::WeatherComment);
        let ac = comment("傘をお持ちください", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &wc,
            advice_comment: &ac,
            weather: &w,
            hourly: &hourly,
            hour_jst: 15,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!ContinuousRainRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_brief_rain_wording_when_rain_is_intermittent() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let dry = weather(WeatherCondition::Clear, 22.0, 0.0, 40.0, 2.0);
        let rainy = weather(WeatherCondition::Rain, 20.0, 2.0, 70.0, 3.0);
        let hourly = [&dry, &rainy, &dry, &rainy];
        let wc = comment("にわか雨にご注意ください", CommentType::WeatherComment);
        let ac = comment("折りたたみ傘が便利です", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &wc,
            advice_comment: &ac,
            weather: &rainy,
            hourly: &hourly,
            hour_jst: 15,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(ContinuousRainRule.check(&ctx).is_valid);
    }
}
