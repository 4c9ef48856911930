//! Rule 1: weather-condition forbidden words. Grounded on
//! `utils/validators/weather_comment_validator.py`.

use super::{CommentContext, CommentRule};
use crate::domain::{ValidationResult, WeatherCondition};

fn category_of(condition: WeatherCondition) -> &'static str {
    match condition {
        WeatherCondition::Clear | WeatherCondition::PartlyCloudy => "sunny",
        WeatherCondition::Cloudy => "cloudy",
        WeatherCondition::HeavyRain => "heavy_rain",
        WeatherCondition::Rain | WeatherCondition::Storm | WeatherCondition::SevereStorm => "rain",
        _ => "other",
    }
}

pub struct WeatherWordsRule;

impl CommentRule for WeatherWordsRule {
    fn name(&self) -> &'static str {
        "weather_words"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let category = category_of(ctx.weather.weather_condition);
        if let Some(forbidden) = ctx.lexicon.weather_forbidden_words.get(category) {
            for word in forbidden {
                if ctx.comment.comment_text.contains(word.as_str()) {
                    return ValidationResult::reject(
                        "weather_words",
                        format!("'{word}' is forbidden under condition '{category}'"),
                    );
                }
            }
        }
        ValidationResult::ok()
    }
}
