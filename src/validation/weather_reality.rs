//! Rule 7: the weather comment must not contradict the actual forecast. Grounded on
//! `utils/validators/weather_reality_validator.py`.

use super::{PairContext, PairRule};
use crate::domain::{ValidationResult, WeatherCondition};

const SUNNY_WORDS: &[&str] = &["青空", "快晴", "日差しがたっぷり"];
const RAINY_WORDS: &[&str] = &["雨", "にわか雨", "土砂降り"];
const HOT_WORDS: &[&str] = &["猛暑", "真夏日", "うだるような暑さ"];
const COLD_WORDS: &[&str] = &["極寒", "凍てつく", "真冬日"];

pub struct WeatherRealityRule;

impl PairRule for WeatherRealityRule {
    fn name(&self) -> &'static str {
        "weather_reality"
    }

    fn check(&self, ctx: &PairContext) -> ValidationResult {
        let text = &ctx.weather_comment.comment_text;
        let is_rainy = ctx.weather.weather_condition.is_rainy() || ctx.weather.precipitation > 0.0;
        let is_sunny = matches!(ctx.weather.weather_condition, WeatherCondition::Clear | WeatherCondition::PartlyCloudy);

        if is_rainy {
            if let Some(word) = SUNNY_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("weather_reality", format!("'{word}' asserts sun while rain is forecast"));
            }
        }
        if is_sunny && !is_rainy {
            if let Some(word) = RAINY_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("weather_reality", format!("'{word}' asserts rain under clear skies"));
            }
        }
        if ctx.weather.temperature < 10.0 {
            if let Some(word) = HOT_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("weather_reality", format!("'{word}' asserts heat below 10°C"));
            }
        }
        if ctx.weather.temperature > 30.0 {
            if let Some(word) = COLD_WORDS.iter().find(|w| text.contains(*w)) {
                return ValidationResult::reject("weather_reality", format!("'{word}' asserts cold above 30°C"));
            }
        }

        ValidationResult::ok()
    }
}
