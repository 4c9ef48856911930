//! Validation engine (C7): ordered, short-circuiting rule batteries over generated
//! comments. Grounded on `utils/validators/*.py`; each submodule here corresponds to one
//! Python validator file, ported to a shared `CommentRule`/`PairRule` trait.

mod continuous_rain;
mod duplication;
mod humidity;
mod pollen;
mod regional;
mod required_keywords;
mod seasonal;
mod temperature;
mod time_temperature;
mod tone;
mod umbrella;
mod weather_reality;
mod weather_words;

use crate::config::{LexiconConfig, ValidationConfig};
use crate::domain::{Forecast, PastComment, ValidationResult};

/// Everything a per-comment rule needs to judge one candidate in isolation.
pub struct CommentContext<'a> {
    pub comment: &'a PastComment,
    pub weather: &'a Forecast,
    pub hour_jst: u32,
    pub month: u32,
    pub config: &'a ValidationConfig,
    pub lexicon: &'a LexiconConfig,
    /// Known coordinates for the comment's location, when available. Regional/coastal
    /// checks prefer geodetic distance over the location's name when this is `Some`.
    pub location_coordinate: Option<&'a crate::domain::LocationCoordinate>,
}

/// Everything a pair-level rule needs, plus both contexts for the rules that also want to
/// re-run comment-level checks against either side.
pub struct PairContext<'a> {
    pub weather_comment: &'a PastComment,
    pub advice_comment: &'a PastComment,
    pub weather: &'a Forecast,
    pub hourly: &'a [&'a Forecast],
    pub hour_jst: u32,
    pub month: u32,
    pub config: &'a ValidationConfig,
    pub lexicon: &'a LexiconConfig,
    pub location_coordinate: Option<&'a crate::domain::LocationCoordinate>,
}

pub trait CommentRule {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &CommentContext) -> ValidationResult;
}

pub trait PairRule {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &PairContext) -> ValidationResult;
}

fn comment_rules() -> Vec<Box<dyn CommentRule>> {
    vec![
        Box::new(weather_words::WeatherWordsRule),
        Box::new(temperature::TemperatureBandRule),
        Box::new(humidity::HumidityBandRule),
        Box::new(regional::RegionalRule),
        Box::new(pollen::PollenRule),
        Box::new(required_keywords::RequiredKeywordsRule),
        Box::new(time_temperature::TimeTemperatureRule),
        Box::new(seasonal::SeasonalAppropriatenessRule),
    ]
}

fn pair_rules() -> Vec<Box<dyn PairRule>> {
    vec![
        Box::new(weather_reality::WeatherRealityRule),
        Box::new(duplication::DuplicationRule),
        Box::new(tone::ToneConsistencyRule),
        Box::new(umbrella::UmbrellaRedundancyRule),
        Box::new(continuous_rain::ContinuousRainRule),
    ]
}

/// Runs the six per-comment rule batteries in order; the first failure short-circuits.
pub fn validate(ctx: &CommentContext) -> ValidationResult {
    for rule in comment_rules() {
        let result = rule.check(ctx);
        if !result.is_valid {
            return ValidationResult::reject(rule.name(), result.reason);
        }
    }
    ValidationResult::ok()
}

/// Runs comment-level validation on both sides, then the eight pair-level batteries.
pub fn validate_pair(ctx: &PairContext) -> ValidationResult {
    let weather_ctx = CommentContext {
        comment: ctx.weather_comment,
        weather: ctx.weather,
        hour_jst: ctx.hour_jst,
        month: ctx.month,
        config: ctx.config,
        lexicon: ctx.lexicon,
        location_coordinate: ctx.location_coordinate,
    };
    let side = validate(&weather_ctx);
    if !side.is_valid {
        return side;
    }

    let advice_ctx = CommentContext {
        comment: ctx.advice_comment,
        weather: ctx.weather,
        hour_jst: ctx.hour_jst,
        month: ctx.month,
        config: ctx.config,
        lexicon: ctx.lexicon,
        location_coordinate: ctx.location_coordinate,
    };
    let side = validate(&advice_ctx);
    if !side.is_valid {
        return side;
    }

    for rule in pair_rules() {
        let result = rule.check(ctx);
        if !result.is_valid {
            return ValidationResult::reject(rule.name(), result.reason);
        }
    }
    ValidationResult::ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::{CommentType, WeatherCondition, WindDirection};
    use chrono::Utc;

    pub fn weather(condition: WeatherCondition, temp: f64, precip: f64, humidity: f64, wind: f64) -> Forecast {
        Forecast {
            location_name: "東京".into(),
            datetime: Utc::now(),
            temperature: temp,
            weather_code: "100".into(),
            weather_condition: condition,
            weather_description: String::new(),
            precipitation: precip,
            humidity,
            wind_speed: wind,
            wind_direction: WindDirection::N,
            wind_degrees: 0,
        }
    }

    pub fn comment(text: &str, comment_type: CommentType) -> PastComment {
        PastComment {
            location: "東京".into(),
            datetime: Utc::now(),
            weather_condition_text: String::new(),
            comment_text: text.into(),
            comment_type,
            temperature: None,
            usage_count: 0,
            season: None,
            region: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::{CommentType, WeatherCondition};

    #[test]
    fn validate_accepts_unremarkable_comment() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 22.0, 0.0, 50.0, 2.0);
        let c = comment("爽やかな一日になりそうです", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(validate(&ctx).is_valid);
    }

    #[test]
    fn validate_pair_rejects_when_either_side_fails_comment_rules() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Rain, 20.0, 3.0, 50.0, 2.0);
        let hourly = [&w];
        let weather_comment = comment("青空が広がります", CommentType::WeatherComment);
        let advice = comment("傘をお持ちください", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &weather_comment,
            advice_comment: &advice,
            weather: &w,
            hourly: &hourly,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        let result = validate_pair(&ctx);
        assert!(!result.is_valid);
    }
}
