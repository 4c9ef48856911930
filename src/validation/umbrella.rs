//! Rule 11: umbrella wording must not be redundant across the pair or asserted against dry
//! weather. Grounded on `utils/validators/umbrella_redundancy_validator.py`.

use super::{PairContext, PairRule};
use crate::domain::{ValidationResult, WeatherCondition};

const UMBRELLA_WORDS: &[&str] = &["傘をお持ちください", "傘が必須です", "傘をお忘れなく", "傘の準備を"];

fn mentions_umbrella(text: &str) -> bool {
    UMBRELLA_WORDS.iter().any(|w| text.contains(w)) || text.contains("傘")
}

pub struct UmbrellaRedundancyRule;

impl PairRule for UmbrellaRedundancyRule {
    fn name(&self) -> &'static str {
        "umbrella_redundancy"
    }

    fn check(&self, ctx: &PairContext) -> ValidationResult {
        let weather_mentions = mentions_umbrella(&ctx.weather_comment.comment_text);
        let advice_mentions = mentions_umbrella(&ctx.advice_comment.comment_text);

        if weather_mentions && advice_mentions {
            return ValidationResult::reject(
                "umbrella_redundancy",
                "both comments assert umbrella necessity".to_string(),
            );
        }

        let is_dry_and_clear = ctx.weather.precipitation < ctx.config.umbrella_precipitation_threshold
            && matches!(ctx.weather.weather_condition, WeatherCondition::Clear | WeatherCondition::PartlyCloudy);

        if is_dry_and_clear && (weather_mentions || advice_mentions) {
            return ValidationResult::reject(
                "umbrella_redundancy",
                "umbrella is mentioned despite clear, dry weather".to_string(),
            );
        }

        ValidationResult::ok()
    }
}
