//! Rule 5: pollen vocabulary is season- and region-gated, and invalid under rain, high
//! humidity, or strong wind. Grounded on `utils/validators/pollen_validator.py`.

use super::{CommentContext, CommentRule};
use crate::domain::ValidationResult;

const POLLEN_WORDS: &[&str] = &["花粉", "花粉症", "スギ花粉", "ヒノキ花粉"];

fn valid_months(location: &str) -> std::ops::RangeInclusive<u32> {
    if location.contains("北海道") {
        4..=6
    } else if location.contains("九州") || location.contains("福岡") {
        1..=4
    } else {
        2..=5
    }
}

fn is_okinawa(location: &str) -> bool {
    location.contains("沖縄") || location.contains("那覇")
}

pub struct PollenRule;

impl CommentRule for PollenRule {
    fn name(&self) -> &'static str {
        "pollen"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let mentions_pollen = POLLEN_WORDS.iter().any(|w| ctx.comment.comment_text.contains(w));
        if !mentions_pollen {
            return ValidationResult::ok();
        }

        if is_okinawa(&ctx.comment.location) {
            return ValidationResult::reject("pollen", "pollen season does not apply to Okinawa".to_string());
        }

        if !valid_months(&ctx.comment.location).contains(&ctx.month) {
            return ValidationResult::reject(
                "pollen",
                format!("month {} is outside the pollen season for this region", ctx.month),
            );
        }

        if ctx.weather.precipitation > 0.0 {
            return ValidationResult::reject("pollen", "pollen scatter does not apply while raining".to_string());
        }
        if ctx.weather.humidity >= ctx.config.pollen_humidity_threshold {
            return ValidationResult::reject("pollen", "pollen scatter is suppressed at high humidity".to_string());
        }
        if ctx.weather.wind_speed > ctx.config.pollen_wind_threshold {
            return ValidationResult::reject("pollen", "wind speed too high for typical pollen-scatter wording".to_string());
        }

        ValidationResult::ok()
    }
}
