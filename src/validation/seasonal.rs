//! Rule 14: month-gated seasonal vocabulary. Grounded on
//! `nodes/helpers/safety_checks/seasonal_appropriateness.py`.

use super::{CommentContext, CommentRule};
use crate::domain::ValidationResult;

struct SeasonalWord {
    word: &'static str,
    valid_months: &'static [u32],
}

const SEASONAL_WORDS: &[SeasonalWord] = &[
    SeasonalWord { word: "残暑", valid_months: &[9, 10, 11] },
    SeasonalWord { word: "初雪", valid_months: &[10, 11, 12, 1, 2, 3] },
    SeasonalWord { word: "花見", valid_months: &[3, 4] },
    SeasonalWord { word: "新緑", valid_months: &[4, 5, 6] },
    SeasonalWord { word: "紅葉", valid_months: &[10, 11] },
    SeasonalWord { word: "梅雨明け", valid_months: &[6, 7] },
    SeasonalWord { word: "初夏", valid_months: &[5, 6] },
    SeasonalWord { word: "小春日和", valid_months: &[11, 12] },
];

pub struct SeasonalAppropriatenessRule;

impl CommentRule for SeasonalAppropriatenessRule {
    fn name(&self) -> &'static str {
        "seasonal_appropriateness"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let text = &ctx.comment.comment_text;
        for entry in SEASONAL_WORDS {
            if text.contains(entry.word) && !entry.valid_months.contains(&ctx.month) {
                return ValidationResult::reject(
                    "seasonal_appropriateness",
                    format!("'{}' is not appropriate for month {}", entry.word, ctx.month),
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
    fn rejects_zansho_outside_early_autumn() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 30.0, 0.0, 50.0, 2.0);
        let c = comment("残暑が厳しい一日です", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 12,
            month: 6,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!SeasonalAppropriatenessRule.check(&ctx).is_valid);
    }

    #[test]
    fn rejects_hatsuyuki_in_summer() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 28.0, 0.0, 50.0, 2.0);
        let c = comment("初雪の便りが届きました", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 12,
            month: 8,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!SeasonalAppropriatenessRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_zansho_in_september() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 31.0, 0.0, 55.0, 2.0);
        let c = comment("残暑がまだ続きます", CommentType::WeatherComment);
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 12,
            month: 9,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(SeasonalAppropriatenessRule.check(&ctx).is_valid);
    }
}
