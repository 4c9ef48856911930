//! Rule 9: content duplication between the weather comment and advice comment. Grounded
//! on `utils/validators/duplication_checker.py`.

use super::{PairContext, PairRule};
use crate::domain::ValidationResult;
use std::collections::HashSet;

const CRITICAL_KEYWORDS: &[&str] = &["雷", "熱中症", "傘", "気温差", "警戒", "注意"];

fn strip_punctuation(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_punctuation() && !"、。！？「」・".contains(*c)).collect()
}

fn jaccard_char_overlap(a: &str, b: &str) -> f64 {
    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

pub struct DuplicationRule;

impl PairRule for DuplicationRule {
    fn name(&self) -> &'static str {
        "duplication"
    }

    fn check(&self, ctx: &PairContext) -> ValidationResult {
        let a = &ctx.weather_comment.comment_text;
        let b = &ctx.advice_comment.comment_text;

        if a == b {
            return ValidationResult::reject("duplication", "weather comment and advice are identical".to_string());
        }

        if strip_punctuation(a) == strip_punctuation(b) {
            return ValidationResult::reject("duplication", "comments are equal once punctuation is stripped".to_string());
        }

        for keyword in CRITICAL_KEYWORDS {
            if a.contains(keyword) && b.contains(keyword) {
                return ValidationResult::reject(
                    "duplication",
                    format!("both comments share the critical keyword '{keyword}'"),
                );
            }
        }

        let len_a = a.chars().count();
        let len_b = b.chars().count();
        let short_enough = len_a <= 10 && len_b <= 10;
        let ratio_ok = if len_a.min(len_b) == 0 {
            false
        } else {
            (len_a.max(len_b) as f64 / len_a.min(len_b) as f64) <= 2.0
        };

        if short_enough && ratio_ok {
            let overlap = jaccard_char_overlap(a, b);
            if overlap > ctx.config.duplication_similarity_threshold {
                return ValidationResult::reject(
                    "duplication",
                    format!("character overlap {overlap:.2} exceeds threshold on short strings"),
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
    fn rejects_identical_comments() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 20.0, 0.0, 50.0, 1.0);
        let hourly = [&w];
        let text = comment("今日は晴れです", CommentType::WeatherComment);
        let text2 = comment("今日は晴れです", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &text,
            advice_comment: &text2,
            weather: &w,
            hourly: &hourly,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!DuplicationRule.check(&ctx).is_valid);
    }

    #[test]
    fn rejects_shared_critical_keyword() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Thunder, 25.0, 5.0, 70.0, 4.0);
        let hourly = [&w];
        let wc = comment("雷に警戒が必要です", CommentType::WeatherComment);
        let ac = comment("雷が鳴るので屋内にいましょう", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &wc,
            advice_comment: &ac,
            weather: &w,
            hourly: &hourly,
            hour_jst: 15,
            month: 7,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!DuplicationRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_distinct_complementary_comments() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 20.0, 0.0, 50.0, 1.0);
        let hourly = [&w];
        let wc = comment("爽やかな晴天です", CommentType::WeatherComment);
        let ac = comment("日焼け止めをお忘れなく", CommentType::Advice);
        let ctx = PairContext {
            weather_comment: &wc,
            advice_comment: &ac,
            weather: &w,
            hourly: &hourly,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(DuplicationRule.check(&ctx).is_valid);
    }
}
