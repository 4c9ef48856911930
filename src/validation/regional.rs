//! Rule 4: regional and coastal vocabulary restrictions. Grounded on
//! `utils/validators/regional_validator.py` and `coastal_validator.py`. Coastal/inland is
//! decided by geodetic distance when coordinates are known, falling back to a name list
//! only when they are not (resolves the corpus's ambiguity — see SPEC_FULL §9).

use super::{CommentContext, CommentRule};
use crate::domain::{LocationCoordinate, ValidationResult};

const OKINAWA_NAMES: &[&str] = &["沖縄", "那覇", "石垣", "宮古島"];
const HOKKAIDO_NAMES: &[&str] = &["北海道", "札幌", "旭川", "釧路", "函館"];
const OKINAWA_FORBIDDEN: &[&str] = &["雪", "吹雪", "極寒"];
const HOKKAIDO_FORBIDDEN: &[&str] = &["猛暑日", "熱帯夜続き"];

const COASTAL_REFERENCE_NAMES: &[&str] = &[
    "横浜", "神戸", "那覇", "小樽", "鎌倉", "江の島", "湘南", "博多湾", "舞鶴",
];

fn is_coastal_by_name(location: &str) -> bool {
    COASTAL_REFERENCE_NAMES.iter().any(|n| location.contains(n))
}

/// Approximate coastal reference points used only as a name-list fallback when the
/// comment's location has no registered coordinates.
fn nearest_coast_distance_km(coord: &LocationCoordinate) -> f64 {
    let coastal_points = [
        LocationCoordinate { name: "横浜".into(), latitude: 35.4437, longitude: 139.6380 },
        LocationCoordinate { name: "神戸".into(), latitude: 34.6901, longitude: 135.1955 },
        LocationCoordinate { name: "小樽".into(), latitude: 43.1907, longitude: 140.9947 },
        LocationCoordinate { name: "那覇".into(), latitude: 26.2124, longitude: 127.6809 },
    ];
    coastal_points
        .iter()
        .map(|p| coord.distance_to(p))
        .fold(f64::INFINITY, f64::min)
}

pub struct RegionalRule;

impl CommentRule for RegionalRule {
    fn name(&self) -> &'static str {
        "regional"
    }

    fn check(&self, ctx: &CommentContext) -> ValidationResult {
        let location = &ctx.comment.location;

        if OKINAWA_NAMES.iter().any(|n| location.contains(n)) {
            for word in OKINAWA_FORBIDDEN {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "regional",
                        format!("'{word}' is not appropriate for Okinawa"),
                    );
                }
            }
        }

        if HOKKAIDO_NAMES.iter().any(|n| location.contains(n)) {
            for word in HOKKAIDO_FORBIDDEN {
                if ctx.comment.comment_text.contains(word) {
                    return ValidationResult::reject(
                        "regional",
                        format!("'{word}' is not appropriate for Hokkaido"),
                    );
                }
            }
        }

        let is_coastal = match ctx.location_coordinate {
            Some(coord) => nearest_coast_distance_km(coord) <= ctx.config.coastal_threshold_km,
            None => is_coastal_by_name(location),
        };

        if !is_coastal && ctx.comment.comment_text.contains("海風") {
            return ValidationResult::reject("regional", "'海風' implies a coastal location".to_string());
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

    fn located(location: &str, text: &str) -> crate::domain::PastComment {
        let mut c = comment(text, CommentType::WeatherComment);
        c.location = location.to_string();
        c
    }

    #[test]
    fn rejects_snow_wording_for_okinawa() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 25.0, 0.0, 50.0, 1.0);
        let c = located("那覇市", "雪が積もる予報です");
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 1,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(!RegionalRule.check(&ctx).is_valid);
    }

    #[test]
    fn accepts_snow_wording_outside_okinawa() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Snow, -2.0, 1.0, 60.0, 1.0);
        let c = located("札幌市", "雪が積もる予報です");
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 1,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: None,
        };
        assert!(RegionalRule.check(&ctx).is_valid);
    }

    #[test]
    fn coastal_check_uses_coordinates_when_available() {
        let cfg = ValidationConfig::default();
        let lex = LexiconConfig::default();
        let w = weather(WeatherCondition::Clear, 22.0, 0.0, 50.0, 3.0);
        let c = located("内陸の町", "海風が心地よいです");
        let inland = LocationCoordinate { name: "内陸の町".into(), latitude: 36.5, longitude: 138.2 };
        let ctx = CommentContext {
            comment: &c,
            weather: &w,
            hour_jst: 9,
            month: 5,
            config: &cfg,
            lexicon: &lex,
            location_coordinate: Some(&inland),
        };
        assert!(!RegionalRule.check(&ctx).is_valid);
    }
}
