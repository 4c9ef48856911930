//! Weather-code → condition / description / wind-direction tables.
//!
//! These tables are a fixed contract with the upstream weather API (§6) and are ported
//! near-verbatim; unknown codes map to [`WeatherCondition::Unknown`] rather than erroring.

use crate::domain::{WeatherCondition, WindDirection};

pub fn convert_weather_code(code: &str) -> WeatherCondition {
    use WeatherCondition::*;
    match code {
        "100" => Clear,
        "101" | "110" | "132" => PartlyCloudy,
        "102" | "103" | "112" | "113" | "114" | "126" | "127" | "128" | "129" | "140" => Rain,
        "104" | "105" | "115" | "116" | "117" => Snow,
        "111" => Cloudy,
        "119" | "123" | "125" => Thunder,
        "130" | "131" => Fog,
        "200" => Cloudy,
        "201" => PartlyCloudy,
        "202" | "203" | "212" | "213" | "214" | "224" | "225" | "226" | "227" => Rain,
        "204" | "205" => Snow,
        "208" | "219" | "240" | "250" => Thunder,
        "209" | "231" => Fog,
        "210" => PartlyCloudy,
        "211" => Clear,
        "300" | "301" | "302" | "303" | "309" | "311" | "313" | "314" | "315" | "320" | "321"
        | "323" | "324" | "325" | "650" => Rain,
        "306" => HeavyRain,
        "308" => SevereStorm,
        "328" => HeavyRain,
        "400" | "401" | "402" | "403" | "409" | "411" | "413" | "414" | "420" | "421" | "422"
        | "423" | "424" => Snow,
        "405" => HeavySnow,
        "406" | "407" => SevereStorm,
        "425" => HeavySnow,
        "450" => Thunder,
        "350" | "800" => Thunder,
        "500" => Clear,
        "550" | "552" | "553" | "562" | "563" | "572" | "573" | "582" | "583" => ExtremeHeat,
        "558" | "568" => SevereStorm,
        "600" => Cloudy,
        "850" | "851" | "852" | "853" | "854" | "855" | "859" | "860" | "861" | "862" | "863" => {
            SevereStorm
        }
        _ => Unknown,
    }
}

pub fn get_weather_description(code: &str) -> &'static str {
    match code {
        "100" => "晴れ",
        "101" => "晴れ時々くもり",
        "102" => "晴れ一時雨",
        "103" => "晴れ時々雨",
        "104" => "晴れ一時雪",
        "105" => "晴れ時々雪",
        "106" => "晴れ一時雨か雪",
        "107" => "晴れ時々雨か雪",
        "108" => "晴れ一時雨",
        "110" => "晴れのち時々くもり",
        "111" => "晴れのちくもり",
        "112" => "晴れのち一時雨",
        "113" => "晴れのち時々雨",
        "114" => "晴れのち雨",
        "115" => "晴れのち一時雪",
        "116" => "晴れのち時々雪",
        "117" => "晴れのち雪",
        "118" => "晴れのち雨か雪",
        "119" => "晴れのち雨か雷雨",
        "120" => "晴れ一時雨",
        "121" => "晴れ一時雨",
        "122" => "晴れ夕方一時雨",
        "123" => "晴れ山沿い雷雨",
        "124" => "晴れ山沿い雪",
        "125" => "晴れ午後は雷雨",
        "126" => "晴れ昼頃から雨",
        "127" => "晴れ夕方から雨",
        "128" => "晴れ夜は雨",
        "129" => "晴れ夜半から雨",
        "130" => "朝の内霧のち晴れ",
        "131" => "晴れ朝方霧",
        "132" => "晴れ時々くもり",
        "140" => "晴れ時々雨",
        "160" => "晴れ一時雪か雨",
        "170" => "晴れ時々雪か雨",
        "181" => "晴れのち雪か雨",
        "200" => "くもり",
        "201" => "くもり時々晴れ",
        "202" => "くもり一時雨",
        "203" => "くもり時々雨",
        "204" => "くもり一時雪",
        "205" => "くもり時々雪",
        "206" => "くもり一時雨か雪",
        "207" => "くもり時々雨か雪",
        "208" => "くもり一時雨か雷雨",
        "209" => "霧",
        "210" => "くもりのち時々晴れ",
        "211" => "くもりのち晴れ",
        "212" => "くもりのち一時雨",
        "213" => "くもりのち時々雨",
        "214" => "くもりのち雨",
        "215" => "くもりのち一時雪",
        "216" => "くもりのち時々雪",
        "217" => "くもりのち雪",
        "218" => "くもりのち雨か雪",
        "219" => "くもりのち雨か雷雨",
        "220" => "くもり朝夕一時雨",
        "221" => "くもり朝の内一時雨",
        "222" => "くもり夕方一時雨",
        "223" => "くもり日中時々晴れ",
        "224" => "くもり昼頃から雨",
        "225" => "くもり夕方から雨",
        "226" => "くもり夜は雨",
        "227" => "くもり夜半から雨",
        "228" => "くもり昼頃から雪",
        "229" => "くもり夕方から雪",
        "230" => "くもり夜は雪",
        "231" => "くもり海上海岸は霧か霧雨",
        "240" => "くもり時々雨で雷を伴う",
        "250" => "くもり時々雪で雷を伴う",
        "260" => "くもり一時雪か雨",
        "270" => "くもり時々雪か雨",
        "281" => "くもりのち雪か雨",
        "300" => "雨",
        "301" => "雨時々晴れ",
        "302" => "雨時々止む",
        "303" => "雨時々雪",
        "304" => "雨か雪",
        "306" => "大雨",
        "308" => "雨で暴風を伴う",
        "309" => "雨一時雪",
        "311" => "雨のち晴れ",
        "313" => "雨のちくもり",
        "314" => "雨のち時々雪",
        "315" => "雨のち雪",
        "316" => "雨か雪のち晴れ",
        "317" => "雨か雪のちくもり",
        "320" => "朝の内雨のち晴れ",
        "321" => "朝の内雨のちくもり",
        "322" => "雨朝晩一時雪",
        "323" => "雨昼頃から晴れ",
        "324" => "雨夕方から晴れ",
        "325" => "雨夜は晴れ",
        "326" => "雨夕方から雪",
        "327" => "雨夜は雪",
        "328" => "雨一時強く降る",
        "329" => "雨一時みぞれ",
        "340" => "雪か雨",
        "350" => "雷",
        "361" => "雪か雨のち晴れ",
        "371" => "雪か雨のちくもり",
        "400" => "雪",
        "401" => "雪時々晴れ",
        "402" => "雪時々止む",
        "403" => "雪時々雨",
        "405" => "大雪",
        "406" => "風雪強い",
        "407" => "暴風雪",
        "409" => "雪一時雨",
        "411" => "雪のち晴れ",
        "413" => "雪のちくもり",
        "414" => "雪のち雨",
        "420" => "朝の内雪のち晴れ",
        "421" => "朝の内雪のちくもり",
        "422" => "雪昼頃から雨",
        "423" => "雪夕方から雨",
        "424" => "雪夜半から雨",
        "425" => "雪一時強く降る",
        "426" => "雪のちみぞれ",
        "427" => "雪一時みぞれ",
        "430" => "みぞれ",
        "450" => "雪で雷を伴う",
        "500" => "快晴",
        "550" => "猛暑",
        "552" => "猛暑時々曇り",
        "553" => "猛暑時々雨",
        "558" => "猛暑時々大雨・嵐",
        "562" => "猛暑のち曇り",
        "563" => "猛暑のち雨",
        "568" => "猛暑のち大雨・嵐",
        "572" => "曇り時々猛暑",
        "573" => "雨時々猛暑",
        "582" => "曇りのち猛暑",
        "583" => "雨のち猛暑",
        "600" => "うすぐもり",
        "650" => "小雨",
        "800" => "雷",
        "850" => "大雨・嵐",
        "851" => "大雨・嵐時々晴れ",
        "852" => "大雨・嵐時々曇り",
        "853" => "大雨・嵐時々雨",
        "854" => "大雨・嵐時々雪",
        "855" => "大雨・嵐時々猛暑",
        "859" => "大雨・嵐のち曇り",
        "860" => "大雨・嵐のち雪",
        "861" => "大雨・嵐のち雨",
        "862" => "大雨・嵐のち雪",
        "863" => "大雨・嵐のち猛暑",
        _ => "不明",
    }
}

/// Wind-direction index (0-8) → (direction, degrees). Index 0 is calm; unrecognized
/// indices map to `(Unknown, 0)` rather than erroring.
pub fn convert_wind_direction(index: i32) -> (WindDirection, i32) {
    match index {
        0 => (WindDirection::Calm, 0),
        1 => (WindDirection::N, 0),
        2 => (WindDirection::Ne, 45),
        3 => (WindDirection::E, 90),
        4 => (WindDirection::Se, 135),
        5 => (WindDirection::S, 180),
        6 => (WindDirection::Sw, 225),
        7 => (WindDirection::W, 270),
        8 => (WindDirection::Nw, 315),
        _ => (WindDirection::Unknown, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_expected_conditions() {
        assert_eq!(convert_weather_code("100"), WeatherCondition::Clear);
        assert_eq!(convert_weather_code("306"), WeatherCondition::HeavyRain);
        assert_eq!(convert_weather_code("850"), WeatherCondition::SevereStorm);
        assert_eq!(convert_weather_code("550"), WeatherCondition::ExtremeHeat);
        assert_eq!(convert_weather_code("405"), WeatherCondition::HeavySnow);
    }

    #[test]
    fn unknown_code_maps_to_unknown_not_error() {
        assert_eq!(convert_weather_code("999"), WeatherCondition::Unknown);
        assert_eq!(convert_weather_code(""), WeatherCondition::Unknown);
    }

    #[test]
    fn descriptions_default_to_fumei() {
        assert_eq!(get_weather_description("100"), "晴れ");
        assert_eq!(get_weather_description("999999"), "不明");
    }

    #[test]
    fn wind_direction_table_matches_fixed_degrees() {
        assert_eq!(convert_wind_direction(0), (WindDirection::Calm, 0));
        assert_eq!(convert_wind_direction(1), (WindDirection::N, 0));
        assert_eq!(convert_wind_direction(2), (WindDirection::Ne, 45));
        assert_eq!(convert_wind_direction(8), (WindDirection::Nw, 315));
    }

    #[test]
    fn wind_direction_out_of_range_is_unknown() {
        assert_eq!(convert_wind_direction(9), (WindDirection::Unknown, 0));
        assert_eq!(convert_wind_direction(-1), (WindDirection::Unknown, 0));
    }
}
