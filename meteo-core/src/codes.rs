//! WMO weather code translation.
//! See: https://open-meteo.com/en/docs#weathervariables

use crate::model::{ConditionCode, ConditionFamily};

/// (WMO code, internal id, description, icon key)
const WMO_TABLE: &[(i32, u16, &str, &str)] = &[
    (0, 800, "Clear sky", "01d"),
    (1, 801, "Mainly clear", "02d"),
    (2, 802, "Partly cloudy", "03d"),
    (3, 803, "Overcast", "04d"),
    (45, 701, "Fog", "50d"),
    (48, 741, "Depositing rime fog", "50d"),
    (51, 300, "Light drizzle", "09d"),
    (53, 301, "Moderate drizzle", "09d"),
    (55, 302, "Dense drizzle", "09d"),
    (61, 500, "Slight rain", "10d"),
    (63, 501, "Moderate rain", "10d"),
    (65, 502, "Heavy rain", "10d"),
    (71, 600, "Slight snow", "13d"),
    (73, 601, "Moderate snow", "13d"),
    (75, 602, "Heavy snow", "13d"),
    (95, 200, "Thunderstorm", "11d"),
    (96, 201, "Thunderstorm with hail", "11d"),
    (99, 202, "Thunderstorm with heavy hail", "11d"),
];

const DEFAULT_ID: u16 = 800;
const DEFAULT_DESCRIPTION: &str = "Unknown";
const DEFAULT_ICON: &str = "01d";

/// Decode a raw WMO code. Unknown codes map to the clear-sky default.
pub fn decode(raw_code: i32) -> ConditionCode {
    let (internal_id, description, icon_key) = WMO_TABLE
        .iter()
        .find(|(code, ..)| *code == raw_code)
        .map(|&(_, id, desc, icon)| (id, desc, icon))
        .unwrap_or((DEFAULT_ID, DEFAULT_DESCRIPTION, DEFAULT_ICON));

    ConditionCode {
        internal_id,
        family: ConditionFamily::from_internal_id(internal_id),
        description: description.to_string(),
        icon_key: icon_key.to_string(),
    }
}

/// The descriptor used for codes outside the table.
pub fn unknown() -> ConditionCode {
    ConditionCode {
        internal_id: DEFAULT_ID,
        family: ConditionFamily::from_internal_id(DEFAULT_ID),
        description: DEFAULT_DESCRIPTION.to_string(),
        icon_key: DEFAULT_ICON.to_string(),
    }
}

pub fn known_codes() -> impl Iterator<Item = i32> {
    WMO_TABLE.iter().map(|(code, ..)| *code)
}
