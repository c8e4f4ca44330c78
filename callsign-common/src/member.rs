//! Member directory entry
//!
//! One `Member` per callsign. The callsign is the primary key in every
//! store implementation; all other fields are free text copied from the
//! membership roster, except the two expiration integers.

use serde::{Deserialize, Serialize};

/// Directory entry keyed by callsign
///
/// Serialized with capitalized field names (`Callsign`, `LastName`, ...)
/// because that is the JSON shape published by the lookup endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Member {
    pub callsign: String,
    pub last_name: String,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub league: String,
    pub home_repeater: String,
    /// Date-ish text exactly as it appears in the roster (not validated)
    pub date_joined: String,
    pub member_type: String,
    pub status: String,
    /// Quarter of expiration, conceptually 1-4 (range not enforced)
    pub quarter_expiring: i64,
    pub year_expiring: i64,
}

impl Member {
    /// Create an otherwise empty member with a normalized callsign
    pub fn with_callsign(callsign: &str) -> Self {
        Self {
            callsign: normalize_callsign(callsign),
            ..Default::default()
        }
    }
}

/// Normalize a callsign into its primary-key form (trimmed, uppercased)
///
/// Used by both the importer and the lookup path so `" w1abc "` and
/// `"W1ABC"` address the same record.
pub fn normalize_callsign(raw: &str) -> String {
    raw.trim().to_uppercase()
}
