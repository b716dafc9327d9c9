use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::types::UserProfile;
use crate::device::constants::{
    CENTIMETERS_PER_INCH, MESSAGE_INVALID_BIRTHDAY, MESSAGE_INVALID_HEIGHT, MESSAGE_PROFILE_INCOMPLETE, SCALE_UNIT_METRIC,
};
use crate::error::ScanError;

/// The user record the scale SDK needs to compute body composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleUser {
    pub birthday: String,
    pub gender: String,
    pub id: String,
    /// centimeters
    pub height: u32,
    pub unit: u8,
    pub athlete_type: u8,
}

fn profile_error(message: &str) -> ScanError {
    ScanError::ProfileIncomplete { message: message.to_string() }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn is_valid_birthday(birthday: &str) -> bool {
    NaiveDate::parse_from_str(birthday, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(birthday, "%m/%d/%Y").is_ok()
        || NaiveDateTime::parse_from_str(birthday, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || DateTime::parse_from_rfc3339(birthday).is_ok()
}

/// Converts a `feet_inches` height (`5_10`) to whole centimeters.
pub fn height_to_centimeters(height: &str) -> Option<u32> {
    let (feet, inches) = height.split_once('_')?;
    let feet: f64 = feet.trim().parse().ok()?;
    let inches: f64 = inches.trim().parse().ok()?;

    if !feet.is_finite() || !inches.is_finite() || feet < 0.0 || inches < 0.0 {
        return None;
    }

    let centimeters = ((feet * 12.0 + inches) * CENTIMETERS_PER_INCH).round();
    if centimeters < 1.0 || centimeters > u32::MAX as f64 {
        return None;
    }

    Some(centimeters as u32)
}

impl ScaleUser {
    pub fn from_profile(profile: Option<&UserProfile>) -> Result<ScaleUser, ScanError> {
        let profile = profile.ok_or_else(|| profile_error(MESSAGE_PROFILE_INCOMPLETE))?;

        let (height, gender, birthday) = match (
            non_blank(&profile.height),
            non_blank(&profile.gender),
            non_blank(&profile.birthday),
        ) {
            (Some(height), Some(gender), Some(birthday)) => (height, gender, birthday),
            _ => return Err(profile_error(MESSAGE_PROFILE_INCOMPLETE)),
        };

        if !is_valid_birthday(birthday) {
            return Err(profile_error(MESSAGE_INVALID_BIRTHDAY));
        }

        let height = height_to_centimeters(height).ok_or_else(|| profile_error(MESSAGE_INVALID_HEIGHT))?;

        Ok(ScaleUser {
            birthday: birthday.to_string(),
            gender: gender.to_lowercase(),
            id: profile.email.clone(),
            height,
            unit: SCALE_UNIT_METRIC,
            athlete_type: u8::from(profile.athlete_mode),
        })
    }
}
