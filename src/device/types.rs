use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::constants::{
    STATE_BODY_FAT, STATE_CONNECTED, STATE_CONNECTING, STATE_DISCONNECTED, STATE_LINK_LOSS, STATE_MEASURE_COMPLETED,
    STATE_REAL_TIME, STATE_START_MEASURE,
};
use crate::error::EventError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Disconnected,
    Connecting,
    Connected,
    Measuring,
    Complete,
}

impl DeviceStatus {
    /// Maps a vendor state code onto a status. Codes without a meaning for the weigh-in flow
    /// (disconnecting, heart rate, wifi provisioning, ...) map to `None`.
    pub fn from_state_code(code: i32) -> Option<DeviceStatus> {
        match code {
            STATE_MEASURE_COMPLETED => Some(DeviceStatus::Complete),
            STATE_DISCONNECTED | STATE_LINK_LOSS => Some(DeviceStatus::Disconnected),
            STATE_CONNECTING => Some(DeviceStatus::Connecting),
            STATE_CONNECTED | STATE_REAL_TIME => Some(DeviceStatus::Connected),
            STATE_START_MEASURE | STATE_BODY_FAT => Some(DeviceStatus::Measuring),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            DeviceStatus::Disconnected => "Disconnected",
            DeviceStatus::Connecting => "Connecting",
            DeviceStatus::Connected => "Connected",
            DeviceStatus::Measuring => "Measuring",
            DeviceStatus::Complete => "Complete",
        };

        write!(f, "{}", result)
    }
}

/// Metadata of the paired scale, kept exactly as the SDK reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceInfo(pub Value);

impl DeviceInfo {
    pub fn mac(&self) -> Option<&str> {
        self.0.get("mac").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }
}

/// A final measurement in device units: masses in grams, ratios in hundredths of a percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMeasurement {
    pub weight: f64,
    pub body_fat: f64,
    pub muscle_mass: f64,
    pub fat_free_mass: f64,
    pub visceral_fat_tanita: f64,
    pub skeletal_muscle_ratio: f64,
    pub water_percentage: f64,
    pub basal_metabolic_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleEvent {
    ScaleStateChange(i32),
    FinalMeasurementEvent(RawMeasurement),
    DeviceInfo(DeviceInfo),
}

const KNOWN_EVENT_TYPES: [&str; 3] = ["SCALE_STATE_CHANGE", "FINAL_MEASUREMENT_EVENT", "DEVICE_INFO"];

impl ScaleEvent {
    /// Decodes an event payload as delivered by the SDK bridge.
    /// Payloads with a type this crate does not handle decode to `Ok(None)`.
    pub fn from_payload(payload: Value) -> Result<Option<ScaleEvent>, EventError> {
        let known = payload
            .get("type")
            .and_then(Value::as_str)
            .map(|kind| KNOWN_EVENT_TYPES.contains(&kind));

        match known {
            Some(true) => Ok(Some(serde_json::from_value(payload)?)),
            Some(false) => Ok(None),
            None => Err(EventError::MissingType),
        }
    }

    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
