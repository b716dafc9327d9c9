use serde::{Deserialize, Serialize};

use crate::device::constants::{DEVICE_SOURCE_MANUAL, DEVICE_SOURCE_SCALE};
use crate::device::measurement::DerivedMeasurement;
use crate::device::types::DeviceInfo;
use crate::weighin::form::{WeighinField, WeighinFormValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Scale,
    Manual,
}

impl EntrySource {
    pub fn device_marker(self) -> u8 {
        match self {
            EntrySource::Scale => DEVICE_SOURCE_SCALE,
            EntrySource::Manual => DEVICE_SOURCE_MANUAL,
        }
    }
}

/// Where a submitted weigh-in came from, with the scale readings when it was measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeighinOrigin<'a> {
    Scale {
        measurement: &'a DerivedMeasurement,
        device: Option<&'a DeviceInfo>,
    },
    Manual,
}

impl WeighinOrigin<'_> {
    pub fn source(&self) -> EntrySource {
        match self {
            WeighinOrigin::Scale { .. } => EntrySource::Scale,
            WeighinOrigin::Manual => EntrySource::Manual,
        }
    }
}

/// The payload sent to the backend. Absent values are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeighinRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visceral_fat: Option<f64>,
    pub external_device_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basal_metabolic_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_free_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_water_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_details: Option<DeviceInfo>,
}

// Blank and "0" entries are dropped: a zero would break unit conversions on the server.
fn form_number(value: &str) -> Option<f64> {
    if value.is_empty() || value == "0" {
        return None;
    }
    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn non_zero(value: f64) -> Option<f64> {
    Some(value).filter(|value| *value != 0.0 && value.is_finite())
}

impl WeighinRecord {
    fn set(&mut self, field: WeighinField, value: Option<f64>) {
        match field {
            WeighinField::CurrentWeight => self.current_weight = value,
            WeighinField::BodyFat => self.body_fat = value,
            WeighinField::FatMass => self.fat_mass = value,
            WeighinField::MuscleMass => self.muscle_mass = value,
            WeighinField::VisceralFat => self.visceral_fat = value,
        }
    }

    /// Shapes validated form values into a record.
    pub fn from_form(values: &WeighinFormValues, origin: WeighinOrigin<'_>) -> WeighinRecord {
        let mut record = WeighinRecord {
            external_device_id: origin.source().device_marker(),
            ..WeighinRecord::default()
        };

        for (field, value) in values.entries() {
            record.set(field, form_number(value));
        }

        if let WeighinOrigin::Scale { measurement, device } = origin {
            record.fat_mass = None;
            record.basal_metabolic_rate = non_zero(measurement.basal_metabolic_rate);
            record.fat_free_mass = non_zero(measurement.fat_free_mass);
            record.body_water_percent = non_zero(measurement.water_percentage);
            record.device_details = device.cloned();
        }

        record
    }
}
