use serde::{Deserialize, Serialize};

use crate::device::constants::GRAMS_PER_POUND;
use crate::device::types::RawMeasurement;
use crate::error::EventError;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn grams_to_pounds(grams: f64) -> f64 {
    round_to(grams / GRAMS_PER_POUND, 1)
}

/// Converts a ratio reported in hundredths of a percent (2500 => 25%) to a percentage.
pub fn unit_to_percentage(value: f64) -> f64 {
    round_to(value / 100.0, 2)
}

/// A final measurement converted to the units shown to the user: pounds and percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedMeasurement {
    pub current_weight: f64,
    pub body_fat: f64,
    pub muscle_mass: f64,
    pub visceral_fat_tanita: f64,
    pub basal_metabolic_rate: f64,
    pub fat_free_mass: f64,
    pub fat_mass: f64,
    pub skeletal_muscle_ratio: f64,
    pub water_percentage: f64,
}

impl DerivedMeasurement {
    pub fn from_raw(raw: &RawMeasurement) -> Result<DerivedMeasurement, EventError> {
        let current_weight = grams_to_pounds(raw.weight);
        let body_fat = unit_to_percentage(raw.body_fat);

        let derived = DerivedMeasurement {
            current_weight,
            body_fat,
            muscle_mass: grams_to_pounds(raw.muscle_mass),
            visceral_fat_tanita: raw.visceral_fat_tanita,
            basal_metabolic_rate: raw.basal_metabolic_rate,
            fat_free_mass: grams_to_pounds(raw.fat_free_mass),
            fat_mass: round_to(body_fat / 100.0 * current_weight, 1),
            skeletal_muscle_ratio: raw.skeletal_muscle_ratio,
            water_percentage: unit_to_percentage(raw.water_percentage),
        };

        derived.check_finite()?;
        Ok(derived)
    }

    fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("current_weight", self.current_weight),
            ("body_fat", self.body_fat),
            ("muscle_mass", self.muscle_mass),
            ("visceral_fat_tanita", self.visceral_fat_tanita),
            ("basal_metabolic_rate", self.basal_metabolic_rate),
            ("fat_free_mass", self.fat_free_mass),
            ("fat_mass", self.fat_mass),
            ("skeletal_muscle_ratio", self.skeletal_muscle_ratio),
            ("water_percentage", self.water_percentage),
        ]
    }

    fn check_finite(&self) -> Result<(), EventError> {
        match self.fields().iter().find(|(_, value)| !value.is_finite()) {
            Some((field, _)) => Err(EventError::NonFinite { field: *field }),
            None => Ok(()),
        }
    }

    /// True when the scale produced a weight but at least one of the body composition values
    /// shown on the form is missing, which usually means the user stepped off too early.
    pub fn is_weight_only(&self) -> bool {
        if self.current_weight == 0.0 {
            return false;
        }

        [self.body_fat, self.muscle_mass, self.visceral_fat_tanita]
            .iter()
            .any(|value| *value == 0.0)
    }
}
