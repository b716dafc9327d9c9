use std::fmt;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};

use crate::device::measurement::DerivedMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeighinField {
    CurrentWeight,
    BodyFat,
    FatMass,
    MuscleMass,
    VisceralFat,
}

impl WeighinField {
    pub fn all() -> Vec<WeighinField> {
        all::<WeighinField>().collect::<Vec<_>>()
    }

    pub fn key(&self) -> &'static str {
        match self {
            WeighinField::CurrentWeight => "current_weight",
            WeighinField::BodyFat => "body_fat",
            WeighinField::FatMass => "fat_mass",
            WeighinField::MuscleMass => "muscle_mass",
            WeighinField::VisceralFat => "visceral_fat",
        }
    }
}

impl fmt::Display for WeighinField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// What the user sees in the weigh-in form. Empty strings mean "not provided".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeighinFormValues {
    pub current_weight: String,
    pub body_fat: String,
    pub fat_mass: String,
    pub muscle_mass: String,
    pub visceral_fat: String,
}

// 0 and missing values leave the field empty, like a blank input
fn display_number(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return String::new();
    }
    format!("{}", value)
}

impl WeighinFormValues {
    /// Form defaults for a measurement, or an empty form without one.
    /// Fat mass is never prefilled from the scale.
    pub fn defaults(measurement: Option<&DerivedMeasurement>) -> WeighinFormValues {
        match measurement {
            None => WeighinFormValues::default(),
            Some(measurement) => WeighinFormValues {
                current_weight: format!("{}", measurement.current_weight),
                body_fat: display_number(measurement.body_fat),
                fat_mass: String::new(),
                muscle_mass: display_number(measurement.muscle_mass),
                visceral_fat: display_number(measurement.visceral_fat_tanita),
            },
        }
    }

    pub fn get(&self, field: WeighinField) -> &str {
        match field {
            WeighinField::CurrentWeight => &self.current_weight,
            WeighinField::BodyFat => &self.body_fat,
            WeighinField::FatMass => &self.fat_mass,
            WeighinField::MuscleMass => &self.muscle_mass,
            WeighinField::VisceralFat => &self.visceral_fat,
        }
    }

    pub fn set(&mut self, field: WeighinField, value: impl Into<String>) {
        let value = value.into();
        match field {
            WeighinField::CurrentWeight => self.current_weight = value,
            WeighinField::BodyFat => self.body_fat = value,
            WeighinField::FatMass => self.fat_mass = value,
            WeighinField::MuscleMass => self.muscle_mass = value,
            WeighinField::VisceralFat => self.visceral_fat = value,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (WeighinField, &str)> + '_ {
        WeighinField::all().into_iter().map(move |field| (field, self.get(field)))
    }
}

/// The form state: current values plus the defaults a reset returns to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeighinForm {
    values: WeighinFormValues,
    defaults: WeighinFormValues,
}

impl WeighinForm {
    pub fn new(defaults: WeighinFormValues) -> Self {
        WeighinForm {
            values: defaults.clone(),
            defaults,
        }
    }

    pub fn values(&self) -> &WeighinFormValues {
        &self.values
    }

    pub fn set(&mut self, field: WeighinField, value: impl Into<String>) {
        self.values.set(field, value);
    }

    pub fn reset(&mut self, defaults: WeighinFormValues) {
        self.values = defaults.clone();
        self.defaults = defaults;
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement() -> DerivedMeasurement {
        DerivedMeasurement {
            current_weight: 154.3,
            body_fat: 25.0,
            muscle_mass: 66.1,
            visceral_fat_tanita: 7.0,
            fat_mass: 38.6,
            ..DerivedMeasurement::default()
        }
    }

    #[test]
    fn empty_defaults_without_measurement() {
        let defaults = WeighinFormValues::defaults(None);
        assert!(defaults.entries().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn measurement_prefills_everything_but_fat_mass() {
        let defaults = WeighinFormValues::defaults(Some(&measurement()));

        assert_eq!(defaults, WeighinFormValues {
            current_weight: "154.3".to_string(),
            body_fat: "25".to_string(),
            fat_mass: String::new(),
            muscle_mass: "66.1".to_string(),
            visceral_fat: "7".to_string(),
        });
    }

    #[test]
    fn missing_composition_values_stay_empty() {
        let partial = DerivedMeasurement { current_weight: 150.0, ..DerivedMeasurement::default() };
        let defaults = WeighinFormValues::defaults(Some(&partial));

        assert_eq!(defaults.current_weight, "150");
        assert_eq!(defaults.body_fat, "");
        assert_eq!(defaults.muscle_mass, "");
        assert_eq!(defaults.visceral_fat, "");
    }

    #[test]
    fn reset_replaces_values_and_defaults() {
        let mut form = WeighinForm::default();
        form.set(WeighinField::FatMass, "40");
        assert!(form.is_dirty());

        form.reset(WeighinFormValues::defaults(Some(&measurement())));
        assert_eq!(form.values().fat_mass, "");
        assert_eq!(form.values().current_weight, "154.3");
        assert!(!form.is_dirty());
    }

    #[test]
    fn fields_have_stable_keys() {
        let keys: Vec<&str> = WeighinField::all().iter().map(WeighinField::key).collect();
        assert_eq!(keys, vec!["current_weight", "body_fat", "fat_mass", "muscle_mass", "visceral_fat"]);
    }
}
