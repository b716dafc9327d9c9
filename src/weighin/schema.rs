use crate::error::{FieldError, ValidationErrors};
use crate::weighin::form::{WeighinField, WeighinFormValues};

/// Digits, optionally followed by a dot and one or two more digits.
pub fn is_decimal_with_two_places(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());

    digits(whole) && fraction.map_or(true, |fraction| digits(fraction) && fraction.len() <= 2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: WeighinField,
    pub required: bool,
    pub min: f64,
    pub max: f64,
    pub required_message: &'static str,
    pub format_message: &'static str,
    pub range_message: &'static str,
}

impl FieldRule {
    pub fn check(&self, value: &str) -> Result<(), FieldError> {
        let fail = |message: &str| Err(FieldError { field: self.field, message: message.to_string() });

        if value.is_empty() {
            return if self.required { fail(self.required_message) } else { Ok(()) };
        }

        if !is_decimal_with_two_places(value) {
            return fail(self.format_message);
        }

        match value.parse::<f64>() {
            Ok(number) if number >= self.min && number <= self.max => Ok(()),
            _ => fail(self.range_message),
        }
    }
}

fn rules() -> Vec<FieldRule> {
    vec![
        FieldRule {
            field: WeighinField::CurrentWeight,
            required: true,
            min: 50.0,
            max: 1000.0,
            required_message: "Weight is required",
            format_message: "Weight must be a number with up to 2 decimal places",
            range_message: "Weight must be between 50 and 1000 lbs",
        },
        FieldRule {
            field: WeighinField::BodyFat,
            required: false,
            min: 2.0,
            max: 90.0,
            required_message: "Body fat is required",
            format_message: "Body fat must be a number with up to 2 decimal places",
            range_message: "Body fat must be between 2% and 90%",
        },
        FieldRule {
            field: WeighinField::FatMass,
            required: false,
            min: 5.0,
            max: 1000.0,
            required_message: "Fat mass is required",
            format_message: "Fat mass must be a number with up to 2 decimal places",
            range_message: "Fat mass must be between 5 and 1000 lbs",
        },
        FieldRule {
            field: WeighinField::MuscleMass,
            required: false,
            min: 25.0,
            max: 1000.0,
            required_message: "Muscle mass is required",
            format_message: "Muscle mass must be a number with up to 2 decimal places",
            range_message: "Muscle mass must be between 25 and 1000 lbs",
        },
        FieldRule {
            field: WeighinField::VisceralFat,
            required: false,
            min: 1.0,
            max: 100.0,
            required_message: "Visceral fat is required",
            format_message: "Visceral fat must be a number with up to 2 decimal places",
            range_message: "Visceral fat must be between 1 and 100",
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeighinSchema {
    rules: Vec<FieldRule>,
}

impl WeighinSchema {
    /// Validates all five fields.
    pub fn manual() -> Self {
        WeighinSchema { rules: rules() }
    }

    /// The scale does not report fat mass, so it is not validated.
    pub fn scale() -> Self {
        let rules = rules()
            .into_iter()
            .filter(|rule| rule.field != WeighinField::FatMass)
            .collect();
        WeighinSchema { rules }
    }

    pub fn covers(&self, field: WeighinField) -> bool {
        self.rules.iter().any(|rule| rule.field == field)
    }

    pub fn validate_field(&self, field: WeighinField, value: &str) -> Result<(), FieldError> {
        match self.rules.iter().find(|rule| rule.field == field) {
            Some(rule) => rule.check(value),
            None => Ok(()),
        }
    }

    pub fn validate(&self, values: &WeighinFormValues) -> Result<(), ValidationErrors> {
        let errors = ValidationErrors {
            errors: self.rules
                .iter()
                .filter_map(|rule| rule.check(values.get(rule.field)).err())
                .collect(),
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_format() {
        for valid in ["0", "150", "150.5", "1000.00", "007.10"] {
            assert!(is_decimal_with_two_places(valid), "{}", valid);
        }
        for invalid in ["", ".5", "150.", "1000.001", "1e3", "-5", "+5", " 150", "15 0", "١٥٠", "150.5.5"] {
            assert!(!is_decimal_with_two_places(invalid), "{}", invalid);
        }
    }

    #[test]
    fn current_weight_rules() {
        let schema = WeighinSchema::manual();
        let check = |value: &str| schema.validate_field(WeighinField::CurrentWeight, value);

        assert!(check("1000.00").is_ok());
        assert!(check("50").is_ok());
        assert_eq!(check("1000.001").unwrap_err().message, "Weight must be a number with up to 2 decimal places");
        assert_eq!(check("49.99").unwrap_err().message, "Weight must be between 50 and 1000 lbs");
        assert_eq!(check("1000.01").unwrap_err().message, "Weight must be between 50 and 1000 lbs");
        assert_eq!(check("").unwrap_err().message, "Weight is required");
    }

    #[test]
    fn optional_fields_accept_empty() {
        let schema = WeighinSchema::manual();
        for field in [WeighinField::BodyFat, WeighinField::FatMass, WeighinField::MuscleMass, WeighinField::VisceralFat] {
            assert!(schema.validate_field(field, "").is_ok(), "{}", field);
        }
    }

    #[test]
    fn optional_field_ranges() {
        let schema = WeighinSchema::manual();

        assert!(schema.validate_field(WeighinField::BodyFat, "2").is_ok());
        assert!(schema.validate_field(WeighinField::BodyFat, "90").is_ok());
        assert!(schema.validate_field(WeighinField::BodyFat, "1.99").is_err());
        assert!(schema.validate_field(WeighinField::BodyFat, "90.01").is_err());
        assert!(schema.validate_field(WeighinField::FatMass, "4.99").is_err());
        assert!(schema.validate_field(WeighinField::MuscleMass, "24").is_err());
        assert!(schema.validate_field(WeighinField::VisceralFat, "0").is_err());
        assert!(schema.validate_field(WeighinField::VisceralFat, "100").is_ok());
        assert_eq!(
            schema.validate_field(WeighinField::VisceralFat, "101").unwrap_err().message,
            "Visceral fat must be between 1 and 100",
        );
    }

    #[test]
    fn scale_schema_ignores_fat_mass() {
        let schema = WeighinSchema::scale();
        assert!(!schema.covers(WeighinField::FatMass));
        assert!(schema.validate_field(WeighinField::FatMass, "not a number").is_ok());

        let values = WeighinFormValues {
            current_weight: "154.3".to_string(),
            fat_mass: "1".to_string(),
            ..WeighinFormValues::default()
        };
        assert!(schema.validate(&values).is_ok());
        assert!(WeighinSchema::manual().validate(&values).is_err());
    }

    #[test]
    fn collects_every_failing_field() {
        let values = WeighinFormValues {
            current_weight: String::new(),
            body_fat: "95".to_string(),
            fat_mass: String::new(),
            muscle_mass: "30".to_string(),
            visceral_fat: "1.234".to_string(),
        };

        let errors = WeighinSchema::manual().validate(&values).unwrap_err();

        assert_eq!(errors.errors.len(), 3);
        assert!(errors.for_field(WeighinField::CurrentWeight).is_some());
        assert!(errors.for_field(WeighinField::BodyFat).is_some());
        assert!(errors.for_field(WeighinField::VisceralFat).is_some());
        assert!(errors.for_field(WeighinField::MuscleMass).is_none());
    }
}
