//! Body metrics: BMI, BMR and TDEE

use crate::config::ActivityTable;
use crate::error::ValidationError;
use crate::models::{ActivityLevel, BmiCategory, Gender, HealthProfile, Metrics};

/// Pure metric calculator parameterized by the activity multiplier table
#[derive(Debug, Clone, Copy)]
pub struct MetricsCalculator<'a> {
    multipliers: &'a ActivityTable<f64>,
}

impl<'a> MetricsCalculator<'a> {
    pub fn new(multipliers: &'a ActivityTable<f64>) -> Self {
        Self { multipliers }
    }

    /// Body Mass Index
    /// BMI = weight_kg / height_m²
    pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
        let height_m = height_cm / 100.0;
        weight_kg / (height_m * height_m)
    }

    /// Basal Metabolic Rate using Mifflin-St Jeor
    /// BMR = 10×weight_kg + 6.25×height_cm − 5×age + s, s = +5 (male) / −161 (female)
    ///
    /// Other genders use the mean of both constants (−78).
    pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> f64 {
        let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
        let sex_constant = match gender {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
            Gender::Other => (5.0 - 161.0) / 2.0,
        };
        base + sex_constant
    }

    /// Total Daily Energy Expenditure
    /// TDEE = BMR × activity multiplier
    pub fn tdee(&self, bmr: f64, activity_level: ActivityLevel) -> f64 {
        bmr * self.multipliers.get(activity_level)
    }

    /// Validate the profile and derive all metrics from it
    ///
    /// Inputs that are individually valid can still combine into a
    /// non-finite BMI, BMR or TDEE; such profiles are rejected as well.
    pub fn calculate(&self, profile: &HealthProfile) -> Result<Metrics, ValidationError> {
        profile.validate()?;
        let metrics = self.calculate_unchecked(profile);

        for (metric, value) in [
            ("bmi", metrics.bmi),
            ("bmr", metrics.bmr),
            ("tdee", metrics.tdee),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::MetricOutOfRange { metric, value });
            }
        }

        Ok(metrics)
    }

    /// Metrics for a profile already known to be valid
    pub(crate) fn calculate_unchecked(&self, profile: &HealthProfile) -> Metrics {
        let bmi = Self::bmi(profile.weight_kg, profile.height_cm);
        let bmr = Self::bmr(profile.weight_kg, profile.height_cm, profile.age, profile.gender);
        let tdee = self.tdee(bmr, profile.activity_level);

        Metrics {
            bmi,
            bmr,
            tdee,
            bmi_category: BmiCategory::from_bmi(bmi),
        }
    }
}
