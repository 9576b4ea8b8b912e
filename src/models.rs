use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Youngest age the metabolic formulas accept
pub const MIN_AGE: u32 = 1;

/// Oldest age the metabolic formulas accept
pub const MAX_AGE: u32 = 120;

/// Gender used to pick the BMR formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Other or unspecified; BMR uses the average of the male and female formulas
    #[serde(alias = "unspecified")]
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Ok(Gender::Male),
            "female" | "f" | "woman" => Ok(Gender::Female),
            "other" | "unspecified" | "non-binary" | "nonbinary" | "x" => Ok(Gender::Other),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

/// Habitual activity level, used for the TDEE multiplier and workout frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    #[serde(alias = "lightly_active")]
    Light,
    /// Moderate exercise 3-5 days/week
    #[serde(alias = "moderately_active")]
    Moderate,
    /// Hard exercise 6-7 days/week
    #[serde(alias = "very_active")]
    Very,
    /// Physical job or training twice a day
    #[serde(alias = "extra_active")]
    Extra,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Very,
        ActivityLevel::Extra,
    ];

    /// Next more active level, if any
    pub fn step_up(&self) -> Option<ActivityLevel> {
        let idx = Self::ALL.iter().position(|l| l == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// Next less active level, if any
    pub fn step_down(&self) -> Option<ActivityLevel> {
        let idx = Self::ALL.iter().position(|l| l == self)?;
        idx.checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" | "lightly_active" => Ok(ActivityLevel::Light),
            "moderate" | "moderately_active" => Ok(ActivityLevel::Moderate),
            "very" | "very_active" => Ok(ActivityLevel::Very),
            "extra" | "extra_active" => Ok(ActivityLevel::Extra),
            _ => Err(format!("Invalid activity level: {}", s)),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityLevel::Sedentary => write!(f, "sedentary"),
            ActivityLevel::Light => write!(f, "lightly active"),
            ActivityLevel::Moderate => write!(f, "moderately active"),
            ActivityLevel::Very => write!(f, "very active"),
            ActivityLevel::Extra => write!(f, "extra active"),
        }
    }
}

/// Fitness goals a profile can pursue, possibly several at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Maintenance,
    Endurance,
}

impl FitnessGoal {
    pub const ALL: [FitnessGoal; 4] = [
        FitnessGoal::WeightLoss,
        FitnessGoal::MuscleGain,
        FitnessGoal::Maintenance,
        FitnessGoal::Endurance,
    ];
}

impl FromStr for FitnessGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "weight_loss" | "lose_weight" | "fat_loss" => Ok(FitnessGoal::WeightLoss),
            "muscle_gain" | "gain_muscle" | "build_muscle" => Ok(FitnessGoal::MuscleGain),
            "maintenance" | "maintain" => Ok(FitnessGoal::Maintenance),
            "endurance" => Ok(FitnessGoal::Endurance),
            _ => Err(format!("Invalid fitness goal: {}", s)),
        }
    }
}

impl fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessGoal::WeightLoss => write!(f, "weight loss"),
            FitnessGoal::MuscleGain => write!(f, "muscle gain"),
            FitnessGoal::Maintenance => write!(f, "maintenance"),
            FitnessGoal::Endurance => write!(f, "endurance"),
        }
    }
}

/// User health profile, the only input of a recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    /// Age in years (1-120)
    pub age: u32,

    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Height in centimeters
    pub height_cm: f64,

    pub gender: Gender,

    pub activity_level: ActivityLevel,

    /// Goals being pursued; empty means maintenance
    #[serde(default)]
    pub fitness_goal: BTreeSet<FitnessGoal>,

    /// Free-form restrictions matched against food tags (e.g. "vegan", "nuts")
    #[serde(default)]
    pub dietary_restrictions: BTreeSet<String>,
}

impl HealthProfile {
    pub fn new(
        age: u32,
        weight_kg: f64,
        height_cm: f64,
        gender: Gender,
        activity_level: ActivityLevel,
    ) -> Self {
        Self {
            age,
            weight_kg,
            height_cm,
            gender,
            activity_level,
            fitness_goal: BTreeSet::new(),
            dietary_restrictions: BTreeSet::new(),
        }
    }

    pub fn with_goal(mut self, goal: FitnessGoal) -> Self {
        self.fitness_goal.insert(goal);
        self
    }

    pub fn with_restriction(mut self, restriction: impl Into<String>) -> Self {
        self.dietary_restrictions.insert(restriction.into());
        self
    }

    /// Check the ranges the metabolic formulas are defined for
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ValidationError::AgeOutOfRange { age: self.age });
        }
        if !self.weight_kg.is_finite() {
            return Err(ValidationError::NonFinite { field: "weight_kg" });
        }
        if !(self.weight_kg > 0.0) {
            return Err(ValidationError::NonPositiveWeight { weight_kg: self.weight_kg });
        }
        if !self.height_cm.is_finite() {
            return Err(ValidationError::NonFinite { field: "height_cm" });
        }
        if !(self.height_cm > 0.0) {
            return Err(ValidationError::NonPositiveHeight { height_cm: self.height_cm });
        }
        Ok(())
    }

    pub fn height_m(&self) -> f64 {
        self.height_cm / 100.0
    }

    /// Goals the engines act on: the declared set, or maintenance when none is declared
    pub fn effective_goals(&self) -> Vec<FitnessGoal> {
        if self.fitness_goal.is_empty() {
            vec![FitnessGoal::Maintenance]
        } else {
            self.fitness_goal.iter().copied().collect()
        }
    }

    /// Build a new validated profile with the update applied; `self` is left untouched
    pub fn apply_update(&self, update: &ProfileUpdate) -> Result<HealthProfile, ValidationError> {
        let mut updated = self.clone();
        if let Some(age) = update.age {
            updated.age = age;
        }
        if let Some(weight_kg) = update.weight_kg {
            updated.weight_kg = weight_kg;
        }
        if let Some(height_cm) = update.height_cm {
            updated.height_cm = height_cm;
        }
        if let Some(gender) = update.gender {
            updated.gender = gender;
        }
        if let Some(activity_level) = update.activity_level {
            updated.activity_level = activity_level;
        }
        if let Some(goals) = &update.fitness_goal {
            updated.fitness_goal = goals.clone();
        }
        if let Some(restrictions) = &update.dietary_restrictions {
            updated.dietary_restrictions = restrictions.clone();
        }
        updated.validate()?;
        Ok(updated)
    }
}

/// Partial profile change; absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub age: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub fitness_goal: Option<BTreeSet<FitnessGoal>>,
    pub dietary_restrictions: Option<BTreeSet<String>>,
}

/// WHO adult BMI categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    /// BMI below 18.5
    Underweight,
    /// BMI 18.5 to 25
    Normal,
    /// BMI 25 to 30
    Overweight,
    /// BMI 30 and above
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "underweight"),
            BmiCategory::Normal => write!(f, "normal weight"),
            BmiCategory::Overweight => write!(f, "overweight"),
            BmiCategory::Obese => write!(f, "obese"),
        }
    }
}

/// Body metrics derived from a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Body Mass Index (kg/m²)
    pub bmi: f64,

    /// Basal Metabolic Rate in kcal/day
    pub bmr: f64,

    /// Total Daily Energy Expenditure in kcal/day
    pub tdee: f64,

    pub bmi_category: BmiCategory,
}

/// Daily macronutrient targets in grams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fats_g: u32,
}

impl Macros {
    /// Energy of the macros using 4/4/9 kcal per gram
    pub fn calories(&self) -> u64 {
        (self.protein_g as u64 + self.carbs_g as u64) * 4 + self.fats_g as u64 * 9
    }
}

/// Meal slots of a day, in serving order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealSlot::Breakfast => write!(f, "breakfast"),
            MealSlot::Lunch => write!(f, "lunch"),
            MealSlot::Dinner => write!(f, "dinner"),
            MealSlot::Snack => write!(f, "snack"),
        }
    }
}

/// One food in a meal with its quantity and nutrients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub food: String,
    /// Number of catalog servings (multiples of a quarter)
    pub servings: f64,
    pub quantity_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealStatus {
    /// Assembled within the tolerance band
    Filled,
    /// The catalog could not reach the target; no items
    Unfilled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub slot: MealSlot,
    pub target_calories: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub items: Vec<MealItem>,
    pub status: MealStatus,
    pub note: Option<String>,
}

impl Meal {
    /// Empty placeholder for a meal the catalog could not fill
    pub fn unfilled(slot: MealSlot, target_calories: f64, note: impl Into<String>) -> Self {
        Self {
            slot,
            target_calories,
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fats_g: 0.0,
            items: Vec::new(),
            status: MealStatus::Unfilled,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub daily_calories: u32,
    pub macros: Macros,
    pub meals: Vec<Meal>,
    /// Averaged goal adjustment applied to TDEE (kcal)
    pub calorie_adjustment: f64,
    /// True when the target was raised to the safety floor
    pub calorie_floor_applied: bool,
    /// True when at least one meal is unfilled
    pub degraded: bool,
}

impl DietPlan {
    pub fn unfilled_meals(&self) -> impl Iterator<Item = &Meal> {
        self.meals.iter().filter(|m| m.status == MealStatus::Unfilled)
    }
}

/// Exercise categories of a workout split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Cardio,
    Strength,
    Flexibility,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 3] = [
        ExerciseCategory::Cardio,
        ExerciseCategory::Strength,
        ExerciseCategory::Flexibility,
    ];

    /// Category that receives this one's share when its pool is empty
    pub fn next(&self) -> ExerciseCategory {
        match self {
            ExerciseCategory::Cardio => ExerciseCategory::Strength,
            ExerciseCategory::Strength => ExerciseCategory::Flexibility,
            ExerciseCategory::Flexibility => ExerciseCategory::Cardio,
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseCategory::Cardio => write!(f, "cardio"),
            ExerciseCategory::Strength => write!(f, "strength"),
            ExerciseCategory::Flexibility => write!(f, "flexibility"),
        }
    }
}

/// Share of weekly training time per category (fractions summing to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSplit {
    pub cardio: f64,
    pub strength: f64,
    pub flexibility: f64,
}

impl WorkoutSplit {
    pub fn share(&self, category: ExerciseCategory) -> f64 {
        match category {
            ExerciseCategory::Cardio => self.cardio,
            ExerciseCategory::Strength => self.strength,
            ExerciseCategory::Flexibility => self.flexibility,
        }
    }

    pub fn set_share(&mut self, category: ExerciseCategory, share: f64) {
        match category {
            ExerciseCategory::Cardio => self.cardio = share,
            ExerciseCategory::Strength => self.strength = share,
            ExerciseCategory::Flexibility => self.flexibility = share,
        }
    }

    pub fn total(&self) -> f64 {
        self.cardio + self.strength + self.flexibility
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub name: String,
    pub category: ExerciseCategory,
    /// Metabolic Equivalent of Task
    pub met: f64,
    pub duration_minutes: u32,
    /// MET × weight_kg × hours, rounded to 0.1 kcal
    pub calories_burned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: Weekday,
    pub exercises: Vec<ExerciseEntry>,
}

impl WorkoutDay {
    pub fn total_minutes(&self) -> u32 {
        self.exercises.iter().map(|e| e.duration_minutes).sum()
    }

    pub fn calories_burned(&self) -> f64 {
        self.exercises.iter().map(|e| e.calories_burned).sum()
    }
}

/// Record of a category share moved because its exercise pool was empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySubstitution {
    pub missing: ExerciseCategory,
    /// None when no category had exercises left
    pub replacement: Option<ExerciseCategory>,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePlan {
    pub weekly_frequency: u32,
    pub split: WorkoutSplit,
    pub weekly_minutes: u32,
    pub workouts: Vec<WorkoutDay>,
    pub total_calories_burned_per_week: f64,
    pub substitutions: Vec<CategorySubstitution>,
    /// High-impact exercises were excluded for this profile
    pub low_impact_only: bool,
    pub degraded: bool,
}

/// Factor name to weight; weights are in [0,1] and sum to 1
pub type FeatureWeights = BTreeMap<String, f64>;

/// One narrative line of an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionFactor {
    pub factor: String,
    pub effect_description: String,
}

impl DecisionFactor {
    pub fn new(factor: impl Into<String>, effect_description: impl Into<String>) -> Self {
        Self {
            factor: factor.into(),
            effect_description: effect_description.into(),
        }
    }
}

/// Non-fatal degradation surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A meal could not be assembled from the allowed foods
    UnfilledMeal { meal: MealSlot, reason: String },
    /// A workout category had no exercises and its share moved elsewhere
    ExerciseSubstitution {
        missing: ExerciseCategory,
        replacement: Option<ExerciseCategory>,
        share: f64,
    },
    /// The statistical explainer failed; base weights were used instead
    ExplainerFallback { explainer: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub feature_importance: FeatureWeights,
    pub decision_factors: Vec<DecisionFactor>,
    pub confidence_score: f64,
    /// Name of the explainer whose weights were used
    pub explainer: String,
    pub degradations: Vec<Degradation>,
}

/// Complete result of one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub metrics: Metrics,
    pub diet_plan: DietPlan,
    pub exercise_plan: ExercisePlan,
    pub explanation: Explanation,
    pub created_at: DateTime<Utc>,
}

impl RecommendationBundle {
    /// True when any part of the bundle was degraded
    pub fn is_partial(&self) -> bool {
        !self.explanation.degradations.is_empty()
            || self.diet_plan.degraded
            || self.exercise_plan.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> HealthProfile {
        HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
            .with_goal(FitnessGoal::WeightLoss)
    }

    #[test]
    fn test_profile_validation() {
        assert!(sample_profile().validate().is_ok());

        let mut profile = sample_profile();
        profile.age = 0;
        assert_eq!(
            profile.validate(),
            Err(ValidationError::AgeOutOfRange { age: 0 })
        );

        profile.age = 121;
        assert!(profile.validate().is_err());

        let mut profile = sample_profile();
        profile.weight_kg = 0.0;
        assert!(matches!(
            profile.validate(),
            Err(ValidationError::NonPositiveWeight { .. })
        ));

        profile.weight_kg = f64::NAN;
        assert!(profile.validate().is_err());

        let mut profile = sample_profile();
        profile.height_cm = f64::INFINITY;
        assert_eq!(
            profile.validate(),
            Err(ValidationError::NonFinite { field: "height_cm" })
        );
    }

    #[test]
    fn test_boundary_ages_are_valid() {
        let mut profile = sample_profile();
        profile.age = MIN_AGE;
        assert!(profile.validate().is_ok());
        profile.age = MAX_AGE;
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_effective_goals_default_to_maintenance() {
        let profile = HealthProfile::new(40, 70.0, 170.0, Gender::Female, ActivityLevel::Light);
        assert_eq!(profile.effective_goals(), vec![FitnessGoal::Maintenance]);
        assert_eq!(sample_profile().effective_goals(), vec![FitnessGoal::WeightLoss]);
    }

    #[test]
    fn test_apply_update_returns_new_profile() {
        let profile = sample_profile();
        let update = ProfileUpdate {
            weight_kg: Some(80.0),
            activity_level: Some(ActivityLevel::Very),
            ..Default::default()
        };

        let updated = profile.apply_update(&update).unwrap();
        assert_eq!(updated.weight_kg, 80.0);
        assert_eq!(updated.activity_level, ActivityLevel::Very);
        assert_eq!(updated.age, 30);
        assert_eq!(profile.weight_kg, 85.0);

        let invalid = ProfileUpdate {
            height_cm: Some(-1.0),
            ..Default::default()
        };
        assert!(profile.apply_update(&invalid).is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("unspecified".parse::<Gender>().unwrap(), Gender::Other);
        assert_eq!(
            "lightly_active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::Light
        );
        assert_eq!(
            "Weight-Loss".parse::<FitnessGoal>().unwrap(),
            FitnessGoal::WeightLoss
        );
        assert!("couch".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for level in ActivityLevel::ALL {
            assert_eq!(level.to_string().parse::<ActivityLevel>(), Ok(level));
        }
        for goal in FitnessGoal::ALL {
            assert_eq!(goal.to_string().parse::<FitnessGoal>(), Ok(goal));
        }
    }

    #[test]
    fn test_activity_steps() {
        assert_eq!(ActivityLevel::Sedentary.step_down(), None);
        assert_eq!(ActivityLevel::Sedentary.step_up(), Some(ActivityLevel::Light));
        assert_eq!(ActivityLevel::Extra.step_up(), None);
        assert_eq!(ActivityLevel::Extra.step_down(), Some(ActivityLevel::Very));
    }

    #[test]
    fn test_bmi_category_thresholds() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_profile_deserialization_defaults() {
        let json = r#"{
            "age": 25,
            "weight_kg": 60.0,
            "height_cm": 165.0,
            "gender": "female",
            "activity_level": "lightly_active"
        }"#;
        let profile: HealthProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.activity_level, ActivityLevel::Light);
        assert!(profile.fitness_goal.is_empty());
        assert!(profile.dietary_restrictions.is_empty());
    }

    #[test]
    fn test_degradation_serialization_is_tagged() {
        let degradation = Degradation::UnfilledMeal {
            meal: MealSlot::Snack,
            reason: "no foods".to_string(),
        };
        let json = serde_json::to_string(&degradation).unwrap();
        assert!(json.contains("\"kind\":\"unfilled_meal\""));
        assert!(json.contains("\"meal\":\"snack\""));
    }
}
