use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{ExerciseCatalog, FoodCatalog, ReferenceData};
use crate::error::HealthXaiError;
use crate::explain::factors;
use crate::logging::LogConfig;
use crate::models::{
    ActivityLevel, FeatureWeights, FitnessGoal, HealthProfile, MealSlot, WorkoutSplit,
};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Logging setup for the CLI
    #[serde(default)]
    pub logging: LogConfig,

    /// Lookup tables and tunables of the recommendation engines
    #[serde(default)]
    pub engine: EngineConfig,

    /// Optional catalog files replacing the built-in catalogs
    #[serde(default)]
    pub catalogs: CatalogSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Catalog file overrides (JSON or TOML, chosen by extension)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub food_catalog: Option<PathBuf>,
    pub exercise_catalog: Option<PathBuf>,
}

/// Value per activity level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityTable<T> {
    pub sedentary: T,
    pub light: T,
    pub moderate: T,
    pub very: T,
    pub extra: T,
}

impl<T: Copy> ActivityTable<T> {
    pub fn get(&self, level: ActivityLevel) -> T {
        match level {
            ActivityLevel::Sedentary => self.sedentary,
            ActivityLevel::Light => self.light,
            ActivityLevel::Moderate => self.moderate,
            ActivityLevel::Very => self.very,
            ActivityLevel::Extra => self.extra,
        }
    }
}

/// Value per fitness goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalTable<T> {
    pub weight_loss: T,
    pub muscle_gain: T,
    pub maintenance: T,
    pub endurance: T,
}

impl<T: Copy> GoalTable<T> {
    pub fn get(&self, goal: FitnessGoal) -> T {
        match goal {
            FitnessGoal::WeightLoss => self.weight_loss,
            FitnessGoal::MuscleGain => self.muscle_gain,
            FitnessGoal::Maintenance => self.maintenance,
            FitnessGoal::Endurance => self.endurance,
        }
    }
}

/// Fractions of daily energy from each macronutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroRatio {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroRatio {
    pub fn total(&self) -> f64 {
        self.protein + self.carbs + self.fat
    }
}

/// Fraction of the daily calorie target served at each meal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealShares {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub snack: f64,
}

impl MealShares {
    pub fn get(&self, slot: MealSlot) -> f64 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
            MealSlot::Snack => self.snack,
        }
    }

    pub fn total(&self) -> f64 {
        self.breakfast + self.lunch + self.dinner + self.snack
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietSettings {
    /// Lowest daily calorie target the engine will recommend
    pub min_daily_calories: f64,

    pub meal_shares: MealShares,

    /// Accepted relative energy error per meal
    pub meal_tolerance: f64,

    /// Serving increment used by the meal assembler
    pub serving_step: f64,

    /// Maximum servings of one food in one meal
    pub max_servings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSettings {
    pub exercises_per_session: u32,

    /// Shortest block assigned to a single exercise
    pub min_exercise_minutes: u32,

    /// BMI at or above which high-impact exercises are excluded
    pub low_impact_bmi: f64,

    /// Age at or above which high-impact exercises are excluded
    pub low_impact_age: u32,
}

/// Fixed feature-importance weights used by the rule-based explainer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub fitness_goal: f64,
    pub activity_level: f64,
    pub bmi: f64,
    pub age: f64,
    pub current_fitness: f64,
}

impl BaseWeights {
    pub fn to_weights(&self) -> FeatureWeights {
        [
            (factors::FITNESS_GOAL, self.fitness_goal),
            (factors::ACTIVITY_LEVEL, self.activity_level),
            (factors::BMI, self.bmi),
            (factors::AGE, self.age),
            (factors::CURRENT_FITNESS, self.current_fitness),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect()
    }

    pub fn total(&self) -> f64 {
        self.fitness_goal + self.activity_level + self.bmi + self.age + self.current_fitness
    }
}

/// Additive confidence adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    pub base: f64,
    pub restrictions_bonus: f64,
    pub goals_bonus: f64,
    /// Applied when a sex-specific BMR formula was used
    pub sex_specific_bonus: f64,
    pub extreme_bmi_penalty: f64,
    pub extreme_bmi_low: f64,
    pub extreme_bmi_high: f64,
    pub age_penalty: f64,
    pub reliable_age_min: u32,
    pub reliable_age_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSettings {
    pub base_weights: BaseWeights,
    pub confidence: ConfidenceSettings,
}

/// Read-only lookup tables shared by every engine call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TDEE multiplier per activity level
    pub activity_multipliers: ActivityTable<f64>,

    /// Workout sessions per week per activity level
    pub weekly_frequency: ActivityTable<u32>,

    /// Daily calorie adjustment per goal (kcal)
    pub calorie_adjustments: GoalTable<f64>,

    pub macro_ratios: GoalTable<MacroRatio>,

    pub workout_splits: GoalTable<WorkoutSplit>,

    /// Weekly training minutes per goal
    pub weekly_minutes: GoalTable<u32>,

    pub diet: DietSettings,

    pub exercise: ExerciseSettings,

    pub explanation: ExplanationSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            activity_multipliers: ActivityTable {
                sedentary: 1.2,
                light: 1.375,
                moderate: 1.55,
                very: 1.725,
                extra: 1.9,
            },
            weekly_frequency: ActivityTable {
                sedentary: 3,
                light: 4,
                moderate: 4,
                very: 5,
                extra: 6,
            },
            calorie_adjustments: GoalTable {
                weight_loss: -500.0,
                muscle_gain: 350.0,
                maintenance: 0.0,
                endurance: 100.0,
            },
            macro_ratios: GoalTable {
                weight_loss: MacroRatio { protein: 0.35, carbs: 0.40, fat: 0.25 },
                muscle_gain: MacroRatio { protein: 0.30, carbs: 0.45, fat: 0.25 },
                maintenance: MacroRatio { protein: 0.25, carbs: 0.50, fat: 0.25 },
                endurance: MacroRatio { protein: 0.20, carbs: 0.55, fat: 0.25 },
            },
            workout_splits: GoalTable {
                weight_loss: WorkoutSplit { cardio: 0.60, strength: 0.30, flexibility: 0.10 },
                muscle_gain: WorkoutSplit { cardio: 0.20, strength: 0.70, flexibility: 0.10 },
                maintenance: WorkoutSplit { cardio: 0.40, strength: 0.40, flexibility: 0.20 },
                endurance: WorkoutSplit { cardio: 0.70, strength: 0.15, flexibility: 0.15 },
            },
            weekly_minutes: GoalTable {
                weight_loss: 300,
                muscle_gain: 240,
                maintenance: 180,
                endurance: 330,
            },
            diet: DietSettings {
                min_daily_calories: 1200.0,
                meal_shares: MealShares {
                    breakfast: 0.25,
                    lunch: 0.35,
                    dinner: 0.30,
                    snack: 0.10,
                },
                meal_tolerance: 0.10,
                serving_step: 0.25,
                max_servings: 4.0,
            },
            exercise: ExerciseSettings {
                exercises_per_session: 3,
                min_exercise_minutes: 5,
                low_impact_bmi: 35.0,
                low_impact_age: 65,
            },
            explanation: ExplanationSettings {
                base_weights: BaseWeights {
                    fitness_goal: 0.40,
                    activity_level: 0.25,
                    bmi: 0.15,
                    age: 0.10,
                    current_fitness: 0.10,
                },
                confidence: ConfidenceSettings {
                    base: 0.70,
                    restrictions_bonus: 0.10,
                    goals_bonus: 0.05,
                    sex_specific_bonus: 0.05,
                    extreme_bmi_penalty: 0.15,
                    extreme_bmi_low: 16.0,
                    extreme_bmi_high: 40.0,
                    age_penalty: 0.05,
                    reliable_age_min: 18,
                    reliable_age_max: 80,
                },
            },
        }
    }
}

const SUM_TOLERANCE: f64 = 1e-6;

impl EngineConfig {
    /// Check the invariants the engines rely on
    pub fn validate(&self) -> Result<(), HealthXaiError> {
        for level in ActivityLevel::ALL {
            let multiplier = self.activity_multipliers.get(level);
            if !(multiplier > 0.0) {
                return Err(HealthXaiError::Configuration(format!(
                    "activity multiplier for {} must be positive, got {}",
                    level, multiplier
                )));
            }
            let frequency = self.weekly_frequency.get(level);
            if !(1..=7).contains(&frequency) {
                return Err(HealthXaiError::Configuration(format!(
                    "weekly frequency for {} must be 1-7, got {}",
                    level, frequency
                )));
            }
        }

        for goal in FitnessGoal::ALL {
            let ratio = self.macro_ratios.get(goal);
            if (ratio.total() - 1.0).abs() > SUM_TOLERANCE
                || ratio.protein < 0.0
                || ratio.carbs < 0.0
                || ratio.fat < 0.0
            {
                return Err(HealthXaiError::Configuration(format!(
                    "macro ratios for {} must be non-negative and sum to 1, got {:.3}",
                    goal,
                    ratio.total()
                )));
            }

            let split = self.workout_splits.get(goal);
            if (split.total() - 1.0).abs() > SUM_TOLERANCE
                || split.cardio < 0.0
                || split.strength < 0.0
                || split.flexibility < 0.0
            {
                return Err(HealthXaiError::Configuration(format!(
                    "workout split for {} must be non-negative and sum to 1, got {:.3}",
                    goal,
                    split.total()
                )));
            }
        }

        if (self.diet.meal_shares.total() - 1.0).abs() > SUM_TOLERANCE {
            return Err(HealthXaiError::Configuration(format!(
                "meal shares must sum to 1, got {:.3}",
                self.diet.meal_shares.total()
            )));
        }
        if !(self.diet.serving_step > 0.0) || self.diet.max_servings < self.diet.serving_step {
            return Err(HealthXaiError::Configuration(
                "serving step must be positive and not exceed max servings".to_string(),
            ));
        }
        if !(self.diet.min_daily_calories > 0.0) {
            return Err(HealthXaiError::Configuration(
                "minimum daily calories must be positive".to_string(),
            ));
        }
        if self.exercise.exercises_per_session == 0 {
            return Err(HealthXaiError::Configuration(
                "exercises per session must be at least 1".to_string(),
            ));
        }
        if (self.explanation.base_weights.total() - 1.0).abs() > SUM_TOLERANCE {
            return Err(HealthXaiError::Configuration(format!(
                "base feature weights must sum to 1, got {:.3}",
                self.explanation.base_weights.total()
            )));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            logging: LogConfig::default(),
            engine: EngineConfig::default(),
            catalogs: CatalogSettings::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.engine.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".healthxai")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => {
                eprintln!("Config file not found, using defaults: {}", config_path.display());
                Self::default()
            }
        }
    }

    /// Build the shared reference data, reading catalog overrides if configured
    pub fn load_reference_data(&self) -> Result<Arc<ReferenceData>> {
        let foods = match &self.catalogs.food_catalog {
            Some(path) => load_structured::<FoodCatalog>(path)
                .with_context(|| format!("Failed to load food catalog: {}", path.display()))?,
            None => FoodCatalog::builtin(),
        };

        let exercises = match &self.catalogs.exercise_catalog {
            Some(path) => load_structured::<ExerciseCatalog>(path)
                .with_context(|| format!("Failed to load exercise catalog: {}", path.display()))?,
            None => ExerciseCatalog::builtin(),
        };

        let reference = ReferenceData::new(self.engine.clone(), foods, exercises)?;
        Ok(Arc::new(reference))
    }
}

/// Load a health profile from a JSON or TOML file
pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<HealthProfile> {
    let profile: HealthProfile = load_structured(path.as_ref())
        .with_context(|| format!("Failed to load profile: {}", path.as_ref().display()))?;
    profile.validate()?;
    Ok(profile)
}

/// Deserialize a file as TOML when it has a `.toml` extension, JSON otherwise
fn load_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&content).with_context(|| "Failed to parse TOML")
    } else {
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON")
    }
}
