//! Food and exercise catalogs plus the shared read-only reference data

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::EngineConfig;
use crate::error::HealthXaiError;
use crate::models::{ExerciseCategory, MealSlot};

/// One catalog food, described per serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub serving_g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    /// Meals this food is offered at
    pub slots: Vec<MealSlot>,
    /// Lowercase tags matched against dietary restrictions
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FoodItem {
    /// Energy per serving using 4/4/9 kcal per gram
    pub fn calories(&self) -> f64 {
        4.0 * self.protein_g + 4.0 * self.carbs_g + 9.0 * self.fats_g
    }

    pub fn is_offered_at(&self, slot: MealSlot) -> bool {
        self.slots.contains(&slot)
    }

    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        self.tags.iter().any(|t| tags.contains(&normalize_tag(t)))
    }
}

/// Normalize a restriction or tag: trimmed, lowercase, `-` as separator
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['_', ' '], "-")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCatalog {
    pub foods: Vec<FoodItem>,

    /// Restriction name to the food tags it excludes
    #[serde(default = "default_restriction_aliases")]
    pub restriction_aliases: BTreeMap<String, Vec<String>>,
}

impl FoodCatalog {
    pub fn new(foods: Vec<FoodItem>) -> Self {
        Self {
            foods,
            restriction_aliases: default_restriction_aliases(),
        }
    }

    /// Food tags excluded by a set of restrictions
    ///
    /// Known restriction names expand through the alias table; anything else
    /// is treated as a tag of its own ("peanut", "soy").
    pub fn excluded_tags(&self, restrictions: &BTreeSet<String>) -> BTreeSet<String> {
        let mut excluded = BTreeSet::new();
        for restriction in restrictions {
            let key = normalize_tag(restriction);
            if key.is_empty() {
                continue;
            }
            match self.restriction_aliases.get(&key) {
                Some(tags) => excluded.extend(tags.iter().map(|t| normalize_tag(t))),
                None => {
                    excluded.insert(key);
                }
            }
        }
        excluded
    }

    /// Foods compatible with the restrictions, in catalog order
    pub fn allowed(&self, restrictions: &BTreeSet<String>) -> Vec<&FoodItem> {
        let excluded = self.excluded_tags(restrictions);
        self.foods
            .iter()
            .filter(|food| !food.has_any_tag(&excluded))
            .collect()
    }

    /// Allowed foods offered at a meal slot
    pub fn allowed_for(&self, slot: MealSlot, restrictions: &BTreeSet<String>) -> Vec<&FoodItem> {
        self.allowed(restrictions)
            .into_iter()
            .filter(|food| food.is_offered_at(slot))
            .collect()
    }

    pub fn builtin() -> Self {
        use MealSlot::{Breakfast as B, Dinner as D, Lunch as L, Snack as S};

        let food = |name: &str,
                    serving_g: f64,
                    macros: (f64, f64, f64),
                    slots: &[MealSlot],
                    tags: &[&str]| FoodItem {
            name: name.to_string(),
            serving_g,
            protein_g: macros.0,
            carbs_g: macros.1,
            fats_g: macros.2,
            slots: slots.to_vec(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };

        Self::new(vec![
            food("Rolled oats", 40.0, (5.0, 27.0, 3.0), &[B], &["grain", "gluten"]),
            food("Greek yogurt", 170.0, (17.0, 6.0, 4.0), &[B, S], &["dairy"]),
            food("Scrambled eggs", 100.0, (13.0, 1.0, 10.0), &[B], &["egg"]),
            food("Whole-grain toast", 60.0, (7.0, 24.0, 2.0), &[B], &["grain", "gluten"]),
            food("Banana", 118.0, (1.0, 27.0, 0.0), &[B, S], &["fruit"]),
            food("Blueberries", 150.0, (1.0, 21.0, 0.5), &[B, S], &["fruit"]),
            food("Tofu scramble", 150.0, (18.0, 3.0, 10.0), &[B, L, D], &["soy"]),
            food("Grilled chicken breast", 120.0, (37.0, 0.0, 4.0), &[L, D], &["meat", "poultry"]),
            food("Baked salmon", 120.0, (30.0, 0.0, 14.0), &[L, D], &["fish"]),
            food("Lean beef", 120.0, (31.0, 0.0, 10.0), &[D], &["meat"]),
            food("Cooked lentils", 200.0, (18.0, 40.0, 1.0), &[L, D], &["legume"]),
            food("Brown rice", 195.0, (5.0, 45.0, 2.0), &[L, D], &["grain"]),
            food("Quinoa", 185.0, (8.0, 39.0, 4.0), &[L, D], &["grain"]),
            food("Whole-wheat pasta", 140.0, (7.0, 37.0, 1.0), &[L, D], &["grain", "gluten"]),
            food("Sweet potato", 150.0, (2.0, 30.0, 0.0), &[L, D], &["vegetable"]),
            food("Steamed broccoli", 150.0, (4.0, 10.0, 0.5), &[L, D], &["vegetable"]),
            food("Olive oil", 14.0, (0.0, 0.0, 14.0), &[L, D], &["oil"]),
            food("Avocado", 100.0, (2.0, 9.0, 15.0), &[B, L, D], &["fruit"]),
            food("Chickpeas", 164.0, (15.0, 45.0, 4.0), &[L, D], &["legume"]),
            food("Almonds", 28.0, (6.0, 6.0, 14.0), &[S], &["nuts"]),
            food("Apple", 182.0, (0.5, 25.0, 0.3), &[S], &["fruit"]),
            food("Cottage cheese", 113.0, (12.0, 4.0, 5.0), &[S], &["dairy"]),
            food("Hummus", 60.0, (5.0, 14.0, 6.0), &[S], &["legume", "sesame"]),
            food("Peanut butter", 32.0, (8.0, 6.0, 16.0), &[B, S], &["nuts", "peanut"]),
            food("Whey protein shake", 30.0, (24.0, 3.0, 1.5), &[S], &["dairy"]),
        ])
    }
}

fn default_restriction_aliases() -> BTreeMap<String, Vec<String>> {
    let aliases: [(&str, &[&str]); 10] = [
        ("vegetarian", &["meat", "poultry", "fish"]),
        ("vegan", &["meat", "poultry", "fish", "dairy", "egg", "honey"]),
        ("pescatarian", &["meat", "poultry"]),
        ("gluten-free", &["gluten"]),
        ("celiac", &["gluten"]),
        ("dairy-free", &["dairy"]),
        ("lactose-free", &["dairy"]),
        ("lactose-intolerant", &["dairy"]),
        ("nut-free", &["nuts", "peanut"]),
        ("nut-allergy", &["nuts", "peanut"]),
    ];

    aliases
        .iter()
        .map(|(name, tags)| {
            (
                name.to_string(),
                tags.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

/// One catalog exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub name: String,
    pub category: ExerciseCategory,
    /// Metabolic Equivalent of Task
    pub met: f64,
    /// Excluded for profiles restricted to low-impact training
    #[serde(default)]
    pub high_impact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCatalog {
    pub exercises: Vec<ExerciseDefinition>,
}

impl ExerciseCatalog {
    pub fn new(exercises: Vec<ExerciseDefinition>) -> Self {
        Self { exercises }
    }

    /// Exercises of a category, in catalog order
    pub fn pool(&self, category: ExerciseCategory, low_impact_only: bool) -> Vec<&ExerciseDefinition> {
        self.exercises
            .iter()
            .filter(|e| e.category == category)
            .filter(|e| !(low_impact_only && e.high_impact))
            .collect()
    }

    pub fn builtin() -> Self {
        use ExerciseCategory::{Cardio, Flexibility, Strength};

        let exercise = |name: &str, category, met, high_impact| ExerciseDefinition {
            name: name.to_string(),
            category,
            met,
            high_impact,
        };

        Self::new(vec![
            exercise("Brisk walking", Cardio, 4.3, false),
            exercise("Cycling", Cardio, 6.8, false),
            exercise("Jogging", Cardio, 7.0, true),
            exercise("Swimming", Cardio, 5.8, false),
            exercise("Rowing", Cardio, 7.0, false),
            exercise("Jump rope", Cardio, 11.0, true),
            exercise("Elliptical trainer", Cardio, 5.0, false),
            exercise("Bodyweight squats", Strength, 5.0, false),
            exercise("Push-ups", Strength, 3.8, false),
            exercise("Dumbbell rows", Strength, 3.5, false),
            exercise("Deadlifts", Strength, 6.0, true),
            exercise("Lunges", Strength, 4.0, false),
            exercise("Plank", Strength, 3.8, false),
            exercise("Bench press", Strength, 5.0, false),
            exercise("Yoga", Flexibility, 2.5, false),
            exercise("Stretching", Flexibility, 2.3, false),
            exercise("Pilates", Flexibility, 3.0, false),
        ])
    }
}

/// Immutable tables shared by all engines, safe to read from many threads
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    config: EngineConfig,
    foods: FoodCatalog,
    exercises: ExerciseCatalog,
}

impl ReferenceData {
    pub fn new(
        config: EngineConfig,
        foods: FoodCatalog,
        exercises: ExerciseCatalog,
    ) -> Result<Self, HealthXaiError> {
        config.validate()?;

        if let Some(food) = foods
            .foods
            .iter()
            .find(|f| !(f.serving_g > 0.0) || !(f.calories() > 0.0))
        {
            return Err(HealthXaiError::Configuration(format!(
                "food '{}' must have a positive serving size and energy",
                food.name
            )));
        }
        if let Some(exercise) = exercises.exercises.iter().find(|e| !(e.met > 0.0)) {
            return Err(HealthXaiError::Configuration(format!(
                "exercise '{}' must have a positive MET value",
                exercise.name
            )));
        }

        Ok(Self {
            config,
            foods,
            exercises,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn foods(&self) -> &FoodCatalog {
        &self.foods
    }

    pub fn exercises(&self) -> &ExerciseCatalog {
        &self.exercises
    }

    /// Default tables and built-in catalogs
    pub fn builtin() -> Self {
        Self {
            config: EngineConfig::default(),
            foods: FoodCatalog::builtin(),
            exercises: ExerciseCatalog::builtin(),
        }
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}
