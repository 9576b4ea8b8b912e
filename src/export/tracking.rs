//! Weekly progress-tracking template derived from a recommendation

use crate::models::{MealStatus, RecommendationBundle};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Daily step target shown on every template
pub const DEFAULT_STEP_TARGET: u32 = 8_000;

/// Nightly sleep target in hours
pub const DEFAULT_SLEEP_HOURS: f64 = 7.0;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTargets {
    pub daily_calories: u32,
    pub protein_g: u32,
    pub steps: u32,
    /// About 1 ml per planned kcal, rounded to 50 ml
    pub water_ml: u32,
    pub sleep_hours: f64,
    pub weekly_exercise_minutes: u32,
}

/// A planned meal or exercise to tick off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub planned_calories: f64,
    pub done: bool,
}

/// One day of the template; measurement fields start empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingDay {
    pub day: Weekday,
    pub meals: Vec<ChecklistItem>,
    pub exercises: Vec<ChecklistItem>,
    pub steps: Option<u32>,
    pub water_ml: Option<u32>,
    pub sleep_hours: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl TrackingDay {
    /// Fraction of checklist items marked done (1.0 for an empty checklist)
    pub fn completion(&self) -> f64 {
        let total = self.meals.len() + self.exercises.len();
        if total == 0 {
            return 1.0;
        }
        let done = self
            .meals
            .iter()
            .chain(&self.exercises)
            .filter(|item| item.done)
            .count();
        done as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTemplate {
    /// Creation time of the recommendation the template follows
    pub plan_created_at: DateTime<Utc>,
    pub targets: TrackingTargets,
    pub days: Vec<TrackingDay>,
}

impl TrackingTemplate {
    pub fn from_bundle(bundle: &RecommendationBundle) -> Self {
        let diet = &bundle.diet_plan;
        let exercise = &bundle.exercise_plan;

        let meals: Vec<ChecklistItem> = diet
            .meals
            .iter()
            .filter(|meal| meal.status == MealStatus::Filled)
            .map(|meal| {
                let foods: Vec<&str> = meal.items.iter().map(|i| i.food.as_str()).collect();
                ChecklistItem {
                    label: format!("{}: {}", meal.slot, foods.join(", ")),
                    planned_calories: meal.calories.round(),
                    done: false,
                }
            })
            .collect();

        let days = WEEK
            .iter()
            .map(|day| {
                let exercises = exercise
                    .workouts
                    .iter()
                    .filter(|w| w.day == *day)
                    .flat_map(|w| &w.exercises)
                    .map(|e| ChecklistItem {
                        label: format!("{} ({} min)", e.name, e.duration_minutes),
                        planned_calories: e.calories_burned,
                        done: false,
                    })
                    .collect();

                TrackingDay {
                    day: *day,
                    meals: meals.clone(),
                    exercises,
                    steps: None,
                    water_ml: None,
                    sleep_hours: None,
                    weight_kg: None,
                }
            })
            .collect();

        TrackingTemplate {
            plan_created_at: bundle.created_at,
            targets: TrackingTargets {
                daily_calories: diet.daily_calories,
                protein_g: diet.macros.protein_g,
                steps: DEFAULT_STEP_TARGET,
                water_ml: ((diet.daily_calories as f64 / 50.0).round() * 50.0) as u32,
                sleep_hours: DEFAULT_SLEEP_HOURS,
                weekly_exercise_minutes: exercise.weekly_minutes,
            },
            days,
        }
    }

    pub fn day(&self, day: Weekday) -> Option<&TrackingDay> {
        self.days.iter().find(|d| d.day == day)
    }

    pub fn day_mut(&mut self, day: Weekday) -> Option<&mut TrackingDay> {
        self.days.iter_mut().find(|d| d.day == day)
    }

    /// Mean completion over the week
    pub fn weekly_completion(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.days.iter().map(|d| d.completion()).sum::<f64>() / self.days.len() as f64
    }
}
