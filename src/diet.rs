//! Diet planning: calorie target, macro split and greedy meal assembly

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::catalog::{FoodCatalog, FoodItem};
use crate::config::{EngineConfig, MacroRatio};
use crate::error::{InsufficientCatalogError, ValidationError};
use crate::models::{DietPlan, FitnessGoal, Macros, Meal, MealItem, MealSlot, MealStatus, Metrics};

/// Upper bound on add/remove steps in each assembly phase
const MAX_ASSEMBLY_STEPS: usize = 96;

const EPSILON: f64 = 1e-9;

/// Serving step added to and removed from a candidate (by index)
type RefineMove = (Option<usize>, Option<usize>);

/// Daily calorie target after goal adjustment and safety floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalorieTarget {
    pub daily_calories: u32,
    pub adjustment: f64,
    pub floor_applied: bool,
}

/// Energy and macro targets of a single meal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealTarget {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Nutrients {
    protein_g: f64,
    carbs_g: f64,
    fats_g: f64,
}

impl Nutrients {
    fn calories(&self) -> f64 {
        4.0 * self.protein_g + 4.0 * self.carbs_g + 9.0 * self.fats_g
    }

    fn shifted(&self, food: &FoodItem, servings: f64) -> Self {
        Self {
            protein_g: self.protein_g + food.protein_g * servings,
            carbs_g: self.carbs_g + food.carbs_g * servings,
            fats_g: self.fats_g + food.fats_g * servings,
        }
    }

    /// Relative energy error plus the mean relative error of the macros with a target
    fn score(&self, target: &MealTarget) -> f64 {
        let energy = (self.calories() - target.calories).abs() / target.calories;
        let macro_errors: Vec<f64> = [
            (self.protein_g, target.protein_g),
            (self.carbs_g, target.carbs_g),
            (self.fats_g, target.fats_g),
        ]
        .iter()
        .filter(|(_, wanted)| *wanted > 0.0)
        .map(|(actual, wanted)| (actual - wanted).abs() / wanted)
        .collect();

        if macro_errors.is_empty() {
            energy
        } else {
            energy + macro_errors.iter().sum::<f64>() / macro_errors.len() as f64
        }
    }
}

/// Diet engine over the shared tables
#[derive(Debug, Clone, Copy)]
pub struct DietEngine<'a> {
    config: &'a EngineConfig,
    catalog: &'a FoodCatalog,
}

impl<'a> DietEngine<'a> {
    pub fn new(config: &'a EngineConfig, catalog: &'a FoodCatalog) -> Self {
        Self { config, catalog }
    }

    /// Mean calorie adjustment of the goals (maintenance when empty)
    pub fn calorie_adjustment(&self, goals: &[FitnessGoal]) -> f64 {
        if goals.is_empty() {
            return self.config.calorie_adjustments.get(FitnessGoal::Maintenance);
        }
        goals
            .iter()
            .map(|g| self.config.calorie_adjustments.get(*g))
            .sum::<f64>()
            / goals.len() as f64
    }

    /// TDEE plus the goal adjustment, rounded and held at the calorie floor
    ///
    /// Fails when the rounded target does not fit the `u32` kcal field.
    pub fn calorie_target(
        &self,
        metrics: &Metrics,
        goals: &[FitnessGoal],
    ) -> Result<CalorieTarget, ValidationError> {
        let adjustment = self.calorie_adjustment(goals);
        let raw = (metrics.tdee + adjustment).round();
        if raw.is_nan() || raw > u32::MAX as f64 {
            return Err(ValidationError::CalorieTargetOutOfRange { calories: raw });
        }

        let floor = self.config.diet.min_daily_calories.round();
        let floor_applied = raw < floor;

        Ok(CalorieTarget {
            daily_calories: if floor_applied { floor as u32 } else { raw as u32 },
            adjustment,
            floor_applied,
        })
    }

    /// Component-wise mean of the goals' macro ratios
    pub fn macro_ratio(&self, goals: &[FitnessGoal]) -> MacroRatio {
        if goals.is_empty() {
            return self.config.macro_ratios.get(FitnessGoal::Maintenance);
        }
        let n = goals.len() as f64;
        let sum = goals.iter().fold(
            MacroRatio { protein: 0.0, carbs: 0.0, fat: 0.0 },
            |acc, goal| {
                let ratio = self.config.macro_ratios.get(*goal);
                MacroRatio {
                    protein: acc.protein + ratio.protein,
                    carbs: acc.carbs + ratio.carbs,
                    fat: acc.fat + ratio.fat,
                }
            },
        );
        MacroRatio {
            protein: sum.protein / n,
            carbs: sum.carbs / n,
            fat: sum.fat / n,
        }
    }

    /// Gram targets for a daily energy budget
    ///
    /// Protein and carbs are rounded from their ratio; fat takes the remaining
    /// energy so that the macro energy stays within 4.5 kcal of the target.
    pub fn macro_targets(daily_calories: u32, ratio: &MacroRatio) -> Macros {
        let calories = daily_calories as f64;
        let protein_g = (calories * ratio.protein / 4.0).round().max(0.0) as u32;
        let carbs_g = (calories * ratio.carbs / 4.0).round().max(0.0) as u32;
        let fat_energy = calories - 4.0 * protein_g as f64 - 4.0 * carbs_g as f64;
        let fats_g = (fat_energy / 9.0).round().max(0.0) as u32;

        Macros {
            protein_g,
            carbs_g,
            fats_g,
        }
    }

    /// Per-meal targets from the daily totals and the slot's share
    pub fn meal_target(&self, slot: MealSlot, daily_calories: u32, macros: &Macros) -> MealTarget {
        let share = self.config.diet.meal_shares.get(slot);
        MealTarget {
            calories: daily_calories as f64 * share,
            protein_g: macros.protein_g as f64 * share,
            carbs_g: macros.carbs_g as f64 * share,
            fats_g: macros.fats_g as f64 * share,
        }
    }

    /// Greedily fill a meal from candidate foods
    ///
    /// First adds the serving step that most improves the combined energy and
    /// macro score, then adds, removes or swaps single steps to pull energy
    /// toward the target. Fails when the energy error stays above the tolerance.
    pub fn assemble_meal(
        &self,
        slot: MealSlot,
        target: &MealTarget,
        candidates: &[&FoodItem],
    ) -> Result<Meal, InsufficientCatalogError> {
        let step = self.config.diet.serving_step;
        let max_servings = self.config.diet.max_servings;
        let tolerance = self.config.diet.meal_tolerance;

        let mut servings = vec![0.0_f64; candidates.len()];
        let mut totals = Nutrients::default();

        for _ in 0..MAX_ASSEMBLY_STEPS {
            let current = totals.score(target);
            let mut best: Option<(usize, f64)> = None;

            for (i, food) in candidates.iter().enumerate() {
                if servings[i] + step > max_servings + EPSILON {
                    continue;
                }
                let score = totals.shifted(food, step).score(target);
                if best.map_or(true, |(_, s)| score < s - 1e-12) {
                    best = Some((i, score));
                }
            }

            match best {
                Some((i, score)) if score < current - EPSILON => {
                    totals = totals.shifted(candidates[i], step);
                    servings[i] += step;
                }
                _ => break,
            }
        }

        for _ in 0..MAX_ASSEMBLY_STEPS {
            let current = (totals.calories() - target.calories).abs();
            if current / target.calories <= tolerance / 2.0 {
                break;
            }

            let can_add = |i: usize| servings[i] + step <= max_servings + EPSILON;
            let can_remove = |i: usize| servings[i] >= step - EPSILON;

            let n = candidates.len();
            let singles = (0..n).flat_map(|i| [(Some(i), None), (None, Some(i))]);
            let swaps = (0..n).flat_map(|i| (0..n).filter(move |j| *j != i).map(move |j| (Some(i), Some(j))));

            let mut best: Option<(RefineMove, Nutrients, f64)> = None;
            for (add, remove) in singles.chain(swaps) {
                if add.map_or(false, |i| !can_add(i)) || remove.map_or(false, |i| !can_remove(i)) {
                    continue;
                }
                let mut shifted = totals;
                if let Some(i) = add {
                    shifted = shifted.shifted(candidates[i], step);
                }
                if let Some(i) = remove {
                    shifted = shifted.shifted(candidates[i], -step);
                }
                let error = (shifted.calories() - target.calories).abs();
                if best.map_or(true, |(_, _, e)| error < e - 1e-12) {
                    best = Some(((add, remove), shifted, error));
                }
            }

            match best {
                Some(((add, remove), shifted, error)) if error < current - EPSILON => {
                    totals = shifted;
                    if let Some(i) = add {
                        servings[i] += step;
                    }
                    if let Some(i) = remove {
                        servings[i] -= step;
                    }
                }
                _ => break,
            }
        }

        let achieved = totals.calories();
        let relative_error = (achieved - target.calories).abs() / target.calories;
        if candidates.is_empty() || !(relative_error <= tolerance) {
            return Err(InsufficientCatalogError {
                meal: slot,
                target_calories: target.calories,
                achieved_calories: achieved,
                candidates: candidates.len(),
            });
        }

        let items = candidates
            .iter()
            .zip(&servings)
            .filter(|(_, s)| **s > 0.0)
            .map(|(food, s)| MealItem {
                food: food.name.clone(),
                servings: *s,
                quantity_g: food.serving_g * s,
                calories: food.calories() * s,
                protein_g: food.protein_g * s,
                carbs_g: food.carbs_g * s,
                fats_g: food.fats_g * s,
            })
            .collect();

        Ok(Meal {
            slot,
            target_calories: target.calories,
            calories: achieved,
            protein_g: totals.protein_g,
            carbs_g: totals.carbs_g,
            fats_g: totals.fats_g,
            items,
            status: MealStatus::Filled,
            note: None,
        })
    }

    /// Build the full diet plan; meals the catalog cannot fill are left empty
    pub fn recommend(
        &self,
        metrics: &Metrics,
        goals: &[FitnessGoal],
        restrictions: &BTreeSet<String>,
    ) -> Result<DietPlan, ValidationError> {
        let target = self.calorie_target(metrics, goals)?;
        let macros = Self::macro_targets(target.daily_calories, &self.macro_ratio(goals));

        debug!(
            daily_calories = target.daily_calories,
            adjustment = target.adjustment,
            floor_applied = target.floor_applied,
            protein_g = macros.protein_g,
            carbs_g = macros.carbs_g,
            fats_g = macros.fats_g,
            "Calorie and macro targets computed"
        );

        let meals: Vec<Meal> = MealSlot::ALL
            .iter()
            .map(|slot| {
                let meal_target = self.meal_target(*slot, target.daily_calories, &macros);
                let candidates = self.catalog.allowed_for(*slot, restrictions);

                self.assemble_meal(*slot, &meal_target, &candidates)
                    .unwrap_or_else(|err| {
                        warn!(meal = %slot, candidates = err.candidates, "{}", err);
                        Meal::unfilled(*slot, meal_target.calories, err.to_string())
                    })
            })
            .collect();

        let degraded = meals.iter().any(|m| m.status == MealStatus::Unfilled);

        Ok(DietPlan {
            daily_calories: target.daily_calories,
            macros,
            meals,
            calorie_adjustment: target.adjustment,
            calorie_floor_applied: target.floor_applied,
            degraded,
        })
    }
}
