//! Weekly exercise planning
//!
//! The goal split decides how weekly minutes are shared between cardio,
//! strength and flexibility. The week is cut into `frequency × per-session`
//! exercise slots, apportioned to categories by largest remainder, filled
//! round-robin from each category's pool and chunked into training days.

use chrono::Weekday;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::{ExerciseCatalog, ExerciseDefinition};
use crate::config::EngineConfig;
use crate::error::NoExercisesAvailableError;
use crate::models::{
    ActivityLevel, CategorySubstitution, ExerciseCategory, ExerciseEntry, ExercisePlan,
    FitnessGoal, HealthProfile, Metrics, WorkoutDay, WorkoutSplit,
};

/// Exercise pools per category after impact filtering
pub type ExercisePools<'c> = BTreeMap<ExerciseCategory, Vec<&'c ExerciseDefinition>>;

/// Calories burned for an exercise block
/// kcal = MET × weight_kg × duration_hours
pub fn calories_burned(met: f64, weight_kg: f64, duration_minutes: u32) -> f64 {
    met * weight_kg * duration_minutes as f64 / 60.0
}

/// Training days for a weekly frequency, spread to leave rest days between sessions
pub fn training_days(frequency: u32) -> Vec<Weekday> {
    use Weekday::*;
    match frequency {
        0 => vec![],
        1 => vec![Wed],
        2 => vec![Tue, Fri],
        3 => vec![Mon, Wed, Fri],
        4 => vec![Mon, Tue, Thu, Fri],
        5 => vec![Mon, Tue, Wed, Fri, Sat],
        6 => vec![Mon, Tue, Wed, Thu, Fri, Sat],
        _ => vec![Mon, Tue, Wed, Thu, Fri, Sat, Sun],
    }
}

/// Distribute `total` slots over the split by largest remainder
///
/// Every category with a positive share receives at least one slot when
/// `total` allows it; the slot is taken from the best-provisioned category.
pub fn apportion_slots(split: &WorkoutSplit, total: u32) -> BTreeMap<ExerciseCategory, u32> {
    let quotas: Vec<(ExerciseCategory, f64)> = ExerciseCategory::ALL
        .iter()
        .map(|c| (*c, split.share(*c).max(0.0) * total as f64))
        .collect();

    let mut slots: BTreeMap<ExerciseCategory, u32> = quotas
        .iter()
        .map(|(c, quota)| (*c, quota.floor() as u32))
        .collect();

    let assigned: u32 = slots.values().sum();
    let mut by_remainder = quotas.clone();
    by_remainder.sort_by(|a, b| {
        let ra = a.1 - a.1.floor();
        let rb = b.1 - b.1.floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for (category, _) in by_remainder.iter().take(total.saturating_sub(assigned) as usize) {
        *slots.entry(*category).or_insert(0) += 1;
    }

    for category in ExerciseCategory::ALL {
        if split.share(category) > 0.0 && slots[&category] == 0 {
            let donor = ExerciseCategory::ALL
                .iter()
                .copied()
                .filter(|c| slots[c] > 1)
                .max_by(|a, b| slots[a].cmp(&slots[b]).then(b.cmp(a)));
            if let Some(donor) = donor {
                *slots.entry(donor).or_insert(0) -= 1;
                *slots.entry(category).or_insert(0) += 1;
            }
        }
    }

    slots
}

/// Exercise engine over the shared tables
#[derive(Debug, Clone, Copy)]
pub struct ExerciseEngine<'a> {
    config: &'a EngineConfig,
    catalog: &'a ExerciseCatalog,
}

impl<'a> ExerciseEngine<'a> {
    pub fn new(config: &'a EngineConfig, catalog: &'a ExerciseCatalog) -> Self {
        Self { config, catalog }
    }

    /// Component-wise mean of the goals' splits
    pub fn workout_split(&self, goals: &[FitnessGoal]) -> WorkoutSplit {
        if goals.is_empty() {
            return self.config.workout_splits.get(FitnessGoal::Maintenance);
        }
        let n = goals.len() as f64;
        let mut split = WorkoutSplit {
            cardio: 0.0,
            strength: 0.0,
            flexibility: 0.0,
        };
        for goal in goals {
            let goal_split = self.config.workout_splits.get(*goal);
            for category in ExerciseCategory::ALL {
                split.set_share(category, split.share(category) + goal_split.share(category) / n);
            }
        }
        split
    }

    pub fn weekly_frequency(&self, activity_level: ActivityLevel) -> u32 {
        self.config.weekly_frequency.get(activity_level)
    }

    /// Mean weekly minutes of the goals, rounded
    pub fn weekly_minutes(&self, goals: &[FitnessGoal]) -> u32 {
        if goals.is_empty() {
            return self.config.weekly_minutes.get(FitnessGoal::Maintenance);
        }
        let total: u32 = goals.iter().map(|g| self.config.weekly_minutes.get(*g)).sum();
        (total as f64 / goals.len() as f64).round() as u32
    }

    /// High-impact exercises are excluded for high BMI or older age
    pub fn low_impact_only(&self, profile: &HealthProfile, metrics: &Metrics) -> bool {
        metrics.bmi >= self.config.exercise.low_impact_bmi
            || profile.age >= self.config.exercise.low_impact_age
    }

    pub fn pools(&self, low_impact_only: bool) -> ExercisePools<'a> {
        ExerciseCategory::ALL
            .iter()
            .map(|c| (*c, self.catalog.pool(*c, low_impact_only)))
            .collect()
    }

    /// Fail on the first category that has a share but no exercises
    pub fn check_split(
        split: &WorkoutSplit,
        pools: &ExercisePools<'_>,
    ) -> Result<(), NoExercisesAvailableError> {
        for category in ExerciseCategory::ALL {
            let share = split.share(category);
            let empty = pools.get(&category).map_or(true, |p| p.is_empty());
            if share > 0.0 && empty {
                return Err(NoExercisesAvailableError { category, share });
            }
        }
        Ok(())
    }

    /// Move the share of every empty category to the next category that has
    /// exercises, in cardio → strength → flexibility → cardio order
    pub fn resolve_split(
        split: &WorkoutSplit,
        pools: &ExercisePools<'_>,
    ) -> Result<(WorkoutSplit, Vec<CategorySubstitution>), NoExercisesAvailableError> {
        let mut resolved = *split;
        let mut substitutions = Vec::new();

        while let Err(err) = Self::check_split(&resolved, pools) {
            let mut candidate = err.category.next();
            let replacement = loop {
                if candidate == err.category {
                    break None;
                }
                if pools.get(&candidate).map_or(false, |p| !p.is_empty()) {
                    break Some(candidate);
                }
                candidate = candidate.next();
            };

            let Some(replacement) = replacement else {
                return Err(err);
            };

            warn!(
                missing = %err.category,
                replacement = %replacement,
                share = err.share,
                "{}", err
            );
            resolved.set_share(replacement, resolved.share(replacement) + err.share);
            resolved.set_share(err.category, 0.0);
            substitutions.push(CategorySubstitution {
                missing: err.category,
                replacement: Some(replacement),
                share: err.share,
            });
        }

        Ok((resolved, substitutions))
    }

    /// Build the weekly plan; fails only when no category has any exercise
    pub fn recommend(
        &self,
        profile: &HealthProfile,
        metrics: &Metrics,
    ) -> Result<ExercisePlan, NoExercisesAvailableError> {
        let goals = profile.effective_goals();
        let frequency = self.weekly_frequency(profile.activity_level);
        let weekly_minutes = self.weekly_minutes(&goals);
        let low_impact_only = self.low_impact_only(profile, metrics);
        let pools = self.pools(low_impact_only);

        let (split, substitutions) = Self::resolve_split(&self.workout_split(&goals), &pools)?;

        // A session holds at least one exercise even if the table says zero
        let per_session = self.config.exercise.exercises_per_session.max(1);
        let slots = apportion_slots(&split, frequency * per_session);

        let mut remaining = slots.clone();
        let mut next_index: BTreeMap<ExerciseCategory, usize> = BTreeMap::new();
        let mut sequence: Vec<ExerciseEntry> = Vec::with_capacity((frequency * per_session) as usize);

        while remaining.values().any(|n| *n > 0) {
            for category in ExerciseCategory::ALL {
                let left = remaining.entry(category).or_insert(0);
                if *left == 0 {
                    continue;
                }
                let pool = match pools.get(&category) {
                    Some(pool) if !pool.is_empty() => pool,
                    _ => {
                        *left = 0;
                        continue;
                    }
                };
                *left -= 1;

                let index = next_index.entry(category).or_insert(0);
                let exercise = pool[*index % pool.len()];
                *index += 1;

                let duration = self.block_minutes(&split, &slots, category, weekly_minutes);
                sequence.push(ExerciseEntry {
                    name: exercise.name.clone(),
                    category,
                    met: exercise.met,
                    duration_minutes: duration,
                    calories_burned: round_tenth(calories_burned(exercise.met, profile.weight_kg, duration)),
                });
            }
        }

        let workouts: Vec<WorkoutDay> = training_days(frequency)
            .into_iter()
            .zip(sequence.chunks(per_session as usize))
            .map(|(day, chunk)| WorkoutDay {
                day,
                exercises: chunk.to_vec(),
            })
            .collect();

        let total_minutes: u32 = workouts.iter().map(|w| w.total_minutes()).sum();
        let total_burn = round_tenth(workouts.iter().map(|w| w.calories_burned()).sum());

        debug!(
            frequency,
            weekly_minutes = total_minutes,
            low_impact_only,
            substitutions = substitutions.len(),
            "Exercise plan built"
        );

        Ok(ExercisePlan {
            weekly_frequency: frequency,
            split,
            weekly_minutes: total_minutes,
            workouts,
            total_calories_burned_per_week: total_burn,
            degraded: !substitutions.is_empty(),
            substitutions,
            low_impact_only,
        })
    }

    /// Plan returned when no category has exercises for this profile
    pub fn unavailable_plan(
        &self,
        profile: &HealthProfile,
        metrics: &Metrics,
        err: &NoExercisesAvailableError,
    ) -> ExercisePlan {
        let split = self.workout_split(&profile.effective_goals());
        let substitutions = ExerciseCategory::ALL
            .iter()
            .filter(|c| split.share(**c) > 0.0)
            .map(|c| CategorySubstitution {
                missing: *c,
                replacement: None,
                share: split.share(*c),
            })
            .collect();

        warn!(category = %err.category, "No exercises available for any category");

        ExercisePlan {
            weekly_frequency: 0,
            split,
            weekly_minutes: 0,
            workouts: Vec::new(),
            total_calories_burned_per_week: 0.0,
            substitutions,
            low_impact_only: self.low_impact_only(profile, metrics),
            degraded: true,
        }
    }

    /// Minutes of one block of a category: its weekly share over its slot count
    fn block_minutes(
        &self,
        split: &WorkoutSplit,
        slots: &BTreeMap<ExerciseCategory, u32>,
        category: ExerciseCategory,
        weekly_minutes: u32,
    ) -> u32 {
        let count = slots.get(&category).copied().unwrap_or(0).max(1);
        let minutes = (weekly_minutes as f64 * split.share(category) / count as f64).round() as u32;
        minutes.max(self.config.exercise.min_exercise_minutes)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExerciseCatalog;
    use crate::models::{BmiCategory, Gender};
    use proptest::prelude::*;

    fn metrics(bmi: f64) -> Metrics {
        Metrics {
            bmi,
            bmr: 1800.0,
            tdee: 2700.0,
            bmi_category: BmiCategory::from_bmi(bmi),
        }
    }

    fn weight_loss_profile() -> HealthProfile {
        HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
            .with_goal(FitnessGoal::WeightLoss)
    }

    #[test]
    fn test_weight_loss_plan() {
        let config = EngineConfig::default();
        let catalog = ExerciseCatalog::builtin();
        let engine = ExerciseEngine::new(&config, &catalog);

        let plan = engine.recommend(&weight_loss_profile(), &metrics(27.8)).unwrap();

        assert_eq!(plan.weekly_frequency, 4);
        assert_eq!(plan.workouts.len(), 4);
        assert!(plan.split.cardio > plan.split.strength);
        assert!(plan.workouts.iter().all(|w| w.exercises.len() == 3));
        assert!(!plan.degraded);
        assert!(!plan.low_impact_only);

        // 7 cardio × 26 + 4 strength × 23 + 1 flexibility × 30
        assert_eq!(plan.weekly_minutes, 304);

        let expected_burn: f64 = plan.workouts.iter().map(|w| w.calories_burned()).sum();
        assert!((plan.total_calories_burned_per_week - expected_burn).abs() < 0.1);
        assert!(plan.total_calories_burned_per_week > 0.0);
    }

    #[test]
    fn test_apportion_slots() {
        let split = WorkoutSplit {
            cardio: 0.6,
            strength: 0.3,
            flexibility: 0.1,
        };
        let slots = apportion_slots(&split, 12);
        assert_eq!(slots[&ExerciseCategory::Cardio], 7);
        assert_eq!(slots[&ExerciseCategory::Strength], 4);
        assert_eq!(slots[&ExerciseCategory::Flexibility], 1);

        let slots = apportion_slots(&split, 9);
        assert_eq!(slots.values().sum::<u32>(), 9);
        assert!(slots[&ExerciseCategory::Flexibility] >= 1);
    }

    #[test]
    fn test_apportion_minimum_one_slot() {
        let split = WorkoutSplit {
            cardio: 0.9,
            strength: 0.05,
            flexibility: 0.05,
        };
        let slots = apportion_slots(&split, 3);
        assert_eq!(slots[&ExerciseCategory::Cardio], 1);
        assert_eq!(slots[&ExerciseCategory::Strength], 1);
        assert_eq!(slots[&ExerciseCategory::Flexibility], 1);
    }

    #[test]
    fn test_multi_goal_split_is_averaged() {
        let config = EngineConfig::default();
        let catalog = ExerciseCatalog::builtin();
        let engine = ExerciseEngine::new(&config, &catalog);

        let split = engine.workout_split(&[FitnessGoal::WeightLoss, FitnessGoal::MuscleGain]);
        assert!((split.cardio - 0.40).abs() < 1e-9);
        assert!((split.strength - 0.50).abs() < 1e-9);
        assert!((split.total() - 1.0).abs() < 1e-9);
        assert_eq!(engine.weekly_minutes(&[FitnessGoal::WeightLoss, FitnessGoal::MuscleGain]), 270);
    }

    #[test]
    fn test_missing_flexibility_is_redistributed() {
        let config = EngineConfig::default();
        let mut catalog = ExerciseCatalog::builtin();
        catalog.exercises.retain(|e| e.category != ExerciseCategory::Flexibility);
        let engine = ExerciseEngine::new(&config, &catalog);

        let plan = engine.recommend(&weight_loss_profile(), &metrics(27.8)).unwrap();

        assert!(plan.degraded);
        assert_eq!(plan.split.flexibility, 0.0);
        assert!((plan.split.cardio - 0.7).abs() < 1e-9);
        assert_eq!(
            plan.substitutions,
            vec![CategorySubstitution {
                missing: ExerciseCategory::Flexibility,
                replacement: Some(ExerciseCategory::Cardio),
                share: 0.1,
            }]
        );
        assert!(plan
            .workouts
            .iter()
            .flat_map(|w| &w.exercises)
            .all(|e| e.category != ExerciseCategory::Flexibility));
    }

    #[test]
    fn test_check_split_reports_empty_category() {
        let config = EngineConfig::default();
        let catalog = ExerciseCatalog::new(Vec::new());
        let engine = ExerciseEngine::new(&config, &catalog);

        let pools = engine.pools(false);
        let split = config.workout_splits.get(FitnessGoal::MuscleGain);
        let err = ExerciseEngine::check_split(&split, &pools).unwrap_err();
        assert_eq!(err.category, ExerciseCategory::Cardio);
        assert!((err.share - 0.2).abs() < 1e-9);

        let err = engine.recommend(&weight_loss_profile(), &metrics(27.8)).unwrap_err();
        let plan = engine.unavailable_plan(&weight_loss_profile(), &metrics(27.8), &err);
        assert!(plan.degraded);
        assert!(plan.workouts.is_empty());
        assert_eq!(plan.substitutions.len(), 3);
        assert!(plan.substitutions.iter().all(|s| s.replacement.is_none()));
    }

    #[test]
    fn test_low_impact_for_high_bmi_and_age() {
        let config = EngineConfig::default();
        let catalog = ExerciseCatalog::builtin();
        let engine = ExerciseEngine::new(&config, &catalog);

        let plan = engine.recommend(&weight_loss_profile(), &metrics(36.0)).unwrap();
        assert!(plan.low_impact_only);
        let high_impact: Vec<&str> = catalog
            .exercises
            .iter()
            .filter(|e| e.high_impact)
            .map(|e| e.name.as_str())
            .collect();
        for exercise in plan.workouts.iter().flat_map(|w| &w.exercises) {
            assert!(!high_impact.contains(&exercise.name.as_str()));
        }

        let mut senior = weight_loss_profile();
        senior.age = 70;
        assert!(engine.low_impact_only(&senior, &metrics(24.0)));
    }

    #[test]
    fn test_zero_exercises_per_session_still_plans() {
        let mut config = EngineConfig::default();
        config.exercise.exercises_per_session = 0;
        let catalog = ExerciseCatalog::builtin();
        let engine = ExerciseEngine::new(&config, &catalog);

        let plan = engine.recommend(&weight_loss_profile(), &metrics(27.8)).unwrap();

        assert_eq!(plan.workouts.len() as u32, plan.weekly_frequency);
        assert!(plan.workouts.iter().all(|w| w.exercises.len() == 1));
    }

    #[test]
    fn test_training_days() {
        assert_eq!(training_days(3), vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(training_days(7).len(), 7);
        assert!(training_days(0).is_empty());
    }

    #[test]
    fn test_calories_burned() {
        assert!((calories_burned(7.0, 80.0, 30) - 280.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_plan_shape_follows_frequency(
            level_idx in 0usize..5,
            goal_idx in 0usize..4,
            weight in 40.0f64..150.0,
        ) {
            let config = EngineConfig::default();
            let catalog = ExerciseCatalog::builtin();
            let engine = ExerciseEngine::new(&config, &catalog);

            let level = ActivityLevel::ALL[level_idx];
            let profile = HealthProfile::new(35, weight, 175.0, Gender::Female, level)
                .with_goal(FitnessGoal::ALL[goal_idx]);
            let plan = engine.recommend(&profile, &metrics(24.0)).unwrap();

            prop_assert_eq!(plan.workouts.len() as u32, plan.weekly_frequency);
            prop_assert_eq!(plan.weekly_frequency, config.weekly_frequency.get(level));
            prop_assert!((plan.split.total() - 1.0).abs() < 1e-9);
            for workout in &plan.workouts {
                prop_assert_eq!(workout.exercises.len(), 3);
                for exercise in &workout.exercises {
                    prop_assert!(exercise.duration_minutes >= 5);
                    prop_assert!(exercise.calories_burned > 0.0);
                }
            }
        }
    }
}
