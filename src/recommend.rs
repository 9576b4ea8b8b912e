//! Plan orchestration: metrics, then diet and exercise in parallel, then the explanation

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::catalog::ReferenceData;
use crate::diet::DietEngine;
use crate::error::ValidationError;
use crate::exercise::ExerciseEngine;
use crate::explain::{ExplainerStrategy, ExplanationEngine, ExplanationInput};
use crate::metrics::MetricsCalculator;
use crate::models::{HealthProfile, RecommendationBundle};

/// Thread-safe recommendation engine over shared reference data
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    reference: Arc<ReferenceData>,
    strategy: ExplainerStrategy,
}

impl RecommendationEngine {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            strategy: ExplainerStrategy::RuleBased,
        }
    }

    /// Engine over the default tables and built-in catalogs
    pub fn builtin() -> Self {
        Self::new(Arc::new(ReferenceData::builtin()))
    }

    pub fn with_strategy(mut self, strategy: ExplainerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn reference(&self) -> &Arc<ReferenceData> {
        &self.reference
    }

    pub fn strategy(&self) -> &ExplainerStrategy {
        &self.strategy
    }

    /// Compute a bundle stamped with the current time
    pub fn recommend(&self, profile: &HealthProfile) -> Result<RecommendationBundle, ValidationError> {
        self.recommend_at(profile, Utc::now())
    }

    /// Compute a bundle with an explicit creation timestamp
    ///
    /// Only an invalid profile or one whose derived targets overflow fails;
    /// catalog and explainer problems are recovered and reported through the bundle's degradation records.
    pub fn recommend_at(
        &self,
        profile: &HealthProfile,
        created_at: DateTime<Utc>,
    ) -> Result<RecommendationBundle, ValidationError> {
        let _span = info_span!("recommend", age = profile.age, activity = %profile.activity_level).entered();
        let config = self.reference.config();

        let metrics = MetricsCalculator::new(&config.activity_multipliers).calculate(profile)?;
        debug!(
            bmi = metrics.bmi,
            bmr = metrics.bmr,
            tdee = metrics.tdee,
            category = %metrics.bmi_category,
            "Metrics computed"
        );

        let goals = profile.effective_goals();
        let diet_engine = DietEngine::new(config, self.reference.foods());
        let exercise_engine = ExerciseEngine::new(config, self.reference.exercises());

        let (diet_plan, exercise_plan) = rayon::join(
            || diet_engine.recommend(&metrics, &goals, &profile.dietary_restrictions),
            || {
                exercise_engine
                    .recommend(profile, &metrics)
                    .unwrap_or_else(|err| exercise_engine.unavailable_plan(profile, &metrics, &err))
            },
        );
        let diet_plan = diet_plan?;

        let input = ExplanationInput {
            profile,
            metrics: &metrics,
            diet_plan: &diet_plan,
            exercise_plan: &exercise_plan,
        };
        let explanation = ExplanationEngine::new(config).explain(&input, &self.strategy);

        let bundle = RecommendationBundle {
            metrics,
            diet_plan,
            exercise_plan,
            explanation,
            created_at,
        };

        info!(
            daily_calories = bundle.diet_plan.daily_calories,
            weekly_frequency = bundle.exercise_plan.weekly_frequency,
            confidence = bundle.explanation.confidence_score,
            partial = bundle.is_partial(),
            "Recommendation complete"
        );

        Ok(bundle)
    }

    /// Independent bundles for many profiles, computed in parallel
    ///
    /// Results keep the order of `profiles`; one invalid profile does not
    /// affect the others.
    pub fn recommend_batch(
        &self,
        profiles: &[HealthProfile],
    ) -> Vec<Result<RecommendationBundle, ValidationError>> {
        let created_at = Utc::now();
        profiles
            .par_iter()
            .map(|profile| self.recommend_at(profile, created_at))
            .collect()
    }
}

/// Counts and timing of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_profiles: usize,
    pub successful: usize,
    pub failed: usize,
    /// Successful bundles carrying at least one degradation
    pub partial: usize,
    pub duration_ms: u128,
}

impl BatchSummary {
    pub fn from_results(
        results: &[Result<RecommendationBundle, ValidationError>],
        started: Instant,
    ) -> Self {
        let (successful, partial) = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .fold((0, 0), |(ok, partial), bundle| {
                (ok + 1, partial + usize::from(bundle.is_partial()))
            });

        Self {
            total_profiles: results.len(),
            successful,
            failed: results.len() - successful,
            partial,
            duration_ms: started.elapsed().as_millis(),
        }
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed == 0
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Summary\n  \
             Profiles: {}\n  \
             Successful: {}\n  \
             Partial: {}\n  \
             Failed: {}\n  \
             Total Time: {:.2}s",
            self.total_profiles,
            self.successful,
            self.partial,
            self.failed,
            self.duration_ms as f64 / 1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ExerciseCatalog, FoodCatalog};
    use crate::config::EngineConfig;
    use crate::models::{ActivityLevel, FitnessGoal, Gender, MealStatus};
    use chrono::TimeZone;

    fn scenario_profile() -> HealthProfile {
        HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
            .with_goal(FitnessGoal::WeightLoss)
    }

    #[test]
    fn test_scenario_bundle() {
        let engine = RecommendationEngine::builtin();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let bundle = engine.recommend_at(&scenario_profile(), created_at).unwrap();

        assert!((bundle.metrics.bmr - 1798.75).abs() <= 1.0);
        assert_eq!(
            bundle.diet_plan.daily_calories,
            (bundle.metrics.tdee - 500.0).round() as u32
        );
        assert_eq!(bundle.exercise_plan.weekly_frequency, 4);
        assert!(bundle.exercise_plan.split.cardio > bundle.exercise_plan.split.strength);
        assert!(bundle.explanation.feature_importance.contains_key("fitness_goal"));
        assert_eq!(bundle.created_at, created_at);
        assert!(!bundle.is_partial());
    }

    #[test]
    fn test_invalid_profile_fails_fast() {
        let engine = RecommendationEngine::builtin();
        let mut profile = scenario_profile();
        profile.weight_kg = -1.0;

        assert_eq!(
            engine.recommend(&profile),
            Err(ValidationError::NonPositiveWeight { weight_kg: -1.0 })
        );
    }

    #[test]
    fn test_unrepresentable_targets_fail() {
        let engine = RecommendationEngine::builtin();

        let heavy = HealthProfile::new(30, 1e9, 175.0, Gender::Male, ActivityLevel::Moderate);
        assert!(matches!(
            engine.recommend(&heavy),
            Err(ValidationError::CalorieTargetOutOfRange { .. })
        ));

        let degenerate = HealthProfile::new(30, 1e300, 1e-200, Gender::Male, ActivityLevel::Moderate);
        assert!(matches!(
            engine.recommend(&degenerate),
            Err(ValidationError::MetricOutOfRange { metric: "bmi", .. })
        ));
    }

    #[test]
    fn test_empty_catalogs_give_partial_bundle() {
        let reference = ReferenceData::new(
            EngineConfig::default(),
            FoodCatalog::new(Vec::new()),
            ExerciseCatalog::new(Vec::new()),
        )
        .unwrap();
        let engine = RecommendationEngine::new(Arc::new(reference));

        let bundle = engine.recommend(&scenario_profile()).unwrap();
        assert!(bundle.is_partial());
        assert!(bundle.diet_plan.degraded);
        assert!(bundle
            .diet_plan
            .meals
            .iter()
            .all(|m| m.status == MealStatus::Unfilled && m.items.is_empty()));
        assert!(bundle.exercise_plan.degraded);
        assert!(bundle.exercise_plan.workouts.is_empty());
        assert!(bundle.explanation.degradations.len() >= 4);
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let engine = RecommendationEngine::builtin();
        let mut invalid = scenario_profile();
        invalid.age = 0;
        let profiles = vec![
            scenario_profile(),
            invalid,
            HealthProfile::new(52, 64.0, 162.0, Gender::Female, ActivityLevel::Light),
        ];

        let started = Instant::now();
        let results = engine.recommend_batch(&profiles);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        let single = engine
            .recommend_at(&profiles[2], results[2].as_ref().unwrap().created_at)
            .unwrap();
        assert_eq!(results[2].as_ref().unwrap(), &single);

        let summary = BatchSummary::from_results(&results, started);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_fully_successful());
        assert!(summary.to_string_pretty().contains("Failed: 1"));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecommendationEngine>();
    }
}
