use healthxai::catalog::{ExerciseCatalog, FoodCatalog, ReferenceData};
use healthxai::config::{load_profile, AppConfig, EngineConfig};
use healthxai::export::{self, json, ExportFormat};
use healthxai::error::ValidationError;
use healthxai::{
    advice_context, ActivityLevel, BatchSummary, Degradation, ExplainerStrategy, FitnessGoal,
    Gender, HealthProfile, MealStatus, RecommendationEngine, TrackingTemplate,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Integration tests that exercise the complete recommendation workflow

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn scenario_profile() -> HealthProfile {
        HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
            .with_goal(FitnessGoal::WeightLoss)
    }

    #[test]
    fn test_complete_recommendation_workflow() {
        let engine = RecommendationEngine::builtin();
        let bundle = engine.recommend(&scenario_profile()).unwrap();

        // Mifflin-St Jeor: 10*85 + 6.25*175 - 5*30 + 5
        assert!((bundle.metrics.bmr - 1798.75).abs() < 1.0);
        assert!((bundle.metrics.tdee - 2788.0625).abs() < 1e-6);
        assert_eq!(
            bundle.diet_plan.daily_calories,
            (bundle.metrics.tdee - 500.0).round() as u32
        );

        let macro_energy = bundle.diet_plan.macros.calories() as f64;
        let daily = bundle.diet_plan.daily_calories as f64;
        assert!((macro_energy - daily).abs() / daily <= 0.01);

        assert_eq!(bundle.diet_plan.meals.len(), 4);
        assert!(bundle.diet_plan.meals.iter().all(|m| m.status == MealStatus::Filled));
        assert_eq!(bundle.exercise_plan.weekly_frequency, 4);
        assert_eq!(bundle.exercise_plan.workouts.len(), 4);

        let weight_sum: f64 = bundle.explanation.feature_importance.values().sum();
        assert!((weight_sum - 1.0).abs() < 0.001);
        assert!((0.0..=1.0).contains(&bundle.explanation.confidence_score));
        assert!(!bundle.is_partial());
    }

    #[test]
    fn test_multi_goal_sedentary_adjustment() {
        let profile = HealthProfile::new(52, 96.0, 170.0, Gender::Female, ActivityLevel::Sedentary)
            .with_goal(FitnessGoal::WeightLoss)
            .with_goal(FitnessGoal::MuscleGain);
        let bundle = RecommendationEngine::builtin().recommend(&profile).unwrap();

        assert_eq!(bundle.diet_plan.calorie_adjustment, -75.0);
        assert_eq!(
            bundle.diet_plan.daily_calories,
            (bundle.metrics.tdee - 75.0).round() as u32
        );
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let engine = RecommendationEngine::builtin();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let bundle = engine
            .recommend_at(&scenario_profile().with_restriction("vegetarian"), created_at)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        export::export_bundle(&bundle, ExportFormat::Json, &path).unwrap();

        let restored = json::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, bundle);
        assert_eq!(restored.created_at, created_at);
    }

    #[test]
    fn test_extreme_profiles_are_rejected() {
        let engine = RecommendationEngine::builtin();

        let heavy = HealthProfile::new(30, 1e9, 175.0, Gender::Male, ActivityLevel::Moderate);
        let err = engine.recommend(&heavy).unwrap_err();
        assert!(matches!(err, ValidationError::CalorieTargetOutOfRange { .. }));

        let degenerate =
            HealthProfile::new(30, 1e300, 1e-200, Gender::Female, ActivityLevel::Light);
        let err = engine.recommend(&degenerate).unwrap_err();
        assert!(matches!(err, ValidationError::MetricOutOfRange { metric: "bmi", .. }));
    }

    #[test]
    fn test_batch_recommendations() {
        let mut invalid = scenario_profile();
        invalid.age = 0;

        let profiles = vec![
            scenario_profile(),
            invalid,
            HealthProfile::new(24, 58.0, 163.0, Gender::Female, ActivityLevel::Very)
                .with_goal(FitnessGoal::Endurance),
            HealthProfile::new(67, 74.0, 171.0, Gender::Other, ActivityLevel::Light),
        ];

        let engine = RecommendationEngine::builtin();
        let started = Instant::now();
        let results = engine.recommend_batch(&profiles);
        let summary = BatchSummary::from_results(&results, started);

        assert_eq!(results.len(), 4);
        assert!(results[1].is_err());
        assert_eq!(summary.total_profiles, 4);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_fully_successful());

        let single = engine.recommend(&profiles[0]).unwrap();
        let batched = results[0].as_ref().unwrap();
        assert_eq!(batched.metrics, single.metrics);
        assert_eq!(batched.diet_plan, single.diet_plan);
        assert_eq!(batched.exercise_plan, single.exercise_plan);

        // One timestamp for the whole batch
        assert_eq!(
            results[0].as_ref().unwrap().created_at,
            results[2].as_ref().unwrap().created_at
        );
    }

    #[test]
    fn test_empty_food_catalog_gives_partial_bundle() {
        let reference = ReferenceData::new(
            EngineConfig::default(),
            FoodCatalog::new(Vec::new()),
            ExerciseCatalog::builtin(),
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
        assert_eq!(
            bundle
                .explanation
                .degradations
                .iter()
                .filter(|d| matches!(d, Degradation::UnfilledMeal { .. }))
                .count(),
            4
        );
        // Calorie and macro targets do not depend on the catalog
        assert_eq!(bundle.diet_plan.daily_calories, 2288);
        assert!(!bundle.exercise_plan.workouts.is_empty());
    }

    #[test]
    fn test_sensitivity_explainer_end_to_end() {
        let reference = Arc::new(ReferenceData::builtin());
        let engine = RecommendationEngine::new(Arc::clone(&reference))
            .with_strategy(ExplainerStrategy::sensitivity(reference));
        let bundle = engine.recommend(&scenario_profile()).unwrap();

        assert_eq!(bundle.explanation.explainer, "sensitivity");
        let weight_sum: f64 = bundle.explanation.feature_importance.values().sum();
        assert!((weight_sum - 1.0).abs() < 0.001);
        assert!(bundle.explanation.feature_importance.values().all(|w| *w >= 0.0));
    }

    #[test]
    fn test_profile_and_config_files() {
        let dir = tempfile::tempdir().unwrap();

        let profile_path = dir.path().join("profile.toml");
        std::fs::write(
            &profile_path,
            r#"
age = 30
weight_kg = 85.0
height_cm = 175.0
gender = "male"
activity_level = "moderate"
fitness_goal = ["weight_loss"]
"#,
        )
        .unwrap();
        let profile = load_profile(&profile_path).unwrap();
        assert_eq!(profile, scenario_profile());

        let mut config = AppConfig::default();
        config.engine.calorie_adjustments.weight_loss = -400.0;
        let config_path = dir.path().join("config.toml");
        config.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        let engine = RecommendationEngine::new(loaded.load_reference_data().unwrap());
        let bundle = engine.recommend(&profile).unwrap();
        assert_eq!(bundle.diet_plan.daily_calories, 2388);
    }

    #[test]
    fn test_advice_and_tracking_outputs() {
        let profile = scenario_profile().with_restriction("vegan");
        let bundle = RecommendationEngine::builtin().recommend(&profile).unwrap();

        let context = advice_context(&profile, &bundle);
        assert_eq!(context.goal, "weight loss");
        assert_eq!(context.daily_calories, bundle.diet_plan.daily_calories);
        assert!(context.dietary_focus.ends_with("vegan"));

        let template = TrackingTemplate::from_bundle(&bundle);
        assert_eq!(template.days.len(), 7);
        let planned_sessions = template.days.iter().filter(|d| !d.exercises.is_empty()).count();
        assert_eq!(planned_sessions, bundle.exercise_plan.workouts.len());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn gender() -> impl Strategy<Value = Gender> {
        prop_oneof![Just(Gender::Male), Just(Gender::Female), Just(Gender::Other)]
    }

    fn activity() -> impl Strategy<Value = ActivityLevel> {
        prop::sample::select(ActivityLevel::ALL.to_vec())
    }

    fn goals() -> impl Strategy<Value = Vec<FitnessGoal>> {
        prop::sample::subsequence(FitnessGoal::ALL.to_vec(), 0..=4)
    }

    fn restrictions() -> impl Strategy<Value = Vec<&'static str>> {
        prop::sample::subsequence(vec!["vegan", "gluten-free", "nut-free", "dairy-free"], 0..=2)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn bundle_invariants_hold(
            age in 1u32..=120,
            weight in 30.0f64..200.0,
            height in 120.0f64..220.0,
            gender in gender(),
            activity in activity(),
            goals in goals(),
            restrictions in restrictions(),
        ) {
            let mut profile = HealthProfile::new(age, weight, height, gender, activity);
            for goal in goals {
                profile = profile.with_goal(goal);
            }
            for restriction in restrictions {
                profile = profile.with_restriction(restriction);
            }

            let bundle = RecommendationEngine::builtin().recommend(&profile).unwrap();

            let restored = json::from_json(&json::to_json(&bundle).unwrap()).unwrap();
            prop_assert_eq!(&restored, &bundle);

            let weight_sum: f64 = bundle.explanation.feature_importance.values().sum();
            prop_assert!((weight_sum - 1.0).abs() < 0.001);
            prop_assert!((0.0..=1.0).contains(&bundle.explanation.confidence_score));

            let daily = bundle.diet_plan.daily_calories as f64;
            prop_assert!(daily >= 1200.0);
            let macro_energy = bundle.diet_plan.macros.calories() as f64;
            prop_assert!((macro_energy - daily).abs() / daily <= 0.01);

            let split = &bundle.exercise_plan.split;
            prop_assert!((split.total() - 1.0).abs() < 1e-9);
            prop_assert_eq!(
                bundle.exercise_plan.workouts.len() as u32,
                bundle.exercise_plan.weekly_frequency
            );
        }
    }
}
