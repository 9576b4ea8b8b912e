use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use healthxai::catalog::ReferenceData;
use healthxai::diet::DietEngine;
use healthxai::{
    ActivityLevel, ExplainerStrategy, FitnessGoal, Gender, HealthProfile, MealSlot,
    MetricsCalculator, RecommendationEngine,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Performance benchmarks for the recommendation pipeline
///
/// Single requests, the meal assembly search and parallel batches of
/// increasing size.

fn create_benchmark_profile() -> HealthProfile {
    HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
        .with_goal(FitnessGoal::WeightLoss)
}

fn create_profile_dataset(size: usize) -> Vec<HealthProfile> {
    let genders = [Gender::Male, Gender::Female, Gender::Other];
    (0..size)
        .map(|i| {
            let mut profile = HealthProfile::new(
                18 + (i % 60) as u32,
                55.0 + (i % 45) as f64,
                155.0 + (i % 40) as f64,
                genders[i % genders.len()],
                ActivityLevel::ALL[i % ActivityLevel::ALL.len()],
            )
            .with_goal(FitnessGoal::ALL[i % FitnessGoal::ALL.len()]);
            if i % 4 == 0 {
                profile = profile.with_restriction("vegetarian");
            }
            profile
        })
        .collect()
}

fn bench_single_recommendation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Recommendation");
    let profile = create_benchmark_profile();

    let reference = Arc::new(ReferenceData::builtin());
    let rule_based = RecommendationEngine::new(Arc::clone(&reference));
    let sensitivity = RecommendationEngine::new(Arc::clone(&reference))
        .with_strategy(ExplainerStrategy::sensitivity(reference));

    group.bench_function("rule_based", |b| {
        b.iter(|| rule_based.recommend(black_box(&profile)))
    });
    group.bench_function("sensitivity", |b| {
        b.iter(|| sensitivity.recommend(black_box(&profile)))
    });

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let reference = ReferenceData::builtin();
    let calculator = MetricsCalculator::new(&reference.config().activity_multipliers);
    let profile = create_benchmark_profile();

    c.bench_function("metrics_calculate", |b| {
        b.iter(|| calculator.calculate(black_box(&profile)))
    });
}

fn bench_meal_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("Meal Assembly");
    let reference = ReferenceData::builtin();
    let engine = DietEngine::new(reference.config(), reference.foods());
    let no_restrictions = BTreeSet::new();

    for &daily_calories in &[1200u32, 2288, 3500] {
        let macros = DietEngine::macro_targets(
            daily_calories,
            &engine.macro_ratio(&[FitnessGoal::Maintenance]),
        );
        let target = engine.meal_target(MealSlot::Lunch, daily_calories, &macros);
        let candidates = reference.foods().allowed_for(MealSlot::Lunch, &no_restrictions);

        group.bench_with_input(
            BenchmarkId::new("assemble_lunch", daily_calories),
            &target,
            |b, target| {
                b.iter(|| engine.assemble_meal(MealSlot::Lunch, black_box(target), &candidates));
            },
        );
    }

    group.finish();
}

fn bench_batch_recommendation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch Recommendation");
    group.sample_size(20);
    let engine = RecommendationEngine::builtin();

    for &size in &[10, 100, 1000] {
        let profiles = create_profile_dataset(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("recommend_batch", size),
            &profiles,
            |b, profiles| {
                b.iter(|| engine.recommend_batch(profiles));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_recommendation,
    bench_metrics,
    bench_meal_assembly,
    bench_batch_recommendation
);

criterion_main!(benches);
