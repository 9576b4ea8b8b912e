//! Explanations: feature importance, decision factors and confidence
//!
//! Feature weights come from a pluggable [`Explainer`] selected through
//! [`ExplainerStrategy`]. Whatever an explainer returns is renormalized; if it
//! fails or returns nothing usable the base weights are used and the fallback
//! is recorded as a degradation.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::ReferenceData;
use crate::config::{ConfidenceSettings, EngineConfig};
use crate::diet::DietEngine;
use crate::error::ExplainerPluginError;
use crate::exercise::ExerciseEngine;
use crate::metrics::MetricsCalculator;
use crate::models::{
    BmiCategory, DecisionFactor, Degradation, DietPlan, ExercisePlan, Explanation,
    FeatureWeights, FitnessGoal, Gender, HealthProfile, Metrics, MAX_AGE, MIN_AGE,
};

/// Factor names used in feature weights and decision factors
pub mod factors {
    pub const FITNESS_GOAL: &str = "fitness_goal";
    pub const ACTIVITY_LEVEL: &str = "activity_level";
    pub const BMI: &str = "bmi";
    pub const AGE: &str = "age";
    pub const CURRENT_FITNESS: &str = "current_fitness";
    pub const DIETARY_RESTRICTIONS: &str = "dietary_restrictions";
    pub const CALORIE_FLOOR: &str = "calorie_floor";
    pub const EXERCISE_IMPACT: &str = "exercise_impact";
    pub const DEGRADATION: &str = "degradation";
}

/// Everything an explainer may look at
#[derive(Debug, Clone, Copy)]
pub struct ExplanationInput<'a> {
    pub profile: &'a HealthProfile,
    pub metrics: &'a Metrics,
    pub diet_plan: &'a DietPlan,
    pub exercise_plan: &'a ExercisePlan,
}

/// Feature-importance provider
pub trait Explainer: Send + Sync {
    fn name(&self) -> &str;

    /// Raw factor weights; the engine renormalizes them
    fn feature_importance(
        &self,
        input: &ExplanationInput<'_>,
    ) -> Result<FeatureWeights, ExplainerPluginError>;
}

/// Fixed base weights from configuration
#[derive(Debug, Clone)]
pub struct RuleBasedExplainer {
    weights: FeatureWeights,
}

impl RuleBasedExplainer {
    pub const NAME: &'static str = "rule_based";

    pub fn new(config: &EngineConfig) -> Self {
        Self {
            weights: config.explanation.base_weights.to_weights(),
        }
    }
}

impl Explainer for RuleBasedExplainer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn feature_importance(
        &self,
        _input: &ExplanationInput<'_>,
    ) -> Result<FeatureWeights, ExplainerPluginError> {
        Ok(self.weights.clone())
    }
}

/// Perturbation attribution over the calorie target and exercise burn
///
/// Each factor is nudged in both directions (goal swapped for every other
/// goal, activity one level up/down, weight ±5%, age ±5 years) and weighted by
/// the mean absolute change in daily calories. `current_fitness` measures the
/// change in daily exercise burn when the activity level moves.
#[derive(Debug, Clone)]
pub struct SensitivityExplainer {
    reference: Arc<ReferenceData>,
}

impl SensitivityExplainer {
    pub const NAME: &'static str = "sensitivity";

    const WEIGHT_STEP: f64 = 0.05;
    const AGE_STEP: u32 = 5;

    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    fn daily_calories(&self, profile: &HealthProfile) -> f64 {
        let config = self.reference.config();
        let metrics =
            MetricsCalculator::new(&config.activity_multipliers).calculate_unchecked(profile);
        DietEngine::new(config, self.reference.foods())
            .calorie_target(&metrics, &profile.effective_goals())
            .map_or(f64::NAN, |target| target.daily_calories as f64)
    }

    fn daily_burn(&self, profile: &HealthProfile) -> f64 {
        let config = self.reference.config();
        let metrics =
            MetricsCalculator::new(&config.activity_multipliers).calculate_unchecked(profile);
        ExerciseEngine::new(config, self.reference.exercises())
            .recommend(profile, &metrics)
            .map(|plan| plan.total_calories_burned_per_week / 7.0)
            .unwrap_or(0.0)
    }

    fn goal_variants(profile: &HealthProfile) -> Vec<HealthProfile> {
        let current = profile.effective_goals();
        FitnessGoal::ALL
            .iter()
            .filter(|goal| current != [**goal])
            .map(|goal| {
                let mut variant = profile.clone();
                variant.fitness_goal = [*goal].into();
                variant
            })
            .collect()
    }

    fn activity_variants(profile: &HealthProfile) -> Vec<HealthProfile> {
        [profile.activity_level.step_down(), profile.activity_level.step_up()]
            .into_iter()
            .flatten()
            .map(|level| HealthProfile {
                activity_level: level,
                ..profile.clone()
            })
            .collect()
    }

    fn weight_variants(profile: &HealthProfile) -> Vec<HealthProfile> {
        [1.0 - Self::WEIGHT_STEP, 1.0 + Self::WEIGHT_STEP]
            .iter()
            .map(|factor| HealthProfile {
                weight_kg: profile.weight_kg * factor,
                ..profile.clone()
            })
            .collect()
    }

    fn age_variants(profile: &HealthProfile) -> Vec<HealthProfile> {
        let younger = profile.age.saturating_sub(Self::AGE_STEP).max(MIN_AGE);
        let older = (profile.age + Self::AGE_STEP).min(MAX_AGE);
        [younger, older]
            .into_iter()
            .filter(|age| *age != profile.age)
            .map(|age| HealthProfile {
                age,
                ..profile.clone()
            })
            .collect()
    }

    fn mean_abs_delta<F>(baseline: f64, variants: &[HealthProfile], objective: F) -> f64
    where
        F: Fn(&HealthProfile) -> f64,
    {
        if variants.is_empty() {
            return 0.0;
        }
        variants
            .iter()
            .map(|variant| (objective(variant) - baseline).abs())
            .sum::<f64>()
            / variants.len() as f64
    }
}

impl Explainer for SensitivityExplainer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn feature_importance(
        &self,
        input: &ExplanationInput<'_>,
    ) -> Result<FeatureWeights, ExplainerPluginError> {
        let profile = input.profile;
        profile
            .validate()
            .map_err(|e| ExplainerPluginError::new(Self::NAME, e.to_string()))?;

        let calories = |p: &HealthProfile| self.daily_calories(p);
        let burn = |p: &HealthProfile| self.daily_burn(p);
        let baseline_calories = calories(profile);
        let baseline_burn = burn(profile);
        let activity = Self::activity_variants(profile);

        let weights = [
            (
                factors::FITNESS_GOAL,
                Self::mean_abs_delta(baseline_calories, &Self::goal_variants(profile), calories),
            ),
            (
                factors::ACTIVITY_LEVEL,
                Self::mean_abs_delta(baseline_calories, &activity, calories),
            ),
            (
                factors::BMI,
                Self::mean_abs_delta(baseline_calories, &Self::weight_variants(profile), calories),
            ),
            (
                factors::AGE,
                Self::mean_abs_delta(baseline_calories, &Self::age_variants(profile), calories),
            ),
            (
                factors::CURRENT_FITNESS,
                Self::mean_abs_delta(baseline_burn, &activity, burn),
            ),
        ];

        Ok(weights
            .into_iter()
            .map(|(name, weight)| (name.to_string(), weight))
            .collect())
    }
}

/// How feature weights are produced
#[derive(Clone, Default)]
pub enum ExplainerStrategy {
    /// Configured base weights
    #[default]
    RuleBased,
    /// A pluggable explainer, falling back to base weights on failure
    Statistical(Arc<dyn Explainer>),
}

impl ExplainerStrategy {
    pub fn sensitivity(reference: Arc<ReferenceData>) -> Self {
        ExplainerStrategy::Statistical(Arc::new(SensitivityExplainer::new(reference)))
    }

    pub fn name(&self) -> &str {
        match self {
            ExplainerStrategy::RuleBased => RuleBasedExplainer::NAME,
            ExplainerStrategy::Statistical(explainer) => explainer.name(),
        }
    }
}

impl fmt::Debug for ExplainerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplainerStrategy::RuleBased => write!(f, "RuleBased"),
            ExplainerStrategy::Statistical(explainer) => {
                write!(f, "Statistical({})", explainer.name())
            }
        }
    }
}

/// Clamp negative or non-finite weights to zero and scale the rest to sum to 1
pub fn normalize_weights(
    explainer: &str,
    raw: FeatureWeights,
) -> Result<FeatureWeights, ExplainerPluginError> {
    if raw.is_empty() {
        return Err(ExplainerPluginError::new(explainer, "no feature weights returned"));
    }

    let cleaned: FeatureWeights = raw
        .into_iter()
        .map(|(name, weight)| {
            let weight = if weight.is_finite() && weight > 0.0 { weight } else { 0.0 };
            (name, weight)
        })
        .collect();

    let total: f64 = cleaned.values().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(ExplainerPluginError::new(explainer, "all feature weights are zero"));
    }

    Ok(cleaned
        .into_iter()
        .map(|(name, weight)| (name, weight / total))
        .collect())
}

/// Additive confidence score clamped to [0, 1]
///
/// Every profile detail provided can only raise the score; plan degradations
/// do not lower it.
pub fn confidence_score(
    profile: &HealthProfile,
    metrics: &Metrics,
    settings: &ConfidenceSettings,
) -> f64 {
    let mut score = settings.base;

    if !profile.dietary_restrictions.is_empty() {
        score += settings.restrictions_bonus;
    }
    if !profile.fitness_goal.is_empty() {
        score += settings.goals_bonus;
    }
    if matches!(profile.gender, Gender::Male | Gender::Female) {
        score += settings.sex_specific_bonus;
    }
    if metrics.bmi < settings.extreme_bmi_low || metrics.bmi >= settings.extreme_bmi_high {
        score -= settings.extreme_bmi_penalty;
    }
    if profile.age < settings.reliable_age_min || profile.age > settings.reliable_age_max {
        score -= settings.age_penalty;
    }

    score.clamp(0.0, 1.0)
}

/// Non-fatal degradations visible in the plans
pub fn plan_degradations(diet_plan: &DietPlan, exercise_plan: &ExercisePlan) -> Vec<Degradation> {
    let meals = diet_plan.unfilled_meals().map(|meal| Degradation::UnfilledMeal {
        meal: meal.slot,
        reason: meal
            .note
            .clone()
            .unwrap_or_else(|| "no foods available".to_string()),
    });

    let substitutions = exercise_plan
        .substitutions
        .iter()
        .map(|s| Degradation::ExerciseSubstitution {
            missing: s.missing,
            replacement: s.replacement,
            share: s.share,
        });

    meals.chain(substitutions).collect()
}

/// Builds explanations from the shared configuration
#[derive(Debug, Clone, Copy)]
pub struct ExplanationEngine<'a> {
    config: &'a EngineConfig,
}

impl<'a> ExplanationEngine<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Normalized weights from the strategy, or base weights with a fallback record
    pub fn feature_importance(
        &self,
        input: &ExplanationInput<'_>,
        strategy: &ExplainerStrategy,
    ) -> (FeatureWeights, String, Option<Degradation>) {
        let base = RuleBasedExplainer::new(self.config);
        let explainer: &dyn Explainer = match strategy {
            ExplainerStrategy::RuleBased => &base,
            ExplainerStrategy::Statistical(explainer) => explainer.as_ref(),
        };

        let result = explainer
            .feature_importance(input)
            .and_then(|raw| normalize_weights(explainer.name(), raw));

        match result {
            Ok(weights) => (weights, explainer.name().to_string(), None),
            Err(err) => {
                warn!(explainer = %err.explainer, "{}", err);
                let fallback = Degradation::ExplainerFallback {
                    explainer: err.explainer.clone(),
                    reason: err.reason.clone(),
                };
                let weights = self.config.explanation.base_weights.to_weights();
                (weights, base.name().to_string(), Some(fallback))
            }
        }
    }

    /// Ordered narrative of the rules that shaped the plans
    pub fn decision_factors(
        &self,
        input: &ExplanationInput<'_>,
        degradations: &[Degradation],
    ) -> Vec<DecisionFactor> {
        let profile = input.profile;
        let metrics = input.metrics;
        let diet = input.diet_plan;
        let exercise = input.exercise_plan;
        let mut factors_out = Vec::new();

        factors_out.push(DecisionFactor::new(
            factors::BMI,
            bmi_effect(metrics.bmi, metrics.bmi_category),
        ));

        factors_out.push(DecisionFactor::new(
            factors::ACTIVITY_LEVEL,
            format!(
                "{} lifestyle: TDEE is BMR × {:.3} and {} workout sessions per week are planned",
                capitalize(&profile.activity_level.to_string()),
                self.config.activity_multipliers.get(profile.activity_level),
                self.config.weekly_frequency.get(profile.activity_level),
            ),
        ));

        let goals = profile.effective_goals();
        if profile.fitness_goal.is_empty() {
            factors_out.push(DecisionFactor::new(
                factors::FITNESS_GOAL,
                "No goal given: planning for maintenance",
            ));
        }
        for goal in &goals {
            factors_out.push(DecisionFactor::new(factors::FITNESS_GOAL, goal_effect(*goal, self.config)));
        }
        if goals.len() > 1 {
            factors_out.push(DecisionFactor::new(
                factors::FITNESS_GOAL,
                format!(
                    "{} goals combined by averaging: calorie adjustment {:+.0} kcal/day",
                    goals.len(),
                    diet.calorie_adjustment
                ),
            ));
        }

        if !profile.dietary_restrictions.is_empty() {
            let restrictions: Vec<&str> =
                profile.dietary_restrictions.iter().map(|r| r.as_str()).collect();
            factors_out.push(DecisionFactor::new(
                factors::DIETARY_RESTRICTIONS,
                format!("Meals exclude foods conflicting with: {}", restrictions.join(", ")),
            ));
        }

        factors_out.push(DecisionFactor::new(factors::AGE, age_effect(profile.age)));

        if diet.calorie_floor_applied {
            factors_out.push(DecisionFactor::new(
                factors::CALORIE_FLOOR,
                format!(
                    "Calorie target raised to the {} kcal safety minimum",
                    diet.daily_calories
                ),
            ));
        }

        if exercise.low_impact_only {
            factors_out.push(DecisionFactor::new(
                factors::EXERCISE_IMPACT,
                "High-impact exercises excluded because of BMI or age",
            ));
        }

        for degradation in degradations {
            factors_out.push(DecisionFactor::new(factors::DEGRADATION, degradation_effect(degradation)));
        }

        factors_out
    }

    /// Full explanation of a computed recommendation
    pub fn explain(&self, input: &ExplanationInput<'_>, strategy: &ExplainerStrategy) -> Explanation {
        let (feature_importance, explainer, fallback) = self.feature_importance(input, strategy);

        let mut degradations = plan_degradations(input.diet_plan, input.exercise_plan);
        degradations.extend(fallback);

        let decision_factors = self.decision_factors(input, &degradations);
        let confidence = confidence_score(input.profile, input.metrics, &self.config.explanation.confidence);

        debug!(
            explainer = %explainer,
            confidence,
            factors = decision_factors.len(),
            degradations = degradations.len(),
            "Explanation built"
        );

        Explanation {
            feature_importance,
            decision_factors,
            confidence_score: confidence,
            explainer,
            degradations,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bmi_effect(bmi: f64, category: BmiCategory) -> String {
    let effect = match category {
        BmiCategory::Underweight => "energy intake should not drop; strength work is emphasized",
        BmiCategory::Normal => "no BMI-driven adjustment",
        BmiCategory::Overweight => "a moderate calorie deficit and regular cardio help",
        BmiCategory::Obese => "joint-friendly cardio and a sustained deficit are recommended",
    };
    format!("BMI {:.1} ({}): {}", bmi, category, effect)
}

fn goal_effect(goal: FitnessGoal, config: &EngineConfig) -> String {
    let split = config.workout_splits.get(goal);
    let ratio = config.macro_ratios.get(goal);
    format!(
        "{} goal: {:+.0} kcal/day, protein {:.0}% of energy, {:.0}% cardio / {:.0}% strength / {:.0}% flexibility",
        capitalize(&goal.to_string()),
        config.calorie_adjustments.get(goal),
        ratio.protein * 100.0,
        split.cardio * 100.0,
        split.strength * 100.0,
        split.flexibility * 100.0,
    )
}

fn age_effect(age: u32) -> String {
    match age {
        0..=17 => format!("Age {}: adult formulas are less reliable for adolescents", age),
        18..=64 => format!("Age {}: adult reference values apply", age),
        _ => format!("Age {}: lower BMR expected; recovery days are kept between sessions", age),
    }
}

fn degradation_effect(degradation: &Degradation) -> String {
    match degradation {
        Degradation::UnfilledMeal { meal, reason } => {
            format!("{} left empty: {}", capitalize(&meal.to_string()), reason)
        }
        Degradation::ExerciseSubstitution {
            missing,
            replacement: Some(replacement),
            share,
        } => format!(
            "No {} exercises available; {:.0}% of training time moved to {}",
            missing,
            share * 100.0,
            replacement
        ),
        Degradation::ExerciseSubstitution {
            missing,
            replacement: None,
            ..
        } => format!("No {} exercises available and no category to substitute", missing),
        Degradation::ExplainerFallback { explainer, reason } => {
            format!("Explainer '{}' unavailable ({}); base weights used", explainer, reason)
        }
    }
}
