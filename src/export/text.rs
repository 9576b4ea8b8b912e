use super::ExportError;
use crate::catalog::normalize_tag;
use crate::models::{FitnessGoal, HealthProfile, MealStatus, RecommendationBundle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Human-readable report of a bundle
pub fn render_report(bundle: &RecommendationBundle) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, bundle);
    out
}

fn write_report(out: &mut String, bundle: &RecommendationBundle) -> std::fmt::Result {
    let metrics = &bundle.metrics;
    let diet = &bundle.diet_plan;
    let exercise = &bundle.exercise_plan;
    let explanation = &bundle.explanation;

    writeln!(out, "{:=<60}", "")?;
    writeln!(out, "HEALTH RECOMMENDATION")?;
    writeln!(out, "{:=<60}", "")?;
    writeln!(out, "Generated: {}", bundle.created_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out)?;

    writeln!(out, "BODY METRICS")?;
    writeln!(out, "{:-<60}", "")?;
    writeln!(out, "BMI: {:.1} ({})", metrics.bmi, metrics.bmi_category)?;
    writeln!(out, "BMR: {:.0} kcal/day", metrics.bmr)?;
    writeln!(out, "TDEE: {:.0} kcal/day", metrics.tdee)?;
    writeln!(out)?;

    writeln!(out, "DIET PLAN")?;
    writeln!(out, "{:-<60}", "")?;
    write!(out, "Daily Calories: {} kcal", diet.daily_calories)?;
    if diet.calorie_floor_applied {
        write!(out, " (safety minimum)")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Macros: {} g protein, {} g carbs, {} g fat",
        diet.macros.protein_g, diet.macros.carbs_g, diet.macros.fats_g
    )?;
    for meal in &diet.meals {
        writeln!(out)?;
        match meal.status {
            MealStatus::Filled => writeln!(
                out,
                "{} ({:.0} / {:.0} kcal)",
                meal.slot.to_string().to_uppercase(),
                meal.calories,
                meal.target_calories
            )?,
            MealStatus::Unfilled => writeln!(
                out,
                "{} (unfilled: {})",
                meal.slot.to_string().to_uppercase(),
                meal.note.as_deref().unwrap_or("no foods available")
            )?,
        }
        for item in &meal.items {
            writeln!(
                out,
                "  • {:<26} {:>5.0} g  {:>5.0} kcal",
                item.food, item.quantity_g, item.calories
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "EXERCISE PLAN")?;
    writeln!(out, "{:-<60}", "")?;
    writeln!(
        out,
        "{} sessions/week, {} minutes ({:.0}% cardio, {:.0}% strength, {:.0}% flexibility)",
        exercise.weekly_frequency,
        exercise.weekly_minutes,
        exercise.split.cardio * 100.0,
        exercise.split.strength * 100.0,
        exercise.split.flexibility * 100.0
    )?;
    if exercise.low_impact_only {
        writeln!(out, "Low-impact exercises only")?;
    }
    for workout in &exercise.workouts {
        writeln!(out)?;
        writeln!(out, "{} ({} min)", workout.day, workout.total_minutes())?;
        for entry in &workout.exercises {
            writeln!(
                out,
                "  • {:<22} {:<12} {:>3} min  {:>6.1} kcal",
                entry.name,
                entry.category.to_string(),
                entry.duration_minutes,
                entry.calories_burned
            )?;
        }
    }
    writeln!(
        out,
        "\nEstimated burn: {:.0} kcal/week",
        exercise.total_calories_burned_per_week
    )?;
    writeln!(out)?;

    writeln!(out, "WHY THIS PLAN")?;
    writeln!(out, "{:-<60}", "")?;
    writeln!(out, "Confidence: {:.0}%", explanation.confidence_score * 100.0)?;
    writeln!(out, "Feature importance ({}):", explanation.explainer)?;
    let mut weights: Vec<(&String, &f64)> = explanation.feature_importance.iter().collect();
    weights.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (factor, weight) in weights {
        writeln!(out, "  {:<18} {:>5.1}%", factor, weight * 100.0)?;
    }
    writeln!(out, "Decision factors:")?;
    for factor in &explanation.decision_factors {
        writeln!(out, "  • [{}] {}", factor.factor, factor.effect_description)?;
    }

    Ok(())
}

/// Export the text report to a file
pub fn export_report<P: AsRef<Path>>(
    bundle: &RecommendationBundle,
    output_path: P,
) -> Result<(), ExportError> {
    std::fs::write(output_path, render_report(bundle))?;
    Ok(())
}

/// Plan summary handed to the advice text generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceContext {
    pub goal: String,
    pub daily_calories: u32,
    pub workout_frequency: u32,
    pub dietary_focus: String,
}

impl AdviceContext {
    /// Prompt-ready summary block
    pub fn to_prompt(&self) -> String {
        format!(
            "Current Plan Summary:\n\
             - Goal: {}\n\
             - Daily Calories: {}\n\
             - Workout Frequency: {} sessions/week\n\
             - Dietary Focus: {}",
            self.goal, self.daily_calories, self.workout_frequency, self.dietary_focus
        )
    }
}

/// Summarize a profile's bundle for the advice generator
pub fn advice_context(profile: &HealthProfile, bundle: &RecommendationBundle) -> AdviceContext {
    let goals = profile.effective_goals();
    let goal = goals
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(" + ");

    let mut focus: Vec<String> = Vec::new();
    for goal in &goals {
        let emphasis = match goal {
            FitnessGoal::WeightLoss => "calorie deficit with high protein",
            FitnessGoal::MuscleGain => "calorie surplus with high protein",
            FitnessGoal::Maintenance => "balanced",
            FitnessGoal::Endurance => "carbohydrate-rich",
        };
        if !focus.iter().any(|f| f == emphasis) {
            focus.push(emphasis.to_string());
        }
    }
    if !profile.dietary_restrictions.is_empty() {
        let restrictions: Vec<String> = profile
            .dietary_restrictions
            .iter()
            .map(|r| normalize_tag(r))
            .collect();
        focus.push(restrictions.join(", "));
    }

    AdviceContext {
        goal,
        daily_calories: bundle.diet_plan.daily_calories,
        workout_frequency: bundle.exercise_plan.weekly_frequency,
        dietary_focus: focus.join("; "),
    }
}
