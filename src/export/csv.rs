use super::ExportError;
use crate::models::RecommendationBundle;
use csv::Writer;
use serde::Serialize;
use std::path::Path;

/// One row of the flattened plan: a meal item or an exercise block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    pub kind: &'static str,
    /// Meal slot or weekday
    pub when: String,
    pub name: String,
    pub category: Option<String>,
    pub servings: Option<f64>,
    pub quantity_g: Option<f64>,
    pub duration_minutes: Option<u32>,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fats_g: Option<f64>,
}

/// Flatten the meal items and workouts of a bundle, meals first
pub fn plan_rows(bundle: &RecommendationBundle) -> Vec<PlanRow> {
    let meals = bundle.diet_plan.meals.iter().flat_map(|meal| {
        meal.items.iter().map(move |item| PlanRow {
            kind: "meal",
            when: meal.slot.to_string(),
            name: item.food.clone(),
            category: None,
            servings: Some(item.servings),
            quantity_g: Some(round_tenth(item.quantity_g)),
            duration_minutes: None,
            calories: round_tenth(item.calories),
            protein_g: Some(round_tenth(item.protein_g)),
            carbs_g: Some(round_tenth(item.carbs_g)),
            fats_g: Some(round_tenth(item.fats_g)),
        })
    });

    let exercises = bundle.exercise_plan.workouts.iter().flat_map(|workout| {
        workout.exercises.iter().map(move |entry| PlanRow {
            kind: "exercise",
            when: workout.day.to_string(),
            name: entry.name.clone(),
            category: Some(entry.category.to_string()),
            servings: None,
            quantity_g: None,
            duration_minutes: Some(entry.duration_minutes),
            calories: entry.calories_burned,
            protein_g: None,
            carbs_g: None,
            fats_g: None,
        })
    });

    meals.chain(exercises).collect()
}

/// Render the plan rows as CSV with a header line
pub fn render_plan_rows(bundle: &RecommendationBundle) -> Result<String, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    for row in plan_rows(bundle) {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Export the plan rows to a CSV file
pub fn export_plan_rows<P: AsRef<Path>>(
    bundle: &RecommendationBundle,
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(output_path)?;
    for row in plan_rows(bundle) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
