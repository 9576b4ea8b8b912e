//! Unified error hierarchy for healthxai
//!
//! Fatal input errors, partial-capability failures that the engines recover
//! from locally, and the ambient configuration/IO errors of the CLI.

use thiserror::Error;

use crate::export::ExportError;
use crate::models::{ExerciseCategory, MealSlot};

/// Top-level error type for all healthxai operations
#[derive(Debug, Error)]
pub enum HealthXaiError {
    /// Invalid input profile; aborts the whole computation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A meal could not be assembled from the allowed foods
    #[error("Diet planning error: {0}")]
    InsufficientCatalog(#[from] InsufficientCatalogError),

    /// A workout category had no exercises to draw from
    #[error("Exercise planning error: {0}")]
    NoExercisesAvailable(#[from] NoExercisesAvailableError),

    /// The pluggable explainer failed
    #[error("Explainer error: {0}")]
    ExplainerPlugin(#[from] ExplainerPluginError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile values outside the range the formulas are defined for
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("age {age} is outside the supported range 1-120")]
    AgeOutOfRange { age: u32 },

    #[error("weight must be positive, got {weight_kg} kg")]
    NonPositiveWeight { weight_kg: f64 },

    #[error("height must be positive, got {height_cm} cm")]
    NonPositiveHeight { height_cm: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("derived {metric} is not a finite number ({value})")]
    MetricOutOfRange { metric: &'static str, value: f64 },

    #[error("daily calorie target {calories} kcal is outside the representable range")]
    CalorieTargetOutOfRange { calories: f64 },
}

/// The food catalog cannot reach a meal's energy target within tolerance
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "cannot fill {meal}: best combination of {candidates} allowed foods reached {achieved_calories:.0} of {target_calories:.0} kcal"
)]
pub struct InsufficientCatalogError {
    pub meal: MealSlot,
    pub target_calories: f64,
    pub achieved_calories: f64,
    /// Number of foods left after restriction filtering
    pub candidates: usize,
}

/// A category with a positive share in the split has an empty exercise pool
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no {category} exercises available for a {:.0}% share of the split", .share * 100.0)]
pub struct NoExercisesAvailableError {
    pub category: ExerciseCategory,
    pub share: f64,
}

/// The pluggable explainer could not produce usable weights
#[derive(Debug, Clone, PartialEq, Error)]
#[error("explainer '{explainer}' failed: {reason}")]
pub struct ExplainerPluginError {
    pub explainer: String,
    pub reason: String,
}

impl ExplainerPluginError {
    pub fn new(explainer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            explainer: explainer.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for healthxai operations
pub type Result<T> = std::result::Result<T, HealthXaiError>;

impl HealthXaiError {
    /// Check if the engine recovers from this error with a degraded result
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HealthXaiError::InsufficientCatalog(_)
                | HealthXaiError::NoExercisesAvailable(_)
                | HealthXaiError::ExplainerPlugin(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealthXaiError::Validation(_) => ErrorSeverity::Error,
            HealthXaiError::InsufficientCatalog(_) => ErrorSeverity::Warning,
            HealthXaiError::NoExercisesAvailable(_) => ErrorSeverity::Warning,
            HealthXaiError::ExplainerPlugin(_) => ErrorSeverity::Info,
            HealthXaiError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HealthXaiError::Validation(err) => {
                format!("Please check your profile: {}", err)
            }
            HealthXaiError::InsufficientCatalog(err) => {
                format!(
                    "Your dietary restrictions leave too few foods for {}. Try relaxing a restriction.",
                    err.meal
                )
            }
            HealthXaiError::NoExercisesAvailable(err) => {
                format!("No {} exercises suit your profile; time was moved to other categories.", err.category)
            }
            HealthXaiError::ExplainerPlugin(_) => {
                "Detailed feature analysis is unavailable; standard weights were used.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
