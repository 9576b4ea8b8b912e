// Library interface for the healthxai recommendation engine
// The binary and the integration tests both build on these modules

pub mod catalog;
pub mod config;
pub mod diet;
pub mod error;
pub mod exercise;
pub mod explain;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod recommend;

// Re-export commonly used types for convenience
pub use models::*;
pub use catalog::{ExerciseCatalog, FoodCatalog, ReferenceData};
pub use config::{AppConfig, EngineConfig};
pub use diet::DietEngine;
pub use exercise::ExerciseEngine;
pub use explain::{
    Explainer, ExplainerStrategy, ExplanationEngine, ExplanationInput, RuleBasedExplainer,
    SensitivityExplainer,
};
pub use export::{advice_context, export_bundle, AdviceContext, ExportFormat, TrackingTemplate};
pub use metrics::MetricsCalculator;
pub use recommend::{BatchSummary, RecommendationEngine};
pub use error::{HealthXaiError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
