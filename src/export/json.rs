use super::ExportError;
use crate::models::RecommendationBundle;
use std::io::Write;
use std::path::Path;

/// Serialize a bundle to pretty-printed JSON
pub fn to_json(bundle: &RecommendationBundle) -> Result<String, ExportError> {
    serde_json::to_string_pretty(bundle).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Parse a bundle previously produced by [`to_json`]
pub fn from_json(json: &str) -> Result<RecommendationBundle, ExportError> {
    serde_json::from_str(json).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::SerializationError(e.to_string()))?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, FitnessGoal, Gender, HealthProfile};
    use crate::recommend::RecommendationEngine;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn sample_bundle() -> RecommendationBundle {
        let profile = HealthProfile::new(30, 85.0, 175.0, Gender::Male, ActivityLevel::Moderate)
            .with_goal(FitnessGoal::WeightLoss)
            .with_restriction("nut-free");
        RecommendationEngine::builtin()
            .recommend_at(&profile, Utc.with_ymd_and_hms(2024, 5, 20, 12, 30, 0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_bundle_top_level_keys() {
        let json = to_json(&sample_bundle()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["created_at", "diet_plan", "exercise_plan", "explanation", "metrics"]
        );
        assert_eq!(object["created_at"], "2024-05-20T12:30:00Z");
    }

    #[test]
    fn test_json_round_trip() {
        let bundle = sample_bundle();
        let restored = from_json(&to_json(&bundle).unwrap()).unwrap();
        assert_eq!(restored, bundle);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            from_json("{\"metrics\": 1}"),
            Err(ExportError::SerializationError(_))
        ));
    }

    #[test]
    fn test_export_json_generic() {
        #[derive(serde::Serialize)]
        struct TestData {
            name: String,
            value: u32,
        }

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        let temp_file = NamedTempFile::new().unwrap();
        export_json(&data, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"name\": \"test\""));
        assert!(content.contains("\"value\": 42"));
    }
}
