//! Domain entities mirrored from persistent storage.
//!
//! Field names on the wire follow the document shape clients already consume:
//! `_id` for the identifier, snake_case owner references, camelCase elsewhere.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub species: String,
    #[serde(rename = "dateOfPlanting", with = "time::serde::rfc3339")]
    pub date_of_planting: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub image: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthLogRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub plant_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "dateOfDiagnosis", with = "time::serde::rfc3339")]
    pub date_of_diagnosis: OffsetDateTime,
    #[serde(
        rename = "diagnosisByModel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub diagnosis_by_model: Option<String>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn plant_serializes_with_document_field_names() {
        let plant = PlantRecord {
            id: Uuid::nil(),
            user_id: "user-1".to_string(),
            name: "Fern".to_string(),
            species: "Nephrolepis".to_string(),
            date_of_planting: datetime!(2024-03-01 00:00 UTC),
            comment: None,
            image: "https://img.example/fern.png".to_string(),
            created_at: datetime!(2024-03-02 10:00 UTC),
            updated_at: datetime!(2024-03-02 10:00 UTC),
        };

        let value = serde_json::to_value(&plant).expect("serialize plant");
        assert_eq!(value["_id"], Uuid::nil().to_string());
        assert_eq!(value["user_id"], "user-1");
        assert_eq!(value["dateOfPlanting"], "2024-03-01T00:00:00Z");
        assert!(value.get("comment").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn health_log_survives_a_json_trip() {
        let log = HealthLogRecord {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            plant_id: Uuid::new_v4(),
            attachment: Some("https://img.example/leaf.png".to_string()),
            name: None,
            comment: Some("yellow spots".to_string()),
            date_of_diagnosis: datetime!(2024-05-01 08:30 UTC),
            diagnosis_by_model: Some("Likely overwatering.".to_string()),
            created_at: datetime!(2024-05-01 08:31 UTC),
        };

        let text = serde_json::to_string(&log).expect("serialize log");
        assert!(text.contains("\"diagnosisByModel\""));
        let back: HealthLogRecord = serde_json::from_str(&text).expect("deserialize log");
        assert_eq!(back, log);
    }
}
