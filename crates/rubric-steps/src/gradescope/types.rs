//! Modelo del `submission_metadata.json` que la plataforma deja junto a la
//! entrega, más las claves compartidas del blackboard de la sesión.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clave de sesión: metadata de la entrega ya deserializada.
pub const KEY_SUBMISSION_METADATA: &str = "gs_submission_metadata";
/// Clave de sesión: `Results` acumulados que el step de salida serializa.
pub const KEY_RESULTS: &str = "gs_results";
/// Clave de sesión: tokens extra otorgados por extensiones del curso.
pub const KEY_EXTRA_TOKENS: &str = "extra_tokens";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub late_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    pub title: String,
    #[serde(default)]
    pub total_points: Option<String>,
}

/// Override por alumno; presente cuando el curso otorgó una extensión.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAssignmentOverride {
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub late_due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub assignment: Option<UserAssignmentOverride>,
}

/// Entrega anterior del mismo alumno, con el puntaje que obtuvo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousSubmission {
    pub submission_time: DateTime<Utc>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub assignment: Assignment,
    #[serde(default)]
    pub submission_method: Option<String>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub previous_submissions: Vec<PreviousSubmission>,
}

impl SubmissionMetadata {
    /// Fecha de entrega efectiva: si el primer usuario trae una extensión
    /// con `due_date`, esa manda; si no, la del assignment.
    pub fn effective_due_date(&self) -> DateTime<Utc> {
        self.users
            .first()
            .and_then(|u| u.assignment.as_ref())
            .and_then(|a| a.due_date)
            .unwrap_or(self.assignment.due_date)
    }

    /// Segundos de atraso crudos respecto de la fecha efectiva; nunca
    /// negativos.
    pub fn lateness_seconds(&self) -> i64 {
        rubric_core::policy::lateness_seconds(self.created_at, self.effective_due_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata_json() -> &'static str {
        r#"{
            "id": 42,
            "created_at": "2024-03-10T12:00:00-05:00",
            "assignment": {
                "due_date": "2024-03-10T10:00:00-05:00",
                "title": "HW3"
            },
            "users": [
                {"email": "a@b.edu", "id": 7, "name": "Ada"}
            ],
            "previous_submissions": [
                {"submission_time": "2024-03-09T12:00:00-05:00", "score": 55.0}
            ]
        }"#
    }

    #[test]
    fn deserializes_platform_json_and_normalizes_offsets() {
        let meta: SubmissionMetadata = serde_json::from_str(metadata_json()).expect("parse");
        assert_eq!(meta.id, 42);
        assert_eq!(meta.created_at, Utc.with_ymd_and_hms(2024, 3, 10, 17, 0, 0).unwrap());
        assert_eq!(meta.users[0].name, "Ada");
        assert_eq!(meta.previous_submissions[0].score, Some(55.0));
    }

    #[test]
    fn user_extension_overrides_the_assignment_due_date() {
        let mut meta: SubmissionMetadata = serde_json::from_str(metadata_json()).expect("parse");
        assert_eq!(meta.lateness_seconds(), 7200);

        let extended = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        meta.users[0].assignment = Some(UserAssignmentOverride {
            due_date: Some(extended),
            late_due_date: None,
        });
        assert_eq!(meta.effective_due_date(), extended);
        assert_eq!(meta.lateness_seconds(), 0);
    }
}
