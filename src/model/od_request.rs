use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::{ModelError, parse_column};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OdType {
    Medical,
    Personal,
    Official,
    Academic,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OdCategory {
    Intercollege,
    Intracollege,
    Other,
}

impl OdCategory {
    /// Inter/intra college requests name the event they are for.
    pub fn needs_event(self) -> bool {
        matches!(self, OdCategory::Intercollege | OdCategory::Intracollege)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display,
    EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OdStatus {
    Pending,
    ApprovedByTutor,
    ApprovedByHod,
    Rejected,
}

impl OdStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OdStatus::ApprovedByHod | OdStatus::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "studentId": 1,
    "studentName": "John Doe",
    "title": "Medical Appointment",
    "description": "Regular health checkup",
    "type": "medical",
    "category": "other",
    "department": "Computer Science",
    "dateFrom": "2025-01-20",
    "dateTo": "2025-01-20",
    "status": "pending",
    "submittedAt": "2025-01-15T09:00:00Z"
}))]
pub struct OdRequest {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub od_type: OdType,
    pub category: OdCategory,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[schema(example = "2025-01-20", format = "date", value_type = String)]
    pub date_from: NaiveDate,
    #[schema(example = "2025-01-20", format = "date", value_type = String)]
    pub date_to: NaiveDate,
    pub status: OdStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hod_comments: Option<String>,
    #[schema(example = "2025-01-15T09:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OdRequestRow {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub title: String,
    pub description: String,
    pub od_type: String,
    pub category: String,
    pub department: String,
    pub event_name: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: String,
    pub file_url: Option<String>,
    pub tutor_comments: Option<String>,
    pub hod_comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

pub const OD_REQUEST_COLUMNS: &str = "id, student_id, student_name, title, description, od_type, \
     category, department, event_name, date_from, date_to, status, file_url, tutor_comments, \
     hod_comments, submitted_at";

impl TryFrom<OdRequestRow> for OdRequest {
    type Error = ModelError;

    fn try_from(row: OdRequestRow) -> Result<Self, Self::Error> {
        Ok(OdRequest {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            title: row.title,
            description: row.description,
            od_type: parse_column("od_type", &row.od_type)?,
            category: parse_column("category", &row.category)?,
            department: row.department,
            event_name: row.event_name,
            date_from: row.date_from,
            date_to: row.date_to,
            status: parse_column("status", &row.status)?,
            file_url: row.file_url,
            tutor_comments: row.tutor_comments,
            hod_comments: row.hod_comments,
            submitted_at: row.submitted_at,
        })
    }
}
