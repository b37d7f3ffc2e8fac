use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Department value for events open to everybody.
pub const ALL_DEPARTMENTS: &str = "All Departments";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "title": "Annual Sports Day",
    "description": "Inter-department sports competition",
    "date": "2025-02-15",
    "time": "09:00",
    "department": "All Departments",
    "createdBy": "STF042",
    "createdAt": "2025-01-10T08:00:00Z"
}))]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[schema(example = "2025-02-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00")]
    pub time: String,
    pub department: String,
    /// Staff id of the creator
    pub created_by: String,
    #[schema(example = "2025-01-10T08:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
