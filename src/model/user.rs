use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::{ModelError, attendance::{Attendance, AttendanceSnapshot}, count_column, parse_column, require_column};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InstitutionType {
    School,
    College,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Shift {
    Morning,
    Evening,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StaffRole {
    Tutor,
    Hod,
}

/// Account kind as stored in the `users.kind` column and sent on signup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserKind {
    Student,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[schema(example = 101)]
    pub id: i64,
    #[schema(example = "Alice Johnson")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub institution_type: InstitutionType,
    #[schema(example = "CS2021001")]
    pub reg_no: String,
    #[schema(example = "Computer Science")]
    pub department: String,
    #[schema(example = "Bachelor of Technology (B.Tech)")]
    pub degree_name: String,
    #[schema(example = "Computer Science and Engineering")]
    pub stream: String,
    pub shift: Shift,
    #[schema(example = 3)]
    pub year: u8,
    #[schema(value_type = AttendanceSnapshot)]
    pub attendance: Attendance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[schema(example = 2)]
    pub id: i64,
    #[schema(example = "Dr. Rao")]
    pub name: String,
    #[schema(example = "rao@example.com")]
    pub email: String,
    pub institution_type: InstitutionType,
    #[schema(example = "STF042")]
    pub staff_id: String,
    #[schema(example = "Computer Science")]
    pub department: String,
    pub shift: Shift,
    pub staff_role: StaffRole,
}

/// A signed-in account. Serialized with a `role` discriminator so clients can
/// branch on `"student"` / `"staff"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum User {
    Student(Student),
    Staff(Staff),
}

impl User {
    pub fn id(&self) -> i64 {
        match self {
            User::Student(s) => s.id,
            User::Staff(s) => s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            User::Student(s) => &s.name,
            User::Staff(s) => &s.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            User::Student(s) => &s.email,
            User::Staff(s) => &s.email,
        }
    }

    pub fn kind(&self) -> UserKind {
        match self {
            User::Student(_) => UserKind::Student,
            User::Staff(_) => UserKind::Staff,
        }
    }
}

/// Columns of the `users` table. Role specific columns are nullable and are
/// checked when the row is turned into a [`User`].
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub kind: String,
    pub institution_type: String,
    pub department: String,
    pub shift: String,
    pub reg_no: Option<String>,
    pub degree_name: Option<String>,
    pub stream: Option<String>,
    pub year: Option<i64>,
    pub present_days: i64,
    pub absent_days: i64,
    pub leaves_remaining: i64,
    pub staff_id: Option<String>,
    pub staff_role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

pub const USER_COLUMNS: &str = "id, name, email, password, kind, institution_type, department, \
     shift, reg_no, degree_name, stream, year, present_days, absent_days, leaves_remaining, \
     staff_id, staff_role, created_at, last_login_at";

impl TryFrom<UserRow> for User {
    type Error = ModelError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let institution_type = parse_column("institution_type", &row.institution_type)?;
        let shift = parse_column("shift", &row.shift)?;

        match parse_column::<UserKind>("kind", &row.kind)? {
            UserKind::Student => {
                let year = require_column("year", "student", row.year)?;
                let year = u8::try_from(year).map_err(|_| ModelError::OutOfRange {
                    column: "year",
                    value: year,
                })?;
                Ok(User::Student(Student {
                    id: row.id,
                    name: row.name,
                    email: row.email,
                    institution_type,
                    reg_no: require_column("reg_no", "student", row.reg_no)?,
                    department: row.department,
                    degree_name: require_column("degree_name", "student", row.degree_name)?,
                    stream: require_column("stream", "student", row.stream)?,
                    shift,
                    year,
                    attendance: Attendance::new(
                        count_column("present_days", row.present_days)?,
                        count_column("absent_days", row.absent_days)?,
                        count_column("leaves_remaining", row.leaves_remaining)?,
                    ),
                }))
            }
            UserKind::Staff => {
                let staff_role = require_column("staff_role", "staff", row.staff_role)?;
                Ok(User::Staff(Staff {
                    id: row.id,
                    name: row.name,
                    email: row.email,
                    institution_type,
                    staff_id: require_column("staff_id", "staff", row.staff_id)?,
                    department: row.department,
                    shift,
                    staff_role: parse_column("staff_role", &staff_role)?,
                }))
            }
        }
    }
}
