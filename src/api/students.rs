use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        attendance::{AttendanceSnapshot, Rank},
        user::{Student, USER_COLUMNS, User, UserRow},
    },
    state::AppContext,
    utils::db_utils::fetch_user,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_TOP_LIMIT: u32 = 10;
const MAX_TOP_LIMIT: u32 = 100;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopStudentsQuery {
    /// How many students to return (default 10, max 100)
    pub limit: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    #[serde(flatten)]
    pub attendance: AttendanceSnapshot,
    pub rank: Rank,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "presentDays": 175,
    "absentDays": 5,
    "leavesRemaining": 25
}))]
pub struct UpdateAttendance {
    pub present_days: u32,
    pub absent_days: u32,
    pub leaves_remaining: u32,
}

/// Students ordered by attendance percentage, best first
async fn load_top_students(ctx: &AppContext, limit: u32) -> Result<Vec<Student>, ApiError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE kind = 'student'
        ORDER BY
            CASE WHEN present_days + absent_days = 0 THEN 0.0
                 ELSE CAST(present_days AS REAL) / (present_days + absent_days)
            END DESC,
            present_days DESC,
            name ASC
        LIMIT ?
        "#
    ))
    .bind(i64::from(limit))
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch top students");
        ApiError::from(e)
    })?;

    rows.into_iter()
        .map(|row| match User::try_from(row)? {
            User::Student(student) => Ok(student),
            User::Staff(staff) => Err(ApiError::internal(anyhow::anyhow!(
                "staff account {} returned as a student",
                staff.id
            ))),
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/staff/top-students",
    params(TopStudentsQuery),
    responses(
        (status = 200, description = "Student accounts (`role: student`) by attendance percentage, descending", body = [Object]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
pub async fn top_students(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<TopStudentsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);

    let students = match ctx.top_students.get(limit).await {
        Some(cached) => {
            tracing::debug!(limit, "Top students served from cache");
            cached
        }
        None => {
            // read before loading so a concurrent invalidation wins
            let epoch = ctx.top_students.epoch();
            let fresh = Arc::new(load_top_students(&ctx, limit).await?);
            ctx.top_students.put(limit, epoch, fresh.clone()).await;
            fresh
        }
    };

    let accounts: Vec<User> = students.iter().cloned().map(User::Student).collect();
    Ok(HttpResponse::Ok().json(accounts))
}

#[utoipa::path(
    get,
    path = "/api/students/me/attendance",
    responses(
        (status = 200, description = "Attendance of the signed in student", body = AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
pub async fn my_attendance(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    let student = auth.load_student(&ctx.pool).await?;

    Ok(HttpResponse::Ok().json(AttendanceSummary {
        attendance: student.attendance.into(),
        rank: student.attendance.rank(),
    }))
}

/* =========================
Record attendance (staff)
========================= */
#[utoipa::path(
    put,
    path = "/api/students/{id}/attendance",
    params(
        ("id" = i64, Path, description = "ID of the student account")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Updated student account (`role: student`)", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Student not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
pub async fn update_attendance(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    let staff = auth.load_staff(&ctx.pool).await?;
    let student_id = path.into_inner();

    if payload.present_days.checked_add(payload.absent_days).is_none() {
        return Err(ApiError::field("absentDays", "Too many days").into());
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET present_days = ?, absent_days = ?, leaves_remaining = ?
        WHERE id = ?
        AND kind = 'student'
        "#,
    )
    .bind(i64::from(payload.present_days))
    .bind(i64::from(payload.absent_days))
    .bind(i64::from(payload.leaves_remaining))
    .bind(student_id)
    .execute(&ctx.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, student_id, "Failed to update attendance");
        ApiError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Student not found").into());
    }

    ctx.top_students.invalidate();

    let Some(User::Student(student)) = fetch_user(&ctx.pool, student_id).await? else {
        return Err(ApiError::NotFound("Student not found").into());
    };

    tracing::info!(
        student_id,
        staff_id = %staff.staff_id,
        present = student.attendance.present_days(),
        absent = student.attendance.absent_days(),
        leaves = student.attendance.leaves_remaining(),
        "Attendance updated"
    );

    Ok(HttpResponse::Ok().json(User::Student(student)))
}
