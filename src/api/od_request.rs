use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        od_request::{OD_REQUEST_COLUMNS, OdCategory, OdRequest, OdRequestRow, OdStatus, OdType},
        role::Role,
        user::StaffRole,
    },
    state::AppContext,
    utils::{
        db_utils::{SqlValue, WhereClause, fetch_od_request},
        validators::Checks,
    },
    workflow::{self, Decision},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "title": "Hackathon",
    "description": "Representing the department at the state hackathon",
    "type": "academic",
    "category": "intercollege",
    "department": "Computer Science",
    "eventName": "Hackathon",
    "dateFrom": "2025-02-20",
    "dateTo": "2025-02-21"
}))]
pub struct CreateOdRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub od_type: OdType,
    pub category: OdCategory,
    /// Defaults to the student's own department
    pub department: Option<String>,
    pub event_name: Option<String>,
    #[schema(example = "2025-02-20", format = "date", value_type = String)]
    pub date_from: NaiveDate,
    #[schema(example = "2025-02-21", format = "date", value_type = String)]
    pub date_to: NaiveDate,
    /// Reference to an uploaded attachment
    pub file_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReq {
    #[serde(default)]
    #[schema(example = "ok")]
    pub comments: String,
    /// When present it must match the caller's own staff role
    pub approver_role: Option<StaffRole>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OdRequestFilter {
    /// Only requests of this student
    pub student_id: Option<i64>,
    /// Only requests in this status
    #[param(value_type = Option<String>, example = "pending")]
    pub status: Option<OdStatus>,
}

/// A request as listed to the caller. `canAct` is only present for staff.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OdRequestView {
    #[serde(flatten)]
    pub request: OdRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_act: Option<bool>,
}

impl OdRequestView {
    fn for_role(request: OdRequest, role: Role) -> Self {
        let can_act = role
            .staff_role()
            .map(|staff_role| workflow::can_act(staff_role, request.status));
        Self { request, can_act }
    }
}

fn validate_create(payload: &CreateOdRequest) -> Result<(), ApiError> {
    Checks::new()
        .required(&payload.title, "title", "Title is required")
        .required(&payload.description, "description", "Description is required")
        .check(
            payload.department.as_deref().is_none_or(|d| !d.trim().is_empty()),
            "department",
            "Department must not be blank",
        )
        .check(
            payload.date_from <= payload.date_to,
            "dateTo",
            "dateTo cannot be before dateFrom",
        )
        .check(
            !payload.category.needs_event()
                || payload.event_name.as_deref().is_some_and(|e| !e.trim().is_empty()),
            "eventName",
            "Event name is required for inter/intra college requests",
        )
        .finish()
}

/// Checks that the caller may see `request`.
fn ensure_visible(auth: &AuthUser, request: &OdRequest) -> Result<(), ApiError> {
    let allowed = match auth.role.staff_role() {
        None => request.student_id == auth.user_id,
        Some(role) => workflow::is_visible_to(role, request.status),
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not allowed to view this request"))
    }
}

/* =========================
Submit OD request (student)
========================= */
#[utoipa::path(
    post,
    path = "/api/od-requests",
    request_body(
        content = CreateOdRequest,
        description = "OD request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "OD request submitted", body = OdRequest),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OD Requests"
)]
pub async fn create_od_request(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<CreateOdRequest>,
) -> actix_web::Result<impl Responder> {
    let student = auth.load_student(&ctx.pool).await?;

    validate_create(&payload)?;

    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .unwrap_or(&student.department)
        .to_string();
    let event_name = payload
        .category
        .needs_event()
        .then(|| payload.event_name.as_deref().map(str::trim))
        .flatten();
    let submitted_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO od_requests
            (student_id, student_name, title, description, od_type, category, department,
             event_name, date_from, date_to, status, file_url, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student.id)
    .bind(&student.name)
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(payload.od_type.as_ref())
    .bind(payload.category.as_ref())
    .bind(&department)
    .bind(event_name)
    .bind(payload.date_from)
    .bind(payload.date_to)
    .bind(OdStatus::Pending.as_ref())
    .bind(payload.file_url.as_deref())
    .bind(submitted_at)
    .execute(&ctx.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, student_id = student.id, "Failed to create OD request");
        ApiError::from(e)
    })?;

    let id = result.last_insert_rowid();
    tracing::info!(od_request_id = id, student_id = student.id, "OD request submitted");

    let created = fetch_od_request(&ctx.pool, id)
        .await?
        .ok_or(ApiError::NotFound("OD request not found"))?;

    Ok(HttpResponse::Created().json(created))
}

/// OD requests visible to the caller
#[utoipa::path(
    get,
    path = "/api/od-requests",
    params(OdRequestFilter),
    responses(
        (status = 200, description = "OD requests, newest first", body = [OdRequestView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students may only list their own requests")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OD Requests"
)]
pub async fn list_od_requests(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<OdRequestFilter>,
) -> actix_web::Result<impl Responder> {
    let mut clause = WhereClause::new();

    match auth.role.staff_role() {
        None => {
            if query.student_id.is_some_and(|id| id != auth.user_id) {
                return Err(ApiError::forbidden("Students may only list their own requests").into());
            }
            clause.and("student_id = ?", SqlValue::Int(auth.user_id));
        }
        Some(_) => {
            if let Some(student_id) = query.student_id {
                clause.and("student_id = ?", SqlValue::Int(student_id));
            }
        }
    }

    if let Some(status) = query.status {
        clause.and("status = ?", SqlValue::Text(status.as_ref().to_string()));
    }

    let sql = format!(
        "SELECT {OD_REQUEST_COLUMNS} FROM od_requests{} ORDER BY submitted_at DESC, id DESC",
        clause.sql()
    );

    let rows = clause
        .bind(sqlx::query_as::<_, OdRequestRow>(&sql))
        .fetch_all(&ctx.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch OD request list");
            ApiError::from(e)
        })?;

    let requests = rows
        .into_iter()
        .map(OdRequest::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::from)?;

    let requests = match auth.role.staff_role() {
        Some(role) => workflow::visible_requests(requests, role),
        None => requests,
    };

    let views: Vec<_> = requests
        .into_iter()
        .map(|r| OdRequestView::for_role(r, auth.role))
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    get,
    path = "/api/od-requests/{id}",
    params(
        ("id" = i64, Path, description = "ID of the OD request")
    ),
    responses(
        (status = 200, description = "OD request found", body = OdRequestView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "OD request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OD Requests"
)]
pub async fn get_od_request(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let request = fetch_od_request(&ctx.pool, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("OD request not found"))?;

    ensure_visible(&auth, &request)?;

    Ok(HttpResponse::Ok().json(OdRequestView::for_role(request, auth.role)))
}

/// Runs a staff decision through the workflow and persists it.
/// Writes a decided request back, provided it is still in `previous`.
/// The status check makes concurrent decisions on one request exclusive.
async fn record_decision(
    pool: &SqlitePool,
    request: &OdRequest,
    previous: OdStatus,
) -> Result<(), ApiError> {
    let result = sqlx::query(
        r#"
        UPDATE od_requests
        SET status = ?, tutor_comments = ?, hod_comments = ?, updated_at = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(request.status.as_ref())
    .bind(request.tutor_comments.as_deref())
    .bind(request.hod_comments.as_deref())
    .bind(Utc::now())
    .bind(request.id)
    .bind(previous.as_ref())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, od_request_id = request.id, "Failed to record decision");
        ApiError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict("OD request was updated by someone else"));
    }
    Ok(())
}

async fn decide(
    auth: AuthUser,
    ctx: &AppContext,
    id: i64,
    body: DecisionReq,
    decision: Decision,
) -> Result<OdRequest, ApiError> {
    let staff = auth.load_staff(&ctx.pool).await?;

    if body.approver_role.is_some_and(|r| r != staff.staff_role) {
        return Err(ApiError::forbidden(format!(
            "approverRole does not match your role ({})",
            staff.staff_role
        )));
    }

    if body.comments.trim().is_empty() {
        return Err(workflow::WorkflowError::MissingComments(decision).into());
    }

    let mut request = fetch_od_request(&ctx.pool, id)
        .await?
        .ok_or(ApiError::NotFound("OD request not found"))?;

    let previous = workflow::apply(&mut request, staff.staff_role, decision, &body.comments)
        .inspect_err(|e| {
            tracing::info!(od_request_id = id, staff_id = %staff.staff_id, reason = %e, "Decision refused");
        })?;

    record_decision(&ctx.pool, &request, previous).await?;

    tracing::info!(
        od_request_id = id,
        staff_id = %staff.staff_id,
        decision = %decision,
        from = %previous,
        to = %request.status,
        "OD request decided"
    );

    Ok(request)
}

/* =========================
Approve OD request (tutor / HOD)
========================= */
#[utoipa::path(
    post,
    path = "/api/od-requests/{id}/approve",
    params(
        ("id" = i64, Path, description = "ID of the OD request to approve")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "OD request approved", body = OdRequest),
        (status = 400, description = "Comments missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No such transition for the caller's role"),
        (status = 404, description = "OD request not found"),
        (status = 409, description = "Request changed concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OD Requests"
)]
pub async fn approve_od_request(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    body: web::Json<DecisionReq>,
) -> actix_web::Result<impl Responder> {
    let request = decide(auth, &ctx, path.into_inner(), body.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject OD request (tutor / HOD)
========================= */
#[utoipa::path(
    post,
    path = "/api/od-requests/{id}/reject",
    params(
        ("id" = i64, Path, description = "ID of the OD request to reject")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "OD request rejected", body = OdRequest),
        (status = 400, description = "Comments missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No such transition for the caller's role"),
        (status = 404, description = "OD request not found"),
        (status = 409, description = "Request changed concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "OD Requests"
)]
pub async fn reject_od_request(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    body: web::Json<DecisionReq>,
) -> actix_web::Result<impl Responder> {
    let request = decide(auth, &ctx, path.into_inner(), body.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;

    fn payload(category: OdCategory, event_name: Option<&str>) -> CreateOdRequest {
        let day = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        CreateOdRequest {
            title: "Hackathon".into(),
            description: "State level".into(),
            od_type: OdType::Academic,
            category,
            department: None,
            event_name: event_name.map(String::from),
            date_from: day,
            date_to: day,
            file_url: None,
        }
    }

    fn field_errors(result: Result<(), ApiError>) -> Vec<&'static str> {
        match result {
            Err(ApiError::Validation(fields)) => fields.keys().copied().collect(),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn event_name_needed_only_for_college_events() {
        assert_eq!(field_errors(validate_create(&payload(OdCategory::Other, None))), Vec::<&str>::new());
        assert_eq!(
            field_errors(validate_create(&payload(OdCategory::Intercollege, None))),
            vec!["eventName"]
        );
        assert_eq!(
            field_errors(validate_create(&payload(OdCategory::Intracollege, Some("  ")))),
            vec!["eventName"]
        );
        assert!(validate_create(&payload(OdCategory::Intracollege, Some("Tech Fest 2025"))).is_ok());
    }

    #[test]
    fn date_range_and_required_fields() {
        let mut p = payload(OdCategory::Other, None);
        p.title = " ".into();
        p.date_to = p.date_from.pred_opt().unwrap();
        assert_eq!(field_errors(validate_create(&p)), vec!["dateTo", "title"]);
    }

    #[test]
    fn can_act_flag_only_for_staff() {
        let p = payload(OdCategory::Other, None);
        let request = OdRequest {
            id: 1,
            student_id: 1,
            student_name: "S1".into(),
            title: p.title,
            description: p.description,
            od_type: p.od_type,
            category: p.category,
            department: "Computer Science".into(),
            event_name: None,
            date_from: p.date_from,
            date_to: p.date_to,
            status: OdStatus::Pending,
            file_url: None,
            tutor_comments: None,
            hod_comments: None,
            submitted_at: Utc::now(),
        };
        assert_eq!(OdRequestView::for_role(request.clone(), Role::Student).can_act, None);
        assert_eq!(OdRequestView::for_role(request.clone(), Role::Tutor).can_act, Some(true));
        assert_eq!(OdRequestView::for_role(request, Role::Hod).can_act, Some(false));
    }

    async fn pending_request(pool: &SqlitePool) -> OdRequest {
        let student_id = sqlx::query(
            r#"
            INSERT INTO users
                (name, email, password, kind, institution_type, department, shift,
                 reg_no, degree_name, stream, year, created_at)
            VALUES ('John Doe', 'john@example.com', 'not-a-hash', 'student', 'college',
                    'Computer Science', 'morning', 'CS2021001', 'B.Tech', 'CSE', 3, ?)
            "#,
        )
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let id = sqlx::query(
            r#"
            INSERT INTO od_requests
                (student_id, student_name, title, description, od_type, category, department,
                 date_from, date_to, status, submitted_at)
            VALUES (?, 'John Doe', 'Hackathon', 'State level', 'academic', 'other',
                    'Computer Science', '2025-02-20', '2025-02-20', 'pending', ?)
            "#,
        )
        .bind(student_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

        fetch_od_request(pool, id).await.unwrap().unwrap()
    }

    #[actix_web::test]
    async fn decision_on_a_stale_copy_is_a_conflict() {
        let pool = init_memory_db().await.unwrap();
        let stored = pending_request(&pool).await;

        let mut approved = stored.clone();
        let previous =
            workflow::apply(&mut approved, StaffRole::Tutor, Decision::Approve, "Go ahead").unwrap();
        record_decision(&pool, &approved, previous).await.unwrap();

        // a second tutor decided from the same pending copy
        let mut rejected = stored.clone();
        let previous =
            workflow::apply(&mut rejected, StaffRole::Tutor, Decision::Reject, "Exams that week")
                .unwrap();
        assert_eq!(previous, OdStatus::Pending);
        let err = record_decision(&pool, &rejected, previous).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let current = fetch_od_request(&pool, stored.id).await.unwrap().unwrap();
        assert_eq!(current.status, OdStatus::ApprovedByTutor);
        assert_eq!(current.tutor_comments.as_deref(), Some("Go ahead"));
    }
}
