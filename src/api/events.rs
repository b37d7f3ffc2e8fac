use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::event::{ALL_DEPARTMENTS, Event},
    state::AppContext,
    utils::validators::{Checks, validate_time},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

const EVENT_COLUMNS: &str = "id, title, description, date, time, department, created_by, created_at";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "title": "Technical Symposium",
    "description": "Technical paper presentations and competitions",
    "date": "2025-02-20",
    "time": "10:00",
    "department": "Computer Science"
}))]
pub struct EventInput {
    pub title: String,
    pub description: String,
    #[schema(example = "2025-02-20", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "10:00")]
    pub time: String,
    /// Defaults to the staff member's department
    pub department: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilter {
    /// Events of this department plus events open to all departments
    pub department: Option<String>,
}

fn validate_event(input: &EventInput) -> Result<(), ApiError> {
    Checks::new()
        .required(&input.title, "title", "Title is required")
        .required(&input.description, "description", "Description is required")
        .check(validate_time(&input.time), "time", "Time must be HH:MM")
        .check(
            input.department.as_deref().is_none_or(|d| !d.trim().is_empty()),
            "department",
            "Department must not be blank",
        )
        .finish()
}

async fn fetch_event(ctx: &AppContext, id: i64) -> Result<Event, ApiError> {
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or(ApiError::NotFound("Event not found"))
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventFilter),
    responses(
        (status = 200, description = "Upcoming events ordered by date", body = [Event]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn list_events(
    _auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<EventFilter>,
) -> actix_web::Result<impl Responder> {
    let events = match query.department.as_deref().map(str::trim) {
        Some(department) if !department.is_empty() => {
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE department IN (?, ?) ORDER BY date, time, id"
            ))
            .bind(department)
            .bind(ALL_DEPARTMENTS)
            .fetch_all(&ctx.pool)
            .await
        }
        _ => {
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY date, time, id"
            ))
            .fetch_all(&ctx.pool)
            .await
        }
    }
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch events");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(events))
}

/* =========================
Create event (staff)
========================= */
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventInput,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn create_event(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<EventInput>,
) -> actix_web::Result<impl Responder> {
    let staff = auth.load_staff(&ctx.pool).await?;
    validate_event(&payload)?;

    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .unwrap_or(&staff.department);

    let result = sqlx::query(
        r#"
        INSERT INTO events (title, description, date, time, department, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(payload.date)
    .bind(&payload.time)
    .bind(department)
    .bind(&staff.staff_id)
    .bind(Utc::now())
    .execute(&ctx.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, staff_id = %staff.staff_id, "Failed to create event");
        ApiError::from(e)
    })?;

    let event = fetch_event(&ctx, result.last_insert_rowid()).await?;
    tracing::info!(event_id = event.id, staff_id = %staff.staff_id, "Event created");

    Ok(HttpResponse::Created().json(event))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = i64, Path, description = "ID of the event")
    ),
    request_body = EventInput,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Event not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn update_event(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    payload: web::Json<EventInput>,
) -> actix_web::Result<impl Responder> {
    let staff = auth.load_staff(&ctx.pool).await?;
    validate_event(&payload)?;

    let id = path.into_inner();
    let current = fetch_event(&ctx, id).await?;
    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.department);

    let result = sqlx::query(
        r#"
        UPDATE events
        SET title = ?, description = ?, date = ?, time = ?, department = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(payload.date)
    .bind(&payload.time)
    .bind(department)
    .bind(id)
    .execute(&ctx.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, event_id = id, "Update event failed");
        ApiError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Event not found").into());
    }

    tracing::info!(event_id = id, staff_id = %staff.staff_id, "Event updated");
    Ok(HttpResponse::Ok().json(fetch_event(&ctx, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(
        ("id" = i64, Path, description = "ID of the event")
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Event not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn delete_event(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let staff = auth.load_staff(&ctx.pool).await?;
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, event_id = id, "Delete event failed");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Event not found").into());
    }

    tracing::info!(event_id = id, staff_id = %staff.staff_id, "Event deleted");
    Ok(HttpResponse::NoContent().finish())
}
