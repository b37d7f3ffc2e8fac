#![allow(dead_code, unused_macros)]

use actix_web::{body::MessageBody, dev::ServiceResponse, http::StatusCode, test};
use chrono::Utc;
use odms::{
    auth::jwt::generate_access_token,
    config::Config,
    db::init_memory_db,
    model::role::Role,
    state::AppContext,
};
use serde_json::{Value, json};
use std::net::SocketAddr;

pub const JWT_SECRET: &str = "test-secret";

pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: JWT_SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 10_000,
        rate_signup_per_min: 10_000,
        rate_refresh_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
        top_students_cache_ttl: 60,
    }
}

pub async fn test_context() -> AppContext {
    let pool = init_memory_db().await.expect("in-memory database");
    AppContext::new(pool, test_config())
}

/// Builds the full service around `$ctx`.
macro_rules! test_app {
    ($ctx:expr) => {{
        let ctx: odms::state::AppContext = $ctx.clone();
        let config = ctx.config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(ctx))
                .configure(|cfg| odms::routes::configure(cfg, &config)),
        )
        .await
    }};
}

/// Sends a `TestRequest` from a fixed peer and returns status and JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let req = $req.peer_addr(crate::common::peer()).to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        crate::common::into_json(resp).await
    }};
}

pub async fn into_json<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// An account inserted straight into the database, with an access token.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub token: String,
}

async fn insert_account(ctx: &AppContext, role: Role, name: &str, email: &str, department: &str) -> i64 {
    let (kind, reg_no, staff_id, staff_role) = match role {
        Role::Student => ("student", Some("CS2021001"), None, None),
        Role::Tutor => ("staff", None, Some("STF001"), Some("tutor")),
        Role::Hod => ("staff", None, Some("STF002"), Some("hod")),
    };
    let is_student = role == Role::Student;

    sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, kind, institution_type, department, shift,
             reg_no, degree_name, stream, year, staff_id, staff_role, created_at)
        VALUES (?, ?, 'not-a-hash', ?, 'college', ?, 'morning', ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(kind)
    .bind(department)
    .bind(reg_no)
    .bind(is_student.then_some("Bachelor of Technology (B.Tech)"))
    .bind(is_student.then_some("Computer Science and Engineering"))
    .bind(is_student.then_some(3_i64))
    .bind(staff_id)
    .bind(staff_role)
    .bind(Utc::now())
    .execute(&ctx.pool)
    .await
    .expect("insert account")
    .last_insert_rowid()
}

pub async fn seed(ctx: &AppContext, role: Role, name: &str, email: &str) -> Account {
    seed_in(ctx, role, name, email, "Computer Science").await
}

pub async fn seed_in(
    ctx: &AppContext,
    role: Role,
    name: &str,
    email: &str,
    department: &str,
) -> Account {
    let id = insert_account(ctx, role, name, email, department).await;
    let token = generate_access_token(id, email.to_string(), role, JWT_SECRET, 900)
        .expect("sign access token");
    Account { id, token }
}

pub async fn set_attendance(ctx: &AppContext, student_id: i64, present: i64, absent: i64) {
    sqlx::query("UPDATE users SET present_days = ?, absent_days = ? WHERE id = ?")
        .bind(present)
        .bind(absent)
        .bind(student_id)
        .execute(&ctx.pool)
        .await
        .expect("update attendance");
}

pub fn od_request_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Representing the department",
        "type": "academic",
        "category": "intercollege",
        "eventName": "Hackathon",
        "dateFrom": "2025-02-20",
        "dateTo": "2025-02-21"
    })
}
