use crate::api::events::EventInput;
use crate::api::od_request::{CreateOdRequest, DecisionReq, OdRequestView};
use crate::api::students::{AttendanceSummary, UpdateAttendance};
use crate::model::attendance::{AttendanceSnapshot, Rank};
use crate::model::event::Event;
use crate::model::od_request::{OdCategory, OdRequest, OdStatus, OdType};
use crate::model::user::{InstitutionType, Shift, Staff, StaffRole, Student, UserKind};
use crate::models::{LoginReqDto, SignupReq, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OD Management System API",
        version = "1.0.0",
        description = r#"
## On-Duty (OD) Management System

This API backs a college portal where students ask for **On-Duty leave** and staff approve it.

### 🔹 Key Features
- **OD Requests**
  - Students submit requests, tutors and the HOD approve or reject them in two stages
- **Events**
  - Staff publish department events, everyone can browse them
- **Attendance**
  - Staff record attendance, students see their percentage and rank
  - Staff see the students with the best attendance

### 🔐 Security
All `/api` endpoints are protected using **JWT Bearer authentication**.
Sign in through `/auth/login` to get a token pair.

### 📦 Response Format
- JSON-based RESTful responses with camelCase keys
- Errors look like `{"error": "..."}`, validation errors add a `fields` map

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::signup,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::od_request::create_od_request,
        crate::api::od_request::list_od_requests,
        crate::api::od_request::get_od_request,
        crate::api::od_request::approve_od_request,
        crate::api::od_request::reject_od_request,

        crate::api::events::list_events,
        crate::api::events::create_event,
        crate::api::events::update_event,
        crate::api::events::delete_event,

        crate::api::students::top_students,
        crate::api::students::my_attendance,
        crate::api::students::update_attendance
    ),
    components(
        schemas(
            SignupReq,
            LoginReqDto,
            TokenPair,
            UserKind,
            InstitutionType,
            Shift,
            StaffRole,
            Student,
            Staff,
            AttendanceSnapshot,
            Rank,
            OdType,
            OdCategory,
            OdStatus,
            OdRequest,
            OdRequestView,
            CreateOdRequest,
            DecisionReq,
            Event,
            EventInput,
            AttendanceSummary,
            UpdateAttendance
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign up, sign in and token APIs"),
        (name = "OD Requests", description = "OD request and approval APIs"),
        (name = "Events", description = "Department event APIs"),
        (name = "Students", description = "Attendance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
