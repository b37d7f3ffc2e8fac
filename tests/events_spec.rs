#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use common::{bearer, seed, seed_in, test_context};
use odms::model::role::Role;
use serde_json::{Value, json};

fn event(title: &str, date: &str, department: Option<&str>) -> Value {
    let mut body = json!({
        "title": title,
        "description": "Annual sports competition",
        "date": date,
        "time": "09:00"
    });
    if let Some(department) = department {
        body["department"] = json!(department);
    }
    body
}

fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .expect("a list")
        .iter()
        .map(|e| e["title"].as_str().expect("title"))
        .collect()
}

#[actix_web::test]
async fn staff_create_events_in_their_department() {
    let ctx = test_context().await;
    let app = test_app!(ctx);
    let tutor = seed_in(&ctx, Role::Tutor, "Dr. Rao", "rao@example.com", "Electronics").await;

    let (status, body) = send!(
        app,
        TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(&tutor.token))
            .set_json(event("Sports Day", "2025-02-15", None))
    );

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["department"], "Electronics");
    assert_eq!(body["createdBy"], "STF001");
    assert_eq!(body["date"], "2025-02-15");
    assert!(body["createdAt"].is_string());
}

#[actix_web::test]
async fn students_cannot_manage_events() {
    let ctx = test_context().await;
    let app = test_app!(ctx);
    let student = seed(&ctx, Role::Student, "John Doe", "john@example.com").await;
    let tutor = seed(&ctx, Role::Tutor, "Dr. Rao", "rao@example.com").await;

    let (status, _) = send!(
        app,
        TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(&student.token))
            .set_json(event("Sports Day", "2025-02-15", None))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, created) = send!(
        app,
        TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(&tutor.token))
            .set_json(event("Sports Day", "2025-02-15", None))
    );
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send!(
        app,
        TestRequest::put()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&student.token))
            .set_json(event("Renamed", "2025-02-15", None))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&student.token))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    // but they can read them
    let (status, list) = send!(
        app,
        TestRequest::get()
            .uri("/api/events")
            .insert_header(bearer(&student.token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&list), vec!["Sports Day"]);
}

#[actix_web::test]
async fn department_filter_includes_open_events() {
    let ctx = test_context().await;
    let app = test_app!(ctx);
    let hod = seed(&ctx, Role::Hod, "Dr. Iyer", "iyer@example.com").await;

    for (title, date, department) in [
        ("Symposium", "2025-02-20", "Computer Science"),
        ("Robotics Expo", "2025-02-18", "Electronics"),
        ("Sports Day", "2025-02-15", "All Departments"),
    ] {
        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/events")
                .insert_header(bearer(&hod.token))
                .set_json(event(title, date, Some(department)))
        );
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = send!(
        app,
        TestRequest::get()
            .uri("/api/events")
            .insert_header(bearer(&hod.token))
    );
    assert_eq!(titles(&all), vec!["Sports Day", "Robotics Expo", "Symposium"]);

    let (_, cs) = send!(
        app,
        TestRequest::get()
            .uri("/api/events?department=Computer%20Science")
            .insert_header(bearer(&hod.token))
    );
    assert_eq!(titles(&cs), vec!["Sports Day", "Symposium"]);
}

#[actix_web::test]
async fn staff_update_and_delete_events() {
    let ctx = test_context().await;
    let app = test_app!(ctx);
    let tutor = seed(&ctx, Role::Tutor, "Dr. Rao", "rao@example.com").await;

    let (_, created) = send!(
        app,
        TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(&tutor.token))
            .set_json(event("Sports Day", "2025-02-15", None))
    );
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send!(
        app,
        TestRequest::put()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&tutor.token))
            .set_json(event("Sports Week", "2025-02-16", None))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Sports Week");
    assert_eq!(updated["date"], "2025-02-16");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, _) = send!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&tutor.token))
    );
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&tutor.token))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(
        app,
        TestRequest::put()
            .uri(&format!("/api/events/{id}"))
            .insert_header(bearer(&tutor.token))
            .set_json(event("Ghost", "2025-02-16", None))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn invalid_events_are_rejected() {
    let ctx = test_context().await;
    let app = test_app!(ctx);
    let tutor = seed(&ctx, Role::Tutor, "Dr. Rao", "rao@example.com").await;

    let mut bad = event("", "2025-02-15", None);
    bad["time"] = json!("25:00");

    let (status, body) = send!(
        app,
        TestRequest::post()
            .uri("/api/events")
            .insert_header(bearer(&tutor.token))
            .set_json(bad)
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["title"].is_string());
    assert!(body["fields"]["time"].is_string());
}
