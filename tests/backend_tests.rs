use chrono::NaiveDate;
use exam_timetable::{
    Backend, BackendConfig, BackendError, ExamWindow, HttpBackend, courses_or_empty,
    subjects_or_empty,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn backend_for(server: &ServerGuard, token: Option<&str>) -> HttpBackend {
    let mut config = BackendConfig::with_base_url(server.url());
    config.token = token.map(str::to_string);
    HttpBackend::new(config).unwrap()
}

#[test]
fn fetch_courses_requests_one_large_page() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/collections/courses/records")
        .match_query(Matcher::UrlEncoded("perPage".into(), "1080".into()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "page": 1,
                "perPage": 1080,
                "items": [
                    {"id": "c1", "course_name": "BSc CS", "collectionName": "courses"},
                    {"id": "c2", "course_name": "BA History"}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let courses = backend_for(&server, None).fetch_courses().unwrap();
    mock.assert();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].id, "c1");
    assert_eq!(courses[0].name, "BSc CS");
}

#[test]
fn fetch_subjects_filters_by_owning_course_and_sends_token() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/collections/subjects/records")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "subject_of=\"c1\"".into(),
        ))
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(
            json!({"items": [
                {"id": "s1", "subject_name": "Math", "subject_of": "c1"},
                {"id": "s2", "subject_name": "Physics", "subject_of": "c1"}
            ]})
            .to_string(),
        )
        .create();

    let subjects = backend_for(&server, Some("secret"))
        .fetch_subjects("c1")
        .unwrap();
    mock.assert();
    let names: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Math", "Physics"]);
    assert_eq!(subjects[1].course_id, "c1");
}

#[test]
fn read_failures_are_typed_but_can_degrade_to_empty() {
    let mut server = Server::new();
    let _courses = server
        .mock("GET", "/api/collections/courses/records")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("maintenance")
        .create();
    let _subjects = server
        .mock("GET", "/api/collections/subjects/records")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("not json")
        .create();

    let backend = backend_for(&server, None);
    match backend.fetch_courses() {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(matches!(
        backend.fetch_subjects("c1"),
        Err(BackendError::Decode(_))
    ));

    assert!(courses_or_empty(&backend).is_empty());
    assert!(subjects_or_empty(&backend, "c1").is_empty());
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let backend = HttpBackend::new(BackendConfig::with_base_url("http://127.0.0.1:9")).unwrap();
    assert!(matches!(
        backend.fetch_courses(),
        Err(BackendError::Transport(_))
    ));
    assert!(courses_or_empty(&backend).is_empty());
}

#[test]
fn save_exam_window_posts_once_and_reports_success() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/collections/exams/records")
        .match_body(Matcher::Json(json!({
            "course_exam_start_date": "2025-03-01T00:00:00.000000Z",
            "course_exam_end_date": "2025-03-10T00:00:00.000000Z",
            "exam_of": "c1"
        })))
        .with_status(200)
        .with_body(r#"{"id":"e1"}"#)
        .expect(1)
        .create();

    let window = ExamWindow::new(
        "c1",
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    );
    let outcome = backend_for(&server, None).save_exam_window(&window).unwrap();
    mock.assert();
    assert!(outcome.success);
    assert_eq!(outcome.body, r#"{"id":"e1"}"#);
}

#[test]
fn save_exam_window_server_error_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/collections/exams/records")
        .with_status(500)
        .with_body(r#"{"code":500,"message":"Something went wrong."}"#)
        .expect(1)
        .create();

    let window = ExamWindow::new(
        "c1",
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    );
    let outcome = backend_for(&server, None).save_exam_window(&window).unwrap();
    mock.assert();
    assert!(!outcome.success);
    assert_eq!(outcome.status, 500);
    assert_eq!(outcome.body, r#"{"code":500,"message":"Something went wrong."}"#);
}

#[test]
fn only_http_200_counts_as_saved() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/api/collections/exams/records")
        .with_status(201)
        .with_body("{}")
        .create();

    let window = ExamWindow::new(
        "c1",
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    );
    let outcome = backend_for(&server, None).save_exam_window(&window).unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.status, 201);
}
