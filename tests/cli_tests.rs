#![cfg(feature = "cli")]

use assert_cmd::Command;
use mockito::{Matcher, Server, ServerGuard};
use predicates::str::contains as str_contains;
use serde_json::json;
use tempfile::tempdir;

fn records_server() -> ServerGuard {
    let mut server = Server::new();
    server
        .mock("GET", "/api/collections/courses/records")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"items": [{"id": "c1", "course_name": "BSc CS"}]}).to_string())
        .create();
    server
        .mock("GET", "/api/collections/subjects/records")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"items": [
                {"id": "math", "subject_name": "Math", "subject_of": "c1"},
                {"id": "phys", "subject_name": "Physics", "subject_of": "c1"}
            ]})
            .to_string(),
        )
        .create();
    server
}

#[allow(deprecated)]
fn run_cli(server: &ServerGuard, extra: &[&str], script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.arg("--base-url")
        .arg(server.url())
        .args(extra)
        .write_stdin(script.to_string())
        .assert()
}

const SETUP: &str = "course BSc CS\nrange 01/03/2025 10/03/2025\n";
const ASSIGN_BOTH: &str =
    "assign 1 03/03/2025 9:00 AM to 12:00 PM\nassign 2 04/03/2025 2:00 PM to 5:00 PM\n";

#[test]
fn cli_lists_courses_and_window() {
    let server = records_server();
    run_cli(&server, &[], &format!("{SETUP}dates\nquit\n"))
        .success()
        .stdout(str_contains("1. BSc CS"))
        .stdout(str_contains("Selected course BSc CS (2 subjects)."))
        .stdout(str_contains("Window set to 01/03/2025 - 10/03/2025 (8 open dates)."))
        .stdout(str_contains("03/03/2025 (Monday)"));
}

#[test]
fn cli_unknown_course_is_reported() {
    let server = records_server();
    run_cli(&server, &[], "course Law\nquit\n")
        .success()
        .stdout(str_contains("Error: unknown course 'Law'"));
}

#[test]
fn cli_strict_rejects_duplicate_and_sunday() {
    let server = records_server();
    let script = format!(
        "{SETUP}assign 1 03/03/2025 9:00 AM to 12:00 PM\nassign 2 03/03/2025 9:00 AM to 12:00 PM\nassign 2 02/03/2025 9:00 AM to 12:00 PM\nquit\n"
    );
    run_cli(&server, &[], &script)
        .success()
        .stdout(str_contains("Math: 03/03/2025 9:00 AM to 12:00 PM"))
        .stdout(str_contains(
            "Error: The date 03/03/2025 is already selected for Math. Please choose a different date.",
        ))
        .stdout(str_contains(
            "Error: The date 02/03/2025 is a Sunday. Please choose a different date.",
        ));
}

#[test]
fn cli_multi_policy_accepts_shared_dates() {
    let server = records_server();
    let script = format!(
        "{SETUP}select 1 03/03/2025,04/03/2025 9:00 AM to 12:00 PM\nselect 2 03/03/2025 1:00 PM to 3:00 PM\ngenerate\nquit\n"
    );
    run_cli(&server, &["--policy", "multi"], &script)
        .success()
        .stdout(str_contains("multi_select policy"))
        .stdout(str_contains("Generated Timetable"))
        .stdout(str_contains("04/03/2025"))
        .stdout(str_contains("1:00 PM to 3:00 PM"));
}

#[test]
fn cli_generate_persist_saves_window_once() {
    let mut server = records_server();
    let save = server
        .mock("POST", "/api/collections/exams/records")
        .match_body(Matcher::PartialJson(json!({"exam_of": "c1"})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();
    let script = format!("{SETUP}{ASSIGN_BOTH}generate persist\nquit\n");
    run_cli(&server, &[], &script)
        .success()
        .stdout(str_contains("Exam window saved."));
    save.assert();
}

#[test]
fn cli_reports_rejected_save() {
    let mut server = records_server();
    server
        .mock("POST", "/api/collections/exams/records")
        .with_status(400)
        .with_body("bad window")
        .create();
    run_cli(&server, &[], &format!("{SETUP}{ASSIGN_BOTH}generate persist\nquit\n"))
        .success()
        .stdout(str_contains("Exam window not saved (HTTP 400): bad window"));
}

#[test]
fn cli_export_requires_generate_then_writes_csv() {
    let server = records_server();
    let dir = tempdir().unwrap();
    let path = dir.path().join("exam timetable.csv");
    let path_text = path.to_string_lossy().to_string();
    let script = format!(
        "{SETUP}export csv {path_text}\n{ASSIGN_BOTH}generate\nexport csv {path_text}\nquit\n"
    );
    run_cli(&server, &[], &script)
        .success()
        .stdout(str_contains("Run 'generate' first."))
        .stdout(str_contains(format!("Timetable written to {path_text}")));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "Date,Subject,Time\n03/03/2025,Math,9:00 AM to 12:00 PM\n04/03/2025,Physics,2:00 PM to 5:00 PM\n"
    );
}

#[test]
fn cli_strict_generate_lists_pending_subjects() {
    let server = records_server();
    let script =
        format!("{SETUP}subjects\nassign 1 03/03/2025 9:00 AM to 12:00 PM\ngenerate\nquit\n");
    run_cli(&server, &[], &script)
        .success()
        .stdout(str_contains("[pending, default 01/03/2025]"))
        .stdout(str_contains("Error: No exam date chosen for Physics."));
}

#[test]
fn cli_unknown_command_hints_help() {
    let server = records_server();
    run_cli(&server, &[], "frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command 'frobnicate'. Type 'help'."));
}
