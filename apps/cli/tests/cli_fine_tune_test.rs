//! Integration tests for `tz fine-tune`.

mod common;

use common::tz;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_rows(home: &TempDir, count: usize) -> String {
    let rows: Vec<String> = (0..count)
        .map(|i| {
            serde_json::json!({
                "input": {"messages": [{"role": "user", "content": [{"type": "text", "value": format!("prompt {i}")}]}]},
                "output": [{"type": "text", "text": format!("answer {i}")}]
            })
            .to_string()
        })
        .collect();
    let path = home.path().join("rows.jsonl");
    std::fs::write(&path, rows.join("\n")).unwrap();
    path.display().to_string()
}

fn start_args(rows: &str) -> Vec<String> {
    ["fine-tune", "start", "--rows", rows, "--model", "gpt-4o-mini-2024-07-18"]
        .into_iter()
        .chain(["--function", "write_haiku", "--variant", "baseline", "--metric", "haiku_rating"])
        .map(str::to_string)
        .collect()
}

#[test]
fn test_start_with_no_rows() {
    let home = TempDir::new().unwrap();
    let rows = write_rows(&home, 0);

    tz(&home)
        .args(start_args(&rows))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No curated inferences found"));
}

#[test]
fn test_start_rejects_full_validation_split() {
    let home = TempDir::new().unwrap();
    let rows = write_rows(&home, 3);

    tz(&home)
        .args(start_args(&rows))
        .args(["--val-split", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation split"));
}

#[test]
fn test_start_unknown_provider() {
    let home = TempDir::new().unwrap();
    let rows = write_rows(&home, 3);

    tz(&home)
        .args(start_args(&rows))
        .args(["--provider", "fireworks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported fine-tuning provider"));
}

#[test]
fn test_start_submits_job() {
    let home = TempDir::new().unwrap();
    let rows = write_rows(&home, 5);
    let mut server = mockito::Server::new();
    let upload = server
        .mock("POST", "/v1/files")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_body(r#"{"id": "file-1"}"#)
        .expect(2)
        .create();
    let create = server
        .mock("POST", "/v1/fine_tuning/jobs")
        .match_body(Matcher::PartialJsonString(r#"{"validation_file": "file-1"}"#.to_string()))
        .with_status(200)
        .with_body(r#"{"id": "ftjob-1", "status": "validating_files"}"#)
        .create();

    tz(&home)
        .env("OPENAI_BASE_URL", format!("{}/v1", server.url()))
        .env("OPENAI_API_KEY", "sk-test")
        .arg("--json")
        .args(start_args(&rows))
        .assert()
        .success()
        .stdout(predicate::str::contains("ftjob-1"))
        .stdout(predicate::str::contains("\"kind\": \"created\""));

    upload.assert();
    create.assert();
}

#[test]
fn test_poll_requires_job_id() {
    let home = TempDir::new().unwrap();
    tz(&home)
        .args(["fine-tune", "poll", "--job-id", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Job ID is required"));
}

#[test]
fn test_poll_wait_until_succeeded() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/fine_tuning/jobs/ftjob-1")
        .with_status(200)
        .with_body(r#"{"id": "ftjob-1", "status": "succeeded", "fine_tuned_model": "ft:gpt-4o-mini:acme::1"}"#)
        .expect(1)
        .create();
    std::fs::write(home.path().join(".tzrc"), format!("openai_base_url = \"{}/v1\"\n", server.url())).unwrap();

    tz(&home)
        .args(["fine-tune", "poll", "--job-id", "ftjob-1", "--wait", "--interval-secs", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ft:gpt-4o-mini:acme::1"));

    mock.assert();
}

#[test]
fn test_poll_wait_fails_for_failed_job() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/fine_tuning/jobs/ftjob-2")
        .with_status(200)
        .with_body(r#"{"id": "ftjob-2", "status": "failed"}"#)
        .create();

    tz(&home)
        .env("OPENAI_BASE_URL", format!("{}/v1", server.url()))
        .args(["fine-tune", "poll", "--job-id", "ftjob-2", "--wait"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("finished with status failed"));

    mock.assert();
}
