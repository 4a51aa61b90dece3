use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs::write;

fn bleach_response() -> Value {
    json!({
        "risk": {"score": 92},
        "explanation_md": "Health authorities contradict this claim.",
        "lesson_md": "**Miracle cures** are a classic red flag.",
        "evidence": [{"url": "https://who.int/x", "source": "WHO", "stance": "refutes"}]
    })
}

fn guard(endpoint: &str) -> Command {
    let mut cmd = Command::cargo_bin("misinfo-guard").unwrap();
    cmd.env_remove("MISINFO_GUARD_ENDPOINT")
        .env_remove("MISINFO_GUARD_TIMEOUT")
        .env("NO_COLOR", "1")
        .args(["--endpoint", endpoint]);
    cmd
}

#[test]
fn check_renders_high_risk_report() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/check")
            .json_body(json!({"text": "Drinking bleach cures COVID", "lang": "en"}));
        then.status(200).json_body(bleach_response());
    });

    guard(&server.base_url())
        .args(["check", "Drinking bleach cures COVID"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Results] | Teach Me"))
        .stdout(predicate::str::contains("Risk Score: 92/100 (High Risk)"))
        .stdout(predicate::str::contains("- WHO <https://who.int/x> (refutes)"));
    mock.assert();
}

#[test]
fn check_reads_text_from_stdin() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/check")
            .json_body(json!({"text": "forwarded message\n", "lang": "en"}));
        then.status(200).json_body(bleach_response());
    });

    guard(&server.base_url())
        .arg("check")
        .write_stdin("forwarded message\n")
        .assert()
        .success();
    mock.assert();
}

#[test]
fn json_output_carries_report() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/check");
        then.status(200).json_body(bleach_response());
    });

    let output = guard(&server.base_url())
        .args(["check", "claim", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["tab"], "results");
    assert_eq!(value["report"]["score"], 92);
    assert_eq!(value["report"]["evidence"][0]["label"], "WHO");
    assert_eq!(value["form"]["loading"], false);
}

#[test]
fn simple_flag_requests_simple_return_level() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/check").json_body(json!({
            "text": "claim",
            "lang": "en",
            "return_level": "simple"
        }));
        then.status(200)
            .json_body(json!({"risk": {"score": 20}, "explanation_md": "Looks fine."}));
    });

    guard(&server.base_url())
        .args(["check", "claim", "--simple"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 20/100"));
    mock.assert();
}

#[test]
fn answering_the_quiz_shows_feedback() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/check");
        then.status(200).json_body(bleach_response());
    });

    guard(&server.base_url())
        .args(["check", "claim", "--answer", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results | [Teach Me]"))
        .stdout(predicate::str::contains("Miracle cures are a classic red flag."))
        .stdout(predicate::str::contains("Correct! Miracle cures are often false."));

    guard(&server.base_url())
        .args(["check", "claim", "--answer", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Try again!"));
}

#[test]
fn blank_text_is_rejected_without_a_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/check");
        then.status(200).json_body(bleach_response());
    });

    guard(&server.base_url())
        .args(["check", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must not be empty"));
    mock.assert_hits(0);
}

#[test]
fn server_error_is_reported_inline() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/check");
        then.status(500)
            .json_body(json!({"error": "Internal server error"}));
    });

    guard(&server.base_url())
        .args(["check", "claim"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error checking"))
        .stderr(predicate::str::contains("Internal server error"));
}

#[test]
fn export_writes_pdf_into_directory() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/check");
        then.status(200).json_body(bleach_response());
    });
    let dir = tempfile::tempdir().unwrap();

    guard(&server.base_url())
        .args(["check", "claim", "--export"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("misinfo-report.pdf"));

    let pdf = std::fs::read(dir.path().join("misinfo-report.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn config_file_supplies_endpoint_and_language() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/check")
            .json_body(json!({"text": "claim", "lang": "hi"}));
        then.status(200).json_body(bleach_response());
    });
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write(
        file.path(),
        format!(
            "endpoint = \"{}\"\ntimeout = \"10s\"\nlang = \"hi\"\n",
            server.base_url()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("misinfo-guard").unwrap();
    cmd.env_remove("MISINFO_GUARD_ENDPOINT")
        .env_remove("MISINFO_GUARD_TIMEOUT")
        .env("NO_COLOR", "1")
        .args(["--config", file.path().to_str().unwrap(), "check", "claim"])
        .assert()
        .success()
        .stdout(predicate::str::contains("जोखिम स्कोर: 92/100"));
    mock.assert();
}
