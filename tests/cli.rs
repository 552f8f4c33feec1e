mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::str::contains;

#[test]
fn detect_prints_a_report_for_a_csv_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("people.csv", "id,name\n1,Ada\n2,Bob\n");
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["detect", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("\"format\": \"csv\""))
        .stdout(contains("\"method\": \"hybrid\""));
}

#[test]
fn detect_without_content_uses_the_extension_alone() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("people.csv", "id,name\n1,Ada\n");
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["detect", "--no-content", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("\"method\": \"extension\""));
}

#[test]
fn detect_fails_on_an_unsupported_extension() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("blob.bin", "\u{0}\u{1}\u{2}");
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["detect", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("Detecting format"));
}

#[test]
fn parse_emits_the_structured_command_as_json() {
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["parse", "convert", "data.csv", "to", "json"])
        .assert()
        .success()
        .stdout(contains("\"action\": \"convert\""))
        .stdout(contains("\"source_format\": \"csv\""))
        .stdout(contains("\"target_format\": \"json\""));
}

#[test]
fn plan_builds_a_conversion_request() {
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["plan", "convert", "data.csv", "to", "json"])
        .assert()
        .success()
        .stdout(contains("\"source_path\": \"data.csv\""))
        .stdout(contains("\"target_format\": \"json\""));
}

#[test]
fn plan_rejects_non_convert_instructions() {
    Command::cargo_bin("tablecast")
        .expect("binary exists")
        .args(["plan", "help"])
        .assert()
        .failure()
        .stderr(contains("conversion request"));
}
