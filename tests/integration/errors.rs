use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_unknown_format_is_reported() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");
    project.write("data.conf", "a=1\n");

    project
        .j2()
        .args(["t.j2", "data.conf"])
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Cannot determine the data format of data.conf"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_invalid_format_tag_in_data_spec() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");

    project
        .j2()
        .args(["t.j2", "data.txt:xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_decode_error_names_source_and_format() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");
    project.write("data.yaml", "- just\n- a list\n");

    project
        .j2()
        .args(["t.j2", "data.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode data.yaml as yaml"));
}

#[test]
fn test_missing_data_file_and_ignore_missing() {
    let project = TestProject::new();
    project.write("t.j2", "[{{ name | default('none') }}]\n");

    project
        .j2()
        .args(["t.j2", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));

    project
        .j2()
        .args(["-I", "t.j2", "absent.json"])
        .assert()
        .success()
        .stdout("[none]\n")
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_stdin_used_twice_is_rejected() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");

    project
        .j2()
        .args(["t.j2", "-:json", "-:yaml"])
        .write_stdin("{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("standard input"));
}

#[test]
fn test_bad_mount_path() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");
    project.write("data.json", "{}");

    project
        .j2()
        .args(["t.j2", "data.json:json:a..b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty segment"));
}

#[test]
fn test_template_syntax_error_shows_line() {
    let project = TestProject::new();
    project.write("t.j2", "line one\n{% if %}\n");
    project.write("data.json", "{}");

    project
        .j2()
        .args(["t.j2", "data.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template syntax error"))
        .stderr(predicate::str::contains("Line: 2"));
}

#[test]
fn test_missing_template() {
    let project = TestProject::new();

    project
        .j2()
        .arg("nope.j2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("read template"));
}
