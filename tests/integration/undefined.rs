use predicates::prelude::*;

use crate::common::TestProject;

fn project() -> TestProject {
    let project = TestProject::new();
    project.write("t.j2", "[{{ present }}][{{ missing }}]\n");
    project.write("data.json", r#"{"present": "yes", "presnt_alias": 1}"#);
    project
}

#[test]
fn test_strict_is_the_default() {
    let project = project();

    project
        .j2()
        .args(["t.j2", "data.json"])
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Undefined variable"))
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_strict_reports_close_matches() {
    let project = TestProject::new();
    project.write("t.j2", "{{ hostnme }}\n");
    project.write("data.json", r#"{"hostname": "localhost"}"#);

    project
        .j2()
        .args(["--undefined=strict", "t.j2", "data.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did you mean: hostname?"));
}

#[test]
fn test_normal_renders_empty() {
    let project = project();

    project
        .j2()
        .args(["--undefined", "t.j2", "data.json"])
        .assert()
        .success()
        .stdout("[yes][]\n")
        .stderr(predicate::str::contains("missing").not());
}

#[test]
fn test_debug_renders_empty_and_warns() {
    let project = project();

    project
        .j2()
        .args(["--undefined=debug", "t.j2", "data.json"])
        .assert()
        .success()
        .stdout("[yes][]\n")
        .stderr(predicate::str::contains("Undefined variable 'missing'"));
}

#[test]
fn test_quiet_silences_debug_warnings() {
    let project = project();

    project
        .j2()
        .args(["-q", "--undefined=debug", "t.j2", "data.json"])
        .assert()
        .success()
        .stderr("");
}

#[test]
fn test_piped_stdin_without_data_suggests_dash() {
    let project = TestProject::new();
    project.write("t.j2", "{{ nginx.hostname }}\n");

    project
        .j2()
        .arg("t.j2")
        .write_stdin(r#"{"nginx": {"hostname": "localhost"}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("pass '-'"));
}

#[test]
fn test_no_dash_hint_when_stdin_was_read() {
    let project = TestProject::new();
    project.write("t.j2", "{{ nginx.port }}\n");

    project
        .j2()
        .args(["--format=json", "t.j2"])
        .write_stdin(r#"{"nginx": {"hostname": "localhost"}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("pass '-'").not());
}
