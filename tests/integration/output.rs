use crate::common::{FileAssert, TestProject};

#[test]
fn test_outfile_receives_rendered_text() {
    let project = TestProject::new();
    project.write("t.j2", "name={{ name }}\n");
    project.write("data.json", r#"{"name": "app"}"#);
    let out = project.path().join("app.conf");

    project
        .j2()
        .args(["-o", "app.conf", "t.j2", "data.json"])
        .assert()
        .success()
        .stdout("");
    FileAssert::equals(&out, "name=app\n");
}

#[test]
fn test_no_outfile_on_render_failure() {
    let project = TestProject::new();
    project.write("t.j2", "name={{ name }}\nport={{ port }}\n");
    project.write("data.json", r#"{"name": "app"}"#);

    project.j2().args(["-o", "app.conf", "t.j2", "data.json"]).assert().failure();
    FileAssert::not_exists(project.path().join("app.conf"));
}

#[test]
fn test_no_outfile_on_decode_failure() {
    let project = TestProject::new();
    project.write("t.j2", "name={{ name }}\n");
    project.write("data.json", r#"{"name": "#);

    project.j2().args(["--outfile", "app.conf", "t.j2", "data.json"]).assert().failure();
    FileAssert::not_exists(project.path().join("app.conf"));
}

#[test]
fn test_outfile_is_overwritten() {
    let project = TestProject::new();
    project.write("t.j2", "v={{ v }}\n");
    project.write("data.env", "v=2\n");
    let out = project.write("out.txt", "old contents that are longer\n");

    project.j2().args(["-o", "out.txt", "t.j2", "data.env"]).assert().success();
    FileAssert::equals(&out, "v=2\n");
}
