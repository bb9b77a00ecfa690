use crate::common::TestProject;

#[test]
fn test_later_sources_win_and_nested_keys_survive() {
    let project = TestProject::new();
    project.write("t.j2", "{{ db.host }}:{{ db.port }} {{ db.name }}\n");
    project.write("base.yaml", "db:\n  host: localhost\n  port: 5432\n  name: app\n");
    project.write("override.json", r#"{"db": {"host": "db.internal"}}"#);

    assert_eq!(project.render(&["t.j2", "base.yaml", "override.json"]), "db.internal:5432 app\n");
    assert_eq!(project.render(&["t.j2", "override.json", "base.yaml"]), "localhost:5432 app\n");
}

#[test]
fn test_scalar_replaces_mapping() {
    let project = TestProject::new();
    project.write("t.j2", "{{ db }}\n");
    project.write("base.yaml", "db:\n  host: localhost\n");
    project.write("flat.json", r#"{"db": "sqlite"}"#);

    assert_eq!(project.render(&["t.j2", "base.yaml", "flat.json"]), "sqlite\n");
}

#[test]
fn test_sources_mounted_under_key_paths() {
    let project = TestProject::new();
    project.write(
        "t.j2",
        "{{ app.name }} {{ conf.site.web.hostname }} {{ conf.site.web.port }}\n",
    );
    project.write("app.json", r#"{"name": "shop"}"#);
    project.write("site.ini", "[web]\nhostname = example.com\n");
    project.write("port.env", "port=8080\n");

    let out = project.render(&[
        "t.j2",
        "app.json:json:app",
        "site.ini::conf.site",
        "port.env:env:conf.site.web",
    ]);
    assert_eq!(out, "shop example.com 8080\n");
}

#[test]
fn test_mount_replaces_scalar_on_the_path() {
    let project = TestProject::new();
    project.write("t.j2", "{{ conf.mode }}\n");
    project.write("top.json", r#"{"conf": "plain"}"#);
    project.write("mode.json", r#"{"mode": "prod"}"#);

    assert_eq!(project.render(&["t.j2", "top.json", "mode.json::conf"]), "prod\n");
}

#[test]
fn test_stdin_spec_with_format_and_mount() {
    let project = TestProject::new();
    project.write("t.j2", "{{ app.name }} {{ port }}\n");
    project.write("base.json", r#"{"port": 80}"#);

    project
        .j2()
        .args(["t.j2", "base.json", "-:yaml:app"])
        .write_stdin("name: shop\n")
        .assert()
        .success()
        .stdout("shop 80\n");
}
