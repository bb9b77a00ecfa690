use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_filters_and_tests_files() {
    let project = TestProject::new();
    project.write("filters.toml", "double = \"value * 2\"\nwrap = \"args[0] ~ value ~ args[0]\"\n");
    project.write("tests.toml", "even = \"value % 2 == 0\"\n");
    project.write(
        "t.j2",
        "{% for n in numbers %}{% if n is even %}{{ n | double }}{% else %}{{ n | wrap('*') }}{% endif %} {% endfor %}|\n",
    );
    project.write("data.json", r#"{"numbers": [1, 2, 3]}"#);

    let out = project.render(&[
        "--filters",
        "filters.toml",
        "--tests",
        "tests.toml",
        "t.j2",
        "data.json",
    ]);
    assert_eq!(out, "*1* 4 *3* |\n");
}

#[test]
fn test_user_filter_overrides_builtin() {
    let project = TestProject::new();
    project.write("filters.toml", "onoff = \"'enabled' if value else 'disabled'\"\n");
    project.write("t.j2", "{{ flag | onoff }}\n");
    project.write("data.json", r#"{"flag": true}"#);

    assert_eq!(project.render(&["--filters", "filters.toml", "t.j2", "data.json"]), "enabled\n");
}

#[test]
fn test_customize_file_touches_every_hook_point() {
    let project = TestProject::new();
    project.write(
        "customize.toml",
        r#"
[engine]
variable_start = "<<"
variable_end = ">>"

[globals]
company = "ACME"

[functions]
greet = "'hello ' ~ args[0]"

[context.defaults]
port = 80

[context.overrides]
env_name = "prod"

[filters]
shout = "value | upper"
"#,
    );
    project.write("t.j2", "<< company >> << greet(name) | shout >> << port >> << env_name >> {{ raw }}\n");
    project.write("data.yaml", "name: bob\nenv_name: dev\n");

    let out = project.render(&["--customize", "customize.toml", "t.j2", "data.yaml"]);
    assert_eq!(out, "ACME HELLO BOB 80 prod {{ raw }}\n");
}

#[test]
fn test_invalid_hook_file_fails_before_rendering() {
    let project = TestProject::new();
    project.write("filters.toml", "broken = \"value +\"\n");
    project.write("t.j2", "x\n");

    project
        .j2()
        .args(["--filters", "filters.toml", "-o", "out.txt", "t.j2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("filters.broken"));
    assert!(!project.path().join("out.txt").exists());
}

#[test]
fn test_hook_expressions_use_builtin_filters() {
    let project = TestProject::new();
    project.write(
        "filters.toml",
        "q = \"value | sh_quote\"\nuser_opt = \"value | sh_optq('-u') | upper\"\n",
    );
    project.write("t.j2", "echo {{ msg | q }} {{ user | user_opt }}\n");
    project.write("data.json", r#"{"msg": "hi there", "user": "bob"}"#);

    assert_eq!(
        project.render(&["--filters", "filters.toml", "t.j2", "data.json"]),
        "echo 'hi there' -U BOB\n"
    );
}
