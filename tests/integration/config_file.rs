use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_default_config_in_home_directory() {
    let project = TestProject::new();
    project.write_home(".j2cli/config.toml", "undefined = \"normal\"\n");
    project.write("t.j2", "[{{ missing }}]\n");
    project.write("data.json", "{}");

    assert_eq!(project.render(&["t.j2", "data.json"]), "[]\n");
}

#[test]
fn test_config_path_from_environment_and_flag_override() {
    let project = TestProject::new();
    let config = project.write("j2.toml", "undefined = \"normal\"\nfallback_format = \"ini\"\n");
    project.write("t.j2", "{{ web.host }}[{{ missing }}]\n");
    project.write("site.cfg", "[web]\nhost = example.com\n");

    project
        .j2()
        .args(["t.j2", "site.cfg"])
        .env("J2CLI_CONFIG_PATH", &config)
        .assert()
        .success()
        .stdout("example.com[]\n");

    project
        .j2()
        .args(["--undefined=strict", "t.j2", "site.cfg"])
        .env("J2CLI_CONFIG_PATH", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Undefined variable"));
}

#[test]
fn test_config_flag_and_relative_hook_paths() {
    let project = TestProject::new();
    project.write("conf/filters.toml", "triple = \"value * 3\"\n");
    project.write("conf/j2.toml", "filters = [\"filters.toml\"]\n");
    project.write("t.j2", "{{ n | triple }}\n");
    project.write("data.json", r#"{"n": 3}"#);

    assert_eq!(project.render(&["-c", "conf/j2.toml", "t.j2", "data.json"]), "9\n");
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let project = TestProject::new();
    project.write("t.j2", "x\n");

    project
        .j2()
        .args(["--config", "nope.toml", "t.j2"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nope.toml"));
}
