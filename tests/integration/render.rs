use predicates::prelude::*;

use crate::common::{NGINX_RENDERED, NGINX_TEMPLATE, TestProject};

#[test]
fn test_nginx_from_json() {
    let project = TestProject::new();
    project.write("nginx.conf.j2", NGINX_TEMPLATE);
    project.write(
        "nginx.json",
        r#"{"nginx": {"hostname": "localhost", "webroot": "/var/www/project", "logs": "/var/log/nginx"}}"#,
    );

    let out = project.render(&["nginx.conf.j2", "nginx.json"]);
    assert_eq!(out, NGINX_RENDERED);
}

#[test]
fn test_blocks_are_compacted_by_default() {
    let project = TestProject::new();
    project.write("list.j2", "{% for item in items %}\n- {{ item }}\n{% endfor %}\ndone\n");
    project.write("data.json", r#"{"items": ["a", "b"]}"#);

    assert_eq!(project.render(&["list.j2", "data.json"]), "- a\n- b\ndone\n");
}

#[test]
fn test_no_compact_keeps_block_lines() {
    let project = TestProject::new();
    project.write("list.j2", "{% for item in items %}\n- {{ item }}\n{% endfor %}\n");
    project.write("data.json", r#"{"items": ["a"]}"#);

    assert_eq!(project.render(&["--no-compact", "list.j2", "data.json"]), "\n- a\n\n");
}

#[test]
fn test_html_is_not_escaped() {
    let project = TestProject::new();
    project.write("page.html", "<p>{{ body }}</p>\n");
    project.write("data.yaml", "body: \"<b>bold</b> & more\"\n");

    assert_eq!(project.render(&["page.html", "data.yaml"]), "<p><b>bold</b> & more</p>\n");
}

#[test]
fn test_loop_controls_and_includes() {
    let project = TestProject::new();
    project.write("header.j2", "# {{ title }}\n");
    project.write(
        "main.j2",
        "{% include 'header.j2' %}{% for n in numbers %}{% if n > 2 %}{% break %}{% endif %}{{ n }}{% endfor %}.\n",
    );
    project.write("data.json", r#"{"title": "Numbers", "numbers": [1, 2, 3, 4]}"#);

    assert_eq!(project.render(&["main.j2", "data.json"]), "# Numbers\n12.\n");
}

#[test]
fn test_builtin_shell_filters() {
    let project = TestProject::new();
    project.write(
        "run.sh.j2",
        "cmd {{ arg | sh_quote }} {{ user | sh_opt('-u') }}{{ '' | sh_opt('-x') }} {{ enabled | onoff }} {{ enabled | yesno }}\n",
    );
    project.write("data.json", r#"{"arg": "it's here", "user": "bob", "enabled": false}"#);

    project
        .j2()
        .args(["run.sh.j2", "data.json"])
        .assert()
        .success()
        .stdout("cmd 'it'\"'\"'s here' -u bob off no\n");
}

#[test]
fn test_version_flag() {
    let project = TestProject::new();
    project
        .j2()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
