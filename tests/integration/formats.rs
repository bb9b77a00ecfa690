use crate::common::{NGINX_RENDERED, NGINX_TEMPLATE, TestProject};

const NGINX_YAML: &str = "\
nginx:
  hostname: localhost
  webroot: /var/www/project
  logs: /var/log/nginx
";

const NGINX_INI: &str = "\
[nginx]
hostname=localhost
webroot=/var/www/project
logs=/var/log/nginx
";

const NGINX_ENV: &str = "\
NGINX_HOSTNAME=localhost
NGINX_WEBROOT=/var/www/project
NGINX_LOGS=/var/log/nginx
";

fn nginx_project() -> TestProject {
    let project = TestProject::new();
    project.write("nginx.conf.j2", NGINX_TEMPLATE);
    project
}

#[test]
fn test_format_inferred_from_extension() {
    let project = nginx_project();
    project.write("nginx.yaml", NGINX_YAML);
    project.write("nginx.YML", NGINX_YAML);
    project.write("nginx.ini", NGINX_INI);

    assert_eq!(project.render(&["nginx.conf.j2", "nginx.yaml"]), NGINX_RENDERED);
    assert_eq!(project.render(&["nginx.conf.j2", "nginx.YML"]), NGINX_RENDERED);
    assert_eq!(project.render(&["nginx.conf.j2", "nginx.ini"]), NGINX_RENDERED);
}

#[test]
fn test_env_file() {
    let project = TestProject::new();
    project.write(
        "nginx.conf.j2",
        "server_name {{ NGINX_HOSTNAME }};\nroot {{ NGINX_WEBROOT }};\n",
    );
    project.write("nginx.env", NGINX_ENV);

    assert_eq!(
        project.render(&["nginx.conf.j2", "nginx.env"]),
        "server_name localhost;\nroot /var/www/project;\n"
    );
}

#[test]
fn test_explicit_format_in_data_spec() {
    let project = nginx_project();
    project.write("settings.cfg", NGINX_INI);

    assert_eq!(project.render(&["nginx.conf.j2", "settings.cfg:ini"]), NGINX_RENDERED);
}

#[test]
fn test_format_flag_is_the_default_tag() {
    let project = nginx_project();
    project.write("settings.cfg", NGINX_YAML);

    assert_eq!(project.render(&["-f", "yaml", "nginx.conf.j2", "settings.cfg"]), NGINX_RENDERED);
}

#[test]
fn test_fallback_format_when_inference_fails() {
    let project = nginx_project();
    project.write("settings.cfg", NGINX_INI);

    assert_eq!(
        project.render(&["--fallback-format=ini", "nginx.conf.j2", "settings.cfg"]),
        NGINX_RENDERED
    );
}

#[test]
fn test_stdin_with_format_flag() {
    let project = nginx_project();

    project
        .j2()
        .args(["--format=yaml", "nginx.conf.j2"])
        .write_stdin(NGINX_YAML)
        .assert()
        .success()
        .stdout(NGINX_RENDERED);
}

#[test]
fn test_stdin_dash_with_format_in_spec() {
    let project = nginx_project();
    let json = r#"{"nginx": {"hostname": "localhost", "webroot": "/var/www/project", "logs": "/var/log/nginx"}}"#;

    project
        .j2()
        .args(["nginx.conf.j2", "-:json"])
        .write_stdin(json)
        .assert()
        .success()
        .stdout(NGINX_RENDERED);
}

#[test]
fn test_yaml_non_string_keys_and_empty_document() {
    let project = TestProject::new();
    project.write("ports.j2", "{{ ports['80'] }} {{ ports['443'] }}\n");
    project.write("ports.yaml", "ports:\n  80: http\n  443: https\n");
    project.write("empty.yaml", "");

    assert_eq!(project.render(&["ports.j2", "ports.yaml", "empty.yaml"]), "http https\n");
}

#[test]
fn test_ini_with_indented_keys() {
    let project = nginx_project();
    project.write(
        "nginx.ini",
        "[nginx]\n  hostname = localhost\n  webroot = /var/www/project\n  logs = /var/log/nginx\n",
    );

    assert_eq!(project.render(&["nginx.conf.j2", "nginx.ini"]), NGINX_RENDERED);
}
