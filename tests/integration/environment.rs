use crate::common::TestProject;

#[test]
fn test_no_data_renders_from_environment() {
    let project = TestProject::new();
    project.write("nginx.conf.j2", "server_name {{ NGINX_HOSTNAME }};\n");

    project
        .j2()
        .arg("nginx.conf.j2")
        .env("NGINX_HOSTNAME", "localhost")
        .assert()
        .success()
        .stdout("server_name localhost;\n");
}

#[test]
fn test_import_env_is_applied_after_files() {
    let project = TestProject::new();
    project.write("t.j2", "{{ HOST }} {{ NAME }}\n");
    project.write("data.env", "HOST=from-file\nNAME=app\n");

    project
        .j2()
        .args(["--import-env", "t.j2", "data.env"])
        .env("HOST", "from-env")
        .assert()
        .success()
        .stdout("from-env app\n");
}

#[test]
fn test_import_env_mounted_under_name() {
    let project = TestProject::new();
    project.write("t.j2", "{{ HOST }} {{ os.HOST }}\n");
    project.write("data.env", "HOST=from-file\n");

    project
        .j2()
        .args(["--import-env=os", "t.j2", "data.env"])
        .env("HOST", "from-env")
        .assert()
        .success()
        .stdout("from-file from-env\n");
}

#[test]
fn test_env_filter_and_function() {
    let project = TestProject::new();
    project.write(
        "t.j2",
        "{{ 'PORT' | env }} {{ env('MISSING', 'fallback') }} {{ '${PORT}/x' | sh_expandvars }}\n",
    );
    project.write("data.json", "{}");

    project
        .j2()
        .args(["t.j2", "data.json"])
        .env("PORT", "8080")
        .assert()
        .success()
        .stdout("8080 fallback 8080/x\n");
}
