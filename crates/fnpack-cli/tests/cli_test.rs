use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn fnpack() -> assert_cmd::Command {
    cargo_bin_cmd!("fnpack")
}

const FNPACK_TOML: &str = r#"
[build]
copy = ["common"]

[functions.hello]
lang = "python"
handler = "./hello"
image = "acme/hello"
copy = ["secrets/"]
"#;

fn init_project(root: &Path) {
    let template = root.join("template/python");
    std::fs::create_dir_all(template.join("function")).unwrap();
    std::fs::write(template.join("template.yml"), "language: python\nfprocess: python3 index.py\n").unwrap();
    std::fs::write(template.join("Dockerfile"), "FROM python:3.12-alpine\n").unwrap();
    std::fs::write(template.join("index.py"), "import handler\n").unwrap();
    std::fs::write(template.join("function/handler.py"), "# template stub\n").unwrap();

    let handler = root.join("hello");
    std::fs::create_dir_all(handler.join("build")).unwrap();
    std::fs::write(handler.join("handler.py"), "def handle(req):\n    return req\n").unwrap();
    std::fs::write(handler.join("build/stale.txt"), "old output\n").unwrap();

    std::fs::create_dir_all(root.join("secrets")).unwrap();
    std::fs::write(root.join("secrets/token"), "s3cr3t\n").unwrap();
    std::fs::create_dir_all(root.join("common")).unwrap();
    std::fs::write(root.join("common/util.py"), "X = 1\n").unwrap();

    std::fs::write(root.join("fnpack.toml"), FNPACK_TOML).unwrap();
}

// ── Help / Version ──

#[test]
fn shows_help() {
    fnpack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"));
}

#[test]
fn shows_version() {
    fnpack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fnpack"));
}

#[test]
fn build_help_lists_overrides() {
    fnpack()
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--shrinkwrap"))
        .stdout(predicate::str::contains("--build-arg"))
        .stdout(predicate::str::contains("--copy-extra"));
}

// ── Configuration errors ──

#[test]
fn build_without_config_fails() {
    let tmp = TempDir::new().unwrap();

    fnpack()
        .current_dir(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no functions defined"));
}

#[test]
fn build_with_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("fnpack.toml"),
        "[functions.hello]\nlang = \"python\"\nhandler = \"./hello\"\nimage = \"\"\n",
    )
    .unwrap();

    fnpack()
        .current_dir(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("hello"));
}

#[test]
fn unknown_filter_fails() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap", "--filter", "goodbye"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'goodbye' not found"));
}

#[test]
fn build_arg_without_equals_is_rejected() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap", "--build-arg", "NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn unknown_tag_format_is_rejected() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap", "--tag", "nightly"])
        .assert()
        .failure();
}

// ── Shrink-wrap ──

#[test]
fn shrinkwrap_assembles_build_context() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    fnpack()
        .current_dir(tmp.path())
        .env("RUST_LOG", "info")
        .args(["build", "--shrinkwrap"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Building: acme/hello:latest with python template",
        ))
        .stdout(predicate::str::contains("hello shrink-wrapped to"));

    let context = tmp.path().join("build/hello");
    assert!(context.join("Dockerfile").is_file());
    assert!(context.join("index.py").is_file());
    assert!(context.join("template.yml").is_file());

    let function = context.join("function");
    let handler = std::fs::read_to_string(function.join("handler.py")).unwrap();
    assert!(handler.contains("def handle"), "handler must overwrite template stub");
    assert!(!function.join("build").exists());
    assert!(!function.join("template").exists());

    assert_eq!(
        std::fs::read_to_string(function.join("secrets/token")).unwrap(),
        "s3cr3t\n"
    );
    assert!(function.join("common/util.py").is_file());
}

#[test]
fn shrinkwrap_copies_cli_extra_paths() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::write(tmp.path().join("VERSION"), "1.2.3\n").unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap", "--copy-extra", "VERSION"])
        .assert()
        .success();

    assert!(tmp.path().join("build/hello/function/VERSION").is_file());
}

#[test]
fn shrinkwrap_replaces_previous_context() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    let leftover = tmp.path().join("build/hello/function/leftover.txt");
    std::fs::create_dir_all(leftover.parent().unwrap()).unwrap();
    std::fs::write(&leftover, "from an earlier build").unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap"])
        .assert()
        .success();

    assert!(!leftover.exists());
}

#[test]
fn extra_path_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap", "--copy-extra", "../../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside"));
}

#[test]
fn missing_handler_fails_before_building() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::remove_dir_all(tmp.path().join("hello")).unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Building:").not())
        .stderr(predicate::str::contains("acme/hello:latest"))
        .stderr(predicate::str::contains("invalid path"));
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn lang_outside_template_dir_fails() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::write(
        tmp.path().join("fnpack.toml"),
        "[functions.hello]\nlang = \"../python\"\nhandler = \"./hello\"\nimage = \"acme/hello\"\n",
    )
    .unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single template folder name"));
}

#[test]
fn missing_template_fails() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::write(
        tmp.path().join("fnpack.toml"),
        "[functions.hello]\nlang = \"cobol\"\nhandler = \"./hello\"\nimage = \"acme/hello\"\n",
    )
    .unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "--shrinkwrap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cobol not supported"));
}

#[test]
fn explicit_config_file_is_used() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::rename(tmp.path().join("fnpack.toml"), tmp.path().join("stack.toml")).unwrap();

    fnpack()
        .current_dir(tmp.path())
        .args(["build", "-f", "stack.toml", "--shrinkwrap"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello shrink-wrapped to"));
}
