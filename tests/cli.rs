use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn scriptum(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("scriptum").expect("binary exists");
    cmd.current_dir(dir)
        .env_remove("SCRIPTUM_CONFIG")
        .env_remove("SCRIPTUM_ENGINE");
    cmd
}

#[test]
fn dry_run_prints_composed_unit_with_library() {
    let dir = tempdir().expect("create temp dir");
    fs::create_dir_all(dir.path().join("packages")).expect("create packages");
    fs::write(
        dir.path().join("packages/ScriptLibraries.csx"),
        "void Lib() {}\n",
    )
    .expect("write bundle");
    fs::write(dir.path().join("main.csx"), "#r \"Dapper.dll\"\nMain();\n").expect("write script");

    scriptum(dir.path())
        .args(["--dry-run", "run", "main.csx"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("// main.csx")
                .and(predicate::str::contains("#r \"Dapper.dll\""))
                .and(predicate::str::contains("using System.Linq;"))
                .and(predicate::str::contains("void Lib() {}\nMain();")),
        );
}

#[test]
fn eval_adds_declared_and_configured_namespaces() {
    let dir = tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("scriptum.toml"),
        "namespaces = [\"From.Config\"]\n",
    )
    .expect("write config");

    scriptum(dir.path())
        .args(["--dry-run", "eval", "using Foo.Bar;\nX();"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("using From.Config;")
                .and(predicate::str::contains("using Foo.Bar;"))
                .and(predicate::str::contains("X();")),
        );
}

#[test]
fn missing_script_fails() {
    let dir = tempdir().expect("create temp dir");
    scriptum(dir.path())
        .args(["--dry-run", "run", "absent.csx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.csx"));
}

#[cfg(unix)]
#[test]
fn process_engine_runs_unit_from_cache() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("hello.csx"), "Hello();\n").expect("write script");

    scriptum(dir.path())
        .args(["--engine", "cat", "run", "hello.csx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("using System;").and(predicate::str::contains("Hello();")));

    assert!(dir.path().join(".cache/hello.csx").exists());
}

#[cfg(unix)]
#[test]
fn failing_runner_sets_exit_code() {
    let dir = tempdir().expect("create temp dir");
    scriptum(dir.path())
        .args(["--engine", "false", "eval", "Boom();"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("script failed"));
}

#[test]
fn repl_reset_keeps_configured_namespaces() {
    let dir = tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("scriptum.toml"),
        "namespaces = [\"From.Config\"]\n",
    )
    .expect("write config");

    scriptum(dir.path())
        .args(["--dry-run", "repl"])
        .write_stdin(":reset\n:usings\n:quit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("From.Config").and(predicate::str::contains("System.Linq")),
        );
}
