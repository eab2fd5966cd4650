//! End-to-end tests for the memceil binary.
//!
//! stdout is a contract: one status line before every line of input, script
//! output in between, and a final status line after teardown.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn memceil() -> Command {
    let mut cmd = Command::cargo_bin("memceil").unwrap();
    cmd.env_remove("MEMCEIL_BYTE_LIMIT")
        .env_remove("MEMCEIL_POLICY")
        .env_remove("MEMCEIL_TRACE")
        .env_remove("MEMCEIL_LOG");
    cmd
}

#[test]
fn empty_input_prints_two_status_lines() {
    memceil()
        .write_stdin("")
        .assert()
        .success()
        .stdout("0 bytes allocated\n0 bytes allocated\n");
}

#[test]
fn walkthrough_at_default_limit() {
    let script = "alloc big 20000\nrealloc big 25000\nrealloc big 35000\nrealloc big 0\n";
    memceil().write_stdin(script).assert().success().stdout(
        "0 bytes allocated\n\
         20000 bytes allocated\n\
         25000 bytes allocated\n\
         error: not enough memory\n\
         25000 bytes allocated\n\
         0 bytes allocated\n\
         0 bytes allocated\n",
    );
}

#[test]
fn quit_stops_and_teardown_frees() {
    memceil()
        .write_stdin("alloc a 100\nquit\nalloc b 100\n")
        .assert()
        .success()
        .stdout("0 bytes allocated\n100 bytes allocated\n0 bytes allocated\n");
}

#[test]
fn limit_flag_overrides_default() {
    memceil()
        .args(["--limit", "10"])
        .write_stdin("alloc a 11\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: not enough memory"));
}

#[test]
fn limit_env_is_honored() {
    memceil()
        .env("MEMCEIL_BYTE_LIMIT", "50000")
        .write_stdin("alloc a 40000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("40000 bytes allocated"));
}

#[test]
fn unbounded_never_refuses() {
    memceil()
        .arg("--unbounded")
        .write_stdin("alloc a 100000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("100000 bytes allocated"))
        .stdout(predicate::str::contains("error").not());
}

#[test]
fn script_file_argument() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.txt");
    std::fs::write(&path, "-- demo\nalloc a 8\nshow a\n").unwrap();

    memceil()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("a: 8 bytes, checksum 0\n"));
}

#[test]
fn summary_goes_to_stderr() {
    memceil()
        .arg("--summary")
        .write_stdin("alloc a 10\nalloc b 20000\nalloc c 20000\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"peak_bytes\": 20010"))
        .stderr(predicate::str::contains("\"denied_requests\": 1"))
        .stderr(predicate::str::contains("\"lines_run\": 3"));
}

#[test]
fn bad_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{"byte_limit": -3}"#).unwrap();

    memceil()
        .arg("--config")
        .arg(&path)
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn missing_script_fails() {
    memceil()
        .arg("/definitely/not/here.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn non_utf8_line_is_an_error_line_not_a_crash() {
    memceil()
        .write_stdin(&b"alloc a 10\n\xff\n"[..])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "0 bytes allocated\n10 bytes allocated\nerror: ",
        ))
        .stdout(predicate::str::ends_with(
            "10 bytes allocated\n0 bytes allocated\n",
        ));
}
