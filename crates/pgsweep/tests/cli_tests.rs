use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

/// Working directory holding an optional config.txt.
struct SweepTestEnv {
    dir: TempDir,
}

impl SweepTestEnv {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn with_config(contents: &str) -> Self {
        let env = Self::new();
        std::fs::write(env.dir.path().join("config.txt"), contents).unwrap();
        env
    }

    /// Command pointed at a port nothing listens on.
    fn pgsweep(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pgsweep"));
        cmd.current_dir(self.dir.path());
        for var in [
            "PGSWEEP_HOST",
            "PGSWEEP_PORT",
            "PGSWEEP_USER",
            "PGSWEEP_PASSWORD",
            "PGSWEEP_DB",
            "PGSWEEP_SSL",
            "PGSWEEP_SSLROOTCERT",
            "PGSWEEP_CONFIG",
            "PGSWEEP_LOG",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("PGSWEEP_HOST", "127.0.0.1").env("PGSWEEP_PORT", "1");
        cmd
    }
}

#[test]
fn test_invalid_ssl_mode_exits_before_connecting() {
    let env = SweepTestEnv::with_config("q1 SELECT 1\n");

    env.pgsweep()
        .arg("-ssl=foobar")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#"\"foobar\"; use disable, require, verify-ca, or verify-full"#))
        .stdout(predicate::str::contains("Connection error").not());
}

#[test]
fn test_missing_config_file_is_fatal() {
    let env = SweepTestEnv::new();

    env.pgsweep()
        .assert()
        .code(1)
        .stdout(predicate::str::contains("can't read config.txt"))
        .stdout(predicate::str::contains("Connection error").not());
}

#[test]
fn test_rejected_query_fails_validation_before_connecting() {
    let env = SweepTestEnv::with_config("q1 SELECT 1\nbad DELETE FROM t\n");

    env.pgsweep()
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid query in config file"))
        .stdout(predicate::str::contains("Invalid config line 2"))
        .stdout(predicate::str::contains("Connection error").not());
}

#[test]
fn test_config_flag_overrides_default_path() {
    let env = SweepTestEnv::new();
    std::fs::write(env.dir.path().join("battery.txt"), "orphan\n").unwrap();

    env.pgsweep()
        .args(["-config", "battery.txt"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid line format in config file"))
        .stdout(predicate::str::contains("Invalid config line 1"));
}

#[test]
fn test_unreachable_database_is_fatal() {
    let env = SweepTestEnv::with_config("q1 SELECT 1\n");

    env.pgsweep()
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""message":"Initialized""#))
        .stdout(predicate::str::contains(r#""category":"Connection""#))
        .stdout(predicate::str::contains("connected to database").not());
}

#[test]
fn test_invalid_port_is_usage_error() {
    let env = SweepTestEnv::with_config("q1 SELECT 1\n");

    env.pgsweep().args(["-port", "notaport"]).assert().code(2);
}
