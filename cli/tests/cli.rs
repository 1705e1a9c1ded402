use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn bad_subcommand_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("adya")?;
    cmd.arg("foobar");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn generate_then_check_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let dir = assert_fs::TempDir::new()?;
    let history_path = dir.path().join("history.bin");

    let mut generate = Command::cargo_bin("adya")?;
    generate
        .arg("generate")
        .arg("--output")
        .arg(&history_path)
        .arg("--objects")
        .arg("3")
        .arg("--connections")
        .arg("2")
        .arg("--transactions")
        .arg("6");
    generate.assert().success().stdout(predicate::str::contains("wrote"));

    assert!(history_path.exists());

    let mut check = Command::cargo_bin("adya")?;
    check.arg("check").arg("--history").arg(&history_path).arg("--target-isolation").arg("PL-0");
    check.assert().success();

    Ok(())
}

#[test]
fn check_rejects_missing_history_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("adya")?;
    cmd.arg("check").arg("--history").arg("/nonexistent/history.bin");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_isolation_runs_generate_and_check_together() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("adya")?;
    cmd.arg("test-isolation")
        .arg("--target-isolation")
        .arg("PL-0")
        .arg("--objects")
        .arg("3")
        .arg("--connections")
        .arg("2")
        .arg("--transactions")
        .arg("6");
    cmd.assert().success();
    Ok(())
}
