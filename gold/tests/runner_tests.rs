//! Integration tests for the golden-file runner.

#![allow(clippy::panic_in_result_fn)]

use anyhow::Result;
use assert_fs::prelude::*;
use gold::filter::{BcryptHashes, CustomFilter, FormatJson, TimeRfc3339, Uuids};
use gold::{ComparisonError, Error, Runner, RunnerConfig};
use pretty_assertions::assert_eq;
use std::path::Path;

fn count_entries(dir: &Path) -> Result<usize> {
    Ok(std::fs::read_dir(dir)?.count())
}

fn expect_failure(result: Result<(), Error>) -> Result<Error> {
    match result {
        Ok(()) => anyhow::bail!("expected the call to fail"),
        Err(err) => Ok(err),
    }
}

#[test]
fn prepare_only_resets_in_update_mode() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    temp_dir.child("stale.golden").write_str("old")?;
    assert_eq!(count_entries(temp_dir.path())?, 1);

    let mut runner = Runner::new(temp_dir.path());

    // Check mode leaves the directory alone.
    runner.prepare()?;
    assert_eq!(count_entries(temp_dir.path())?, 1);

    // Update mode deletes and recreates it.
    runner.set_update(true);
    runner.prepare()?;
    assert!(temp_dir.path().is_dir());
    assert_eq!(count_entries(temp_dir.path())?, 0);

    Ok(())
}

#[test]
fn prepare_creates_missing_directory() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let golden_dir = temp_dir.child("nested").child("golden");

    let runner = Runner::from_config(RunnerConfig::new(golden_dir.path()).with_update(true));
    runner.prepare()?;

    assert!(golden_dir.path().is_dir());

    Ok(())
}

#[cfg(unix)]
#[test]
fn prepare_reports_storage_errors() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let not_a_dir = temp_dir.child("plain-file");
    not_a_dir.write_str("content")?;

    let runner = Runner::from_config(RunnerConfig::new(not_a_dir.path()).with_update(true));
    let err = expect_failure(runner.prepare())?;

    assert!(matches!(err, Error::RemoveDirectory(ref path, _) if path == not_a_dir.path()));
    assert!(!err.is_comparison());

    Ok(())
}

#[cfg(unix)]
#[test]
fn update_reports_directory_creation_errors() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let blocker = temp_dir.child("api");
    blocker.write_str("a file where a directory belongs")?;

    let runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    let err = expect_failure(runner.test("api/users.json", b"[]"))?;

    assert!(matches!(err, Error::CreateDirectory(ref path, _) if path == blocker.path()));
    blocker.assert("a file where a directory belongs");

    Ok(())
}

#[cfg(unix)]
#[test]
fn update_reports_write_errors() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let occupied = temp_dir.child("case");
    occupied.create_dir_all()?;

    let runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    let err = expect_failure(runner.test("case", b"content"))?;

    assert!(matches!(err, Error::WriteFile(ref path, _) if path == occupied.path()));
    assert!(!err.is_comparison());
    assert!(occupied.path().is_dir());

    Ok(())
}

#[test]
fn update_keeps_trailing_newline_of_json_output() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let mut runner = Runner::from_config(
        RunnerConfig::new(temp_dir.path())
            .with_update(true)
            .with_filter(FormatJson),
    );

    runner.test("dup.json", b"{\"a\":1,\"a\":2}\n")?;
    temp_dir
        .child("dup.json")
        .assert("{\n\t\"a\": 1,\n\t\"a\": 2\n}\n");

    // Changing the first of two duplicate keys is a real difference.
    runner.set_update(false);
    runner.test("dup.json", b"{\"a\": 1, \"a\": 2}\n")?;
    let err = expect_failure(runner.test("dup.json", b"{\"a\":3,\"a\":2}\n"))?;
    assert!(err.is_comparison());

    Ok(())
}

#[test]
fn update_then_check() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let mut runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    runner.prepare()?;

    // Update mode creates the files.
    runner.test("test1", b"This is a test.")?;
    runner.test("test2", "This is another test.")?;

    temp_dir.child("test1").assert("This is a test.");
    temp_dir.child("test2").assert("This is another test.");

    // Check mode compares against them.
    runner.set_update(false);
    runner.test("test1", b"This is a test.")?;
    runner.test("test2", b"This is another test.")?;

    Ok(())
}

#[test]
fn update_creates_intermediate_directories() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));

    runner.test("api/users/list.json", b"[]")?;

    temp_dir.child("api/users/list.json").assert("[]");

    Ok(())
}

#[test]
fn update_overwrites_existing_file() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    temp_dir.child("case").write_str("a much longer previous golden content")?;

    let runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    runner.test("case", b"short")?;

    temp_dir.child("case").assert("short");

    Ok(())
}

#[test]
fn check_reports_comparison_error() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let mut runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    runner.prepare()?;
    runner.test("test1", b"This is a test.")?;

    runner.set_update(false);
    let err = expect_failure(runner.test("test1", b"The content is different."))?;

    assert!(err.is_comparison());
    assert!(matches!(err, Error::Comparison(ComparisonError)));
    assert_eq!(err.to_string(), "output and file are different");

    // A prefix of the stored content is still a mismatch.
    let err = expect_failure(runner.test("test1", b"This is a test"))?;
    assert!(err.is_comparison());

    // Check mode never touches the stored file.
    temp_dir.child("test1").assert("This is a test.");

    Ok(())
}

#[test]
fn check_reports_missing_golden_file() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let runner = Runner::new(temp_dir.path());

    let err = expect_failure(runner.test("never-written", b"anything"))?;

    match err {
        Error::ReadFile(path, source) => {
            assert_eq!(path, temp_dir.path().join("never-written"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => anyhow::bail!("unexpected error: {other}"),
    }

    Ok(())
}

#[test]
fn filters_apply_before_write_and_compare() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let mut runner = Runner::from_config(RunnerConfig::new(temp_dir.path()).with_update(true));
    runner.prepare()?;

    runner.add_filter(|_: &[u8]| b"The output was altered.".to_vec());

    runner.test("test1", b"The output was not altered.")?;
    temp_dir.child("test1").assert("The output was altered.");

    runner.set_update(false);
    runner.test("test1", b"Whatever goes in is altered the same way.")?;

    Ok(())
}

#[test]
fn volatile_fields_are_normalized() -> Result<()> {
    let temp_dir = assert_fs::TempDir::new()?;
    let config = RunnerConfig::new(temp_dir.path())
        .with_update(true)
        .with_filter(FormatJson)
        .with_filter(TimeRfc3339)
        .with_filter(BcryptHashes)
        .with_filter(Uuids)
        .with_filter(CustomFilter::new(r"req-[0-9]+", "req-N")?);
    let mut runner = Runner::from_config(config);

    let first_run = br#"{"id":"25cef774-e2e6-4c78-ac1d-7b1acf1b28e6","created":"2021-06-01T10:00:00Z","password":"$2a$10$aE6OdEySkK3g4HDnvJbFh.VXOW/gO7yDJEBqK/pnezwxjnkOo6kfC","request":"req-17"}"#;
    runner.test("user.json", first_run)?;

    temp_dir.child("user.json").assert(
        "{\n\
         \t\"id\": \"00000000-0000-0000-0000-000000000000\",\n\
         \t\"created\": \"0000-00-00T00:00:00Z\",\n\
         \t\"password\": \"_HASH_\",\n\
         \t\"request\": \"req-N\"\n\
         }",
    );

    // A later run produces different volatile values but the same shape.
    runner.set_update(false);
    let second_run = br#"{"id": "9a1f3c52-0b7e-4d21-8f6a-2c4e6b8d0f13", "created": "2023-11-30T23:59:59Z", "password": "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW", "request": "req-904"}"#;
    runner.test("user.json", second_run)?;

    // A real change in the content is still caught.
    let changed = br#"{"id":"25cef774-e2e6-4c78-ac1d-7b1acf1b28e6","created":"2021-06-01T10:00:00Z","password":"$2a$10$aE6OdEySkK3g4HDnvJbFh.VXOW/gO7yDJEBqK/pnezwxjnkOo6kfC","request":"req-17","admin":true}"#;
    assert!(expect_failure(runner.test("user.json", changed))?.is_comparison());

    Ok(())
}
