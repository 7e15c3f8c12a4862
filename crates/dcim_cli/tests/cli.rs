use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;

const SCENARIO_BODY: &str = r#"{"xname": "x3000b7n3", "role": "compute", "class": "river", "arch": "x86_64", "net_type": "ethernet", "flag": "ok"}"#;

fn dcim(db: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("dcim");
    cmd.env_remove("DCIM_LOG_DIR")
        .env_remove("DCIM_LOG_LEVEL")
        .env("DCIM_DB_PATH", db);
    cmd
}

fn create_scenario_component(db: &Path) -> String {
    let output = dcim(db)
        .args(["create", "--json", SCENARIO_BODY])
        .output()
        .unwrap();
    assert!(output.status.success());
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    envelope["component"]["uid"].as_str().unwrap().to_string()
}

#[test]
fn create_prints_component_with_uid() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");

    let uid = create_scenario_component(&db);
    assert!(uuid_like(&uid), "unexpected uid {uid}");
}

#[test]
fn read_by_xname_and_uid_return_same_component() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    let uid = create_scenario_component(&db);

    let by_uid = dcim(&db).args(["read", &uid]).output().unwrap();
    let by_xname = dcim(&db).args(["read", "x3000b7n3"]).output().unwrap();
    assert!(by_uid.status.success());
    assert_eq!(by_uid.stdout, by_xname.stdout);
}

#[test]
fn malformed_body_exits_with_malformed_input_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");

    dcim(&db)
        .args(["create", "--json", "invalid-json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("malformed_input"));
}

#[test]
fn illegal_enum_exits_with_validation_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    let body = SCENARIO_BODY.replace("ethernet", "token ring");

    dcim(&db)
        .args(["create", "--json", &body])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("net_type"));
}

#[test]
fn duplicate_xname_exits_with_conflict_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    create_scenario_component(&db);

    dcim(&db)
        .args(["create", "--json", SCENARIO_BODY])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("conflict"));
}

#[test]
fn replace_reads_body_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    let uid = create_scenario_component(&db);

    dcim(&db)
        .args(["replace", &uid, "--json", "-"])
        .write_stdin(SCENARIO_BODY.replace("compute", "storage"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""role":"storage""#));
}

#[test]
fn replace_unknown_uid_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");

    dcim(&db)
        .args([
            "replace",
            "11111111-2222-4333-8444-555555555555",
            "--json",
            SCENARIO_BODY,
        ])
        .assert()
        .code(4);
}

#[test]
fn delete_then_read_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    let uid = create_scenario_component(&db);

    dcim(&db)
        .args(["delete", &uid])
        .assert()
        .success()
        .stdout(predicate::str::contains(uid.as_str()));
    dcim(&db)
        .args(["read", &uid])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not_found"));
}

#[test]
fn delete_by_xname_is_rejected_as_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");
    create_scenario_component(&db);

    dcim(&db).args(["delete", "x3000b7n3"]).assert().code(2);
}

#[test]
fn relative_log_dir_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("dcim.sqlite3");

    dcim(&db)
        .args(["--log-dir", "logs", "read", "x3000b7n3"])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("absolute"));
}

fn uuid_like(value: &str) -> bool {
    let groups: Vec<_> = value.split('-').map(str::len).collect();
    groups == [8, 4, 4, 4, 12]
}
