mod test_support;

use serde_json::json;
use test_support::{answers_by_shape, request_ok, sidecar_command, spawn_with, temp_dir};

const ADJECTIVES: &str = include_str!("../data/adjectives.json");
const RANGES: &str = include_str!("../data/segment_ranges.json");
const PROFILES: &str = include_str!("../data/profiles.json");

fn write_tables(dir: &std::path::Path, profiles: &str) {
    std::fs::write(dir.join("adjectives.json"), ADJECTIVES).expect("write adjectives");
    std::fs::write(dir.join("segment_ranges.json"), RANGES).expect("write ranges");
    std::fs::write(dir.join("profiles.json"), profiles).expect("write profiles");
}

#[test]
fn tables_dir_replaces_builtin_catalog() {
    let dir = temp_dir("discd-tables-override");
    let mut profiles: serde_json::Value = serde_json::from_str(PROFILES).expect("profiles json");
    profiles["segnos"]["7431"] = json!("Creative");
    write_tables(&dir, &profiles.to_string());

    let mut cmd = sidecar_command();
    cmd.env("DISCD_TABLES_DIR", &dir);
    let (mut child, mut stdin, mut reader) = spawn_with(cmd);

    let card = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "assessment.score",
        json!({ "answers": answers_by_shape("Z", "*") }),
    );
    assert_eq!(card["segno"], "7431");
    assert_eq!(card["profile"]["name"], "Creative");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn invalid_tables_dir_stops_startup() {
    let dir = temp_dir("discd-tables-invalid");
    let mut profiles: serde_json::Value = serde_json::from_str(PROFILES).expect("profiles json");
    profiles["shapes"]["D"] = json!("Pioneer");
    write_tables(&dir, &profiles.to_string());

    let mut cmd = sidecar_command();
    cmd.env("DISCD_TABLES_DIR", &dir);
    let (mut child, stdin, _reader) = spawn_with(cmd);
    drop(stdin);
    let status = child.wait().expect("wait");
    assert!(!status.success());
}

#[test]
fn workspace_from_environment_is_open_at_startup() {
    let workspace = temp_dir("discd-env-workspace");
    let mut cmd = sidecar_command();
    cmd.env("DISCD_WORKSPACE", &workspace);
    let (mut child, mut stdin, mut reader) = spawn_with(cmd);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["workspacePath"], json!(workspace.to_string_lossy()));
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Env class" }),
    );
    assert!(created["classId"].is_string());

    drop(stdin);
    let _ = child.wait();
}
