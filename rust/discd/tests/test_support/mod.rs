#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

const ADJECTIVES: &str = include_str!("../../data/adjectives.json");

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn sidecar_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_discd"));
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("DISCD_WORKSPACE")
        .env_remove("DISCD_TABLES_DIR");
    cmd
}

pub fn spawn_with(mut cmd: Command) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let mut child = cmd.spawn().expect("spawn discd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_with(sidecar_command())
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

/// Returns the `error` object after checking its code.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
    code: &str,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    let error = value.get("error").cloned().expect("error object");
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some(code), "{}", error);
    error
}

pub fn str_field(v: &serde_json::Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .unwrap_or_else(|| panic!("missing {} in {}", key, v))
        .to_string()
}

/// Answers picking, in every group, the adjective scored as `most` for
/// "most" and a different adjective scored as `least` for "least" (any other
/// adjective when the group has none). Shape codes: Z, S, T, *.
pub fn answers_by_shape(most: &str, least: &str) -> serde_json::Value {
    let bank: serde_json::Value = serde_json::from_str(ADJECTIVES).expect("adjectives json");
    let mut answers = serde_json::Map::new();
    for group in bank["groups"].as_array().expect("groups") {
        let g = group["group"].as_u64().expect("group number");
        let adjs = group["adjectives"].as_array().expect("adjectives");
        let m = adjs
            .iter()
            .find(|a| a["mostShape"] == most)
            .expect("most shape present");
        let l = adjs
            .iter()
            .find(|a| a["leastShape"] == least && a["id"] != m["id"])
            .or_else(|| adjs.iter().find(|a| a["id"] != m["id"]))
            .expect("least pick");
        answers.insert(g.to_string(), json!({ "most": m["id"], "least": l["id"] }));
    }
    serde_json::Value::Object(answers)
}

/// Workspace with one class and the given roster imported. Returns
/// (class id, student ids in roster order).
pub fn seed_class(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &std::path::Path,
    csv_text: &str,
) -> (String, Vec<String>) {
    let _ = request_ok(
        stdin,
        reader,
        "seed-1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let class = request_ok(
        stdin,
        reader,
        "seed-2",
        "classes.create",
        json!({ "name": "Leadership 101", "classYear": 2025, "semester": "Fall" }),
    );
    let class_id = str_field(&class, "classId");
    let _ = request_ok(
        stdin,
        reader,
        "seed-3",
        "students.importCsv",
        json!({ "classId": class_id.clone(), "csvText": csv_text }),
    );
    let students = request_ok(
        stdin,
        reader,
        "seed-4",
        "students.list",
        json!({ "classId": class_id.clone() }),
    );
    let ids = students["students"]
        .as_array()
        .expect("students")
        .iter()
        .map(|s| str_field(s, "id"))
        .collect();
    (class_id, ids)
}
