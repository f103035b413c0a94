use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_err, get_optional_str, get_required_str, require_class, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::roster::{parse_roster, RosterError};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

fn students_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    require_class(conn, &class_id)?;

    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.first_name, s.last_name, s.username, s.sort_order,
                    (SELECT COUNT(*) FROM results r WHERE r.student_id = s.id)
             FROM students s
             WHERE s.class_id = ?
             ORDER BY s.sort_order, s.last_name, s.first_name",
        )
        .map_err(db_err("db_query_failed"))?;
    let students = stmt
        .query_map([&class_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "firstName": r.get::<_, String>(1)?,
                "lastName": r.get::<_, String>(2)?,
                "username": r.get::<_, String>(3)?,
                "sortOrder": r.get::<_, i64>(4)?,
                "resultCount": r.get::<_, i64>(5)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err("db_query_failed"))?;

    Ok(json!({ "classId": class_id, "students": students }))
}

fn requested_student_ids(params: &serde_json::Value) -> Result<Vec<String>, HandlerErr> {
    let items = match params.get("studentIds") {
        None | Some(serde_json::Value::Null) => return Ok(vec![get_required_str(params, "studentId")?]),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => return Err(HandlerErr::new("bad_params", "studentIds must be an array")),
    };
    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(id) = item.as_str() else {
            return Err(HandlerErr::new("bad_params", "studentIds must hold strings"));
        };
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    if ids.is_empty() {
        return Err(HandlerErr::new("bad_params", "studentIds must not be empty"));
    }
    Ok(ids)
}

/// Deletes one student (`studentId`) or a batch (`studentIds`, scoped to
/// `classId`) with their results. Nothing is deleted unless every id resolves.
fn students_delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_ids = requested_student_ids(params)?;
    let class_id = get_optional_str(params, "classId")?;
    let batch = params.get("studentIds").map_or(false, |v| !v.is_null());
    if batch && class_id.is_none() {
        return Err(HandlerErr::new("bad_params", "missing classId"));
    }
    if let Some(class_id) = &class_id {
        require_class(conn, class_id)?;
    }

    let tx = conn.unchecked_transaction().map_err(db_err("db_tx_failed"))?;
    let mut missing = Vec::new();
    for student_id in &student_ids {
        let found: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM students WHERE id = ?1 AND (?2 IS NULL OR class_id = ?2)",
                (student_id, &class_id),
                |r| r.get(0),
            )
            .optional()
            .map_err(db_err("db_query_failed"))?;
        if found.is_none() {
            missing.push(student_id.clone());
        }
    }
    if !missing.is_empty() {
        return Err(HandlerErr::new("not_found", "student not found")
            .with_details(json!({ "studentIds": missing })));
    }

    let mut results = 0usize;
    for student_id in &student_ids {
        results += tx
            .execute("DELETE FROM results WHERE student_id = ?", [student_id])
            .map_err(|e| {
                HandlerErr::new("db_delete_failed", e.to_string())
                    .with_details(json!({ "table": "results" }))
            })?;
        tx.execute("DELETE FROM students WHERE id = ?", [student_id])
            .map_err(|e| {
                HandlerErr::new("db_delete_failed", e.to_string())
                    .with_details(json!({ "table": "students" }))
            })?;
    }
    tx.commit().map_err(db_err("db_commit_failed"))?;

    info!(students = student_ids.len(), results, "students deleted");
    Ok(json!({
        "ok": true,
        "studentsDeleted": student_ids.len(),
        "resultsDeleted": results,
    }))
}

fn read_roster_text(params: &serde_json::Value) -> Result<String, HandlerErr> {
    match params.get("csvText") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::String(text)) => return Ok(text.clone()),
        Some(_) => return Err(HandlerErr::new("bad_params", "csvText must be a string")),
    }
    let Some(path) = get_optional_str(params, "inPath")? else {
        return Err(HandlerErr::new("bad_params", "missing csvText or inPath"));
    };
    std::fs::read_to_string(&path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": path }))
    })
}

/// Upserts by username within the class: known usernames get their names
/// refreshed, new ones are appended after the current last student.
fn students_import_csv(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    require_class(conn, &class_id)?;
    let text = read_roster_text(params)?;

    let roster = parse_roster(&text).map_err(|e| {
        let details = match &e {
            RosterError::MissingColumns(cols) => Some(json!({ "missingColumns": cols })),
            RosterError::Empty => None,
        };
        HandlerErr {
            code: "bad_params",
            message: e.to_string(),
            details,
        }
    })?;

    let tx = conn.unchecked_transaction().map_err(db_err("db_tx_failed"))?;
    let mut next_sort: i64 = tx
        .query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM students WHERE class_id = ?",
            [&class_id],
            |r| r.get(0),
        )
        .map_err(db_err("db_query_failed"))?;

    let mut inserted = 0usize;
    let mut updated = 0usize;
    for row in &roster.rows {
        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM students WHERE class_id = ? AND lower(username) = ?",
                (&class_id, &row.username),
                |r| r.get(0),
            )
            .optional()
            .map_err(db_err("db_query_failed"))?;

        match existing {
            Some(student_id) => {
                tx.execute(
                    "UPDATE students SET first_name = ?, last_name = ? WHERE id = ?",
                    (&row.first_name, &row.last_name, &student_id),
                )
                .map_err(db_err("db_update_failed"))?;
                updated += 1;
            }
            None => {
                tx.execute(
                    "INSERT INTO students(id, class_id, first_name, last_name, username, sort_order)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        Uuid::new_v4().to_string(),
                        &class_id,
                        &row.first_name,
                        &row.last_name,
                        &row.username,
                        next_sort,
                    ),
                )
                .map_err(|e| {
                    HandlerErr::new("db_insert_failed", e.to_string())
                        .with_details(json!({ "table": "students", "line": row.line }))
                })?;
                next_sort += 1;
                inserted += 1;
            }
        }
    }
    tx.commit().map_err(db_err("db_commit_failed"))?;

    info!(
        class = %class_id,
        inserted,
        updated,
        skipped = roster.warnings.len(),
        "roster imported"
    );
    Ok(json!({
        "studentsInserted": inserted,
        "studentsUpdated": updated,
        "warnings": roster.warnings,
    }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_list(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_delete(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_import_csv(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.importCsv" => Some(handle_students_import_csv(state, req)),
        _ => None,
    }
}
