use crate::disc::AssessmentResult;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_err, get_optional_str, get_required_str, require_student, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;

const RESULT_COLUMNS: &str = "id, student_id, submission_id, created_at, most_counts, least_counts,
     differences, segno, profile, graphs";

fn to_json_text<T: serde::Serialize>(v: &T) -> Result<String, HandlerErr> {
    serde_json::to_string(v).map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))
}

/// Inserts unless the (student, submission) pair is already stored. Returns
/// whether a row was written.
pub(crate) fn insert_result(conn: &Connection, result: &AssessmentResult) -> Result<bool, HandlerErr> {
    let card = &result.scorecard;
    let changed = conn
        .execute(
            "INSERT INTO results(id, student_id, submission_id, created_at, most_counts,
               least_counts, differences, segno, pattern_name, profile, graphs)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(student_id, submission_id) DO NOTHING",
            rusqlite::params![
                result.id,
                result.student_id,
                result.submission_id,
                result.created_at,
                to_json_text(&card.most_counts)?,
                to_json_text(&card.least_counts)?,
                to_json_text(&card.differences)?,
                card.segno.to_string(),
                card.profile.name,
                to_json_text(&card.profile)?,
                to_json_text(&card.graphs)?,
            ],
        )
        .map_err(|e| {
            HandlerErr::new("db_insert_failed", e.to_string())
                .with_details(json!({ "table": "results" }))
        })?;
    Ok(changed > 0)
}

struct StoredRow {
    id: String,
    student_id: String,
    submission_id: String,
    created_at: String,
    most_counts: String,
    least_counts: String,
    differences: String,
    segno: String,
    profile: String,
    graphs: String,
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: r.get(0)?,
        student_id: r.get(1)?,
        submission_id: r.get(2)?,
        created_at: r.get(3)?,
        most_counts: r.get(4)?,
        least_counts: r.get(5)?,
        differences: r.get(6)?,
        segno: r.get(7)?,
        profile: r.get(8)?,
        graphs: r.get(9)?,
    })
}

fn stored_json(column: &str, text: &str) -> Result<serde_json::Value, HandlerErr> {
    serde_json::from_str(text).map_err(|e| {
        HandlerErr::new("db_query_failed", format!("corrupt {}: {}", column, e))
    })
}

fn row_to_json(row: StoredRow) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "id": row.id,
        "studentId": row.student_id,
        "submissionId": row.submission_id,
        "createdAt": row.created_at,
        "mostCounts": stored_json("most_counts", &row.most_counts)?,
        "leastCounts": stored_json("least_counts", &row.least_counts)?,
        "differences": stored_json("differences", &row.differences)?,
        "segno": row.segno,
        "graphs": stored_json("graphs", &row.graphs)?,
        "profile": stored_json("profile", &row.profile)?,
    }))
}

pub(crate) fn load_submission(
    conn: &Connection,
    student_id: &str,
    submission_id: &str,
) -> Result<Option<serde_json::Value>, HandlerErr> {
    let sql = format!(
        "SELECT {} FROM results WHERE student_id = ? AND submission_id = ?",
        RESULT_COLUMNS
    );
    let row = conn
        .query_row(&sql, (student_id, submission_id), read_row)
        .optional()
        .map_err(db_err("db_query_failed"))?;
    row.map(row_to_json).transpose()
}

fn results_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_student(conn, &student_id)?;

    // Same-second submissions fall back to insertion order.
    let mut stmt = conn
        .prepare(
            "SELECT id, submission_id, created_at, segno, pattern_name
             FROM results
             WHERE student_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .map_err(db_err("db_query_failed"))?;
    let results = stmt
        .query_map([&student_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "submissionId": r.get::<_, String>(1)?,
                "createdAt": r.get::<_, String>(2)?,
                "segno": r.get::<_, String>(3)?,
                "patternName": r.get::<_, String>(4)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err("db_query_failed"))?;

    Ok(json!({ "studentId": student_id, "results": results }))
}

fn results_get(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let result_id = get_required_str(params, "resultId")?;
    let owner = get_optional_str(params, "studentId")?;

    let sql = format!("SELECT {} FROM results WHERE id = ?", RESULT_COLUMNS);
    let row = conn
        .query_row(&sql, [&result_id], read_row)
        .optional()
        .map_err(db_err("db_query_failed"))?;
    // A result owned by someone else looks the same as a missing one.
    let row = row.filter(|r| owner.as_deref().map(|o| o == r.student_id).unwrap_or(true));
    let Some(row) = row else {
        return Err(HandlerErr::new("not_found", "result not found"));
    };
    row_to_json(row)
}

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match results_list(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_results_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match results_get(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.list" => Some(handle_results_list(state, req)),
        "results.get" => Some(handle_results_get(state, req)),
        _ => None,
    }
}
