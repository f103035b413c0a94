use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_err, get_optional_str, get_required_str, require_class, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    // Correlated subqueries avoid double-counting from joins.
    let mut stmt = match conn.prepare(
        "SELECT
           c.id,
           c.name,
           c.class_year,
           c.semester,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count,
           (SELECT COUNT(*) FROM results r
              JOIN students s ON s.id = r.student_id
             WHERE s.class_id = c.id) AS result_count
         FROM classes c
         ORDER BY c.name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt
        .query_map([], |row| {
            Ok(json!({
                "id": row.get::<_, String>(0)?,
                "name": row.get::<_, String>(1)?,
                "classYear": row.get::<_, Option<i64>>(2)?,
                "semester": row.get::<_, Option<String>>(3)?,
                "studentCount": row.get::<_, i64>(4)?,
                "resultCount": row.get::<_, i64>(5)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(classes) => ok(&req.id, json!({ "classes": classes })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn classes_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")
        .map_err(|_| HandlerErr::new("bad_params", "name must not be empty"))?;
    let class_year = match params.get("classYear") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(v.as_i64().ok_or_else(|| {
            HandlerErr::new("bad_params", "classYear must be an integer")
        })?),
    };
    let semester = get_optional_str(params, "semester")?;

    let class_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO classes(id, name, class_year, semester) VALUES(?, ?, ?, ?)",
        (&class_id, &name, class_year, &semester),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string()).with_details(json!({ "table": "classes" }))
    })?;
    info!(class = %class_id, name = %name, "class created");

    Ok(json!({
        "classId": class_id,
        "name": name,
        "classYear": class_year,
        "semester": semester,
    }))
}

fn classes_delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    require_class(conn, &class_id)?;

    let tx = conn.unchecked_transaction().map_err(db_err("db_tx_failed"))?;

    // Explicit dependency order; the schema has no ON DELETE CASCADE.
    // The transaction rolls back on drop if any step fails.
    let steps: [(&str, &str); 3] = [
        (
            "results",
            "DELETE FROM results
             WHERE student_id IN (SELECT id FROM students WHERE class_id = ?)",
        ),
        ("students", "DELETE FROM students WHERE class_id = ?"),
        ("classes", "DELETE FROM classes WHERE id = ?"),
    ];
    let mut removed = serde_json::Map::new();
    for (table, sql) in steps {
        let n = tx.execute(sql, [&class_id]).map_err(|e| {
            HandlerErr::new("db_delete_failed", e.to_string()).with_details(json!({ "table": table }))
        })?;
        removed.insert(table.to_string(), json!(n));
    }

    tx.commit().map_err(db_err("db_commit_failed"))?;
    info!(class = %class_id, "class deleted");
    Ok(json!({ "ok": true, "deleted": removed }))
}

/// Instructor view: every student in roster order with their latest result,
/// or null when they have not submitted yet.
fn classes_results(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    require_class(conn, &class_id)?;

    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.first_name, s.last_name, s.username,
                    r.id, r.created_at, r.segno, r.pattern_name,
                    (SELECT COUNT(*) FROM results x WHERE x.student_id = s.id)
             FROM students s
             LEFT JOIN results r ON r.id = (
               SELECT l.id FROM results l
               WHERE l.student_id = s.id
               ORDER BY l.created_at DESC, l.rowid DESC
               LIMIT 1
             )
             WHERE s.class_id = ?
             ORDER BY s.sort_order, s.last_name, s.first_name",
        )
        .map_err(db_err("db_query_failed"))?;
    let students = stmt
        .query_map([&class_id], |r| {
            let latest = match r.get::<_, Option<String>>(4)? {
                Some(id) => json!({
                    "id": id,
                    "createdAt": r.get::<_, String>(5)?,
                    "segno": r.get::<_, String>(6)?,
                    "patternName": r.get::<_, String>(7)?,
                }),
                None => serde_json::Value::Null,
            };
            Ok(json!({
                "studentId": r.get::<_, String>(0)?,
                "firstName": r.get::<_, String>(1)?,
                "lastName": r.get::<_, String>(2)?,
                "username": r.get::<_, String>(3)?,
                "resultCount": r.get::<_, i64>(8)?,
                "latest": latest,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err("db_query_failed"))?;

    Ok(json!({ "classId": class_id, "students": students }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match classes_create(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match classes_delete(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_classes_results(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match classes_results(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        "classes.results" => Some(handle_classes_results(state, req)),
        _ => None,
    }
}
