use crate::disc::ScoringError;
use crate::ipc::error::{err, scoring_details};
use rusqlite::{Connection, OptionalExtension};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ScoringError> for HandlerErr {
    fn from(e: ScoringError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: Some(scoring_details(&e)),
        }
    }
}

pub fn db_err(code: &'static str) -> impl Fn(rusqlite::Error) -> HandlerErr {
    move |e| HandlerErr::new(code, e.to_string())
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Absent and null are both `None`; any other non-string is rejected.
pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(_) => Err(HandlerErr::new(
            "bad_params",
            format!("{} must be a string", key),
        )),
    }
}

pub fn class_exists(conn: &Connection, class_id: &str) -> Result<bool, HandlerErr> {
    conn.query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
    .map_err(db_err("db_query_failed"))
}

pub fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, HandlerErr> {
    conn.query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
    .map_err(db_err("db_query_failed"))
}

pub fn require_class(conn: &Connection, class_id: &str) -> Result<(), HandlerErr> {
    if class_exists(conn, class_id)? {
        Ok(())
    } else {
        Err(HandlerErr::new("not_found", "class not found"))
    }
}

pub fn require_student(conn: &Connection, student_id: &str) -> Result<(), HandlerErr> {
    if student_exists(conn, student_id)? {
        Ok(())
    } else {
        Err(HandlerErr::new("not_found", "student not found"))
    }
}
