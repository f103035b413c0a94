use super::results::{insert_result, load_submission};
use crate::disc::{AnswerSet, DiscEngine};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, require_student, HandlerErr};
use crate::ipc::types::{AppState, Request};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

fn parse_answers(params: &serde_json::Value) -> Result<AnswerSet, HandlerErr> {
    let Some(raw) = params.get("answers") else {
        return Err(HandlerErr::new("bad_params", "missing answers"));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        HandlerErr::new("bad_params", format!("answers: {}", e))
    })
}

fn assessment_score(engine: &DiscEngine, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let answers = parse_answers(params)?;
    let card = engine.score(&answers).map_err(|e| {
        warn!(code = e.code(), error = %e, "answers rejected");
        HandlerErr::from(e)
    })?;
    serde_json::to_value(&card).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

fn assessment_submit(
    conn: &Connection,
    engine: &DiscEngine,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let submission_id = get_optional_str(params, "submissionId")?
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let answers = parse_answers(params)?;
    require_student(conn, &student_id)?;

    // Score before touching storage: a rejected submission writes nothing.
    let result = engine
        .assemble_result(
            &answers,
            &Uuid::new_v4().to_string(),
            &student_id,
            &submission_id,
            Utc::now(),
        )
        .map_err(|e| {
            warn!(student = %student_id, code = e.code(), error = %e, "submission rejected");
            HandlerErr::from(e)
        })?;

    if insert_result(conn, &result)? {
        info!(
            student = %student_id,
            result = %result.id,
            segno = %result.scorecard.segno,
            pattern = %result.scorecard.profile.name,
            "submission scored"
        );
        let mut v = serde_json::to_value(&result)
            .map_err(|e| HandlerErr::new("internal", e.to_string()))?;
        v["replayed"] = json!(false);
        return Ok(v);
    }

    let Some(mut stored) = load_submission(conn, &student_id, &submission_id)? else {
        return Err(HandlerErr::new(
            "db_query_failed",
            "submission conflicted but no stored result was found",
        ));
    };
    info!(student = %student_id, submission = %submission_id, "submission replayed");
    stored["replayed"] = json!(true);
    Ok(stored)
}

fn handle_questions_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "groups": state.engine.bank.questions() }))
}

fn handle_assessment_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    match assessment_score(&state.engine, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_assessment_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match assessment_submit(conn, &state.engine, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "questions.list" => Some(handle_questions_list(state, req)),
        "assessment.score" => Some(handle_assessment_score(state, req)),
        "assessment.submit" => Some(handle_assessment_submit(state, req)),
        _ => None,
    }
}
