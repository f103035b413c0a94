use crate::disc::ScoringError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn scoring_details(e: &ScoringError) -> serde_json::Value {
    match e {
        ScoringError::IncompleteAnswers { groups } => json!({ "groups": groups }),
        ScoringError::DuplicateSelection {
            group,
            adjective_id,
        }
        | ScoringError::InvalidAdjectiveReference {
            group,
            adjective_id,
        } => json!({ "group": group, "adjectiveId": adjective_id }),
        ScoringError::UnknownProfilePattern { segno } => json!({ "segno": segno }),
    }
}
