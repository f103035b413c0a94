//! Class roster CSV: a header row naming `firstname`, `lastname` and
//! `collegeusername` (any order, any case, other columns ignored) followed by
//! one student per line.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

pub const FIRST_NAME_COLUMN: &str = "firstname";
pub const LAST_NAME_COLUMN: &str = "lastname";
pub const USERNAME_COLUMN: &str = "collegeusername";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,
    #[error("roster header is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub line: usize,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// A skipped data line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterWarning {
    pub line: usize,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub rows: Vec<RosterRow>,
    pub warnings: Vec<RosterWarning>,
}

pub fn parse_roster(text: &str) -> Result<Roster, RosterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(RosterError::Empty);
    };
    let header: Vec<String> = parse_csv_record(header)
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let col = |name: &str| header.iter().position(|h| h == name);
    let (first_idx, last_idx, user_idx) =
        match (col(FIRST_NAME_COLUMN), col(LAST_NAME_COLUMN), col(USERNAME_COLUMN)) {
            (Some(f), Some(l), Some(u)) => (f, l, u),
            (f, l, u) => {
                let missing = [
                    (f, FIRST_NAME_COLUMN),
                    (l, LAST_NAME_COLUMN),
                    (u, USERNAME_COLUMN),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name)
                .collect();
                return Err(RosterError::MissingColumns(missing));
            }
        };

    let mut roster = Roster::default();
    let mut seen: HashSet<String> = HashSet::new();
    for (line_no, raw_line) in lines {
        let line = line_no + 1;
        let fields = parse_csv_record(raw_line);
        let field = |idx: usize| fields.get(idx).map(|s| s.trim()).unwrap_or("");
        let (first_name, last_name, username) = (field(first_idx), field(last_idx), field(user_idx));

        let missing: Vec<&str> = [
            (first_name, FIRST_NAME_COLUMN),
            (last_name, LAST_NAME_COLUMN),
            (username, USERNAME_COLUMN),
        ]
        .into_iter()
        .filter(|(v, _)| v.is_empty())
        .map(|(_, name)| name)
        .collect();
        if !missing.is_empty() {
            roster.warnings.push(RosterWarning {
                line,
                code: "missing_field",
                message: format!("missing {}", missing.join(", ")),
            });
            continue;
        }

        // Usernames compare case-insensitively; the first occurrence wins.
        let username = username.to_ascii_lowercase();
        if !seen.insert(username.clone()) {
            roster.warnings.push(RosterWarning {
                line,
                code: "duplicate_username",
                message: format!("{} already appears earlier in the file", username),
            });
            continue;
        }

        roster.rows.push(RosterRow {
            line,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username,
        });
    }
    Ok(roster)
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}
