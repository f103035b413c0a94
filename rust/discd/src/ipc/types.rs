use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::disc::DiscEngine;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub engine: DiscEngine,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
}

impl AppState {
    pub fn new(engine: DiscEngine) -> Self {
        Self {
            engine,
            workspace: None,
            db: None,
        }
    }
}
