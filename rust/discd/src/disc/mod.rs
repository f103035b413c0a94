//! DiSC scoring engine: question bank, answer validation, tallying,
//! segment classification and profile lookup. Everything here is pure; the
//! only input besides the answers is the three reference tables.

pub mod answers;
pub mod assemble;
pub mod bank;
pub mod classify;
pub mod dimension;
pub mod error;
pub mod profile;
pub mod score;

pub use answers::AnswerSet;
pub use assemble::AssessmentResult;
pub use bank::QuestionBank;
pub use classify::RangeTables;
pub use error::{ScoringError, TableError};
pub use profile::ProfileCatalog;

use anyhow::Context;
use std::path::Path;

pub const ADJECTIVES_FILE: &str = "adjectives.json";
pub const RANGES_FILE: &str = "segment_ranges.json";
pub const PROFILES_FILE: &str = "profiles.json";

const BUILTIN_ADJECTIVES: &str = include_str!("../../data/adjectives.json");
const BUILTIN_RANGES: &str = include_str!("../../data/segment_ranges.json");
const BUILTIN_PROFILES: &str = include_str!("../../data/profiles.json");

/// The validated reference tables. Loaded once at startup and shared
/// read-only by every request.
#[derive(Debug, Clone)]
pub struct DiscEngine {
    pub bank: QuestionBank,
    pub ranges: RangeTables,
    pub catalog: ProfileCatalog,
}

impl DiscEngine {
    pub fn from_json(adjectives: &str, ranges: &str, profiles: &str) -> Result<Self, TableError> {
        Ok(Self {
            bank: QuestionBank::from_json(adjectives)?,
            ranges: RangeTables::from_json(ranges)?,
            catalog: ProfileCatalog::from_json(profiles)?,
        })
    }

    /// Tables compiled into the binary.
    pub fn load_builtin() -> Result<Self, TableError> {
        Self::from_json(BUILTIN_ADJECTIVES, BUILTIN_RANGES, BUILTIN_PROFILES)
    }

    /// Replacement tables from a directory. All three files must be present.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
        };
        let adjectives = read(ADJECTIVES_FILE)?;
        let ranges = read(RANGES_FILE)?;
        let profiles = read(PROFILES_FILE)?;
        let engine = Self::from_json(&adjectives, &ranges, &profiles)
            .with_context(|| format!("validate tables in {}", dir.display()))?;
        Ok(engine)
    }
}
