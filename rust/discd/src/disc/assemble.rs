use super::answers::AnswerSet;
use super::classify::{classify, DifferenceVector, Graphs, Segno};
use super::error::ScoringError;
use super::profile::Profile;
use super::score::{score, DimensionCounts};
use super::DiscEngine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Everything derived from one answer set. Identical input always yields an
/// identical scorecard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub most_counts: DimensionCounts,
    pub least_counts: DimensionCounts,
    pub differences: DifferenceVector,
    pub segno: Segno,
    pub graphs: Graphs,
    pub profile: Profile,
}

/// A scorecard bound to the student who submitted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub id: String,
    pub student_id: String,
    pub submission_id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub scorecard: Scorecard,
}

impl DiscEngine {
    /// Scorer, classifier and profile resolver in sequence. The first failure
    /// ends the pipeline; nothing partial is returned.
    pub fn score(&self, answers: &AnswerSet) -> Result<Scorecard, ScoringError> {
        let tally = score(&self.bank, answers)?;
        let class = classify(&self.ranges, &tally);
        let profile = self.catalog.resolve(class.segno)?.clone();
        Ok(Scorecard {
            most_counts: tally.most_counts,
            least_counts: tally.least_counts,
            differences: class.differences,
            segno: class.segno,
            graphs: class.graphs(&tally),
            profile,
        })
    }

    /// Callers supply the id and the clock so the result stays a pure
    /// function of its inputs.
    pub fn assemble_result(
        &self,
        answers: &AnswerSet,
        id: &str,
        student_id: &str,
        submission_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<AssessmentResult, ScoringError> {
        let scorecard = self.score(answers)?;
        Ok(AssessmentResult {
            id: id.to_string(),
            student_id: student_id.to_string(),
            submission_id: submission_id.to_string(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            scorecard,
        })
    }
}
