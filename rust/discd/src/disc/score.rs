use super::answers::AnswerSet;
use super::bank::{QuestionBank, GROUP_COUNT};
use super::dimension::Dimension;
use super::error::ScoringError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Per-dimension tallies of one side (most or least) of an answer set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimensionCounts([u8; 4]);

impl DimensionCounts {
    #[cfg(test)]
    pub fn from_array(counts: [u8; 4]) -> Self {
        Self(counts)
    }

    pub fn get(&self, dim: Dimension) -> u8 {
        self.0[dim.index()]
    }

    pub fn increment(&mut self, dim: Dimension) {
        self.0[dim.index()] += 1;
    }

    #[cfg(test)]
    pub fn total(&self) -> u32 {
        self.0.iter().map(|c| *c as u32).sum()
    }

    /// Counts in D, I, S, C order.
    pub fn as_array(&self) -> [u8; 4] {
        self.0
    }
}

// Serialized keyed by shape code, the form stored with results.
impl Serialize for DimensionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for d in Dimension::ALL {
            map.serialize_entry(d.shape_code(), &self.get(d))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub most_counts: DimensionCounts,
    pub least_counts: DimensionCounts,
}

/// Checks the answer set against the bank and tallies shapes.
///
/// Completeness is checked across all groups first so the error can name
/// every unfinished group; the remaining checks run group by group.
pub fn score(bank: &QuestionBank, answers: &AnswerSet) -> Result<Tally, ScoringError> {
    let incomplete: Vec<u32> = (1..=GROUP_COUNT as u32)
        .filter(|g| !answers.get(*g).map(|s| s.is_complete()).unwrap_or(false))
        .collect();
    if !incomplete.is_empty() {
        return Err(ScoringError::IncompleteAnswers { groups: incomplete });
    }

    let mut most_counts = DimensionCounts::default();
    let mut least_counts = DimensionCounts::default();

    for (group, sel) in answers.iter() {
        let (Some(most_id), Some(least_id)) = (sel.most, sel.least) else {
            // Only reachable for groups outside 1..=28, which never resolve.
            return Err(ScoringError::InvalidAdjectiveReference {
                group,
                adjective_id: sel.most.or(sel.least).unwrap_or(0),
            });
        };
        if most_id == least_id {
            return Err(ScoringError::DuplicateSelection {
                group,
                adjective_id: most_id,
            });
        }
        let most = bank.adjective_in_group(group, most_id).ok_or(
            ScoringError::InvalidAdjectiveReference {
                group,
                adjective_id: most_id,
            },
        )?;
        let least = bank.adjective_in_group(group, least_id).ok_or(
            ScoringError::InvalidAdjectiveReference {
                group,
                adjective_id: least_id,
            },
        )?;

        most_counts.increment(most.most_shape);
        least_counts.increment(least.least_shape);
    }

    Ok(Tally {
        most_counts,
        least_counts,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::disc::answers::Selection;

    pub(crate) fn bank() -> QuestionBank {
        QuestionBank::from_json(include_str!("../../data/adjectives.json")).expect("load bank")
    }

    /// Picks, in every group, the adjective whose most-shape is `most` and a
    /// different adjective whose least-shape is `least` (first match).
    pub(crate) fn answers_by_shape(bank: &QuestionBank, most: Dimension, least: Dimension) -> AnswerSet {
        let mut answers = AnswerSet::new();
        for g in 1..=GROUP_COUNT as u32 {
            let adjs = bank.group(g).expect("group");
            let m = adjs.iter().find(|a| a.most_shape == most).expect("most shape");
            let l = adjs
                .iter()
                .find(|a| a.least_shape == least && a.id != m.id)
                .or_else(|| adjs.iter().find(|a| a.id != m.id))
                .expect("least pick");
            answers.insert(g, Selection::new(m.id, l.id));
        }
        answers
    }

    #[test]
    fn counts_always_sum_to_28() {
        let bank = bank();
        for most in Dimension::ALL {
            for least in Dimension::ALL {
                let tally = score(&bank, &answers_by_shape(&bank, most, least)).expect("score");
                assert_eq!(tally.most_counts.total(), 28);
                assert_eq!(tally.least_counts.total(), 28);
            }
        }
    }

    #[test]
    fn all_most_on_one_shape_fills_that_dimension() {
        let bank = bank();
        let tally = score(&bank, &answers_by_shape(&bank, Dimension::D, Dimension::C)).expect("score");
        assert_eq!(tally.most_counts.as_array(), [28, 0, 0, 0]);
    }

    #[test]
    fn group_one_contributes_to_the_chosen_shapes() {
        let bank = bank();
        let mut answers = answers_by_shape(&bank, Dimension::C, Dimension::C);
        // Baseline group 1: Diplomatic (id 3, *) as most, Satisfied (id 4, T) as least.
        answers.insert(1, Selection::new(3, 4));
        let base = score(&bank, &answers).expect("score");

        // Group 1: Daring (id 2, most Z) as most, Enthusiastic (id 1, least S) as least.
        answers.insert(1, Selection::new(2, 1));
        let tally = score(&bank, &answers).expect("score");
        assert_eq!(tally.most_counts.get(Dimension::D), base.most_counts.get(Dimension::D) + 1);
        assert_eq!(tally.least_counts.get(Dimension::I), base.least_counts.get(Dimension::I) + 1);
    }

    #[test]
    fn missing_least_in_group_17_is_incomplete() {
        let bank = bank();
        let mut answers = answers_by_shape(&bank, Dimension::I, Dimension::S);
        let most = answers.get(17).and_then(|s| s.most);
        answers.insert(17, Selection { most, least: None });
        assert_eq!(
            score(&bank, &answers),
            Err(ScoringError::IncompleteAnswers { groups: vec![17] })
        );

        answers.clear_group(3);
        assert_eq!(
            score(&bank, &answers),
            Err(ScoringError::IncompleteAnswers { groups: vec![3, 17] })
        );
    }

    #[test]
    fn same_adjective_twice_in_group_5_is_duplicate() {
        let bank = bank();
        let mut answers = answers_by_shape(&bank, Dimension::I, Dimension::S);
        let id = bank.group(5).expect("group 5")[0].id;
        answers.insert(5, Selection::new(id, id));
        assert_eq!(
            score(&bank, &answers),
            Err(ScoringError::DuplicateSelection {
                group: 5,
                adjective_id: id
            })
        );
    }

    #[test]
    fn adjective_from_another_group_is_invalid() {
        let bank = bank();
        let mut answers = answers_by_shape(&bank, Dimension::I, Dimension::S);
        // Adjective 1 belongs to group 1.
        let least = answers.get(9).and_then(|s| s.least).expect("least");
        answers.insert(9, Selection::new(1, least));
        assert_eq!(
            score(&bank, &answers),
            Err(ScoringError::InvalidAdjectiveReference {
                group: 9,
                adjective_id: 1
            })
        );
    }

    #[test]
    fn extra_group_is_invalid_reference() {
        let bank = bank();
        let mut answers = answers_by_shape(&bank, Dimension::I, Dimension::S);
        answers.insert(29, Selection::new(500, 501));
        assert_eq!(
            score(&bank, &answers),
            Err(ScoringError::InvalidAdjectiveReference {
                group: 29,
                adjective_id: 500
            })
        );
    }

    #[test]
    fn counts_serialize_by_shape_code() {
        let counts = DimensionCounts::from_array([10, 8, 6, 4]);
        let v = serde_json::to_value(counts).expect("serialize");
        assert_eq!(v, serde_json::json!({ "Z": 10, "S": 8, "T": 6, "*": 4 }));
        assert_eq!(counts.total(), 28);
    }
}
