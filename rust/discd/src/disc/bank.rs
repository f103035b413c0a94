use super::dimension::Dimension;
use super::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const GROUP_COUNT: usize = 28;
pub const ADJECTIVES_PER_GROUP: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjective {
    pub id: u32,
    pub text: String,
    pub group: u32,
    pub most_shape: Dimension,
    pub least_shape: Dimension,
}

#[derive(Debug, Deserialize)]
struct RawBank {
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    group: u32,
    adjectives: Vec<RawAdjective>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdjective {
    id: u32,
    text: String,
    most_shape: String,
    least_shape: String,
}

/// Adjective as shown to a respondent. Shape codes stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionAdjective {
    pub id: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionGroup {
    pub group: u32,
    pub adjectives: Vec<QuestionAdjective>,
}

/// The fixed 28-group forced-choice question bank.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    // groups[n - 1] holds group n.
    groups: Vec<Vec<Adjective>>,
}

impl QuestionBank {
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let raw: RawBank = serde_json::from_str(text).map_err(|source| TableError::Parse {
            table: "adjectives",
            source,
        })?;

        if raw.groups.len() != GROUP_COUNT {
            return Err(TableError::Bank(format!(
                "expected {} groups, found {}",
                GROUP_COUNT,
                raw.groups.len()
            )));
        }

        let mut slots: Vec<Option<Vec<Adjective>>> = vec![None; GROUP_COUNT];
        let mut seen_ids: HashSet<u32> = HashSet::new();

        for g in raw.groups {
            if g.group < 1 || g.group as usize > GROUP_COUNT {
                return Err(TableError::Bank(format!(
                    "group number {} outside 1..{}",
                    g.group, GROUP_COUNT
                )));
            }
            let slot = &mut slots[g.group as usize - 1];
            if slot.is_some() {
                return Err(TableError::Bank(format!("group {} listed twice", g.group)));
            }
            if g.adjectives.len() != ADJECTIVES_PER_GROUP {
                return Err(TableError::Bank(format!(
                    "group {} has {} adjectives, expected {}",
                    g.group,
                    g.adjectives.len(),
                    ADJECTIVES_PER_GROUP
                )));
            }

            let mut adjectives = Vec::with_capacity(ADJECTIVES_PER_GROUP);
            for a in g.adjectives {
                if !seen_ids.insert(a.id) {
                    return Err(TableError::Bank(format!("duplicate adjective id {}", a.id)));
                }
                let text = a.text.trim().to_string();
                if text.is_empty() {
                    return Err(TableError::Bank(format!("adjective {} has no text", a.id)));
                }
                let most_shape = parse_shape(&a.most_shape, a.id)?;
                let least_shape = parse_shape(&a.least_shape, a.id)?;
                adjectives.push(Adjective {
                    id: a.id,
                    text,
                    group: g.group,
                    most_shape,
                    least_shape,
                });
            }
            *slot = Some(adjectives);
        }

        // Count and range checks above guarantee every slot is filled.
        let groups = slots.into_iter().flatten().collect();
        Ok(Self { groups })
    }

    pub fn group(&self, group: u32) -> Option<&[Adjective]> {
        if group < 1 {
            return None;
        }
        self.groups.get(group as usize - 1).map(|v| v.as_slice())
    }

    /// Finds `adjective_id` within `group` only; an id from another group
    /// does not resolve.
    pub fn adjective_in_group(&self, group: u32, adjective_id: u32) -> Option<&Adjective> {
        self.group(group)?.iter().find(|a| a.id == adjective_id)
    }

    #[cfg(test)]
    pub fn adjectives(&self) -> impl Iterator<Item = &Adjective> {
        self.groups.iter().flatten()
    }

    pub fn questions(&self) -> Vec<QuestionGroup> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, adjs)| QuestionGroup {
                group: i as u32 + 1,
                adjectives: adjs
                    .iter()
                    .map(|a| QuestionAdjective {
                        id: a.id,
                        text: a.text.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn parse_shape(code: &str, adjective_id: u32) -> Result<Dimension, TableError> {
    Dimension::from_shape_code(code).ok_or_else(|| {
        TableError::Bank(format!(
            "adjective {} has unknown shape code {:?}",
            adjective_id, code
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> QuestionBank {
        QuestionBank::from_json(include_str!("../../data/adjectives.json")).expect("load bank")
    }

    #[test]
    fn builtin_bank_has_28_groups_of_four() {
        let bank = builtin();
        for g in 1..=GROUP_COUNT as u32 {
            let adjs = bank.group(g).expect("group");
            assert_eq!(adjs.len(), ADJECTIVES_PER_GROUP);
            assert!(adjs.iter().all(|a| a.group == g));
        }
        assert!(bank.group(0).is_none());
        assert!(bank.group(29).is_none());
        assert_eq!(bank.adjectives().count(), 112);
    }

    #[test]
    fn first_group_matches_published_shapes() {
        let bank = builtin();
        let daring = bank.adjective_in_group(1, 2).expect("Daring");
        assert_eq!(daring.text, "Daring");
        assert_eq!(daring.most_shape, Dimension::D);
        assert_eq!(daring.least_shape, Dimension::D);
        // Adjective 5 lives in group 2 and does not resolve from group 1.
        assert!(bank.adjective_in_group(1, 5).is_none());
    }

    #[test]
    fn some_adjectives_change_shape_between_contexts() {
        let bank = builtin();
        assert!(bank.adjectives().any(|a| a.most_shape != a.least_shape));
    }

    #[test]
    fn questions_hide_shape_codes() {
        let bank = builtin();
        let qs = bank.questions();
        assert_eq!(qs.len(), GROUP_COUNT);
        let v = serde_json::to_value(&qs[0]).expect("serialize");
        assert_eq!(v["group"], 1);
        assert_eq!(v["adjectives"][0]["text"], "Enthusiastic");
        assert!(v["adjectives"][0].get("mostShape").is_none());
    }

    #[test]
    fn rejects_no_score_shape_code() {
        let text = include_str!("../../data/adjectives.json").replacen(
            "\"leastShape\": \"S\"",
            "\"leastShape\": \"N\"",
            1,
        );
        let e = QuestionBank::from_json(&text).expect_err("N must be rejected");
        assert!(e.to_string().contains("unknown shape code"));
    }

    #[test]
    fn rejects_wrong_group_count() {
        let e = QuestionBank::from_json(r#"{"groups": []}"#).expect_err("empty bank");
        assert!(e.to_string().contains("expected 28 groups"));
    }
}
