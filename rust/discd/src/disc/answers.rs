use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One group's pair of choices. Either side may still be unset while the
/// respondent is working through the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub most: Option<u32>,
    #[serde(default)]
    pub least: Option<u32>,
}

impl Selection {
    #[cfg(test)]
    pub fn new(most: u32, least: u32) -> Self {
        Self {
            most: Some(most),
            least: Some(least),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.most.is_some() && self.least.is_some()
    }
}

/// Raw answers keyed by question group number.
///
/// On the wire this is `{"1": {"most": 2, "least": 3}, ...}`. Nothing here is
/// validated; the scorer re-checks every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    selections: BTreeMap<u32, Selection>,
}

impl AnswerSet {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn insert(&mut self, group: u32, selection: Selection) {
        self.selections.insert(group, selection);
    }

    #[cfg(test)]
    pub fn clear_group(&mut self, group: u32) {
        self.selections.remove(&group);
    }

    pub fn get(&self, group: u32) -> Option<&Selection> {
        self.selections.get(&group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Selection)> {
        self.selections.iter().map(|(g, s)| (*g, s))
    }
}
