use super::classify::Segno;
use super::dimension::Dimension;
use super::error::{ScoringError, TableError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Segments at or above this line count as a "high" factor.
pub const MIDLINE_SEGMENT: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub emotions: String,
    pub goal: String,
    pub judges_others_by: String,
    pub influences_others_by: String,
    pub value_to_organization: String,
    pub overuses: String,
    pub under_pressure: String,
    pub fears: String,
    pub would_increase_effectiveness_through: String,
}

impl Profile {
    fn fields(&self) -> [(&'static str, &str); 11] {
        [
            ("name", &self.name),
            ("description", &self.description),
            ("emotions", &self.emotions),
            ("goal", &self.goal),
            ("judgesOthersBy", &self.judges_others_by),
            ("influencesOthersBy", &self.influences_others_by),
            ("valueToOrganization", &self.value_to_organization),
            ("overuses", &self.overuses),
            ("underPressure", &self.under_pressure),
            ("fears", &self.fears),
            (
                "wouldIncreaseEffectivenessThrough",
                &self.would_increase_effectiveness_through,
            ),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    patterns: Vec<Profile>,
    #[serde(default)]
    segnos: BTreeMap<String, String>,
    #[serde(default)]
    shapes: BTreeMap<String, String>,
}

/// Classical pattern catalog with its two lookup indexes.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    patterns: BTreeMap<String, Profile>,
    segnos: HashMap<Segno, String>,
    shapes: HashMap<String, String>,
}

impl ProfileCatalog {
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let raw: RawCatalog = serde_json::from_str(text).map_err(|source| TableError::Parse {
            table: "profiles",
            source,
        })?;

        let mut patterns = BTreeMap::new();
        for p in raw.patterns {
            if let Some((field, _)) = p.fields().iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(TableError::Catalog(format!(
                    "pattern {:?} has an empty {}",
                    p.name, field
                )));
            }
            let name = p.name.clone();
            if patterns.insert(name.clone(), p).is_some() {
                return Err(TableError::Catalog(format!("pattern {:?} listed twice", name)));
            }
        }

        let mut segnos = HashMap::new();
        for (key, name) in raw.segnos {
            let segno: Segno = key.parse().map_err(TableError::Catalog)?;
            require_pattern(&patterns, &name, &key)?;
            segnos.insert(segno, name);
        }

        let mut shapes = HashMap::new();
        for (key, name) in raw.shapes {
            check_signature(&key)?;
            require_pattern(&patterns, &name, &key)?;
            shapes.insert(key, name);
        }

        Ok(Self {
            patterns,
            segnos,
            shapes,
        })
    }

    pub fn pattern_names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(|k| k.as_str())
    }

    /// Exact segno entries win; otherwise the longest prefix of the
    /// high-factor signature found in the shape index. Flat profiles (no
    /// factor at or above the midline) only resolve through an exact entry;
    /// the built-in catalog lists every reachable one.
    pub fn resolve(&self, segno: Segno) -> Result<&Profile, ScoringError> {
        let name = self.segnos.get(&segno).or_else(|| {
            let sig = high_factor_signature(segno);
            if sig.is_empty() || sig.len() == Dimension::ALL.len() {
                return None;
            }
            (1..=sig.len()).rev().find_map(|n| self.shapes.get(&sig[..n]))
        });

        name.and_then(|n| self.patterns.get(n))
            .ok_or_else(|| ScoringError::UnknownProfilePattern {
                segno: segno.to_string(),
            })
    }
}

/// High dimensions' letters ordered by segment, highest first; ties keep
/// D, I, S, C order.
pub fn high_factor_signature(segno: Segno) -> String {
    let mut high: Vec<Dimension> = Dimension::ALL
        .into_iter()
        .filter(|d| segno.get(*d) >= MIDLINE_SEGMENT)
        .collect();
    high.sort_by(|a, b| segno.get(*b).cmp(&segno.get(*a)));
    high.into_iter().map(|d| d.letter()).collect()
}

fn require_pattern(
    patterns: &BTreeMap<String, Profile>,
    name: &str,
    key: &str,
) -> Result<(), TableError> {
    if patterns.contains_key(name) {
        Ok(())
    } else {
        Err(TableError::Catalog(format!(
            "{:?} refers to unknown pattern {:?}",
            key, name
        )))
    }
}

fn check_signature(key: &str) -> Result<(), TableError> {
    let mut seen: Vec<Dimension> = Vec::new();
    for ch in key.chars() {
        let d = Dimension::from_letter(&ch.to_string())
            .filter(|_| ch.is_ascii_uppercase())
            .ok_or_else(|| TableError::Catalog(format!("shape key {:?} has bad letter {:?}", key, ch)))?;
        if seen.contains(&d) {
            return Err(TableError::Catalog(format!("shape key {:?} repeats {}", key, d)));
        }
        seen.push(d);
    }
    if seen.is_empty() || seen.len() >= Dimension::ALL.len() {
        return Err(TableError::Catalog(format!(
            "shape key {:?} must name one to three dimensions",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: &str = include_str!("../../data/profiles.json");

    fn catalog() -> ProfileCatalog {
        ProfileCatalog::from_json(PROFILES).expect("load catalog")
    }

    impl ProfileCatalog {
        fn pattern(&self, name: &str) -> Option<&Profile> {
            self.patterns.get(name)
        }
    }

    fn segno(s: &str) -> Segno {
        s.parse().expect("segno")
    }

    #[test]
    fn catalog_holds_the_fifteen_classical_patterns() {
        let c = catalog();
        let names: Vec<&str> = c.pattern_names().collect();
        assert_eq!(names.len(), 15);
        assert!(names.contains(&"Objective Thinker"));
        assert!(names.contains(&"Result-Oriented"));
    }

    #[test]
    fn signature_orders_high_factors_by_segment() {
        assert_eq!(high_factor_signature(segno("6532")), "DI");
        assert_eq!(high_factor_signature(segno("5632")), "ID");
        assert_eq!(high_factor_signature(segno("5525")), "DIC");
        assert_eq!(high_factor_signature(segno("3443")), "");
        assert_eq!(high_factor_signature(segno("2276")), "SC");
        assert_eq!(high_factor_signature(segno("2267")), "CS");
    }

    #[test]
    fn resolves_by_signature() {
        let c = catalog();
        assert_eq!(c.resolve(segno("6532")).expect("DI").name, "Result-Oriented");
        assert_eq!(c.resolve(segno("7311")).expect("D").name, "Developer");
        assert_eq!(c.resolve(segno("2267")).expect("CS").name, "Perfectionist");
        assert_eq!(c.resolve(segno("3562")).expect("SI").name, "Agent");
    }

    #[test]
    fn falls_back_to_shorter_prefix() {
        let c = catalog();
        // "DIS" has no entry of its own; "DI" does.
        assert_eq!(c.resolve(segno("7652")).expect("DIS").name, "Result-Oriented");
        assert_eq!(c.resolve(segno("7625")).expect("DIC").name, "Inspirational");
    }

    #[test]
    fn flat_segnos_resolve_through_exact_entries() {
        let c = catalog();
        assert_eq!(high_factor_signature(segno("3434")), "");
        assert_eq!(c.resolve(segno("3434")).expect("3434").name, "Appraiser");
        assert_eq!(c.resolve(segno("3344")).expect("3344").name, "Perfectionist");
        assert_eq!(c.resolve(segno("4444")).expect("4444").name, "Result-Oriented");
    }

    #[test]
    fn exact_segno_beats_signature() {
        let mut raw: serde_json::Value = serde_json::from_str(PROFILES).expect("json");
        raw["segnos"]["6532"] = serde_json::json!("Creative");
        let c = ProfileCatalog::from_json(&raw.to_string()).expect("catalog");
        assert_eq!(c.resolve(segno("6532")).expect("exact").name, "Creative");
        assert_eq!(c.resolve(segno("6531")).expect("DI").name, "Result-Oriented");
    }

    #[test]
    fn flat_segno_without_entry_is_unknown() {
        let mut raw: serde_json::Value = serde_json::from_str(PROFILES).expect("json");
        raw["segnos"] = serde_json::json!({});
        let c = ProfileCatalog::from_json(&raw.to_string()).expect("catalog");
        assert_eq!(
            c.resolve(segno("4444")),
            Err(ScoringError::UnknownProfilePattern {
                segno: "4444".to_string()
            })
        );
        // All four high never comes out of a real tally and has no entry.
        assert!(catalog().resolve(segno("6666")).is_err());
    }

    #[test]
    fn rejects_reference_to_missing_pattern() {
        let mut raw: serde_json::Value = serde_json::from_str(PROFILES).expect("json");
        raw["shapes"]["D"] = serde_json::json!("Pioneer");
        let e = ProfileCatalog::from_json(&raw.to_string()).expect_err("unknown pattern");
        assert!(e.to_string().contains("unknown pattern \"Pioneer\""));
    }

    #[test]
    fn rejects_empty_narrative_field() {
        let mut raw: serde_json::Value = serde_json::from_str(PROFILES).expect("json");
        raw["patterns"][0]["fears"] = serde_json::json!("  ");
        let e = ProfileCatalog::from_json(&raw.to_string()).expect_err("empty field");
        assert!(e.to_string().contains("empty fears"));
    }

    #[test]
    fn profile_serializes_camel_case() {
        let c = catalog();
        let v = serde_json::to_value(c.pattern("Developer").expect("Developer")).expect("ser");
        assert!(v.get("judgesOthersBy").is_some());
        assert!(v.get("wouldIncreaseEffectivenessThrough").is_some());
    }
}
