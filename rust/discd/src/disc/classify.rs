use super::dimension::Dimension;
use super::error::TableError;
use super::score::Tally;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SEGMENT_COUNT: u8 = 7;
/// Used when a value falls outside every range of a table.
pub const FALLBACK_SEGMENT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Graph {
    /// Graph I: raw "most" counts.
    Most,
    /// Graph II: raw "least" counts.
    Least,
    /// Graph III: most minus least.
    Difference,
}

impl Graph {
    #[cfg(test)]
    pub const ALL: [Graph; 3] = [Graph::Most, Graph::Least, Graph::Difference];

    pub fn key(self) -> &'static str {
        match self {
            Graph::Most => "most",
            Graph::Least => "least",
            Graph::Difference => "difference",
        }
    }

    /// Inclusive input domain every table of this graph must cover.
    pub fn domain(self) -> (i32, i32) {
        match self {
            Graph::Most | Graph::Least => (0, 28),
            Graph::Difference => (-28, 28),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SegmentRange {
    pub segment: u8,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Deserialize)]
struct RawTables {
    most: BTreeMap<String, Vec<SegmentRange>>,
    least: BTreeMap<String, Vec<SegmentRange>>,
    difference: BTreeMap<String, Vec<SegmentRange>>,
}

/// Value-to-segment tables for the three graphs, one table per dimension.
#[derive(Debug, Clone)]
pub struct RangeTables {
    most: [Vec<SegmentRange>; 4],
    least: [Vec<SegmentRange>; 4],
    difference: [Vec<SegmentRange>; 4],
}

impl RangeTables {
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let raw: RawTables = serde_json::from_str(text).map_err(|source| TableError::Parse {
            table: "segment_ranges",
            source,
        })?;
        Ok(Self {
            most: graph_tables(Graph::Most, raw.most)?,
            least: graph_tables(Graph::Least, raw.least)?,
            difference: graph_tables(Graph::Difference, raw.difference)?,
        })
    }

    pub fn table(&self, graph: Graph, dim: Dimension) -> &[SegmentRange] {
        let tables = match graph {
            Graph::Most => &self.most,
            Graph::Least => &self.least,
            Graph::Difference => &self.difference,
        };
        &tables[dim.index()]
    }

    pub fn segment_for(&self, graph: Graph, dim: Dimension, value: i32) -> u8 {
        self.table(graph, dim)
            .iter()
            .find(|r| value >= r.min && value <= r.max)
            .map(|r| r.segment)
            .unwrap_or(FALLBACK_SEGMENT)
    }

    fn segments(&self, graph: Graph, values: [i32; 4]) -> Segments {
        let mut out = [FALLBACK_SEGMENT; 4];
        for d in Dimension::ALL {
            out[d.index()] = self.segment_for(graph, d, values[d.index()]);
        }
        Segments(out)
    }
}

fn graph_tables(
    graph: Graph,
    mut raw: BTreeMap<String, Vec<SegmentRange>>,
) -> Result<[Vec<SegmentRange>; 4], TableError> {
    let mut out: [Vec<SegmentRange>; 4] = Default::default();
    for d in Dimension::ALL {
        let Some(mut ranges) = raw.remove(&d.letter().to_string()) else {
            return Err(range_err(graph, d, "table missing"));
        };
        check_table(graph, d, &mut ranges)?;
        out[d.index()] = ranges;
    }
    if let Some(extra) = raw.keys().next() {
        return Err(TableError::Ranges {
            graph: graph.key(),
            dimension: '?',
            message: format!("unexpected dimension key {:?}", extra),
        });
    }
    Ok(out)
}

/// Exactly seven ranges, one per segment, contiguous and covering the
/// graph's whole domain. Sorts `ranges` by `min` as a side effect.
fn check_table(graph: Graph, dim: Dimension, ranges: &mut [SegmentRange]) -> Result<(), TableError> {
    if ranges.len() != SEGMENT_COUNT as usize {
        return Err(range_err(
            graph,
            dim,
            format!("expected {} ranges, found {}", SEGMENT_COUNT, ranges.len()),
        ));
    }

    let mut seen = [false; SEGMENT_COUNT as usize];
    for r in ranges.iter() {
        if r.segment < 1 || r.segment > SEGMENT_COUNT {
            return Err(range_err(graph, dim, format!("segment {} outside 1..7", r.segment)));
        }
        if std::mem::replace(&mut seen[r.segment as usize - 1], true) {
            return Err(range_err(graph, dim, format!("segment {} listed twice", r.segment)));
        }
        if r.min > r.max {
            return Err(range_err(
                graph,
                dim,
                format!("segment {} has min {} above max {}", r.segment, r.min, r.max),
            ));
        }
    }

    ranges.sort_by_key(|r| r.min);
    let (lo, hi) = graph.domain();
    if ranges[0].min != lo || ranges[ranges.len() - 1].max != hi {
        return Err(range_err(graph, dim, format!("ranges must cover {}..={}", lo, hi)));
    }
    for pair in ranges.windows(2) {
        if pair[1].min != pair[0].max + 1 {
            return Err(range_err(
                graph,
                dim,
                format!(
                    "gap or overlap between {}..={} and {}..={}",
                    pair[0].min, pair[0].max, pair[1].min, pair[1].max
                ),
            ));
        }
    }
    Ok(())
}

fn range_err(graph: Graph, dim: Dimension, message: impl Into<String>) -> TableError {
    TableError::Ranges {
        graph: graph.key(),
        dimension: dim.letter(),
        message: message.into(),
    }
}

/// Signed most-minus-least per dimension, D, I, S, C order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifferenceVector([i8; 4]);

impl DifferenceVector {
    pub fn from_tally(tally: &Tally) -> Self {
        let mut out = [0i8; 4];
        for d in Dimension::ALL {
            out[d.index()] = tally.most_counts.get(d) as i8 - tally.least_counts.get(d) as i8;
        }
        Self(out)
    }

    #[cfg(test)]
    pub fn get(&self, dim: Dimension) -> i8 {
        self.0[dim.index()]
    }

    pub fn as_array(&self) -> [i8; 4] {
        self.0
    }
}

/// Segment numbers of one graph, D, I, S, C order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segments([u8; 4]);

impl Segments {
    pub fn get(&self, dim: Dimension) -> u8 {
        self.0[dim.index()]
    }

    #[cfg(test)]
    pub fn as_array(&self) -> [u8; 4] {
        self.0
    }
}

/// Four Graph III segment digits, the profile lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segno([u8; 4]);

impl Segno {
    pub fn from_segments(segments: Segments) -> Self {
        Self(segments.0)
    }

    pub fn get(&self, dim: Dimension) -> u8 {
        self.0[dim.index()]
    }
}

impl fmt::Display for Segno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in self.0 {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl FromStr for Segno {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(format!("segno {:?} must be 4 digits", s));
        }
        let mut out = [0u8; 4];
        for (i, b) in bytes.iter().enumerate() {
            match b {
                b'1'..=b'7' => out[i] = b - b'0',
                _ => return Err(format!("segno {:?} has a digit outside 1..7", s)),
            }
        }
        Ok(Self(out))
    }
}

impl Serialize for Segno {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Vertical position of a segment on the 1..28 intensity scale: the middle of
/// the segment's four-row band (segment 1 covers rows 1-4, segment 7 rows 25-28).
pub fn plot_point(segment: u8) -> f32 {
    if segment < 1 || segment > SEGMENT_COUNT {
        return plot_point(FALLBACK_SEGMENT);
    }
    let top = segment as f32 * 4.0;
    (top - 3.0 + top) / 2.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPoint {
    pub dimension: char,
    pub full_name: &'static str,
    pub value: i32,
    pub segment: u8,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphs {
    pub most: Vec<GraphPoint>,
    pub least: Vec<GraphPoint>,
    pub difference: Vec<GraphPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub differences: DifferenceVector,
    pub most_segments: Segments,
    pub least_segments: Segments,
    pub difference_segments: Segments,
    pub segno: Segno,
}

impl Classification {
    pub fn graphs(&self, tally: &Tally) -> Graphs {
        let points = |values: [i32; 4], segments: Segments| -> Vec<GraphPoint> {
            Dimension::ALL
                .iter()
                .map(|d| {
                    let segment = segments.get(*d);
                    GraphPoint {
                        dimension: d.letter(),
                        full_name: d.full_name(),
                        value: values[d.index()],
                        segment,
                        intensity: plot_point(segment),
                    }
                })
                .collect()
        };
        Graphs {
            most: points(widen(tally.most_counts.as_array()), self.most_segments),
            least: points(widen(tally.least_counts.as_array()), self.least_segments),
            difference: points(
                self.differences.as_array().map(|v| v as i32),
                self.difference_segments,
            ),
        }
    }
}

fn widen(counts: [u8; 4]) -> [i32; 4] {
    counts.map(|c| c as i32)
}

pub fn classify(tables: &RangeTables, tally: &Tally) -> Classification {
    let differences = DifferenceVector::from_tally(tally);
    let most_segments = tables.segments(Graph::Most, widen(tally.most_counts.as_array()));
    let least_segments = tables.segments(Graph::Least, widen(tally.least_counts.as_array()));
    let difference_segments =
        tables.segments(Graph::Difference, differences.as_array().map(|v| v as i32));
    Classification {
        differences,
        most_segments,
        least_segments,
        difference_segments,
        segno: Segno::from_segments(difference_segments),
    }
}
