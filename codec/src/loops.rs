//! Loop classification and nesting
//!
//! Loops are recovered from the flat segment sequence by mapping loop-opening
//! segments to implementation-guide loop IDs:
//!
//! | Opening segment         | Loop ID                                   |
//! |-------------------------|-------------------------------------------|
//! | `HL` (HL03 20/21/22/23) | `2000A`/`2000B`/`2000C`/`2000D`, else `2000<code>` |
//! | `NM1` (by NM101)        | `2010AA`, `2010AB`, `2010BA`, `2010CA`, `2010BB`, `2310B`, `2310A`, `2310C`, else `2010<code>` |
//! | `CLM` / `CLP`           | `2300` / `2100`                           |
//! | `LX`, `SV1`, `SV2`      | `2400`                                    |
//! | `SVC`, `EB`, `EQ`       | `2110`                                    |
//!
//! Nesting follows the hierarchy the segments describe. An `HL` loop is a
//! child of the `HL` loop its HL02 names. A claim loop sits under the
//! innermost hierarchical loop. Entity (`NM1`) loops sit under whatever
//! non-entity loop is open. Line loops sit under the open claim, or under the
//! open entity loop when the transaction has no claim (271 benefits hang off
//! the subscriber name).

use serde::{Deserialize, Serialize};
use x12_segment::Segment;

/// Loop ID given to segments that precede the first loop-opening segment
pub const HEADER_LOOP: &str = "HEADER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loop {
    pub loop_id: String,
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_loops: Vec<Loop>,
}

impl Loop {
    fn open(loop_id: String, segment: Segment) -> Self {
        Self {
            loop_id,
            segments: vec![segment],
            child_loops: Vec::new(),
        }
    }

    /// Depth-first search for the first loop with the given ID
    pub fn find(&self, loop_id: &str) -> Option<&Loop> {
        if self.loop_id == loop_id {
            return Some(self);
        }
        self.child_loops.iter().find_map(|child| child.find(loop_id))
    }

    /// Number of segments in this loop and all of its descendants
    pub fn segment_count(&self) -> usize {
        self.segments.len()
            + self
                .child_loops
                .iter()
                .map(Loop::segment_count)
                .sum::<usize>()
    }
}

/// Loop ID a segment opens, if it opens one
pub fn loop_id(segment: &Segment) -> Option<String> {
    let id = match segment.id.as_str() {
        "HL" => match segment.element(3) {
            "20" => "2000A".to_string(),
            "21" => "2000B".to_string(),
            "22" => "2000C".to_string(),
            "23" => "2000D".to_string(),
            code => format!("2000{code}"),
        },
        "NM1" => match segment.element(1) {
            "85" => "2010AA".to_string(),
            "87" => "2010AB".to_string(),
            "IL" => "2010BA".to_string(),
            "QC" => "2010CA".to_string(),
            "PR" => "2010BB".to_string(),
            "82" => "2310B".to_string(),
            "DN" => "2310A".to_string(),
            "77" => "2310C".to_string(),
            code => format!("2010{code}"),
        },
        "CLM" => "2300".to_string(),
        "CLP" => "2100".to_string(),
        "LX" | "SV1" | "SV2" => "2400".to_string(),
        "SVC" | "EB" | "EQ" => "2110".to_string(),
        _ => return None,
    };
    Some(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Header,
    Hierarchical,
    Entity,
    Claim,
    Line,
}

impl Kind {
    fn of(segment: &Segment) -> Self {
        match segment.id.as_str() {
            "HL" => Self::Hierarchical,
            "NM1" => Self::Entity,
            "CLM" | "CLP" => Self::Claim,
            _ => Self::Line,
        }
    }
}

struct Frame {
    kind: Kind,
    node: Loop,
}

#[derive(Default)]
struct LoopBuilder {
    roots: Vec<Loop>,
    stack: Vec<Frame>,
}

impl LoopBuilder {
    /// Close the innermost open loop, attaching it to its parent
    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.node.child_loops.push(frame.node),
                None => self.roots.push(frame.node),
            }
        }
    }

    fn close_while(&mut self, mut predicate: impl FnMut(&Frame) -> bool) {
        while self.stack.last().is_some_and(&mut predicate) {
            self.close();
        }
    }

    fn has_open(&self, kind: Kind) -> bool {
        self.stack.iter().any(|f| f.kind == kind)
    }

    fn open(&mut self, loop_id: String, segment: &Segment) {
        let kind = Kind::of(segment);

        self.close_while(|f| f.kind == Kind::Header);
        match kind {
            Kind::Hierarchical => {
                let parent = segment.element(2);
                let position = self.stack.iter().rposition(|f| {
                    f.kind == Kind::Hierarchical && !parent.is_empty() && f.node.segments[0].element(1) == parent
                });
                let keep = position.map_or(0, |p| p + 1);
                while self.stack.len() > keep {
                    self.close();
                }
            }
            Kind::Claim => self.close_while(|f| f.kind != Kind::Hierarchical),
            Kind::Entity => self.close_while(|f| f.kind == Kind::Entity),
            Kind::Line => {
                let under_claim = self.has_open(Kind::Claim);
                self.close_while(|f| {
                    f.kind == Kind::Line || (under_claim && f.kind == Kind::Entity)
                });
            }
            Kind::Header => {}
        }

        tracing::trace!(loop_id = %loop_id, depth = self.stack.len(), "opened loop");
        self.stack.push(Frame {
            kind,
            node: Loop::open(loop_id, segment.clone()),
        });
    }

    fn attach(&mut self, segment: &Segment) {
        match self.stack.last_mut() {
            Some(frame) => frame.node.segments.push(segment.clone()),
            None => self.stack.push(Frame {
                kind: Kind::Header,
                node: Loop::open(HEADER_LOOP.to_string(), segment.clone()),
            }),
        }
    }

    fn finish(mut self) -> Vec<Loop> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.roots
    }
}

/// Recover the loop tree of a transaction set
///
/// Envelope segments are skipped. Every other segment lands in exactly one
/// loop: its own when it opens one, otherwise the innermost open loop, or the
/// top-level `HEADER` loop when no loop has opened yet.
///
/// A repeated loop-opening segment always starts a new loop instance, with one
/// exception: `SV1`/`SV2` directly inside a `2400` opened by `LX` belong to that line.
pub fn build_loops(segments: &[Segment]) -> Vec<Loop> {
    let mut builder = LoopBuilder::default();

    for segment in segments.iter().filter(|s| !s.is_envelope()) {
        let continues_line = (segment.is("SV1") || segment.is("SV2"))
            && builder
                .stack
                .last()
                .is_some_and(|f| f.kind == Kind::Line && f.node.segments[0].is("LX"));

        match loop_id(segment) {
            Some(id) if !continues_line => builder.open(id, segment),
            _ => builder.attach(segment),
        }
    }

    let loops = builder.finish();
    tracing::debug!(top_level = loops.len(), "built loop tree");
    loops
}
