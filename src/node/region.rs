//! Region node payload: a GFF3 `##sequence-region` declaration.

use super::Range;

#[derive(Debug, Clone)]
pub struct RegionNode {
    pub seqid: String,
    pub range: Range,
}

impl RegionNode {
    pub fn new(seqid: impl Into<String>, range: Range) -> Self {
        Self {
            seqid: seqid.into(),
            range,
        }
    }

    /// Merge another region declaration for the same seqid by taking the
    /// union of both ranges. Mirrors the sort stream's region-consolidation
    /// step, which collapses repeated `##sequence-region` lines.
    pub fn consolidate(&mut self, other: &RegionNode) {
        debug_assert_eq!(self.seqid, other.seqid);
        self.range = self.range.union(&other.range);
    }
}
