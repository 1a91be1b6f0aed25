//! Generic visitor-driven transform plus the visitors it's commonly
//! instantiated with: statistics gathering, ID collection, source
//! rewriting, and parent/child boundary checking. Each is a thin
//! `NodeVisitor` impl; [`VisitorStream`] is the two-state FSM (drain
//! upstream, run the visitor, forward the node unchanged) they all share.

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::error::{StreamError, StreamResult};
use crate::node::Node;
use crate::visitor::NodeVisitor;

use super::NodeStream;

/// Runs every node through a visitor before forwarding it unchanged.
/// Visitor errors abort the node (and the stream, per the crate's
/// failure semantics for visitor-driven transforms).
pub struct VisitorStream<S, V> {
    upstream: S,
    visitor: V,
}

impl<S: NodeStream, V: NodeVisitor> VisitorStream<S, V> {
    pub fn new(upstream: S, visitor: V) -> Self {
        Self { upstream, visitor }
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    pub fn visitor_mut(&mut self) -> &mut V {
        &mut self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }
}

impl<S: NodeStream, V: NodeVisitor> NodeStream for VisitorStream<S, V> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.upstream.next()? {
            Some(node) => {
                node.accept(&mut self.visitor)?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    fn is_sorted(&self) -> bool {
        self.upstream.is_sorted()
    }
}

/// Collects every feature `ID=` attribute seen, for later deduplication
/// or cross-reference checks.
#[derive(Default)]
pub struct CollectIdsVisitor {
    pub ids: FxHashSet<String>,
}

impl NodeVisitor for CollectIdsVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        if let Some(id) = node.as_feature().id() {
            self.ids.insert(id.to_string());
        }
        Ok(())
    }
}

/// Per-feature-type node and total base-pair counters, the node-stream
/// equivalent of a `stat` visitor.
#[derive(Default)]
pub struct StatVisitor {
    pub counts: FxHashMap<String, u64>,
    pub total_bp: FxHashMap<String, u64>,
}

impl NodeVisitor for StatVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        let feature = node.as_feature();
        *self.counts.entry(feature.feature_type.clone()).or_insert(0) += 1;
        *self.total_bp.entry(feature.feature_type.clone()).or_insert(0) += feature.range.len();
        Ok(())
    }
}

/// Rewrites the `source` column of every feature to a fixed value.
pub struct SetSourceVisitor {
    pub source: String,
}

impl NodeVisitor for SetSourceVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        node.as_feature_mut().source = self.source.clone();
        Ok(())
    }
}

/// Restores the source column to whatever the node originally carried,
/// undoing a prior `SetSourceVisitor` pass. Must be constructed before
/// any rewriting happens so it can snapshot originals.
#[derive(Default)]
pub struct ResetSourceVisitor {
    originals: FxHashMap<*const (), String>,
}

impl ResetSourceVisitor {
    pub fn record(&mut self, node: &Node) {
        if let Some(feature) = node.try_as_feature() {
            self.originals
                .insert(Node::as_ptr_key(node), feature.source.clone());
        }
    }
}

impl NodeVisitor for ResetSourceVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        if let Some(original) = self.originals.get(&Node::as_ptr_key(node)) {
            node.as_feature_mut().source = original.clone();
        }
        Ok(())
    }
}

/// Verifies every feature's children are contained in its own range,
/// surfacing a violation as a visitor (and thus stream) error rather
/// than silently tolerating it.
#[derive(Default)]
pub struct CheckBoundariesVisitor;

impl NodeVisitor for CheckBoundariesVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        let feature = node.as_feature();
        for child in &feature.children {
            if child.is_feature() && !feature.range.contains(&child.range()) {
                return Err(StreamError::Visitor(format!(
                    "child range {} is not contained in parent range {} for feature {:?}",
                    child.range(),
                    feature.range,
                    feature.id()
                )));
            }
        }
        Ok(())
    }
}

/// Checks that a feature's CDS children, if any, carry a phase and that
/// consecutive CDS segments' lengths are consistent with the next
/// segment's declared phase (phase = bases left over from the previous
/// segment's codon boundary).
#[derive(Default)]
pub struct CdsCheckVisitor;

impl NodeVisitor for CdsCheckVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        let feature = node.as_feature();
        if !feature.has_cds_child() {
            return Ok(());
        }
        let mut cds_children: Vec<_> = feature
            .children
            .iter()
            .filter(|c| c.try_as_feature().map(|f| f.feature_type == "CDS").unwrap_or(false))
            .collect();
        cds_children.sort_by_key(|c| c.range().start);
        let mut carry = 0u64;
        for child in cds_children {
            let child_feature = child.as_feature();
            let phase = child_feature.phase.ok_or_else(|| {
                StreamError::Visitor(format!("CDS segment at {} is missing a phase", child_feature.range))
            })?;
            let expected = match phase {
                crate::node::Phase::Zero => 0,
                crate::node::Phase::One => 1,
                crate::node::Phase::Two => 2,
                crate::node::Phase::Undetermined => carry % 3,
            };
            if expected != carry % 3 {
                return Err(StreamError::Visitor(format!(
                    "CDS segment at {} declares phase inconsistent with the preceding segment's length",
                    child_feature.range
                )));
            }
            carry += child_feature.range.len();
        }
        Ok(())
    }
}

/// Rewrites every feature's `ID` attribute to the MD5 digest of its
/// original value, preserving a stable mapping for cross-referencing
/// anonymized output.
#[derive(Default)]
pub struct IdToMd5Visitor;

impl NodeVisitor for IdToMd5Visitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        let mut feature = node.as_feature_mut();
        if let Some(id) = feature.attributes.get("ID").map(|v| v.as_scalar().to_string()) {
            let digest = format!("{:x}", md5::compute(id.as_bytes()));
            feature.attributes.set("ID", crate::node::AttributeValue::Scalar(digest));
        }
        Ok(())
    }
}

/// Rewrites every node's seqid to the MD5 digest of its original value.
/// Unlike [`ChseqidsStream`](super::chseqids::ChseqidsStream), this needs
/// no rename mapping and does not require resorting since MD5 preserves
/// no ordering relationship, but it does require the upstream stay
/// sorted per-seqid internally consistent (callers typically apply it
/// last, just before a sink).
#[derive(Default)]
pub struct SeqidsToMd5Visitor;

impl NodeVisitor for SeqidsToMd5Visitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        if let Some(seqid) = node.seqid() {
            node.change_seqid(format!("{:x}", md5::compute(seqid.as_bytes())));
        }
        Ok(())
    }

    fn visit_region(&mut self, node: &Node) -> StreamResult<()> {
        if let Some(seqid) = node.seqid() {
            node.change_seqid(format!("{:x}", md5::compute(seqid.as_bytes())));
        }
        Ok(())
    }
}

/// Tags intron features (as synthesized by
/// [`add_introns`](super::add_introns)) with a `splice_site` attribute of
/// `canonical` or `noncanonical`, based on whether the intron's first two
/// and last two bases are the canonical GT...AG dinucleotides, looked up
/// in a caller-supplied seqid→sequence map (1-based coordinates, matching
/// [`Range`](crate::node::Range)).
pub struct SpliceSiteInfoVisitor {
    pub sequences: FxHashMap<String, String>,
}

impl SpliceSiteInfoVisitor {
    pub fn new(sequences: FxHashMap<String, String>) -> Self {
        Self { sequences }
    }

    fn splice_site(&self, seqid: &str, range: crate::node::Range) -> Option<&'static str> {
        let seq = self.sequences.get(seqid)?;
        let bytes = seq.as_bytes();
        let start = (range.start - 1) as usize;
        let end = range.end as usize;
        if end > bytes.len() || start + 2 > bytes.len() || end < 2 {
            return None;
        }
        let donor = &bytes[start..start + 2];
        let acceptor = &bytes[end - 2..end];
        let canonical = donor.eq_ignore_ascii_case(b"GT") && acceptor.eq_ignore_ascii_case(b"AG");
        Some(if canonical { "canonical" } else { "noncanonical" })
    }
}

impl NodeVisitor for SpliceSiteInfoVisitor {
    fn visit_feature(&mut self, node: &Node) -> StreamResult<()> {
        let is_intron = node.as_feature().feature_type == "intron";
        if !is_intron {
            return Ok(());
        }
        let seqid = node.seqid().unwrap_or_default();
        let range = node.range();
        if let Some(verdict) = self.splice_site(&seqid, range) {
            node.as_feature_mut()
                .attributes
                .set("splice_site", crate::node::AttributeValue::Scalar(verdict.to_string()));
        }
        Ok(())
    }
}
