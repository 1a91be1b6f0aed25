//! Sort and load streams: both read the entirety of their upstream before
//! serving a single node, the two cases in this library where memory use
//! is O(input) rather than O(1).

use crate::error::StreamResult;
use crate::node::Node;

use super::NodeStream;

enum State {
    Accumulating,
    Serving(std::vec::IntoIter<Node>),
    Done,
}

/// Reads all upstream nodes, sorts them by [`Node::compare`], consolidates
/// consecutive region nodes sharing a seqid by taking the union of their
/// ranges, then serves in sorted order.
pub struct SortStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> SortStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            state: State::Accumulating,
        }
    }

    fn accumulate_and_sort(&mut self) -> StreamResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.upstream.next()? {
            nodes.push(node);
        }
        nodes.sort_by(Node::compare);
        Ok(consolidate_regions(nodes))
    }
}

/// Merge consecutive region nodes that share a seqid by unioning their
/// ranges, mirroring the sort stream's region-consolidation pass.
fn consolidate_regions(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(last), Some(incoming_region)) = (out.last(), node.try_as_region()) {
            if let Some(last_region) = last.try_as_region() {
                if last_region.seqid == incoming_region.seqid {
                    let merged = last_region.range.union(&incoming_region.range);
                    drop(last_region);
                    drop(incoming_region);
                    out.last().unwrap().set_range(merged);
                    continue;
                }
            }
        }
        out.push(node);
    }
    out
}

impl<S: NodeStream> NodeStream for SortStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let sorted = self.accumulate_and_sort()?;
                    self.state = State::Serving(sorted.into_iter());
                }
                State::Serving(iter) => {
                    return match iter.next() {
                        Some(node) => Ok(Some(node)),
                        None => {
                            self.state = State::Done;
                            Ok(None)
                        }
                    };
                }
                State::Done => return Ok(None),
            }
        }
    }

    fn is_sorted(&self) -> bool {
        true
    }
}

/// Reads all upstream nodes but preserves arrival order; used to measure
/// peak memory against the sorted variant without otherwise changing
/// pipeline semantics.
pub struct LoadStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> LoadStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            state: State::Accumulating,
        }
    }
}

impl<S: NodeStream> NodeStream for LoadStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let mut nodes = Vec::new();
                    while let Some(node) = self.upstream.next()? {
                        nodes.push(node);
                    }
                    self.state = State::Serving(nodes.into_iter());
                }
                State::Serving(iter) => {
                    return match iter.next() {
                        Some(node) => Ok(Some(node)),
                        None => {
                            self.state = State::Done;
                            Ok(None)
                        }
                    };
                }
                State::Done => return Ok(None),
            }
        }
    }

    fn is_sorted(&self) -> bool {
        self.upstream.is_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FeatureNode, NodeHeader, RegionNode};
    use crate::stream::collect;

    struct VecStream {
        nodes: Vec<Node>,
        idx: usize,
    }

    impl NodeStream for VecStream {
        fn next(&mut self) -> StreamResult<Option<Node>> {
            if self.idx >= self.nodes.len() {
                return Ok(None);
            }
            let n = self.nodes[self.idx].clone_ref();
            self.idx += 1;
            Ok(Some(n))
        }
    }

    fn feature(seqid: &str, start: u64, end: u64) -> Node {
        Node::new_feature(
            NodeHeader::default(),
            FeatureNode::new(seqid, crate::node::Range::new(start, end), "gene"),
        )
    }

    fn region(seqid: &str, start: u64, end: u64) -> Node {
        Node::new_region(NodeHeader::default(), RegionNode::new(seqid, crate::node::Range::new(start, end)))
    }

    #[test]
    fn test_sort_stream_orders_nodes() {
        let nodes = vec![feature("chr2", 1, 2), feature("chr1", 50, 60), feature("chr1", 1, 10)];
        let mut sorted = SortStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut sorted).unwrap();
        assert_eq!(out[0].seqid().as_deref(), Some("chr1"));
        assert_eq!(out[0].range().start, 1);
        assert_eq!(out[1].range().start, 50);
        assert_eq!(out[2].seqid().as_deref(), Some("chr2"));
    }

    #[test]
    fn test_sort_stream_consolidates_regions() {
        let nodes = vec![region("chr1", 1, 100), region("chr1", 50, 200)];
        let mut sorted = SortStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut sorted).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].range(), crate::node::Range::new(1, 200));
    }

    #[test]
    fn test_load_stream_preserves_order() {
        let nodes = vec![feature("chr2", 1, 2), feature("chr1", 1, 10)];
        let mut loaded = LoadStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut loaded).unwrap();
        assert_eq!(out[0].seqid().as_deref(), Some("chr2"));
        assert_eq!(out[1].seqid().as_deref(), Some("chr1"));
    }
}
