//! Inter-feature stream: between consecutive top-level features on the
//! same seqid, synthesizes a feature spanning the gap between them. Like
//! [`select`](super::filter), this may enqueue more than one synthesised
//! node per node consumed from upstream, so it drains an internal FIFO
//! before pulling again.

use crate::error::StreamResult;
use crate::node::{FeatureNode, Node, NodeHeader, Range};

use super::{NodeFifo, NodeStream};

pub struct InterFeatureStream<S> {
    upstream: S,
    pending: NodeFifo,
    last_feature: Option<(String, Range)>,
    inter_type: String,
}

impl<S: NodeStream> InterFeatureStream<S> {
    pub fn new(upstream: S) -> Self {
        Self::with_type(upstream, "inter_feature_region")
    }

    pub fn with_type(upstream: S, inter_type: impl Into<String>) -> Self {
        Self {
            upstream,
            pending: NodeFifo::new(),
            last_feature: None,
            inter_type: inter_type.into(),
        }
    }
}

impl<S: NodeStream> NodeStream for InterFeatureStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        if let Some(node) = self.pending.pop() {
            return Ok(Some(node));
        }
        loop {
            match self.upstream.next()? {
                Some(node) => {
                    if !node.is_feature() {
                        return Ok(Some(node));
                    }
                    let seqid = node.seqid().unwrap_or_default();
                    let range = node.range();
                    if let Some((last_seqid, last_range)) = self.last_feature.take() {
                        if last_seqid == seqid && range.start > last_range.end + 1 {
                            let gap = FeatureNode::new(
                                seqid.clone(),
                                Range::new(last_range.end + 1, range.start - 1),
                                self.inter_type.clone(),
                            );
                            self.pending.push(Node::new_feature(NodeHeader::default(), gap));
                        }
                    }
                    self.last_feature = Some((seqid, range));
                    if let Some(gap_node) = self.pending.pop() {
                        self.pending.push(node);
                        return Ok(Some(gap_node));
                    }
                    return Ok(Some(node));
                }
                None => return Ok(None),
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

        fn is_sorted(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_synthesizes_gap_between_two_features() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 10), "gene")),
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(50, 100), "gene")),
        ];
        let mut stream = InterFeatureStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut stream).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].as_feature().feature_type, "inter_feature_region");
        assert_eq!(out[1].range(), Range::new(11, 49));
    }

    #[test]
    fn test_no_gap_when_features_are_adjacent() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 10), "gene")),
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(11, 20), "gene")),
        ];
        let mut stream = InterFeatureStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut stream).unwrap();
        assert_eq!(out.len(), 2);
    }
}
