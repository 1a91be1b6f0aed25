//! Multi-sanitiser stream: features sharing the same `ID` attribute
//! across multiple GFF3 lines (the "multi-feature" idiom, used for
//! discontinuous alignments and split CDS groups) are linked to a single
//! representative via [`FeatureNode::multi`](crate::node::FeatureNode).
//! Buffers the whole input, like [`sort`](super::sort), since membership
//! in a group can only be known once every line has been seen.

use rustc_hash::FxHashMap;

use crate::error::StreamResult;
use crate::node::{MultiGroup, Node};

use super::NodeStream;

enum State {
    Accumulating,
    Serving(std::vec::IntoIter<Node>),
    Done,
}

pub struct MultiSanitiserStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> MultiSanitiserStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            state: State::Accumulating,
        }
    }

    fn accumulate_and_link(&mut self) -> StreamResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.upstream.next()? {
            nodes.push(node);
        }

        let mut representatives: FxHashMap<String, Node> = FxHashMap::default();
        for node in &nodes {
            if let Some(feature) = node.try_as_feature() {
                if let Some(id) = feature.id() {
                    representatives.entry(id.to_string()).or_insert_with(|| node.clone_ref());
                }
            }
        }

        for node in &nodes {
            let Some(feature) = node.try_as_feature() else { continue };
            let Some(id) = feature.id().map(str::to_string) else { continue };
            drop(feature);
            let representative = &representatives[&id];
            if representative != node {
                node.as_feature_mut().multi = Some(MultiGroup {
                    representative: representative.clone_ref(),
                });
            }
        }

        Ok(nodes)
    }
}

impl<S: NodeStream> NodeStream for MultiSanitiserStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let nodes = self.accumulate_and_link()?;
                    self.state = State::Serving(nodes.into_iter());
                }
                State::Serving(iter) => match iter.next() {
                    Some(node) => return Ok(Some(node)),
                    None => self.state = State::Done,
                },
                State::Done => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AttributeValue, FeatureNode, NodeHeader, Range};
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

    fn cds_part(id: &str, start: u64, end: u64) -> Node {
        let mut f = FeatureNode::new("chr1", Range::new(start, end), "CDS");
        f.attributes.set("ID", AttributeValue::Scalar(id.to_string()));
        Node::new_feature(NodeHeader::default(), f)
    }

    #[test]
    fn test_links_split_cds_parts_to_one_representative() {
        let nodes = vec![cds_part("cds1", 1, 10), cds_part("cds1", 50, 60)];
        let mut stream = MultiSanitiserStream::new(VecStream { nodes, idx: 0 });
        let out = collect(&mut stream).unwrap();
        assert!(out[0].as_feature().multi.is_none());
        assert!(out[1].as_feature().multi.is_some());
    }
}
