//! Seqid-rename stream (`chseqids`): rewrites every seqid according to a
//! caller-supplied mapping, then re-establishes sort order since renaming
//! can reorder nodes relative to each other. Requires the upstream to be
//! sorted, matching the original design's precondition.

use rustc_hash::FxHashMap;

use crate::error::StreamResult;
use crate::node::Node;

use super::sort::SortStream;
use super::NodeStream;

pub struct ChseqidsStream<S> {
    inner: SortStream<RenameAdapter<S>>,
}

impl<S: NodeStream> ChseqidsStream<S> {
    pub fn new(upstream: S, mapping: FxHashMap<String, String>) -> Self {
        debug_assert!(
            upstream.is_sorted(),
            "chseqids requires its upstream to promise sorted output"
        );
        Self {
            inner: SortStream::new(RenameAdapter { upstream, mapping }),
        }
    }
}

impl<S: NodeStream> NodeStream for ChseqidsStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        self.inner.next()
    }

    fn is_sorted(&self) -> bool {
        true
    }
}

struct RenameAdapter<S> {
    upstream: S,
    mapping: FxHashMap<String, String>,
}

impl<S: NodeStream> NodeStream for RenameAdapter<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.upstream.next()? {
            Some(node) => {
                if let Some(old) = node.seqid() {
                    if let Some(new_name) = self.mapping.get(&old) {
                        node.change_seqid(new_name.clone());
                    }
                }
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FeatureNode, NodeHeader, Range};
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
    fn test_chseqids_renames_and_resorts() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("1", Range::new(1, 10), "gene")),
            Node::new_feature(NodeHeader::default(), FeatureNode::new("2", Range::new(1, 10), "gene")),
        ];
        let mut mapping = FxHashMap::default();
        mapping.insert("1".to_string(), "chrZ".to_string());
        mapping.insert("2".to_string(), "chrA".to_string());
        let mut stream = ChseqidsStream::new(VecStream { nodes, idx: 0 }, mapping);
        let out = collect(&mut stream).unwrap();
        assert_eq!(out[0].seqid().as_deref(), Some("chrA"));
        assert_eq!(out[1].seqid().as_deref(), Some("chrZ"));
    }
}
