//! Add-introns stream: for any feature with two or more `exon` children,
//! synthesizes an `intron` child spanning each gap between consecutive
//! exons (sorted by position), inheriting strand and seqid from the
//! parent.

use crate::error::StreamResult;
use crate::node::{FeatureNode, Node, NodeHeader, Range};

use super::NodeStream;

pub struct AddIntronsStream<S> {
    upstream: S,
}

impl<S: NodeStream> AddIntronsStream<S> {
    pub fn new(upstream: S) -> Self {
        Self { upstream }
    }
}

fn synthesize_introns(node: &Node) {
    let Some(mut feature) = node.try_as_feature_mut() else {
        return;
    };
    let mut exon_ranges: Vec<Range> = feature
        .children
        .iter()
        .filter_map(|c| {
            let f = c.try_as_feature()?;
            (f.feature_type == "exon").then_some(f.range)
        })
        .collect();
    if exon_ranges.len() < 2 {
        return;
    }
    exon_ranges.sort_by_key(|r| r.start);

    let seqid = feature.seqid.clone();
    let strand = feature.strand;
    let source = feature.source.clone();
    let mut introns = Vec::new();
    for pair in exon_ranges.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.start > prev.end + 1 {
            let mut intron = FeatureNode::new(seqid.clone(), Range::new(prev.end + 1, next.start - 1), "intron");
            intron.strand = strand;
            intron.source = source.clone();
            introns.push(Node::new_feature(NodeHeader::default(), intron));
        }
    }
    feature.children.extend(introns);
}

impl<S: NodeStream> NodeStream for AddIntronsStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.upstream.next()? {
            Some(node) => {
                synthesize_introns(&node);
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    fn is_sorted(&self) -> bool {
        self.upstream.is_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Strand;
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

    #[test]
    fn test_adds_intron_between_two_exons() {
        let mut mrna = FeatureNode::new("chr1", Range::new(1, 100), "mRNA");
        mrna.strand = Strand::Forward;
        let exon1 = Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 20), "exon"));
        let exon2 = Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(50, 100), "exon"));
        mrna.children.push(exon1);
        mrna.children.push(exon2);
        let mrna_node = Node::new_feature(NodeHeader::default(), mrna);

        let mut stream = AddIntronsStream::new(VecStream {
            nodes: vec![mrna_node],
            idx: 0,
        });
        let out = collect(&mut stream).unwrap();
        let feature = out[0].as_feature();
        let introns: Vec<_> = feature
            .children
            .iter()
            .filter(|c| c.as_feature().feature_type == "intron")
            .collect();
        assert_eq!(introns.len(), 1);
        assert_eq!(introns[0].range(), Range::new(21, 49));
    }

    #[test]
    fn test_single_exon_yields_no_intron() {
        let mut mrna = FeatureNode::new("chr1", Range::new(1, 100), "mRNA");
        let exon1 = Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 20), "exon"));
        mrna.children.push(exon1);
        let mrna_node = Node::new_feature(NodeHeader::default(), mrna);
        let mut stream = AddIntronsStream::new(VecStream {
            nodes: vec![mrna_node],
            idx: 0,
        });
        let out = collect(&mut stream).unwrap();
        assert_eq!(out[0].as_feature().children.len(), 1);
    }
}
