//! Filter / select stream: drops nodes that fail a set of criteria. Every
//! criterion is optional; a node must pass all configured criteria to be
//! forwarded. Rejected nodes are handed to an optional drop callback
//! before being released.

use crate::error::StreamResult;
use crate::node::feature::Strand;
use crate::node::Node;

use super::NodeStream;

/// A scripted predicate, standing in for the embedded-scripting hook of
/// the originating design (explicitly out of scope here): any boxed
/// closure over a feature node.
pub type ScriptPredicate = Box<dyn Fn(&Node) -> bool>;

#[derive(Default)]
pub struct FilterCriteria {
    pub seqid: Option<String>,
    pub source: Option<String>,
    pub contained_in: Option<crate::node::Range>,
    pub overlapping: Option<crate::node::Range>,
    pub strand: Option<Strand>,
    pub has_cds: bool,
    pub min_gene_length: Option<u64>,
    pub max_gene_length: Option<u64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub scripted: Vec<ScriptPredicate>,
}

impl FilterCriteria {
    fn accepts(&self, node: &Node) -> bool {
        let Some(feature) = node.try_as_feature() else {
            return true; // non-feature nodes pass through untouched
        };

        if let Some(ref seqid) = self.seqid {
            if &feature.seqid != seqid {
                return false;
            }
        }
        if let Some(ref source) = self.source {
            if &feature.source != source {
                return false;
            }
        }
        if let Some(range) = self.contained_in {
            if !range.contains(&feature.range) {
                return false;
            }
        }
        if let Some(range) = self.overlapping {
            if !range.overlaps(&feature.range) {
                return false;
            }
        }
        if let Some(strand) = self.strand {
            if feature.strand != strand {
                return false;
            }
        }
        if self.has_cds && !feature.has_cds_child() {
            return false;
        }
        let length = feature.range.len();
        if let Some(min) = self.min_gene_length {
            if length < min {
                return false;
            }
        }
        if let Some(max) = self.max_gene_length {
            if length > max {
                return false;
            }
        }
        if let Some(min) = self.min_score {
            if feature.score.map(|s| s < min).unwrap_or(true) {
                return false;
            }
        }
        if let Some(max) = self.max_score {
            if feature.score.map(|s| s > max).unwrap_or(true) {
                return false;
            }
        }
        drop(feature);
        self.scripted.iter().all(|p| p(node))
    }
}

pub struct FilterStream<S> {
    upstream: S,
    criteria: FilterCriteria,
    on_drop: Option<Box<dyn FnMut(&Node)>>,
}

impl<S: NodeStream> FilterStream<S> {
    pub fn new(upstream: S, criteria: FilterCriteria) -> Self {
        Self {
            upstream,
            criteria,
            on_drop: None,
        }
    }

    pub fn with_drop_callback(mut self, callback: Box<dyn FnMut(&Node)>) -> Self {
        self.on_drop = Some(callback);
        self
    }
}

impl<S: NodeStream> NodeStream for FilterStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match self.upstream.next()? {
                None => return Ok(None),
                Some(node) => {
                    if self.criteria.accepts(&node) {
                        return Ok(Some(node));
                    }
                    if let Some(cb) = self.on_drop.as_mut() {
                        cb(&node);
                    }
                }
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
    use crate::node::{FeatureNode, NodeHeader, Range};
    use crate::stream::collect;
    use std::cell::RefCell;
    use std::rc::Rc;

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
        Node::new_feature(NodeHeader::default(), FeatureNode::new(seqid, Range::new(start, end), "gene"))
    }

    #[test]
    fn test_filter_by_seqid() {
        let nodes = vec![feature("chr1", 1, 10), feature("chr2", 1, 10)];
        let criteria = FilterCriteria {
            seqid: Some("chr1".to_string()),
            ..Default::default()
        };
        let mut stream = FilterStream::new(VecStream { nodes, idx: 0 }, criteria);
        let out = collect(&mut stream).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].seqid().as_deref(), Some("chr1"));
    }

    #[test]
    fn test_filter_min_gene_length_and_drop_callback() {
        let nodes = vec![feature("chr1", 1, 5), feature("chr1", 1, 100)];
        let criteria = FilterCriteria {
            min_gene_length: Some(50),
            ..Default::default()
        };
        let dropped = Rc::new(RefCell::new(Vec::new()));
        let dropped_clone = Rc::clone(&dropped);
        let mut stream = FilterStream::new(VecStream { nodes, idx: 0 }, criteria)
            .with_drop_callback(Box::new(move |n| dropped_clone.borrow_mut().push(n.range())));
        let out = collect(&mut stream).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(dropped.borrow().len(), 1);
    }

    #[test]
    fn test_scripted_predicate() {
        let nodes = vec![feature("chr1", 1, 5), feature("chr1", 1, 100)];
        let criteria = FilterCriteria {
            scripted: vec![Box::new(|n: &Node| n.range().len() > 10)],
            ..Default::default()
        };
        let mut stream = FilterStream::new(VecStream { nodes, idx: 0 }, criteria);
        let out = collect(&mut stream).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].range().len(), 100);
    }
}
