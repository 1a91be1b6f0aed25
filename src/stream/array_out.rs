//! Array-out stream: a pass-through stage that optionally retains a
//! reference to every node (or just every feature node) it forwards, in
//! a caller-supplied collection. Also doubles as the terminal in-memory
//! collector when driven to exhaustion with an empty downstream.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::StreamResult;
use crate::node::Node;

use super::NodeStream;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RetainPolicy {
    All,
    FeaturesOnly,
}

pub struct ArrayOutStream<S> {
    upstream: S,
    retained: Rc<RefCell<Vec<Node>>>,
    policy: RetainPolicy,
}

impl<S: NodeStream> ArrayOutStream<S> {
    pub fn new(upstream: S, policy: RetainPolicy) -> Self {
        Self {
            upstream,
            retained: Rc::new(RefCell::new(Vec::new())),
            policy,
        }
    }

    /// A handle to the retained collection, shared with the caller so it
    /// can be inspected after (or during) the drain.
    pub fn retained_handle(&self) -> Rc<RefCell<Vec<Node>>> {
        Rc::clone(&self.retained)
    }
}

impl<S: NodeStream> NodeStream for ArrayOutStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.upstream.next()? {
            Some(node) => {
                let retain = match self.policy {
                    RetainPolicy::All => true,
                    RetainPolicy::FeaturesOnly => node.is_feature(),
                };
                if retain {
                    self.retained.borrow_mut().push(node.clone_ref());
                }
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
    use crate::node::{FeatureNode, NodeHeader, Range};
    use crate::stream::pull;

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
    fn test_array_out_retains_all_nodes() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 2), "gene")),
            Node::new_comment(NodeHeader::default(), crate::node::CommentNode::new("hi")),
        ];
        let mut stream = ArrayOutStream::new(VecStream { nodes, idx: 0 }, RetainPolicy::All);
        let handle = stream.retained_handle();
        pull(&mut stream).unwrap();
        assert_eq!(handle.borrow().len(), 2);
    }

    #[test]
    fn test_array_out_features_only() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(1, 2), "gene")),
            Node::new_comment(NodeHeader::default(), crate::node::CommentNode::new("hi")),
        ];
        let mut stream = ArrayOutStream::new(VecStream { nodes, idx: 0 }, RetainPolicy::FeaturesOnly);
        let handle = stream.retained_handle();
        pull(&mut stream).unwrap();
        assert_eq!(handle.borrow().len(), 1);
    }
}
