//! Sequence-node add/out: attaches caller-supplied FASTA sequence data to
//! region nodes as they pass through (`SequenceNodeAddStream`), and pulls
//! sequence nodes out of the stream into a side collection while leaving
//! everything else passing through (`SequenceNodeOutStream`), the
//! inverse operation.

use std::rc::Rc;
use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::error::StreamResult;
use crate::node::{Node, NodeHeader, SequenceNode};

use super::{NodeFifo, NodeStream};

/// Emits a [`SequenceNode`] immediately after each region node whose seqid
/// has a known sequence, per the caller-supplied `seqid -> sequence` map.
pub struct SequenceNodeAddStream<S> {
    upstream: S,
    sequences: FxHashMap<String, String>,
    pending: NodeFifo,
}

impl<S: NodeStream> SequenceNodeAddStream<S> {
    pub fn new(upstream: S, sequences: FxHashMap<String, String>) -> Self {
        Self {
            upstream,
            sequences,
            pending: NodeFifo::new(),
        }
    }
}

impl<S: NodeStream> NodeStream for SequenceNodeAddStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        if let Some(node) = self.pending.pop() {
            return Ok(Some(node));
        }
        match self.upstream.next()? {
            Some(node) => {
                if let Some(region) = node.try_as_region() {
                    if let Some(sequence) = self.sequences.get(&region.seqid) {
                        let seqid = region.seqid.clone();
                        drop(region);
                        let seq_node = Node::new_sequence(NodeHeader::default(), SequenceNode::new(seqid, sequence.clone()));
                        self.pending.push(seq_node);
                    }
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

/// Passes every node through unchanged, but also retains every sequence
/// node it sees in a caller-visible collection, for callers who want to
/// split inline FASTA out of a stream for separate handling.
pub struct SequenceNodeOutStream<S> {
    upstream: S,
    collected: Rc<RefCell<Vec<Node>>>,
}

impl<S: NodeStream> SequenceNodeOutStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            collected: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn collected_handle(&self) -> Rc<RefCell<Vec<Node>>> {
        Rc::clone(&self.collected)
    }
}

impl<S: NodeStream> NodeStream for SequenceNodeOutStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.upstream.next()? {
            Some(node) => {
                if node.try_as_sequence().is_some() {
                    self.collected.borrow_mut().push(node.clone_ref());
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
