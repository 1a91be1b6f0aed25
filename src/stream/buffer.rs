//! Buffer stream: a user-driven record/replay stage. While in buffering
//! mode it pulls from upstream and retains a copy in a FIFO; once
//! switched to dequeue mode it serves only from that FIFO, ignoring
//! upstream. Useful for re-running a transform over the same input
//! without re-reading it from disk.

use crate::error::StreamResult;
use crate::node::Node;

use super::{NodeFifo, NodeStream};

enum Mode {
    Buffering,
    Dequeuing,
}

pub struct BufferStream<S> {
    upstream: S,
    queue: NodeFifo,
    mode: Mode,
}

impl<S: NodeStream> BufferStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            queue: NodeFifo::new(),
            mode: Mode::Buffering,
        }
    }

    /// Switch from buffering to dequeue mode. Idempotent.
    pub fn start_dequeuing(&mut self) {
        self.mode = Mode::Dequeuing;
    }

    /// Rewind to the start of the buffered nodes without touching
    /// upstream again. Only meaningful once `start_dequeuing` has been
    /// called and the FIFO still holds retained nodes: callers that want
    /// a full second pass must have kept the stream in buffering mode
    /// for its entire first traversal.
    pub fn rewind(&mut self, replay: Vec<Node>) {
        self.queue.clear();
        for node in replay {
            self.queue.push(node);
        }
        self.mode = Mode::Dequeuing;
    }
}

impl<S: NodeStream> NodeStream for BufferStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        match self.mode {
            Mode::Buffering => match self.upstream.next()? {
                Some(node) => {
                    self.queue.push(node.clone_ref());
                    Ok(Some(node))
                }
                None => Ok(None),
            },
            Mode::Dequeuing => Ok(self.queue.pop()),
        }
    }

    fn is_sorted(&self) -> bool {
        matches!(self.mode, Mode::Buffering) && self.upstream.is_sorted()
    }
}
