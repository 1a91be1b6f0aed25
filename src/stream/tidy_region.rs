//! Tidy-region stream: widens each `##sequence-region` declaration to
//! cover every feature range observed on its seqid, fixing declarations
//! that undershoot what the file actually contains. Requires buffering
//! the whole input, like [`sort`](super::sort) and
//! [`load`](super::sort::LoadStream).

use rustc_hash::FxHashMap;

use crate::error::StreamResult;
use crate::node::{Node, Range};

use super::NodeStream;

enum State {
    Accumulating,
    Serving(std::vec::IntoIter<Node>),
    Done,
}

pub struct TidyRegionStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> TidyRegionStream<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            state: State::Accumulating,
        }
    }

    fn accumulate_and_fix(&mut self) -> StreamResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.upstream.next()? {
            nodes.push(node);
        }

        let mut extents: FxHashMap<String, Range> = FxHashMap::default();
        for node in &nodes {
            if node.is_feature() {
                let seqid = node.seqid().unwrap_or_default();
                let range = node.range();
                extents
                    .entry(seqid)
                    .and_modify(|r| *r = r.union(&range))
                    .or_insert(range);
            }
        }

        for node in &nodes {
            if let Some(region) = node.try_as_region() {
                let seqid = region.seqid.clone();
                let declared = region.range;
                drop(region);
                if let Some(observed) = extents.get(&seqid) {
                    node.set_range(declared.union(observed));
                }
            }
        }

        Ok(nodes)
    }
}

impl<S: NodeStream> NodeStream for TidyRegionStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let nodes = self.accumulate_and_fix()?;
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
