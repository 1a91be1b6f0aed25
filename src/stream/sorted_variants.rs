//! Two alternate orderings for driving a GFF3 writer, beyond the
//! seqid/range order [`sort::SortStream`](super::sort::SortStream)
//! produces: numeric-sorted (seqids parsed as integers where possible)
//! and line-sorted (original file order, by provenance line number).
//! Both buffer the whole input, same shape as `SortStream`.

use std::cmp::Ordering;

use crate::error::StreamResult;
use crate::node::Node;

use super::NodeStream;

enum State {
    Accumulating,
    Serving(std::vec::IntoIter<Node>),
    Done,
}

/// Extracts the greedy leading run of ASCII digits, the same prefix a
/// C `strtol` call would consume, e.g. `"chr2"` has none but `"2L"` is `2`.
fn numeric_prefix(seqid: &str) -> Option<u64> {
    let digits: String = seqid.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u64>().ok()
    }
}

fn numeric_or_lexicographic(seqid: &str) -> Result<u64, &str> {
    numeric_prefix(seqid).ok_or(seqid)
}

fn compare_numeric(a: &Node, b: &Node) -> Ordering {
    let a_seqid = a.seqid().unwrap_or_default();
    let b_seqid = b.seqid().unwrap_or_default();
    match (numeric_or_lexicographic(&a_seqid), numeric_or_lexicographic(&b_seqid)) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.range().start.cmp(&b.range().start)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(x), Err(y)) => x.cmp(y).then_with(|| a.range().start.cmp(&b.range().start)),
    }
}

/// Sorts by numeric interpretation of each node's seqid, falling back to
/// lexicographic order (and sorting after any numeric seqid) when the
/// seqid isn't a plain integer.
pub struct NumSortedStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> NumSortedStream<S> {
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
        nodes.sort_by(compare_numeric);
        Ok(nodes)
    }
}

impl<S: NodeStream> NodeStream for NumSortedStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let nodes = self.accumulate_and_sort()?;
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

    fn is_sorted(&self) -> bool {
        true
    }
}

/// Sorts by original provenance (filename, then line number), restoring
/// file order after a pipeline stage has reordered or interleaved nodes.
pub struct LineSortedStream<S> {
    upstream: S,
    state: State,
}

impl<S: NodeStream> LineSortedStream<S> {
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
        nodes.sort_by(|a, b| {
            let a_header = a.header();
            let b_header = b.header();
            a_header
                .filename
                .as_deref()
                .unwrap_or("")
                .cmp(b_header.filename.as_deref().unwrap_or(""))
                .then_with(|| a_header.line_number.cmp(&b_header.line_number))
        });
        Ok(nodes)
    }
}

impl<S: NodeStream> NodeStream for LineSortedStream<S> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        loop {
            match &mut self.state {
                State::Accumulating => {
                    let nodes = self.accumulate_and_sort()?;
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
