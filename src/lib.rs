// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! gtcore: a genome annotation toolkit
//!
//! This library provides a pull-based node-stream pipeline for genome
//! annotation data (GFF3, GTF, BED), a polymorphic genome-node type with
//! visitor dispatch, and a compressed bitvector / wavelet tree pair for
//! succinct indexing.
//!
//! # Features
//!
//! - **Streaming pipeline**: composable `NodeStream` adapters, O(1) memory
//!   per stage regardless of file size (aside from stages that must buffer
//!   by definition, like sort).
//! - **Visitor dispatch**: a single `Node` type covering features, regions,
//!   sequences, comments and metadata, with double dispatch into a
//!   `NodeVisitor` trait.
//! - **Succinct bitvectors**: RRR-compressed bitvectors and a wavelet tree
//!   built on top, for O(1)-amortised access/rank and O(log N) select.
//!
//! # Example
//!
//! ```rust,no_run
//! use gtcore::stream::gff3_in::Gff3InStream;
//! use gtcore::stream::{collect, NodeStream as _};
//! use std::io::BufReader;
//! use std::fs::File;
//!
//! let reader = BufReader::new(File::open("in.gff3").unwrap());
//! let mut stream = Gff3InStream::new(reader, "in.gff3");
//! let nodes = collect(&mut stream).unwrap();
//! ```

pub mod bitvector;
pub mod config;
pub mod error;
pub mod node;
pub mod stream;
pub mod visitor;

pub use error::{BitvectorError, ParseError, StreamError};
pub use node::Node;
pub use visitor::NodeVisitor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{BitvectorError, BitvectorResult, ParseError, ParseResult, StreamError, StreamResult};
    pub use crate::node::{Node, NodeHeader, Range};
    pub use crate::stream::{collect, NodeStream};
    pub use crate::visitor::NodeVisitor;
}

#[cfg(test)]
mod tests {
    use crate::node::{FeatureNode, Node, NodeHeader, Range};
    use crate::stream::sort::SortStream;
    use crate::stream::NodeStream as _;

    struct VecStream {
        nodes: Vec<Node>,
        idx: usize,
    }

    impl NodeStream for VecStream {
        fn next(&mut self) -> crate::error::StreamResult<Option<Node>> {
            if self.idx >= self.nodes.len() {
                return Ok(None);
            }
            let n = self.nodes[self.idx].clone_ref();
            self.idx += 1;
            Ok(Some(n))
        }
    }

    #[test]
    fn test_basic_sort_then_collect_workflow() {
        let nodes = vec![
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(300, 400), "gene")),
            Node::new_feature(NodeHeader::default(), FeatureNode::new("chr1", Range::new(100, 200), "gene")),
        ];
        let mut stream = SortStream::new(VecStream { nodes, idx: 0 });
        let out = crate::stream::collect(&mut stream).unwrap();
        assert_eq!(out[0].range(), Range::new(100, 200));
        assert_eq!(out[1].range(), Range::new(300, 400));
    }
}
