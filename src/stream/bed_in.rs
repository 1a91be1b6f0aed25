//! BED input adapter. Parsed eagerly into a FIFO and served from there,
//! matching the GTF reader's loading strategy.

use std::io::BufRead;
use std::rc::Rc;

use memchr::memchr;

use crate::error::{ParseError, StreamError, StreamResult};
use crate::node::feature::Strand;
use crate::node::{FeatureNode, Node, NodeHeader, Range};

use super::{NodeFifo, NodeStream};

fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.wrapping_mul(10).wrapping_add(d as u64);
    }
    Some(n)
}

fn should_skip_line(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

/// Configuration for the BED adapter's synthesized feature/type tags.
pub struct BedInConfig {
    pub feature_type: String,
    pub block_type: String,
    pub thick_feature_type: String,
}

impl Default for BedInConfig {
    fn default() -> Self {
        Self {
            feature_type: "BED_feature".to_string(),
            block_type: "BED_block".to_string(),
            thick_feature_type: "BED_thick".to_string(),
        }
    }
}

pub struct BedInStream {
    queue: NodeFifo,
    loaded: bool,
    source_reader: Option<Box<dyn BufRead>>,
    filename: Rc<str>,
    config: BedInConfig,
}

impl BedInStream {
    pub fn new(reader: Box<dyn BufRead>, filename: impl Into<String>) -> Self {
        Self::with_config(reader, filename, BedInConfig::default())
    }

    pub fn with_config(reader: Box<dyn BufRead>, filename: impl Into<String>, config: BedInConfig) -> Self {
        Self {
            queue: NodeFifo::new(),
            loaded: false,
            source_reader: Some(reader),
            filename: Rc::from(filename.into().as_str()),
            config,
        }
    }

    fn load(&mut self) -> StreamResult<()> {
        let mut reader = self.source_reader.take().expect("load called twice");
        let mut line_number = 0u32;
        let mut buf = String::new();
        loop {
            buf.clear();
            let bytes = reader.read_line(&mut buf).map_err(ParseError::Io)?;
            if bytes == 0 {
                break;
            }
            line_number += 1;
            let line = buf.trim_end_matches(['\n', '\r']);
            if should_skip_line(line) {
                continue;
            }
            let node = self.parse_line(line, line_number)?;
            self.queue.push(node);
        }
        self.loaded = true;
        Ok(())
    }

    fn parse_line(&self, line: &str, line_number: u32) -> StreamResult<Node> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "BED record requires at least 3 columns".to_string(),
            }));
        }
        // BED is 0-based half-open; convert to the crate's 1-based closed
        // convention used uniformly across node variants.
        let start0 = parse_u64_fast(fields[1].as_bytes()).ok_or_else(|| {
            StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "non-numeric chromStart".to_string(),
            })
        })?;
        let end0 = parse_u64_fast(fields[2].as_bytes()).ok_or_else(|| {
            StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "non-numeric chromEnd".to_string(),
            })
        })?;
        if end0 <= start0 {
            return Err(StreamError::from(ParseError::Semantic {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: format!("chromEnd {} does not exceed chromStart {}", end0, start0),
            }));
        }
        let range = Range::new(start0 + 1, end0);
        let mut feature = FeatureNode::new(fields[0], range, self.config.feature_type.clone());
        if fields.len() > 3 && !fields[3].is_empty() {
            feature.attributes.set(
                "ID",
                crate::node::AttributeValue::Scalar(fields[3].to_string()),
            );
        }
        if fields.len() > 4 && fields[4] != "." {
            feature.score = fields[4].parse::<f64>().ok();
        }
        if fields.len() > 5 {
            feature.strand = Strand::from_byte(fields[5].as_bytes().first().copied().unwrap_or(b'.'));
        }
        if fields.len() > 7 {
            let thick_start = memchr(b'\t', fields[6].as_bytes());
            let _ = thick_start; // thickStart/thickEnd recorded verbatim via attributes below
            feature.attributes.set(
                "thickRange",
                crate::node::AttributeValue::Scalar(format!("{}-{}", fields[6], fields[7])),
            );
        }
        Ok(Node::new_feature(
            NodeHeader {
                filename: Some(Rc::clone(&self.filename)),
                line_number,
            },
            feature,
        ))
    }
}

impl NodeStream for BedInStream {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        if !self.loaded {
            self.load()?;
        }
        Ok(self.queue.pop())
    }
}
