//! GTF input adapter. Unlike the GFF3 plain reader, a GTF file is parsed
//! eagerly into a FIFO on the first `next()` call and served from there,
//! since GTF's attribute dialect (`key "value";` pairs) and lack of a
//! `##sequence-region` header make line-at-a-time emission less useful.

use std::io::BufRead;
use std::rc::Rc;

use crate::config;
use crate::error::{ParseError, StreamError, StreamResult};
use crate::node::feature::{AttributeMap, AttributeValue, Phase, Strand};
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

fn parse_gtf_attributes(field: &str) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    for pair in field.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some(space) = pair.find(char::is_whitespace) else {
            continue;
        };
        let key = pair[..space].trim();
        let value = pair[space..].trim().trim_matches('"');
        attrs.set(key, AttributeValue::Scalar(value.to_string()));
    }
    attrs
}

pub struct GtfInStream {
    queue: NodeFifo,
    loaded: bool,
    source_reader: Option<Box<dyn BufRead>>,
    filename: Rc<str>,
}

impl GtfInStream {
    pub fn new(reader: Box<dyn BufRead>, filename: impl Into<String>) -> Self {
        Self {
            queue: NodeFifo::new(),
            loaded: false,
            source_reader: Some(reader),
            filename: Rc::from(filename.into().as_str()),
        }
    }

    fn load(&mut self) -> StreamResult<()> {
        let mut reader = self.source_reader.take().expect("load called twice");
        let tidy = !config::is_strict_mode();
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
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.parse_line(line, line_number) {
                Ok(node) => self.queue.push(node),
                Err(e) if tidy => {
                    log::warn!("{}:{}: skipping malformed GTF record: {}", self.filename, line_number, e);
                }
                Err(e) => return Err(e),
            }
        }
        self.loaded = true;
        Ok(())
    }

    fn parse_line(&self, line: &str, line_number: u32) -> StreamResult<Node> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            return Err(StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "GTF record requires 9 tab-separated columns".to_string(),
            }));
        }
        let start = parse_u64_fast(fields[3].as_bytes()).ok_or_else(|| {
            StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "non-numeric start coordinate".to_string(),
            })
        })?;
        let end = parse_u64_fast(fields[4].as_bytes()).ok_or_else(|| {
            StreamError::from(ParseError::Syntax {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: "non-numeric end coordinate".to_string(),
            })
        })?;
        if start > end {
            return Err(StreamError::from(ParseError::Semantic {
                file: self.filename.to_string(),
                line: line_number as usize,
                message: format!("start {} exceeds end {}", start, end),
            }));
        }
        let mut feature = FeatureNode::new(fields[0], Range::new(start, end), fields[2]);
        feature.source = fields[1].to_string();
        if fields[5] != "." {
            feature.score = fields[5].parse::<f64>().ok();
        }
        feature.strand = Strand::from_byte(fields[6].as_bytes().first().copied().unwrap_or(b'.'));
        feature.phase = Phase::from_byte(fields[7].as_bytes().first().copied().unwrap_or(b'.'));
        feature.attributes = parse_gtf_attributes(fields[8]);
        Ok(Node::new_feature(
            NodeHeader {
                filename: Some(Rc::clone(&self.filename)),
                line_number,
            },
            feature,
        ))
    }
}

impl NodeStream for GtfInStream {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        if !self.loaded {
            self.load()?;
        }
        Ok(self.queue.pop())
    }
}
