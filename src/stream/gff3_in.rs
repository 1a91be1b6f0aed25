//! GFF3 input adapter: the plain reader plus identity accessors shared
//! with GTF/BED tokenizing.

use std::io::BufRead;
use std::rc::Rc;

use memchr::memchr;

use crate::config;
use crate::error::{ParseError, StreamError, StreamResult};
use crate::node::feature::{AttributeMap, AttributeValue, Phase, Strand};
use crate::node::{CommentNode, FeatureNode, MetaNode, Node, NodeHeader, Range, RegionNode, SequenceNode};

use super::NodeStream;

/// Fast, allocation-free unsigned integer parse, mirroring the crate's
/// zero-allocation BED-parsing convention.
#[inline(always)]
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

fn split_tabs(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

fn parse_attributes(field: &str) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    if field == "." {
        return attrs;
    }
    for pair in field.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some(eq) = memchr(b'=', pair.as_bytes()) else {
            continue;
        };
        let key = &pair[..eq];
        let value = &pair[eq + 1..];
        if value.contains(',') {
            let items: Vec<String> = value.split(',').map(|s| s.to_string()).collect();
            attrs.set(key, AttributeValue::List(items));
        } else {
            attrs.set(key, AttributeValue::Scalar(value.to_string()));
        }
    }
    attrs
}

/// Streams genome nodes from one or more GFF3 files (or any `BufRead`),
/// line by line, tolerating a trailing `##FASTA` section.
pub struct Gff3InStream<R> {
    reader: R,
    filename: Rc<str>,
    line_number: u32,
    in_fasta: bool,
    pending_fasta: Option<(String, String)>,
    finished: bool,
    tidy: bool,
}

impl<R: BufRead> Gff3InStream<R> {
    pub fn new(reader: R, filename: impl Into<String>) -> Self {
        Self {
            reader,
            filename: Rc::from(filename.into().as_str()),
            line_number: 0,
            in_fasta: false,
            pending_fasta: None,
            finished: false,
            tidy: !config::is_strict_mode(),
        }
    }

    fn header(&self) -> NodeHeader {
        NodeHeader {
            filename: Some(Rc::clone(&self.filename)),
            line_number: self.line_number,
        }
    }

    fn read_line(&mut self) -> StreamResult<Option<String>> {
        let mut buf = String::new();
        let bytes = self
            .reader
            .read_line(&mut buf)
            .map_err(ParseError::Io)
            .map_err(StreamError::from)?;
        if bytes == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    fn flush_fasta_record(&mut self) -> Option<Node> {
        self.pending_fasta.take().map(|(desc, seq)| {
            Node::new_sequence(self.header(), SequenceNode::new(desc, seq))
        })
    }

    fn parse_feature_line(&self, line: &str) -> StreamResult<Node> {
        let fields = split_tabs(line);
        if fields.len() < 8 {
            return Err(self.syntax_error("expected at least 8 tab-separated columns"));
        }
        let seqid = fields[0];
        let source = fields[1];
        let feature_type = fields[2];
        let start = parse_u64_fast(fields[3].as_bytes())
            .ok_or_else(|| self.syntax_error("non-numeric start coordinate"))?;
        let end = parse_u64_fast(fields[4].as_bytes())
            .ok_or_else(|| self.syntax_error("non-numeric end coordinate"))?;
        if start > end {
            if self.tidy {
                log::warn!(
                    "{}:{}: start {} > end {}, swapping in tidy mode",
                    self.filename,
                    self.line_number,
                    start,
                    end
                );
                return self.build_feature(seqid, source, feature_type, end, start, &fields);
            }
            return Err(self.semantic_error(&format!("start {} exceeds end {}", start, end)));
        }
        self.build_feature(seqid, source, feature_type, start, end, &fields)
    }

    fn build_feature(
        &self,
        seqid: &str,
        source: &str,
        feature_type: &str,
        start: u64,
        end: u64,
        fields: &[&str],
    ) -> StreamResult<Node> {
        let mut feature = FeatureNode::new(seqid, Range::new(start, end), feature_type);
        feature.source = source.to_string();
        if fields.len() > 5 && fields[5] != "." {
            feature.score = fields[5].parse::<f64>().ok();
        }
        if fields.len() > 6 {
            feature.strand = Strand::from_byte(fields[6].as_bytes().first().copied().unwrap_or(b'.'));
        }
        if fields.len() > 7 {
            feature.phase = Phase::from_byte(fields[7].as_bytes().first().copied().unwrap_or(b'.'));
        }
        if fields.len() > 8 {
            feature.attributes = parse_attributes(fields[8]);
        }
        Ok(Node::new_feature(self.header(), feature))
    }

    fn parse_region_directive(&self, rest: &str) -> StreamResult<Node> {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(self.syntax_error("##sequence-region requires seqid, start, end"));
        }
        let start = parse_u64_fast(parts[1].as_bytes())
            .ok_or_else(|| self.syntax_error("non-numeric region start"))?;
        let end = parse_u64_fast(parts[2].as_bytes())
            .ok_or_else(|| self.syntax_error("non-numeric region end"))?;
        Ok(Node::new_region(
            self.header(),
            RegionNode::new(parts[0], Range::new(start.min(end), start.max(end))),
        ))
    }

    fn syntax_error(&self, message: &str) -> StreamError {
        ParseError::Syntax {
            file: self.filename.to_string(),
            line: self.line_number as usize,
            message: message.to_string(),
        }
        .into()
    }

    fn semantic_error(&self, message: &str) -> StreamError {
        ParseError::Semantic {
            file: self.filename.to_string(),
            line: self.line_number as usize,
            message: message.to_string(),
        }
        .into()
    }
}

impl<R: BufRead> NodeStream for Gff3InStream<R> {
    fn next(&mut self) -> StreamResult<Option<Node>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            let Some(line) = self.read_line()? else {
                self.finished = true;
                return Ok(self.flush_fasta_record());
            };

            if self.in_fasta {
                if let Some(rest) = line.strip_prefix('>') {
                    let flushed = self.flush_fasta_record();
                    self.pending_fasta = Some((rest.to_string(), String::new()));
                    if flushed.is_some() {
                        return Ok(flushed);
                    }
                    continue;
                }
                if let Some((_, seq)) = self.pending_fasta.as_mut() {
                    seq.push_str(line.trim());
                }
                continue;
            }

            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("##") {
                if rest.trim_start() == "FASTA" {
                    self.in_fasta = true;
                    continue;
                }
                if let Some(region_rest) = rest.strip_prefix("sequence-region") {
                    return Ok(Some(self.parse_region_directive(region_rest.trim())?));
                }
                let mut parts = rest.trim().splitn(2, char::is_whitespace);
                let directive = parts.next().unwrap_or("").to_string();
                let data = parts.next().unwrap_or("").to_string();
                return Ok(Some(Node::new_meta(self.header(), MetaNode::new(directive, data))));
            }
            if let Some(rest) = line.strip_prefix('#') {
                return Ok(Some(Node::new_comment(self.header(), CommentNode::new(rest.to_string()))));
            }

            match self.parse_feature_line(&line) {
                Ok(node) => return Ok(Some(node)),
                Err(err) if self.tidy => {
                    log::warn!("{}:{}: skipping malformed record: {}", self.filename, self.line_number, err);
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(input: &str) -> Gff3InStream<Cursor<&[u8]>> {
        Gff3InStream::new(Cursor::new(input.as_bytes()), "test.gff3")
    }

    #[test]
    fn test_parses_region_and_feature() {
        let input = "##sequence-region chr1 1 1000\nchr1\t.\tgene\t10\t20\t.\t+\t.\tID=gene1\n";
        let mut s = stream(input);
        let region = s.next().unwrap().unwrap();
        assert_eq!(region.seqid().as_deref(), Some("chr1"));
        assert_eq!(region.range(), Range::new(1, 1000));

        let feature = s.next().unwrap().unwrap();
        assert_eq!(feature.range(), Range::new(10, 20));
        assert_eq!(feature.as_feature().id(), Some("gene1"));
        assert!(s.next().unwrap().is_none());
    }

    #[test]
    fn test_parses_comment_and_meta() {
        let input = "# a comment\n##gff-version 3\n";
        let mut s = stream(input);
        let comment = s.next().unwrap().unwrap();
        assert_eq!(comment.try_as_comment().unwrap().text, " a comment");
        let meta = s.next().unwrap().unwrap();
        assert_eq!(meta.try_as_meta().unwrap().directive, "gff-version");
    }

    #[test]
    fn test_fasta_section() {
        let input = "##FASTA\n>chr1 desc\nACGT\nACGT\n";
        let mut s = stream(input);
        let seq = s.next().unwrap().unwrap();
        let seq = seq.try_as_sequence().unwrap();
        assert_eq!(seq.description, "chr1 desc");
        assert_eq!(seq.sequence, "ACGTACGT");
    }

    #[test]
    fn test_strict_mode_rejects_malformed_line() {
        config::set_strict_mode(true);
        let mut s = stream("chr1\t.\tgene\tnot_a_number\t20\t.\t+\t.\tID=g\n");
        assert!(s.next().is_err());
    }

    #[test]
    fn test_tidy_mode_skips_malformed_line() {
        config::set_strict_mode(false);
        let mut s = stream("chr1\t.\tgene\tnot_a_number\t20\t.\t+\t.\tID=g\nchr1\t.\tgene\t1\t2\t.\t+\t.\tID=ok\n");
        let node = s.next().unwrap().unwrap();
        assert_eq!(node.as_feature().id(), Some("ok"));
        config::set_strict_mode(true);
    }
}
