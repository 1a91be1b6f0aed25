//! GFF3 writer sink: formats nodes to any `Write`, zero-allocation for
//! numeric fields via `itoa`/`ryu`, matching the crate's output-buffer
//! convention.

use std::io::{BufWriter, Write};

use rustc_hash::FxHashSet;

use crate::config;
use crate::error::{ParseError, StreamError, StreamResult};
use crate::node::Node;

use super::NodeStream;

const DEFAULT_BUFFER_SIZE: usize = 1 << 16;

pub struct Gff3OutStream<S, W: Write> {
    upstream: S,
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    seen_ids: FxHashSet<String>,
    wrote_header: bool,
    last_seqid: Option<String>,
}

impl<S: NodeStream, W: Write> Gff3OutStream<S, W> {
    pub fn new(upstream: S, output: W) -> Self {
        Self {
            upstream,
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, output),
            itoa_buf: itoa::Buffer::new(),
            seen_ids: FxHashSet::default(),
            wrote_header: false,
            last_seqid: None,
        }
    }

    fn io(&self, e: std::io::Error) -> StreamError {
        StreamError::from(ParseError::Io(e))
    }

    fn write_header(&mut self) -> StreamResult<()> {
        if !self.wrote_header {
            self.writer.write_all(b"##gff-version 3\n").map_err(|e| self.io(e))?;
            self.wrote_header = true;
        }
        Ok(())
    }

    fn unique_id(&mut self, requested: &str) -> String {
        if config::retain_ids() && !self.seen_ids.contains(requested) {
            self.seen_ids.insert(requested.to_string());
            return requested.to_string();
        }
        let mut candidate = requested.to_string();
        let mut suffix = 1u32;
        while self.seen_ids.contains(&candidate) {
            candidate = format!("{}.{}", requested, suffix);
            suffix += 1;
        }
        self.seen_ids.insert(candidate.clone());
        candidate
    }

    fn write_feature(&mut self, node: &Node) -> StreamResult<()> {
        let seqid = node.seqid().unwrap_or_default();
        if self.last_seqid.as_deref() != Some(seqid.as_str()) {
            if self.last_seqid.is_some() {
                self.writer.write_all(b"###\n").map_err(|e| self.io(e))?;
            }
            self.last_seqid = Some(seqid.clone());
        }
        let feature = node.as_feature();
        self.writer.write_all(seqid.as_bytes()).map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        self.writer.write_all(feature.source.as_bytes()).map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        self.writer.write_all(feature.feature_type.as_bytes()).map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        self.writer
            .write_all(self.itoa_buf.format(feature.range.start).as_bytes())
            .map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        self.writer
            .write_all(self.itoa_buf.format(feature.range.end).as_bytes())
            .map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        match feature.score {
            Some(score) => write!(self.writer, "{}", score).map_err(|e| self.io(e))?,
            None => self.writer.write_all(b".").map_err(|e| self.io(e))?,
        }
        write!(self.writer, "\t{}\t", feature.strand).map_err(|e| self.io(e))?;
        match feature.phase {
            Some(crate::node::Phase::Zero) => self.writer.write_all(b"0"),
            Some(crate::node::Phase::One) => self.writer.write_all(b"1"),
            Some(crate::node::Phase::Two) => self.writer.write_all(b"2"),
            _ => self.writer.write_all(b"."),
        }
        .map_err(|e| self.io(e))?;
        self.writer.write_all(b"\t").map_err(|e| self.io(e))?;
        if feature.attributes.is_empty() {
            self.writer.write_all(b".").map_err(|e| self.io(e))?;
        } else {
            let mut first = true;
            for (key, value) in feature.attributes.iter() {
                if !first {
                    self.writer.write_all(b";").map_err(|e| self.io(e))?;
                }
                first = false;
                let rendered = if key == "ID" {
                    self.unique_id(value.as_scalar())
                } else {
                    value.as_scalar().to_string()
                };
                write!(self.writer, "{}={}", key, rendered).map_err(|e| self.io(e))?;
            }
        }
        self.writer.write_all(b"\n").map_err(|e| self.io(e))
    }

    fn write_sequence(&mut self, node: &Node) -> StreamResult<()> {
        let seq = node.try_as_sequence().expect("node is a sequence variant");
        write!(self.writer, ">{}\n", seq.description).map_err(|e| self.io(e))?;
        let width = config::fasta_wrap_width();
        for chunk in seq.sequence.as_bytes().chunks(width) {
            self.writer.write_all(chunk).map_err(|e| self.io(e))?;
            self.writer.write_all(b"\n").map_err(|e| self.io(e))?;
        }
        Ok(())
    }

    /// Drive the upstream to completion, writing every node. Returns the
    /// number of nodes written.
    pub fn run(&mut self) -> StreamResult<usize> {
        self.write_header()?;
        let mut count = 0usize;
        let mut in_fasta = false;
        while let Some(node) = self.upstream.next()? {
            if node.try_as_sequence().is_some() {
                if !in_fasta {
                    self.writer.write_all(b"##FASTA\n").map_err(|e| self.io(e))?;
                    in_fasta = true;
                }
                self.write_sequence(&node)?;
            } else if let Some(region) = node.try_as_region() {
                write!(
                    self.writer,
                    "##sequence-region {} {} {}\n",
                    region.seqid, region.range.start, region.range.end
                )
                .map_err(|e| self.io(e))?;
            } else if let Some(comment) = node.try_as_comment() {
                write!(self.writer, "#{}\n", comment.text).map_err(|e| self.io(e))?;
            } else if let Some(meta) = node.try_as_meta() {
                write!(self.writer, "##{} {}\n", meta.directive, meta.data).map_err(|e| self.io(e))?;
            } else if node.is_feature() {
                self.write_feature(&node)?;
            }
            count += 1;
        }
        self.writer.flush().map_err(|e| self.io(e))?;
        Ok(count)
    }
}
