//! Meta node payload: a `##` directive other than `sequence-region` or
//! `FASTA` (e.g. `##gff-version`, `##genome-build`). Like comment nodes,
//! meta nodes have no seqid or range mutator.

#[derive(Debug, Clone)]
pub struct MetaNode {
    pub directive: String,
    pub data: String,
}

impl MetaNode {
    pub fn new(directive: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            data: data.into(),
        }
    }
}
