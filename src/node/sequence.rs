//! Sequence node payload: an inline FASTA record following `##FASTA`.

#[derive(Debug, Clone)]
pub struct SequenceNode {
    pub description: String,
    pub sequence: String,
}

impl SequenceNode {
    pub fn new(description: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}
