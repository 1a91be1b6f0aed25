//! Feature node payload: the variant carrying biological annotations.

use std::fmt;

use super::{Node, Range};

/// Strand orientation, as the third GFF3/BED column of that name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
    NotApplicable,
}

impl Strand {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'+' => Strand::Forward,
            b'-' => Strand::Reverse,
            b'.' => Strand::NotApplicable,
            _ => Strand::Unknown,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::NotApplicable => '.',
            Strand::Unknown => '?',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Reading-frame phase for CDS features, the eighth GFF3 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Zero,
    One,
    Two,
    Undetermined,
}

impl Phase {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'0' => Some(Phase::Zero),
            b'1' => Some(Phase::One),
            b'2' => Some(Phase::Two),
            b'.' => None,
            _ => Some(Phase::Undetermined),
        }
    }
}

/// One attribute value: either a single scalar or an ordered list (the
/// comma-separated form GFF3 allows for keys like `Parent`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Scalar(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn as_scalar(&self) -> &str {
        match self {
            AttributeValue::Scalar(s) => s,
            AttributeValue::List(items) => items.first().map(|s| s.as_str()).unwrap_or(""),
        }
    }
}

/// Insertion-ordered attribute multimap, keyed by attribute name.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    keys: Vec<String>,
    values: Vec<AttributeValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an attribute. Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        let key = key.into();
        if let Some(idx) = self.keys.iter().position(|k| *k == key) {
            Some(std::mem::replace(&mut self.values[idx], value))
        } else {
            self.keys.push(key);
            self.values.push(value);
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|idx| &self.values[idx])
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.keys.iter().position(|k| k == key).map(|idx| {
            self.keys.remove(idx);
            self.values.remove(idx)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A multi-feature group: several discontiguous lines that together form
/// one logical feature (e.g. a CDS spanning several exons). All members
/// share one `representative`, the first node created for the group.
#[derive(Debug, Clone)]
pub struct MultiGroup {
    pub representative: Node,
}

/// A feature annotation: the most richly structured node variant.
#[derive(Debug, Clone)]
pub struct FeatureNode {
    pub seqid: String,
    pub range: Range,
    pub source: String,
    pub feature_type: String,
    pub score: Option<f64>,
    pub strand: Strand,
    pub phase: Option<Phase>,
    pub attributes: AttributeMap,
    pub children: Vec<Node>,
    pub multi: Option<MultiGroup>,
}

impl FeatureNode {
    pub fn new(seqid: impl Into<String>, range: Range, feature_type: impl Into<String>) -> Self {
        Self {
            seqid: seqid.into(),
            range,
            source: ".".to_string(),
            feature_type: feature_type.into(),
            score: None,
            strand: Strand::NotApplicable,
            phase: None,
            attributes: AttributeMap::new(),
            children: Vec::new(),
            multi: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("ID").map(|v| v.as_scalar())
    }

    pub fn has_cds_child(&self) -> bool {
        self.children.iter().any(|c| {
            c.try_as_feature()
                .map(|f| f.feature_type == "CDS")
                .unwrap_or(false)
        })
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_roundtrip() {
        assert_eq!(Strand::from_byte(b'+').as_char(), '+');
        assert_eq!(Strand::from_byte(b'-').as_char(), '-');
        assert_eq!(Strand::from_byte(b'.').as_char(), '.');
    }

    #[test]
    fn test_attribute_map_preserves_order() {
        let mut attrs = AttributeMap::new();
        attrs.set("ID", AttributeValue::Scalar("gene1".into()));
        attrs.set("Name", AttributeValue::Scalar("BRCA2".into()));
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ID", "Name"]);
    }

    #[test]
    fn test_attribute_map_overwrite() {
        let mut attrs = AttributeMap::new();
        attrs.set("ID", AttributeValue::Scalar("a".into()));
        let prev = attrs.set("ID", AttributeValue::Scalar("b".into()));
        assert_eq!(prev, Some(AttributeValue::Scalar("a".into())));
        assert_eq!(attrs.len(), 1);
    }
}
