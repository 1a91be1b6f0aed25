//! Comment node payload: a `#` line. Carries no seqid or range of its own;
//! `range()` always reports `{0, 0}` and there is no mutator slot, matching
//! the originating design where comment nodes reject `set_range`/
//! `change_seqid` as programming errors.

#[derive(Debug, Clone)]
pub struct CommentNode {
    pub text: String,
}

impl CommentNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
