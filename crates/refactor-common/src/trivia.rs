//! Trivia - comments and blank-line information attached to DST nodes.
//!
//! Trivia is not part of the syntax tree itself: per spec §9 "Comment
//! ownership", comments are a per-node side bag, not children of nodes.
//! This mirrors `tsz_common::comments::CommentRange`, generalized from
//! "extracted once per file" to "reparentable as rewrites move subtrees
//! around".

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A single piece of trivia: a comment or a deliberate blank line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trivia {
    LineComment { span: Span, text: String },
    BlockComment { span: Span, text: String },
    /// A blank line the formatter should preserve (not itself text).
    BlankLine,
}

impl Trivia {
    pub fn is_comment(&self) -> bool {
        !matches!(self, Trivia::BlankLine)
    }
}

/// The leading and trailing trivia attached to one DST node.
///
/// Stored in a side table keyed by `NodeId`, never as node children, so
/// that lowering a literal into several statements (§4.4) can partition
/// trivia across the new statements without touching tree shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaBag {
    pub leading: Vec<Trivia>,
    pub trailing: Vec<Trivia>,
}

impl TriviaBag {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }

    /// Total count of comment trivia (used by the trivia-preservation
    /// property in spec §8 to compare multisets across a rewrite).
    pub fn comment_count(&self) -> usize {
        self.leading.iter().filter(|t| t.is_comment()).count()
            + self.trailing.iter().filter(|t| t.is_comment()).count()
    }

    /// Split this bag's leading trivia into a chunk that moved along
    /// with an element at `element_pos` in a composite literal, leaving
    /// the rest behind. Used when lowering a literal into statements.
    pub fn take_leading(&mut self) -> Vec<Trivia> {
        std::mem::take(&mut self.leading)
    }

    pub fn take_trailing(&mut self) -> Vec<Trivia> {
        std::mem::take(&mut self.trailing)
    }

    pub fn merge(mut self, other: TriviaBag) -> TriviaBag {
        self.leading.extend(other.leading);
        self.trailing.extend(other.trailing);
        self
    }
}

/// A `DO_NOT_SUBMIT` marker comment attached at a refused-rewrite site
/// (spec §4.8 Red, §7.3).
pub fn do_not_submit(reason: &str) -> Trivia {
    Trivia::LineComment {
        span: Span::synthetic(),
        text: format!("// DO_NOT_SUBMIT: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_count_ignores_blank_lines() {
        let bag = TriviaBag {
            leading: vec![Trivia::BlankLine, Trivia::LineComment { span: Span::synthetic(), text: "// a".into() }],
            trailing: vec![Trivia::BlockComment { span: Span::synthetic(), text: "/* b */".into() }],
        };
        assert_eq!(bag.comment_count(), 2);
    }

    #[test]
    fn merge_concatenates_both_sides() {
        let a = TriviaBag {
            leading: vec![Trivia::BlankLine],
            trailing: vec![],
        };
        let b = TriviaBag {
            leading: vec![],
            trailing: vec![Trivia::BlankLine],
        };
        let merged = a.merge(b);
        assert_eq!(merged.leading.len(), 1);
        assert_eq!(merged.trailing.len(), 1);
    }
}
