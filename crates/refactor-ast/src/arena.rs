//! The node arena: stable `NodeId` identity for every node in one file's
//! DST (spec §3: "Nodes have stable identity").
//!
//! Modeled directly on the `NodeIndex`/`NodeArena` pair used throughout
//! `tsz-parser`/`tsz-checker`: a thin `Copy` index newtype plus a `Vec`
//! backing store, so inserting a node never invalidates existing ids.

use refactor_common::TriviaBag;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeKind};

/// A stable reference to a node within one file's [`Arena`].
///
/// `NONE` is a dedicated sentinel (not `Option<NodeId>`) so optional
/// links — a statement's absent `if`-init, a node's absent parent — are
/// representable inline without an extra enum tag, matching the
/// teacher's `NodeIndex::NONE` / `is_none()` idiom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::NONE
    }
}

/// One file's decorated syntax tree: the node arena plus the trivia side
/// table (spec §9 "Comment ownership": trivia is never a node child).
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    trivia: FxHashMap<NodeId, TriviaBag>,
    root: NodeId,
}

impl Arena {
    pub fn new() -> Self {
        Arena { nodes: Vec::new(), trivia: FxHashMap::default(), root: NodeId::NONE }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Allocate a new node with the given parent, returning its fresh id.
    pub fn alloc(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, parent });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Overwrite a node's shape in place, preserving its id and parent.
    /// Used by in-place rewrites (e.g. turning `m.F` into `m.GetF()`
    /// without disturbing whatever holds a reference to this id).
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.get_mut(id) {
            node.kind = kind;
        }
    }

    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.parent = parent;
        }
    }

    pub fn parent_of(&self, id: NodeId) -> NodeId {
        self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    // -- trivia --------------------------------------------------------

    pub fn trivia(&self, id: NodeId) -> TriviaBag {
        self.trivia.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_trivia(&mut self, id: NodeId, bag: TriviaBag) {
        if bag.is_empty() {
            self.trivia.remove(&id);
        } else {
            self.trivia.insert(id, bag);
        }
    }

    pub fn take_trivia(&mut self, id: NodeId) -> TriviaBag {
        self.trivia.remove(&id).unwrap_or_default()
    }

    /// Total comment trivia reachable from `id` downward. Used by the
    /// trivia-preservation test property (spec §8) to compare the
    /// before/after multiset sizes of a rewritten subtree.
    pub fn subtree_comment_count(&self, id: NodeId) -> usize {
        let mut total = self.trivia(id).comment_count();
        if let Some(node) = self.get(id) {
            for child in crate::walk::children(node) {
                total += self.subtree_comment_count(child);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ExprKind, NodeKind};

    #[test]
    fn fresh_ids_are_stable_after_more_allocation() {
        let mut arena = Arena::new();
        let a = arena.alloc(NodeKind::Expr(ExprKind::Ident("a".into())), NodeId::NONE);
        let b = arena.alloc(NodeKind::Expr(ExprKind::Ident("b".into())), NodeId::NONE);
        assert_ne!(a, b);
        assert_eq!(arena.get(a).unwrap().as_expr(), Some(&ExprKind::Ident("a".into())));
        // allocating more nodes must not move `a`'s data
        for i in 0..10 {
            arena.alloc(NodeKind::Expr(ExprKind::Ident(format!("x{i}"))), NodeId::NONE);
        }
        assert_eq!(arena.get(a).unwrap().as_expr(), Some(&ExprKind::Ident("a".into())));
    }

    #[test]
    fn none_sentinel_round_trips() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(NodeId(0).is_some());
    }
}
