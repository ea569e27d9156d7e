//! `Cursor` — the traversal context passed to every rule (spec §4.1).
//!
//! Carries the current node, its parent, the file, the confidence level,
//! the import table, the helper-name allocator, and the unsafe-reason
//! counters (spec §3 "Cursor"). Rules never touch the arena directly for
//! mutation except through the cursor's four operations, mirroring how
//! `tsz-checker`'s `ExpressionDispatcher` only ever mutates `CheckerState`
//! through its own methods rather than reaching into the arena by hand.

use refactor_ast::{Arena, NodeId, NodeKind};
use refactor_common::{ConfidenceLevel, UnsafeReason};
use refactor_scope::helper_names::HelperNameAllocator;

use crate::counters::UnsafeReasonCounters;
use crate::imports::ImportTable;
use crate::mutations::{StmtListLoc, stmt_list_mut};

/// The traversal context passed to every rule.
pub struct Cursor<'a> {
    pub arena: &'a mut Arena,
    pub node: NodeId,
    pub parent: NodeId,
    pub file: &'a str,
    pub level: ConfidenceLevel,
    pub imports: &'a mut ImportTable,
    pub helper_names: &'a mut HelperNameAllocator,
    pub counters: &'a mut UnsafeReasonCounters,
    /// Where the statement list holding `node` lives, if `node` is
    /// itself a statement. `None` for rules invoked on expression-only
    /// subtrees (e.g. a nested field-read inside a larger expression)
    /// where `InsertBefore`/`Delete` would not make sense.
    list_loc: Option<StmtListLoc>,
    index_in_list: usize,
}

impl<'a> Cursor<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: &'a mut Arena,
        node: NodeId,
        parent: NodeId,
        file: &'a str,
        level: ConfidenceLevel,
        imports: &'a mut ImportTable,
        helper_names: &'a mut HelperNameAllocator,
        counters: &'a mut UnsafeReasonCounters,
    ) -> Self {
        Cursor {
            arena,
            node,
            parent,
            file,
            level,
            imports,
            helper_names,
            counters,
            list_loc: None,
            index_in_list: 0,
        }
    }

    /// Attach the statement-list context needed for `InsertBefore`/`Delete`.
    /// Called by the driver when `node` is a statement directly inside a
    /// block, func body, if-branch, or switch-case body.
    pub fn with_list_context(mut self, loc: StmtListLoc, index: usize) -> Self {
        self.list_loc = Some(loc);
        self.index_in_list = index;
        self
    }

    pub fn kind(&self) -> Option<&NodeKind> {
        self.arena.get(self.node).map(|n| &n.kind)
    }

    /// `Replace` (spec §4.1): rewrite the current node's shape in place,
    /// preserving its id so anything else still referencing it follows
    /// along.
    pub fn replace(&mut self, kind: NodeKind) {
        self.arena.set_kind(self.node, kind);
    }

    /// `ReplaceUnsafe(reason)` (spec §4.1): the single call site for
    /// bumping the unsafe-reason counter.
    ///
    /// Spec §4.8: an unsafe-tagged rewrite is by definition a Yellow-or-
    /// above rewrite — Green "preserves observable semantics under the
    /// documented assumptions" with no unsafe-tagged rewrite firing at
    /// all. Below `Yellow` this is a no-op: the node is left untouched
    /// and the counter is not bumped, so every rule that calls this
    /// inherits level-gating for free instead of re-deriving it at each
    /// call site. Returns whether the mutation actually applied.
    pub fn replace_unsafe(&mut self, kind: NodeKind, reason: UnsafeReason) -> bool {
        if self.level < ConfidenceLevel::Yellow {
            tracing::debug!(file = self.file, level = ?self.level, reason = ?reason, "unsafe rewrite suppressed below yellow");
            return false;
        }
        self.arena.set_kind(self.node, kind);
        self.counters.record(reason);
        tracing::debug!(file = self.file, level = ?self.level, reason = ?reason, "unsafe rewrite applied");
        true
    }

    /// `InsertBefore` (spec §4.1): splice a new statement into the
    /// enclosing list immediately before the current node, keeping the
    /// cursor pointed at the original (now shifted) node.
    pub fn insert_before(&mut self, new_stmt: NodeId) {
        let loc = self
            .list_loc
            .unwrap_or_else(|| unreachable!("InsertBefore with no enclosing statement list in {}", self.file));
        let Some(stmts) = stmt_list_mut(self.arena, loc) else {
            unreachable!("InsertBefore target statement list vanished in {}", self.file);
        };
        stmts.insert(self.index_in_list, new_stmt);
        self.index_in_list += 1;
    }

    /// `Delete` (spec §4.1): remove the current node from its enclosing
    /// list.
    pub fn delete(&mut self) {
        let loc = self
            .list_loc
            .unwrap_or_else(|| unreachable!("Delete with no enclosing statement list in {}", self.file));
        let Some(stmts) = stmt_list_mut(self.arena, loc) else {
            unreachable!("Delete target statement list vanished in {}", self.file);
        };
        if self.index_in_list < stmts.len() {
            stmts.remove(self.index_in_list);
        }
    }
}
