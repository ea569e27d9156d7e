//! Statement-list locators backing `InsertBefore` and `Delete`.
//!
//! A rewrite that lowers a composite literal into several statements
//! (spec §4.4) or that canonicalizes an `if`-init presence test (spec
//! §4.2) needs to splice into whichever `Vec<NodeId>` currently holds
//! the cursor's node. That vector lives inside an arena node, so a
//! cursor can't simply hold `&mut Vec<NodeId>` alongside `&mut Arena` —
//! instead it remembers *where* the list is and re-borrows into the
//! arena on demand, the same indirection `tsz-checker`'s `NodeArena`
//! lookups use instead of long-lived borrows into node payloads.

use refactor_ast::{Arena, DeclKind, NodeId, NodeKind, StmtKind};

/// Where the statement list containing the cursor's current node lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StmtListLoc {
    Block(NodeId),
    FuncBody(NodeId),
    IfThen(NodeId),
    IfElse(NodeId),
    /// A case body inside a one-of `TypeSwitch` (pre-rewrite shape).
    CaseBody(NodeId, usize),
    /// A case body inside an ordinary `Switch` — what a one-of
    /// type-switch becomes once pass 2 rewrites it (spec §4.5), which
    /// later passes (e.g. composite-literal lowering, §4.4) still need
    /// to splice into.
    SwitchCaseBody(NodeId, usize),
}

/// Re-borrow the `Vec<NodeId>` a [`StmtListLoc`] identifies. `None` if the
/// located node no longer has the expected shape (e.g. an `IfElse` whose
/// `else_body` was already removed by an earlier rewrite).
pub fn stmt_list_mut(arena: &mut Arena, loc: StmtListLoc) -> Option<&mut Vec<NodeId>> {
    match loc {
        StmtListLoc::Block(id) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Stmt(StmtKind::Block(stmts)) => Some(stmts),
            _ => None,
        },
        StmtListLoc::FuncBody(id) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Decl(DeclKind::Func { body, .. }) => Some(body),
            _ => None,
        },
        StmtListLoc::IfThen(id) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Stmt(StmtKind::If { then_body, .. }) => Some(then_body),
            _ => None,
        },
        StmtListLoc::IfElse(id) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Stmt(StmtKind::If { else_body: Some(body), .. }) => Some(body),
            _ => None,
        },
        StmtListLoc::CaseBody(id, case_idx) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Stmt(StmtKind::TypeSwitch { cases, .. }) => cases.get_mut(case_idx).map(|c| &mut c.body),
            _ => None,
        },
        StmtListLoc::SwitchCaseBody(id, case_idx) => match &mut arena.get_mut(id)?.kind {
            NodeKind::Stmt(StmtKind::Switch { cases, .. }) => cases.get_mut(case_idx).map(|c| &mut c.body),
            _ => None,
        },
    }
}
