//! Shared traversal helpers: document-order visiting (spec §4.1) and the
//! bound-name substitution used by the if-init presence canonicalization
//! (spec §4.2) and the oneof type-switch body rewrite (spec §4.5).

use refactor_ast::{Arena, ExprKind, NodeId, NodeKind, walk};

/// Visit every node reachable from `root`, pre-order, document order.
/// Ties among siblings are broken by source order, which for trees built
/// directly through `refactor-ast` (no parser in this crate) is
/// allocation order — matching spec §4.1's "ties elsewhere are broken by
/// lexical position."
pub fn visit_preorder(arena: &Arena, root: NodeId, f: &mut dyn FnMut(NodeId)) {
    if root.is_none() {
        return;
    }
    f(root);
    let Some(node) = arena.get(root) else { return };
    for child in walk::children(node) {
        visit_preorder(arena, child, f);
    }
}

/// Whether `node` is `Ident(name)`.
pub fn is_ident(arena: &Arena, node: NodeId, name: &str) -> bool {
    matches!(arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::Ident(n)) if n == name)
}

/// Whether `node` is a pointer-scalar dereference `*<Ident(name)>`.
pub fn is_deref_of_ident(arena: &Arena, node: NodeId, name: &str) -> bool {
    matches!(arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::Star { x }) if is_ident(arena, *x, name))
}

/// Replace every reachable use of `Ident(name)` under `root` with a
/// freshly synthesized node, collapsing `*name` into a single
/// replacement rather than re-wrapping it in a `Star` (spec §4.2: "`*e`"
/// in the worked example becomes `m.GetE()`, not `*m.GetE()`).
///
/// `root` itself is never replaced (callers pass the statement or
/// expression *containing* the uses, not a bare `Ident(name)` node).
pub fn substitute_ident_uses(arena: &mut Arena, root: NodeId, name: &str, make_replacement: &mut dyn FnMut(&mut Arena) -> NodeKind) {
    if root.is_none() {
        return;
    }
    if is_deref_of_ident(arena, root, name) {
        let kind = make_replacement(arena);
        arena.set_kind(root, kind);
        return;
    }
    let children: Vec<NodeId> = match arena.get(root) {
        Some(node) => walk::children(node).into_iter().collect(),
        None => return,
    };
    for child in children {
        if is_ident(arena, child, name) {
            let kind = make_replacement(arena);
            arena.set_kind(child, kind);
        } else {
            substitute_ident_uses(arena, child, name, make_replacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refactor_ast::{Arena, Lit, NodeKind, StmtKind};

    #[test]
    fn preorder_visits_parent_before_children() {
        let mut arena = Arena::new();
        let lit = arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Int(1))), NodeId::NONE);
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(lit)), NodeId::NONE);
        let mut seen = Vec::new();
        visit_preorder(&arena, stmt, &mut |id| seen.push(id));
        assert_eq!(seen, vec![stmt, lit]);
    }

    #[test]
    fn substitution_collapses_deref_and_rewrites_bare_uses() {
        let mut arena = Arena::new();
        let e1 = arena.alloc(NodeKind::Expr(ExprKind::Ident("e".into())), NodeId::NONE);
        let deref = arena.alloc(NodeKind::Expr(ExprKind::Star { x: e1 }), NodeId::NONE);
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(deref)), NodeId::NONE);

        substitute_ident_uses(&mut arena, stmt, "e", &mut |arena| {
            let recv = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
            let getter = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: recv, sel: "GetE".into() }), NodeId::NONE);
            NodeKind::Expr(ExprKind::Call { func: getter, args: Default::default() })
        });

        match &arena.get(deref).unwrap().kind {
            NodeKind::Expr(ExprKind::Call { .. }) => {}
            other => panic!("expected the Star node to become a Call, got {other:?}"),
        }
    }
}
