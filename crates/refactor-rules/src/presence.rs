//! Pass 1: presence-test normalization (spec §4.2).
//!
//! Rewrites nil-comparisons and the `if`-init presence idiom into
//! `HasX()`/`GetX()` form, dispatching on the field's presence kind.

use smallvec::SmallVec;

use refactor_ast::{Arena, BinaryOp, ExprKind, Lit, NodeId, NodeKind, StmtKind, UnaryOp};
use refactor_types::FieldKind;

use crate::context::RewriteContext;
use crate::walk::{is_ident, substitute_ident_uses, visit_preorder};

/// Run the presence-test pass over every root in `roots` (typically the
/// function declarations of one file). Returns whether anything changed,
/// so the driver can decide whether another fixed-point iteration is
/// needed (spec §4.1: "Each pass runs to a fixed point at the current
/// level before the next level begins").
pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        changed |= rewrite_nil_comparisons(ctx, root);
        changed |= canonicalize_if_init_statements(ctx, root);
    }
    changed
}

/// `m.F == nil` / `!= nil` in any position, dispatched by field kind.
fn rewrite_nil_comparisons(ctx: &mut RewriteContext<'_>, root: NodeId) -> bool {
    let mut candidates = Vec::new();
    visit_preorder(ctx.arena, root, &mut |id| {
        if let Some(ExprKind::Binary { op, x, y }) = ctx.arena.get(id).and_then(|n| n.as_expr()) {
            candidates.push((id, *op, *x, *y));
        }
    });

    let mut changed = false;
    for (node, op, x, y) in candidates {
        let (field_side, nil_side) = match (is_nil_lit(ctx.arena, x), is_nil_lit(ctx.arena, y)) {
            (false, true) => (x, y),
            (true, false) => (y, x),
            _ => continue,
        };
        let _ = nil_side;
        let Some(ExprKind::Selector { x: base, sel: field }) = ctx.arena.get(field_side).and_then(|n| n.as_expr()).cloned() else {
            continue;
        };
        let Some(base_ty) = ctx.types.type_of(base).cloned() else { continue };
        let Some(kind) = ctx.shapes.field_kind(&base_ty, &field) else { continue };
        changed |= rewrite_one_comparison(ctx, node, base, &field, &kind, op);
    }
    changed
}

fn is_nil_lit(arena: &Arena, node: NodeId) -> bool {
    matches!(arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::Lit(Lit::Nil)))
}

fn rewrite_one_comparison(
    ctx: &mut RewriteContext<'_>,
    node: NodeId,
    base: NodeId,
    field: &str,
    kind: &FieldKind,
    op: BinaryOp,
) -> bool {
    let negate = op == BinaryOp::Eq; // `== nil` needs a `!`, `!= nil` does not.
    match kind {
        FieldKind::Scalar { explicit_presence: true } | FieldKind::Message | FieldKind::OneOf { .. } => {
            let has_call = call_node(ctx.arena, base, &format!("Has{field}"), SmallVec::new());
            let replacement = maybe_negate(ctx.arena, has_call, negate);
            ctx.cursor_at(node, NodeId::NONE).replace(replacement);
            true
        }
        FieldKind::Bytes => {
            let get_call = call_node(ctx.arena, base, &format!("Get{field}"), SmallVec::new());
            let len_call = ctx.arena.alloc(
                NodeKind::Expr(ExprKind::Call { func: ident(ctx.arena, "len"), args: SmallVec::from_vec(vec![get_call]) }),
                NodeId::NONE,
            );
            let zero = ctx.arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Int(0))), NodeId::NONE);
            let cmp_op = if negate { BinaryOp::Eq } else { BinaryOp::NotEq };
            ctx.cursor_at(node, NodeId::NONE)
                .replace(NodeKind::Expr(ExprKind::Binary { op: cmp_op, x: len_call, y: zero }));
            true
        }
        FieldKind::Repeated | FieldKind::Map => {
            let get_call = call_node(ctx.arena, base, &format!("Get{field}"), SmallVec::new());
            let nil_lit = ctx.arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Nil)), NodeId::NONE);
            ctx.cursor_at(node, NodeId::NONE)
                .replace(NodeKind::Expr(ExprKind::Binary { op, x: get_call, y: nil_lit }));
            true
        }
        FieldKind::Scalar { explicit_presence: false } => false,
    }
}

fn maybe_negate(arena: &mut Arena, node: NodeId, negate: bool) -> NodeKind {
    if negate {
        NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Not, x: node })
    } else {
        arena.get(node).map(|n| n.kind.clone()).expect("freshly allocated call node")
    }
}

fn call_node(arena: &mut Arena, receiver: NodeId, method: &str, args: SmallVec<[NodeId; 4]>) -> NodeId {
    let sel = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: receiver, sel: method.to_string() }), NodeId::NONE);
    arena.alloc(NodeKind::Expr(ExprKind::Call { func: sel, args }), NodeId::NONE)
}

fn ident(arena: &mut Arena, name: &str) -> NodeId {
    arena.alloc(NodeKind::Expr(ExprKind::Ident(name.to_string())), NodeId::NONE)
}

/// `if e := m.F; e != nil { body }` → `if m.HasF() { body[e -> m.GetF()] }`
/// (spec §4.2), conditional on `e` only appearing where value semantics
/// are acceptable: never under `&e` (address-of) and never reassigned.
fn canonicalize_if_init_statements(ctx: &mut RewriteContext<'_>, root: NodeId) -> bool {
    let mut if_nodes = Vec::new();
    visit_preorder(ctx.arena, root, &mut |id| {
        if matches!(ctx.arena.get(id).and_then(|n| n.as_stmt()), Some(StmtKind::If { init: Some(_), .. })) {
            if_nodes.push(id);
        }
    });

    let mut changed = false;
    for if_node in if_nodes {
        let Some(StmtKind::If { init: Some(init), cond, then_body, .. }) = ctx.arena.get(if_node).and_then(|n| n.as_stmt()).cloned() else {
            continue;
        };
        let Some(StmtKind::Assign { lhs, rhs, define: true }) = ctx.arena.get(init).and_then(|n| n.as_stmt()).cloned() else {
            continue;
        };
        if lhs.len() != 1 || rhs.len() != 1 {
            continue;
        }
        let Some(ExprKind::Ident(bound_name)) = ctx.arena.get(lhs[0]).and_then(|n| n.as_expr()).cloned() else {
            continue;
        };
        let Some(ExprKind::Selector { x: base, sel: field }) = ctx.arena.get(rhs[0]).and_then(|n| n.as_expr()).cloned() else {
            continue;
        };
        let Some(ExprKind::Binary { op: BinaryOp::NotEq, x, y }) = ctx.arena.get(cond).and_then(|n| n.as_expr()).cloned() else {
            continue;
        };
        let cond_matches_bound = (is_ident(ctx.arena, x, &bound_name) && is_nil_lit(ctx.arena, y))
            || (is_ident(ctx.arena, y, &bound_name) && is_nil_lit(ctx.arena, x));
        if !cond_matches_bound {
            continue;
        }
        let Some(base_ty) = ctx.types.type_of(base).cloned() else { continue };
        if !ctx.shapes.has_explicit_presence(&base_ty, &field) {
            continue;
        }
        if bound_name_is_reassigned_or_addressed(ctx.arena, &then_body, &bound_name) {
            continue;
        }

        let has_call = call_node(ctx.arena, base, &format!("Has{field}"), SmallVec::new());
        let has_call_kind = ctx.arena.get(has_call).expect("freshly allocated call node").kind.clone();
        ctx.cursor_at(cond, NodeId::NONE).replace(has_call_kind);
        for &stmt in &then_body {
            let field_owned = field.clone();
            substitute_ident_uses(ctx.arena, stmt, &bound_name, &mut |arena| {
                let base_clone = clone_subtree(arena, base);
                let func = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: base_clone, sel: format!("Get{field_owned}") }), NodeId::NONE);
                NodeKind::Expr(ExprKind::Call { func, args: SmallVec::new() })
            });
        }
        ctx.arena.set_kind(if_node, NodeKind::Stmt(StmtKind::If { init: None, cond, then_body, else_body: None }));
        changed = true;
    }
    changed
}

/// Whether `name` is taken by address or assigned to anywhere in `body`.
fn bound_name_is_reassigned_or_addressed(arena: &Arena, body: &[NodeId], name: &str) -> bool {
    let mut found = false;
    for &stmt in body {
        visit_preorder(arena, stmt, &mut |id| {
            if found {
                return;
            }
            match arena.get(id).map(|n| &n.kind) {
                Some(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x })) if is_ident(arena, *x, name) => {
                    found = true;
                }
                Some(NodeKind::Stmt(StmtKind::Assign { lhs, .. })) if lhs.iter().any(|l| is_ident(arena, *l, name)) => {
                    found = true;
                }
                _ => {}
            }
        });
    }
    found
}

/// Shallow structural clone of an expression subtree into fresh node
/// ids, for reuse at more than one rewrite site (e.g. the receiver in an
/// if-init canonicalization is referenced once per use of the bound
/// name).
fn clone_subtree(arena: &mut Arena, node: NodeId) -> NodeId {
    if node.is_none() {
        return NodeId::NONE;
    }
    let kind = arena.get(node).map(|n| n.kind.clone()).unwrap_or(NodeKind::Expr(ExprKind::Lit(Lit::Nil)));
    let cloned_kind = match kind {
        NodeKind::Expr(ExprKind::Selector { x, sel }) => {
            let x = clone_subtree(arena, x);
            NodeKind::Expr(ExprKind::Selector { x, sel })
        }
        NodeKind::Expr(ExprKind::Star { x }) => {
            let x = clone_subtree(arena, x);
            NodeKind::Expr(ExprKind::Star { x })
        }
        NodeKind::Expr(ExprKind::Index { x, index }) => {
            let x = clone_subtree(arena, x);
            let index = clone_subtree(arena, index);
            NodeKind::Expr(ExprKind::Index { x, index })
        }
        NodeKind::Expr(ExprKind::Call { func, args }) => {
            let func = clone_subtree(arena, func);
            let args = args.iter().map(|a| clone_subtree(arena, *a)).collect();
            NodeKind::Expr(ExprKind::Call { func, args })
        }
        other => other,
    };
    arena.alloc(cloned_kind, NodeId::NONE)
}
