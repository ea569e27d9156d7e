//! Pass 3: field-read rewrite (spec §4.3 "Reads").
//!
//! `m.F` in value position becomes `m.GetF()`; `*m.F` folds directly into
//! `m.GetF()` rather than re-wrapping the call in a `Star`. Reads that
//! would need the struct field's address, or that use a field name as a
//! bare method value, are refused rather than silently changed.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use refactor_ast::{Arena, ExprKind, NodeId, NodeKind};
use refactor_common::{ConfidenceLevel, UnsafeReason};
use refactor_types::FieldKind;

use crate::context::RewriteContext;
use crate::walk::visit_preorder;

pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        let (addr_of, call_func) = classify_roles(ctx.arena, root);
        changed |= rewrite_field_selectors(ctx, root, &addr_of, &call_func);
        changed |= fold_pointer_derefs(ctx, root);
    }
    changed
}

/// Walks `root` once, recording which nodes appear as the operand of `&`
/// and which appear as the callee of a `Call`, so the selector rewrite
/// below can tell a field read apart from an address-of or a method
/// invocation without relying on stored parent links (fixtures built
/// directly through `refactor-ast` do not always set them for every
/// intermediate node).
fn classify_roles(arena: &Arena, root: NodeId) -> (FxHashSet<NodeId>, FxHashSet<NodeId>) {
    let mut addr_of = FxHashSet::default();
    let mut call_func = FxHashSet::default();
    classify(arena, root, &mut addr_of, &mut call_func);
    (addr_of, call_func)
}

fn classify(arena: &Arena, node: NodeId, addr_of: &mut FxHashSet<NodeId>, call_func: &mut FxHashSet<NodeId>) {
    if node.is_none() {
        return;
    }
    if let Some(n) = arena.get(node) {
        match &n.kind {
            NodeKind::Expr(ExprKind::Unary { op: refactor_ast::UnaryOp::Amp, x }) => {
                addr_of.insert(*x);
                classify(arena, *x, addr_of, call_func);
                return;
            }
            NodeKind::Expr(ExprKind::Call { func, args }) => {
                call_func.insert(*func);
                classify(arena, *func, addr_of, call_func);
                for arg in args {
                    classify(arena, *arg, addr_of, call_func);
                }
                return;
            }
            _ => {}
        }
    }
    let children: Vec<NodeId> = match arena.get(node) {
        Some(n) => refactor_ast::walk::children(n).into_iter().collect(),
        None => return,
    };
    for child in children {
        classify(arena, child, addr_of, call_func);
    }
}

fn rewrite_field_selectors(
    ctx: &mut RewriteContext<'_>,
    root: NodeId,
    addr_of: &FxHashSet<NodeId>,
    call_func: &FxHashSet<NodeId>,
) -> bool {
    let mut candidates = Vec::new();
    visit_preorder(ctx.arena, root, &mut |id| {
        if let Some(ExprKind::Selector { x, sel }) = ctx.arena.get(id).and_then(|n| n.as_expr()) {
            candidates.push((id, *x, sel.clone()));
        }
    });

    let mut changed = false;
    for (node, base, field) in candidates {
        if call_func.contains(&node) {
            continue; // `m.Method(...)`: already the generated accessor, not a field.
        }
        let Some(base_ty) = ctx.types.type_of(base).cloned() else { continue };
        if !ctx.shapes.is_message(&base_ty) {
            continue;
        }
        let Some(field_kind) = ctx.shapes.field_kind(&base_ty, &field) else {
            continue; // not a tracked field; e.g. an ordinary method call.
        };

        if addr_of.contains(&node) {
            // Spec §4.3: refused below Red (silent no-op, direct field
            // access unchanged); escalates to Red only, tagged per the
            // field's own shape.
            if ctx.level == ConfidenceLevel::Red {
                let reason = if matches!(field_kind, FieldKind::OneOf { .. }) {
                    UnsafeReason::OneofFieldAccess
                } else {
                    UnsafeReason::MaybeSemanticChange
                };
                ctx.counters.record(reason);
                let mut trivia = ctx.arena.trivia(node);
                trivia.leading.push(refactor_common::do_not_submit(&format!(
                    "cannot take the address of generated field {field}: the opaque accessor has no addressable storage"
                )));
                ctx.arena.set_trivia(node, trivia);
            }
            continue;
        }

        let getter = ctx.arena.alloc(
            NodeKind::Expr(ExprKind::Selector { x: base, sel: format!("Get{field}") }),
            NodeId::NONE,
        );
        ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Call { func: getter, args: SmallVec::new() }));
        changed = true;
    }
    changed
}

/// `*m.F` → `m.GetF()`, once the inner selector has already become a
/// generated getter call.
fn fold_pointer_derefs(ctx: &mut RewriteContext<'_>, root: NodeId) -> bool {
    let mut stars = Vec::new();
    visit_preorder(ctx.arena, root, &mut |id| {
        if let Some(ExprKind::Star { x }) = ctx.arena.get(id).and_then(|n| n.as_expr()) {
            stars.push((id, *x));
        }
    });

    let mut changed = false;
    for (star, inner) in stars {
        let is_getter = matches!(
            ctx.arena.get(inner).and_then(|n| n.as_expr()),
            Some(ExprKind::Call { func, .. }) if matches!(
                ctx.arena.get(*func).and_then(|n| n.as_expr()),
                Some(ExprKind::Selector { sel, .. }) if sel.starts_with("Get")
            )
        );
        if is_getter {
            let inner_kind = ctx.arena.get(inner).expect("checked above").kind.clone();
            ctx.arena.set_kind(star, inner_kind);
            changed = true;
        }
    }
    changed
}
