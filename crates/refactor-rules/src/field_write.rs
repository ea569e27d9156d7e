//! Pass 4: field-write rewrite (spec §4.3 "Writes", §4.5 "One-of writes").
//!
//! `m.F = v` becomes `m.SetF(v)`; `m.F = nil` becomes `m.ClearF()`.
//! One-of wrapper-literal assignment (`m.Oneof = &T_Variant{Variant: v}`)
//! becomes `m.SetVariant(v)`; `m.Oneof = nil` becomes `m.ClearOneof()`.

use smallvec::SmallVec;

use refactor_ast::{CompositeElem, ExprKind, Lit, NodeId, NodeKind, StmtKind};
use refactor_common::{ConfidenceLevel, UnsafeReason};
use refactor_types::FieldKind;

use crate::context::RewriteContext;
use crate::walk::visit_preorder;

const SCALAR_WRAPPER_NAMES: [&str; 8] = ["Int32", "Int64", "Uint32", "Uint64", "Float32", "Float64", "Bool", "String"];

pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        let mut assigns = Vec::new();
        visit_preorder(ctx.arena, root, &mut |id| {
            if matches!(ctx.arena.get(id).and_then(|n| n.as_stmt()), Some(StmtKind::Assign { define: false, .. })) {
                assigns.push(id);
            }
        });
        for id in assigns {
            changed |= rewrite_one_assign(ctx, id);
        }
    }
    changed
}

fn rewrite_one_assign(ctx: &mut RewriteContext<'_>, assign_id: NodeId) -> bool {
    let Some(StmtKind::Assign { lhs, rhs, define: false }) = ctx.arena.get(assign_id).and_then(|n| n.as_stmt()).cloned() else {
        return false;
    };
    if lhs.len() != 1 || rhs.len() != 1 {
        return false;
    }
    let Some(ExprKind::Selector { x: base, sel: field }) = ctx.arena.get(lhs[0]).and_then(|n| n.as_expr()).cloned() else {
        return false;
    };
    let Some(base_ty) = ctx.types.type_of(base).cloned() else { return false };
    if !ctx.shapes.is_message(&base_ty) {
        return false;
    }
    let Some(kind) = ctx.shapes.field_kind(&base_ty, &field) else { return false };
    let value = rhs[0];

    if let FieldKind::OneOf { group } = kind {
        return rewrite_oneof_write(ctx, assign_id, base, &field, group, value);
    }

    if is_nil_lit(ctx, value) {
        let call = build_call(ctx, base, &format!("Clear{field}"), SmallVec::new());
        ctx.cursor_at(assign_id, NodeId::NONE).replace(NodeKind::Stmt(StmtKind::Expr(call)));
        return true;
    }

    // A `nil` byte slice and an empty one are distinct in the open API
    // (absent vs. present-but-empty); a bare `SetF(v)` would collapse
    // that distinction if `v` turns out to be nil at runtime, so guard it.
    if matches!(kind, FieldKind::Bytes) && value_may_be_nil(ctx, value) {
        let guard = ctx.arena.alloc(
            NodeKind::Expr(ExprKind::Binary { op: refactor_ast::BinaryOp::NotEq, x: value, y: nil_lit(ctx) }),
            NodeId::NONE,
        );
        let set_call = build_call(ctx, base, &format!("Set{field}"), SmallVec::from_vec(vec![value]));
        let clear_call = build_call(ctx, base, &format!("Clear{field}"), SmallVec::new());
        let then_stmt = ctx.arena.alloc(NodeKind::Stmt(StmtKind::Expr(set_call)), NodeId::NONE);
        let else_stmt = ctx.arena.alloc(NodeKind::Stmt(StmtKind::Expr(clear_call)), NodeId::NONE);
        ctx.cursor_at(assign_id, NodeId::NONE).replace(NodeKind::Stmt(StmtKind::If {
            init: None,
            cond: guard,
            then_body: vec![then_stmt],
            else_body: Some(vec![else_stmt]),
        }));
        return true;
    }

    let unwrapped = unwrap_scalar_wrapper(ctx, value);
    let call = build_call(ctx, base, &format!("Set{field}"), SmallVec::from_vec(vec![unwrapped]));
    ctx.cursor_at(assign_id, NodeId::NONE).replace(NodeKind::Stmt(StmtKind::Expr(call)));
    true
}

fn rewrite_oneof_write(
    ctx: &mut RewriteContext<'_>,
    assign_id: NodeId,
    base: NodeId,
    field: &str,
    group: refactor_types::OneofGroupId,
    value: NodeId,
) -> bool {
    if is_nil_lit(ctx, value) {
        let call = build_call(ctx, base, &format!("Clear{field}"), SmallVec::new());
        ctx.cursor_at(assign_id, NodeId::NONE).replace(NodeKind::Stmt(StmtKind::Expr(call)));
        return true;
    }

    let Some((variant, inner_value)) = extract_wrapper_literal(ctx, &base, group, value) else {
        return false; // not the `&T_Variant{...}` shape the generator produces; leave untouched.
    };
    let uncertain_nilness = matches!(ctx.arena.get(inner_value).and_then(|n| n.as_expr()), Some(ExprKind::Ident(_)));
    if uncertain_nilness && ctx.level < ConfidenceLevel::Yellow {
        // Spec §4.5/§4.8: this shape is unsafe-tagged `MaybeNilPointerDeref`,
        // so it is a Yellow/Red rewrite only; Green leaves it untouched.
        return false;
    }
    let call = build_call(ctx, base, &format!("Set{variant}"), SmallVec::from_vec(vec![inner_value]));
    if uncertain_nilness {
        ctx.cursor_at(assign_id, NodeId::NONE)
            .replace_unsafe(NodeKind::Stmt(StmtKind::Expr(call)), UnsafeReason::MaybeNilPointerDeref);
    } else {
        ctx.cursor_at(assign_id, NodeId::NONE).replace(NodeKind::Stmt(StmtKind::Expr(call)));
    }
    true
}

/// `&T_Variant{InnerField: v}` → `(Variant, v)`, verified against the
/// descriptor oracle's declared variants for this one-of group.
fn extract_wrapper_literal(
    ctx: &mut RewriteContext<'_>,
    base: &NodeId,
    group: refactor_types::OneofGroupId,
    value: NodeId,
) -> Option<(String, NodeId)> {
    let ExprKind::Unary { op: refactor_ast::UnaryOp::Amp, x: lit } = ctx.arena.get(value)?.as_expr()?.clone() else {
        return None;
    };
    let ExprKind::CompositeLit { elems, .. } = ctx.arena.get(lit)?.as_expr()?.clone() else {
        return None;
    };
    let [CompositeElem { key: Some(inner_field), value: inner_value }] = elems.as_slice() else {
        return None;
    };

    let base_ty = ctx.types.type_of(*base)?.clone();
    let variants = ctx.shapes.oneof_variants(&base_ty, group);
    let variant = variants.iter().find(|v| &v.inner_field == inner_field)?;
    Some((variant.variant.clone(), *inner_value))
}

fn unwrap_scalar_wrapper(ctx: &mut RewriteContext<'_>, node: NodeId) -> NodeId {
    let Some(ExprKind::Call { func, args }) = ctx.arena.get(node).and_then(|n| n.as_expr()).cloned() else {
        return node;
    };
    if args.len() != 1 {
        return node;
    }
    let Some(ExprKind::Selector { x, sel }) = ctx.arena.get(func).and_then(|n| n.as_expr()).cloned() else {
        return node;
    };
    let is_proto_pkg = matches!(ctx.arena.get(x).and_then(|n| n.as_expr()), Some(ExprKind::Ident(name)) if name == "proto");
    if is_proto_pkg && SCALAR_WRAPPER_NAMES.contains(&sel.as_str()) { args[0] } else { node }
}

fn is_nil_lit(ctx: &RewriteContext<'_>, node: NodeId) -> bool {
    matches!(ctx.arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::Lit(Lit::Nil)))
}

/// Whether `node` could evaluate to `nil` at runtime: literals and
/// composite literals never do, anything else (an identifier, a call, a
/// selector) might.
fn value_may_be_nil(ctx: &RewriteContext<'_>, node: NodeId) -> bool {
    !matches!(
        ctx.arena.get(node).and_then(|n| n.as_expr()),
        Some(ExprKind::Lit(_)) | Some(ExprKind::CompositeLit { .. })
    )
}

fn nil_lit(ctx: &mut RewriteContext<'_>) -> NodeId {
    ctx.arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Nil)), NodeId::NONE)
}

fn build_call(ctx: &mut RewriteContext<'_>, receiver: NodeId, method: &str, args: SmallVec<[NodeId; 4]>) -> NodeId {
    let sel = ctx.arena.alloc(NodeKind::Expr(ExprKind::Selector { x: receiver, sel: method.to_string() }), NodeId::NONE);
    ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: sel, args }), NodeId::NONE)
}
