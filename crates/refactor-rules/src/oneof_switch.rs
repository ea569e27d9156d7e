//! Pass 2: one-of type-switch rewrite (spec §4.5 "Type-switch rewrite").
//!
//! `switch v := m.GetOneofField().(type) { case *T_Foo: ... }` becomes
//! `switch m.WhichOneofField() { case T_Foo_case: ... }`, with the case
//! bodies rewritten so references to the bound variable go through the
//! generated getter instead of the wrapper struct's field.

use smallvec::SmallVec;

use refactor_ast::{Arena, ExprKind, Lit, NodeId, NodeKind, StmtKind, SwitchCase, TypeSwitchCase};
use refactor_common::{ConfidenceLevel, UnsafeReason, do_not_submit};

use crate::context::RewriteContext;
use crate::walk::visit_preorder;

const RESERVED_METHOD_NAMES: [&str; 4] = ["Reset", "String", "ProtoMessage", "Descriptor"];

pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        let mut switch_ids = Vec::new();
        visit_preorder(ctx.arena, root, &mut |id| {
            if matches!(ctx.arena.get(id).and_then(|n| n.as_stmt()), Some(StmtKind::TypeSwitch { .. })) {
                switch_ids.push(id);
            }
        });
        for id in switch_ids {
            changed |= rewrite_one_switch(ctx, id);
        }
    }
    changed
}

fn rewrite_one_switch(ctx: &mut RewriteContext<'_>, switch_id: NodeId) -> bool {
    if has_do_not_submit(ctx.arena, switch_id) {
        return false; // already refused once; idempotent no-op (spec §8).
    }

    let Some(StmtKind::TypeSwitch { init, bind, subject, cases }) = ctx.arena.get(switch_id).and_then(|n| n.as_stmt()).cloned()
    else {
        return false;
    };
    let Some(ExprKind::TypeSwitchGuard { x: inner }) = ctx.arena.get(subject).and_then(|n| n.as_expr()).cloned() else {
        return false;
    };
    let Some((msg_expr, oneof_field)) = extract_oneof_access(ctx.arena, inner) else {
        return false;
    };
    let Some(msg_ty) = ctx.types.type_of(msg_expr).cloned() else {
        return false; // missing type info: analytics records this centrally, skip here.
    };
    let Some(group) = ctx.shapes.oneof_group(&msg_ty, &oneof_field) else {
        return false;
    };
    let variants = ctx.shapes.oneof_variants(&msg_ty, group);
    let msg_short = msg_ty.as_named().map(|n| n.short_name().to_string()).unwrap_or_default();
    let siblings = ctx.shapes.field_names(&msg_ty);

    let is_free = refactor_cursor::is_side_effect_free(ctx.arena, ctx.shapes, ctx.types, msg_expr);
    if init.is_some() && !is_free {
        ctx.counters.record(UnsafeReason::IncompleteRewrite);
        let mut trivia = ctx.arena.trivia(switch_id);
        trivia.leading.push(do_not_submit("one-of type-switch already has an init statement and its subject has side effects"));
        ctx.arena.set_trivia(switch_id, trivia);
        return true;
    }

    let (new_init, receiver) = if is_free {
        (init, msg_expr)
    } else {
        let helper = ctx.helper_names.allocate(ctx.scopes, ctx.package_scope, "xmsg");
        let helper_ident = ctx.arena.alloc(NodeKind::Expr(ExprKind::Ident(helper.clone())), NodeId::NONE);
        let rhs = clone_expr(ctx.arena, msg_expr);
        ctx.types.set_type(helper_ident, msg_ty.clone());
        ctx.types.set_type(rhs, msg_ty.clone());
        let assign = ctx.arena.alloc(
            NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![helper_ident]), rhs: SmallVec::from_vec(vec![rhs]), define: true }),
            NodeId::NONE,
        );
        (Some(assign), helper_ident)
    };

    let which_sel = ctx.arena.alloc(
        NodeKind::Expr(ExprKind::Selector { x: receiver, sel: format!("Which{oneof_field}") }),
        NodeId::NONE,
    );
    let which_call = ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: which_sel, args: SmallVec::new() }), NodeId::NONE);
    ctx.types.set_type(which_call, refactor_types::SemType::Scalar(refactor_types::ScalarKind::Int32));

    let mut new_cases = Vec::with_capacity(cases.len());
    for case in &cases {
        new_cases.push(rewrite_one_case(ctx, case, &bind, receiver, &variants, &msg_short, &siblings, &oneof_field));
    }

    ctx.arena.set_kind(switch_id, NodeKind::Stmt(StmtKind::Switch { init: new_init, subject: which_call, cases: new_cases }));
    true
}

fn has_do_not_submit(arena: &Arena, node: NodeId) -> bool {
    arena.trivia(node).leading.iter().any(|t| matches!(t, refactor_common::Trivia::LineComment { text, .. } if text.contains("DO_NOT_SUBMIT")))
}

/// `m.OneofField` or `m.GetOneofField()` → `(m, "OneofField")`.
fn extract_oneof_access(arena: &Arena, node: NodeId) -> Option<(NodeId, String)> {
    match arena.get(node)?.as_expr()? {
        ExprKind::Selector { x, sel } => Some((*x, sel.clone())),
        ExprKind::Call { func, args } if args.is_empty() => {
            let ExprKind::Selector { x, sel } = arena.get(*func)?.as_expr()? else { return None };
            sel.strip_prefix("Get").map(|field| (*x, field.to_string()))
        }
        _ => None,
    }
}

fn sentinel_name(msg_short: &str, variant: &str, siblings: &[String]) -> String {
    let collides = RESERVED_METHOD_NAMES.contains(&variant) || siblings.iter().any(|s| s == variant);
    if collides {
        format!("{msg_short}_{variant}__case")
    } else {
        format!("{msg_short}_{variant}_case")
    }
}

fn rewrite_one_case(
    ctx: &mut RewriteContext<'_>,
    case: &TypeSwitchCase,
    bind: &Option<String>,
    receiver: NodeId,
    variants: &[refactor_types::VariantInfo],
    msg_short: &str,
    siblings: &[String],
    oneof_field: &str,
) -> SwitchCase {
    if case.is_default() {
        let body = case.body.clone();
        if let Some(name) = bind {
            for &stmt in &body {
                rewrite_percent_t_args(ctx.arena, stmt, name, receiver, oneof_field);
            }
        }
        return SwitchCase { labels: Vec::new(), body };
    }

    let mut labels = Vec::with_capacity(case.type_names.len());
    let mut matched_inner_field = None;
    for type_name in &case.type_names {
        let wrapper_short = type_name.trim_start_matches('*');
        let Some(variant) = variants.iter().find(|v| format!("{msg_short}_{}", v.variant) == wrapper_short) else {
            labels.push(format!("{wrapper_short}_case"));
            continue;
        };
        labels.push(sentinel_name(msg_short, &variant.variant, siblings));
        if case.type_names.len() == 1 {
            matched_inner_field = Some(variant.inner_field.clone());
        }
    }

    let mut body = case.body.clone();
    if let (Some(bind_name), Some(inner_field)) = (bind, matched_inner_field) {
        let shadowed = body_rebinds_name(ctx.arena, &body, bind_name);
        if !shadowed || ctx.level == ConfidenceLevel::Red {
            for &stmt in &body {
                rewrite_oneof_bound_selectors(ctx.arena, stmt, bind_name, &inner_field, receiver);
            }
            if shadowed {
                ctx.counters.record(UnsafeReason::MaybeSemanticChange);
            }
        }
    }

    SwitchCase { labels, body }
}

/// Replaces `<bind>.<inner_field>` selectors with
/// `<receiver>.Get<InnerField>()` throughout `root`.
fn rewrite_oneof_bound_selectors(arena: &mut Arena, root: NodeId, bind: &str, inner_field: &str, receiver: NodeId) {
    if root.is_none() {
        return;
    }
    if let Some(ExprKind::Selector { x, sel }) = arena.get(root).and_then(|n| n.as_expr()).cloned()
        && sel == inner_field
        && matches!(arena.get(x).and_then(|n| n.as_expr()), Some(ExprKind::Ident(n)) if n == bind)
    {
        let receiver_clone = clone_expr(arena, receiver);
        let getter = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: receiver_clone, sel: format!("Get{inner_field}") }), NodeId::NONE);
        arena.set_kind(root, NodeKind::Expr(ExprKind::Call { func: getter, args: SmallVec::new() }));
        return;
    }
    let children: Vec<NodeId> = match arena.get(root) {
        Some(node) => refactor_ast::walk::children(node).into_iter().collect(),
        None => return,
    };
    for child in children {
        rewrite_oneof_bound_selectors(arena, child, bind, inner_field, receiver);
    }
}

/// `fmt.Sprintf("... %T ...", v)` → `fmt.Sprintf("... %v ...", <which-call>)`
/// (spec §4.5: "`%T`-style formatting arguments ... with `%T` replaced
/// by `%v`"). Preserved verbatim per spec §9's open question: this
/// printf-detection heuristic is not meant to be refined further.
fn rewrite_percent_t_args(arena: &mut Arena, root: NodeId, bind: &str, receiver: NodeId, oneof_field: &str) {
    if root.is_none() {
        return;
    }
    if let Some(ExprKind::Call { args, .. }) = arena.get(root).and_then(|n| n.as_expr()).cloned() {
        let mut fmt_arg_index = None;
        for (i, arg) in args.iter().enumerate() {
            if let Some(ExprKind::Lit(Lit::Str(text))) = arena.get(*arg).and_then(|n| n.as_expr()) {
                if text.contains("%T") {
                    fmt_arg_index = Some(i);
                }
            }
        }
        if let Some(fmt_idx) = fmt_arg_index {
            let fmt_node = args[fmt_idx];
            if let Some(ExprKind::Lit(Lit::Str(text))) = arena.get(fmt_node).and_then(|n| n.as_expr()).cloned() {
                arena.set_kind(fmt_node, NodeKind::Expr(ExprKind::Lit(Lit::Str(text.replace("%T", "%v")))));
            }
            for arg in args.iter().skip(fmt_idx + 1) {
                if matches!(arena.get(*arg).and_then(|n| n.as_expr()), Some(ExprKind::Ident(n)) if n == bind) {
                    let recv_clone = clone_expr(arena, receiver);
                    let which_sel = arena.alloc(
                        NodeKind::Expr(ExprKind::Selector { x: recv_clone, sel: format!("Which{oneof_field}") }),
                        NodeId::NONE,
                    );
                    let which_call = arena.alloc(NodeKind::Expr(ExprKind::Call { func: which_sel, args: SmallVec::new() }), NodeId::NONE);
                    arena.set_kind(*arg, arena.get(which_call).unwrap().kind.clone());
                }
            }
        }
    }
    let children: Vec<NodeId> = match arena.get(root) {
        Some(node) => refactor_ast::walk::children(node).into_iter().collect(),
        None => return,
    };
    for child in children {
        rewrite_percent_t_args(arena, child, bind, receiver, oneof_field);
    }
}

fn body_rebinds_name(arena: &Arena, body: &[NodeId], name: &str) -> bool {
    let mut found = false;
    for &stmt in body {
        visit_preorder(arena, stmt, &mut |id| {
            if found {
                return;
            }
            if let Some(StmtKind::Assign { lhs, define: true, .. }) = arena.get(id).and_then(|n| n.as_stmt()) {
                if lhs.iter().any(|l| matches!(arena.get(*l).and_then(|n| n.as_expr()), Some(ExprKind::Ident(n)) if n == name)) {
                    found = true;
                }
            }
        });
    }
    found
}

fn clone_expr(arena: &mut Arena, node: NodeId) -> NodeId {
    if node.is_none() {
        return NodeId::NONE;
    }
    let kind = arena.get(node).map(|n| n.kind.clone()).unwrap_or(NodeKind::Expr(ExprKind::Lit(Lit::Nil)));
    let cloned = match kind {
        NodeKind::Expr(ExprKind::Selector { x, sel }) => NodeKind::Expr(ExprKind::Selector { x: clone_expr(arena, x), sel }),
        NodeKind::Expr(ExprKind::Star { x }) => NodeKind::Expr(ExprKind::Star { x: clone_expr(arena, x) }),
        NodeKind::Expr(ExprKind::Call { func, args }) => {
            let func = clone_expr(arena, func);
            let args = args.iter().map(|a| clone_expr(arena, *a)).collect();
            NodeKind::Expr(ExprKind::Call { func, args })
        }
        other => other,
    };
    arena.alloc(cloned, NodeId::NONE)
}
