//! Pass 6: avoid-redundant-haser fusion (spec §4.7).
//!
//! By the time this pass runs, passes 1–4 have already turned a raw
//! `if m.F != nil { dst.F = m.F }` into `if m.HasF() { dst.SetF(m.GetF()) }`.
//! That nested presence guard is redundant whenever nothing else in the
//! same block could change whether `m.F` is present — in that case the
//! guard is dropped and the call runs unconditionally. When something in
//! the block *could* change presence (a write to `m.F`, a call to
//! `SetF`, or a rebinding of `m` itself), fusion is unsafe; the pass
//! instead makes the implicit "absent -> untouched" branch explicit by
//! adding an `else { dst.ClearF() }`.

use refactor_ast::{Arena, ExprKind, NodeId, NodeKind, StmtKind};
use refactor_cursor::StmtListLoc;

use crate::context::RewriteContext;
use crate::walk::visit_preorder;

pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        changed |= process_root(ctx, root);
    }
    changed
}

fn process_root(ctx: &mut RewriteContext<'_>, root: NodeId) -> bool {
    match ctx.arena.get(root).map(|n| n.kind.clone()) {
        Some(NodeKind::Decl(refactor_ast::DeclKind::Func { .. })) => process_list(ctx, StmtListLoc::FuncBody(root)),
        Some(NodeKind::Stmt(StmtKind::Block(_))) => process_list(ctx, StmtListLoc::Block(root)),
        _ => recurse_into_nested_lists(ctx, root),
    }
}

fn process_list(ctx: &mut RewriteContext<'_>, loc: StmtListLoc) -> bool {
    let Some(stmts) = refactor_cursor::stmt_list_mut(ctx.arena, loc).map(|v| v.clone()) else { return false };

    let mut changed = false;
    for &stmt in &stmts {
        changed |= recurse_into_nested_lists(ctx, stmt);
    }
    for &stmt in &stmts {
        changed |= try_fuse_one(ctx, stmt, &stmts);
    }
    changed
}

fn recurse_into_nested_lists(ctx: &mut RewriteContext<'_>, stmt: NodeId) -> bool {
    match ctx.arena.get(stmt).map(|n| n.kind.clone()) {
        Some(NodeKind::Stmt(StmtKind::Block(_))) => process_list(ctx, StmtListLoc::Block(stmt)),
        Some(NodeKind::Stmt(StmtKind::If { else_body, .. })) => {
            let mut c = process_list(ctx, StmtListLoc::IfThen(stmt));
            if else_body.is_some() {
                c |= process_list(ctx, StmtListLoc::IfElse(stmt));
            }
            c
        }
        Some(NodeKind::Stmt(StmtKind::TypeSwitch { cases, .. })) => {
            let mut c = false;
            for i in 0..cases.len() {
                c |= process_list(ctx, StmtListLoc::CaseBody(stmt, i));
            }
            c
        }
        Some(NodeKind::Stmt(StmtKind::Switch { cases, .. })) => {
            let mut c = false;
            for i in 0..cases.len() {
                c |= process_list(ctx, StmtListLoc::SwitchCaseBody(stmt, i));
            }
            c
        }
        _ => false,
    }
}

/// Shape recognized by this pass: `if <base>.Has<Field>() { <single stmt> }`
/// with no `init` and no `else`, whose lone body statement is
/// `dst.Set<Field>(<base'>.Get<Field>())` with `<base'>` the same
/// receiver as the guard.
struct Guard {
    base_name: String,
    field: String,
    call_stmt: NodeId,
    dst: NodeId,
}

fn try_fuse_one(ctx: &mut RewriteContext<'_>, if_node: NodeId, siblings: &[NodeId]) -> bool {
    let Some(guard) = match_guard(ctx.arena, if_node) else { return false };

    if block_may_change_presence(ctx.arena, siblings, &guard.base_name, &guard.field) {
        add_explicit_clear_branch(ctx, if_node, &guard);
    } else {
        drop_redundant_guard(ctx, if_node, guard.call_stmt);
    }
    true
}

fn match_guard(arena: &Arena, if_node: NodeId) -> Option<Guard> {
    let Some(NodeKind::Stmt(StmtKind::If { init: None, cond, then_body, else_body: None })) =
        arena.get(if_node).map(|n| n.kind.clone())
    else {
        return None;
    };
    let Some(ExprKind::Call { func, args }) = arena.get(cond).and_then(|n| n.as_expr()) else { return None };
    if !args.is_empty() {
        return None;
    }
    let Some(ExprKind::Selector { x: base, sel }) = arena.get(*func).and_then(|n| n.as_expr()) else { return None };
    let field = sel.strip_prefix("Has")?.to_string();
    let ExprKind::Ident(base_name) = arena.get(*base).and_then(|n| n.as_expr())?.clone() else { return None };

    let [call_stmt] = then_body.as_slice() else { return None };
    let Some(StmtKind::Expr(call)) = arena.get(*call_stmt).and_then(|n| n.as_stmt()) else { return None };
    let Some(ExprKind::Call { func: set_func, args: set_args }) = arena.get(*call).and_then(|n| n.as_expr()) else { return None };
    let [get_call] = set_args.as_slice() else { return None };
    let Some(ExprKind::Selector { x: dst, sel: set_sel }) = arena.get(*set_func).and_then(|n| n.as_expr()) else { return None };
    if *set_sel != format!("Set{field}") {
        return None;
    }
    let Some(ExprKind::Call { func: get_func, args: get_args }) = arena.get(*get_call).and_then(|n| n.as_expr()) else {
        return None;
    };
    if !get_args.is_empty() {
        return None;
    }
    let Some(ExprKind::Selector { x: get_base, sel: get_sel }) = arena.get(*get_func).and_then(|n| n.as_expr()) else {
        return None;
    };
    if *get_sel != format!("Get{field}") {
        return None;
    }
    if !is_ident(arena, *get_base, &base_name) {
        return None;
    }

    Some(Guard { base_name, field, call_stmt: *call_stmt, dst: *dst })
}

fn is_ident(arena: &Arena, node: NodeId, name: &str) -> bool {
    matches!(arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::Ident(n)) if n == name)
}

/// Whether anything among `siblings` could change whether `base.field` is
/// present: a direct assignment to `base.field`, a call to `base.SetField`,
/// or a statement that rebinds `base` itself (spec §4.7).
fn block_may_change_presence(arena: &Arena, siblings: &[NodeId], base_name: &str, field: &str) -> bool {
    let setter = format!("Set{field}");
    let mut found = false;
    for &stmt in siblings {
        if found {
            break;
        }
        visit_preorder(arena, stmt, &mut |id| {
            if found {
                return;
            }
            match arena.get(id).map(|n| &n.kind) {
                Some(NodeKind::Stmt(StmtKind::Assign { lhs, define, .. })) => {
                    if lhs.iter().any(|l| is_ident(arena, *l, base_name)) {
                        found = true; // shadows or reassigns `base` itself
                    }
                    if *define {
                        return;
                    }
                    for &l in lhs {
                        if let Some(ExprKind::Selector { x, sel }) = arena.get(l).and_then(|n| n.as_expr())
                            && sel == field
                            && is_ident(arena, *x, base_name)
                        {
                            found = true;
                        }
                    }
                }
                Some(NodeKind::Expr(ExprKind::Call { func, .. })) => {
                    if let Some(ExprKind::Selector { x, sel }) = arena.get(*func).and_then(|n| n.as_expr())
                        && *sel == setter
                        && is_ident(arena, *x, base_name)
                    {
                        found = true;
                    }
                }
                _ => {}
            }
        });
    }
    found
}

/// Safe case: replace the whole `if` with its lone fused statement,
/// running unconditionally.
fn drop_redundant_guard(ctx: &mut RewriteContext<'_>, if_node: NodeId, call_stmt: NodeId) {
    let kind = ctx.arena.get(call_stmt).expect("matched above").kind.clone();
    let trivia = ctx.arena.take_trivia(if_node);
    let inner_trivia = ctx.arena.take_trivia(call_stmt);
    let merged = trivia.merge(inner_trivia);
    ctx.arena.set_kind(if_node, kind);
    ctx.arena.set_trivia(if_node, merged);
}

/// Unsafe case: keep the guard, but make the absent branch explicit by
/// adding `else { dst.ClearField() }`.
fn add_explicit_clear_branch(ctx: &mut RewriteContext<'_>, if_node: NodeId, guard: &Guard) {
    let Some(NodeKind::Stmt(StmtKind::If { init, cond, then_body, .. })) = ctx.arena.get(if_node).map(|n| n.kind.clone())
    else {
        return;
    };
    let clear_sel = ctx.arena.alloc(
        NodeKind::Expr(ExprKind::Selector { x: guard.dst, sel: format!("Clear{}", guard.field) }),
        NodeId::NONE,
    );
    let clear_call = ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: clear_sel, args: Default::default() }), NodeId::NONE);
    let clear_stmt = ctx.arena.alloc(NodeKind::Stmt(StmtKind::Expr(clear_call)), NodeId::NONE);
    ctx.arena.set_kind(
        if_node,
        NodeKind::Stmt(StmtKind::If { init, cond, then_body, else_body: Some(vec![clear_stmt]) }),
    );
}
