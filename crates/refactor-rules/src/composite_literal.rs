//! Pass 5: composite-literal rewrite (spec §4.4 "setter mode vs. builder
//! mode").
//!
//! Every message composite literal `T{F1:v1, ..., Fk:vk}` is rewritten
//! either into a lifted helper plus a sequence of `Set` calls (setter
//! mode) or into `T_builder{...}.Build()` (builder mode). Mode is chosen
//! per literal from the eligibility inputs and the literal's own nesting
//! (spec §4.4's five-way `OR`). Unlike the other passes, this one needs
//! to splice new statements into whichever list contains the use site,
//! so it walks statement lists directly through `refactor_cursor`'s
//! `StmtListLoc` locator rather than going through `Cursor::replace`.

use smallvec::SmallVec;

use refactor_ast::{Arena, CompositeElem, ExprKind, NodeId, NodeKind, StmtKind, UnaryOp};
use refactor_common::limits::{BUILDER_MODE_MESSAGE_COUNT_THRESHOLD, BUILDER_MODE_NESTING_THRESHOLD};
use refactor_common::{ConfidenceLevel, UnsafeReason};
use refactor_cursor::{StmtListLoc, stmt_list_mut};
use refactor_types::{BuilderUseType, FieldKind, ScalarKind, SemType};

use crate::context::RewriteContext;

const SCALAR_WRAPPER_NAMES: [(ScalarKind, &str); 8] = [
    (ScalarKind::Int32, "Int32"),
    (ScalarKind::Int64, "Int64"),
    (ScalarKind::Uint32, "Uint32"),
    (ScalarKind::Uint64, "Uint64"),
    (ScalarKind::Float, "Float32"),
    (ScalarKind::Double, "Float64"),
    (ScalarKind::Bool, "Bool"),
    (ScalarKind::String, "String"),
];

fn scalar_wrapper_name(kind: ScalarKind) -> &'static str {
    SCALAR_WRAPPER_NAMES.iter().find(|(k, _)| *k == kind).map(|(_, n)| *n).unwrap_or("Int32")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Setter,
    Builder,
}

pub fn run(ctx: &mut RewriteContext<'_>, roots: &[NodeId]) -> bool {
    let mut changed = false;
    for &root in roots {
        changed |= process_root(ctx, root);
    }
    changed
}

/// Entry per root. Roots that themselves own a statement list (a
/// function body, or a bare block used directly in a fixture test) are
/// processed as that list; other shapes get a best-effort in-place
/// rewrite with no ability to hoist a helper declaration before them.
fn process_root(ctx: &mut RewriteContext<'_>, root: NodeId) -> bool {
    match ctx.arena.get(root).map(|n| n.kind.clone()) {
        Some(NodeKind::Decl(refactor_ast::DeclKind::Func { .. })) => process_list(ctx, StmtListLoc::FuncBody(root)),
        Some(NodeKind::Stmt(StmtKind::Block(_))) => process_list(ctx, StmtListLoc::Block(root)),
        _ => recurse_into_nested_lists(ctx, root),
    }
}

/// Process one statement list: recurse into any nested lists each
/// statement owns, then rewrite composite literals reachable from that
/// statement's own expressions, splicing any hoisted helper
/// declarations immediately before it in the same list.
fn process_list(ctx: &mut RewriteContext<'_>, loc: StmtListLoc) -> bool {
    let Some(stmts) = stmt_list_mut(ctx.arena, loc).map(|v| v.clone()) else { return false };
    let mut changed = false;
    let mut new_stmts = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        changed |= recurse_into_nested_lists(ctx, stmt);
        let mut prelude = Vec::new();
        changed |= rewrite_stmt_literals(ctx, stmt, &mut prelude);
        new_stmts.extend(prelude);
        new_stmts.push(stmt);
    }
    if changed
        && let Some(slot) = stmt_list_mut(ctx.arena, loc)
    {
        *slot = new_stmts;
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

/// Rewrite composite literals reachable from `stmt`'s own expression
/// fields (not crossing into a nested statement list, which the caller
/// already recursed into separately).
fn rewrite_stmt_literals(ctx: &mut RewriteContext<'_>, stmt: NodeId, prelude: &mut Vec<NodeId>) -> bool {
    match ctx.arena.get(stmt).map(|n| n.kind.clone()) {
        Some(NodeKind::Stmt(StmtKind::Expr(x))) => {
            let (new_x, pre) = process_expr(ctx, x, 0);
            let changed = new_x != x || !pre.is_empty();
            prelude.extend(pre);
            if changed {
                ctx.arena.set_kind(stmt, NodeKind::Stmt(StmtKind::Expr(new_x)));
            }
            changed
        }
        Some(NodeKind::Stmt(StmtKind::Assign { lhs, rhs, define })) => {
            let mut changed = false;
            let mut new_rhs = SmallVec::new();
            for r in rhs {
                let (nr, pre) = process_expr(ctx, r, 0);
                changed |= nr != r || !pre.is_empty();
                prelude.extend(pre);
                new_rhs.push(nr);
            }
            if changed {
                ctx.arena.set_kind(stmt, NodeKind::Stmt(StmtKind::Assign { lhs, rhs: new_rhs, define }));
            }
            changed
        }
        Some(NodeKind::Stmt(StmtKind::Return(vals))) => {
            let mut changed = false;
            let mut new_vals = SmallVec::new();
            for v in vals {
                let (nv, pre) = process_expr(ctx, v, 0);
                changed |= nv != v || !pre.is_empty();
                prelude.extend(pre);
                new_vals.push(nv);
            }
            if changed {
                ctx.arena.set_kind(stmt, NodeKind::Stmt(StmtKind::Return(new_vals)));
            }
            changed
        }
        Some(NodeKind::Stmt(StmtKind::If { init, cond, then_body, else_body })) => {
            let (new_cond, pre) = process_expr(ctx, cond, 0);
            let changed = new_cond != cond || !pre.is_empty();
            prelude.extend(pre);
            if changed {
                ctx.arena.set_kind(stmt, NodeKind::Stmt(StmtKind::If { init, cond: new_cond, then_body, else_body }));
            }
            changed
        }
        _ => false,
    }
}

/// Generic recursive rewrite of an expression subtree: looks for
/// message composite literals anywhere inside (through selectors, call
/// args, binary operands, slice/map literal elements...) and lowers
/// each one found. Returns the node id to use at this position (unchanged
/// unless a literal right here got hoisted to a helper) plus any
/// statements that must run before the enclosing statement.
fn process_expr(ctx: &mut RewriteContext<'_>, node: NodeId, depth: usize) -> (NodeId, Vec<NodeId>) {
    if node.is_none() {
        return (node, Vec::new());
    }
    let Some(kind) = ctx.arena.get(node).map(|n| n.kind.clone()) else {
        return (node, Vec::new());
    };
    match kind {
        NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x }) => {
            if is_composite_lit(ctx.arena, x)
                && let Some(result) = try_lower_message_literal(ctx, node, x, depth)
            {
                return result;
            }
            let (new_x, pre) = process_expr(ctx, x, depth);
            if new_x != x {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: new_x }));
            }
            (node, pre)
        }
        NodeKind::Expr(ExprKind::Unary { op, x }) => {
            let (new_x, pre) = process_expr(ctx, x, depth);
            if new_x != x {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Unary { op, x: new_x }));
            }
            (node, pre)
        }
        NodeKind::Expr(ExprKind::CompositeLit { .. }) => {
            if let Some(result) = try_lower_message_literal(ctx, node, node, depth) {
                return result;
            }
            let Some(NodeKind::Expr(ExprKind::CompositeLit { ty, elems })) = ctx.arena.get(node).map(|n| n.kind.clone())
            else {
                return (node, Vec::new());
            };
            let mut changed = false;
            let mut pre_all = Vec::new();
            let mut new_elems = Vec::with_capacity(elems.len());
            for e in elems {
                let (nv, pre) = process_expr(ctx, e.value, depth);
                changed |= nv != e.value || !pre.is_empty();
                pre_all.extend(pre);
                new_elems.push(CompositeElem { key: e.key.clone(), value: nv });
            }
            if changed {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::CompositeLit { ty, elems: new_elems }));
            }
            (node, pre_all)
        }
        NodeKind::Expr(ExprKind::Call { func, args }) => {
            let (new_func, mut pre_all) = process_expr(ctx, func, depth);
            let mut changed = new_func != func;
            let mut new_args = SmallVec::new();
            for a in args {
                let (na, pre) = process_expr(ctx, a, depth);
                changed |= na != a || !pre.is_empty();
                pre_all.extend(pre);
                new_args.push(na);
            }
            if changed {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Call { func: new_func, args: new_args }));
            }
            (node, pre_all)
        }
        NodeKind::Expr(ExprKind::Selector { x, sel }) => {
            let (nx, pre) = process_expr(ctx, x, depth);
            if nx != x {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Selector { x: nx, sel }));
            }
            (node, pre)
        }
        NodeKind::Expr(ExprKind::Star { x }) => {
            let (nx, pre) = process_expr(ctx, x, depth);
            if nx != x {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Star { x: nx }));
            }
            (node, pre)
        }
        NodeKind::Expr(ExprKind::Binary { op, x, y }) => {
            let (nx, mut pre) = process_expr(ctx, x, depth);
            let (ny, pre2) = process_expr(ctx, y, depth);
            pre.extend(pre2);
            if nx != x || ny != y {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Binary { op, x: nx, y: ny }));
            }
            (node, pre)
        }
        NodeKind::Expr(ExprKind::Index { x, index }) => {
            let (nx, mut pre) = process_expr(ctx, x, depth);
            let (ni, pre2) = process_expr(ctx, index, depth);
            pre.extend(pre2);
            if nx != x || ni != index {
                ctx.arena.set_kind(node, NodeKind::Expr(ExprKind::Index { x: nx, index: ni }));
            }
            (node, pre)
        }
        _ => (node, Vec::new()),
    }
}

fn is_composite_lit(arena: &Arena, node: NodeId) -> bool {
    matches!(arena.get(node).and_then(|n| n.as_expr()), Some(ExprKind::CompositeLit { .. }))
}

/// `replace_node` is the position a rewritten occurrence should be
/// substituted into (the `&T{...}` node when present, else the bare
/// literal). `lit_node` is the `CompositeLit` itself. Returns `None`
/// when `lit_node` is not a tracked message literal (caller falls back
/// to generic recursion so literals nested *inside* this one, e.g. a
/// slice-of-messages container, still get visited).
fn try_lower_message_literal(
    ctx: &mut RewriteContext<'_>,
    replace_node: NodeId,
    lit_node: NodeId,
    depth: usize,
) -> Option<(NodeId, Vec<NodeId>)> {
    let lit_ty = ctx.types.type_of(replace_node).or_else(|| ctx.types.type_of(lit_node))?.clone();
    if !ctx.shapes.is_message(&lit_ty) {
        return None;
    }
    let Some(NodeKind::Expr(ExprKind::CompositeLit { elems, .. })) = ctx.arena.get(lit_node).map(|n| n.kind.clone())
    else {
        return None;
    };

    // Empty literals are zero values; spec §4.4 leaves them untouched.
    if elems.is_empty() {
        return Some((replace_node, Vec::new()));
    }

    let message_count = count_transitive_message_literals(ctx, lit_node);
    let mode = select_mode(ctx, &lit_ty, depth, message_count);

    match mode {
        Mode::Builder => {
            let built = build_builder_literal(ctx, &lit_ty, &elems, depth);
            Some((built, Vec::new()))
        }
        Mode::Setter => Some(lower_setter_mode(ctx, lit_node, &lit_ty, &elems, depth)),
    }
}

fn select_mode(ctx: &RewriteContext<'_>, ty: &SemType, depth: usize, message_count: usize) -> Mode {
    let Some(name) = ty.as_named() else { return Mode::Setter };
    if ctx.eligibility.builder_use == BuilderUseType::BuildersEverywhere {
        return Mode::Builder;
    }
    if ctx.eligibility.file_forces_builder(ctx.file) {
        return Mode::Builder;
    }
    if ctx.eligibility.builder_use == BuilderUseType::BuildersTestsOnly && is_test_or_codelab_file(ctx.file) {
        return Mode::Builder;
    }
    if ctx.eligibility.is_forced_builder_type(name) {
        return Mode::Builder;
    }
    if depth >= BUILDER_MODE_NESTING_THRESHOLD || message_count >= BUILDER_MODE_MESSAGE_COUNT_THRESHOLD {
        return Mode::Builder;
    }
    Mode::Setter
}

fn is_test_or_codelab_file(file: &str) -> bool {
    file.ends_with("_test.go") || file.contains("codelab")
}

/// Count message-typed composite literals transitively contained in
/// `lit_node`'s elements (not counting `lit_node` itself).
fn count_transitive_message_literals(ctx: &RewriteContext<'_>, lit_node: NodeId) -> usize {
    let Some(NodeKind::Expr(ExprKind::CompositeLit { elems, .. })) = ctx.arena.get(lit_node).map(|n| n.kind.clone())
    else {
        return 0;
    };
    elems.iter().map(|e| count_in_value(ctx, e.value)).sum()
}

fn count_in_value(ctx: &RewriteContext<'_>, node: NodeId) -> usize {
    let inner = strip_amp(ctx.arena, node);
    let Some(NodeKind::Expr(ExprKind::CompositeLit { elems, .. })) = ctx.arena.get(inner).map(|n| n.kind.clone()) else {
        return 0;
    };
    let is_msg = ctx
        .types
        .type_of(node)
        .or_else(|| ctx.types.type_of(inner))
        .map(|t| ctx.shapes.is_message(t))
        .unwrap_or(false);
    let nested: usize = elems.iter().map(|e| count_in_value(ctx, e.value)).sum();
    if is_msg { 1 + nested } else { nested }
}

fn strip_amp(arena: &Arena, node: NodeId) -> NodeId {
    match arena.get(node).and_then(|n| n.as_expr()) {
        Some(ExprKind::Unary { op: UnaryOp::Amp, x }) => *x,
        _ => node,
    }
}

// -- builder mode ----------------------------------------------------

/// `T{F1:v1, ...}` → `T_builder{F1:v1', ...}.Build()` (spec §4.4
/// "Builder mode"). Nested message-typed fields are forced into builder
/// mode too, regardless of their own depth/count criteria — "nested
/// message literals are recursively rewritten in builder mode".
fn build_builder_literal(ctx: &mut RewriteContext<'_>, ty: &SemType, elems: &[CompositeElem], depth: usize) -> NodeId {
    let builder_ty_name = ty.as_named().map(|n| format!("{}_builder", n.short_name())).unwrap_or_default();
    let ty_node = ctx.arena.alloc(NodeKind::Expr(ExprKind::TypeName(builder_ty_name)), NodeId::NONE);

    let mut new_elems = Vec::with_capacity(elems.len());
    for e in elems {
        let field = e.key.clone().unwrap_or_default();
        let builder_field = if field.is_empty() { field.clone() } else { ctx.shapes.builder_field_name(&field) };
        let field_kind = (!field.is_empty()).then(|| ctx.shapes.field_kind(ty, &field)).flatten();
        let new_value = rewrite_builder_field_value(ctx, ty, field_kind.as_ref(), e.value, depth);
        new_elems.push(if field.is_empty() { CompositeElem::positional(new_value) } else { CompositeElem::keyed(builder_field, new_value) });
    }

    let lit = ctx.arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems: new_elems }), NodeId::NONE);
    let build_sel = ctx.arena.alloc(NodeKind::Expr(ExprKind::Selector { x: lit, sel: "Build".to_string() }), NodeId::NONE);
    let call = ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: build_sel, args: SmallVec::new() }), NodeId::NONE);
    ctx.types.set_type(call, ty.pointee_or_self().clone());
    call
}

fn rewrite_builder_field_value(
    ctx: &mut RewriteContext<'_>,
    owner_ty: &SemType,
    field_kind: Option<&FieldKind>,
    value: NodeId,
    depth: usize,
) -> NodeId {
    match field_kind {
        Some(FieldKind::OneOf { group }) => {
            if let Some((variant_value, _variant)) = unwrap_oneof_wrapper(ctx, owner_ty, *group, value) {
                let rewritten = force_builder_recursive(ctx, variant_value, depth + 1);
                wrap_oneof_inner_if_uncertain(ctx, rewritten)
            } else {
                force_builder_recursive(ctx, value, depth + 1)
            }
        }
        Some(FieldKind::Scalar { explicit_presence: true }) => {
            let rewritten = force_builder_recursive(ctx, value, depth + 1);
            if let Some(SemType::Scalar(kind)) = ctx.types.type_of(rewritten).cloned() {
                ctx.imports.require("proto");
                let wrapper_name = scalar_wrapper_name(kind);
                let pkg = ctx.arena.alloc(NodeKind::Expr(ExprKind::Ident("proto".to_string())), NodeId::NONE);
                let sel = ctx.arena.alloc(NodeKind::Expr(ExprKind::Selector { x: pkg, sel: wrapper_name.to_string() }), NodeId::NONE);
                ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: sel, args: SmallVec::from_vec(vec![rewritten]) }), NodeId::NONE)
            } else {
                rewritten
            }
        }
        // Message, Repeated, Map, Bytes: all may carry nested message
        // literals (directly, or as slice/map literal elements) that
        // must themselves end up in builder mode; `force_builder_recursive`
        // already falls back to generic recursion for anything that
        // isn't a literal at all.
        _ => force_builder_recursive(ctx, value, depth + 1),
    }
}

/// Recursively force builder mode on `node`: if it (or its `&`-wrapped
/// inner) is itself a message literal, rebuild it via
/// [`build_builder_literal`]; if it is a non-message container literal
/// (e.g. a slice of message pointers), force each element the same way;
/// otherwise leave it to generic recursion.
fn force_builder_recursive(ctx: &mut RewriteContext<'_>, node: NodeId, depth: usize) -> NodeId {
    let inner = strip_amp(ctx.arena, node);
    let Some(NodeKind::Expr(ExprKind::CompositeLit { ty, elems })) = ctx.arena.get(inner).map(|n| n.kind.clone()) else {
        return process_expr(ctx, node, depth).0;
    };
    let declared_ty = ctx.types.type_of(node).or_else(|| ctx.types.type_of(inner)).cloned();
    if let Some(t) = &declared_ty
        && ctx.shapes.is_message(t)
    {
        return build_builder_literal(ctx, t, &elems, depth);
    }
    // Non-message container (slice/map literal): force each element.
    let mut new_elems = Vec::with_capacity(elems.len());
    for e in &elems {
        new_elems.push(CompositeElem { key: e.key.clone(), value: force_builder_recursive(ctx, e.value, depth) });
    }
    ctx.arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty, elems: new_elems }), NodeId::NONE)
}

/// `&T_Variant{InnerField: v}` → `(v, variant)`, given the field's
/// one-of group (spec §4.5 "Wrapper literal as composite-literal
/// element").
fn unwrap_oneof_wrapper(
    ctx: &RewriteContext<'_>,
    owner_ty: &SemType,
    group: refactor_types::OneofGroupId,
    value: NodeId,
) -> Option<(NodeId, String)> {
    let inner = strip_amp(ctx.arena, value);
    let Some(ExprKind::CompositeLit { elems, .. }) = ctx.arena.get(inner).and_then(|n| n.as_expr()) else { return None };
    let [CompositeElem { key: Some(inner_field), value: inner_value }] = elems.as_slice() else { return None };
    let variants = ctx.shapes.oneof_variants(owner_ty, group);
    let variant = variants.iter().find(|v| &v.inner_field == inner_field)?;
    Some((*inner_value, variant.variant.clone()))
}

/// Spec §4.5 "Wrapper literal as composite-literal element": "When the
/// inner value is a message-typed variable of uncertain nilness, the
/// Red-level form wraps it with a `ValueOrDefault`-style helper; the
/// Green-level form leaves the construction as-is." A bare identifier
/// is the uncertain case (a freshly constructed literal is provably
/// non-nil and needs no guard).
fn wrap_oneof_inner_if_uncertain(ctx: &mut RewriteContext<'_>, inner_value: NodeId) -> NodeId {
    if ctx.level != ConfidenceLevel::Red {
        return inner_value;
    }
    let is_ident = matches!(ctx.arena.get(inner_value).and_then(|n| n.as_expr()), Some(ExprKind::Ident(_)));
    let ty = ctx.types.type_of(inner_value).cloned();
    let is_message_typed = ty.as_ref().is_some_and(|t| ctx.shapes.is_message(t));
    if !(is_ident && is_message_typed) {
        return inner_value;
    }
    ctx.imports.require("proto");
    let pkg = ctx.arena.alloc(NodeKind::Expr(ExprKind::Ident("proto".to_string())), NodeId::NONE);
    let sel = ctx.arena.alloc(NodeKind::Expr(ExprKind::Selector { x: pkg, sel: "ValueOrDefault".to_string() }), NodeId::NONE);
    let call = ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: sel, args: SmallVec::from_vec(vec![inner_value]) }), NodeId::NONE);
    if let Some(t) = ty {
        ctx.types.set_type(call, t);
    }
    ctx.counters.record(UnsafeReason::MaybeNilPointerDeref);
    call
}

// -- setter mode -------------------------------------------------------

/// `T{F1:v1, ...}` → `h := &T{}; h.SetF1(v1); ...` with the original
/// expression position replaced by a reference to `h` (spec §4.4
/// "Setter mode").
fn lower_setter_mode(
    ctx: &mut RewriteContext<'_>,
    lit_node: NodeId,
    ty: &SemType,
    elems: &[CompositeElem],
    depth: usize,
) -> (NodeId, Vec<NodeId>) {
    let short_name = ty.as_named().map(|n| n.short_name().to_string()).unwrap_or_else(|| "m".to_string());
    let base_prefix = helper_base_prefix(&short_name);
    let helper_name = ctx.helper_names.allocate(ctx.scopes, ctx.package_scope, &base_prefix);

    let type_ref = ctx.arena.alloc(NodeKind::Expr(ExprKind::TypeName(short_name.clone())), NodeId::NONE);
    let empty_lit = ctx.arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: type_ref, elems: Vec::new() }), NodeId::NONE);
    let amp_empty = ctx.arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: empty_lit }), NodeId::NONE);
    ctx.types.set_type(amp_empty, ty.clone());

    let decl_ident = fresh_ident(ctx, &helper_name, ty);
    let decl_stmt = ctx.arena.alloc(
        NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![decl_ident]), rhs: SmallVec::from_vec(vec![amp_empty]), define: true }),
        NodeId::NONE,
    );
    let mut trivia = ctx.arena.take_trivia(lit_node);
    let lit_trailing = trivia.take_trailing();
    ctx.arena.set_trivia(decl_stmt, std::mem::take(&mut trivia));

    let mut prelude = vec![decl_stmt];
    for e in elems {
        let field = e.key.clone().unwrap_or_default();
        if field.is_empty() {
            continue; // positional elements only occur in non-message container literals, not here.
        }
        let field_kind = ctx.shapes.field_kind(ty, &field);
        let (value, value_prelude) = process_expr(ctx, e.value, depth + 1);
        prelude.extend(value_prelude);

        let method_field = if field == "Build" { "Build_".to_string() } else { field.clone() };
        let (method, arg) = match field_kind {
            Some(FieldKind::OneOf { group }) => match unwrap_oneof_wrapper(ctx, ty, group, value) {
                Some((inner_value, variant)) => (format!("Set{variant}"), inner_value),
                None => (format!("Set{method_field}"), value),
            },
            _ => (format!("Set{method_field}"), value),
        };
        let recv = fresh_ident(ctx, &helper_name, ty);
        let set_call = build_call(ctx, recv, &method, SmallVec::from_vec(vec![arg]));
        let stmt = ctx.arena.alloc(NodeKind::Stmt(StmtKind::Expr(set_call)), NodeId::NONE);
        let elem_trivia = ctx.arena.take_trivia(e.value);
        ctx.arena.set_trivia(stmt, elem_trivia);
        prelude.push(stmt);
    }

    let use_site = fresh_ident(ctx, &helper_name, ty);
    if !lit_trailing.is_empty()
        && let Some(last) = prelude.last()
    {
        let mut last_trivia = ctx.arena.trivia(*last);
        last_trivia.trailing.extend(lit_trailing);
        ctx.arena.set_trivia(*last, last_trivia);
    }
    (use_site, prelude)
}

fn fresh_ident(ctx: &mut RewriteContext<'_>, name: &str, ty: &SemType) -> NodeId {
    let id = ctx.arena.alloc(NodeKind::Expr(ExprKind::Ident(name.to_string())), NodeId::NONE);
    ctx.types.set_type(id, ty.clone());
    id
}

fn build_call(ctx: &mut RewriteContext<'_>, receiver: NodeId, method: &str, args: SmallVec<[NodeId; 4]>) -> NodeId {
    let sel = ctx.arena.alloc(NodeKind::Expr(ExprKind::Selector { x: receiver, sel: method.to_string() }), NodeId::NONE);
    ctx.arena.alloc(NodeKind::Expr(ExprKind::Call { func: sel, args }), NodeId::NONE)
}

/// Base prefix a helper name is derived from: the message's short type
/// name, first letter lowercased, with a trailing `h` (spec §3: "a base
/// prefix (derived from a message type, e.g. `m2h`)" — here `m2h` reads
/// as lowercase short name `m2` plus the `h` suffix).
fn helper_base_prefix(short_name: &str) -> String {
    let mut chars = short_name.chars();
    match chars.next() {
        Some(c) => format!("{}{}h", c.to_lowercase(), chars.as_str()),
        None => "mh".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refactor_ast::{Arena, Lit};
    use refactor_scope::helper_names::HelperNameAllocator;
    use refactor_scope::scope::ScopeTree;
    use refactor_types::{DescriptorOracle, Edition, EligibilityInputs, MessageShapeOracle, OneofGroupId, TypeInfo, TypeName, VariantInfo};

    struct StubDescriptors;
    impl DescriptorOracle for StubDescriptors {
        fn edition(&self, _ty: &TypeName) -> Option<Edition> {
            Some(Edition::Proto3)
        }
        fn has_message_marker(&self, ty: &TypeName) -> bool {
            ty.long_name() == "pkg.T"
        }
        fn field_kind(&self, _ty: &TypeName, field: &str) -> Option<FieldKind> {
            match field {
                "S" => Some(FieldKind::Scalar { explicit_presence: true }),
                "Ms" => Some(FieldKind::Repeated),
                "Build" => Some(FieldKind::Scalar { explicit_presence: true }),
                "Payload" => Some(FieldKind::OneOf { group: OneofGroupId(0) }),
                _ => None,
            }
        }
        fn is_builder_type(&self, _ty: &TypeName) -> bool {
            false
        }
        fn oneof_group(&self, _ty: &TypeName, field: &str) -> Option<OneofGroupId> {
            (field == "Payload").then_some(OneofGroupId(0))
        }
        fn oneof_variants(&self, _ty: &TypeName, _group: OneofGroupId) -> Vec<VariantInfo> {
            vec![VariantInfo { variant: "Msg".into(), inner_field: "Msg".into() }]
        }
        fn is_oneof_interface(&self, _ty: &TypeName) -> bool {
            false
        }
        fn field_names(&self, _ty: &TypeName) -> Vec<String> {
            vec!["S".into(), "Ms".into(), "Build".into(), "Payload".into()]
        }
    }

    fn fresh_harness() -> (Arena, TypeInfo, EligibilityInputs, StubDescriptors) {
        (Arena::new(), TypeInfo::new(), EligibilityInputs::default(), StubDescriptors)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_in_block(
        arena: &mut Arena,
        types: &mut TypeInfo,
        eligibility: &EligibilityInputs,
        descriptors: &StubDescriptors,
        block: NodeId,
        file: &str,
    ) -> bool {
        run_in_block_at_level(arena, types, eligibility, descriptors, block, file, refactor_common::ConfidenceLevel::Green).0
    }

    #[allow(clippy::too_many_arguments)]
    fn run_in_block_at_level(
        arena: &mut Arena,
        types: &mut TypeInfo,
        eligibility: &EligibilityInputs,
        descriptors: &StubDescriptors,
        block: NodeId,
        file: &str,
        level: refactor_common::ConfidenceLevel,
    ) -> (bool, refactor_cursor::UnsafeReasonCounters) {
        let shapes = MessageShapeOracle::new(descriptors, eligibility);
        let mut scopes = ScopeTree::new();
        let package_scope = scopes.package_scope();
        let mut helper_names = HelperNameAllocator::new();
        let mut imports = refactor_cursor::ImportTable::new();
        let mut counters = refactor_cursor::UnsafeReasonCounters::new();
        let mut ctx = RewriteContext {
            arena,
            types,
            shapes: &shapes,
            eligibility,
            scopes: &mut scopes,
            package_scope,
            helper_names: &mut helper_names,
            imports: &mut imports,
            counters: &mut counters,
            file,
            level,
        };
        let changed = run(&mut ctx, &[block]);
        (changed, counters)
    }

    #[test]
    fn empty_literal_is_left_untouched() {
        let (mut arena, mut types, eligibility, descriptors) = fresh_harness();
        let ty_node = arena.alloc(NodeKind::Expr(ExprKind::TypeName("pkg.T".into())), NodeId::NONE);
        let lit = arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems: vec![] }), NodeId::NONE);
        let amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: lit }), NodeId::NONE);
        types.set_type(amp, SemType::Named(TypeName::new("pkg.T")));
        let lhs = arena.alloc(NodeKind::Expr(ExprKind::Ident("msg".into())), NodeId::NONE);
        let assign = arena.alloc(
            NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![lhs]), rhs: SmallVec::from_vec(vec![amp]), define: true }),
            NodeId::NONE,
        );
        let block = arena.alloc(NodeKind::Stmt(StmtKind::Block(vec![assign])), NodeId::NONE);

        let changed = run_in_block(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go");
        assert!(!changed);
        match &arena.get(block).unwrap().kind {
            NodeKind::Stmt(StmtKind::Block(stmts)) => assert_eq!(stmts.as_slice(), &[assign]),
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn nonempty_literal_is_lifted_to_setter_helper() {
        let (mut arena, mut types, eligibility, descriptors) = fresh_harness();
        let s_val = arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Nil)), NodeId::NONE);
        let ty_node = arena.alloc(NodeKind::Expr(ExprKind::TypeName("pkg.T".into())), NodeId::NONE);
        let lit = arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems: vec![CompositeElem::keyed("S", s_val)] }), NodeId::NONE);
        let amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: lit }), NodeId::NONE);
        types.set_type(amp, SemType::Named(TypeName::new("pkg.T")));
        let lhs = arena.alloc(NodeKind::Expr(ExprKind::Ident("x".into())), NodeId::NONE);
        let assign = arena.alloc(
            NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![lhs]), rhs: SmallVec::from_vec(vec![amp]), define: true }),
            NodeId::NONE,
        );
        let block = arena.alloc(NodeKind::Stmt(StmtKind::Block(vec![assign])), NodeId::NONE);

        let changed = run_in_block(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go");
        assert!(changed);
        match &arena.get(block).unwrap().kind {
            NodeKind::Stmt(StmtKind::Block(stmts)) => {
                // decl stmt, Set call stmt, then the original assignment (now `x := th`)
                assert_eq!(stmts.len(), 3);
                match arena.get(stmts[0]).unwrap().as_stmt().unwrap() {
                    StmtKind::Assign { define: true, .. } => {}
                    other => panic!("expected helper decl, got {other:?}"),
                }
                match arena.get(stmts[1]).unwrap().as_stmt().unwrap() {
                    StmtKind::Expr(call) => match arena.get(*call).unwrap().as_expr().unwrap() {
                        ExprKind::Call { func, .. } => match arena.get(*func).unwrap().as_expr().unwrap() {
                            ExprKind::Selector { sel, .. } => assert_eq!(sel, "SetS"),
                            other => panic!("unexpected func: {other:?}"),
                        },
                        other => panic!("unexpected stmt expr: {other:?}"),
                    },
                    other => panic!("unexpected stmt: {other:?}"),
                }
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn deeply_nested_literal_uses_builder_mode() {
        let (mut arena, mut types, eligibility, descriptors) = fresh_harness();

        // Build &T{Ms: []*T{ {Ms: []*T{ {Ms: []*T{ {} }} }} }} — 3 levels
        // of message nesting under the outer literal, each holding one
        // more, which alone crosses BUILDER_MODE_MESSAGE_COUNT_THRESHOLD.
        fn make_level(arena: &mut Arena, types: &mut TypeInfo, depth: usize) -> NodeId {
            let elems = if depth == 0 {
                vec![]
            } else {
                let inner = make_level(arena, types, depth - 1);
                types.set_type(inner, SemType::Named(TypeName::new("pkg.T")));
                vec![CompositeElem::keyed("Ms", inner)]
            };
            arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: NodeId::NONE, elems }), NodeId::NONE)
        }

        let innermost = make_level(&mut arena, &mut types, 4);
        let ty_node = arena.alloc(NodeKind::Expr(ExprKind::TypeName("pkg.T".into())), NodeId::NONE);
        let NodeKind::Expr(ExprKind::CompositeLit { elems, .. }) = arena.get(innermost).unwrap().kind.clone() else {
            unreachable!()
        };
        arena.set_kind(innermost, NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems }));
        let amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: innermost }), NodeId::NONE);
        types.set_type(amp, SemType::Named(TypeName::new("pkg.T")));
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(amp)), NodeId::NONE);
        let block = arena.alloc(NodeKind::Stmt(StmtKind::Block(vec![stmt])), NodeId::NONE);

        let changed = run_in_block(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go");
        assert!(changed);
        match arena.get(stmt).unwrap().as_stmt().unwrap() {
            StmtKind::Expr(x) => match arena.get(*x).unwrap().as_expr().unwrap() {
                ExprKind::Call { func, .. } => match arena.get(*func).unwrap().as_expr().unwrap() {
                    ExprKind::Selector { sel, x: lit } => {
                        assert_eq!(sel, "Build");
                        match arena.get(*lit).unwrap().as_expr().unwrap() {
                            ExprKind::CompositeLit { ty, .. } => match arena.get(*ty).unwrap().as_expr().unwrap() {
                                ExprKind::TypeName(name) => assert!(name.ends_with("_builder")),
                                other => panic!("unexpected ty: {other:?}"),
                            },
                            other => panic!("unexpected lit: {other:?}"),
                        }
                    }
                    other => panic!("unexpected func: {other:?}"),
                },
                other => panic!("unexpected expr: {other:?}"),
            },
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn build_field_is_renamed_with_trailing_underscore_in_builder_mode() {
        let (mut arena, mut types, mut eligibility, descriptors) = fresh_harness();
        eligibility.builder_use = BuilderUseType::BuildersEverywhere;
        let one = arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Int(1))), NodeId::NONE);
        types.set_type(one, SemType::Scalar(ScalarKind::Int32));
        let ty_node = arena.alloc(NodeKind::Expr(ExprKind::TypeName("pkg.T".into())), NodeId::NONE);
        let lit = arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems: vec![CompositeElem::keyed("Build", one)] }), NodeId::NONE);
        let amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: lit }), NodeId::NONE);
        types.set_type(amp, SemType::Named(TypeName::new("pkg.T")));
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(amp)), NodeId::NONE);
        let block = arena.alloc(NodeKind::Stmt(StmtKind::Block(vec![stmt])), NodeId::NONE);

        run_in_block(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go");
        match arena.get(stmt).unwrap().as_stmt().unwrap() {
            StmtKind::Expr(x) => match arena.get(*x).unwrap().as_expr().unwrap() {
                ExprKind::Call { func, .. } => match arena.get(*func).unwrap().as_expr().unwrap() {
                    ExprKind::Selector { x: lit, .. } => match arena.get(*lit).unwrap().as_expr().unwrap() {
                        ExprKind::CompositeLit { elems, .. } => {
                            assert_eq!(elems[0].key.as_deref(), Some("Build_"));
                        }
                        other => panic!("unexpected lit: {other:?}"),
                    },
                    other => panic!("unexpected func: {other:?}"),
                },
                other => panic!("unexpected expr: {other:?}"),
            },
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    /// Builds `&T{Payload: &T_Msg{Msg: v}}` in builder mode, with `v` a
    /// bare message-typed identifier (spec §4.5's uncertain-nilness case).
    fn oneof_builder_fixture(arena: &mut Arena, types: &mut TypeInfo) -> (NodeId, NodeId) {
        let v = arena.alloc(NodeKind::Expr(ExprKind::Ident("v".into())), NodeId::NONE);
        types.set_type(v, SemType::Named(TypeName::new("pkg.T")));
        let wrapper_lit = arena.alloc(
            NodeKind::Expr(ExprKind::CompositeLit { ty: NodeId::NONE, elems: vec![CompositeElem::keyed("Msg", v)] }),
            NodeId::NONE,
        );
        let wrapper_amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: wrapper_lit }), NodeId::NONE);
        let ty_node = arena.alloc(NodeKind::Expr(ExprKind::TypeName("pkg.T".into())), NodeId::NONE);
        let outer_lit = arena.alloc(
            NodeKind::Expr(ExprKind::CompositeLit { ty: ty_node, elems: vec![CompositeElem::keyed("Payload", wrapper_amp)] }),
            NodeId::NONE,
        );
        let outer_amp = arena.alloc(NodeKind::Expr(ExprKind::Unary { op: UnaryOp::Amp, x: outer_lit }), NodeId::NONE);
        types.set_type(outer_amp, SemType::Named(TypeName::new("pkg.T")));
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(outer_amp)), NodeId::NONE);
        let block = arena.alloc(NodeKind::Stmt(StmtKind::Block(vec![stmt])), NodeId::NONE);
        (stmt, block)
    }

    fn builder_call_args(arena: &Arena, stmt: NodeId) -> SmallVec<[NodeId; 4]> {
        let StmtKind::Expr(x) = arena.get(stmt).unwrap().as_stmt().unwrap() else { panic!("expected expr stmt") };
        let ExprKind::Call { func, .. } = arena.get(*x).unwrap().as_expr().unwrap() else { panic!("expected call") };
        let ExprKind::Selector { x: lit, .. } = arena.get(*func).unwrap().as_expr().unwrap() else { panic!("expected selector") };
        let ExprKind::CompositeLit { elems, .. } = arena.get(*lit).unwrap().as_expr().unwrap() else { panic!("expected lit") };
        assert_eq!(elems[0].key.as_deref(), Some("Payload"));
        let ExprKind::Call { args, .. } = arena.get(elems[0].value).unwrap().as_expr().unwrap() else {
            panic!("expected the unwrapped oneof value to itself be force_builder_recursive'd into a call-shaped node or a bare value")
        };
        args.clone()
    }

    #[test]
    fn oneof_builder_field_with_uncertain_inner_is_untouched_at_green() {
        let (mut arena, mut types, mut eligibility, descriptors) = fresh_harness();
        eligibility.builder_use = BuilderUseType::BuildersEverywhere;
        let (stmt, block) = oneof_builder_fixture(&mut arena, &mut types);

        let (changed, counters) =
            run_in_block_at_level(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go", refactor_common::ConfidenceLevel::Green);
        assert!(changed);

        let StmtKind::Expr(x) = arena.get(stmt).unwrap().as_stmt().unwrap() else { panic!("expected expr stmt") };
        let ExprKind::Call { func, .. } = arena.get(*x).unwrap().as_expr().unwrap() else { panic!("expected call") };
        let ExprKind::Selector { x: lit, .. } = arena.get(*func).unwrap().as_expr().unwrap() else { panic!("expected selector") };
        let ExprKind::CompositeLit { elems, .. } = arena.get(*lit).unwrap().as_expr().unwrap() else { panic!("expected lit") };
        assert_eq!(elems[0].key.as_deref(), Some("Payload"));
        assert!(matches!(arena.get(elems[0].value).unwrap().as_expr(), Some(ExprKind::Ident(n)) if n == "v"));
        assert_eq!(counters.count(UnsafeReason::MaybeNilPointerDeref), 0);
    }

    #[test]
    fn oneof_builder_field_with_uncertain_inner_wraps_value_or_default_at_red() {
        let (mut arena, mut types, mut eligibility, descriptors) = fresh_harness();
        eligibility.builder_use = BuilderUseType::BuildersEverywhere;
        let (stmt, block) = oneof_builder_fixture(&mut arena, &mut types);

        let (changed, counters) =
            run_in_block_at_level(&mut arena, &mut types, &eligibility, &descriptors, block, "f.go", refactor_common::ConfidenceLevel::Red);
        assert!(changed);

        let args = builder_call_args(&arena, stmt);
        assert_eq!(args.len(), 1);
        match arena.get(args[0]).unwrap().as_expr().unwrap() {
            ExprKind::Ident(n) => assert_eq!(n, "v"),
            other => panic!("expected the wrapped identifier as the sole ValueOrDefault argument, got {other:?}"),
        }
        assert_eq!(counters.count(UnsafeReason::MaybeNilPointerDeref), 1);
    }
}
