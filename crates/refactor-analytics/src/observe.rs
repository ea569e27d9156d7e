//! The static-analysis walker that turns a rewritten (or pre-rewrite)
//! DST into analytics `Entry` records (spec §6).
//!
//! The DST carries no positions of its own (spec §9 "DST has no
//! positions"); `AnalyticsContext` bridges back to source locations
//! through the same `TypeInfo` node↔position map and `PositionOracle`
//! the driver's callers already maintain. A context built without a
//! position bridge (as the unit tests here do) reports the zero
//! location rather than fabricating one.

use rustc_hash::FxHashSet;

use refactor_ast::{Arena, ExprKind, NodeId, NodeKind, StmtKind, walk};
use refactor_common::{ConfidenceLevel, LineColumn, LineMap, Location};
use refactor_types::{FieldKind, MessageShapeOracle, PositionOracle, SemType, TypeInfo};

use crate::entry::{ConstructorShape, ConversionContext, Entry, Expression, MethodCallSubtype, TypeRef, Use};

const SCALAR_WRAPPER_NAMES: [&str; 8] = ["Int32", "Int64", "Uint32", "Uint64", "Float32", "Float64", "Bool", "String"];

/// The framework-specific internal-field prefix (spec §9 "treats any
/// field whose name starts with this prefix as off-limits").
const INTERNAL_FIELD_PREFIX: &str = "XXX_";

/// Everything [`observe_file`] needs to classify uses and resolve
/// locations for one file.
pub struct AnalyticsContext<'a> {
    pub arena: &'a Arena,
    pub types: &'a TypeInfo,
    pub shapes: &'a MessageShapeOracle<'a>,
    pub package: &'a str,
    pub file: &'a str,
    pub level: ConfidenceLevel,
    pub positions: Option<&'a dyn PositionOracle>,
    pub line_map: Option<&'a LineMap>,
}

impl<'a> AnalyticsContext<'a> {
    fn location_of(&self, node: NodeId) -> Location {
        let zero = LineColumn::new(0, 0);
        let Some(positions) = self.positions else {
            return Location::new(self.package, self.file, zero, zero);
        };
        let Some(line_map) = self.line_map else {
            return Location::new(self.package, self.file, zero, zero);
        };
        let Some(pos) = self.types.position_of(node) else {
            return Location::new(self.package, self.file, zero, zero);
        };
        let span = positions.span_of(pos);
        Location::new(self.package, self.file, line_map.line_column(span.start), line_map.line_column(span.end))
    }
}

fn field_kind_label(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Scalar { .. } => "scalar",
        FieldKind::Message => "message",
        FieldKind::Repeated => "repeated",
        FieldKind::Map => "map",
        FieldKind::Bytes => "bytes",
        FieldKind::OneOf { .. } => "oneof",
    }
}

/// Walk every root in `roots` and return the analytics records spec §6
/// describes: one per recognized use, or a FAIL record when a node that
/// needed type information didn't have it.
pub fn observe_file(ctx: &AnalyticsContext<'_>, roots: &[NodeId]) -> Vec<Entry> {
    let mut call_funcs = FxHashSet::default();
    for &root in roots {
        collect_call_funcs(ctx.arena, root, &mut call_funcs);
    }

    let mut entries = Vec::new();
    for &root in roots {
        visit_preorder(ctx.arena, root, &mut |id| {
            if let Some(entry) = observe_node(ctx, id, &call_funcs) {
                entries.push(entry);
            }
        });
    }
    entries
}

fn visit_preorder(arena: &Arena, root: NodeId, f: &mut dyn FnMut(NodeId)) {
    if root.is_none() {
        return;
    }
    f(root);
    let Some(node) = arena.get(root) else { return };
    for child in walk::children(node) {
        visit_preorder(arena, child, f);
    }
}

/// Record every `Selector` node that is a `Call`'s own `func`, so the
/// selector pass below doesn't double-report a rewritten accessor call
/// (`m.GetE()`) as both a `MethodCall` and a `DirectFieldAccess`.
fn collect_call_funcs(arena: &Arena, root: NodeId, out: &mut FxHashSet<NodeId>) {
    visit_preorder(arena, root, &mut |id| {
        if let Some(ExprKind::Call { func, .. }) = arena.get(id).and_then(|n| n.as_expr()) {
            out.insert(*func);
        }
    });
}

fn observe_node(ctx: &AnalyticsContext<'_>, id: NodeId, call_funcs: &FxHashSet<NodeId>) -> Option<Entry> {
    let node = ctx.arena.get(id)?;
    let parent_kind = ctx.arena.get(node.parent).map(|p| node_kind_label(&p.kind));

    match &node.kind {
        NodeKind::Expr(ExprKind::CompositeLit { elems, .. }) => observe_composite_lit(ctx, id, elems.len(), parent_kind),
        NodeKind::Expr(ExprKind::Call { func, args }) => observe_call(ctx, id, *func, args, parent_kind),
        NodeKind::Expr(ExprKind::Selector { x, sel }) => {
            if call_funcs.contains(&id) {
                return None;
            }
            observe_selector(ctx, id, *x, sel, parent_kind)
        }
        NodeKind::Stmt(StmtKind::Assign { lhs, rhs, define: false }) => observe_shallow_copy(ctx, id, lhs, rhs, parent_kind),
        _ => None,
    }
}

fn node_kind_label(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Expr(e) => format!("Expr::{}", expr_kind_label(e)),
        NodeKind::Stmt(s) => format!("Stmt::{}", stmt_kind_label(s)),
        NodeKind::Decl(_) => "Decl::Func".to_string(),
        NodeKind::Spec(_) => "Spec::Var".to_string(),
    }
}

fn expr_kind_label(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Ident(_) => "Ident",
        ExprKind::Lit(_) => "Lit",
        ExprKind::Selector { .. } => "Selector",
        ExprKind::Star { .. } => "Star",
        ExprKind::Unary { .. } => "Unary",
        ExprKind::Binary { .. } => "Binary",
        ExprKind::Call { .. } => "Call",
        ExprKind::CompositeLit { .. } => "CompositeLit",
        ExprKind::Index { .. } => "Index",
        ExprKind::TypeName(_) => "TypeName",
        ExprKind::TypeSwitchGuard { .. } => "TypeSwitchGuard",
    }
}

fn stmt_kind_label(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Expr(_) => "Expr",
        StmtKind::Assign { .. } => "Assign",
        StmtKind::If { .. } => "If",
        StmtKind::TypeSwitch { .. } => "TypeSwitch",
        StmtKind::Switch { .. } => "Switch",
        StmtKind::Block(_) => "Block",
        StmtKind::Return(_) => "Return",
    }
}

fn observe_composite_lit(ctx: &AnalyticsContext<'_>, id: NodeId, elem_count: usize, parent_kind: Option<String>) -> Option<Entry> {
    let expr = Expression::new("CompositeLit", parent_kind);
    let Some(sem_ty) = ctx.types.type_of(id) else {
        return Some(Entry::missing_type(ctx.location_of(id), ctx.level, expr));
    };
    let Some(name) = sem_ty.as_named() else { return None };
    if !ctx.shapes.is_message(sem_ty) && !ctx.shapes.is_builder(sem_ty) {
        return None;
    }
    let shape = if ctx.shapes.is_builder(sem_ty) {
        ConstructorShape::Builder
    } else if elem_count == 0 {
        ConstructorShape::Empty
    } else {
        ConstructorShape::NonEmptyLiteral
    };
    Some(Entry::observed(ctx.location_of(id), ctx.level, TypeRef::new(name.long_name()), expr, Use::Constructor { shape }))
}

fn observe_call(ctx: &AnalyticsContext<'_>, id: NodeId, func: NodeId, args: &[NodeId], parent_kind: Option<String>) -> Option<Entry> {
    let ExprKind::Selector { x, sel } = ctx.arena.get(func)?.as_expr()? else { return None };
    let expr = Expression::new("Call", parent_kind);

    if sel == "Build" {
        let base_ty = ctx.types.type_of(*x)?;
        if !ctx.shapes.is_builder(base_ty) {
            return None;
        }
        let name = base_ty.as_named()?;
        return Some(Entry::observed(
            ctx.location_of(id),
            ctx.level,
            TypeRef::new(name.long_name()),
            expr,
            Use::MethodCall { method: sel.clone(), subtype: MethodCallSubtype::GetBuild },
        ));
    }

    if let Some(field) = sel.strip_prefix("Get") {
        let Some(base_ty) = ctx.types.type_of(*x) else {
            return Some(Entry::missing_type(ctx.location_of(id), ctx.level, expr));
        };
        let Some(FieldKind::OneOf { .. }) = ctx.shapes.field_kind(base_ty, field) else { return None };
        let name = base_ty.as_named()?;
        return Some(Entry::observed(
            ctx.location_of(id),
            ctx.level,
            TypeRef::new(name.long_name()),
            expr,
            Use::MethodCall { method: sel.clone(), subtype: MethodCallSubtype::GetOneof },
        ));
    }

    if args.len() == 1 && SCALAR_WRAPPER_NAMES.contains(&sel.as_str()) {
        if let Some(ExprKind::Ident(_)) = ctx.arena.get(*x).and_then(|n| n.as_expr()) {
            return Some(Entry::observed(
                ctx.location_of(id),
                ctx.level,
                TypeRef::new(sel.clone()),
                expr,
                Use::Conversion { context: ConversionContext::Explicit, dest_type_name: sel.clone(), func_arg: None },
            ));
        }
    }

    None
}

fn observe_selector(ctx: &AnalyticsContext<'_>, id: NodeId, base: NodeId, field: &str, parent_kind: Option<String>) -> Option<Entry> {
    let expr = Expression::new("Selector", parent_kind);
    let Some(base_ty) = ctx.types.type_of(base) else {
        return Some(Entry::missing_type(ctx.location_of(id), ctx.level, expr));
    };
    let Some(kind) = ctx.shapes.field_kind(base_ty, field) else { return None };
    let name = base_ty.as_named()?;
    let field_type = field_kind_label(&kind).to_string();
    let use_ = if field.starts_with(INTERNAL_FIELD_PREFIX) {
        Use::InternalFieldAccess { field_name: field.to_string(), field_type }
    } else {
        Use::DirectFieldAccess { field_name: field.to_string(), field_type }
    };
    Some(Entry::observed(ctx.location_of(id), ctx.level, TypeRef::new(name.long_name()), expr, use_))
}

fn observe_shallow_copy(
    ctx: &AnalyticsContext<'_>,
    id: NodeId,
    _lhs: &[NodeId],
    rhs: &[NodeId],
    parent_kind: Option<String>,
) -> Option<Entry> {
    let rhs_node = *rhs.first()?;
    let sem_ty = ctx.types.type_of(rhs_node)?;
    let SemType::Named(name) = sem_ty else { return None };
    if !ctx.shapes.is_message(sem_ty) {
        return None;
    }
    let expr = Expression::new("Assign", parent_kind);
    Some(Entry::observed(
        ctx.location_of(id),
        ctx.level,
        TypeRef::new(name.long_name()),
        expr,
        Use::ShallowCopy { context: ConversionContext::Assignment },
    ))
}

/// Full one-of type-switch case enumeration, producing one
/// `TypeAssertion` entry per non-default case label. Exposed separately
/// from the main [`observe_file`] preorder pass because a `TypeSwitch`
/// node's interesting content (its cases) lives in a `Vec<TypeSwitchCase>`
/// field, not in a child node `observe_node` would otherwise visit.
pub fn observe_type_switch_assertions(ctx: &AnalyticsContext<'_>, roots: &[NodeId]) -> Vec<Entry> {
    let mut entries = Vec::new();
    for &root in roots {
        visit_preorder(ctx.arena, root, &mut |id| {
            let Some(node) = ctx.arena.get(id) else { return };
            let NodeKind::Stmt(StmtKind::TypeSwitch { cases, .. }) = &node.kind else { return };
            let parent_kind = ctx.arena.get(node.parent).map(|p| node_kind_label(&p.kind));
            for case in cases {
                for type_name in &case.type_names {
                    entries.push(Entry::observed(
                        ctx.location_of(id),
                        ctx.level,
                        TypeRef::new(type_name.trim_start_matches('*')),
                        Expression::new("TypeSwitch", parent_kind.clone()),
                        Use::TypeAssertion { src_type: type_name.clone() },
                    ));
                }
            }
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use refactor_ast::{Arena, DeclKind, NodeKind, TypeSwitchCase};
    use refactor_types::{DescriptorOracle, Edition, EligibilityInputs, OneofGroupId, TypeName, VariantInfo};

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
                "Name" => Some(FieldKind::Scalar { explicit_presence: true }),
                "XXX_unrecognized" => Some(FieldKind::Bytes),
                _ => None,
            }
        }
        fn is_builder_type(&self, _ty: &TypeName) -> bool {
            false
        }
        fn oneof_group(&self, _ty: &TypeName, _field: &str) -> Option<OneofGroupId> {
            None
        }
        fn oneof_variants(&self, _ty: &TypeName, _group: OneofGroupId) -> Vec<VariantInfo> {
            Vec::new()
        }
        fn is_oneof_interface(&self, _ty: &TypeName) -> bool {
            false
        }
        fn field_names(&self, _ty: &TypeName) -> Vec<String> {
            vec!["Name".into()]
        }
    }

    fn oracle() -> (StubDescriptors, EligibilityInputs) {
        (StubDescriptors, EligibilityInputs::default())
    }

    #[test]
    fn nonempty_composite_literal_is_classified() {
        let (descriptors, eligibility) = oracle();
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        let mut types = TypeInfo::new();
        let mut arena = Arena::new();

        let val = arena.alloc(NodeKind::Expr(ExprKind::Lit(refactor_ast::Lit::Int(1))), NodeId::NONE);
        let lit = arena.alloc(
            NodeKind::Expr(ExprKind::CompositeLit { ty: NodeId::NONE, elems: vec![refactor_ast::CompositeElem::positional(val)] }),
            NodeId::NONE,
        );
        types.set_type(lit, SemType::Named(TypeName::new("pkg.T")));
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(lit)), NodeId::NONE);
        let func = arena.alloc(NodeKind::Decl(DeclKind::Func { name: "F".into(), recv: None, body: vec![stmt] }), NodeId::NONE);

        let ctx = AnalyticsContext {
            arena: &arena,
            types: &types,
            shapes: &shapes,
            package: "pkg",
            file: "f.go",
            level: ConfidenceLevel::Green,
            positions: None,
            line_map: None,
        };
        let entries = observe_file(&ctx, &[func]);
        assert!(entries.iter().any(|e| matches!(&e.use_, Some(Use::Constructor { shape: ConstructorShape::NonEmptyLiteral }))));
    }

    #[test]
    fn direct_field_access_vs_internal_field_access() {
        let (descriptors, eligibility) = oracle();
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        let mut types = TypeInfo::new();
        let mut arena = Arena::new();

        let m = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
        types.set_type(m, SemType::Named(TypeName::new("pkg.T")));
        let name_field = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: m, sel: "Name".into() }), NodeId::NONE);
        let internal_field = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: m, sel: "XXX_unrecognized".into() }), NodeId::NONE);
        let stmt1 = arena.alloc(NodeKind::Stmt(StmtKind::Expr(name_field)), NodeId::NONE);
        let stmt2 = arena.alloc(NodeKind::Stmt(StmtKind::Expr(internal_field)), NodeId::NONE);
        let func = arena.alloc(NodeKind::Decl(DeclKind::Func { name: "F".into(), recv: None, body: vec![stmt1, stmt2] }), NodeId::NONE);

        let ctx = AnalyticsContext {
            arena: &arena,
            types: &types,
            shapes: &shapes,
            package: "pkg",
            file: "f.go",
            level: ConfidenceLevel::Green,
            positions: None,
            line_map: None,
        };
        let entries = observe_file(&ctx, &[func]);
        assert!(entries.iter().any(|e| matches!(&e.use_, Some(Use::DirectFieldAccess { field_name, .. }) if field_name == "Name")));
        assert!(
            entries.iter().any(|e| matches!(&e.use_, Some(Use::InternalFieldAccess { field_name, .. }) if field_name == "XXX_unrecognized"))
        );
    }

    #[test]
    fn selector_missing_type_info_is_reported_as_fail() {
        let (descriptors, eligibility) = oracle();
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        let types = TypeInfo::new();
        let mut arena = Arena::new();

        let m = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
        let field = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: m, sel: "Name".into() }), NodeId::NONE);
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(field)), NodeId::NONE);
        let func = arena.alloc(NodeKind::Decl(DeclKind::Func { name: "F".into(), recv: None, body: vec![stmt] }), NodeId::NONE);

        let ctx = AnalyticsContext {
            arena: &arena,
            types: &types,
            shapes: &shapes,
            package: "pkg",
            file: "f.go",
            level: ConfidenceLevel::Green,
            positions: None,
            line_map: None,
        };
        let entries = observe_file(&ctx, &[func]);
        assert!(entries.iter().any(|e| e.is_fail()));
    }

    #[test]
    fn one_of_type_switch_cases_become_type_assertions() {
        let (descriptors, eligibility) = oracle();
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        let types = TypeInfo::new();
        let mut arena = Arena::new();

        let subject = arena.alloc(NodeKind::Expr(ExprKind::Ident("x".into())), NodeId::NONE);
        let guard = arena.alloc(NodeKind::Expr(ExprKind::TypeSwitchGuard { x: subject }), NodeId::NONE);
        let case = TypeSwitchCase { type_names: vec!["*pkg.T_StringOneof".into()], body: vec![] };
        let switch = arena.alloc(
            NodeKind::Stmt(StmtKind::TypeSwitch { init: None, bind: None, subject: guard, cases: vec![case] }),
            NodeId::NONE,
        );
        let func = arena.alloc(NodeKind::Decl(DeclKind::Func { name: "F".into(), recv: None, body: vec![switch] }), NodeId::NONE);

        let ctx = AnalyticsContext {
            arena: &arena,
            types: &types,
            shapes: &shapes,
            package: "pkg",
            file: "f.go",
            level: ConfidenceLevel::Green,
            positions: None,
            line_map: None,
        };
        let entries = observe_type_switch_assertions(&ctx, &[func]);
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0].use_, Some(Use::TypeAssertion { src_type }) if src_type == "*pkg.T_StringOneof"));
    }
}
