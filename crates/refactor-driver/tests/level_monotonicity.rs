//! Integration test for spec §8 "Level monotonicity": "For any subtree,
//! the set of sites rewritten at Green is a subset of those at Yellow,
//! which is a subset of those at Red."
//!
//! The one-of type-switch rewrite (spec §4.5) is the clearest place this
//! shows up: the switch header itself is rewritten at every level, but a
//! case body that rebinds the type-switch's bound name is only followed
//! through at Red (spec §4.5 "Name-shadowing... Green nop; Red still
//! performs the outer rewrite flagged with `MaybeSemanticChange`").

use smallvec::SmallVec;

use refactor_ast::{Arena, DeclKind, ExprKind, Lit, NodeId, NodeKind, StmtKind, TypeSwitchCase};
use refactor_common::ConfidenceLevel;
use refactor_cursor::UnsafeReasonCounters;
use refactor_driver::{CancellationToken, FileUnit, PackageInputs, run_package};
use refactor_scope::scope::ScopeTree;
use refactor_types::{
    DescriptorOracle, Edition, EligibilityInputs, FieldKind, MessageShapeOracle, OneofGroupId, SemType, TypeInfo,
    TypeName, VariantInfo,
};

mod support;

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
        vec![VariantInfo { variant: "StringOneof".into(), inner_field: "StringOneof".into() }]
    }
    fn is_oneof_interface(&self, _ty: &TypeName) -> bool {
        false
    }
    fn field_names(&self, _ty: &TypeName) -> Vec<String> {
        vec!["Payload".into()]
    }
}

/// Builds a fresh copy of:
///
/// ```go
/// func F() {
///     switch v := m.Payload.(type) {
///     case *T_StringOneof:
///         v := 5
///         _ = v.StringOneof
///     }
/// }
/// ```
///
/// Returns the arena, its roots, the type oracle, the switch statement's
/// id, and the `v.StringOneof` usage selector's id (the node whose
/// rewrite is level-gated).
fn build_fixture() -> (Arena, Vec<NodeId>, TypeInfo, NodeId, NodeId) {
    let mut arena = Arena::new();
    let mut types = TypeInfo::new();

    let m = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
    types.set_type(m, SemType::Named(TypeName::new("pkg.T")));
    let payload = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: m, sel: "Payload".into() }), NodeId::NONE);
    let guard = arena.alloc(NodeKind::Expr(ExprKind::TypeSwitchGuard { x: payload }), NodeId::NONE);

    let rebind_lhs = arena.alloc(NodeKind::Expr(ExprKind::Ident("v".into())), NodeId::NONE);
    let five = arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Int(5))), NodeId::NONE);
    let rebind_stmt = arena.alloc(
        NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![rebind_lhs]), rhs: SmallVec::from_vec(vec![five]), define: true }),
        NodeId::NONE,
    );

    let v_ref = arena.alloc(NodeKind::Expr(ExprKind::Ident("v".into())), NodeId::NONE);
    let usage_selector = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: v_ref, sel: "StringOneof".into() }), NodeId::NONE);
    let blank = arena.alloc(NodeKind::Expr(ExprKind::Ident("_".into())), NodeId::NONE);
    let usage_stmt = arena.alloc(
        NodeKind::Stmt(StmtKind::Assign { lhs: SmallVec::from_vec(vec![blank]), rhs: SmallVec::from_vec(vec![usage_selector]), define: false }),
        NodeId::NONE,
    );

    let case = TypeSwitchCase { type_names: vec!["*T_StringOneof".into()], body: vec![rebind_stmt, usage_stmt] };
    let switch_stmt = arena.alloc(
        NodeKind::Stmt(StmtKind::TypeSwitch { init: None, bind: Some("v".into()), subject: guard, cases: vec![case] }),
        NodeId::NONE,
    );

    let func = arena.alloc(NodeKind::Decl(DeclKind::Func { name: "F".into(), recv: None, body: vec![switch_stmt] }), NodeId::NONE);

    (arena, vec![func], types, switch_stmt, usage_selector)
}

fn is_switch_rewritten(arena: &Arena, switch_id: NodeId) -> bool {
    matches!(arena.get(switch_id).and_then(|n| n.as_stmt()), Some(StmtKind::Switch { .. }))
}

fn is_usage_rewritten(arena: &Arena, usage_id: NodeId) -> bool {
    matches!(arena.get(usage_id).and_then(|n| n.as_expr()), Some(ExprKind::Call { .. }))
}

fn run_at(max_level: ConfidenceLevel) -> (bool, bool, u64) {
    support::init_test_tracing();
    let (arena, roots, mut types, switch_id, usage_id) = build_fixture();
    let descriptors = StubDescriptors;
    let eligibility = EligibilityInputs::default();
    let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
    let mut scopes = ScopeTree::new();
    let package_scope = scopes.package_scope();
    let mut counters = UnsafeReasonCounters::new();
    let mut files = vec![FileUnit::new("f.go", arena, roots)];
    let mut inputs = PackageInputs {
        types: &mut types,
        shapes: &shapes,
        eligibility: &eligibility,
        scopes: &mut scopes,
        package_scope,
        counters: &mut counters,
    };
    let cancel = CancellationToken::new();
    run_package(&mut inputs, &mut files, max_level, &cancel);

    let switch_rewritten = is_switch_rewritten(&files[0].arena, switch_id);
    let usage_rewritten = is_usage_rewritten(&files[0].arena, usage_id);
    (switch_rewritten, usage_rewritten, counters.count(refactor_common::UnsafeReason::MaybeSemanticChange))
}

#[test]
fn switch_header_rewrites_at_every_level() {
    let (green_switch, _, _) = run_at(ConfidenceLevel::Green);
    let (yellow_switch, _, _) = run_at(ConfidenceLevel::Yellow);
    let (red_switch, _, _) = run_at(ConfidenceLevel::Red);
    assert!(green_switch && yellow_switch && red_switch);
}

#[test]
fn shadowed_body_rewrite_is_gated_to_red_only() {
    let (_, green_usage, green_unsafe) = run_at(ConfidenceLevel::Green);
    let (_, yellow_usage, yellow_unsafe) = run_at(ConfidenceLevel::Yellow);
    let (_, red_usage, red_unsafe) = run_at(ConfidenceLevel::Red);

    assert!(!green_usage, "Green must leave a shadowed case body untouched");
    assert!(!yellow_usage, "Yellow must leave a shadowed case body untouched");
    assert!(red_usage, "Red must still rewrite the shadowed case body, flagged unsafe");

    assert_eq!(green_unsafe, 0);
    assert_eq!(yellow_unsafe, 0);
    assert_eq!(red_unsafe, 1);
}

#[test]
fn green_rewritten_sites_are_a_subset_of_red_rewritten_sites() {
    // Green's rewritten-site set for this fixture is {switch header};
    // Red's is {switch header, usage selector}. The former is a proper
    // subset of the latter, which is exactly spec §8's monotonicity
    // property for this subtree.
    let (green_switch, green_usage, _) = run_at(ConfidenceLevel::Green);
    let (red_switch, red_usage, _) = run_at(ConfidenceLevel::Red);

    let green_sites = usize::from(green_switch) + usize::from(green_usage);
    let red_sites = usize::from(red_switch) + usize::from(red_usage);
    assert!(green_sites <= red_sites);
    assert!(green_switch <= red_switch);
    assert!(green_usage <= red_usage);
}
