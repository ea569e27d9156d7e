//! End-to-end exercise of `rewrite_package` through a stub `Loader`:
//! a single field read `m.Name` rewritten to `m.GetName()` at Green,
//! with the rewritten output also observed into an analytics entry.

use refactor_ast::{Arena, ExprKind, NodeId, NodeKind, StmtKind};
use refactor_common::ConfidenceLevel;
use refactor_driver::CancellationToken;
use refactor_analytics::{ConstructorShape, Use};
use refactor_engine::{EngineInputs, LoadedFile, LoadedPackage, Loader, rewrite_package};
use refactor_scope::ScopeTree;
use refactor_types::{
    DescriptorOracle, Edition, EligibilityInputs, FieldKind, OneofGroupId, SemType, TypeInfo, TypeName, VariantInfo,
};

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
        vec!["Name".to_string()]
    }
}

struct StubLoader;

impl Loader for StubLoader {
    fn load_package(&self, package: &str) -> anyhow::Result<LoadedPackage> {
        let mut arena = Arena::new();
        let mut types = TypeInfo::new();
        let m = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
        types.set_type(m, SemType::Named(TypeName::new("pkg.T")));
        let field = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: m, sel: "Name".into() }), NodeId::NONE);
        let stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(field)), NodeId::NONE);

        let lit = arena.alloc(NodeKind::Expr(ExprKind::CompositeLit { ty: NodeId::NONE, elems: vec![] }), NodeId::NONE);
        types.set_type(lit, SemType::Named(TypeName::new("pkg.T")));
        let lit_stmt = arena.alloc(NodeKind::Stmt(StmtKind::Expr(lit)), NodeId::NONE);

        Ok(LoadedPackage {
            name: package.to_string(),
            files: vec![LoadedFile {
                name: "f.go".to_string(),
                arena,
                roots: vec![stmt, lit_stmt],
                imports: Default::default(),
            }],
            types,
            scopes: ScopeTree::new(),
        })
    }
}

#[test]
fn rewrite_package_rewrites_field_read_and_reports_it() {
    let loader = StubLoader;
    let descriptors = StubDescriptors;
    let eligibility = EligibilityInputs::default();
    let inputs = EngineInputs { descriptors: &descriptors, eligibility: &eligibility, max_level: ConfidenceLevel::Green };
    let cancel = CancellationToken::new();

    let result = rewrite_package(&loader, "pkg", &inputs, &cancel).expect("stub loader never fails");

    assert!(result.driver_report.changed);
    assert!(!result.driver_report.cancelled);
    assert_eq!(result.files.len(), 1);

    let file = &result.files[0];
    let stmt = file.roots[0];
    let field = match &file.arena.get(stmt).unwrap().kind {
        NodeKind::Stmt(StmtKind::Expr(e)) => *e,
        other => panic!("expected an expr statement, got {other:?}"),
    };
    match &file.arena.get(field).unwrap().kind {
        NodeKind::Expr(ExprKind::Call { func, .. }) => match &file.arena.get(*func).unwrap().kind {
            NodeKind::Expr(ExprKind::Selector { sel, .. }) => assert_eq!(sel, "GetName"),
            other => panic!("expected a selector callee, got {other:?}"),
        },
        other => panic!("expected the field read rewritten to a call, got {other:?}"),
    }

    assert!(
        result
            .analytics
            .iter()
            .any(|e| matches!(&e.use_, Some(Use::Constructor { shape: ConstructorShape::Empty }))),
        "empty composite literal of a message type should be observed as a Constructor entry"
    );
    assert_eq!(result.unsafe_counts.total(), 0);
}
