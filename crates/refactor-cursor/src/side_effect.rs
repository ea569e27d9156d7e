//! Side-effect analysis (spec §4.6).
//!
//! Determines whether an expression may be evaluated twice (e.g. when a
//! rule needs both a `HasF()` guard and a `GetF()` read of the same
//! receiver) without duplicating an observable effect, and if not, plans
//! hoisting it into a helper variable.

use refactor_ast::{Arena, ExprKind, NodeId};
use refactor_scope::helper_names::HelperNameAllocator;
use refactor_scope::scope::{ScopeId, ScopeTree};
use refactor_types::{MessageShapeOracle, TypeInfo};

/// Spec §4.6: "An expression `x` is side-effect free iff it is an
/// identifier, a basic literal, an indexing of two side-effect-free
/// parts, a selector `a.b` where `a` is side-effect free, or a method
/// call on a tracked message type with side-effect-free receiver and
/// arguments. ... All other forms ... are not side-effect free."
pub fn is_side_effect_free(
    arena: &Arena,
    shapes: &MessageShapeOracle<'_>,
    types: &TypeInfo,
    node: NodeId,
) -> bool {
    let Some(expr) = arena.get(node).and_then(|n| n.as_expr()) else {
        return false;
    };
    match expr {
        ExprKind::Ident(_) => true,
        ExprKind::Lit(_) => true,
        ExprKind::Index { x, index } => {
            is_side_effect_free(arena, shapes, types, *x) && is_side_effect_free(arena, shapes, types, *index)
        }
        ExprKind::Selector { x, .. } => is_side_effect_free(arena, shapes, types, *x),
        ExprKind::Call { func, args } => {
            is_message_method_call(arena, shapes, types, *func)
                && args.iter().all(|arg| is_side_effect_free(arena, shapes, types, *arg))
        }
        ExprKind::Star { .. }
        | ExprKind::Unary { .. }
        | ExprKind::Binary { .. }
        | ExprKind::CompositeLit { .. }
        | ExprKind::TypeName(_)
        | ExprKind::TypeSwitchGuard { .. } => false,
    }
}

/// A call `recv.Method(...)` is free only when `recv`'s static type is a
/// tracked message: generated opaque-API methods are pure by
/// specification (spec §4.6).
fn is_message_method_call(arena: &Arena, shapes: &MessageShapeOracle<'_>, types: &TypeInfo, func: NodeId) -> bool {
    let Some(ExprKind::Selector { x, .. }) = arena.get(func).and_then(|n| n.as_expr()) else {
        return false;
    };
    let Some(recv_ty) = types.type_of(*x) else { return false };
    shapes.is_message(recv_ty) && is_side_effect_free(arena, shapes, types, *x)
}

/// The outcome of deciding whether a receiver can simply be re-emitted
/// or must be hoisted (spec §4.6: "if free, duplicate; otherwise, hoist
/// into a helper variable in the enclosing statement scope").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiverPlan {
    Duplicate,
    Hoist { helper_name: String },
}

/// Decide how to handle re-using `receiver` across more than one
/// synthesized expression (e.g. both a `HasF()` guard and a `GetF()`
/// read), allocating a fresh helper name via [`HelperNameAllocator`]
/// when hoisting is required.
#[allow(clippy::too_many_arguments)]
pub fn plan_receiver_reuse(
    arena: &Arena,
    shapes: &MessageShapeOracle<'_>,
    types: &TypeInfo,
    receiver: NodeId,
    scopes: &mut ScopeTree,
    helper_names: &mut HelperNameAllocator,
    at_scope: ScopeId,
    base_prefix: &str,
) -> ReceiverPlan {
    if is_side_effect_free(arena, shapes, types, receiver) {
        ReceiverPlan::Duplicate
    } else {
        ReceiverPlan::Hoist { helper_name: helper_names.allocate(scopes, at_scope, base_prefix) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refactor_ast::{Lit, NodeKind};
    use refactor_types::eligibility::EligibilityInputs;
    use refactor_types::sem_type::{SemType, TypeName};

    struct StubDescriptors;
    impl refactor_types::DescriptorOracle for StubDescriptors {
        fn edition(&self, _ty: &TypeName) -> Option<refactor_types::Edition> {
            Some(refactor_types::Edition::Proto3)
        }
        fn has_message_marker(&self, ty: &TypeName) -> bool {
            ty.long_name() == "pkg.T"
        }
        fn field_kind(&self, _ty: &TypeName, _field: &str) -> Option<refactor_types::FieldKind> {
            None
        }
        fn is_builder_type(&self, _ty: &TypeName) -> bool {
            false
        }
        fn oneof_group(&self, _ty: &TypeName, _field: &str) -> Option<refactor_types::OneofGroupId> {
            None
        }
        fn oneof_variants(&self, _ty: &TypeName, _group: refactor_types::OneofGroupId) -> Vec<refactor_types::VariantInfo> {
            Vec::new()
        }
        fn is_oneof_interface(&self, _ty: &TypeName) -> bool {
            false
        }
        fn field_names(&self, _ty: &TypeName) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn identifier_is_free() {
        let mut arena = Arena::new();
        let ident = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
        let types = TypeInfo::new();
        let eligibility = EligibilityInputs::default();
        let descriptors = StubDescriptors;
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        assert!(is_side_effect_free(&arena, &shapes, &types, ident));
    }

    #[test]
    fn message_getter_call_is_free_but_arbitrary_call_is_not() {
        let mut arena = Arena::new();
        let recv = arena.alloc(NodeKind::Expr(ExprKind::Ident("m".into())), NodeId::NONE);
        let getter = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: recv, sel: "GetF".into() }), NodeId::NONE);
        let call = arena.alloc(
            NodeKind::Expr(ExprKind::Call { func: getter, args: Default::default() }),
            NodeId::NONE,
        );
        let mut types = TypeInfo::new();
        types.set_type(recv, SemType::Named(TypeName::new("pkg.T")));
        let eligibility = EligibilityInputs::default();
        let descriptors = StubDescriptors;
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        assert!(is_side_effect_free(&arena, &shapes, &types, call));

        let other_recv = arena.alloc(NodeKind::Expr(ExprKind::Ident("notAMessage".into())), NodeId::NONE);
        let other_getter = arena.alloc(NodeKind::Expr(ExprKind::Selector { x: other_recv, sel: "Do".into() }), NodeId::NONE);
        let other_call = arena.alloc(
            NodeKind::Expr(ExprKind::Call { func: other_getter, args: Default::default() }),
            NodeId::NONE,
        );
        types.set_type(other_recv, SemType::Named(TypeName::new("pkg.NotAMessage")));
        assert!(!is_side_effect_free(&arena, &shapes, &types, other_call));
    }

    #[test]
    fn literal_is_free() {
        let mut arena = Arena::new();
        let lit = arena.alloc(NodeKind::Expr(ExprKind::Lit(Lit::Int(1))), NodeId::NONE);
        let types = TypeInfo::new();
        let eligibility = EligibilityInputs::default();
        let descriptors = StubDescriptors;
        let shapes = MessageShapeOracle::new(&descriptors, &eligibility);
        assert!(is_side_effect_free(&arena, &shapes, &types, lit));
    }
}
