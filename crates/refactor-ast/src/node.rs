//! Node shapes for the decorated syntax tree (spec §3 "Node").
//!
//! A DST node is either a statement, expression, declaration, or spec
//! (top-level var/const/type spec). Node shapes are modeled as a sum
//! type so every rule in `refactor-rules` dispatches on them with an
//! exhaustive `match`, never a virtual call (spec §9 "Rule dispatch
//! without virtual tables") — the same style `tsz-checker::dispatch`
//! uses to dispatch on `SyntaxKind`.
//!
//! The engine does not parse source text itself (that is the loader's
//! job, out of scope per spec §1); fixtures and hosts both build trees
//! directly through [`crate::arena::Arena`]'s constructor methods.

use smallvec::SmallVec;

use crate::arena::NodeId;

/// A literal value in an expression position.
#[derive(Clone, Debug, PartialEq)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// The untyped `nil` identifier, tracked distinctly because so many
    /// rules (presence tests, clear-vs-set) branch on "is this nil".
    Nil,
}

/// Binary operators relevant to presence tests and field comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
}

/// Unary operators. `Amp` (address-of) appears at refused-rewrite sites
/// (spec §4.3: "Method values and address-of are refused"). `Not` is
/// synthesized by presence-test rewrites turning an `== nil` comparison
/// into `!m.HasF()` (spec §4.2): the source grammar has no binary
/// "not-equal-nil-as-Has" form, so negation needs its own node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Amp,
    Not,
}

/// One element of a composite literal: `T{F: v}` or `T{v}`.
///
/// Spec §3: "Composite literals additionally track whether each element
/// is a key-value pair or positional."
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeElem {
    pub key: Option<String>,
    pub value: NodeId,
}

impl CompositeElem {
    pub fn positional(value: NodeId) -> Self {
        CompositeElem { key: None, value }
    }

    pub fn keyed(key: impl Into<String>, value: NodeId) -> Self {
        CompositeElem { key: Some(key.into()), value }
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }
}

/// A `case` arm of a one-of type-switch: `case *T_Foo, *T_Bar:`.
///
/// `type_names` is empty for the `default:` arm.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeSwitchCase {
    pub type_names: Vec<String>,
    pub body: Vec<NodeId>,
}

impl TypeSwitchCase {
    pub fn is_default(&self) -> bool {
        self.type_names.is_empty()
    }
}

/// Expression-position node shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Lit(Lit),
    /// `x.Sel` — covers field reads (`m.F`), method values refused at
    /// §4.3, and package-qualified type names (`pkg.T_builder`).
    Selector { x: NodeId, sel: String },
    /// `*x`.
    Star { x: NodeId },
    Unary { op: UnaryOp, x: NodeId },
    Binary { op: BinaryOp, x: NodeId, y: NodeId },
    /// `func(args...)`, including `proto.Int32(e)`-style scalar wrappers
    /// and `m.GetF()`-style generated accessor calls once rewritten.
    Call { func: NodeId, args: SmallVec<[NodeId; 4]> },
    /// `T{F1: v1, ...}` or `T_builder{...}`. `ty` is `NodeId::NONE` for
    /// an untyped literal nested inside another (rare; hosts normally
    /// supply the resolved type via the type oracle instead).
    CompositeLit { ty: NodeId, elems: Vec<CompositeElem> },
    /// `x[index]`.
    Index { x: NodeId, index: NodeId },
    /// A bare reference to a type name used only as a literal's type or
    /// a type-switch case pattern, e.g. `T_builder`, `*T_FooVariant`.
    TypeName(String),
    /// The discriminant expression inside a type-switch guard,
    /// `<x>.(type)`; only ever appears as the subject of a `TypeSwitch`
    /// statement, never nested elsewhere.
    TypeSwitchGuard { x: NodeId },
}

/// Statement-position node shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(NodeId),
    /// `lhs = rhs` (`define: false`) or `lhs := rhs` (`define: true`).
    /// Multi-assignment (`a, b = f()`) is modeled with parallel vectors;
    /// a length mismatch between `lhs` and `rhs` (outside the single
    /// multi-value-call case) is a shape-mismatch invariant failure
    /// (spec §7.2), not something a rule is expected to repair.
    Assign {
        lhs: SmallVec<[NodeId; 2]>,
        rhs: SmallVec<[NodeId; 2]>,
        define: bool,
    },
    /// `if init; cond { then } else { els }`.
    If {
        init: Option<NodeId>,
        cond: NodeId,
        then_body: Vec<NodeId>,
        else_body: Option<Vec<NodeId>>,
    },
    /// `switch init; bind := subject.(type) { cases }` over a one-of
    /// interface (spec §4.5). `bind` is `None` when the switch has no
    /// `v :=` binding (`switch x.(type) { ... }`).
    TypeSwitch {
        init: Option<NodeId>,
        bind: Option<String>,
        subject: NodeId,
        cases: Vec<TypeSwitchCase>,
    },
    /// An ordinary value switch: `switch init; subject { cases }`. This
    /// is what a one-of type-switch becomes once rewritten (spec §4.5):
    /// `subject` is the `m.WhichOneofField()` call and each case's
    /// labels are sentinel constant names rather than type names.
    Switch {
        init: Option<NodeId>,
        subject: NodeId,
        cases: Vec<SwitchCase>,
    },
    Block(Vec<NodeId>),
    Return(SmallVec<[NodeId; 2]>),
}

/// One case arm of a [`StmtKind::Switch`]. `labels` is empty for `default:`.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<String>,
    pub body: Vec<NodeId>,
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Declaration-position node shapes. Minimal: just enough to host
/// fixture functions containing the statements rules operate on.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Func {
        name: String,
        /// `(receiver name, receiver type name)` for methods.
        recv: Option<(String, String)>,
        body: Vec<NodeId>,
    },
}

/// Top-level "spec" nodes: var/const/type specs at file scope.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecKind {
    Var { name: String, ty: Option<String>, value: Option<NodeId> },
}

/// The sum type every DST node's shape is drawn from.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Expr(ExprKind),
    Stmt(StmtKind),
    Decl(DeclKind),
    Spec(SpecKind),
}

/// One node in the arena: its shape plus its parent link.
///
/// Parent links back up the tree; they are kept current by every cursor
/// mutation so rules that need to walk outward (helper-name allocation,
/// side-effect analysis's enclosing-statement search) never need a
/// separate traversal pass.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: NodeId,
}

impl Node {
    pub fn as_expr(&self) -> Option<&ExprKind> {
        match &self.kind {
            NodeKind::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_stmt(&self) -> Option<&StmtKind> {
        match &self.kind {
            NodeKind::Stmt(s) => Some(s),
            _ => None,
        }
    }
}
