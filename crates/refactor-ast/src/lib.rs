//! The decorated syntax tree (DST) — spec §3 "Node", "TypeInfo"'s node
//! half, and §9 "Mutable AST + side-table type oracle".
//!
//! This crate owns only the tree shape and its trivia; semantic
//! information (types, referenced objects, message-shape facts) lives
//! in `refactor-types`, kept as a side table rather than baked into
//! node payloads so rewrites can extend it without touching node shape.

pub mod arena;
pub mod node;
pub mod walk;

pub use arena::{Arena, NodeId};
pub use node::{
    BinaryOp, CompositeElem, DeclKind, ExprKind, Lit, Node, NodeKind, SpecKind, StmtKind,
    SwitchCase, TypeSwitchCase, UnaryOp,
};
