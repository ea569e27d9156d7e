//! Document-order traversal helpers.
//!
//! Spec §4.1: "A single traversal visits every node in document order."
//! `children` returns a node's direct children in source order; callers
//! walk depth-first, pushing children after (pre-order) so sibling
//! order and nesting are both deterministic — ties elsewhere are broken
//! by lexical position, which for fixture-built trees is allocation
//! order.

use smallvec::SmallVec;

use crate::arena::NodeId;
use crate::node::{DeclKind, ExprKind, Node, NodeKind, SpecKind, StmtKind};

/// The direct children of a node, in source order.
pub fn children(node: &Node) -> SmallVec<[NodeId; 4]> {
    let mut out = SmallVec::new();
    match &node.kind {
        NodeKind::Expr(e) => match e {
            ExprKind::Ident(_) | ExprKind::Lit(_) | ExprKind::TypeName(_) => {}
            ExprKind::Selector { x, .. } => out.push(*x),
            ExprKind::Star { x } => out.push(*x),
            ExprKind::Unary { x, .. } => out.push(*x),
            ExprKind::Binary { x, y, .. } => {
                out.push(*x);
                out.push(*y);
            }
            ExprKind::Call { func, args } => {
                out.push(*func);
                out.extend(args.iter().copied());
            }
            ExprKind::CompositeLit { ty, elems } => {
                if ty.is_some() {
                    out.push(*ty);
                }
                out.extend(elems.iter().map(|e| e.value));
            }
            ExprKind::Index { x, index } => {
                out.push(*x);
                out.push(*index);
            }
            ExprKind::TypeSwitchGuard { x } => out.push(*x),
        },
        NodeKind::Stmt(s) => match s {
            StmtKind::Expr(x) => out.push(*x),
            StmtKind::Assign { lhs, rhs, .. } => {
                out.extend(lhs.iter().copied());
                out.extend(rhs.iter().copied());
            }
            StmtKind::If { init, cond, then_body, else_body } => {
                if let Some(init) = init {
                    out.push(*init);
                }
                out.push(*cond);
                out.extend(then_body.iter().copied());
                if let Some(else_body) = else_body {
                    out.extend(else_body.iter().copied());
                }
            }
            StmtKind::TypeSwitch { init, subject, cases, .. } => {
                if let Some(init) = init {
                    out.push(*init);
                }
                out.push(*subject);
                for case in cases {
                    out.extend(case.body.iter().copied());
                }
            }
            StmtKind::Switch { init, subject, cases } => {
                if let Some(init) = init {
                    out.push(*init);
                }
                out.push(*subject);
                for case in cases {
                    out.extend(case.body.iter().copied());
                }
            }
            StmtKind::Block(stmts) => out.extend(stmts.iter().copied()),
            StmtKind::Return(vals) => out.extend(vals.iter().copied()),
        },
        NodeKind::Decl(DeclKind::Func { body, .. }) => out.extend(body.iter().copied()),
        NodeKind::Spec(SpecKind::Var { value, .. }) => {
            if let Some(value) = value {
                out.push(*value);
            }
        }
    }
    out
}
