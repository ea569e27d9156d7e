//! The six ordered rewrite passes (spec §4.1):
//!
//! 1. presence-test normalization (§4.2)
//! 2. one-of type-switch rewrite (§4.5)
//! 3. field-read rewrite (§4.3)
//! 4. field-write rewrite (§4.3, §4.5)
//! 5. composite-literal rewrite (§4.4)
//! 6. avoid-redundant-haser fusion (§4.7)
//!
//! Each pass is a pure, context-free function keyed by node shape,
//! dispatched by exhaustive match rather than a vtable (spec §9 "Rule
//! dispatch without virtual tables"). `refactor-driver` is the crate
//! that actually runs these to a fixed point at each confidence level;
//! this crate only knows how to apply one pass once.

pub mod composite_literal;
pub mod context;
pub mod field_read;
pub mod field_write;
pub mod oneof_switch;
pub mod presence;
pub mod redundant_haser;
pub mod walk;

pub use context::RewriteContext;

/// One named pass in the declared order (spec §4.1). `refactor-driver`
/// walks this list once per confidence level per fixed-point iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Presence,
    OneofSwitch,
    FieldRead,
    FieldWrite,
    CompositeLiteral,
    RedundantHaser,
}

impl Pass {
    /// The declared order from spec §4.1, numbered 1 through 6.
    pub const ORDER: [Pass; 6] = [
        Pass::Presence,
        Pass::OneofSwitch,
        Pass::FieldRead,
        Pass::FieldWrite,
        Pass::CompositeLiteral,
        Pass::RedundantHaser,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Pass::Presence => "presence-test-normalization",
            Pass::OneofSwitch => "oneof-type-switch-rewrite",
            Pass::FieldRead => "field-read-rewrite",
            Pass::FieldWrite => "field-write-rewrite",
            Pass::CompositeLiteral => "composite-literal-rewrite",
            Pass::RedundantHaser => "avoid-redundant-haser",
        }
    }

    /// Run this pass once over `roots`, returning whether it changed
    /// anything. Callers (the driver) loop this per pass until a full
    /// sweep across `Pass::ORDER` makes no further change — the
    /// per-level fixed point spec §4.1 requires.
    pub fn run(self, ctx: &mut RewriteContext<'_>, roots: &[refactor_ast::NodeId]) -> bool {
        match self {
            Pass::Presence => presence::run(ctx, roots),
            Pass::OneofSwitch => oneof_switch::run(ctx, roots),
            Pass::FieldRead => field_read::run(ctx, roots),
            Pass::FieldWrite => field_write::run(ctx, roots),
            Pass::CompositeLiteral => composite_literal::run(ctx, roots),
            Pass::RedundantHaser => redundant_haser::run(ctx, roots),
        }
    }
}
