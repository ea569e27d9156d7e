//! Analytics emission (spec §6) and the cycle-safe message-dependency
//! walker it needs for self-referential message graphs (spec §7 failure
//! 4, §9 "Cycle-safe type recursion").
//!
//! This crate never mutates the DST; it only reads it (and the type/
//! message-shape oracles alongside it) to produce `Entry` records a
//! host persists however it likes — no wire format or storage layer is
//! defined here (spec §6: "No wire protocol... is defined by the core").

pub mod emitter;
pub mod entry;
pub mod observe;
pub mod recursion;

pub use emitter::AnalyticsEmitter;
pub use entry::{ConstructorShape, ConversionContext, Entry, Expression, MethodCallSubtype, Status, TypeRef, Use};
pub use observe::{AnalyticsContext, observe_file, observe_type_switch_assertions};
pub use recursion::MessageDependencyWalker;
