//! Confidence levels and the unsafe-reason taxonomy (spec §3, §4.8).

use serde::{Deserialize, Serialize};

/// The rewrite-safety classification a driver run is configured for.
///
/// `None` is the pre-rewrite snapshot used only by analytics; it is never
/// a level a rule runs *at*. Levels are ordered: a rewrite declared safe
/// at a lower level also applies at every higher level (spec §4.8).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[default]
    None,
    Green,
    Yellow,
    Red,
}

impl ConfidenceLevel {
    /// Levels a driver actually runs rule passes at, in order.
    pub const RUN_ORDER: [ConfidenceLevel; 3] =
        [ConfidenceLevel::Green, ConfidenceLevel::Yellow, ConfidenceLevel::Red];

    pub const fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::None => "none",
            ConfidenceLevel::Green => "green",
            ConfidenceLevel::Yellow => "yellow",
            ConfidenceLevel::Red => "red",
        }
    }
}

/// The closed taxonomy of reasons a rewrite performed at Yellow or Red
/// may be unsafe (spec §3 "Unsafe reason"). Every `ReplaceUnsafe` call
/// site records exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnsafeReason {
    PointerAlias,
    SliceAlias,
    InexpressibleApiUsage,
    PotentialBuildBreakage,
    EvalOrderChange,
    IncompleteRewrite,
    OneofFieldAccess,
    ShallowCopy,
    MaybeOneofChange,
    MaybeSemanticChange,
    MaybeNilPointerDeref,
}

impl UnsafeReason {
    pub const ALL: [UnsafeReason; 11] = [
        UnsafeReason::PointerAlias,
        UnsafeReason::SliceAlias,
        UnsafeReason::InexpressibleApiUsage,
        UnsafeReason::PotentialBuildBreakage,
        UnsafeReason::EvalOrderChange,
        UnsafeReason::IncompleteRewrite,
        UnsafeReason::OneofFieldAccess,
        UnsafeReason::ShallowCopy,
        UnsafeReason::MaybeOneofChange,
        UnsafeReason::MaybeSemanticChange,
        UnsafeReason::MaybeNilPointerDeref,
    ];
}
