//! The descriptor oracle — an external collaborator (spec §6) the host
//! supplies. The engine never inspects wire-format descriptors itself;
//! it only asks this trait the handful of questions the rewrite rules
//! need answered.

use crate::sem_type::{Edition, TypeName};

/// Opaque identifier for a one-of group within one message type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OneofGroupId(pub u32);

/// The generated-field kind for one field of a tracked message type
/// (spec §3 field-level queries: has-explicit-presence, is-one-of,
/// is-bytes; spec §4.2's five-way presence-kind dispatch needs exactly
/// this shape).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar { explicit_presence: bool },
    Message,
    Repeated,
    Map,
    Bytes,
    OneOf { group: OneofGroupId },
}

impl FieldKind {
    pub fn has_explicit_presence(&self) -> bool {
        matches!(self, FieldKind::Scalar { explicit_presence: true } | FieldKind::Message)
    }

    pub fn is_one_of(&self) -> bool {
        matches!(self, FieldKind::OneOf { .. })
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, FieldKind::Bytes)
    }
}

/// One variant of a one-of group: the wrapper type `T_<Variant>` and the
/// setter/sentinel names the generator produces for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantInfo {
    /// `<Variant>` in `T_<Variant>`.
    pub variant: String,
    /// The field inside the wrapper struct holding the payload, e.g.
    /// `StringOneof` in `T_StringOneof{StringOneof: v}`.
    pub inner_field: String,
}

/// Descriptor facts about a message type's fields and editions,
/// supplied by the host (spec §6 "Descriptor oracle").
pub trait DescriptorOracle {
    /// `None` if `ty` does not carry the framework's message marker at all.
    fn edition(&self, ty: &TypeName) -> Option<Edition>;

    /// Whether `ty` carries the canonical marker method identifying it
    /// as a serialization message (spec §3 `isMessage`, first clause).
    fn has_message_marker(&self, ty: &TypeName) -> bool;

    fn field_kind(&self, ty: &TypeName, field: &str) -> Option<FieldKind>;

    /// Whether `ty` is a named record ending in `_builder` with a
    /// zero-arg `Build` method returning a pointer to a tracked message
    /// (spec §3 `isBuilder`). Implemented by the host because only it
    /// can see the generated builder's method set.
    fn is_builder_type(&self, ty: &TypeName) -> bool;

    /// The one-of group a field belongs to, if any.
    fn oneof_group(&self, ty: &TypeName, field: &str) -> Option<OneofGroupId>;

    fn oneof_variants(&self, ty: &TypeName, group: OneofGroupId) -> Vec<VariantInfo>;

    /// Whether a named record is the wrapper-interface type the
    /// generator produces to discriminate a one-of group (spec §3
    /// `isOneOf`: `<Package>.is<Msg>_<Field>` naming pattern).
    fn is_oneof_interface(&self, ty: &TypeName) -> bool;

    /// A message field named `Build` must have its builder-record
    /// counterpart renamed to `Build_` (spec §4.4 "Field renaming").
    fn field_names(&self, ty: &TypeName) -> Vec<String>;

    /// The target message type of a message-typed or one-of field, and
    /// whether it is held by pointer, if `field` names one. `None` for
    /// scalar/bytes/repeated/map fields, or when `field` is unknown.
    ///
    /// Supplements the field-kind query with the one extra fact the
    /// analytics emitter's message-dependency recursion (spec §7.4)
    /// needs that `field_kind` alone doesn't carry: *which* message type
    /// a `FieldKind::Message` field points at. Defaulted to `None` so
    /// existing hosts answering only the presence-kind questions in
    /// spec §3/§4.2 are unaffected.
    fn message_field_type(&self, _ty: &TypeName, _field: &str) -> Option<(TypeName, bool)> {
        None
    }
}
