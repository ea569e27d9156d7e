//! The message-shape oracle (spec §3 "Message-shape facts"): predicates
//! over semantic types deciding whether a type is a tracked message, is
//! eligible for rewriting, is a one-of wrapper, or is a builder record.

use crate::descriptor::{DescriptorOracle, FieldKind, OneofGroupId, VariantInfo};
use crate::eligibility::EligibilityInputs;
use crate::sem_type::{Edition, SemType, TypeName};

/// Combines a host-supplied [`DescriptorOracle`] with [`EligibilityInputs`]
/// to answer the four shape predicates from spec §3, plus the
/// field-level queries they're built from.
pub struct MessageShapeOracle<'a> {
    descriptors: &'a dyn DescriptorOracle,
    eligibility: &'a EligibilityInputs,
}

impl<'a> MessageShapeOracle<'a> {
    pub fn new(descriptors: &'a dyn DescriptorOracle, eligibility: &'a EligibilityInputs) -> Self {
        MessageShapeOracle { descriptors, eligibility }
    }

    /// `isMessage(T)`: `T` (or its pointer element) carries the
    /// canonical marker method, and its declared edition is not
    /// `open-v1`.
    pub fn is_message(&self, ty: &SemType) -> bool {
        let Some(name) = ty.as_named() else { return false };
        self.descriptors.has_message_marker(name)
            && self.descriptors.edition(name) != Some(Edition::OpenV1)
    }

    /// `isEligible(T)`: `isMessage(T)` and either the eligibility set is
    /// empty, or `T`'s fully qualified name is in it.
    pub fn is_eligible(&self, ty: &SemType) -> bool {
        let Some(name) = ty.as_named() else { return false };
        self.is_message(ty) && self.eligibility.is_eligible(name)
    }

    /// `isBuilder(T)`: named record whose name ends with `_builder` and
    /// exposes a zero-arg `Build` returning a pointer to a tracked
    /// message. The suffix check is a cheap pre-filter; the host's
    /// oracle makes the authoritative call.
    pub fn is_builder(&self, ty: &SemType) -> bool {
        let Some(name) = ty.as_named() else { return false };
        name.long_name().ends_with("_builder") && self.descriptors.is_builder_type(name)
    }

    /// `isOneOf(T)`: `T` is the generator's wrapper interface for a
    /// one-of group.
    pub fn is_one_of(&self, ty: &SemType) -> bool {
        match ty {
            SemType::OneofInterface(name) => self.descriptors.is_oneof_interface(name),
            _ => false,
        }
    }

    pub fn field_kind(&self, ty: &SemType, field: &str) -> Option<FieldKind> {
        let name = ty.as_named()?;
        self.descriptors.field_kind(name, field)
    }

    pub fn oneof_group(&self, ty: &SemType, field: &str) -> Option<OneofGroupId> {
        let name = ty.as_named()?;
        self.descriptors.oneof_group(name, field)
    }

    pub fn oneof_variants(&self, ty: &SemType, group: OneofGroupId) -> Vec<VariantInfo> {
        let Some(name) = ty.as_named() else { return Vec::new() };
        self.descriptors.oneof_variants(name, group)
    }

    /// The message's declared field names, used by the one-of sentinel
    /// naming rule to detect a collision with a sibling name (spec §4.5).
    pub fn field_names(&self, ty: &SemType) -> Vec<String> {
        let Some(name) = ty.as_named() else { return Vec::new() };
        self.descriptors.field_names(name)
    }

    /// The builder record's field name for a message field, applying
    /// the `Build` → `Build_` renaming rule (spec §4.4 "Field renaming").
    pub fn builder_field_name(&self, field: &str) -> String {
        if field == "Build" { "Build_".to_string() } else { field.to_string() }
    }

    /// Whether a scalar/message field at this type has explicit
    /// presence, per spec §4.2's edition-aware rule. Bytes/repeated/map/
    /// one-of fields are handled by their own branches in §4.2 and are
    /// not routed through this helper.
    pub fn has_explicit_presence(&self, ty: &SemType, field: &str) -> bool {
        self.field_kind(ty, field).map(|k| k.has_explicit_presence()).unwrap_or(false)
    }

    pub fn type_name(&self, ty: &SemType) -> Option<TypeName> {
        ty.as_named().cloned()
    }
}
