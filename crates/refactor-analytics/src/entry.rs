//! The analytics record shapes (spec §6 "Outputs produced for
//! collaborators"): one `Entry` per observed use of a tracked message
//! value, keyed by location, confidence level, semantic type, and a
//! typed `Use` discriminator.

use serde::{Deserialize, Serialize};

use refactor_common::{ConfidenceLevel, Location};

/// A semantic type's short and long name, as an analytics record needs
/// to report both (spec §6: "the involved semantic type (short and long
/// name)").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub short_name: String,
    pub long_name: String,
}

impl TypeRef {
    pub fn new(long_name: impl Into<String>) -> Self {
        let long_name = long_name.into();
        let short_name = long_name.rsplit('.').next().unwrap_or(&long_name).to_string();
        TypeRef { short_name, long_name }
    }
}

/// The node kind / parent kind pair an `Entry` reports alongside its
/// location (spec §6 "an `Expression` descriptor (node kind, parent
/// kind)"). Kept as plain strings rather than re-exporting `ExprKind`/
/// `StmtKind` directly: analytics consumers outside this workspace see
/// these records serialized, and a string tag is stable across DST
/// shape changes in a way a `#[derive(Serialize)]` on the node enums
/// themselves would not be.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub node_kind: String,
    pub parent_kind: Option<String>,
}

impl Expression {
    pub fn new(node_kind: impl Into<String>, parent_kind: Option<String>) -> Self {
        Expression { node_kind: node_kind.into(), parent_kind }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructorShape {
    Empty,
    NonEmptyLiteral,
    Builder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversionContext {
    Assignment,
    CallArgument,
    CompositeLiteralElement,
    Explicit,
    ChanSend,
    FuncRet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodCallSubtype {
    GetOneof,
    GetBuild,
}

/// The recognized uses an `Entry` can report (spec §6's eight-variant
/// list, in declaration order).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Use {
    Constructor {
        shape: ConstructorShape,
    },
    Conversion {
        context: ConversionContext,
        dest_type_name: String,
        func_arg: Option<String>,
    },
    ShallowCopy {
        context: ConversionContext,
    },
    MethodCall {
        method: String,
        subtype: MethodCallSubtype,
    },
    DirectFieldAccess {
        field_name: String,
        field_type: String,
    },
    InternalFieldAccess {
        field_name: String,
        field_type: String,
    },
    TypeAssertion {
        src_type: String,
    },
    /// Reported only by hosts: no type-declaration node exists in this
    /// engine's DST (it operates over function bodies, not top-level
    /// type specs), so `observe_file` never synthesizes this variant
    /// itself. Kept in the enum for API completeness with spec §6.
    TypeDefinition {
        new_type: String,
    },
    /// Reported only by hosts, for the same reason as `TypeDefinition`:
    /// struct-embedding is a declaration-site fact this engine's DST
    /// does not model.
    Embedding {
        field_index: u32,
    },
}

/// Whether an `Entry` describes a normal observation or a failure to
/// observe one (spec §6: "a `Status` of FAIL... when an expression
/// lacks type information").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Status {
    Ok,
    Fail { message: String },
}

impl Status {
    /// The one FAIL message spec §6 specifies verbatim.
    pub fn missing_type_info() -> Self {
        Status::Fail { message: "type information missing; are dependencies in a silo?".to_string() }
    }
}

/// One analytics observation (spec §6). `use_` is `None` exactly when
/// `status` is `Status::Fail`: a FAIL record reports that no use could
/// be classified, not a use with an invented shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub location: Location,
    pub level: ConfidenceLevel,
    pub ty: TypeRef,
    pub expression: Expression,
    #[serde(rename = "use")]
    pub use_: Option<Use>,
    pub status: Status,
}

impl Entry {
    pub fn observed(location: Location, level: ConfidenceLevel, ty: TypeRef, expression: Expression, use_: Use) -> Self {
        Entry { location, level, ty, expression, use_: Some(use_), status: Status::Ok }
    }

    /// A FAIL record for a node whose type could not be resolved. The
    /// rewrite at this site is skipped by the caller, never fabricated
    /// (spec §7 failure 1).
    pub fn missing_type(location: Location, level: ConfidenceLevel, expression: Expression) -> Self {
        Entry {
            location,
            level,
            ty: TypeRef::new(""),
            expression,
            use_: None,
            status: Status::missing_type_info(),
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self.status, Status::Fail { .. })
    }
}
