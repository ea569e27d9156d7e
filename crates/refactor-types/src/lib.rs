//! Type oracle and message-shape oracle (spec §3) for the opaque-API
//! migration engine.

pub mod descriptor;
pub mod eligibility;
pub mod message_shape;
pub mod oracle;
pub mod sem_type;

pub use descriptor::{DescriptorOracle, FieldKind, OneofGroupId, VariantInfo};
pub use eligibility::{BuilderUseType, EligibilityInputs};
pub use message_shape::MessageShapeOracle;
pub use oracle::{ObjectId, PosNodeId, PositionOracle, TypeInfo};
pub use sem_type::{Edition, ScalarKind, SemType, TypeName, ValueCategory};
