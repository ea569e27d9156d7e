//! `TypeInfo` — the type oracle side table (spec §3).
//!
//! A mapping from expression node to semantic type and value category; a
//! mapping from identifier node to the object it references; a mapping
//! from DST node to its position-bearing counterpart in the host's
//! parse tree. Lives for the duration of one package run; rules add
//! entries for every node they synthesize.

use rustc_hash::FxHashMap;

use refactor_ast::NodeId;

use crate::sem_type::{SemType, ValueCategory};

/// Opaque handle to the declaration/object an identifier resolves to,
/// as reported by the host's scope resolution. The engine treats this
/// as an inert key: it never needs to look inside it, only compare it
/// for identity (e.g. "does this identifier still refer to the same
/// local after a rewrite hoists it").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// Opaque handle to a node in the host's position-bearing parse tree
/// (spec §3: "a bidirectional map between DST nodes and the underlying
/// type-checker's syntax nodes").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PosNodeId(pub u32);

/// Host-supplied resolver from a position-bearing node reference (spec
/// §3's `PosNodeId` side of the bidirectional DST↔parse-tree map) back
/// to its byte span in the file's source text. The engine never stores
/// spans on DST nodes itself (spec §9 "the allocator must consult the
/// underlying type-checker's scope structure at the position of the
/// insertion point... because DST has no positions"); analytics
/// location reporting (spec §6) goes through this trait instead.
pub trait PositionOracle {
    fn span_of(&self, pos: PosNodeId) -> refactor_common::Span;
}

/// The type oracle. One instance per package run (spec §5).
#[derive(Debug, Default)]
pub struct TypeInfo {
    expr_types: FxHashMap<NodeId, SemType>,
    value_categories: FxHashMap<NodeId, ValueCategory>,
    ident_objects: FxHashMap<NodeId, ObjectId>,
    node_to_pos: FxHashMap<NodeId, PosNodeId>,
    pos_to_node: FxHashMap<PosNodeId, NodeId>,
}

impl TypeInfo {
    pub fn new() -> Self {
        TypeInfo::default()
    }

    pub fn set_type(&mut self, id: NodeId, ty: SemType) {
        self.expr_types.insert(id, ty);
    }

    /// Explicitly mark a node as having no derivable type (spec §3's
    /// "explicit invalid marker"), distinct from simply never calling
    /// `set_type` — the completeness check (spec §8) only flags the
    /// latter as an error.
    pub fn mark_invalid(&mut self, id: NodeId) {
        self.expr_types.insert(id, SemType::Invalid);
    }

    pub fn type_of(&self, id: NodeId) -> Option<&SemType> {
        self.expr_types.get(&id)
    }

    pub fn set_value_category(&mut self, id: NodeId, cat: ValueCategory) {
        self.value_categories.insert(id, cat);
    }

    pub fn is_addressable(&self, id: NodeId) -> bool {
        matches!(self.value_categories.get(&id), Some(ValueCategory::Addressable))
    }

    pub fn set_object(&mut self, ident: NodeId, object: ObjectId) {
        self.ident_objects.insert(ident, object);
    }

    pub fn object_of(&self, ident: NodeId) -> Option<ObjectId> {
        self.ident_objects.get(&ident).copied()
    }

    pub fn link_position(&mut self, dst: NodeId, pos: PosNodeId) {
        self.node_to_pos.insert(dst, pos);
        self.pos_to_node.insert(pos, dst);
    }

    pub fn position_of(&self, dst: NodeId) -> Option<PosNodeId> {
        self.node_to_pos.get(&dst).copied()
    }

    pub fn node_at_position(&self, pos: PosNodeId) -> Option<NodeId> {
        self.pos_to_node.get(&pos).copied()
    }

    /// Type-map completeness (spec §8): every reachable expression node
    /// must have an entry here, explicit-invalid or otherwise. Returns
    /// the nodes that don't — an empty result means the property holds.
    pub fn missing_entries(&self, arena: &refactor_ast::Arena, expr_ids: &[NodeId]) -> Vec<NodeId> {
        let _ = arena;
        expr_ids.iter().copied().filter(|id| !self.expr_types.contains_key(id)).collect()
    }
}
