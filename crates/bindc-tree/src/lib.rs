//! Attributed source tree consumed by the bindc lowering core.
//!
//! The attribution pass (external to this workspace) resolves every name and
//! type; this crate is the shape it hands over:
//! - Interned types (`types`)
//! - Resolved symbols (`symbols`)
//! - The node arena (`node`)
//! - A programmatic builder for front-ends and tests (`builder`)
//!
//! Everything here is read-only once a [`Program`] is built.

pub mod types;
pub use types::{TypeId, TypeKind, TypeTable};

pub mod symbols;
pub use symbols::{
    BindStatus, ClassData, FunctionData, Symbol, SymbolFlags, SymbolId, SymbolKind, SymbolTable,
    VarData,
};

pub mod node;
pub use node::{
    BinaryOp, CatchClause, ClassDecl, DeleteTarget, FunctionDef, InClause, InsertPosition,
    Literal, Node, NodeArena, NodeIndex, NodeKind, ObjectLiteralPart, OnReplace, OverrideVar,
    Script, UnaryOp, VarDecl,
};

pub mod builder;
pub use builder::TreeBuilder;

/// Longest owner or superclass chain walked by symbol queries.
pub const MAX_OWNER_CHAIN: u32 = 256;

/// A fully attributed compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    pub arena: NodeArena,
    pub symbols: SymbolTable,
    pub types: TypeTable,
    /// The `Script` node.
    pub root: NodeIndex,
}

impl Program {
    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.arena.get(idx)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Resolved type of a node; unknown nodes read as `Void`.
    pub fn type_of(&self, idx: NodeIndex) -> TypeId {
        self.arena.get(idx).map_or(TypeId::VOID, |node| node.ty)
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod types_tests;
