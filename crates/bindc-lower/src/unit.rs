//! Mutable state owned by one compilation-unit translation.
//!
//! Everything in here lives exactly as long as one [`crate::Translator`].
//! Maps only grow: an entry added while translating one class stays visible
//! to every class translated after it in the same unit.

use crate::analyzer::VarDeps;
use crate::error::{LowerError, LowerResult};
use bindc_common::limits::PREPEND_BUFFER_CAPACITY;
use bindc_common::names;
use bindc_target::JNode;
use bindc_tree::{NodeIndex, SymbolId};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct UnitState {
    temp_counter: u32,
    /// Declarations that float to the nearest enclosing class.
    definitions: Vec<Vec<JNode>>,
    /// Statements that float to the top of the nearest enclosing block.
    statements: Vec<Vec<JNode>>,
    substitutions: FxHashMap<SymbolId, String>,
    outer_references: FxHashSet<SymbolId>,
    function_bodies: FxHashMap<SymbolId, NodeIndex>,
    known_vars: FxHashMap<SymbolId, VarDeps>,
    /// Classes whose generated form has `userInit$`/`postInit$` bodies.
    init_classes: FxHashSet<SymbolId>,
}

impl UnitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_temp(&mut self, hint: &str) -> String {
        self.temp_counter += 1;
        names::temp(hint, self.temp_counter)
    }

    // =========================================================================
    // Prepend buffers
    // =========================================================================

    pub fn push_definitions(&mut self) {
        self.definitions
            .push(Vec::with_capacity(PREPEND_BUFFER_CAPACITY));
    }

    pub fn pop_definitions(&mut self) -> LowerResult<Vec<JNode>> {
        self.definitions
            .pop()
            .ok_or_else(|| LowerError::internal("definition buffer popped without a scope"))
    }

    pub fn add_definition(&mut self, def: JNode) -> LowerResult<()> {
        let frame = self
            .definitions
            .last_mut()
            .ok_or_else(|| LowerError::internal("hoisted definition outside any class scope"))?;
        frame.push(def);
        Ok(())
    }

    pub fn push_statements(&mut self) {
        self.statements
            .push(Vec::with_capacity(PREPEND_BUFFER_CAPACITY));
    }

    pub fn pop_statements(&mut self) -> LowerResult<Vec<JNode>> {
        self.statements
            .pop()
            .ok_or_else(|| LowerError::internal("statement buffer popped without a block"))
    }

    pub fn add_block_statement(&mut self, stmt: JNode) -> LowerResult<()> {
        let frame = self
            .statements
            .last_mut()
            .ok_or_else(|| LowerError::internal("hoisted statement outside any block"))?;
        frame.push(stmt);
        Ok(())
    }

    pub fn has_block_scope(&self) -> bool {
        !self.statements.is_empty()
    }

    // =========================================================================
    // Monotonic maps
    // =========================================================================

    pub fn substitute(&mut self, sym: SymbolId, name: impl Into<String>) {
        self.substitutions.insert(sym, name.into());
    }

    pub fn substitution(&self, sym: SymbolId) -> Option<&str> {
        self.substitutions.get(&sym).map(String::as_str)
    }

    pub fn mark_outer_reference(&mut self, class: SymbolId) {
        self.outer_references.insert(class);
    }

    pub fn has_outer_reference(&self, class: SymbolId) -> bool {
        self.outer_references.contains(&class)
    }

    pub fn record_function_body(&mut self, function: SymbolId, body: NodeIndex) {
        self.function_bodies.insert(function, body);
    }

    pub fn function_body(&self, function: SymbolId) -> Option<NodeIndex> {
        self.function_bodies.get(&function).copied()
    }

    pub fn record_var(&mut self, sym: SymbolId, deps: VarDeps) {
        self.known_vars.insert(sym, deps);
    }

    pub const fn known_vars(&self) -> &FxHashMap<SymbolId, VarDeps> {
        &self.known_vars
    }

    pub fn mark_init_class(&mut self, class: SymbolId) {
        self.init_classes.insert(class);
    }

    pub fn has_init_blocks(&self, class: SymbolId) -> bool {
        self.init_classes.contains(&class)
    }
}
