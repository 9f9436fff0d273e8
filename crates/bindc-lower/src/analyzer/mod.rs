//! Class Hierarchy Analysis
//!
//! Computes, for one class, the flattened view the class generator needs:
//! the superclass chain, the mixins it clones, every variable it stores or
//! inherits, every function it implements or forwards, and the dependency
//! maps that wire bound variables to the variables they read.
//!
//! Responsibilities:
//! - Walk the superclass chain first, then the declared supertypes
//! - Clone mixin members (transitively) and link own overrides to them
//! - Keep plain superclass members as inherited, uncloned entries
//! - Number cloned, non-override variables densely from zero
//! - Fold bindees, inter-object pairs and invalidators into reverse maps
//!
//! Note: cyclic or conflicting hierarchies are rejected by attribution
//! before lowering runs. The analyzer only refuses to visit a class twice.

mod func_info;
mod update_map;
mod var_info;

pub use func_info::{FuncInfo, func_sym, is_mixin_function};
pub use update_map::UpdateMap;
pub use var_info::{
    VarCommon, VarDeps, VarFlags, VarInfo, bind_status, common, common_mut, enumeration,
    has_default, is_bound, is_mixin_clone, is_override, is_sequence, is_static, name,
    needs_accessors, needs_cloning, slot_symbol, sym, symbol_needs_accessors,
};

use crate::error::{LowerError, LowerResult};
use bindc_common::limits::MAX_HIERARCHY_DEPTH;
use bindc_common::names;
use bindc_target::JNode;
use bindc_tree::{Program, Symbol, SymbolFlags, SymbolId, TypeId};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A variable declared in the class being analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnVar {
    pub sym: SymbolId,
    pub deps: VarDeps,
}

/// An override declared in the class being analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnOverride {
    pub sym: SymbolId,
    pub overridden: SymbolId,
    pub deps: VarDeps,
}

/// Everything the analyzer needs to know about one class.
#[derive(Debug, Clone, Copy)]
pub struct ClassInput<'a> {
    pub class: SymbolId,
    pub own_vars: &'a [OwnVar],
    pub own_overrides: &'a [OwnOverride],
    pub own_functions: &'a [SymbolId],
    /// Binding facts of variables translated earlier in the same unit.
    pub known: &'a FxHashMap<SymbolId, VarDeps>,
}

#[derive(Debug, Clone)]
pub struct ClassReport {
    pub class: SymbolId,
    /// Nearest superclass first.
    pub superclasses: Vec<SymbolId>,
    pub immediate_mixins: Vec<SymbolId>,
    /// Every mixin cloned into the class, in visit order.
    pub all_mixins: Vec<SymbolId>,
    pub vars: Vec<VarInfo>,
    pub functions: Vec<FuncInfo>,
    /// Own instance functions.
    pub class_functions: Vec<SymbolId>,
    /// Own static functions.
    pub script_functions: Vec<SymbolId>,
    /// Mixin functions the class must forward to their static implementation.
    pub needs_dispatch: IndexSet<SymbolId>,
    /// `bindee → indices of the variables bound to it`
    pub binders: IndexMap<SymbolId, Vec<usize>>,
    /// `bindee → statements its change must run`
    pub invalidators: IndexMap<SymbolId, Vec<JNode>>,
    pub instance_updates: UpdateMap,
    pub script_updates: UpdateMap,
    pub instance_count: u32,
    pub static_count: u32,
}

impl ClassReport {
    /// An empty report for `class`; the analyzer fills it in.
    pub fn new(class: SymbolId) -> Self {
        Self {
            class,
            superclasses: Vec::new(),
            immediate_mixins: Vec::new(),
            all_mixins: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            class_functions: Vec::new(),
            script_functions: Vec::new(),
            needs_dispatch: IndexSet::new(),
            binders: IndexMap::new(),
            invalidators: IndexMap::new(),
            instance_updates: UpdateMap::new(),
            script_updates: UpdateMap::new(),
            instance_count: 0,
            static_count: 0,
        }
    }

    pub fn var_index(&self, sym: SymbolId) -> Option<usize> {
        self.vars.iter().position(|info| var_info::sym(info) == sym)
    }

    pub fn var(&self, sym: SymbolId) -> Option<&VarInfo> {
        self.var_index(sym).map(|idx| &self.vars[idx])
    }

    /// Index of the entry that owns the storage slot of `sym`: the variable
    /// itself, or the cloned mixin entry an own override was folded into.
    pub fn slot_index(&self, sym: SymbolId) -> Option<usize> {
        self.vars.iter().position(|info| {
            var_info::sym(info) == sym || common(info).overriding_sym == Some(sym)
        })
    }

    /// Cloned instance variables in enumeration order.
    pub fn cloned_instance_vars(&self) -> Vec<(usize, &VarInfo)> {
        let mut cloned: Vec<(usize, &VarInfo)> = self
            .vars
            .iter()
            .enumerate()
            .filter(|(_, info)| !is_static(info) && enumeration(info).is_some())
            .collect();
        cloned.sort_by_key(|(_, info)| enumeration(info));
        cloned
    }

    /// Static variables in enumeration order.
    pub fn static_vars(&self) -> Vec<(usize, &VarInfo)> {
        let mut statics: Vec<(usize, &VarInfo)> = self
            .vars
            .iter()
            .enumerate()
            .filter(|(_, info)| is_static(info) && enumeration(info).is_some())
            .collect();
        statics.sort_by_key(|(_, info)| enumeration(info));
        statics
    }

    /// Whether `sym` has storage in the class being built.
    pub fn is_cloned_here(&self, sym: SymbolId) -> bool {
        self.slot_index(sym)
            .is_some_and(|idx| needs_cloning(&self.vars[idx]))
    }

    /// A bound variable caches its value only when every variable it reads
    /// is an instance variable whose changes reach this object.
    pub fn is_cached(&self, program: &Program, idx: usize) -> bool {
        let Some(info) = self.vars.get(idx) else {
            return false;
        };
        if !is_bound(info) || is_static(info) {
            return false;
        }
        common(info).bindees.iter().all(|bindee| {
            program
                .symbol(*bindee)
                .is_some_and(|s| s.is_var() && !s.is_static())
                && program.symbols.is_member_var(*bindee)
        })
    }
}

/// Builder for one class report.
///
/// This is a pure computation over the symbol table: it never looks at
/// tree nodes. Binding facts come in through [`ClassInput`].
pub struct ClassAnalyzer<'a> {
    program: &'a Program,
    input: ClassInput<'a>,
    report: ClassReport,
    visited: FxHashSet<SymbolId>,
    /// `(name, type)` of every variable already in the report.
    seen_vars: FxHashSet<(String, TypeId)>,
    seen_functions: FxHashSet<String>,
}

impl<'a> ClassAnalyzer<'a> {
    pub fn new(program: &'a Program, input: ClassInput<'a>) -> Self {
        Self {
            program,
            input,
            report: ClassReport::new(input.class),
            visited: FxHashSet::default(),
            seen_vars: FxHashSet::default(),
            seen_functions: FxHashSet::default(),
        }
    }

    /// Runs the whole analysis.
    ///
    /// # Returns
    /// The flattened report, or an error when the class symbol is unknown
    /// or the hierarchy is deeper than [`MAX_HIERARCHY_DEPTH`].
    pub fn analyze(mut self) -> LowerResult<ClassReport> {
        let class = self.input.class;
        let data = self
            .program
            .symbol(class)
            .and_then(Symbol::class_data)
            .ok_or(LowerError::UnknownSymbol(class.0))?
            .clone();
        self.visited.insert(class);

        let mut current = data.superclass;
        let mut steps = 0;
        while let Some(sup) = current {
            self.report.superclasses.push(sup);
            current = self
                .program
                .symbol(sup)
                .and_then(Symbol::class_data)
                .and_then(|d| d.superclass);
            steps += 1;
            if steps > MAX_HIERARCHY_DEPTH {
                return Err(LowerError::DepthExceeded {
                    limit: MAX_HIERARCHY_DEPTH,
                });
            }
        }

        if let Some(sup) = data.superclass {
            self.visit(sup, false, 1)?;
        }
        for supertype in &data.supertypes {
            let is_mixin = self.program.symbols.is_mixin(*supertype);
            if is_mixin {
                self.report.immediate_mixins.push(*supertype);
            }
            self.visit(*supertype, is_mixin, 1)?;
        }

        self.add_own_members();
        self.enumerate();
        self.fold_dependencies();

        debug!(
            class = %self.program.symbols.name(class),
            vars = self.report.vars.len(),
            instance_count = self.report.instance_count,
            mixins = self.report.all_mixins.len(),
            dispatch = self.report.needs_dispatch.len(),
            "class analyzed"
        );
        Ok(self.report)
    }

    /// Depth-first: a class's own superclass and supertypes come before its
    /// members. `cloning` is true while the path from the analyzed class
    /// runs through mixins only.
    fn visit(&mut self, class: SymbolId, cloning: bool, depth: u32) -> LowerResult<()> {
        if depth > MAX_HIERARCHY_DEPTH {
            return Err(LowerError::DepthExceeded {
                limit: MAX_HIERARCHY_DEPTH,
            });
        }
        if !self.visited.insert(class) {
            return Ok(());
        }
        let Some(data) = self.program.symbol(class).and_then(Symbol::class_data) else {
            return Err(LowerError::UnknownSymbol(class.0));
        };
        let data = data.clone();

        if let Some(sup) = data.superclass {
            self.visit(sup, false, depth + 1)?;
        }
        for supertype in &data.supertypes {
            let next_cloning = cloning && self.program.symbols.is_mixin(*supertype);
            self.visit(*supertype, next_cloning, depth + 1)?;
        }

        let clone = cloning && self.program.symbols.is_mixin(class);
        if clone {
            self.report.all_mixins.push(class);
        }

        // Compiled classes store members newest-first.
        let members: Vec<SymbolId> = if self.program.symbols.has_flag(class, SymbolFlags::COMPILED) {
            data.members.iter().rev().copied().collect()
        } else {
            data.members.clone()
        };

        for member in &members {
            let Some(symbol) = self.program.symbol(*member) else {
                continue;
            };
            if symbol.is_var() && !symbol.is_static() {
                self.add_inherited_var(*member, class, clone);
            }
        }
        for member in &members {
            let Some(symbol) = self.program.symbol(*member) else {
                continue;
            };
            if symbol.is_function() && !symbol.is_static() {
                self.add_inherited_function(*member, class, clone);
            }
        }
        Ok(())
    }

    fn add_inherited_var(&mut self, var: SymbolId, owner: SymbolId, clone: bool) {
        let Some(symbol) = self.program.symbol(var) else {
            return;
        };
        let key = (symbol.name.clone(), symbol.ty);
        if !self.seen_vars.insert(key) {
            return;
        }
        let deps = self
            .input
            .known
            .get(&var)
            .cloned()
            .unwrap_or_else(|| VarDeps::from_symbol(&self.program.symbols, var));
        let mut common = self.make_common(var, owner, &deps);
        if clone {
            common.flags |= VarFlags::NEEDS_CLONING | VarFlags::NEEDS_ACCESSORS;
            self.report.vars.push(VarInfo::MixinClass { common, mixin: owner });
        } else {
            self.report.vars.push(VarInfo::SuperClass(common));
        }
    }

    fn add_inherited_function(&mut self, function: SymbolId, owner: SymbolId, clone: bool) {
        let Some(symbol) = self.program.symbol(function) else {
            return;
        };
        if names::is_internal_method_name(&symbol.name) {
            return;
        }
        let real = !symbol
            .flags
            .intersects(SymbolFlags::ABSTRACT | SymbolFlags::SYNTHETIC);
        let duplicate = !self.seen_functions.insert(symbol.name.clone());

        if clone && real {
            if let Some(var_name) = names::accessor_var_name(&symbol.name)
                && let Some(info) = self
                    .report
                    .vars
                    .iter_mut()
                    .find(|info| var_info::name(info) == var_name && is_mixin_clone(info))
            {
                common_mut(info).accessors.push(function);
                return;
            }
            let overridden_here = self
                .input
                .own_functions
                .iter()
                .any(|own| self.program.symbols.name(*own) == symbol.name);
            if !overridden_here {
                self.report.needs_dispatch.insert(function);
            }
        }
        if duplicate {
            return;
        }
        if clone {
            self.report.functions.push(FuncInfo::MixinClass {
                sym: function,
                mixin: owner,
            });
        } else {
            self.report.functions.push(FuncInfo::SuperClass { sym: function });
        }
    }

    fn make_common(&self, var: SymbolId, owner: SymbolId, deps: &VarDeps) -> VarCommon {
        let symbols = &self.program.symbols;
        let symbol = symbols.get(var);
        let ty = symbol.map_or(TypeId::OBJECT, |s| s.ty);
        let mut flags = VarFlags::empty();
        if symbols.has_flag(var, SymbolFlags::DEF) {
            flags |= VarFlags::READ_ONLY;
        }
        if symbols.has_flag(var, SymbolFlags::STATIC) {
            flags |= VarFlags::STATIC;
        }
        if symbol_needs_accessors(symbols, var) {
            flags |= VarFlags::NEEDS_ACCESSORS;
        }
        if self.program.types.is_sequence(ty) {
            flags |= VarFlags::SEQUENCE;
        }
        VarCommon {
            sym: var,
            name: symbols.name(var).to_string(),
            ty,
            owner,
            flags,
            enumeration: None,
            bind: deps.bind,
            has_initializer: deps.has_init,
            has_trigger: deps.has_trigger,
            bindees: deps.bindees.clone(),
            interclass: deps.interclass.clone(),
            invalidators: deps.invalidators.clone(),
            proxy: None,
            overriding_sym: None,
            accessors: Vec::new(),
        }
    }

    fn add_own_members(&mut self) {
        let class = self.input.class;
        for own in self.input.own_vars {
            let mut common = self.make_common(own.sym, class, &own.deps);
            common.flags |= VarFlags::NEEDS_CLONING;
            if let Some(symbol) = self.program.symbol(own.sym) {
                self.seen_vars.insert((symbol.name.clone(), symbol.ty));
            }
            self.report.vars.push(VarInfo::Translated(common));
        }

        for own in self.input.own_overrides {
            let overridden_name = self.program.symbols.name(own.overridden).to_string();
            let target = self.report.vars.iter().position(|info| {
                var_info::sym(info) == own.overridden
                    || (!is_override(info) && var_info::name(info) == overridden_name)
            });
            match target {
                // An override of a cloned mixin variable re-specifies the
                // clone instead of adding an entry.
                Some(idx) if is_mixin_clone(&self.report.vars[idx]) => {
                    let entry = common_mut(&mut self.report.vars[idx]);
                    entry.overriding_sym = Some(own.sym);
                    if own.deps.has_init || own.deps.bind.is_bound() {
                        entry.bind = own.deps.bind;
                        entry.has_initializer = own.deps.has_init;
                        entry.bindees = own.deps.bindees.clone();
                        entry.interclass = own.deps.interclass.clone();
                        entry.invalidators = own.deps.invalidators.clone();
                    }
                    entry.has_trigger |= own.deps.has_trigger;
                }
                other => {
                    let mut common = self.make_common(own.sym, class, &own.deps);
                    common.name = overridden_name;
                    common.flags |= VarFlags::OVERRIDE;
                    if symbol_needs_accessors(&self.program.symbols, own.overridden) {
                        common.flags |= VarFlags::NEEDS_ACCESSORS;
                    }
                    common.proxy = other;
                    let new_idx = self.report.vars.len();
                    if let Some(idx) = other {
                        common_mut(&mut self.report.vars[idx]).proxy = Some(new_idx);
                    }
                    self.report.vars.push(VarInfo::TranslatedOverride {
                        common,
                        overridden: own.overridden,
                    });
                }
            }
        }

        for function in self.input.own_functions {
            let is_static = self.program.symbols.has_flag(*function, SymbolFlags::STATIC);
            if is_static {
                self.report.script_functions.push(*function);
            } else {
                self.report.class_functions.push(*function);
            }
            self.report.functions.push(FuncInfo::Translated {
                sym: *function,
                is_static,
            });
        }
    }

    fn enumerate(&mut self) {
        let mut instance = 0u32;
        let mut statics = 0u32;
        for info in &mut self.report.vars {
            if !needs_cloning(info) || is_override(info) {
                continue;
            }
            let common = common_mut(info);
            if common.flags.contains(VarFlags::STATIC) {
                common.enumeration = Some(statics);
                statics += 1;
            } else {
                common.enumeration = Some(instance);
                instance += 1;
            }
        }
        self.report.instance_count = instance;
        self.report.static_count = statics;
    }

    fn fold_dependencies(&mut self) {
        let class = self.input.class;
        let mut binders: IndexMap<SymbolId, Vec<usize>> = IndexMap::new();
        let mut invalidators: IndexMap<SymbolId, Vec<JNode>> = IndexMap::new();
        let mut instance_updates = UpdateMap::new();
        let mut script_updates = UpdateMap::new();

        for (idx, info) in self.report.vars.iter().enumerate() {
            if matches!(info, VarInfo::SuperClass(_)) {
                continue;
            }
            let common = common(info);
            let statik = common.flags.contains(VarFlags::STATIC);
            for bindee in &common.bindees {
                let entry = binders.entry(*bindee).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
            for inv in &common.invalidators {
                let stmts = invalidators.entry(inv.bindee).or_default();
                if !stmts.contains(&inv.stmt) {
                    stmts.push(inv.stmt.clone());
                }
            }
            for pair in &common.interclass {
                if statik {
                    script_updates.add(pair.instance, pair.referenced, idx);
                } else {
                    instance_updates.add(pair.instance, pair.referenced, idx);
                }
            }
        }

        // Inherited instance variables change inside superclass setters,
        // which only announce the change; route those through `update$`
        // with this object as the source.
        for (bindee, dependents) in &binders {
            let inherited = self
                .report
                .vars
                .iter()
                .any(|info| matches!(info, VarInfo::SuperClass(c) if c.sym == *bindee));
            if !inherited {
                continue;
            }
            for dependent in dependents {
                instance_updates.add(class, *bindee, *dependent);
            }
        }

        self.report.binders = binders;
        self.report.invalidators = invalidators;
        self.report.instance_updates = instance_updates;
        self.report.script_updates = script_updates;
    }
}

/// Convenience wrapper around [`ClassAnalyzer`].
pub fn analyze(program: &Program, input: ClassInput<'_>) -> LowerResult<ClassReport> {
    ClassAnalyzer::new(program, input).analyze()
}
