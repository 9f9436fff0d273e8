//! Per-variable records of the class report.
//!
//! `VarInfo` is a closed enum over one shared record. Override links are
//! indices into the owning report's variable list, never references, and
//! every query is a free function doing case analysis on the tag.

use crate::result::{Dependencies, InterClassPair, Invalidator};
use bindc_tree::{BindStatus, SymbolFlags, SymbolId, SymbolTable, TypeId};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VarFlags: u16 {
        /// Declared with `def`.
        const READ_ONLY = 1 << 0;
        const STATIC = 1 << 1;
        /// Reached through `get$`/`set$` rather than the storage field.
        const NEEDS_ACCESSORS = 1 << 2;
        /// Gets storage, an offset and accessors in the class being built.
        const NEEDS_CLONING = 1 << 3;
        const OVERRIDE = 1 << 4;
        const SEQUENCE = 1 << 5;
    }
}

/// Translated binding facts for one variable, as recorded by the
/// orchestrator when it translated the declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarDeps {
    pub bind: BindStatus,
    pub has_init: bool,
    pub has_trigger: bool,
    pub bindees: Vec<SymbolId>,
    pub interclass: Vec<InterClassPair>,
    pub invalidators: Vec<Invalidator>,
}

impl VarDeps {
    pub fn new(bind: BindStatus, has_init: bool, has_trigger: bool, deps: &Dependencies) -> Self {
        Self {
            bind,
            has_init,
            has_trigger,
            bindees: deps.bindees.iter().copied().collect(),
            interclass: deps.interclass.iter().copied().collect(),
            invalidators: deps.invalidators.clone(),
        }
    }

    /// What the symbol table alone says about a variable translated
    /// somewhere else.
    pub fn from_symbol(symbols: &SymbolTable, sym: SymbolId) -> Self {
        let data = symbols
            .get(sym)
            .and_then(|s| s.var_data())
            .copied()
            .unwrap_or_default();
        Self {
            bind: data.bind,
            has_init: data.has_initializer,
            has_trigger: data.has_trigger,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarCommon {
    pub sym: SymbolId,
    pub name: String,
    pub ty: TypeId,
    /// Declaring class.
    pub owner: SymbolId,
    pub flags: VarFlags,
    /// Dense position among cloned, non-override variables.
    pub enumeration: Option<u32>,
    pub bind: BindStatus,
    pub has_initializer: bool,
    pub has_trigger: bool,
    pub bindees: Vec<SymbolId>,
    pub interclass: Vec<InterClassPair>,
    pub invalidators: Vec<Invalidator>,
    /// Index of the entry on the other side of an override link.
    pub proxy: Option<usize>,
    /// Own override folded into this cloned mixin variable.
    pub overriding_sym: Option<SymbolId>,
    /// Compiled accessor methods routed to this variable.
    pub accessors: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarInfo {
    /// Declared in the class being built.
    Translated(VarCommon),
    /// An override, declared in the class being built, of an inherited
    /// superclass variable.
    TranslatedOverride {
        common: VarCommon,
        overridden: SymbolId,
    },
    /// Inherited through ordinary subclassing; not cloned.
    SuperClass(VarCommon),
    /// Contributed by a mixin; cloned into the class being built.
    MixinClass { common: VarCommon, mixin: SymbolId },
}

impl VarInfo {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Translated(_) => "translated",
            Self::TranslatedOverride { .. } => "override",
            Self::SuperClass(_) => "superclass",
            Self::MixinClass { .. } => "mixin",
        }
    }
}

pub const fn common(info: &VarInfo) -> &VarCommon {
    match info {
        VarInfo::Translated(common)
        | VarInfo::TranslatedOverride { common, .. }
        | VarInfo::SuperClass(common)
        | VarInfo::MixinClass { common, .. } => common,
    }
}

pub const fn common_mut(info: &mut VarInfo) -> &mut VarCommon {
    match info {
        VarInfo::Translated(common)
        | VarInfo::TranslatedOverride { common, .. }
        | VarInfo::SuperClass(common)
        | VarInfo::MixinClass { common, .. } => common,
    }
}

pub fn sym(info: &VarInfo) -> SymbolId {
    common(info).sym
}

pub fn name(info: &VarInfo) -> &str {
    &common(info).name
}

pub fn is_static(info: &VarInfo) -> bool {
    common(info).flags.contains(VarFlags::STATIC)
}

pub fn is_sequence(info: &VarInfo) -> bool {
    common(info).flags.contains(VarFlags::SEQUENCE)
}

pub fn needs_cloning(info: &VarInfo) -> bool {
    common(info).flags.contains(VarFlags::NEEDS_CLONING)
}

pub fn needs_accessors(info: &VarInfo) -> bool {
    common(info).flags.contains(VarFlags::NEEDS_ACCESSORS)
}

pub const fn is_override(info: &VarInfo) -> bool {
    matches!(info, VarInfo::TranslatedOverride { .. })
}

pub const fn is_mixin_clone(info: &VarInfo) -> bool {
    matches!(info, VarInfo::MixinClass { .. })
}

pub fn enumeration(info: &VarInfo) -> Option<u32> {
    common(info).enumeration
}

pub fn bind_status(info: &VarInfo) -> BindStatus {
    common(info).bind
}

pub fn is_bound(info: &VarInfo) -> bool {
    common(info).bind.is_bound()
}

/// Whether the class being built applies a default for this variable.
pub fn has_default(info: &VarInfo) -> bool {
    match info {
        VarInfo::SuperClass(_) => false,
        _ => {
            let c = common(info);
            c.has_initializer || c.bind.is_bound()
        }
    }
}

/// The symbol whose offset field the class being built refers to: an
/// override addresses the slot of the variable it overrides.
pub fn slot_symbol(info: &VarInfo) -> SymbolId {
    match info {
        VarInfo::TranslatedOverride { overridden, .. } => *overridden,
        other => sym(other),
    }
}

/// Storage and protocol decision for a variable symbol, independent of any
/// class report.
///
/// Members of plain classes never use accessors. Mixin members always do,
/// since an interface cannot expose a field. Anything else skips accessors
/// only when it is script-private, never bound to, unbound and trigger-free.
pub fn symbol_needs_accessors(symbols: &SymbolTable, sym: SymbolId) -> bool {
    let Some(symbol) = symbols.get(sym) else {
        return false;
    };
    let Some(owner) = symbol.owner else {
        return false;
    };
    if !symbol.is_var() || !symbols.is_class(owner) {
        return false;
    }
    if symbols.has_flag(owner, SymbolFlags::JAVA_CLASS) {
        return false;
    }
    if symbols.is_mixin(owner) {
        return true;
    }
    let data = symbol.var_data().copied().unwrap_or_default();
    let private_and_quiet = symbol.flags.contains(SymbolFlags::SCRIPT_PRIVATE)
        && !symbol.flags.contains(SymbolFlags::BINDEE)
        && !data.bind.is_bound()
        && !data.has_trigger;
    !private_and_quiet
}
