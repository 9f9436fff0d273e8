//! Per-function records of the class report.

use bindc_tree::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncInfo {
    /// Declared in the class being built.
    Translated { sym: SymbolId, is_static: bool },
    /// Inherited through ordinary subclassing.
    SuperClass { sym: SymbolId },
    /// Implemented statically by a mixin; the class gets a forwarder.
    MixinClass { sym: SymbolId, mixin: SymbolId },
}

pub const fn func_sym(info: &FuncInfo) -> SymbolId {
    match info {
        FuncInfo::Translated { sym, .. }
        | FuncInfo::SuperClass { sym }
        | FuncInfo::MixinClass { sym, .. } => *sym,
    }
}

pub const fn is_mixin_function(info: &FuncInfo) -> bool {
    matches!(info, FuncInfo::MixinClass { .. })
}
