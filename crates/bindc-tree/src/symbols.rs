//! Resolved symbols.
//!
//! A symbol identifies a declared entity: a class, a member variable, a
//! function, a local or a parameter. Symbols are created by the attribution
//! pass and shared by id between the tree and the lowering core; lowering
//! never creates source symbols, only synthetic target names.

use crate::types::TypeId;
use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u32 {
        const STATIC = 1 << 0;
        const PUBLIC = 1 << 1;
        /// Visible only inside its script; may skip the accessor protocol.
        const SCRIPT_PRIVATE = 1 << 2;
        /// Declared with `def` (read-only after initialization).
        const DEF = 1 << 3;
        const MIXIN = 1 << 4;
        const ABSTRACT = 1 << 5;
        const SYNTHETIC = 1 << 6;
        /// Read from compiled form; class members are stored newest-first.
        const COMPILED = 1 << 7;
        /// A plain target-language class, not a declarative one.
        const JAVA_CLASS = 1 << 8;
        /// Referenced from at least one bind expression.
        const BINDEE = 1 << 9;
        const BOUND_FUNCTION = 1 << 10;
        const ANONYMOUS = 1 << 11;
        /// The class that holds a script's top-level members.
        const SCRIPT = 1 << 12;
    }
}

/// How a variable or object-literal part is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindStatus {
    #[default]
    Unbound,
    /// `bind expr`
    Bound,
    /// `bind expr with inverse`
    Bidirectional,
}

impl BindStatus {
    pub const fn is_bound(self) -> bool {
        !matches!(self, Self::Unbound)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassData {
    pub superclass: Option<SymbolId>,
    /// Declared supertypes other than the superclass: mixins and interfaces.
    pub supertypes: Vec<SymbolId>,
    /// Member symbols. Declaration order for source classes, newest-first
    /// for classes flagged `COMPILED`.
    pub members: Vec<SymbolId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarData {
    pub has_initializer: bool,
    pub bind: BindStatus,
    pub has_trigger: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionData {
    pub params: Vec<SymbolId>,
    pub ret: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Class(ClassData),
    Var(VarData),
    Function(FunctionData),
    Local,
    Param,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub owner: Option<SymbolId>,
    pub flags: SymbolFlags,
    pub ty: TypeId,
}

impl Symbol {
    pub fn is_static(&self) -> bool {
        self.flags.contains(SymbolFlags::STATIC)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, SymbolKind::Class(_))
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, SymbolKind::Var(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn is_local(&self) -> bool {
        matches!(self.kind, SymbolKind::Local | SymbolKind::Param)
    }

    pub fn is_mixin(&self) -> bool {
        self.flags.contains(SymbolFlags::MIXIN)
    }

    pub fn class_data(&self) -> Option<&ClassData> {
        match &self.kind {
            SymbolKind::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn var_data(&self) -> Option<&VarData> {
        match &self.kind {
            SymbolKind::Var(data) => Some(data),
            _ => None,
        }
    }

    pub fn function_data(&self) -> Option<&FunctionData> {
        match &self.kind {
            SymbolKind::Function(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, sym)| (SymbolId(i as u32), sym))
    }

    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id).map_or("<unknown>", |sym| sym.name.as_str())
    }

    pub fn owner(&self, id: SymbolId) -> Option<SymbolId> {
        self.get(id).and_then(|sym| sym.owner)
    }

    pub fn flags(&self, id: SymbolId) -> SymbolFlags {
        self.get(id).map_or(SymbolFlags::empty(), |sym| sym.flags)
    }

    pub fn has_flag(&self, id: SymbolId, flag: SymbolFlags) -> bool {
        self.flags(id).contains(flag)
    }

    /// A variable owned by a class: participates in the class's state and
    /// may need the accessor protocol.
    pub fn is_member_var(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|sym| {
            sym.is_var() && sym.owner.is_some_and(|owner| self.is_class(owner))
        })
    }

    pub fn is_class(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(Symbol::is_class)
    }

    pub fn is_mixin(&self, id: SymbolId) -> bool {
        self.has_flag(id, SymbolFlags::MIXIN)
    }

    /// The enclosing class of a symbol, walking through non-class owners.
    pub fn enclosing_class(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = self.owner(id);
        while let Some(owner) = current {
            if self.is_class(owner) {
                return Some(owner);
            }
            current = self.owner(owner);
        }
        None
    }

    /// Dotted name of a class including its enclosing classes (`Main.Point`).
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = vec![self.name(id).to_string()];
        let mut current = self.owner(id);
        while let Some(owner) = current {
            if self.is_class(owner) {
                parts.push(self.name(owner).to_string());
            }
            current = self.owner(owner);
        }
        parts.reverse();
        parts.join(".")
    }

    /// Is `class` equal to or a (transitive) subclass of `ancestor`?
    pub fn is_subclass(&self, class: SymbolId, ancestor: SymbolId) -> bool {
        let mut current = Some(class);
        let mut steps = 0;
        while let Some(cls) = current {
            if cls == ancestor {
                return true;
            }
            let Some(data) = self.get(cls).and_then(Symbol::class_data) else {
                return false;
            };
            if data.supertypes.contains(&ancestor) {
                return true;
            }
            current = data.superclass;
            steps += 1;
            if steps > crate::MAX_OWNER_CHAIN {
                return false;
            }
        }
        false
    }
}
