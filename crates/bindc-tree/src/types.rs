//! Resolved source types.
//!
//! Types are interned: every distinct [`TypeKind`] gets one [`TypeId`], so
//! type equality is id equality. The builtin types occupy fixed ids (see the
//! associated constants on [`TypeId`]) and are present in every table.
//!
//! The table is immutable once the attribution pass hands it over. Queries
//! are total: an id this table never produced reads as `Object`.

use crate::symbols::SymbolId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    /// Type of the `null` literal.
    pub const NULL: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    pub const CHAR: TypeId = TypeId(3);
    pub const BYTE: TypeId = TypeId(4);
    pub const SHORT: TypeId = TypeId(5);
    pub const INT: TypeId = TypeId(6);
    pub const LONG: TypeId = TypeId(7);
    pub const FLOAT: TypeId = TypeId(8);
    pub const DOUBLE: TypeId = TypeId(9);
    pub const STRING: TypeId = TypeId(10);
    pub const DURATION: TypeId = TypeId(11);
    pub const OBJECT: TypeId = TypeId(12);
    /// Non-nullable pointer marker type.
    pub const POINTER: TypeId = TypeId(13);
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::VOID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Null,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Duration,
    Object,
    Pointer,
    /// Instance type of a declared class.
    Class(SymbolId),
    /// Immutable sequence of elements.
    Sequence(TypeId),
    /// Native array.
    Array(TypeId),
    Function { params: Vec<TypeId>, ret: TypeId },
}

const BUILTINS: [TypeKind; 14] = [
    TypeKind::Void,
    TypeKind::Null,
    TypeKind::Boolean,
    TypeKind::Char,
    TypeKind::Byte,
    TypeKind::Short,
    TypeKind::Int,
    TypeKind::Long,
    TypeKind::Float,
    TypeKind::Double,
    TypeKind::String,
    TypeKind::Duration,
    TypeKind::Object,
    TypeKind::Pointer,
];

static UNKNOWN: TypeKind = TypeKind::Object;

#[derive(Debug, Clone)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    lookup: FxHashMap<TypeKind, TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = TypeTable {
            kinds: Vec::with_capacity(32),
            lookup: FxHashMap::default(),
        };
        for kind in BUILTINS {
            table.intern(kind);
        }
        table
    }

    /// Intern a type, returning the existing id when already present.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.lookup.get(&kind) {
            return id;
        }
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.lookup.insert(kind, id);
        id
    }

    pub fn sequence_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Sequence(elem))
    }

    pub fn array_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Array(elem))
    }

    pub fn class(&mut self, sym: SymbolId) -> TypeId {
        self.intern(TypeKind::Class(sym))
    }

    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeKind::Function { params, ret })
    }

    /// Find an already interned type without adding it.
    pub fn lookup(&self, kind: &TypeKind) -> Option<TypeId> {
        self.lookup.get(kind).copied()
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        self.kinds.get(id.0 as usize).unwrap_or(&UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // =========================================================================
    // Classification
    // =========================================================================

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Void)
    }

    pub fn is_null(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Null)
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Boolean
                | TypeKind::Char
                | TypeKind::Byte
                | TypeKind::Short
                | TypeKind::Int
                | TypeKind::Long
                | TypeKind::Float
                | TypeKind::Double
        )
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.numeric_rank(id).is_some()
    }

    pub fn is_integral(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Byte | TypeKind::Short | TypeKind::Int | TypeKind::Long
        )
    }

    /// Widening order of numeric types; `None` for everything else.
    pub fn numeric_rank(&self, id: TypeId) -> Option<u8> {
        match self.kind(id) {
            TypeKind::Byte => Some(1),
            TypeKind::Short => Some(2),
            TypeKind::Int => Some(3),
            TypeKind::Long => Some(4),
            TypeKind::Float => Some(5),
            TypeKind::Double => Some(6),
            _ => None,
        }
    }

    pub fn is_char(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Char)
    }

    pub fn is_boolean(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Boolean)
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::String)
    }

    pub fn is_duration(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Duration)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Pointer)
    }

    pub fn is_sequence(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Sequence(_))
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Array(_))
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Function { .. })
    }

    /// Everything that is neither primitive, void, nor the null type.
    pub fn is_reference(&self, id: TypeId) -> bool {
        !self.is_primitive(id) && !self.is_void(id) && !self.is_null(id)
    }

    /// Element type of a sequence or array.
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Sequence(elem) | TypeKind::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    pub fn class_symbol(&self, id: TypeId) -> Option<SymbolId> {
        match self.kind(id) {
            TypeKind::Class(sym) => Some(*sym),
            _ => None,
        }
    }

    pub fn function_signature(&self, id: TypeId) -> Option<(&[TypeId], TypeId)> {
        match self.kind(id) {
            TypeKind::Function { params, ret } => Some((params.as_slice(), *ret)),
            _ => None,
        }
    }

    /// Short human-readable form, used in error messages and logs.
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Void => "Void".into(),
            TypeKind::Null => "null".into(),
            TypeKind::Boolean => "Boolean".into(),
            TypeKind::Char => "Character".into(),
            TypeKind::Byte => "Byte".into(),
            TypeKind::Short => "Short".into(),
            TypeKind::Int => "Integer".into(),
            TypeKind::Long => "Long".into(),
            TypeKind::Float => "Float".into(),
            TypeKind::Double => "Double".into(),
            TypeKind::String => "String".into(),
            TypeKind::Duration => "Duration".into(),
            TypeKind::Object => "Object".into(),
            TypeKind::Pointer => "Pointer".into(),
            TypeKind::Class(sym) => format!("class#{}", sym.0),
            TypeKind::Sequence(elem) => format!("{}[]", self.display(*elem)),
            TypeKind::Array(elem) => format!("nativearray of {}", self.display(*elem)),
            TypeKind::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.display(*p)).collect();
                format!("function({}):{}", params.join(","), self.display(*ret))
            }
        }
    }
}
