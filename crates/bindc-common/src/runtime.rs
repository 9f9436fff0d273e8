//! Runtime-library catalog.
//!
//! The lowering core never implements or inlines runtime behavior; it emits
//! calls into a fixed set of helper classes. This module is the single list
//! of those entry points. Each [`RuntimeMethod`] knows whether it is a static
//! helper on a runtime class or an instance method invoked on a value the
//! translator already has (a duration, a sequence builder, a generated
//! object), and under which name.
//!
//! Overloads that would be ambiguous by arity get distinct names
//! (`set` / `setElement` / `replaceElement`), so a consumer can dispatch on
//! the name alone.

/// Runtime classes referenced by emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeClass {
    /// Static sequence helpers.
    Sequences,
    /// Null and equality helpers.
    Checks,
    /// Base class of every generated declarative class.
    FXBase,
    /// Interface every generated declarative class implements.
    FXObject,
    /// Element type descriptors.
    TypeInfo,
    /// Growable sequence builder used for comprehensions and explicit sequences.
    ArraySequence,
    /// Immutable sequence interface.
    Sequence,
    /// Time duration value type.
    Duration,
    /// Non-nullable pointer marker type.
    Pointer,
    /// `max` / `min` used by slice clamping.
    Math,
}

impl RuntimeClass {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sequences => "Sequences",
            Self::Checks => "Checks",
            Self::FXBase => "FXBase",
            Self::FXObject => "FXObject",
            Self::TypeInfo => "TypeInfo",
            Self::ArraySequence => "ArraySequence",
            Self::Sequence => "Sequence",
            Self::Duration => "Duration",
            Self::Pointer => "Pointer",
            Self::Math => "Math",
        }
    }

    /// Classes that live in the runtime package and need an import.
    pub const IMPORTED: &'static [RuntimeClass] = &[
        Self::Sequences,
        Self::Checks,
        Self::FXBase,
        Self::FXObject,
        Self::TypeInfo,
        Self::ArraySequence,
        Self::Sequence,
        Self::Duration,
        Self::Pointer,
    ];
}

/// Name of the function-value interface of the given arity (`Function2`).
pub fn function_class_name(arity: usize) -> String {
    format!("Function{arity}")
}

/// How a runtime method is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeReceiver {
    /// `Class.method(args)`
    Static(RuntimeClass),
    /// `value.method(args)`; the first argument supplied by the caller is the receiver.
    Instance,
}

/// Every runtime entry point the translator may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeMethod {
    // Sequences: queries
    SeqSize,
    SeqGet,
    SeqIsEqual,
    SeqEmpty,
    SeqSingleton,
    SeqRange,
    SeqRangeStep,
    SeqRangeExclusive,
    SeqRangeExclusiveStep,
    SeqSubsequence,
    SeqReverse,
    // Sequences: conversions
    SeqFromArray,
    SeqToArray,
    SeqConvertNumbers,
    SeqNumbersToChars,
    SeqCharsToNumbers,
    // Sequences: member mutation through (instance, offset)
    SeqSet,
    SeqSetElement,
    SeqInsert,
    SeqInsertBefore,
    SeqInsertAfter,
    SeqDeleteIndexed,
    SeqDeleteValue,
    SeqDeleteAll,
    // Sequences: value mutation of plain variables (returns the new sequence)
    SeqReplaceElement,
    SeqWithInserted,
    SeqWithInsertedBefore,
    SeqWithInsertedAfter,
    SeqWithDeletedIndex,
    SeqWithDeletedValue,
    // Builders
    BuilderAdd,
    BuilderAddAll,
    BuilderToSequence,
    // Null / equality
    ChecksEquals,
    ChecksIsNull,
    // Durations
    DurationValueOf,
    DurationAdd,
    DurationSub,
    DurationMul,
    DurationDiv,
    DurationLt,
    DurationLe,
    DurationGt,
    DurationGe,
    DurationNegate,
    // Object lifecycle and variable flags
    VarTestBits,
    VarChangeBits,
    NotifyDependents,
    SwitchDependence,
    MakeInitMap,
    // Type descriptors
    TypeInfoForClass,
    // Arithmetic helpers
    MathMax,
    MathMin,
}

impl RuntimeMethod {
    pub const fn receiver(self) -> RuntimeReceiver {
        use RuntimeClass as C;
        match self {
            Self::SeqSize
            | Self::SeqGet
            | Self::SeqIsEqual
            | Self::SeqEmpty
            | Self::SeqSingleton
            | Self::SeqRange
            | Self::SeqRangeStep
            | Self::SeqRangeExclusive
            | Self::SeqRangeExclusiveStep
            | Self::SeqSubsequence
            | Self::SeqReverse
            | Self::SeqFromArray
            | Self::SeqToArray
            | Self::SeqConvertNumbers
            | Self::SeqNumbersToChars
            | Self::SeqCharsToNumbers
            | Self::SeqSet
            | Self::SeqSetElement
            | Self::SeqInsert
            | Self::SeqInsertBefore
            | Self::SeqInsertAfter
            | Self::SeqDeleteIndexed
            | Self::SeqDeleteValue
            | Self::SeqDeleteAll
            | Self::SeqReplaceElement
            | Self::SeqWithInserted
            | Self::SeqWithInsertedBefore
            | Self::SeqWithInsertedAfter
            | Self::SeqWithDeletedIndex
            | Self::SeqWithDeletedValue => RuntimeReceiver::Static(C::Sequences),
            Self::ChecksEquals | Self::ChecksIsNull => RuntimeReceiver::Static(C::Checks),
            Self::DurationValueOf => RuntimeReceiver::Static(C::Duration),
            Self::MakeInitMap => RuntimeReceiver::Static(C::FXBase),
            Self::TypeInfoForClass => RuntimeReceiver::Static(C::TypeInfo),
            Self::MathMax | Self::MathMin => RuntimeReceiver::Static(C::Math),
            Self::BuilderAdd
            | Self::BuilderAddAll
            | Self::BuilderToSequence
            | Self::DurationAdd
            | Self::DurationSub
            | Self::DurationMul
            | Self::DurationDiv
            | Self::DurationLt
            | Self::DurationLe
            | Self::DurationGt
            | Self::DurationGe
            | Self::DurationNegate
            | Self::VarTestBits
            | Self::VarChangeBits
            | Self::NotifyDependents
            | Self::SwitchDependence => RuntimeReceiver::Instance,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SeqSize => "size",
            Self::SeqGet => "get",
            Self::SeqIsEqual => "isEqual",
            Self::SeqEmpty => "empty",
            Self::SeqSingleton => "singleton",
            Self::SeqRange | Self::SeqRangeStep => "range",
            Self::SeqRangeExclusive | Self::SeqRangeExclusiveStep => "rangeExclusive",
            Self::SeqSubsequence => "subsequence",
            Self::SeqReverse => "reverse",
            Self::SeqFromArray => "fromArray",
            Self::SeqToArray => "toArray",
            Self::SeqConvertNumbers => "convertNumberSequence",
            Self::SeqNumbersToChars => "convertNumberToCharSequence",
            Self::SeqCharsToNumbers => "convertCharToNumberSequence",
            Self::SeqSet => "set",
            Self::SeqSetElement => "setElement",
            Self::SeqInsert => "insert",
            Self::SeqInsertBefore => "insertBefore",
            Self::SeqInsertAfter => "insertAfter",
            Self::SeqDeleteIndexed => "deleteIndexed",
            Self::SeqDeleteValue => "deleteValue",
            Self::SeqDeleteAll => "deleteAll",
            Self::SeqReplaceElement => "replaceElement",
            Self::SeqWithInserted => "withInserted",
            Self::SeqWithInsertedBefore => "withInsertedBefore",
            Self::SeqWithInsertedAfter => "withInsertedAfter",
            Self::SeqWithDeletedIndex => "withDeletedIndex",
            Self::SeqWithDeletedValue => "withDeletedValue",
            Self::BuilderAdd => "add",
            Self::BuilderAddAll => "addAll",
            Self::BuilderToSequence => "toSequence",
            Self::ChecksEquals => "equals",
            Self::ChecksIsNull => "isNull",
            Self::DurationValueOf => "valueOf",
            Self::DurationAdd => "add",
            Self::DurationSub => "sub",
            Self::DurationMul => "mul",
            Self::DurationDiv => "div",
            Self::DurationLt => "lt",
            Self::DurationLe => "le",
            Self::DurationGt => "gt",
            Self::DurationGe => "ge",
            Self::DurationNegate => "negate",
            Self::VarTestBits => "varTestBits$",
            Self::VarChangeBits => "varChangeBits$",
            Self::NotifyDependents => "notifyDependents$",
            Self::SwitchDependence => "switchDependence$",
            Self::MakeInitMap => "makeInitMap$",
            Self::TypeInfoForClass => "forClass",
            Self::MathMax => "max",
            Self::MathMin => "min",
        }
    }
}

/// Variable flag bits understood by `varTestBits$` / `varChangeBits$`.
pub mod var_flags {
    /// The cached value of a bound variable is current.
    pub const IS_VALID: i32 = 1;
    /// The variable was given a value by an object literal; default
    /// application must skip it.
    pub const INIT_OBJ_LIT: i32 = 2;
    /// The variable has been initialized (by literal or default).
    pub const INITIALIZED: i32 = 4;
    /// The variable is bound.
    pub const IS_BOUND: i32 = 8;
    /// Any flag that means "already has its value".
    pub const INIT_MASK: i32 = INIT_OBJ_LIT | INITIALIZED;

    /// Runtime-visible names, as referenced by emitted code (`FXBase.VFLGS$IS_VALID`).
    pub const IS_VALID_NAME: &str = "VFLGS$IS_VALID";
    pub const INIT_OBJ_LIT_NAME: &str = "VFLGS$INIT_OBJ_LIT";
    pub const INITIALIZED_NAME: &str = "VFLGS$INITIALIZED";
    pub const IS_BOUND_NAME: &str = "VFLGS$IS_BOUND";
    pub const INIT_MASK_NAME: &str = "VFLGS$INIT_MASK";

    /// Resolves an emitted flag constant name to its value.
    pub fn value_of(name: &str) -> Option<i32> {
        match name {
            IS_VALID_NAME => Some(IS_VALID),
            INIT_OBJ_LIT_NAME => Some(INIT_OBJ_LIT),
            INITIALIZED_NAME => Some(INITIALIZED),
            IS_BOUND_NAME => Some(IS_BOUND),
            INIT_MASK_NAME => Some(INIT_MASK),
            _ => None,
        }
    }
}
