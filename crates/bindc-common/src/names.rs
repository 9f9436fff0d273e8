//! Synthetic-name registry.
//!
//! Every identifier the lowering core invents is built here, so that the
//! generated classes, the runtime library and any reflective tooling agree
//! on one naming convention. Names use `$` as a separator because the source
//! language cannot spell it, which keeps generated names from colliding with
//! user identifiers.
//!
//! | purpose                  | shape                 |
//! |--------------------------|-----------------------|
//! | storage field            | `$x`                  |
//! | getter / setter          | `get$x` / `set$x`     |
//! | bind expression          | `be$x`                |
//! | invalidation             | `invalidate$x`        |
//! | replace trigger          | `onReplace$x`         |
//! | sequence element / size  | `elem$x` / `size$x`   |
//! | mixin default value      | `default$x`           |
//! | variable offset          | `VOFF$x`              |
//! | offset getter (mixins)   | `getVOFF$x`           |
//! | variable count           | `VCNT$`               |
//! | offset-to-case map       | `MAP$C` / `GETMAP$C`  |
//! | mixin interface          | `C$Mixin`             |

// =============================================================================
// Per-variable prefixes
// =============================================================================

pub const FIELD_PREFIX: &str = "$";
pub const GETTER_PREFIX: &str = "get$";
pub const SETTER_PREFIX: &str = "set$";
pub const BIND_EXPR_PREFIX: &str = "be$";
pub const INVALIDATE_PREFIX: &str = "invalidate$";
pub const ON_REPLACE_PREFIX: &str = "onReplace$";
pub const ON_INVALIDATE_PREFIX: &str = "onInvalidate$";
pub const ELEM_PREFIX: &str = "elem$";
pub const SIZE_PREFIX: &str = "size$";
pub const DEFAULT_PREFIX: &str = "default$";
pub const OFFSET_PREFIX: &str = "VOFF$";
pub const OFFSET_GETTER_PREFIX: &str = "getVOFF$";

/// Prefixes of the accessor methods a mixin interface declares for each of
/// its variables. A compiled mixin method whose name starts with one of these
/// belongs to a variable, not to the dispatch list.
pub const ACCESSOR_PREFIXES: &[&str] = &[
    GETTER_PREFIX,
    SETTER_PREFIX,
    BIND_EXPR_PREFIX,
    INVALIDATE_PREFIX,
    ON_REPLACE_PREFIX,
    ON_INVALIDATE_PREFIX,
    ELEM_PREFIX,
    SIZE_PREFIX,
    OFFSET_GETTER_PREFIX,
];

// =============================================================================
// Per-class names
// =============================================================================

pub const COUNT_FIELD: &str = "VCNT$";
pub const MAP_FIELD_PREFIX: &str = "MAP$";
pub const GETMAP_PREFIX: &str = "GETMAP$";
pub const MIXIN_INTERFACE_SUFFIX: &str = "$Mixin";
pub const RECEIVER_PARAM: &str = "receiver$";
pub const OUTER_FIELD: &str = "accessOuterField$";
pub const OUTER_PARAM: &str = "outer$";
pub const MARKER_PARAM: &str = "dummy$";
pub const VAR_NUM_PARAM: &str = "varNum$";
pub const POSITION_PARAM: &str = "pos$";
pub const UPDATE_SOURCE_PARAM: &str = "src$";
pub const UPDATE_DEP_PARAM: &str = "depNum$";
pub const NEW_VALUE_PARAM: &str = "value$";
pub const OLD_VALUE_PARAM: &str = "oldValue$";
pub const FIRST_INDEX_PARAM: &str = "lo$";
pub const LAST_INDEX_PARAM: &str = "hi$";
pub const NEW_LENGTH_PARAM: &str = "newLength$";
pub const ANON_CLASS_PREFIX: &str = "Anon$";

// =============================================================================
// Runtime protocol methods
// =============================================================================

pub const APPLY_DEFAULTS: &str = "applyDefaults$";
pub const COUNT: &str = "count$";
pub const GET: &str = "get$";
pub const SET: &str = "set$";
pub const INVALIDATE: &str = "invalidate$";
pub const NOTIFY_DEPENDENTS: &str = "notifyDependents$";
pub const ELEM: &str = "elem$";
pub const SIZE: &str = "size$";
pub const UPDATE: &str = "update$";
pub const COMPLETE: &str = "complete$";
pub const INITIALIZE: &str = "initialize$";
pub const USER_INIT: &str = "userInit$";
pub const POST_INIT: &str = "postInit$";
pub const INIT_VARS: &str = "initVars$";
pub const INVOKE: &str = "invoke$";
pub const RUN: &str = "run$";

pub const CONSTRUCTOR: &str = "<init>";
pub const STATIC_INITIALIZER: &str = "<clinit>";

/// Methods the compiler generates itself. Inherited members with one of these
/// names are never flattened into a subclass report.
pub const INTERNAL_METHOD_NAMES: &[&str] = &[
    CONSTRUCTOR,
    STATIC_INITIALIZER,
    APPLY_DEFAULTS,
    COUNT,
    GET,
    SET,
    INVALIDATE,
    NOTIFY_DEPENDENTS,
    ELEM,
    SIZE,
    UPDATE,
    COMPLETE,
    INITIALIZE,
    USER_INIT,
    POST_INIT,
    INIT_VARS,
    INVOKE,
];

/// Prefix for translator temporaries (`tmp$3`, `tmp$objlit4`).
pub const TMP_PREFIX: &str = "tmp$";

// =============================================================================
// Builders
// =============================================================================

pub fn field(var: &str) -> String {
    format!("{FIELD_PREFIX}{var}")
}

pub fn getter(var: &str) -> String {
    format!("{GETTER_PREFIX}{var}")
}

pub fn setter(var: &str) -> String {
    format!("{SETTER_PREFIX}{var}")
}

pub fn bind_expr(var: &str) -> String {
    format!("{BIND_EXPR_PREFIX}{var}")
}

pub fn invalidate(var: &str) -> String {
    format!("{INVALIDATE_PREFIX}{var}")
}

pub fn on_replace(var: &str) -> String {
    format!("{ON_REPLACE_PREFIX}{var}")
}

pub fn on_invalidate(var: &str) -> String {
    format!("{ON_INVALIDATE_PREFIX}{var}")
}

pub fn elem(var: &str) -> String {
    format!("{ELEM_PREFIX}{var}")
}

pub fn size(var: &str) -> String {
    format!("{SIZE_PREFIX}{var}")
}

pub fn default_value(var: &str) -> String {
    format!("{DEFAULT_PREFIX}{var}")
}

pub fn offset(var: &str) -> String {
    format!("{OFFSET_PREFIX}{var}")
}

pub fn offset_getter(var: &str) -> String {
    format!("{OFFSET_GETTER_PREFIX}{var}")
}

pub fn map_field(class: &str) -> String {
    format!("{MAP_FIELD_PREFIX}{}", flatten_class_name(class))
}

pub fn getmap(class: &str) -> String {
    format!("{GETMAP_PREFIX}{}", flatten_class_name(class))
}

pub fn mixin_interface(class: &str) -> String {
    format!("{class}{MIXIN_INTERFACE_SUFFIX}")
}

pub fn anon_class(outer: &str, n: u32) -> String {
    format!("{ANON_CLASS_PREFIX}{}{n}", flatten_class_name(outer))
}

pub fn temp(hint: &str, n: u32) -> String {
    format!("{TMP_PREFIX}{hint}{n}")
}

/// `a.b.C` → `a$b$C`, used where a qualified class name must become part of
/// a single identifier.
pub fn flatten_class_name(class: &str) -> String {
    class.replace('.', "$")
}

/// True for compiler-generated protocol methods and constructors.
pub fn is_internal_method_name(name: &str) -> bool {
    INTERNAL_METHOD_NAMES.contains(&name)
}

/// If `method` follows the accessor convention, returns the variable name it
/// belongs to (`get$x` → `x`).
pub fn accessor_var_name(method: &str) -> Option<&str> {
    ACCESSOR_PREFIXES
        .iter()
        .find_map(|prefix| method.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
}
