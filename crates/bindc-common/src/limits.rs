//! Centralized limits and thresholds for the lowering core.
//!
//! Recursion limits guard the translator and the class analyzer against
//! pathological input trees. Exceeding one of them is an internal failure,
//! not a user diagnostic: the attribution pass is expected to have rejected
//! anything this deep long before lowering runs.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth of nested node translation.
///
/// Every call into the translator dispatch adds a frame. Deeply nested
/// expressions such as long chains of member selects or nested block
/// expressions are bounded by this value.
pub const MAX_TRANSLATE_DEPTH: u32 = 500;

/// Maximum length of a superclass/mixin chain walked by the class analyzer.
///
/// Cyclic hierarchies are rejected upstream; the analyzer only guards against
/// revisiting a class, so this is a second line against runaway input.
pub const MAX_HIERARCHY_DEPTH: u32 = 256;

/// Maximum nesting of class declarations (anonymous classes in object
/// literals inside class bodies, and so on).
pub const MAX_CLASS_NESTING: u32 = 64;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Initial capacity for per-class prepend buffers.
pub const PREPEND_BUFFER_CAPACITY: usize = 8;

/// Variables per class above which the default-application dispatch always
/// uses the offset-to-case map even when a direct compare would do.
pub const DIRECT_COMPARE_MAX_CANDIDATES: usize = 1;
