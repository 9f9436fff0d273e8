//! Lowering options.
//!
//! Options are plain data with serde support so a driver can read them from
//! the same JSON project file it uses for everything else. Unknown keys are
//! ignored and missing keys take their defaults.

use crate::limits::MAX_TRANSLATE_DEPTH;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LowerOptions {
    /// Package the runtime classes are imported from.
    pub runtime_package: String,
    /// Emit null guards around member selects and calls on nullable receivers.
    pub null_checks: bool,
    /// Reuse literal right-hand sides instead of spilling them to a temporary.
    pub inline_literal_rhs: bool,
    /// Recursion guard for node translation.
    pub max_translate_depth: u32,
    /// Annotate generated members with short comments naming their origin.
    pub emit_comments: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            runtime_package: "bindc.runtime".to_string(),
            null_checks: true,
            inline_literal_rhs: true,
            max_translate_depth: MAX_TRANSLATE_DEPTH,
            emit_comments: false,
        }
    }
}

impl LowerOptions {
    /// Parse options from a JSON object. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Fully qualified name of a runtime class.
    pub fn runtime_import(&self, class: &str) -> String {
        if self.runtime_package.is_empty() {
            class.to_string()
        } else {
            format!("{}.{class}", self.runtime_package)
        }
    }
}
