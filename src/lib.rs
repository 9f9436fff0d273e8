//! bindc: lowering core for a declarative binding language.
//!
//! The workspace is split by concern:
//!
//! | Crate            | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | `bindc-common`   | limits, generated-name conventions, runtime registry, options |
//! | `bindc-tree`     | attributed input tree, symbols, types, `TreeBuilder`      |
//! | `bindc-target`   | target-language tree and its debug printer                |
//! | `bindc-lower`    | class analyzer, translator, bind translation, orchestrator |
//!
//! This crate re-exports them and adds the process-level pieces: tracing
//! setup and a one-call lowering entry point that renders the result.

pub use bindc_common as common;
pub use bindc_lower as lower;
pub use bindc_target as target;
pub use bindc_tree as tree;

pub mod tracing_config;

pub use bindc_common::LowerOptions;
pub use bindc_lower::{
    BindTranslator, DefaultBindTranslator, LowerError, LowerResult, lower_program,
    lower_program_with,
};
pub use bindc_target::{JNode, print_node};
pub use bindc_tree::{Program, TreeBuilder};

use tracing::info;

/// Lower `program` and render the compilation unit as indented text.
pub fn lower_to_text(program: &Program, options: &LowerOptions) -> LowerResult<String> {
    let unit = lower_program_with(program, options, &DefaultBindTranslator)?;
    let text = print_node(&unit);
    info!(bytes = text.len(), "compilation unit rendered");
    Ok(text)
}
