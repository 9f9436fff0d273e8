//! Lowering core of the bindc compiler.
//!
//! Takes an attributed [`Program`] for the declarative language and produces
//! the equivalent target-language [`JNode::CompilationUnit`]:
//!
//! - `analyzer`: flattened per-class view of variables, functions and
//!   binding dependencies
//! - `translate`: the recursive expression and statement translator
//! - `bind`: the bind-translation service the translator consults
//! - `orchestrator`: class, mixin and script assembly
//! - `result`: the tagged translation result and its dependency accumulator
//! - `error`: [`LowerError`]
//!
//! [`lower_program`] is the usual entry point. [`lower_program_with`] takes
//! explicit options and a custom [`BindTranslator`].

pub mod analyzer;
pub mod bind;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod result;
pub mod translate;
pub mod typemorph;
pub mod unit;

pub use analyzer::{ClassReport, VarInfo};
pub use bind::{BindTranslator, DefaultBindTranslator};
pub use context::{ReceiverContext, Sink, TranslationContext, Yield};
pub use error::{LowerError, LowerResult};
pub use orchestrator::ClassPhase;
pub use result::{
    BoundSequenceResult, Dependencies, ExpressionResult, SpecialResult, StatementsResult,
    TranslationResult,
};
pub use translate::Translator;

use bindc_common::LowerOptions;
use bindc_target::JNode;
use bindc_tree::Program;
use tracing::error;

/// Lower `program` with default options and the default bind translator.
pub fn lower_program(program: &Program) -> LowerResult<JNode> {
    lower_program_with(program, &LowerOptions::default(), &DefaultBindTranslator)
}

pub fn lower_program_with(
    program: &Program,
    options: &LowerOptions,
    binder: &dyn BindTranslator,
) -> LowerResult<JNode> {
    let mut translator = Translator::new(program, options, binder);
    translator.lower_unit().inspect_err(|err| {
        error!(error = %err, "lowering aborted");
    })
}

#[cfg(test)]
#[path = "tests/result_tests.rs"]
mod result_tests;

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod context_tests;

#[cfg(test)]
#[path = "tests/unit_tests.rs"]
mod unit_tests;

#[cfg(test)]
#[path = "tests/typemorph_tests.rs"]
mod typemorph_tests;
