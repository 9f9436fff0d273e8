//! Target-language tree for the bindc lowering core.
//!
//! The lowering core produces [`JNode`] trees: declarations, statements and
//! expressions of a plain class-based imperative language. Serializing them
//! to source or bytecode is the job of an external code generator;
//! [`JPrinter`] renders them as indented text for debugging and tests.

pub mod ir;
pub use ir::{
    JBinaryOp, JCatch, JClass, JField, JLiteral, JMethod, JModifiers, JNode, JParam, JSwitchCase,
    JType, JUnaryOp,
};

pub mod printer;
pub use printer::{JPrinter, print_node, type_str};

#[cfg(test)]
#[path = "tests/ir_tests.rs"]
mod ir_tests;
