//! Shared helpers for the bindc-lower integration tests.

#![allow(dead_code)]

pub mod interp;

use bindc_lower::lower_program;
use bindc_target::{JClass, JMethod, JNode, print_node};
use bindc_tree::{Program, SymbolFlags, SymbolId, TreeBuilder};

/// Route `tracing` output to the test harness when `RUST_LOG` asks for it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A builder with the script class `Main` already declared.
pub fn script_builder() -> (TreeBuilder, SymbolId) {
    let mut b = TreeBuilder::new();
    let main = b.class("Main", None, SymbolFlags::SCRIPT);
    (b, main)
}

/// Lower a program that is expected to lower cleanly.
pub fn lower(program: &Program) -> JNode {
    init_tracing();
    match lower_program(program) {
        Ok(unit) => unit,
        Err(err) => panic!("lowering failed: {err}"),
    }
}

pub fn print(node: &JNode) -> String {
    print_node(node)
}

pub fn class<'a>(unit: &'a JNode, name: &str) -> &'a JClass {
    unit.find_class(name)
        .unwrap_or_else(|| panic!("no class {name} in\n{}", print_node(unit)))
}

pub fn method<'a>(class: &'a JClass, name: &str) -> &'a JMethod {
    class
        .method(name)
        .unwrap_or_else(|| panic!("no method {name} in class {}", class.name))
}

pub fn body(method: &JMethod) -> &[JNode] {
    method.body.as_deref().unwrap_or_default()
}

/// The value of the last `return` in a method body.
pub fn returned(method: &JMethod) -> &JNode {
    match body(method).last() {
        Some(JNode::Return(Some(value))) => value.as_ref(),
        other => panic!("{} does not end in a value return: {other:?}", method.name),
    }
}

/// Number of calls to `name` anywhere under `node`.
pub fn calls_to(node: &JNode, name: &str) -> usize {
    node.count(|n| matches!(n, JNode::Call { method, .. } if method == name))
}

/// Number of `x != null` tests anywhere under `node`.
pub fn null_checks(node: &JNode) -> usize {
    node.count(|n| {
        matches!(
            n,
            JNode::Binary { op: bindc_target::JBinaryOp::Ne, right, .. }
                if right.is_null_literal()
        )
    })
}

pub fn method_node(class: &JClass, name: &str) -> JNode {
    JNode::Method(method(class, name).clone())
}
