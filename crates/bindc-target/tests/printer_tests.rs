//! Printer output shapes.

use bindc_target::{
    JBinaryOp, JClass, JField, JMethod, JModifiers, JNode, JParam, JSwitchCase, JType, print_node,
};

#[test]
fn prints_calls_and_operators() {
    let expr = JNode::conditional(
        JNode::binary(JNode::id("p"), JBinaryOp::Ne, JNode::null()),
        JNode::call(JNode::id("p"), "get$x", vec![]),
        JNode::int(0),
    );
    assert_eq!(print_node(&expr), "(p != null) ? p.get$x() : 0");

    let set = JNode::static_call(
        "Sequences",
        "set",
        vec![JNode::This, JNode::id("VOFF$s"), JNode::id("v")],
    );
    assert_eq!(print_node(&set), "Sequences.set(this, VOFF$s, v)");
}

#[test]
fn prints_literals() {
    assert_eq!(print_node(&JNode::long(5)), "5L");
    assert_eq!(print_node(&JNode::double(2.0)), "2.0");
    assert_eq!(print_node(&JNode::float(0.5)), "0.5f");
    assert_eq!(print_node(&JNode::char('\0')), "'\\u0000'");
    assert_eq!(print_node(&JNode::string("a\"b")), "\"a\\\"b\"");
}

#[test]
fn prints_class_with_constructor_and_switch() {
    let switch = JNode::Switch {
        selector: Box::new(JNode::id("n")),
        cases: vec![
            JSwitchCase {
                label: Some(JNode::int(0)),
                body: vec![JNode::Break(None)],
            },
            JSwitchCase {
                label: None,
                body: vec![JNode::ret(None)],
            },
        ],
    };
    let class = JNode::Class(JClass {
        modifiers: JModifiers::PUBLIC | JModifiers::STATIC,
        name: "Point".into(),
        is_interface: false,
        superclass: Some(JType::named("FXBase")),
        interfaces: vec![JType::named("FXObject")],
        members: vec![
            JNode::Field(JField {
                modifiers: JModifiers::PUBLIC,
                ty: JType::Int,
                name: "$x".into(),
                init: None,
            }),
            JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                JMethod::CONSTRUCTOR,
                vec![JParam::new(JType::Boolean, "dummy$")],
                vec![],
            )),
            JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                "pick",
                vec![JParam::new(JType::Int, "n")],
                vec![switch],
            )),
        ],
    });
    let text = print_node(&class);
    assert!(text.starts_with("public static class Point extends FXBase implements FXObject {"));
    assert!(text.contains("    public int $x;"));
    assert!(text.contains("    public Point(boolean dummy$) {"));
    assert!(text.contains("        switch (n) {"));
    assert!(text.contains("            case 0:"));
    assert!(text.contains("            default:"));
}

#[test]
fn prints_counting_loop() {
    let stmt = JNode::counting_loop(
        "i",
        JNode::int(0),
        JNode::id("n"),
        vec![JNode::expr_stmt(JNode::call_local("f", vec![JNode::id("i")]))],
    );
    assert_eq!(
        print_node(&stmt),
        "for (int i = 0; i < n; i++) {\n    f(i);\n}\n"
    );
}

#[test]
fn prints_generic_and_array_types() {
    let local = JNode::local(
        JType::generic("Sequence", vec![JType::named("Integer")]),
        "s",
        Some(JNode::null()),
    );
    assert_eq!(print_node(&local), "Sequence<Integer> s = null;\n");
    let arr = JNode::new_array(JType::named("Integer"), JNode::id("n"));
    assert_eq!(print_node(&arr), "new Integer[n]");
}

#[test]
fn prints_static_initializer_as_a_block() {
    let init = JNode::Method(JMethod::new(
        JModifiers::STATIC,
        JType::Void,
        JMethod::STATIC_INITIALIZER,
        vec![],
        vec![JNode::expr_stmt(JNode::call_local("VCNT$", vec![]))],
    ));
    assert_eq!(print_node(&init), "static {\n    VCNT$();\n}\n");
}
