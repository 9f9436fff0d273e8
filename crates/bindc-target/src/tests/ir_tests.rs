use crate::ir::{JBinaryOp, JClass, JModifiers, JNode, JType, JUnaryOp};

#[test]
fn test_not_folds_comparisons_and_double_negation() {
    let cmp = JNode::binary(JNode::id("a"), JBinaryOp::Lt, JNode::id("b"));
    assert!(matches!(
        JNode::not(cmp),
        JNode::Binary {
            op: JBinaryOp::Ge,
            ..
        }
    ));
    let call = JNode::call_local("f", vec![]);
    let twice = JNode::not(JNode::not(call.clone()));
    assert_eq!(twice, call);
    assert_eq!(JNode::not(JNode::bool(true)), JNode::bool(false));
}

#[test]
fn test_statement_expressions() {
    assert!(JNode::call_local("f", vec![]).is_statement_expression());
    assert!(JNode::assign(JNode::id("x"), JNode::int(1)).is_statement_expression());
    assert!(JNode::unary(JUnaryOp::PostInc, JNode::id("i")).is_statement_expression());
    assert!(!JNode::unary(JUnaryOp::Neg, JNode::id("i")).is_statement_expression());
    assert!(!JNode::id("x").is_statement_expression());
}

#[test]
fn test_side_effect_free() {
    assert!(JNode::select(JNode::This, "$x").is_side_effect_free());
    assert!(!JNode::select(JNode::call_local("f", vec![]), "$x").is_side_effect_free());
}

#[test]
fn test_count_walks_nested_bodies() {
    let body = vec![
        JNode::expr_stmt(JNode::call_local("a", vec![])),
        JNode::if_stmt(
            JNode::id("c"),
            vec![JNode::expr_stmt(JNode::call_local("b", vec![]))],
            None,
        ),
    ];
    let class = JNode::Class(JClass {
        modifiers: JModifiers::PUBLIC,
        name: "C".into(),
        is_interface: false,
        superclass: None,
        interfaces: vec![],
        members: vec![JNode::Method(crate::JMethod::new(
            JModifiers::PUBLIC,
            JType::Void,
            "run",
            vec![],
            body,
        ))],
    });
    assert_eq!(class.count(|n| matches!(n, JNode::Call { .. })), 2);
    assert!(class.find_class("C").is_some_and(|c| c.method("run").is_some()));
}

#[test]
fn test_boxed_types() {
    assert_eq!(JType::Int.boxed(), JType::named("Integer"));
    assert_eq!(JType::string().boxed(), JType::string());
    assert!(JType::Double.is_primitive());
}

#[test]
fn test_type_names_include_generic_arguments() {
    let ty = JType::array(JType::generic(
        "Function1",
        vec![JType::named("Integer"), JType::generic("Sequence", vec![JType::string()])],
    ));
    let mut names = Vec::new();
    ty.for_each_name(&mut |name| names.push(name));
    assert_eq!(names, ["Function1", "Integer", "Sequence", "String"]);
    let mut none = 0;
    JType::Int.for_each_name(&mut |_| none += 1);
    assert_eq!(none, 0);
}

#[test]
fn test_node_types_stay_on_the_node() {
    let cast = JNode::cast(JType::named("Duration"), JNode::new_object(JType::named("Pointer"), vec![]));
    let mut own = Vec::new();
    cast.for_each_type(&mut |ty| own.push(ty.clone()));
    assert_eq!(own, [JType::named("Duration")]);

    let class = JClass {
        modifiers: JModifiers::PUBLIC,
        name: "Point".into(),
        is_interface: false,
        superclass: Some(JType::named("FXBase")),
        interfaces: vec![JType::named("FXObject")],
        members: Vec::new(),
    };
    let mut names = Vec::new();
    JNode::Class(class).for_each_type(&mut |ty| names.push(ty.base_name()));
    assert_eq!(names, ["FXBase", "FXObject"]);
}
