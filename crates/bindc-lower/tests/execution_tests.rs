//! Lower small programs and run the result.

mod support;

use bindc_tree::{
    BinaryOp, BindStatus, DeleteTarget, InsertPosition, Program, SymbolFlags, SymbolId,
    TreeBuilder, TypeId, UnaryOp, VarDecl,
};
use bindc_lower::LowerError;
use support::interp::{Interp, Value};
use support::{calls_to, class, lower, method, method_node, script_builder};

/// `function roundTrip(xs: P): P { var a: L = xs; a }` where `types`
/// yields `(P, L)`.
fn convert_through_local(types: impl FnOnce(&mut TreeBuilder) -> (TypeId, TypeId)) -> Program {
    let (mut b, main) = script_builder();
    let (param_ty, local_ty) = types(&mut b);
    let ret = param_ty;
    let f = b.function(main, "roundTrip", &[("xs", param_ty)], ret, SymbolFlags::STATIC);
    let xs = b.params(f)[0];
    let a = b.local(f, "a", local_ty);
    let init = b.ident(xs);
    let decl = b.var_decl(a, Some(init), BindStatus::Unbound);
    let result = b.ident(a);
    let body = b.block(vec![decl], Some(result));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    b.finish(root)
}

#[test]
fn int_sequences_survive_an_array_round_trip() {
    let unit = lower(&convert_through_local(|b| (b.seq(TypeId::INT), b.array(TypeId::INT))));
    let mut interp = Interp::new(&unit);
    for input in [&[][..], &[7][..], &[3, 1, 4, 1, 5][..]] {
        let out = interp
            .call_static("Main", "roundTrip", vec![Value::ints(input)])
            .unwrap();
        assert_eq!(out.int_items().unwrap(), input);
    }
}

#[test]
fn string_sequences_survive_an_array_round_trip() {
    let unit = lower(&convert_through_local(|b| {
        (b.seq(TypeId::STRING), b.array(TypeId::STRING))
    }));
    let mut interp = Interp::new(&unit);
    for input in [&[][..], &["a"][..], &["x", "", "yz"][..]] {
        let out = interp
            .call_static("Main", "roundTrip", vec![Value::strs(input)])
            .unwrap();
        assert_eq!(out.str_items().unwrap(), input);
    }
}

#[test]
fn arrays_survive_a_sequence_round_trip() {
    let unit = lower(&convert_through_local(|b| (b.array(TypeId::INT), b.seq(TypeId::INT))));
    let mut interp = Interp::new(&unit);
    let input = Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![
        Value::Int(2),
        Value::Int(9),
    ])));
    let out = interp.call_static("Main", "roundTrip", vec![input]).unwrap();
    assert!(out.is_array());
    assert_eq!(out.int_items().unwrap(), [2, 9]);
}

/// ```text
/// class Point { var x: Integer; var y: Integer = x * 2 (or bind x * 2) }
/// function literal(): Point { Point { x: 5 } }
/// function both(): Point { Point { x: 5, y: 1 } }
/// ```
fn point_program(bind: BindStatus) -> Program {
    let (mut b, main) = script_builder();
    let point = b.class("Point", Some(main), SymbolFlags::empty());
    let point_ty = b.class_type(point);
    let x = b.var(point, "x", TypeId::INT, SymbolFlags::empty());
    let y = b.var(point, "y", TypeId::INT, SymbolFlags::empty());
    let x_decl = b.var_decl(x, None, BindStatus::Unbound);
    let x_ref = b.ident(x);
    let two = b.int(2);
    let doubled = b.binary(BinaryOp::Mul, x_ref, two);
    let y_decl = b.var_decl(y, Some(doubled), bind);
    let class = b.class_decl(point, vec![x_decl, y_decl]);

    let literal = b.function(main, "literal", &[], point_ty, SymbolFlags::STATIC);
    let five = b.int(5);
    let obj = b.object_literal(point, vec![(x, five)]);
    let body = b.block(Vec::new(), Some(obj));
    let literal_def = b.function_def(literal, Some(body));

    let both = b.function(main, "both", &[], point_ty, SymbolFlags::STATIC);
    let five = b.int(5);
    let one = b.int(1);
    let obj = b.object_literal(point, vec![(x, five), (y, one)]);
    let body = b.block(Vec::new(), Some(obj));
    let both_def = b.function_def(both, Some(body));

    let root = b.script(main, None, vec![class, literal_def, both_def]);
    b.finish(root)
}

fn get(interp: &mut Interp, obj: &Value, var: &str) -> i64 {
    interp
        .call(obj, &format!("get${var}"), Vec::new())
        .unwrap()
        .as_int()
        .unwrap()
}

#[test]
fn object_literal_applies_defaults_after_explicit_values() {
    let unit = lower(&point_program(BindStatus::Unbound));
    let mut interp = Interp::new(&unit);
    let p = interp.call_static("Main", "literal", Vec::new()).unwrap();
    assert_eq!(get(&mut interp, &p, "x"), 5);
    assert_eq!(get(&mut interp, &p, "y"), 10);
}

#[test]
fn explicit_values_are_not_overwritten_by_defaults() {
    let unit = lower(&point_program(BindStatus::Unbound));
    let mut interp = Interp::new(&unit);
    let p = interp.call_static("Main", "both", Vec::new()).unwrap();
    assert_eq!(get(&mut interp, &p, "x"), 5);
    assert_eq!(get(&mut interp, &p, "y"), 1);
}

#[test]
fn plain_construction_initializes_from_defaults() {
    let unit = lower(&point_program(BindStatus::Unbound));
    let mut interp = Interp::new(&unit);
    let p = interp.new_object("Point").unwrap();
    assert_eq!(get(&mut interp, &p, "x"), 0);
    assert_eq!(get(&mut interp, &p, "y"), 0);
}

#[test]
fn bound_variable_follows_its_bindee() {
    let unit = lower(&point_program(BindStatus::Bound));
    let mut interp = Interp::new(&unit);
    let p = interp.call_static("Main", "literal", Vec::new()).unwrap();
    assert_eq!(get(&mut interp, &p, "y"), 10);
    interp.call(&p, "set$x", vec![Value::Int(7)]).unwrap();
    assert_eq!(get(&mut interp, &p, "x"), 7);
    assert_eq!(get(&mut interp, &p, "y"), 14);
    // Reading again uses the cached value.
    assert_eq!(get(&mut interp, &p, "y"), 14);
}

#[test]
fn comprehension_filters_and_maps() {
    let (mut b, main) = script_builder();
    let seq = b.seq(TypeId::INT);
    let f = b.function(main, "evens", &[], seq, SymbolFlags::STATIC);
    let i = b.local(f, "i", TypeId::INT);
    let lo = b.int(1);
    let hi = b.int(6);
    let range = b.range(lo, hi, None, false);
    let i_ref = b.ident(i);
    let two = b.int(2);
    let rem = b.binary(BinaryOp::Mod, i_ref, two);
    let zero = b.int(0);
    let filter = b.binary(BinaryOp::Eq, rem, zero);
    let i_ref = b.ident(i);
    let ten = b.int(10);
    let scaled = b.binary(BinaryOp::Mul, i_ref, ten);
    let clause = TreeBuilder::in_clause(i, range, Some(filter));
    let comprehension = b.for_in(vec![clause], scaled);
    let body = b.block(Vec::new(), Some(comprehension));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    let unit = lower(&b.finish(root));

    let mut interp = Interp::new(&unit);
    let out = interp.call_static("Main", "evens", Vec::new()).unwrap();
    assert_eq!(out.int_items().unwrap(), [20, 40, 60]);
}

/// ```text
/// var calls: Integer = 0;
/// function next(): Point { calls = calls + 1; Point { x: 3 } }
/// function viaLocal(): Integer { var r: Integer = next().x; r }
/// function viaReturn(): Integer { next().x }
/// ```
fn counting_program() -> Program {
    let (mut b, main) = script_builder();
    let point = b.class("Point", Some(main), SymbolFlags::empty());
    let point_ty = b.class_type(point);
    let x = b.var(point, "x", TypeId::INT, SymbolFlags::empty());
    let x_decl = b.var_decl(x, None, BindStatus::Unbound);
    let class = b.class_decl(point, vec![x_decl]);

    let calls = b.var(main, "calls", TypeId::INT, SymbolFlags::STATIC);
    let zero = b.int(0);
    let calls_decl = b.var_decl(calls, Some(zero), BindStatus::Unbound);

    let next = b.function(main, "next", &[], point_ty, SymbolFlags::STATIC);
    let target = b.ident(calls);
    let current = b.ident(calls);
    let one = b.int(1);
    let bumped = b.binary(BinaryOp::Add, current, one);
    let bump = b.assign(target, bumped);
    let three = b.int(3);
    let obj = b.object_literal(point, vec![(x, three)]);
    let body = b.block(vec![bump], Some(obj));
    let next_def = b.function_def(next, Some(body));

    let via_local = b.function(main, "viaLocal", &[], TypeId::INT, SymbolFlags::STATIC);
    let r = b.local(via_local, "r", TypeId::INT);
    let call = b.call_fn(next, Vec::new());
    let access = b.select(call, x);
    let r_decl = b.var_decl(r, Some(access), BindStatus::Unbound);
    let r_ref = b.ident(r);
    let body = b.block(vec![r_decl], Some(r_ref));
    let via_local_def = b.function_def(via_local, Some(body));

    let via_return = b.function(main, "viaReturn", &[], TypeId::INT, SymbolFlags::STATIC);
    let call = b.call_fn(next, Vec::new());
    let access = b.select(call, x);
    let body = b.block(Vec::new(), Some(access));
    let via_return_def = b.function_def(via_return, Some(body));

    let root = b.script(
        main,
        None,
        vec![class, calls_decl, next_def, via_local_def, via_return_def],
    );
    b.finish(root)
}

#[test]
fn guarded_receiver_is_evaluated_once() {
    let unit = lower(&counting_program());
    let main = class(&unit, "Main");
    for caller in ["viaLocal", "viaReturn"] {
        assert_eq!(calls_to(&method_node(main, caller), "next"), 1, "{caller}");

        let mut interp = Interp::new(&unit);
        interp.run_main().unwrap();
        let value = interp.call_static("Main", caller, Vec::new()).unwrap();
        assert_eq!(value.as_int(), Some(3), "{caller}");
        let calls = interp.call_static("Main", "get$calls", Vec::new()).unwrap();
        assert_eq!(calls.as_int(), Some(1), "{caller}");
    }
}

fn script_var(b: &mut TreeBuilder, main: SymbolId, name: &str) -> SymbolId {
    b.var(main, name, TypeId::INT, SymbolFlags::STATIC)
}

#[test]
fn script_body_runs_in_source_order() {
    // var a = 1; var b = a + 1; a = 10;
    let (mut b, main) = script_builder();
    let a = script_var(&mut b, main, "a");
    let c = script_var(&mut b, main, "b");
    let one = b.int(1);
    let a_decl = b.var_decl(a, Some(one), BindStatus::Unbound);
    let a_ref = b.ident(a);
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, a_ref, one);
    let c_decl = b.var_decl(c, Some(sum), BindStatus::Unbound);
    let target = b.ident(a);
    let ten = b.int(10);
    let reassign = b.assign(target, ten);
    let root = b.script(main, None, vec![a_decl, c_decl, reassign]);
    let unit = lower(&b.finish(root));

    let mut interp = Interp::new(&unit);
    interp.run_main().unwrap();
    let a = interp.call_static("Main", "get$a", Vec::new()).unwrap();
    let c = interp.call_static("Main", "get$b", Vec::new()).unwrap();
    assert_eq!(a.as_int(), Some(10));
    assert_eq!(c.as_int(), Some(2));
}

#[test]
fn bound_script_variable_is_recomputed_on_read() {
    // var a = 1; var b = bind a * 3; a = 4;
    let (mut b, main) = script_builder();
    let a = script_var(&mut b, main, "a");
    let c = script_var(&mut b, main, "b");
    let one = b.int(1);
    let a_decl = b.var_decl(a, Some(one), BindStatus::Unbound);
    let a_ref = b.ident(a);
    let three = b.int(3);
    let product = b.binary(BinaryOp::Mul, a_ref, three);
    let c_decl = b.var_decl(c, Some(product), BindStatus::Bound);
    let target = b.ident(a);
    let four = b.int(4);
    let reassign = b.assign(target, four);
    let root = b.script(main, None, vec![a_decl, c_decl, reassign]);
    let unit = lower(&b.finish(root));

    let mut interp = Interp::new(&unit);
    interp.run_main().unwrap();
    let c = interp.call_static("Main", "get$b", Vec::new()).unwrap();
    assert_eq!(c.as_int(), Some(12));
}

// =============================================================================
// Sequence operators and mutation
// =============================================================================

/// `function f(xs: Integer[]): R { op xs }`
fn sequence_unary(op: UnaryOp) -> Program {
    let (mut b, main) = script_builder();
    let seq = b.seq(TypeId::INT);
    let ret = if op == UnaryOp::SizeOf { TypeId::INT } else { seq };
    let f = b.function(main, "f", &[("xs", seq)], ret, SymbolFlags::STATIC);
    let xs = b.params(f)[0];
    let xs_ref = b.ident(xs);
    let value = b.unary(op, xs_ref);
    let body = b.block(Vec::new(), Some(value));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    b.finish(root)
}

#[test]
fn sizeof_and_reverse_use_the_sequence_runtime() {
    let unit = lower(&sequence_unary(UnaryOp::SizeOf));
    let mut interp = Interp::new(&unit);
    let size = interp
        .call_static("Main", "f", vec![Value::ints(&[4, 5, 6])])
        .unwrap();
    assert_eq!(size.as_int(), Some(3));
    let empty = interp.call_static("Main", "f", vec![Value::Null]).unwrap();
    assert_eq!(empty.as_int(), Some(0));

    let unit = lower(&sequence_unary(UnaryOp::Reverse));
    let mut interp = Interp::new(&unit);
    let reversed = interp
        .call_static("Main", "f", vec![Value::ints(&[1, 2, 3])])
        .unwrap();
    assert_eq!(reversed.int_items().unwrap(), [3, 2, 1]);
}

#[test]
fn local_sequence_mutations_rebuild_the_value() {
    // var s = xs; insert 9 into s; insert 0 before s[0]; delete s[2]; delete 5 from s; s
    let (mut b, main) = script_builder();
    let seq = b.seq(TypeId::INT);
    let f = b.function(main, "edit", &[("xs", seq)], seq, SymbolFlags::STATIC);
    let xs = b.params(f)[0];
    let s = b.local(f, "s", seq);
    let init = b.ident(xs);
    let decl = b.var_decl(s, Some(init), BindStatus::Unbound);

    let target = b.ident(s);
    let nine = b.int(9);
    let append = b.insert(target, nine, InsertPosition::Into);
    let target = b.ident(s);
    let zero = b.int(0);
    let first = b.int(0);
    let prepend = b.insert(target, zero, InsertPosition::Before(first));
    let target = b.ident(s);
    let two = b.int(2);
    let drop_third = b.delete(target, DeleteTarget::Index(two));
    let target = b.ident(s);
    let five = b.int(5);
    let drop_five = b.delete(target, DeleteTarget::Value(five));

    let result = b.ident(s);
    let body = b.block(vec![decl, append, prepend, drop_third, drop_five], Some(result));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    let unit = lower(&b.finish(root));

    let edit = method_node(class(&unit, "Main"), "edit");
    assert_eq!(calls_to(&edit, "withInserted"), 1);
    assert_eq!(calls_to(&edit, "withInsertedBefore"), 1);
    assert_eq!(calls_to(&edit, "withDeletedIndex"), 1);
    assert_eq!(calls_to(&edit, "withDeletedValue"), 1);

    let mut interp = Interp::new(&unit);
    let out = interp
        .call_static("Main", "edit", vec![Value::ints(&[5, 7])])
        .unwrap();
    assert_eq!(out.int_items().unwrap(), [0, 9]);
}

#[test]
fn string_expression_concatenates_its_parts() {
    let (mut b, main) = script_builder();
    let f = b.function(
        main,
        "greet",
        &[("name", TypeId::STRING), ("n", TypeId::INT)],
        TypeId::STRING,
        SymbolFlags::STATIC,
    );
    let params = b.params(f);
    let hi = b.string("hi ");
    let name = b.ident(params[0]);
    let sep = b.string(" x");
    let n = b.ident(params[1]);
    let text = b.string_expr(vec![hi, name, sep, n]);
    let body = b.block(Vec::new(), Some(text));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    let unit = lower(&b.finish(root));

    let mut interp = Interp::new(&unit);
    let out = interp
        .call_static("Main", "greet", vec![Value::Str("bob".into()), Value::Int(3)])
        .unwrap();
    assert_eq!(out.as_str(), Some("hi bob x3"));
}

// =============================================================================
// Triggers and function values
// =============================================================================

/// ```text
/// class Counter {
///     var changes: Integer;
///     var n: Integer on replace { changes = changes + 1 }
/// }
/// ```
#[test]
fn on_replace_runs_after_each_assignment() {
    let (mut b, main) = script_builder();
    let counter = b.class("Counter", Some(main), SymbolFlags::empty());
    let changes = b.var(counter, "changes", TypeId::INT, SymbolFlags::empty());
    let n = b.var(counter, "n", TypeId::INT, SymbolFlags::empty());
    let changes_decl = b.var_decl(changes, None, BindStatus::Unbound);
    let target = b.ident(changes);
    let current = b.ident(changes);
    let one = b.int(1);
    let bumped = b.binary(BinaryOp::Add, current, one);
    let bump = b.assign(target, bumped);
    let trigger_body = b.block(vec![bump], None);
    let n_decl = b.var_decl_with(VarDecl {
        sym: n,
        init: None,
        bind: BindStatus::Unbound,
        on_replace: Some(TreeBuilder::on_replace(trigger_body)),
        on_invalidate: None,
    });
    let class_node = b.class_decl(counter, vec![changes_decl, n_decl]);
    let root = b.script(main, None, vec![class_node]);
    let unit = lower(&b.finish(root));

    let counter_class = class(&unit, "Counter");
    method(counter_class, "onReplace$n");

    let mut interp = Interp::new(&unit);
    let c = interp.new_object("Counter").unwrap();
    let before = get(&mut interp, &c, "changes");
    interp.call(&c, "set$n", vec![Value::Int(5)]).unwrap();
    interp.call(&c, "set$n", vec![Value::Int(6)]).unwrap();
    assert_eq!(get(&mut interp, &c, "n"), 6);
    assert_eq!(get(&mut interp, &c, "changes"), before + 2);
}

#[test]
fn function_values_become_anonymous_function_objects() {
    // function apply(): Integer { var add = function(v: Integer): Integer { v + 1 }; add(2) }
    let (mut b, main) = script_builder();
    let apply = b.function(main, "apply", &[], TypeId::INT, SymbolFlags::STATIC);
    let lambda = b.function(apply, "lambda$0", &[("v", TypeId::INT)], TypeId::INT, SymbolFlags::empty());
    let v = b.params(lambda)[0];
    let v_ref = b.ident(v);
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, v_ref, one);
    let lambda_body = b.block(Vec::new(), Some(sum));
    let lambda_def = b.function_def(lambda, Some(lambda_body));
    let value = b.function_value(lambda_def);
    let fn_ty = b.type_of(value);
    let add = b.local(apply, "add", fn_ty);
    let decl = b.var_decl(add, Some(value), BindStatus::Unbound);
    let callee = b.ident(add);
    let two = b.int(2);
    let call = b.call(callee, vec![two]);
    let body = b.block(vec![decl], Some(call));
    let def = b.function_def(apply, Some(body));
    let root = b.script(main, None, vec![def]);
    let unit = lower(&b.finish(root));

    let apply = method_node(class(&unit, "Main"), "apply");
    let objects = apply.count(|n| {
        matches!(n, bindc_target::JNode::New { body: Some(members), .. }
            if members.iter().any(|m| matches!(m, bindc_target::JNode::Method(m) if m.name == "invoke$")))
    });
    assert_eq!(objects, 1);
    assert_eq!(calls_to(&apply, "invoke$"), 1);
    assert!(support::print(&unit).contains("Function1"));
}

// =============================================================================
// Guarded calls and compound assignment
// =============================================================================

/// ```text
/// var calls: Integer = 0;
/// class Point { var x: Integer; function id(v: Integer): Integer { v } }
/// function counted(p: Point): Integer { p.id({ calls = calls + 1; 7 }) }
/// function reassigned(q: Point): Integer { var p: Point = q; p.id({ p = null; 7 }) }
/// ```
fn guarded_call_program() -> Program {
    let (mut b, main) = script_builder();
    let point = b.class("Point", Some(main), SymbolFlags::empty());
    let point_ty = b.class_type(point);
    let x = b.var(point, "x", TypeId::INT, SymbolFlags::empty());
    let x_decl = b.var_decl(x, None, BindStatus::Unbound);
    let id = b.function(point, "id", &[("v", TypeId::INT)], TypeId::INT, SymbolFlags::empty());
    let v = b.params(id)[0];
    let v_ref = b.ident(v);
    let id_body = b.block(Vec::new(), Some(v_ref));
    let id_def = b.function_def(id, Some(id_body));
    let class_node = b.class_decl(point, vec![x_decl, id_def]);

    let calls = b.var(main, "calls", TypeId::INT, SymbolFlags::STATIC);
    let zero = b.int(0);
    let calls_decl = b.var_decl(calls, Some(zero), BindStatus::Unbound);

    let counted = b.function(main, "counted", &[("p", point_ty)], TypeId::INT, SymbolFlags::STATIC);
    let p = b.params(counted)[0];
    let target = b.ident(calls);
    let current = b.ident(calls);
    let one = b.int(1);
    let bumped = b.binary(BinaryOp::Add, current, one);
    let bump = b.assign(target, bumped);
    let seven = b.int(7);
    let arg = b.block(vec![bump], Some(seven));
    let p_ref = b.ident(p);
    let call = b.call_method(p_ref, id, vec![arg]);
    let body = b.block(Vec::new(), Some(call));
    let counted_def = b.function_def(counted, Some(body));

    let reassigned = b.function(main, "reassigned", &[("q", point_ty)], TypeId::INT, SymbolFlags::STATIC);
    let q = b.params(reassigned)[0];
    let p = b.local(reassigned, "p", point_ty);
    let q_ref = b.ident(q);
    let p_decl = b.var_decl(p, Some(q_ref), BindStatus::Unbound);
    let target = b.ident(p);
    let null = b.null();
    let clear = b.assign(target, null);
    let seven = b.int(7);
    let arg = b.block(vec![clear], Some(seven));
    let p_ref = b.ident(p);
    let call = b.call_method(p_ref, id, vec![arg]);
    let body = b.block(vec![p_decl], Some(call));
    let reassigned_def = b.function_def(reassigned, Some(body));

    let root = b.script(
        main,
        None,
        vec![class_node, calls_decl, counted_def, reassigned_def],
    );
    b.finish(root)
}

#[test]
fn guarded_call_skips_argument_effects_on_null() {
    let unit = lower(&guarded_call_program());
    let mut interp = Interp::new(&unit);
    interp.run_main().unwrap();

    let skipped = interp.call_static("Main", "counted", vec![Value::Null]).unwrap();
    assert_eq!(skipped.as_int(), Some(0));
    let calls = interp.call_static("Main", "get$calls", Vec::new()).unwrap();
    assert_eq!(calls.as_int(), Some(0));

    let p = interp.new_object("Point").unwrap();
    let seven = interp.call_static("Main", "counted", vec![p]).unwrap();
    assert_eq!(seven.as_int(), Some(7));
    let calls = interp.call_static("Main", "get$calls", Vec::new()).unwrap();
    assert_eq!(calls.as_int(), Some(1));
}

#[test]
fn guarded_call_uses_the_receiver_it_tested() {
    let unit = lower(&guarded_call_program());
    let reassigned = method_node(class(&unit, "Main"), "reassigned");
    assert_eq!(support::null_checks(&reassigned), 1);

    let mut interp = Interp::new(&unit);
    interp.run_main().unwrap();
    let p = interp.new_object("Point").unwrap();
    let seven = interp.call_static("Main", "reassigned", vec![p]).unwrap();
    assert_eq!(seven.as_int(), Some(7));
    let missing = interp.call_static("Main", "reassigned", vec![Value::Null]).unwrap();
    assert_eq!(missing.as_int(), Some(0));
}

/// `x += { x = 10; 1 }` on a script variable and on a local, both starting at 5.
fn compound_program() -> Program {
    let (mut b, main) = script_builder();
    let x = script_var(&mut b, main, "x");
    let five = b.int(5);
    let x_decl = b.var_decl(x, Some(five), BindStatus::Unbound);

    let on_script = b.function(main, "onScript", &[], TypeId::INT, SymbolFlags::STATIC);
    let reset = b.ident(x);
    let ten = b.int(10);
    let overwrite = b.assign(reset, ten);
    let one = b.int(1);
    let rhs = b.block(vec![overwrite], Some(one));
    let target = b.ident(x);
    let add = b.compound_assign(BinaryOp::Add, target, rhs);
    let result = b.ident(x);
    let body = b.block(vec![add], Some(result));
    let on_script_def = b.function_def(on_script, Some(body));

    let on_local = b.function(main, "onLocal", &[], TypeId::INT, SymbolFlags::STATIC);
    let y = b.local(on_local, "y", TypeId::INT);
    let five = b.int(5);
    let y_decl = b.var_decl(y, Some(five), BindStatus::Unbound);
    let reset = b.ident(y);
    let ten = b.int(10);
    let overwrite = b.assign(reset, ten);
    let one = b.int(1);
    let rhs = b.block(vec![overwrite], Some(one));
    let target = b.ident(y);
    let add = b.compound_assign(BinaryOp::Add, target, rhs);
    let result = b.ident(y);
    let body = b.block(vec![y_decl, add], Some(result));
    let on_local_def = b.function_def(on_local, Some(body));

    let root = b.script(main, None, vec![x_decl, on_script_def, on_local_def]);
    b.finish(root)
}

#[test]
fn compound_assignment_reads_the_target_before_the_right_side_runs() {
    let unit = lower(&compound_program());
    let mut interp = Interp::new(&unit);
    interp.run_main().unwrap();
    for function in ["onScript", "onLocal"] {
        let value = interp.call_static("Main", function, Vec::new()).unwrap();
        assert_eq!(value.as_int(), Some(6), "{function}");
    }
}

#[test]
fn assignment_inside_a_binding_is_rejected() {
    // class Point { var x: Integer; var y: Integer = bind { x = 2; x } }
    let (mut b, main) = script_builder();
    let point = b.class("Point", Some(main), SymbolFlags::empty());
    let x = b.var(point, "x", TypeId::INT, SymbolFlags::empty());
    let y = b.var(point, "y", TypeId::INT, SymbolFlags::empty());
    let x_decl = b.var_decl(x, None, BindStatus::Unbound);
    let target = b.ident(x);
    let two = b.int(2);
    let write = b.assign(target, two);
    let x_ref = b.ident(x);
    let init = b.block(vec![write], Some(x_ref));
    let y_decl = b.var_decl(y, Some(init), BindStatus::Bound);
    let class_node = b.class_decl(point, vec![x_decl, y_decl]);
    let root = b.script(main, None, vec![class_node]);

    let err = bindc_lower::lower_program(&b.finish(root)).unwrap_err();
    assert!(
        matches!(err, LowerError::IllegalInBind { construct: "assignment" }),
        "{err}"
    );
}

#[test]
fn while_inside_a_bound_script_variable_is_rejected() {
    // var a = 1; var b = bind { while (false) {}; a }
    let (mut b, main) = script_builder();
    let a = script_var(&mut b, main, "a");
    let c = script_var(&mut b, main, "b");
    let one = b.int(1);
    let a_decl = b.var_decl(a, Some(one), BindStatus::Unbound);
    let never = b.boolean(false);
    let empty = b.block(Vec::new(), None);
    let spin = b.while_(never, empty);
    let a_ref = b.ident(a);
    let init = b.block(vec![spin], Some(a_ref));
    let c_decl = b.var_decl(c, Some(init), BindStatus::Bound);
    let root = b.script(main, None, vec![a_decl, c_decl]);

    let err = bindc_lower::lower_program(&b.finish(root)).unwrap_err();
    assert!(
        matches!(err, LowerError::IllegalInBind { construct: "while loop" }),
        "{err}"
    );
}

// =============================================================================
// Ranges and slices in comprehensions
// =============================================================================

/// `function f(params): Integer[] { for (i in range) i }` where `range`
/// builds the range node from the function's parameters.
fn range_comprehension(
    params: &[(&str, TypeId)],
    range: impl FnOnce(&mut TreeBuilder, &[SymbolId]) -> bindc_tree::NodeIndex,
) -> Program {
    let (mut b, main) = script_builder();
    let seq = b.seq(TypeId::INT);
    let f = b.function(main, "f", params, seq, SymbolFlags::STATIC);
    let syms = b.params(f);
    let i = b.local(f, "i", TypeId::INT);
    let seq_node = range(&mut b, &syms);
    let i_ref = b.ident(i);
    let clause = TreeBuilder::in_clause(i, seq_node, None);
    let comprehension = b.for_in(vec![clause], i_ref);
    let body = b.block(Vec::new(), Some(comprehension));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    b.finish(root)
}

#[test]
fn literal_negative_steps_count_down() {
    // [5..1 step -1], [6..1 step -(2)] and [5..1 step -2] exclusive of the end
    let cases: [(i32, i32, bool, bool, &[i64]); 3] = [
        (5, -1, false, false, &[5, 4, 3, 2, 1]),
        (6, 2, true, false, &[6, 4, 2]),
        (5, -2, false, true, &[5, 3]),
    ];
    for (start, step, negated, exclusive, expected) in cases {
        let program = range_comprehension(&[], |b, _| {
            let lo = b.int(start);
            let hi = b.int(1);
            let step = b.int(step);
            let step = if negated { b.unary(UnaryOp::Neg, step) } else { step };
            b.range(lo, hi, Some(step), exclusive)
        });
        let unit = lower(&program);
        assert!(!support::print(&unit).contains("tmp$up"), "{expected:?}");
        let mut interp = Interp::new(&unit);
        let out = interp.call_static("Main", "f", Vec::new()).unwrap();
        assert_eq!(out.int_items().unwrap(), expected);
    }
}

#[test]
fn runtime_step_picks_the_direction_when_the_loop_starts() {
    let params = [("lo", TypeId::INT), ("hi", TypeId::INT), ("step", TypeId::INT)];
    let program = range_comprehension(&params, |b, syms| {
        let lo = b.ident(syms[0]);
        let hi = b.ident(syms[1]);
        let step = b.ident(syms[2]);
        b.range(lo, hi, Some(step), false)
    });
    let unit = lower(&program);
    assert!(support::print(&unit).contains("tmp$up"));

    let mut interp = Interp::new(&unit);
    let mut run = |lo, hi, step| {
        interp
            .call_static("Main", "f", vec![Value::Int(lo), Value::Int(hi), Value::Int(step)])
            .unwrap()
            .int_items()
            .unwrap()
    };
    assert_eq!(run(1, 7, 3), [1, 4, 7]);
    assert_eq!(run(5, 1, -2), [5, 3, 1]);
    assert!(run(1, 5, -1).is_empty());
}

/// `function f(xs: Integer[], lo: Integer[, hi: Integer]): Integer[] { for (v in xs[lo..hi]) v }`
fn slice_comprehension(end: Option<bool>) -> Program {
    let (mut b, main) = script_builder();
    let seq = b.seq(TypeId::INT);
    let mut params = vec![("xs", seq), ("lo", TypeId::INT)];
    if end.is_some() {
        params.push(("hi", TypeId::INT));
    }
    let f = b.function(main, "f", &params, seq, SymbolFlags::STATIC);
    let syms = b.params(f);
    let v = b.local(f, "v", TypeId::INT);
    let xs = b.ident(syms[0]);
    let lo = b.ident(syms[1]);
    let hi = end.map(|_| b.ident(syms[2]));
    let slice = b.slice(xs, lo, hi, end.unwrap_or(false));
    let v_ref = b.ident(v);
    let clause = TreeBuilder::in_clause(v, slice, None);
    let comprehension = b.for_in(vec![clause], v_ref);
    let body = b.block(Vec::new(), Some(comprehension));
    let def = b.function_def(f, Some(body));
    let root = b.script(main, None, vec![def]);
    b.finish(root)
}

#[test]
fn slice_bounds_are_clamped_to_the_sequence() {
    let xs = || Value::ints(&[1, 2, 3, 4]);

    let unit = lower(&slice_comprehension(Some(false)));
    let mut interp = Interp::new(&unit);
    let mut inclusive = |lo, hi| {
        interp
            .call_static("Main", "f", vec![xs(), Value::Int(lo), Value::Int(hi)])
            .unwrap()
            .int_items()
            .unwrap()
    };
    assert_eq!(inclusive(-2, 10), [1, 2, 3, 4]);
    assert_eq!(inclusive(1, 2), [2, 3]);
    assert!(inclusive(3, 1).is_empty());

    let unit = lower(&slice_comprehension(Some(true)));
    let mut interp = Interp::new(&unit);
    let out = interp
        .call_static("Main", "f", vec![xs(), Value::Int(1), Value::Int(3)])
        .unwrap();
    assert_eq!(out.int_items().unwrap(), [2, 3]);
}

#[test]
fn open_slice_looks_up_the_size_once() {
    let unit = lower(&slice_comprehension(None));
    let f = method_node(class(&unit, "Main"), "f");
    assert_eq!(calls_to(&f, "size"), 1);
    assert_eq!(calls_to(&f, "min"), 0);

    let mut interp = Interp::new(&unit);
    let mut from = |lo| {
        interp
            .call_static("Main", "f", vec![Value::ints(&[1, 2, 3, 4]), Value::Int(lo)])
            .unwrap()
            .int_items()
            .unwrap()
    };
    assert_eq!(from(-3), [1, 2, 3, 4]);
    assert_eq!(from(2), [3, 4]);
    assert!(from(9).is_empty());
}
