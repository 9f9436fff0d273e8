use crate::names;
use crate::options::LowerOptions;
use crate::runtime::{RuntimeClass, RuntimeMethod, RuntimeReceiver, var_flags};

#[test]
fn test_accessor_names() {
    assert_eq!(names::getter("x"), "get$x");
    assert_eq!(names::setter("x"), "set$x");
    assert_eq!(names::field("x"), "$x");
    assert_eq!(names::offset("x"), "VOFF$x");
    assert_eq!(names::mixin_interface("Shape"), "Shape$Mixin");
    assert_eq!(names::getmap("ui.Point"), "GETMAP$ui$Point");
}

#[test]
fn test_internal_method_blacklist() {
    for name in [
        "<init>",
        "<clinit>",
        "applyDefaults$",
        "count$",
        "userInit$",
        "postInit$",
        "initVars$",
        "invoke$",
    ] {
        assert!(names::is_internal_method_name(name), "{name} should be internal");
    }
    assert!(!names::is_internal_method_name("toString"));
    assert!(!names::is_internal_method_name("get$x"));
}

#[test]
fn test_accessor_var_name() {
    assert_eq!(names::accessor_var_name("get$width"), Some("width"));
    assert_eq!(names::accessor_var_name("invalidate$w"), Some("w"));
    assert_eq!(names::accessor_var_name("getVOFF$w"), Some("w"));
    assert_eq!(names::accessor_var_name("get$"), None);
    assert_eq!(names::accessor_var_name("draw"), None);
}

#[test]
fn test_runtime_receivers() {
    assert_eq!(
        RuntimeMethod::SeqFromArray.receiver(),
        RuntimeReceiver::Static(RuntimeClass::Sequences)
    );
    assert_eq!(RuntimeMethod::DurationMul.receiver(), RuntimeReceiver::Instance);
    assert_eq!(RuntimeMethod::DurationMul.name(), "mul");
    assert_eq!(RuntimeMethod::SeqSetElement.name(), "setElement");
}

#[test]
fn test_flag_names_resolve() {
    assert_eq!(
        var_flags::value_of(var_flags::INIT_OBJ_LIT_NAME),
        Some(var_flags::INIT_OBJ_LIT)
    );
    assert_eq!(var_flags::value_of("VFLGS$NOPE"), None);
}

#[test]
fn test_options_from_json_keeps_defaults() {
    let options = LowerOptions::from_json(r#"{ "nullChecks": false }"#).expect("valid json");
    assert!(!options.null_checks);
    assert!(options.inline_literal_rhs);
    assert_eq!(options.runtime_import("Sequences"), "bindc.runtime.Sequences");
}
