use crate::error::LowerError;
use crate::unit::UnitState;
use bindc_target::JNode;
use bindc_tree::SymbolId;

#[test]
fn temps_are_unique_per_unit() {
    let mut unit = UnitState::new();
    let a = unit.fresh_temp("seq");
    let b = unit.fresh_temp("seq");
    assert_ne!(a, b);
    assert!(a.starts_with("tmp$seq"));
}

#[test]
fn hoisted_definitions_land_in_the_innermost_scope() {
    let mut unit = UnitState::new();
    unit.push_definitions();
    unit.add_definition(JNode::comment("outer")).unwrap();
    unit.push_definitions();
    unit.add_definition(JNode::comment("inner")).unwrap();
    assert_eq!(unit.pop_definitions().unwrap(), vec![JNode::comment("inner")]);
    assert_eq!(unit.pop_definitions().unwrap(), vec![JNode::comment("outer")]);
}

#[test]
fn unbalanced_buffers_are_internal_errors() {
    let mut unit = UnitState::new();
    assert!(matches!(unit.pop_definitions(), Err(LowerError::Internal { .. })));
    assert!(matches!(unit.pop_statements(), Err(LowerError::Internal { .. })));
    assert!(unit.add_definition(JNode::null()).is_err());
    assert!(unit.add_block_statement(JNode::null()).is_err());
    assert!(!unit.has_block_scope());
}

#[test]
fn maps_only_grow() {
    let mut unit = UnitState::new();
    unit.substitute(SymbolId(1), "x$0");
    unit.substitute(SymbolId(1), "x$1");
    assert_eq!(unit.substitution(SymbolId(1)), Some("x$1"));
    assert_eq!(unit.substitution(SymbolId(2)), None);

    unit.mark_outer_reference(SymbolId(5));
    unit.mark_init_class(SymbolId(6));
    assert!(unit.has_outer_reference(SymbolId(5)));
    assert!(unit.has_init_blocks(SymbolId(6)));
    assert!(!unit.has_init_blocks(SymbolId(5)));
}
