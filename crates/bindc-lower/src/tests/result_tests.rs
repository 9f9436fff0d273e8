use crate::error::LowerError;
use crate::result::{
    BoundSequenceResult, Dependencies, ExpressionResult, Invalidator, InterClassPair,
    SpecialResult, StatementsResult, TranslationResult,
};
use bindc_target::JNode;
use bindc_tree::{SymbolId, TypeId};

fn invalidate(name: &str) -> JNode {
    JNode::expr_stmt(JNode::call_local(format!("invalidate${name}"), Vec::new()))
}

#[test]
fn combine_keeps_left_entries_first() {
    let a = Dependencies::default()
        .with_bindee(SymbolId(3))
        .with_bindee(SymbolId(1));
    let b = Dependencies::default()
        .with_bindee(SymbolId(1))
        .with_bindee(SymbolId(7));
    let merged = a.combine(b);
    let order: Vec<SymbolId> = merged.bindees.iter().copied().collect();
    assert_eq!(order, vec![SymbolId(3), SymbolId(1), SymbolId(7)]);
}

#[test]
fn combine_drops_duplicate_invalidators() {
    let inv = Invalidator {
        bindee: SymbolId(2),
        stmt: invalidate("y"),
    };
    let mut a = Dependencies::default();
    a.invalidators.push(inv.clone());
    let mut b = Dependencies::default();
    b.invalidators.push(inv);
    b.invalidators.push(Invalidator {
        bindee: SymbolId(2),
        stmt: invalidate("z"),
    });
    b.interclass.insert(InterClassPair {
        instance: SymbolId(4),
        referenced: SymbolId(5),
    });

    let merged = a.combine(b);
    assert_eq!(merged.invalidators.len(), 2);
    assert_eq!(merged.interclass.len(), 1);
    assert!(!merged.is_empty());
    assert!(Dependencies::default().is_empty());
}

#[test]
fn with_preface_prepends() {
    let mut expr = ExpressionResult::new(JNode::id("t"), TypeId::INT);
    expr.preface.push(JNode::comment("second"));
    let expr = expr.with_preface(vec![JNode::comment("first")]);
    assert_eq!(
        expr.preface,
        vec![JNode::comment("first"), JNode::comment("second")]
    );
}

#[test]
fn void_expression_has_no_value() {
    let expr = ExpressionResult::void(vec![JNode::comment("side effect")]);
    assert!(matches!(
        expr.split(),
        Err(LowerError::Internal { .. })
    ));
}

#[test]
fn variant_mismatch_names_both_sides() {
    let stmts = TranslationResult::Statements(StatementsResult::new(Vec::new()));
    let err = stmts.into_expression().unwrap_err();
    assert_eq!(
        err,
        LowerError::VariantMismatch {
            expected: "expression",
            found: "statements",
        }
    );

    let special = TranslationResult::Special(SpecialResult { node: JNode::null() });
    assert!(special.deps().is_none());
    assert!(matches!(
        special.into_statements(),
        Err(LowerError::VariantMismatch { expected: "statements", found: "special" })
    ));
}

#[test]
fn only_virtual_sequences_have_element_bodies() {
    let expr = ExpressionResult::new(JNode::id("s"), TypeId::OBJECT);
    let plain = TranslationResult::Expression(expr.clone());
    assert!(matches!(
        plain.element_method_body(),
        Err(LowerError::Unsupported { .. })
    ));
    assert!(plain.size_method_body().is_err());

    let virtual_seq = TranslationResult::BoundSequence(BoundSequenceResult {
        expr,
        element_body: vec![JNode::ret(Some(JNode::int(1)))],
        size_body: vec![JNode::ret(Some(JNode::int(2)))],
    });
    assert_eq!(virtual_seq.element_method_body().map(<[JNode]>::len), Ok(1));
    assert_eq!(virtual_seq.size_method_body().map(<[JNode]>::len), Ok(1));
    assert!(matches!(
        virtual_seq.into_expression(),
        Err(LowerError::Unsupported { .. })
    ));
}
