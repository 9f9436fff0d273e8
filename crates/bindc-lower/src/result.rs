//! Result model shared by every translation step.
//!
//! A translation produces exactly one [`TranslationResult`] variant. Callers
//! match on the variant they need and fail with
//! [`LowerError::VariantMismatch`] on anything else; no caller reads fields
//! of a variant it did not match.
//!
//! Binding metadata travels in [`Dependencies`], an explicit accumulator that
//! each expression result carries. A parent folds its children's metadata in
//! with [`Dependencies::combine`], so a deeply nested bound expression
//! reports its complete dependency set without any shared buffers.

use crate::error::{LowerError, LowerResult};
use bindc_target::JNode;
use bindc_tree::{SymbolId, TypeId};
use indexmap::IndexSet;

/// A statement to run inside a bindee's invalidation path.
#[derive(Debug, Clone, PartialEq)]
pub struct Invalidator {
    /// The variable whose change triggers the statement.
    pub bindee: SymbolId,
    pub stmt: JNode,
}

/// A dependency that crosses an object boundary: `instance.referenced`,
/// where `instance` is a variable of the current class holding another
/// object and `referenced` is a variable of that object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterClassPair {
    pub instance: SymbolId,
    pub referenced: SymbolId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies {
    /// Member variables the value depends on, in first-use order.
    pub bindees: IndexSet<SymbolId>,
    pub invalidators: Vec<Invalidator>,
    pub interclass: IndexSet<InterClassPair>,
    /// Statements a bidirectional binding runs before storing a new value.
    pub setter_preface: Vec<JNode>,
}

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.bindees.is_empty()
            && self.invalidators.is_empty()
            && self.interclass.is_empty()
            && self.setter_preface.is_empty()
    }

    /// Merge two accumulators; `self` entries come first.
    pub fn combine(mut self, other: Self) -> Self {
        self.bindees.extend(other.bindees);
        for inv in other.invalidators {
            if !self.invalidators.contains(&inv) {
                self.invalidators.push(inv);
            }
        }
        self.interclass.extend(other.interclass);
        self.setter_preface.extend(other.setter_preface);
        self
    }

    pub fn with_bindee(mut self, sym: SymbolId) -> Self {
        self.bindees.insert(sym);
        self
    }
}

/// Ordered statements with no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementsResult {
    pub stmts: Vec<JNode>,
    pub deps: Dependencies,
}

impl StatementsResult {
    pub fn new(stmts: Vec<JNode>) -> Self {
        Self {
            stmts,
            deps: Dependencies::default(),
        }
    }
}

/// Preface statements followed by a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    pub preface: Vec<JNode>,
    /// `None` for a void expression.
    pub value: Option<JNode>,
    pub ty: TypeId,
    pub deps: Dependencies,
}

impl ExpressionResult {
    pub fn new(value: JNode, ty: TypeId) -> Self {
        Self {
            preface: Vec::new(),
            value: Some(value),
            ty,
            deps: Dependencies::default(),
        }
    }

    pub fn void(preface: Vec<JNode>) -> Self {
        Self {
            preface,
            value: None,
            ty: TypeId::VOID,
            deps: Dependencies::default(),
        }
    }

    pub fn with_preface(mut self, mut preface: Vec<JNode>) -> Self {
        preface.append(&mut self.preface);
        self.preface = preface;
        self
    }

    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = std::mem::take(&mut self.deps).combine(deps);
        self
    }

    /// The value, or an internal error for a void expression.
    pub fn take_value(&mut self) -> LowerResult<JNode> {
        self.value
            .take()
            .ok_or_else(|| LowerError::internal("value required from a void expression"))
    }

    /// Preface and value, for callers that place them separately.
    pub fn split(mut self) -> LowerResult<(Vec<JNode>, JNode)> {
        let value = self.take_value()?;
        Ok((self.preface, value))
    }

    /// Body computing element `pos$` of a virtual sequence. A materialized
    /// expression has none.
    pub fn element_method_body(&self) -> LowerResult<&[JNode]> {
        Err(LowerError::unsupported(
            "element access body of a non-virtual bound sequence",
        ))
    }

    /// Body computing the size of a virtual sequence. A materialized
    /// expression has none.
    pub fn size_method_body(&self) -> LowerResult<&[JNode]> {
        Err(LowerError::unsupported(
            "size body of a non-virtual bound sequence",
        ))
    }
}

/// A bound sequence kept virtual: element and size are computed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSequenceResult {
    /// Materialized value and dependencies, used by the plain getter.
    pub expr: ExpressionResult,
    pub element_body: Vec<JNode>,
    pub size_body: Vec<JNode>,
}

impl BoundSequenceResult {
    pub fn element_method_body(&self) -> LowerResult<&[JNode]> {
        Ok(&self.element_body)
    }

    pub fn size_method_body(&self) -> LowerResult<&[JNode]> {
        Ok(&self.size_body)
    }
}

/// A complete target node that fits neither shape: a method, a class, a
/// compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialResult {
    pub node: JNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult {
    Statements(StatementsResult),
    Expression(ExpressionResult),
    BoundSequence(BoundSequenceResult),
    Special(SpecialResult),
}

impl TranslationResult {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Statements(_) => "statements",
            Self::Expression(_) => "expression",
            Self::BoundSequence(_) => "bound sequence",
            Self::Special(_) => "special",
        }
    }

    pub fn into_expression(self) -> LowerResult<ExpressionResult> {
        match self {
            Self::Expression(expr) => Ok(expr),
            Self::BoundSequence(_) => Err(LowerError::unsupported(
                "virtual bound sequence where a plain value is required",
            )),
            other => Err(LowerError::VariantMismatch {
                expected: "expression",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_statements(self) -> LowerResult<StatementsResult> {
        match self {
            Self::Statements(stmts) => Ok(stmts),
            other => Err(LowerError::VariantMismatch {
                expected: "statements",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_special(self) -> LowerResult<JNode> {
        match self {
            Self::Special(special) => Ok(special.node),
            other => Err(LowerError::VariantMismatch {
                expected: "special",
                found: other.kind_name(),
            }),
        }
    }

    pub fn deps(&self) -> Option<&Dependencies> {
        match self {
            Self::Statements(stmts) => Some(&stmts.deps),
            Self::Expression(expr) => Some(&expr.deps),
            Self::BoundSequence(seq) => Some(&seq.expr.deps),
            Self::Special(_) => None,
        }
    }

    pub fn element_method_body(&self) -> LowerResult<&[JNode]> {
        match self {
            Self::BoundSequence(seq) => seq.element_method_body(),
            Self::Expression(expr) => expr.element_method_body(),
            other => Err(LowerError::VariantMismatch {
                expected: "bound sequence",
                found: other.kind_name(),
            }),
        }
    }

    pub fn size_method_body(&self) -> LowerResult<&[JNode]> {
        match self {
            Self::BoundSequence(seq) => seq.size_method_body(),
            Self::Expression(expr) => expr.size_method_body(),
            other => Err(LowerError::VariantMismatch {
                expected: "bound sequence",
                found: other.kind_name(),
            }),
        }
    }
}
