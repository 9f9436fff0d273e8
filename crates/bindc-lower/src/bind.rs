//! Bind-translation service.
//!
//! The translator hands every bound initializer to a [`BindTranslator`] and
//! folds the returned dependency metadata into the class report; it never
//! computes a dependency graph itself. [`DefaultBindTranslator`] is the
//! implementation `lower_program` uses: it translates the initializer
//! eagerly inside a bind context and invalidates the owner whenever a
//! bindee changes.

use crate::context::TranslationContext;
use crate::error::{LowerError, LowerResult};
use crate::result::{BoundSequenceResult, Dependencies, ExpressionResult, Invalidator, TranslationResult};
use crate::translate::Translator;
use bindc_common::names;
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode};
use bindc_tree::{NodeIndex, NodeKind, SymbolId};

pub trait BindTranslator {
    /// Translate the initializer of a bound variable owned by `owner`.
    ///
    /// Returns an `Expression` result, or a `BoundSequence` result when the
    /// variable is better kept as a virtual sequence.
    fn translate_bound_expression(
        &self,
        tr: &mut Translator<'_>,
        ctx: &TranslationContext,
        init: NodeIndex,
        owner: SymbolId,
    ) -> LowerResult<TranslationResult>;

    /// Translate the inverse of a bidirectional binding. The result's
    /// `setter_preface` writes `value$` back to the bound source.
    fn translate_inverse_bind(
        &self,
        tr: &mut Translator<'_>,
        ctx: &TranslationContext,
        init: NodeIndex,
        owner: SymbolId,
    ) -> LowerResult<ExpressionResult>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindTranslator;

impl DefaultBindTranslator {
    pub const fn new() -> Self {
        Self
    }

    fn virtual_bodies(
        tr: &mut Translator<'_>,
        ctx: &TranslationContext,
        init: NodeIndex,
        owner: SymbolId,
    ) -> LowerResult<Option<(Vec<JNode>, Vec<JNode>)>> {
        let program = tr.program();
        let node = tr.node(init)?;
        let pos = JNode::id(names::POSITION_PARAM);
        match &node.kind {
            NodeKind::Range {
                lower,
                upper,
                step: None,
                exclusive,
            } if program.types.element_type(node.ty) == Some(bindc_tree::TypeId::INT) => {
                let lo = tr.expr(ctx, *lower, Some(bindc_tree::TypeId::INT))?;
                let hi = tr.expr(ctx, *upper, Some(bindc_tree::TypeId::INT))?;
                let (mut lo_stmts, lo_value) = lo.split()?;
                let (hi_stmts, hi_value) = hi.split()?;

                let mut element = lo_stmts.clone();
                element.push(JNode::ret(Some(JNode::binary(lo_value.clone(), JBinaryOp::Add, pos))));

                let mut count = JNode::binary(hi_value, JBinaryOp::Sub, lo_value);
                if !*exclusive {
                    count = JNode::binary(count, JBinaryOp::Add, JNode::int(1));
                }
                lo_stmts.extend(hi_stmts);
                lo_stmts.push(JNode::ret(Some(tr.runtime_call(
                    RuntimeMethod::MathMax,
                    vec![JNode::int(0), count],
                ))));
                Ok(Some((element, lo_stmts)))
            }
            NodeKind::Ident(sym)
                if program.symbols.is_member_var(*sym)
                    && program.types.is_sequence(node.ty)
                    && !program.symbols.has_flag(*sym, bindc_tree::SymbolFlags::STATIC)
                    && *sym != owner =>
            {
                let seq = tr.expr(ctx, init, None)?;
                let (stmts, value) = seq.split()?;
                let mut element = stmts.clone();
                element.push(JNode::ret(Some(
                    tr.runtime_call(RuntimeMethod::SeqGet, vec![value.clone(), pos]),
                )));
                let mut size = stmts;
                size.push(JNode::ret(Some(
                    tr.runtime_call(RuntimeMethod::SeqSize, vec![value]),
                )));
                Ok(Some((element, size)))
            }
            _ => Ok(None),
        }
    }
}

impl BindTranslator for DefaultBindTranslator {
    fn translate_bound_expression(
        &self,
        tr: &mut Translator<'_>,
        ctx: &TranslationContext,
        init: NodeIndex,
        owner: SymbolId,
    ) -> LowerResult<TranslationResult> {
        let program = tr.program();
        let owner_sym = tr.symbol(owner)?;
        let bctx = ctx.entering_bind(owner);
        let expr = tr.expr(&bctx, init, Some(owner_sym.ty))?;

        let mut deps = Dependencies::default();
        if !owner_sym.is_static() {
            let invalidate = JNode::expr_stmt(JNode::call_local(
                names::invalidate(&owner_sym.name),
                Vec::new(),
            ));
            for bindee in &expr.deps.bindees {
                deps.invalidators.push(Invalidator {
                    bindee: *bindee,
                    stmt: invalidate.clone(),
                });
            }
        }
        let expr = expr.with_deps(deps);

        if program.types.is_sequence(owner_sym.ty)
            && !owner_sym.is_static()
            && let Some((element_body, size_body)) = Self::virtual_bodies(tr, &bctx, init, owner)?
        {
            return Ok(TranslationResult::BoundSequence(BoundSequenceResult {
                expr,
                element_body,
                size_body,
            }));
        }
        Ok(TranslationResult::Expression(expr))
    }

    fn translate_inverse_bind(
        &self,
        tr: &mut Translator<'_>,
        ctx: &TranslationContext,
        init: NodeIndex,
        owner: SymbolId,
    ) -> LowerResult<ExpressionResult> {
        let node = tr.node(init)?;
        let (receiver, var) = match &node.kind {
            NodeKind::Ident(sym) => (None, *sym),
            NodeKind::Select { receiver, member } => (Some(*receiver), *member),
            other => {
                return Err(LowerError::unsupported(format!(
                    "inverse of a {} binding",
                    other.tag()
                )));
            }
        };
        if !tr.program().symbols.is_member_var(var) {
            return Err(LowerError::unsupported("inverse binding to a non-member"));
        }
        let bctx = ctx.entering_bind(owner);
        let mut result = tr.expr(&bctx, init, None)?;
        let mut preface = Vec::new();
        let recv = match receiver {
            Some(recv) => {
                let (stmts, value) = tr.expr(ctx, recv, None)?.split()?;
                preface.extend(stmts);
                Some(value)
            }
            None => None,
        };
        let write = tr.member_write(ctx, recv, var, JNode::id(names::NEW_VALUE_PARAM))?;
        preface.push(JNode::expr_stmt(write));
        result.deps.setter_preface.extend(preface);
        Ok(result)
    }
}
