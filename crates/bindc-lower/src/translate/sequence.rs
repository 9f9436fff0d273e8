//! Sequence construction and element access.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, TranslationResult};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::{RuntimeClass, RuntimeMethod};
use bindc_target::{JBinaryOp, JNode, JType};
use bindc_tree::{Node, NodeIndex, NodeKind, SymbolId, TypeId};

impl Translator<'_> {
    /// `ArraySequence<T> b = new ArraySequence<T>(TypeInfo.T)`.
    pub(crate) fn new_builder(&mut self, elem: TypeId) -> (String, JNode) {
        let name = self.fresh_temp("seq");
        let ty = JType::generic(
            RuntimeClass::ArraySequence.name(),
            vec![typemorph::boxed_type(self.program(), elem)],
        );
        let decl = JNode::local(
            ty.clone(),
            name.clone(),
            Some(JNode::new_object(ty, vec![self.type_info(elem)])),
        );
        (name, decl)
    }

    /// Append one translated item, flattening sequence-typed items.
    pub(crate) fn builder_add(
        &mut self,
        builder: &str,
        item: ExpressionResult,
        seq_ty: TypeId,
    ) -> LowerResult<(Vec<JNode>, Dependencies)> {
        let elem = self.element_type(seq_ty);
        let (method, target) = if self.is_sequence(item.ty) {
            (RuntimeMethod::BuilderAddAll, seq_ty)
        } else {
            (RuntimeMethod::BuilderAdd, elem)
        };
        let item = self.coerce(item, Some(target))?;
        let deps = item.deps.clone();
        let (mut stmts, value) = item.split()?;
        stmts.push(JNode::expr_stmt(
            self.runtime_call(method, vec![JNode::id(builder), value]),
        ));
        Ok((stmts, deps))
    }

    pub(super) fn explicit_sequence(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        items: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let elem = self.element_type(node.ty);
        let expr = match items {
            [] => ExpressionResult::new(typemorph::empty_sequence(self.program(), elem), node.ty),
            [single] if !self.is_sequence(self.node(*single)?.ty) => {
                let mut item = self.expr(ctx, *single, Some(elem))?;
                let value = item.take_value()?;
                item.value = Some(self.runtime_call(
                    RuntimeMethod::SeqSingleton,
                    vec![self.type_info(elem), value],
                ));
                item.ty = node.ty;
                item
            }
            _ => {
                let (builder, decl) = self.new_builder(elem);
                let mut preface = vec![decl];
                let mut deps = Dependencies::default();
                for item in items {
                    let translated = self.expr(ctx, *item, None)?;
                    let (stmts, item_deps) = self.builder_add(&builder, translated, node.ty)?;
                    preface.extend(stmts);
                    deps = deps.combine(item_deps);
                }
                ExpressionResult {
                    preface,
                    value: Some(self.runtime_call(
                        RuntimeMethod::BuilderToSequence,
                        vec![JNode::id(builder)],
                    )),
                    ty: node.ty,
                    deps,
                }
            }
        };
        self.finish_expr(expr, target, yld)
    }

    pub(super) fn range(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        lower: NodeIndex,
        upper: NodeIndex,
        step: Option<NodeIndex>,
        exclusive: bool,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let elem = self.element_type(node.ty);
        let mut parts = vec![
            self.expr(ctx, lower, Some(elem))?,
            self.expr(ctx, upper, Some(elem))?,
        ];
        if let Some(step) = step {
            parts.push(self.expr(ctx, step, Some(elem))?);
        }
        let (preface, args, deps) = self.sequence_operands(parts)?;
        let method = match (exclusive, step.is_some()) {
            (false, false) => RuntimeMethod::SeqRange,
            (false, true) => RuntimeMethod::SeqRangeStep,
            (true, false) => RuntimeMethod::SeqRangeExclusive,
            (true, true) => RuntimeMethod::SeqRangeExclusiveStep,
        };
        let expr = ExpressionResult {
            preface,
            value: Some(self.runtime_call(method, args)),
            ty: node.ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }

    /// The new-elements parameter of an enclosing on-replace trigger,
    /// with the variable it belongs to.
    fn new_elements_var(&self, ctx: &TranslationContext, seq: NodeIndex) -> LowerResult<Option<SymbolId>> {
        if let NodeKind::Ident(sym) = self.node(seq)?.kind
            && let Some(info) = ctx.on_replace_for(sym)
        {
            return Ok(Some(info.var));
        }
        Ok(None)
    }

    pub(super) fn indexed(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        seq: NodeIndex,
        index: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let seq_ty = self.node(seq)?.ty;

        // newElements[i] is current[lo$ + i]; no slice is built.
        if let Some(var) = self.new_elements_var(ctx, seq)? {
            let mut index = self.expr(ctx, index, Some(TypeId::INT))?;
            let i = index.take_value()?;
            let current = self.member_read(ctx, None, var)?;
            let position = JNode::binary(JNode::id(names::FIRST_INDEX_PARAM), JBinaryOp::Add, i);
            index.value = Some(self.runtime_call(RuntimeMethod::SeqGet, vec![current, position]));
            index.ty = node.ty;
            return self.finish_expr(index, target, yld);
        }

        let s = self.expr(ctx, seq, None)?;
        let i = self.expr(ctx, index, Some(TypeId::INT))?;
        let (preface, mut values, deps) = self.sequence_operands(vec![s, i])?;
        let (Some(i), Some(s)) = (values.pop(), values.pop()) else {
            return Err(LowerError::internal("indexed operand count"));
        };
        let value = if self.program().types.is_array(seq_ty) {
            JNode::index(s, i)
        } else {
            self.runtime_call(RuntimeMethod::SeqGet, vec![s, i])
        };
        let expr = ExpressionResult {
            preface,
            value: Some(value),
            ty: node.ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }

    /// `s[a..b]`: `subsequence` takes an exclusive end, so an inclusive end
    /// is bumped by one and a missing end means the size.
    pub(super) fn slice(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        seq: NodeIndex,
        start: NodeIndex,
        end: Option<NodeIndex>,
        end_exclusive: bool,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let mut s = self.expr(ctx, seq, None)?;
        if end.is_none() {
            s = self.hoist(s, "seq")?;
        }
        let mut parts = vec![s, self.expr(ctx, start, Some(TypeId::INT))?];
        if let Some(end) = end {
            parts.push(self.expr(ctx, end, Some(TypeId::INT))?);
        }
        let (preface, mut values, deps) = self.sequence_operands(parts)?;
        let end_value = match end {
            Some(_) => {
                let end_value = values
                    .pop()
                    .ok_or_else(|| LowerError::internal("slice operand count"))?;
                if end_exclusive {
                    end_value
                } else {
                    JNode::binary(end_value, JBinaryOp::Add, JNode::int(1))
                }
            }
            None => {
                let s = values
                    .first()
                    .cloned()
                    .ok_or_else(|| LowerError::internal("slice operand count"))?;
                self.runtime_call(RuntimeMethod::SeqSize, vec![s])
            }
        };
        values.push(end_value);
        let expr = ExpressionResult {
            preface,
            value: Some(self.runtime_call(RuntimeMethod::SeqSubsequence, values)),
            ty: node.ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }

    pub(super) fn index_of(
        &mut self,
        ctx: &TranslationContext,
        var: SymbolId,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let info = ctx.in_clause_for(var).ok_or_else(|| {
            LowerError::internal(format!("indexof {} outside its for clause", var.0))
        })?;
        let expr = ExpressionResult::new(info.index.clone(), TypeId::INT);
        self.finish_expr(expr, target, yld)
    }
}
