//! `for` loops and comprehensions.
//!
//! Each in-clause becomes one nested Java loop, outermost first. How a
//! clause iterates depends on its sequence expression:
//!
//! - a numeric range loops over the bounds directly, no sequence is built
//! - a slice loops over the underlying sequence between clamped bounds
//! - any other sequence uses a for-each, or an indexed loop when the body
//!   asks for `indexof`
//! - a plain value runs the body once, skipped when the value is null
//!
//! A comprehension collects the body values in an `ArraySequence` builder;
//! a loop run only for effect has no builder.

use super::Translator;
use crate::context::{InClauseInfo, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{ExpressionResult, StatementsResult, TranslationResult};
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode, JType, JUnaryOp};
use bindc_tree::{InClause, Literal, Node, NodeIndex, NodeKind, SymbolId, TypeId, UnaryOp};

/// What the innermost loop body does with the body value.
#[derive(Debug, Clone)]
enum LoopBody {
    Discard,
    Accumulate { builder: String, seq_ty: TypeId },
}

/// Sign of a range step known at translation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    /// Decided at runtime through the named boolean.
    Runtime,
}

impl Translator<'_> {
    pub(super) fn for_expr(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        clauses: &[InClause],
        body: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let collect = !self.program().types.is_void(node.ty) && *yld != Yield::DISCARD;
        if !collect {
            let result = self.emit_clauses(ctx, clauses, body, &LoopBody::Discard)?;
            return self.finish_stmts(result, yld);
        }

        let elem = self.element_type(node.ty);
        let (builder, decl) = self.new_builder(elem);
        let mode = LoopBody::Accumulate {
            builder: builder.clone(),
            seq_ty: node.ty,
        };
        let StatementsResult { stmts, deps } = self.emit_clauses(ctx, clauses, body, &mode)?;
        let mut preface = Vec::with_capacity(stmts.len() + 1);
        preface.push(decl);
        preface.extend(stmts);
        let expr = ExpressionResult {
            preface,
            value: Some(self.runtime_call(RuntimeMethod::BuilderToSequence, vec![JNode::id(builder)])),
            ty: node.ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }

    /// Whether `indexof var` occurs under any of `roots`.
    fn uses_index_of(&self, var: SymbolId, roots: &[NodeIndex]) -> bool {
        let arena = &self.program().arena;
        roots.iter().any(|root| {
            arena.any(*root, &mut |node| {
                matches!(node.kind, NodeKind::IndexOf(v) if v == var)
            })
        })
    }

    fn emit_clauses(
        &mut self,
        ctx: &TranslationContext,
        clauses: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
    ) -> LowerResult<StatementsResult> {
        let Some((clause, rest)) = clauses.split_first() else {
            return self.in_block_scope(|tr| tr.loop_body(ctx, body, mode));
        };

        let mut roots: Vec<NodeIndex> = vec![body];
        roots.extend(clause.filter);
        for inner in rest {
            roots.push(inner.seq);
            roots.extend(inner.filter);
        }
        let wants_index = self.uses_index_of(clause.var, &roots);

        let seq_node = self.node(clause.seq)?;
        match &seq_node.kind {
            NodeKind::Range {
                lower,
                upper,
                step,
                exclusive,
            } => self.range_loop(
                ctx, clause, rest, body, mode, wants_index, *lower, *upper, *step, *exclusive,
            ),
            NodeKind::Slice {
                seq,
                start,
                end,
                end_exclusive,
            } => self.slice_loop(
                ctx, clause, rest, body, mode, wants_index, *seq, *start, *end, *end_exclusive,
            ),
            _ if self.is_sequence(seq_node.ty) => {
                self.sequence_loop(ctx, clause, rest, body, mode, wants_index)
            }
            _ => self.singleton_loop(ctx, clause, rest, body, mode),
        }
    }

    fn loop_body(
        &mut self,
        ctx: &TranslationContext,
        body: NodeIndex,
        mode: &LoopBody,
    ) -> LowerResult<StatementsResult> {
        match mode {
            LoopBody::Discard => self.stmts(ctx, body),
            LoopBody::Accumulate { builder, seq_ty } => {
                let value = self.expr(ctx, body, None)?;
                let (stmts, deps) = self.builder_add(builder, value, *seq_ty)?;
                Ok(StatementsResult { stmts, deps })
            }
        }
    }

    /// The statements inside one clause's loop: the loop variable's
    /// filter, then the next clause or the body.
    fn clause_inner(
        &mut self,
        ctx: &TranslationContext,
        clause: &InClause,
        rest: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
        index: Option<JNode>,
    ) -> LowerResult<StatementsResult> {
        let inner_ctx = match index {
            Some(index) => ctx.with_in_clause(InClauseInfo {
                var: clause.var,
                index,
            }),
            None => ctx.clone(),
        };
        let StatementsResult { stmts, deps } = self.emit_clauses(&inner_ctx, rest, body, mode)?;
        let Some(filter) = clause.filter else {
            return Ok(StatementsResult { stmts, deps });
        };
        let cond = self.expr(&inner_ctx, filter, Some(TypeId::BOOLEAN))?;
        let cond_deps = cond.deps.clone();
        let (mut guarded, cond) = cond.split()?;
        guarded.push(JNode::if_stmt(cond, stmts, None));
        Ok(StatementsResult {
            stmts: guarded,
            deps: deps.combine(cond_deps),
        })
    }

    fn loop_var(&self, clause: &InClause) -> LowerResult<(String, TypeId)> {
        let symbol = self.symbol(clause.var)?;
        Ok((symbol.name.clone(), symbol.ty))
    }

    fn step_direction(&self, step: Option<NodeIndex>) -> LowerResult<Direction> {
        let Some(step) = step else {
            return Ok(Direction::Up);
        };
        let node = self.node(step)?;
        let positive = match &node.kind {
            NodeKind::Literal(lit) => literal_sign(lit),
            NodeKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match &self.node(*operand)?.kind {
                NodeKind::Literal(lit) => literal_sign(lit).map(|up| !up),
                _ => None,
            },
            _ => None,
        };
        Ok(match positive {
            Some(true) => Direction::Up,
            Some(false) => Direction::Down,
            None => Direction::Runtime,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn range_loop(
        &mut self,
        ctx: &TranslationContext,
        clause: &InClause,
        rest: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
        wants_index: bool,
        lower: NodeIndex,
        upper: NodeIndex,
        step: Option<NodeIndex>,
        exclusive: bool,
    ) -> LowerResult<StatementsResult> {
        let (var, var_ty) = self.loop_var(clause)?;
        let elem = self.element_type(self.node(clause.seq)?.ty);
        let direction = self.step_direction(step)?;

        let lo = self.expr(ctx, lower, Some(elem))?;
        let hi = self.expr(ctx, upper, Some(elem))?;
        let hi = self.hoist(hi, "hi")?;
        let mut parts = vec![lo, hi];
        if let Some(step) = step {
            let step = self.expr(ctx, step, Some(elem))?;
            parts.push(self.hoist(step, "step")?);
        }
        let (mut stmts, mut values, mut deps) = self.sequence_operands(parts)?;
        let step_value = if step.is_some() { values.pop() } else { None };
        let (Some(hi), Some(lo)) = (values.pop(), values.pop()) else {
            return Err(LowerError::internal("range loop operand count"));
        };

        let up_flag = if direction == Direction::Runtime {
            let flag = self.fresh_temp("up");
            let step_value = step_value
                .clone()
                .ok_or_else(|| LowerError::internal("runtime direction without a step"))?;
            stmts.push(JNode::local(
                JType::Boolean,
                flag.clone(),
                Some(JNode::binary(step_value, JBinaryOp::Gt, JNode::int(0))),
            ));
            Some(flag)
        } else {
            None
        };

        let var_ref = JNode::id(var.clone());
        let (up_op, down_op) = if exclusive {
            (JBinaryOp::Lt, JBinaryOp::Gt)
        } else {
            (JBinaryOp::Le, JBinaryOp::Ge)
        };
        let cond = match (&up_flag, direction) {
            (Some(flag), _) => JNode::conditional(
                JNode::id(flag.clone()),
                JNode::binary(var_ref.clone(), up_op, hi.clone()),
                JNode::binary(var_ref.clone(), down_op, hi),
            ),
            (None, Direction::Down) => JNode::binary(var_ref.clone(), down_op, hi),
            (None, _) => JNode::binary(var_ref.clone(), up_op, hi),
        };

        let mut update = vec![match step_value {
            Some(step) => JNode::CompoundAssign {
                op: JBinaryOp::Add,
                target: Box::new(var_ref),
                value: Box::new(step),
            },
            None => JNode::unary(JUnaryOp::PostInc, var_ref),
        }];
        let index = if wants_index {
            let counter = self.fresh_temp("i");
            stmts.push(JNode::local(JType::Int, counter.clone(), Some(JNode::int(0))));
            update.push(JNode::unary(JUnaryOp::PostInc, JNode::id(counter.clone())));
            Some(JNode::id(counter))
        } else {
            None
        };

        let inner = self.clause_inner(ctx, clause, rest, body, mode, index)?;
        deps = deps.combine(inner.deps);
        stmts.push(JNode::For {
            init: vec![JNode::local(self.java_type(var_ty), var, Some(lo))],
            cond: Some(Box::new(cond)),
            update,
            body: Box::new(JNode::Block(inner.stmts)),
        });
        Ok(StatementsResult { stmts, deps })
    }

    #[allow(clippy::too_many_arguments)]
    fn slice_loop(
        &mut self,
        ctx: &TranslationContext,
        clause: &InClause,
        rest: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
        wants_index: bool,
        seq: NodeIndex,
        start: NodeIndex,
        end: Option<NodeIndex>,
        end_exclusive: bool,
    ) -> LowerResult<StatementsResult> {
        let (var, var_ty) = self.loop_var(clause)?;
        let s = self.expr(ctx, seq, None)?;
        let s = self.hoist(s, "seq")?;
        let mut parts = vec![s, self.expr(ctx, start, Some(TypeId::INT))?];
        if let Some(end) = end {
            parts.push(self.expr(ctx, end, Some(TypeId::INT))?);
        }
        let (mut stmts, mut values, mut deps) = self.sequence_operands(parts)?;
        let end_value = if end.is_some() { values.pop() } else { None };
        let (Some(start_value), Some(s)) = (values.pop(), values.pop()) else {
            return Err(LowerError::internal("slice loop operand count"));
        };

        // The size is looked up once, into `hi`.
        let size = self.runtime_call(RuntimeMethod::SeqSize, vec![s.clone()]);
        let upper = match end_value {
            Some(end_value) => {
                let bound = if end_exclusive {
                    end_value
                } else {
                    JNode::binary(end_value, JBinaryOp::Add, JNode::int(1))
                };
                self.runtime_call(RuntimeMethod::MathMin, vec![size, bound])
            }
            None => size,
        };
        let lo = self.fresh_temp("lo");
        let hi = self.fresh_temp("hi");
        stmts.push(JNode::local(
            JType::Int,
            lo.clone(),
            Some(self.runtime_call(RuntimeMethod::MathMax, vec![JNode::int(0), start_value])),
        ));
        stmts.push(JNode::local(
            JType::Int,
            hi.clone(),
            Some(upper),
        ));

        let position = self.fresh_temp("i");
        let index = wants_index.then(|| {
            JNode::binary(JNode::id(position.clone()), JBinaryOp::Sub, JNode::id(lo.clone()))
        });
        let inner = self.clause_inner(ctx, clause, rest, body, mode, index)?;
        deps = deps.combine(inner.deps);

        let element = self.runtime_call(RuntimeMethod::SeqGet, vec![s, JNode::id(position.clone())]);
        let mut loop_body = vec![JNode::local(self.java_type(var_ty), var, Some(element))];
        loop_body.extend(inner.stmts);
        stmts.push(JNode::counting_loop(position, JNode::id(lo), JNode::id(hi), loop_body));
        Ok(StatementsResult { stmts, deps })
    }

    fn sequence_loop(
        &mut self,
        ctx: &TranslationContext,
        clause: &InClause,
        rest: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
        wants_index: bool,
    ) -> LowerResult<StatementsResult> {
        let (var, var_ty) = self.loop_var(clause)?;
        let s = self.expr(ctx, clause.seq, None)?;
        let s = if wants_index { self.hoist(s, "seq")? } else { s };
        let deps = s.deps.clone();
        let (mut stmts, s) = s.split()?;

        if !wants_index {
            let inner = self.clause_inner(ctx, clause, rest, body, mode, None)?;
            stmts.push(JNode::ForEach {
                ty: self.java_type(var_ty),
                name: var,
                iterable: Box::new(s),
                body: Box::new(JNode::Block(inner.stmts)),
            });
            return Ok(StatementsResult {
                stmts,
                deps: deps.combine(inner.deps),
            });
        }

        let position = self.fresh_temp("i");
        let size = self.fresh_temp("n");
        stmts.push(JNode::local(
            JType::Int,
            size.clone(),
            Some(self.runtime_call(RuntimeMethod::SeqSize, vec![s.clone()])),
        ));
        let inner = self.clause_inner(ctx, clause, rest, body, mode, Some(JNode::id(position.clone())))?;
        let element = self.runtime_call(RuntimeMethod::SeqGet, vec![s, JNode::id(position.clone())]);
        let mut loop_body = vec![JNode::local(self.java_type(var_ty), var, Some(element))];
        loop_body.extend(inner.stmts);
        stmts.push(JNode::counting_loop(position, JNode::int(0), JNode::id(size), loop_body));
        Ok(StatementsResult {
            stmts,
            deps: deps.combine(inner.deps),
        })
    }

    /// A non-sequence value iterates as a one-element sequence, or as an
    /// empty one when it is null.
    fn singleton_loop(
        &mut self,
        ctx: &TranslationContext,
        clause: &InClause,
        rest: &[InClause],
        body: NodeIndex,
        mode: &LoopBody,
    ) -> LowerResult<StatementsResult> {
        let (var, var_ty) = self.loop_var(clause)?;
        let value = self.expr(ctx, clause.seq, Some(var_ty))?;
        let deps = value.deps.clone();
        let (mut stmts, value) = value.split()?;
        let inner = self.clause_inner(ctx, clause, rest, body, mode, Some(JNode::int(0)))?;

        let mut block = vec![JNode::local(self.java_type(var_ty), var.clone(), Some(value))];
        if self.is_primitive(var_ty) {
            block.extend(inner.stmts);
        } else {
            let not_null = JNode::binary(JNode::id(var), JBinaryOp::Ne, JNode::null());
            block.push(JNode::if_stmt(not_null, inner.stmts, None));
        }
        stmts.push(JNode::Block(block));
        Ok(StatementsResult {
            stmts,
            deps: deps.combine(inner.deps),
        })
    }
}

/// `Some(true)` for a positive numeric literal.
fn literal_sign(lit: &Literal) -> Option<bool> {
    match lit {
        Literal::Int(v) => Some(*v > 0),
        Literal::Long(v) => Some(*v > 0),
        Literal::Float(v) => Some(*v > 0.0),
        Literal::Double(v) => Some(*v > 0.0),
        _ => None,
    }
}
