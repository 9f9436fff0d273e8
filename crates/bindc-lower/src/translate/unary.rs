//! Unary operators.

use super::Translator;
use super::assign::{Place, Resolved};
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{ExpressionResult, TranslationResult};
use bindc_common::names;
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode, JUnaryOp};
use bindc_tree::{Node, NodeIndex, NodeKind, TypeId, UnaryOp};

impl Translator<'_> {
    pub(super) fn unary(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        op: UnaryOp,
        operand: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        if op.is_increment() {
            return self.increment(ctx, node, op, operand, target, yld);
        }
        let expr = match op {
            UnaryOp::SizeOf => self.size_of(ctx, operand)?,
            UnaryOp::Reverse => {
                let mut expr = self.expr(ctx, operand, None)?;
                if self.is_sequence(expr.ty) {
                    let value = expr.take_value()?;
                    expr.value = Some(self.runtime_call(RuntimeMethod::SeqReverse, vec![value]));
                }
                expr
            }
            UnaryOp::Not => {
                let mut expr = self.expr(ctx, operand, Some(TypeId::BOOLEAN))?;
                let value = expr.take_value()?;
                expr.value = Some(JNode::not(value));
                expr
            }
            _ => {
                let mut expr = self.expr(ctx, operand, None)?;
                let value = expr.take_value()?;
                expr.value = Some(if self.program().types.is_duration(expr.ty) {
                    self.runtime_call(RuntimeMethod::DurationNegate, vec![value])
                } else {
                    JNode::unary(JUnaryOp::Neg, value)
                });
                expr
            }
        };
        let expr = ExpressionResult { ty: node.ty, ..expr };
        self.finish_expr(expr, target, yld)
    }

    /// `sizeof`: inside an on-replace trigger the size of the new-elements
    /// parameter is already known. A non-sequence operand counts as a
    /// singleton, empty when null.
    fn size_of(
        &mut self,
        ctx: &TranslationContext,
        operand: NodeIndex,
    ) -> LowerResult<ExpressionResult> {
        if let NodeKind::Ident(sym) = self.node(operand)?.kind
            && ctx.on_replace_for(sym).is_some()
        {
            return Ok(ExpressionResult::new(
                JNode::id(names::NEW_LENGTH_PARAM),
                TypeId::INT,
            ));
        }
        let mut expr = self.expr(ctx, operand, None)?;
        let value = expr.take_value()?;
        let size = if self.is_sequence(expr.ty) {
            self.runtime_call(RuntimeMethod::SeqSize, vec![value])
        } else if self.is_primitive(expr.ty) {
            if !value.is_side_effect_free() {
                expr.preface.push(JNode::expr_stmt(value));
            }
            JNode::int(1)
        } else {
            JNode::conditional(
                JNode::binary(value, JBinaryOp::Eq, JNode::null()),
                JNode::int(0),
                JNode::int(1),
            )
        };
        expr.value = Some(size);
        expr.ty = TypeId::INT;
        Ok(expr)
    }

    /// `++`/`--`. Primitive locals and array elements use the native
    /// operator; members go through their accessors.
    fn increment(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        op: UnaryOp,
        operand: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let resolved = self.resolve_place(ctx, operand)?;
        let ty = node.ty;
        let post = matches!(op, UnaryOp::PostInc | UnaryOp::PostDec);
        let delta_op = if matches!(op, UnaryOp::PreInc | UnaryOp::PostInc) {
            JBinaryOp::Add
        } else {
            JBinaryOp::Sub
        };

        if self.is_primitive(ty)
            && matches!(resolved.place, Place::Local(_) | Place::ArrayElement { .. })
        {
            let Resolved {
                place,
                preface,
                deps,
            } = resolved;
            let lvalue = match place {
                Place::Local(name) => JNode::id(name),
                Place::ArrayElement { array, index } => JNode::index(array, index),
                _ => return Err(LowerError::internal("native increment target")),
            };
            let jop = match op {
                UnaryOp::PreInc => JUnaryOp::PreInc,
                UnaryOp::PreDec => JUnaryOp::PreDec,
                UnaryOp::PostInc => JUnaryOp::PostInc,
                _ => JUnaryOp::PostDec,
            };
            let expr = ExpressionResult {
                preface,
                value: Some(JNode::unary(jop, lvalue)),
                ty,
                deps,
            };
            return self.finish_expr(expr, target, yld);
        }

        let current = self.read_place(ctx, &resolved.place)?;
        if !post {
            let stepped = JNode::binary(current, delta_op, JNode::int(1));
            let stepped = self.narrow_to(stepped, ty, TypeId::INT);
            return self.store(ctx, resolved, ExpressionResult::new(stepped, ty), ty, target, yld);
        }

        let Resolved {
            place,
            mut preface,
            deps,
        } = resolved;
        let old = self.fresh_temp("old");
        preface.push(JNode::local(self.java_type(ty), old.clone(), Some(current)));
        let stepped = JNode::binary(JNode::id(old.clone()), delta_op, JNode::int(1));
        let stepped = self.narrow_to(stepped, ty, TypeId::INT);
        let write = self.write_place(ctx, &place, stepped)?;
        preface.push(JNode::expr_stmt(write));
        let expr = ExpressionResult {
            preface,
            value: Some(JNode::id(old)),
            ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }
}
