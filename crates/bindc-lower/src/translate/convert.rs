//! Implicit conversions, casts and `instanceof`.
//!
//! [`Translator::coerce`] is applied to every translated value that has a
//! target type. Conversions between sequences and native arrays, numeric
//! sequence widening and scalar-to-sequence promotion call the runtime;
//! numeric narrowing becomes a cast.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{ExpressionResult, TranslationResult};
use crate::typemorph;
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JNode, JType};
use bindc_tree::{Node, NodeIndex, TypeId};

impl Translator<'_> {
    /// Convert a value to `target`. A value without a target, a void
    /// expression and a value already of the target type pass through.
    pub fn coerce(
        &mut self,
        mut expr: ExpressionResult,
        target: Option<TypeId>,
    ) -> LowerResult<ExpressionResult> {
        let Some(target) = target else {
            return Ok(expr);
        };
        let types = &self.program().types;
        if expr.ty == target || expr.value.is_none() || types.is_void(target) {
            return Ok(expr);
        }
        let from = expr.ty;
        let value = expr.take_value()?;

        let converted = if types.is_null(from) || value.is_null_literal() {
            self.default_value(target)
        } else if types.is_sequence(from) && types.is_array(target) {
            let elem = self.element_type(target);
            if types.is_primitive(elem) {
                self.runtime_call(RuntimeMethod::SeqToArray, vec![self.type_info(elem), value])
            } else {
                let (stmts, array) = self.sequence_to_boxed_array(value, from, elem)?;
                expr.preface.extend(stmts);
                array
            }
        } else if types.is_array(from) && types.is_sequence(target) {
            let elem = self.element_type(from);
            if types.is_primitive(elem) {
                self.runtime_call(RuntimeMethod::SeqFromArray, vec![value])
            } else {
                self.runtime_call(
                    RuntimeMethod::SeqFromArray,
                    vec![self.type_info(self.element_type(target)), value],
                )
            }
        } else if types.is_sequence(from) && types.is_sequence(target) {
            self.convert_sequence(value, self.element_type(from), self.element_type(target))
        } else if types.is_sequence(target) {
            let elem = self.element_type(target);
            let item = self.convert_scalar(value, from, elem);
            self.runtime_call(RuntimeMethod::SeqSingleton, vec![self.type_info(elem), item])
        } else {
            self.convert_scalar(value, from, target)
        };

        expr.value = Some(converted);
        expr.ty = target;
        Ok(expr)
    }

    fn convert_scalar(&self, value: JNode, from: TypeId, to: TypeId) -> JNode {
        let types = &self.program().types;
        if from == to {
            return value;
        }
        match (types.numeric_rank(from), types.numeric_rank(to)) {
            (Some(f), Some(t)) if t < f => return JNode::cast(self.java_type(to), value),
            (Some(_), Some(_)) => return value,
            _ => {}
        }
        if (types.is_char(from) && types.is_numeric(to))
            || (types.is_numeric(from) && types.is_char(to))
        {
            return JNode::cast(self.java_type(to), value);
        }
        if types.is_primitive(to) && types.is_reference(from) {
            // Unbox through the wrapper type.
            return JNode::cast(self.java_type(to).boxed(), value);
        }
        value
    }

    fn convert_sequence(&self, value: JNode, from: TypeId, to: TypeId) -> JNode {
        let types = &self.program().types;
        if from == to {
            return value;
        }
        if types.is_char(from) && types.is_numeric(to) {
            return self.runtime_call(
                RuntimeMethod::SeqCharsToNumbers,
                vec![self.type_info(to), value],
            );
        }
        if types.is_numeric(from) && types.is_char(to) {
            return self.runtime_call(RuntimeMethod::SeqNumbersToChars, vec![value]);
        }
        if types.is_numeric(from) && types.is_numeric(to) {
            return self.runtime_call(
                RuntimeMethod::SeqConvertNumbers,
                vec![self.type_info(to), value],
            );
        }
        value
    }

    /// `T[] arr = new T[size(seq)]; for (i ...) arr[i] = get(seq, i);`
    fn sequence_to_boxed_array(
        &mut self,
        seq: JNode,
        seq_ty: TypeId,
        elem: TypeId,
    ) -> LowerResult<(Vec<JNode>, JNode)> {
        let mut stmts = Vec::with_capacity(3);
        let seq = if seq.is_side_effect_free() {
            seq
        } else {
            let tmp = self.fresh_temp("seq");
            stmts.push(JNode::local(self.java_type(seq_ty), tmp.clone(), Some(seq)));
            JNode::id(tmp)
        };
        let elem_ty = self.java_type(elem);
        let array = self.fresh_temp("arr");
        let index = self.fresh_temp("i");
        let size = self.runtime_call(RuntimeMethod::SeqSize, vec![seq.clone()]);
        stmts.push(JNode::local(
            JType::array(elem_ty.clone()),
            array.clone(),
            Some(JNode::new_array(elem_ty, size.clone())),
        ));
        let get = self.runtime_call(RuntimeMethod::SeqGet, vec![seq, JNode::id(index.clone())]);
        stmts.push(JNode::counting_loop(
            index.clone(),
            JNode::int(0),
            size,
            vec![JNode::expr_stmt(JNode::assign(
                JNode::index(JNode::id(array.clone()), JNode::id(index)),
                get,
            ))],
        ));
        Ok((stmts, JNode::id(array)))
    }

    pub(super) fn cast(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        operand: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let inner = self.expr(ctx, operand, None)?;
        let from = inner.ty;
        let mut expr = self.coerce(inner, Some(node.ty))?;
        let types = &self.program().types;
        let both_references = types.is_reference(from) && types.is_reference(node.ty);
        if both_references
            && from != node.ty
            && !types.is_sequence(node.ty)
            && !types.is_sequence(from)
            && !types.is_array(from)
        {
            let value = expr.take_value()?;
            expr.value = Some(JNode::cast(self.java_type(node.ty), value));
        }
        self.finish_expr(expr, target, yld)
    }

    pub(super) fn instance_of(
        &mut self,
        ctx: &TranslationContext,
        operand: NodeIndex,
        class: TypeId,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let mut expr = self.expr(ctx, operand, None)?;
        let value = expr
            .value
            .take()
            .ok_or_else(|| LowerError::internal("instanceof on a void expression"))?;
        let ty = typemorph::boxed_type(self.program(), class);
        expr.value = Some(JNode::InstanceOf {
            expr: Box::new(value),
            ty,
        });
        expr.ty = TypeId::BOOLEAN;
        self.finish_expr(expr, target, yld)
    }
}
