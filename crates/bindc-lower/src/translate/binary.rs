//! Binary operators.
//!
//! Equality is decided by the static kinds of both operands:
//!
//! | left \ right | null          | primitive       | sequence/string | other ref       |
//! |--------------|---------------|-----------------|-----------------|-----------------|
//! | null         | `true`        | `r == default`  | `isNull(r)`     | `r == null`     |
//! | primitive    | `l == default`| `l == r`        | `equals(r, tmp)`| `equals(r, tmp)`|
//! | seq/string   | `isNull(l)`   | `equals(l, r)`  | see below       | `equals(l, r)`  |
//! | other ref    | `l == null`   | `equals(l, r)`  | `equals(l, r)`  | `equals(l, r)`  |
//!
//! Two sequences compare with `Sequences.isEqual`. A primitive left operand
//! compared to a reference is spilled first so that it is still evaluated
//! before the right operand even though it becomes the second argument.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, TranslationResult};
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode, JType};
use bindc_tree::{BinaryOp, Literal, Node, NodeIndex, NodeKind, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandKind {
    Null,
    Primitive,
    /// Sequences and strings: never null at runtime, an empty value stands in.
    Nullish,
    Reference,
}

const fn java_op(op: BinaryOp) -> JBinaryOp {
    match op {
        BinaryOp::Add => JBinaryOp::Add,
        BinaryOp::Sub => JBinaryOp::Sub,
        BinaryOp::Mul => JBinaryOp::Mul,
        BinaryOp::Div => JBinaryOp::Div,
        BinaryOp::Mod => JBinaryOp::Rem,
        BinaryOp::Eq => JBinaryOp::Eq,
        BinaryOp::Ne => JBinaryOp::Ne,
        BinaryOp::Lt => JBinaryOp::Lt,
        BinaryOp::Le => JBinaryOp::Le,
        BinaryOp::Gt => JBinaryOp::Gt,
        BinaryOp::Ge => JBinaryOp::Ge,
        BinaryOp::And => JBinaryOp::And,
        BinaryOp::Or => JBinaryOp::Or,
    }
}

impl Translator<'_> {
    pub(super) fn binary(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let expr = match op {
            BinaryOp::And | BinaryOp::Or => self.logical(ctx, op, left, right)?,
            BinaryOp::Eq | BinaryOp::Ne => self.equality(ctx, op, left, right)?,
            _ => {
                let l = self.expr(ctx, left, None)?;
                let r = self.expr(ctx, right, None)?;
                let (lt, rt) = (l.ty, r.ty);
                let (preface, lv, rv, deps) = self.pair(l, r)?;
                ExpressionResult {
                    preface,
                    value: Some(self.apply_binary(op, lv, lt, rv, rt)?),
                    ty: node.ty,
                    deps,
                }
            }
        };
        self.finish_expr(expr, target, yld)
    }

    /// Both operands in evaluation order.
    fn pair(
        &mut self,
        l: ExpressionResult,
        r: ExpressionResult,
    ) -> LowerResult<(Vec<JNode>, JNode, JNode, Dependencies)> {
        let (preface, mut values, deps) = self.sequence_operands(vec![l, r])?;
        let rv = values.pop();
        let lv = values.pop();
        match (lv, rv) {
            (Some(lv), Some(rv)) => Ok((preface, lv, rv, deps)),
            _ => Err(LowerError::internal("binary operand count")),
        }
    }

    /// Short-circuit operators. A right operand with preface statements must
    /// only run them when the left operand does not decide the result.
    fn logical(
        &mut self,
        ctx: &TranslationContext,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> LowerResult<ExpressionResult> {
        let l = self.expr(ctx, left, Some(TypeId::BOOLEAN))?;
        let r = self.expr(ctx, right, Some(TypeId::BOOLEAN))?;
        if r.preface.is_empty() {
            let (preface, lv, rv, deps) = self.pair(l, r)?;
            return Ok(ExpressionResult {
                preface,
                value: Some(JNode::binary(lv, java_op(op), rv)),
                ty: TypeId::BOOLEAN,
                deps,
            });
        }

        let ExpressionResult {
            mut preface,
            value: lv,
            deps,
            ..
        } = l;
        let lv = lv.ok_or_else(|| LowerError::internal("void logical operand"))?;
        let ExpressionResult {
            preface: r_preface,
            value: rv,
            deps: r_deps,
            ..
        } = r;
        let rv = rv.ok_or_else(|| LowerError::internal("void logical operand"))?;

        let tmp = self.fresh_temp("cond");
        preface.push(JNode::local(JType::Boolean, tmp.clone(), Some(lv)));
        let cond = if op == BinaryOp::And {
            JNode::id(tmp.clone())
        } else {
            JNode::not(JNode::id(tmp.clone()))
        };
        let mut then = r_preface;
        then.push(JNode::expr_stmt(JNode::assign(JNode::id(tmp.clone()), rv)));
        preface.push(JNode::if_stmt(cond, then, None));
        Ok(ExpressionResult {
            preface,
            value: Some(JNode::id(tmp)),
            ty: TypeId::BOOLEAN,
            deps: deps.combine(r_deps),
        })
    }

    fn operand_kind(&self, idx: NodeIndex) -> LowerResult<OperandKind> {
        let node = self.node(idx)?;
        let types = &self.program().types;
        Ok(if types.is_null(node.ty) || matches!(node.kind, NodeKind::Literal(Literal::Null)) {
            OperandKind::Null
        } else if types.is_primitive(node.ty) {
            OperandKind::Primitive
        } else if types.is_sequence(node.ty) || types.is_string(node.ty) {
            OperandKind::Nullish
        } else {
            OperandKind::Reference
        })
    }

    fn equality(
        &mut self,
        ctx: &TranslationContext,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> LowerResult<ExpressionResult> {
        use OperandKind as K;
        let lk = self.operand_kind(left)?;
        let rk = self.operand_kind(right)?;
        let both_sequences =
            self.is_sequence(self.node(left)?.ty) && self.is_sequence(self.node(right)?.ty);

        let l = self.expr(ctx, left, None)?;
        let r = self.expr(ctx, right, None)?;
        let l_ty = l.ty;
        let r_ty = r.ty;

        let l = if lk == K::Primitive && matches!(rk, K::Nullish | K::Reference) {
            self.spill(l)?
        } else {
            l
        };
        let (preface, lv, rv, deps) = self.pair(l, r)?;

        let value = match (lk, rk) {
            (K::Null, K::Null) => JNode::bool(true),
            (K::Null, K::Primitive) => JNode::binary(rv, JBinaryOp::Eq, self.default_value(r_ty)),
            (K::Primitive, K::Null) => JNode::binary(lv, JBinaryOp::Eq, self.default_value(l_ty)),
            (K::Null, K::Nullish) => self.runtime_call(RuntimeMethod::ChecksIsNull, vec![rv]),
            (K::Nullish, K::Null) => self.runtime_call(RuntimeMethod::ChecksIsNull, vec![lv]),
            (K::Null, K::Reference) => JNode::binary(rv, JBinaryOp::Eq, JNode::null()),
            (K::Reference, K::Null) => JNode::binary(lv, JBinaryOp::Eq, JNode::null()),
            (K::Primitive, K::Primitive) => JNode::binary(lv, JBinaryOp::Eq, rv),
            (K::Primitive, _) => self.runtime_call(RuntimeMethod::ChecksEquals, vec![rv, lv]),
            _ if both_sequences => self.runtime_call(RuntimeMethod::SeqIsEqual, vec![lv, rv]),
            _ => self.runtime_call(RuntimeMethod::ChecksEquals, vec![lv, rv]),
        };
        let value = if op == BinaryOp::Ne {
            JNode::not(value)
        } else {
            value
        };
        Ok(ExpressionResult {
            preface,
            value: Some(value),
            ty: TypeId::BOOLEAN,
            deps,
        })
    }

    /// Store the value in a temporary, literals included.
    fn spill(&mut self, mut expr: ExpressionResult) -> LowerResult<ExpressionResult> {
        let value = expr.take_value()?;
        let tmp = self.fresh_temp("prim");
        expr.preface
            .push(JNode::local(self.java_type(expr.ty), tmp.clone(), Some(value)));
        expr.value = Some(JNode::id(tmp));
        Ok(expr)
    }

    /// Apply an arithmetic or comparison operator to translated operands.
    ///
    /// Duration arithmetic and comparison are instance methods of the
    /// duration value. For `*` the duration is the receiver even when it
    /// is the right operand.
    pub(super) fn apply_binary(
        &self,
        op: BinaryOp,
        lv: JNode,
        lt: TypeId,
        rv: JNode,
        rt: TypeId,
    ) -> LowerResult<JNode> {
        let types = &self.program().types;
        if !types.is_duration(lt) && !types.is_duration(rt) {
            return Ok(JNode::binary(lv, java_op(op), rv));
        }
        let method = match op {
            BinaryOp::Add => RuntimeMethod::DurationAdd,
            BinaryOp::Sub => RuntimeMethod::DurationSub,
            BinaryOp::Mul => RuntimeMethod::DurationMul,
            BinaryOp::Div => RuntimeMethod::DurationDiv,
            BinaryOp::Lt => RuntimeMethod::DurationLt,
            BinaryOp::Le => RuntimeMethod::DurationLe,
            BinaryOp::Gt => RuntimeMethod::DurationGt,
            BinaryOp::Ge => RuntimeMethod::DurationGe,
            other => {
                return Err(LowerError::unsupported(format!(
                    "duration operator {}",
                    other.symbol()
                )));
            }
        };
        let args = if op == BinaryOp::Mul && !types.is_duration(lt) {
            vec![rv, lv]
        } else {
            vec![lv, rv]
        };
        Ok(self.runtime_call(method, args))
    }
}
