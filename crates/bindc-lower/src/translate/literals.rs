//! Literals and string interpolation.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::LowerResult;
use crate::result::{ExpressionResult, TranslationResult};
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode};
use bindc_tree::{Literal, NodeIndex, TypeId};

impl Translator<'_> {
    pub(super) fn literal(&self, lit: &Literal, ty: TypeId) -> ExpressionResult {
        let value = match lit {
            Literal::Int(v) => JNode::int(*v),
            Literal::Long(v) => JNode::long(*v),
            Literal::Float(v) => JNode::float(*v),
            Literal::Double(v) => JNode::double(*v),
            Literal::Boolean(v) => JNode::bool(*v),
            Literal::Char(v) => JNode::char(*v),
            Literal::String(v) => JNode::string(v.clone()),
            Literal::Null => JNode::null(),
            Literal::Duration(millis) => {
                self.runtime_call(RuntimeMethod::DurationValueOf, vec![JNode::double(*millis)])
            }
        };
        ExpressionResult::new(value, ty)
    }

    /// `"" + a + b`: the empty prefix forces string concatenation even when
    /// the first part is numeric.
    pub(super) fn string_expr(
        &mut self,
        ctx: &TranslationContext,
        parts: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let mut translated = Vec::with_capacity(parts.len());
        for part in parts {
            translated.push(self.expr(ctx, *part, None)?);
        }
        let (preface, values, deps) = self.sequence_operands(translated)?;

        let mut concat = JNode::string("");
        for value in values {
            concat = JNode::binary(concat, JBinaryOp::Add, value);
        }
        let expr = ExpressionResult {
            preface,
            value: Some(concat),
            ty: TypeId::STRING,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }
}
