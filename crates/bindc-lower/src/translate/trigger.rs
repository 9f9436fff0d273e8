//! On-replace and on-invalidate trigger bodies.
//!
//! `on replace old[lo..hi] = newElements { body }` on a sequence variable
//! becomes
//!
//! ```text
//! public void onReplace$x(Sequence<T> oldValue$, int lo$, int hi$, int newLength$)
//! ```
//!
//! where `hi$` is the exclusive end of the replaced range and `newLength$`
//! the number of elements that replaced it. A scalar variable's trigger
//! only receives the old value.

use super::Translator;
use crate::context::{OnReplaceInfo, ReceiverContext, TranslationContext};
use crate::error::LowerResult;
use crate::typemorph;
use bindc_common::names;
use bindc_target::{JBinaryOp, JMethod, JModifiers, JNode, JParam, JType};
use bindc_tree::{NodeIndex, OnReplace, SymbolId, TypeId};

/// Generated trigger methods of one variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerMethods {
    pub on_replace: Option<JMethod>,
    pub on_invalidate: Option<JMethod>,
}

impl TriggerMethods {
    pub fn is_empty(&self) -> bool {
        self.on_replace.is_none() && self.on_invalidate.is_none()
    }

    pub fn into_members(self) -> Vec<JNode> {
        self.on_replace
            .into_iter()
            .chain(self.on_invalidate)
            .map(JNode::Method)
            .collect()
    }
}

impl Translator<'_> {
    /// Translate the triggers of `var`. `name` is the variable name the
    /// methods are named after; an override uses the overridden name.
    pub(crate) fn trigger_methods(
        &mut self,
        ctx: &TranslationContext,
        var: SymbolId,
        name: &str,
        on_replace: Option<&OnReplace>,
        on_invalidate: Option<NodeIndex>,
    ) -> LowerResult<TriggerMethods> {
        let symbol = self.symbol(var)?;
        let mut modifiers = JModifiers::PUBLIC;
        let mut leading = Vec::new();
        if symbol.is_static() || ctx.receiver == ReceiverContext::InstanceAsStatic {
            modifiers |= JModifiers::STATIC;
        }
        if ctx.receiver == ReceiverContext::InstanceAsStatic
            && let Some(class) = ctx.class
        {
            leading.push(JParam::new(
                JType::named(typemorph::class_type_name(self.program(), class)),
                names::RECEIVER_PARAM,
            ));
        }

        let on_replace = match on_replace {
            Some(trigger) => {
                Some(self.on_replace_method(ctx, var, name, trigger, modifiers, leading.clone())?)
            }
            None => None,
        };
        let on_invalidate = match on_invalidate {
            Some(body) => {
                let body = self.in_block_scope(|tr| tr.stmts(ctx, body))?;
                Some(JMethod::new(
                    modifiers,
                    JType::Void,
                    names::on_invalidate(name),
                    leading,
                    body.stmts,
                ))
            }
            None => None,
        };
        Ok(TriggerMethods {
            on_replace,
            on_invalidate,
        })
    }

    /// Parameters of `onReplace$x` after any receiver.
    pub(crate) fn on_replace_params(&self, ty: TypeId) -> Vec<JParam> {
        let mut params = vec![JParam::new(self.java_type(ty), names::OLD_VALUE_PARAM)];
        if self.is_sequence(ty) {
            params.push(JParam::new(JType::Int, names::FIRST_INDEX_PARAM));
            params.push(JParam::new(JType::Int, names::LAST_INDEX_PARAM));
            params.push(JParam::new(JType::Int, names::NEW_LENGTH_PARAM));
        }
        params
    }

    fn on_replace_method(
        &mut self,
        ctx: &TranslationContext,
        var: SymbolId,
        name: &str,
        trigger: &OnReplace,
        modifiers: JModifiers,
        mut params: Vec<JParam>,
    ) -> LowerResult<JMethod> {
        let ty = self.symbol(var)?.ty;
        let sequence = self.is_sequence(ty);
        let mut prologue = Vec::new();

        if let Some(old) = trigger.old_value {
            self.unit.substitute(old, names::OLD_VALUE_PARAM);
        }
        params.extend(self.on_replace_params(ty));
        let body_ctx = if sequence {
            if let Some(first) = trigger.first_index {
                self.unit.substitute(first, names::FIRST_INDEX_PARAM);
            }
            // The source names the last replaced index, inclusive.
            if let Some(last) = trigger.last_index {
                let local = self.symbol(last)?.name.clone();
                prologue.push(JNode::local(
                    JType::Int,
                    local.clone(),
                    Some(JNode::binary(
                        JNode::id(names::LAST_INDEX_PARAM),
                        JBinaryOp::Sub,
                        JNode::int(1),
                    )),
                ));
                self.unit.substitute(last, local);
            }
            ctx.with_on_replace(OnReplaceInfo {
                var,
                new_elements: trigger.new_elements,
            })
        } else {
            if let Some(new_value) = trigger.new_elements {
                let local = self.symbol(new_value)?.name.clone();
                let current = self.member_read(ctx, None, var)?;
                prologue.push(JNode::local(self.java_type(ty), local.clone(), Some(current)));
                self.unit.substitute(new_value, local);
            }
            ctx.clone()
        };

        let body = self.in_block_scope(|tr| tr.stmts(&body_ctx, trigger.body))?;
        prologue.extend(body.stmts);
        Ok(JMethod::new(
            modifiers,
            JType::Void,
            names::on_replace(name),
            params,
            prologue,
        ))
    }
}
