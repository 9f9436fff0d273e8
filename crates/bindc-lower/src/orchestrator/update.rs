//! `update$` for bindings that read variables of other objects.
//!
//! When a bound variable reads `a.b`, the object held in `a` notifies this
//! object through `update$(src$, depNum$)` after `b` changes. The generated
//! method matches the source object and the changed slot, invalidates the
//! dependents and otherwise defers to `super`:
//!
//! ```text
//! public void update$(FXObject src$, int depNum$) {
//!     if (src$ == get$a() && depNum$ == B.VOFF$b) {
//!         invalidate$x();
//!         return;
//!     }
//!     super.update$(src$, depNum$);
//! }
//! ```
//!
//! A dependence on an inherited variable of this same object uses `this` as
//! the source. Setters of held objects move the registration from the old
//! object to the new one with `switchDependence$`.

use crate::analyzer::{self, ClassReport};
use crate::context::TranslationContext;
use crate::error::{LowerError, LowerResult};
use crate::translate::Translator;
use bindc_common::names;
use bindc_common::runtime::RuntimeClass;
use bindc_target::{JBinaryOp, JMethod, JModifiers, JNode, JParam, JType};
use tracing::trace;

impl Translator<'_> {
    pub(super) fn update_members(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
    ) -> LowerResult<Vec<JNode>> {
        if report.instance_updates.is_empty() {
            return Ok(Vec::new());
        }
        let src = || JNode::id(names::UPDATE_SOURCE_PARAM);
        let dep = || JNode::id(names::UPDATE_DEP_PARAM);

        let mut body = Vec::new();
        for (instance, referenced) in report.instance_updates.iter() {
            let held = if instance == report.class {
                JNode::This
            } else {
                self.member_read(ctx, None, instance)?
            };
            for (var, dependents) in referenced {
                let offset = self.offset_ref(ctx, &held, *var)?;
                let matches = JNode::binary(
                    JNode::binary(src(), JBinaryOp::Eq, held.clone()),
                    JBinaryOp::And,
                    JNode::binary(dep(), JBinaryOp::Eq, offset),
                );
                let mut arm = Vec::with_capacity(dependents.len() + 1);
                for idx in dependents {
                    let info = report.vars.get(*idx).ok_or_else(|| {
                        LowerError::internal(format!("update dependent {idx} out of range"))
                    })?;
                    arm.push(JNode::expr_stmt(JNode::call_local(
                        names::invalidate(analyzer::name(info)),
                        Vec::new(),
                    )));
                }
                trace!(
                    var = %self.program().symbols.name(*var),
                    dependents = dependents.len(),
                    "update arm"
                );
                arm.push(JNode::ret(None));
                body.push(JNode::if_stmt(matches, arm, None));
            }
        }
        body.push(JNode::expr_stmt(JNode::call(
            JNode::Super,
            names::UPDATE,
            vec![src(), dep()],
        )));
        Ok(vec![JNode::Method(JMethod::new(
            JModifiers::PUBLIC,
            JType::Void,
            names::UPDATE,
            vec![
                JParam::new(JType::named(RuntimeClass::FXObject.name()), names::UPDATE_SOURCE_PARAM),
                JParam::new(JType::Int, names::UPDATE_DEP_PARAM),
            ],
            body,
        ))])
    }
}
