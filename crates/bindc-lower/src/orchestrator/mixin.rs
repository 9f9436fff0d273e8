//! Mixin interfaces and their static implementations.
//!
//! A mixin `M` becomes two declarations. The interface `M$Mixin` declares
//! the accessors of every variable and every instance function, so that
//! code can be written against any class mixing `M` in. The class `M` holds
//! the behavior as static methods taking that interface as `receiver$`:
//!
//! ```text
//! public static void default$x(M$Mixin receiver$)      // initializer
//! public static T be$x(M$Mixin receiver$)              // bound initializer
//! public static void onReplace$x(M$Mixin receiver$, T oldValue$)
//! public static R f(M$Mixin receiver$, P p)
//! ```
//!
//! Each class mixing `M` in clones the storage and forwards to these.

use super::members::{TranslatedVar, VarInit, VarParts, flatten_body, member_modifiers};
use super::{ClassMembers, ClassPhase, PhaseTracker};
use crate::analyzer::ClassReport;
use crate::context::{ReceiverContext, TranslationContext};
use crate::error::{LowerError, LowerResult};
use crate::translate::Translator;
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::RuntimeClass;
use bindc_target::{JClass, JMethod, JModifiers, JNode, JParam, JType};
use bindc_tree::{ClassDecl, SymbolId, TypeId};

/// The two halves of a translated mixin.
struct MixinParts {
    interface: JClass,
    implementation: JClass,
}

impl Translator<'_> {
    pub(super) fn mixin_definitions(&mut self, decl: &ClassDecl) -> LowerResult<Vec<JNode>> {
        let class = decl.sym;
        let name = self.symbol(class)?.name.clone();
        let mut phase = PhaseTracker::new(&name);
        let members = self.collect_members(&decl.members)?;
        if !members.overrides.is_empty() {
            return Err(LowerError::unsupported(format!(
                "variable override inside mixin {name}"
            )));
        }
        if !members.statements.is_empty() {
            return Err(LowerError::internal(format!(
                "mixin {name} has statements in its body"
            )));
        }

        let ctx = TranslationContext::new().for_class(class, ReceiverContext::InstanceAsStatic);
        self.unit.push_definitions();
        let built = self.mixin_parts(&ctx, class, &members, &mut phase);
        let nested = self.unit.pop_definitions()?;
        let MixinParts {
            interface,
            mut implementation,
        } = built?;
        implementation.members.extend(nested);
        phase.advance(ClassPhase::Done);
        Ok(vec![JNode::Class(interface), JNode::Class(implementation)])
    }

    fn mixin_parts(
        &mut self,
        ctx: &TranslationContext,
        class: SymbolId,
        members: &ClassMembers<'_>,
        phase: &mut PhaseTracker,
    ) -> LowerResult<MixinParts> {
        phase.advance(ClassPhase::TranslatingMembers);
        self.nested_classes(ctx, &members.classes)?;
        let iface_ty = JType::named(typemorph::class_type_name(self.program(), class));
        let receiver = JParam::new(iface_ty, names::RECEIVER_PARAM);

        let mut vars = Vec::with_capacity(members.vars.len());
        for decl in &members.vars {
            if self.symbol(decl.sym)?.is_static() {
                return Err(LowerError::unsupported("static variable in a mixin"));
            }
            vars.push(self.translate_var(ctx, VarParts::from(*decl))?);
        }

        let mut iface_members = Vec::new();
        let mut impl_members = Vec::new();
        for def in &members.functions {
            let symbol = self.symbol(def.sym)?;
            if symbol.is_static() {
                let script_ctx = ctx.with_receiver(ReceiverContext::ScriptAsStatic);
                impl_members.push(JNode::Method(self.function_method(&script_ctx, def, None)?));
                continue;
            }
            iface_members.push(JNode::Method(self.abstract_signature(def.sym)?));
            if def.body.is_some() {
                let method = self.function_method(ctx, def, Some(receiver.clone()))?;
                impl_members.push(JNode::Method(method));
            }
        }
        if !(members.init_blocks.is_empty() && members.post_init_blocks.is_empty()) {
            self.unit.mark_init_class(class);
            for (hook, blocks) in [
                (names::USER_INIT, &members.init_blocks),
                (names::POST_INIT, &members.post_init_blocks),
            ] {
                let mut body = Vec::new();
                for block in blocks {
                    let stmts = self.in_block_scope(|tr| tr.stmts(ctx, *block))?;
                    body.extend(flatten_body(stmts.stmts));
                }
                impl_members.push(JNode::Method(JMethod::new(
                    JModifiers::PUBLIC | JModifiers::STATIC,
                    JType::Void,
                    hook,
                    vec![receiver.clone()],
                    body,
                )));
            }
        }

        phase.advance(ClassPhase::Emitting);
        let mut var_iface = Vec::new();
        let mut var_impl = Vec::new();
        for tv in &vars {
            var_iface.extend(self.mixin_accessor_signatures(tv));
            var_impl.extend(self.mixin_var_statics(ctx, tv, &receiver)?);
        }
        var_iface.append(&mut iface_members);
        var_impl.append(&mut impl_members);

        let mut extends = vec![JType::named(RuntimeClass::FXObject.name())];
        if let Some(data) = self.symbol(class)?.class_data() {
            for supertype in &data.supertypes {
                if self.program().symbols.is_mixin(*supertype) {
                    extends.push(JType::named(typemorph::class_type_name(
                        self.program(),
                        *supertype,
                    )));
                }
            }
        }
        let mut modifiers = JModifiers::PUBLIC;
        if self.program().symbols.owner(class).is_some() {
            modifiers |= JModifiers::STATIC;
        }
        Ok(MixinParts {
            interface: JClass {
                modifiers,
                name: names::mixin_interface(self.program().symbols.name(class)),
                is_interface: true,
                superclass: None,
                interfaces: extends,
                members: var_iface,
            },
            implementation: JClass {
                modifiers,
                name: self.program().symbols.name(class).to_string(),
                is_interface: false,
                superclass: None,
                interfaces: Vec::new(),
                members: var_impl,
            },
        })
    }

    /// `public abstract R f(P p);` for an instance function.
    fn abstract_signature(&self, function: SymbolId) -> LowerResult<JMethod> {
        let symbol = self.symbol(function)?;
        let ret = symbol.function_data().map_or(TypeId::VOID, |data| data.ret);
        Ok(JMethod {
            modifiers: JModifiers::PUBLIC | JModifiers::ABSTRACT,
            ret: self.java_type(ret),
            name: symbol.name.clone(),
            params: self.declared_params(function)?,
            body: None,
        })
    }

    /// Parameters of a function as declared, without any receiver.
    fn declared_params(&self, function: SymbolId) -> LowerResult<Vec<JParam>> {
        let symbol = self.symbol(function)?;
        let Some(data) = symbol.function_data() else {
            return Err(LowerError::internal(format!(
                "function {} has no signature",
                symbol.name
            )));
        };
        data.params
            .iter()
            .map(|param| {
                let param = self.symbol(*param)?;
                Ok(JParam::new(self.java_type(param.ty), param.name.clone()))
            })
            .collect()
    }

    fn mixin_accessor_signatures(&self, tv: &TranslatedVar) -> Vec<JNode> {
        let ty = self.java_type(tv.ty);
        let abstract_method = |ret: JType, name: String, params: Vec<JParam>| {
            JNode::Method(JMethod {
                modifiers: JModifiers::PUBLIC | JModifiers::ABSTRACT,
                ret,
                name,
                params,
                body: None,
            })
        };
        vec![
            abstract_method(ty.clone(), names::getter(&tv.name), Vec::new()),
            abstract_method(
                ty.clone(),
                names::setter(&tv.name),
                vec![JParam::new(ty, names::NEW_VALUE_PARAM)],
            ),
            abstract_method(JType::Void, names::invalidate(&tv.name), Vec::new()),
            abstract_method(JType::Int, names::offset_getter(&tv.name), Vec::new()),
        ]
    }

    /// `default$x`, `be$x` and the trigger methods of one mixin variable.
    fn mixin_var_statics(
        &mut self,
        ctx: &TranslationContext,
        tv: &TranslatedVar,
        receiver: &JParam,
    ) -> LowerResult<Vec<JNode>> {
        let mods = member_modifiers(true);
        let mut out = Vec::new();
        match &tv.init {
            VarInit::Value(expr) => {
                let (mut body, value) = expr.clone().split()?;
                body.push(JNode::expr_stmt(self.member_write(ctx, None, tv.sym, value)?));
                out.push(JNode::Method(JMethod::new(
                    mods,
                    JType::Void,
                    names::default_value(&tv.name),
                    vec![receiver.clone()],
                    body,
                )));
            }
            init => {
                if let Some(expr) = init.bound_expr() {
                    let (mut body, value) = expr.clone().split()?;
                    body.push(JNode::ret(Some(value)));
                    out.push(JNode::Method(JMethod::new(
                        mods,
                        self.java_type(tv.ty),
                        names::bind_expr(&tv.name),
                        vec![receiver.clone()],
                        body,
                    )));
                }
            }
        }

        if tv.triggers.is_empty() {
            return Ok(out);
        }
        // Clones call both triggers whenever either exists.
        let mut triggers = tv.triggers.clone();
        if triggers.on_replace.is_none() {
            let mut params = vec![receiver.clone()];
            params.extend(self.on_replace_params(tv.ty));
            triggers.on_replace = Some(JMethod::new(
                mods,
                JType::Void,
                names::on_replace(&tv.name),
                params,
                Vec::new(),
            ));
        }
        if triggers.on_invalidate.is_none() {
            triggers.on_invalidate = Some(JMethod::new(
                mods,
                JType::Void,
                names::on_invalidate(&tv.name),
                vec![receiver.clone()],
                Vec::new(),
            ));
        }
        out.extend(triggers.into_members());
        Ok(out)
    }

    /// Forwarders from a class to the static implementations of the mixin
    /// functions it does not define itself.
    pub(super) fn mixin_forwarders(&self, report: &ClassReport) -> LowerResult<Vec<JNode>> {
        let mut out = Vec::with_capacity(report.needs_dispatch.len());
        for function in &report.needs_dispatch {
            let symbol = self.symbol(*function)?;
            let mixin = self.member_owner(*function)?;
            let ret = symbol.function_data().map_or(TypeId::VOID, |data| data.ret);
            let params = self.declared_params(*function)?;
            let mut args = vec![JNode::This];
            args.extend(params.iter().map(|p| JNode::id(p.name.clone())));
            let call = JNode::static_call(
                self.program().symbols.name(mixin),
                symbol.name.clone(),
                args,
            );
            let body = if self.program().types.is_void(ret) {
                vec![JNode::expr_stmt(call)]
            } else {
                vec![JNode::ret(Some(call))]
            };
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                self.java_type(ret),
                symbol.name.clone(),
                params,
                body,
            )));
        }
        Ok(out)
    }
}
