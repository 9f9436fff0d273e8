//! Variable translation, storage, accessors and user functions.
//!
//! A variable with accessors stored in the class being built gets
//!
//! ```text
//! public T $x;
//! public T be$x() { ... }                      // bound only
//! public T get$x() { ... }
//! public T set$x(T value$) { ... }
//! public void invalidate$x() { ... }
//! public void onReplace$x(...) { ... }         // triggers only
//! ```
//!
//! A cached bound getter recomputes through `be$x` when the `IS_VALID` bit
//! of its slot is clear; an uncached one calls `be$x` on every read.

use super::ClassMembers;
use crate::analyzer::{self, ClassReport, VarDeps, VarInfo};
use crate::context::{Sink, TranslationContext};
use crate::error::{LowerError, LowerResult};
use crate::result::{BoundSequenceResult, Dependencies, ExpressionResult, TranslationResult};
use crate::translate::{TriggerMethods, Translator, var_flag};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::{RuntimeMethod, var_flags};
use bindc_target::{JField, JMethod, JModifiers, JNode, JParam, JType};
use bindc_tree::{
    BindStatus, ClassDecl, FunctionDef, NodeIndex, OnReplace, OverrideVar, SymbolId, TypeId,
    VarDecl,
};
use tracing::{debug, trace};

/// How a variable gets its value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VarInit {
    None,
    /// Evaluated once, when defaults are applied.
    Value(ExpressionResult),
    /// Body of `be$x`.
    Bound(ExpressionResult),
    /// `be$x` plus the `elem$x`/`size$x` bodies of a virtual sequence.
    BoundSequence(BoundSequenceResult),
}

impl VarInit {
    pub(crate) const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub(crate) const fn bound_expr(&self) -> Option<&ExpressionResult> {
        match self {
            Self::Bound(expr) => Some(expr),
            Self::BoundSequence(seq) => Some(&seq.expr),
            _ => None,
        }
    }
}

/// A variable or override after its initializer and triggers were
/// translated.
#[derive(Debug, Clone)]
pub(crate) struct TranslatedVar {
    pub sym: SymbolId,
    pub overridden: Option<SymbolId>,
    /// Name the generated members use: the overridden name for an override.
    pub name: String,
    pub ty: TypeId,
    pub init: VarInit,
    pub triggers: TriggerMethods,
    /// Inverse write-back a bidirectional binding runs before each store.
    pub setter_preface: Vec<JNode>,
    pub deps: VarDeps,
}

/// Translated body of a class, before analysis.
#[derive(Debug, Default)]
pub(crate) struct TranslatedMembers {
    pub vars: Vec<TranslatedVar>,
    pub functions: Vec<JNode>,
    pub init_body: Vec<JNode>,
    pub post_init_body: Vec<JNode>,
}

/// The fields variable declarations and overrides share.
pub(super) struct VarParts<'d> {
    sym: SymbolId,
    overridden: Option<SymbolId>,
    init: Option<NodeIndex>,
    bind: BindStatus,
    on_replace: Option<&'d OnReplace>,
    on_invalidate: Option<NodeIndex>,
}

impl<'d> From<&'d VarDecl> for VarParts<'d> {
    fn from(decl: &'d VarDecl) -> Self {
        Self {
            sym: decl.sym,
            overridden: None,
            init: decl.init,
            bind: decl.bind,
            on_replace: decl.on_replace.as_ref(),
            on_invalidate: decl.on_invalidate,
        }
    }
}

impl<'d> From<&'d OverrideVar> for VarParts<'d> {
    fn from(decl: &'d OverrideVar) -> Self {
        Self {
            sym: decl.sym,
            overridden: Some(decl.overridden),
            init: decl.init,
            bind: decl.bind,
            on_replace: decl.on_replace.as_ref(),
            on_invalidate: decl.on_invalidate,
        }
    }
}

/// Storage and protocol facts for one variable stored in the class being
/// built.
pub(super) struct VarLayout<'v> {
    pub name: String,
    pub ty: TypeId,
    pub statik: bool,
    pub accessors: bool,
    pub bound: bool,
    pub cached: bool,
    /// Own declaration, or the own override folded into a mixin clone.
    pub own: Option<&'v TranslatedVar>,
    /// Implementation class a mixin clone delegates to.
    pub mixin: Option<String>,
    /// The mixin implementation has trigger methods for this variable.
    pub mixin_trigger: bool,
    /// Statements a change of this variable runs for its bound dependents.
    pub invalidators: Vec<JNode>,
    /// Variables of the object held here that other variables are bound to.
    pub dependence: Vec<SymbolId>,
    /// Clones publish their offset for code written against the mixin.
    pub offset_getter: bool,
}

impl VarLayout<'_> {
    fn own_init(&self) -> Option<&VarInit> {
        self.own.map(|own| &own.init).filter(|init| !init.is_none())
    }

    fn has_replace_trigger(&self) -> bool {
        self.mixin_trigger || self.own.is_some_and(|own| own.triggers.on_replace.is_some())
    }
}

/// Public, plus static for script members.
pub(super) fn member_modifiers(statik: bool) -> JModifiers {
    if statik {
        JModifiers::PUBLIC | JModifiers::STATIC
    } else {
        JModifiers::PUBLIC
    }
}

/// Drop the braces of a body that translated to a single block.
pub(super) fn flatten_body(mut stmts: Vec<JNode>) -> Vec<JNode> {
    if stmts.len() == 1
        && matches!(stmts[0], JNode::Block(_))
        && let Some(JNode::Block(inner)) = stmts.pop()
    {
        return inner;
    }
    stmts
}

pub(super) fn find_var(vars: &[TranslatedVar], sym: SymbolId) -> LowerResult<&TranslatedVar> {
    vars.iter()
        .find(|tv| tv.sym == sym)
        .ok_or_else(|| LowerError::internal(format!("variable {} was never translated", sym.0)))
}

impl Translator<'_> {
    // =========================================================================
    // Translation
    // =========================================================================

    pub(super) fn translate_members(
        &mut self,
        ctx: &TranslationContext,
        members: &ClassMembers<'_>,
    ) -> LowerResult<TranslatedMembers> {
        self.nested_classes(ctx, &members.classes)?;

        let mut out = TranslatedMembers::default();
        for decl in &members.vars {
            out.vars.push(self.translate_var(ctx, VarParts::from(*decl))?);
        }
        for decl in &members.overrides {
            out.vars.push(self.translate_var(ctx, VarParts::from(*decl))?);
        }
        for def in &members.functions {
            out.functions
                .push(JNode::Method(self.function_method(ctx, def, None)?));
        }
        for block in &members.init_blocks {
            let body = self.in_block_scope(|tr| tr.stmts(ctx, *block))?;
            out.init_body.extend(flatten_body(body.stmts));
        }
        for block in &members.post_init_blocks {
            let body = self.in_block_scope(|tr| tr.stmts(ctx, *block))?;
            out.post_init_body.extend(flatten_body(body.stmts));
        }
        if let Some(class) = ctx.class
            && !(members.init_blocks.is_empty() && members.post_init_blocks.is_empty())
        {
            self.unit.mark_init_class(class);
        }
        Ok(out)
    }

    /// Classes declared in a class body, mixins first so that classes
    /// mixing them in see their recorded variables.
    pub(super) fn nested_classes(
        &mut self,
        ctx: &TranslationContext,
        classes: &[&ClassDecl],
    ) -> LowerResult<()> {
        let mut ordered = classes.to_vec();
        let symbols = &self.program().symbols;
        ordered.sort_by_key(|decl| !symbols.is_mixin(decl.sym));
        for decl in ordered {
            for def in self.class_definitions(ctx, decl)? {
                self.unit.add_definition(def)?;
            }
        }
        Ok(())
    }

    pub(super) fn translate_var(
        &mut self,
        ctx: &TranslationContext,
        parts: VarParts<'_>,
    ) -> LowerResult<TranslatedVar> {
        let symbol = self.symbol(parts.sym)?;
        let slot = parts.overridden.unwrap_or(parts.sym);
        let name = self.symbol(slot)?.name.clone();
        let ty = symbol.ty;
        debug!(var = %name, bind = ?parts.bind, "translating variable");

        let mut deps = Dependencies::default();
        let mut setter_preface = Vec::new();
        let init = match parts.init {
            None => VarInit::None,
            Some(init) if !parts.bind.is_bound() => {
                let result = self.with_hoisted(|tr| {
                    tr.expr(ctx, init, Some(ty)).map(TranslationResult::Expression)
                })?;
                VarInit::Value(result.into_expression()?)
            }
            Some(init) => {
                let binder = self.binder();
                let result = self.with_hoisted(|tr| {
                    binder.translate_bound_expression(tr, ctx, init, parts.sym)
                })?;
                if let Some(found) = result.deps() {
                    deps = found.clone();
                }
                if parts.bind == BindStatus::Bidirectional {
                    let inverse = binder.translate_inverse_bind(self, ctx, init, parts.sym)?;
                    setter_preface = inverse.deps.setter_preface;
                }
                match result {
                    TranslationResult::BoundSequence(seq) => VarInit::BoundSequence(seq),
                    other => VarInit::Bound(other.into_expression()?),
                }
            }
        };

        let triggers =
            self.trigger_methods(ctx, slot, &name, parts.on_replace, parts.on_invalidate)?;
        let var_deps = VarDeps::new(parts.bind, parts.init.is_some(), !triggers.is_empty(), &deps);
        self.unit.record_var(parts.sym, var_deps.clone());
        Ok(TranslatedVar {
            sym: parts.sym,
            overridden: parts.overridden,
            name,
            ty,
            init,
            triggers,
            setter_preface,
            deps: var_deps,
        })
    }

    /// Run a translation whose statements land in a generated method body
    /// and put anything hoisted to the top of that body in front.
    fn with_hoisted(
        &mut self,
        f: impl FnOnce(&mut Self) -> LowerResult<TranslationResult>,
    ) -> LowerResult<TranslationResult> {
        self.unit.push_statements();
        let result = f(self);
        let hoisted = self.unit.pop_statements()?;
        let mut result = result?;
        if hoisted.is_empty() {
            return Ok(result);
        }
        let prepend = |body: &mut Vec<JNode>| {
            let mut stmts = hoisted.clone();
            stmts.append(body);
            *body = stmts;
        };
        match &mut result {
            TranslationResult::Expression(expr) => prepend(&mut expr.preface),
            TranslationResult::BoundSequence(seq) => {
                prepend(&mut seq.expr.preface);
                prepend(&mut seq.element_body);
                prepend(&mut seq.size_body);
            }
            TranslationResult::Statements(stmts) => prepend(&mut stmts.stmts),
            TranslationResult::Special(_) => {}
        }
        Ok(result)
    }

    /// A user function. `receiver` turns an instance function into a static
    /// one taking its receiver explicitly.
    pub(super) fn function_method(
        &mut self,
        ctx: &TranslationContext,
        def: &FunctionDef,
        receiver: Option<JParam>,
    ) -> LowerResult<JMethod> {
        let symbol = self.symbol(def.sym)?;
        let ret = symbol.function_data().map_or(TypeId::VOID, |data| data.ret);
        let statik = symbol.is_static() || receiver.is_some();
        let mut modifiers = member_modifiers(statik);
        trace!(function = %symbol.name, statik, "translating function");

        let mut params: Vec<JParam> = receiver.into_iter().collect();
        for param in &def.params {
            let param = self.symbol(*param)?;
            params.push(JParam::new(self.java_type(param.ty), param.name.clone()));
        }

        let Some(body) = def.body else {
            modifiers |= JModifiers::ABSTRACT;
            return Ok(JMethod {
                modifiers,
                ret: self.java_type(ret),
                name: symbol.name.clone(),
                params,
                body: None,
            });
        };
        let fctx = ctx.for_function(def.sym);
        let void = self.program().types.is_void(ret);
        let body = self.in_block_scope(|tr| {
            if void {
                tr.stmts(&fctx, body)
            } else {
                tr.stmts_into(&fctx, body, Some(ret), Sink::Return)
            }
        })?;
        Ok(JMethod::new(
            modifiers,
            self.java_type(ret),
            symbol.name.clone(),
            params,
            flatten_body(body.stmts),
        ))
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Generated members for entry `idx` of the report.
    pub(super) fn report_var_members(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
        idx: usize,
        vars: &[TranslatedVar],
    ) -> LowerResult<Vec<JNode>> {
        let cached = report.is_cached(self.program(), idx);
        match &report.vars[idx] {
            VarInfo::SuperClass(_) => Ok(Vec::new()),
            VarInfo::TranslatedOverride { common, overridden } => {
                let own = find_var(vars, common.sym)?;
                self.override_members(own, *overridden)
            }
            VarInfo::Translated(common) => {
                let own = find_var(vars, common.sym)?;
                let layout = VarLayout {
                    name: common.name.clone(),
                    ty: common.ty,
                    statik: analyzer::is_static(&report.vars[idx]),
                    accessors: analyzer::needs_accessors(&report.vars[idx]),
                    bound: common.bind.is_bound(),
                    cached,
                    own: Some(own),
                    mixin: None,
                    mixin_trigger: false,
                    invalidators: report
                        .invalidators
                        .get(&common.sym)
                        .cloned()
                        .unwrap_or_default(),
                    dependence: self.dependence(report, common.sym),
                    offset_getter: false,
                };
                self.var_members(ctx, &layout)
            }
            VarInfo::MixinClass { common, mixin } => {
                let own = match common.overriding_sym {
                    Some(sym) => Some(find_var(vars, sym)?),
                    None => None,
                };
                let symbols = &self.program().symbols;
                let mixin_trigger = self
                    .unit
                    .known_vars()
                    .get(&common.sym)
                    .cloned()
                    .unwrap_or_else(|| VarDeps::from_symbol(symbols, common.sym))
                    .has_trigger;
                let layout = VarLayout {
                    name: common.name.clone(),
                    ty: common.ty,
                    statik: false,
                    accessors: true,
                    bound: common.bind.is_bound(),
                    cached,
                    own,
                    mixin: Some(symbols.name(*mixin).to_string()),
                    mixin_trigger,
                    invalidators: report
                        .invalidators
                        .get(&common.sym)
                        .cloned()
                        .unwrap_or_default(),
                    dependence: self.dependence(report, common.sym),
                    offset_getter: true,
                };
                self.var_members(ctx, &layout)
            }
        }
    }

    /// Storage, accessors and triggers of one stored variable.
    pub(super) fn var_members(
        &mut self,
        ctx: &TranslationContext,
        v: &VarLayout<'_>,
    ) -> LowerResult<Vec<JNode>> {
        let mut out = Vec::new();
        if self.options().emit_comments {
            out.push(JNode::comment(format!("var {}", v.name)));
        }
        let jty = self.java_type(v.ty);
        let init = typemorph::needs_explicit_default(self.program(), v.ty)
            .then(|| Box::new(self.default_value(v.ty)));
        out.push(JNode::Field(JField {
            modifiers: member_modifiers(v.statik),
            ty: jty.clone(),
            name: names::field(&v.name),
            init,
        }));
        if !v.accessors {
            if v.own.is_some_and(|own| !own.triggers.is_empty()) {
                return Err(LowerError::internal(format!(
                    "variable {} has triggers but no accessors",
                    v.name
                )));
            }
            return Ok(out);
        }

        let mods = member_modifiers(v.statik);
        match v.own_init() {
            Some(VarInit::Bound(expr)) => {
                out.push(JNode::Method(self.bind_method(&v.name, mods, jty.clone(), expr)?));
            }
            Some(VarInit::BoundSequence(seq)) => {
                out.push(JNode::Method(self.bind_method(&v.name, mods, jty.clone(), &seq.expr)?));
                let elem_ty = self.java_type(self.element_type(v.ty));
                out.push(JNode::Method(JMethod::new(
                    mods,
                    elem_ty,
                    names::elem(&v.name),
                    vec![JParam::new(JType::Int, names::POSITION_PARAM)],
                    seq.element_body.clone(),
                )));
                out.push(JNode::Method(JMethod::new(
                    mods,
                    JType::Int,
                    names::size(&v.name),
                    Vec::new(),
                    seq.size_body.clone(),
                )));
            }
            _ => {}
        }

        out.push(JNode::Method(self.getter(v, mods, jty.clone())));
        out.push(JNode::Method(self.setter(ctx, v, mods, jty)?));
        out.push(JNode::Method(self.invalidate_method(v, mods)));
        if v.offset_getter {
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Int,
                names::offset_getter(&v.name),
                Vec::new(),
                vec![JNode::ret(Some(JNode::id(names::offset(&v.name))))],
            )));
        }
        if let Some(own) = v.own {
            out.extend(own.triggers.clone().into_members());
        }
        Ok(out)
    }

    fn bind_method(
        &self,
        name: &str,
        mods: JModifiers,
        ty: JType,
        expr: &ExpressionResult,
    ) -> LowerResult<JMethod> {
        let mut body = expr.preface.clone();
        let value = expr
            .value
            .clone()
            .ok_or_else(|| LowerError::internal(format!("bound variable {name} has no value")))?;
        body.push(JNode::ret(Some(value)));
        Ok(JMethod::new(mods, ty, names::bind_expr(name), Vec::new(), body))
    }

    /// Call computing a bound variable's current value.
    fn bound_value(&self, v: &VarLayout<'_>) -> Option<JNode> {
        if !v.bound {
            return None;
        }
        if v.own_init().is_some_and(|init| init.bound_expr().is_some()) {
            return Some(JNode::call_local(names::bind_expr(&v.name), Vec::new()));
        }
        v.mixin.as_ref().map(|mixin| {
            JNode::static_call(mixin.clone(), names::bind_expr(&v.name), vec![JNode::This])
        })
    }

    fn getter(&self, v: &VarLayout<'_>, mods: JModifiers, ty: JType) -> JMethod {
        let field = || JNode::id(names::field(&v.name));
        let body = match self.bound_value(v) {
            Some(value) if v.cached => {
                let offset = JNode::id(names::offset(&v.name));
                let stale = JNode::not(JNode::call_local(
                    RuntimeMethod::VarTestBits.name(),
                    vec![offset.clone(), var_flag(var_flags::IS_VALID_NAME)],
                ));
                let mut refresh = Vec::new();
                let fires = v.has_replace_trigger();
                if fires {
                    refresh.push(JNode::local(
                        ty.clone(),
                        names::OLD_VALUE_PARAM,
                        Some(field()),
                    ));
                }
                refresh.push(JNode::expr_stmt(JNode::assign(field(), value)));
                refresh.push(JNode::expr_stmt(JNode::call_local(
                    RuntimeMethod::VarChangeBits.name(),
                    vec![offset, JNode::int(0), var_flag(var_flags::IS_VALID_NAME)],
                )));
                if fires {
                    refresh.extend(self.replace_calls(v, JNode::id(names::OLD_VALUE_PARAM), field()));
                }
                vec![JNode::if_stmt(stale, refresh, None), JNode::ret(Some(field()))]
            }
            Some(value) => vec![JNode::ret(Some(value))],
            None => vec![JNode::ret(Some(field()))],
        };
        JMethod::new(mods, ty, names::getter(&v.name), Vec::new(), body)
    }

    fn setter(
        &mut self,
        ctx: &TranslationContext,
        v: &VarLayout<'_>,
        mods: JModifiers,
        ty: JType,
    ) -> LowerResult<JMethod> {
        let field = || JNode::id(names::field(&v.name));
        let value = || JNode::id(names::NEW_VALUE_PARAM);
        let old = || JNode::id(names::OLD_VALUE_PARAM);
        let mut body = Vec::new();
        if let Some(own) = v.own {
            body.extend(own.setter_preface.iter().cloned());
        }
        let fires = v.has_replace_trigger();
        if fires || !v.dependence.is_empty() {
            body.push(JNode::local(ty.clone(), names::OLD_VALUE_PARAM, Some(field())));
        }
        body.push(JNode::expr_stmt(JNode::assign(field(), value())));
        for referenced in &v.dependence {
            let offset = self.offset_ref(ctx, &value(), *referenced)?;
            body.push(JNode::expr_stmt(JNode::call_local(
                RuntimeMethod::SwitchDependence.name(),
                vec![old(), value(), offset],
            )));
        }
        body.push(JNode::expr_stmt(JNode::call_local(
            names::invalidate(&v.name),
            Vec::new(),
        )));
        if fires {
            body.extend(self.replace_calls(v, old(), value()));
        }
        body.push(JNode::ret(Some(value())));
        Ok(JMethod::new(
            mods,
            ty.clone(),
            names::setter(&v.name),
            vec![JParam::new(ty, names::NEW_VALUE_PARAM)],
            body,
        ))
    }

    fn invalidate_method(&self, v: &VarLayout<'_>, mods: JModifiers) -> JMethod {
        let mut body = Vec::new();
        let offset = || JNode::id(names::offset(&v.name));
        if !v.statik && v.cached {
            body.push(JNode::expr_stmt(JNode::call_local(
                RuntimeMethod::VarChangeBits.name(),
                vec![offset(), var_flag(var_flags::IS_VALID_NAME), JNode::int(0)],
            )));
        }
        body.extend(v.invalidators.iter().cloned());
        if !v.statik {
            body.push(JNode::expr_stmt(JNode::call_local(
                RuntimeMethod::NotifyDependents.name(),
                vec![offset()],
            )));
        }
        if v.mixin_trigger
            && let Some(mixin) = &v.mixin
        {
            body.push(JNode::expr_stmt(JNode::static_call(
                mixin.clone(),
                names::on_invalidate(&v.name),
                vec![JNode::This],
            )));
        }
        if v.own.is_some_and(|own| own.triggers.on_invalidate.is_some()) {
            body.push(JNode::expr_stmt(JNode::call_local(
                names::on_invalidate(&v.name),
                Vec::new(),
            )));
        }
        JMethod::new(mods, JType::Void, names::invalidate(&v.name), Vec::new(), body)
    }

    /// `onReplace$x` calls for a change from `old` to `new`.
    fn replace_calls(&self, v: &VarLayout<'_>, old: JNode, new: JNode) -> Vec<JNode> {
        let mut args = vec![old.clone()];
        if self.is_sequence(v.ty) {
            args.push(JNode::int(0));
            args.push(self.runtime_call(RuntimeMethod::SeqSize, vec![old]));
            args.push(self.runtime_call(RuntimeMethod::SeqSize, vec![new]));
        }
        let mut calls = Vec::new();
        if v.mixin_trigger
            && let Some(mixin) = &v.mixin
        {
            let mut with_receiver = vec![JNode::This];
            with_receiver.extend(args.iter().cloned());
            calls.push(JNode::expr_stmt(JNode::static_call(
                mixin.clone(),
                names::on_replace(&v.name),
                with_receiver,
            )));
        }
        if v.own.is_some_and(|own| own.triggers.on_replace.is_some()) {
            calls.push(JNode::expr_stmt(JNode::call_local(
                names::on_replace(&v.name),
                args,
            )));
        }
        calls
    }

    /// Variables of the object held in `instance` that bound variables of
    /// this class read.
    fn dependence(&self, report: &ClassReport, instance: SymbolId) -> Vec<SymbolId> {
        if instance == report.class {
            return Vec::new();
        }
        report
            .instance_updates
            .iter()
            .filter(|(held, _)| *held == instance)
            .flat_map(|(_, referenced)| referenced.keys().copied())
            .collect()
    }

    /// Members an override of an inherited variable adds: a bound getter,
    /// and trigger methods chained to the inherited ones.
    fn override_members(
        &mut self,
        own: &TranslatedVar,
        overridden: SymbolId,
    ) -> LowerResult<Vec<JNode>> {
        let mut out = Vec::new();
        let name = own.name.clone();
        let accessors = self.uses_accessors(overridden);
        if !accessors {
            if !own.triggers.is_empty() || own.init.bound_expr().is_some() {
                return Err(LowerError::unsupported(format!(
                    "bound or triggered override of accessor-less variable {name}"
                )));
            }
            return Ok(out);
        }
        let jty = self.java_type(own.ty);
        if let Some(expr) = own.init.bound_expr() {
            out.push(JNode::Method(self.bind_method(
                &name,
                JModifiers::PUBLIC,
                jty.clone(),
                expr,
            )?));
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                jty.clone(),
                names::getter(&name),
                Vec::new(),
                vec![JNode::ret(Some(JNode::call_local(
                    names::bind_expr(&name),
                    Vec::new(),
                )))],
            )));
        }
        if own.triggers.is_empty() {
            return Ok(out);
        }

        // Inherited triggers are virtual only when the inherited variable is
        // declared in a class; a mixin clone calls its static implementation.
        let symbols = &self.program().symbols;
        let inherited_virtual = self
            .member_owner(overridden)
            .is_ok_and(|owner| !symbols.is_mixin(owner))
            && self
                .unit
                .known_vars()
                .get(&overridden)
                .cloned()
                .unwrap_or_else(|| VarDeps::from_symbol(symbols, overridden))
                .has_trigger;

        let mut triggers = own.triggers.clone();
        if inherited_virtual {
            for method in triggers.on_replace.iter_mut().chain(triggers.on_invalidate.iter_mut()) {
                let args = method.params.iter().map(|p| JNode::id(p.name.clone())).collect();
                let chained = JNode::expr_stmt(JNode::call(JNode::Super, method.name.clone(), args));
                if let Some(body) = method.body.as_mut() {
                    body.insert(0, chained);
                }
            }
        } else {
            let value = || JNode::id(names::NEW_VALUE_PARAM);
            let old = || JNode::id(names::OLD_VALUE_PARAM);
            if triggers.on_replace.is_some() {
                let mut args = vec![old()];
                if self.is_sequence(own.ty) {
                    args.push(JNode::int(0));
                    args.push(self.runtime_call(RuntimeMethod::SeqSize, vec![old()]));
                    args.push(self.runtime_call(RuntimeMethod::SeqSize, vec![value()]));
                }
                let body = vec![
                    JNode::local(
                        jty.clone(),
                        names::OLD_VALUE_PARAM,
                        Some(JNode::call_local(names::getter(&name), Vec::new())),
                    ),
                    JNode::expr_stmt(JNode::call(
                        JNode::Super,
                        names::setter(&name),
                        vec![value()],
                    )),
                    JNode::expr_stmt(JNode::call_local(names::on_replace(&name), args)),
                    JNode::ret(Some(value())),
                ];
                out.push(JNode::Method(JMethod::new(
                    JModifiers::PUBLIC,
                    jty.clone(),
                    names::setter(&name),
                    vec![JParam::new(jty, names::NEW_VALUE_PARAM)],
                    body,
                )));
            }
            if triggers.on_invalidate.is_some() {
                out.push(JNode::Method(JMethod::new(
                    JModifiers::PUBLIC,
                    JType::Void,
                    names::invalidate(&name),
                    Vec::new(),
                    vec![
                        JNode::expr_stmt(JNode::call(
                            JNode::Super,
                            names::invalidate(&name),
                            Vec::new(),
                        )),
                        JNode::expr_stmt(JNode::call_local(
                            names::on_invalidate(&name),
                            Vec::new(),
                        )),
                    ],
                )));
            }
        }
        out.extend(triggers.into_members());
        Ok(out)
    }
}
