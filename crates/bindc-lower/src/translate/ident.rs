//! Names, receivers and member selects.
//!
//! Member variables are read through their getter when the variable uses
//! the accessor protocol and through the storage field otherwise. The
//! receiver of an unqualified member depends on where the code runs:
//! `this` in ordinary instance code, `receiver$` in a mixin's static
//! implementation, `Outer.this` inside a function value and
//! `accessOuterField$` inside an anonymous class.

use super::Translator;
use crate::analyzer::symbol_needs_accessors;
use crate::context::{ReceiverContext, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, InterClassPair, StatementsResult, TranslationResult};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode};
use bindc_tree::{Node, NodeIndex, NodeKind, SymbolFlags, SymbolId, SymbolKind, TypeId};

impl Translator<'_> {
    /// What `this` means in the current context.
    pub(crate) fn this_value(&self, ctx: &TranslationContext) -> JNode {
        match ctx.receiver {
            ReceiverContext::InstanceAsStatic => JNode::id(names::RECEIVER_PARAM),
            _ => match &ctx.function_value_outer {
                Some(outer) => JNode::QualifiedThis(outer.clone()),
                None => JNode::This,
            },
        }
    }

    /// Receiver for an unqualified reference to an instance member of
    /// `owner`.
    pub(crate) fn implicit_receiver(&mut self, ctx: &TranslationContext, owner: SymbolId) -> JNode {
        if ctx.receiver == ReceiverContext::InstanceAsStatic {
            return JNode::id(names::RECEIVER_PARAM);
        }
        let symbols = &self.program().symbols;
        if let Some(class) = ctx.class
            && symbols.has_flag(class, SymbolFlags::ANONYMOUS)
            && !symbols.is_subclass(class, owner)
        {
            self.unit.mark_outer_reference(class);
            return JNode::id(names::OUTER_FIELD);
        }
        self.this_value(ctx)
    }

    pub(crate) fn member_owner(&self, var: SymbolId) -> LowerResult<SymbolId> {
        self.symbol(var)?
            .owner
            .ok_or_else(|| LowerError::internal(format!("member {} has no owner", var.0)))
    }

    pub(crate) fn uses_accessors(&self, var: SymbolId) -> bool {
        symbol_needs_accessors(&self.program().symbols, var)
    }

    /// `Owner.` for a static member referenced outside its own class.
    pub(crate) fn static_qualifier(&self, ctx: &TranslationContext, owner: SymbolId) -> Option<JNode> {
        (ctx.class != Some(owner)).then(|| JNode::id(self.program().symbols.name(owner)))
    }

    /// Read a member variable. `recv` is the explicit receiver, or `None`
    /// for an unqualified reference.
    pub fn member_read(
        &mut self,
        ctx: &TranslationContext,
        recv: Option<JNode>,
        var: SymbolId,
    ) -> LowerResult<JNode> {
        let symbol = self.symbol(var)?;
        let owner = self.member_owner(var)?;
        let symbols = &self.program().symbols;

        if symbols.has_flag(owner, SymbolFlags::JAVA_CLASS) {
            return Ok(match (recv, symbol.is_static()) {
                (Some(recv), false) => JNode::select(recv, symbol.name.clone()),
                (_, true) => JNode::static_select(symbols.name(owner), symbol.name.clone()),
                (None, false) => {
                    let recv = self.implicit_receiver(ctx, owner);
                    JNode::select(recv, symbol.name.clone())
                }
            });
        }

        let accessors = self.uses_accessors(var);
        if symbol.is_static() {
            let qualifier = self.static_qualifier(ctx, owner);
            return Ok(match (qualifier, accessors) {
                (Some(q), true) => JNode::call(q, names::getter(&symbol.name), Vec::new()),
                (None, true) => JNode::call_local(names::getter(&symbol.name), Vec::new()),
                (Some(q), false) => JNode::select(q, names::field(&symbol.name)),
                (None, false) => JNode::id(names::field(&symbol.name)),
            });
        }

        let recv = match recv {
            Some(recv) => recv,
            None => self.implicit_receiver(ctx, owner),
        };
        Ok(match (recv, accessors) {
            (JNode::This, true) => JNode::call_local(names::getter(&symbol.name), Vec::new()),
            (JNode::This, false) => JNode::id(names::field(&symbol.name)),
            (recv, true) => JNode::call(recv, names::getter(&symbol.name), Vec::new()),
            (recv, false) => JNode::select(recv, names::field(&symbol.name)),
        })
    }

    /// The offset of `var` in the object `recv`. Mixin variables have no
    /// fixed offset across classes and are asked for it.
    pub(crate) fn offset_ref(
        &self,
        ctx: &TranslationContext,
        recv: &JNode,
        var: SymbolId,
    ) -> LowerResult<JNode> {
        let symbol = self.symbol(var)?;
        let owner = self.member_owner(var)?;
        let symbols = &self.program().symbols;
        if symbols.is_mixin(owner) {
            let cloned_here = ctx.receiver == ReceiverContext::InstanceAsInstance
                && *recv == JNode::This
                && ctx.class.is_some_and(|class| symbols.is_subclass(class, owner));
            if cloned_here {
                return Ok(JNode::id(names::offset(&symbol.name)));
            }
            return Ok(JNode::call(
                recv.clone(),
                names::offset_getter(&symbol.name),
                Vec::new(),
            ));
        }
        Ok(match self.static_qualifier(ctx, owner) {
            Some(q) => JNode::select(q, names::offset(&symbol.name)),
            None => JNode::id(names::offset(&symbol.name)),
        })
    }

    pub(super) fn ident(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        sym: SymbolId,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        if let Some(name) = self.unit.substitution(sym) {
            let expr = ExpressionResult::new(JNode::id(name), node.ty);
            return self.finish_expr(expr, target, yld);
        }
        if let Some(info) = ctx.on_replace_for(sym) {
            let var = info.var;
            let current = self.member_read(ctx, None, var)?;
            let lo = JNode::id(names::FIRST_INDEX_PARAM);
            let value = self.runtime_call(
                RuntimeMethod::SeqSubsequence,
                vec![
                    current,
                    lo.clone(),
                    JNode::binary(lo, JBinaryOp::Add, JNode::id(names::NEW_LENGTH_PARAM)),
                ],
            );
            let expr = ExpressionResult::new(value, node.ty);
            return self.finish_expr(expr, target, yld);
        }

        let symbol = self.symbol(sym)?;
        let mut deps = Dependencies::default();
        let value = match &symbol.kind {
            SymbolKind::Local | SymbolKind::Param => JNode::id(symbol.name.clone()),
            SymbolKind::Class(_) => JNode::id(symbol.name.clone()),
            SymbolKind::Function(_) => {
                return Err(LowerError::unsupported(format!(
                    "function {} used as a value",
                    symbol.name
                )));
            }
            SymbolKind::Var(_) if self.program().symbols.is_member_var(sym) => {
                if ctx.in_bind {
                    deps.bindees.insert(sym);
                }
                self.member_read(ctx, None, sym)?
            }
            SymbolKind::Var(_) => JNode::id(symbol.name.clone()),
        };
        let expr = ExpressionResult::new(value, node.ty).with_deps(deps);
        self.finish_expr(expr, target, yld)
    }

    /// A receiver that can never be null: `this`, `super`, a class
    /// reference, a literal or a freshly created object.
    pub(crate) fn needs_null_guard(&self, receiver: NodeIndex) -> LowerResult<bool> {
        if !self.options().null_checks {
            return Ok(false);
        }
        let node = self.node(receiver)?;
        if self.is_primitive(node.ty) {
            return Ok(false);
        }
        Ok(match &node.kind {
            NodeKind::This
            | NodeKind::Super
            | NodeKind::Literal(_)
            | NodeKind::StringExpr(_)
            | NodeKind::Instantiate { .. } => false,
            NodeKind::Ident(sym) => !self.program().symbols.is_class(*sym),
            _ => true,
        })
    }

    /// Translate a receiver for a guarded access: a receiver that is
    /// checked and then used is evaluated once, into a temporary.
    pub(crate) fn guarded_receiver(
        &mut self,
        ctx: &TranslationContext,
        receiver: NodeIndex,
    ) -> LowerResult<(ExpressionResult, Option<JNode>)> {
        let guard = self.needs_null_guard(receiver)?;
        let mut recv = self.expr(ctx, receiver, None)?;
        if !guard {
            return Ok((recv, None));
        }
        if !recv.value.as_ref().is_some_and(JNode::is_side_effect_free) {
            recv = self.hoist(recv, "recv")?;
        }
        let value = recv
            .value
            .clone()
            .ok_or_else(|| LowerError::internal("void receiver"))?;
        let cond = JNode::binary(value, JBinaryOp::Ne, JNode::null());
        Ok((recv, Some(cond)))
    }

    /// Deliver `access` under an optional null guard. Without a guard this
    /// is plain delivery; with one, expression mode yields a conditional
    /// that falls back to the default value and statement mode an `if`.
    pub(crate) fn guarded(
        &mut self,
        preface: Vec<JNode>,
        cond: Option<JNode>,
        access: JNode,
        ty: TypeId,
        deps: Dependencies,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        self.guarded_with(preface, cond, Vec::new(), access, ty, deps, target, yld)
    }

    /// [`Self::guarded`] with statements that must only run once the guard
    /// has passed, right before `access`.
    pub(crate) fn guarded_with(
        &mut self,
        mut preface: Vec<JNode>,
        cond: Option<JNode>,
        mut inner: Vec<JNode>,
        access: JNode,
        ty: TypeId,
        deps: Dependencies,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let void = self.program().types.is_void(ty);
        let Some(cond) = cond else {
            preface.append(&mut inner);
            let expr = if void {
                preface.push(JNode::expr_stmt(access));
                ExpressionResult::void(preface)
            } else {
                ExpressionResult {
                    preface,
                    value: Some(access),
                    ty,
                    deps: Dependencies::default(),
                }
            };
            return self.finish_expr(expr.with_deps(deps), target, yld);
        };

        if void {
            inner.push(JNode::expr_stmt(access));
            preface.push(JNode::if_stmt(cond, inner, None));
            let expr = ExpressionResult::void(preface).with_deps(deps);
            return self.finish_expr(expr, target, yld);
        }

        match yld {
            Yield::ToExpression if !inner.is_empty() => {
                let tmp = self.fresh_temp("res");
                preface.push(JNode::local(
                    self.java_type(ty),
                    tmp.clone(),
                    Some(self.default_value(ty)),
                ));
                inner.push(JNode::expr_stmt(JNode::assign(JNode::id(tmp.clone()), access)));
                preface.push(JNode::if_stmt(cond, inner, None));
                let expr = ExpressionResult {
                    preface,
                    value: Some(JNode::id(tmp)),
                    ty,
                    deps,
                };
                self.finish_expr(expr, target, yld)
            }
            Yield::ToExpression => {
                let value = JNode::conditional(cond, access, self.default_value(ty));
                let expr = ExpressionResult {
                    preface,
                    value: Some(value),
                    ty,
                    deps,
                };
                self.finish_expr(expr, target, yld)
            }
            Yield::ToStatement(sink) => {
                let then_expr = self.coerce(ExpressionResult::new(access, ty), target)?;
                inner.extend(self.to_statements(then_expr, sink)?.stmts);
                let else_stmts = match sink {
                    crate::context::Sink::Discard => None,
                    _ => {
                        let fallback =
                            self.coerce(ExpressionResult::new(self.default_value(ty), ty), target)?;
                        Some(self.to_statements(fallback, sink)?.stmts)
                    }
                };
                preface.push(JNode::if_stmt(cond, inner, else_stmts));
                Ok(TranslationResult::Statements(StatementsResult {
                    stmts: preface,
                    deps,
                }))
            }
        }
    }

    pub(super) fn select(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        receiver: NodeIndex,
        member: SymbolId,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let recv_node = self.node(receiver)?;
        let member_sym = self.symbol(member)?;
        let symbols = &self.program().symbols;

        if member_sym.is_function() {
            return Err(LowerError::unsupported(format!(
                "method {} used as a value",
                member_sym.name
            )));
        }
        if member_sym.is_class() {
            let expr = ExpressionResult::new(
                JNode::id(typemorph::class_type_name(self.program(), member)),
                node.ty,
            );
            return self.finish_expr(expr, target, yld);
        }

        let class_ref = matches!(recv_node.kind, NodeKind::Ident(s) if symbols.is_class(s));
        if class_ref || member_sym.is_static() {
            let mut expr = if class_ref {
                ExpressionResult::void(Vec::new())
            } else {
                // Evaluated for effect only.
                let recv = self.stmts(ctx, receiver)?;
                ExpressionResult::void(recv.stmts).with_deps(recv.deps)
            };
            if ctx.in_bind && symbols.is_member_var(member) {
                expr.deps.bindees.insert(member);
            }
            expr.value = Some(self.member_read(ctx, None, member)?);
            expr.ty = node.ty;
            return self.finish_expr(expr, target, yld);
        }

        if matches!(recv_node.kind, NodeKind::This | NodeKind::Super) {
            let recv = if matches!(recv_node.kind, NodeKind::This) {
                self.this_value(ctx)
            } else {
                JNode::Super
            };
            let mut deps = Dependencies::default();
            if ctx.in_bind && symbols.is_member_var(member) {
                deps.bindees.insert(member);
            }
            let value = self.member_read(ctx, Some(recv), member)?;
            let expr = ExpressionResult::new(value, node.ty).with_deps(deps);
            return self.finish_expr(expr, target, yld);
        }

        let (recv, cond) = self.guarded_receiver(ctx, receiver)?;
        let ExpressionResult {
            preface,
            value,
            deps: mut recv_deps,
            ..
        } = recv;
        let recv_value = value.ok_or_else(|| LowerError::internal("void receiver"))?;
        if ctx.in_bind
            && let NodeKind::Ident(instance) = recv_node.kind
            && symbols.is_member_var(instance)
            && symbols.is_member_var(member)
        {
            recv_deps.interclass.insert(InterClassPair {
                instance,
                referenced: member,
            });
        }
        let access = self.member_read(ctx, Some(recv_value), member)?;
        self.guarded(preface, cond, access, node.ty, recv_deps, target, yld)
    }
}
