//! Calls: functions, methods, mixin implementations and function values.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, TranslationResult};
use bindc_common::names;
use bindc_target::{JBinaryOp, JNode};
use bindc_tree::{Node, NodeIndex, NodeKind, SymbolFlags, SymbolId, TypeId};

impl Translator<'_> {
    pub(super) fn call(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        callee: NodeIndex,
        args: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let callee_node = self.node(callee)?;
        match &callee_node.kind {
            NodeKind::Ident(function) if self.symbol(*function)?.is_function() => {
                self.call_function(ctx, node, *function, args, target, yld)
            }
            NodeKind::Select { receiver, member } if self.symbol(*member)?.is_function() => {
                self.call_method(ctx, node, *receiver, *member, args, target, yld)
            }
            _ => self.call_value(ctx, node, callee, args, target, yld),
        }
    }

    fn param_types(&self, function: SymbolId) -> LowerResult<Vec<TypeId>> {
        let symbol = self.symbol(function)?;
        let data = symbol
            .function_data()
            .ok_or_else(|| LowerError::internal(format!("{} is not a function", symbol.name)))?;
        data.params
            .iter()
            .map(|param| self.symbol(*param).map(|s| s.ty))
            .collect()
    }

    fn translate_args(
        &mut self,
        ctx: &TranslationContext,
        args: &[NodeIndex],
        params: &[TypeId],
    ) -> LowerResult<Vec<ExpressionResult>> {
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            out.push(self.expr(ctx, *arg, params.get(i).copied())?);
        }
        Ok(out)
    }

    /// Member variables read by the body of a bound function; a bind that
    /// calls it depends on all of them.
    fn bound_function_bindees(&self, function: SymbolId) -> Vec<SymbolId> {
        let program = self.program();
        if !program.symbols.has_flag(function, SymbolFlags::BOUND_FUNCTION) {
            return Vec::new();
        }
        let Some(body) = self.unit.function_body(function) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        program.arena.any(body, &mut |node| {
            if let NodeKind::Ident(sym) = node.kind
                && program.symbols.is_member_var(sym)
                && !found.contains(&sym)
            {
                found.push(sym);
            }
            false
        });
        found
    }

    fn call_function(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        function: SymbolId,
        args: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let symbol = self.symbol(function)?;
        let owner = self.member_owner(function)?;
        let symbols = &self.program().symbols;
        let params = self.param_types(function)?;
        let parts = self.translate_args(ctx, args, &params)?;
        let (preface, values, mut deps) = self.sequence_operands(parts)?;
        if ctx.in_bind {
            deps.bindees.extend(self.bound_function_bindees(function));
        }

        let name = symbol.name.clone();
        let access = if !symbols.is_class(owner) {
            // Local functions live in a `FunctionN` local of the same name.
            JNode::call(JNode::id(name), names::INVOKE, values)
        } else if symbol.is_static() {
            match self.static_qualifier(ctx, owner) {
                Some(q) => JNode::call(q, name, values),
                None => JNode::call_local(name, values),
            }
        } else {
            match self.implicit_receiver(ctx, owner) {
                JNode::This => JNode::call_local(name, values),
                recv => JNode::call(recv, name, values),
            }
        };
        self.guarded(preface, None, access, node.ty, deps, target, yld)
    }

    fn call_method(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        receiver: NodeIndex,
        method: SymbolId,
        args: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let symbol = self.symbol(method)?;
        let owner = self.member_owner(method)?;
        let recv_node = self.node(receiver)?;
        let symbols = &self.program().symbols;
        let params = self.param_types(method)?;
        let name = symbol.name.clone();

        let class_ref = matches!(recv_node.kind, NodeKind::Ident(s) if symbols.is_class(s));
        if class_ref || symbol.is_static() {
            // A static member reached through an instance evaluates the
            // instance for effect only.
            let (mut preface, mut deps) = if class_ref {
                (Vec::new(), Dependencies::default())
            } else {
                let effects = self.stmts(ctx, receiver)?;
                (effects.stmts, effects.deps)
            };
            let parts = self.translate_args(ctx, args, &params)?;
            let (arg_preface, values, arg_deps) = self.sequence_operands(parts)?;
            preface.extend(arg_preface);
            deps = deps.combine(arg_deps);
            let access = match self.static_qualifier(ctx, owner) {
                Some(q) => JNode::call(q, name, values),
                None => JNode::call_local(name, values),
            };
            return self.guarded(preface, None, access, node.ty, deps, target, yld);
        }

        match recv_node.kind {
            NodeKind::Super if symbols.is_mixin(owner) => {
                // Mixin super call: the static implementation, handed the
                // current receiver.
                let parts = self.translate_args(ctx, args, &params)?;
                let (preface, mut values, deps) = self.sequence_operands(parts)?;
                values.insert(0, self.this_value(ctx));
                let access = JNode::static_call(symbols.name(owner), name, values);
                self.guarded(preface, None, access, node.ty, deps, target, yld)
            }
            NodeKind::Super => {
                let parts = self.translate_args(ctx, args, &params)?;
                let (preface, values, deps) = self.sequence_operands(parts)?;
                let access = JNode::call(JNode::Super, name, values);
                self.guarded(preface, None, access, node.ty, deps, target, yld)
            }
            NodeKind::This => {
                let parts = self.translate_args(ctx, args, &params)?;
                let (preface, values, deps) = self.sequence_operands(parts)?;
                let access = match self.this_value(ctx) {
                    JNode::This => JNode::call_local(name, values),
                    recv => JNode::call(recv, name, values),
                };
                self.guarded(preface, None, access, node.ty, deps, target, yld)
            }
            _ => {
                let GuardedOperands {
                    outer,
                    cond,
                    inner,
                    recv,
                    args,
                    mut deps,
                } = self.guarded_operands(ctx, receiver, args, &params)?;
                if ctx.in_bind {
                    deps.bindees.extend(self.bound_function_bindees(method));
                }
                let access = JNode::call(recv, name, args);
                self.guarded_with(outer, cond, inner, access, node.ty, deps, target, yld)
            }
        }
    }

    /// Call through a function-typed value: `f.invoke$(args)`.
    fn call_value(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        callee: NodeIndex,
        args: &[NodeIndex],
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let callee_ty = self.node(callee)?.ty;
        let params = self
            .program()
            .types
            .function_signature(callee_ty)
            .map(|(params, _)| params.to_vec())
            .ok_or_else(|| LowerError::unsupported("call of a value that is not a function"))?;
        let GuardedOperands {
            outer,
            cond,
            inner,
            recv,
            args,
            deps,
        } = self.guarded_operands(ctx, callee, args, &params)?;
        let access = JNode::call(recv, names::INVOKE, args);
        self.guarded_with(outer, cond, inner, access, node.ty, deps, target, yld)
    }

    /// Translate and order the receiver and arguments of a call that may
    /// need a null guard. The receiver is evaluated first and the guard
    /// tests the same value the call uses; argument statements run only
    /// after the guard has passed.
    fn guarded_operands(
        &mut self,
        ctx: &TranslationContext,
        receiver: NodeIndex,
        args: &[NodeIndex],
        params: &[TypeId],
    ) -> LowerResult<GuardedOperands> {
        let guard = self.needs_null_guard(receiver)?;
        let recv = self.expr(ctx, receiver, None)?;
        let args = self.translate_args(ctx, args, params)?;
        if !guard {
            let mut parts = Vec::with_capacity(args.len() + 1);
            parts.push(recv);
            parts.extend(args);
            let (outer, mut values, deps) = self.sequence_operands(parts)?;
            let recv = values.remove(0);
            return Ok(GuardedOperands {
                outer,
                cond: None,
                inner: Vec::new(),
                recv,
                args: values,
                deps,
            });
        }

        let ExpressionResult {
            mut preface,
            value,
            ty,
            deps,
        } = recv;
        let mut recv = value.ok_or_else(|| LowerError::internal("void receiver"))?;
        let arg_effects = args.iter().any(|arg| !arg.preface.is_empty());
        let stable = if arg_effects {
            recv.is_literal() || matches!(recv, JNode::This)
        } else {
            recv.is_side_effect_free()
        };
        if !stable {
            let tmp = self.fresh_temp("recv");
            preface.push(JNode::local(self.java_type(ty), tmp.clone(), Some(recv)));
            recv = JNode::id(tmp);
        }
        let cond = JNode::binary(recv.clone(), JBinaryOp::Ne, JNode::null());
        let (inner, args, arg_deps) = self.sequence_operands(args)?;
        Ok(GuardedOperands {
            outer: preface,
            cond: Some(cond),
            inner,
            recv,
            args,
            deps: deps.combine(arg_deps),
        })
    }
}

/// Receiver and arguments of a possibly guarded call, in evaluation order.
struct GuardedOperands {
    /// Runs before the guard.
    outer: Vec<JNode>,
    cond: Option<JNode>,
    /// Runs once the guard has passed.
    inner: Vec<JNode>,
    recv: JNode,
    args: Vec<JNode>,
    deps: Dependencies,
}
