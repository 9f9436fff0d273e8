//! Blocks, conditionals, loops, exceptions, jumps and local variables.

use super::Translator;
use crate::context::{Sink, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, StatementsResult, TranslationResult};
use bindc_target::{JCatch, JNode};
use bindc_tree::{CatchClause, Node, NodeIndex, NodeKind, TypeId, VarDecl};

impl Translator<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn if_expr(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        node: &Node,
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let void = self.program().types.is_void(node.ty);
        match yld {
            Yield::ToExpression if void => {
                let expr = self.statement_as_expression(ctx, idx, TypeId::VOID)?;
                Ok(TranslationResult::Expression(expr))
            }
            Yield::ToExpression => {
                let expr = self.conditional_value(ctx, node, cond, then_branch, else_branch)?;
                self.finish_expr(expr, target, yld)
            }
            Yield::ToStatement(sink) => {
                let c = self.expr(ctx, cond, Some(TypeId::BOOLEAN))?;
                let mut deps = c.deps.clone();
                let (mut stmts, c) = c.split()?;
                let branch_ty = Some(target.unwrap_or(node.ty));
                let branch = |tr: &mut Self, idx: NodeIndex| {
                    tr.in_block_scope(|tr| {
                        if void {
                            tr.stmts(ctx, idx)
                        } else {
                            tr.stmts_into(ctx, idx, branch_ty, sink.clone())
                        }
                    })
                };
                let then = branch(self, then_branch)?;
                deps = deps.combine(then.deps);
                let otherwise = match else_branch {
                    Some(else_branch) => {
                        let otherwise = branch(self, else_branch)?;
                        deps = deps.combine(otherwise.deps);
                        Some(otherwise.stmts)
                    }
                    None if void => None,
                    None => return Err(LowerError::internal("valued if without an else branch")),
                };
                stmts.push(JNode::if_stmt(c, then.stmts, otherwise));
                let result = StatementsResult { stmts, deps };
                if void {
                    self.finish_stmts(result, yld)
                } else {
                    Ok(TranslationResult::Statements(result))
                }
            }
        }
    }

    /// A valued `if` as an expression: a Java conditional when neither
    /// branch needs statements, otherwise a temporary assigned per branch.
    fn conditional_value(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    ) -> LowerResult<ExpressionResult> {
        let else_branch =
            else_branch.ok_or_else(|| LowerError::internal("valued if without an else branch"))?;
        let c = self.expr(ctx, cond, Some(TypeId::BOOLEAN))?;
        let t = self.expr(ctx, then_branch, Some(node.ty))?;
        let e = self.expr(ctx, else_branch, Some(node.ty))?;
        let deps = c.deps.clone().combine(t.deps.clone()).combine(e.deps.clone());
        let (mut preface, c) = c.split()?;
        let (t_preface, t) = t.split()?;
        let (e_preface, e) = e.split()?;

        if t_preface.is_empty() && e_preface.is_empty() {
            return Ok(ExpressionResult {
                preface,
                value: Some(JNode::conditional(c, t, e)),
                ty: node.ty,
                deps,
            });
        }

        let tmp = self.fresh_temp("res");
        preface.insert(
            0,
            JNode::local(self.java_type(node.ty), tmp.clone(), Some(self.default_value(node.ty))),
        );
        let arm = |mut stmts: Vec<JNode>, value: JNode| {
            stmts.push(JNode::expr_stmt(JNode::assign(JNode::id(tmp.clone()), value)));
            stmts
        };
        preface.push(JNode::if_stmt(c, arm(t_preface, t), Some(arm(e_preface, e))));
        Ok(ExpressionResult {
            preface,
            value: Some(JNode::id(tmp)),
            ty: node.ty,
            deps,
        })
    }

    /// Whether a block declares names that must stay scoped to it.
    fn declares_locals(&self, stmts: &[NodeIndex]) -> LowerResult<bool> {
        for stmt in stmts {
            if matches!(
                self.node(*stmt)?.kind,
                NodeKind::VarDecl(_) | NodeKind::FunctionDef(_) | NodeKind::ClassDecl(_)
            ) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn block_stmts(
        &mut self,
        ctx: &TranslationContext,
        stmts: &[NodeIndex],
    ) -> LowerResult<StatementsResult> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut deps = Dependencies::default();
        for stmt in stmts {
            let result = self.stmts(ctx, *stmt)?;
            out.extend(result.stmts);
            deps = deps.combine(result.deps);
        }
        Ok(StatementsResult { stmts: out, deps })
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn block_expr(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        node: &Node,
        stmts: &[NodeIndex],
        value: Option<NodeIndex>,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let void = self.program().types.is_void(node.ty);
        // A trailing void expression is just one more statement.
        let (stmts, value): (Vec<NodeIndex>, Option<NodeIndex>) = match value {
            Some(value) if void => (stmts.iter().copied().chain([value]).collect(), None),
            _ => (stmts.to_vec(), value),
        };

        match (yld, value) {
            (Yield::ToExpression, None) => {
                let StatementsResult { stmts, deps } =
                    self.in_block_scope(|tr| tr.block_stmts(ctx, &stmts))?;
                let preface = if stmts.is_empty() {
                    Vec::new()
                } else {
                    vec![JNode::Block(stmts)]
                };
                Ok(TranslationResult::Expression(
                    ExpressionResult::void(preface).with_deps(deps),
                ))
            }
            (_, Some(value)) if stmts.is_empty() => self.translate(ctx, value, target, yld),
            (Yield::ToExpression, Some(_)) => {
                let expr = self.statement_as_expression(ctx, idx, node.ty)?;
                self.finish_expr(expr, target, yld)
            }
            (Yield::ToStatement(sink), value) => {
                let scoped = self.declares_locals(&stmts)?;
                let value_ty = Some(target.unwrap_or(node.ty));
                let result = self.in_block_scope(|tr| {
                    let mut result = tr.block_stmts(ctx, &stmts)?;
                    if let Some(value) = value {
                        let tail = tr.stmts_into(ctx, value, value_ty, sink.clone())?;
                        result.stmts.extend(tail.stmts);
                        result.deps = std::mem::take(&mut result.deps).combine(tail.deps);
                    }
                    Ok(result)
                })?;
                // A value sink assigns a local declared outside the block.
                let result = if scoped {
                    StatementsResult {
                        stmts: vec![JNode::Block(result.stmts)],
                        deps: result.deps,
                    }
                } else {
                    result
                };
                if value.is_some() {
                    Ok(TranslationResult::Statements(result))
                } else {
                    self.finish_stmts(result, yld)
                }
            }
        }
    }

    pub(super) fn local_var(
        &mut self,
        ctx: &TranslationContext,
        decl: &VarDecl,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        if decl.bind.is_bound() {
            return Err(LowerError::unsupported("bound local variable"));
        }
        if decl.on_replace.is_some() || decl.on_invalidate.is_some() {
            return Err(LowerError::unsupported("trigger on a local variable"));
        }
        let symbol = self.symbol(decl.sym)?;
        let name = self
            .unit
            .substitution(decl.sym)
            .map_or_else(|| symbol.name.clone(), str::to_owned);
        let ty = symbol.ty;

        let (mut stmts, deps, init) = match decl.init {
            Some(init) => {
                let init = self.expr(ctx, init, Some(ty))?;
                let deps = init.deps.clone();
                let (preface, value) = init.split()?;
                (preface, deps, value)
            }
            None => (Vec::new(), Dependencies::default(), self.default_value(ty)),
        };
        stmts.push(JNode::local(self.java_type(ty), name, Some(init)));
        self.finish_stmts(StatementsResult { stmts, deps }, yld)
    }

    pub(super) fn while_loop(
        &mut self,
        ctx: &TranslationContext,
        cond: NodeIndex,
        body: NodeIndex,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let c = self.expr(ctx, cond, Some(TypeId::BOOLEAN))?;
        let body = self.in_block_scope(|tr| tr.stmts(ctx, body))?;
        let deps = c.deps.clone().combine(body.deps);
        let (preface, c) = c.split()?;

        let stmt = if preface.is_empty() {
            JNode::while_stmt(c, body.stmts)
        } else {
            // The condition's statements rerun on every iteration.
            let mut looped = preface;
            looped.push(JNode::if_stmt(JNode::not(c), vec![JNode::Break(None)], None));
            looped.extend(body.stmts);
            JNode::while_stmt(JNode::bool(true), looped)
        };
        self.finish_stmts(
            StatementsResult {
                stmts: vec![stmt],
                deps,
            },
            yld,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn try_expr(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        node: &Node,
        body: NodeIndex,
        catches: &[CatchClause],
        finally: Option<NodeIndex>,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let Yield::ToStatement(sink) = yld else {
            let expr = self.statement_as_expression(ctx, idx, node.ty)?;
            return self.finish_expr(expr, target, yld);
        };
        let void = self.program().types.is_void(node.ty);
        let value_ty = Some(target.unwrap_or(node.ty));
        let part = |tr: &mut Self, idx: NodeIndex| {
            tr.in_block_scope(|tr| {
                if void {
                    tr.stmts(ctx, idx)
                } else {
                    tr.stmts_into(ctx, idx, value_ty, sink.clone())
                }
            })
        };

        let body = part(self, body)?;
        let mut deps = body.deps;
        let mut java_catches = Vec::with_capacity(catches.len());
        for catch in catches {
            let param = self.symbol(catch.param)?;
            let handler = part(self, catch.body)?;
            deps = deps.combine(handler.deps);
            java_catches.push(JCatch {
                ty: self.java_type(param.ty),
                name: param.name.clone(),
                body: handler.stmts,
            });
        }
        let finally = match finally {
            Some(finally) => {
                let finally = self.in_block_scope(|tr| tr.stmts(ctx, finally))?;
                deps = deps.combine(finally.deps);
                Some(finally.stmts)
            }
            None => None,
        };

        let result = StatementsResult {
            stmts: vec![JNode::Try {
                body: body.stmts,
                catches: java_catches,
                finally,
            }],
            deps,
        };
        if void {
            self.finish_stmts(result, yld)
        } else {
            Ok(TranslationResult::Statements(result))
        }
    }

    /// Deliver a statement that transfers control. Nothing may follow it,
    /// so a return sink adds no trailing `return`.
    fn transfer(&self, result: StatementsResult, yld: &Yield) -> LowerResult<TranslationResult> {
        Ok(match yld {
            Yield::ToExpression => TranslationResult::Expression(
                ExpressionResult::void(result.stmts).with_deps(result.deps),
            ),
            Yield::ToStatement(_) => TranslationResult::Statements(result),
        })
    }

    pub(super) fn throw(
        &mut self,
        ctx: &TranslationContext,
        expr: NodeIndex,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let thrown = self.expr(ctx, expr, None)?;
        let deps = thrown.deps.clone();
        let (mut stmts, value) = thrown.split()?;
        stmts.push(JNode::Throw(Box::new(value)));
        self.transfer(StatementsResult { stmts, deps }, yld)
    }

    pub(super) fn return_stmt(
        &mut self,
        ctx: &TranslationContext,
        expr: Option<NodeIndex>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let ret = match ctx.function {
            Some(function) => self
                .symbol(function)?
                .function_data()
                .map_or(TypeId::VOID, |data| data.ret),
            None => TypeId::VOID,
        };
        let bare_return = || {
            if ctx.boxed_return {
                JNode::ret(Some(JNode::null()))
            } else {
                JNode::ret(None)
            }
        };

        let result = match expr {
            Some(expr) if !self.program().types.is_void(ret) => {
                self.stmts_into(ctx, expr, Some(ret), Sink::Return)?
            }
            Some(expr) => {
                let mut result = self.stmts(ctx, expr)?;
                result.stmts.push(bare_return());
                result
            }
            None => StatementsResult::new(vec![bare_return()]),
        };
        self.transfer(result, yld)
    }

    pub(super) fn jump(&self, stmt: JNode, yld: &Yield) -> LowerResult<TranslationResult> {
        self.transfer(StatementsResult::new(vec![stmt]), yld)
    }

    pub(super) fn new_array(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        elem: TypeId,
        size: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let mut size = self.expr(ctx, size, Some(TypeId::INT))?;
        let value = size.take_value()?;
        size.value = Some(JNode::new_array(self.java_type(elem), value));
        size.ty = node.ty;
        self.finish_expr(size, target, yld)
    }
}
