//! Anonymous functions, local functions and local classes.
//!
//! A function value becomes an anonymous `FunctionN` implementation whose
//! `invoke$` method holds the body. `FunctionN` is generic, so parameters
//! and the result are boxed and a void body returns `null`.

use super::Translator;
use crate::context::{ReceiverContext, Sink, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{ExpressionResult, StatementsResult, TranslationResult};
use crate::typemorph;
use bindc_common::names;
use bindc_target::{JMethod, JModifiers, JNode, JParam};
use bindc_tree::{ClassDecl, FunctionDef, Node, NodeIndex, NodeKind, TypeId};

/// Whether control cannot fall off the end of `stmts`.
pub(crate) fn ends_in_transfer(stmts: &[JNode]) -> bool {
    match stmts.last() {
        Some(JNode::Return(_) | JNode::Throw(_)) => true,
        Some(JNode::Block(inner)) => ends_in_transfer(inner),
        _ => false,
    }
}

impl Translator<'_> {
    pub(super) fn function_value(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        def: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let NodeKind::FunctionDef(def) = &self.node(def)?.kind else {
            return Err(LowerError::internal("function value without a definition"));
        };
        let value = self.function_object(ctx, def, node.ty)?;
        self.finish_expr(ExpressionResult::new(value, node.ty), target, yld)
    }

    /// `new FunctionN<R, P...>() { public R invoke$(P p, ...) { body } }`
    fn function_object(
        &mut self,
        ctx: &TranslationContext,
        def: &FunctionDef,
        fn_ty: TypeId,
    ) -> LowerResult<JNode> {
        let symbol = self.symbol(def.sym)?;
        let ret = symbol
            .function_data()
            .map_or(TypeId::VOID, |data| data.ret);
        let void = self.program().types.is_void(ret);

        let mut params = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let param = self.symbol(*param)?;
            params.push(JParam::new(typemorph::boxed_type(self.program(), param.ty), param.name.clone()));
        }

        let outer = match (ctx.receiver, ctx.class) {
            (ReceiverContext::InstanceAsInstance, Some(class)) => {
                Some(typemorph::class_type_name(self.program(), class))
            }
            _ => None,
        };
        let body_ctx = ctx.for_function_value(def.sym, outer);
        let body = match def.body {
            Some(body) => self.in_block_scope(|tr| {
                if void {
                    let mut result = tr.stmts(&body_ctx, body)?;
                    if !ends_in_transfer(&result.stmts) {
                        result.stmts.push(JNode::ret(Some(JNode::null())));
                    }
                    Ok(result)
                } else {
                    tr.stmts_into(&body_ctx, body, Some(ret), Sink::Return)
                }
            })?,
            None => StatementsResult::new(vec![JNode::ret(Some(JNode::null()))]),
        };

        let invoke = JMethod::new(
            JModifiers::PUBLIC,
            typemorph::boxed_type(self.program(), ret),
            names::INVOKE,
            params,
            body.stmts,
        );
        Ok(JNode::New {
            class: self.java_type(fn_ty),
            args: Vec::new(),
            body: Some(vec![JNode::Method(invoke)]),
        })
    }

    /// A named local function is a final local holding its function object.
    /// Inside a block it is declared at the top so that earlier statements
    /// can call it.
    pub(super) fn local_function(
        &mut self,
        ctx: &TranslationContext,
        def: &FunctionDef,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let symbol = self.symbol(def.sym)?;
        let value = self.function_object(ctx, def, symbol.ty)?;
        let decl = JNode::local(self.java_type(symbol.ty), symbol.name.clone(), Some(value));
        if self.unit.has_block_scope() {
            self.unit.add_block_statement(decl)?;
            return self.finish_stmts(StatementsResult::default(), yld);
        }
        self.finish_stmts(StatementsResult::new(vec![decl]), yld)
    }

    /// A class declared inside a function body becomes a member of the
    /// nearest enclosing generated class.
    pub(super) fn local_class(
        &mut self,
        ctx: &TranslationContext,
        decl: &ClassDecl,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        for def in self.class_definitions(ctx, decl)? {
            self.unit.add_definition(def)?;
        }
        self.finish_stmts(StatementsResult::default(), yld)
    }
}
