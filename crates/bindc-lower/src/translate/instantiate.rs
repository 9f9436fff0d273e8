//! Object literals and `new`.
//!
//! A declarative object is built in two phases so that defaults never
//! overwrite literal values and bound defaults can read literal values:
//!
//! ```text
//! C tmp = new C(true);                       // allocate, no defaults
//! tmp.initVars$();
//! tmp.set$x(5);                              // each literal part
//! tmp.varChangeBits$(VOFF$x, 0, FXBase.VFLGS$INIT_OBJ_LIT);
//! for (int i = 0; i < tmp.count$(); i++)
//!     if (!tmp.varTestBits$(i, FXBase.VFLGS$INIT_MASK)) tmp.applyDefaults$(i);
//! tmp.complete$();                           // init blocks, triggers
//! ```
//!
//! With no literal parts the full-initialization constructor `new C()` runs
//! the same sequence itself.

use super::Translator;
use crate::context::{TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, TranslationResult};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::{RuntimeClass, RuntimeMethod, var_flags};
use bindc_target::{JBinaryOp, JNode, JType, JUnaryOp};
use bindc_tree::{Node, NodeIndex, NodeKind, ObjectLiteralPart, SymbolFlags, SymbolId, TypeId};

impl Translator<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn instantiate(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        class: SymbolId,
        args: &[NodeIndex],
        parts: &[ObjectLiteralPart],
        body: Option<NodeIndex>,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let symbols = &self.program().symbols;
        if symbols.is_mixin(class) {
            return Err(LowerError::unsupported(format!(
                "instantiation of mixin {}",
                symbols.name(class)
            )));
        }
        if parts.iter().any(|part| part.bind.is_bound()) {
            return Err(LowerError::unsupported("bound object literal part"));
        }

        let expr = if symbols.has_flag(class, SymbolFlags::JAVA_CLASS) {
            if body.is_some() {
                return Err(LowerError::unsupported("anonymous subclass of a plain class"));
            }
            self.new_plain_object(ctx, node, class, args, parts)?
        } else {
            if !args.is_empty() {
                return Err(LowerError::unsupported(
                    "constructor arguments to a declarative class",
                ));
            }
            let class = match body {
                Some(body) => self.anonymous_class(ctx, body)?,
                None => class,
            };
            self.new_declarative_object(ctx, node, class, parts)?
        };
        self.finish_expr(expr, target, yld)
    }

    /// `new C(args)` followed by plain field stores for the literal parts.
    fn new_plain_object(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        class: SymbolId,
        args: &[NodeIndex],
        parts: &[ObjectLiteralPart],
    ) -> LowerResult<ExpressionResult> {
        let mut translated = Vec::with_capacity(args.len());
        for arg in args {
            translated.push(self.expr(ctx, *arg, None)?);
        }
        let (mut preface, values, mut deps) = self.sequence_operands(translated)?;
        let class_ty = JType::named(typemorph::class_type_name(self.program(), class));
        let created = JNode::new_object(class_ty.clone(), values);
        if parts.is_empty() {
            return Ok(ExpressionResult {
                preface,
                value: Some(created),
                ty: node.ty,
                deps,
            });
        }

        let tmp = self.fresh_temp("objlit");
        preface.push(JNode::local(class_ty, tmp.clone(), Some(created)));
        for part in parts {
            let (stmts, part_deps) = self.store_part(ctx, &tmp, part)?;
            preface.extend(stmts);
            deps = deps.combine(part_deps);
        }
        Ok(ExpressionResult {
            preface,
            value: Some(JNode::id(tmp)),
            ty: node.ty,
            deps,
        })
    }

    /// Translate the body of `C { ... }` with members into its own class
    /// and return that class's symbol.
    fn anonymous_class(&mut self, ctx: &TranslationContext, body: NodeIndex) -> LowerResult<SymbolId> {
        let NodeKind::ClassDecl(decl) = &self.node(body)?.kind else {
            return Err(LowerError::internal("anonymous class body is not a class"));
        };
        for def in self.class_definitions(ctx, decl)? {
            self.unit.add_definition(def)?;
        }
        Ok(decl.sym)
    }

    fn new_declarative_object(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        class: SymbolId,
        parts: &[ObjectLiteralPart],
    ) -> LowerResult<ExpressionResult> {
        let class_ty = JType::named(typemorph::class_type_name(self.program(), class));
        let needs_outer = self.unit.has_outer_reference(class);
        if parts.is_empty() && !needs_outer {
            return Ok(ExpressionResult::new(JNode::new_object(class_ty, Vec::new()), node.ty));
        }

        let tmp = self.fresh_temp("objlit");
        let obj = || JNode::id(tmp.clone());
        let mut ctor_args = vec![JNode::bool(true)];
        if needs_outer {
            ctor_args.push(self.this_value(ctx));
        }
        let mut preface = vec![
            JNode::local(
                class_ty.clone(),
                tmp.clone(),
                Some(JNode::new_object(class_ty, ctor_args)),
            ),
            JNode::expr_stmt(JNode::call(obj(), names::INIT_VARS, Vec::new())),
        ];

        let mut deps = Dependencies::default();
        for part in parts {
            let (stmts, part_deps) = self.store_part(ctx, &tmp, part)?;
            preface.extend(stmts);
            deps = deps.combine(part_deps);
            let offset = self.offset_ref(ctx, &obj(), part.var)?;
            preface.push(JNode::expr_stmt(self.runtime_call(
                RuntimeMethod::VarChangeBits,
                vec![obj(), offset, JNode::int(0), var_flag(var_flags::INIT_OBJ_LIT_NAME)],
            )));
        }

        let slot = self.fresh_temp("i");
        let untouched = JNode::not(self.runtime_call(
            RuntimeMethod::VarTestBits,
            vec![obj(), JNode::id(slot.clone()), var_flag(var_flags::INIT_MASK_NAME)],
        ));
        let apply = JNode::expr_stmt(JNode::call(
            obj(),
            names::APPLY_DEFAULTS,
            vec![JNode::id(slot.clone())],
        ));
        preface.push(JNode::For {
            init: vec![JNode::local(JType::Int, slot.clone(), Some(JNode::int(0)))],
            cond: Some(Box::new(JNode::binary(
                JNode::id(slot.clone()),
                JBinaryOp::Lt,
                JNode::call(obj(), names::COUNT, Vec::new()),
            ))),
            update: vec![JNode::unary(JUnaryOp::PostInc, JNode::id(slot))],
            body: Box::new(JNode::if_stmt(untouched, vec![apply], None)),
        });
        preface.push(JNode::expr_stmt(JNode::call(obj(), names::COMPLETE, Vec::new())));

        Ok(ExpressionResult {
            preface,
            value: Some(obj()),
            ty: node.ty,
            deps,
        })
    }

    /// One `var: value` part stored into the object held by `tmp`.
    fn store_part(
        &mut self,
        ctx: &TranslationContext,
        tmp: &str,
        part: &ObjectLiteralPart,
    ) -> LowerResult<(Vec<JNode>, Dependencies)> {
        let var_ty = self.symbol(part.var)?.ty;
        let value = self.expr(ctx, part.value, Some(var_ty))?;
        let deps = value.deps.clone();
        let (mut stmts, value) = value.split()?;
        let write = self.member_write(ctx, Some(JNode::id(tmp)), part.var, value)?;
        stmts.push(JNode::expr_stmt(write));
        Ok((stmts, deps))
    }
}

/// `FXBase.VFLGS$...`
pub(crate) fn var_flag(name: &str) -> JNode {
    JNode::static_select(RuntimeClass::FXBase.name(), name)
}
