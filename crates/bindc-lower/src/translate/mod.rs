//! Expression and statement translation.
//!
//! [`Translator::translate`] lowers one attributed node into a
//! [`TranslationResult`]. The caller states through [`Yield`] whether it
//! wants a value (`Expression`) or statements whose value, if any, goes to a
//! [`Sink`]. Every construct is handled in one of the sibling modules, each
//! adding an `impl Translator<'_>` block:
//!
//! | module           | constructs                                          |
//! |------------------|-----------------------------------------------------|
//! | `literals`       | literals, string interpolation                      |
//! | `ident`          | names, `this`, member selects, null guards          |
//! | `call`           | function, method, mixin and function-value calls    |
//! | `binary`         | arithmetic, logic, equality, duration operators     |
//! | `unary`          | negation, increments, `sizeof`, `reverse`           |
//! | `assign`         | assignment family, insert, delete                   |
//! | `convert`        | implicit conversions, casts, `instanceof`           |
//! | `sequence`       | sequence literals, ranges, indexing, slices         |
//! | `for_expr`       | `for` loops and comprehensions                      |
//! | `control`        | blocks, `if`, `while`, `try`, jumps, locals         |
//! | `instantiate`    | object literals, `new`, anonymous classes           |
//! | `function_value` | anonymous and local functions                       |
//! | `trigger`        | on-replace and on-invalidate bodies                 |

mod assign;
mod binary;
mod call;
mod control;
mod convert;
mod for_expr;
mod function_value;
mod ident;
mod instantiate;
mod literals;
mod sequence;
mod trigger;
mod unary;

pub(crate) use function_value::ends_in_transfer;
pub(crate) use instantiate::var_flag;
pub use trigger::TriggerMethods;

use crate::bind::BindTranslator;
use crate::context::{Sink, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, StatementsResult, TranslationResult};
use crate::typemorph;
use crate::unit::UnitState;
use bindc_common::LowerOptions;
use bindc_common::runtime::{RuntimeMethod, RuntimeReceiver};
use bindc_target::{JNode, JType};
use bindc_tree::{Node, NodeIndex, NodeKind, Program, Symbol, SymbolId, TypeId};
use tracing::trace;

pub struct Translator<'a> {
    program: &'a Program,
    options: &'a LowerOptions,
    binder: &'a dyn BindTranslator,
    pub(crate) unit: UnitState,
    depth: u32,
    /// Nesting of class translations, guarded by the orchestrator.
    pub(crate) class_depth: u32,
}

impl<'a> Translator<'a> {
    pub fn new(
        program: &'a Program,
        options: &'a LowerOptions,
        binder: &'a dyn BindTranslator,
    ) -> Self {
        let mut unit = UnitState::new();
        for i in 0..program.arena.len() {
            if let Some(node) = program.arena.get(NodeIndex(i as u32))
                && let NodeKind::FunctionDef(def) = &node.kind
                && let Some(body) = def.body
            {
                unit.record_function_body(def.sym, body);
            }
        }
        Self {
            program,
            options,
            binder,
            unit,
            depth: 0,
            class_depth: 0,
        }
    }

    pub const fn program(&self) -> &'a Program {
        self.program
    }

    pub const fn options(&self) -> &'a LowerOptions {
        self.options
    }

    pub(crate) const fn binder(&self) -> &'a dyn BindTranslator {
        self.binder
    }

    pub fn node(&self, idx: NodeIndex) -> LowerResult<&'a Node> {
        self.program.node(idx).ok_or(LowerError::UnknownNode(idx.0))
    }

    pub fn symbol(&self, sym: SymbolId) -> LowerResult<&'a Symbol> {
        self.program.symbol(sym).ok_or(LowerError::UnknownSymbol(sym.0))
    }

    pub fn fresh_temp(&mut self, hint: &str) -> String {
        self.unit.fresh_temp(hint)
    }

    pub fn java_type(&self, ty: TypeId) -> JType {
        typemorph::java_type(self.program, ty)
    }

    pub fn default_value(&self, ty: TypeId) -> JNode {
        typemorph::default_value(self.program, ty)
    }

    pub fn type_info(&self, ty: TypeId) -> JNode {
        typemorph::type_info(self.program, ty)
    }

    /// Call a runtime entry point. For instance methods the first argument
    /// is the receiver.
    pub fn runtime_call(&self, method: RuntimeMethod, mut args: Vec<JNode>) -> JNode {
        match method.receiver() {
            RuntimeReceiver::Static(class) => JNode::static_call(class.name(), method.name(), args),
            RuntimeReceiver::Instance if args.is_empty() => JNode::call_local(method.name(), args),
            RuntimeReceiver::Instance => {
                let receiver = args.remove(0);
                JNode::call(receiver, method.name(), args)
            }
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Translate one node.
    ///
    /// # Arguments
    /// * `target` - type the value must be converted to, if any
    /// * `yld` - whether a value or statements are wanted
    pub fn translate(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let limit = self.options.max_translate_depth;
        if self.depth >= limit {
            return Err(LowerError::DepthExceeded { limit });
        }
        self.depth += 1;
        let result = self.dispatch(ctx, idx, target, yld);
        self.depth -= 1;
        result
    }

    /// Translate for a value.
    pub fn expr(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        target: Option<TypeId>,
    ) -> LowerResult<ExpressionResult> {
        self.translate(ctx, idx, target, &Yield::ToExpression)?
            .into_expression()
    }

    /// Translate for effect, discarding any value.
    pub fn stmts(&mut self, ctx: &TranslationContext, idx: NodeIndex) -> LowerResult<StatementsResult> {
        self.translate(ctx, idx, None, &Yield::DISCARD)?
            .into_statements()
    }

    /// Translate as statements whose value goes to `sink`.
    pub fn stmts_into(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        target: Option<TypeId>,
        sink: Sink,
    ) -> LowerResult<StatementsResult> {
        self.translate(ctx, idx, target, &Yield::ToStatement(sink))?
            .into_statements()
    }

    fn dispatch(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let node = self.node(idx)?;
        trace!(node = idx.0, kind = node.kind.tag(), "translate");
        if ctx.in_bind
            && let Some(construct) = self.illegal_in_bind(node)
        {
            return Err(LowerError::IllegalInBind { construct });
        }

        match &node.kind {
            NodeKind::Literal(lit) => {
                let expr = self.literal(lit, node.ty);
                self.finish_expr(expr, target, yld)
            }
            NodeKind::StringExpr(parts) => self.string_expr(ctx, parts, target, yld),
            NodeKind::Ident(sym) => self.ident(ctx, node, *sym, target, yld),
            NodeKind::This => {
                let expr = ExpressionResult::new(self.this_value(ctx), node.ty);
                self.finish_expr(expr, target, yld)
            }
            NodeKind::Super => {
                let expr = ExpressionResult::new(JNode::Super, node.ty);
                self.finish_expr(expr, target, yld)
            }
            NodeKind::Select { receiver, member } => {
                self.select(ctx, node, *receiver, *member, target, yld)
            }
            NodeKind::Call { callee, args } => self.call(ctx, node, *callee, args, target, yld),
            NodeKind::Assign {
                target: lhs,
                value,
            } => self.assign(ctx, node, *lhs, *value, target, yld),
            NodeKind::CompoundAssign {
                op,
                target: lhs,
                value,
            } => self.compound_assign(ctx, node, *op, *lhs, *value, target, yld),
            NodeKind::Binary { op, left, right } => {
                self.binary(ctx, node, *op, *left, *right, target, yld)
            }
            NodeKind::Unary { op, operand } => self.unary(ctx, node, *op, *operand, target, yld),
            NodeKind::Cast(expr) => self.cast(ctx, node, *expr, target, yld),
            NodeKind::InstanceOf { expr, class } => {
                self.instance_of(ctx, *expr, *class, target, yld)
            }
            NodeKind::EmptySequence => {
                let elem = self.element_type(node.ty);
                let expr = ExpressionResult::new(
                    typemorph::empty_sequence(self.program, elem),
                    node.ty,
                );
                self.finish_expr(expr, target, yld)
            }
            NodeKind::ExplicitSequence(items) => {
                self.explicit_sequence(ctx, node, items, target, yld)
            }
            NodeKind::Range {
                lower,
                upper,
                step,
                exclusive,
            } => self.range(ctx, node, *lower, *upper, *step, *exclusive, target, yld),
            NodeKind::Indexed { seq, index } => self.indexed(ctx, node, *seq, *index, target, yld),
            NodeKind::Slice {
                seq,
                start,
                end,
                end_exclusive,
            } => self.slice(ctx, node, *seq, *start, *end, *end_exclusive, target, yld),
            NodeKind::Insert {
                seq,
                value,
                position,
            } => self.insert(ctx, *seq, *value, *position, yld),
            NodeKind::Delete {
                seq,
                target: what,
            } => self.delete(ctx, *seq, *what, yld),
            NodeKind::IndexOf(var) => self.index_of(ctx, *var, target, yld),
            NodeKind::For { clauses, body } => self.for_expr(ctx, node, clauses, *body, target, yld),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.if_expr(ctx, idx, node, *cond, *then_branch, *else_branch, target, yld),
            NodeKind::While { cond, body } => self.while_loop(ctx, *cond, *body, yld),
            NodeKind::Try {
                body,
                catches,
                finally,
            } => self.try_expr(ctx, idx, node, *body, catches, *finally, target, yld),
            NodeKind::Throw(expr) => self.throw(ctx, *expr, yld),
            NodeKind::Return(expr) => self.return_stmt(ctx, *expr, yld),
            NodeKind::Break => self.jump(JNode::Break(None), yld),
            NodeKind::Continue => self.jump(JNode::Continue(None), yld),
            NodeKind::Block { stmts, value } => {
                self.block_expr(ctx, idx, node, stmts, *value, target, yld)
            }
            NodeKind::Instantiate {
                class,
                args,
                parts,
                body,
            } => self.instantiate(ctx, node, *class, args, parts, *body, target, yld),
            NodeKind::NewArray { elem, size } => {
                self.new_array(ctx, node, *elem, *size, target, yld)
            }
            NodeKind::VarDecl(decl) => self.local_var(ctx, decl, yld),
            NodeKind::FunctionDef(def) => self.local_function(ctx, def, yld),
            NodeKind::FunctionValue(def) => self.function_value(ctx, node, *def, target, yld),
            NodeKind::ClassDecl(decl) => self.local_class(ctx, decl, yld),
            NodeKind::OverrideVar(_)
            | NodeKind::InitBlock(_)
            | NodeKind::PostInitBlock(_)
            | NodeKind::Script(_) => Err(LowerError::internal(format!(
                "{} outside a class body",
                node.kind.tag()
            ))),
        }
    }

    /// Constructs that have no meaning inside a bind: anything that mutates
    /// state, transfers control or declares something.
    fn illegal_in_bind(&self, node: &Node) -> Option<&'static str> {
        match &node.kind {
            NodeKind::Assign { .. } | NodeKind::CompoundAssign { .. } => Some("assignment"),
            NodeKind::Unary { op, .. } if op.is_increment() => Some("increment"),
            NodeKind::While { .. } => Some("while loop"),
            NodeKind::For { .. } if self.program.types.is_void(node.ty) => {
                Some("for loop with a void body")
            }
            NodeKind::Throw(_) => Some("throw"),
            NodeKind::Return(_) => Some("return"),
            NodeKind::Break => Some("break"),
            NodeKind::Continue => Some("continue"),
            NodeKind::FunctionDef(_) | NodeKind::FunctionValue(_) => Some("function definition"),
            NodeKind::ClassDecl(_) => Some("class definition"),
            NodeKind::Instantiate { body: Some(_), .. } => Some("anonymous class"),
            NodeKind::Insert { .. } | NodeKind::Delete { .. } => Some("sequence mutation"),
            _ => None,
        }
    }

    // =========================================================================
    // Result plumbing
    // =========================================================================

    /// Convert to `target`, then deliver in the shape `yld` asks for.
    pub(crate) fn finish_expr(
        &mut self,
        expr: ExpressionResult,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let expr = self.coerce(expr, target)?;
        match yld {
            Yield::ToExpression => Ok(TranslationResult::Expression(expr)),
            Yield::ToStatement(sink) => Ok(TranslationResult::Statements(
                self.to_statements(expr, sink)?,
            )),
        }
    }

    /// Deliver statements; in expression mode they become a void expression.
    pub(crate) fn finish_stmts(
        &self,
        stmts: StatementsResult,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        match yld {
            Yield::ToExpression => {
                let StatementsResult { stmts, deps } = stmts;
                Ok(TranslationResult::Expression(
                    ExpressionResult::void(stmts).with_deps(deps),
                ))
            }
            Yield::ToStatement(Sink::Discard) => Ok(TranslationResult::Statements(stmts)),
            Yield::ToStatement(Sink::Return) => {
                let mut stmts = stmts;
                stmts.stmts.push(JNode::ret(None));
                Ok(TranslationResult::Statements(stmts))
            }
            Yield::ToStatement(Sink::AssignTo(name)) => Err(LowerError::internal(format!(
                "void statements cannot be assigned to {name}"
            ))),
        }
    }

    /// Lower a value into statements that deliver it to `sink`.
    pub(crate) fn to_statements(
        &mut self,
        expr: ExpressionResult,
        sink: &Sink,
    ) -> LowerResult<StatementsResult> {
        let ExpressionResult {
            mut preface,
            value,
            ty,
            deps,
        } = expr;
        match (value, sink) {
            (None, Sink::Return) => preface.push(JNode::ret(None)),
            (None, _) => {}
            (Some(value), Sink::Discard) => {
                if value.is_statement_expression() {
                    preface.push(JNode::expr_stmt(value));
                } else if !value.is_side_effect_free() {
                    let tmp = self.fresh_temp("");
                    preface.push(JNode::local(self.java_type(ty), tmp, Some(value)));
                }
            }
            (Some(value), Sink::AssignTo(name)) => {
                preface.push(JNode::expr_stmt(JNode::assign(JNode::id(name.clone()), value)));
            }
            (Some(value), Sink::Return) => preface.push(JNode::ret(Some(value))),
        }
        Ok(StatementsResult {
            stmts: preface,
            deps,
        })
    }

    /// Translate a construct that only exists as statements, for a value:
    /// declare a temporary, let the statements assign it, read it back.
    pub(crate) fn statement_as_expression(
        &mut self,
        ctx: &TranslationContext,
        idx: NodeIndex,
        ty: TypeId,
    ) -> LowerResult<ExpressionResult> {
        if self.program.types.is_void(ty) {
            let stmts = self.stmts(ctx, idx)?;
            return Ok(ExpressionResult::void(stmts.stmts).with_deps(stmts.deps));
        }
        let tmp = self.fresh_temp("res");
        let StatementsResult { stmts, deps } =
            self.stmts_into(ctx, idx, Some(ty), Sink::AssignTo(tmp.clone()))?;
        let mut preface = Vec::with_capacity(stmts.len() + 1);
        preface.push(JNode::local(
            self.java_type(ty),
            tmp.clone(),
            Some(self.default_value(ty)),
        ));
        preface.extend(stmts);
        Ok(ExpressionResult {
            preface,
            value: Some(JNode::id(tmp)),
            ty,
            deps,
        })
    }

    /// Move a value into a fresh local so it is evaluated exactly once.
    pub(crate) fn hoist(&mut self, mut expr: ExpressionResult, hint: &str) -> LowerResult<ExpressionResult> {
        let value = expr.take_value()?;
        if value.is_literal() || matches!(value, JNode::This | JNode::Ident(_)) {
            expr.value = Some(value);
            return Ok(expr);
        }
        let tmp = self.fresh_temp(hint);
        expr.preface
            .push(JNode::local(self.java_type(expr.ty), tmp.clone(), Some(value)));
        expr.value = Some(JNode::id(tmp));
        Ok(expr)
    }

    /// Order the evaluation of several operands. An operand is spilled to a
    /// temporary when a later operand has preface statements that would
    /// otherwise run before it.
    pub(crate) fn sequence_operands(
        &mut self,
        parts: Vec<ExpressionResult>,
    ) -> LowerResult<(Vec<JNode>, Vec<JNode>, Dependencies)> {
        let mut later_preface = vec![false; parts.len()];
        let mut seen = false;
        for (i, part) in parts.iter().enumerate().rev() {
            later_preface[i] = seen;
            seen |= !part.preface.is_empty();
        }

        let mut preface = Vec::new();
        let mut values = Vec::with_capacity(parts.len());
        let mut deps = Dependencies::default();
        for (i, part) in parts.into_iter().enumerate() {
            let ExpressionResult {
                preface: stmts,
                value,
                ty,
                deps: part_deps,
            } = part;
            preface.extend(stmts);
            deps = deps.combine(part_deps);
            let value = value.ok_or_else(|| LowerError::internal("void operand"))?;
            if later_preface[i] && !value.is_literal() && !matches!(value, JNode::This) {
                let tmp = self.fresh_temp("arg");
                preface.push(JNode::local(self.java_type(ty), tmp.clone(), Some(value)));
                values.push(JNode::id(tmp));
            } else {
                values.push(value);
            }
        }
        Ok((preface, values, deps))
    }

    // =========================================================================
    // Type queries
    // =========================================================================

    pub(crate) fn element_type(&self, ty: TypeId) -> TypeId {
        self.program.types.element_type(ty).unwrap_or(TypeId::OBJECT)
    }

    pub(crate) fn is_sequence(&self, ty: TypeId) -> bool {
        self.program.types.is_sequence(ty)
    }

    pub(crate) fn is_primitive(&self, ty: TypeId) -> bool {
        self.program.types.is_primitive(ty)
    }

    /// Wrap a block body: statements hoisted to the top of the block land
    /// before the translated statements.
    pub(crate) fn in_block_scope(
        &mut self,
        f: impl FnOnce(&mut Self) -> LowerResult<StatementsResult>,
    ) -> LowerResult<StatementsResult> {
        self.unit.push_statements();
        let result = f(self);
        let hoisted = self.unit.pop_statements()?;
        let mut result = result?;
        if !hoisted.is_empty() {
            let mut stmts = hoisted;
            stmts.append(&mut result.stmts);
            result.stmts = stmts;
        }
        Ok(result)
    }
}
