//! Assignment, compound assignment, insert and delete.
//!
//! Every store goes through a [`Place`]: the left-hand side resolved once,
//! with its receiver and index settled into side-effect-free values so that
//! reading and writing the place evaluates them exactly once.
//!
//! Instance sequence variables are never replaced wholesale from outside;
//! they are mutated in place through the runtime (`Sequences.set`,
//! `setElement`, `insert`, ...) so that the owner can report the changed
//! range to its triggers. Sequences held anywhere else are immutable values:
//! an update computes the new sequence and stores it back.

use super::Translator;
use crate::context::{Sink, TranslationContext, Yield};
use crate::error::{LowerError, LowerResult};
use crate::result::{Dependencies, ExpressionResult, StatementsResult, TranslationResult};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::RuntimeMethod;
use bindc_target::{JBinaryOp, JNode};
use bindc_tree::{
    BinaryOp, DeleteTarget, InsertPosition, Node, NodeIndex, NodeKind, SymbolFlags, SymbolId,
    TypeId,
};

/// A resolved assignment target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Place {
    Local(String),
    /// A member variable; `recv` is `None` for an unqualified reference.
    Member { recv: Option<JNode>, var: SymbolId },
    ArrayElement { array: JNode, index: JNode },
    /// An element of an instance sequence variable, updated in place.
    MemberElement {
        recv: JNode,
        var: SymbolId,
        index: JNode,
    },
    /// An element of a sequence value; the whole sequence is replaced.
    ValueElement { seq: Box<Place>, index: JNode },
}

/// A place plus the statements that settle its parts.
pub(crate) struct Resolved {
    pub place: Place,
    pub preface: Vec<JNode>,
    pub deps: Dependencies,
}

impl Translator<'_> {
    // =========================================================================
    // Member stores
    // =========================================================================

    /// Store `value` into a member variable. The result is a statement
    /// expression; for everything except an in-place sequence it also
    /// yields the stored value.
    pub fn member_write(
        &mut self,
        ctx: &TranslationContext,
        recv: Option<JNode>,
        var: SymbolId,
        value: JNode,
    ) -> LowerResult<JNode> {
        let symbol = self.symbol(var)?;
        let owner = self.member_owner(var)?;
        let symbols = &self.program().symbols;

        if symbols.has_flag(owner, SymbolFlags::JAVA_CLASS) {
            let field = match (recv, symbol.is_static()) {
                (_, true) => JNode::static_select(symbols.name(owner), symbol.name.clone()),
                (Some(recv), false) => JNode::select(recv, symbol.name.clone()),
                (None, false) => {
                    let recv = self.implicit_receiver(ctx, owner);
                    JNode::select(recv, symbol.name.clone())
                }
            };
            return Ok(JNode::assign(field, value));
        }

        let accessors = self.uses_accessors(var);
        if symbol.is_static() {
            let qualifier = self.static_qualifier(ctx, owner);
            return Ok(match (qualifier, accessors) {
                (Some(q), true) => JNode::call(q, names::setter(&symbol.name), vec![value]),
                (None, true) => JNode::call_local(names::setter(&symbol.name), vec![value]),
                (Some(q), false) => JNode::assign(JNode::select(q, names::field(&symbol.name)), value),
                (None, false) => JNode::assign(JNode::id(names::field(&symbol.name)), value),
            });
        }

        let recv = match recv {
            Some(recv) => recv,
            None => self.implicit_receiver(ctx, owner),
        };
        if self.is_in_place_sequence(var) {
            let offset = self.offset_ref(ctx, &recv, var)?;
            return Ok(self.runtime_call(RuntimeMethod::SeqSet, vec![recv, offset, value]));
        }
        Ok(match (recv, accessors) {
            (JNode::This, true) => JNode::call_local(names::setter(&symbol.name), vec![value]),
            (JNode::This, false) => JNode::assign(JNode::id(names::field(&symbol.name)), value),
            (recv, true) => JNode::call(recv, names::setter(&symbol.name), vec![value]),
            (recv, false) => JNode::assign(JNode::select(recv, names::field(&symbol.name)), value),
        })
    }

    /// Instance sequence variables of declarative classes.
    pub(crate) fn is_in_place_sequence(&self, var: SymbolId) -> bool {
        self.program()
            .symbol(var)
            .is_some_and(|s| !s.is_static() && self.is_sequence(s.ty))
            && self.uses_accessors(var)
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Keep a side-effect-free value; spill anything else.
    fn settle(
        &mut self,
        expr: ExpressionResult,
        hint: &str,
    ) -> LowerResult<(Vec<JNode>, JNode, Dependencies)> {
        let expr = if expr.value.as_ref().is_some_and(JNode::is_side_effect_free) {
            expr
        } else {
            self.hoist(expr, hint)?
        };
        let deps = expr.deps.clone();
        let (preface, value) = expr.split()?;
        Ok((preface, value, deps))
    }

    pub(crate) fn resolve_place(
        &mut self,
        ctx: &TranslationContext,
        lhs: NodeIndex,
    ) -> LowerResult<Resolved> {
        let node = self.node(lhs)?;
        let symbols = &self.program().symbols;
        match &node.kind {
            NodeKind::Ident(sym) => {
                let place = if let Some(name) = self.unit.substitution(*sym) {
                    Place::Local(name.to_string())
                } else if symbols.is_member_var(*sym) {
                    Place::Member {
                        recv: None,
                        var: *sym,
                    }
                } else {
                    Place::Local(self.symbol(*sym)?.name.clone())
                };
                Ok(Resolved {
                    place,
                    preface: Vec::new(),
                    deps: Dependencies::default(),
                })
            }
            NodeKind::Select { receiver, member } if symbols.is_member_var(*member) => {
                let recv_node = self.node(*receiver)?;
                let class_ref = matches!(recv_node.kind, NodeKind::Ident(s) if symbols.is_class(s));
                if class_ref || self.symbol(*member)?.is_static() {
                    let (preface, deps) = if class_ref {
                        (Vec::new(), Dependencies::default())
                    } else {
                        let effects = self.stmts(ctx, *receiver)?;
                        (effects.stmts, effects.deps)
                    };
                    return Ok(Resolved {
                        place: Place::Member {
                            recv: None,
                            var: *member,
                        },
                        preface,
                        deps,
                    });
                }
                if matches!(recv_node.kind, NodeKind::This | NodeKind::Super) {
                    return Ok(Resolved {
                        place: Place::Member {
                            recv: Some(self.this_value(ctx)),
                            var: *member,
                        },
                        preface: Vec::new(),
                        deps: Dependencies::default(),
                    });
                }
                let recv = self.expr(ctx, *receiver, None)?;
                let (preface, recv, deps) = self.settle(recv, "recv")?;
                Ok(Resolved {
                    place: Place::Member {
                        recv: Some(recv),
                        var: *member,
                    },
                    preface,
                    deps,
                })
            }
            NodeKind::Indexed { seq, index } => {
                let seq_ty = self.node(*seq)?.ty;
                if self.program().types.is_array(seq_ty) {
                    let array = self.expr(ctx, *seq, None)?;
                    let (mut preface, array, deps) = self.settle(array, "arr")?;
                    let index = self.expr(ctx, *index, Some(TypeId::INT))?;
                    let (index_preface, index, index_deps) = self.settle(index, "idx")?;
                    preface.extend(index_preface);
                    return Ok(Resolved {
                        place: Place::ArrayElement { array, index },
                        preface,
                        deps: deps.combine(index_deps),
                    });
                }
                let Resolved {
                    place: inner,
                    mut preface,
                    deps,
                } = self.resolve_place(ctx, *seq)?;
                let index = self.expr(ctx, *index, Some(TypeId::INT))?;
                let (index_preface, index, index_deps) = self.settle(index, "idx")?;
                preface.extend(index_preface);
                let place = match inner {
                    Place::Member { recv, var } if self.is_in_place_sequence(var) => {
                        let recv = match recv {
                            Some(recv) => recv,
                            None => {
                                let owner = self.member_owner(var)?;
                                self.implicit_receiver(ctx, owner)
                            }
                        };
                        Place::MemberElement { recv, var, index }
                    }
                    other => Place::ValueElement {
                        seq: Box::new(other),
                        index,
                    },
                };
                Ok(Resolved {
                    place,
                    preface,
                    deps: deps.combine(index_deps),
                })
            }
            other => Err(LowerError::unsupported(format!(
                "assignment to a {}",
                other.tag()
            ))),
        }
    }

    pub(crate) fn read_place(
        &mut self,
        ctx: &TranslationContext,
        place: &Place,
    ) -> LowerResult<JNode> {
        Ok(match place {
            Place::Local(name) => JNode::id(name.clone()),
            Place::Member { recv, var } => self.member_read(ctx, recv.clone(), *var)?,
            Place::ArrayElement { array, index } => JNode::index(array.clone(), index.clone()),
            Place::MemberElement { recv, var, index } => {
                let seq = self.member_read(ctx, Some(recv.clone()), *var)?;
                self.runtime_call(RuntimeMethod::SeqGet, vec![seq, index.clone()])
            }
            Place::ValueElement { seq, index } => {
                let seq = self.read_place(ctx, seq)?;
                self.runtime_call(RuntimeMethod::SeqGet, vec![seq, index.clone()])
            }
        })
    }

    pub(crate) fn write_place(
        &mut self,
        ctx: &TranslationContext,
        place: &Place,
        value: JNode,
    ) -> LowerResult<JNode> {
        Ok(match place {
            Place::Local(name) => JNode::assign(JNode::id(name.clone()), value),
            Place::Member { recv, var } => self.member_write(ctx, recv.clone(), *var, value)?,
            Place::ArrayElement { array, index } => {
                JNode::assign(JNode::index(array.clone(), index.clone()), value)
            }
            Place::MemberElement { recv, var, index } => {
                let offset = self.offset_ref(ctx, recv, *var)?;
                self.runtime_call(
                    RuntimeMethod::SeqSetElement,
                    vec![recv.clone(), offset, index.clone(), value],
                )
            }
            Place::ValueElement { seq, index } => {
                let current = self.read_place(ctx, seq)?;
                let replaced = self.runtime_call(
                    RuntimeMethod::SeqReplaceElement,
                    vec![current, index.clone(), value],
                );
                self.write_place(ctx, seq, replaced)?
            }
        })
    }

    /// Whether the store expression itself evaluates to the stored value.
    pub(crate) fn write_yields_value(&self, place: &Place) -> bool {
        match place {
            Place::Local(_) | Place::ArrayElement { .. } => true,
            Place::Member { var, .. } => !self.is_in_place_sequence(*var),
            Place::MemberElement { .. } | Place::ValueElement { .. } => false,
        }
    }

    /// Store an already-translated value and deliver the stored value.
    pub(super) fn store(
        &mut self,
        ctx: &TranslationContext,
        resolved: Resolved,
        value: ExpressionResult,
        ty: TypeId,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let Resolved {
            place,
            mut preface,
            deps,
        } = resolved;
        let deps = deps.combine(value.deps.clone());
        let (value_preface, value) = value.split()?;
        preface.extend(value_preface);

        let wants_value = !matches!(yld, Yield::ToStatement(Sink::Discard));
        if self.write_yields_value(&place) || !wants_value {
            let write = self.write_place(ctx, &place, value)?;
            let expr = if wants_value {
                ExpressionResult {
                    preface,
                    value: Some(write),
                    ty,
                    deps,
                }
            } else {
                preface.push(JNode::expr_stmt(write));
                ExpressionResult::void(preface).with_deps(deps)
            };
            return self.finish_expr(expr, target, yld);
        }

        let inline = value.is_literal() && self.options().inline_literal_rhs;
        let stored = if inline {
            value
        } else {
            let tmp = self.fresh_temp("val");
            preface.push(JNode::local(self.java_type(ty), tmp.clone(), Some(value)));
            JNode::id(tmp)
        };
        let write = self.write_place(ctx, &place, stored.clone())?;
        preface.push(JNode::expr_stmt(write));
        let expr = ExpressionResult {
            preface,
            value: Some(stored),
            ty,
            deps,
        };
        self.finish_expr(expr, target, yld)
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    pub(super) fn assign(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        lhs: NodeIndex,
        value: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let resolved = self.resolve_place(ctx, lhs)?;
        let value = self.expr(ctx, value, Some(node.ty))?;
        self.store(ctx, resolved, value, node.ty, target, yld)
    }

    /// `x op= v`. Plain locals and array elements of primitive or string
    /// type keep the native operator; everything else reads, combines and
    /// stores. The target is read before any statement of `v` runs.
    pub(super) fn compound_assign(
        &mut self,
        ctx: &TranslationContext,
        node: &Node,
        op: BinaryOp,
        lhs: NodeIndex,
        value: NodeIndex,
        target: Option<TypeId>,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let resolved = self.resolve_place(ctx, lhs)?;
        let rhs = self.expr(ctx, value, None)?;
        let rhs_effects = !rhs.preface.is_empty();
        let types = &self.program().types;
        let native = (types.is_primitive(node.ty) || types.is_string(node.ty))
            && !types.is_duration(node.ty)
            && !rhs_effects
            && matches!(resolved.place, Place::Local(_) | Place::ArrayElement { .. });

        if native {
            let Resolved {
                place,
                mut preface,
                deps,
            } = resolved;
            let deps = deps.combine(rhs.deps.clone());
            let (rhs_preface, rhs) = rhs.split()?;
            preface.extend(rhs_preface);
            let lvalue = match place {
                Place::Local(name) => JNode::id(name),
                Place::ArrayElement { array, index } => JNode::index(array, index),
                _ => return Err(LowerError::internal("native compound assignment target")),
            };
            let expr = ExpressionResult {
                preface,
                value: Some(JNode::CompoundAssign {
                    op: compound_op(op)?,
                    target: Box::new(lvalue),
                    value: Box::new(rhs),
                }),
                ty: node.ty,
                deps,
            };
            return self.finish_expr(expr, target, yld);
        }

        let mut preface = Vec::new();
        let mut current = self.read_place(ctx, &resolved.place)?;
        if rhs_effects {
            let tmp = self.fresh_temp("cur");
            preface.push(JNode::local(self.java_type(node.ty), tmp.clone(), Some(current)));
            current = JNode::id(tmp);
        }
        let rhs_ty = rhs.ty;
        let rhs_deps = rhs.deps.clone();
        let (rhs_preface, rhs) = rhs.split()?;
        preface.extend(rhs_preface);
        let combined = self.apply_binary(op, current, node.ty, rhs, rhs_ty)?;
        let combined = self.narrow_to(combined, node.ty, rhs_ty);
        let new_value = ExpressionResult {
            preface,
            value: Some(combined),
            ty: node.ty,
            deps: rhs_deps,
        };
        self.store(ctx, resolved, new_value, node.ty, target, yld)
    }

    /// Cast an arithmetic result back to the variable's type when Java
    /// would have widened it.
    pub(crate) fn narrow_to(&self, value: JNode, var_ty: TypeId, operand_ty: TypeId) -> JNode {
        let types = &self.program().types;
        let int_rank = types.numeric_rank(TypeId::INT).unwrap_or(0);
        let needs_cast = if types.is_char(var_ty) {
            true
        } else {
            match (types.numeric_rank(var_ty), types.numeric_rank(operand_ty)) {
                (Some(var), Some(operand)) => var < operand.max(int_rank),
                (Some(var), None) => var < int_rank,
                _ => false,
            }
        };
        if needs_cast {
            JNode::cast(self.java_type(var_ty), JNode::paren(value))
        } else {
            value
        }
    }

    // =========================================================================
    // Insert / delete
    // =========================================================================

    /// The explicit receiver of an in-place sequence place.
    fn in_place_receiver(
        &mut self,
        ctx: &TranslationContext,
        place: &Place,
    ) -> LowerResult<Option<(JNode, SymbolId)>> {
        let Place::Member { recv, var } = place else {
            return Ok(None);
        };
        if !self.is_in_place_sequence(*var) {
            return Ok(None);
        }
        let recv = match recv {
            Some(recv) => recv.clone(),
            None => {
                let owner = self.member_owner(*var)?;
                self.implicit_receiver(ctx, owner)
            }
        };
        Ok(Some((recv, *var)))
    }

    pub(super) fn insert(
        &mut self,
        ctx: &TranslationContext,
        seq: NodeIndex,
        value: NodeIndex,
        position: InsertPosition,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let seq_ty = self.node(seq)?.ty;
        let Resolved {
            place,
            mut preface,
            mut deps,
        } = self.resolve_place(ctx, seq)?;

        let value_ty = self.node(value)?.ty;
        let value_target = if self.is_sequence(value_ty) {
            seq_ty
        } else {
            self.element_type(seq_ty)
        };
        let mut operands = vec![self.expr(ctx, value, Some(value_target))?];
        let position_index = match position {
            InsertPosition::Into => None,
            InsertPosition::Before(idx) | InsertPosition::After(idx) => Some(idx),
        };
        if let Some(idx) = position_index {
            operands.push(self.expr(ctx, idx, Some(TypeId::INT))?);
        }
        let (operand_preface, args, operand_deps) = self.sequence_operands(operands)?;
        preface.extend(operand_preface);
        deps = deps.combine(operand_deps);

        let stmt = if let Some((recv, var)) = self.in_place_receiver(ctx, &place)? {
            let method = match position {
                InsertPosition::Into => RuntimeMethod::SeqInsert,
                InsertPosition::Before(_) => RuntimeMethod::SeqInsertBefore,
                InsertPosition::After(_) => RuntimeMethod::SeqInsertAfter,
            };
            let offset = self.offset_ref(ctx, &recv, var)?;
            let mut call_args = vec![recv, offset];
            call_args.extend(args);
            self.runtime_call(method, call_args)
        } else {
            let method = match position {
                InsertPosition::Into => RuntimeMethod::SeqWithInserted,
                InsertPosition::Before(_) => RuntimeMethod::SeqWithInsertedBefore,
                InsertPosition::After(_) => RuntimeMethod::SeqWithInsertedAfter,
            };
            let mut call_args = vec![self.read_place(ctx, &place)?];
            call_args.extend(args);
            let updated = self.runtime_call(method, call_args);
            self.write_place(ctx, &place, updated)?
        };
        preface.push(JNode::expr_stmt(stmt));
        self.finish_stmts(StatementsResult { stmts: preface, deps }, yld)
    }

    pub(super) fn delete(
        &mut self,
        ctx: &TranslationContext,
        seq: NodeIndex,
        what: DeleteTarget,
        yld: &Yield,
    ) -> LowerResult<TranslationResult> {
        let seq_ty = self.node(seq)?.ty;
        let elem = self.element_type(seq_ty);
        let Resolved {
            place,
            mut preface,
            mut deps,
        } = self.resolve_place(ctx, seq)?;

        let arg = match what {
            DeleteTarget::All => None,
            DeleteTarget::Index(idx) => Some(self.expr(ctx, idx, Some(TypeId::INT))?),
            DeleteTarget::Value(idx) => Some(self.expr(ctx, idx, Some(elem))?),
        };
        let arg = match arg {
            Some(arg) => {
                deps = deps.combine(arg.deps.clone());
                let (arg_preface, arg) = arg.split()?;
                preface.extend(arg_preface);
                Some(arg)
            }
            None => None,
        };

        let stmt = if let Some((recv, var)) = self.in_place_receiver(ctx, &place)? {
            let offset = self.offset_ref(ctx, &recv, var)?;
            let method = match what {
                DeleteTarget::All => RuntimeMethod::SeqDeleteAll,
                DeleteTarget::Index(_) => RuntimeMethod::SeqDeleteIndexed,
                DeleteTarget::Value(_) => RuntimeMethod::SeqDeleteValue,
            };
            let mut call_args = vec![recv, offset];
            call_args.extend(arg);
            self.runtime_call(method, call_args)
        } else {
            let updated = match (what, arg) {
                (DeleteTarget::Index(_), Some(arg)) => {
                    let current = self.read_place(ctx, &place)?;
                    self.runtime_call(RuntimeMethod::SeqWithDeletedIndex, vec![current, arg])
                }
                (DeleteTarget::Value(_), Some(arg)) => {
                    let current = self.read_place(ctx, &place)?;
                    self.runtime_call(RuntimeMethod::SeqWithDeletedValue, vec![current, arg])
                }
                _ => typemorph::empty_sequence(self.program(), elem),
            };
            self.write_place(ctx, &place, updated)?
        };
        preface.push(JNode::expr_stmt(stmt));
        self.finish_stmts(StatementsResult { stmts: preface, deps }, yld)
    }
}

fn compound_op(op: BinaryOp) -> LowerResult<JBinaryOp> {
    Ok(match op {
        BinaryOp::Add => JBinaryOp::Add,
        BinaryOp::Sub => JBinaryOp::Sub,
        BinaryOp::Mul => JBinaryOp::Mul,
        BinaryOp::Div => JBinaryOp::Div,
        BinaryOp::Mod => JBinaryOp::Rem,
        other => {
            return Err(LowerError::internal(format!(
                "{}= is not a compound assignment",
                other.symbol()
            )));
        }
    })
}
