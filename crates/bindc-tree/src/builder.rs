//! Programmatic construction of attributed trees.
//!
//! `TreeBuilder` is what a front-end (or a test) uses to produce a
//! [`Program`]. It creates symbols and nodes together and fills in the
//! attributes an attribution pass would: node types derived from symbols and
//! operands, class member lists, and `VarData` recorded from declarations.

use crate::Program;
use crate::node::{
    BinaryOp, CatchClause, ClassDecl, DeleteTarget, FunctionDef, InClause, InsertPosition,
    Literal, NodeArena, NodeIndex, NodeKind, ObjectLiteralPart, OnReplace, OverrideVar, Script,
    UnaryOp, VarDecl,
};
use crate::symbols::{
    BindStatus, ClassData, FunctionData, Symbol, SymbolFlags, SymbolId, SymbolKind, SymbolTable,
    VarData,
};
use crate::types::{TypeId, TypeKind, TypeTable};

#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: NodeArena,
    symbols: SymbolTable,
    types: TypeTable,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn types(&self) -> &TypeTable {
        &self.types
    }

    pub const fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn type_of(&self, idx: NodeIndex) -> TypeId {
        self.arena.get(idx).map_or(TypeId::VOID, |node| node.ty)
    }

    pub fn finish(self, root: NodeIndex) -> Program {
        Program {
            arena: self.arena,
            symbols: self.symbols,
            types: self.types,
            root,
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn seq(&mut self, elem: TypeId) -> TypeId {
        self.types.sequence_of(elem)
    }

    pub fn array(&mut self, elem: TypeId) -> TypeId {
        self.types.array_of(elem)
    }

    pub fn class_type(&mut self, class: SymbolId) -> TypeId {
        self.types.class(class)
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    fn push_member(&mut self, owner: SymbolId, member: SymbolId) {
        if let Some(Symbol {
            kind: SymbolKind::Class(data),
            ..
        }) = self.symbols.get_mut(owner)
        {
            data.members.push(member);
        }
    }

    /// Declare a class. Nested classes are recorded as members of their owner.
    pub fn class(&mut self, name: &str, owner: Option<SymbolId>, flags: SymbolFlags) -> SymbolId {
        let id = self.symbols.add(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Class(ClassData::default()),
            owner,
            flags,
            ty: TypeId::VOID,
        });
        let ty = self.types.class(id);
        if let Some(sym) = self.symbols.get_mut(id) {
            sym.ty = ty;
        }
        if let Some(owner) = owner {
            self.push_member(owner, id);
        }
        id
    }

    pub fn extends(&mut self, class: SymbolId, superclass: SymbolId) {
        if let Some(Symbol {
            kind: SymbolKind::Class(data),
            ..
        }) = self.symbols.get_mut(class)
        {
            data.superclass = Some(superclass);
        }
    }

    /// Add a mixin or interface supertype.
    pub fn implements(&mut self, class: SymbolId, supertype: SymbolId) {
        if let Some(Symbol {
            kind: SymbolKind::Class(data),
            ..
        }) = self.symbols.get_mut(class)
        {
            data.supertypes.push(supertype);
        }
    }

    pub fn var(&mut self, owner: SymbolId, name: &str, ty: TypeId, flags: SymbolFlags) -> SymbolId {
        let id = self.symbols.add(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Var(VarData::default()),
            owner: Some(owner),
            flags,
            ty,
        });
        self.push_member(owner, id);
        id
    }

    /// Declare a function with its parameters; the symbol's type is the
    /// function type.
    pub fn function(
        &mut self,
        owner: SymbolId,
        name: &str,
        params: &[(&str, TypeId)],
        ret: TypeId,
        flags: SymbolFlags,
    ) -> SymbolId {
        let fn_ty = self
            .types
            .function(params.iter().map(|(_, ty)| *ty).collect(), ret);
        let id = self.symbols.add(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function(FunctionData::default()),
            owner: Some(owner),
            flags,
            ty: fn_ty,
        });
        let param_ids: Vec<SymbolId> = params
            .iter()
            .map(|(pname, pty)| {
                self.symbols.add(Symbol {
                    name: (*pname).to_string(),
                    kind: SymbolKind::Param,
                    owner: Some(id),
                    flags: SymbolFlags::empty(),
                    ty: *pty,
                })
            })
            .collect();
        if let Some(Symbol {
            kind: SymbolKind::Function(data),
            ..
        }) = self.symbols.get_mut(id)
        {
            data.params = param_ids;
            data.ret = ret;
        }
        if self.symbols.is_class(owner) {
            self.push_member(owner, id);
        }
        id
    }

    pub fn params(&self, function: SymbolId) -> Vec<SymbolId> {
        self.symbols
            .get(function)
            .and_then(Symbol::function_data)
            .map(|data| data.params.clone())
            .unwrap_or_default()
    }

    /// A local variable owned by a function, block owner or class body.
    pub fn local(&mut self, owner: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        self.symbols.add(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Local,
            owner: Some(owner),
            flags: SymbolFlags::empty(),
            ty,
        })
    }

    pub fn add_flags(&mut self, sym: SymbolId, flags: SymbolFlags) {
        if let Some(symbol) = self.symbols.get_mut(sym) {
            symbol.flags |= flags;
        }
    }

    fn record_var_data(&mut self, sym: SymbolId, has_initializer: bool, bind: BindStatus, has_trigger: bool) {
        if let Some(Symbol {
            kind: SymbolKind::Var(data),
            ..
        }) = self.symbols.get_mut(sym)
        {
            *data = VarData {
                has_initializer,
                bind,
                has_trigger,
            };
        }
    }

    // =========================================================================
    // Nodes: leaves
    // =========================================================================

    pub fn node(&mut self, kind: NodeKind, ty: TypeId) -> NodeIndex {
        self.arena.add(kind, ty)
    }

    pub fn int(&mut self, value: i32) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Int(value)), TypeId::INT)
    }

    pub fn long(&mut self, value: i64) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Long(value)), TypeId::LONG)
    }

    pub fn float(&mut self, value: f32) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Float(value)), TypeId::FLOAT)
    }

    pub fn double(&mut self, value: f64) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Double(value)), TypeId::DOUBLE)
    }

    pub fn boolean(&mut self, value: bool) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Boolean(value)), TypeId::BOOLEAN)
    }

    pub fn char(&mut self, value: char) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Char(value)), TypeId::CHAR)
    }

    pub fn string(&mut self, value: &str) -> NodeIndex {
        self.node(
            NodeKind::Literal(Literal::String(value.to_string())),
            TypeId::STRING,
        )
    }

    pub fn null(&mut self) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Null), TypeId::NULL)
    }

    pub fn duration(&mut self, millis: f64) -> NodeIndex {
        self.node(NodeKind::Literal(Literal::Duration(millis)), TypeId::DURATION)
    }

    pub fn ident(&mut self, sym: SymbolId) -> NodeIndex {
        let ty = self.symbols.get(sym).map_or(TypeId::OBJECT, |s| s.ty);
        self.node(NodeKind::Ident(sym), ty)
    }

    pub fn this(&mut self, class: SymbolId) -> NodeIndex {
        let ty = self.types.class(class);
        self.node(NodeKind::This, ty)
    }

    pub fn super_of(&mut self, class: SymbolId) -> NodeIndex {
        let superclass = self
            .symbols
            .get(class)
            .and_then(Symbol::class_data)
            .and_then(|data| data.superclass);
        let ty = superclass.map_or(TypeId::OBJECT, |sup| self.types.class(sup));
        self.node(NodeKind::Super, ty)
    }

    // =========================================================================
    // Nodes: expressions
    // =========================================================================

    pub fn select(&mut self, receiver: NodeIndex, member: SymbolId) -> NodeIndex {
        let ty = self.symbols.get(member).map_or(TypeId::OBJECT, |s| s.ty);
        self.node(NodeKind::Select { receiver, member }, ty)
    }

    /// Call through any callee; the node type is the callee's return type.
    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        let callee_ty = self.type_of(callee);
        let ty = self
            .types
            .function_signature(callee_ty)
            .map_or(TypeId::OBJECT, |(_, ret)| ret);
        self.node(NodeKind::Call { callee, args }, ty)
    }

    /// Call a function symbol by name (unqualified).
    pub fn call_fn(&mut self, function: SymbolId, args: Vec<NodeIndex>) -> NodeIndex {
        let callee = self.ident(function);
        self.call(callee, args)
    }

    /// Call a method on an explicit receiver.
    pub fn call_method(
        &mut self,
        receiver: NodeIndex,
        function: SymbolId,
        args: Vec<NodeIndex>,
    ) -> NodeIndex {
        let callee = self.select(receiver, function);
        self.call(callee, args)
    }

    fn arithmetic_type(&self, op: BinaryOp, left: TypeId, right: TypeId) -> TypeId {
        if op.is_comparison() || matches!(op, BinaryOp::And | BinaryOp::Or) {
            return TypeId::BOOLEAN;
        }
        let types = &self.types;
        if types.is_duration(left) || types.is_duration(right) {
            if op == BinaryOp::Div && types.is_duration(left) && types.is_duration(right) {
                return TypeId::DOUBLE;
            }
            return TypeId::DURATION;
        }
        if op == BinaryOp::Add && (types.is_string(left) || types.is_string(right)) {
            return TypeId::STRING;
        }
        match (types.numeric_rank(left), types.numeric_rank(right)) {
            (Some(l), Some(r)) => {
                let wider = if l >= r { left } else { right };
                // byte and short arithmetic promotes to int
                if types.numeric_rank(wider).is_some_and(|rank| rank < 3) {
                    TypeId::INT
                } else {
                    wider
                }
            }
            _ => left,
        }
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        let ty = self.arithmetic_type(op, self.type_of(left), self.type_of(right));
        self.node(NodeKind::Binary { op, left, right }, ty)
    }

    pub fn binary_typed(
        &mut self,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        ty: TypeId,
    ) -> NodeIndex {
        self.node(NodeKind::Binary { op, left, right }, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        let ty = match op {
            UnaryOp::Not => TypeId::BOOLEAN,
            UnaryOp::SizeOf => TypeId::INT,
            _ => self.type_of(operand),
        };
        self.node(NodeKind::Unary { op, operand }, ty)
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        let ty = self.type_of(target);
        self.node(NodeKind::Assign { target, value }, ty)
    }

    pub fn compound_assign(&mut self, op: BinaryOp, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        let ty = self.type_of(target);
        self.node(NodeKind::CompoundAssign { op, target, value }, ty)
    }

    pub fn cast(&mut self, expr: NodeIndex, ty: TypeId) -> NodeIndex {
        self.node(NodeKind::Cast(expr), ty)
    }

    pub fn instance_of(&mut self, expr: NodeIndex, class: TypeId) -> NodeIndex {
        self.node(NodeKind::InstanceOf { expr, class }, TypeId::BOOLEAN)
    }

    pub fn string_expr(&mut self, parts: Vec<NodeIndex>) -> NodeIndex {
        self.node(NodeKind::StringExpr(parts), TypeId::STRING)
    }

    pub fn new_array(&mut self, elem: TypeId, size: NodeIndex) -> NodeIndex {
        let ty = self.types.array_of(elem);
        self.node(NodeKind::NewArray { elem, size }, ty)
    }

    // =========================================================================
    // Nodes: sequences
    // =========================================================================

    pub fn empty_seq(&mut self, elem: TypeId) -> NodeIndex {
        let ty = self.types.sequence_of(elem);
        self.node(NodeKind::EmptySequence, ty)
    }

    pub fn explicit_seq(&mut self, elem: TypeId, items: Vec<NodeIndex>) -> NodeIndex {
        let ty = self.types.sequence_of(elem);
        self.node(NodeKind::ExplicitSequence(items), ty)
    }

    pub fn range(
        &mut self,
        lower: NodeIndex,
        upper: NodeIndex,
        step: Option<NodeIndex>,
        exclusive: bool,
    ) -> NodeIndex {
        let elem = self.arithmetic_type(BinaryOp::Add, self.type_of(lower), self.type_of(upper));
        let ty = self.types.sequence_of(elem);
        self.node(
            NodeKind::Range {
                lower,
                upper,
                step,
                exclusive,
            },
            ty,
        )
    }

    pub fn indexed(&mut self, seq: NodeIndex, index: NodeIndex) -> NodeIndex {
        let seq_ty = self.type_of(seq);
        let ty = self.types.element_type(seq_ty).unwrap_or(TypeId::OBJECT);
        self.node(NodeKind::Indexed { seq, index }, ty)
    }

    pub fn slice(
        &mut self,
        seq: NodeIndex,
        start: NodeIndex,
        end: Option<NodeIndex>,
        end_exclusive: bool,
    ) -> NodeIndex {
        let ty = self.type_of(seq);
        self.node(
            NodeKind::Slice {
                seq,
                start,
                end,
                end_exclusive,
            },
            ty,
        )
    }

    pub fn insert(&mut self, seq: NodeIndex, value: NodeIndex, position: InsertPosition) -> NodeIndex {
        self.node(
            NodeKind::Insert {
                seq,
                value,
                position,
            },
            TypeId::VOID,
        )
    }

    pub fn delete(&mut self, seq: NodeIndex, target: DeleteTarget) -> NodeIndex {
        self.node(NodeKind::Delete { seq, target }, TypeId::VOID)
    }

    pub fn index_of(&mut self, var: SymbolId) -> NodeIndex {
        self.node(NodeKind::IndexOf(var), TypeId::INT)
    }

    // =========================================================================
    // Nodes: control flow
    // =========================================================================

    /// `for (var in seq where filter) body`; a non-void body makes the loop a
    /// comprehension producing a sequence of the body's type.
    pub fn for_in(&mut self, clauses: Vec<InClause>, body: NodeIndex) -> NodeIndex {
        let body_ty = self.type_of(body);
        let ty = if self.types.is_void(body_ty) {
            TypeId::VOID
        } else if self.types.is_sequence(body_ty) {
            body_ty
        } else {
            self.types.sequence_of(body_ty)
        };
        self.node(NodeKind::For { clauses, body }, ty)
    }

    pub fn in_clause(var: SymbolId, seq: NodeIndex, filter: Option<NodeIndex>) -> InClause {
        InClause { var, seq, filter }
    }

    pub fn if_(
        &mut self,
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    ) -> NodeIndex {
        let ty = if else_branch.is_some() {
            self.type_of(then_branch)
        } else {
            TypeId::VOID
        };
        self.node(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            ty,
        )
    }

    pub fn while_(&mut self, cond: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.node(NodeKind::While { cond, body }, TypeId::VOID)
    }

    pub fn try_(
        &mut self,
        body: NodeIndex,
        catches: Vec<CatchClause>,
        finally: Option<NodeIndex>,
    ) -> NodeIndex {
        let ty = self.type_of(body);
        self.node(
            NodeKind::Try {
                body,
                catches,
                finally,
            },
            ty,
        )
    }

    pub fn throw(&mut self, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Throw(expr), TypeId::VOID)
    }

    pub fn ret(&mut self, expr: Option<NodeIndex>) -> NodeIndex {
        self.node(NodeKind::Return(expr), TypeId::VOID)
    }

    pub fn break_(&mut self) -> NodeIndex {
        self.node(NodeKind::Break, TypeId::VOID)
    }

    pub fn continue_(&mut self) -> NodeIndex {
        self.node(NodeKind::Continue, TypeId::VOID)
    }

    pub fn block(&mut self, stmts: Vec<NodeIndex>, value: Option<NodeIndex>) -> NodeIndex {
        let ty = value.map_or(TypeId::VOID, |v| self.type_of(v));
        self.node(NodeKind::Block { stmts, value }, ty)
    }

    // =========================================================================
    // Nodes: instantiation
    // =========================================================================

    /// Object literal `C { var: value, ... }` with unbound parts.
    pub fn object_literal(&mut self, class: SymbolId, parts: Vec<(SymbolId, NodeIndex)>) -> NodeIndex {
        let parts = parts
            .into_iter()
            .map(|(var, value)| ObjectLiteralPart {
                var,
                value,
                bind: BindStatus::Unbound,
            })
            .collect();
        self.instantiate(class, Vec::new(), parts, None)
    }

    pub fn instantiate(
        &mut self,
        class: SymbolId,
        args: Vec<NodeIndex>,
        parts: Vec<ObjectLiteralPart>,
        body: Option<NodeIndex>,
    ) -> NodeIndex {
        let ty = self.types.class(class);
        self.node(
            NodeKind::Instantiate {
                class,
                args,
                parts,
                body,
            },
            ty,
        )
    }

    // =========================================================================
    // Nodes: declarations
    // =========================================================================

    pub fn var_decl(&mut self, sym: SymbolId, init: Option<NodeIndex>, bind: BindStatus) -> NodeIndex {
        self.var_decl_with(VarDecl {
            sym,
            init,
            bind,
            on_replace: None,
            on_invalidate: None,
        })
    }

    pub fn var_decl_with(&mut self, decl: VarDecl) -> NodeIndex {
        let has_trigger = decl.on_replace.is_some() || decl.on_invalidate.is_some();
        self.record_var_data(decl.sym, decl.init.is_some(), decl.bind, has_trigger);
        self.node(NodeKind::VarDecl(decl), TypeId::VOID)
    }

    pub fn on_replace(body: NodeIndex) -> OnReplace {
        OnReplace {
            old_value: None,
            first_index: None,
            last_index: None,
            new_elements: None,
            body,
        }
    }

    /// Override an inherited variable in `class`; creates the override's own
    /// symbol with the inherited name and type.
    pub fn override_var(
        &mut self,
        class: SymbolId,
        overridden: SymbolId,
        init: Option<NodeIndex>,
        bind: BindStatus,
        on_replace: Option<OnReplace>,
    ) -> NodeIndex {
        let (name, ty) = self
            .symbols
            .get(overridden)
            .map_or((String::new(), TypeId::OBJECT), |s| (s.name.clone(), s.ty));
        let sym = self.symbols.add(Symbol {
            name,
            kind: SymbolKind::Var(VarData::default()),
            owner: Some(class),
            flags: SymbolFlags::empty(),
            ty,
        });
        let has_trigger = on_replace.is_some();
        self.record_var_data(sym, init.is_some(), bind, has_trigger);
        self.node(
            NodeKind::OverrideVar(OverrideVar {
                sym,
                overridden,
                init,
                bind,
                on_replace,
                on_invalidate: None,
            }),
            TypeId::VOID,
        )
    }

    pub fn function_def(&mut self, sym: SymbolId, body: Option<NodeIndex>) -> NodeIndex {
        let params = self.params(sym);
        self.node(
            NodeKind::FunctionDef(FunctionDef { sym, params, body }),
            TypeId::VOID,
        )
    }

    /// Anonymous function value `function(params) { body }`.
    pub fn function_value(&mut self, def: NodeIndex) -> NodeIndex {
        let ty = match self.arena.get(def).map(|n| &n.kind) {
            Some(NodeKind::FunctionDef(f)) => self.symbols.get(f.sym).map_or(TypeId::OBJECT, |s| s.ty),
            _ => TypeId::OBJECT,
        };
        self.node(NodeKind::FunctionValue(def), ty)
    }

    pub fn class_decl(&mut self, sym: SymbolId, members: Vec<NodeIndex>) -> NodeIndex {
        self.node(NodeKind::ClassDecl(ClassDecl { sym, members }), TypeId::VOID)
    }

    pub fn init_block(&mut self, body: NodeIndex) -> NodeIndex {
        self.node(NodeKind::InitBlock(body), TypeId::VOID)
    }

    pub fn postinit_block(&mut self, body: NodeIndex) -> NodeIndex {
        self.node(NodeKind::PostInitBlock(body), TypeId::VOID)
    }

    pub fn script(&mut self, sym: SymbolId, package: Option<&str>, members: Vec<NodeIndex>) -> NodeIndex {
        self.node(
            NodeKind::Script(Script {
                sym,
                package: package.map(str::to_string),
                members,
            }),
            TypeId::VOID,
        )
    }

    /// Convenience: is this type a plain class instance type?
    pub fn is_class_type(&self, ty: TypeId) -> bool {
        matches!(self.types.kind(ty), TypeKind::Class(_))
    }
}
