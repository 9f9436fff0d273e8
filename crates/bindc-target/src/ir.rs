//! Target tree for lowered code.
//!
//! The lowering core produces `JNode` trees instead of text. A node is an
//! expression, a statement or a declaration of the target language; the
//! external code generator (or [`crate::JPrinter`] for debugging) walks the
//! tree and serializes it.
//!
//! # Structure
//!
//! - Expressions: literals, names, member selects, calls, object and array
//!   creation, operators, conditionals, assignments, casts.
//! - Statements: locals, expression statements, control flow, `switch`,
//!   `try`, comments.
//! - Declarations: fields, methods, classes and interfaces, and the
//!   compilation unit that holds them.
//!
//! Constructors are methods named [`JMethod::CONSTRUCTOR`]; the printer
//! renders them with the enclosing class name.

use bitflags::bitflags;

// =============================================================================
// Types and modifiers
// =============================================================================

/// Target-language type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JType {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Class or interface type, optionally generic: `Sequence<Integer>`.
    Named { name: String, args: Vec<JType> },
    Array(Box<JType>),
}

impl JType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    pub fn object() -> Self {
        Self::named("Object")
    }

    pub fn string() -> Self {
        Self::named("String")
    }

    pub fn array(elem: Self) -> Self {
        Self::Array(Box::new(elem))
    }

    /// Visit every class name in this type, generic arguments included.
    pub fn for_each_name<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Named { name, args } => {
                f(name);
                args.iter().for_each(|arg| arg.for_each_name(f));
            }
            Self::Array(elem) => elem.for_each_name(f),
            _ => {}
        }
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Boolean
                | Self::Char
                | Self::Byte
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
        )
    }

    /// Reference counterpart of a primitive type; other types unchanged.
    pub fn boxed(&self) -> Self {
        match self {
            Self::Boolean => Self::named("Boolean"),
            Self::Char => Self::named("Character"),
            Self::Byte => Self::named("Byte"),
            Self::Short => Self::named("Short"),
            Self::Int => Self::named("Integer"),
            Self::Long => Self::named("Long"),
            Self::Float => Self::named("Float"),
            Self::Double => Self::named("Double"),
            Self::Void => Self::named("Void"),
            other => other.clone(),
        }
    }

    /// Base name without type arguments; primitives use their keyword.
    pub fn base_name(&self) -> String {
        match self {
            Self::Void => "void".into(),
            Self::Boolean => "boolean".into(),
            Self::Char => "char".into(),
            Self::Byte => "byte".into(),
            Self::Short => "short".into(),
            Self::Int => "int".into(),
            Self::Long => "long".into(),
            Self::Float => "float".into(),
            Self::Double => "double".into(),
            Self::Named { name, .. } => name.clone(),
            Self::Array(elem) => format!("{}[]", elem.base_name()),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JModifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
    }
}

// =============================================================================
// Operators and literals
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum JLiteral {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl JBinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// The comparison that is true exactly when this one is false.
    pub const fn negated(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Ne),
            Self::Ne => Some(Self::Eq),
            Self::Lt => Some(Self::Ge),
            Self::Le => Some(Self::Gt),
            Self::Gt => Some(Self::Le),
            Self::Ge => Some(Self::Lt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JUnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

// =============================================================================
// Declaration records
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct JParam {
    pub ty: JType,
    pub name: String,
}

impl JParam {
    pub fn new(ty: JType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JField {
    pub modifiers: JModifiers,
    pub ty: JType,
    pub name: String,
    pub init: Option<Box<JNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JMethod {
    pub modifiers: JModifiers,
    pub ret: JType,
    pub name: String,
    pub params: Vec<JParam>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<JNode>>,
}

impl JMethod {
    pub const CONSTRUCTOR: &'static str = "<init>";
    pub const STATIC_INITIALIZER: &'static str = "<clinit>";

    pub fn new(
        modifiers: JModifiers,
        ret: JType,
        name: impl Into<String>,
        params: Vec<JParam>,
        body: Vec<JNode>,
    ) -> Self {
        Self {
            modifiers,
            ret,
            name: name.into(),
            params,
            body: Some(body),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == Self::CONSTRUCTOR
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == Self::STATIC_INITIALIZER
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JClass {
    pub modifiers: JModifiers,
    pub name: String,
    pub is_interface: bool,
    pub superclass: Option<JType>,
    /// Implemented interfaces (or extended interfaces, for an interface).
    pub interfaces: Vec<JType>,
    pub members: Vec<JNode>,
}

impl JClass {
    pub fn method(&self, name: &str) -> Option<&JMethod> {
        self.methods().find(|m| m.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &JMethod> {
        self.members.iter().filter_map(|m| match m {
            JNode::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &JField> {
        self.members.iter().filter_map(|m| match m {
            JNode::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&JField> {
        self.fields().find(|f| f.name == name)
    }

    pub fn nested(&self) -> impl Iterator<Item = &JClass> {
        self.members.iter().filter_map(|m| match m {
            JNode::Class(class) => Some(class),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JSwitchCase {
    /// `None` for `default:`.
    pub label: Option<JNode>,
    pub body: Vec<JNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JCatch {
    pub ty: JType,
    pub name: String,
    pub body: Vec<JNode>,
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum JNode {
    // Expressions
    Literal(JLiteral),
    Ident(String),
    This,
    /// `Outer.this`
    QualifiedThis(String),
    Super,
    Select {
        target: Box<JNode>,
        name: String,
    },
    /// `target.method(args)`, or `method(args)` without a target.
    Call {
        target: Option<Box<JNode>>,
        method: String,
        args: Vec<JNode>,
    },
    /// `new T(args)`, optionally with an anonymous class body.
    New {
        class: JType,
        args: Vec<JNode>,
        body: Option<Vec<JNode>>,
    },
    NewArray {
        elem: JType,
        size: Box<JNode>,
    },
    /// `new T[]{a, b}`
    ArrayInit {
        elem: JType,
        items: Vec<JNode>,
    },
    Index {
        array: Box<JNode>,
        index: Box<JNode>,
    },
    Binary {
        op: JBinaryOp,
        left: Box<JNode>,
        right: Box<JNode>,
    },
    Unary {
        op: JUnaryOp,
        operand: Box<JNode>,
    },
    Conditional {
        cond: Box<JNode>,
        then: Box<JNode>,
        otherwise: Box<JNode>,
    },
    Assign {
        target: Box<JNode>,
        value: Box<JNode>,
    },
    CompoundAssign {
        op: JBinaryOp,
        target: Box<JNode>,
        value: Box<JNode>,
    },
    Cast {
        ty: JType,
        expr: Box<JNode>,
    },
    InstanceOf {
        expr: Box<JNode>,
        ty: JType,
    },
    /// `T.class`
    ClassLiteral(JType),
    Paren(Box<JNode>),

    // Statements
    LocalVar {
        ty: JType,
        name: String,
        init: Option<Box<JNode>>,
    },
    ExprStmt(Box<JNode>),
    Return(Option<Box<JNode>>),
    If {
        cond: Box<JNode>,
        then: Box<JNode>,
        otherwise: Option<Box<JNode>>,
    },
    Block(Vec<JNode>),
    For {
        init: Vec<JNode>,
        cond: Option<Box<JNode>>,
        update: Vec<JNode>,
        body: Box<JNode>,
    },
    ForEach {
        ty: JType,
        name: String,
        iterable: Box<JNode>,
        body: Box<JNode>,
    },
    While {
        cond: Box<JNode>,
        body: Box<JNode>,
    },
    Try {
        body: Vec<JNode>,
        catches: Vec<JCatch>,
        finally: Option<Vec<JNode>>,
    },
    Throw(Box<JNode>),
    Break(Option<String>),
    Continue(Option<String>),
    Switch {
        selector: Box<JNode>,
        cases: Vec<JSwitchCase>,
    },
    Labeled {
        label: String,
        body: Box<JNode>,
    },
    Empty,
    Comment(String),

    // Declarations
    Field(JField),
    Method(JMethod),
    Class(JClass),
    CompilationUnit {
        package: Option<String>,
        imports: Vec<String>,
        types: Vec<JNode>,
    },
}

impl JNode {
    // =========================================================================
    // Expression builders
    // =========================================================================

    pub fn id(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub const fn int(value: i32) -> Self {
        Self::Literal(JLiteral::Int(value))
    }

    pub const fn long(value: i64) -> Self {
        Self::Literal(JLiteral::Long(value))
    }

    pub const fn float(value: f32) -> Self {
        Self::Literal(JLiteral::Float(value))
    }

    pub const fn double(value: f64) -> Self {
        Self::Literal(JLiteral::Double(value))
    }

    pub const fn bool(value: bool) -> Self {
        Self::Literal(JLiteral::Boolean(value))
    }

    pub const fn char(value: char) -> Self {
        Self::Literal(JLiteral::Char(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(JLiteral::String(value.into()))
    }

    pub const fn null() -> Self {
        Self::Literal(JLiteral::Null)
    }

    pub fn select(target: Self, name: impl Into<String>) -> Self {
        Self::Select {
            target: Box::new(target),
            name: name.into(),
        }
    }

    /// `Class.name`
    pub fn static_select(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::select(Self::id(class), name)
    }

    pub fn call(target: Self, method: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            target: Some(Box::new(target)),
            method: method.into(),
            args,
        }
    }

    /// Unqualified call: `method(args)`.
    pub fn call_local(method: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            target: None,
            method: method.into(),
            args,
        }
    }

    pub fn static_call(class: impl Into<String>, method: impl Into<String>, args: Vec<Self>) -> Self {
        Self::call(Self::id(class), method, args)
    }

    pub fn new_object(class: JType, args: Vec<Self>) -> Self {
        Self::New {
            class,
            args,
            body: None,
        }
    }

    pub fn new_array(elem: JType, size: Self) -> Self {
        Self::NewArray {
            elem,
            size: Box::new(size),
        }
    }

    pub fn index(array: Self, index: Self) -> Self {
        Self::Index {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn binary(left: Self, op: JBinaryOp, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: JUnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Logical negation; folds double negation and negates comparisons.
    pub fn not(expr: Self) -> Self {
        match expr {
            Self::Unary {
                op: JUnaryOp::Not,
                operand,
            } => *operand,
            Self::Literal(JLiteral::Boolean(b)) => Self::bool(!b),
            Self::Binary { op, left, right } if op.negated().is_some() => Self::Binary {
                op: op.negated().unwrap_or(op),
                left,
                right,
            },
            other => Self::unary(JUnaryOp::Not, other),
        }
    }

    pub fn conditional(cond: Self, then: Self, otherwise: Self) -> Self {
        Self::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn assign(target: Self, value: Self) -> Self {
        Self::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn cast(ty: JType, expr: Self) -> Self {
        Self::Cast {
            ty,
            expr: Box::new(expr),
        }
    }

    pub fn paren(expr: Self) -> Self {
        Self::Paren(Box::new(expr))
    }

    // =========================================================================
    // Statement builders
    // =========================================================================

    pub fn local(ty: JType, name: impl Into<String>, init: Option<Self>) -> Self {
        Self::LocalVar {
            ty,
            name: name.into(),
            init: init.map(Box::new),
        }
    }

    pub fn expr_stmt(expr: Self) -> Self {
        Self::ExprStmt(Box::new(expr))
    }

    pub fn ret(expr: Option<Self>) -> Self {
        Self::Return(expr.map(Box::new))
    }

    pub fn block(stmts: Vec<Self>) -> Self {
        Self::Block(stmts)
    }

    pub fn if_stmt(cond: Self, then: Vec<Self>, otherwise: Option<Vec<Self>>) -> Self {
        Self::If {
            cond: Box::new(cond),
            then: Box::new(Self::Block(then)),
            otherwise: otherwise.map(|stmts| Box::new(Self::Block(stmts))),
        }
    }

    pub fn while_stmt(cond: Self, body: Vec<Self>) -> Self {
        Self::While {
            cond: Box::new(cond),
            body: Box::new(Self::Block(body)),
        }
    }

    /// `for (int index = from; index < bound; index++) body`
    pub fn counting_loop(index: impl Into<String>, from: Self, bound: Self, body: Vec<Self>) -> Self {
        let index = index.into();
        Self::For {
            init: vec![Self::local(JType::Int, index.clone(), Some(from))],
            cond: Some(Box::new(Self::binary(
                Self::id(index.clone()),
                JBinaryOp::Lt,
                bound,
            ))),
            update: vec![Self::unary(JUnaryOp::PostInc, Self::id(index))],
            body: Box::new(Self::Block(body)),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    // =========================================================================
    // Classification
    // =========================================================================

    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub const fn is_null_literal(&self) -> bool {
        matches!(self, Self::Literal(JLiteral::Null))
    }

    /// Expressions that may stand alone as a statement.
    pub const fn is_statement_expression(&self) -> bool {
        match self {
            Self::Call { .. } | Self::New { .. } | Self::Assign { .. } | Self::CompoundAssign { .. } => {
                true
            }
            Self::Unary { op, .. } => matches!(
                op,
                JUnaryOp::PreInc | JUnaryOp::PreDec | JUnaryOp::PostInc | JUnaryOp::PostDec
            ),
            _ => false,
        }
    }

    /// Expressions whose evaluation has no effect and may be repeated or dropped.
    pub fn is_side_effect_free(&self) -> bool {
        match self {
            Self::Literal(_)
            | Self::Ident(_)
            | Self::This
            | Self::QualifiedThis(_)
            | Self::Super
            | Self::ClassLiteral(_) => true,
            Self::Select { target, .. } => target.is_side_effect_free(),
            Self::Paren(inner) | Self::Cast { expr: inner, .. } => inner.is_side_effect_free(),
            _ => false,
        }
    }

    pub const fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::LocalVar { .. }
                | Self::ExprStmt(_)
                | Self::Return(_)
                | Self::If { .. }
                | Self::Block(_)
                | Self::For { .. }
                | Self::ForEach { .. }
                | Self::While { .. }
                | Self::Try { .. }
                | Self::Throw(_)
                | Self::Break(_)
                | Self::Continue(_)
                | Self::Switch { .. }
                | Self::Labeled { .. }
                | Self::Empty
                | Self::Comment(_)
        )
    }

    /// Flatten a block into its statements.
    pub fn into_stmts(self) -> Vec<Self> {
        match self {
            Self::Block(stmts) => stmts,
            Self::Empty => Vec::new(),
            other => vec![other],
        }
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Visit every direct child node.
    pub fn for_each_child<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        match self {
            Self::Literal(_)
            | Self::Ident(_)
            | Self::This
            | Self::QualifiedThis(_)
            | Self::Super
            | Self::ClassLiteral(_)
            | Self::Break(_)
            | Self::Continue(_)
            | Self::Empty
            | Self::Comment(_) => {}
            Self::Select { target, .. } => f(target),
            Self::Call { target, args, .. } => {
                if let Some(target) = target {
                    f(target);
                }
                args.iter().for_each(f);
            }
            Self::New { args, body, .. } => {
                args.iter().for_each(&mut *f);
                if let Some(body) = body {
                    body.iter().for_each(f);
                }
            }
            Self::NewArray { size, .. } => f(size),
            Self::ArrayInit { items, .. } => items.iter().for_each(f),
            Self::Index { array, index } => {
                f(array);
                f(index);
            }
            Self::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Self::Unary { operand, .. } => f(operand),
            Self::Conditional {
                cond,
                then,
                otherwise,
            } => {
                f(cond);
                f(then);
                f(otherwise);
            }
            Self::Assign { target, value } | Self::CompoundAssign { target, value, .. } => {
                f(target);
                f(value);
            }
            Self::Cast { expr, .. } | Self::InstanceOf { expr, .. } | Self::Paren(expr) => f(expr),
            Self::LocalVar { init, .. } => {
                if let Some(init) = init {
                    f(init);
                }
            }
            Self::ExprStmt(expr) | Self::Throw(expr) => f(expr),
            Self::Return(expr) => {
                if let Some(expr) = expr {
                    f(expr);
                }
            }
            Self::If {
                cond,
                then,
                otherwise,
            } => {
                f(cond);
                f(then);
                if let Some(otherwise) = otherwise {
                    f(otherwise);
                }
            }
            Self::Block(stmts) => stmts.iter().for_each(f),
            Self::For {
                init,
                cond,
                update,
                body,
            } => {
                init.iter().for_each(&mut *f);
                if let Some(cond) = cond {
                    f(cond);
                }
                update.iter().for_each(&mut *f);
                f(body);
            }
            Self::ForEach { iterable, body, .. } => {
                f(iterable);
                f(body);
            }
            Self::While { cond, body } => {
                f(cond);
                f(body);
            }
            Self::Try {
                body,
                catches,
                finally,
            } => {
                body.iter().for_each(&mut *f);
                for catch in catches {
                    catch.body.iter().for_each(&mut *f);
                }
                if let Some(finally) = finally {
                    finally.iter().for_each(f);
                }
            }
            Self::Switch { selector, cases } => {
                f(selector);
                for case in cases {
                    if let Some(label) = &case.label {
                        f(label);
                    }
                    case.body.iter().for_each(&mut *f);
                }
            }
            Self::Labeled { body, .. } => f(body),
            Self::Field(field) => {
                if let Some(init) = &field.init {
                    f(init);
                }
            }
            Self::Method(method) => {
                if let Some(body) = &method.body {
                    body.iter().for_each(f);
                }
            }
            Self::Class(class) => class.members.iter().for_each(f),
            Self::CompilationUnit { types, .. } => types.iter().for_each(f),
        }
    }

    /// Pre-order visit of this node and all descendants.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        self.for_each_child(&mut |child| child.walk(f));
    }

    /// Types written directly on this node, not on its children.
    pub fn for_each_type<'a>(&'a self, f: &mut impl FnMut(&'a JType)) {
        match self {
            Self::New { class: ty, .. }
            | Self::NewArray { elem: ty, .. }
            | Self::ArrayInit { elem: ty, .. }
            | Self::Cast { ty, .. }
            | Self::InstanceOf { ty, .. }
            | Self::ClassLiteral(ty)
            | Self::LocalVar { ty, .. }
            | Self::ForEach { ty, .. } => f(ty),
            Self::Try { catches, .. } => catches.iter().for_each(|c| f(&c.ty)),
            Self::Field(field) => f(&field.ty),
            Self::Method(method) => {
                f(&method.ret);
                method.params.iter().for_each(|p| f(&p.ty));
            }
            Self::Class(class) => {
                class.superclass.iter().for_each(&mut *f);
                class.interfaces.iter().for_each(f);
            }
            _ => {}
        }
    }

    /// Number of nodes in this subtree satisfying `pred`.
    pub fn count(&self, pred: impl Fn(&Self) -> bool) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if pred(node) {
                n += 1;
            }
        });
        n
    }

    /// Find a class declaration by simple name anywhere in this subtree.
    pub fn find_class(&self, name: &str) -> Option<&JClass> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_none()
                && let Self::Class(class) = node
                && class.name == name
            {
                found = Some(class);
            }
        });
        found
    }
}
