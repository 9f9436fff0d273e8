//! Attributed tree nodes and the arena that owns them.
//!
//! Nodes are stored in a flat arena and referenced by [`NodeIndex`]. Every
//! node carries its resolved type; identifier-like nodes carry their resolved
//! symbol. The tree is immutable input to lowering.

use crate::symbols::{BindStatus, SymbolId};
use crate::types::TypeId;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Null,
    /// Duration literal in milliseconds (`5s` → 5000.0).
    Duration(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    SizeOf,
    Reverse,
}

impl UnaryOp {
    pub const fn is_increment(self) -> bool {
        matches!(
            self,
            Self::PreInc | Self::PreDec | Self::PostInc | Self::PostDec
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Into,
    Before(NodeIndex),
    After(NodeIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    /// `delete seq`
    All,
    /// `delete seq[i]`
    Index(NodeIndex),
    /// `delete value from seq`
    Value(NodeIndex),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InClause {
    pub var: SymbolId,
    pub seq: NodeIndex,
    pub filter: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: SymbolId,
    pub body: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteralPart {
    pub var: SymbolId,
    pub value: NodeIndex,
    pub bind: BindStatus,
}

/// `on replace oldValue[lo..hi] = newElements { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct OnReplace {
    pub old_value: Option<SymbolId>,
    pub first_index: Option<SymbolId>,
    pub last_index: Option<SymbolId>,
    pub new_elements: Option<SymbolId>,
    pub body: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub sym: SymbolId,
    pub init: Option<NodeIndex>,
    pub bind: BindStatus,
    pub on_replace: Option<OnReplace>,
    pub on_invalidate: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverrideVar {
    /// The override's own symbol, owned by the overriding class.
    pub sym: SymbolId,
    /// The inherited variable being overridden.
    pub overridden: SymbolId,
    pub init: Option<NodeIndex>,
    pub bind: BindStatus,
    pub on_replace: Option<OnReplace>,
    pub on_invalidate: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub sym: SymbolId,
    pub params: Vec<SymbolId>,
    pub body: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub sym: SymbolId,
    pub members: Vec<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// The script class symbol.
    pub sym: SymbolId,
    pub package: Option<String>,
    pub members: Vec<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    Ident(SymbolId),
    This,
    Super,
    Select {
        receiver: NodeIndex,
        member: SymbolId,
    },
    Call {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
    },
    Assign {
        target: NodeIndex,
        value: NodeIndex,
    },
    CompoundAssign {
        op: BinaryOp,
        target: NodeIndex,
        value: NodeIndex,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    /// Conversion to the node's own type.
    Cast(NodeIndex),
    InstanceOf {
        expr: NodeIndex,
        class: TypeId,
    },
    EmptySequence,
    ExplicitSequence(Vec<NodeIndex>),
    Range {
        lower: NodeIndex,
        upper: NodeIndex,
        step: Option<NodeIndex>,
        exclusive: bool,
    },
    Indexed {
        seq: NodeIndex,
        index: NodeIndex,
    },
    Slice {
        seq: NodeIndex,
        start: NodeIndex,
        end: Option<NodeIndex>,
        end_exclusive: bool,
    },
    Insert {
        seq: NodeIndex,
        value: NodeIndex,
        position: InsertPosition,
    },
    Delete {
        seq: NodeIndex,
        target: DeleteTarget,
    },
    /// `indexof x` for an in-clause variable `x`.
    IndexOf(SymbolId),
    For {
        clauses: Vec<InClause>,
        body: NodeIndex,
    },
    If {
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    },
    While {
        cond: NodeIndex,
        body: NodeIndex,
    },
    Try {
        body: NodeIndex,
        catches: Vec<CatchClause>,
        finally: Option<NodeIndex>,
    },
    Throw(NodeIndex),
    Return(Option<NodeIndex>),
    Break,
    Continue,
    /// Block expression: statements followed by an optional value.
    Block {
        stmts: Vec<NodeIndex>,
        value: Option<NodeIndex>,
    },
    /// String interpolation; parts are concatenated in order.
    StringExpr(Vec<NodeIndex>),
    /// Object literal or `new` of a declarative or plain class.
    Instantiate {
        class: SymbolId,
        args: Vec<NodeIndex>,
        parts: Vec<ObjectLiteralPart>,
        /// Anonymous subclass body (a `ClassDecl` node).
        body: Option<NodeIndex>,
    },
    NewArray {
        elem: TypeId,
        size: NodeIndex,
    },
    VarDecl(VarDecl),
    OverrideVar(OverrideVar),
    FunctionDef(FunctionDef),
    /// Anonymous function value wrapping a `FunctionDef` node.
    FunctionValue(NodeIndex),
    ClassDecl(ClassDecl),
    InitBlock(NodeIndex),
    PostInitBlock(NodeIndex),
    Script(Script),
}

impl NodeKind {
    /// Short tag used in logs and error messages.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Ident(_) => "identifier",
            Self::This => "this",
            Self::Super => "super",
            Self::Select { .. } => "select",
            Self::Call { .. } => "call",
            Self::Assign { .. } => "assignment",
            Self::CompoundAssign { .. } => "compound assignment",
            Self::Binary { .. } => "binary",
            Self::Unary { .. } => "unary",
            Self::Cast(_) => "cast",
            Self::InstanceOf { .. } => "instanceof",
            Self::EmptySequence => "empty sequence",
            Self::ExplicitSequence(_) => "explicit sequence",
            Self::Range { .. } => "range",
            Self::Indexed { .. } => "indexed",
            Self::Slice { .. } => "slice",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::IndexOf(_) => "indexof",
            Self::For { .. } => "for",
            Self::If { .. } => "if",
            Self::While { .. } => "while",
            Self::Try { .. } => "try",
            Self::Throw(_) => "throw",
            Self::Return(_) => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Block { .. } => "block",
            Self::StringExpr(_) => "string expression",
            Self::Instantiate { .. } => "instantiate",
            Self::NewArray { .. } => "new array",
            Self::VarDecl(_) => "var declaration",
            Self::OverrideVar(_) => "override var",
            Self::FunctionDef(_) => "function definition",
            Self::FunctionValue(_) => "function value",
            Self::ClassDecl(_) => "class declaration",
            Self::InitBlock(_) => "init block",
            Self::PostInitBlock(_) => "postinit block",
            Self::Script(_) => "script",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: TypeId,
    /// Source offset, for logs only.
    pub pos: u32,
}

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: NodeKind, ty: TypeId) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            ty,
            pos: idx.0,
        });
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of a node in evaluation order.
    pub fn children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 4]> {
        let mut out = SmallVec::new();
        let Some(node) = self.get(idx) else {
            return out;
        };
        match &node.kind {
            NodeKind::Literal(_)
            | NodeKind::Ident(_)
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::EmptySequence
            | NodeKind::IndexOf(_)
            | NodeKind::Break
            | NodeKind::Continue => {}
            NodeKind::Select { receiver, .. } => out.push(*receiver),
            NodeKind::Call { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            NodeKind::Assign { target, value }
            | NodeKind::CompoundAssign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Unary { operand, .. } => out.push(*operand),
            NodeKind::Cast(expr) | NodeKind::InstanceOf { expr, .. } => out.push(*expr),
            NodeKind::ExplicitSequence(items) | NodeKind::StringExpr(items) => {
                out.extend(items.iter().copied());
            }
            NodeKind::Range {
                lower, upper, step, ..
            } => {
                out.push(*lower);
                out.push(*upper);
                out.extend(*step);
            }
            NodeKind::Indexed { seq, index } => {
                out.push(*seq);
                out.push(*index);
            }
            NodeKind::Slice { seq, start, end, .. } => {
                out.push(*seq);
                out.push(*start);
                out.extend(*end);
            }
            NodeKind::Insert {
                seq,
                value,
                position,
            } => {
                out.push(*value);
                out.push(*seq);
                if let InsertPosition::Before(at) | InsertPosition::After(at) = position {
                    out.push(*at);
                }
            }
            NodeKind::Delete { seq, target } => {
                if let DeleteTarget::Value(value) = target {
                    out.push(*value);
                }
                out.push(*seq);
                if let DeleteTarget::Index(at) = target {
                    out.push(*at);
                }
            }
            NodeKind::For { clauses, body } => {
                for clause in clauses {
                    out.push(clause.seq);
                    out.extend(clause.filter);
                }
                out.push(*body);
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                out.push(*body);
                out.extend(catches.iter().map(|c| c.body));
                out.extend(*finally);
            }
            NodeKind::Throw(expr) => out.push(*expr),
            NodeKind::Return(expr) => out.extend(*expr),
            NodeKind::Block { stmts, value } => {
                out.extend(stmts.iter().copied());
                out.extend(*value);
            }
            NodeKind::Instantiate {
                args, parts, body, ..
            } => {
                out.extend(args.iter().copied());
                out.extend(parts.iter().map(|p| p.value));
                out.extend(*body);
            }
            NodeKind::NewArray { size, .. } => out.push(*size),
            NodeKind::VarDecl(decl) => {
                out.extend(decl.init);
                out.extend(decl.on_replace.as_ref().map(|t| t.body));
                out.extend(decl.on_invalidate);
            }
            NodeKind::OverrideVar(decl) => {
                out.extend(decl.init);
                out.extend(decl.on_replace.as_ref().map(|t| t.body));
                out.extend(decl.on_invalidate);
            }
            NodeKind::FunctionDef(def) => out.extend(def.body),
            NodeKind::FunctionValue(def) => out.push(*def),
            NodeKind::ClassDecl(decl) => out.extend(decl.members.iter().copied()),
            NodeKind::InitBlock(body) | NodeKind::PostInitBlock(body) => out.push(*body),
            NodeKind::Script(script) => out.extend(script.members.iter().copied()),
        }
        out
    }

    /// Pre-order search for a node satisfying `pred`, starting at `root`.
    pub fn any(&self, root: NodeIndex, pred: &mut impl FnMut(&Node) -> bool) -> bool {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.get(idx) else {
                continue;
            };
            if pred(node) {
                return true;
            }
            let children = self.children(idx);
            stack.extend(children.into_iter().rev());
        }
        false
    }
}
