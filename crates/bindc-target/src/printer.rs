//! Debug printer for the target tree.
//!
//! Renders [`JNode`] trees as indented source text. Output is deterministic
//! and intended for tests and trace logs; the real code generator lives
//! outside this workspace.
//!
//! Operands are parenthesized by shape rather than by precedence: any
//! compound operand of an operator is wrapped. The result is noisier than
//! hand-written code but never ambiguous.

use crate::ir::{JClass, JField, JLiteral, JMethod, JModifiers, JNode, JType, JUnaryOp};

/// Print a node (declaration, statement or expression) to a string.
pub fn print_node(node: &JNode) -> String {
    let mut printer = JPrinter::new();
    printer.emit(node);
    printer.finish()
}

pub struct JPrinter {
    out: String,
    indent: usize,
    /// Enclosing class names, innermost last; constructors print with it.
    classes: Vec<String>,
}

impl Default for JPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl JPrinter {
    pub const fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            classes: Vec::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Emit a node: statements and declarations on their own lines,
    /// expressions inline.
    pub fn emit(&mut self, node: &JNode) {
        if node.is_statement() || is_declaration(node) {
            self.emit_stmt(node);
        } else {
            let text = self.expr(node);
            self.out.push_str(&text);
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    // =========================================================================
    // Declarations and statements
    // =========================================================================

    fn emit_stmt(&mut self, node: &JNode) {
        match node {
            JNode::CompilationUnit {
                package,
                imports,
                types,
            } => {
                if let Some(package) = package {
                    self.line(&format!("package {package};"));
                    self.line("");
                }
                for import in imports {
                    self.line(&format!("import {import};"));
                }
                if !imports.is_empty() {
                    self.line("");
                }
                for ty in types {
                    self.emit_stmt(ty);
                }
            }
            JNode::Class(class) => self.emit_class(class),
            JNode::Method(method) => self.emit_method(method),
            JNode::Field(field) => self.emit_field(field),
            JNode::LocalVar { .. } => {
                let text = self.local_decl(node);
                self.line(&format!("{text};"));
            }
            JNode::ExprStmt(expr) => {
                let text = self.expr(expr);
                self.line(&format!("{text};"));
            }
            JNode::Return(None) => self.line("return;"),
            JNode::Return(Some(expr)) => {
                let text = self.expr(expr);
                self.line(&format!("return {text};"));
            }
            JNode::Throw(expr) => {
                let text = self.expr(expr);
                self.line(&format!("throw {text};"));
            }
            JNode::Break(None) => self.line("break;"),
            JNode::Break(Some(label)) => self.line(&format!("break {label};")),
            JNode::Continue(None) => self.line("continue;"),
            JNode::Continue(Some(label)) => self.line(&format!("continue {label};")),
            JNode::Empty => self.line(";"),
            JNode::Comment(text) => self.line(&format!("// {text}")),
            JNode::Block(stmts) => {
                self.line("{");
                self.emit_body(stmts);
                self.line("}");
            }
            JNode::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.expr(cond);
                self.line(&format!("if ({cond}) {{"));
                self.emit_body_of(then);
                let mut otherwise = otherwise.as_deref();
                while let Some(branch) = otherwise {
                    match branch {
                        JNode::If {
                            cond,
                            then,
                            otherwise: next,
                        } => {
                            let cond = self.expr(cond);
                            self.line(&format!("}} else if ({cond}) {{"));
                            self.emit_body_of(then);
                            otherwise = next.as_deref();
                        }
                        other => {
                            self.line("} else {");
                            self.emit_body_of(other);
                            otherwise = None;
                        }
                    }
                }
                self.line("}");
            }
            JNode::For {
                init,
                cond,
                update,
                body,
            } => {
                let init: Vec<String> = init
                    .iter()
                    .map(|n| match n {
                        JNode::LocalVar { .. } => self.local_decl(n),
                        other => self.expr(other),
                    })
                    .collect();
                let cond = cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                let update: Vec<String> = update.iter().map(|u| self.expr(u)).collect();
                self.line(&format!(
                    "for ({}; {}; {}) {{",
                    init.join(", "),
                    cond,
                    update.join(", ")
                ));
                self.emit_body_of(body);
                self.line("}");
            }
            JNode::ForEach {
                ty,
                name,
                iterable,
                body,
            } => {
                let iterable = self.expr(iterable);
                self.line(&format!("for ({} {name} : {iterable}) {{", type_str(ty)));
                self.emit_body_of(body);
                self.line("}");
            }
            JNode::While { cond, body } => {
                let cond = self.expr(cond);
                self.line(&format!("while ({cond}) {{"));
                self.emit_body_of(body);
                self.line("}");
            }
            JNode::Try {
                body,
                catches,
                finally,
            } => {
                self.line("try {");
                self.emit_body(body);
                for catch in catches {
                    self.line(&format!("}} catch ({} {}) {{", type_str(&catch.ty), catch.name));
                    self.emit_body(&catch.body);
                }
                if let Some(finally) = finally {
                    self.line("} finally {");
                    self.emit_body(finally);
                }
                self.line("}");
            }
            JNode::Switch { selector, cases } => {
                let selector = self.expr(selector);
                self.line(&format!("switch ({selector}) {{"));
                self.indent += 1;
                for case in cases {
                    match &case.label {
                        Some(label) => {
                            let label = self.expr(label);
                            self.line(&format!("case {label}:"));
                        }
                        None => self.line("default:"),
                    }
                    self.emit_body(&case.body);
                }
                self.indent -= 1;
                self.line("}");
            }
            JNode::Labeled { label, body } => {
                self.line(&format!("{label}:"));
                self.emit_stmt(body);
            }
            expr => {
                let text = self.expr(expr);
                self.line(&format!("{text};"));
            }
        }
    }

    fn emit_body(&mut self, stmts: &[JNode]) {
        self.indent += 1;
        for stmt in stmts {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
    }

    /// Body of a compound statement: a block prints its statements, any
    /// other statement prints itself.
    fn emit_body_of(&mut self, body: &JNode) {
        match body {
            JNode::Block(stmts) => self.emit_body(stmts),
            other => self.emit_body(std::slice::from_ref(other)),
        }
    }

    fn emit_class(&mut self, class: &JClass) {
        let mut header = modifiers_str(class.modifiers);
        header.push_str(if class.is_interface { "interface " } else { "class " });
        header.push_str(&class.name);
        if let Some(superclass) = &class.superclass {
            header.push_str(" extends ");
            header.push_str(&type_str(superclass));
        }
        if !class.interfaces.is_empty() {
            let keyword = if class.is_interface { " extends " } else { " implements " };
            header.push_str(keyword);
            let names: Vec<String> = class.interfaces.iter().map(type_str).collect();
            header.push_str(&names.join(", "));
        }
        header.push_str(" {");
        self.line(&header);
        self.classes.push(class.name.clone());
        self.emit_body(&class.members);
        self.classes.pop();
        self.line("}");
    }

    fn emit_method(&mut self, method: &JMethod) {
        if method.is_static_initializer() {
            self.line("static {");
            self.emit_body(method.body.as_deref().unwrap_or_default());
            self.line("}");
            return;
        }
        let params: Vec<String> = method
            .params
            .iter()
            .map(|p| format!("{} {}", type_str(&p.ty), p.name))
            .collect();
        let mut header = modifiers_str(method.modifiers);
        if method.is_constructor() {
            header.push_str(self.classes.last().map_or("<init>", String::as_str));
        } else {
            header.push_str(&type_str(&method.ret));
            header.push(' ');
            header.push_str(&method.name);
        }
        header.push('(');
        header.push_str(&params.join(", "));
        header.push(')');
        match &method.body {
            None => self.line(&format!("{header};")),
            Some(body) => {
                self.line(&format!("{header} {{"));
                self.emit_body(body);
                self.line("}");
            }
        }
    }

    fn emit_field(&mut self, field: &JField) {
        let mut text = modifiers_str(field.modifiers);
        text.push_str(&type_str(&field.ty));
        text.push(' ');
        text.push_str(&field.name);
        if let Some(init) = &field.init {
            text.push_str(" = ");
            text.push_str(&self.expr(init));
        }
        text.push(';');
        self.line(&text);
    }

    fn local_decl(&mut self, node: &JNode) -> String {
        let JNode::LocalVar { ty, name, init } = node else {
            return String::new();
        };
        match init {
            Some(init) => format!("{} {name} = {}", type_str(ty), self.expr(init)),
            None => format!("{} {name}", type_str(ty)),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, node: &JNode) -> String {
        match node {
            JNode::Literal(lit) => literal_str(lit),
            JNode::Ident(name) => name.clone(),
            JNode::This => "this".into(),
            JNode::QualifiedThis(class) => format!("{class}.this"),
            JNode::Super => "super".into(),
            JNode::ClassLiteral(ty) => format!("{}.class", type_str(ty)),
            JNode::Select { target, name } => format!("{}.{name}", self.operand(target)),
            JNode::Call {
                target,
                method,
                args,
            } => {
                let args = self.args(args);
                match target {
                    Some(target) => format!("{}.{method}({args})", self.operand(target)),
                    None => format!("{method}({args})"),
                }
            }
            JNode::New { class, args, body } => {
                let args = self.args(args);
                let head = format!("new {}({args})", type_str(class));
                match body {
                    None => head,
                    Some(members) => {
                        let mut nested = JPrinter {
                            out: String::new(),
                            indent: self.indent + 1,
                            classes: self.classes.clone(),
                        };
                        for member in members {
                            nested.emit_stmt(member);
                        }
                        let pad = "    ".repeat(self.indent);
                        format!("{head} {{\n{}{pad}}}", nested.out)
                    }
                }
            }
            JNode::NewArray { elem, size } => {
                format!("new {}[{}]", type_str(elem), self.expr(size))
            }
            JNode::ArrayInit { elem, items } => {
                format!("new {}[]{{{}}}", type_str(elem), self.args(items))
            }
            JNode::Index { array, index } => {
                format!("{}[{}]", self.operand(array), self.expr(index))
            }
            JNode::Binary { op, left, right } => {
                format!(
                    "{} {} {}",
                    self.operand(left),
                    op.symbol(),
                    self.operand(right)
                )
            }
            JNode::Unary { op, operand } => {
                let inner = self.operand(operand);
                match op {
                    JUnaryOp::Neg => format!("-{inner}"),
                    JUnaryOp::Not => format!("!{inner}"),
                    JUnaryOp::PreInc => format!("++{inner}"),
                    JUnaryOp::PreDec => format!("--{inner}"),
                    JUnaryOp::PostInc => format!("{inner}++"),
                    JUnaryOp::PostDec => format!("{inner}--"),
                }
            }
            JNode::Conditional {
                cond,
                then,
                otherwise,
            } => format!(
                "{} ? {} : {}",
                self.operand(cond),
                self.operand(then),
                self.operand(otherwise)
            ),
            JNode::Assign { target, value } => {
                format!("{} = {}", self.expr(target), self.expr(value))
            }
            JNode::CompoundAssign { op, target, value } => {
                format!("{} {}= {}", self.expr(target), op.symbol(), self.expr(value))
            }
            JNode::Cast { ty, expr } => format!("({}) {}", type_str(ty), self.operand(expr)),
            JNode::InstanceOf { expr, ty } => {
                format!("{} instanceof {}", self.operand(expr), type_str(ty))
            }
            JNode::Paren(inner) => format!("({})", self.expr(inner)),
            other => {
                // Statements in expression position print on one line.
                let mut nested = JPrinter::new();
                nested.emit_stmt(other);
                nested.out.trim_end().replace('\n', " ")
            }
        }
    }

    /// An operand of a larger expression; compound operands get parentheses.
    fn operand(&mut self, node: &JNode) -> String {
        let text = self.expr(node);
        match node {
            JNode::Binary { .. }
            | JNode::Conditional { .. }
            | JNode::Assign { .. }
            | JNode::CompoundAssign { .. }
            | JNode::Cast { .. }
            | JNode::InstanceOf { .. } => format!("({text})"),
            _ => text,
        }
    }

    fn args(&mut self, args: &[JNode]) -> String {
        let parts: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        parts.join(", ")
    }
}

const fn is_declaration(node: &JNode) -> bool {
    matches!(
        node,
        JNode::Field(_) | JNode::Method(_) | JNode::Class(_) | JNode::CompilationUnit { .. }
    )
}

/// Source form of a type: `int`, `Sequence<Integer>`, `String[]`.
pub fn type_str(ty: &JType) -> String {
    match ty {
        JType::Named { name, args } if !args.is_empty() => {
            let args: Vec<String> = args.iter().map(type_str).collect();
            format!("{name}<{}>", args.join(", "))
        }
        JType::Array(elem) => format!("{}[]", type_str(elem)),
        other => other.base_name(),
    }
}

fn modifiers_str(modifiers: JModifiers) -> String {
    let mut out = String::new();
    for (flag, word) in [
        (JModifiers::PUBLIC, "public "),
        (JModifiers::PROTECTED, "protected "),
        (JModifiers::PRIVATE, "private "),
        (JModifiers::ABSTRACT, "abstract "),
        (JModifiers::STATIC, "static "),
        (JModifiers::FINAL, "final "),
    ] {
        if modifiers.contains(flag) {
            out.push_str(word);
        }
    }
    out
}

fn literal_str(lit: &JLiteral) -> String {
    match lit {
        JLiteral::Int(v) => v.to_string(),
        JLiteral::Long(v) => format!("{v}L"),
        JLiteral::Float(v) => format!("{v:?}f"),
        JLiteral::Double(v) => format!("{v:?}"),
        JLiteral::Boolean(v) => v.to_string(),
        JLiteral::Char(c) => match c {
            '\0' => "'\\u0000'".into(),
            '\'' => "'\\''".into(),
            '\\' => "'\\\\'".into(),
            '\n' => "'\\n'".into(),
            c => format!("'{c}'"),
        },
        JLiteral::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
            out
        }
        JLiteral::Null => "null".into(),
    }
}
