//! The script class and the compilation unit.
//!
//! A script lowers to one class named after the script. Script variables
//! become static fields with static accessors, script functions become
//! static methods, classes declared in the script become static nested
//! classes, and the top-level statements run in source order inside
//!
//! ```text
//! public static Object run$(Sequence<String> args$)
//! ```
//!
//! A script variable's plain initializer runs at its declaration's position
//! in `run$`. A bound script variable is never cached: its getter evaluates
//! the binding on every read.

use super::members::{TranslatedVar, VarInit, VarLayout, VarParts, find_var};
use super::{ClassPhase, PhaseTracker};
use crate::context::{ReceiverContext, TranslationContext};
use crate::error::{LowerError, LowerResult};
use crate::result::StatementsResult;
use crate::translate::{Translator, ends_in_transfer};
use crate::typemorph;
use bindc_common::names;
use bindc_common::runtime::{RuntimeClass, function_class_name};
use bindc_target::{JClass, JMethod, JModifiers, JNode, JParam, JType};
use bindc_tree::{NodeKind, Script, TypeId};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

impl Translator<'_> {
    /// Lower the program's root script to a compilation unit.
    pub fn lower_unit(&mut self) -> LowerResult<JNode> {
        let root = self.program().root;
        let NodeKind::Script(script) = &self.node(root)?.kind else {
            return Err(LowerError::internal("program root is not a script"));
        };
        let name = self.symbol(script.sym)?.name.clone();
        info!(script = %name, "lowering script");

        let ctx = TranslationContext::new().for_class(script.sym, ReceiverContext::ScriptAsStatic);
        self.unit.push_definitions();
        let built = self.script_class(&ctx, script, &name);
        let nested = self.unit.pop_definitions()?;
        let mut class = built?;
        class.members.extend(nested);

        let used = referenced_names(&class);
        let imports = RuntimeClass::IMPORTED
            .iter()
            .filter(|runtime| used.contains(runtime.name()))
            .map(|runtime| self.options().runtime_import(runtime.name()))
            .chain(
                function_arities(&used)
                    .into_iter()
                    .map(|arity| self.options().runtime_import(&function_class_name(arity))),
            )
            .collect();
        Ok(JNode::CompilationUnit {
            package: script.package.clone(),
            imports,
            types: vec![JNode::Class(class)],
        })
    }

    fn script_class(
        &mut self,
        ctx: &TranslationContext,
        script: &Script,
        name: &str,
    ) -> LowerResult<JClass> {
        let mut phase = PhaseTracker::new(name);
        let members = self.collect_members(&script.members)?;
        if !members.overrides.is_empty() {
            return Err(LowerError::internal("variable override at script level"));
        }
        if !(members.init_blocks.is_empty() && members.post_init_blocks.is_empty()) {
            return Err(LowerError::unsupported("init block at script level"));
        }

        phase.advance(ClassPhase::TranslatingMembers);
        self.nested_classes(ctx, &members.classes)?;
        let mut vars = Vec::with_capacity(members.vars.len());
        for decl in &members.vars {
            vars.push(self.translate_var(ctx, VarParts::from(*decl))?);
        }
        let mut functions = Vec::with_capacity(members.functions.len());
        for def in &members.functions {
            functions.push(JNode::Method(self.function_method(ctx, def, None)?));
        }
        let run = self.run_method(ctx, script, &vars)?;

        phase.advance(ClassPhase::Emitting);
        let mut body = Vec::new();
        for tv in &vars {
            let layout = VarLayout {
                name: tv.name.clone(),
                ty: tv.ty,
                statik: true,
                accessors: self.uses_accessors(tv.sym),
                bound: tv.init.bound_expr().is_some(),
                cached: false,
                own: Some(tv),
                mixin: None,
                mixin_trigger: false,
                invalidators: Vec::new(),
                dependence: Vec::new(),
                offset_getter: false,
            };
            body.extend(self.var_members(ctx, &layout)?);
        }
        body.extend(functions);
        body.push(JNode::Method(run));
        phase.advance(ClassPhase::Done);
        debug!(script = name, vars = vars.len(), "script class built");

        Ok(JClass {
            modifiers: JModifiers::PUBLIC,
            name: name.to_string(),
            is_interface: false,
            superclass: None,
            interfaces: Vec::new(),
            members: body,
        })
    }

    /// Top-level statements and plain variable initializers, in source order.
    fn run_method(
        &mut self,
        ctx: &TranslationContext,
        script: &Script,
        vars: &[TranslatedVar],
    ) -> LowerResult<JMethod> {
        let body = self.in_block_scope(|tr| {
            let mut stmts = Vec::new();
            for member in &script.members {
                match &tr.node(*member)?.kind {
                    NodeKind::VarDecl(decl) => {
                        let tv = find_var(vars, decl.sym)?;
                        if let VarInit::Value(expr) = &tv.init {
                            let (preface, value) = expr.clone().split()?;
                            stmts.extend(preface);
                            stmts.push(JNode::expr_stmt(tr.member_write(ctx, None, tv.sym, value)?));
                        }
                    }
                    NodeKind::FunctionDef(_)
                    | NodeKind::ClassDecl(_)
                    | NodeKind::InitBlock(_)
                    | NodeKind::PostInitBlock(_) => {}
                    _ => stmts.extend(tr.stmts(ctx, *member)?.stmts),
                }
            }
            Ok(StatementsResult::new(stmts))
        })?;
        let mut stmts = body.stmts;
        if !ends_in_transfer(&stmts) {
            stmts.push(JNode::ret(Some(JNode::null())));
        }
        let args_ty = typemorph::sequence_type(self.program(), TypeId::STRING);
        Ok(JMethod::new(
            JModifiers::PUBLIC | JModifiers::STATIC,
            JType::object(),
            names::RUN,
            vec![JParam::new(args_ty, "args$")],
            stmts,
        ))
    }
}

/// Arities of the `FunctionN` types a generated class mentions.
/// Every simple name the class mentions as an identifier or in a type.
/// Static runtime calls target an identifier naming their class.
fn referenced_names(class: &JClass) -> FxHashSet<&str> {
    let mut names = FxHashSet::default();
    for member in &class.members {
        member.walk(&mut |node| {
            if let JNode::Ident(name) = node {
                names.insert(name.as_str());
            }
            node.for_each_type(&mut |ty| {
                ty.for_each_name(&mut |name| {
                    names.insert(name);
                });
            });
        });
    }
    names
}

fn function_arities(names: &FxHashSet<&str>) -> Vec<usize> {
    let mut arities: Vec<usize> = names
        .iter()
        .filter_map(|name| name.strip_prefix("Function")?.parse().ok())
        .collect();
    arities.sort_unstable();
    arities
}
