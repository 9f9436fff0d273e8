//! Class and script assembly.
//!
//! The orchestrator drives the translator over declarations and assembles
//! the generated classes. A declarative class goes through a fixed sequence
//! of phases, logged at `debug` level:
//!
//! 1. `Entering`: split the members by kind, open a definitions buffer
//! 2. `TranslatingMembers`: translate initializers, triggers, functions and
//!    init blocks, recording each variable's binding facts
//! 3. `Flattening`: run the class analyzer over the translated members
//! 4. `Emitting`: generate storage, accessors and protocol methods
//! 5. `Done`
//!
//! Sub-modules, each adding an `impl Translator<'_>` block:
//!
//! | module    | generates                                                    |
//! |-----------|--------------------------------------------------------------|
//! | `members` | variable translation, storage and accessors, user functions |
//! | `init`    | offsets, `count$`, dispatchers, defaults, constructors       |
//! | `update`  | `update$` and dependence switching for inter-object binds    |
//! | `mixin`   | mixin interfaces and their static implementations            |
//! | `script`  | the script class, `run$` and the compilation unit            |

mod init;
mod members;
mod mixin;
mod script;
mod update;

use members::{TranslatedMembers, TranslatedVar};

use crate::analyzer::{self, ClassInput, ClassReport, OwnOverride, OwnVar};
use crate::context::{ReceiverContext, TranslationContext};
use crate::error::{LowerError, LowerResult};
use crate::translate::Translator;
use crate::typemorph;
use bindc_common::limits::MAX_CLASS_NESTING;
use bindc_common::runtime::RuntimeClass;
use bindc_target::{JClass, JModifiers, JNode, JType};
use bindc_tree::{
    ClassDecl, FunctionDef, NodeIndex, NodeKind, OverrideVar, SymbolFlags, SymbolId, VarDecl,
};
use tracing::debug;

/// Where a class translation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPhase {
    Entering,
    TranslatingMembers,
    Flattening,
    Emitting,
    Done,
}

impl ClassPhase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Entering => "entering",
            Self::TranslatingMembers => "translating-members",
            Self::Flattening => "flattening",
            Self::Emitting => "emitting",
            Self::Done => "done",
        }
    }
}

/// Logs phase transitions of one class.
struct PhaseTracker {
    class: String,
    phase: ClassPhase,
}

impl PhaseTracker {
    fn new(class: &str) -> Self {
        debug!(class, phase = ClassPhase::Entering.name(), "class phase");
        Self {
            class: class.to_string(),
            phase: ClassPhase::Entering,
        }
    }

    fn advance(&mut self, next: ClassPhase) {
        debug!(
            class = %self.class,
            from = self.phase.name(),
            to = next.name(),
            "class phase"
        );
        self.phase = next;
    }
}

/// The members of one class body, split by kind.
#[derive(Debug, Default)]
pub(crate) struct ClassMembers<'a> {
    pub vars: Vec<&'a VarDecl>,
    pub overrides: Vec<&'a OverrideVar>,
    pub functions: Vec<&'a FunctionDef>,
    pub init_blocks: Vec<NodeIndex>,
    pub post_init_blocks: Vec<NodeIndex>,
    pub classes: Vec<&'a ClassDecl>,
    /// Everything else, in source order. Only a script body has these.
    pub statements: Vec<NodeIndex>,
}

impl<'a> Translator<'a> {
    pub(crate) fn collect_members(&self, members: &[NodeIndex]) -> LowerResult<ClassMembers<'a>> {
        let mut out = ClassMembers::default();
        for member in members {
            match &self.node(*member)?.kind {
                NodeKind::VarDecl(decl) => out.vars.push(decl),
                NodeKind::OverrideVar(decl) => out.overrides.push(decl),
                NodeKind::FunctionDef(def) => out.functions.push(def),
                NodeKind::InitBlock(body) => out.init_blocks.push(*body),
                NodeKind::PostInitBlock(body) => out.post_init_blocks.push(*body),
                NodeKind::ClassDecl(decl) => out.classes.push(decl),
                _ => out.statements.push(*member),
            }
        }
        Ok(out)
    }
}

impl Translator<'_> {
    /// Generated declarations for a class declared inside `outer`: one
    /// class, or an interface plus its implementation for a mixin.
    pub(crate) fn class_definitions(
        &mut self,
        outer: &TranslationContext,
        decl: &ClassDecl,
    ) -> LowerResult<Vec<JNode>> {
        if self.class_depth >= MAX_CLASS_NESTING {
            return Err(LowerError::DepthExceeded {
                limit: MAX_CLASS_NESTING,
            });
        }
        self.class_depth += 1;
        let result = self.class_definitions_inner(outer, decl);
        self.class_depth -= 1;
        result
    }

    fn class_definitions_inner(
        &mut self,
        outer: &TranslationContext,
        decl: &ClassDecl,
    ) -> LowerResult<Vec<JNode>> {
        let symbols = &self.program().symbols;
        if symbols.has_flag(decl.sym, SymbolFlags::JAVA_CLASS) {
            return Err(LowerError::unsupported(format!(
                "declaration of plain class {}",
                symbols.name(decl.sym)
            )));
        }
        if symbols.is_mixin(decl.sym) {
            return self.mixin_definitions(decl);
        }
        Ok(vec![JNode::Class(self.declarative_class(outer, decl)?)])
    }

    /// A declarative class with the complete generated-object protocol.
    fn declarative_class(
        &mut self,
        outer: &TranslationContext,
        decl: &ClassDecl,
    ) -> LowerResult<JClass> {
        let class = decl.sym;
        let symbol = self.symbol(class)?;
        let name = symbol.name.clone();
        let mut phase = PhaseTracker::new(&name);
        let members = self.collect_members(&decl.members)?;
        if !members.statements.is_empty() {
            return Err(LowerError::internal(format!(
                "class {name} has statements in its body"
            )));
        }
        let superclass = symbol.class_data().and_then(|data| data.superclass);
        if let Some(sup) = superclass
            && !typemorph::is_declarative_class(self.program(), sup)
        {
            return Err(LowerError::unsupported(format!(
                "declarative class {name} extending a plain class"
            )));
        }
        let ctx = outer.for_class(class, ReceiverContext::InstanceAsInstance);
        self.unit.push_definitions();

        phase.advance(ClassPhase::TranslatingMembers);
        let translated = self.translate_members(&ctx, &members);
        let TranslatedMembers {
            vars,
            functions,
            init_body,
            post_init_body,
        } = match translated {
            Ok(parts) => parts,
            Err(err) => {
                let _ = self.unit.pop_definitions();
                return Err(err);
            }
        };

        phase.advance(ClassPhase::Flattening);
        let own_vars: Vec<OwnVar> = vars
            .iter()
            .filter(|tv| tv.overridden.is_none())
            .map(|tv| OwnVar {
                sym: tv.sym,
                deps: tv.deps.clone(),
            })
            .collect();
        let own_overrides: Vec<OwnOverride> = vars
            .iter()
            .filter_map(|tv| {
                tv.overridden.map(|overridden| OwnOverride {
                    sym: tv.sym,
                    overridden,
                    deps: tv.deps.clone(),
                })
            })
            .collect();
        let own_functions: Vec<_> = members.functions.iter().map(|def| def.sym).collect();
        let report = analyzer::analyze(
            self.program(),
            ClassInput {
                class,
                own_vars: &own_vars,
                own_overrides: &own_overrides,
                own_functions: &own_functions,
                known: self.unit.known_vars(),
            },
        );
        let report = match report {
            Ok(report) => report,
            Err(err) => {
                let _ = self.unit.pop_definitions();
                return Err(err);
            }
        };

        phase.advance(ClassPhase::Emitting);
        let outer_class = match outer.receiver {
            ReceiverContext::InstanceAsInstance => outer.class,
            _ => None,
        };
        let emitted = self.emit_class(
            &ctx,
            &report,
            &vars,
            functions,
            init_body,
            post_init_body,
            outer_class,
        );
        let nested = self.unit.pop_definitions()?;
        let mut jclass = emitted?;
        jclass.members.extend(nested);
        phase.advance(ClassPhase::Done);
        Ok(jclass)
    }

    /// Assemble the generated class from the translated members and the
    /// analyzer report.
    #[allow(clippy::too_many_arguments)]
    fn emit_class(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
        vars: &[TranslatedVar],
        functions: Vec<JNode>,
        init_body: Vec<JNode>,
        post_init_body: Vec<JNode>,
        outer_class: Option<SymbolId>,
    ) -> LowerResult<JClass> {
        let class = report.class;
        let symbol = self.symbol(class)?;
        let name = symbol.name.clone();

        let superclass = match report.superclasses.first() {
            Some(sup) => JType::named(typemorph::class_type_name(self.program(), *sup)),
            None => JType::named(RuntimeClass::FXBase.name()),
        };
        let mut interfaces = vec![JType::named(RuntimeClass::FXObject.name())];
        for mixin in &report.immediate_mixins {
            interfaces.push(JType::named(typemorph::class_type_name(self.program(), *mixin)));
        }

        let mut body = Vec::new();
        body.extend(self.offset_members(report));
        for idx in 0..report.vars.len() {
            body.extend(self.report_var_members(ctx, report, idx, vars)?);
        }
        body.extend(self.dispatch_members(ctx, report, vars)?);
        body.extend(self.init_members(ctx, report, init_body, post_init_body)?);
        body.extend(self.update_members(ctx, report)?);
        body.extend(self.constructors(class, outer_class)?);
        body.extend(functions);
        body.extend(self.mixin_forwarders(report)?);

        let is_abstract = symbol.flags.contains(SymbolFlags::ABSTRACT)
            || body.iter().any(|member| {
                matches!(member, JNode::Method(m) if m.modifiers.contains(JModifiers::ABSTRACT))
            });
        let mut modifiers = JModifiers::PUBLIC;
        if self.program().symbols.owner(class).is_some() {
            modifiers |= JModifiers::STATIC;
        }
        if is_abstract {
            modifiers |= JModifiers::ABSTRACT;
        }
        Ok(JClass {
            modifiers,
            name,
            is_interface: false,
            superclass: Some(superclass),
            interfaces,
            members: body,
        })
    }
}
