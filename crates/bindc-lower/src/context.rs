//! Translation context threaded through every recursive call.
//!
//! The context is an immutable value. Descending into a nested scope builds
//! a new context with [`TranslationContext::for_class`],
//! [`TranslationContext::for_function`] and friends; returning from the
//! scope simply drops it, so there is nothing to restore.

use bindc_target::JNode;
use bindc_tree::SymbolId;

/// How instance members are reached from the code being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverContext {
    /// Top-level script code: every member is static.
    #[default]
    ScriptAsStatic,
    /// Instance code compiled into a static method with an explicit
    /// `receiver$` parameter (mixin bodies).
    InstanceAsStatic,
    /// Ordinary instance code; the receiver is `this`.
    InstanceAsInstance,
}

/// An active on-replace trigger body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnReplaceInfo {
    /// The variable the trigger is attached to.
    pub var: SymbolId,
    pub new_elements: Option<SymbolId>,
}

/// An active `for` in-clause.
#[derive(Debug, Clone, PartialEq)]
pub struct InClauseInfo {
    pub var: SymbolId,
    /// Expression yielding the zero-based position of `var` in its sequence.
    pub index: JNode,
}

#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    pub class: Option<SymbolId>,
    pub function: Option<SymbolId>,
    pub receiver: ReceiverContext,
    /// Innermost last.
    pub on_replace: Vec<OnReplaceInfo>,
    /// Innermost last.
    pub in_clauses: Vec<InClauseInfo>,
    pub in_bind: bool,
    /// The variable whose bound initializer is being translated.
    pub bind_owner: Option<SymbolId>,
    /// Name of the class whose `this` an anonymous function body must
    /// qualify (`Outer.this`).
    pub function_value_outer: Option<String>,
    /// The body is an `invoke$` method whose Java return type is boxed, so a
    /// void function still returns `null`.
    pub boxed_return: bool,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_class(&self, class: SymbolId, receiver: ReceiverContext) -> Self {
        Self {
            class: Some(class),
            function: None,
            receiver,
            on_replace: Vec::new(),
            in_clauses: Vec::new(),
            in_bind: false,
            bind_owner: None,
            function_value_outer: None,
            boxed_return: false,
        }
    }

    pub fn for_function(&self, function: SymbolId) -> Self {
        Self {
            function: Some(function),
            in_clauses: Vec::new(),
            boxed_return: false,
            ..self.clone()
        }
    }

    pub fn with_receiver(&self, receiver: ReceiverContext) -> Self {
        Self {
            receiver,
            ..self.clone()
        }
    }

    pub fn entering_bind(&self, owner: SymbolId) -> Self {
        Self {
            in_bind: true,
            bind_owner: Some(owner),
            ..self.clone()
        }
    }

    pub fn with_on_replace(&self, info: OnReplaceInfo) -> Self {
        let mut next = self.clone();
        next.on_replace.push(info);
        next
    }

    pub fn with_in_clause(&self, info: InClauseInfo) -> Self {
        let mut next = self.clone();
        next.in_clauses.push(info);
        next
    }

    /// The body of an anonymous function. `outer` names the enclosing class
    /// when the body must reach its instance as `Outer.this`.
    pub fn for_function_value(&self, function: SymbolId, outer: Option<String>) -> Self {
        Self {
            function: Some(function),
            in_clauses: Vec::new(),
            function_value_outer: outer.or_else(|| self.function_value_outer.clone()),
            boxed_return: true,
            ..self.clone()
        }
    }

    /// The trigger whose new-elements parameter is `sym`, innermost first.
    pub fn on_replace_for(&self, sym: SymbolId) -> Option<&OnReplaceInfo> {
        self.on_replace
            .iter()
            .rev()
            .find(|info| info.new_elements == Some(sym))
    }

    pub fn in_clause_for(&self, var: SymbolId) -> Option<&InClauseInfo> {
        self.in_clauses.iter().rev().find(|info| info.var == var)
    }

    pub const fn is_static(&self) -> bool {
        matches!(self.receiver, ReceiverContext::ScriptAsStatic)
    }
}

/// Where a statement-lowered value goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Discard,
    /// Assign to the named local.
    AssignTo(String),
    Return,
}

/// Whether a translation must produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Yield {
    ToExpression,
    ToStatement(Sink),
}

impl Yield {
    pub const DISCARD: Yield = Yield::ToStatement(Sink::Discard);

    pub const fn is_expression(&self) -> bool {
        matches!(self, Self::ToExpression)
    }
}
