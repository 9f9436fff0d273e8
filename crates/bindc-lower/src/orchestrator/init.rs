//! Offsets, dispatchers, defaults, init hooks and constructors.
//!
//! Every cloned instance variable gets a slot offset, assigned on first use
//! of the class after the superclass's slots:
//!
//! ```text
//! public static int VCNT$ = -1;
//! public static int VOFF$a;
//! public static int VCNT$() {
//!     if (VCNT$ == -1) {
//!         int base = Super.VCNT$();
//!         VOFF$a = base + 0;
//!         VCNT$ = base + 1;
//!     }
//!     return VCNT$;
//! }
//! ```
//!
//! The per-offset dispatchers (`get$`, `set$`, `applyDefaults$`) compare the
//! offset directly when there is a single candidate. With more candidates
//! they switch over `GETMAP$C()[varNum$]`, a lazily built table from slot
//! offset to case number. Anything unmatched falls through to `super`.

use super::TranslatedVar;
use super::members::{VarInit, find_var};
use crate::analyzer::{self, ClassReport, VarInfo};
use crate::context::TranslationContext;
use crate::error::{LowerError, LowerResult};
use crate::translate::{Translator, var_flag};
use crate::typemorph;
use bindc_common::limits::DIRECT_COMPARE_MAX_CANDIDATES;
use bindc_common::names;
use bindc_common::runtime::{RuntimeMethod, var_flags};
use bindc_target::{
    JBinaryOp, JField, JMethod, JModifiers, JNode, JParam, JSwitchCase, JType,
};
use bindc_tree::SymbolId;
use tracing::trace;

/// One dispatcher arm.
struct Case {
    /// Case number in the class map, for cloned variables.
    number: Option<i32>,
    offset: JNode,
    body: Vec<JNode>,
}

impl Translator<'_> {
    // =========================================================================
    // Offsets
    // =========================================================================

    pub(super) fn offset_members(&mut self, report: &ClassReport) -> Vec<JNode> {
        let cloned = report.cloned_instance_vars();
        let count = report.instance_count as i32;
        let static_int = JModifiers::PUBLIC | JModifiers::STATIC;

        let mut out = vec![JNode::Field(JField {
            modifiers: static_int,
            ty: JType::Int,
            name: names::COUNT_FIELD.to_string(),
            init: Some(Box::new(JNode::int(-1))),
        })];
        for (_, info) in &cloned {
            out.push(JNode::Field(JField {
                modifiers: static_int,
                ty: JType::Int,
                name: names::offset(analyzer::name(info)),
                init: None,
            }));
        }

        let base_name = self.fresh_temp("base");
        let base = match report.superclasses.first() {
            Some(sup) => JNode::static_call(
                typemorph::class_type_name(self.program(), *sup),
                names::COUNT_FIELD,
                Vec::new(),
            ),
            None => JNode::int(0),
        };
        let mut assign = vec![JNode::local(JType::Int, base_name.clone(), Some(base))];
        for (_, info) in &cloned {
            let position = analyzer::enumeration(info).unwrap_or_default() as i32;
            assign.push(JNode::expr_stmt(JNode::assign(
                JNode::id(names::offset(analyzer::name(info))),
                JNode::binary(JNode::id(base_name.clone()), JBinaryOp::Add, JNode::int(position)),
            )));
        }
        assign.push(JNode::expr_stmt(JNode::assign(
            JNode::id(names::COUNT_FIELD),
            JNode::binary(JNode::id(base_name), JBinaryOp::Add, JNode::int(count)),
        )));
        let unset = JNode::binary(JNode::id(names::COUNT_FIELD), JBinaryOp::Eq, JNode::int(-1));
        out.push(JNode::Method(JMethod::new(
            static_int,
            JType::Int,
            names::COUNT_FIELD,
            Vec::new(),
            vec![
                JNode::if_stmt(unset, assign, None),
                JNode::ret(Some(JNode::id(names::COUNT_FIELD))),
            ],
        )));
        out.push(JNode::Method(JMethod::new(
            JModifiers::PUBLIC,
            JType::Int,
            names::COUNT,
            Vec::new(),
            vec![JNode::ret(Some(JNode::call_local(names::COUNT_FIELD, Vec::new())))],
        )));
        out.push(JNode::Method(JMethod::new(
            JModifiers::STATIC,
            JType::Void,
            names::STATIC_INITIALIZER,
            Vec::new(),
            vec![JNode::expr_stmt(JNode::call_local(names::COUNT_FIELD, Vec::new()))],
        )));
        out
    }

    // =========================================================================
    // Dispatchers
    // =========================================================================

    /// `get$`, `set$` and `applyDefaults$`, plus the case map when any of
    /// them switches.
    pub(super) fn dispatch_members(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
        vars: &[TranslatedVar],
    ) -> LowerResult<Vec<JNode>> {
        let class_name = self.program().symbols.name(report.class).to_string();
        let cloned = report.cloned_instance_vars();
        let case_number = |pos: usize| i32::try_from(pos + 1).unwrap_or(i32::MAX);
        let var_num = || JNode::id(names::VAR_NUM_PARAM);
        let mut uses_map = false;
        let mut out = Vec::new();

        let mut gets = Vec::new();
        let mut sets = Vec::new();
        for (pos, (_, info)) in cloned.iter().enumerate() {
            if !analyzer::needs_accessors(info) {
                continue;
            }
            let name = analyzer::name(info);
            let offset = JNode::id(names::offset(name));
            gets.push(Case {
                number: Some(case_number(pos)),
                offset: offset.clone(),
                body: vec![JNode::ret(Some(JNode::call_local(names::getter(name), Vec::new())))],
            });
            let boxed = typemorph::boxed_type(self.program(), analyzer::common(info).ty);
            sets.push(Case {
                number: Some(case_number(pos)),
                offset,
                body: vec![
                    JNode::expr_stmt(JNode::call_local(
                        names::setter(name),
                        vec![JNode::cast(boxed, JNode::id(names::NEW_VALUE_PARAM))],
                    )),
                    JNode::ret(None),
                ],
            });
        }
        if !gets.is_empty() {
            let fallback = JNode::ret(Some(JNode::call(
                JNode::Super,
                names::GET,
                vec![var_num()],
            )));
            let body = self.offset_dispatch(&class_name, gets, fallback, &mut uses_map);
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::object(),
                names::GET,
                vec![JParam::new(JType::Int, names::VAR_NUM_PARAM)],
                body,
            )));
        }
        if !sets.is_empty() {
            let fallback = JNode::expr_stmt(JNode::call(
                JNode::Super,
                names::SET,
                vec![var_num(), JNode::id(names::NEW_VALUE_PARAM)],
            ));
            let body = self.offset_dispatch(&class_name, sets, fallback, &mut uses_map);
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                names::SET,
                vec![
                    JParam::new(JType::Int, names::VAR_NUM_PARAM),
                    JParam::new(JType::object(), names::NEW_VALUE_PARAM),
                ],
                body,
            )));
        }

        let defaults = self.default_cases(ctx, report, vars)?;
        if !defaults.is_empty() {
            let fallback = JNode::expr_stmt(JNode::call(
                JNode::Super,
                names::APPLY_DEFAULTS,
                vec![var_num()],
            ));
            let body = self.offset_dispatch(&class_name, defaults, fallback, &mut uses_map);
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                names::APPLY_DEFAULTS,
                vec![JParam::new(JType::Int, names::VAR_NUM_PARAM)],
                body,
            )));
        }

        if uses_map {
            out.extend(self.case_map(&class_name, report));
        }
        Ok(out)
    }

    /// Arms comparing the offset directly come first; cloned variables with
    /// a case number share one switch when there are enough of them.
    fn offset_dispatch(
        &self,
        class_name: &str,
        cases: Vec<Case>,
        fallback: JNode,
        uses_map: &mut bool,
    ) -> Vec<JNode> {
        let var_num = || JNode::id(names::VAR_NUM_PARAM);
        let (numbered, direct): (Vec<Case>, Vec<Case>) =
            cases.into_iter().partition(|case| case.number.is_some());
        let mut body = Vec::new();
        let compare = |case: Case| {
            JNode::if_stmt(
                JNode::binary(var_num(), JBinaryOp::Eq, case.offset),
                case.body,
                None,
            )
        };
        body.extend(direct.into_iter().map(compare));
        if numbered.len() <= DIRECT_COMPARE_MAX_CANDIDATES {
            body.extend(numbered.into_iter().map(compare));
        } else {
            *uses_map = true;
            let selector = JNode::index(
                JNode::call_local(names::getmap(class_name), Vec::new()),
                var_num(),
            );
            let cases = numbered
                .into_iter()
                .map(|case| JSwitchCase {
                    label: case.number.map(JNode::int),
                    body: case.body,
                })
                .collect();
            body.push(JNode::Switch {
                selector: Box::new(selector),
                cases,
            });
        }
        body.push(fallback);
        body
    }

    /// `MAP$C` and its lazy builder `GETMAP$C()`.
    fn case_map(&self, class_name: &str, report: &ClassReport) -> Vec<JNode> {
        let map = names::map_field(class_name);
        let table = JType::array(JType::Int);
        let offsets = report
            .cloned_instance_vars()
            .into_iter()
            .map(|(_, info)| JNode::id(names::offset(analyzer::name(info))))
            .collect();
        let build = self.runtime_call(
            RuntimeMethod::MakeInitMap,
            vec![
                JNode::call_local(names::COUNT_FIELD, Vec::new()),
                JNode::ArrayInit {
                    elem: JType::Int,
                    items: offsets,
                },
            ],
        );
        let missing = JNode::binary(JNode::id(map.clone()), JBinaryOp::Eq, JNode::null());
        vec![
            JNode::Field(JField {
                modifiers: JModifiers::STATIC,
                ty: table.clone(),
                name: map.clone(),
                init: None,
            }),
            JNode::Method(JMethod::new(
                JModifiers::PUBLIC | JModifiers::STATIC,
                table,
                names::getmap(class_name),
                Vec::new(),
                vec![
                    JNode::if_stmt(
                        missing,
                        vec![JNode::expr_stmt(JNode::assign(JNode::id(map.clone()), build))],
                        None,
                    ),
                    JNode::ret(Some(JNode::id(map))),
                ],
            )),
        ]
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    /// One `applyDefaults$` arm per variable the class supplies a default
    /// for. Each arm ends in `return`.
    fn default_cases(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
        vars: &[TranslatedVar],
    ) -> LowerResult<Vec<Case>> {
        let numbers: Vec<SymbolId> = report
            .cloned_instance_vars()
            .into_iter()
            .map(|(_, info)| analyzer::sym(info))
            .collect();
        let mut cases = Vec::new();
        for info in &report.vars {
            if !analyzer::has_default(info) || analyzer::is_static(info) {
                continue;
            }
            let common = analyzer::common(info);
            let (slot, own, mixin) = match info {
                VarInfo::Translated(_) => (common.sym, Some(find_var(vars, common.sym)?), None),
                VarInfo::TranslatedOverride { overridden, .. } => {
                    (*overridden, Some(find_var(vars, common.sym)?), None)
                }
                VarInfo::MixinClass { mixin, .. } => {
                    let own = match common.overriding_sym {
                        Some(sym) => Some(find_var(vars, sym)?),
                        None => None,
                    };
                    (common.sym, own, Some(*mixin))
                }
                VarInfo::SuperClass(_) => continue,
            };

            let mut body = match own.map(|tv| &tv.init) {
                Some(VarInit::Value(expr)) => {
                    let (mut stmts, value) = expr.clone().split()?;
                    stmts.push(JNode::expr_stmt(self.member_write(ctx, None, slot, value)?));
                    stmts
                }
                Some(init) if init.bound_expr().is_some() => {
                    vec![self.invalidate_call(slot)?]
                }
                _ => match mixin {
                    Some(_) if common.bind.is_bound() => {
                        vec![self.invalidate_call(slot)?]
                    }
                    Some(mixin) if common.has_initializer => {
                        vec![JNode::expr_stmt(JNode::static_call(
                            self.program().symbols.name(mixin),
                            names::default_value(&common.name),
                            vec![JNode::This],
                        ))]
                    }
                    _ => {
                        trace!(var = %common.name, "no default to apply");
                        continue;
                    }
                },
            };
            body.push(JNode::ret(None));

            let number = numbers
                .iter()
                .position(|sym| *sym == slot)
                .map(|pos| i32::try_from(pos + 1).unwrap_or(i32::MAX));
            let offset = match number {
                Some(_) => JNode::id(names::offset(&common.name)),
                None => self.offset_ref(ctx, &JNode::This, slot)?,
            };
            cases.push(Case {
                number,
                offset,
                body,
            });
        }
        Ok(cases)
    }

    /// `invalidate$x()` on the slot: bound defaults are computed lazily.
    fn invalidate_call(&self, slot: SymbolId) -> LowerResult<JNode> {
        let name = self.symbol(slot)?.name.clone();
        Ok(JNode::expr_stmt(JNode::call_local(
            names::invalidate(&name),
            Vec::new(),
        )))
    }

    // =========================================================================
    // Init hooks
    // =========================================================================

    /// `initVars$`, `userInit$` and `postInit$`.
    pub(super) fn init_members(
        &mut self,
        ctx: &TranslationContext,
        report: &ClassReport,
        init_body: Vec<JNode>,
        post_init_body: Vec<JNode>,
    ) -> LowerResult<Vec<JNode>> {
        let mut out = Vec::new();

        let mut bound_bits = Vec::new();
        for info in &report.vars {
            if matches!(info, VarInfo::SuperClass(_))
                || analyzer::is_static(info)
                || !analyzer::is_bound(info)
            {
                continue;
            }
            let offset = match info {
                VarInfo::TranslatedOverride { overridden, .. } => {
                    self.offset_ref(ctx, &JNode::This, *overridden)?
                }
                other => JNode::id(names::offset(analyzer::name(other))),
            };
            bound_bits.push(JNode::expr_stmt(JNode::call_local(
                RuntimeMethod::VarChangeBits.name(),
                vec![offset, JNode::int(0), var_flag(var_flags::IS_BOUND_NAME)],
            )));
        }
        if !bound_bits.is_empty() {
            let mut body = vec![JNode::expr_stmt(JNode::call(
                JNode::Super,
                names::INIT_VARS,
                Vec::new(),
            ))];
            body.extend(bound_bits);
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                names::INIT_VARS,
                Vec::new(),
                body,
            )));
        }

        let init_mixins: Vec<SymbolId> = report
            .all_mixins
            .iter()
            .copied()
            .filter(|mixin| self.unit.has_init_blocks(*mixin))
            .collect();
        for (hook, body) in [(names::USER_INIT, init_body), (names::POST_INIT, post_init_body)] {
            if body.is_empty() && init_mixins.is_empty() {
                continue;
            }
            let mut stmts = vec![JNode::expr_stmt(JNode::call(JNode::Super, hook, Vec::new()))];
            for mixin in &init_mixins {
                stmts.push(JNode::expr_stmt(JNode::static_call(
                    self.program().symbols.name(*mixin),
                    hook,
                    vec![JNode::This],
                )));
            }
            stmts.extend(body);
            out.push(JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                hook,
                Vec::new(),
                stmts,
            )));
        }
        Ok(out)
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// The full-initialization constructor and the allocation-only one
    /// object literals use. A class reaching into its lexically enclosing
    /// instance also stores that instance.
    pub(super) fn constructors(
        &self,
        class: SymbolId,
        outer_class: Option<SymbolId>,
    ) -> LowerResult<Vec<JNode>> {
        let marker = JParam::new(JType::Boolean, names::MARKER_PARAM);
        let this_call = |args| JNode::expr_stmt(JNode::call_local("this", args));
        let super_call = JNode::expr_stmt(JNode::call_local(
            "super",
            vec![JNode::id(names::MARKER_PARAM)],
        ));
        let initialize = JNode::expr_stmt(JNode::call_local(names::INITIALIZE, Vec::new()));

        let outer = match outer_class {
            Some(outer) if self.unit.has_outer_reference(class) => Some(outer),
            None if self.unit.has_outer_reference(class) => {
                return Err(LowerError::internal(format!(
                    "class {} reaches an enclosing instance it does not have",
                    self.program().symbols.name(class)
                )));
            }
            _ => None,
        };
        let Some(outer) = outer else {
            return Ok(vec![
                JNode::Method(JMethod::new(
                    JModifiers::PUBLIC,
                    JType::Void,
                    names::CONSTRUCTOR,
                    Vec::new(),
                    vec![this_call(vec![JNode::bool(false)]), initialize],
                )),
                JNode::Method(JMethod::new(
                    JModifiers::PUBLIC,
                    JType::Void,
                    names::CONSTRUCTOR,
                    vec![marker],
                    vec![super_call],
                )),
            ]);
        };

        let outer_ty = JType::named(typemorph::class_type_name(self.program(), outer));
        let outer_param = JParam::new(outer_ty.clone(), names::OUTER_PARAM);
        Ok(vec![
            JNode::Field(JField {
                modifiers: JModifiers::PUBLIC,
                ty: outer_ty,
                name: names::OUTER_FIELD.to_string(),
                init: None,
            }),
            JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                names::CONSTRUCTOR,
                vec![outer_param.clone()],
                vec![
                    this_call(vec![JNode::bool(false), JNode::id(names::OUTER_PARAM)]),
                    initialize,
                ],
            )),
            JNode::Method(JMethod::new(
                JModifiers::PUBLIC,
                JType::Void,
                names::CONSTRUCTOR,
                vec![marker, outer_param],
                vec![
                    super_call,
                    JNode::expr_stmt(JNode::assign(
                        JNode::id(names::OUTER_FIELD),
                        JNode::id(names::OUTER_PARAM),
                    )),
                ],
            )),
        ])
    }
}
