//! Interpreter for lowered compilation units.
//!
//! Executes the part of the target tree the lowering core emits, with a
//! native stand-in for the runtime library: sequences and sequence
//! builders, null and equality checks, `Math`, and the `FXBase` object
//! protocol (slot flag bits, dependent notification, two-phase
//! initialization).
//!
//! Values are dynamically typed. Integral types share one `i64`
//! representation and floating types one `f64`; casts convert between them.

use bindc_common::runtime::var_flags;
use bindc_target::{JBinaryOp, JField, JLiteral, JMethod, JModifiers, JNode, JType, JUnaryOp};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

const MAX_CALL_DEPTH: u32 = 200;
const MAX_STEPS: u64 = 1_000_000;

/// Runtime classes the native layer answers for.
const RUNTIME_CLASSES: &[&str] = &[
    "Sequences",
    "Checks",
    "FXBase",
    "FXObject",
    "TypeInfo",
    "ArraySequence",
    "Sequence",
    "Math",
    "Pointer",
];

#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Char(char),
    Str(Rc<str>),
    Seq(Rc<Vec<Value>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Builder(Rc<RefCell<Vec<Value>>>),
    Obj(Rc<RefCell<Object>>),
    TypeInfo(Rc<str>),
    Class(Rc<str>),
}

impl Value {
    pub fn seq(items: Vec<Value>) -> Self {
        Self::Seq(Rc::new(items))
    }

    pub fn ints(items: &[i64]) -> Self {
        Self::seq(items.iter().map(|i| Self::Int(*i)).collect())
    }

    pub fn strs(items: &[&str]) -> Self {
        Self::seq(items.iter().map(|s| Self::Str((*s).into())).collect())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Char(c) => Some(i64::from(u32::from(*c))),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a sequence or an array.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Self::Seq(items) => Some(items.as_ref().clone()),
            Self::Array(items) | Self::Builder(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    pub fn int_items(&self) -> Option<Vec<i64>> {
        self.items()?.iter().map(Self::as_int).collect()
    }

    pub fn str_items(&self) -> Option<Vec<String>> {
        self.items()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    fn number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::Char(c) => Some(f64::from(u32::from(*c))),
            _ => None,
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Void => String::new(),
            Self::Null => "null".into(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Double(d) => format!("{d:?}"),
            Self::Char(c) => c.to_string(),
            Self::Str(s) => s.to_string(),
            Self::Seq(items) => {
                let parts: Vec<String> = items.iter().map(Self::display).collect();
                format!("[ {} ]", parts.join(", "))
            }
            Self::Obj(obj) => format!("{}@obj", obj.borrow().class),
            Self::TypeInfo(name) | Self::Class(name) => name.to_string(),
            Self::Array(_) | Self::Builder(_) => "array".into(),
        }
    }
}

/// `==` semantics: identity for mutable references, value for the rest.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Obj(x), Value::Obj(y)) => Rc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) | (Value::Builder(x), Value::Builder(y)) => {
            Rc::ptr_eq(x, y)
        }
        (Value::Seq(x), Value::Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::TypeInfo(x), Value::TypeInfo(y)) | (Value::Class(x), Value::Class(y)) => x == y,
        _ => match (a.number(), b.number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// An instance of a generated class.
#[derive(Debug)]
pub struct Object {
    pub class: String,
    pub fields: FxHashMap<String, Value>,
    bits: FxHashMap<i64, i64>,
    /// `slot → objects whose update$ runs when the slot changes`
    dependents: FxHashMap<i64, Vec<Rc<RefCell<Object>>>>,
}

struct ClassDef {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    outer: Option<String>,
    fields: Vec<JField>,
    methods: Vec<JMethod>,
}

enum Flow {
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Value),
    Error(String),
}

type Exec<T> = Result<T, Flow>;

fn fail<T>(msg: impl Into<String>) -> Exec<T> {
    Err(Flow::Error(msg.into()))
}

fn describe(flow: Flow) -> String {
    match flow {
        Flow::Error(msg) => msg,
        Flow::Throw(value) => format!("uncaught throw of {}", value.display()),
        Flow::Return(_) => "return outside a method".into(),
        Flow::Break(_) | Flow::Continue(_) => "jump outside a loop".into(),
    }
}

fn int_of(value: &Value) -> Exec<i64> {
    match value.as_int() {
        Some(i) => Ok(i),
        None => fail(format!("expected an integer, found {value:?}")),
    }
}

fn truthy(value: &Value) -> Exec<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => fail(format!("expected a boolean, found {other:?}")),
    }
}

fn default_for(ty: &JType) -> Value {
    match ty {
        JType::Boolean => Value::Bool(false),
        JType::Char => Value::Char('\0'),
        JType::Byte | JType::Short | JType::Int | JType::Long => Value::Int(0),
        JType::Float | JType::Double => Value::Double(0.0),
        _ => Value::Null,
    }
}

fn is_static(modifiers: JModifiers) -> bool {
    modifiers.contains(JModifiers::STATIC)
}

struct Frame {
    class: String,
    this: Option<Rc<RefCell<Object>>>,
    scopes: Vec<FxHashMap<String, Value>>,
}

impl Frame {
    fn new(class: &str, this: Option<Rc<RefCell<Object>>>) -> Self {
        Self {
            class: class.to_string(),
            this,
            scopes: vec![FxHashMap::default()],
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn has_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        if let Some(scope) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.contains_key(name))
        {
            scope.insert(name.to_string(), value);
        }
    }

    fn this_has_field(&self, name: &str) -> bool {
        self.this
            .as_ref()
            .is_some_and(|this| this.borrow().fields.contains_key(name))
    }
}

enum Place {
    Local(String),
    Field(Rc<RefCell<Object>>, String),
    Static(String, String),
    Elem(Rc<RefCell<Vec<Value>>>, usize),
}

pub struct Interp {
    classes: FxHashMap<String, Rc<ClassDef>>,
    statics: FxHashMap<(String, String), Value>,
    initialized: FxHashSet<String>,
    main: Option<String>,
    depth: u32,
    steps: u64,
}

impl Interp {
    /// Load every class of a compilation unit, nested ones included.
    pub fn new(unit: &JNode) -> Self {
        let mut interp = Self {
            classes: FxHashMap::default(),
            statics: FxHashMap::default(),
            initialized: FxHashSet::default(),
            main: None,
            depth: 0,
            steps: 0,
        };
        let types: &[JNode] = match unit {
            JNode::CompilationUnit { types, .. } => types,
            other => std::slice::from_ref(other),
        };
        for ty in types {
            if let JNode::Class(class) = ty {
                if interp.main.is_none() {
                    interp.main = Some(class.name.clone());
                }
                interp.load(class, None);
            }
        }
        interp
    }

    fn load(&mut self, class: &bindc_target::JClass, outer: Option<&str>) {
        let def = ClassDef {
            name: class.name.clone(),
            superclass: class.superclass.as_ref().map(JType::base_name),
            interfaces: class.interfaces.iter().map(JType::base_name).collect(),
            outer: outer.map(str::to_string),
            fields: class.fields().cloned().collect(),
            methods: class.methods().cloned().collect(),
        };
        self.classes.insert(class.name.clone(), Rc::new(def));
        for nested in class.nested() {
            self.load(nested, Some(&class.name));
        }
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Run the script body, `run$`, of the first class in the unit.
    pub fn run_main(&mut self) -> Result<Value, String> {
        let main = self.main.clone().ok_or("compilation unit has no class")?;
        self.call_static(&main, "run$", vec![Value::seq(Vec::new())])
    }

    pub fn call_static(&mut self, class: &str, method: &str, args: Vec<Value>) -> Result<Value, String> {
        self.static_call(class, method, args).map_err(describe)
    }

    pub fn call(&mut self, recv: &Value, method: &str, args: Vec<Value>) -> Result<Value, String> {
        self.virtual_call(recv.clone(), method, args).map_err(describe)
    }

    /// `new C()`: the full-initialization constructor.
    pub fn new_object(&mut self, class: &str) -> Result<Value, String> {
        self.instantiate(class, Vec::new()).map_err(describe)
    }

    pub fn field(&self, obj: &Value, name: &str) -> Option<Value> {
        match obj {
            Value::Obj(obj) => obj.borrow().fields.get(name).cloned(),
            _ => None,
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn class(&self, name: &str) -> Option<Rc<ClassDef>> {
        self.classes.get(name).cloned()
    }

    fn is_class_name(&self, name: &str) -> bool {
        self.classes.contains_key(name) || RUNTIME_CLASSES.contains(&name)
    }

    fn superclass_of(&self, name: &str) -> Option<String> {
        self.classes.get(name).and_then(|def| def.superclass.clone())
    }

    fn is_subtype(&self, class: &str, target: &str) -> bool {
        if class == target || target == "Object" {
            return true;
        }
        let Some(def) = self.classes.get(class) else {
            return class == "FXBase" && target == "FXObject";
        };
        def.superclass
            .iter()
            .chain(def.interfaces.iter())
            .any(|sup| self.is_subtype(sup, target))
    }

    /// The class holding static field `field` as seen from `class`: its
    /// superclass chain first, then each enclosing class.
    fn static_owner(&self, class: &str, field: &str) -> Option<String> {
        let mut scope = self.classes.get(class);
        while let Some(outer_def) = scope {
            let mut current = Some(outer_def);
            while let Some(def) = current {
                if def
                    .fields
                    .iter()
                    .any(|f| f.name == field && is_static(f.modifiers))
                {
                    return Some(def.name.clone());
                }
                current = def.superclass.as_ref().and_then(|s| self.classes.get(s));
            }
            scope = outer_def.outer.as_ref().and_then(|o| self.classes.get(o));
        }
        None
    }

    /// A method with a body, searched up the superclass chain.
    fn find_method(
        &self,
        class: &str,
        name: &str,
        arity: usize,
        statik: Option<bool>,
    ) -> Option<(Rc<ClassDef>, usize)> {
        let mut current = self.class(class);
        while let Some(def) = current {
            if let Some(idx) = def.methods.iter().position(|m| {
                m.name == name
                    && m.params.len() == arity
                    && m.body.is_some()
                    && statik.is_none_or(|s| is_static(m.modifiers) == s)
            }) {
                return Some((def, idx));
            }
            current = def.superclass.as_deref().and_then(|s| self.class(s));
        }
        None
    }

    fn find_static(&self, class: &str, name: &str, arity: usize) -> Option<(Rc<ClassDef>, usize)> {
        let mut scope = Some(class.to_string());
        while let Some(current) = scope {
            if let Some(found) = self.find_method(&current, name, arity, Some(true)) {
                return Some(found);
            }
            scope = self.classes.get(&current).and_then(|def| def.outer.clone());
        }
        None
    }

    fn ensure_init(&mut self, name: &str) -> Exec<()> {
        if self.initialized.contains(name) {
            return Ok(());
        }
        let Some(def) = self.class(name) else {
            return Ok(());
        };
        self.initialized.insert(name.to_string());
        if let Some(sup) = &def.superclass {
            self.ensure_init(sup)?;
        }
        for field in def.fields.iter().filter(|f| is_static(f.modifiers)) {
            self.statics
                .insert((def.name.clone(), field.name.clone()), default_for(&field.ty));
        }
        for field in def.fields.iter().filter(|f| is_static(f.modifiers)) {
            if let Some(init) = &field.init {
                let mut frame = Frame::new(&def.name, None);
                let value = self.eval(&mut frame, init)?;
                self.statics.insert((def.name.clone(), field.name.clone()), value);
            }
        }
        if let Some(clinit) = def.methods.iter().find(|m| m.is_static_initializer()) {
            self.invoke(&def.name, clinit, None, Vec::new())?;
        }
        Ok(())
    }

    fn read_static(&mut self, owner: &str, field: &str) -> Exec<Value> {
        self.ensure_init(owner)?;
        Ok(self
            .statics
            .get(&(owner.to_string(), field.to_string()))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Classes from the root user class down to `name`.
    fn chain(&self, name: &str) -> Vec<Rc<ClassDef>> {
        let mut chain = Vec::new();
        let mut current = self.class(name);
        while let Some(def) = current {
            current = def.superclass.as_deref().and_then(|s| self.class(s));
            chain.push(def);
        }
        chain.reverse();
        chain
    }

    fn instantiate(&mut self, name: &str, args: Vec<Value>) -> Exec<Value> {
        if !self.classes.contains_key(name) {
            return fail(format!("cannot instantiate unknown class {name}"));
        }
        self.ensure_init(name)?;
        let chain = self.chain(name);
        let mut fields = FxHashMap::default();
        for def in &chain {
            for field in def.fields.iter().filter(|f| !is_static(f.modifiers)) {
                fields.insert(field.name.clone(), default_for(&field.ty));
            }
        }
        let obj = Rc::new(RefCell::new(Object {
            class: name.to_string(),
            fields,
            bits: FxHashMap::default(),
            dependents: FxHashMap::default(),
        }));
        for def in &chain {
            for field in def.fields.iter().filter(|f| !is_static(f.modifiers)) {
                if let Some(init) = &field.init {
                    let mut frame = Frame::new(&def.name, Some(obj.clone()));
                    let value = self.eval(&mut frame, init)?;
                    obj.borrow_mut().fields.insert(field.name.clone(), value);
                }
            }
        }
        self.construct(name, &obj, args)?;
        Ok(Value::Obj(obj))
    }

    fn construct(&mut self, class: &str, obj: &Rc<RefCell<Object>>, args: Vec<Value>) -> Exec<()> {
        let Some(def) = self.class(class) else {
            // Runtime base classes have nothing to construct.
            return Ok(());
        };
        let ctor = def
            .methods
            .iter()
            .find(|m| m.is_constructor() && m.params.len() == args.len());
        match ctor {
            Some(ctor) => self.invoke(&def.name, ctor, Some(obj.clone()), args).map(drop),
            None if args.is_empty() => match &def.superclass {
                Some(sup) => self.construct(sup, obj, Vec::new()),
                None => Ok(()),
            },
            None => fail(format!("{class} has no constructor taking {} arguments", args.len())),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn invoke(
        &mut self,
        class: &str,
        method: &JMethod,
        this: Option<Rc<RefCell<Object>>>,
        args: Vec<Value>,
    ) -> Exec<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return fail(format!("call depth exceeded in {class}.{}", method.name));
        }
        let mut frame = Frame::new(class, this);
        for (param, value) in method.params.iter().zip(args) {
            frame.declare(&param.name, value);
        }
        self.depth += 1;
        let result = self.exec_stmts(&mut frame, method.body.as_deref().unwrap_or_default());
        self.depth -= 1;
        match result {
            Ok(()) => Ok(Value::Void),
            Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break(_) | Flow::Continue(_)) => {
                fail(format!("jump escaped {class}.{}", method.name))
            }
            Err(other) => Err(other),
        }
    }

    fn static_call(&mut self, class: &str, method: &str, args: Vec<Value>) -> Exec<Value> {
        if self.classes.contains_key(class) {
            self.ensure_init(class)?;
            let Some((def, idx)) = self.find_method(class, method, args.len(), Some(true)) else {
                return fail(format!("no static method {class}.{method}/{}", args.len()));
            };
            return self.invoke(&def.name, &def.methods[idx], None, args);
        }
        self.runtime_static(class, method, args)
    }

    fn virtual_call(&mut self, recv: Value, method: &str, args: Vec<Value>) -> Exec<Value> {
        match recv {
            Value::Obj(obj) => {
                let class = obj.borrow().class.clone();
                if let Some((def, idx)) = self.find_method(&class, method, args.len(), None) {
                    let target = &def.methods[idx];
                    let this = (!is_static(target.modifiers)).then(|| obj.clone());
                    return self.invoke(&def.name, target, this, args);
                }
                self.object_native(&obj, method, args)
            }
            Value::Builder(items) => match (method, args.as_slice()) {
                ("add", [item]) => {
                    if !item.is_null() {
                        items.borrow_mut().push(item.clone());
                    }
                    Ok(Value::Void)
                }
                ("addAll", [seq]) => {
                    let more = seq.items().unwrap_or_default();
                    items.borrow_mut().extend(more);
                    Ok(Value::Void)
                }
                ("toSequence", []) => Ok(Value::seq(items.borrow().clone())),
                _ => fail(format!("no builder method {method}")),
            },
            Value::Str(s) => match (method, args.as_slice()) {
                ("length", []) => Ok(Value::Int(s.chars().count() as i64)),
                ("equals", [other]) => Ok(Value::Bool(values_equal(&Value::Str(s), other))),
                _ => fail(format!("no string method {method}")),
            },
            Value::Null => Err(Flow::Throw(Value::Str("NullPointerException".into()))),
            other => fail(format!("cannot call {method} on {other:?}")),
        }
    }

    /// An unqualified call: an instance method of `this`, a static method
    /// in scope, or the runtime base protocol.
    fn local_call(&mut self, frame: &Frame, method: &str, args: Vec<Value>) -> Exec<Value> {
        if let Some(this) = frame.this.clone() {
            let class = this.borrow().class.clone();
            if let Some((def, idx)) = self.find_method(&class, method, args.len(), Some(false)) {
                return self.invoke(&def.name, &def.methods[idx], Some(this), args);
            }
        }
        if let Some((def, idx)) = self.find_static(&frame.class, method, args.len()) {
            self.ensure_init(&def.name)?;
            return self.invoke(&def.name, &def.methods[idx], None, args);
        }
        match frame.this.clone() {
            Some(this) => self.object_native(&this, method, args),
            None => fail(format!("no method {method}/{} in {}", args.len(), frame.class)),
        }
    }

    fn super_call(&mut self, frame: &Frame, method: &str, args: Vec<Value>) -> Exec<Value> {
        let Some(this) = frame.this.clone() else {
            return fail("super call without an instance");
        };
        if let Some(sup) = self.superclass_of(&frame.class)
            && let Some((def, idx)) = self.find_method(&sup, method, args.len(), Some(false))
        {
            return self.invoke(&def.name, &def.methods[idx], Some(this), args);
        }
        self.object_native(&this, method, args)
    }

    /// The `FXBase` instance protocol.
    fn object_native(&mut self, obj: &Rc<RefCell<Object>>, method: &str, args: Vec<Value>) -> Exec<Value> {
        let this = || Value::Obj(obj.clone());
        match (method, args.as_slice()) {
            ("varTestBits$", [slot, mask]) => {
                let bits = obj.borrow().bits.get(&int_of(slot)?).copied().unwrap_or(0);
                Ok(Value::Bool(bits & int_of(mask)? != 0))
            }
            ("varChangeBits$", [slot, clear, set]) => {
                let slot = int_of(slot)?;
                let (clear, set) = (int_of(clear)?, int_of(set)?);
                let mut o = obj.borrow_mut();
                let bits = o.bits.entry(slot).or_insert(0);
                *bits = (*bits & !clear) | set;
                Ok(Value::Void)
            }
            ("notifyDependents$", [slot]) => {
                let slot = int_of(slot)?;
                let dependents = obj.borrow().dependents.get(&slot).cloned().unwrap_or_default();
                for dependent in dependents {
                    self.virtual_call(Value::Obj(dependent), "update$", vec![this(), Value::Int(slot)])?;
                }
                self.virtual_call(this(), "update$", vec![this(), Value::Int(slot)])?;
                Ok(Value::Void)
            }
            ("switchDependence$", [old, new, slot]) => {
                let slot = int_of(slot)?;
                if let Value::Obj(old) = old {
                    if let Some(list) = old.borrow_mut().dependents.get_mut(&slot) {
                        list.retain(|d| !Rc::ptr_eq(d, obj));
                    }
                }
                if let Value::Obj(new) = new {
                    new.borrow_mut()
                        .dependents
                        .entry(slot)
                        .or_default()
                        .push(obj.clone());
                }
                Ok(Value::Void)
            }
            ("initialize$", []) => {
                self.virtual_call(this(), "initVars$", Vec::new())?;
                let count = int_of(&self.virtual_call(this(), "count$", Vec::new())?)?;
                let mask = i64::from(var_flags::INIT_MASK);
                for slot in 0..count {
                    let set = obj.borrow().bits.get(&slot).copied().unwrap_or(0) & mask != 0;
                    if !set {
                        self.virtual_call(this(), "applyDefaults$", vec![Value::Int(slot)])?;
                    }
                }
                self.virtual_call(this(), "complete$", Vec::new())
            }
            ("complete$", []) => {
                let count = int_of(&self.virtual_call(this(), "count$", Vec::new())?)?;
                for slot in 0..count {
                    *obj.borrow_mut().bits.entry(slot).or_insert(0) |= i64::from(var_flags::INITIALIZED);
                }
                self.virtual_call(this(), "userInit$", Vec::new())?;
                self.virtual_call(this(), "postInit$", Vec::new())
            }
            ("initVars$" | "userInit$" | "postInit$", [])
            | ("applyDefaults$", [_])
            | ("update$", [_, _]) => Ok(Value::Void),
            ("count$", []) => Ok(Value::Int(0)),
            _ => fail(format!(
                "no method {method}/{} on {}",
                args.len(),
                obj.borrow().class
            )),
        }
    }

    fn runtime_static(&mut self, class: &str, method: &str, args: Vec<Value>) -> Exec<Value> {
        let seq_of = |v: &Value| v.items().unwrap_or_default();
        match (class, method, args.as_slice()) {
            ("FXBase", "VCNT$", []) => Ok(Value::Int(0)),
            ("FXBase", "makeInitMap$", [count, offsets]) => {
                let mut map = vec![Value::Int(0); usize::try_from(int_of(count)?).unwrap_or(0)];
                for (case, offset) in seq_of(offsets).iter().enumerate() {
                    let slot = usize::try_from(int_of(offset)?).unwrap_or(usize::MAX);
                    if let Some(entry) = map.get_mut(slot) {
                        *entry = Value::Int(case as i64 + 1);
                    }
                }
                Ok(Value::Array(Rc::new(RefCell::new(map))))
            }
            ("Sequences", "empty", [_]) => Ok(Value::seq(Vec::new())),
            ("Sequences", "singleton", [_, item]) => Ok(Value::seq(if item.is_null() {
                Vec::new()
            } else {
                vec![item.clone()]
            })),
            ("Sequences", "size", [seq]) => Ok(Value::Int(seq_of(seq).len() as i64)),
            ("Sequences", "get", [seq, index]) => {
                let items = seq_of(seq);
                let index = int_of(index)?;
                Ok(usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Null))
            }
            ("Sequences", "fromArray", [array]) | ("Sequences", "fromArray", [_, array]) => {
                Ok(Value::seq(seq_of(array)))
            }
            ("Sequences", "toArray", [_, seq]) => {
                Ok(Value::Array(Rc::new(RefCell::new(seq_of(seq)))))
            }
            ("Sequences", "isEqual", [a, b]) => {
                Ok(Value::Bool(values_equal(&Value::seq(seq_of(a)), &Value::seq(seq_of(b)))))
            }
            ("Sequences", "reverse", [seq]) => {
                let mut items = seq_of(seq);
                items.reverse();
                Ok(Value::seq(items))
            }
            ("Sequences", "withInserted", [seq, value]) => {
                let len = seq_of(seq).len() as i64;
                Ok(spliced(seq_of(seq), len, value))
            }
            ("Sequences", "withInsertedBefore", [seq, value, at]) => {
                Ok(spliced(seq_of(seq), int_of(at)?, value))
            }
            ("Sequences", "withInsertedAfter", [seq, value, at]) => {
                Ok(spliced(seq_of(seq), int_of(at)? + 1, value))
            }
            ("Sequences", "withDeletedIndex", [seq, at]) => {
                let mut items = seq_of(seq);
                if let Ok(at) = usize::try_from(int_of(at)?)
                    && at < items.len()
                {
                    items.remove(at);
                }
                Ok(Value::seq(items))
            }
            ("Sequences", "withDeletedValue", [seq, value]) => {
                let items = seq_of(seq)
                    .into_iter()
                    .filter(|item| !values_equal(item, value))
                    .collect();
                Ok(Value::seq(items))
            }
            ("Sequences", "subsequence", [seq, lo, hi]) => {
                let items = seq_of(seq);
                let len = items.len() as i64;
                let lo = int_of(lo)?.clamp(0, len) as usize;
                let hi = int_of(hi)?.clamp(0, len) as usize;
                Ok(Value::seq(items.get(lo..hi.max(lo)).unwrap_or_default().to_vec()))
            }
            ("Sequences", "range", [lo, hi]) => range(lo, hi, 1, true),
            ("Sequences", "range", [lo, hi, step]) => range(lo, hi, int_of(step)?, true),
            ("Sequences", "rangeExclusive", [lo, hi]) => range(lo, hi, 1, false),
            ("Sequences", "rangeExclusive", [lo, hi, step]) => range(lo, hi, int_of(step)?, false),
            ("Sequences", "convertNumberSequence", [Value::TypeInfo(to), seq]) => {
                let integral = matches!(&**to, "Integer" | "Long" | "Short" | "Byte");
                let items = seq_of(seq)
                    .into_iter()
                    .map(|v| match (integral, v.number()) {
                        (true, Some(n)) => Value::Int(n as i64),
                        (false, Some(n)) => Value::Double(n),
                        (_, None) => v,
                    })
                    .collect();
                Ok(Value::seq(items))
            }
            ("Checks", "equals", [a, b]) => Ok(Value::Bool(values_equal(a, b))),
            ("Checks", "isNull", [a]) => Ok(Value::Bool(match a {
                Value::Null => true,
                Value::Str(s) => s.is_empty(),
                Value::Seq(items) => items.is_empty(),
                _ => false,
            })),
            ("Math", "max", [a, b]) => numeric_pick(a, b, true),
            ("Math", "min", [a, b]) => numeric_pick(a, b, false),
            ("TypeInfo", "forClass", [Value::Class(name)]) => Ok(Value::TypeInfo(name.clone())),
            _ => fail(format!("no runtime method {class}.{method}/{}", args.len())),
        }
    }

    fn runtime_field(&self, class: &str, name: &str) -> Exec<Value> {
        match class {
            "TypeInfo" => Ok(Value::TypeInfo(name.into())),
            "FXBase" => match var_flags::value_of(name) {
                Some(bits) => Ok(Value::Int(i64::from(bits))),
                None => fail(format!("no FXBase constant {name}")),
            },
            "Pointer" if name == "NULL" => Ok(Value::Null),
            _ => fail(format!("no runtime field {class}.{name}")),
        }
    }

    /// `Name` in receiver position, when it names a class rather than a
    /// variable.
    fn class_target(&self, frame: &Frame, target: &JNode) -> Option<String> {
        let JNode::Ident(name) = target else {
            return None;
        };
        if frame.has_local(name)
            || frame.this_has_field(name)
            || self.static_owner(&frame.class, name).is_some()
        {
            return None;
        }
        self.is_class_name(name).then(|| name.clone())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn tick(&mut self) -> Exec<()> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return fail("step limit exceeded");
        }
        Ok(())
    }

    fn exec_stmts(&mut self, frame: &mut Frame, stmts: &[JNode]) -> Exec<()> {
        for stmt in stmts {
            self.exec(frame, stmt)?;
        }
        Ok(())
    }

    fn exec_block(&mut self, frame: &mut Frame, stmts: &[JNode]) -> Exec<()> {
        frame.scopes.push(FxHashMap::default());
        let result = self.exec_stmts(frame, stmts);
        frame.scopes.pop();
        result
    }

    fn exec_body(&mut self, frame: &mut Frame, body: &JNode) -> Exec<()> {
        match body {
            JNode::Block(stmts) => self.exec_block(frame, stmts),
            other => self.exec_block(frame, std::slice::from_ref(other)),
        }
    }

    fn exec(&mut self, frame: &mut Frame, node: &JNode) -> Exec<()> {
        match node {
            JNode::LocalVar { ty, name, init } => {
                let value = match init {
                    Some(init) => self.eval(frame, init)?,
                    None => default_for(ty),
                };
                frame.declare(name, value);
                Ok(())
            }
            JNode::ExprStmt(expr) => self.eval(frame, expr).map(drop),
            JNode::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(frame, value)?,
                    None => Value::Void,
                };
                Err(Flow::Return(value))
            }
            JNode::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval(frame, cond)?;
                if truthy(&cond)? {
                    self.exec_body(frame, then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_body(frame, otherwise)
                } else {
                    Ok(())
                }
            }
            JNode::Block(stmts) => self.exec_block(frame, stmts),
            JNode::For { .. } | JNode::ForEach { .. } | JNode::While { .. } => {
                self.exec_loop(frame, node, None)
            }
            JNode::Labeled { label, body } => {
                let result = match body.as_ref() {
                    JNode::For { .. } | JNode::ForEach { .. } | JNode::While { .. } => {
                        self.exec_loop(frame, body, Some(label.as_str()))
                    }
                    other => self.exec_body(frame, other),
                };
                match result {
                    Err(Flow::Break(Some(l))) if &l == label => Ok(()),
                    other => other,
                }
            }
            JNode::Try {
                body,
                catches,
                finally,
            } => {
                let mut result = self.exec_block(frame, body);
                if let Err(Flow::Throw(thrown)) = &result
                    && let Some(catch) = catches.iter().find(|c| self.catches(&c.ty, thrown))
                {
                    let thrown = thrown.clone();
                    frame.scopes.push(FxHashMap::default());
                    frame.declare(&catch.name, thrown);
                    result = self.exec_stmts(frame, &catch.body);
                    frame.scopes.pop();
                }
                if let Some(finally) = finally {
                    self.exec_block(frame, finally)?;
                }
                result
            }
            JNode::Throw(value) => {
                let value = self.eval(frame, value)?;
                Err(Flow::Throw(value))
            }
            JNode::Break(label) => Err(Flow::Break(label.clone())),
            JNode::Continue(label) => Err(Flow::Continue(label.clone())),
            JNode::Switch { selector, cases } => {
                let selected = self.eval(frame, selector)?;
                let mut start = None;
                for (idx, case) in cases.iter().enumerate() {
                    if let Some(label) = &case.label {
                        let label = self.eval(frame, label)?;
                        if values_equal(&selected, &label) {
                            start = Some(idx);
                            break;
                        }
                    }
                }
                let Some(start) = start.or_else(|| cases.iter().position(|c| c.label.is_none()))
                else {
                    return Ok(());
                };
                frame.scopes.push(FxHashMap::default());
                let mut result = Ok(());
                for case in &cases[start..] {
                    result = self.exec_stmts(frame, &case.body);
                    if result.is_err() {
                        break;
                    }
                }
                frame.scopes.pop();
                match result {
                    Err(Flow::Break(None)) => Ok(()),
                    other => other,
                }
            }
            JNode::Empty | JNode::Comment(_) => Ok(()),
            JNode::Field(_) | JNode::Method(_) | JNode::Class(_) | JNode::CompilationUnit { .. } => {
                fail("declaration in statement position")
            }
            expr => self.eval(frame, expr).map(drop),
        }
    }

    fn catches(&self, ty: &JType, thrown: &Value) -> bool {
        let name = ty.base_name();
        if matches!(name.as_str(), "Throwable" | "Exception" | "RuntimeException" | "Object") {
            return true;
        }
        match thrown {
            Value::Obj(obj) => self.is_subtype(&obj.borrow().class, &name),
            _ => false,
        }
    }

    /// Whether a loop keeps going after its body finished with `result`.
    fn loop_continues(result: Exec<()>, label: Option<&str>) -> Exec<bool> {
        match result {
            Ok(()) | Err(Flow::Continue(None)) => Ok(true),
            Err(Flow::Break(None)) => Ok(false),
            Err(Flow::Continue(Some(l))) if Some(l.as_str()) == label => Ok(true),
            Err(Flow::Break(Some(l))) if Some(l.as_str()) == label => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn exec_loop(&mut self, frame: &mut Frame, node: &JNode, label: Option<&str>) -> Exec<()> {
        frame.scopes.push(FxHashMap::default());
        let result = self.loop_inner(frame, node, label);
        frame.scopes.pop();
        result
    }

    fn loop_inner(&mut self, frame: &mut Frame, node: &JNode, label: Option<&str>) -> Exec<()> {
        match node {
            JNode::For {
                init,
                cond,
                update,
                body,
            } => {
                self.exec_stmts(frame, init)?;
                loop {
                    self.tick()?;
                    if let Some(cond) = cond {
                        let cond = self.eval(frame, cond)?;
                        if !truthy(&cond)? {
                            return Ok(());
                        }
                    }
                    let result = self.exec_body(frame, body);
                    if !Self::loop_continues(result, label)? {
                        return Ok(());
                    }
                    self.exec_stmts(frame, update)?;
                }
            }
            JNode::While { cond, body } => loop {
                self.tick()?;
                let cond = self.eval(frame, cond)?;
                if !truthy(&cond)? {
                    return Ok(());
                }
                let result = self.exec_body(frame, body);
                if !Self::loop_continues(result, label)? {
                    return Ok(());
                }
            },
            JNode::ForEach {
                name,
                iterable,
                body,
                ..
            } => {
                let items = self.eval(frame, iterable)?.items().unwrap_or_default();
                for item in items {
                    self.tick()?;
                    frame.scopes.push(FxHashMap::default());
                    frame.declare(name, item);
                    let result = self.exec_body(frame, body);
                    frame.scopes.pop();
                    if !Self::loop_continues(result, label)? {
                        return Ok(());
                    }
                }
                Ok(())
            }
            _ => fail("not a loop"),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval_all(&mut self, frame: &mut Frame, nodes: &[JNode]) -> Exec<Vec<Value>> {
        nodes.iter().map(|node| self.eval(frame, node)).collect()
    }

    fn eval(&mut self, frame: &mut Frame, node: &JNode) -> Exec<Value> {
        match node {
            JNode::Literal(lit) => Ok(match lit {
                JLiteral::Int(i) => Value::Int(i64::from(*i)),
                JLiteral::Long(l) => Value::Int(*l),
                JLiteral::Float(f) => Value::Double(f64::from(*f)),
                JLiteral::Double(d) => Value::Double(*d),
                JLiteral::Boolean(b) => Value::Bool(*b),
                JLiteral::Char(c) => Value::Char(*c),
                JLiteral::String(s) => Value::Str(s.as_str().into()),
                JLiteral::Null => Value::Null,
            }),
            JNode::Ident(name) => {
                if let Some(value) = frame.lookup(name) {
                    return Ok(value);
                }
                if let Some(this) = &frame.this
                    && let Some(value) = this.borrow().fields.get(name)
                {
                    return Ok(value.clone());
                }
                if let Some(owner) = self.static_owner(&frame.class, name) {
                    return self.read_static(&owner, name);
                }
                if self.is_class_name(name) {
                    return Ok(Value::Class(name.as_str().into()));
                }
                fail(format!("unresolved name {name} in {}", frame.class))
            }
            JNode::This | JNode::QualifiedThis(_) | JNode::Super => match &frame.this {
                Some(this) => Ok(Value::Obj(this.clone())),
                None => fail("this in a static context"),
            },
            JNode::Select { target, name } => {
                if let Some(class) = self.class_target(frame, target) {
                    return match self.static_owner(&class, name) {
                        Some(owner) => self.read_static(&owner, name),
                        None => self.runtime_field(&class, name),
                    };
                }
                match self.eval(frame, target)? {
                    Value::Obj(obj) => {
                        let value = obj.borrow().fields.get(name).cloned();
                        value.ok_or_else(|| Flow::Error(format!("no field {name}")))
                    }
                    Value::Array(items) if name == "length" => {
                        Ok(Value::Int(items.borrow().len() as i64))
                    }
                    Value::Null => Err(Flow::Throw(Value::Str("NullPointerException".into()))),
                    other => fail(format!("cannot select {name} from {other:?}")),
                }
            }
            JNode::Call {
                target,
                method,
                args,
            } => self.eval_call(frame, target.as_deref(), method, args),
            JNode::New { class, args, body } => {
                if body.is_some() {
                    return fail("anonymous class bodies are not interpreted");
                }
                let args = self.eval_all(frame, args)?;
                let name = class.base_name();
                if name == "ArraySequence" {
                    return Ok(Value::Builder(Rc::new(RefCell::new(Vec::new()))));
                }
                self.instantiate(&name, args)
            }
            JNode::NewArray { elem, size } => {
                let size = int_of(&self.eval(frame, size)?)?;
                let items = vec![default_for(elem); usize::try_from(size).unwrap_or(0)];
                Ok(Value::Array(Rc::new(RefCell::new(items))))
            }
            JNode::ArrayInit { items, .. } => {
                let items = self.eval_all(frame, items)?;
                Ok(Value::Array(Rc::new(RefCell::new(items))))
            }
            JNode::Index { array, index } => {
                let array = self.eval(frame, array)?;
                let index = int_of(&self.eval(frame, index)?)?;
                let items = array.items().unwrap_or_default();
                match usize::try_from(index).ok().and_then(|i| items.get(i).cloned()) {
                    Some(value) => Ok(value),
                    None => Err(Flow::Throw(Value::Str("ArrayIndexOutOfBoundsException".into()))),
                }
            }
            JNode::Binary { op, left, right } => {
                let left = self.eval(frame, left)?;
                match op {
                    JBinaryOp::And if !truthy(&left)? => return Ok(Value::Bool(false)),
                    JBinaryOp::Or if truthy(&left)? => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right = self.eval(frame, right)?;
                binary(*op, &left, &right)
            }
            JNode::Unary { op, operand } => match op {
                JUnaryOp::Neg => match self.eval(frame, operand)? {
                    Value::Int(i) => Ok(Value::Int(-i)),
                    Value::Double(d) => Ok(Value::Double(-d)),
                    other => fail(format!("cannot negate {other:?}")),
                },
                JUnaryOp::Not => {
                    let value = self.eval(frame, operand)?;
                    Ok(Value::Bool(!truthy(&value)?))
                }
                JUnaryOp::PreInc | JUnaryOp::PreDec | JUnaryOp::PostInc | JUnaryOp::PostDec => {
                    let place = self.place(frame, operand)?;
                    let old = self.read_place(frame, &place)?;
                    let delta = if matches!(op, JUnaryOp::PreInc | JUnaryOp::PostInc) {
                        JBinaryOp::Add
                    } else {
                        JBinaryOp::Sub
                    };
                    let new = binary(delta, &old, &Value::Int(1))?;
                    self.write_place(frame, place, new.clone());
                    Ok(if matches!(op, JUnaryOp::PreInc | JUnaryOp::PreDec) {
                        new
                    } else {
                        old
                    })
                }
            },
            JNode::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval(frame, cond)?;
                if truthy(&cond)? {
                    self.eval(frame, then)
                } else {
                    self.eval(frame, otherwise)
                }
            }
            JNode::Assign { target, value } => {
                let place = self.place(frame, target)?;
                let value = self.eval(frame, value)?;
                self.write_place(frame, place, value.clone());
                Ok(value)
            }
            JNode::CompoundAssign { op, target, value } => {
                let place = self.place(frame, target)?;
                let old = self.read_place(frame, &place)?;
                let rhs = self.eval(frame, value)?;
                let new = binary(*op, &old, &rhs)?;
                self.write_place(frame, place, new.clone());
                Ok(new)
            }
            JNode::Cast { ty, expr } => {
                let value = self.eval(frame, expr)?;
                Ok(cast(ty, value))
            }
            JNode::InstanceOf { expr, ty } => {
                let value = self.eval(frame, expr)?;
                let target = ty.base_name();
                Ok(Value::Bool(match &value {
                    Value::Obj(obj) => self.is_subtype(&obj.borrow().class, &target),
                    Value::Str(_) => matches!(target.as_str(), "String" | "Object"),
                    Value::Seq(_) => matches!(target.as_str(), "Sequence" | "Object"),
                    Value::Null => false,
                    _ => target == "Object",
                }))
            }
            JNode::ClassLiteral(ty) => Ok(Value::Class(ty.base_name().into())),
            JNode::Paren(inner) => self.eval(frame, inner),
            other => fail(format!("statement in expression position: {other:?}")),
        }
    }

    fn eval_call(
        &mut self,
        frame: &mut Frame,
        target: Option<&JNode>,
        method: &str,
        args: &[JNode],
    ) -> Exec<Value> {
        match target {
            None if method == "this" || method == "super" => {
                let args = self.eval_all(frame, args)?;
                let Some(this) = frame.this.clone() else {
                    return fail("constructor call without an instance");
                };
                let class = if method == "this" {
                    Some(frame.class.clone())
                } else {
                    self.superclass_of(&frame.class)
                };
                if let Some(class) = class {
                    self.construct(&class, &this, args)?;
                }
                Ok(Value::Void)
            }
            None => {
                let args = self.eval_all(frame, args)?;
                self.local_call(frame, method, args)
            }
            Some(JNode::Super) => {
                let args = self.eval_all(frame, args)?;
                self.super_call(frame, method, args)
            }
            Some(target) => {
                if let Some(class) = self.class_target(frame, target) {
                    let args = self.eval_all(frame, args)?;
                    return self.static_call(&class, method, args);
                }
                let recv = self.eval(frame, target)?;
                let args = self.eval_all(frame, args)?;
                self.virtual_call(recv, method, args)
            }
        }
    }

    fn place(&mut self, frame: &mut Frame, node: &JNode) -> Exec<Place> {
        match node {
            JNode::Ident(name) => {
                if frame.has_local(name) {
                    return Ok(Place::Local(name.clone()));
                }
                if let Some(this) = &frame.this
                    && this.borrow().fields.contains_key(name)
                {
                    return Ok(Place::Field(this.clone(), name.clone()));
                }
                match self.static_owner(&frame.class, name) {
                    Some(owner) => {
                        self.ensure_init(&owner)?;
                        Ok(Place::Static(owner, name.clone()))
                    }
                    None => fail(format!("cannot assign unresolved name {name}")),
                }
            }
            JNode::Select { target, name } => {
                if let Some(class) = self.class_target(frame, target) {
                    let Some(owner) = self.static_owner(&class, name) else {
                        return fail(format!("no static field {class}.{name}"));
                    };
                    self.ensure_init(&owner)?;
                    return Ok(Place::Static(owner, name.clone()));
                }
                match self.eval(frame, target)? {
                    Value::Obj(obj) => Ok(Place::Field(obj, name.clone())),
                    Value::Null => Err(Flow::Throw(Value::Str("NullPointerException".into()))),
                    other => fail(format!("cannot assign {name} of {other:?}")),
                }
            }
            JNode::Index { array, index } => {
                let array = self.eval(frame, array)?;
                let index = int_of(&self.eval(frame, index)?)?;
                let Value::Array(items) = array else {
                    return fail("indexed store into a non-array");
                };
                let len = items.borrow().len();
                match usize::try_from(index).ok().filter(|i| *i < len) {
                    Some(i) => Ok(Place::Elem(items, i)),
                    None => Err(Flow::Throw(Value::Str("ArrayIndexOutOfBoundsException".into()))),
                }
            }
            JNode::Paren(inner) => self.place(frame, inner),
            other => fail(format!("not assignable: {other:?}")),
        }
    }

    fn read_place(&mut self, frame: &Frame, place: &Place) -> Exec<Value> {
        Ok(match place {
            Place::Local(name) => frame.lookup(name).unwrap_or(Value::Null),
            Place::Field(obj, name) => obj.borrow().fields.get(name).cloned().unwrap_or(Value::Null),
            Place::Static(owner, name) => return self.read_static(owner, name),
            Place::Elem(items, idx) => items.borrow().get(*idx).cloned().unwrap_or(Value::Null),
        })
    }

    fn write_place(&mut self, frame: &mut Frame, place: Place, value: Value) {
        match place {
            Place::Local(name) => frame.assign(&name, value),
            Place::Field(obj, name) => {
                obj.borrow_mut().fields.insert(name, value);
            }
            Place::Static(owner, name) => {
                self.statics.insert((owner, name), value);
            }
            Place::Elem(items, idx) => {
                if let Some(slot) = items.borrow_mut().get_mut(idx) {
                    *slot = value;
                }
            }
        }
    }
}

fn integral(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Char(_))
}

fn binary(op: JBinaryOp, left: &Value, right: &Value) -> Exec<Value> {
    use JBinaryOp as B;
    match op {
        B::Eq => return Ok(Value::Bool(values_equal(left, right))),
        B::Ne => return Ok(Value::Bool(!values_equal(left, right))),
        B::And => return Ok(Value::Bool(truthy(left)? && truthy(right)?)),
        B::Or => return Ok(Value::Bool(truthy(left)? || truthy(right)?)),
        B::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            return Ok(Value::Str(format!("{}{}", left.display(), right.display()).into()));
        }
        _ => {}
    }
    if integral(left) && integral(right) {
        let (a, b) = (int_of(left)?, int_of(right)?);
        let arithmetic_error = || Flow::Throw(Value::Str("ArithmeticException".into()));
        return Ok(match op {
            B::Add => Value::Int(a.wrapping_add(b)),
            B::Sub => Value::Int(a.wrapping_sub(b)),
            B::Mul => Value::Int(a.wrapping_mul(b)),
            B::Div => Value::Int(a.checked_div(b).ok_or_else(arithmetic_error)?),
            B::Rem => Value::Int(a.checked_rem(b).ok_or_else(arithmetic_error)?),
            B::Lt => Value::Bool(a < b),
            B::Le => Value::Bool(a <= b),
            B::Gt => Value::Bool(a > b),
            B::Ge => Value::Bool(a >= b),
            B::Eq | B::Ne | B::And | B::Or => unreachable!("handled above"),
        });
    }
    let (Some(a), Some(b)) = (left.number(), right.number()) else {
        return fail(format!("operands of {op:?} are not numbers: {left:?}, {right:?}"));
    };
    Ok(match op {
        B::Add => Value::Double(a + b),
        B::Sub => Value::Double(a - b),
        B::Mul => Value::Double(a * b),
        B::Div => Value::Double(a / b),
        B::Rem => Value::Double(a % b),
        B::Lt => Value::Bool(a < b),
        B::Le => Value::Bool(a <= b),
        B::Gt => Value::Bool(a > b),
        B::Ge => Value::Bool(a >= b),
        B::Eq | B::Ne | B::And | B::Or => unreachable!("handled above"),
    })
}

fn cast(ty: &JType, value: Value) -> Value {
    match ty {
        JType::Byte | JType::Short | JType::Int | JType::Long => match value {
            Value::Double(d) => Value::Int(d as i64),
            Value::Char(c) => Value::Int(i64::from(u32::from(c))),
            other => other,
        },
        JType::Float | JType::Double => match value {
            Value::Int(i) => Value::Double(i as f64),
            Value::Char(c) => Value::Double(f64::from(u32::from(c))),
            other => other,
        },
        JType::Char => match value {
            Value::Int(i) => Value::Char(
                u32::try_from(i)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or('\0'),
            ),
            other => other,
        },
        _ => value,
    }
}

/// Insert `value` (or all of its elements) at `at`, clamped to the bounds.
fn spliced(mut items: Vec<Value>, at: i64, value: &Value) -> Value {
    let at = at.clamp(0, items.len() as i64) as usize;
    let inserted = match value {
        Value::Null => Vec::new(),
        Value::Seq(_) => value.items().unwrap_or_default(),
        other => vec![other.clone()],
    };
    items.splice(at..at, inserted);
    Value::seq(items)
}

fn range(lo: &Value, hi: &Value, step: i64, inclusive: bool) -> Exec<Value> {
    let (lo, hi) = (int_of(lo)?, int_of(hi)?);
    let mut items = Vec::new();
    if step == 0 {
        return Ok(Value::seq(items));
    }
    let mut current = lo;
    loop {
        let inside = match (step > 0, inclusive) {
            (true, true) => current <= hi,
            (true, false) => current < hi,
            (false, true) => current >= hi,
            (false, false) => current > hi,
        };
        if !inside {
            break;
        }
        items.push(Value::Int(current));
        current += step;
    }
    Ok(Value::seq(items))
}

fn numeric_pick(a: &Value, b: &Value, max: bool) -> Exec<Value> {
    let (Some(x), Some(y)) = (a.number(), b.number()) else {
        return fail("Math arguments are not numbers");
    };
    Ok(if (x >= y) == max { a.clone() } else { b.clone() })
}
