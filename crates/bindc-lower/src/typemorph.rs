//! Source-type to target-type mapping, default values and element type
//! descriptors.

use bindc_common::names;
use bindc_common::runtime::{RuntimeClass, function_class_name};
use bindc_target::{JNode, JType};
use bindc_tree::{Program, SymbolFlags, SymbolId, TypeId, TypeKind};

/// Target name of a class symbol as a type: mixins are seen through their
/// interface.
pub fn class_type_name(program: &Program, class: SymbolId) -> String {
    let name = program.symbols.name(class);
    if program.symbols.is_mixin(class) {
        names::mixin_interface(name)
    } else {
        name.to_string()
    }
}

pub fn java_type(program: &Program, ty: TypeId) -> JType {
    match program.types.kind(ty) {
        TypeKind::Void => JType::Void,
        TypeKind::Boolean => JType::Boolean,
        TypeKind::Char => JType::Char,
        TypeKind::Byte => JType::Byte,
        TypeKind::Short => JType::Short,
        TypeKind::Int => JType::Int,
        TypeKind::Long => JType::Long,
        TypeKind::Float => JType::Float,
        TypeKind::Double => JType::Double,
        TypeKind::Null | TypeKind::Object => JType::object(),
        TypeKind::String => JType::string(),
        TypeKind::Duration => JType::named(RuntimeClass::Duration.name()),
        TypeKind::Pointer => JType::named(RuntimeClass::Pointer.name()),
        TypeKind::Class(sym) => JType::named(class_type_name(program, *sym)),
        TypeKind::Sequence(elem) => sequence_type(program, *elem),
        TypeKind::Array(elem) => JType::array(java_type(program, *elem)),
        TypeKind::Function { params, ret } => {
            let mut args = Vec::with_capacity(params.len() + 1);
            args.push(java_type(program, *ret).boxed());
            args.extend(params.iter().map(|p| java_type(program, *p).boxed()));
            JType::generic(function_class_name(params.len()), args)
        }
    }
}

/// `Sequence<Boxed>`
pub fn sequence_type(program: &Program, elem: TypeId) -> JType {
    JType::generic(
        RuntimeClass::Sequence.name(),
        vec![java_type(program, elem).boxed()],
    )
}

pub fn boxed_type(program: &Program, ty: TypeId) -> JType {
    java_type(program, ty).boxed()
}

/// `TypeInfo.Integer`, `TypeInfo.forClass(Point.class)`, ...
pub fn type_info(program: &Program, ty: TypeId) -> JNode {
    let builtin = match program.types.kind(ty) {
        TypeKind::Boolean => "Boolean",
        TypeKind::Char => "Character",
        TypeKind::Byte => "Byte",
        TypeKind::Short => "Short",
        TypeKind::Int => "Integer",
        TypeKind::Long => "Long",
        TypeKind::Float => "Float",
        TypeKind::Double => "Double",
        TypeKind::String => "String",
        TypeKind::Duration => "Duration",
        TypeKind::Pointer => "Pointer",
        TypeKind::Class(sym) => {
            return JNode::static_call(
                RuntimeClass::TypeInfo.name(),
                "forClass",
                vec![JNode::ClassLiteral(JType::named(class_type_name(
                    program, *sym,
                )))],
            );
        }
        _ => "Object",
    };
    JNode::static_select(RuntimeClass::TypeInfo.name(), builtin)
}

/// Value a variable of type `ty` has before anything assigns it, and the
/// value a null-guarded access yields when the receiver is null.
pub fn default_value(program: &Program, ty: TypeId) -> JNode {
    match program.types.kind(ty) {
        TypeKind::Boolean => JNode::bool(false),
        TypeKind::Char => JNode::char('\0'),
        TypeKind::Byte | TypeKind::Short | TypeKind::Int => JNode::int(0),
        TypeKind::Long => JNode::long(0),
        TypeKind::Float => JNode::float(0.0),
        TypeKind::Double => JNode::double(0.0),
        TypeKind::String => JNode::string(""),
        TypeKind::Pointer => JNode::static_select(RuntimeClass::Pointer.name(), "NULL"),
        TypeKind::Sequence(elem) => empty_sequence(program, *elem),
        _ => JNode::null(),
    }
}

/// True when the target language's implicit field value differs from
/// [`default_value`], so a storage field needs an explicit initializer.
pub fn needs_explicit_default(program: &Program, ty: TypeId) -> bool {
    matches!(
        program.types.kind(ty),
        TypeKind::String | TypeKind::Pointer | TypeKind::Sequence(_)
    )
}

pub fn empty_sequence(program: &Program, elem: TypeId) -> JNode {
    JNode::static_call(
        RuntimeClass::Sequences.name(),
        "empty",
        vec![type_info(program, elem)],
    )
}

/// Declarative classes follow the generated-object protocol; plain classes
/// are used as they are.
pub fn is_declarative_class(program: &Program, class: SymbolId) -> bool {
    program.symbols.is_class(class) && !program.symbols.has_flag(class, SymbolFlags::JAVA_CLASS)
}
