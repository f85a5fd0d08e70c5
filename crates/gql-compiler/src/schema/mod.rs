//! High-level representation of a resolved GraphQL schema.
//!
//! A [`Schema`] is produced by the [`SchemaBuilder`] from one or more parsed
//! files. The server side holds per-kind dictionaries keyed by unique name;
//! cross-references between entities are kind-tagged name handles
//! ([`InputTypeRef`], [`OutputTypeRef`]) into those dictionaries, which keeps
//! the graph cycle-safe and serialization-friendly. The schema owns every
//! entity exactly once; interface-implementer links are stored on the
//! implementer side and inverted on demand with
//! [`ServerSchema::implementers_map`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gql_parser::ast::{DirectiveLocation, Literal, OperationType};
use gql_parser::Location;

mod client;
mod registry;
mod resolve;

pub use client::{Fragment, Operation, ResolvedSelection};
pub use resolve::SchemaBuilder;

/// A unique entity name within the schema.
pub type Name = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Enum,
    Object,
    Interface,
    Union,
    Input,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Enum => "enum",
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Input => "input",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a type usable in an input position: an argument, variable or
/// input-object field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum InputTypeRef {
    Scalar { name: Name },
    Enum { name: Name },
    Input { name: Name },
}

impl InputTypeRef {
    pub fn name(&self) -> &str {
        match self {
            InputTypeRef::Scalar { name }
            | InputTypeRef::Enum { name }
            | InputTypeRef::Input { name } => name,
        }
    }
}

impl fmt::Display for InputTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to a type usable in an output position: an object or interface
/// field's return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum OutputTypeRef {
    Scalar { name: Name },
    Enum { name: Name },
    Object { name: Name },
    Interface { name: Name },
    Union { name: Name },
}

impl OutputTypeRef {
    pub fn name(&self) -> &str {
        match self {
            OutputTypeRef::Scalar { name }
            | OutputTypeRef::Enum { name }
            | OutputTypeRef::Object { name }
            | OutputTypeRef::Interface { name }
            | OutputTypeRef::Union { name } => name,
        }
    }

    /// Whether fields can be selected from values of this type.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            OutputTypeRef::Object { .. }
                | OutputTypeRef::Interface { .. }
                | OutputTypeRef::Union { .. }
        )
    }
}

impl fmt::Display for OutputTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spec of a plain (non-list) value of type `T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralFieldSpec<T> {
    #[serde(rename = "type")]
    pub ty: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Literal>,
}

/// Spec of a list value over element type `T`. `nullable` is the
/// nullability of the elements; the list's own nullability lives on the
/// enclosing [`FieldDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayFieldSpec<T> {
    #[serde(rename = "type")]
    pub ty: T,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum InputFieldSpec {
    #[serde(rename = "literal")]
    Literal(LiteralFieldSpec<InputTypeRef>),
    #[serde(rename = "array")]
    Array(ArrayFieldSpec<InputTypeRef>),
}

impl InputFieldSpec {
    pub fn type_name(&self) -> &str {
        match self {
            InputFieldSpec::Literal(spec) => spec.ty.name(),
            InputFieldSpec::Array(spec) => spec.ty.name(),
        }
    }

    pub fn default_value(&self) -> Option<&Literal> {
        match self {
            InputFieldSpec::Literal(spec) => spec.default_value.as_ref(),
            InputFieldSpec::Array(spec) => spec.default_value.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum NonCallableFieldSpec {
    #[serde(rename = "literal")]
    Literal(LiteralFieldSpec<OutputTypeRef>),
    #[serde(rename = "array")]
    Array(ArrayFieldSpec<OutputTypeRef>),
}

impl NonCallableFieldSpec {
    pub fn type_ref(&self) -> &OutputTypeRef {
        match self {
            NonCallableFieldSpec::Literal(spec) => &spec.ty,
            NonCallableFieldSpec::Array(spec) => &spec.ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ObjectFieldSpec {
    #[serde(rename = "literal")]
    Literal(LiteralFieldSpec<OutputTypeRef>),
    #[serde(rename = "array")]
    Array(ArrayFieldSpec<OutputTypeRef>),
    #[serde(rename = "callable", rename_all = "camelCase")]
    Callable {
        return_type: NonCallableFieldSpec,
        arguments: IndexMap<Name, InputFieldDefinition>,
    },
}

impl ObjectFieldSpec {
    /// The output type this field ultimately produces.
    pub fn return_type_ref(&self) -> &OutputTypeRef {
        match self {
            ObjectFieldSpec::Literal(spec) => &spec.ty,
            ObjectFieldSpec::Array(spec) => &spec.ty,
            ObjectFieldSpec::Callable { return_type, .. } => return_type.type_ref(),
        }
    }

    pub fn arguments(&self) -> Option<&IndexMap<Name, InputFieldDefinition>> {
        match self {
            ObjectFieldSpec::Callable { arguments, .. } => Some(arguments),
            _ => None,
        }
    }
}

/// A resolved field: its spec plus the nullability of the field value
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition<S> {
    pub name: Name,
    pub spec: S,
    pub nullable: bool,
}

pub type InputFieldDefinition = FieldDefinition<InputFieldSpec>;
pub type ObjectFieldDefinition = FieldDefinition<ObjectFieldSpec>;

impl fmt::Display for FieldDefinition<InputFieldSpec> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            InputFieldSpec::Literal(spec) => write!(f, "{}", spec.ty)?,
            InputFieldSpec::Array(spec) => {
                write!(f, "[{}{}]", spec.ty, if spec.nullable { "" } else { "!" })?
            }
        }
        if !self.nullable {
            write!(f, "!")?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldDefinition<ObjectFieldSpec> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            ObjectFieldSpec::Literal(spec) => write!(f, "{}", spec.ty)?,
            ObjectFieldSpec::Array(spec) => {
                write!(f, "[{}{}]", spec.ty, if spec.nullable { "" } else { "!" })?
            }
            ObjectFieldSpec::Callable {
                return_type,
                arguments,
            } => {
                write!(f, "(")?;
                for (index, (name, argument)) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {argument}")?;
                }
                write!(f, ") ")?;
                match return_type {
                    NonCallableFieldSpec::Literal(spec) => write!(f, "{}", spec.ty)?,
                    NonCallableFieldSpec::Array(spec) => {
                        write!(f, "[{}{}]", spec.ty, if spec.nullable { "" } else { "!" })?
                    }
                }
            }
        }
        if !self.nullable {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// A directive application surviving into the resolved schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveUsage {
    pub name: Name,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: IndexMap<String, Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarType {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: Name,
    /// Value name to the directives applied to it.
    pub values: IndexMap<Name, Vec<DirectiveUsage>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionType {
    pub name: Name,
    /// Member names; each resolves to an object type.
    pub members: IndexSet<Name>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: Name,
    /// Names of implemented interfaces.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub implements: IndexSet<Name>,
    pub fields: IndexMap<Name, ObjectFieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceType {
    pub name: Name,
    pub fields: IndexMap<Name, ObjectFieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputType {
    pub name: Name,
    pub fields: IndexMap<Name, InputFieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveDefinition {
    pub name: Name,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: IndexMap<Name, InputFieldDefinition>,
    #[serde(default)]
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

/// The resolved server side: one dictionary per kind, keyed by unique name,
/// plus the root operation bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSchema {
    pub scalars: IndexMap<Name, ScalarType>,
    pub enums: IndexMap<Name, EnumType>,
    pub inputs: IndexMap<Name, InputType>,
    pub objects: IndexMap<Name, ObjectType>,
    pub interfaces: IndexMap<Name, InterfaceType>,
    pub unions: IndexMap<Name, UnionType>,
    pub directives: IndexMap<Name, DirectiveDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_type: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<Name>,
}

impl ServerSchema {
    /// The kind of the named type, if it exists. Type names are unique
    /// across kinds, so at most one dictionary can hold the name.
    pub fn type_kind(&self, name: &str) -> Option<TypeKind> {
        if self.scalars.contains_key(name) {
            Some(TypeKind::Scalar)
        } else if self.enums.contains_key(name) {
            Some(TypeKind::Enum)
        } else if self.objects.contains_key(name) {
            Some(TypeKind::Object)
        } else if self.interfaces.contains_key(name) {
            Some(TypeKind::Interface)
        } else if self.unions.contains_key(name) {
            Some(TypeKind::Union)
        } else if self.inputs.contains_key(name) {
            Some(TypeKind::Input)
        } else {
            None
        }
    }

    pub fn output_ref(&self, name: &str) -> Option<OutputTypeRef> {
        let name = name.to_string();
        Some(match self.type_kind(&name)? {
            TypeKind::Scalar => OutputTypeRef::Scalar { name },
            TypeKind::Enum => OutputTypeRef::Enum { name },
            TypeKind::Object => OutputTypeRef::Object { name },
            TypeKind::Interface => OutputTypeRef::Interface { name },
            TypeKind::Union => OutputTypeRef::Union { name },
            TypeKind::Input => return None,
        })
    }

    /// Field lookup on a composite type; `None` for non-composite names.
    pub fn type_field(&self, type_name: &str, field_name: &str) -> Option<&ObjectFieldDefinition> {
        if let Some(object) = self.objects.get(type_name) {
            object.fields.get(field_name)
        } else if let Some(interface) = self.interfaces.get(type_name) {
            interface.fields.get(field_name)
        } else {
            None
        }
    }

    pub fn root_operation(&self, op_type: OperationType) -> Option<&Name> {
        match op_type {
            OperationType::Query => self.query_type.as_ref(),
            OperationType::Mutation => self.mutation_type.as_ref(),
            OperationType::Subscription => self.subscription_type.as_ref(),
        }
    }

    /// Inverts the object-side `implements` links: interface name to the
    /// set of object types implementing it.
    pub fn implementers_map(&self) -> HashMap<Name, HashSet<Name>> {
        let mut map = HashMap::<Name, HashSet<Name>>::new();
        for (name, object) in &self.objects {
            for interface in &object.implements {
                map.entry(interface.clone()).or_default().insert(name.clone());
            }
        }
        map
    }

    /// Whether `maybe_subtype` is an object belonging to the abstract type:
    /// an implementer of the interface or a member of the union.
    pub fn is_subtype(&self, abstract_type: &str, maybe_subtype: &str) -> bool {
        if self.interfaces.contains_key(abstract_type) {
            self.objects
                .get(maybe_subtype)
                .is_some_and(|object| object.implements.contains(abstract_type))
        } else if let Some(union) = self.unions.get(abstract_type) {
            union.members.contains(maybe_subtype)
        } else {
            false
        }
    }
}

/// The resolved client side: operations and fragments keyed by name, with
/// references bound to the server schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSchema {
    pub operations: IndexMap<Name, Operation>,
    pub fragments: IndexMap<Name, Fragment>,
}

/// A fully resolved schema. Immutable once built; the type registry used
/// during resolution is discarded before this value is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub server: ServerSchema,
    #[serde(skip)]
    pub client: ClientSchema,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    DuplicateType,
    UnknownType,
    DuplicateField,
    InvalidInputType,
    InterfaceNotSatisfied,
    DirectiveTargetMismatch,
    NonRepeatableDirectiveRepeated,
    InputCycle,
    RootOperationNotObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {location}")]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    pub location: Location,
}

impl SchemaError {
    pub(crate) fn new(kind: SchemaErrorKind, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }
}
