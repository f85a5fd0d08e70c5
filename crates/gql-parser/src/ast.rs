//! File-level abstract syntax trees.
//!
//! Two ASTs share the leaf nodes in this module: the server AST
//! ([`FileNodes`], type system definitions and extensions) and the client
//! AST ([`ClientDefinition`], executable operations and fragments). Every
//! node carries a [`NodeLocation`] spanning its first and last token.
//!
//! Node kinds are closed sums; the JSON debug form tags each sum variant
//! with a `_type` discriminator.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use triomphe::Arc;

use crate::lexer::{Location, SourceFile, Token};

/// Span of an AST node: from its first to its last consumed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    pub start_token: Token,
    pub end_token: Token,
    pub source: Arc<SourceFile>,
}

impl NodeLocation {
    pub fn span(start_token: Token, end_token: Token, source: Arc<SourceFile>) -> Self {
        Self {
            start_token,
            end_token,
            source,
        }
    }

    /// The location of the node's first token, for diagnostics.
    pub fn location(&self) -> Location {
        self.start_token.location.clone()
    }
}

impl Serialize for NodeLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NodeLocation", 2)?;
        state.serialize_field("start", &self.start_token.location)?;
        state.serialize_field("end", &self.end_token.location)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameNode {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub name: String,
}

/// A literal value as written in source. Scalar variants carry the decoded
/// value; `Float` is wrapped so literals stay `Eq`. `Variable` only occurs
/// in executable documents, where argument values may name an operation
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(tag = "_type", content = "value")]
pub enum Literal {
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
    Boolean(bool),
    Enum(String),
    Variable(String),
    Null,
    List(Vec<Literal>),
    Object(IndexMap<String, Literal>),
}

/// A type reference as written in source: a named type or a list, each with
/// its own nullability. Nullability defaults to true; a `!` suffix flips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum TypeRef {
    Named {
        #[serde(rename = "location")]
        loc: NodeLocation,
        name: NameNode,
        nullable: bool,
    },
    List {
        #[serde(rename = "location")]
        loc: NodeLocation,
        inner: Box<TypeRef>,
        nullable: bool,
    },
}

impl TypeRef {
    pub fn loc(&self) -> &NodeLocation {
        match self {
            TypeRef::Named { loc, .. } | TypeRef::List { loc, .. } => loc,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            TypeRef::Named { nullable, .. } | TypeRef::List { nullable, .. } => *nullable,
        }
    }

    /// The named type at the bottom of the reference.
    pub fn inner_name(&self) -> &NameNode {
        match self {
            TypeRef::Named { name, .. } => name,
            TypeRef::List { inner, .. } => inner.inner_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputValueDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveApplication {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub name: NameNode,
    pub arguments: IndexMap<String, Literal>,
}

/// The places a directive may be applied, as listed in a directive
/// definition's `on` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "QUERY" => Self::Query,
            "MUTATION" => Self::Mutation,
            "SUBSCRIPTION" => Self::Subscription,
            "FIELD" => Self::Field,
            "FRAGMENT_DEFINITION" => Self::FragmentDefinition,
            "FRAGMENT_SPREAD" => Self::FragmentSpread,
            "INLINE_FRAGMENT" => Self::InlineFragment,
            "VARIABLE_DEFINITION" => Self::VariableDefinition,
            "SCHEMA" => Self::Schema,
            "SCALAR" => Self::Scalar,
            "OBJECT" => Self::Object,
            "FIELD_DEFINITION" => Self::FieldDefinition,
            "ARGUMENT_DEFINITION" => Self::ArgumentDefinition,
            "INTERFACE" => Self::Interface,
            "UNION" => Self::Union,
            "ENUM" => Self::Enum,
            "ENUM_VALUE" => Self::EnumValue,
            "INPUT_OBJECT" => Self::InputObject,
            "INPUT_FIELD_DEFINITION" => Self::InputFieldDefinition,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Server AST

/// Everything parsed out of one server-mode file: definitions in parse
/// order, with `extend` declarations kept separately for the resolver to
/// merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNodes {
    #[serde(skip_serializing)]
    pub source: Arc<SourceFile>,
    pub definitions: Vec<Definition>,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum Definition {
    ObjectType(ObjectTypeDefinition),
    InterfaceType(InterfaceTypeDefinition),
    InputType(InputTypeDefinition),
    UnionType(UnionTypeDefinition),
    EnumType(EnumTypeDefinition),
    ScalarType(ScalarTypeDefinition),
    DirectiveDefinition(DirectiveDefinition),
    SchemaDefinition(SchemaDefinition),
}

/// An `extend` declaration. The payload mirrors the corresponding
/// definition shape; merging happens during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum Extension {
    ObjectType(ObjectTypeDefinition),
    InterfaceType(InterfaceTypeDefinition),
    InputType(InputTypeDefinition),
    UnionType(UnionTypeDefinition),
    EnumType(EnumTypeDefinition),
    ScalarType(ScalarTypeDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub implements: Vec<NameNode>,
    pub directives: Vec<DirectiveApplication>,
    pub fields: IndexMap<String, FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
    pub fields: IndexMap<String, FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
    pub fields: IndexMap<String, InputValueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
    pub members: Vec<NameNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
    pub values: Vec<EnumValueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalarTypeDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

/// The root `schema { … }` block. At most one per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<NameNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<NameNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<NameNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: NameNode,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

impl Definition {
    pub fn name(&self) -> Option<&NameNode> {
        match self {
            Definition::ObjectType(def) => Some(&def.name),
            Definition::InterfaceType(def) => Some(&def.name),
            Definition::InputType(def) => Some(&def.name),
            Definition::UnionType(def) => Some(&def.name),
            Definition::EnumType(def) => Some(&def.name),
            Definition::ScalarType(def) => Some(&def.name),
            Definition::DirectiveDefinition(def) => Some(&def.name),
            Definition::SchemaDefinition(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client AST

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum ClientDefinition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn keyword(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }

    /// The object type name assumed when no `schema` definition names one.
    pub fn default_type_name(self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
            OperationType::Subscription => "Subscription",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub op_type: OperationType,
    pub name: NameNode,
    pub variables: Vec<InputValueDefinition>,
    pub directives: Vec<DirectiveApplication>,
    pub selection_set: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentDefinition {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub name: NameNode,
    pub type_condition: NameNode,
    pub directives: Vec<DirectiveApplication>,
    pub selection_set: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "_type")]
pub enum Selection {
    Field(FieldSelection),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSelection {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<NameNode>,
    pub name: NameNode,
    pub arguments: IndexMap<String, Literal>,
    pub directives: Vec<DirectiveApplication>,
    /// `None` on leaf fields; sub-selections otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_set: Option<Vec<Selection>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentSpread {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    pub fragment_name: NameNode,
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineFragment {
    #[serde(rename = "location")]
    pub loc: NodeLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<NameNode>,
    pub directives: Vec<DirectiveApplication>,
    pub selection_set: Vec<Selection>,
}
