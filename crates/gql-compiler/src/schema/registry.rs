//! The name registry used by the resolver's first pass.
//!
//! Scoped to one resolve call and discarded before the schema is returned.
//! Built-in scalars are seeded per call from a constant table.

use indexmap::{IndexMap, IndexSet};

use gql_parser::ast::NameNode;

use crate::schema::{
    InputTypeRef, Name, OutputTypeRef, SchemaError, SchemaErrorKind, TypeKind,
};

pub(crate) const BUILT_IN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// Name-to-kind table seeded in pass 1 and consulted for every reference in
/// pass 2. Type names are unique across kinds; directives have their own
/// namespace.
#[derive(Debug, Default)]
pub(crate) struct TypeRegistry {
    types: IndexMap<Name, TypeKind>,
    directives: IndexSet<Name>,
}

impl TypeRegistry {
    pub(crate) fn with_built_ins() -> Self {
        let mut registry = Self::default();
        for scalar in BUILT_IN_SCALARS {
            registry.types.insert((*scalar).to_string(), TypeKind::Scalar);
        }
        registry
    }

    pub(crate) fn add_type(&mut self, kind: TypeKind, name: &NameNode) -> Result<(), SchemaError> {
        if self.types.contains_key(&name.name) {
            return Err(SchemaError::new(
                SchemaErrorKind::DuplicateType,
                format!("type \"{}\" is defined more than once", name.name),
                name.loc.location(),
            ));
        }
        self.types.insert(name.name.clone(), kind);
        Ok(())
    }

    pub(crate) fn add_directive(&mut self, name: &NameNode) -> Result<(), SchemaError> {
        if !self.directives.insert(name.name.clone()) {
            return Err(SchemaError::new(
                SchemaErrorKind::DuplicateType,
                format!("directive \"@{}\" is defined more than once", name.name),
                name.loc.location(),
            ));
        }
        Ok(())
    }

    pub(crate) fn add_built_in_directive(&mut self, name: &str) {
        self.directives.insert(name.to_string());
    }

    pub(crate) fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.types.get(name).copied()
    }

    pub(crate) fn has_directive(&self, name: &str) -> bool {
        self.directives.contains(name)
    }

    /// Resolve a reference in an input position. Kind-scoped: only scalars,
    /// enums and input types are visible here.
    pub(crate) fn input_ref(&self, name: &NameNode) -> Result<InputTypeRef, SchemaError> {
        match self.kind_of(&name.name) {
            Some(TypeKind::Scalar) => Ok(InputTypeRef::Scalar {
                name: name.name.clone(),
            }),
            Some(TypeKind::Enum) => Ok(InputTypeRef::Enum {
                name: name.name.clone(),
            }),
            Some(TypeKind::Input) => Ok(InputTypeRef::Input {
                name: name.name.clone(),
            }),
            Some(kind) => Err(SchemaError::new(
                SchemaErrorKind::InvalidInputType,
                format!(
                    "{} type \"{}\" cannot be used in an input position",
                    kind, name.name
                ),
                name.loc.location(),
            )),
            None => Err(self.unknown(name)),
        }
    }

    /// Resolve a reference in an output position. Kind-scoped: input types
    /// are not visible here.
    pub(crate) fn output_ref(&self, name: &NameNode) -> Result<OutputTypeRef, SchemaError> {
        match self.kind_of(&name.name) {
            Some(TypeKind::Scalar) => Ok(OutputTypeRef::Scalar {
                name: name.name.clone(),
            }),
            Some(TypeKind::Enum) => Ok(OutputTypeRef::Enum {
                name: name.name.clone(),
            }),
            Some(TypeKind::Object) => Ok(OutputTypeRef::Object {
                name: name.name.clone(),
            }),
            Some(TypeKind::Interface) => Ok(OutputTypeRef::Interface {
                name: name.name.clone(),
            }),
            Some(TypeKind::Union) => Ok(OutputTypeRef::Union {
                name: name.name.clone(),
            }),
            Some(TypeKind::Input) => Err(SchemaError::new(
                SchemaErrorKind::UnknownType,
                format!(
                    "input type \"{}\" cannot be used in an output position",
                    name.name
                ),
                name.loc.location(),
            )),
            None => Err(self.unknown(name)),
        }
    }

    /// Resolve a reference that must name an object type (union members).
    pub(crate) fn object_name(&self, name: &NameNode) -> Result<Name, SchemaError> {
        match self.kind_of(&name.name) {
            Some(TypeKind::Object) => Ok(name.name.clone()),
            Some(_) | None => Err(SchemaError::new(
                SchemaErrorKind::UnknownType,
                format!("\"{}\" does not name an object type", name.name),
                name.loc.location(),
            )),
        }
    }

    /// Resolve a reference that must name an interface (implements lists).
    pub(crate) fn interface_name(&self, name: &NameNode) -> Result<Name, SchemaError> {
        match self.kind_of(&name.name) {
            Some(TypeKind::Interface) => Ok(name.name.clone()),
            Some(_) | None => Err(SchemaError::new(
                SchemaErrorKind::UnknownType,
                format!("\"{}\" does not name an interface", name.name),
                name.loc.location(),
            )),
        }
    }

    pub(crate) fn unknown(&self, name: &NameNode) -> SchemaError {
        SchemaError::new(
            SchemaErrorKind::UnknownType,
            format!("unknown type \"{}\"", name.name),
            name.loc.location(),
        )
    }
}
