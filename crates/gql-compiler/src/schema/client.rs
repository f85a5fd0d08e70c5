//! Binding of client documents against a resolved server schema.
//!
//! Operations and fragments are keyed by name. Fragments are collected
//! first so spreads resolve regardless of declaration order; selections are
//! then checked field-by-field against the composite type they select from.

use std::collections::HashSet;

use indexmap::IndexMap;

use gql_parser::ast::{
    ClientDefinition, DirectiveApplication, DirectiveLocation, FieldSelection, OperationType,
    Selection,
};

use crate::schema::registry::TypeRegistry;
use crate::schema::resolve::{check_directive_application, lower_input_field};
use crate::schema::{
    ClientSchema, InputFieldDefinition, Name, OutputTypeRef, SchemaError, SchemaErrorKind,
    ServerSchema,
};

/// A resolved executable operation, bound to its root object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: Name,
    pub op_type: OperationType,
    /// Name of the object type this operation executes against.
    pub root_type: Name,
    pub variables: IndexMap<Name, InputFieldDefinition>,
    pub selections: Vec<ResolvedSelection>,
}

/// A resolved named fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: Name,
    /// Name of the composite type the fragment applies to.
    pub type_condition: Name,
    pub selections: Vec<ResolvedSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSelection {
    Field {
        alias: Option<Name>,
        name: Name,
        /// The field's resolved output type; `None` for `__typename`.
        ty: Option<OutputTypeRef>,
        selections: Vec<ResolvedSelection>,
    },
    FragmentSpread {
        fragment: Name,
    },
    InlineFragment {
        type_condition: Option<Name>,
        selections: Vec<ResolvedSelection>,
    },
}

pub(crate) fn resolve_client(
    registry: &TypeRegistry,
    server: &ServerSchema,
    files: &[Vec<ClientDefinition>],
) -> Result<ClientSchema, SchemaError> {
    let mut client = ClientSchema::default();
    let mut seen_directives: HashSet<(String, Name)> = HashSet::new();

    // Fragment names and type conditions first, so spreads can be checked
    // in any order.
    for file in files {
        for definition in file {
            if let ClientDefinition::Fragment(fragment) = definition {
                if client.fragments.contains_key(&fragment.name.name) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::DuplicateType,
                        format!("fragment \"{}\" is defined more than once", fragment.name.name),
                        fragment.name.loc.location(),
                    ));
                }
                let condition = composite_type(server, &fragment.type_condition)?;
                client.fragments.insert(
                    fragment.name.name.clone(),
                    Fragment {
                        name: fragment.name.name.clone(),
                        type_condition: condition,
                        selections: Vec::new(),
                    },
                );
            }
        }
    }

    for file in files {
        for definition in file {
            match definition {
                ClientDefinition::Fragment(fragment) => {
                    check_directives(
                        server,
                        &mut seen_directives,
                        &fragment.directives,
                        DirectiveLocation::FragmentDefinition,
                        &fragment.name.name,
                    )?;
                    let condition = client.fragments[&fragment.name.name].type_condition.clone();
                    let selections = resolve_selections(
                        server,
                        &client,
                        &mut seen_directives,
                        &condition,
                        &fragment.name.name,
                        &fragment.selection_set,
                    )?;
                    client.fragments[&fragment.name.name].selections = selections;
                }
                ClientDefinition::Operation(operation) => {
                    if client.operations.contains_key(&operation.name.name) {
                        return Err(SchemaError::new(
                            SchemaErrorKind::DuplicateType,
                            format!(
                                "operation \"{}\" is defined more than once",
                                operation.name.name
                            ),
                            operation.name.loc.location(),
                        ));
                    }
                    let Some(root_type) = server.root_operation(operation.op_type) else {
                        return Err(SchemaError::new(
                            SchemaErrorKind::UnknownType,
                            format!(
                                "schema does not define a {} root type",
                                operation.op_type.keyword()
                            ),
                            operation.name.loc.location(),
                        ));
                    };
                    let root_type = root_type.clone();
                    check_directives(
                        server,
                        &mut seen_directives,
                        &operation.directives,
                        operation_location(operation.op_type),
                        &operation.name.name,
                    )?;
                    let mut variables = IndexMap::new();
                    for variable in &operation.variables {
                        variables.insert(
                            variable.name.name.clone(),
                            lower_input_field(registry, variable)?,
                        );
                    }
                    let selections = resolve_selections(
                        server,
                        &client,
                        &mut seen_directives,
                        &root_type,
                        &operation.name.name,
                        &operation.selection_set,
                    )?;
                    client.operations.insert(
                        operation.name.name.clone(),
                        Operation {
                            name: operation.name.name.clone(),
                            op_type: operation.op_type,
                            root_type,
                            variables,
                            selections,
                        },
                    );
                }
            }
        }
    }

    Ok(client)
}

fn operation_location(op_type: OperationType) -> DirectiveLocation {
    match op_type {
        OperationType::Query => DirectiveLocation::Query,
        OperationType::Mutation => DirectiveLocation::Mutation,
        OperationType::Subscription => DirectiveLocation::Subscription,
    }
}

/// The name must resolve to an object, interface or union.
fn composite_type(
    server: &ServerSchema,
    name: &gql_parser::ast::NameNode,
) -> Result<Name, SchemaError> {
    match server.output_ref(&name.name) {
        Some(ty) if ty.is_composite() => Ok(name.name.clone()),
        Some(_) | None => Err(SchemaError::new(
            SchemaErrorKind::UnknownType,
            format!("\"{}\" does not name a composite type", name.name),
            name.loc.location(),
        )),
    }
}

fn check_directives(
    server: &ServerSchema,
    seen: &mut HashSet<(String, Name)>,
    applications: &[DirectiveApplication],
    location: DirectiveLocation,
    target: &str,
) -> Result<(), SchemaError> {
    for application in applications {
        check_directive_application(server, seen, application, location, target)?;
    }
    Ok(())
}

fn resolve_selections(
    server: &ServerSchema,
    client: &ClientSchema,
    seen_directives: &mut HashSet<(String, Name)>,
    parent_type: &str,
    target_prefix: &str,
    selections: &[Selection],
) -> Result<Vec<ResolvedSelection>, SchemaError> {
    let mut resolved = Vec::new();
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                resolved.push(resolve_field(
                    server,
                    client,
                    seen_directives,
                    parent_type,
                    target_prefix,
                    field,
                )?);
            }
            Selection::FragmentSpread(spread) => {
                if !client.fragments.contains_key(&spread.fragment_name.name) {
                    return Err(SchemaError::new(
                        SchemaErrorKind::UnknownType,
                        format!("unknown fragment \"{}\"", spread.fragment_name.name),
                        spread.fragment_name.loc.location(),
                    ));
                }
                check_directives(
                    server,
                    seen_directives,
                    &spread.directives,
                    DirectiveLocation::FragmentSpread,
                    &format!("{target_prefix}...{}", spread.fragment_name.name),
                )?;
                resolved.push(ResolvedSelection::FragmentSpread {
                    fragment: spread.fragment_name.name.clone(),
                });
            }
            Selection::InlineFragment(fragment) => {
                let condition = match &fragment.type_condition {
                    Some(name) => Some(composite_type(server, name)?),
                    None => None,
                };
                let inner_parent = condition.as_deref().unwrap_or(parent_type);
                check_directives(
                    server,
                    seen_directives,
                    &fragment.directives,
                    DirectiveLocation::InlineFragment,
                    &format!("{target_prefix}...on {inner_parent}"),
                )?;
                let selections = resolve_selections(
                    server,
                    client,
                    seen_directives,
                    inner_parent,
                    target_prefix,
                    &fragment.selection_set,
                )?;
                resolved.push(ResolvedSelection::InlineFragment {
                    type_condition: condition,
                    selections,
                });
            }
        }
    }
    Ok(resolved)
}

fn resolve_field(
    server: &ServerSchema,
    client: &ClientSchema,
    seen_directives: &mut HashSet<(String, Name)>,
    parent_type: &str,
    target_prefix: &str,
    field: &FieldSelection,
) -> Result<ResolvedSelection, SchemaError> {
    let target = format!("{target_prefix}.{}", field.name.name);
    check_directives(
        server,
        seen_directives,
        &field.directives,
        DirectiveLocation::Field,
        &target,
    )?;

    if field.name.name == "__typename" {
        return Ok(ResolvedSelection::Field {
            alias: field.alias.as_ref().map(|a| a.name.clone()),
            name: field.name.name.clone(),
            ty: None,
            selections: Vec::new(),
        });
    }

    let Some(definition) = server.type_field(parent_type, &field.name.name) else {
        return Err(SchemaError::new(
            SchemaErrorKind::UnknownType,
            format!(
                "type \"{}\" has no field \"{}\"",
                parent_type, field.name.name
            ),
            field.name.loc.location(),
        ));
    };
    let ty = definition.spec.return_type_ref().clone();

    let selections = match &field.selection_set {
        Some(selections) => {
            if !ty.is_composite() {
                return Err(SchemaError::new(
                    SchemaErrorKind::UnknownType,
                    format!(
                        "field \"{}\" of leaf type \"{}\" cannot have a selection set",
                        field.name.name, ty
                    ),
                    field.name.loc.location(),
                ));
            }
            resolve_selections(
                server,
                client,
                seen_directives,
                ty.name(),
                &target,
                selections,
            )?
        }
        None => {
            if ty.is_composite() {
                return Err(SchemaError::new(
                    SchemaErrorKind::UnknownType,
                    format!(
                        "field \"{}\" of composite type \"{}\" requires a selection set",
                        field.name.name, ty
                    ),
                    field.name.loc.location(),
                ));
            }
            Vec::new()
        }
    };

    Ok(ResolvedSelection::Field {
        alias: field.alias.as_ref().map(|a| a.name.clone()),
        name: field.name.name.clone(),
        ty: Some(ty),
        selections,
    })
}
