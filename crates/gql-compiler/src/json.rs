//! JSON forms of the resolved schema.
//!
//! The serialized shape is `{ "server": { scalars, enums, inputs, objects,
//! interfaces, unions, directives, … } }`; cross-references between
//! entities appear as `{ "_type": <kind>, "name": <str> }` stubs. Reading a
//! schema back re-hydrates those stubs and re-checks reference closure, so
//! a loaded schema is as trustworthy as a freshly resolved one.

use thiserror::Error;

use crate::schema::{
    InputFieldSpec, InputTypeRef, NonCallableFieldSpec, ObjectFieldSpec, OutputTypeRef, Schema,
    ServerSchema, TypeKind,
};

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid schema JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unresolved reference to {kind} \"{name}\"")]
    UnresolvedReference { kind: &'static str, name: String },
    #[error("unsupported type shape: {0}")]
    Unsupported(String),
}

pub fn schema_to_json(schema: &Schema) -> Result<serde_json::Value, JsonError> {
    Ok(serde_json::to_value(schema)?)
}

pub fn schema_to_json_string(schema: &Schema) -> Result<String, JsonError> {
    Ok(serde_json::to_string_pretty(schema)?)
}

/// Parse a schema from its JSON form and re-validate reference closure.
pub fn schema_from_json(json: &str) -> Result<Schema, JsonError> {
    let schema: Schema = serde_json::from_str(json)?;
    validate_references(&schema.server)?;
    Ok(schema)
}

pub fn schema_from_json_value(value: serde_json::Value) -> Result<Schema, JsonError> {
    let schema: Schema = serde_json::from_value(value)?;
    validate_references(&schema.server)?;
    Ok(schema)
}

fn unresolved(kind: &'static str, name: &str) -> JsonError {
    JsonError::UnresolvedReference {
        kind,
        name: name.to_string(),
    }
}

fn check_input_ref(server: &ServerSchema, reference: &InputTypeRef) -> Result<(), JsonError> {
    let ok = match reference {
        InputTypeRef::Scalar { name } => server.scalars.contains_key(name),
        InputTypeRef::Enum { name } => server.enums.contains_key(name),
        InputTypeRef::Input { name } => server.inputs.contains_key(name),
    };
    if ok {
        Ok(())
    } else {
        Err(unresolved(input_ref_kind(reference), reference.name()))
    }
}

fn input_ref_kind(reference: &InputTypeRef) -> &'static str {
    match reference {
        InputTypeRef::Scalar { .. } => "scalar",
        InputTypeRef::Enum { .. } => "enum",
        InputTypeRef::Input { .. } => "input",
    }
}

fn check_output_ref(server: &ServerSchema, reference: &OutputTypeRef) -> Result<(), JsonError> {
    let ok = match reference {
        OutputTypeRef::Scalar { name } => server.scalars.contains_key(name),
        OutputTypeRef::Enum { name } => server.enums.contains_key(name),
        OutputTypeRef::Object { name } => server.objects.contains_key(name),
        OutputTypeRef::Interface { name } => server.interfaces.contains_key(name),
        OutputTypeRef::Union { name } => server.unions.contains_key(name),
    };
    if ok {
        Ok(())
    } else {
        Err(unresolved(output_ref_kind(reference), reference.name()))
    }
}

fn output_ref_kind(reference: &OutputTypeRef) -> &'static str {
    match reference {
        OutputTypeRef::Scalar { .. } => "scalar",
        OutputTypeRef::Enum { .. } => "enum",
        OutputTypeRef::Object { .. } => "object",
        OutputTypeRef::Interface { .. } => "interface",
        OutputTypeRef::Union { .. } => "union",
    }
}

fn check_input_spec(server: &ServerSchema, spec: &InputFieldSpec) -> Result<(), JsonError> {
    match spec {
        InputFieldSpec::Literal(spec) => check_input_ref(server, &spec.ty),
        InputFieldSpec::Array(spec) => check_input_ref(server, &spec.ty),
    }
}

fn check_object_spec(server: &ServerSchema, spec: &ObjectFieldSpec) -> Result<(), JsonError> {
    match spec {
        ObjectFieldSpec::Literal(spec) => check_output_ref(server, &spec.ty),
        ObjectFieldSpec::Array(spec) => check_output_ref(server, &spec.ty),
        ObjectFieldSpec::Callable {
            return_type,
            arguments,
        } => {
            match return_type {
                NonCallableFieldSpec::Literal(spec) => check_output_ref(server, &spec.ty)?,
                NonCallableFieldSpec::Array(spec) => check_output_ref(server, &spec.ty)?,
            }
            for argument in arguments.values() {
                check_input_spec(server, &argument.spec)?;
            }
            Ok(())
        }
    }
}

/// Walk every reference in the schema and require it to land on an entity
/// of the right kind.
fn validate_references(server: &ServerSchema) -> Result<(), JsonError> {
    for input in server.inputs.values() {
        for field in input.fields.values() {
            check_input_spec(server, &field.spec)?;
        }
    }
    for object in server.objects.values() {
        for interface in &object.implements {
            if !server.interfaces.contains_key(interface) {
                return Err(unresolved("interface", interface));
            }
        }
        for field in object.fields.values() {
            check_object_spec(server, &field.spec)?;
        }
    }
    for interface in server.interfaces.values() {
        for field in interface.fields.values() {
            check_object_spec(server, &field.spec)?;
        }
    }
    for union in server.unions.values() {
        for member in &union.members {
            if !server.objects.contains_key(member) {
                return Err(unresolved("object", member));
            }
        }
    }
    for directive in server.directives.values() {
        for argument in directive.arguments.values() {
            check_input_spec(server, &argument.spec)?;
        }
    }
    for root in [
        &server.query_type,
        &server.mutation_type,
        &server.subscription_type,
    ]
    .into_iter()
    .flatten()
    {
        if server.type_kind(root) != Some(TypeKind::Object) {
            return Err(unresolved("object", root));
        }
    }
    Ok(())
}
