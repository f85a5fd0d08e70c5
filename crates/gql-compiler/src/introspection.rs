//! Conversion of a server's introspection response into a [`ServerSchema`].
//!
//! The fixed [`INTROSPECTION_QUERY`] asks for the full `__schema` shape;
//! [`server_schema_from_introspection`] maps the response back into the
//! same resolved model the local pipeline produces, so the two sides can
//! be diffed directly. Meta types (names starting with `__`) are skipped.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use gql_parser::ast::DirectiveLocation;

use crate::json::JsonError;
use crate::schema::{
    ArrayFieldSpec, DirectiveDefinition, EnumType, FieldDefinition, InputFieldDefinition,
    InputFieldSpec, InputType, InputTypeRef, InterfaceType, LiteralFieldSpec,
    NonCallableFieldSpec, ObjectFieldDefinition, ObjectFieldSpec, ObjectType, OutputTypeRef,
    ScalarType, ServerSchema, UnionType,
};

/// The introspection document POSTed to a server by `gql internal diff`.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        args { name type { ...TypeRef } defaultValue }
        type { ...TypeRef }
      }
      inputFields { name type { ...TypeRef } defaultValue }
      interfaces { name }
      enumValues(includeDeprecated: true) { name }
      possibleTypes { name }
    }
    directives {
      name
      locations
      args { name type { ...TypeRef } defaultValue }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType { kind name }
    }
  }
}
"#;

/// The (kind, name, nullability) shape of an introspected type reference,
/// flattened out of its NON_NULL/LIST wrappers.
struct TypeShape {
    kind: String,
    name: String,
    nullable: bool,
    element: Option<(String, String, bool)>,
}

fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str, JsonError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| JsonError::Unsupported(format!("missing string field \"{key}\"")))
}

/// Unwrap a `__Type` reference: peel NON_NULL into a nullability flag and
/// LIST into an element shape. Lists of lists are not representable.
fn type_shape(value: &Value) -> Result<TypeShape, JsonError> {
    let mut nullable = true;
    let mut current = value;
    if str_field(current, "kind")? == "NON_NULL" {
        nullable = false;
        current = current
            .get("ofType")
            .ok_or_else(|| JsonError::Unsupported("NON_NULL without ofType".to_string()))?;
    }
    if str_field(current, "kind")? == "LIST" {
        let mut element = current
            .get("ofType")
            .ok_or_else(|| JsonError::Unsupported("LIST without ofType".to_string()))?;
        let mut element_nullable = true;
        if str_field(element, "kind")? == "NON_NULL" {
            element_nullable = false;
            element = element
                .get("ofType")
                .ok_or_else(|| JsonError::Unsupported("NON_NULL without ofType".to_string()))?;
        }
        let element_kind = str_field(element, "kind")?;
        if element_kind == "LIST" {
            return Err(JsonError::Unsupported(
                "nested list types are not supported".to_string(),
            ));
        }
        return Ok(TypeShape {
            kind: "LIST".to_string(),
            name: String::new(),
            nullable,
            element: Some((
                element_kind.to_string(),
                str_field(element, "name")?.to_string(),
                element_nullable,
            )),
        });
    }
    Ok(TypeShape {
        kind: str_field(current, "kind")?.to_string(),
        name: str_field(current, "name")?.to_string(),
        nullable,
        element: None,
    })
}

fn input_ref(kind: &str, name: &str) -> Result<InputTypeRef, JsonError> {
    let name = name.to_string();
    Ok(match kind {
        "SCALAR" => InputTypeRef::Scalar { name },
        "ENUM" => InputTypeRef::Enum { name },
        "INPUT_OBJECT" => InputTypeRef::Input { name },
        _ => {
            return Err(JsonError::Unsupported(format!(
                "{kind} type \"{name}\" in an input position"
            )))
        }
    })
}

fn output_ref(kind: &str, name: &str) -> Result<OutputTypeRef, JsonError> {
    let name = name.to_string();
    Ok(match kind {
        "SCALAR" => OutputTypeRef::Scalar { name },
        "ENUM" => OutputTypeRef::Enum { name },
        "OBJECT" => OutputTypeRef::Object { name },
        "INTERFACE" => OutputTypeRef::Interface { name },
        "UNION" => OutputTypeRef::Union { name },
        _ => {
            return Err(JsonError::Unsupported(format!(
                "{kind} type \"{name}\" in an output position"
            )))
        }
    })
}

fn input_field(value: &Value) -> Result<InputFieldDefinition, JsonError> {
    let name = str_field(value, "name")?.to_string();
    let shape = type_shape(
        value
            .get("type")
            .ok_or_else(|| JsonError::Unsupported("argument without type".to_string()))?,
    )?;
    let (spec, nullable) = match shape.element {
        Some((element_kind, element_name, element_nullable)) => (
            InputFieldSpec::Array(ArrayFieldSpec {
                ty: input_ref(&element_kind, &element_name)?,
                nullable: element_nullable,
                default_value: None,
            }),
            shape.nullable,
        ),
        None => (
            InputFieldSpec::Literal(LiteralFieldSpec {
                ty: input_ref(&shape.kind, &shape.name)?,
                default_value: None,
            }),
            shape.nullable,
        ),
    };
    Ok(FieldDefinition {
        name,
        spec,
        nullable,
    })
}

fn output_field(value: &Value) -> Result<ObjectFieldDefinition, JsonError> {
    let name = str_field(value, "name")?.to_string();
    let shape = type_shape(
        value
            .get("type")
            .ok_or_else(|| JsonError::Unsupported("field without type".to_string()))?,
    )?;
    let return_spec = match shape.element {
        Some((element_kind, element_name, element_nullable)) => {
            NonCallableFieldSpec::Array(ArrayFieldSpec {
                ty: output_ref(&element_kind, &element_name)?,
                nullable: element_nullable,
                default_value: None,
            })
        }
        None => NonCallableFieldSpec::Literal(LiteralFieldSpec {
            ty: output_ref(&shape.kind, &shape.name)?,
            default_value: None,
        }),
    };
    let args = value.get("args").and_then(Value::as_array);
    let spec = match args {
        Some(args) if !args.is_empty() => {
            let mut arguments = IndexMap::new();
            for arg in args {
                let argument = input_field(arg)?;
                arguments.insert(argument.name.clone(), argument);
            }
            ObjectFieldSpec::Callable {
                return_type: return_spec,
                arguments,
            }
        }
        _ => match return_spec {
            NonCallableFieldSpec::Literal(spec) => ObjectFieldSpec::Literal(spec),
            NonCallableFieldSpec::Array(spec) => ObjectFieldSpec::Array(spec),
        },
    };
    Ok(FieldDefinition {
        name,
        spec,
        nullable: shape.nullable,
    })
}

fn output_fields(value: &Value) -> Result<IndexMap<String, ObjectFieldDefinition>, JsonError> {
    let mut fields = IndexMap::new();
    if let Some(list) = value.get("fields").and_then(Value::as_array) {
        for field in list {
            let field = output_field(field)?;
            fields.insert(field.name.clone(), field);
        }
    }
    Ok(fields)
}

/// Map an introspection response (the full HTTP response body, with or
/// without the `data` envelope) into a resolved server schema.
pub fn server_schema_from_introspection(response: &Value) -> Result<ServerSchema, JsonError> {
    let introspected = response
        .get("data")
        .unwrap_or(response)
        .get("__schema")
        .ok_or_else(|| JsonError::Unsupported("response has no __schema".to_string()))?;

    let mut server = ServerSchema::default();

    for root in ["queryType", "mutationType", "subscriptionType"] {
        let name = introspected
            .get(root)
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
        match root {
            "queryType" => server.query_type = name,
            "mutationType" => server.mutation_type = name,
            _ => server.subscription_type = name,
        }
    }

    let types = introspected
        .get("types")
        .and_then(Value::as_array)
        .ok_or_else(|| JsonError::Unsupported("__schema has no types array".to_string()))?;
    for ty in types {
        let name = str_field(ty, "name")?.to_string();
        if name.starts_with("__") {
            continue;
        }
        match str_field(ty, "kind")? {
            "SCALAR" => {
                server.scalars.insert(
                    name.clone(),
                    ScalarType {
                        name,
                        directives: Vec::new(),
                    },
                );
            }
            "ENUM" => {
                let mut values = IndexMap::new();
                if let Some(list) = ty.get("enumValues").and_then(Value::as_array) {
                    for value in list {
                        values.insert(str_field(value, "name")?.to_string(), Vec::new());
                    }
                }
                server.enums.insert(
                    name.clone(),
                    EnumType {
                        name,
                        values,
                        directives: Vec::new(),
                    },
                );
            }
            "OBJECT" => {
                let mut implements = IndexSet::new();
                if let Some(list) = ty.get("interfaces").and_then(Value::as_array) {
                    for interface in list {
                        implements.insert(str_field(interface, "name")?.to_string());
                    }
                }
                let fields = output_fields(ty)?;
                server.objects.insert(
                    name.clone(),
                    ObjectType {
                        name,
                        implements,
                        fields,
                        directives: Vec::new(),
                    },
                );
            }
            "INTERFACE" => {
                let fields = output_fields(ty)?;
                server.interfaces.insert(
                    name.clone(),
                    InterfaceType {
                        name,
                        fields,
                        directives: Vec::new(),
                    },
                );
            }
            "UNION" => {
                let mut members = IndexSet::new();
                if let Some(list) = ty.get("possibleTypes").and_then(Value::as_array) {
                    for member in list {
                        members.insert(str_field(member, "name")?.to_string());
                    }
                }
                server.unions.insert(
                    name.clone(),
                    UnionType {
                        name,
                        members,
                        directives: Vec::new(),
                    },
                );
            }
            "INPUT_OBJECT" => {
                let mut fields = IndexMap::new();
                if let Some(list) = ty.get("inputFields").and_then(Value::as_array) {
                    for field in list {
                        let field = input_field(field)?;
                        fields.insert(field.name.clone(), field);
                    }
                }
                server.inputs.insert(
                    name.clone(),
                    InputType {
                        name,
                        fields,
                        directives: Vec::new(),
                    },
                );
            }
            other => {
                return Err(JsonError::Unsupported(format!(
                    "unknown type kind \"{other}\""
                )))
            }
        }
    }

    if let Some(directives) = introspected.get("directives").and_then(Value::as_array) {
        for directive in directives {
            let name = str_field(directive, "name")?.to_string();
            let mut arguments = IndexMap::new();
            if let Some(args) = directive.get("args").and_then(Value::as_array) {
                for arg in args {
                    let argument = input_field(arg)?;
                    arguments.insert(argument.name.clone(), argument);
                }
            }
            let mut locations = Vec::new();
            if let Some(list) = directive.get("locations").and_then(Value::as_array) {
                for location in list {
                    let tag = location.as_str().unwrap_or_default();
                    locations.push(DirectiveLocation::from_name(tag).ok_or_else(|| {
                        JsonError::Unsupported(format!("unknown directive location \"{tag}\""))
                    })?);
                }
            }
            server.directives.insert(
                name.clone(),
                DirectiveDefinition {
                    name,
                    arguments,
                    repeatable: false,
                    locations,
                },
            );
        }
    }

    Ok(server)
}
