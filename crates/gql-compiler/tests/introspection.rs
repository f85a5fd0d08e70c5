use pretty_assertions::assert_eq;
use serde_json::json;

use gql_compiler::schema::{ObjectFieldSpec, OutputTypeRef};
use gql_compiler::{diff_schemas, server_schema_from_introspection, INTROSPECTION_QUERY};

fn named(kind: &str, name: &str) -> serde_json::Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

fn non_null(inner: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
}

fn list(inner: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "LIST", "name": null, "ofType": inner })
}

fn sample_response() -> serde_json::Value {
    json!({
        "data": {
            "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    {
                        "kind": "OBJECT",
                        "name": "Query",
                        "fields": [
                            {
                                "name": "user",
                                "args": [
                                    { "name": "id", "type": non_null(named("SCALAR", "ID")), "defaultValue": null }
                                ],
                                "type": named("OBJECT", "User")
                            },
                            {
                                "name": "roles",
                                "args": [],
                                "type": list(non_null(named("ENUM", "Role")))
                            }
                        ],
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "OBJECT",
                        "name": "User",
                        "fields": [
                            { "name": "id", "args": [], "type": non_null(named("SCALAR", "ID")) },
                            { "name": "name", "args": [], "type": named("SCALAR", "String") }
                        ],
                        "inputFields": null,
                        "interfaces": [ { "name": "Node" } ],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "INTERFACE",
                        "name": "Node",
                        "fields": [
                            { "name": "id", "args": [], "type": non_null(named("SCALAR", "ID")) }
                        ],
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": [ { "name": "User" } ]
                    },
                    {
                        "kind": "ENUM",
                        "name": "Role",
                        "fields": null,
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": [ { "name": "ADMIN" }, { "name": "MEMBER" } ],
                        "possibleTypes": null
                    },
                    {
                        "kind": "SCALAR",
                        "name": "ID",
                        "fields": null,
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "SCALAR",
                        "name": "String",
                        "fields": null,
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "__Schema",
                        "name": "__Schema",
                        "fields": null,
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    }
                ],
                "directives": []
            }
        }
    })
}

#[test]
fn introspection_response_maps_to_a_server_schema() {
    let server = server_schema_from_introspection(&sample_response()).unwrap();
    assert_eq!(server.query_type.as_deref(), Some("Query"));
    assert_eq!(server.mutation_type, None);

    let user_field = &server.objects["Query"].fields["user"];
    assert!(user_field.nullable);
    let ObjectFieldSpec::Callable {
        return_type,
        arguments,
    } = &user_field.spec
    else {
        panic!("expected a callable spec");
    };
    assert_eq!(
        return_type.type_ref(),
        &OutputTypeRef::Object {
            name: "User".to_string()
        }
    );
    assert!(!arguments["id"].nullable);

    let roles = &server.objects["Query"].fields["roles"];
    let ObjectFieldSpec::Array(spec) = &roles.spec else {
        panic!("expected an array spec");
    };
    assert!(!spec.nullable);
    assert!(roles.nullable);

    assert!(server.objects["User"].implements.contains("Node"));
    assert_eq!(server.enums["Role"].values.len(), 2);
    assert_eq!(server.interfaces["Node"].fields.len(), 1);
}

#[test]
fn introspected_schema_diffs_against_a_local_one() {
    let remote = server_schema_from_introspection(&sample_response()).unwrap();
    let local = crate::resolve_schema(
        "interface Node { id: ID! }\n\
         type User implements Node { id: ID!, name: String }\n\
         type Query { user(id: ID!): User, roles: [Role!] }\n\
         enum Role { ADMIN, MEMBER }",
    )
    .unwrap();
    let differences = diff_schemas(&local.server, &remote);
    // The introspection sample carries no Int/Float/Boolean scalars and no
    // built-in directives; everything the two sides share must agree.
    for difference in &differences {
        assert!(
            difference.path.starts_with("scalars.")
                || difference.path.starts_with("directives."),
            "unexpected difference: {difference}"
        );
    }
}

#[test]
fn the_introspection_query_asks_for_the_full_shape() {
    assert!(INTROSPECTION_QUERY.contains("__schema"));
    assert!(INTROSPECTION_QUERY.contains("queryType"));
    assert!(INTROSPECTION_QUERY.contains("fragment TypeRef on __Type"));
}

#[test]
fn meta_types_are_skipped() {
    let server = server_schema_from_introspection(&sample_response()).unwrap();
    assert!(!server.objects.contains_key("__Schema"));
    assert!(server.type_kind("__Schema").is_none());
}
