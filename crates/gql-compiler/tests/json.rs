use indoc::indoc;
use pretty_assertions::assert_eq;

use gql_compiler::{schema_from_json, schema_to_json, schema_to_json_string};

use crate::resolve_schema;

const FIXTURE: &str = indoc! {"
    interface Node { id: ID! }
    type User implements Node { id: ID!, name: String, friends: [User!]! }
    enum Role { ADMIN, MEMBER }
    union Principal = User
    input UserFilter { role: Role, nameLike: String = \"%\" }
    type Query { users(filter: UserFilter): [User!] }
    schema { query: Query }
"};

#[test]
fn schema_json_uses_stub_references() {
    let schema = resolve_schema(FIXTURE).unwrap();
    let json = schema_to_json(&schema).unwrap();

    let users = &json["server"]["objects"]["Query"]["fields"]["users"];
    assert_eq!(users["spec"]["_type"], "callable");
    assert_eq!(
        users["spec"]["returnType"]["type"],
        serde_json::json!({ "_type": "Object", "name": "User" })
    );
    assert_eq!(
        users["spec"]["arguments"]["filter"]["spec"]["type"],
        serde_json::json!({ "_type": "Input", "name": "UserFilter" })
    );
}

#[test]
fn resolve_serialize_resolve_is_idempotent() {
    let schema = resolve_schema(FIXTURE).unwrap();
    let json = schema_to_json_string(&schema).unwrap();
    let rehydrated = schema_from_json(&json).unwrap();
    assert_eq!(rehydrated.server, schema.server);

    // A second round trip changes nothing.
    let json_again = schema_to_json_string(&rehydrated).unwrap();
    assert_eq!(json_again, json);
}

#[test]
fn broken_stub_references_are_rejected() {
    let schema = resolve_schema(FIXTURE).unwrap();
    let mut json = schema_to_json(&schema).unwrap();
    json["server"]["objects"]["Query"]["fields"]["users"]["spec"]["returnType"]["type"] =
        serde_json::json!({ "_type": "Object", "name": "Ghost" });
    let err = gql_compiler::json::schema_from_json_value(json).unwrap_err();
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = schema_from_json("{ not json").unwrap_err();
    assert!(matches!(err, gql_compiler::JsonError::Parse(_)));
}
