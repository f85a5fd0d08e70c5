use indoc::indoc;
use pretty_assertions::assert_eq;

use gql_compiler::diff::{diff_schemas, Change};

use crate::resolve_schema;

#[test]
fn identical_schemas_have_no_differences() {
    let input = "type Query { hello: String }";
    let local = resolve_schema(input).unwrap();
    let remote = resolve_schema(input).unwrap();
    assert_eq!(diff_schemas(&local.server, &remote.server), vec![]);
}

#[test]
fn added_and_removed_types_are_reported() {
    let local = resolve_schema("type Query { a: Int } enum Old { A }").unwrap();
    let remote = resolve_schema("type Query { a: Int } enum New { A }").unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    let rendered: Vec<String> = differences.iter().map(|d| d.to_string()).collect();
    assert_eq!(rendered, vec!["- enums.Old", "+ enums.New"]);
}

#[test]
fn changed_field_types_are_rendered() {
    let local = resolve_schema("type Query { a: Int, b: [String!], gone: Boolean }").unwrap();
    let remote = resolve_schema("type Query { a: Int!, b: [String!], fresh: Boolean }").unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    assert!(differences.iter().any(|d| {
        d.path == "objects.Query.fields.a"
            && d.change
                == Change::Changed {
                    from: "Int".to_string(),
                    to: "Int!".to_string(),
                }
    }));
    assert!(differences
        .iter()
        .any(|d| d.path == "objects.Query.fields.gone" && d.change == Change::Removed));
    assert!(differences
        .iter()
        .any(|d| d.path == "objects.Query.fields.fresh" && d.change == Change::Added));
}

#[test]
fn argument_changes_show_in_the_rendering() {
    let local = resolve_schema("type Query { user(id: ID!): String }").unwrap();
    let remote = resolve_schema("type Query { user(id: ID!, full: Boolean): String }").unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    assert_eq!(differences.len(), 1);
    assert_eq!(differences[0].path, "objects.Query.fields.user");
    let Change::Changed { from, to } = &differences[0].change else {
        panic!("expected a change");
    };
    assert_eq!(from, "(id: ID!) String");
    assert_eq!(to, "(id: ID!, full: Boolean) String");
}

#[test]
fn enum_value_and_union_member_changes_are_keyed_by_path() {
    let local = resolve_schema(indoc! {"
        type A { x: Int }
        type B { y: Int }
        enum Color { RED, GREEN }
        union U = A
        type Query { u: U }
    "})
    .unwrap();
    let remote = resolve_schema(indoc! {"
        type A { x: Int }
        type B { y: Int }
        enum Color { RED, BLUE }
        union U = A | B
        type Query { u: U }
    "})
    .unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    let rendered: Vec<String> = differences.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "- enums.Color.values.GREEN",
            "+ enums.Color.values.BLUE",
            "+ unions.U.members.B",
        ]
    );
}

#[test]
fn diff_report_renders_stably() {
    let local = resolve_schema("type Query { a: Int, old: String }").unwrap();
    let remote = resolve_schema("type Query { a: Int!, fresh: Boolean }").unwrap();
    let report: String = diff_schemas(&local.server, &remote.server)
        .iter()
        .map(|difference| format!("{difference}\n"))
        .collect();
    expect_test::expect![[r#"
        ~ objects.Query.fields.a: Int -> Int!
        - objects.Query.fields.old
        + objects.Query.fields.fresh
    "#]]
    .assert_eq(&report);
}

#[test]
fn root_operation_changes_are_reported() {
    let local = resolve_schema("type Query { a: Int }").unwrap();
    let remote =
        resolve_schema("schema { query: Root } type Root { a: Int } type Query { a: Int }")
            .unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    assert!(differences.iter().any(|d| {
        d.path == "schema.query"
            && d.change
                == Change::Changed {
                    from: "Query".to_string(),
                    to: "Root".to_string(),
                }
    }));
}

#[test]
fn directive_applications_participate_in_the_diff() {
    let local = resolve_schema("scalar URL").unwrap();
    let remote =
        resolve_schema("scalar URL @specifiedBy(url: \"https://example.com\")").unwrap();
    let differences = diff_schemas(&local.server, &remote.server);
    let rendered: Vec<String> = differences.iter().map(|d| d.to_string()).collect();
    assert_eq!(rendered, vec!["+ scalars.URL.@specifiedBy"]);
}
