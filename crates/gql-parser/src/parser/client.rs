//! The client-mode grammar: operations, fragments and selection sets.

use indexmap::IndexMap;
use triomphe::Arc;

use crate::ast::{
    ClientDefinition, FieldSelection, FragmentDefinition, FragmentSpread, InlineFragment,
    InputValueDefinition, OperationDefinition, OperationType, Selection,
};
use crate::lexer::{SourceFile, Token, TokenKind};
use crate::parser::{shared, Parser, ParserError};

const KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "on",
    "true",
    "false",
    "null",
];

/// Parse an executable document into its operations and fragments.
pub fn parse_client(
    tokens: &[Token],
    source: &Arc<SourceFile>,
) -> Result<Vec<ClientDefinition>, ParserError> {
    let mut p = Parser::new(tokens, source, KEYWORDS);
    let mut definitions = Vec::new();

    while !p.at_end() {
        let start = p.mark();
        let keyword = p.consume(TokenKind::Identifier)?;
        let definition = match keyword.lexeme.as_str() {
            "query" => operation(&mut p, OperationType::Query, start)?,
            "mutation" => operation(&mut p, OperationType::Mutation, start)?,
            "subscription" => operation(&mut p, OperationType::Subscription, start)?,
            "fragment" => fragment(&mut p, start)?,
            _ => return Err(p.error_unexpected_identifier(&keyword)),
        };
        definitions.push(definition);
    }

    Ok(definitions)
}

fn operation(
    p: &mut Parser<'_>,
    op_type: OperationType,
    start: usize,
) -> Result<ClientDefinition, ParserError> {
    let name = p.name()?;
    let variables = if p.peek_kind() == Some(TokenKind::LeftParen) {
        variable_definitions(p)?
    } else {
        Vec::new()
    };
    let directives = shared::directives(p)?;
    let selection_set = selection_set(p)?;
    Ok(ClientDefinition::Operation(OperationDefinition {
        loc: p.node_loc(start),
        op_type,
        name,
        variables,
        directives,
        selection_set,
    }))
}

/// `'(' ('$' Name ':' TypeRef ('=' Literal)? ','?)+ ')'`
fn variable_definitions(p: &mut Parser<'_>) -> Result<Vec<InputValueDefinition>, ParserError> {
    p.consume(TokenKind::LeftParen)?;
    let mut variables: Vec<InputValueDefinition> = Vec::new();
    loop {
        let start = p.mark();
        p.consume(TokenKind::Dollar)?;
        let name = p.name()?;
        p.consume(TokenKind::Colon)?;
        let ty = shared::type_ref(p)?;
        let default_value = if p.eat(TokenKind::Equal) {
            Some(shared::literal(p)?)
        } else {
            None
        };
        if variables.iter().any(|v| v.name.name == name.name) {
            return Err(p.error_duplicate(&name.loc.start_token, "variable"));
        }
        variables.push(InputValueDefinition {
            loc: p.node_loc(start),
            description: None,
            name,
            ty,
            default_value,
        });
        p.eat_commas();
        if p.peek_kind() == Some(TokenKind::RightParen) {
            break;
        }
    }
    p.consume(TokenKind::RightParen)?;
    Ok(variables)
}

/// `fragment Name 'on' Name Directives? SelectionSet`
fn fragment(p: &mut Parser<'_>, start: usize) -> Result<ClientDefinition, ParserError> {
    let name = p.name()?;
    p.consume_lexeme("on")?;
    let type_condition = p.name()?;
    let directives = shared::directives(p)?;
    let selection_set = selection_set(p)?;
    Ok(ClientDefinition::Fragment(FragmentDefinition {
        loc: p.node_loc(start),
        name,
        type_condition,
        directives,
        selection_set,
    }))
}

/// `'{' Selection+ '}'`
fn selection_set(p: &mut Parser<'_>) -> Result<Vec<Selection>, ParserError> {
    p.consume(TokenKind::LeftBrace)?;
    let mut selections = Vec::new();
    while p.peek_kind() != Some(TokenKind::RightBrace) {
        selections.push(selection(p)?);
        p.eat_commas();
    }
    if selections.is_empty() {
        return Err(p.error_expected("at least one selection"));
    }
    p.consume(TokenKind::RightBrace)?;
    Ok(selections)
}

/// Dispatch on lookahead: `...` introduces a spread or inline fragment,
/// anything else is a field selection.
fn selection(p: &mut Parser<'_>) -> Result<Selection, ParserError> {
    match p.peek_kind() {
        Some(TokenKind::Spread) => spread_selection(p),
        Some(TokenKind::Identifier) => field_selection(p),
        _ => Err(p.error_expected("a field, fragment spread or inline fragment")),
    }
}

fn spread_selection(p: &mut Parser<'_>) -> Result<Selection, ParserError> {
    let start = p.mark();
    p.consume(TokenKind::Spread)?;
    match p.peek_kind() {
        Some(TokenKind::Identifier) if p.peek_lexeme() == Some("on") => {
            p.next()?;
            let type_condition = p.name()?;
            let directives = shared::directives(p)?;
            let selection_set = selection_set(p)?;
            Ok(Selection::InlineFragment(InlineFragment {
                loc: p.node_loc(start),
                type_condition: Some(type_condition),
                directives,
                selection_set,
            }))
        }
        Some(TokenKind::Identifier) => {
            let fragment_name = p.name()?;
            let directives = shared::directives(p)?;
            Ok(Selection::FragmentSpread(FragmentSpread {
                loc: p.node_loc(start),
                fragment_name,
                directives,
            }))
        }
        Some(TokenKind::At) | Some(TokenKind::LeftBrace) => {
            let directives = shared::directives(p)?;
            let selection_set = selection_set(p)?;
            Ok(Selection::InlineFragment(InlineFragment {
                loc: p.node_loc(start),
                type_condition: None,
                directives,
                selection_set,
            }))
        }
        _ => Err(p.error_expected("an inline fragment or a fragment spread")),
    }
}

/// `Alias? Name Arguments? Directives? SelectionSet?`
fn field_selection(p: &mut Parser<'_>) -> Result<Selection, ParserError> {
    let start = p.mark();
    let first = p.name()?;
    let (alias, name) = if p.eat(TokenKind::Colon) {
        (Some(first), p.name()?)
    } else {
        (None, first)
    };
    let arguments = if p.peek_kind() == Some(TokenKind::LeftParen) {
        shared::literal_arguments(p)?
    } else {
        IndexMap::new()
    };
    let directives = shared::directives(p)?;
    let selection_set = if p.peek_kind() == Some(TokenKind::LeftBrace) {
        Some(selection_set(p)?)
    } else {
        None
    };
    Ok(Selection::Field(FieldSelection {
        loc: p.node_loc(start),
        alias,
        name,
        arguments,
        directives,
        selection_set,
    }))
}

#[cfg(test)]
mod test {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{Literal, TypeRef};
    use crate::lexer::{tokenize, SourceFile};
    use crate::parser::ParserErrorKind;

    fn parse(input: &str) -> Vec<ClientDefinition> {
        let source = SourceFile::new("query.graphql", input);
        let tokens = tokenize(&source).unwrap();
        parse_client(&tokens, &source).unwrap()
    }

    fn parse_err(input: &str) -> ParserError {
        let source = SourceFile::new("query.graphql", input);
        let tokens = tokenize(&source).unwrap();
        parse_client(&tokens, &source).unwrap_err()
    }

    #[test]
    fn it_parses_a_query_with_variables() {
        let definitions = parse(indoc! {"
            query GetUser($id: ID!, $full: Boolean = false) {
                user(id: $id) {
                    name
                }
            }
        "});
        let ClientDefinition::Operation(op) = &definitions[0] else {
            panic!("expected an operation");
        };
        assert_eq!(op.op_type, OperationType::Query);
        assert_eq!(op.name.name, "GetUser");
        assert_eq!(op.variables.len(), 2);
        let TypeRef::Named { name, nullable, .. } = &op.variables[0].ty else {
            panic!("expected a named type");
        };
        assert_eq!(name.name, "ID");
        assert!(!*nullable);
        assert_eq!(
            op.variables[1].default_value,
            Some(Literal::Boolean(false))
        );
        let Selection::Field(user) = &op.selection_set[0] else {
            panic!("expected a field selection");
        };
        assert_eq!(
            user.arguments["id"],
            Literal::Variable("id".to_string())
        );
    }

    #[test]
    fn it_parses_mutations_and_subscriptions() {
        let definitions = parse(
            "mutation AddUser { addUser { id } }\n\
             subscription OnUser { userAdded { id } }",
        );
        let ClientDefinition::Operation(first) = &definitions[0] else {
            panic!("expected an operation");
        };
        let ClientDefinition::Operation(second) = &definitions[1] else {
            panic!("expected an operation");
        };
        assert_eq!(first.op_type, OperationType::Mutation);
        assert_eq!(second.op_type, OperationType::Subscription);
    }

    #[test]
    fn it_parses_aliases_arguments_and_nested_selections() {
        let definitions = parse("query Q { animal: cat(kind: TABBY) { name } }");
        let ClientDefinition::Operation(op) = &definitions[0] else {
            panic!("expected an operation");
        };
        let Selection::Field(field) = &op.selection_set[0] else {
            panic!("expected a field selection");
        };
        assert_eq!(field.alias.as_ref().unwrap().name, "animal");
        assert_eq!(field.name.name, "cat");
        assert_eq!(
            field.arguments["kind"],
            Literal::Enum("TABBY".to_string())
        );
        assert!(field.selection_set.is_some());
    }

    #[test]
    fn it_parses_fragments_and_spreads() {
        let definitions = parse(indoc! {"
            fragment friendFields on User {
                id
                name
            }
            query WithFragments {
                user {
                    ...friendFields
                    ... on Admin @include(if: true) {
                        permissions
                    }
                    ... {
                        id
                    }
                }
            }
        "});
        let ClientDefinition::Fragment(fragment) = &definitions[0] else {
            panic!("expected a fragment");
        };
        assert_eq!(fragment.name.name, "friendFields");
        assert_eq!(fragment.type_condition.name, "User");

        let ClientDefinition::Operation(op) = &definitions[1] else {
            panic!("expected an operation");
        };
        let Selection::Field(user) = &op.selection_set[0] else {
            panic!("expected a field selection");
        };
        let selections = user.selection_set.as_ref().unwrap();
        assert!(matches!(&selections[0], Selection::FragmentSpread(s) if s.fragment_name.name == "friendFields"));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(f)
                if f.type_condition.as_ref().unwrap().name == "Admin"
                    && f.directives[0].name.name == "include"
        ));
        assert!(
            matches!(&selections[2], Selection::InlineFragment(f) if f.type_condition.is_none())
        );
    }

    #[test]
    fn it_rejects_empty_selection_sets() {
        let err = parse_err("query Q { }");
        assert_eq!(err.kind, ParserErrorKind::WrongTokenType);
    }

    #[test]
    fn it_rejects_server_definitions_in_client_mode() {
        let err = parse_err("type Query { hello: String }");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedIdentifier);
    }

    #[test]
    fn it_rejects_keyword_operation_names() {
        let err = parse_err("query fragment { id }");
        assert_eq!(err.kind, ParserErrorKind::IdentifierIsKeyword);
    }

    #[test]
    fn trailing_commas_are_permitted() {
        let definitions = parse("query Q($a: Int,) { user(id: 1,) { name, } }");
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn child_locations_nest_within_parents() {
        let definitions = parse("query Q {\n  user {\n    name\n  }\n}");
        let ClientDefinition::Operation(op) = &definitions[0] else {
            panic!("expected an operation");
        };
        let Selection::Field(user) = &op.selection_set[0] else {
            panic!("expected a field selection");
        };
        assert!(op.loc.start_token.location.line <= user.loc.start_token.location.line);
        assert!(user.loc.end_token.location.line <= op.loc.end_token.location.line);
    }
}
