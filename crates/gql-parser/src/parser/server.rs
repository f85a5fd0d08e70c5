//! The server-mode grammar: type system definitions and extensions.

use indexmap::IndexMap;
use triomphe::Arc;

use crate::ast::{
    Definition, DirectiveLocation, EnumTypeDefinition, EnumValueDefinition, Extension,
    FieldDefinition, FileNodes, InputTypeDefinition, InterfaceTypeDefinition, NameNode,
    ObjectTypeDefinition, ScalarTypeDefinition, SchemaDefinition, DirectiveDefinition,
    UnionTypeDefinition,
};
use crate::lexer::{SourceFile, Token, TokenKind};
use crate::parser::{shared, Parser, ParserError};

const KEYWORDS: &[&str] = &[
    "type",
    "input",
    "interface",
    "union",
    "enum",
    "scalar",
    "directive",
    "schema",
    "extend",
    "implements",
    "repeatable",
    "on",
    "true",
    "false",
    "null",
];

/// Parse a type system document into its definitions and extensions.
pub fn parse_server(
    tokens: &[Token],
    source: &Arc<SourceFile>,
) -> Result<FileNodes, ParserError> {
    let mut p = Parser::new(tokens, source, KEYWORDS);
    let mut definitions = Vec::new();
    let mut extensions = Vec::new();
    let mut schema_seen = false;

    while !p.at_end() {
        let start = p.mark();
        let description = shared::description(&mut p);
        let keyword = p.consume(TokenKind::Identifier)?;
        match keyword.lexeme.as_str() {
            "type" => definitions.push(Definition::ObjectType(object_type(
                &mut p,
                description,
                start,
            )?)),
            "interface" => definitions.push(Definition::InterfaceType(interface_type(
                &mut p,
                description,
                start,
            )?)),
            "input" => definitions.push(Definition::InputType(input_type(
                &mut p,
                description,
                start,
            )?)),
            "union" => definitions.push(Definition::UnionType(union_type(
                &mut p,
                description,
                start,
            )?)),
            "enum" => definitions.push(Definition::EnumType(enum_type(
                &mut p,
                description,
                start,
            )?)),
            "scalar" => definitions.push(Definition::ScalarType(scalar_type(
                &mut p,
                description,
                start,
            )?)),
            "directive" => definitions.push(Definition::DirectiveDefinition(
                directive_definition(&mut p, description, start)?,
            )),
            "schema" => {
                if schema_seen {
                    return Err(p.error_duplicate(&keyword, "definition"));
                }
                schema_seen = true;
                definitions.push(Definition::SchemaDefinition(schema_definition(
                    &mut p,
                    description,
                    start,
                )?));
            }
            "extend" => extensions.push(extension(&mut p, start)?),
            _ => return Err(p.error_unexpected_identifier(&keyword)),
        }
    }

    Ok(FileNodes {
        source: Arc::clone(source),
        definitions,
        extensions,
    })
}

fn object_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<ObjectTypeDefinition, ParserError> {
    let name = p.name()?;
    let implements = implements_interfaces(p)?;
    let directives = shared::directives(p)?;
    let fields = fields_block(p)?;
    Ok(ObjectTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        implements,
        directives,
        fields,
    })
}

fn interface_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<InterfaceTypeDefinition, ParserError> {
    let name = p.name()?;
    let directives = shared::directives(p)?;
    let fields = fields_block(p)?;
    Ok(InterfaceTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        directives,
        fields,
    })
}

fn input_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<InputTypeDefinition, ParserError> {
    let name = p.name()?;
    let directives = shared::directives(p)?;
    p.consume(TokenKind::LeftBrace)?;
    let mut fields = IndexMap::new();
    while p.peek_kind() != Some(TokenKind::RightBrace) {
        let field = shared::input_value_definition(p)?;
        let key_token = field.name.loc.start_token.clone();
        if fields.insert(field.name.name.clone(), field).is_some() {
            return Err(p.error_duplicate(&key_token, "input field"));
        }
        p.eat_commas();
    }
    p.consume(TokenKind::RightBrace)?;
    Ok(InputTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        directives,
        fields,
    })
}

fn union_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<UnionTypeDefinition, ParserError> {
    let name = p.name()?;
    let directives = shared::directives(p)?;
    p.consume(TokenKind::Equal)?;
    let mut members = Vec::new();
    p.eat(TokenKind::VSlash);
    members.push(p.name()?);
    while p.eat(TokenKind::VSlash) {
        members.push(p.name()?);
    }
    Ok(UnionTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        directives,
        members,
    })
}

fn enum_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<EnumTypeDefinition, ParserError> {
    let name = p.name()?;
    let directives = shared::directives(p)?;
    p.consume(TokenKind::LeftBrace)?;
    let mut values: Vec<EnumValueDefinition> = Vec::new();
    while p.peek_kind() != Some(TokenKind::RightBrace) {
        let value_start = p.mark();
        let value_name = p.name()?;
        let value_directives = shared::directives(p)?;
        if values.iter().any(|v| v.name.name == value_name.name) {
            return Err(p.error_duplicate(&value_name.loc.start_token, "enum value"));
        }
        values.push(EnumValueDefinition {
            loc: p.node_loc(value_start),
            name: value_name,
            directives: value_directives,
        });
        p.eat_commas();
    }
    p.consume(TokenKind::RightBrace)?;
    Ok(EnumTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        directives,
        values,
    })
}

fn scalar_type(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<ScalarTypeDefinition, ParserError> {
    let name = p.name()?;
    let directives = shared::directives(p)?;
    Ok(ScalarTypeDefinition {
        loc: p.node_loc(start),
        description,
        name,
        directives,
    })
}

/// `directive '@' Name ArgumentsDefinition? 'repeatable'? 'on' Locations`
fn directive_definition(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<DirectiveDefinition, ParserError> {
    p.consume(TokenKind::At)?;
    let name = p.name()?;
    let arguments = if p.peek_kind() == Some(TokenKind::LeftParen) {
        shared::input_value_definitions(p)?
    } else {
        IndexMap::new()
    };
    let repeatable = if p.peek_lexeme() == Some("repeatable") {
        p.next()?;
        true
    } else {
        false
    };
    p.consume_lexeme("on")?;
    let mut locations = Vec::new();
    p.eat(TokenKind::VSlash);
    locations.push(directive_location(p)?);
    while p.eat(TokenKind::VSlash) {
        locations.push(directive_location(p)?);
    }
    Ok(DirectiveDefinition {
        loc: p.node_loc(start),
        description,
        name,
        arguments,
        repeatable,
        locations,
    })
}

fn directive_location(p: &mut Parser<'_>) -> Result<DirectiveLocation, ParserError> {
    let token = p.consume(TokenKind::Identifier)?;
    DirectiveLocation::from_name(&token.lexeme)
        .ok_or_else(|| p.error_unexpected_identifier(&token))
}

/// `schema '{' (query|mutation|subscription ':' Name ','?)* '}'`
fn schema_definition(
    p: &mut Parser<'_>,
    description: Option<String>,
    start: usize,
) -> Result<SchemaDefinition, ParserError> {
    p.consume(TokenKind::LeftBrace)?;
    let mut query = None;
    let mut mutation = None;
    let mut subscription = None;
    while p.peek_kind() != Some(TokenKind::RightBrace) {
        let key = p.consume(TokenKind::Identifier)?;
        p.consume(TokenKind::Colon)?;
        let value = p.name()?;
        let slot = match key.lexeme.as_str() {
            "query" => &mut query,
            "mutation" => &mut mutation,
            "subscription" => &mut subscription,
            _ => return Err(p.error_unexpected_identifier(&key)),
        };
        if slot.is_some() {
            return Err(p.error_duplicate(&key, "root operation type"));
        }
        *slot = Some(value);
        p.eat_commas();
    }
    p.consume(TokenKind::RightBrace)?;
    Ok(SchemaDefinition {
        loc: p.node_loc(start),
        description,
        query,
        mutation,
        subscription,
    })
}

/// `extend <kind> <name> ...`: same body as the definition, but at least one
/// contributed element is required.
fn extension(p: &mut Parser<'_>, start: usize) -> Result<Extension, ParserError> {
    let kind = p.consume(TokenKind::Identifier)?;
    let extension = match kind.lexeme.as_str() {
        "type" => Extension::ObjectType(object_type(p, None, start)?),
        "interface" => Extension::InterfaceType(interface_type(p, None, start)?),
        "input" => Extension::InputType(input_type(p, None, start)?),
        "union" => Extension::UnionType(union_type(p, None, start)?),
        "enum" => Extension::EnumType(enum_type(p, None, start)?),
        "scalar" => Extension::ScalarType(scalar_type(p, None, start)?),
        _ => return Err(p.error_unexpected_identifier(&kind)),
    };
    let contributes = match &extension {
        Extension::ObjectType(def) => {
            !def.fields.is_empty() || !def.implements.is_empty() || !def.directives.is_empty()
        }
        Extension::InterfaceType(def) => !def.fields.is_empty() || !def.directives.is_empty(),
        Extension::InputType(def) => !def.fields.is_empty() || !def.directives.is_empty(),
        // The grammar already requires at least one union member.
        Extension::UnionType(_) => true,
        Extension::EnumType(def) => !def.values.is_empty() || !def.directives.is_empty(),
        Extension::ScalarType(def) => !def.directives.is_empty(),
    };
    if !contributes {
        return Err(p.error_expected("at least one element in the extension body"));
    }
    Ok(extension)
}

fn implements_interfaces(p: &mut Parser<'_>) -> Result<Vec<NameNode>, ParserError> {
    let mut implements = Vec::new();
    if p.peek_lexeme() == Some("implements") {
        p.next()?;
        p.eat(TokenKind::Amp);
        implements.push(p.name()?);
        while p.eat(TokenKind::Amp) {
            implements.push(p.name()?);
        }
    }
    Ok(implements)
}

/// `'{' FieldDefinition* '}'` where each field is
/// `Description? Name Arguments? ':' TypeRef Directives?`.
fn fields_block(p: &mut Parser<'_>) -> Result<IndexMap<String, FieldDefinition>, ParserError> {
    p.consume(TokenKind::LeftBrace)?;
    let mut fields = IndexMap::new();
    while p.peek_kind() != Some(TokenKind::RightBrace) {
        let field = field_definition(p)?;
        let key_token = field.name.loc.start_token.clone();
        if fields.insert(field.name.name.clone(), field).is_some() {
            return Err(p.error_duplicate(&key_token, "field"));
        }
        p.eat_commas();
    }
    p.consume(TokenKind::RightBrace)?;
    Ok(fields)
}

fn field_definition(p: &mut Parser<'_>) -> Result<FieldDefinition, ParserError> {
    let start = p.mark();
    let description = shared::description(p);
    let name = p.name()?;
    let arguments = if p.peek_kind() == Some(TokenKind::LeftParen) {
        shared::input_value_definitions(p)?
    } else {
        IndexMap::new()
    };
    p.consume(TokenKind::Colon)?;
    let ty = shared::type_ref(p)?;
    let directives = shared::directives(p)?;
    Ok(FieldDefinition {
        loc: p.node_loc(start),
        description,
        name,
        ty,
        arguments,
        directives,
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::TypeRef;
    use crate::lexer::{tokenize, SourceFile};
    use crate::parser::ParserErrorKind;

    fn parse(input: &str) -> FileNodes {
        let source = SourceFile::new("schema.graphql", input);
        let tokens = tokenize(&source).unwrap();
        parse_server(&tokens, &source).unwrap()
    }

    fn parse_err(input: &str) -> ParserError {
        let source = SourceFile::new("schema.graphql", input);
        let tokens = tokenize(&source).unwrap();
        parse_server(&tokens, &source).unwrap_err()
    }

    #[test]
    fn it_parses_a_minimal_object_type() {
        let file = parse("type Query { hello: String }");
        assert_eq!(file.definitions.len(), 1);
        let Definition::ObjectType(def) = &file.definitions[0] else {
            panic!("expected an object type");
        };
        assert_eq!(def.name.name, "Query");
        let field = &def.fields["hello"];
        let TypeRef::Named { name, nullable, .. } = &field.ty else {
            panic!("expected a named type");
        };
        assert_eq!(name.name, "String");
        assert!(*nullable);
    }

    #[test]
    fn it_parses_non_null_list_types() {
        let file = parse("type Q { xs: [Int!]! }");
        let Definition::ObjectType(def) = &file.definitions[0] else {
            panic!("expected an object type");
        };
        let TypeRef::List {
            inner, nullable, ..
        } = &def.fields["xs"].ty
        else {
            panic!("expected a list type");
        };
        assert!(!*nullable);
        let TypeRef::Named { name, nullable, .. } = inner.as_ref() else {
            panic!("expected a named element type");
        };
        assert_eq!(name.name, "Int");
        assert!(!*nullable);
    }

    #[test]
    fn it_parses_field_arguments_and_defaults() {
        let file = parse(r#"type Q { greet(name: String = "world", loud: Boolean): String }"#);
        let Definition::ObjectType(def) = &file.definitions[0] else {
            panic!("expected an object type");
        };
        let field = &def.fields["greet"];
        assert_eq!(field.arguments.len(), 2);
        assert_eq!(
            field.arguments["name"].default_value,
            Some(crate::ast::Literal::String("world".to_string()))
        );
        assert_eq!(field.arguments["loud"].default_value, None);
    }

    #[test]
    fn it_rejects_empty_argument_lists() {
        let err = parse_err("type Q { x(): Int }");
        assert_eq!(err.kind, ParserErrorKind::WrongTokenType);
    }

    #[test]
    fn it_parses_interfaces_and_implements() {
        let file = parse(
            "interface Named { name: String }\n\
             type Dog implements Named & Pet { name: String }",
        );
        let Definition::ObjectType(def) = &file.definitions[1] else {
            panic!("expected an object type");
        };
        let implements: Vec<&str> = def.implements.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(implements, vec!["Named", "Pet"]);
    }

    #[test]
    fn it_parses_unions_enums_and_scalars() {
        let file = parse(
            "union SearchResult = Photo | Person\n\
             enum Color { RED GREEN BLUE }\n\
             scalar URL @specifiedBy(url: \"https://tools.ietf.org/html/rfc3986\")",
        );
        let Definition::UnionType(union) = &file.definitions[0] else {
            panic!("expected a union");
        };
        let members: Vec<&str> = union.members.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(members, vec!["Photo", "Person"]);

        let Definition::EnumType(color) = &file.definitions[1] else {
            panic!("expected an enum");
        };
        assert_eq!(color.values.len(), 3);

        let Definition::ScalarType(url) = &file.definitions[2] else {
            panic!("expected a scalar");
        };
        assert_eq!(url.directives[0].name.name, "specifiedBy");
    }

    #[test]
    fn it_parses_directive_definitions() {
        let file =
            parse("directive @delegate(to: String!) repeatable on FIELD_DEFINITION | OBJECT");
        let Definition::DirectiveDefinition(def) = &file.definitions[0] else {
            panic!("expected a directive definition");
        };
        assert_eq!(def.name.name, "delegate");
        assert!(def.repeatable);
        assert_eq!(
            def.locations,
            vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::Object
            ]
        );
    }

    #[test]
    fn it_parses_schema_definitions() {
        let file = parse("schema { query: RootQuery, mutation: RootMutation }");
        let Definition::SchemaDefinition(def) = &file.definitions[0] else {
            panic!("expected a schema definition");
        };
        assert_eq!(def.query.as_ref().unwrap().name, "RootQuery");
        assert_eq!(def.mutation.as_ref().unwrap().name, "RootMutation");
        assert_eq!(def.subscription, None);
    }

    #[test]
    fn it_rejects_duplicate_schema_definitions() {
        let err = parse_err("schema { query: Q } schema { query: Q }");
        assert_eq!(err.kind, ParserErrorKind::DuplicateDefinition);
    }

    #[test]
    fn it_parses_extensions_separately() {
        let file = parse("type Q { a: Int } extend type Q { b: String }");
        assert_eq!(file.definitions.len(), 1);
        assert_eq!(file.extensions.len(), 1);
        let Extension::ObjectType(ext) = &file.extensions[0] else {
            panic!("expected an object extension");
        };
        assert!(ext.fields.contains_key("b"));
    }

    #[test]
    fn it_rejects_empty_extensions() {
        let err = parse_err("type Q { a: Int } extend type Q { }");
        assert_eq!(err.kind, ParserErrorKind::WrongTokenType);
    }

    #[test]
    fn it_rejects_keyword_names() {
        let err = parse_err("type extend { a: Int }");
        assert_eq!(err.kind, ParserErrorKind::IdentifierIsKeyword);
    }

    #[test]
    fn it_rejects_duplicate_fields_within_a_definition() {
        let err = parse_err("type Q { a: Int a: String }");
        assert_eq!(err.kind, ParserErrorKind::DuplicateDefinition);
    }

    #[test]
    fn it_attaches_descriptions() {
        let file = parse(r#""The root type" type Query { "A greeting" hello: String }"#);
        let Definition::ObjectType(def) = &file.definitions[0] else {
            panic!("expected an object type");
        };
        assert_eq!(def.description.as_deref(), Some("The root type"));
        assert_eq!(def.fields["hello"].description.as_deref(), Some("A greeting"));
    }

    #[test]
    fn it_reports_eof_on_truncated_input() {
        let err = parse_err("type Q {");
        assert_eq!(err.kind, ParserErrorKind::UnexpectedEof);
    }

    #[test]
    fn node_locations_span_whole_definitions() {
        let file = parse("type Query {\n  hello: String\n}");
        let Definition::ObjectType(def) = &file.definitions[0] else {
            panic!("expected an object type");
        };
        assert_eq!(def.loc.start_token.lexeme, "type");
        assert_eq!(def.loc.end_token.lexeme, "}");
        let field = &def.fields["hello"];
        assert!(field.loc.start_token.location.line >= def.loc.start_token.location.line);
        assert!(field.loc.end_token.location.line <= def.loc.end_token.location.line);
    }
}
