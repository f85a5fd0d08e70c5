//! Productions shared between the server and client grammars: names, type
//! references, literals, directive applications and input value definitions.

use indexmap::IndexMap;

use crate::ast::{DirectiveApplication, InputValueDefinition, Literal, TypeRef};
use crate::lexer::TokenKind;
use crate::parser::{Parser, ParserError};

/// A string token immediately preceding a definition is its description.
pub(crate) fn description(p: &mut Parser<'_>) -> Option<String> {
    if p.peek_kind() == Some(TokenKind::String) {
        // Cannot fail: the peek above saw the token.
        Some(p.next().unwrap().lexeme)
    } else {
        None
    }
}

/// `TypeRef := NamedType | '[' TypeRef ']'`, each with an optional `!`
/// suffix flipping nullability to false.
pub(crate) fn type_ref(p: &mut Parser<'_>) -> Result<TypeRef, ParserError> {
    let start = p.mark();
    if p.eat(TokenKind::LeftBracket) {
        let inner = type_ref(p)?;
        p.consume(TokenKind::RightBracket)?;
        let nullable = !p.eat(TokenKind::Bang);
        Ok(TypeRef::List {
            loc: p.node_loc(start),
            inner: Box::new(inner),
            nullable,
        })
    } else {
        let name = p.name()?;
        let nullable = !p.eat(TokenKind::Bang);
        Ok(TypeRef::Named {
            loc: p.node_loc(start),
            name,
            nullable,
        })
    }
}

/// A literal value: number, string, boolean, null, enum value, list or
/// object. Enum values are bare identifiers other than `true`/`false`/`null`.
pub(crate) fn literal(p: &mut Parser<'_>) -> Result<Literal, ParserError> {
    match p.peek_kind() {
        Some(TokenKind::Number) => {
            let token = p.next()?;
            match token.lexeme.parse::<i64>() {
                Ok(value) => Ok(Literal::Int(value)),
                // Contains `.` or an exponent, or overflows i64.
                Err(_) => Ok(Literal::Float(token.lexeme.parse::<f64>().map_err(
                    |_| ParserError::wrong_type(&token, TokenKind::Number, p.source()),
                )?.into())),
            }
        }
        Some(TokenKind::String) => Ok(Literal::String(p.next()?.lexeme)),
        Some(TokenKind::Identifier) => {
            let token = p.next()?;
            match token.lexeme.as_str() {
                "true" => Ok(Literal::Boolean(true)),
                "false" => Ok(Literal::Boolean(false)),
                "null" => Ok(Literal::Null),
                _ => Ok(Literal::Enum(token.lexeme)),
            }
        }
        Some(TokenKind::Dollar) => {
            p.consume(TokenKind::Dollar)?;
            Ok(Literal::Variable(p.name()?.name))
        }
        Some(TokenKind::LeftBracket) => {
            p.consume(TokenKind::LeftBracket)?;
            let mut values = Vec::new();
            while p.peek_kind() != Some(TokenKind::RightBracket) {
                values.push(literal(p)?);
                p.eat_commas();
            }
            p.consume(TokenKind::RightBracket)?;
            Ok(Literal::List(values))
        }
        Some(TokenKind::LeftBrace) => {
            p.consume(TokenKind::LeftBrace)?;
            let mut entries = IndexMap::new();
            while p.peek_kind() != Some(TokenKind::RightBrace) {
                let key = p.consume(TokenKind::Identifier)?;
                p.consume(TokenKind::Colon)?;
                let value = literal(p)?;
                if entries.insert(key.lexeme.clone(), value).is_some() {
                    return Err(p.error_duplicate(&key, "object literal key"));
                }
                p.eat_commas();
            }
            p.consume(TokenKind::RightBrace)?;
            Ok(Literal::Object(entries))
        }
        _ => Err(p.error_expected("a literal value")),
    }
}

/// Zero or more `@name(args)` applications.
pub(crate) fn directives(p: &mut Parser<'_>) -> Result<Vec<DirectiveApplication>, ParserError> {
    let mut applications = Vec::new();
    while p.peek_kind() == Some(TokenKind::At) {
        applications.push(directive_application(p)?);
    }
    Ok(applications)
}

fn directive_application(p: &mut Parser<'_>) -> Result<DirectiveApplication, ParserError> {
    let start = p.mark();
    p.consume(TokenKind::At)?;
    let name = p.name()?;
    let arguments = if p.peek_kind() == Some(TokenKind::LeftParen) {
        literal_arguments(p)?
    } else {
        IndexMap::new()
    };
    Ok(DirectiveApplication {
        loc: p.node_loc(start),
        name,
        arguments,
    })
}

/// `'(' (name ':' Literal ','?)+ ')'`, the argument form of directive
/// applications and field selections. An empty list is a syntax error.
pub(crate) fn literal_arguments(
    p: &mut Parser<'_>,
) -> Result<IndexMap<String, Literal>, ParserError> {
    p.consume(TokenKind::LeftParen)?;
    let mut arguments = IndexMap::new();
    loop {
        let key = p.consume(TokenKind::Identifier)?;
        p.consume(TokenKind::Colon)?;
        let value = literal(p)?;
        if arguments.insert(key.lexeme.clone(), value).is_some() {
            return Err(p.error_duplicate(&key, "argument"));
        }
        p.eat_commas();
        if p.peek_kind() == Some(TokenKind::RightParen) {
            break;
        }
    }
    p.consume(TokenKind::RightParen)?;
    Ok(arguments)
}

/// `'(' (InputValueDefinition ','?)+ ')'`, the argument form of field and
/// directive definitions. An empty list is a syntax error.
pub(crate) fn input_value_definitions(
    p: &mut Parser<'_>,
) -> Result<IndexMap<String, InputValueDefinition>, ParserError> {
    p.consume(TokenKind::LeftParen)?;
    let mut definitions = IndexMap::new();
    loop {
        let definition = input_value_definition(p)?;
        let key_token = definition.name.loc.start_token.clone();
        if definitions
            .insert(definition.name.name.clone(), definition)
            .is_some()
        {
            return Err(p.error_duplicate(&key_token, "argument"));
        }
        p.eat_commas();
        if p.peek_kind() == Some(TokenKind::RightParen) {
            break;
        }
    }
    p.consume(TokenKind::RightParen)?;
    Ok(definitions)
}

/// `Description? Name ':' TypeRef ('=' Literal)?`
pub(crate) fn input_value_definition(
    p: &mut Parser<'_>,
) -> Result<InputValueDefinition, ParserError> {
    let start = p.mark();
    let description = description(p);
    let name = p.name()?;
    p.consume(TokenKind::Colon)?;
    let ty = type_ref(p)?;
    let default_value = if p.eat(TokenKind::Equal) {
        Some(literal(p)?)
    } else {
        None
    };
    Ok(InputValueDefinition {
        loc: p.node_loc(start),
        description,
        name,
        ty,
        default_value,
    })
}
