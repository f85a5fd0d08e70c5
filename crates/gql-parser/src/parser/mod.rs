//! Recursive-descent parsing of token streams into file-level ASTs.
//!
//! Two entry points share one grammar core: [`parse_server`] recognizes type
//! system documents and [`parse_client`] recognizes executable documents.
//! Both consume a token slice plus the source handle the tokens came from,
//! use a single token of lookahead, and stop at the first error.

mod client;
mod server;
mod shared;

use thiserror::Error;
use triomphe::Arc;

pub use client::parse_client;
pub use server::parse_server;

use crate::ast::{NameNode, NodeLocation};
use crate::lexer::{SourceFile, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorKind {
    UnexpectedEof,
    WrongTokenType,
    WrongLexeme,
    IdentifierIsKeyword,
    UnexpectedIdentifier,
    DuplicateDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParserError {
    pub kind: ParserErrorKind,
    /// The offending token; `None` only when the stream ended early.
    pub token: Option<Token>,
    pub source_file: Arc<SourceFile>,
    pub message: String,
}

impl ParserError {
    fn eof(last: Option<&Token>, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::UnexpectedEof,
            token: last.cloned(),
            source_file: Arc::clone(source),
            message: "unexpected end of file".to_string(),
        }
    }

    fn wrong_type(token: &Token, expected: TokenKind, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::WrongTokenType,
            message: format!(
                "expected {} token, got {} at {}",
                expected, token.kind, token.location
            ),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }

    fn wrong_lexeme(token: &Token, expected: &str, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::WrongLexeme,
            message: format!(
                "expected \"{}\", got \"{}\" at {}",
                expected, token.lexeme, token.location
            ),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }

    fn identifier_is_keyword(token: &Token, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::IdentifierIsKeyword,
            message: format!(
                "\"{}\" is a reserved keyword at {}",
                token.lexeme, token.location
            ),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }

    fn unexpected_identifier(token: &Token, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::UnexpectedIdentifier,
            message: format!(
                "unexpected identifier \"{}\" at {}",
                token.lexeme, token.location
            ),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }

    fn duplicate(token: &Token, what: &str, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::DuplicateDefinition,
            message: format!("duplicate {} \"{}\" at {}", what, token.lexeme, token.location),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }

    fn expected(token: &Token, expected: &str, source: &Arc<SourceFile>) -> Self {
        Self {
            kind: ParserErrorKind::WrongTokenType,
            message: format!(
                "expected {}, got {} at {}",
                expected, token.kind, token.location
            ),
            token: Some(token.clone()),
            source_file: Arc::clone(source),
        }
    }
}

/// Shared parser state: the token slice, a cursor, and the keyword set of
/// the active grammar mode.
pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    source: Arc<SourceFile>,
    keywords: &'static [&'static str],
    index: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        source: &Arc<SourceFile>,
        keywords: &'static [&'static str],
    ) -> Parser<'a> {
        Parser {
            tokens,
            source: Arc::clone(source),
            keywords,
            index: 0,
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    pub(crate) fn peek_lexeme(&self) -> Option<&str> {
        self.peek().map(|t| t.lexeme.as_str())
    }

    pub(crate) fn next(&mut self) -> Result<Token, ParserError> {
        let token = self
            .tokens
            .get(self.index)
            .ok_or_else(|| ParserError::eof(self.tokens.last(), &self.source))?;
        self.index += 1;
        Ok(token.clone())
    }

    pub(crate) fn consume(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let token = self.next()?;
        if token.kind != expected {
            return Err(ParserError::wrong_type(&token, expected, &self.source));
        }
        Ok(token)
    }

    pub(crate) fn consume_lexeme(&mut self, expected: &str) -> Result<Token, ParserError> {
        let token = self.consume(TokenKind::Identifier)?;
        if token.lexeme != expected {
            return Err(ParserError::wrong_lexeme(&token, expected, &self.source));
        }
        Ok(token)
    }

    /// Consume the next token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Commas are lexed but insignificant between list elements.
    pub(crate) fn eat_commas(&mut self) {
        while self.eat(TokenKind::Comma) {}
    }

    pub(crate) fn is_keyword(&self, lexeme: &str) -> bool {
        self.keywords.contains(&lexeme)
    }

    /// Consume an identifier that is not a keyword of the active mode.
    pub(crate) fn name(&mut self) -> Result<NameNode, ParserError> {
        let token = self.consume(TokenKind::Identifier)?;
        if self.is_keyword(&token.lexeme) {
            return Err(ParserError::identifier_is_keyword(&token, &self.source));
        }
        let name = token.lexeme.clone();
        Ok(NameNode {
            loc: NodeLocation::span(token.clone(), token, Arc::clone(&self.source)),
            name,
        })
    }

    pub(crate) fn mark(&self) -> usize {
        self.index
    }

    /// A node location spanning from the token at `start` to the last
    /// consumed token. Callers consume at least one token per production.
    pub(crate) fn node_loc(&self, start: usize) -> NodeLocation {
        NodeLocation::span(
            self.tokens[start].clone(),
            self.tokens[self.index - 1].clone(),
            Arc::clone(&self.source),
        )
    }

    pub(crate) fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    pub(crate) fn error_eof(&self) -> ParserError {
        ParserError::eof(self.tokens.last(), &self.source)
    }

    pub(crate) fn error_expected(&self, expected: &str) -> ParserError {
        let anchor = self
            .peek()
            .or_else(|| self.index.checked_sub(1).and_then(|i| self.tokens.get(i)));
        match anchor {
            Some(token) => ParserError::expected(token, expected, &self.source),
            None => self.error_eof(),
        }
    }

    pub(crate) fn error_unexpected_identifier(&self, token: &Token) -> ParserError {
        ParserError::unexpected_identifier(token, &self.source)
    }

    pub(crate) fn error_duplicate(&self, token: &Token, what: &str) -> ParserError {
        ParserError::duplicate(token, what, &self.source)
    }
}
