//! Front end of the GraphQL toolchain: lexing and file-level parsing.
//!
//! The pipeline is strictly pull-based and stateless across invocations:
//! a [`SourceFile`] buffer is lexed into [`Token`]s, and the token stream is
//! parsed into one of two file-level ASTs: [`ast::FileNodes`] for type
//! system documents (server mode) or [`ast::ClientDefinition`]s for
//! executable documents (client mode). Schema resolution lives in the
//! `gql-compiler` crate.
//!
//! ## Example
//!
//! ```rust
//! use gql_parser::{parse_server, tokenize, SourceFile};
//!
//! let source = SourceFile::new("schema.graphql", "type Query { hello: String }");
//! let tokens = tokenize(&source).unwrap();
//! let file = parse_server(&tokens, &source).unwrap();
//! assert_eq!(file.definitions.len(), 1);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use lexer::{
    tokenize, ChannelAccumulator, Lexer, LexerError, LexerErrorKind, Location, SourceFile, Token,
    TokenKind, TokenSink, VecAccumulator,
};
pub use parser::{parse_client, parse_server, ParserError, ParserErrorKind};
