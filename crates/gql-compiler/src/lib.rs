//! Back end of the GraphQL toolchain: schema resolution and everything
//! built on top of it.
//!
//! The [`schema`] module lowers file-level ASTs from `gql-parser` into one
//! semantically validated [`Schema`] with two-pass name resolution. The
//! [`diff`] module compares two resolved server schemas; [`json`] reads and
//! writes the schema's cached JSON form; [`introspection`] maps a live
//! server's introspection response into the same model.
//!
//! ## Example
//!
//! ```rust
//! use gql_compiler::Schema;
//! use gql_parser::{parse_server, tokenize, SourceFile};
//!
//! let source = SourceFile::new("schema.graphql", "type Query { hello: String }");
//! let tokens = tokenize(&source).unwrap();
//! let file = parse_server(&tokens, &source).unwrap();
//!
//! let mut builder = Schema::builder();
//! builder.add_file(file);
//! let schema = builder.build().unwrap();
//! assert_eq!(schema.server.query_type.as_deref(), Some("Query"));
//! ```

pub mod diff;
pub mod introspection;
pub mod json;
pub mod schema;

pub use diff::{diff_schemas, Change, Difference};
pub use introspection::{server_schema_from_introspection, INTROSPECTION_QUERY};
pub use json::{schema_from_json, schema_to_json, schema_to_json_string, JsonError};
pub use schema::{Schema, SchemaBuilder, SchemaError, SchemaErrorKind, ServerSchema};
