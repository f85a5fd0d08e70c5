//! Integration tests for the resolver and everything built on it.
//!
//! The other files in this directory are modules of this test binary.

mod diff;
mod introspection;
mod json;

use gql_compiler::schema::{Schema, SchemaError};
use gql_parser::ast::{ClientDefinition, FileNodes};
use gql_parser::{parse_client, parse_server, tokenize, SourceFile};

pub fn parse_server_file(name: &str, input: &str) -> FileNodes {
    let source = SourceFile::new(name, input);
    let tokens = tokenize(&source).unwrap();
    parse_server(&tokens, &source).unwrap()
}

pub fn parse_client_file(name: &str, input: &str) -> Vec<ClientDefinition> {
    let source = SourceFile::new(name, input);
    let tokens = tokenize(&source).unwrap();
    parse_client(&tokens, &source).unwrap()
}

pub fn resolve_schema(input: &str) -> Result<Schema, SchemaError> {
    resolve_files(&[input])
}

pub fn resolve_files(inputs: &[&str]) -> Result<Schema, SchemaError> {
    let mut builder = Schema::builder();
    for (index, input) in inputs.iter().enumerate() {
        builder.add_file(parse_server_file(&format!("schema-{index}.graphql"), input));
    }
    builder.build()
}

pub fn resolve_documents(server: &[&str], client: &[&str]) -> Result<Schema, SchemaError> {
    let mut builder = Schema::builder();
    for (index, input) in server.iter().enumerate() {
        builder.add_file(parse_server_file(&format!("schema-{index}.graphql"), input));
    }
    for (index, input) in client.iter().enumerate() {
        builder
            .add_client_definitions(parse_client_file(&format!("query-{index}.graphql"), input));
    }
    builder.build()
}
