//! The `gql` command-line interface.
//!
//! Thin adapter over `gql-parser` and `gql-compiler`: it moves bytes
//! between stdin/files/HTTP and the core pipeline, formats errors to
//! stderr, and translates results into exit codes (0 success, 1 failure;
//! clap itself exits 2 on usage errors). No parsing or resolution logic
//! lives here.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gql_compiler::{
    diff_schemas, schema_from_json, schema_to_json_string, server_schema_from_introspection,
    Schema, INTROSPECTION_QUERY,
};
use gql_parser::ast::FileNodes;
use gql_parser::{parse_client, parse_server, tokenize, SourceFile};

#[derive(Parser)]
#[command(name = "gql", version, about = "GraphQL toolchain", propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Internal commands for debugging the pipeline stages.
    #[command(subcommand)]
    Internal(InternalCommand),
    /// Parse and resolve schema files, reporting the first error.
    Validate(ValidateArgs),
    /// Resolve schema files and emit the schema's JSON form.
    Generate(GenerateArgs),
}

#[derive(Subcommand)]
enum InternalCommand {
    /// Lexer stage.
    #[command(subcommand)]
    Lexer(LexerCommand),
    /// Parser stage.
    #[command(subcommand)]
    Parser(ParserCommand),
    /// Diff a local schema JSON against a live server's introspection.
    Diff(DiffArgs),
}

#[derive(Subcommand)]
enum LexerCommand {
    /// Read GraphQL source from stdin, write a JSON token array to stdout.
    Parse,
}

#[derive(Subcommand)]
enum ParserCommand {
    /// Read GraphQL source from stdin, write the AST as JSON to stdout.
    Parse {
        #[arg(long, value_enum)]
        mode: ParseMode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParseMode {
    Server,
    Client,
}

#[derive(Args)]
struct DiffArgs {
    /// Path to a schema JSON file, or `-` for stdin.
    #[arg(long = "path-to-schema")]
    path_to_schema: String,
    /// URL of the GraphQL API to introspect.
    #[arg(long = "url-to-api")]
    url_to_api: String,
}

#[derive(Args)]
struct ValidateArgs {
    /// Schema files, in extension-merge order.
    #[arg(long = "schema", required = true, num_args = 1..)]
    schema: Vec<PathBuf>,
    /// Operation files to check against the schema.
    #[arg(long = "operations", num_args = 1..)]
    operations: Vec<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    inputs: ValidateArgs,
    /// Output file for the schema JSON, or `-` for stdout.
    #[arg(long, default_value = "-")]
    out: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Internal(InternalCommand::Lexer(LexerCommand::Parse)) => lexer_parse(),
        Command::Internal(InternalCommand::Parser(ParserCommand::Parse { mode })) => {
            parser_parse(mode)
        }
        Command::Internal(InternalCommand::Diff(args)) => diff(args),
        Command::Validate(args) => {
            resolve_inputs(&args)?;
            info!("schema is valid");
            Ok(())
        }
        Command::Generate(args) => generate(args),
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading stdin")?;
    Ok(buffer)
}

/// `-` means stdin, anything else is a file path.
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        read_stdin()
    } else {
        fs::read_to_string(path).with_context(|| format!("reading \"{path}\""))
    }
}

fn lexer_parse() -> Result<()> {
    let source = SourceFile::new("<stdin>", read_stdin()?);
    let tokens = tokenize(&source)?;
    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}

fn parser_parse(mode: ParseMode) -> Result<()> {
    let source = SourceFile::new("<stdin>", read_stdin()?);
    let tokens = tokenize(&source)?;
    let json = match mode {
        ParseMode::Server => {
            let file = parse_server(&tokens, &source)?;
            serde_json::to_string_pretty(&file)?
        }
        ParseMode::Client => {
            let definitions = parse_client(&tokens, &source)?;
            serde_json::to_string_pretty(&definitions)?
        }
    };
    println!("{json}");
    Ok(())
}

fn diff(args: DiffArgs) -> Result<()> {
    let local = schema_from_json(&read_input(&args.path_to_schema)?)?;

    debug!(url = %args.url_to_api, "fetching introspection");
    let response = reqwest::blocking::Client::new()
        .post(&args.url_to_api)
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&serde_json::json!({ "query": INTROSPECTION_QUERY }))
        .send()
        .with_context(|| format!("requesting \"{}\"", args.url_to_api))?;
    if response.status() != reqwest::StatusCode::OK {
        bail!("expected 200 status code, received {}", response.status());
    }
    let body: serde_json::Value = response.json().context("reading introspection response")?;
    let remote = server_schema_from_introspection(&body)?;

    for difference in diff_schemas(&local.server, &remote) {
        println!("{difference}");
    }
    Ok(())
}

fn parse_file(path: &PathBuf) -> Result<FileNodes> {
    let source = SourceFile::new(path, fs::read_to_string(path).with_context(|| {
        format!("reading \"{}\"", path.display())
    })?);
    let tokens = tokenize(&source)?;
    Ok(parse_server(&tokens, &source)?)
}

fn resolve_inputs(args: &ValidateArgs) -> Result<Schema> {
    let mut builder = Schema::builder();
    for path in &args.schema {
        builder.add_file(parse_file(path)?);
    }
    for path in &args.operations {
        let source = SourceFile::new(path, fs::read_to_string(path).with_context(|| {
            format!("reading \"{}\"", path.display())
        })?);
        let tokens = tokenize(&source)?;
        builder.add_client_definitions(parse_client(&tokens, &source)?);
    }
    Ok(builder.build()?)
}

fn generate(args: GenerateArgs) -> Result<()> {
    let schema = resolve_inputs(&args.inputs)?;
    let json = schema_to_json_string(&schema)?;
    if args.out == "-" {
        println!("{json}");
    } else {
        fs::write(&args.out, json).with_context(|| format!("writing \"{}\"", args.out))?;
        info!(out = %args.out, "schema written");
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn diff_flags_match_the_documented_interface() {
        let cli = Cli::try_parse_from([
            "gql",
            "internal",
            "diff",
            "--path-to-schema",
            "-",
            "--url-to-api",
            "http://localhost:4000/graphql",
        ])
        .unwrap();
        let Command::Internal(InternalCommand::Diff(args)) = cli.command else {
            panic!("expected the diff subcommand");
        };
        assert_eq!(args.path_to_schema, "-");
        assert_eq!(args.url_to_api, "http://localhost:4000/graphql");
    }

    #[test]
    fn parser_mode_is_required() {
        assert!(Cli::try_parse_from(["gql", "internal", "parser", "parse"]).is_err());
        assert!(
            Cli::try_parse_from(["gql", "internal", "parser", "parse", "--mode", "server"])
                .is_ok()
        );
    }
}
