use std::{path::PathBuf, sync::Arc};

use atlas_validate::{
    compiler::{self, CompiledUnit},
    config::ValidateConfig,
    dispatch::RouteTable,
    middleware::Interceptor,
    observability::init_tracing,
    schema::load_schema_files,
    validation::HookRegistry,
};
use axum::{body::Body, extract::Request};
use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about = "Compile schema validation rules and check requests against them", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Additional schema-tree JSON files (appended to the configured ones)
    #[arg(short, long = "schema", global = true)]
    schemas: Vec<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compile the schema and print object descriptors, bindings and routes as JSON
    Compile {
        /// Write the manifest to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the interceptor against a synthetic request
    Check {
        /// HTTP method of the request
        #[arg(short, long)]
        method: String,
        /// Request path
        #[arg(short, long)]
        path: String,
        /// File holding the request body (empty body if omitted)
        #[arg(short, long)]
        body: Option<PathBuf>,
    },
    /// Print the ordered route table
    Routes,
}

#[derive(Serialize)]
struct Manifest<'a> {
    units: &'a [CompiledUnit],
    routes: &'a [atlas_validate::dispatch::RouteEntry],
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let config = load_config(args.config.as_deref());
    if let Err(e) = init_tracing(&config.observability) {
        eprintln!("{e}");
    }

    let mut files = config.schema.files.clone();
    files.extend(args.schemas);
    if files.is_empty() {
        eprintln!("No schema files given; set [schema] files in the config or pass --schema");
        std::process::exit(2);
    }

    let tree = load_schema_files(&files).unwrap_or_else(|e| fail(e));
    let units = compiler::compile(&tree).unwrap_or_else(|e| fail(e));
    let table = RouteTable::build(&units, &HookRegistry::new()).unwrap_or_else(|e| fail(e));

    match args.command {
        Command::Compile { output } => {
            let manifest = Manifest {
                units: &units,
                routes: table.entries(),
            };
            let json = serde_json::to_string_pretty(&manifest).unwrap_or_else(|e| fail(e));
            match output {
                Some(path) => {
                    std::fs::write(&path, json).unwrap_or_else(|e| fail(e));
                    eprintln!("Wrote manifest to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Routes => {
            for entry in table.entries() {
                println!(
                    "{:<7} {:<40} {} allow_unknown_fields={}",
                    entry.method().as_str(),
                    entry.pattern().as_str(),
                    entry.pattern_id(),
                    entry.allow_unknown_fields()
                );
            }
        }
        Command::Check { method, path, body } => {
            let body = match body {
                Some(file) => std::fs::read(&file).unwrap_or_else(|e| fail(e)),
                None => Vec::new(),
            };
            let mut req = Request::builder()
                .method(method.to_ascii_uppercase().as_str())
                .uri(path.as_str())
                .body(Body::from(body))
                .unwrap_or_else(|e| fail(e));

            let interceptor = Interceptor::new(Arc::new(table))
                .with_max_body_bytes(config.interceptor.max_body_bytes);
            let matched = interceptor
                .table()
                .find(req.method(), req.uri().path())
                .map(|m| m.entry().pattern_id().to_string());
            let md = interceptor.annotate(&mut req).await;

            match (matched, md.validation_error()) {
                (None, _) => println!("no route matches {} {}", req.method(), path),
                (Some(id), None) => println!("{id}: ok"),
                (Some(id), Some(message)) => {
                    println!("{id}: {message}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn load_config(path: Option<&str>) -> ValidateConfig {
    match path {
        Some(path) => ValidateConfig::from_file(path).unwrap_or_else(|e| fail(e)),
        None => ValidateConfig::default(),
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}
