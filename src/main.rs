//! GraphQL Demos - users, posts and comments
//!
//! Serves one of two demo schemas over HTTP, prints its SDL, or runs a
//! single document from the command line.
//!
//! Features:
//! - `basics`: mock dataset, case-insensitive search, validated creates
//! - `nexus`: integer ids, input objects, updates and restricted deletes
//! - Postgres backing for `nexus` with the `postgres` feature

use std::io::Read;

use clap::Parser;
use graphql_demos::config::{AppConfig, Cli, Command};
use graphql_demos::{schemas, server, App, SchemaVariant, APP_VERSION};
use weave_core::Request;

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_cli(&cli)?;

    match cli.command() {
        Command::Serve => {
            tracing::info!("GraphQL demos v{} ({} schema)", APP_VERSION, config.variant);
            let app = App::open(&config).await?;
            server::serve(&config, app).await?;
        }
        Command::Schema => {
            let schema = schemas::build(config.variant)?;
            print!("{}", schema.sdl());
        }
        Command::Exec {
            query,
            variables,
            operation_name,
        } => {
            let request = build_request(&query, variables.as_deref(), operation_name)?;
            let response = exec(config.variant, !cli.no_seed, &request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Read the document (`-` for stdin) and attach variables.
fn build_request(
    source: &str,
    variables: Option<&str>,
    operation_name: Option<String>,
) -> anyhow::Result<Request> {
    let document = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| anyhow::anyhow!("failed to read {source}: {e}"))?
    };

    let mut request = Request::new(document);
    if let Some(raw) = variables {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("--variables is not valid JSON: {e}"))?;
        anyhow::ensure!(value.is_object(), "--variables must be a JSON object");
        request = request.with_variables(value);
    }
    if let Some(name) = operation_name {
        request = request.with_operation_name(name);
    }
    Ok(request)
}

/// Run one request against a fresh in-memory store.
async fn exec(
    variant: SchemaVariant,
    seed: bool,
    request: &Request,
) -> anyhow::Result<weave_core::Response> {
    let app = App::in_memory(variant, seed).await?;
    Ok(app.run(request).await)
}
