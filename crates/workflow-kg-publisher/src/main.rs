//! Workflow publisher - CLI entry point
//!
//! Reads a flat answer mapping (JSON) and either documents a workflow on the
//! portal or searches the portal for existing workflows.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use workflow_kg_publisher::client::{CrossrefClient, Services, SparqlClient, WikibaseClient};
use workflow_kg_publisher::models::{AnswerMap, OperationMode};
use workflow_kg_publisher::render::PlainRenderer;
use workflow_kg_publisher::{Config, WorkflowAssembler, WorkflowSearch, decompose};

#[derive(Parser, Debug)]
#[command(name = "workflow-kg-publisher")]
#[command(about = "Publish documented research workflows into a Wikibase knowledge graph")]
#[command(version)]
struct Cli {
    /// Path to the answer mapping (JSON object, answer-key to value)
    #[arg(long)]
    answers: std::path::PathBuf,

    /// MediaWiki action API of the portal
    #[arg(long, env = "WKG_PORTAL_API")]
    portal_api: Option<String>,

    /// SPARQL endpoint of the portal
    #[arg(long, env = "WKG_PORTAL_SPARQL")]
    portal_sparql: Option<String>,

    /// Bot account for entity writes
    #[arg(long, env = "WKG_BOT_USER")]
    bot_user: Option<String>,

    /// Bot password for entity writes
    #[arg(long, env = "WKG_BOT_PASSWORD", hide_env_values = true)]
    bot_password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting workflow publisher");

    let mut config = Config::new(cli.bot_user, cli.bot_password);
    if let Some(api) = cli.portal_api {
        config.portal_api_url = api;
    }
    if let Some(sparql) = cli.portal_sparql {
        config.portal_sparql_url = sparql;
    }

    let answers: AnswerMap = serde_json::from_slice(&std::fs::read(&cli.answers)?)?;
    let answers = answers.normalized();

    let sparql = Arc::new(SparqlClient::new(&config)?);
    let services = Services::new(
        sparql.clone(),
        Arc::new(WikibaseClient::new(&config)?),
        Arc::new(CrossrefClient::new(&config)?),
    );

    let mode = match decompose::operation_mode(&answers) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}", e.to_user_message());
            std::process::exit(1);
        }
    };

    match mode {
        OperationMode::Document => {
            let assembler = WorkflowAssembler::new(services, &config);
            match assembler.run(answers, &PlainRenderer).await {
                Ok(outcome) => {
                    if let Some(id) = &outcome.workflow_id {
                        println!("workflow published as {id}");
                    }
                    println!("{}", outcome.document);
                }
                Err(e) => {
                    tracing::error!(error = %e, "run failed");
                    eprintln!("{}", e.to_user_message());
                    std::process::exit(1);
                }
            }
        }
        OperationMode::Search => {
            let filters = decompose::search_filters(&answers);
            match WorkflowSearch::new(sparql).run(&filters).await {
                Ok(hits) => {
                    println!("{} workflow(s) found", hits.len());
                    for hit in hits {
                        println!("{}\t{}", hit.id, hit.label);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "search failed");
                    eprintln!("{}", e.to_user_message());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
