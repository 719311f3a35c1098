//! Workflow knowledge-graph publisher
//!
//! Turns a flat set of semantically-tagged answers describing a scientific
//! workflow (research objective, publication, mathematical model, methods,
//! software, data sets, disciplines) into a consistent set of linked entities
//! on a Wikibase portal, reusing entities that already exist on the portal or
//! on Wikidata.
//!
//! # Pipeline
//!
//! - **decompose**: parse composite answer strings into typed records
//! - **resolve**: decide whether each entity exists (portal, Wikidata, nowhere)
//! - **builder**: resolve/create all entities in dependency order
//! - **writer**: persist new entities, one write per entity, never retried
//! - **assembler**: pre-flight duplicate check, then drive everything and
//!   create the workflow root entity
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use workflow_kg_publisher::client::{CrossrefClient, Services, SparqlClient, WikibaseClient};
//! use workflow_kg_publisher::render::PlainRenderer;
//! use workflow_kg_publisher::{Config, WorkflowAssembler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let services = Services::new(
//!         Arc::new(SparqlClient::new(&config)?),
//!         Arc::new(WikibaseClient::new(&config)?),
//!         Arc::new(CrossrefClient::new(&config)?),
//!     );
//!     let assembler = WorkflowAssembler::new(services, &config);
//!
//!     let answers = serde_json::from_str(r#"{}"#)?;
//!     let outcome = assembler.run(answers, &PlainRenderer).await;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod builder;
pub mod client;
pub mod config;
pub mod decompose;
pub mod error;
pub mod models;
pub mod queries;
pub mod render;
pub mod resolve;
pub mod search;
pub mod writer;

pub use assembler::{RunOutcome, WorkflowAssembler};
pub use builder::{WorkflowBuilder, WorkflowContext};
pub use config::Config;
pub use error::{Category, ClientError, ExportError};
pub use resolve::Resolver;
pub use search::{WorkflowHit, WorkflowSearch};
pub use writer::EntityWriter;
