//! Network collaborators: query execution, entity storage, citation lookup.
//!
//! The pipeline core only ever talks to the three traits defined here; the
//! concrete clients ([`SparqlClient`], [`WikibaseClient`], [`CrossrefClient`])
//! are wired in at the top level. Tests substitute call-capturing doubles.

mod citation;
mod sparql;
mod wikibase;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ClientResult;
use crate::models::{Citation, Claim};

pub use citation::CrossrefClient;
pub use sparql::SparqlClient;
pub use wikibase::WikibaseClient;

/// One result row of a SPARQL select: variable name to plain value.
pub type ResultRow = BTreeMap<String, String>;

/// Which graph a query goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The target graph (the portal this system writes into).
    Portal,
    /// The read-only reference graph (Wikidata).
    Reference,
}

/// Executes a structured query against a graph endpoint.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a select query; an empty vector means "no match".
    async fn select(&self, endpoint: Endpoint, query: &str) -> ClientResult<Vec<ResultRow>>;
}

/// Persists new entities (and wiki pages) on the portal.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Create one entity and return its new stable identifier.
    ///
    /// Claims are taken as given; filtering of empty values and timestamp
    /// normalisation happen in the entity writer before this is called.
    async fn create_entity(
        &self,
        label: &str,
        description: &str,
        locale: &str,
        claims: &[Claim],
    ) -> ClientResult<String>;

    /// Append rendered wikitext to the portal page with the given title.
    async fn append_page(&self, title: &str, wikitext: &str) -> ClientResult<()>;
}

/// Resolves an external identifier to structured bibliographic data.
#[async_trait::async_trait]
pub trait CitationLookup: Send + Sync {
    /// Look up a DOI; `Ok(None)` means the registry has no data for it.
    async fn by_doi(&self, doi: &str) -> ClientResult<Option<Citation>>;
}

/// The three collaborators bundled for the pipeline.
#[derive(Clone)]
pub struct Services {
    /// SPARQL query execution against both graphs.
    pub queries: Arc<dyn QueryExecutor>,
    /// Entity creation on the portal.
    pub store: Arc<dyn EntityStore>,
    /// DOI resolution.
    pub citations: Arc<dyn CitationLookup>,
}

impl Services {
    /// Bundle the given collaborators.
    #[must_use]
    pub fn new(
        queries: Arc<dyn QueryExecutor>,
        store: Arc<dyn EntityStore>,
        citations: Arc<dyn CitationLookup>,
    ) -> Self {
        Self { queries, store, citations }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
