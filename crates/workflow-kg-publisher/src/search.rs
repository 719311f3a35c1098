//! Workflow search.
//!
//! The second operation mode: instead of documenting a new workflow, filter
//! the portal's existing workflow entities by research-objective keywords,
//! disciplines and used entities. Read-only.

use std::sync::Arc;

use crate::client::{Endpoint, QueryExecutor};
use crate::error::ExportResult;
use crate::queries::{self, SearchFilters};

/// One workflow found on the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowHit {
    /// Workflow label.
    pub label: String,
    /// Portal identifier.
    pub id: String,
}

/// Searches the portal for workflow entities.
pub struct WorkflowSearch {
    queries: Arc<dyn QueryExecutor>,
}

impl WorkflowSearch {
    /// Create a search over the given executor.
    #[must_use]
    pub fn new(queries: Arc<dyn QueryExecutor>) -> Self {
        Self { queries }
    }

    /// Run the search; empty filters list every workflow on the portal.
    pub async fn run(&self, filters: &SearchFilters) -> ExportResult<Vec<WorkflowHit>> {
        tracing::info!(
            objectives = filters.objective_terms.len(),
            disciplines = filters.disciplines.len(),
            entities = filters.entities.len(),
            "searching workflows"
        );

        let rows = self
            .queries
            .select(Endpoint::Portal, &queries::workflow_search(filters))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(WorkflowHit { label: row.get("label")?.clone(), id: row.get("qid")?.clone() })
            })
            .collect())
    }
}

impl std::fmt::Debug for WorkflowSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowSearch").finish_non_exhaustive()
    }
}
