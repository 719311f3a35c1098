//! Existence resolution.
//!
//! Decides, for one candidate entity, whether it already exists on the
//! portal, only on the reference graph, or nowhere. Precedence:
//!
//! 1. A portal reference is trusted as-is; no query is issued.
//! 2. A reference-graph reference is reconciled against the portal by exact
//!    label + description; a miss creates a minimal stub (persisting runs) or
//!    yields the to-be-determined sentinel (dry runs).
//! 3. No reference: the portal is queried directly; a miss means the caller
//!    must create the entity, because only the caller knows the full claim
//!    set.
//!
//! Every invocation re-checks the graph rather than trusting a prior
//! in-memory result, so a clean re-run is idempotent against whatever state
//! the graph is in by then, at the cost of redundant lookups for entities
//! mentioned in two categories.

use crate::client::{Endpoint, QueryExecutor, ResultRow};
use crate::config::vocab;
use crate::error::{Category, ExportError, ExportResult};
use crate::models::{Claim, EntityCandidate, Origin, ResolvedEntity};
use crate::queries;
use crate::writer::EntityWriter;

use std::sync::Arc;

/// Resolves candidates against the portal and the reference graph.
#[derive(Clone)]
pub struct Resolver {
    queries: Arc<dyn QueryExecutor>,
    writer: EntityWriter,
    persist: bool,
}

impl Resolver {
    /// Create a resolver.
    ///
    /// `persist` controls whether reference-graph hits without a portal
    /// counterpart become stub entities or the to-be-determined sentinel.
    #[must_use]
    pub fn new(queries: Arc<dyn QueryExecutor>, writer: EntityWriter, persist: bool) -> Self {
        Self { queries, writer, persist }
    }

    /// Resolve one candidate.
    pub async fn resolve(&self, candidate: &EntityCandidate) -> ExportResult<ResolvedEntity> {
        match candidate.reference.origin() {
            Origin::Target => {
                // Trusted as-is; zero queries, zero writes.
                let id = candidate.reference.id().unwrap_or_default();
                Ok(if candidate.has_display_pair() {
                    ResolvedEntity::found_with(id, &candidate.label, &candidate.description)
                } else {
                    ResolvedEntity::found(id)
                })
            }
            Origin::Reference => self.resolve_from_reference(candidate).await,
            Origin::None => {
                match self.portal_match(&candidate.label, &candidate.description).await? {
                    Some(id) => Ok(ResolvedEntity::found_with(
                        id,
                        &candidate.label,
                        &candidate.description,
                    )),
                    None => Ok(ResolvedEntity::absent()),
                }
            }
        }
    }

    /// A candidate the reference graph already knows: reuse the portal
    /// counterpart when one exists, otherwise copy a minimal stub.
    async fn resolve_from_reference(
        &self,
        candidate: &EntityCandidate,
    ) -> ExportResult<ResolvedEntity> {
        if let Some(id) = self.portal_match(&candidate.label, &candidate.description).await? {
            return Ok(ResolvedEntity::found_with(id, &candidate.label, &candidate.description));
        }

        if !self.persist {
            return Ok(ResolvedEntity {
                display: Some((candidate.label.clone(), candidate.description.clone())),
                ..ResolvedEntity::pending()
            });
        }

        let reference_id = candidate.reference.id().unwrap_or_default();
        tracing::info!(
            label = %candidate.label,
            reference = reference_id,
            "copying reference-graph entity as stub"
        );
        let id = self
            .writer
            .create(
                &candidate.label,
                &candidate.description,
                vec![Claim::external_id(reference_id, vocab::WIKIDATA_QID)],
            )
            .await?;
        Ok(ResolvedEntity::found_with(id, &candidate.label, &candidate.description))
    }

    /// Exact label + description match on the portal.
    async fn portal_match(&self, label: &str, description: &str) -> ExportResult<Option<String>> {
        if label.is_empty() && description.is_empty() {
            return Ok(None);
        }
        let rows = self
            .queries
            .select(Endpoint::Portal, &queries::entity_by_label(label, description))
            .await?;
        Ok(first_qid(&rows))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").field("persist", &self.persist).finish_non_exhaustive()
    }
}

/// The `qid` variable of the first result row, when present and non-empty.
#[must_use]
pub fn first_qid(rows: &[ResultRow]) -> Option<String> {
    rows.first()
        .and_then(|row| row.get("qid"))
        .filter(|qid| !qid.is_empty())
        .cloned()
}

/// Raise the abort condition for a required entity that could neither be
/// resolved nor described well enough to create.
pub fn require_usable(
    category: Category,
    index: usize,
    candidate: &EntityCandidate,
    resolved: &ResolvedEntity,
) -> ExportResult<()> {
    if !resolved.exists && !candidate.has_display_pair() {
        return Err(ExportError::missing_entity(
            category,
            index,
            "no identifier and no label/description pair",
        ));
    }
    Ok(())
}
