//! Workflow assembly.
//!
//! Top-level driver of one documentation run: validate the decisions, run the
//! pre-flight duplicate check, drive the dependency-ordered builder, create
//! the workflow root entity linking everything together, render the document
//! and (when publishing) append it to the portal's wiki page.
//!
//! All failures are terminal; a half-created graph of entities with no root
//! linking them is worse than no graph at all, so there is no partial-success
//! path.

use crate::builder::{WorkflowBuilder, WorkflowContext};
use crate::client::{Endpoint, Services};
use crate::config::{Config, vocab};
use crate::decompose;
use crate::error::{ExportError, ExportResult};
use crate::models::{AnswerMap, Claim};
use crate::queries;
use crate::render::DocumentRenderer;
use crate::writer::EntityWriter;

/// The single descriptive outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Workflow title.
    pub title: String,
    /// Identifier of the created workflow root entity; absent for dry runs
    /// and markdown downloads.
    pub workflow_id: Option<String>,
    /// The rendered document.
    pub document: String,
    /// The resolved run state.
    pub context: WorkflowContext,
}

/// Drives one workflow documentation run.
pub struct WorkflowAssembler {
    services: Services,
    locale: String,
    has_credentials: bool,
}

impl WorkflowAssembler {
    /// Create an assembler over the given collaborators.
    #[must_use]
    pub fn new(services: Services, config: &Config) -> Self {
        Self { services, locale: config.locale.clone(), has_credentials: config.has_credentials() }
    }

    /// Run the full pipeline for one set of answers.
    pub async fn run(
        &self,
        answers: AnswerMap,
        renderer: &dyn DocumentRenderer,
    ) -> ExportResult<RunOutcome> {
        let decisions = decompose::document_decisions(&answers)?;
        let objective = decompose::research_objective(&answers)?;
        let title = decompose::workflow_title(&answers)?;

        if decisions.publish && !self.has_credentials {
            return Err(ExportError::MissingCredentials);
        }

        // Pre-flight duplicate check, before any entity creation: partially
        // duplicating a workflow that already exists is not recoverable.
        if decisions.publish {
            let rows = self
                .services
                .queries
                .select(Endpoint::Portal, &queries::duplicate_workflow(&title, &objective))
                .await?;
            if !rows.is_empty() {
                return Err(ExportError::DuplicateWorkflow { title });
            }
        }

        tracing::info!(%title, publish = decisions.publish, "starting workflow run");

        let writer = EntityWriter::new(self.services.store.clone(), self.locale.clone());
        let builder =
            WorkflowBuilder::new(self.services.clone(), writer.clone(), decisions.publish);
        let context = builder.build(answers).await?;

        let workflow_id = if decisions.publish {
            let mut claims = vec![Claim::link(vocab::RESEARCH_WORKFLOW, vocab::INSTANCE_OF)];
            claims.push(Claim::link(
                context.publication.clone().unwrap_or_default(),
                vocab::CITES_WORK,
            ));
            claims.extend(
                context.disciplines.iter().map(|id| Claim::link(id.clone(), vocab::FIELD_OF_WORK)),
            );
            claims.extend(context.used_entities().into_iter().map(|id| Claim::link(id, vocab::USES)));

            let id = writer.create(&title, &objective, claims).await?;
            tracing::info!(workflow = %id, "workflow root entity created");
            Some(id)
        } else {
            None
        };

        let document = renderer.render(&context, decisions.kind.into());

        if decisions.publish {
            writer.append_page(&title, &document).await?;
        }

        Ok(RunOutcome { title, workflow_id, document, context })
    }
}

impl std::fmt::Debug for WorkflowAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowAssembler")
            .field("has_credentials", &self.has_credentials)
            .finish_non_exhaustive()
    }
}
