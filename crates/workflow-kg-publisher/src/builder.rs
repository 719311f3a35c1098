//! Dependency-ordered construction.
//!
//! Enumerates, resolves and (where needed) creates every entity of one
//! workflow so that every claim referencing another entity is only written
//! after that entity has a valid identifier:
//!
//! 1. publication leaves (authors, then journal, then language), then the
//!    publication itself;
//! 2. main subject of the model, then the model;
//! 3. per method: main subject, then the method;
//! 4. per software item: programming languages, then the software item;
//! 5. inputs, outputs, disciplines (independent, declaration order).
//!
//! The workflow root entity is written by the assembler once all of the
//! above succeeded.
//!
//! Resolved identifiers are recorded back into the context's answers under
//! the category's key (prefixed `portal:`), so later steps and the document
//! renderer see resolved references instead of raw user text.

use crate::client::{Endpoint, ResultRow, Services};
use crate::config::vocab;
use crate::decompose::{
    self, DataRole, EXTRA_EXTERNAL_ID, EXTRA_FORMULAS, FIELD_SEP, INSTANCE_SEP, external_id_parts,
};
use crate::error::{Category, ExportError, ExportResult};
use crate::models::{
    AnswerMap, Citation, Claim, EntityCandidate, ItemId, Origin, PORTAL_PREFIX, keys,
};
use crate::queries;
use crate::resolve::{Resolver, first_qid, require_usable};
use crate::writer::EntityWriter;

/// The accumulating state of one pipeline run.
///
/// Exclusively owned by the run that created it; discarded at the end,
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    /// Answers, mutated in place as identifiers are resolved.
    pub answers: AnswerMap,
    /// Publication identifier, when one was resolved or created.
    pub publication: Option<String>,
    /// Model identifier.
    pub model: Option<String>,
    /// Method identifiers, declaration order.
    pub methods: Vec<String>,
    /// Software identifiers, declaration order.
    pub software: Vec<String>,
    /// Input data-set identifiers, declaration order.
    pub inputs: Vec<String>,
    /// Output data-set identifiers, declaration order.
    pub outputs: Vec<String>,
    /// Discipline identifiers, declaration order.
    pub disciplines: Vec<String>,
}

impl WorkflowContext {
    /// Start a run over the given answers.
    #[must_use]
    pub fn new(answers: AnswerMap) -> Self {
        Self { answers, ..Self::default() }
    }

    /// All model/method/software/input/output identifiers, in the order the
    /// workflow root links them.
    #[must_use]
    pub fn used_entities(&self) -> Vec<String> {
        self.model
            .iter()
            .cloned()
            .chain(self.methods.iter().cloned())
            .chain(self.software.iter().cloned())
            .chain(self.inputs.iter().cloned())
            .chain(self.outputs.iter().cloned())
            .collect()
    }
}

/// Keys a category writes resolved references back under.
struct CategorySpec {
    category: Category,
    entity_key: &'static str,
    name_key: Option<&'static str>,
    description_key: Option<&'static str>,
    indexed: bool,
}

const MODEL_SPEC: CategorySpec = CategorySpec {
    category: Category::Model,
    entity_key: keys::MODEL_ENTITY,
    name_key: Some(keys::MODEL_NAME),
    description_key: Some(keys::MODEL_DESCRIPTION),
    indexed: false,
};

const METHOD_SPEC: CategorySpec = CategorySpec {
    category: Category::Method,
    entity_key: keys::METHOD_ENTITY,
    name_key: Some(keys::METHOD_NAME),
    description_key: None,
    indexed: true,
};

const SOFTWARE_SPEC: CategorySpec = CategorySpec {
    category: Category::Software,
    entity_key: keys::SOFTWARE_ENTITY,
    name_key: Some(keys::SOFTWARE_NAME),
    description_key: Some(keys::SOFTWARE_DESCRIPTION),
    indexed: true,
};

const INPUT_SPEC: CategorySpec = CategorySpec {
    category: Category::Input,
    entity_key: keys::INPUT_ENTITY,
    name_key: Some(keys::INPUT_NAME),
    description_key: None,
    indexed: true,
};

const OUTPUT_SPEC: CategorySpec = CategorySpec {
    category: Category::Output,
    entity_key: keys::OUTPUT_ENTITY,
    name_key: Some(keys::OUTPUT_NAME),
    description_key: None,
    indexed: true,
};

/// What one resolution step produced.
enum StepOutcome {
    /// A real portal identifier.
    Found(String),
    /// The to-be-determined sentinel (dry run).
    Pending,
    /// Nothing exists; the caller must create the entity.
    MustCreate,
}

/// Resolves and creates all entities of one workflow run.
pub struct WorkflowBuilder {
    services: Services,
    resolver: Resolver,
    writer: EntityWriter,
    persist: bool,
}

impl WorkflowBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(services: Services, writer: EntityWriter, persist: bool) -> Self {
        let resolver = Resolver::new(services.queries.clone(), writer.clone(), persist);
        Self { services, resolver, writer, persist }
    }

    /// Run all categories in dependency order.
    pub async fn build(&self, answers: AnswerMap) -> ExportResult<WorkflowContext> {
        let mut ctx = WorkflowContext::new(answers);

        self.build_publication(&mut ctx).await?;
        self.build_model(&mut ctx).await?;
        self.build_methods(&mut ctx).await?;
        self.build_software(&mut ctx).await?;
        self.build_datasets(&mut ctx, DataRole::Input).await?;
        self.build_datasets(&mut ctx, DataRole::Output).await?;
        self.build_disciplines(&mut ctx).await?;

        Ok(ctx)
    }

    // ------------------------------------------------------------------
    // Publication
    // ------------------------------------------------------------------

    async fn build_publication(&self, ctx: &mut WorkflowContext) -> ExportResult<()> {
        let answer = decompose::publication(&ctx.answers);
        if !self.persist || !answer.provided {
            return Ok(());
        }

        let doi = answer.doi.ok_or_else(|| {
            ExportError::lookup_empty("no DOI provided for the related publication")
        })?;

        let citation = self
            .services
            .citations
            .by_doi(&doi)
            .await?
            .ok_or_else(|| ExportError::lookup_empty(format!("DOI {doi} could not be resolved")))?;

        tracing::info!(%doi, title = %citation.title, "reconciling publication");

        let id = self.resolve_publication(&doi, &citation).await?;
        ctx.publication = Some(id);
        Ok(())
    }

    /// The publication cascade: portal by DOI, reference graph by DOI,
    /// portal by title, reference graph by title, full creation.
    async fn resolve_publication(&self, doi: &str, citation: &Citation) -> ExportResult<String> {
        if let Some(id) =
            first_qid(&self.select_portal(&queries::portal_publication_by_doi(doi)).await?)
        {
            return Ok(id);
        }

        let rows = self.select_reference(&queries::reference_publication_by_doi(doi)).await?;
        if let Some(row) = hit(&rows) {
            return self.adopt_reference_publication(row, citation).await;
        }

        if citation.title.is_empty() {
            return Err(ExportError::lookup_empty(format!("citation for DOI {doi} has no title")));
        }

        if let Some(id) =
            first_qid(&self.select_portal(&queries::publication_by_title(&citation.title)).await?)
        {
            return Ok(id);
        }

        let rows =
            self.select_reference(&queries::publication_by_title(&citation.title)).await?;
        if let Some(row) = hit(&rows) {
            return self.adopt_reference_publication(row, citation).await;
        }

        self.create_publication(citation).await
    }

    /// A publication the reference graph knows: reuse the portal entity with
    /// the same label and description, or copy a stub.
    async fn adopt_reference_publication(
        &self,
        row: &ResultRow,
        citation: &Citation,
    ) -> ExportResult<String> {
        let reference_id = row["qid"].clone();
        let label = non_empty(row.get("label")).unwrap_or_else(|| citation.title.clone());
        let description =
            non_empty(row.get("description")).unwrap_or_else(|| "publication".to_string());

        if let Some(id) =
            first_qid(&self.select_portal(&queries::entity_by_label(&label, &description)).await?)
        {
            return Ok(id);
        }

        self.writer
            .create(&label, &description, vec![Claim::external_id(reference_id, vocab::WIKIDATA_QID)])
            .await
    }

    /// Create the publication with its full claim set, leaves first.
    async fn create_publication(&self, citation: &Citation) -> ExportResult<String> {
        let mut author_ids = Vec::new();
        for contributor in &citation.contributors {
            let orcid = contributor.orcid.as_deref().unwrap_or_default();
            let id = self
                .resolve_publication_leaf(
                    &queries::portal_person_by_orcid(orcid),
                    &queries::reference_person_by_orcid(orcid),
                    &contributor.name,
                    "researcher",
                    vec![
                        Claim::link(vocab::HUMAN, vocab::INSTANCE_OF),
                        Claim::link(vocab::RESEARCHER, vocab::OCCUPATION),
                        Claim::external_id(orcid, vocab::ORCID_ID),
                    ],
                )
                .await?;
            author_ids.push(id);
        }

        let journal_id = if citation.journal.is_empty() {
            String::new()
        } else {
            self.resolve_publication_leaf(
                &queries::entity_by_name(&citation.journal),
                &queries::reference_journal_by_name(&citation.journal),
                &citation.journal,
                "scientific journal",
                vec![Claim::link(vocab::SCIENTIFIC_JOURNAL, vocab::INSTANCE_OF)],
            )
            .await?
        };

        let language_id = if citation.language.is_empty() {
            String::new()
        } else {
            let name = decompose::language_name(&citation.language);
            self.resolve_publication_leaf(
                &queries::entity_by_name(name),
                &queries::reference_language_by_name(name),
                name,
                "language",
                vec![Claim::link(vocab::LANGUAGE, vocab::INSTANCE_OF)],
            )
            .await?
        };

        let class =
            if citation.is_article() { vocab::SCHOLARLY_ARTICLE } else { vocab::PUBLICATION };
        let mut claims = vec![Claim::link(class, vocab::INSTANCE_OF)];
        claims.extend(author_ids.into_iter().map(|id| Claim::link(id, vocab::AUTHOR)));
        claims.extend(
            citation
                .plain_authors
                .iter()
                .map(|name| Claim::text(name.clone(), vocab::AUTHOR_NAME_STRING)),
        );
        claims.push(Claim::link(language_id, vocab::LANGUAGE_OF_WORK));
        claims.push(Claim::link(journal_id, vocab::PUBLISHED_IN));
        claims.push(Claim::localized(&citation.title, vocab::TITLE));
        claims.push(Claim::timestamp(&citation.published, vocab::PUBLICATION_DATE));
        claims.push(Claim::text(&citation.volume, vocab::VOLUME));
        claims.push(Claim::text(&citation.issue, vocab::ISSUE));
        claims.push(Claim::text(&citation.pages, vocab::PAGES));
        claims.push(Claim::external_id(citation.doi.to_uppercase(), vocab::DOI));

        self.writer.create(&citation.title, "publication", claims).await
    }

    /// The shared ladder for publication leaves (author, journal, language):
    /// portal by role key, reference graph by role key (then portal by the
    /// reference labels, then stub), portal by proposed labels, full create.
    async fn resolve_publication_leaf(
        &self,
        portal_query: &str,
        reference_query: &str,
        label: &str,
        role_description: &str,
        create_claims: Vec<Claim>,
    ) -> ExportResult<String> {
        if let Some(id) = first_qid(&self.select_portal(portal_query).await?) {
            return Ok(id);
        }

        let rows = self.select_reference(reference_query).await?;
        if let Some(row) = hit(&rows) {
            let reference_id = row["qid"].clone();
            let ref_label = non_empty(row.get("label")).unwrap_or_else(|| label.to_string());
            let ref_description =
                non_empty(row.get("description")).unwrap_or_else(|| role_description.to_string());

            if let Some(id) = first_qid(
                &self
                    .select_portal(&queries::entity_by_label(&ref_label, &ref_description))
                    .await?,
            ) {
                return Ok(id);
            }
            return self
                .writer
                .create(
                    &ref_label,
                    &ref_description,
                    vec![Claim::external_id(reference_id, vocab::WIKIDATA_QID)],
                )
                .await;
        }

        if let Some(id) =
            first_qid(&self.select_portal(&queries::entity_by_label(label, role_description)).await?)
        {
            return Ok(id);
        }

        self.writer.create(label, role_description, create_claims).await
    }

    // ------------------------------------------------------------------
    // Model, methods
    // ------------------------------------------------------------------

    async fn build_model(&self, ctx: &mut WorkflowContext) -> ExportResult<()> {
        let Some(record) = decompose::model(&ctx.answers) else {
            return Ok(());
        };

        match self.resolve_step(ctx, &MODEL_SPEC, 0, &record.candidate).await? {
            StepOutcome::Found(id) => ctx.model = Some(id),
            StepOutcome::Pending => {}
            StepOutcome::MustCreate => {
                let subject_id =
                    self.resolve_subject(record.main_subject.as_ref(), Category::Model, 0).await?;
                let claims =
                    modelling_claims(&record.candidate, vocab::MATHEMATICAL_MODEL, &subject_id);
                if let Some(id) =
                    self.create_step(ctx, &MODEL_SPEC, 0, &record.candidate, claims).await?
                {
                    ctx.model = Some(id);
                }
            }
        }
        Ok(())
    }

    async fn build_methods(&self, ctx: &mut WorkflowContext) -> ExportResult<()> {
        let records = decompose::methods(&ctx.answers);
        for (i, record) in records.iter().enumerate() {
            match self.resolve_step(ctx, &METHOD_SPEC, i, &record.candidate).await? {
                StepOutcome::Found(id) => ctx.methods.push(id),
                StepOutcome::Pending => {}
                StepOutcome::MustCreate => {
                    let subject_id = self
                        .resolve_subject(record.main_subject.as_ref(), Category::Method, i)
                        .await?;
                    let claims = modelling_claims(
                        &record.candidate,
                        vocab::MATHEMATICAL_METHOD,
                        &subject_id,
                    );
                    if let Some(id) =
                        self.create_step(ctx, &METHOD_SPEC, i, &record.candidate, claims).await?
                    {
                        ctx.methods.push(id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve the main subject of a model/method about to be created.
    /// Without one the entity cannot be created.
    async fn resolve_subject(
        &self,
        subject: Option<&EntityCandidate>,
        category: Category,
        index: usize,
    ) -> ExportResult<String> {
        if let Some(subject) = subject {
            let resolved = self.resolver.resolve(subject).await?;
            if let Some(id) = resolved.id() {
                return Ok(id.to_string());
            }
        }
        Err(ExportError::missing_entity(category, index, "no resolvable main subject"))
    }

    // ------------------------------------------------------------------
    // Software
    // ------------------------------------------------------------------

    async fn build_software(&self, ctx: &mut WorkflowContext) -> ExportResult<()> {
        let records = decompose::software(&ctx.answers);
        for (i, record) in records.iter().enumerate() {
            // Programming languages first; their resolved references are
            // surfaced back into the answers even when the software itself
            // already exists.
            let mut language_ids = Vec::new();
            let mut display = String::new();
            for language in &record.languages {
                if language.reference.origin() == Origin::None {
                    continue;
                }
                let resolved = self.resolver.resolve(language).await?;
                if let Some(id) = resolved.id() {
                    display.push_str(&format!("{} ({PORTAL_PREFIX}:{id});", language.label));
                    language_ids.push(id.to_string());
                }
            }
            ctx.answers.insert_indexed(keys::SOFTWARE_LANGUAGES, i, display);

            match self.resolve_step(ctx, &SOFTWARE_SPEC, i, &record.candidate).await? {
                StepOutcome::Found(id) => ctx.software.push(id),
                StepOutcome::Pending => {}
                StepOutcome::MustCreate => {
                    if language_ids.is_empty() {
                        return Err(ExportError::missing_entity(
                            Category::Software,
                            i,
                            "no resolvable programming language",
                        ));
                    }
                    let claims = software_claims(&record.candidate, &language_ids);
                    if let Some(id) =
                        self.create_step(ctx, &SOFTWARE_SPEC, i, &record.candidate, claims).await?
                    {
                        ctx.software.push(id);
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Data sets, disciplines
    // ------------------------------------------------------------------

    async fn build_datasets(&self, ctx: &mut WorkflowContext, role: DataRole) -> ExportResult<()> {
        let spec = match role {
            DataRole::Input => &INPUT_SPEC,
            DataRole::Output => &OUTPUT_SPEC,
        };
        let records = decompose::datasets(&ctx.answers, role);
        for (i, candidate) in records.iter().enumerate() {
            match self.resolve_step(ctx, spec, i, candidate).await? {
                StepOutcome::Found(id) => match role {
                    DataRole::Input => ctx.inputs.push(id),
                    DataRole::Output => ctx.outputs.push(id),
                },
                StepOutcome::Pending => {}
                StepOutcome::MustCreate => {
                    let claims = dataset_claims(candidate);
                    if let Some(id) = self.create_step(ctx, spec, i, candidate, claims).await? {
                        match role {
                            DataRole::Input => ctx.inputs.push(id),
                            DataRole::Output => ctx.outputs.push(id),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn build_disciplines(&self, ctx: &mut WorkflowContext) -> ExportResult<()> {
        let candidates = decompose::disciplines(&ctx.answers);
        if candidates.is_empty() {
            return Err(ExportError::missing_entity(
                Category::Discipline,
                0,
                "no discipline declared",
            ));
        }

        let mut entries = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            let resolved = self.resolver.resolve(candidate).await?;
            // Disciplines are never fabricated from a label alone.
            let Some(id) = resolved.id() else {
                return Err(ExportError::missing_entity(
                    Category::Discipline,
                    i,
                    "not found on the portal or the reference graph",
                ));
            };
            if !resolved.is_pending() {
                ctx.disciplines.push(id.to_string());
            }
            let (label, description) = resolved.display.clone().unwrap_or_else(|| {
                (candidate.label.clone(), candidate.description.clone())
            });
            entries.push(format!("{PORTAL_PREFIX}:{id}{FIELD_SEP}{label}{FIELD_SEP}{description}"));
        }
        ctx.answers.insert(keys::DISCIPLINES, entries.join(INSTANCE_SEP));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared machinery
    // ------------------------------------------------------------------

    /// Resolve one candidate and record the outcome in the context.
    async fn resolve_step(
        &self,
        ctx: &mut WorkflowContext,
        spec: &CategorySpec,
        index: usize,
        candidate: &EntityCandidate,
    ) -> ExportResult<StepOutcome> {
        let resolved = self.resolver.resolve(candidate).await?;

        if let Some(id) = resolved.id() {
            inject_reference(ctx, spec, index, id);
            if let Some((label, description)) = &resolved.display {
                inject_display(ctx, spec, index, label, description);
            }
            return Ok(if resolved.is_pending() {
                StepOutcome::Pending
            } else {
                StepOutcome::Found(id.to_string())
            });
        }

        require_usable(spec.category, index, candidate, &resolved)?;
        Ok(StepOutcome::MustCreate)
    }

    /// Create the entity (persisting runs) or record the sentinel (dry runs).
    async fn create_step(
        &self,
        ctx: &mut WorkflowContext,
        spec: &CategorySpec,
        index: usize,
        candidate: &EntityCandidate,
        claims: Vec<Claim>,
    ) -> ExportResult<Option<String>> {
        if !self.persist {
            inject_reference(ctx, spec, index, crate::models::TBD);
            return Ok(None);
        }

        tracing::info!(category = %spec.category, index, label = %candidate.label, "creating entity");
        let id = self.writer.create(&candidate.label, &candidate.description, claims).await?;
        inject_reference(ctx, spec, index, &id);
        Ok(Some(id))
    }

    async fn select_portal(&self, query: &str) -> ExportResult<Vec<ResultRow>> {
        Ok(self.services.queries.select(Endpoint::Portal, query).await?)
    }

    async fn select_reference(&self, query: &str) -> ExportResult<Vec<ResultRow>> {
        Ok(self.services.queries.select(Endpoint::Reference, query).await?)
    }
}

impl std::fmt::Debug for WorkflowBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowBuilder").field("persist", &self.persist).finish_non_exhaustive()
    }
}

fn inject_reference(ctx: &mut WorkflowContext, spec: &CategorySpec, index: usize, id: &str) {
    let value = format!("{PORTAL_PREFIX}:{id}");
    if spec.indexed {
        ctx.answers.insert_indexed(spec.entity_key, index, value);
    } else {
        ctx.answers.insert(spec.entity_key, value);
    }
}

fn inject_display(
    ctx: &mut WorkflowContext,
    spec: &CategorySpec,
    index: usize,
    label: &str,
    description: &str,
) {
    if let Some(name_key) = spec.name_key {
        if spec.indexed {
            ctx.answers.insert_indexed(name_key, index, label);
        } else {
            ctx.answers.insert(name_key, label);
        }
    }
    if let Some(description_key) = spec.description_key {
        if spec.indexed {
            ctx.answers.insert_indexed(description_key, index, description);
        } else {
            ctx.answers.insert(description_key, description);
        }
    }
}

/// First row whose `qid` is present and non-empty.
fn hit(rows: &[ResultRow]) -> Option<&ResultRow> {
    rows.iter().find(|row| row.get("qid").is_some_and(|qid| !qid.is_empty()))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Claims shared by models and methods: class, main subject, defining
/// formulas, external identifier.
fn modelling_claims(candidate: &EntityCandidate, class: ItemId, subject_id: &str) -> Vec<Claim> {
    let mut claims =
        vec![Claim::link(class, vocab::INSTANCE_OF), Claim::link(subject_id, vocab::MAIN_SUBJECT)];
    claims.extend(formula_claims(candidate.extra(EXTRA_FORMULAS)));
    claims.push(Claim::external_id(
        external_id_parts(candidate.extra(EXTRA_EXTERNAL_ID)).1,
        vocab::DOI,
    ));
    claims
}

/// Formulas arrive `;`-separated with LaTeX math delimiters.
fn formula_claims(raw: &str) -> Vec<Claim> {
    raw.split(';')
        .map(|formula| formula.replace('$', "").trim().to_string())
        .filter(|formula| !formula.is_empty())
        .map(|formula| Claim::text(formula, vocab::DEFINING_FORMULA))
        .collect()
}

fn software_claims(candidate: &EntityCandidate, language_ids: &[String]) -> Vec<Claim> {
    let mut claims = vec![Claim::link(vocab::SOFTWARE, vocab::INSTANCE_OF)];
    claims.extend(language_ids.iter().map(|id| Claim::link(id.clone(), vocab::PROGRAMMING_LANGUAGE)));
    let (scheme, value) = external_id_parts(candidate.extra(EXTRA_EXTERNAL_ID));
    let property = if scheme == "doi" { vocab::DOI } else { vocab::SWMATH_ID };
    claims.push(Claim::external_id(value, property));
    claims
}

fn dataset_claims(candidate: &EntityCandidate) -> Vec<Claim> {
    vec![
        Claim::link(vocab::DATA_SET, vocab::INSTANCE_OF),
        Claim::external_id(external_id_parts(candidate.extra(EXTRA_EXTERNAL_ID)).1, vocab::DOI),
    ]
}
