//! Record decomposition.
//!
//! Parses the composite delimited answer strings into structured per-entity
//! records. Two delimiter levels: `"; "` between instances and `" <|> "`
//! between fields of one instance. The first field of a composite is always
//! the entity reference string; an empty reference means brand-new. Missing
//! optional sub-fields default to the empty string, never null, so downstream
//! formatting stays total.

use crate::error::{ExportError, ExportResult};
use crate::models::{
    AnswerMap, EntityCandidate, EntityReference, ExportTarget, OperationMode, WorkflowKind, keys,
    publish_requested,
};
use crate::queries::SearchFilters;

/// Separator between instances inside one composite answer value.
pub const INSTANCE_SEP: &str = "; ";

/// Separator between fields of one instance.
pub const FIELD_SEP: &str = " <|> ";

/// Extra-field key carrying the raw `scheme:value` external identifier.
pub const EXTRA_EXTERNAL_ID: &str = "external_id";

/// Extra-field key carrying the raw `;`-separated formula list.
pub const EXTRA_FORMULAS: &str = "formulas";

/// Default description for data sets the user only named.
const DATA_SET_DESCRIPTION: &str = "data set";

/// The documented model plus its main subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    /// The model itself.
    pub candidate: EntityCandidate,
    /// Main subject, present when the user selected one.
    pub main_subject: Option<EntityCandidate>,
}

/// One documented method plus its main subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    /// The method itself.
    pub candidate: EntityCandidate,
    /// Main subject, present when the user selected one.
    pub main_subject: Option<EntityCandidate>,
}

/// One documented software item plus its programming languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareRecord {
    /// The software itself.
    pub candidate: EntityCandidate,
    /// Programming languages, in declaration order.
    pub languages: Vec<EntityCandidate>,
}

/// The publication answer, `"Yes: <doi>"`, `"Yes"` or `"No"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationAnswer {
    /// True when the user declared a related publication.
    pub provided: bool,
    /// The DOI, when one was given.
    pub doi: Option<String>,
}

/// The documentation-run decisions (kind, target, publish flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDecisions {
    /// Template/claim variant of the workflow.
    pub kind: WorkflowKind,
    /// Where the rendered document goes.
    pub target: ExportTarget,
    /// True when entities are actually written to the portal.
    pub publish: bool,
}

/// Parse the operation-mode answer.
pub fn operation_mode(answers: &AnswerMap) -> ExportResult<OperationMode> {
    OperationMode::parse(answers.get_or_empty(keys::OPERATION))
        .ok_or_else(|| ExportError::missing_answer(keys::OPERATION))
}

/// Parse the decisions a documentation run depends on.
pub fn document_decisions(answers: &AnswerMap) -> ExportResult<RunDecisions> {
    let kind = WorkflowKind::parse(answers.get_or_empty(keys::WORKFLOW_KIND))
        .ok_or_else(|| ExportError::missing_answer(keys::WORKFLOW_KIND))?;
    let target = ExportTarget::parse(answers.get_or_empty(keys::EXPORT_TARGET))
        .ok_or_else(|| ExportError::missing_answer(keys::EXPORT_TARGET))?;
    let publish = target == ExportTarget::Portal
        && publish_requested(answers.get_or_empty(keys::PORTAL_PUBLISH));
    Ok(RunDecisions { kind, target, publish })
}

/// The mandatory research objective.
pub fn research_objective(answers: &AnswerMap) -> ExportResult<String> {
    let objective = answers.get_or_empty(keys::OBJECTIVE).trim();
    if objective.is_empty() {
        return Err(ExportError::missing_answer(keys::OBJECTIVE));
    }
    Ok(objective.to_string())
}

/// The mandatory workflow title.
pub fn workflow_title(answers: &AnswerMap) -> ExportResult<String> {
    let title = answers.get_or_empty(keys::TITLE).trim();
    if title.is_empty() {
        return Err(ExportError::missing_answer(keys::TITLE));
    }
    Ok(title.to_string())
}

/// Split one composite instance into (reference, label, description).
fn split_composite(raw: &str) -> (EntityReference, String, String) {
    let mut fields = raw.split(FIELD_SEP);
    let reference = EntityReference::parse(fields.next().unwrap_or(""));
    let label = fields.next().unwrap_or("").trim().to_string();
    let description = fields.next().unwrap_or("").trim().to_string();
    (reference, label, description)
}

/// Build a candidate from a composite answer, falling back to separate
/// name/description answers when no composite was selected.
fn candidate(composite: &str, fallback_label: &str, fallback_description: &str) -> EntityCandidate {
    if composite.trim().is_empty() {
        EntityCandidate::new(fallback_label.trim(), fallback_description.trim())
    } else {
        let (reference, label, description) = split_composite(composite);
        EntityCandidate::new(label, description).with_reference(reference)
    }
}

/// Parse the publication answer.
#[must_use]
pub fn publication(answers: &AnswerMap) -> PublicationAnswer {
    let raw = answers.get_or_empty(keys::PUBLICATION).trim();
    match raw.split_once(':') {
        Some((head, tail)) if head.trim().eq_ignore_ascii_case("yes") => {
            let doi = tail.trim();
            PublicationAnswer {
                provided: true,
                doi: if doi.is_empty() { None } else { Some(doi.to_string()) },
            }
        }
        None if raw.eq_ignore_ascii_case("yes") => {
            PublicationAnswer { provided: true, doi: None }
        }
        _ => PublicationAnswer::default(),
    }
}

/// Decompose the model answers; `None` when the user documented no model.
#[must_use]
pub fn model(answers: &AnswerMap) -> Option<ModelRecord> {
    let answered = [
        keys::MODEL_ENTITY,
        keys::MODEL_NAME,
        keys::MODEL_DESCRIPTION,
        keys::MODEL_SUBJECT,
        keys::MODEL_FORMULAS,
        keys::MODEL_ID,
    ]
    .iter()
    .any(|k| !answers.get_or_empty(k).trim().is_empty());
    if !answered {
        return None;
    }

    let model = candidate(
        answers.get_or_empty(keys::MODEL_ENTITY),
        answers.get_or_empty(keys::MODEL_NAME),
        answers.get_or_empty(keys::MODEL_DESCRIPTION),
    )
    .with_extra(EXTRA_FORMULAS, answers.get_or_empty(keys::MODEL_FORMULAS))
    .with_extra(EXTRA_EXTERNAL_ID, answers.get_or_empty(keys::MODEL_ID));

    Some(ModelRecord { candidate: model, main_subject: subject(answers.get_or_empty(keys::MODEL_SUBJECT)) })
}

fn subject(composite: &str) -> Option<EntityCandidate> {
    if composite.trim().is_empty() {
        return None;
    }
    let (reference, label, description) = split_composite(composite);
    Some(EntityCandidate::new(label, description).with_reference(reference))
}

/// Decompose the method answers, in declaration order.
#[must_use]
pub fn methods(answers: &AnswerMap) -> Vec<MethodRecord> {
    (0..answers.set_count(keys::METHOD_PREFIX))
        .map(|i| MethodRecord {
            candidate: candidate(
                answers.get_indexed(keys::METHOD_ENTITY, i),
                answers.get_indexed(keys::METHOD_NAME, i),
                answers.get_indexed(keys::METHOD_DESCRIPTION, i),
            )
            .with_extra(EXTRA_FORMULAS, answers.get_indexed(keys::METHOD_FORMULAS, i))
            .with_extra(EXTRA_EXTERNAL_ID, answers.get_indexed(keys::METHOD_ID, i)),
            main_subject: subject(answers.get_indexed(keys::METHOD_SUBJECT, i)),
        })
        .collect()
}

/// Decompose the software answers, in declaration order.
#[must_use]
pub fn software(answers: &AnswerMap) -> Vec<SoftwareRecord> {
    (0..answers.set_count(keys::SOFTWARE_PREFIX))
        .map(|i| {
            let languages = answers
                .get_indexed(keys::SOFTWARE_LANGUAGES, i)
                .split(INSTANCE_SEP)
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| {
                    let (reference, label, description) = split_composite(raw);
                    EntityCandidate::new(label, description).with_reference(reference)
                })
                .collect();
            SoftwareRecord {
                candidate: candidate(
                    answers.get_indexed(keys::SOFTWARE_ENTITY, i),
                    answers.get_indexed(keys::SOFTWARE_NAME, i),
                    answers.get_indexed(keys::SOFTWARE_DESCRIPTION, i),
                )
                .with_extra(EXTRA_EXTERNAL_ID, answers.get_indexed(keys::SOFTWARE_ID, i)),
                languages,
            }
        })
        .collect()
}

/// Data-set direction (shares one decomposition shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRole {
    /// Input data set.
    Input,
    /// Output data set.
    Output,
}

/// Decompose the input or output data-set answers, in declaration order.
#[must_use]
pub fn datasets(answers: &AnswerMap, role: DataRole) -> Vec<EntityCandidate> {
    let (prefix, entity_key, name_key, id_key) = match role {
        DataRole::Input => (keys::INPUT_PREFIX, keys::INPUT_ENTITY, keys::INPUT_NAME, keys::INPUT_ID),
        DataRole::Output => {
            (keys::OUTPUT_PREFIX, keys::OUTPUT_ENTITY, keys::OUTPUT_NAME, keys::OUTPUT_ID)
        }
    };
    (0..answers.set_count(prefix))
        .map(|i| {
            candidate(
                answers.get_indexed(entity_key, i),
                answers.get_indexed(name_key, i),
                DATA_SET_DESCRIPTION,
            )
            .with_extra(EXTRA_EXTERNAL_ID, answers.get_indexed(id_key, i))
        })
        .collect()
}

/// Decompose the discipline answer, in declaration order.
#[must_use]
pub fn disciplines(answers: &AnswerMap) -> Vec<EntityCandidate> {
    answers
        .get_or_empty(keys::DISCIPLINES)
        .split(INSTANCE_SEP)
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            let (reference, label, description) = split_composite(raw);
            EntityCandidate::new(label, description).with_reference(reference)
        })
        .collect()
}

/// Decompose the search-filter answers.
#[must_use]
pub fn search_filters(answers: &AnswerMap) -> SearchFilters {
    let split = |key: &str| -> Vec<String> {
        answers
            .get_or_empty(key)
            .split(INSTANCE_SEP)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };
    let ids = |key: &str| -> Vec<String> {
        answers
            .get_or_empty(key)
            .split(INSTANCE_SEP)
            .filter_map(|raw| split_composite(raw).0.id().map(String::from))
            .collect()
    };
    SearchFilters {
        objective_terms: split(keys::SEARCH_OBJECTIVES),
        disciplines: ids(keys::SEARCH_DISCIPLINES),
        entities: ids(keys::SEARCH_ENTITIES),
    }
}

/// Split a raw `scheme:value` external identifier into its parts.
///
/// The scheme is everything before the first colon, the value everything
/// after the last one, so `doi:10.1000/x` and bare `10.1000/x` both work.
#[must_use]
pub fn external_id_parts(raw: &str) -> (&str, &str) {
    let raw = raw.trim();
    match (raw.split_once(':'), raw.rsplit_once(':')) {
        (Some((scheme, _)), Some((_, value))) => (scheme, value),
        _ => ("", raw),
    }
}

/// English name of an ISO-639-1 language code, for language entity labels.
/// Unknown codes pass through unchanged.
#[must_use]
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "nl" => "Dutch",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "sv" => "Swedish",
        "pl" => "Polish",
        "cs" => "Czech",
        "da" => "Danish",
        "fi" => "Finnish",
        other => other,
    }
}
