//! The flat answer mapping produced by the questionnaire system.
//!
//! Keys follow a fixed `section/set/question` naming convention; questions
//! inside repeatable sets carry a `_<i>` numeric suffix per instance
//! (`workflow/method/entity_0`, `workflow/method/entity_1`, ...). Values are
//! the raw answer strings; composite values use `"; "` between instances and
//! `" <|> "` between fields of one instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer keys understood by the pipeline.
pub mod keys {
    /// Operation mode: document a workflow or search for workflows.
    pub const OPERATION: &str = "general/settings/operation";
    /// Workflow kind: mathematical or experimental.
    pub const WORKFLOW_KIND: &str = "general/settings/kind";
    /// Export target: markdown download or portal.
    pub const EXPORT_TARGET: &str = "general/settings/target";
    /// Whether the portal export should actually write entities.
    pub const PORTAL_PUBLISH: &str = "general/settings/publish";

    /// Workflow title.
    pub const TITLE: &str = "general/workflow/title";
    /// Research objective; doubles as the workflow entity's description.
    pub const OBJECTIVE: &str = "general/workflow/objective";
    /// `"; "`-joined discipline composites.
    pub const DISCIPLINES: &str = "general/workflow/disciplines";

    /// Publication answer, `"Yes: <doi>"` or `"No"`.
    pub const PUBLICATION: &str = "publication/paper/reference";

    /// Model reference composite (`"<ref> <|> <label> <|> <description>"`).
    pub const MODEL_ENTITY: &str = "workflow/model/entity";
    /// Model name, used when no composite was selected.
    pub const MODEL_NAME: &str = "workflow/model/name";
    /// Model description, used when no composite was selected.
    pub const MODEL_DESCRIPTION: &str = "workflow/model/description";
    /// Main-subject composite of the model.
    pub const MODEL_SUBJECT: &str = "workflow/model/subject";
    /// `;`-separated defining formulas.
    pub const MODEL_FORMULAS: &str = "workflow/model/formulas";
    /// External identifier (`scheme:value`).
    pub const MODEL_ID: &str = "workflow/model/id";

    /// Key prefix shared by all method questions (for instance counting).
    pub const METHOD_PREFIX: &str = "workflow/method/";
    pub const METHOD_ENTITY: &str = "workflow/method/entity";
    pub const METHOD_NAME: &str = "workflow/method/name";
    pub const METHOD_DESCRIPTION: &str = "workflow/method/description";
    pub const METHOD_SUBJECT: &str = "workflow/method/subject";
    pub const METHOD_FORMULAS: &str = "workflow/method/formulas";
    pub const METHOD_ID: &str = "workflow/method/id";

    /// Key prefix shared by all software questions.
    pub const SOFTWARE_PREFIX: &str = "workflow/software/";
    pub const SOFTWARE_ENTITY: &str = "workflow/software/entity";
    pub const SOFTWARE_NAME: &str = "workflow/software/name";
    pub const SOFTWARE_DESCRIPTION: &str = "workflow/software/description";
    /// `"; "`-joined programming-language composites.
    pub const SOFTWARE_LANGUAGES: &str = "workflow/software/languages";
    pub const SOFTWARE_ID: &str = "workflow/software/id";

    /// Key prefix shared by all input questions.
    pub const INPUT_PREFIX: &str = "workflow/input/";
    pub const INPUT_ENTITY: &str = "workflow/input/entity";
    pub const INPUT_NAME: &str = "workflow/input/name";
    pub const INPUT_ID: &str = "workflow/input/id";

    /// Key prefix shared by all output questions.
    pub const OUTPUT_PREFIX: &str = "workflow/output/";
    pub const OUTPUT_ENTITY: &str = "workflow/output/entity";
    pub const OUTPUT_NAME: &str = "workflow/output/name";
    pub const OUTPUT_ID: &str = "workflow/output/id";

    /// `"; "`-joined research-objective keywords to search by.
    pub const SEARCH_OBJECTIVES: &str = "search/filter/objectives";
    /// `"; "`-joined discipline composites to search by.
    pub const SEARCH_DISCIPLINES: &str = "search/filter/disciplines";
    /// `"; "`-joined entity composites (models, methods, software, data sets).
    pub const SEARCH_ENTITIES: &str = "search/filter/entities";
}

/// Flat, ordered answer-key to value mapping.
///
/// Immutable as far as the questionnaire is concerned; the builder mutates a
/// run-private copy so later steps and the document renderer see resolved
/// references instead of raw user text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, String>);

impl AnswerMap {
    /// Empty answer map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an answer.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Look up an answer, defaulting to the empty string so downstream
    /// formatting stays total.
    #[must_use]
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Look up an instance-suffixed answer (`<key>_<index>`).
    #[must_use]
    pub fn get_indexed(&self, key: &str, index: usize) -> &str {
        self.0.get(&indexed(key, index)).map_or("", String::as_str)
    }

    /// Insert or replace an answer.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert or replace an instance-suffixed answer.
    pub fn insert_indexed(&mut self, key: &str, index: usize, value: impl Into<String>) {
        self.0.insert(indexed(key, index), value.into());
    }

    /// Number of instances the user entered for a repeatable set, derived by
    /// scanning keys sharing the set prefix and taking the maximum numeric
    /// suffix plus one.
    #[must_use]
    pub fn set_count(&self, prefix: &str) -> usize {
        self.0
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter_map(|k| k.rsplit_once('_')?.1.parse::<usize>().ok())
            .map(|i| i + 1)
            .max()
            .unwrap_or(0)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no answers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AnswerMap {
    /// Collapse whitespace runs in every value, the normalization the answer
    /// source applies before handing values over. Applied once at ingestion.
    #[must_use]
    pub fn normalized(self) -> Self {
        static WHITESPACE: std::sync::LazyLock<regex::Regex> =
            std::sync::LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid regex"));
        self.0
            .into_iter()
            .map(|(k, v)| (k, WHITESPACE.replace_all(v.trim(), " ").into_owned()))
            .collect()
    }
}

impl FromIterator<(String, String)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn indexed(key: &str, index: usize) -> String {
    format!("{key}_{index}")
}

/// What the user asked the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Document a workflow and export it.
    Document,
    /// Search the portal for existing workflows.
    Search,
}

impl OperationMode {
    /// Parse the operation answer; `None` for unrecognized values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "workflow documentation" | "documentation" | "document" => Some(Self::Document),
            "workflow search" | "search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// The documented workflow's kind; selects the document template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Theoretical/mathematical workflow.
    Mathematical,
    /// Experimental/empirical workflow.
    Experimental,
}

impl WorkflowKind {
    /// Parse the workflow-kind answer; `None` for unrecognized values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mathematical" | "mathematical workflow" | "theoretical" => Some(Self::Mathematical),
            "experimental" | "experimental workflow" | "empirical" => Some(Self::Experimental),
            _ => None,
        }
    }
}

/// Where the rendered document goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// Download as a markdown file; no graph interaction.
    Download,
    /// Export to the portal (with or without entity writes).
    Portal,
}

impl ExportTarget {
    /// Parse the export-target answer; `None` for unrecognized values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "markdown" | "markdown file" | "download" => Some(Self::Download),
            "portal" | "portal export" => Some(Self::Portal),
            _ => None,
        }
    }
}

/// Parse the publish answer; anything but an explicit yes means no.
#[must_use]
pub fn publish_requested(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "yes" | "true")
}
