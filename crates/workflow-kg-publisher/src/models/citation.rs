//! Bibliographic data returned by the citation lookup.

use serde::{Deserialize, Serialize};

/// One contributor of a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Full display name ("Given Family").
    pub name: String,
    /// ORCID identifier, bare (no URL prefix), when the registry knows it.
    #[serde(default)]
    pub orcid: Option<String>,
}

impl Contributor {
    /// Contributor with an ORCID.
    #[must_use]
    pub fn with_orcid(name: impl Into<String>, orcid: impl Into<String>) -> Self {
        Self { name: name.into(), orcid: Some(orcid.into()) }
    }
}

/// Structured bibliographic data for one DOI.
///
/// All fields default to empty strings rather than being optional so that
/// claim construction and document formatting stay total; the entity writer
/// drops empty-valued claims anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The DOI this record was resolved from.
    pub doi: String,
    /// Publication title.
    #[serde(default)]
    pub title: String,
    /// Journal (container) title.
    #[serde(default)]
    pub journal: String,
    /// ISO-639-1 language code.
    #[serde(default)]
    pub language: String,
    /// Volume.
    #[serde(default)]
    pub volume: String,
    /// Issue.
    #[serde(default)]
    pub issue: String,
    /// Page range.
    #[serde(default)]
    pub pages: String,
    /// Publication date, `YYYY-MM-DD` (missing parts padded with `01`).
    #[serde(default)]
    pub published: String,
    /// Registry entry type (e.g. `article`).
    #[serde(default)]
    pub entry_type: String,
    /// Contributors for which an ORCID is known; these become author items.
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    /// Contributors known only by name; these become plain name-string claims.
    #[serde(default)]
    pub plain_authors: Vec<String>,
}

impl Citation {
    /// True when the entry type maps to the scholarly-article class.
    #[must_use]
    pub fn is_article(&self) -> bool {
        self.entry_type == "article"
    }
}
