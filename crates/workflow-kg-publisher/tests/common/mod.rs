//! Shared test doubles: a scripted query executor, a ledger entity store and
//! a canned citation lookup, all capturing their calls so tests can assert
//! query counts and creation order.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use workflow_kg_publisher::client::{
    CitationLookup, Endpoint, EntityStore, QueryExecutor, ResultRow, Services,
};
use workflow_kg_publisher::error::ClientResult;
use workflow_kg_publisher::models::{Citation, Claim, Contributor};

/// One canned response: queries against `endpoint` containing `needle`
/// answer with `rows`.
pub struct Rule {
    pub endpoint: Endpoint,
    pub needle: String,
    pub rows: Vec<ResultRow>,
}

/// Query executor double answering from a rule list; everything else misses.
#[derive(Default)]
pub struct StubExecutor {
    rules: Vec<Rule>,
    pub log: Mutex<Vec<(Endpoint, String)>>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(mut self, endpoint: Endpoint, needle: &str, rows: Vec<ResultRow>) -> Self {
        self.rules.push(Rule { endpoint, needle: needle.to_string(), rows });
        self
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// True when any issued query contained the needle.
    pub fn queried_for(&self, needle: &str) -> bool {
        self.log.lock().unwrap().iter().any(|(_, q)| q.contains(needle))
    }
}

#[async_trait::async_trait]
impl QueryExecutor for StubExecutor {
    async fn select(&self, endpoint: Endpoint, query: &str) -> ClientResult<Vec<ResultRow>> {
        self.log.lock().unwrap().push((endpoint, query.to_string()));
        for rule in &self.rules {
            if rule.endpoint == endpoint && query.contains(&rule.needle) {
                return Ok(rule.rows.clone());
            }
        }
        Ok(Vec::new())
    }
}

/// Build one result row from pairs.
pub fn row(pairs: &[(&str, &str)]) -> ResultRow {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// A single-row result carrying just a qid.
pub fn qid_rows(qid: &str) -> Vec<ResultRow> {
    vec![row(&[("qid", qid)])]
}

/// One recorded entity creation.
#[derive(Debug, Clone)]
pub struct CreatedEntity {
    pub label: String,
    pub description: String,
    pub claims: Vec<Claim>,
}

/// Entity store double recording every create and page append, handing out
/// sequential identifiers Q901, Q902, ...
#[derive(Default)]
pub struct LedgerStore {
    pub created: Mutex<Vec<CreatedEntity>>,
    pub pages: Mutex<Vec<(String, String)>>,
}

impl LedgerStore {
    pub fn count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.created.lock().unwrap().iter().map(|e| e.label.clone()).collect()
    }

    pub fn entity(&self, index: usize) -> CreatedEntity {
        self.created.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl EntityStore for LedgerStore {
    async fn create_entity(
        &self,
        label: &str,
        description: &str,
        _locale: &str,
        claims: &[Claim],
    ) -> ClientResult<String> {
        let mut created = self.created.lock().unwrap();
        created.push(CreatedEntity {
            label: label.to_string(),
            description: description.to_string(),
            claims: claims.to_vec(),
        });
        Ok(format!("Q{}", 900 + created.len()))
    }

    async fn append_page(&self, title: &str, wikitext: &str) -> ClientResult<()> {
        self.pages.lock().unwrap().push((title.to_string(), wikitext.to_string()));
        Ok(())
    }
}

/// Citation lookup double returning a canned record.
#[derive(Default)]
pub struct StubCitations {
    pub citation: Option<Citation>,
    pub calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl CitationLookup for StubCitations {
    async fn by_doi(&self, _doi: &str) -> ClientResult<Option<Citation>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.citation.clone())
    }
}

/// Bundle the doubles into the pipeline's service set.
pub fn services(
    executor: &Arc<StubExecutor>,
    store: &Arc<LedgerStore>,
    citations: &Arc<StubCitations>,
) -> Services {
    Services::new(executor.clone(), store.clone(), citations.clone())
}

/// The citation every publication test works with.
pub fn sample_citation() -> Citation {
    Citation {
        doi: "10.1000/heat".to_string(),
        title: "A study of heat flow".to_string(),
        journal: "Journal of Thermal Things".to_string(),
        language: "en".to_string(),
        volume: "12".to_string(),
        issue: "3".to_string(),
        pages: "100-120".to_string(),
        published: "2021-03-01".to_string(),
        entry_type: "article".to_string(),
        contributors: vec![Contributor::with_orcid("Ada Lovelace", "0000-0001-2345-6789")],
        plain_authors: vec!["Charles Babbage".to_string()],
    }
}
