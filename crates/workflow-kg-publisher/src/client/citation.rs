//! Citation lookup via the Crossref REST API.

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, endpoints};
use crate::error::{ClientError, ClientResult};
use crate::models::{Citation, Contributor};

use super::CitationLookup;

/// Client for DOI resolution against Crossref.
#[derive(Clone)]
pub struct CrossrefClient {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
}

impl CrossrefClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(endpoints::USER_AGENT)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.citation_api_url.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Map a Crossref `message` payload to a [`Citation`].
    fn parse_message(doi: &str, message: &serde_json::Value) -> Citation {
        let first_str = |key: &str| {
            message[key][0]
                .as_str()
                .map(String::from)
                .unwrap_or_default()
        };

        let mut contributors = Vec::new();
        let mut plain_authors = Vec::new();
        if let Some(authors) = message["author"].as_array() {
            for author in authors {
                let name = [author["given"].as_str(), author["family"].as_str()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if name.is_empty() {
                    continue;
                }
                match author["ORCID"].as_str().map(strip_orcid_url) {
                    Some(orcid) => contributors.push(Contributor::with_orcid(name, orcid)),
                    None => plain_authors.push(name),
                }
            }
        }

        Citation {
            doi: doi.to_string(),
            title: first_str("title"),
            journal: first_str("container-title"),
            language: message["language"].as_str().unwrap_or_default().to_string(),
            volume: message["volume"].as_str().unwrap_or_default().to_string(),
            issue: message["issue"].as_str().unwrap_or_default().to_string(),
            pages: message["page"].as_str().unwrap_or_default().to_string(),
            published: published_date(message),
            entry_type: entry_type(message["type"].as_str().unwrap_or_default()),
            contributors,
            plain_authors,
        }
    }
}

/// ORCID values come back as URLs; claims carry the bare identifier.
fn strip_orcid_url(orcid: &str) -> String {
    orcid.rsplit('/').next().unwrap_or(orcid).to_string()
}

/// Map Crossref entry types onto the portal's publication classes.
fn entry_type(crossref_type: &str) -> String {
    match crossref_type {
        "journal-article" => "article".to_string(),
        other => other.to_string(),
    }
}

/// Extract `YYYY-MM-DD` from the date-parts array, padding missing parts.
fn published_date(message: &serde_json::Value) -> String {
    for key in ["published-print", "published-online", "issued"] {
        if let Some(parts) = message[key]["date-parts"][0].as_array() {
            let year = parts.first().and_then(serde_json::Value::as_i64);
            if let Some(year) = year {
                let month = parts.get(1).and_then(serde_json::Value::as_i64).unwrap_or(1);
                let day = parts.get(2).and_then(serde_json::Value::as_i64).unwrap_or(1);
                return format!("{year:04}-{month:02}-{day:02}");
            }
        }
    }
    String::new()
}

#[async_trait::async_trait]
impl CitationLookup for CrossrefClient {
    async fn by_doi(&self, doi: &str) -> ClientResult<Option<Citation>> {
        let url = format!("{}/works/{}", self.base_url, doi);

        tracing::debug!(doi, "resolving citation");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::middleware_transport(e, self.timeout))?;

        match response.status().as_u16() {
            404 => return Ok(None),
            status if status >= 400 => {
                let text = response.text().await.unwrap_or_default();
                return Err(ClientError::UnexpectedStatus { status, message: text });
            }
            _ => {}
        }

        let value: serde_json::Value = response.json().await?;
        let message = &value["message"];
        if message.is_null() {
            return Ok(None);
        }

        Ok(Some(Self::parse_message(doi, message)))
    }
}

impl std::fmt::Debug for CrossrefClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossrefClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}
