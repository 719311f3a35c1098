//! SPARQL query client.
//!
//! Read-only: safe to put behind retry middleware and a short-lived result
//! cache. The cache TTL is deliberately short so reconciliation observes
//! recent graph state; it only absorbs identical lookups within one run.

use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, endpoints};
use crate::error::{ClientError, ClientResult};

use super::{Endpoint, QueryExecutor, ResultRow};

/// SPARQL client for the portal and reference endpoints.
#[derive(Clone)]
pub struct SparqlClient {
    /// HTTP client with retry middleware.
    client: ClientWithMiddleware,

    /// Query result cache.
    cache: Cache<String, Vec<ResultRow>>,

    /// Portal SPARQL endpoint URL.
    portal_url: String,

    /// Reference-graph SPARQL endpoint URL.
    reference_url: String,

    /// Request timeout, reported when a query times out.
    timeout: Duration,
}

impl SparqlClient {
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

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            portal_url: config.portal_sparql_url.clone(),
            reference_url: config.wikidata_sparql_url.clone(),
            timeout: config.request_timeout,
        })
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Portal => &self.portal_url,
            Endpoint::Reference => &self.reference_url,
        }
    }

    /// Generate cache key.
    fn cache_key(url: &str, query: &str) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(url.as_bytes());
        hasher.update(b"|");
        hasher.update(query.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Handle endpoint response status codes.
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);

                Err(ClientError::rate_limited(retry_after))
            }
            400 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::bad_request(text))
            }
            404 => Err(ClientError::not_found(response.url().to_string())),
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Flatten the SPARQL JSON result format into plain rows.
    fn parse_bindings(value: &serde_json::Value) -> Vec<ResultRow> {
        value["results"]["bindings"]
            .as_array()
            .map(|bindings| {
                bindings
                    .iter()
                    .filter_map(|binding| {
                        let row: ResultRow = binding
                            .as_object()?
                            .iter()
                            .filter_map(|(var, cell)| {
                                cell["value"].as_str().map(|v| (var.clone(), v.to_string()))
                            })
                            .collect();
                        Some(row)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl QueryExecutor for SparqlClient {
    async fn select(&self, endpoint: Endpoint, query: &str) -> ClientResult<Vec<ResultRow>> {
        let url = self.endpoint_url(endpoint);

        let cache_key = Self::cache_key(url, query);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        tracing::debug!(endpoint = ?endpoint, "running select query");

        let response = self
            .client
            .get(url)
            .query(&[("format", "json"), ("query", query)])
            .send()
            .await
            .map_err(|e| ClientError::middleware_transport(e, self.timeout))?;

        let response = Self::handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;
        let rows = Self::parse_bindings(&value);

        self.cache.insert(cache_key, rows.clone()).await;

        Ok(rows)
    }
}

impl std::fmt::Debug for SparqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlClient")
            .field("portal_url", &self.portal_url)
            .field("reference_url", &self.reference_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bindings() {
        let value = serde_json::json!({
            "results": {
                "bindings": [
                    {"qid": {"type": "literal", "value": "Q12"},
                     "label": {"type": "literal", "value": "heat equation"}},
                    {"qid": {"type": "literal", "value": "Q13"}}
                ]
            }
        });
        let rows = SparqlClient::parse_bindings(&value);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["qid"], "Q12");
        assert_eq!(rows[0]["label"], "heat equation");
        assert_eq!(rows[1].get("label"), None);
    }

    #[test]
    fn test_parse_bindings_empty_means_no_match() {
        let value = serde_json::json!({"results": {"bindings": []}});
        assert!(SparqlClient::parse_bindings(&value).is_empty());
    }

    #[test]
    fn test_cache_key_distinguishes_endpoints() {
        let a = SparqlClient::cache_key("http://portal/sparql", "SELECT ?x WHERE {}");
        let b = SparqlClient::cache_key("http://wikidata/sparql", "SELECT ?x WHERE {}");
        assert_ne!(a, b);
    }
}
