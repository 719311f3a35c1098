//! Configuration for the workflow publisher.

use std::time::Duration;

/// Endpoint and transport constants.
pub mod endpoints {
    use std::time::Duration;

    /// MediaWiki action API of the target portal.
    pub const PORTAL_API: &str = "https://portal.mardi4nfdi.de/w/api.php";

    /// SPARQL endpoint of the target portal.
    pub const PORTAL_SPARQL: &str = "https://query.portal.mardi4nfdi.de/sparql";

    /// SPARQL endpoint of the reference graph.
    pub const WIKIDATA_SPARQL: &str = "https://query.wikidata.org/sparql";

    /// Citation lookup service (Crossref REST API).
    pub const CITATION_API: &str = "https://api.crossref.org";

    /// Request timeout (SPARQL over large graphs can be slow).
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Query result cache TTL. Short on purpose: reconciliation must observe
    /// recent graph state, the cache only absorbs identical lookups within
    /// one run.
    pub const CACHE_TTL: Duration = Duration::from_secs(60);

    /// Maximum cached query results.
    pub const CACHE_MAX_SIZE: u64 = 500;

    /// User agent sent with every request, as the endpoints require.
    pub const USER_AGENT: &str =
        "workflow-kg-publisher/0.1 (https://github.com/mardi-portal/workflow-kg-publisher)";
}

/// Property and item identifiers of the portal's schema.
///
/// These are process-wide constants: the portal assigns them once at schema
/// bootstrap and they never change afterwards.
pub mod vocab {
    use crate::models::{ItemId, PropertyId};

    /// External identifier pointing at the Wikidata counterpart of an entity.
    pub const WIKIDATA_QID: PropertyId = PropertyId("P2");
    /// Workflow -> publication it documents.
    pub const CITES_WORK: PropertyId = PropertyId("P3");
    /// Class membership.
    pub const INSTANCE_OF: PropertyId = PropertyId("P4");
    /// Workflow -> research discipline.
    pub const FIELD_OF_WORK: PropertyId = PropertyId("P5");
    /// Workflow -> model/method/software/data set it uses.
    pub const USES: PropertyId = PropertyId("P6");
    /// Monolingual publication title.
    pub const TITLE: PropertyId = PropertyId("P7");
    /// Publication -> author item.
    pub const AUTHOR: PropertyId = PropertyId("P8");
    /// Author given as a plain name string (no item exists).
    pub const AUTHOR_NAME_STRING: PropertyId = PropertyId("P9");
    /// Publication -> language item.
    pub const LANGUAGE_OF_WORK: PropertyId = PropertyId("P10");
    /// Publication date.
    pub const PUBLICATION_DATE: PropertyId = PropertyId("P11");
    /// Publication -> journal item.
    pub const PUBLISHED_IN: PropertyId = PropertyId("P12");
    /// Journal volume.
    pub const VOLUME: PropertyId = PropertyId("P13");
    /// Journal issue.
    pub const ISSUE: PropertyId = PropertyId("P14");
    /// Page range.
    pub const PAGES: PropertyId = PropertyId("P15");
    /// DOI external identifier.
    pub const DOI: PropertyId = PropertyId("P16");
    /// Model/method -> the concept it is about.
    pub const MAIN_SUBJECT: PropertyId = PropertyId("P17");
    /// Defining formula (LaTeX source).
    pub const DEFINING_FORMULA: PropertyId = PropertyId("P18");
    /// Software -> programming language item.
    pub const PROGRAMMING_LANGUAGE: PropertyId = PropertyId("P19");
    /// swMATH software index identifier.
    pub const SWMATH_ID: PropertyId = PropertyId("P20");
    /// Person -> occupation.
    pub const OCCUPATION: PropertyId = PropertyId("P21");
    /// ORCID external identifier.
    pub const ORCID_ID: PropertyId = PropertyId("P22");

    /// Journal article.
    pub const SCHOLARLY_ARTICLE: ItemId = ItemId("Q1");
    /// The workflow root class.
    pub const RESEARCH_WORKFLOW: ItemId = ItemId("Q2");
    /// Mathematical model.
    pub const MATHEMATICAL_MODEL: ItemId = ItemId("Q3");
    /// Mathematical method.
    pub const MATHEMATICAL_METHOD: ItemId = ItemId("Q4");
    /// Software.
    pub const SOFTWARE: ItemId = ItemId("Q5");
    /// Data set (inputs and outputs).
    pub const DATA_SET: ItemId = ItemId("Q6");
    /// Human.
    pub const HUMAN: ItemId = ItemId("Q7");
    /// Researcher (occupation).
    pub const RESEARCHER: ItemId = ItemId("Q8");
    /// Scientific journal.
    pub const SCIENTIFIC_JOURNAL: ItemId = ItemId("Q9");
    /// Publication that is not a journal article.
    pub const PUBLICATION: ItemId = ItemId("Q10");
    /// Natural language.
    pub const LANGUAGE: ItemId = ItemId("Q11");
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// MediaWiki action API of the portal.
    pub portal_api_url: String,

    /// SPARQL endpoint of the portal.
    pub portal_sparql_url: String,

    /// SPARQL endpoint of the reference graph (Wikidata).
    pub wikidata_sparql_url: String,

    /// Citation lookup base URL.
    pub citation_api_url: String,

    /// Bot account for entity writes (required when publishing).
    pub bot_user: Option<String>,

    /// Bot password for entity writes.
    pub bot_password: Option<String>,

    /// Language tag for labels, descriptions and monolingual text claims.
    pub locale: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Query cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cached query results.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a configuration with the production endpoints.
    #[must_use]
    pub fn new(bot_user: Option<String>, bot_password: Option<String>) -> Self {
        Self {
            portal_api_url: endpoints::PORTAL_API.to_string(),
            portal_sparql_url: endpoints::PORTAL_SPARQL.to_string(),
            wikidata_sparql_url: endpoints::WIKIDATA_SPARQL.to_string(),
            citation_api_url: endpoints::CITATION_API.to_string(),
            bot_user,
            bot_password,
            locale: "en".to_string(),
            request_timeout: endpoints::REQUEST_TIMEOUT,
            connect_timeout: endpoints::CONNECT_TIMEOUT,
            cache_ttl: endpoints::CACHE_TTL,
            cache_max_size: endpoints::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing every endpoint at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            portal_api_url: format!("{base_url}/w/api.php"),
            portal_sparql_url: format!("{base_url}/portal/sparql"),
            wikidata_sparql_url: format!("{base_url}/wikidata/sparql"),
            citation_api_url: base_url.to_string(),
            bot_user: Some("test-bot".to_string()),
            bot_password: Some("test-password".to_string()),
            locale: "en".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a configured endpoint URL is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new(
            std::env::var("WKG_BOT_USER").ok(),
            std::env::var("WKG_BOT_PASSWORD").ok(),
        );
        if let Ok(api) = std::env::var("WKG_PORTAL_API") {
            config.portal_api_url = api;
        }
        if let Ok(sparql) = std::env::var("WKG_PORTAL_SPARQL") {
            config.portal_sparql_url = sparql;
        }
        for candidate in [
            &config.portal_api_url,
            &config.portal_sparql_url,
            &config.wikidata_sparql_url,
            &config.citation_api_url,
        ] {
            url::Url::parse(candidate)
                .map_err(|e| anyhow::anyhow!("invalid endpoint URL {candidate}: {e}"))?;
        }
        Ok(config)
    }

    /// Check if bot credentials are configured.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.bot_user.is_some() && self.bot_password.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}
