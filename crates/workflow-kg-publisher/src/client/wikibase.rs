//! Wikibase entity store.
//!
//! Talks to the portal's MediaWiki action API: login-token/CSRF-token dance,
//! `wbeditentity` for entity creation, `edit` for wiki-page appends. Write
//! calls are NOT retried; a failed create is terminal for the run because a
//! blind retry risks creating duplicate entities.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::{Config, endpoints};
use crate::error::{ClientError, ClientResult};
use crate::models::{Claim, ClaimKind};

use super::EntityStore;

/// Wikibase calendar model IRI for Gregorian dates.
const GREGORIAN: &str = "http://www.wikidata.org/entity/Q1985727";

/// Day precision in the Wikibase time datatype.
const DAY_PRECISION: u8 = 11;

/// Client for the portal's MediaWiki/Wikibase API.
pub struct WikibaseClient {
    /// Plain HTTP client; no retry middleware on write paths.
    client: Client,

    /// Action API URL.
    api_url: String,

    /// Bot account.
    bot_user: Option<String>,

    /// Bot password.
    bot_password: Option<String>,

    /// CSRF token, fetched lazily on the first write and reused afterwards.
    csrf_token: Mutex<Option<String>>,

    /// Request timeout, reported when a call times out.
    timeout: Duration,
}

impl WikibaseClient {
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
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            api_url: config.portal_api_url.clone(),
            bot_user: config.bot_user.clone(),
            bot_password: config.bot_password.clone(),
            csrf_token: Mutex::new(None),
            timeout: config.request_timeout,
        })
    }

    /// Fetch a token of the given type from the API.
    async fn fetch_token(&self, token_type: Option<&str>) -> ClientResult<String> {
        let mut params = vec![("action", "query"), ("meta", "tokens"), ("format", "json")];
        if let Some(t) = token_type {
            params.push(("type", t));
        }

        let value: serde_json::Value = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ClientError::transport(e, self.timeout))?
            .json()
            .await?;

        let field = match token_type {
            Some("login") => "logintoken",
            _ => "csrftoken",
        };
        value["query"]["tokens"][field]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ClientError::api_rejected("query", "no-token", "token missing"))
    }

    /// Log in with the bot account and cache a CSRF token.
    async fn login(&self) -> ClientResult<String> {
        let (Some(user), Some(password)) = (&self.bot_user, &self.bot_password) else {
            return Err(ClientError::api_rejected("login", "no-credentials", "bot account not set"));
        };

        let login_token = self.fetch_token(Some("login")).await?;

        let value: serde_json::Value = self
            .client
            .post(&self.api_url)
            .form(&[
                ("action", "login"),
                ("lgname", user.as_str()),
                ("lgpassword", password.as_str()),
                ("lgtoken", login_token.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ClientError::transport(e, self.timeout))?
            .json()
            .await?;

        if value["login"]["result"].as_str() != Some("Success") {
            let reason = value["login"]["reason"].as_str().unwrap_or("login failed");
            return Err(ClientError::api_rejected("login", "failed", reason));
        }

        self.fetch_token(None).await
    }

    /// Get the cached CSRF token, logging in on first use.
    async fn csrf(&self) -> ClientResult<String> {
        let mut guard = self.csrf_token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Map one claim to its Wikibase statement JSON.
    fn statement_json(claim: &Claim, locale: &str) -> serde_json::Value {
        let datavalue = match claim.kind {
            ClaimKind::ExternalId | ClaimKind::Text => json!({
                "value": claim.value,
                "type": "string",
            }),
            ClaimKind::EntityLink => json!({
                "value": {"entity-type": "item", "id": claim.value},
                "type": "wikibase-entityid",
            }),
            ClaimKind::LocalizedText => json!({
                "value": {"text": claim.value, "language": locale},
                "type": "monolingualtext",
            }),
            ClaimKind::Timestamp => json!({
                "value": {
                    "time": claim.value,
                    "timezone": 0,
                    "before": 0,
                    "after": 0,
                    "precision": DAY_PRECISION,
                    "calendarmodel": GREGORIAN,
                },
                "type": "time",
            }),
        };

        json!({
            "mainsnak": {
                "snaktype": "value",
                "property": claim.property.0,
                "datavalue": datavalue,
            },
            "type": "statement",
            "rank": "normal",
        })
    }

    /// Build the `wbeditentity` data payload.
    fn entity_json(label: &str, description: &str, locale: &str, claims: &[Claim]) -> String {
        let statements: Vec<serde_json::Value> =
            claims.iter().map(|c| Self::statement_json(c, locale)).collect();

        json!({
            "labels": {locale: {"language": locale, "value": label}},
            "descriptions": {locale: {"language": locale, "value": description}},
            "claims": statements,
        })
        .to_string()
    }

    /// Raise `ApiRejected` when the API reports an error object.
    fn check_api_error(action: &str, value: &serde_json::Value) -> ClientResult<()> {
        if let Some(error) = value.get("error") {
            return Err(ClientError::api_rejected(
                action,
                error["code"].as_str().unwrap_or("unknown"),
                error["info"].as_str().unwrap_or(""),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EntityStore for WikibaseClient {
    async fn create_entity(
        &self,
        label: &str,
        description: &str,
        locale: &str,
        claims: &[Claim],
    ) -> ClientResult<String> {
        let token = self.csrf().await?;
        let data = Self::entity_json(label, description, locale, claims);

        tracing::info!(label, claims = claims.len(), "creating entity");

        let value: serde_json::Value = self
            .client
            .post(&self.api_url)
            .form(&[
                ("action", "wbeditentity"),
                ("new", "item"),
                ("data", data.as_str()),
                ("token", token.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ClientError::transport(e, self.timeout))?
            .json()
            .await?;

        Self::check_api_error("wbeditentity", &value)?;

        value["entity"]["id"].as_str().map(String::from).ok_or_else(|| {
            ClientError::api_rejected("wbeditentity", "no-id", "response carried no entity id")
        })
    }

    async fn append_page(&self, title: &str, wikitext: &str) -> ClientResult<()> {
        let token = self.csrf().await?;

        // The wiki's math extension renders block math from plain tags.
        let content = wikitext.replace("<math display=\"block\">", "<math>");

        tracing::info!(title, "appending wiki page");

        let value: serde_json::Value = self
            .client
            .post(&self.api_url)
            .form(&[
                ("action", "edit"),
                ("title", title),
                ("appendtext", content.as_str()),
                ("token", token.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ClientError::transport(e, self.timeout))?
            .json()
            .await?;

        Self::check_api_error("edit", &value)
    }
}

impl std::fmt::Debug for WikibaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikibaseClient")
            .field("api_url", &self.api_url)
            .field("has_credentials", &self.bot_user.is_some())
            .finish_non_exhaustive()
    }
}
