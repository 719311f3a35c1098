//! Entity writer.
//!
//! Thin layer between claim construction and the entity store: drops claims
//! with empty values (absent data must never be written as an empty claim),
//! normalises timestamp values, and maps store failures to the terminal
//! run-level error. One network write per call, never retried here.

use std::sync::Arc;

use crate::client::EntityStore;
use crate::error::{ExportError, ExportResult};
use crate::models::{Claim, ClaimKind};

/// Writes new entities to the portal.
#[derive(Clone)]
pub struct EntityWriter {
    store: Arc<dyn EntityStore>,
    locale: String,
}

impl EntityWriter {
    /// Create a writer over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, locale: impl Into<String>) -> Self {
        Self { store, locale: locale.into() }
    }

    /// The locale used for labels, descriptions and localized text.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Create one entity and return its new identifier.
    ///
    /// # Errors
    ///
    /// Any transport or validation error from the store is fatal to the run.
    pub async fn create(
        &self,
        label: &str,
        description: &str,
        claims: Vec<Claim>,
    ) -> ExportResult<String> {
        let claims: Vec<Claim> = claims
            .into_iter()
            .filter(|claim| !claim.is_empty())
            .map(normalize)
            .collect();

        tracing::debug!(label, claims = claims.len(), "writing entity");

        self.store
            .create_entity(label, description, &self.locale, &claims)
            .await
            .map_err(ExportError::EntityStoreFailure)
    }

    /// Append rendered wikitext to the portal page with the given title.
    pub async fn append_page(&self, title: &str, wikitext: &str) -> ExportResult<()> {
        self.store.append_page(title, wikitext).await.map_err(ExportError::EntityStoreFailure)
    }
}

impl std::fmt::Debug for EntityWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityWriter").field("locale", &self.locale).finish_non_exhaustive()
    }
}

fn normalize(claim: Claim) -> Claim {
    match claim.kind {
        ClaimKind::Timestamp => {
            Claim { value: normalize_timestamp(&claim.value), ..claim }
        }
        _ => claim,
    }
}

/// Bring a timestamp into the store's precision-qualified form.
///
/// A bare date gets the fixed midnight-UTC time-of-day; values that already
/// carry a time-of-day only get the leading sign.
fn normalize_timestamp(value: &str) -> String {
    let value = value.trim();
    if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return format!("+{value}T00:00:00Z");
    }
    if value.starts_with('+') {
        return value.to_string();
    }
    format!("+{value}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::vocab;
    use crate::error::{ClientError, ClientResult};

    /// Store double recording every create call.
    #[derive(Default)]
    struct RecordingStore {
        created: Mutex<Vec<(String, String, Vec<Claim>)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl EntityStore for RecordingStore {
        async fn create_entity(
            &self,
            label: &str,
            description: &str,
            _locale: &str,
            claims: &[Claim],
        ) -> ClientResult<String> {
            if self.fail {
                return Err(ClientError::api_rejected("wbeditentity", "failed-save", "nope"));
            }
            let mut created = self.created.lock().unwrap();
            created.push((label.to_string(), description.to_string(), claims.to_vec()));
            Ok(format!("Q{}", 100 + created.len()))
        }

        async fn append_page(&self, _title: &str, _wikitext: &str) -> ClientResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_empty_claims_are_suppressed() {
        let store = Arc::new(RecordingStore::default());
        let writer = EntityWriter::new(store.clone(), "en");

        let id = writer
            .create(
                "solverlib",
                "PDE solver",
                vec![
                    Claim::link(vocab::SOFTWARE, vocab::INSTANCE_OF),
                    Claim::text("", vocab::VOLUME),
                    Claim::external_id("  ", vocab::DOI),
                ],
            )
            .await
            .unwrap();

        assert_eq!(id, "Q101");
        let created = store.created.lock().unwrap();
        assert_eq!(created[0].2.len(), 1);
        assert_eq!(created[0].2[0].property, vocab::INSTANCE_OF);
    }

    #[tokio::test]
    async fn test_timestamp_normalization() {
        let store = Arc::new(RecordingStore::default());
        let writer = EntityWriter::new(store.clone(), "en");

        writer
            .create(
                "paper",
                "publication",
                vec![Claim::timestamp("2021-03-01", vocab::PUBLICATION_DATE)],
            )
            .await
            .unwrap();

        let created = store.created.lock().unwrap();
        assert_eq!(created[0].2[0].value, "+2021-03-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_store_failure_is_terminal() {
        let store = Arc::new(RecordingStore { fail: true, ..RecordingStore::default() });
        let writer = EntityWriter::new(store, "en");

        let err = writer.create("x", "y", vec![]).await.unwrap_err();
        assert!(matches!(err, ExportError::EntityStoreFailure(_)));
    }

    #[test]
    fn test_normalize_timestamp_forms() {
        assert_eq!(normalize_timestamp("2021-03-01"), "+2021-03-01T00:00:00Z");
        assert_eq!(normalize_timestamp("+2021-03-01T00:00:00Z"), "+2021-03-01T00:00:00Z");
        assert_eq!(normalize_timestamp("2021-03-01T12:30:00Z"), "+2021-03-01T12:30:00Z");
    }
}
