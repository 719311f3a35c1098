//! Entity references, candidates and claims.
//!
//! User answers encode entity references as tagged strings (`portal:Q1`,
//! `wikidata:Q42`, or empty for brand-new entities). Parsing happens exactly
//! once, at decomposition time; downstream code only ever sees the typed
//! [`EntityReference`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Reference-string prefix for entities already on the portal.
pub const PORTAL_PREFIX: &str = "portal";

/// Reference-string prefix for entities known only to the reference graph.
pub const WIKIDATA_PREFIX: &str = "wikidata";

/// Sentinel identifier for entities whose portal id is deferred because the
/// run does not persist. Rendering must still succeed with this placeholder.
pub const TBD: &str = "tbd";

/// A property of the portal's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyId(pub &'static str);

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// An item class of the portal's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemId(pub &'static str);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<ItemId> for String {
    fn from(item: ItemId) -> Self {
        item.0.to_string()
    }
}

/// Where an entity already lives, if anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Nowhere known: the entity has to be found by query or created.
    #[default]
    None,
    /// Already on the target portal.
    Target,
    /// Known only to the reference graph (Wikidata).
    Reference,
}

/// A parsed entity reference.
///
/// Invariant, enforced by construction: `origin == None` never carries an id,
/// any other origin always does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityReference {
    origin: Origin,
    id: Option<String>,
}

impl EntityReference {
    /// An empty reference (`origin == None`).
    #[must_use]
    pub const fn none() -> Self {
        Self { origin: Origin::None, id: None }
    }

    /// A reference to an entity already on the portal.
    #[must_use]
    pub fn target(id: impl Into<String>) -> Self {
        Self { origin: Origin::Target, id: Some(id.into()) }
    }

    /// A reference to an entity on the reference graph.
    #[must_use]
    pub fn reference(id: impl Into<String>) -> Self {
        Self { origin: Origin::Reference, id: Some(id.into()) }
    }

    /// Parse a tagged reference string.
    ///
    /// Empty input and unknown prefixes both parse to `origin == None`; an
    /// unknown prefix means the answer was free text, not a reference.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((PORTAL_PREFIX, id)) if !id.trim().is_empty() => Self::target(id.trim()),
            Some((WIKIDATA_PREFIX, id)) if !id.trim().is_empty() => Self::reference(id.trim()),
            _ => Self::none(),
        }
    }

    /// The origin of this reference.
    #[must_use]
    pub const fn origin(&self) -> Origin {
        self.origin
    }

    /// The referenced identifier, absent iff `origin == None`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl std::fmt::Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.origin, self.id.as_deref()) {
            (Origin::Target, Some(id)) => write!(f, "{PORTAL_PREFIX}:{id}"),
            (Origin::Reference, Some(id)) => write!(f, "{WIKIDATA_PREFIX}:{id}"),
            _ => Ok(()),
        }
    }
}

/// The decomposed, not-yet-resolved representation of one entity the user
/// described.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCandidate {
    /// Display label.
    pub label: String,
    /// Short description, used together with the label for exact matching.
    pub description: String,
    /// Where the user said this entity already lives.
    pub reference: EntityReference,
    /// Category-specific raw fields (external id string, formulas).
    pub extra: BTreeMap<String, String>,
}

impl EntityCandidate {
    /// Candidate with label and description only.
    #[must_use]
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            reference: EntityReference::none(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach a reference.
    #[must_use]
    pub fn with_reference(mut self, reference: EntityReference) -> Self {
        self.reference = reference;
        self
    }

    /// Attach an extra field. Empty values are not stored.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    /// Look up an extra field.
    #[must_use]
    pub fn extra(&self, key: &str) -> &str {
        self.extra.get(key).map_or("", String::as_str)
    }

    /// True when label and description are both usable for matching or
    /// creating an entity.
    #[must_use]
    pub fn has_display_pair(&self) -> bool {
        !self.label.is_empty() && !self.description.is_empty()
    }
}

/// Outcome of resolving one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Portal identifier, absent when the caller must create the entity.
    pub id: Option<String>,
    /// True when a usable identifier was obtained.
    pub exists: bool,
    /// Label/description pair to surface back into the answers, when known.
    pub display: Option<(String, String)>,
}

impl ResolvedEntity {
    /// A usable identifier with no display update.
    #[must_use]
    pub fn found(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), exists: true, display: None }
    }

    /// A usable identifier plus the label/description it was matched under.
    #[must_use]
    pub fn found_with(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            exists: true,
            display: Some((label.into(), description.into())),
        }
    }

    /// The to-be-determined sentinel for non-persisting runs.
    #[must_use]
    pub fn pending() -> Self {
        Self { id: Some(TBD.to_string()), exists: true, display: None }
    }

    /// Nothing found: the caller must create the entity itself.
    #[must_use]
    pub const fn absent() -> Self {
        Self { id: None, exists: false, display: None }
    }

    /// True for the to-be-determined sentinel.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.id.as_deref() == Some(TBD)
    }

    /// The identifier, if resolution produced one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// The kind of value a claim carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// Identifier in an external registry (DOI, ORCID, Wikidata QID).
    ExternalId,
    /// Link to another entity on the portal.
    EntityLink,
    /// Plain string literal.
    Text,
    /// String literal tagged with the run's locale.
    LocalizedText,
    /// Point in time; date-only values get a fixed midnight-UTC time-of-day.
    Timestamp,
}

/// One typed fact attached to an entity at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Value kind.
    pub kind: ClaimKind,
    /// Raw value; empty values are dropped by the writer.
    pub value: String,
    /// Target property.
    pub property: PropertyId,
}

impl Claim {
    /// External-identifier claim.
    #[must_use]
    pub fn external_id(value: impl Into<String>, property: PropertyId) -> Self {
        Self { kind: ClaimKind::ExternalId, value: value.into(), property }
    }

    /// Entity-link claim.
    #[must_use]
    pub fn link(target: impl Into<String>, property: PropertyId) -> Self {
        Self { kind: ClaimKind::EntityLink, value: target.into(), property }
    }

    /// Plain text claim.
    #[must_use]
    pub fn text(value: impl Into<String>, property: PropertyId) -> Self {
        Self { kind: ClaimKind::Text, value: value.into(), property }
    }

    /// Locale-tagged text claim.
    #[must_use]
    pub fn localized(value: impl Into<String>, property: PropertyId) -> Self {
        Self { kind: ClaimKind::LocalizedText, value: value.into(), property }
    }

    /// Timestamp claim.
    #[must_use]
    pub fn timestamp(value: impl Into<String>, property: PropertyId) -> Self {
        Self { kind: ClaimKind::Timestamp, value: value.into(), property }
    }

    /// True when the value is absent and the claim must not be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_portal_reference() {
        let r = EntityReference::parse("portal:Q123");
        assert_eq!(r.origin(), Origin::Target);
        assert_eq!(r.id(), Some("Q123"));
        assert_eq!(r.to_string(), "portal:Q123");
    }

    #[test]
    fn test_parse_wikidata_reference() {
        let r = EntityReference::parse("wikidata:Q42");
        assert_eq!(r.origin(), Origin::Reference);
        assert_eq!(r.id(), Some("Q42"));
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert_eq!(EntityReference::parse("").origin(), Origin::None);
        assert_eq!(EntityReference::parse("   ").origin(), Origin::None);
        // Free text with a colon is not a reference
        assert_eq!(EntityReference::parse("note: something").origin(), Origin::None);
        // Prefix without an id is not a reference either
        assert_eq!(EntityReference::parse("portal:").origin(), Origin::None);
        assert_eq!(EntityReference::parse("").id(), None);
    }

    #[test]
    fn test_candidate_display_pair() {
        assert!(EntityCandidate::new("Topology", "field of mathematics").has_display_pair());
        assert!(!EntityCandidate::new("", "field of mathematics").has_display_pair());
        assert!(!EntityCandidate::new("Topology", "").has_display_pair());
    }

    #[test]
    fn test_resolved_entity_states() {
        let found = ResolvedEntity::found("Q9");
        assert!(found.exists);
        assert!(!found.is_pending());

        let pending = ResolvedEntity::pending();
        assert!(pending.exists);
        assert!(pending.is_pending());
        assert_eq!(pending.id(), Some(TBD));

        let absent = ResolvedEntity::absent();
        assert!(!absent.exists);
        assert_eq!(absent.id(), None);
    }

    #[test]
    fn test_empty_claim_detection() {
        assert!(Claim::text("", PropertyId("P13")).is_empty());
        assert!(Claim::text("  ", PropertyId("P13")).is_empty());
        assert!(!Claim::text("12", PropertyId("P13")).is_empty());
    }
}
