//! Property tests for the tagged reference-string parser.

use proptest::prelude::*;

use workflow_kg_publisher::models::{EntityReference, Origin};

proptest! {
    /// Parsing never panics and always upholds the origin/id invariant.
    #[test]
    fn parse_upholds_invariant(raw in ".{0,64}") {
        let reference = EntityReference::parse(&raw);
        match reference.origin() {
            Origin::None => prop_assert!(reference.id().is_none()),
            Origin::Target | Origin::Reference => {
                let id = reference.id().expect("id present for tagged origins");
                prop_assert!(!id.is_empty());
            }
        }
    }

    /// Well-formed portal references survive a parse/format round trip.
    #[test]
    fn portal_reference_round_trips(n in 1u32..10_000_000) {
        let raw = format!("portal:Q{n}");
        let reference = EntityReference::parse(&raw);
        prop_assert_eq!(reference.origin(), Origin::Target);
        prop_assert_eq!(reference.to_string(), raw);
    }

    /// Well-formed reference-graph references survive a round trip.
    #[test]
    fn wikidata_reference_round_trips(n in 1u32..10_000_000) {
        let raw = format!("wikidata:Q{n}");
        let reference = EntityReference::parse(&raw);
        prop_assert_eq!(reference.origin(), Origin::Reference);
        prop_assert_eq!(reference.to_string(), raw);
    }
}
