//! SPARQL query synthesis.
//!
//! Pure string builders: label, description and identifier values are escaped
//! and interpolated verbatim into fixed templates, never transformed. Both
//! endpoints predefine the standard wikibase prefixes (`wd:`, `wdt:`,
//! `rdfs:`, `schema:`), so the templates carry none.
//!
//! The resolver picks a template by entity *role* (generic, publication,
//! author, journal, language), not by category name: the roles have
//! structurally different matching predicates, the categories do not.

use crate::config::vocab;

/// Reference-graph (Wikidata) predicates used by the role templates.
mod reference_vocab {
    /// DOI.
    pub const DOI: &str = "P356";
    /// ORCID iD.
    pub const ORCID: &str = "P496";
    /// instance of.
    pub const INSTANCE_OF: &str = "P31";
    /// subclass of.
    pub const SUBCLASS_OF: &str = "P279";
    /// scientific journal.
    pub const SCIENTIFIC_JOURNAL: &str = "Q5633421";
    /// language.
    pub const LANGUAGE: &str = "Q34770";
}

/// Escape a string for interpolation into a SPARQL string literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn qid_binding(var: &str) -> String {
    format!("BIND(STRAFTER(STR(?{var}_iri), \"entity/\") AS ?{var})")
}

/// Exact label + description match; the generic role, and the workhorse of
/// target-graph reconciliation.
#[must_use]
pub fn entity_by_label(label: &str, description: &str) -> String {
    format!(
        "SELECT ?qid WHERE {{\n  \
           ?qid_iri rdfs:label \"{label}\"@en ;\n           \
                    schema:description \"{description}\"@en .\n  \
           {bind}\n\
         }}\nLIMIT 1",
        label = escape_literal(label),
        description = escape_literal(description),
        bind = qid_binding("qid"),
    )
}

/// Label-only match, for roles whose description is not fixed by the user
/// (journal and language lookups on the target graph).
#[must_use]
pub fn entity_by_name(label: &str) -> String {
    format!(
        "SELECT ?qid ?description WHERE {{\n  \
           ?qid_iri rdfs:label \"{label}\"@en .\n  \
           OPTIONAL {{ ?qid_iri schema:description ?description .\n             \
                       FILTER(LANG(?description) = \"en\") }}\n  \
           {bind}\n\
         }}\nLIMIT 1",
        label = escape_literal(label),
        bind = qid_binding("qid"),
    )
}

/// Publication on the target graph, matched by DOI.
#[must_use]
pub fn portal_publication_by_doi(doi: &str) -> String {
    publication_by_doi(vocab::DOI.0, doi)
}

/// Publication on the reference graph, matched by DOI.
#[must_use]
pub fn reference_publication_by_doi(doi: &str) -> String {
    publication_by_doi(reference_vocab::DOI, doi)
}

fn publication_by_doi(property: &str, doi: &str) -> String {
    format!(
        "SELECT ?qid ?label ?description WHERE {{\n  \
           ?qid_iri wdt:{property} \"{doi}\" .\n  \
           OPTIONAL {{ ?qid_iri rdfs:label ?label . FILTER(LANG(?label) = \"en\") }}\n  \
           OPTIONAL {{ ?qid_iri schema:description ?description .\n             \
                       FILTER(LANG(?description) = \"en\") }}\n  \
           {bind}\n\
         }}\nLIMIT 1",
        doi = escape_literal(doi),
        bind = qid_binding("qid"),
    )
}

/// Publication matched by exact English title. Same shape on both graphs.
#[must_use]
pub fn publication_by_title(title: &str) -> String {
    format!(
        "SELECT ?qid ?label ?description WHERE {{\n  \
           ?qid_iri rdfs:label \"{title}\"@en .\n  \
           OPTIONAL {{ ?qid_iri schema:description ?description .\n             \
                       FILTER(LANG(?description) = \"en\") }}\n  \
           BIND(\"{title}\" AS ?label)\n  \
           {bind}\n\
         }}\nLIMIT 1",
        title = escape_literal(title),
        bind = qid_binding("qid"),
    )
}

/// Person on the target graph, matched by ORCID.
#[must_use]
pub fn portal_person_by_orcid(orcid: &str) -> String {
    person_by_orcid(vocab::ORCID_ID.0, orcid)
}

/// Person on the reference graph, matched by ORCID.
#[must_use]
pub fn reference_person_by_orcid(orcid: &str) -> String {
    person_by_orcid(reference_vocab::ORCID, orcid)
}

fn person_by_orcid(property: &str, orcid: &str) -> String {
    format!(
        "SELECT ?qid ?label ?description WHERE {{\n  \
           ?qid_iri wdt:{property} \"{orcid}\" .\n  \
           OPTIONAL {{ ?qid_iri rdfs:label ?label . FILTER(LANG(?label) = \"en\") }}\n  \
           OPTIONAL {{ ?qid_iri schema:description ?description .\n             \
                       FILTER(LANG(?description) = \"en\") }}\n  \
           {bind}\n\
         }}\nLIMIT 1",
        orcid = escape_literal(orcid),
        bind = qid_binding("qid"),
    )
}

/// Journal on the reference graph, matched by name within the journal class.
#[must_use]
pub fn reference_journal_by_name(name: &str) -> String {
    reference_instance_by_name(reference_vocab::SCIENTIFIC_JOURNAL, name)
}

/// Language on the reference graph, matched by name within the language class.
#[must_use]
pub fn reference_language_by_name(name: &str) -> String {
    reference_instance_by_name(reference_vocab::LANGUAGE, name)
}

fn reference_instance_by_name(class: &str, name: &str) -> String {
    format!(
        "SELECT ?qid ?label ?description WHERE {{\n  \
           ?qid_iri wdt:{instance}/wdt:{subclass}* wd:{class} ;\n           \
                    rdfs:label \"{name}\"@en .\n  \
           OPTIONAL {{ ?qid_iri schema:description ?description .\n             \
                       FILTER(LANG(?description) = \"en\") }}\n  \
           BIND(\"{name}\" AS ?label)\n  \
           {bind}\n\
         }}\nLIMIT 1",
        instance = reference_vocab::INSTANCE_OF,
        subclass = reference_vocab::SUBCLASS_OF,
        name = escape_literal(name),
        bind = qid_binding("qid"),
    )
}

/// Pre-flight duplicate check: a workflow entity with this exact title and
/// research objective.
#[must_use]
pub fn duplicate_workflow(title: &str, objective: &str) -> String {
    entity_by_label(title, objective)
}

/// Filters for the workflow search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Research-objective keywords; each must occur in the workflow's
    /// description (case-insensitive).
    pub objective_terms: Vec<String>,
    /// Discipline item ids the workflow must be linked to.
    pub disciplines: Vec<String>,
    /// Model/method/software/data-set item ids the workflow must use.
    pub entities: Vec<String>,
}

impl SearchFilters {
    /// True when no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objective_terms.is_empty() && self.disciplines.is_empty() && self.entities.is_empty()
    }
}

/// Search for workflow entities on the target graph matching all filters.
#[must_use]
pub fn workflow_search(filters: &SearchFilters) -> String {
    let mut query = format!(
        "SELECT ?label ?qid WHERE {{\n  \
           ?qid_iri wdt:{instance} wd:{class} ;\n           \
                    rdfs:label ?label .\n",
        instance = vocab::INSTANCE_OF.0,
        class = vocab::RESEARCH_WORKFLOW.0,
    );
    for discipline in &filters.disciplines {
        query.push_str(&format!(
            "  ?qid_iri wdt:{field} wd:{discipline} .\n",
            field = vocab::FIELD_OF_WORK.0,
            discipline = escape_literal(discipline),
        ));
    }
    for entity in &filters.entities {
        query.push_str(&format!(
            "  ?qid_iri wdt:{uses} wd:{entity} .\n",
            uses = vocab::USES.0,
            entity = escape_literal(entity),
        ));
    }
    if !filters.objective_terms.is_empty() {
        query.push_str("  ?qid_iri schema:description ?objective .\n");
        for term in &filters.objective_terms {
            query.push_str(&format!(
                "  FILTER(CONTAINS(LCASE(?objective), \"{term}\"))\n",
                term = escape_literal(&term.to_lowercase()),
            ));
        }
    }
    query.push_str(&format!("  {}\n}}", qid_binding("qid")));
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"a "quoted" label"#), r#"a \"quoted\" label"#);
        assert_eq!(escape_literal(r"back\slash"), r"back\\slash");
        assert_eq!(escape_literal("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_entity_by_label_interpolates_verbatim() {
        let q = entity_by_label("Navier-Stokes equations", "set of equations");
        assert!(q.contains("\"Navier-Stokes equations\"@en"));
        assert!(q.contains("\"set of equations\"@en"));
        assert!(q.contains("LIMIT 1"));
    }

    #[test]
    fn test_publication_by_doi_uses_role_predicate() {
        assert!(portal_publication_by_doi("10.1000/X").contains("wdt:P16 \"10.1000/X\""));
        assert!(reference_publication_by_doi("10.1000/X").contains("wdt:P356 \"10.1000/X\""));
    }

    #[test]
    fn test_person_by_orcid_uses_role_predicate() {
        assert!(portal_person_by_orcid("0000-0001-2345-6789").contains("wdt:P22"));
        assert!(reference_person_by_orcid("0000-0001-2345-6789").contains("wdt:P496"));
    }

    #[test]
    fn test_reference_class_filters() {
        assert!(reference_journal_by_name("Numerische Mathematik").contains("wd:Q5633421"));
        assert!(reference_language_by_name("English").contains("wd:Q34770"));
    }

    #[test]
    fn test_workflow_search_composes_filters() {
        let filters = SearchFilters {
            objective_terms: vec!["Simulation".to_string()],
            disciplines: vec!["Q11".to_string()],
            entities: vec!["Q33".to_string(), "Q44".to_string()],
        };
        let q = workflow_search(&filters);
        assert!(q.contains("wdt:P4 wd:Q2"));
        assert!(q.contains("wdt:P5 wd:Q11"));
        assert!(q.contains("wdt:P6 wd:Q33"));
        assert!(q.contains("wdt:P6 wd:Q44"));
        assert!(q.contains("CONTAINS(LCASE(?objective), \"simulation\")"));
    }

    #[test]
    fn test_workflow_search_without_objective_has_no_description_clause() {
        let filters = SearchFilters {
            disciplines: vec!["Q11".to_string()],
            ..SearchFilters::default()
        };
        let q = workflow_search(&filters);
        assert!(!q.contains("schema:description"));
    }
}
