//! HTTP-level client tests against a wiremock server: SPARQL select,
//! the Wikibase write path (token dance included) and citation lookup.

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workflow_kg_publisher::client::{
    CitationLookup, CrossrefClient, Endpoint, EntityStore, QueryExecutor, SparqlClient,
    WikibaseClient,
};
use workflow_kg_publisher::config::vocab;
use workflow_kg_publisher::error::ClientError;
use workflow_kg_publisher::models::Claim;
use workflow_kg_publisher::Config;

fn sparql_result(bindings: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"results": {"bindings": bindings}})
}

// =============================================================================
// SparqlClient
// =============================================================================

#[tokio::test]
async fn test_select_routes_to_portal_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/portal/sparql"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sparql_result(serde_json::json!([
            {"qid": {"type": "literal", "value": "Q12"}}
        ]))))
        .mount(&server)
        .await;

    let client = SparqlClient::new(&Config::for_testing(&server.uri())).unwrap();
    let rows = client.select(Endpoint::Portal, "SELECT ?qid WHERE {}").await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["qid"], "Q12");
}

#[tokio::test]
async fn test_select_routes_to_reference_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wikidata/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sparql_result(serde_json::json!([
            {"qid": {"type": "literal", "value": "Q42"},
             "label": {"xml:lang": "en", "type": "literal", "value": "Topology"}}
        ]))))
        .mount(&server)
        .await;

    let client = SparqlClient::new(&Config::for_testing(&server.uri())).unwrap();
    let rows = client.select(Endpoint::Reference, "SELECT ?qid ?label WHERE {}").await.unwrap();

    assert_eq!(rows[0]["label"], "Topology");
}

#[tokio::test]
async fn test_select_empty_bindings_mean_no_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/portal/sparql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sparql_result(serde_json::json!([]))),
        )
        .mount(&server)
        .await;

    let client = SparqlClient::new(&Config::for_testing(&server.uri())).unwrap();
    let rows = client.select(Endpoint::Portal, "SELECT ?qid WHERE {}").await.unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_select_bad_request_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/portal/sparql"))
        .respond_with(ResponseTemplate::new(400).set_body_string("malformed query"))
        .mount(&server)
        .await;

    let client = SparqlClient::new(&Config::for_testing(&server.uri())).unwrap();
    let err = client.select(Endpoint::Portal, "garbage").await.unwrap_err();

    assert!(matches!(err, ClientError::BadRequest { .. }));
}

#[tokio::test]
async fn test_select_against_missing_endpoint_is_not_found() {
    // Nothing mounted: the server answers 404 for every request.
    let server = MockServer::start().await;

    let client = SparqlClient::new(&Config::for_testing(&server.uri())).unwrap();
    let err = client.select(Endpoint::Portal, "SELECT ?qid WHERE {}").await.unwrap_err();

    match err {
        ClientError::NotFound { resource } => assert!(resource.contains("/portal/sparql")),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// WikibaseClient
// =============================================================================

async fn mount_token_dance(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("type", "login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"tokens": {"logintoken": "LT+\\"}}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "login": {"result": "Success"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"tokens": {"csrftoken": "CT+\\"}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_entity_returns_new_id() {
    let server = MockServer::start().await;
    mount_token_dance(&server).await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=wbeditentity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": 1,
            "entity": {"id": "Q123"}
        })))
        .mount(&server)
        .await;

    let client = WikibaseClient::new(&Config::for_testing(&server.uri())).unwrap();
    let id = client
        .create_entity(
            "Topology",
            "field of mathematics",
            "en",
            &[Claim::external_id("Q42", vocab::WIKIDATA_QID)],
        )
        .await
        .unwrap();

    assert_eq!(id, "Q123");
}

#[tokio::test]
async fn test_create_entity_surfaces_api_rejection() {
    let server = MockServer::start().await;
    mount_token_dance(&server).await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=wbeditentity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": {"code": "failed-save", "info": "label too long"}
        })))
        .mount(&server)
        .await;

    let client = WikibaseClient::new(&Config::for_testing(&server.uri())).unwrap();
    let err = client.create_entity("x", "y", "en", &[]).await.unwrap_err();

    match err {
        ClientError::ApiRejected { code, .. } => assert_eq!(code, "failed-save"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_failure_surfaces_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"tokens": {"logintoken": "LT"}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "login": {"result": "Failed", "reason": "wrong password"}
        })))
        .mount(&server)
        .await;

    let client = WikibaseClient::new(&Config::for_testing(&server.uri())).unwrap();
    let err = client.create_entity("x", "y", "en", &[]).await.unwrap_err();

    match err {
        ClientError::ApiRejected { action, info, .. } => {
            assert_eq!(action, "login");
            assert_eq!(info, "wrong password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_append_page_succeeds() {
    let server = MockServer::start().await;
    mount_token_dance(&server).await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=edit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "edit": {"result": "Success"}
        })))
        .mount(&server)
        .await;

    let client = WikibaseClient::new(&Config::for_testing(&server.uri())).unwrap();
    client.append_page("Heat flow study", "== Workflow ==").await.unwrap();
}

// =============================================================================
// CrossrefClient
// =============================================================================

#[tokio::test]
async fn test_citation_lookup_parses_crossref_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/works/10.1000/heat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "message": {
                "title": ["A study of heat flow"],
                "container-title": ["Journal of Thermal Things"],
                "language": "en",
                "volume": "12",
                "issue": "3",
                "page": "100-120",
                "type": "journal-article",
                "issued": {"date-parts": [[2021, 3, 1]]},
                "author": [
                    {"given": "Ada", "family": "Lovelace",
                     "ORCID": "https://orcid.org/0000-0001-2345-6789"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = CrossrefClient::new(&Config::for_testing(&server.uri())).unwrap();
    let citation = client.by_doi("10.1000/heat").await.unwrap().unwrap();

    assert_eq!(citation.title, "A study of heat flow");
    assert_eq!(citation.published, "2021-03-01");
    assert!(citation.is_article());
    assert_eq!(citation.contributors[0].orcid.as_deref(), Some("0000-0001-2345-6789"));
}

#[tokio::test]
async fn test_citation_lookup_not_found_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Resource not found."))
        .mount(&server)
        .await;

    let client = CrossrefClient::new(&Config::for_testing(&server.uri())).unwrap();
    assert!(client.by_doi("10.9999/missing").await.unwrap().is_none());
}
