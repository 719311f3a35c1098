//! End-to-end run through the real HTTP clients against a mock server:
//! pre-flight query, reference-graph stub creation (token dance included),
//! workflow root creation and the page append.

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workflow_kg_publisher::client::{CrossrefClient, Services, SparqlClient, WikibaseClient};
use workflow_kg_publisher::models::{AnswerMap, keys};
use workflow_kg_publisher::render::PlainRenderer;
use workflow_kg_publisher::{Config, WorkflowAssembler};

fn entity_created(id: &str) -> serde_json::Value {
    serde_json::json!({"success": 1, "entity": {"id": id}})
}

async fn mount_common(server: &MockServer) {
    // Every SPARQL lookup misses.
    Mock::given(method("GET"))
        .and(path("/portal/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"bindings": []}
        })))
        .mount(server)
        .await;

    // Login-token / login / CSRF-token dance.
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("type", "login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"tokens": {"logintoken": "LT"}}
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
            "query": {"tokens": {"csrftoken": "CT"}}
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=edit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "edit": {"result": "Success"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_publishing_run_over_http() {
    let server = MockServer::start().await;
    mount_common(&server).await;

    // First create is the discipline stub, second the workflow root.
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=wbeditentity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entity_created("Q700")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=wbeditentity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entity_created("Q701")))
        .mount(&server)
        .await;

    let config = Config::for_testing(&server.uri());
    let services = Services::new(
        Arc::new(SparqlClient::new(&config).unwrap()),
        Arc::new(WikibaseClient::new(&config).unwrap()),
        Arc::new(CrossrefClient::new(&config).unwrap()),
    );
    let assembler = WorkflowAssembler::new(services, &config);

    let mut answers = AnswerMap::new();
    answers.insert(keys::OPERATION, "Workflow documentation");
    answers.insert(keys::WORKFLOW_KIND, "Mathematical");
    answers.insert(keys::EXPORT_TARGET, "Portal");
    answers.insert(keys::PORTAL_PUBLISH, "Yes");
    answers.insert(keys::TITLE, "Heat flow study");
    answers.insert(keys::OBJECTIVE, "Quantify heat flow in a rod");
    answers.insert(keys::PUBLICATION, "No");
    answers.insert(keys::MODEL_ENTITY, "portal:Q10 <|> heat model <|> PDE model");
    answers.insert(keys::DISCIPLINES, "wikidata:Q42 <|> Topology <|> field of mathematics");

    let outcome = assembler.run(answers, &PlainRenderer).await.unwrap();

    assert_eq!(outcome.workflow_id.as_deref(), Some("Q701"));
    assert_eq!(outcome.context.disciplines, vec!["Q700"]);
    assert!(outcome.context.answers.get(keys::DISCIPLINES).unwrap().contains("portal:Q700"));
    assert!(outcome.document.contains("portal:Q10"));
}
