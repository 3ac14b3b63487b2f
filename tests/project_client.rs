use interview_eval::auth::StaticTokenCredential;
use interview_eval::project::{
    AgentDefinition, ConversationItem, DEFAULT_API_VERSION, Error, FilePurpose, InputItem,
    ProjectApi, ProjectClient, ResponseRequest, ResponseStatus, Tool,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{
    body_json, body_partial_json, body_string_contains, header, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_PATH: &str = "/api/projects/hr";

fn test_client(server: &MockServer) -> ProjectClient {
    ProjectClient::new(
        &format!("{}{PROJECT_PATH}/", server.uri()),
        DEFAULT_API_VERSION,
        Arc::new(StaticTokenCredential::new("test-token")),
    )
    .unwrap()
}

#[tokio::test]
async fn upload_file_sends_multipart_with_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/files")))
        .and(query_param("api-version", DEFAULT_API_VERSION))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("assistants"))
        .and(body_string_contains("Tell me about ownership"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-abc",
            "object": "file",
            "bytes": 23,
            "created_at": 1_700_000_000,
            "filename": "interview-transcript.txt",
            "purpose": "assistants"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let file = client
        .upload_file(
            "interview-transcript.txt",
            b"Tell me about ownership".to_vec(),
            FilePurpose::Assistants,
        )
        .await
        .unwrap();
    assert_eq!(file.id, "file-abc");
    assert_eq!(file.filename, "interview-transcript.txt");
    assert_eq!(file.bytes, Some(23));
}

#[tokio::test]
async fn create_agent_version_posts_definition() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "{PROJECT_PATH}/agents/interview-evaluator-agent/versions"
        )))
        .and(query_param("api-version", DEFAULT_API_VERSION))
        .and(body_json(json!({
            "definition": {
                "kind": "prompt",
                "model": "gpt-4.1",
                "instructions": "Evaluate.",
                "tools": [{
                    "type": "code_interpreter",
                    "container": {"type": "auto", "file_ids": ["file-abc"]}
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "agent.version",
            "id": "interview-evaluator-agent:3",
            "name": "interview-evaluator-agent",
            "version": "3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let definition = AgentDefinition {
        model: "gpt-4.1".into(),
        instructions: "Evaluate.".into(),
        tools: vec![Tool::code_interpreter(vec!["file-abc".into()])],
    };
    let agent = client
        .create_agent_version("interview-evaluator-agent", &definition)
        .await
        .unwrap();
    assert_eq!(agent.name, "interview-evaluator-agent");
    assert_eq!(agent.version, "3");
}

#[tokio::test]
async fn conversation_and_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "conv_1",
            "object": "conversation",
            "created_at": 1_700_000_000,
            "metadata": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations/conv_1/items")))
        .and(body_json(json!({
            "items": [{"type": "message", "role": "user", "content": "Is the candidate fit?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "type": "message", "id": "msg_1", "role": "user", "status": "completed",
                "content": [{"type": "input_text", "text": "Is the candidate fit?"}]
            }],
            "first_id": "msg_1",
            "last_id": "msg_1",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let conversation = client.create_conversation().await.unwrap();
    assert_eq!(conversation.id, "conv_1");

    let stored = client
        .create_conversation_items(&conversation.id, &[InputItem::user("Is the candidate fit?")])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert!(matches!(&stored[0], ConversationItem::Message(m) if m.role == "user"));
}

#[tokio::test]
async fn create_response_references_agent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/responses")))
        .and(body_partial_json(json!({
            "conversation": "conv_1",
            "input": "",
            "agent": {"name": "interview-evaluator-agent", "type": "agent_reference"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "object": "response",
            "status": "completed",
            "error": null,
            "output": [
                {"type": "code_interpreter_call", "id": "ci_1", "status": "completed"},
                {"type": "message", "id": "msg_2", "role": "assistant", "content": [
                    {"type": "output_text", "text": "FIT: strong Rust skills.", "annotations": []}
                ]}
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let response = client
        .create_response(&ResponseRequest::for_agent(
            "conv_1",
            "interview-evaluator-agent",
        ))
        .await
        .unwrap();
    assert_eq!(response.status, ResponseStatus::Completed);
    assert_eq!(response.output_text(), "FIT: strong Rust skills.");
}

#[tokio::test]
async fn list_items_follows_pages_in_order() {
    let server = MockServer::start().await;
    let items_path = format!("{PROJECT_PATH}/openai/conversations/conv_1/items");

    Mock::given(method("GET"))
        .and(path(items_path.clone()))
        .and(query_param("order", "asc"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"type": "message", "id": "m1", "role": "user",
                 "content": [{"type": "input_text", "text": "one"}]},
                {"type": "code_interpreter_call", "id": "ci1"}
            ],
            "first_id": "m1",
            "last_id": "ci1",
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(items_path))
        .and(query_param("after", "ci1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"type": "message", "id": "m2", "role": "assistant",
                 "content": [{"type": "output_text", "text": "two"}]}
            ],
            "first_id": "m2",
            "last_id": "m2",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = client.list_conversation_items("conv_1").await.unwrap();

    let texts: Vec<Option<&str>> = items
        .iter()
        .map(|item| match item {
            ConversationItem::Message(m) => m.first_text(),
            ConversationItem::Other => None,
        })
        .collect();
    assert_eq!(texts, vec![Some("one"), None, Some("two")]);
}

#[tokio::test]
async fn http_error_is_condensed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "PermissionDenied", "message": "Principal lacks access"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.create_conversation().await.unwrap_err();
    assert!(matches!(err, Error::Api(_)));
    assert_eq!(
        err.to_string(),
        "API error: HTTP 403 Forbidden: Principal lacks access (code: PermissionDenied)"
    );
}

#[tokio::test]
async fn rate_limit_is_reported_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/responses")))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .create_response(&ResponseRequest::for_agent("conv_1", "agent"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after: Some(12) }));
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.create_conversation().await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse response"));
}

#[tokio::test]
async fn list_items_rejects_repeated_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations/conv_1/items")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"type": "message", "id": "m1", "role": "user",
                      "content": [{"type": "input_text", "text": "one"}]}],
            "last_id": "m1",
            "has_more": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client.list_conversation_items("conv_1"),
    )
    .await
    .expect("paging should stop")
    .unwrap_err();
    assert!(matches!(err, Error::Api(_)));
    assert!(err.to_string().contains("did not advance past m1"));
}

#[tokio::test]
async fn list_items_rejects_more_without_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PROJECT_PATH}/openai/conversations/conv_1/items")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [],
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.list_conversation_items("conv_1").await.unwrap_err();
    assert!(err.to_string().contains("without a cursor"));
}
