//! Project service client.

use super::error::Error;
use super::http::HttpClient;
use super::types::{
    AgentDefinition, AgentVersion, Conversation, ConversationItem, CreateAgentVersionRequest,
    CreateItemsRequest, FileObject, FilePurpose, InputItem, ItemPage, Response, ResponseRequest,
};
use crate::auth::TokenCredential;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::collections::HashSet;
use std::sync::Arc;

/// API version sent with every request.
pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";
/// Page size when listing conversation items.
const ITEM_PAGE_LIMIT: &str = "100";

/// Remote operations the evaluation consumes.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Upload file contents and return the stored file.
    async fn upload_file(
        &self,
        filename: &str,
        contents: Vec<u8>,
        purpose: FilePurpose,
    ) -> Result<FileObject, Error>;

    /// Register a new version of the named agent.
    async fn create_agent_version(
        &self,
        agent_name: &str,
        definition: &AgentDefinition,
    ) -> Result<AgentVersion, Error>;

    /// Create an empty conversation.
    async fn create_conversation(&self) -> Result<Conversation, Error>;

    /// Append items to a conversation, returning them as stored.
    async fn create_conversation_items(
        &self,
        conversation_id: &str,
        items: &[InputItem],
    ) -> Result<Vec<ConversationItem>, Error>;

    /// Generate a model response.
    async fn create_response(&self, request: &ResponseRequest) -> Result<Response, Error>;

    /// All items of a conversation, oldest first.
    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationItem>, Error>;
}

/// HTTP client for one project endpoint.
///
/// The credential and connection pool are owned here and released on drop.
#[derive(Debug)]
pub struct ProjectClient {
    http: HttpClient,
}

impl ProjectClient {
    /// Create a client for `endpoint`, e.g.
    /// `https://<resource>.services.ai.azure.com/api/projects/<project>`.
    pub fn new(
        endpoint: &str,
        api_version: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, Error> {
        let base_url = normalize_endpoint(endpoint)?;
        Ok(Self {
            http: HttpClient::new(base_url, api_version, credential),
        })
    }

    pub fn endpoint(&self) -> &str {
        self.http.base_url()
    }
}

/// Validate an endpoint URL and strip trailing slashes.
fn normalize_endpoint(endpoint: &str) -> Result<String, Error> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let parsed = url::Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "https" | "http" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }

    Ok(endpoint.trim().trim_end_matches('/').to_string())
}

fn conversation_items_path(conversation_id: &str) -> String {
    format!(
        "/openai/conversations/{}/items",
        urlencoding::encode(conversation_id)
    )
}

#[async_trait]
impl ProjectApi for ProjectClient {
    async fn upload_file(
        &self,
        filename: &str,
        contents: Vec<u8>,
        purpose: FilePurpose,
    ) -> Result<FileObject, Error> {
        tracing::debug!(filename, bytes = contents.len(), "Uploading file");
        let part = Part::bytes(contents).file_name(filename.to_string());
        let form = Form::new().text("purpose", purpose.as_str()).part("file", part);

        let file: FileObject = self.http.post_multipart("/openai/files", form).await?;
        tracing::debug!(file_id = %file.id, "File uploaded");
        Ok(file)
    }

    async fn create_agent_version(
        &self,
        agent_name: &str,
        definition: &AgentDefinition,
    ) -> Result<AgentVersion, Error> {
        tracing::debug!(agent_name, model = %definition.model, "Creating agent version");
        let path = format!("/agents/{}/versions", urlencoding::encode(agent_name));
        let agent: AgentVersion = self
            .http
            .post_json(&path, &CreateAgentVersionRequest { definition })
            .await?;
        tracing::debug!(agent_id = %agent.id, version = %agent.version, "Agent version created");
        Ok(agent)
    }

    async fn create_conversation(&self) -> Result<Conversation, Error> {
        let conversation: Conversation = self
            .http
            .post_json("/openai/conversations", &serde_json::json!({}))
            .await?;
        tracing::debug!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    async fn create_conversation_items(
        &self,
        conversation_id: &str,
        items: &[InputItem],
    ) -> Result<Vec<ConversationItem>, Error> {
        tracing::debug!(conversation_id, count = items.len(), "Appending conversation items");
        let page: ItemPage = self
            .http
            .post_json(
                &conversation_items_path(conversation_id),
                &CreateItemsRequest { items },
            )
            .await?;
        Ok(page.data)
    }

    async fn create_response(&self, request: &ResponseRequest) -> Result<Response, Error> {
        tracing::debug!(
            conversation_id = %request.conversation,
            agent = %request.agent.name,
            "Creating response"
        );
        let response: Response = self.http.post_json("/openai/responses", request).await?;
        tracing::debug!(response_id = %response.id, status = ?response.status, "Response received");
        Ok(response)
    }

    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationItem>, Error> {
        let path = conversation_items_path(conversation_id);
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let mut query = vec![("order", "asc"), ("limit", ITEM_PAGE_LIMIT)];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: ItemPage = self.http.get_json(&path, &query).await?;
            tracing::debug!(conversation_id, fetched = page.data.len(), "Fetched item page");
            items.extend(page.data);

            if !page.has_more {
                break;
            }
            let Some(last_id) = page.last_id else {
                return Err(Error::Api(format!(
                    "item paging for {conversation_id} reported more items without a cursor"
                )));
            };
            if !seen_cursors.insert(last_id.clone()) {
                return Err(Error::Api(format!(
                    "conversation item paging for {conversation_id} did not advance past {last_id}"
                )));
            }
            after = Some(last_id);
        }

        Ok(items)
    }
}
