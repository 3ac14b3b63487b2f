//! Wire types for files, agents, conversations, and responses.

use serde::{Deserialize, Serialize};

/// A file stored by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Declared use of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Assistants,
}

impl FilePurpose {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assistants => "assistants",
        }
    }
}

/// Tool attached to an agent definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter { container: CodeInterpreterContainer },
}

impl Tool {
    /// Code interpreter in an automatically provisioned container with `file_ids` mounted.
    #[must_use]
    pub fn code_interpreter(file_ids: Vec<String>) -> Self {
        Self::CodeInterpreter {
            container: CodeInterpreterContainer::Auto { file_ids },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodeInterpreterContainer {
    Auto {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        file_ids: Vec<String>,
    },
}

/// Definition of a prompt-based agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "prompt")]
pub struct AgentDefinition {
    pub model: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAgentVersionRequest<'a> {
    pub definition: &'a AgentDefinition,
}

/// A registered version of a named agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentVersion {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: String,
}

/// Item appended to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message { role: String, content: String },
}

impl InputItem {
    pub fn user(content: impl Into<String>) -> Self {
        Self::Message {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateItemsRequest<'a> {
    pub items: &'a [InputItem],
}

/// Item stored in a conversation or produced as response output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    Message(MessageItem),
    /// Tool calls, reasoning, and any other item kind.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageItem {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl MessageItem {
    /// Text of the first content part that carries any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentPart::text)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    OutputText { text: String },
    Text { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

impl ContentPart {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::InputText { text } | Self::OutputText { text } | Self::Text { text } => {
                Some(text)
            }
            Self::Refusal { refusal } => Some(refusal),
            Self::Other => None,
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPage {
    pub data: Vec<ConversationItem>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Reference that runs a response under a provisioned agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "agent_reference")]
pub struct AgentReference {
    pub name: String,
}

/// Request body for response creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRequest {
    pub conversation: String,
    pub input: String,
    pub agent: AgentReference,
}

impl ResponseRequest {
    /// Respond to the items already in `conversation` as `agent_name`.
    pub fn for_agent(conversation: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            conversation: conversation.into(),
            input: String::new(),
            agent: AgentReference {
                name: agent_name.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Completed,
    Failed,
    InProgress,
    Incomplete,
    Cancelled,
    Queued,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (code: {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub output: Vec<ConversationItem>,
}

impl Response {
    /// Concatenated `output_text` parts of every output message.
    #[must_use]
    pub fn output_text(&self) -> String {
        let mut out = String::new();
        for item in &self.output {
            if let ConversationItem::Message(message) = item {
                for part in &message.content {
                    if let ContentPart::OutputText { text } = part {
                        out.push_str(text);
                    }
                }
            }
        }
        out
    }
}
