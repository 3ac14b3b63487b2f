//! The evaluation run: upload, provision, ask, report.

use crate::config::DEFAULT_INPUT_FILE;
use crate::error::Result;
use crate::project::{
    AgentDefinition, FilePurpose, InputItem, ProjectApi, Response, ResponseRequest,
    ResponseStatus, Tool,
};
use crate::transcript::write_transcript;
use std::io::{self, Write};
use std::path::Path;

pub const AGENT_NAME: &str = "interview-evaluator-agent";

pub const INSTRUCTIONS: &str = "You are an AI HR evaluator. \
    Read the uploaded interview transcript carefully. \
    Analyze technical skills, communication, problem-solving, and culture fit. \
    Clearly state whether the candidate is FIT or NOT FIT for the role \
    and explain your reasoning.";

pub const EVALUATION_REQUEST: &str =
    "Please analyze the uploaded file and determine if the candidate is fit for the role.";

/// How a run ended, for the handled conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input file was absent; nothing was sent.
    MissingInput,
    /// The service answered and the result was printed.
    Completed,
    /// The service reported a failed response.
    ResponseFailed,
}

/// One evaluation against a model deployment.
#[derive(Debug, Clone)]
pub struct Evaluation {
    model: String,
    agent_name: String,
    instructions: String,
    request: String,
}

impl Evaluation {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            agent_name: AGENT_NAME.to_string(),
            instructions: INSTRUCTIONS.to_string(),
            request: EVALUATION_REQUEST.to_string(),
        }
    }

    /// Agent definition with a code interpreter that can read `file_id`.
    #[must_use]
    pub fn agent_definition(&self, file_id: &str) -> AgentDefinition {
        AgentDefinition {
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            tools: vec![Tool::code_interpreter(vec![file_id.to_string()])],
        }
    }

    /// Run the whole evaluation, writing progress and results to `out`.
    ///
    /// Returns before touching `api` if `input` does not exist. A failed
    /// response is reported and the conversation log is still printed.
    pub async fn run<A, W>(&self, api: &A, input: &Path, out: &mut W) -> Result<Outcome>
    where
        A: ProjectApi + ?Sized,
        W: Write,
    {
        if report_missing_input(input, out)? {
            return Ok(Outcome::MissingInput);
        }

        writeln!(out, "Reading file: {}", input.display())?;
        let contents = tokio::fs::read(input).await?;
        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_INPUT_FILE.to_string());

        let file = api
            .upload_file(&filename, contents, FilePurpose::Assistants)
            .await?;
        writeln!(out, "Uploaded file: {}", file.filename)?;

        let agent = api
            .create_agent_version(&self.agent_name, &self.agent_definition(&file.id))
            .await?;
        writeln!(out, "Using agent: {}", agent.name)?;

        let conversation = api.create_conversation().await?;
        api.create_conversation_items(&conversation.id, &[InputItem::user(&self.request)])
            .await?;

        let response = api
            .create_response(&ResponseRequest::for_agent(&conversation.id, &agent.name))
            .await?;
        let outcome = report_response(&response, out)?;

        writeln!(out, "\nConversation Log:\n")?;
        let items = api.list_conversation_items(&conversation.id).await?;
        write_transcript(&items, out)?;

        Ok(outcome)
    }
}

/// Print `File not found` and return true when `input` does not exist.
pub fn report_missing_input<W: Write>(input: &Path, out: &mut W) -> io::Result<bool> {
    if input.exists() {
        return Ok(false);
    }
    writeln!(out, "File not found: {}", input.display())?;
    Ok(true)
}

fn report_response<W: Write>(response: &Response, out: &mut W) -> Result<Outcome> {
    if response.status == ResponseStatus::Failed {
        match &response.error {
            Some(error) => writeln!(out, "Response failed: {error}")?,
            None => writeln!(out, "Response failed: no error details")?,
        }
        return Ok(Outcome::ResponseFailed);
    }

    if response.status != ResponseStatus::Completed {
        tracing::warn!(status = ?response.status, "Response did not complete");
    }

    writeln!(out, "\n===== EVALUATION RESULT =====\n")?;
    writeln!(out, "{}", response.output_text())?;
    Ok(Outcome::Completed)
}
