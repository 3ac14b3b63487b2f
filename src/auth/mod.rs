//! Token credentials for the project service.
//!
//! The default chain asks locally signed-in developer tools for a bearer
//! token: the Azure CLI first, then the Azure Developer CLI. Environment and
//! managed-identity sources are intentionally absent.

mod chain;
mod developer_tools;
mod token;

pub use chain::DefaultCredential;
pub use developer_tools::{AzureCliCredential, AzureDeveloperCliCredential};
pub use token::{AccessToken, StaticTokenCredential};

use async_trait::async_trait;
use thiserror::Error;

/// Scope requested for project data-plane calls.
pub const PROJECT_SCOPE: &str = "https://ai.azure.com/.default";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{source_name} is unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },

    #[error("{source_name} returned an unusable token: {reason}")]
    InvalidToken {
        source_name: &'static str,
        reason: String,
    },

    #[error("No credential source could provide a token:\n  {}", .0.join("\n  "))]
    Exhausted(Vec<String>),
}

/// A source of bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Acquire a token for `scope`.
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}
