//! Client for the hosted AI project service.
//!
//! Covers the slice of the API an evaluation run needs: file upload, agent
//! versions, conversations and their items, and responses.
//!
//! # Example
//!
//! ```ignore
//! use interview_eval::project::{ProjectApi, ProjectClient, DEFAULT_API_VERSION};
//!
//! let client = ProjectClient::new(&endpoint, DEFAULT_API_VERSION, credential)?;
//! let conversation = client.create_conversation().await?;
//! ```

mod client;
mod error;
mod http;
mod types;

pub use client::{DEFAULT_API_VERSION, ProjectApi, ProjectClient};
pub use error::{Error, format_api_error};
pub use types::*;
