//! Outbound services a session talks to: conversation memory and the agency directory.
//!
//! Both traits return explicit results. Deciding what to substitute when a call fails is
//! left to the runtime.

use thiserror::Error;

pub mod agencies;
pub mod memory;

pub use agencies::{AgencyDirectory, HttpAgencyDirectory};
pub use memory::{
    ConversationMemory, DisabledMemory, InMemoryConversationMemory, MemoryMessage,
    MemorySearchHit, MessageRole, ZepMemory,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator is not configured")]
    Unconfigured,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
