//! Generative model seam
//!
//! The service behind [`GenerativeModel`] is external; this crate only builds
//! requests and validates what comes back.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of binary evidence sent along with a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    /// Site photo
    Image,
    /// Ambient recording
    Audio,
}

/// Evidence handle attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Kind
    pub kind: AttachmentKind,
    /// Opaque handle understood by the transport
    pub handle: String,
}

/// One generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier
    pub model: String,
    /// Role and output contract
    pub system_instruction: String,
    /// Task text
    pub prompt: String,
    /// Evidence
    pub attachments: Vec<Attachment>,
    /// Allow web search
    pub grounding: bool,
}

/// Text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Raw text answer for `request`
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Model that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

#[async_trait]
impl GenerativeModel for OfflineModel {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Transport("offline mode".into()))
    }
}
