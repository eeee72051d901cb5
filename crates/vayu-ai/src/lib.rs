//! Vayu AI - boundary to the generative model
//!
//! - `model`: the [`GenerativeModel`] seam and request types
//! - `prompts`: system instructions with embedded output schemas
//! - `parse`: fence stripping, JSON and schema validation, semantic checks
//! - `fallback`: deterministic substitutes on failure
//! - `client`: [`AiClient`] tying the above together, with cancellation

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod model;
pub mod parse;
pub mod prompts;

pub use cancel::{CancelHandle, Cancellable};
pub use client::{AiClient, Generated, Source};
pub use config::AiConfig;
pub use error::{GenerationError, ParseError};
pub use fallback::{fallback_analysis, fallback_plan};
pub use model::{Attachment, AttachmentKind, GenerationRequest, GenerativeModel, OfflineModel};
pub use parse::{parse_analysis, parse_plan, strip_fences};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
