//! Conversation runtime for GTM requirements gathering.
//!
//! Every user message goes through the same loop:
//! 1. **Extraction** (`conversation`) - keyword and pattern rules turn free text into
//!    typed `FieldUpdate`s
//! 2. **Merge** (`merge`) - updates are folded into the session's `Requirements` and raise
//!    soft confirmations for the high-value fields
//! 3. **Confirmation** (`confirmations`) - pending prompts wait until the user confirms or
//!    corrects them
//! 4. **Matching** (`runtime`) - once the profile is complete enough, the agency directory
//!    is queried
//!
//! # Key Types
//!
//! - `AgentRuntime` - orchestrates sessions and collaborators
//! - `SessionRegistry` - one serialised `GtmSession` per thread
//! - `ConversationMemory` / `AgencyDirectory` - outbound collaborator traits
//!
//! # Determinism
//!
//! No model is consulted. The same message against the same session state always yields the
//! same fields, confirmations and reply.

pub mod collaborators;
pub mod confirmations;
pub mod conversation;
pub mod merge;
pub mod registry;
pub mod reply;
pub mod runtime;
pub mod session;

pub use conversation::{ConversationExtractor, ExtractedFields, Extraction, FieldUpdate};
pub use registry::SessionRegistry;
pub use runtime::{AgentRuntime, ChatOutcome, ProcessOutcome};
pub use session::{GtmSession, SessionIds, SessionSnapshot};
