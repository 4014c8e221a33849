//! Conversational core: prompt assembly, reply generation and event routing.

mod handler;
mod prompt;
mod reply;

pub use handler::{Disposition, EventRouter, IgnoreReason, ReplySender};
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
pub use reply::{ReplyGenerator, ReplyMode};
