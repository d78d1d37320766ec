//! # session
//!
//! The state-coordination core: [`PromptStateMachine`] decides how text entering a
//! chat is interpreted (pending-prompt answer vs freeform) and owns every
//! transition of the per-chat state machine; [`SessionSweeper`] expires stale
//! `awaiting_prompt` states in the background.
//!
//! Both drive the same claim-based transition primitive in the session store, so a
//! webhook delivery racing a sweep resolves to exactly one winner and one
//! notification.

mod machine;
mod sweeper;

pub use machine::{PromptStateMachine, TextDisposition, PROMPT_TTL_MINUTES};
pub use sweeper::{SessionSweeper, DEFAULT_SWEEP_INTERVAL};
