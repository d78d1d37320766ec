//! # bot-handlers
//!
//! Command routing for inbound Telegram messages. [`UpdateRouter::dispatch`]
//! matches command prefixes first-wins (`/start`, `/setprompt`, `/bots`,
//! `/cancel`); anything else is freeform text, and voice notes are transcribed
//! and re-enter the text path.
//!
//! Handlers never propagate collaborator failures: each converts errors at its
//! boundary into a short apology reply and a full error log. A message without a
//! resolvable sender is a logged no-op.

mod bots;
mod cancel;
mod context;
mod message;
mod router;
mod set_prompt;
mod start;
mod voice;

pub use context::BotContext;
pub use message::handle_text_message;
pub use router::UpdateRouter;
pub use voice::handle_voice_message;
