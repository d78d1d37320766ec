//! Command menus pushed to Telegram via `setMyCommands`.
//!
//! The standard set is active while a chat is idle; the contextual set replaces it
//! while the chat is awaiting a custom prompt, so the menu only offers `/cancel`.

use crate::types::BotCommand;

/// Commands shown in the main menu.
pub fn standard_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot and get welcome message"),
        BotCommand::new("bots", "List all available bots and their settings"),
        BotCommand::new("setprompt", "Set a custom prompt for this bot"),
        BotCommand::new("cancel", "Cancel current operation"),
    ]
}

/// Commands shown while prompt input is pending.
pub fn contextual_commands() -> Vec<BotCommand> {
    vec![BotCommand::new("cancel", "Cancel current operation")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_commands_cover_all_handlers() {
        let commands = standard_commands();
        let names: Vec<&str> = commands
            .iter()
            .map(|c| c.command.as_str())
            .collect();
        assert_eq!(names, vec!["start", "bots", "setprompt", "cancel"]);
    }

    #[test]
    fn test_contextual_commands_only_cancel() {
        let commands = contextual_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "cancel");
    }
}
