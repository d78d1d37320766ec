mod bot_record;
mod chat_session;
mod user_record;

pub use bot_record::BotRecord;
pub use chat_session::{ChatSession, ExpiredSession};
pub use user_record::{NewUser, UserBotSetting, UserRecord};
