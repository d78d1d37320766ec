use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
