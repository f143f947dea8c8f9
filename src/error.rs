use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Content Error: {0}")]
    Content(String),

    #[error("Completion Service Error: {0}")]
    Completion(#[from] chatgpt::err::Error),

    #[error("Malformed Figure Payload: {0}")]
    MalformedFigure(String),

    #[error("Invalid Tip Amount: {0}")]
    InvalidTip(String),

    #[error("Telegram Request Error: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

pub type QuizResult<T> = Result<T, QuizError>;
