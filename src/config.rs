use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{QuizError, QuizResult};

pub const DEFAULT_QUIZ_URL: &str = "https://anglican-quiz.vercel.app";
pub const DEFAULT_TOTAL_MAX: u32 = 45;

#[derive(Debug, Clone)]
pub struct Config {
    pub chatgpt_api_key: String,
    pub chatgpt_timeout: Duration,
    /// Tips are disabled when no payment provider is configured.
    pub payment_provider_token: Option<String>,
    pub content_dir: PathBuf,
    pub quiz_url: String,
    /// Highest attainable per-axis score, used to normalize the plot.
    pub total_max: u32,
    pub shuffle_questions: bool,
}

impl Config {
    pub fn from_env() -> QuizResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> QuizResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chatgpt_api_key = lookup("CHATGPT_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| QuizError::Config("CHATGPT_API_KEY is not set".to_string()))?;

        let total_max = parse_or(&lookup, "TOTAL_MAX", DEFAULT_TOTAL_MAX)?;
        if total_max == 0 {
            return Err(QuizError::Config("TOTAL_MAX must be positive".to_string()));
        }

        Ok(Self {
            chatgpt_api_key,
            chatgpt_timeout: Duration::from_secs(parse_or(&lookup, "CHATGPT_TIMEOUT_SECS", 15)?),
            payment_provider_token: lookup("PAYMENT_PROVIDER_TOKEN").filter(|v| !v.trim().is_empty()),
            content_dir: lookup("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("content")),
            quiz_url: lookup("QUIZ_URL").unwrap_or_else(|| DEFAULT_QUIZ_URL.to_string()),
            total_max,
            shuffle_questions: parse_or(&lookup, "SHUFFLE_QUESTIONS", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> QuizResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| QuizError::Config(format!("{} has an invalid value '{}'", key, raw))),
    }
}
