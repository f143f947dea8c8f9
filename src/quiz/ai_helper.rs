use std::future::Future;

use chatgpt::client::ChatGPT;
use chatgpt::types::CompletionResponse;
use log::{debug, info, warn};

use crate::error::{QuizError, QuizResult};
use crate::quiz::content::{fill, Content, Locale};
use crate::quiz::scores::ScoreVector;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoricalFigure {
    pub name: String,
    pub explanation: String,
}

impl HistoricalFigure {
    pub fn fallback(content: &Content) -> Self {
        Self {
            name: content.strings.fallback_figure_name.clone(),
            explanation: content.strings.fallback_figure_explanation.clone(),
        }
    }
}

/// A figure ready for display. `Fallback` means the service failed and the
/// user should also see the localized error notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureOutcome {
    Generated(HistoricalFigure),
    Fallback(HistoricalFigure),
}

impl FigureOutcome {
    pub fn figure(&self) -> &HistoricalFigure {
        match self {
            FigureOutcome::Generated(f) | FigureOutcome::Fallback(f) => f,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FigureOutcome::Fallback(_))
    }
}

/// Anything that turns a prompt into raw completion text.
pub trait FigureOracle: Send + Sync {
    fn complete(&self, prompt: String) -> impl Future<Output = QuizResult<String>> + Send;
}

impl FigureOracle for ChatGPT {
    async fn complete(&self, prompt: String) -> QuizResult<String> {
        let response: CompletionResponse = self.send_message(prompt).await?;
        Ok(response.message().content.clone())
    }
}

pub struct QuizHelper<O> {
    oracle: O,
}

impl<O: FigureOracle> QuizHelper<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub async fn generate_historical_figure(
        &self,
        content: &Content,
        scores: &ScoreVector,
    ) -> QuizResult<HistoricalFigure> {
        info!("Generating historical figure for scores: {:?}", scores);
        let prompt = build_prompt(content, scores);

        let completion = self.oracle.complete(prompt).await?;
        debug!("Completion: {:?}", completion);

        parse_figure(&completion)
    }

    /// Never fails: errors are logged and replaced by the locale's fallback.
    pub async fn historical_figure_or_fallback(
        &self,
        content: &Content,
        scores: &ScoreVector,
    ) -> FigureOutcome {
        match self.generate_historical_figure(content, scores).await {
            Ok(figure) => FigureOutcome::Generated(figure),
            Err(e) => {
                warn!("Falling back to the static figure: {}", e);
                FigureOutcome::Fallback(HistoricalFigure::fallback(content))
            }
        }
    }
}

pub fn build_prompt(content: &Content, scores: &ScoreVector) -> String {
    fill(
        &content.figure_prompt,
        &[
            ("catholic", &scores.catholic.to_string()),
            ("protestant", &scores.protestant.to_string()),
            ("liberal", &scores.liberal.to_string()),
            ("language", &content.language_name),
        ],
    )
}

#[derive(serde::Deserialize)]
struct RawFigure {
    name: Option<String>,
    explanation: Option<String>,
}

/// Accept only a JSON object whose `name` and `explanation` are both
/// non-blank. Markdown code fences around the object are tolerated.
pub fn parse_figure(raw: &str) -> QuizResult<HistoricalFigure> {
    let body = strip_code_fence(raw.trim());
    let parsed: RawFigure = serde_json::from_str(body)
        .map_err(|e| QuizError::MalformedFigure(format!("not a figure object: {}", e)))?;

    let non_blank = |field: Option<String>| field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    match (non_blank(parsed.name), non_blank(parsed.explanation)) {
        (Some(name), Some(explanation)) => Ok(HistoricalFigure { name, explanation }),
        _ => Err(QuizError::MalformedFigure(
            "name and explanation must both be present".to_string(),
        )),
    }
}

fn strip_code_fence(text: &str) -> &str {
    match text.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => text,
    }
}

/// Identity of one figure request: the result it was issued for plus a
/// generation number that changes on every new request or restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RequestToken {
    pub generation: u64,
    pub scores: ScoreVector,
    pub locale: Locale,
}

/// Tracks which figure request the displayed result is waiting for.
/// Responses carrying any other token are stale and must be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FigureSlot {
    generation: u64,
    current: Option<RequestToken>,
}

impl FigureSlot {
    /// Issue a token for `(scores, locale)`. Returns `None` when a request
    /// for exactly this result is already out.
    pub fn request(&mut self, scores: ScoreVector, locale: Locale) -> Option<RequestToken> {
        if let Some(current) = &self.current {
            if current.scores == scores && current.locale == locale {
                return None;
            }
        }
        self.generation += 1;
        let token = RequestToken {
            generation: self.generation,
            scores,
            locale,
        };
        self.current = Some(token);
        Some(token)
    }

    /// Forget the current request, e.g. when the quiz restarts.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    pub fn current(&self) -> Option<&RequestToken> {
        self.current.as_ref()
    }

    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.current.as_ref() == Some(token)
    }

    /// Pass `outcome` through only if `token` is still the one being waited on.
    pub fn accept(&self, token: &RequestToken, outcome: FigureOutcome) -> Option<FigureOutcome> {
        if self.is_current(token) {
            Some(outcome)
        } else {
            debug!("Dropping stale figure response for generation {}", token.generation);
            None
        }
    }
}
