pub mod ai_helper;
pub mod content;
pub mod scores;
pub mod screens;
pub mod session;
pub mod share;
pub mod ternary;
pub mod tip;
pub mod titles;

use scores::ScoreVector;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<AnswerOption>,
}
impl Question {
    pub fn new(id: u32, text: String, options: Vec<AnswerOption>) -> Self {
        Self { id, text, options }
    }

    /// Largest delta any single option of this question gives to `axis`.
    pub fn max_weight(&self, axis: scores::Axis) -> u32 {
        self.options
            .iter()
            .map(|o| o.scores.get(axis))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub scores: ScoreVector,
}
impl AnswerOption {
    pub fn new(text: String, scores: ScoreVector) -> Self {
        Self { text, scores }
    }
}
