use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::error::{QuizError, QuizResult};
use crate::quiz::scores::Axis;
use crate::quiz::titles::TitleGrid;
use crate::quiz::Question;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Pt,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pt];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pt => "pt",
        }
    }

    /// Guess from a Telegram `language_code` such as "pt-BR".
    pub fn from_language_code(code: Option<&str>) -> Self {
        match code.and_then(|c| c.split('-').next()) {
            Some("pt") => Locale::Pt,
            _ => Locale::En,
        }
    }
}

/// Localized UI strings. Placeholders use `{{name}}`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Strings {
    pub app_title: String,
    pub app_subtitle: String,
    pub app_footer: String,
    pub choose_language: String,
    pub start_button: String,
    pub question_of_total: String,
    pub back_button: String,
    pub restart_button: String,
    pub choose_option: String,
    pub results_title: String,
    pub catholic_score: String,
    pub liberal_score: String,
    pub protestant_score: String,
    pub your_title_is: String,
    pub adjective_title_template: String,
    pub pure_title_template: String,
    pub historical_figure_title: String,
    pub historical_figure_loading: String,
    pub historical_figure_error: String,
    pub fallback_figure_name: String,
    pub fallback_figure_explanation: String,
    pub take_again_button: String,
    pub share_button: String,
    pub tip_button: String,
    pub language_button: String,
    pub share_text: String,
    pub tip_prompt: String,
    pub tip_invalid: String,
    pub tip_link: String,
    pub tip_unavailable: String,
    pub tip_error: String,
    pub tip_title: String,
    pub tip_description: String,
    pub tip_thanks: String,
    pub plot_catholic: String,
    pub plot_liberal: String,
    pub plot_protestant: String,
}

impl Strings {
    pub fn axis_score_label(&self, axis: Axis) -> &str {
        match axis {
            Axis::Catholic => &self.catholic_score,
            Axis::Liberal => &self.liberal_score,
            Axis::Protestant => &self.protestant_score,
        }
    }

    pub fn plot_label(&self, axis: Axis) -> &str {
        match axis {
            Axis::Catholic => &self.plot_catholic,
            Axis::Liberal => &self.plot_liberal,
            Axis::Protestant => &self.plot_protestant,
        }
    }
}

/// Everything one locale supplies to the quiz: strings, questions, title grid
/// and the figure prompt.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Content {
    pub language_name: String,
    pub strings: Strings,
    pub questions: Vec<Question>,
    pub title_grid: TitleGrid,
    pub figure_prompt: String,
}

impl Content {
    pub fn load(dir: &Path, locale: Locale) -> QuizResult<Self> {
        let path = dir.join(format!("{}.json", locale.code()));
        let file = File::open(&path).map_err(|e| {
            QuizError::Content(format!("failed to open '{}': {}", path.display(), e))
        })?;
        let content = Self::from_reader(file)?;
        info!(
            "Loaded {} content: {} questions",
            locale.code(),
            content.questions.len()
        );
        Ok(content)
    }

    pub fn from_reader<R: Read>(reader: R) -> QuizResult<Self> {
        let content: Content = serde_json::from_reader(reader)?;
        content.validate()?;
        Ok(content)
    }

    /// Highest score `axis` can reach over the whole questionnaire.
    pub fn attainable_max(&self, axis: Axis) -> u32 {
        self.questions.iter().map(|q| q.max_weight(axis)).sum()
    }

    /// Hard failures for unusable content; soft grid problems are only logged.
    fn validate(&self) -> QuizResult<()> {
        if self.questions.is_empty() {
            return Err(QuizError::Content("no questions".to_string()));
        }
        if let Some(q) = self.questions.iter().find(|q| q.options.is_empty()) {
            return Err(QuizError::Content(format!("question {} has no options", q.id)));
        }

        for axis in Axis::ALL {
            for problem in self.title_grid.coverage_gaps(axis, self.attainable_max(axis)) {
                warn!("Title grid '{}': {}", axis.key(), problem);
            }
        }
        Ok(())
    }
}

/// Both locales, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Catalog {
    en: Content,
    pt: Content,
}

impl Catalog {
    pub fn new(en: Content, pt: Content) -> Self {
        Self { en, pt }
    }

    pub fn load(dir: &Path) -> QuizResult<Self> {
        Ok(Self::new(
            Content::load(dir, Locale::En)?,
            Content::load(dir, Locale::Pt)?,
        ))
    }

    pub fn get(&self, locale: Locale) -> &Content {
        match locale {
            Locale::En => &self.en,
            Locale::Pt => &self.pt,
        }
    }
}

/// Replace every `{{key}}` in `template` with its value. Unknown placeholders
/// are left as they are.
pub fn fill(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}
