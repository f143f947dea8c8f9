//! Chat text and reply keyboards for each step of the quiz.

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use teloxide::utils::html::escape;

use crate::quiz::ai_helper::FigureOutcome;
use crate::quiz::content::{fill, Catalog, Content, Locale, Strings};
use crate::quiz::scores::{Axis, ScoreVector};
use crate::quiz::session::QuizSession;
use crate::quiz::ternary::render_text_plot;
use crate::quiz::titles::compose_result_title;

pub fn greeting_text(strings: &Strings) -> String {
    format!(
        "<b>{}</b>\n{}\n\n{}",
        escape(&strings.app_title),
        escape(&strings.app_subtitle),
        escape(&strings.choose_language)
    )
}

pub fn language_keyboard(catalog: &Catalog) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![Locale::ALL
        .iter()
        .map(|&l| KeyboardButton::new(catalog.get(l).language_name.clone()))
        .collect::<Vec<_>>()])
}

pub fn parse_language(catalog: &Catalog, text: &str) -> Option<Locale> {
    Locale::ALL
        .into_iter()
        .find(|&l| catalog.get(l).language_name == text.trim())
}

/// Current question with its options numbered in display order.
pub fn question_text(content: &Content, quiz: &QuizSession) -> Option<String> {
    let index = quiz.index()?;
    let question = content.questions.get(quiz.current_question()?)?;

    let progress = fill(
        &content.strings.question_of_total,
        &[
            ("current", &(index + 1).to_string()),
            ("total", &quiz.question_count().to_string()),
        ],
    );
    let options = quiz
        .current_options()
        .iter()
        .enumerate()
        .filter_map(|(position, &option)| {
            let option = question.options.get(option)?;
            Some(format!("{}. {}", position + 1, escape(&option.text)))
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "<i>{}</i>\n\n<b>{}</b>\n\n{}",
        escape(&progress),
        escape(&question.text),
        options
    ))
}

/// Number buttons for the options, then back (hidden on the first
/// question) and restart.
pub fn question_keyboard(strings: &Strings, quiz: &QuizSession) -> KeyboardMarkup {
    let numbers = (1..=quiz.current_options().len())
        .map(|n| KeyboardButton::new(n.to_string()))
        .collect::<Vec<_>>();

    let mut controls = Vec::new();
    if quiz.index().unwrap_or(0) > 0 {
        controls.push(KeyboardButton::new(strings.back_button.clone()));
    }
    controls.push(KeyboardButton::new(strings.restart_button.clone()));

    KeyboardMarkup::new(vec![numbers, controls])
}

/// 0-based display position for a numbered answer like "2".
pub fn parse_choice(text: &str, option_count: usize) -> Option<usize> {
    let n: usize = text.trim().trim_end_matches('.').parse().ok()?;
    (1..=option_count).contains(&n).then(|| n - 1)
}

pub fn result_title(content: &Content, scores: &ScoreVector) -> String {
    compose_result_title(&content.title_grid, &content.strings, scores)
}

pub fn results_text(content: &Content, scores: &ScoreVector, total_max: u32) -> String {
    let strings = &content.strings;
    let score_lines = Axis::ALL
        .iter()
        .map(|&axis| {
            format!(
                "<b>{}:</b> {}",
                escape(strings.axis_score_label(axis)),
                scores.get(axis)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<b>{}</b>\n\n<pre>{}</pre>\n\n{}\n\n{}\n<b>{}</b>",
        escape(&strings.results_title),
        escape(&render_text_plot(scores, total_max, strings)),
        score_lines,
        escape(&strings.your_title_is),
        escape(&result_title(content, scores))
    )
}

pub fn results_keyboard(strings: &Strings, tips_enabled: bool) -> KeyboardMarkup {
    let mut rows = vec![
        vec![KeyboardButton::new(strings.take_again_button.clone())],
        vec![KeyboardButton::new(strings.share_button.clone())],
    ];
    if tips_enabled {
        rows.push(vec![KeyboardButton::new(strings.tip_button.clone())]);
    }
    rows.push(vec![KeyboardButton::new(strings.language_button.clone())]);
    KeyboardMarkup::new(rows)
}

pub fn loading_text(strings: &Strings) -> String {
    format!(
        "<b>{}</b>\n<i>{}</i>",
        escape(&strings.historical_figure_title),
        escape(&strings.historical_figure_loading)
    )
}

/// Figure message; a fallback figure is preceded by the error notice.
pub fn figure_text(strings: &Strings, outcome: &FigureOutcome) -> String {
    let figure = outcome.figure();
    let notice = if outcome.is_fallback() {
        format!("<i>{}</i>\n\n", escape(&strings.historical_figure_error))
    } else {
        String::new()
    };
    format!(
        "{}<b>{}</b>\n\n<b>{}</b>\n{}",
        notice,
        escape(&strings.historical_figure_title),
        escape(&figure.name),
        escape(&figure.explanation)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ai_helper::HistoricalFigure;
    use rstest::rstest;

    fn catalog() -> Catalog {
        let en = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/content/en.json"));
        let pt = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/content/pt.json"));
        Catalog::new(
            Content::from_reader(en.as_bytes()).unwrap(),
            Content::from_reader(pt.as_bytes()).unwrap(),
        )
    }

    #[rstest]
    #[case("1", 4, Some(0))]
    #[case(" 4 ", 4, Some(3))]
    #[case("3.", 3, Some(2))]
    #[case("0", 4, None)]
    #[case("5", 4, None)]
    #[case("Anglo-Catholic", 4, None)]
    fn choices(#[case] text: &str, #[case] count: usize, #[case] expected: Option<usize>) {
        assert_eq!(parse_choice(text, count), expected);
    }

    #[test]
    fn languages_round_trip_through_their_names() {
        let catalog = catalog();
        assert_eq!(parse_language(&catalog, "English"), Some(Locale::En));
        assert_eq!(parse_language(&catalog, "Português"), Some(Locale::Pt));
        assert_eq!(parse_language(&catalog, "Klingon"), None);
    }

    #[test]
    fn question_screen_shows_progress_and_numbered_options() {
        let catalog = catalog();
        let content = catalog.get(Locale::En);
        let quiz = QuizSession::new(
            content.questions.iter().map(|q| q.options.len()).collect(),
            false,
            3,
        );
        let text = question_text(content, &quiz).unwrap();
        assert!(text.contains("Question 1 of 15"));
        assert!(text.contains("1. "));
        assert!(text.contains(&format!("{}. ", content.questions[0].options.len())));
    }

    #[test]
    fn completed_quiz_has_no_question_screen() {
        let catalog = catalog();
        let content = catalog.get(Locale::En);
        let mut quiz = QuizSession::new(vec![3], false, 3);
        quiz.advance(ScoreVector::new(3, 0, 0));
        assert!(question_text(content, &quiz).is_none());
    }

    #[test]
    fn results_screen_is_localized() {
        let catalog = catalog();
        let scores = ScoreVector::new(45, 0, 0);

        let en = results_text(catalog.get(Locale::En), &scores, 45);
        assert!(en.contains("Pure Tractarian"));
        assert!(en.contains("Catholic score:</b> 45"));

        let pt = results_text(catalog.get(Locale::Pt), &scores, 45);
        assert!(pt.contains("Tractariano Puro"));

        let mixed = result_title(catalog.get(Locale::Pt), &ScoreVector::new(10, 0, 35));
        assert_eq!(mixed, "Evangélico Sacramental");
    }

    #[test]
    fn fallback_figure_carries_notice() {
        let catalog = catalog();
        let strings = &catalog.get(Locale::En).strings;
        let figure = HistoricalFigure {
            name: "F. D. Maurice".to_string(),
            explanation: "Christian socialist & theologian.".to_string(),
        };

        let generated = figure_text(strings, &FigureOutcome::Generated(figure.clone()));
        assert!(!generated.contains(&strings.historical_figure_error));
        assert!(generated.contains("Christian socialist &amp; theologian."));

        let fallback = figure_text(strings, &FigureOutcome::Fallback(figure));
        assert!(fallback.starts_with(&format!("<i>{}", strings.historical_figure_error)));
    }
}
