use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anglican_quiz::error::{QuizError, QuizResult};
use anglican_quiz::quiz::ai_helper::{build_prompt, FigureOracle, FigureOutcome, FigureSlot, QuizHelper};
use anglican_quiz::quiz::content::{Content, Locale};
use anglican_quiz::quiz::scores::ScoreVector;
use anglican_quiz::quiz::session::{QuizSession, Transition};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::oneshot;

/// Oracle that answers each prompt only when the test releases its gate.
#[derive(Default)]
struct GatedOracle {
    gates: Mutex<HashMap<String, oneshot::Receiver<String>>>,
}

impl GatedOracle {
    fn gate(&self, prompt: String) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(prompt, rx);
        tx
    }
}

impl FigureOracle for GatedOracle {
    async fn complete(&self, prompt: String) -> QuizResult<String> {
        let gate = self.gates.lock().unwrap().remove(&prompt);
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| QuizError::MalformedFigure("gate dropped".to_string())),
            None => Err(QuizError::MalformedFigure("unexpected prompt".to_string())),
        }
    }
}

fn content() -> Arc<Content> {
    let en = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/content/en.json"));
    Arc::new(Content::from_reader(en.as_bytes()).unwrap())
}

fn figure_json(name: &str) -> String {
    format!(r#"{{"name": "{}", "explanation": "A fitting match."}}"#, name)
}

/// Answer every question with the option worth the most on `pick`.
fn complete_quiz(quiz: &mut QuizSession, content: &Content, pick: fn(&ScoreVector) -> u32) -> ScoreVector {
    loop {
        let question = &content.questions[quiz.current_question().unwrap()];
        let best = quiz
            .current_options()
            .iter()
            .enumerate()
            .max_by_key(|(_, option)| pick(&question.options[**option].scores))
            .map(|(position, _)| position)
            .unwrap();
        if let Transition::Completed { scores } = quiz.answer(&content.questions, best) {
            return scores;
        }
    }
}

#[tokio::test]
async fn superseded_response_does_not_overwrite_new_result() {
    let content = content();
    let oracle = GatedOracle::default();
    let mut rng = StdRng::seed_from_u64(1);
    let mut quiz = QuizSession::for_questions(&content.questions, false, &mut rng);
    let mut slot = FigureSlot::default();

    let first_scores = complete_quiz(&mut quiz, &content, |s| s.catholic);
    assert_eq!(first_scores, ScoreVector::new(45, 0, 0));
    let first_token = slot.request(first_scores, Locale::En).unwrap();
    let release_first = oracle.gate(build_prompt(&content, &first_scores));

    // A new quiz starts while the first request is still out.
    quiz.restart(&mut rng);
    slot.invalidate();
    let second_scores = complete_quiz(&mut quiz, &content, |s| s.protestant);
    assert_eq!(second_scores, ScoreVector::new(0, 0, 45));
    let second_token = slot.request(second_scores, Locale::En).unwrap();
    let release_second = oracle.gate(build_prompt(&content, &second_scores));

    let helper = Arc::new(QuizHelper::new(oracle));
    let first = tokio::spawn({
        let (helper, content) = (helper.clone(), content.clone());
        async move { helper.historical_figure_or_fallback(&content, &first_scores).await }
    });
    let second = tokio::spawn({
        let (helper, content) = (helper.clone(), content.clone());
        async move { helper.historical_figure_or_fallback(&content, &second_scores).await }
    });

    let mut displayed = None;

    release_second.send(figure_json("J. C. Ryle")).unwrap();
    if let Some(outcome) = slot.accept(&second_token, second.await.unwrap()) {
        displayed = Some(outcome);
    }

    release_first.send(figure_json("John Keble")).unwrap();
    if let Some(outcome) = slot.accept(&first_token, first.await.unwrap()) {
        displayed = Some(outcome);
    }

    let displayed = displayed.unwrap();
    assert!(!displayed.is_fallback());
    assert_eq!(displayed.figure().name, "J. C. Ryle");
}

#[tokio::test]
async fn late_response_for_previous_locale_is_dropped() {
    let content = content();
    let scores = ScoreVector::new(20, 10, 15);
    let mut slot = FigureSlot::default();

    let english = slot.request(scores, Locale::En).unwrap();
    let portuguese = slot.request(scores, Locale::Pt).unwrap();

    let oracle = GatedOracle::default();
    let release = oracle.gate(build_prompt(&content, &scores));
    let helper = QuizHelper::new(oracle);
    release.send(figure_json("Richard Hooker")).unwrap();
    let outcome = helper.historical_figure_or_fallback(&content, &scores).await;

    assert!(slot.accept(&english, outcome.clone()).is_none());
    assert!(matches!(
        slot.accept(&portuguese, outcome),
        Some(FigureOutcome::Generated(_))
    ));
}
