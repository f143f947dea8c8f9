use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::quiz::scores::ScoreVector;
use crate::quiz::Question;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    InProgress {
        index: usize,
        scores: ScoreVector,
        history: Vec<ScoreVector>,
    },
    Completed {
        scores: ScoreVector,
    },
}

impl Phase {
    fn initial() -> Self {
        Phase::InProgress {
            index: 0,
            scores: ScoreVector::ZERO,
            history: Vec::new(),
        }
    }
}

/// What a navigation call did. Calls that make no sense in the current
/// phase come back as `Ignored` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { index: usize },
    Completed { scores: ScoreVector },
    Ignored,
}

/// Presentation order for one attempt, derived from a single seed at start.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shuffle {
    pub seed: u64,
    pub questions: Vec<usize>,
    pub options: Vec<Vec<usize>>,
}

impl Shuffle {
    pub fn new(seed: u64, option_counts: &[usize], shuffle_questions: bool) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut questions: Vec<usize> = (0..option_counts.len()).collect();
        if shuffle_questions {
            questions.shuffle(&mut rng);
        }
        let options = option_counts
            .iter()
            .map(|&count| {
                let mut order: Vec<usize> = (0..count).collect();
                order.shuffle(&mut rng);
                order
            })
            .collect();
        Self {
            seed,
            questions,
            options,
        }
    }
}

/// Score accumulator for one quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    question_count: usize,
    option_counts: Vec<usize>,
    shuffle_questions: bool,
    shuffle: Shuffle,
    phase: Phase,
}

impl QuizSession {
    /// `option_counts[i]` is the number of options of content question `i`.
    pub fn new(option_counts: Vec<usize>, shuffle_questions: bool, seed: u64) -> Self {
        let shuffle = Shuffle::new(seed, &option_counts, shuffle_questions);
        Self {
            question_count: option_counts.len(),
            option_counts,
            shuffle_questions,
            shuffle,
            phase: Phase::initial(),
        }
    }

    pub fn for_questions<R: Rng>(questions: &[Question], shuffle_questions: bool, rng: &mut R) -> Self {
        let counts = questions.iter().map(|q| q.options.len()).collect();
        Self::new(counts, shuffle_questions, rng.gen())
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn seed(&self) -> u64 {
        self.shuffle.seed
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn scores(&self) -> ScoreVector {
        match &self.phase {
            Phase::InProgress { scores, .. } | Phase::Completed { scores } => *scores,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match &self.phase {
            Phase::InProgress { index, .. } => Some(*index),
            Phase::Completed { .. } => None,
        }
    }

    pub fn history(&self) -> &[ScoreVector] {
        match &self.phase {
            Phase::InProgress { history, .. } => history,
            Phase::Completed { .. } => &[],
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, Phase::Completed { .. })
    }

    /// Content index of the question shown at the current step.
    pub fn current_question(&self) -> Option<usize> {
        self.index().and_then(|i| self.shuffle.questions.get(i).copied())
    }

    /// Content option indices of the current question, in display order.
    pub fn current_options(&self) -> &[usize] {
        self.current_question()
            .and_then(|q| self.shuffle.options.get(q))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Apply `delta` and move to the next question, or finish on the last one.
    pub fn advance(&mut self, delta: ScoreVector) -> Transition {
        let transition = match &mut self.phase {
            Phase::Completed { .. } => Transition::Ignored,
            Phase::InProgress {
                index,
                scores,
                history,
            } => {
                *scores = *scores + delta;
                history.push(delta);
                if *index + 1 >= self.question_count {
                    let scores = *scores;
                    self.phase = Phase::Completed { scores };
                    Transition::Completed { scores }
                } else {
                    *index += 1;
                    Transition::Moved { index: *index }
                }
            }
        };
        debug!("advance {:?} -> {:?}", delta, transition);
        transition
    }

    /// Pick the option shown at `position` (0-based, display order) of the
    /// current question.
    pub fn answer(&mut self, questions: &[Question], position: usize) -> Transition {
        let delta = self
            .current_question()
            .and_then(|q| {
                let option = *self.shuffle.options.get(q)?.get(position)?;
                questions.get(q)?.options.get(option).map(|o| o.scores)
            });
        match delta {
            Some(delta) => self.advance(delta),
            None => Transition::Ignored,
        }
    }

    /// Undo the last answer. Does nothing on the first question or after
    /// completion.
    pub fn retreat(&mut self) -> Transition {
        let transition = match &mut self.phase {
            Phase::InProgress {
                index,
                scores,
                history,
            } if *index > 0 => match history.pop() {
                Some(delta) => {
                    *scores = *scores - delta;
                    *index -= 1;
                    Transition::Moved { index: *index }
                }
                None => Transition::Ignored,
            },
            _ => Transition::Ignored,
        };
        debug!("retreat -> {:?}", transition);
        transition
    }

    /// Back to the first question with zero scores and a fresh shuffle whose
    /// seed differs from the previous attempt.
    pub fn restart<R: Rng>(&mut self, rng: &mut R) {
        let previous = self.shuffle.seed;
        let mut seed = rng.gen();
        while seed == previous {
            seed = rng.gen();
        }
        self.shuffle = Shuffle::new(seed, &self.option_counts, self.shuffle_questions);
        self.phase = Phase::initial();
        debug!("restart with seed {}", seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::AnswerOption;

    fn questions() -> Vec<Question> {
        (0..3)
            .map(|id| {
                Question::new(
                    id,
                    format!("q{}", id),
                    vec![
                        AnswerOption::new("c".into(), ScoreVector::new(3, 0, 0)),
                        AnswerOption::new("l".into(), ScoreVector::new(0, 3, 0)),
                        AnswerOption::new("p".into(), ScoreVector::new(0, 0, 3)),
                    ],
                )
            })
            .collect()
    }

    #[test]
    fn walks_to_completion() {
        let mut session = QuizSession::new(vec![3, 3, 3], false, 7);
        assert_eq!(session.advance(ScoreVector::new(3, 0, 0)), Transition::Moved { index: 1 });
        assert_eq!(session.advance(ScoreVector::new(0, 2, 1)), Transition::Moved { index: 2 });
        let done = session.advance(ScoreVector::new(1, 1, 1));
        assert_eq!(
            done,
            Transition::Completed {
                scores: ScoreVector::new(4, 3, 2)
            }
        );
        assert!(session.is_completed());
        assert_eq!(session.index(), None);
    }

    #[test]
    fn advance_after_completion_is_ignored() {
        let mut session = QuizSession::new(vec![2], false, 1);
        session.advance(ScoreVector::new(1, 0, 0));
        assert_eq!(session.advance(ScoreVector::new(5, 5, 5)), Transition::Ignored);
        assert_eq!(session.retreat(), Transition::Ignored);
        assert_eq!(session.scores(), ScoreVector::new(1, 0, 0));
    }

    #[test]
    fn retreat_on_first_question_is_ignored() {
        let mut session = QuizSession::new(vec![2, 2], false, 1);
        assert_eq!(session.retreat(), Transition::Ignored);
        assert_eq!(session.index(), Some(0));
        assert!(session.history().is_empty());
    }

    #[test]
    fn answer_maps_display_position_through_shuffle() {
        let questions = questions();
        let mut session = QuizSession::new(vec![3, 3, 3], false, 42);
        let shown = session.current_options().to_vec();
        assert_eq!(shown.len(), 3);

        session.answer(&questions, 0);
        let expected = questions[0].options[shown[0]].scores;
        assert_eq!(session.scores(), expected);

        assert_eq!(session.answer(&questions, 9), Transition::Ignored);
        assert_eq!(session.index(), Some(1));
    }

    #[test]
    fn shuffle_is_stable_per_seed() {
        let a = Shuffle::new(99, &[4, 4, 4, 4], true);
        let b = Shuffle::new(99, &[4, 4, 4, 4], true);
        assert_eq!(a, b);

        let mut sorted = a.questions.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3]);

        let fixed = Shuffle::new(99, &[4, 4, 4, 4], false);
        assert_eq!(fixed.questions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn restart_draws_a_new_seed() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = QuizSession::new(vec![3, 3], false, 0);
        session.advance(ScoreVector::new(3, 0, 0));
        for _ in 0..20 {
            let before = session.seed();
            session.restart(&mut rng);
            assert_ne!(session.seed(), before);
            assert_eq!(session.index(), Some(0));
            assert_eq!(session.scores(), ScoreVector::ZERO);
        }
    }
}
