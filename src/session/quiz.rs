//! Practice quiz state machine.
//!
//! ```text
//! Inactive --present--> Presented --select_answer--> Revealed
//!                        ^   |                           |
//!                        +---+ present (replace)         |
//! Inactive <---------------------- dismiss --------------+
//! ```
//!
//! The running score survives question replacement and dismissal.

use std::fmt;
use std::sync::Arc;

use super::error::AnswerRejected;
use crate::models::PracticeQuestion;

/// Cumulative score for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// Where the quiz currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Inactive,
    Presented,
    Revealed,
}

/// Result of locking in an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub score: Score,
}

#[derive(Debug)]
struct ActiveQuestion {
    question: Arc<PracticeQuestion>,
    /// Set exactly when the answer has been revealed.
    selected: Option<usize>,
}

/// At most one active question plus the running score.
#[derive(Debug, Default)]
pub struct QuizState {
    active: Option<ActiveQuestion>,
    score: Score,
}

impl QuizState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> QuizPhase {
        match &self.active {
            None => QuizPhase::Inactive,
            Some(active) if active.selected.is_some() => QuizPhase::Revealed,
            Some(_) => QuizPhase::Presented,
        }
    }

    /// The current question, shared with the message that carried it.
    pub fn active_question(&self) -> Option<&Arc<PracticeQuestion>> {
        self.active.as_ref().map(|a| &a.question)
    }

    /// The locked-in option, only while revealed.
    pub fn selected_index(&self) -> Option<usize> {
        self.active.as_ref().and_then(|a| a.selected)
    }

    pub fn is_revealed(&self) -> bool {
        self.selected_index().is_some()
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// Show a new question, replacing any current one. The score is kept.
    pub fn present(&mut self, question: Arc<PracticeQuestion>) {
        if let Some(previous) = &self.active {
            if previous.selected.is_none() {
                tracing::debug!("Replacing unanswered practice question");
            }
        }
        self.active = Some(ActiveQuestion {
            question,
            selected: None,
        });
    }

    /// Lock in an answer for the presented question.
    ///
    /// Rejections leave the state untouched.
    pub fn select_answer(&mut self, index: usize) -> Result<AnswerOutcome, AnswerRejected> {
        let active = self.active.as_mut().ok_or(AnswerRejected::NoActiveQuestion)?;
        if active.selected.is_some() {
            return Err(AnswerRejected::AlreadyRevealed);
        }
        let len = active.question.options().len();
        if index >= len {
            return Err(AnswerRejected::OutOfRange { index, len });
        }

        active.selected = Some(index);
        let is_correct = active.question.is_correct(index);
        self.score.total += 1;
        if is_correct {
            self.score.correct += 1;
        }

        tracing::info!(
            "Practice answer {} ({}), score {}",
            index,
            if is_correct { "correct" } else { "wrong" },
            self.score
        );

        Ok(AnswerOutcome {
            selected: index,
            correct_index: active.question.correct_index(),
            is_correct,
            score: self.score,
        })
    }

    /// Clear the active question. Returns false if there was none.
    pub fn dismiss(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: i64) -> Arc<PracticeQuestion> {
        Arc::new(
            PracticeQuestion::new(
                "Which service stores objects?",
                options.iter().map(|s| s.to_string()).collect(),
                correct,
                "S3 is object storage.",
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_starts_inactive() {
        let quiz = QuizState::new();
        assert_eq!(quiz.phase(), QuizPhase::Inactive);
        assert_eq!(quiz.score(), Score::default());
        assert!(quiz.active_question().is_none());
    }

    #[test]
    fn test_correct_answer_then_locked() {
        let mut quiz = QuizState::new();
        quiz.present(question(&["A", "B", "C"], 1));
        assert_eq!(quiz.phase(), QuizPhase::Presented);
        assert!(quiz.selected_index().is_none());

        let outcome = quiz.select_answer(1).unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.score, Score { correct: 1, total: 1 });
        assert_eq!(quiz.phase(), QuizPhase::Revealed);
        assert_eq!(quiz.selected_index(), Some(1));

        assert_eq!(quiz.select_answer(0), Err(AnswerRejected::AlreadyRevealed));
        assert_eq!(quiz.score(), Score { correct: 1, total: 1 });
        assert_eq!(quiz.selected_index(), Some(1));
    }

    #[test]
    fn test_wrong_answer_counts_total_only() {
        let mut quiz = QuizState::new();
        quiz.present(question(&["A", "B"], 0));
        let outcome = quiz.select_answer(1).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_index, 0);
        assert_eq!(quiz.score(), Score { correct: 0, total: 1 });
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut quiz = QuizState::new();
        quiz.present(question(&["A", "B", "C"], 2));
        assert_eq!(
            quiz.select_answer(3),
            Err(AnswerRejected::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(quiz.phase(), QuizPhase::Presented);
        assert_eq!(quiz.score(), Score::default());
    }

    #[test]
    fn test_answer_without_question() {
        let mut quiz = QuizState::new();
        assert_eq!(quiz.select_answer(0), Err(AnswerRejected::NoActiveQuestion));
        assert_eq!(quiz.score().total, 0);
    }

    #[test]
    fn test_dismiss_keeps_score() {
        let mut quiz = QuizState::new();
        quiz.present(question(&["A", "B"], 0));
        quiz.select_answer(0).unwrap();

        assert!(quiz.dismiss());
        assert_eq!(quiz.phase(), QuizPhase::Inactive);
        assert!(quiz.selected_index().is_none());
        assert_eq!(quiz.score(), Score { correct: 1, total: 1 });

        assert!(!quiz.dismiss());
    }

    #[test]
    fn test_replacing_unanswered_question() {
        let mut quiz = QuizState::new();
        quiz.present(question(&["A", "B"], 0));
        quiz.select_answer(1).unwrap();
        quiz.present(question(&["X", "Y", "Z"], 2));
        assert_eq!(quiz.phase(), QuizPhase::Presented);

        quiz.present(question(&["P", "Q"], 1));
        assert_eq!(quiz.phase(), QuizPhase::Presented);
        assert!(quiz.selected_index().is_none());
        assert_eq!(quiz.active_question().unwrap().options()[0], "P");
        assert_eq!(quiz.score(), Score { correct: 0, total: 1 });
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score { correct: 3, total: 5 }.to_string(), "3/5");
    }
}
