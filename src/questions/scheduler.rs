use std::collections::HashSet;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answer candidate as stored in the bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub key: u8,
    pub text: String,
    pub correct: bool,
}

/// A normalized comprehension question. Immutable after bank normalization.
///
/// `due_until_seconds` is `None` for the last question of a video: its
/// window stays open until playback ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub answers: Vec<Answer>,
    pub due_at_seconds: u32,
    pub due_until_seconds: Option<u32>,
}

impl Question {
    fn window_contains(&self, playback_seconds: f64) -> bool {
        if playback_seconds < self.due_at_seconds as f64 {
            return false;
        }
        match self.due_until_seconds {
            Some(until) => playback_seconds < until as f64,
            None => true,
        }
    }
}

/// An answer as shown to the user, carrying its shuffled position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresentedAnswer {
    pub key: u8,
    pub text: String,
    pub correct: bool,
}

/// The one live question prompt, with its shuffled answer ordering.
/// Exists only between "question triggered" and "decision resolved".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePrompt {
    pub question: Question,
    pub answers: Vec<PresentedAnswer>,
}

impl ActivePrompt {
    /// Shuffle the question's answers for presentation.
    ///
    /// Exactly one presented answer carries the correct flag: the first
    /// candidate the bank marked correct, or the first candidate outright
    /// when the bank marked none, so the UI always has a valid target.
    pub fn present(question: Question) -> Self {
        let correct_key = question
            .answers
            .iter()
            .find(|a| a.correct)
            .or_else(|| question.answers.first())
            .map(|a| a.key);

        let mut answers: Vec<PresentedAnswer> = question
            .answers
            .iter()
            .map(|a| PresentedAnswer {
                key: a.key,
                text: a.text.clone(),
                correct: Some(a.key) == correct_key,
            })
            .collect();
        answers.shuffle(&mut rand::thread_rng());

        Self { question, answers }
    }

    pub fn answer_is_correct(&self, key: u8) -> Option<bool> {
        self.answers.iter().find(|a| a.key == key).map(|a| a.correct)
    }
}

/// What the user chose after seeing whether their answer was right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    /// Resume playback from the current position.
    Continue,
    /// Seek back to the question's due time, then resume.
    Rewind,
}

/// Picks due questions against the playback clock and remembers which ones
/// were already shown. The prompted set only grows; a question is never
/// offered twice, on any trigger path.
#[derive(Debug, Clone, Default)]
pub struct QuestionScheduler {
    questions: Vec<Question>,
    prompted: HashSet<Uuid>,
}

impl QuestionScheduler {
    /// `questions` must already be normalized (time-ordered, windows derived).
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            prompted: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// First question (by ascending due time) whose window contains
    /// `playback_seconds` and which hasn't been prompted yet.
    pub fn find_due(&self, playback_seconds: f64) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| q.window_contains(playback_seconds) && !self.prompted.contains(&q.id))
    }

    /// Like `find_due`, but marks the question as prompted and hands out an
    /// owned copy for the prompt.
    pub fn take_due(&mut self, playback_seconds: f64) -> Option<Question> {
        let question = self.find_due(playback_seconds)?.clone();
        self.prompted.insert(question.id);
        Some(question)
    }

    pub fn prompted_count(&self) -> usize {
        self.prompted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn question(text: &str, due_at: u32, due_until: Option<u32>, answers: Vec<Answer>) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: text.to_string(),
            answers,
            due_at_seconds: due_at,
            due_until_seconds: due_until,
        }
    }

    fn answers(correct_index: Option<usize>) -> Vec<Answer> {
        (1..=4u8)
            .map(|key| Answer {
                key,
                text: format!("answer {key}"),
                correct: correct_index == Some(key as usize - 1),
            })
            .collect()
    }

    #[test]
    fn find_due_respects_the_window() {
        let scheduler = QuestionScheduler::new(vec![question("q", 30, Some(60), answers(Some(0)))]);

        assert!(scheduler.find_due(29.9).is_none());
        assert_eq!(scheduler.find_due(30.0).unwrap().text, "q");
        assert_eq!(scheduler.find_due(45.0).unwrap().text, "q");
        assert!(scheduler.find_due(60.0).is_none());
    }

    #[test]
    fn last_question_window_stays_open() {
        let scheduler = QuestionScheduler::new(vec![question("q", 30, None, answers(Some(0)))]);
        assert_eq!(scheduler.find_due(10_000.0).unwrap().text, "q");
    }

    #[test]
    fn taken_questions_are_never_offered_again() {
        let mut scheduler =
            QuestionScheduler::new(vec![question("q", 30, Some(60), answers(Some(0)))]);

        assert!(scheduler.take_due(45.0).is_some());
        assert!(scheduler.find_due(50.0).is_none());
        assert!(scheduler.take_due(50.0).is_none());
        assert_eq!(scheduler.prompted_count(), 1);
    }

    #[test]
    fn earliest_due_question_wins() {
        let mut scheduler = QuestionScheduler::new(vec![
            question("first", 10, Some(30), answers(Some(0))),
            question("second", 30, None, answers(Some(0))),
        ]);

        // At 35s the first window has closed; only the second is offered.
        assert_eq!(scheduler.take_due(35.0).unwrap().text, "second");
        // Back inside the first window, the first is still available.
        assert_eq!(scheduler.take_due(15.0).unwrap().text, "first");
    }

    #[test]
    fn presentation_keeps_exactly_one_correct_answer() {
        let prompt = ActivePrompt::present(question("q", 0, None, answers(Some(2))));
        assert_eq!(prompt.answers.len(), 4);
        assert_eq!(prompt.answers.iter().filter(|a| a.correct).count(), 1);
        assert!(prompt.answers.iter().find(|a| a.key == 3).unwrap().correct);
    }

    #[test]
    fn unflagged_bank_forces_first_candidate_correct() {
        let prompt = ActivePrompt::present(question("q", 0, None, answers(None)));
        assert_eq!(prompt.answers.iter().filter(|a| a.correct).count(), 1);
        assert!(prompt.answer_is_correct(1).unwrap());
    }

    #[test]
    fn multiple_flags_collapse_to_the_first() {
        let mut multi = answers(Some(1));
        multi[3].correct = true;
        let prompt = ActivePrompt::present(question("q", 0, None, multi));
        assert_eq!(prompt.answers.iter().filter(|a| a.correct).count(), 1);
        assert!(prompt.answer_is_correct(2).unwrap());
        assert!(!prompt.answer_is_correct(4).unwrap());
    }

    #[test]
    fn unknown_answer_key_is_rejected() {
        let prompt = ActivePrompt::present(question("q", 0, None, answers(Some(0))));
        assert_eq!(prompt.answer_is_correct(9), None);
    }

    #[test]
    fn shuffle_preserves_the_answer_set() {
        let prompt = ActivePrompt::present(question("q", 0, None, answers(Some(0))));
        let mut keys: Vec<u8> = prompt.answers.iter().map(|a| a.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3, 4]);
    }
}
