use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scheduler::{Answer, Question};

/// One question record as delivered by a bank source, before normalization.
/// Two answers are required, the third and fourth are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub question: String,
    pub answer1: String,
    pub answer2: String,
    #[serde(default)]
    pub answer3: Option<String>,
    #[serde(default)]
    pub answer4: Option<String>,
    #[serde(default)]
    pub answer1_correct: bool,
    #[serde(default)]
    pub answer2_correct: bool,
    #[serde(default)]
    pub answer3_correct: bool,
    #[serde(default)]
    pub answer4_correct: bool,
    /// Playback position the question belongs to, `hh:mm:ss` or `mm:ss`.
    pub due_at_time: String,
}

/// Supplies the question records for a video. Fetching and transport are the
/// source's problem; the core only consumes the parsed records.
pub trait QuestionBankSource: Send + Sync {
    fn fetch_questions(&self, video_id: &str) -> Result<Vec<RawQuestion>>;
}

/// Parse a raw bank payload (a JSON array of records).
pub fn parse_bank_json(payload: &str) -> Result<Vec<RawQuestion>> {
    Ok(serde_json::from_str(payload)?)
}

/// Convert `hh:mm:ss` or `mm:ss` into whole seconds.
pub fn parse_due_time(value: &str) -> Result<u32> {
    let parts: Vec<&str> = value.trim().split(':').collect();
    let numbers: Result<Vec<u32>, _> = parts.iter().map(|p| p.parse::<u32>()).collect();
    let numbers = numbers.map_err(|err| anyhow::anyhow!("bad due time {value:?}: {err}"))?;

    match numbers.as_slice() {
        [minutes, seconds] => Ok(minutes * 60 + seconds),
        [hours, minutes, seconds] => Ok(hours * 3600 + minutes * 60 + seconds),
        _ => anyhow::bail!("bad due time {value:?}: expected mm:ss or hh:mm:ss"),
    }
}

/// Normalize raw records into time-ordered questions with derived due
/// windows. A malformed due time is logged and treated as zero seconds, so
/// the question becomes immediately due rather than killing the session.
pub fn normalize_questions(raw: Vec<RawQuestion>) -> Vec<Question> {
    let mut questions: Vec<Question> = raw
        .into_iter()
        .map(|record| {
            let due_at_seconds = match parse_due_time(&record.due_at_time) {
                Ok(seconds) => seconds,
                Err(err) => {
                    warn!("question due time unusable, treating as 0s: {err}");
                    0
                }
            };

            let mut answers = vec![
                Answer {
                    key: 1,
                    text: record.answer1,
                    correct: record.answer1_correct,
                },
                Answer {
                    key: 2,
                    text: record.answer2,
                    correct: record.answer2_correct,
                },
            ];
            if let Some(text) = record.answer3 {
                answers.push(Answer {
                    key: 3,
                    text,
                    correct: record.answer3_correct,
                });
            }
            if let Some(text) = record.answer4 {
                answers.push(Answer {
                    key: 4,
                    text,
                    correct: record.answer4_correct,
                });
            }

            Question {
                id: Uuid::new_v4(),
                text: record.question,
                answers,
                due_at_seconds,
                due_until_seconds: None,
            }
        })
        .collect();

    questions.sort_by_key(|q| q.due_at_seconds);

    // Each question's window closes where the next one opens; the last stays
    // open to the end of playback.
    let next_due: Vec<Option<u32>> = questions
        .iter()
        .skip(1)
        .map(|q| Some(q.due_at_seconds))
        .chain(std::iter::once(None))
        .collect();
    for (question, due_until) in questions.iter_mut().zip(next_due) {
        question.due_until_seconds = due_until;
    }

    questions
}
