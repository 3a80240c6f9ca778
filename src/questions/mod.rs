pub mod bank;
pub mod scheduler;

pub use bank::{normalize_questions, parse_bank_json, QuestionBankSource, RawQuestion};
pub use scheduler::{
    ActivePrompt, Answer, Decision, PresentedAnswer, Question, QuestionScheduler,
};
