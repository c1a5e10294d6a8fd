pub mod answer_question;
pub mod refresh_index;

pub use answer_question::AnswerQuestionUseCase;
pub use refresh_index::RefreshIndexUseCase;
