pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    ContactSubmission, NewContactSubmission, NewQuizQuestion, NewWord, QuizQuestion, Word,
    WordWithQuestions,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a word already exists for {0}")]
    DuplicateDate(NaiveDate),
    #[error("word {0} does not exist")]
    UnknownWord(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository over words, their quiz questions and contact submissions.
///
/// Implementations must keep `Word::date` unique: `create_word` for a date that
/// is already populated fails with [`StoreError::DuplicateDate`].
#[async_trait]
pub trait WordStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn create_word(&self, word: NewWord) -> Result<Word, StoreError>;

    async fn get_word_by_date(&self, date: NaiveDate) -> Result<Option<Word>, StoreError>;

    async fn get_word_by_id(&self, id: &str) -> Result<Option<Word>, StoreError>;

    /// Inclusive on both ends, newest first.
    async fn get_words_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Word>, StoreError>;

    /// Newest first.
    async fn list_words(&self, limit: usize, offset: usize) -> Result<Vec<Word>, StoreError>;

    async fn create_quiz_question(
        &self,
        word_id: &str,
        question: NewQuizQuestion,
    ) -> Result<QuizQuestion, StoreError>;

    /// Questions in the order they were created.
    async fn get_quiz_questions_by_word_id(
        &self,
        word_id: &str,
    ) -> Result<Vec<QuizQuestion>, StoreError>;

    async fn create_contact_submission(
        &self,
        submission: NewContactSubmission,
    ) -> Result<ContactSubmission, StoreError>;

    async fn get_word_with_questions(
        &self,
        word_id: &str,
    ) -> Result<Option<WordWithQuestions>, StoreError> {
        let Some(word) = self.get_word_by_id(word_id).await? else {
            return Ok(None);
        };
        let questions = self.get_quiz_questions_by_word_id(word_id).await?;
        Ok(Some(WordWithQuestions { word, questions }))
    }

    /// Persists a word and links every question to it.
    ///
    /// The default is not atomic; backends that can do better override it.
    async fn create_word_with_questions(
        &self,
        word: NewWord,
        questions: Vec<NewQuizQuestion>,
    ) -> Result<WordWithQuestions, StoreError> {
        let word = self.create_word(word).await?;
        let mut created = Vec::with_capacity(questions.len());
        for question in questions {
            created.push(self.create_quiz_question(&word.id, question).await?);
        }
        Ok(WordWithQuestions {
            word,
            questions: created,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
