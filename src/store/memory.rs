use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

use super::{StoreError, WordStore};
use crate::models::{
    new_id, ContactSubmission, NewContactSubmission, NewQuizQuestion, NewWord, QuizQuestion,
    Word, WordWithQuestions,
};

#[derive(Default)]
struct Inner {
    words: HashMap<String, Word>,
    by_date: HashMap<NaiveDate, String>,
    questions: HashMap<String, Vec<QuizQuestion>>,
    contacts: HashMap<String, ContactSubmission>,
}

impl Inner {
    fn insert_word(&mut self, word: NewWord) -> Result<Word, StoreError> {
        if self.by_date.contains_key(&word.date) {
            return Err(StoreError::DuplicateDate(word.date));
        }
        let word = word.into_word(new_id(), Utc::now());
        self.by_date.insert(word.date, word.id.clone());
        self.words.insert(word.id.clone(), word.clone());
        Ok(word)
    }

    fn sorted_words<'a>(&self, words: impl Iterator<Item = &'a Word>) -> Vec<Word> {
        let mut out: Vec<Word> = words.cloned().collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out
    }
}

/// Map-backed store for development and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word_count(&self) -> usize {
        self.inner.read().words.len()
    }
}

#[async_trait]
impl WordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_word(&self, word: NewWord) -> Result<Word, StoreError> {
        self.inner.write().insert_word(word)
    }

    async fn get_word_by_date(&self, date: NaiveDate) -> Result<Option<Word>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .by_date
            .get(&date)
            .and_then(|id| inner.words.get(id))
            .cloned())
    }

    async fn get_word_by_id(&self, id: &str) -> Result<Option<Word>, StoreError> {
        Ok(self.inner.read().words.get(id).cloned())
    }

    async fn get_words_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Word>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.sorted_words(
            inner
                .words
                .values()
                .filter(|w| w.date >= start && w.date <= end),
        ))
    }

    async fn list_words(&self, limit: usize, offset: usize) -> Result<Vec<Word>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .sorted_words(inner.words.values())
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn create_quiz_question(
        &self,
        word_id: &str,
        question: NewQuizQuestion,
    ) -> Result<QuizQuestion, StoreError> {
        let mut inner = self.inner.write();
        if !inner.words.contains_key(word_id) {
            return Err(StoreError::UnknownWord(word_id.to_string()));
        }
        let question = question.into_question(new_id(), word_id.to_string());
        inner
            .questions
            .entry(word_id.to_string())
            .or_default()
            .push(question.clone());
        Ok(question)
    }

    async fn get_quiz_questions_by_word_id(
        &self,
        word_id: &str,
    ) -> Result<Vec<QuizQuestion>, StoreError> {
        Ok(self
            .inner
            .read()
            .questions
            .get(word_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_contact_submission(
        &self,
        submission: NewContactSubmission,
    ) -> Result<ContactSubmission, StoreError> {
        let submission = submission.into_submission(new_id(), Utc::now());
        self.inner
            .write()
            .contacts
            .insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    async fn create_word_with_questions(
        &self,
        word: NewWord,
        questions: Vec<NewQuizQuestion>,
    ) -> Result<WordWithQuestions, StoreError> {
        let mut inner = self.inner.write();
        let word = inner.insert_word(word)?;
        let questions: Vec<QuizQuestion> = questions
            .into_iter()
            .map(|q| q.into_question(new_id(), word.id.clone()))
            .collect();
        inner.questions.insert(word.id.clone(), questions.clone());
        Ok(WordWithQuestions { word, questions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cefr;

    fn new_word(date: &str) -> NewWord {
        NewWord {
            word: format!("word-{date}"),
            phonetic: "/wɜːd/".into(),
            part_of_speech: "noun".into(),
            cefr: Cefr::B1,
            definition: "a unit of language".into(),
            synonyms: vec!["term".into()],
            antonyms: vec![],
            examples: vec![],
            daily_tip: "tip".into(),
            date: date.parse().unwrap(),
        }
    }

    fn question(text: &str) -> NewQuizQuestion {
        NewQuizQuestion {
            question: text.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: "because".into(),
        }
    }

    #[tokio::test]
    async fn rejects_second_word_for_same_date() {
        let store = MemoryStore::new();
        store.create_word(new_word("2024-05-01")).await.unwrap();

        let err = store.create_word(new_word("2024-05-01")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDate(_)));
        assert_eq!(store.word_count(), 1);
    }

    #[tokio::test]
    async fn lookup_by_date_and_id() {
        let store = MemoryStore::new();
        let created = store.create_word(new_word("2024-05-01")).await.unwrap();

        let by_date = store
            .get_word_by_date("2024-05-01".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_date.id, created.id);
        assert!(store.get_word_by_id(&created.id).await.unwrap().is_some());
        assert!(store.get_word_by_id("missing").await.unwrap().is_none());
        assert!(store
            .get_word_by_date("2024-05-02".parse().unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lists_newest_first_with_window() {
        let store = MemoryStore::new();
        for day in ["2024-01-03", "2024-01-01", "2024-01-05", "2024-01-02"] {
            store.create_word(new_word(day)).await.unwrap();
        }

        let page = store.list_words(2, 1).await.unwrap();
        let dates: Vec<String> = page.iter().map(|w| w.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02"]);

        let past_end = store.list_words(10, 10).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn range_query_is_inclusive() {
        let store = MemoryStore::new();
        for day in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"] {
            store.create_word(new_word(day)).await.unwrap();
        }

        let words = store
            .get_words_by_date_range("2024-01-02".parse().unwrap(), "2024-01-03".parse().unwrap())
            .await
            .unwrap();
        let dates: Vec<String> = words.iter().map(|w| w.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02"]);
    }

    #[tokio::test]
    async fn questions_keep_creation_order_and_require_word() {
        let store = MemoryStore::new();
        let word = store.create_word(new_word("2024-01-01")).await.unwrap();
        store.create_quiz_question(&word.id, question("first")).await.unwrap();
        store.create_quiz_question(&word.id, question("second")).await.unwrap();

        let bundle = store.get_word_with_questions(&word.id).await.unwrap().unwrap();
        let texts: Vec<&str> = bundle.questions.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(bundle.questions.iter().all(|q| q.word_id == word.id));

        let err = store.create_quiz_question("nope", question("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownWord(_)));
    }

    #[tokio::test]
    async fn word_with_questions_is_all_or_nothing_on_conflict() {
        let store = MemoryStore::new();
        store.create_word(new_word("2024-01-01")).await.unwrap();

        let err = store
            .create_word_with_questions(new_word("2024-01-01"), vec![question("q")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDate(_)));
        assert_eq!(store.word_count(), 1);
    }
}
