use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::models::Word;
use crate::services::word_generator::{GenerationError, WordGenerator};
use crate::store::{StoreError, WordStore};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("word generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

/// Current calendar date in UTC, the key used for the word of the day.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Get-or-create of the word for a date.
///
/// Creation is serialized per date, so concurrent callers for an uncached date
/// trigger a single generator call. A `DuplicateDate` from the store (another
/// process won the insert) is resolved by re-reading.
pub struct DailyWordResolver {
    store: Arc<dyn WordStore>,
    generator: Arc<dyn WordGenerator>,
    locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl DailyWordResolver {
    pub fn new(store: Arc<dyn WordStore>, generator: Arc<dyn WordGenerator>) -> Self {
        Self {
            store,
            generator,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub async fn resolve_today(&self) -> Result<Word, ResolveError> {
        self.resolve(today()).await
    }

    pub async fn resolve(&self, date: NaiveDate) -> Result<Word, ResolveError> {
        if let Some(word) = self.store.get_word_by_date(date).await? {
            return Ok(word);
        }

        let pending = PendingLock::acquire(self, date);
        let _guard = pending.lock.lock().await;
        self.create_if_absent(date).await
    }

    async fn create_if_absent(&self, date: NaiveDate) -> Result<Word, ResolveError> {
        if let Some(word) = self.store.get_word_by_date(date).await? {
            return Ok(word);
        }

        let generated = self.generator.generate(date).await.map_err(|err| {
            tracing::error!(%date, generator = self.generator.name(), error = %err, "daily word generation failed");
            err
        })?;
        let question_count = generated.questions.len();

        match self
            .store
            .create_word_with_questions(generated.word, generated.questions)
            .await
        {
            Ok(created) => {
                tracing::info!(
                    %date,
                    word_id = %created.word.id,
                    word = %created.word.word,
                    questions = question_count,
                    "daily word created"
                );
                Ok(created.word)
            }
            Err(StoreError::DuplicateDate(_)) => {
                tracing::warn!(%date, "daily word inserted concurrently, re-reading");
                self.store
                    .get_word_by_date(date)
                    .await?
                    .ok_or_else(|| ResolveError::Store(StoreError::DuplicateDate(date)))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn lock_for(&self, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(date).or_default())
    }

    fn release(&self, date: NaiveDate, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock();
        // map entry plus the caller's clone means nobody else is waiting
        if Arc::strong_count(lock) <= 2 {
            locks.remove(&date);
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Releases the per-date lock entry on drop, including when the resolve
/// future is cancelled mid-wait or mid-generation.
struct PendingLock<'a> {
    resolver: &'a DailyWordResolver,
    date: NaiveDate,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> PendingLock<'a> {
    fn acquire(resolver: &'a DailyWordResolver, date: NaiveDate) -> Self {
        let lock = resolver.lock_for(date);
        Self { resolver, date, lock }
    }
}

impl Drop for PendingLock<'_> {
    fn drop(&mut self) {
        self.resolver.release(self.date, &self.lock);
    }
}
