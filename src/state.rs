use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::services::daily_word::DailyWordResolver;
use crate::services::llm_provider::LLMProvider;
use crate::services::word_generator::{LlmWordGenerator, StaticWordGenerator, WordGenerator};
use crate::store::{MemoryStore, SqliteStore, StoreError, WordStore};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    store: Arc<dyn WordStore>,
    resolver: Arc<DailyWordResolver>,
}

impl AppState {
    pub fn new(store: Arc<dyn WordStore>, generator: Arc<dyn WordGenerator>) -> Self {
        let resolver = Arc::new(DailyWordResolver::new(Arc::clone(&store), generator));
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            store,
            resolver,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = create_store(config.database_url.as_deref()).await?;
        let generator = create_generator(config);
        tracing::info!(
            store = store.backend(),
            generator = generator.name(),
            "application state ready"
        );
        Ok(Self::new(store, generator))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn store(&self) -> Arc<dyn WordStore> {
        Arc::clone(&self.store)
    }

    pub fn resolver(&self) -> Arc<DailyWordResolver> {
        Arc::clone(&self.resolver)
    }
}

pub async fn create_store(database_url: Option<&str>) -> Result<Arc<dyn WordStore>, StoreError> {
    match database_url {
        Some(url) => Ok(Arc::new(SqliteStore::connect(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, words are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn create_generator(config: &Config) -> Arc<dyn WordGenerator> {
    if config.llm.mock {
        return Arc::new(StaticWordGenerator::new());
    }
    if !config.llm.has_api_key() {
        tracing::warn!("no LLM API key configured, using the built-in word list");
        return Arc::new(StaticWordGenerator::new());
    }
    Arc::new(LlmWordGenerator::new(LLMProvider::new(config.llm.clone())))
}
