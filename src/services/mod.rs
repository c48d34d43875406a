pub mod daily_word;
pub mod llm_provider;
pub mod word_generator;
