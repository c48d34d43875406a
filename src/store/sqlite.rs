use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{StoreError, WordStore};
use crate::models::{
    new_id, Cefr, ContactSubmission, NewContactSubmission, NewQuizQuestion, NewWord,
    QuizQuestion, Word, WordWithQuestions,
};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "words" (
    "id" TEXT PRIMARY KEY NOT NULL,
    "word" TEXT NOT NULL,
    "phonetic" TEXT NOT NULL,
    "partOfSpeech" TEXT NOT NULL,
    "cefr" TEXT NOT NULL,
    "definition" TEXT NOT NULL,
    "synonyms" TEXT NOT NULL,
    "antonyms" TEXT NOT NULL,
    "examples" TEXT NOT NULL,
    "dailyTip" TEXT NOT NULL,
    "date" TEXT NOT NULL UNIQUE,
    "createdAt" TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS "quiz_questions" (
    "id" TEXT PRIMARY KEY NOT NULL,
    "wordId" TEXT NOT NULL REFERENCES "words"("id") ON DELETE CASCADE,
    "position" INTEGER NOT NULL,
    "question" TEXT NOT NULL,
    "options" TEXT NOT NULL,
    "correctAnswer" INTEGER NOT NULL,
    "explanation" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "quiz_questions_wordId_idx" ON "quiz_questions" ("wordId");

CREATE TABLE IF NOT EXISTS "contact_submissions" (
    "id" TEXT PRIMARY KEY NOT NULL,
    "name" TEXT NOT NULL,
    "email" TEXT NOT NULL,
    "subject" TEXT NOT NULL,
    "message" TEXT NOT NULL,
    "createdAt" TEXT NOT NULL
);
"#;

const WORD_COLUMNS: &str = r#""id", "word", "phonetic", "partOfSpeech", "cefr", "definition", "synonyms", "antonyms", "examples", "dailyTip", "date", "createdAt""#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // every connection to :memory: opens a separate database
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }
            sqlx::query(trimmed).execute(&self.pool).await?;
        }
        tracing::debug!("sqlite schema applied");
        Ok(())
    }

    async fn select_words(&self, sql: &str, binds: &[&str]) -> Result<Vec<Word>, StoreError> {
        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(*value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(word_from_row).collect()
    }
}

fn map_insert_error(err: sqlx::Error, date: NaiveDate) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateDate(date)
        }
        _ => StoreError::Database(err),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn from_json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, StoreError> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

fn word_from_row(row: &SqliteRow) -> Result<Word, StoreError> {
    let cefr: String = row.try_get("cefr")?;
    let date: String = row.try_get("date")?;

    Ok(Word {
        id: row.try_get("id")?,
        word: row.try_get("word")?,
        phonetic: row.try_get("phonetic")?,
        part_of_speech: row.try_get("partOfSpeech")?,
        cefr: Cefr::from_str(&cefr).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        definition: row.try_get("definition")?,
        synonyms: from_json(row, "synonyms")?,
        antonyms: from_json(row, "antonyms")?,
        examples: from_json(row, "examples")?,
        daily_tip: row.try_get("dailyTip")?,
        date: NaiveDate::from_str(&date).map_err(|e| StoreError::Corrupt(format!("date: {e}")))?,
        created_at: parse_timestamp(row, "createdAt")?,
    })
}

fn question_from_row(row: &SqliteRow) -> Result<QuizQuestion, StoreError> {
    let correct_answer: i64 = row.try_get("correctAnswer")?;
    Ok(QuizQuestion {
        id: row.try_get("id")?,
        word_id: row.try_get("wordId")?,
        question: row.try_get("question")?,
        options: from_json(row, "options")?,
        correct_answer: usize::try_from(correct_answer)
            .map_err(|_| StoreError::Corrupt(format!("correctAnswer: {correct_answer}")))?,
        explanation: row.try_get("explanation")?,
    })
}

async fn insert_word<'e, E>(executor: E, word: &Word) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(&format!(
        r#"INSERT INTO "words" ({WORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
    ))
    .bind(&word.id)
    .bind(&word.word)
    .bind(&word.phonetic)
    .bind(&word.part_of_speech)
    .bind(word.cefr.as_str())
    .bind(&word.definition)
    .bind(to_json(&word.synonyms)?)
    .bind(to_json(&word.antonyms)?)
    .bind(to_json(&word.examples)?)
    .bind(&word.daily_tip)
    .bind(word.date.to_string())
    .bind(word.created_at.to_rfc3339())
    .execute(executor)
    .await
    .map_err(|e| map_insert_error(e, word.date))?;
    Ok(())
}

async fn insert_question<'e, E>(
    executor: E,
    question: &QuizQuestion,
    position: i64,
) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO "quiz_questions"
            ("id", "wordId", "position", "question", "options", "correctAnswer", "explanation")
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&question.id)
    .bind(&question.word_id)
    .bind(position)
    .bind(&question.question)
    .bind(to_json(&question.options)?)
    .bind(question.correct_answer as i64)
    .bind(&question.explanation)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl WordStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn create_word(&self, word: NewWord) -> Result<Word, StoreError> {
        let word = word.into_word(new_id(), Utc::now());
        insert_word(&self.pool, &word).await?;
        Ok(word)
    }

    async fn get_word_by_date(&self, date: NaiveDate) -> Result<Option<Word>, StoreError> {
        let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "date" = ?"#);
        let row = sqlx::query(&sql)
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(word_from_row).transpose()
    }

    async fn get_word_by_id(&self, id: &str) -> Result<Option<Word>, StoreError> {
        let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" = ?"#);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(word_from_row).transpose()
    }

    async fn get_words_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Word>, StoreError> {
        let sql = format!(
            r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "date" >= ? AND "date" <= ? ORDER BY "date" DESC"#
        );
        let (start, end) = (start.to_string(), end.to_string());
        self.select_words(&sql, &[&start, &end]).await
    }

    async fn list_words(&self, limit: usize, offset: usize) -> Result<Vec<Word>, StoreError> {
        let sql = format!(
            r#"SELECT {WORD_COLUMNS} FROM "words" ORDER BY "date" DESC LIMIT ? OFFSET ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(word_from_row).collect()
    }

    async fn create_quiz_question(
        &self,
        word_id: &str,
        question: NewQuizQuestion,
    ) -> Result<QuizQuestion, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar(r#"SELECT "id" FROM "words" WHERE "id" = ?"#)
            .bind(word_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::UnknownWord(word_id.to_string()));
        }

        let position: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("position") + 1, 0) FROM "quiz_questions" WHERE "wordId" = ?"#,
        )
        .bind(word_id)
        .fetch_one(&mut *tx)
        .await?;

        let question = question.into_question(new_id(), word_id.to_string());
        insert_question(&mut *tx, &question, position).await?;
        tx.commit().await?;
        Ok(question)
    }

    async fn get_quiz_questions_by_word_id(
        &self,
        word_id: &str,
    ) -> Result<Vec<QuizQuestion>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "wordId", "question", "options", "correctAnswer", "explanation"
            FROM "quiz_questions"
            WHERE "wordId" = ?
            ORDER BY "position" ASC
            "#,
        )
        .bind(word_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(question_from_row).collect()
    }

    async fn create_contact_submission(
        &self,
        submission: NewContactSubmission,
    ) -> Result<ContactSubmission, StoreError> {
        let submission = submission.into_submission(new_id(), Utc::now());
        sqlx::query(
            r#"
            INSERT INTO "contact_submissions" ("id", "name", "email", "subject", "message", "createdAt")
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.id)
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(submission.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(submission)
    }

    async fn create_word_with_questions(
        &self,
        word: NewWord,
        questions: Vec<NewQuizQuestion>,
    ) -> Result<WordWithQuestions, StoreError> {
        let word = word.into_word(new_id(), Utc::now());
        let questions: Vec<QuizQuestion> = questions
            .into_iter()
            .map(|q| q.into_question(new_id(), word.id.clone()))
            .collect();

        let mut tx = self.pool.begin().await?;
        insert_word(&mut *tx, &word).await?;
        for (position, question) in questions.iter().enumerate() {
            insert_question(&mut *tx, question, position as i64).await?;
        }
        tx.commit().await?;

        Ok(WordWithQuestions { word, questions })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
