use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Cefr {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Cefr {
    pub const ALL: [Cefr; 6] = [Cefr::A1, Cefr::A2, Cefr::B1, Cefr::B2, Cefr::C1, Cefr::C2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cefr::A1 => "A1",
            Cefr::A2 => "A2",
            Cefr::B1 => "B1",
            Cefr::B2 => "B2",
            Cefr::C1 => "C1",
            Cefr::C2 => "C2",
        }
    }
}

impl fmt::Display for Cefr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCefr(pub String);

impl fmt::Display for UnknownCefr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown CEFR level: {}", self.0)
    }
}

impl std::error::Error for UnknownCefr {}

impl FromStr for Cefr {
    type Err = UnknownCefr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Cefr::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| UnknownCefr(s.to_string()))
    }
}

/// Usage sentence with its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub english: String,
    pub arabic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub word: String,
    pub phonetic: String,
    pub part_of_speech: String,
    pub cefr: Cefr,
    pub definition: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub examples: Vec<Example>,
    pub daily_tip: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A word as produced by the generator, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub word: String,
    pub phonetic: String,
    pub part_of_speech: String,
    pub cefr: Cefr,
    pub definition: String,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub examples: Vec<Example>,
    pub daily_tip: String,
    pub date: NaiveDate,
}

impl NewWord {
    pub fn into_word(self, id: String, created_at: DateTime<Utc>) -> Word {
        Word {
            id,
            word: self.word,
            phonetic: self.phonetic,
            part_of_speech: self.part_of_speech,
            cefr: self.cefr,
            definition: self.definition,
            synonyms: self.synonyms,
            antonyms: self.antonyms,
            examples: self.examples,
            daily_tip: self.daily_tip,
            date: self.date,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub word_id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
    pub explanation: String,
}

/// Question content without its owning word; linked at persist time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl NewQuizQuestion {
    pub fn has_valid_answer(&self) -> bool {
        self.correct_answer < self.options.len()
    }

    pub fn into_question(self, id: String, word_id: String) -> QuizQuestion {
        QuizQuestion {
            id,
            word_id,
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordWithQuestions {
    #[serde(flatten)]
    pub word: Word,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl NewContactSubmission {
    pub fn into_submission(self, id: String, created_at: DateTime<Utc>) -> ContactSubmission {
        ContactSubmission {
            id,
            name: self.name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            created_at,
        }
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
