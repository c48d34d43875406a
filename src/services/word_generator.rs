use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Cefr, Example, NewQuizQuestion, NewWord};
use crate::services::llm_provider::{LLMError, LLMProvider};

/// Questions kept per word; extra questions from the model are dropped.
pub const QUIZ_QUESTION_COUNT: usize = 5;

const SYSTEM_INSTRUCTION: &str = "You are an expert English language teacher and vocabulary \
specialist. Always respond with a single valid JSON object and nothing else.";

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWord {
    pub word: NewWord,
    pub questions: Vec<NewQuizQuestion>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LLMError),
    #[error("generator returned an empty response")]
    Empty,
    #[error("generator returned malformed JSON: {0}")]
    Malformed(String),
    #[error("generator returned invalid content: {0}")]
    Invalid(String),
}

/// Produces the word of the day and its quiz for a given date.
#[async_trait]
pub trait WordGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, date: NaiveDate) -> Result<GeneratedWord, GenerationError>;
}

pub struct LlmWordGenerator {
    provider: LLMProvider,
}

impl LlmWordGenerator {
    pub fn new(provider: LLMProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl WordGenerator for LlmWordGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(&self, date: NaiveDate) -> Result<GeneratedWord, GenerationError> {
        tracing::info!(%date, model = self.provider.model(), "generating daily word");
        let raw = self
            .provider
            .complete_json(SYSTEM_INSTRUCTION, &build_prompt(date))
            .await
            .map_err(|err| match err {
                LLMError::EmptyChoices => GenerationError::Empty,
                other => GenerationError::Llm(other),
            })?;
        parse_generated(&raw, date)
    }
}

pub fn build_prompt(date: NaiveDate) -> String {
    format!(
        r#"Generate a powerful English word for the date {date}. The word must be educational and useful for English learners.

Return a JSON object with these fields:
- "word": the English word
- "phonetic": IPA transcription
- "partOfSpeech": noun, verb, adjective, adverb, ...
- "cefr": one of A1, A2, B1, B2, C1, C2
- "definition": a clear, complete definition
- "synonyms": array of 3-5 synonyms
- "antonyms": array of 2-4 antonyms
- "examples": array of 3 objects, each with "english" (a usage sentence) and "arabic" (its translation)
- "dailyTip": a practical tip about using the word (50-80 words)
- "quizQuestions": array of {QUIZ_QUESTION_COUNT} multiple-choice questions, each with
  "question", "options" (4 strings), "correctAnswer" (0-based index into options) and "explanation"

The same date must always yield the same word. Prefer words common in professional, academic or everyday contexts.
Arabic translations must be accurate and natural."#
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedPayload {
    #[serde(default)]
    word: String,
    #[serde(default)]
    phonetic: String,
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    cefr: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    antonyms: Vec<String>,
    #[serde(default)]
    examples: Vec<Example>,
    #[serde(default)]
    daily_tip: String,
    #[serde(default)]
    quiz_questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: f64,
    #[serde(default)]
    explanation: String,
}

impl GeneratedQuestion {
    fn validate(self, index: usize) -> Result<NewQuizQuestion, GenerationError> {
        if self.question.trim().is_empty() {
            return Err(GenerationError::Invalid(format!("question {index} has no text")));
        }
        let answer = self.correct_answer;
        if answer.fract() != 0.0 || answer < 0.0 || answer as usize >= self.options.len() {
            return Err(GenerationError::Invalid(format!(
                "question {index} has answer {answer} for {} options",
                self.options.len()
            )));
        }
        Ok(NewQuizQuestion {
            question: self.question,
            options: self.options,
            correct_answer: answer as usize,
            explanation: self.explanation,
        })
    }
}

/// Tolerates prose or code fences around the JSON object.
fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub fn parse_generated(raw: &str, date: NaiveDate) -> Result<GeneratedWord, GenerationError> {
    let json = extract_json_from_response(raw);
    if json.is_empty() {
        return Err(GenerationError::Empty);
    }

    let payload: GeneratedPayload =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    if payload.word.trim().is_empty() || payload.definition.trim().is_empty() {
        return Err(GenerationError::Invalid("missing word or definition".into()));
    }
    if payload.examples.is_empty() {
        return Err(GenerationError::Invalid("no usage examples".into()));
    }
    if payload.quiz_questions.is_empty() {
        return Err(GenerationError::Invalid("no quiz questions".into()));
    }

    let cefr: Cefr = payload
        .cefr
        .parse()
        .map_err(|e: crate::models::UnknownCefr| GenerationError::Invalid(e.to_string()))?;

    let questions = payload
        .quiz_questions
        .into_iter()
        .take(QUIZ_QUESTION_COUNT)
        .enumerate()
        .map(|(i, q)| q.validate(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeneratedWord {
        word: NewWord {
            word: payload.word.trim().to_string(),
            phonetic: payload.phonetic,
            part_of_speech: payload.part_of_speech,
            cefr,
            definition: payload.definition,
            synonyms: payload.synonyms,
            antonyms: payload.antonyms,
            examples: payload.examples,
            daily_tip: payload.daily_tip,
            date,
        },
        questions,
    })
}

struct CatalogueEntry {
    word: &'static str,
    phonetic: &'static str,
    part_of_speech: &'static str,
    cefr: Cefr,
    definition: &'static str,
    synonyms: &'static [&'static str],
    antonyms: &'static [&'static str],
    examples: &'static [(&'static str, &'static str)],
    daily_tip: &'static str,
}

const PARTS_OF_SPEECH: [&str; 4] = ["noun", "verb", "adjective", "adverb"];

const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        word: "resilient",
        phonetic: "/rɪˈzɪliənt/",
        part_of_speech: "adjective",
        cefr: Cefr::B2,
        definition: "Able to recover quickly from difficulties or to withstand pressure.",
        synonyms: &["tough", "adaptable", "hardy"],
        antonyms: &["fragile", "vulnerable"],
        examples: &[
            ("Children are often more resilient than adults expect.", "غالبًا ما يكون الأطفال أكثر مرونة مما يتوقع الكبار."),
            ("The company stayed resilient during the crisis.", "بقيت الشركة صامدة خلال الأزمة."),
        ],
        daily_tip: "Use \"resilient\" for people, systems or materials that bounce back. It pairs naturally with nouns such as economy, community and supply chain.",
    },
    CatalogueEntry {
        word: "meticulous",
        phonetic: "/məˈtɪkjələs/",
        part_of_speech: "adjective",
        cefr: Cefr::C1,
        definition: "Showing great attention to detail; very careful and precise.",
        synonyms: &["thorough", "precise", "scrupulous"],
        antonyms: &["careless", "sloppy"],
        examples: &[
            ("She keeps meticulous records of every expense.", "تحتفظ بسجلات دقيقة لكل نفقة."),
            ("The report was meticulous and well organised.", "كان التقرير دقيقًا ومنظمًا جيدًا."),
        ],
        daily_tip: "\"Meticulous\" is a compliment in professional writing. Use it for work, planning or records rather than for people's appearance.",
    },
    CatalogueEntry {
        word: "endeavor",
        phonetic: "/ɪnˈdevər/",
        part_of_speech: "noun",
        cefr: Cefr::C1,
        definition: "A serious attempt to achieve something.",
        synonyms: &["effort", "attempt", "undertaking"],
        antonyms: &["inaction", "idleness"],
        examples: &[
            ("Starting a business is a risky endeavor.", "بدء مشروع تجاري مسعى محفوف بالمخاطر."),
            ("We wish you success in your future endeavors.", "نتمنى لك النجاح في مساعيك المستقبلية."),
        ],
        daily_tip: "\"Endeavor\" sounds formal. It appears often in farewell messages and cover letters, for example \"best of luck in your future endeavors\".",
    },
    CatalogueEntry {
        word: "mitigate",
        phonetic: "/ˈmɪtɪɡeɪt/",
        part_of_speech: "verb",
        cefr: Cefr::C1,
        definition: "To make something bad less severe or serious.",
        synonyms: &["reduce", "alleviate", "ease"],
        antonyms: &["aggravate", "worsen"],
        examples: &[
            ("Planting trees can mitigate the effects of flooding.", "يمكن لزراعة الأشجار أن تخفف من آثار الفيضانات."),
            ("The new policy aims to mitigate risk.", "تهدف السياسة الجديدة إلى تقليل المخاطر."),
        ],
        daily_tip: "You mitigate a problem, a risk or damage. Do not confuse it with \"militate\", which means to be a strong factor against something.",
    },
    CatalogueEntry {
        word: "candid",
        phonetic: "/ˈkændɪd/",
        part_of_speech: "adjective",
        cefr: Cefr::B2,
        definition: "Truthful and straightforward; frank.",
        synonyms: &["frank", "honest", "open"],
        antonyms: &["evasive", "guarded"],
        examples: &[
            ("Thank you for your candid feedback.", "شكرًا لك على ملاحظاتك الصريحة."),
            ("He gave a candid interview about his career.", "أجرى مقابلة صريحة عن مسيرته المهنية."),
        ],
        daily_tip: "A \"candid\" opinion is honest even when it is uncomfortable. A candid photo is one taken without the subject posing.",
    },
    CatalogueEntry {
        word: "diligently",
        phonetic: "/ˈdɪlɪdʒəntli/",
        part_of_speech: "adverb",
        cefr: Cefr::B2,
        definition: "In a careful and hard-working way.",
        synonyms: &["carefully", "industriously", "conscientiously"],
        antonyms: &["lazily", "carelessly"],
        examples: &[
            ("The students worked diligently on their project.", "عمل الطلاب بجد على مشروعهم."),
            ("She diligently checked every figure.", "راجعت كل رقم بعناية."),
        ],
        daily_tip: "Place \"diligently\" right after the verb it describes: work diligently, study diligently, search diligently.",
    },
    CatalogueEntry {
        word: "ambiguous",
        phonetic: "/æmˈbɪɡjuəs/",
        part_of_speech: "adjective",
        cefr: Cefr::C1,
        definition: "Open to more than one interpretation; not clear.",
        synonyms: &["unclear", "vague", "equivocal"],
        antonyms: &["clear", "explicit"],
        examples: &[
            ("The contract contains an ambiguous clause.", "يحتوي العقد على بند غامض."),
            ("His answer was deliberately ambiguous.", "كانت إجابته غامضة عن قصد."),
        ],
        daily_tip: "Something \"ambiguous\" has several possible meanings, while something \"vague\" lacks detail. Legal and technical writing tries hard to avoid both.",
    },
    CatalogueEntry {
        word: "collaborate",
        phonetic: "/kəˈlæbəreɪt/",
        part_of_speech: "verb",
        cefr: Cefr::B2,
        definition: "To work jointly with others on an activity or project.",
        synonyms: &["cooperate", "partner", "team up"],
        antonyms: &["compete", "oppose"],
        examples: &[
            ("The two universities collaborate on research.", "تتعاون الجامعتان في مجال البحث."),
            ("Artists often collaborate to create new work.", "غالبًا ما يتعاون الفنانون لإبداع أعمال جديدة."),
        ],
        daily_tip: "We collaborate with someone on something. The noun is \"collaboration\", and a person you work with is a \"collaborator\".",
    },
];

/// Offline generator backed by a built-in word list. The same date always
/// yields the same word and quiz.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticWordGenerator;

impl StaticWordGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, date: NaiveDate) -> GeneratedWord {
        let seed = date.num_days_from_ce().rem_euclid(i32::MAX) as usize;
        let len = CATALOGUE.len();
        let entry = &CATALOGUE[seed % len];
        let others: Vec<&CatalogueEntry> = (1..len).map(|k| &CATALOGUE[(seed + k) % len]).collect();

        let word = NewWord {
            word: entry.word.to_string(),
            phonetic: entry.phonetic.to_string(),
            part_of_speech: entry.part_of_speech.to_string(),
            cefr: entry.cefr,
            definition: entry.definition.to_string(),
            synonyms: to_strings(entry.synonyms),
            antonyms: to_strings(entry.antonyms),
            examples: entry
                .examples
                .iter()
                .map(|(english, arabic)| Example {
                    english: (*english).to_string(),
                    arabic: (*arabic).to_string(),
                })
                .collect(),
            daily_tip: entry.daily_tip.to_string(),
            date,
        };

        let questions = vec![
            choice(
                format!("What does \"{}\" mean?", entry.word),
                entry.definition,
                others.iter().take(3).map(|o| o.definition).collect(),
                seed,
                format!("\"{}\" means: {}", entry.word, entry.definition),
            ),
            choice(
                format!("Which word is a synonym of \"{}\"?", entry.word),
                entry.synonyms[0],
                vec![entry.antonyms[0], others[0].word, others[1].word],
                seed + 1,
                format!("\"{}\" has a similar meaning to \"{}\".", entry.synonyms[0], entry.word),
            ),
            choice(
                format!("Which word is an antonym of \"{}\"?", entry.word),
                entry.antonyms[0],
                vec![entry.synonyms[0], entry.synonyms[1], others[2].word],
                seed + 2,
                format!("\"{}\" is the opposite of \"{}\".", entry.antonyms[0], entry.word),
            ),
            part_of_speech_question(entry),
            choice(
                format!("Which sentence uses \"{}\" correctly?", entry.word),
                entry.examples[0].0,
                others.iter().take(3).map(|o| o.examples[0].0).collect(),
                seed + 3,
                format!("Only this sentence contains \"{}\" used as a {}.", entry.word, entry.part_of_speech),
            ),
        ];

        GeneratedWord { word, questions }
    }
}

#[async_trait]
impl WordGenerator for StaticWordGenerator {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn generate(&self, date: NaiveDate) -> Result<GeneratedWord, GenerationError> {
        Ok(self.build(date))
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn choice(
    question: String,
    correct: &str,
    distractors: Vec<&str>,
    slot: usize,
    explanation: String,
) -> NewQuizQuestion {
    let mut options = to_strings(&distractors);
    let correct_answer = slot % (options.len() + 1);
    options.insert(correct_answer, correct.to_string());
    NewQuizQuestion {
        question,
        options,
        correct_answer,
        explanation,
    }
}

fn part_of_speech_question(entry: &CatalogueEntry) -> NewQuizQuestion {
    let correct_answer = PARTS_OF_SPEECH
        .iter()
        .position(|p| *p == entry.part_of_speech)
        .unwrap_or(0);
    NewQuizQuestion {
        question: format!("What part of speech is \"{}\"?", entry.word),
        options: to_strings(&PARTS_OF_SPEECH),
        correct_answer,
        explanation: format!("\"{}\" is used as a {}.", entry.word, entry.part_of_speech),
    }
}
