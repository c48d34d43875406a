use axum::http::StatusCode;
use chrono::NaiveDate;
use daily_word_backend::services::daily_word::today;

mod common;

use common::{create_failing_app, create_test_app, get, post_json, seed_words};

#[tokio::test]
async fn test_health_root() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_health_live() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_info() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/health/info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "daily-word-backend");
    assert_eq!(body["generator"], "counting");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/api/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_wrong_method_returns_404() {
    let app = create_test_app();

    let (status, _) = post_json(&app.router, "/api/today-word", "{}").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_today_word_is_created_once() {
    let app = create_test_app();

    let (status, first) = get(&app.router, "/api/today-word").await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = get(&app.router, "/api/today-word").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["date"], today().format("%Y-%m-%d").to_string());
    assert_eq!(app.generator.calls(), 1);
    assert_eq!(app.store.word_count(), 1);
}

#[tokio::test]
async fn test_today_word_alias_serves_same_word() {
    let app = create_test_app();

    let (_, canonical) = get(&app.router, "/api/today-word").await;
    let (status, alias) = get(&app.router, "/api/word/today").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(canonical["id"], alias["id"]);
}

#[tokio::test]
async fn test_today_word_shape() {
    let app = create_test_app();

    let (_, word) = get(&app.router, "/api/today-word").await;

    for field in [
        "id",
        "word",
        "phonetic",
        "partOfSpeech",
        "cefr",
        "definition",
        "synonyms",
        "antonyms",
        "examples",
        "dailyTip",
        "date",
        "createdAt",
    ] {
        assert!(word.get(field).is_some(), "missing {field}");
    }
    assert!(word["examples"][0]["english"].is_string());
    assert!(word["examples"][0]["arabic"].is_string());
}

#[tokio::test]
async fn test_word_by_date_creates_for_that_date() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/api/word/date/2024-02-29").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2024-02-29");

    let (_, again) = get(&app.router, "/api/word/date/2024-02-29").await;
    assert_eq!(body["id"], again["id"]);
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn test_word_by_date_rejects_bad_format() {
    let app = create_test_app();

    for path in ["/api/word/date/2024-1-5", "/api/word/date/yesterday", "/api/word/date/20240105"] {
        let (status, body) = get(&app.router, path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["code"], "BAD_REQUEST");
    }
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_word_by_date_rejects_impossible_date() {
    let app = create_test_app();

    let (status, _) = get(&app.router, "/api/word/date/2023-02-30").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_quiz_for_unknown_word_is_404() {
    let app = create_test_app();

    let (status, body) = get(&app.router, "/api/word/no-such-id/quiz").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Word not found");
}

#[tokio::test]
async fn test_quiz_returns_word_with_questions() {
    let app = create_test_app();
    let (_, word) = get(&app.router, "/api/today-word").await;
    let id = word["id"].as_str().unwrap();

    let (status, body) = get(&app.router, &format!("/api/word/{id}/quiz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["word"], word["word"]);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    for question in questions {
        assert_eq!(question["wordId"], id);
        let options = question["options"].as_array().unwrap().len() as u64;
        assert!(question["correctAnswer"].as_u64().unwrap() < options);
    }
}

#[tokio::test]
async fn test_archive_defaults() {
    let app = create_test_app();
    seed_words(&app.store, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 12).await;

    let (status, body) = get(&app.router, "/api/words/archive").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words"].as_array().unwrap().len(), 12);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 12);
    assert_eq!(body["pagination"]["hasMore"], false);
    assert_eq!(body["words"][0]["date"], "2024-01-12");
}

#[tokio::test]
async fn test_archive_pages() {
    let app = create_test_app();
    seed_words(&app.store, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 13).await;

    let (_, first) = get(&app.router, "/api/words/archive?page=1&limit=12").await;
    assert_eq!(first["words"].as_array().unwrap().len(), 12);
    assert_eq!(first["pagination"]["hasMore"], true);

    let (_, second) = get(&app.router, "/api/words/archive?page=2&limit=12").await;
    let words = second["words"].as_array().unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(words[0]["date"], "2024-01-01");
    assert_eq!(second["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_archive_invalid_params_fall_back_to_defaults() {
    let app = create_test_app();
    seed_words(&app.store, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3).await;

    let (status, body) = get(&app.router, "/api/words/archive?page=0&limit=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 12);
    assert_eq!(body["pagination"]["hasMore"], false);
    assert_eq!(body["words"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_archive_limit_is_capped() {
    let app = create_test_app();

    let (_, body) = get(&app.router, "/api/words/archive?limit=5000").await;

    assert_eq!(body["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_contact_accepts_valid_submission() {
    let app = create_test_app();

    let (status, body) = post_json(
        &app.router,
        "/api/contact",
        r#"{"name":"Ana","email":"ana@example.com","subject":"Hello","message":"Great words!"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_contact_reports_missing_fields() {
    let app = create_test_app();

    let (status, body) = post_json(&app.router, "/api/contact", r#"{"name":"Ana"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "subject", "message"]);
}

#[tokio::test]
async fn test_contact_rejects_malformed_body() {
    let app = create_test_app();

    let (status, body) = post_json(&app.router, "/api/contact", "not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_generation_failure_is_opaque_500() {
    let app = create_failing_app();

    let (status, body) = get(&app, "/api/today-word").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("upstream secret detail"));

    let (_, archive) = get(&app, "/api/words/archive").await;
    assert_eq!(archive["words"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_sqlite_backed_app_survives_restart() {
    use std::sync::Arc;

    use daily_word_backend::app_with_state;
    use daily_word_backend::services::word_generator::StaticWordGenerator;
    use daily_word_backend::state::AppState;
    use daily_word_backend::store::SqliteStore;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("words.db").display());

    let first_id = {
        let store = SqliteStore::connect(&url).await.unwrap();
        let app = app_with_state(AppState::new(Arc::new(store), Arc::new(StaticWordGenerator::new())));
        let (status, word) = get(&app, "/api/word/date/2024-03-10").await;
        assert_eq!(status, StatusCode::OK);
        word["id"].clone()
    };

    let store = SqliteStore::connect(&url).await.unwrap();
    let app = app_with_state(AppState::new(Arc::new(store), Arc::new(common::FailingGenerator)));
    let (status, word) = get(&app, "/api/word/date/2024-03-10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(word["id"], first_id);

    let id = first_id.as_str().unwrap();
    let (_, quiz) = get(&app, &format!("/api/word/{id}/quiz")).await;
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_sqlite_archive_far_page_is_empty() {
    use std::sync::Arc;

    use daily_word_backend::app_with_state;
    use daily_word_backend::services::word_generator::StaticWordGenerator;
    use daily_word_backend::state::AppState;
    use daily_word_backend::store::{SqliteStore, WordStore};

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("words.db").display());
    let store = SqliteStore::connect(&url).await.unwrap();
    let generator = StaticWordGenerator::new();
    for day in 1..=3 {
        let generated = generator.build(NaiveDate::from_ymd_opt(2024, 1, day).unwrap());
        store
            .create_word_with_questions(generated.word, generated.questions)
            .await
            .unwrap();
    }
    let app = app_with_state(AppState::new(Arc::new(store), Arc::new(generator)));

    let (status, body) = get(&app, "/api/words/archive?page=1000000000000000000&limit=12").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["hasMore"], false);

    let (_, first) = get(&app, "/api/words/archive?page=1&limit=12").await;
    assert_eq!(first["words"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_memory_archive_far_page_is_empty() {
    let app = create_test_app();
    seed_words(&app.store, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3).await;

    let (status, body) = get(&app.router, "/api/words/archive?page=1000000000000000000&limit=12").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words"].as_array().unwrap().len(), 0);
}
