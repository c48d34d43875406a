use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Word;
use crate::response::AppError;
use crate::services::daily_word::ResolveError;
use crate::state::AppState;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 12;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ArchiveQuery {
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    page: usize,
    limit: usize,
    has_more: bool,
}

#[derive(Debug, Serialize)]
struct ArchiveResponse {
    words: Vec<Word>,
    pagination: Pagination,
}

pub async fn today_word(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let word = state
        .resolver()
        .resolve_today()
        .await
        .map_err(|err| resolve_failure("today's word", err))?;
    Ok(Json(word))
}

pub async fn word_by_date(
    State(state): State<AppState>,
    Path(raw_date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&raw_date)?;
    let word = state
        .resolver()
        .resolve(date)
        .await
        .map_err(|err| resolve_failure("word for date", err))?;
    Ok(Json(word))
}

pub async fn word_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bundle = state
        .store()
        .get_word_with_questions(&id)
        .await
        .map_err(|err| AppError::internal(format!("quiz lookup for {id} failed: {err}")))?
        .ok_or_else(|| AppError::not_found("Word not found"))?;
    Ok(Json(bundle))
}

pub async fn archive(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = positive_or(query.page.as_deref(), DEFAULT_PAGE);
    let limit = positive_or(query.limit.as_deref(), DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = (page - 1).saturating_mul(limit).min(i64::MAX as usize);

    // one extra row tells whether another page exists
    let mut words = state
        .store()
        .list_words(limit + 1, offset)
        .await
        .map_err(|err| AppError::internal(format!("archive listing failed: {err}")))?;

    let has_more = words.len() > limit;
    words.truncate(limit);
    Ok(Json(ArchiveResponse {
        words,
        pagination: Pagination {
            page,
            limit,
            has_more,
        },
    }))
}

/// Strict `YYYY-MM-DD` that must also be a real calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let well_formed = raw.len() == 10
        && raw.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(AppError::bad_request("Invalid date format. Use YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("{raw} is not a valid calendar date")))
}

fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn resolve_failure(what: &str, err: ResolveError) -> AppError {
    AppError::internal(format!("failed to fetch {what}: {err}"))
}
