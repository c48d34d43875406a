use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::NewContactSubmission;
use crate::response::{AppError, FieldError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    name: Option<String>,
    email: Option<String>,
    subject: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContactAccepted {
    message: &'static str,
    id: String,
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(form) = payload.map_err(|rejection| {
        AppError::bad_request(format!("Invalid form data: {}", rejection.body_text()))
    })?;
    let submission = validate(form)?;

    let saved = state
        .store()
        .create_contact_submission(submission)
        .await
        .map_err(|err| AppError::internal(format!("contact submission failed: {err}")))?;

    tracing::info!(submission_id = %saved.id, "contact submission stored");
    Ok((
        StatusCode::CREATED,
        Json(ContactAccepted {
            message: "Thank you for your message! We will get back to you soon.",
            id: saved.id,
        }),
    ))
}

fn validate(form: ContactForm) -> Result<NewContactSubmission, AppError> {
    let mut errors = Vec::new();
    let name = required("name", form.name, &mut errors);
    let email = required("email", form.email, &mut errors);
    let subject = required("subject", form.subject, &mut errors);
    let message = required("message", form.message, &mut errors);

    if !email.is_empty() && !looks_like_email(&email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }

    if !errors.is_empty() {
        return Err(AppError::validation("Invalid form data", errors));
    }

    Ok(NewContactSubmission {
        name,
        email,
        subject,
        message,
    })
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> String {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
    }
    value
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
