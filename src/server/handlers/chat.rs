use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::server::middleware::RequestId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub msg: String,
}

fn validate_question(question: &str, max_len: usize) -> Result<&str, ApiError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ApiError::Validation("question must not be empty".to_string()));
    }
    let len = question.chars().count();
    if len > max_len {
        return Err(ApiError::Validation(format!(
            "question is {} characters long; the limit is {}",
            len, max_len
        )));
    }
    Ok(question)
}

async fn answer(state: &AppState, request_id: &RequestId, question: &str) -> Result<String, ApiError> {
    let question = validate_question(question, state.settings.server.max_question_length)?;
    tracing::info!("Question received ({} chars)", question.chars().count());

    match state.pipeline.answer(question).await {
        Ok(result) => {
            tracing::debug!("Answer generated from {} chunk(s)", result.context.len());
            Ok(result.answer)
        }
        Err(err) => {
            tracing::error!(request_id = %request_id.0, "Failed to answer question: {}", err);
            Err(err.into())
        }
    }
}

/// `POST /medicalchatbot` with `{"question": ...}`.
pub async fn medical_chatbot(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(payload) = payload?;
    let answer = answer(&state, &request_id, &payload.question).await?;
    Ok(Json(AnswerResponse { answer }))
}

/// `GET|POST /get` with form field `msg`; replies with the bare answer text.
pub async fn get_answer(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    form: Result<Form<MessageForm>, FormRejection>,
) -> Result<String, ApiError> {
    let Form(form) = form?;
    answer(&state, &request_id, &form.msg).await
}
