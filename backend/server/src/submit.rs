//! # Submission
//!
//! One form post, start to finish:
//!
//! 1. Parse the urlencoded body into display values
//! 2. Validate. On failure, answer with the field errors, the submitted values and their "Other" texts
//! 3. Bot-check. A missing token fails the check
//! 4. Prepare the store payload
//! 5. Submit. The store must answer with an id, the user is redirected to the success page with it
//!
//! The two outbound calls run one after the other and neither is retried. Store errors are logged and
//! the user only sees a generic message.
use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use catalog::{FieldErrors, FormRecord, FormSubmission, OtherValues, prepare, validate};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    analytics::{SUBMIT_BOT_REJECTED, SUBMIT_FAILED, SUBMIT_INVALID, SUBMIT_SUCCESS},
    state::State,
    turnstile::Verdict,
};

pub const INVALID_MESSAGE: &str = "Please correct the errors below";
pub const BOT_CHECK_MESSAGE: &str = "Verification failed. Please try again.";
pub const STORE_FAILED_MESSAGE: &str = "There was an error submitting your form. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Redirect { location: String, id: String },
    Invalid {
        errors: FieldErrors,
        values: FormRecord,
        others: OtherValues,
    },
    BotCheckFailed {
        values: FormRecord,
        others: OtherValues,
    },
    StoreFailed {
        values: FormRecord,
        others: OtherValues,
    },
}

impl IntoResponse for SubmissionOutcome {
    fn into_response(self) -> Response {
        match self {
            SubmissionOutcome::Redirect { location, .. } => {
                (StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response()
            }
            SubmissionOutcome::Invalid {
                errors,
                values,
                others,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errors": errors,
                    "message": INVALID_MESSAGE,
                    "values": values,
                    "others": others,
                })),
            )
                .into_response(),
            SubmissionOutcome::BotCheckFailed { values, others } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": BOT_CHECK_MESSAGE, "values": values, "others": others })),
            )
                .into_response(),
            SubmissionOutcome::StoreFailed { values, others } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": STORE_FAILED_MESSAGE, "values": values, "others": others })),
            )
                .into_response(),
        }
    }
}

pub async fn process_submission(state: &State, body: &[u8]) -> SubmissionOutcome {
    let FormSubmission {
        values,
        others,
        turnstile_token,
    } = FormSubmission::from_urlencoded(body);

    let record = match validate(&values, state.config.in_person_rule) {
        Ok(record) => record,
        Err(failure) => {
            info!("Rejected submission with {} invalid fields", failure.errors.len());
            state
                .analytics
                .track(SUBMIT_INVALID, json!({ "error_count": failure.errors.len() }))
                .await;

            return SubmissionOutcome::Invalid {
                errors: failure.errors,
                values: failure.values,
                others,
            };
        }
    };

    let verdict = match turnstile_token.as_deref() {
        Some(token) => state.bot_check.verify(token).await,
        None => Verdict::failed("missing-input-response"),
    };

    if !verdict.success {
        warn!(
            "Bot check failed: {}",
            verdict.error.as_deref().unwrap_or("no error code")
        );
        state.analytics.track(SUBMIT_BOT_REJECTED, json!({})).await;

        return SubmissionOutcome::BotCheckFailed { values, others };
    }

    let payload = prepare(&record, &others);

    match state.store.submit_protest(&payload).await {
        Ok(id) => {
            info!("Stored protest {id}");
            state
                .analytics
                .track(SUBMIT_SUCCESS, json!({ "is_online": record.is_online }))
                .await;

            SubmissionOutcome::Redirect {
                location: format!("{}?id={id}", state.config.success_path),
                id,
            }
        }
        Err(e) => {
            error!("Failed to submit protest: {e}");
            state
                .analytics
                .track(SUBMIT_FAILED, json!({ "stage": "store" }))
                .await;

            SubmissionOutcome::StoreFailed { values, others }
        }
    }
}
