//! Business-code classification
//!
//! APIs behind this client report application errors in the payload: a
//! `code` field equal to `0` means success, any other value (or no value)
//! means failure. Every interceptor stage shares this step for the
//! rejections it receives.

use serde_json::Value;
use tracing::warn;

use crate::{
    error::{HttpError, Result},
    request::RequestConfig,
    response::ApiResponse,
};

/// Check the `code` field of a payload
pub fn is_success(payload: &Value) -> bool {
    payload.get("code").and_then(Value::as_f64) == Some(0.0)
}

/// Pass a `code == 0` payload through; reject anything else with the payload
pub fn settle(payload: Value) -> Result<Value> {
    if is_success(&payload) {
        return Ok(payload);
    }

    warn!(code = ?payload.get("code"), "Business failure");
    Err(HttpError::Business(payload))
}

/// Values a chain stage can be rebuilt from after a recovered rejection
pub trait Recover: Sized {
    fn recover(payload: Value) -> Result<Self>;
}

impl Recover for RequestConfig {
    fn recover(payload: Value) -> Result<Self> {
        RequestConfig::try_from(payload)
    }
}

impl Recover for ApiResponse {
    fn recover(payload: Value) -> Result<Self> {
        Ok(ApiResponse::from_payload(payload))
    }
}

/// Error step of a chain stage.
///
/// Rejections are settled by their payload; other errors, including
/// transport failures, pass through untouched.
pub fn recover<T: Recover>(error: HttpError) -> Result<T> {
    match error {
        HttpError::Rejected(payload) => T::recover(settle(payload)?),
        other => Err(other),
    }
}
