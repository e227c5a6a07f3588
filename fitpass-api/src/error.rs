use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fitpass_catalog::inventory::AdmissionError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Synchronous rejection before any state was written.
    Admission(AdmissionError),
    NotFound(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Admission(err) => {
                let status = match &err {
                    AdmissionError::UnitUnavailable(_) => StatusCode::NOT_FOUND,
                    AdmissionError::SaleWindowClosed(_)
                    | AdmissionError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                    AdmissionError::LimitExceeded { .. }
                    | AdmissionError::PromotionInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                let body = Json(json!({
                    "error": err.to_string(),
                    "reason_code": err.reason_code(),
                }));
                (status, body).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}