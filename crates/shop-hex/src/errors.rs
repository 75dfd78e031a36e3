use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop_types::ports::order_repository::RepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}: {details:?}")]
    InvalidInput {
        message: String,
        details: Vec<String>,
    },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Products not found: {0:?}")]
    ProductsNotFound(Vec<String>),

    /// Reserved for uniqueness checks; no current operation produces it.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(message: impl Into<String>, details: Vec<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } | AppError::ProductsNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let body = match self {
            AppError::InvalidInput { message, details } => ErrorBody { message, details },
            AppError::ProductsNotFound(ids) => ErrorBody {
                message: "Some products could not be found.".into(),
                details: ids,
            },
            AppError::Unauthenticated(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m) => ErrorBody {
                message: m,
                details: Vec::new(),
            },
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                ErrorBody {
                    message: "internal error".into(),
                    details: Vec::new(),
                }
            }
        };

        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| "{\"message\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_input_carries_details() {
        let (status, body) = render(AppError::invalid(
            "Invalid order.",
            vec!["items is required".into()],
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid order.");
        assert_eq!(body["details"][0], "items is required");
    }

    #[tokio::test]
    async fn products_not_found_lists_ids() {
        let (status, body) = render(AppError::ProductsNotFound(vec![
            "507f1f77bcf86cd799439011".into(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0], "507f1f77bcf86cd799439011");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak() {
        let (status, body) =
            render(RepoError::DbError("disk full at /var/lib/secret".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn status_mapping() {
        assert_eq!(
            AppError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        let (status, body) = render(AppError::Conflict("Account already exists.".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Account already exists.");
    }
}
