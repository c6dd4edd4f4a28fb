//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tally_core::{RateLimitError, StoreError};
use tally_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The counter store could not record the hit.
    #[error("Rate limiter unavailable: {0}")]
    RateLimiterUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::RateLimiterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store details stay in the logs, not in the body.
        let error = match self {
            AppError::RateLimiterUnavailable(_) => {
                ErrorResponse::service_unavailable("Rate limiting is temporarily unavailable.")
            }
            AppError::Internal(_) => ErrorResponse::internal_error(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        match err {
            // A window this large is a configuration mistake, not an outage.
            RateLimitError::Store(e @ StoreError::InvalidWindow { .. }) => {
                AppError::Internal(e.to_string())
            }
            RateLimitError::Store(e) => AppError::RateLimiterUnavailable(e.to_string()),
            e @ RateLimitError::WindowOverflow { .. } => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_map_to_503() {
        let err = AppError::from(RateLimitError::Store(StoreError::Connection(
            "refused".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn window_overflow_maps_to_500() {
        let err = AppError::from(RateLimitError::WindowOverflow { seconds: u64::MAX });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unstorable_window_maps_to_500() {
        let err = AppError::from(RateLimitError::Store(StoreError::InvalidWindow {
            seconds: u64::MAX,
        }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
