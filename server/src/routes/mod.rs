//! HTTP route handlers.

pub mod health;
pub mod predict;
pub mod retrain;
pub mod upload;

use axum::http::StatusCode;
use ecosort_core::Error;

/// Maps domain errors onto HTTP responses.
///
/// `ModelNotLoaded` is the one recoverable serving failure and maps to 503
/// so clients can retry after a retrain completes.
pub fn error_response(error: Error) -> (StatusCode, String) {
    let status = match &error {
        Error::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        Error::Image(_) | Error::InvalidCategory(_) | Error::InvalidArgument(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::AlreadyRunning => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(Error::ModelNotLoaded).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_response(Error::Image("bad".to_string())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(Error::InvalidCategory("metal".to_string())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(Error::Training("diverged".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
