use http::StatusCode;
use userstore::{ServiceError, UtilError};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

/// Maps each service failure class to its status code
impl<T> IntoResponseError<T> for Result<T, ServiceError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                tracing::error!("Request failed: {e}");
            }
            (status, e.to_string())
        })
    }
}

/// Malformed path parameters
impl<T> IntoResponseError<T> for Result<T, UtilError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}
