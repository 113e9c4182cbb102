use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Any failure while building a page. Downstream errors are not retried;
/// the visitor gets a 500 carrying the error text.
pub struct SiteError(miette::Error);

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal Server Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for SiteError
where
    E: Into<miette::Error>,
{
    fn from(value: E) -> Self {
        Self(value.into())
    }
}
