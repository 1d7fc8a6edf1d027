use serde_json::json;
use tracing::error;

use portfolio_base::pal::http::{HttpResponse, HttpStatusCode};
use portfolio_base::{ErrorKind, PortfolioError};

/// Turn a failed operation into the response sent to the client.
///
/// Client errors keep their detail. Everything else is logged and answered with
/// the generic 500 body, so internal state never reaches the client.
pub fn error_response(err: &PortfolioError) -> HttpResponse {
    match err.kind() {
        ErrorKind::NotFound { .. } => detail(HttpStatusCode::NotFound, &err.kind().to_string()),
        ErrorKind::Validation { errors } => {
            let detail: Vec<_> = errors
                .iter()
                .map(|e| json!({ "field": e.field, "message": e.message }))
                .collect();
            HttpResponse::json(
                HttpStatusCode::UnprocessableEntity,
                json!({ "detail": detail }).to_string(),
            )
        }
        ErrorKind::MalformedRequest { message } => detail(HttpStatusCode::BadRequest, message),
        ErrorKind::FileError { .. } | ErrorKind::Message { .. } => {
            error!(error = ?err, "request failed with an internal error");
            HttpResponse::internal_error()
        }
    }
}

/// Response for a path that no route matches.
pub fn not_found() -> HttpResponse {
    detail(HttpStatusCode::NotFound, "Not Found")
}

fn detail(status: HttpStatusCode, message: &str) -> HttpResponse {
    HttpResponse::json(status, json!({ "detail": message }).to_string())
}
