use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No username bound to the current session.
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("User not found")]
    UserNotFound,

    /// Signup against an existing username. Recovered locally as an
    /// advisory form message; never surfaced as an HTTP error page.
    #[error("Username already taken")]
    DuplicateUsername,

    /// Stored hash did not verify against the supplied password.
    #[error("Incorrect password")]
    InvalidCredential,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Upload error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // The auth gate: anonymous requests to gated pages go back
            // to the login form rather than getting a bare 401.
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::PostNotFound | AppError::CommentNotFound | AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            AppError::DuplicateUsername | AppError::InvalidCredential => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()).into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal()
            }
            AppError::Hash(e) => {
                tracing::error!("Password hash error: {}", e);
                internal()
            }
            AppError::Multipart(e) => {
                tracing::error!("Multipart error: {}", e);
                (StatusCode::BAD_REQUEST, "Malformed upload".to_string()).into_response()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                internal()
            }
        }
    }
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
        .into_response()
}

pub type AppResult<T> = Result<T, AppError>;
