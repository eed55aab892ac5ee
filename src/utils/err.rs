use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("DBPool error: {0}")]
    R2D2(#[from] r2d2::Error),
    #[error("Username or password is incorrect")]
    InvalidCredentials,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Server with id {0} not found")]
    ServerNotFound(String),
    #[error(
        "The maximum allowed dimensions for the icon are 70x70 - size of the uploaded image ({width}, {height})"
    )]
    IconTooLarge { width: u32, height: u32 },
    #[error("Unsupported or corrupt image: {0}")]
    InvalidImageFormat(#[from] image::ImageError),
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Password hash error: {0}")]
    PasswordHash(String),
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::PasswordHash(err.to_string())
    }
}

impl Error {
    /// Status every variant surfaces with. Errors are terminal for the
    /// request; nothing here is retried.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Error::ServerNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidCredentials
            | Error::UsernameTaken
            | Error::EmailTaken
            | Error::InvalidArgument(_)
            | Error::IconTooLarge { .. }
            | Error::InvalidImageFormat(_)
            | Error::InvalidFileName(_)
            | Error::Multipart(_) => StatusCode::BAD_REQUEST,
            Error::Database(_)
            | Error::R2D2(_)
            | Error::PasswordHash(_)
            | Error::File(_)
            | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_gated_filters_map_to_unauthorized() {
        assert_eq!(
            Error::AuthenticationRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn missing_server_maps_to_not_found() {
        let err = Error::ServerNotFound("999".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn caller_errors_map_to_bad_request() {
        assert_eq!(
            Error::InvalidArgument("Server value error".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::IconTooLarge {
                width: 80,
                height: 50
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn icon_error_reports_observed_dimensions() {
        let err = Error::IconTooLarge {
            width: 80,
            height: 50,
        };
        assert!(err.to_string().contains("(80, 50)"));
    }
}
