use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};

use crate::Error;
use crate::models::{AuthSession, Credentials, Signup};

pub fn router() -> Router {
    Router::new()
        .route("/login", post(self::post::login))
        .route("/signup", post(self::post::signup))
        .route("/logout", get(self::get::logout))
}

mod post {
    use super::*;

    pub async fn login(
        mut auth: AuthSession,
        Json(credentials): Json<Credentials>,
    ) -> impl IntoResponse {
        let user = match auth.authenticate(credentials).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::info!("Failed to login user: Invalid credentials");
                let e = Error::InvalidCredentials;
                return (e.status_code(), e.to_string());
            }
            Err(e) => {
                tracing::error!("Failed to login user: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        };
        match auth.login(&user).await {
            Ok(_) => {
                tracing::info!("User {} logged in", user.username);
                (StatusCode::OK, "Logged in".to_string())
            }
            Err(e) => {
                tracing::error!("Failed to login user {}: {}", user.username, e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    pub async fn signup(auth: AuthSession, Json(signup): Json<Signup>) -> impl IntoResponse {
        match auth.backend.check_username_exists(&signup.username) {
            Ok(true) => {
                tracing::info!("Failed to signup user: Username already exists");
                let e = Error::UsernameTaken;
                return (e.status_code(), e.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to check username existence: {}", e);
                return (e.status_code(), e.to_string());
            }
        }
        match auth.backend.check_email_exists(&signup.email) {
            Ok(true) => {
                tracing::info!("Failed to signup user: Email already exists");
                let e = Error::EmailTaken;
                return (e.status_code(), e.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to check email existence: {}", e);
                return (e.status_code(), e.to_string());
            }
        }
        match auth.backend.create_user(signup) {
            Ok(user) => {
                tracing::info!("User {} signed up", user.username);
                (StatusCode::OK, "Signed up".to_string())
            }
            Err(e) => {
                tracing::error!("Failed to signup user: {}", e);
                (e.status_code(), e.to_string())
            }
        }
    }
}

mod get {
    use super::*;

    pub async fn logout(mut auth: AuthSession) -> impl IntoResponse {
        match auth.logout().await {
            Ok(_) => {
                tracing::info!("User logged out");
                (StatusCode::OK, "Logged out".to_string())
            }
            Err(e) => {
                tracing::error!("Failed to logout user: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
            }
        }
    }
}
