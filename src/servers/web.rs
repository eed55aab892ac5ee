use crate::models::{AuthSession, Backend};
use axum::Router;
use axum::response::IntoResponse;
use axum::{extract::DefaultBodyLimit, routing::get, routing::post};
use axum_login::login_required;
use tower_http::limit::RequestBodyLimitLayer;

pub fn router() -> Router {
    let protected = Router::new()
        .route("/join-server", post(post::join_server))
        .route("/create-server", post(post::create_server))
        .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024)) // 5MB limit
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024)) // 5MB limit
        .route_layer(login_required!(Backend));

    // Listing stays reachable anonymously; it gates itself when the request
    // asks for an identity-bound filter.
    Router::new()
        .route("/select", get(get::select_servers))
        .route("/categories", get(get::list_categories))
        .merge(protected)
}

mod post {
    use axum::{Json, extract::Multipart, http::StatusCode};
    use uuid::Uuid;

    use crate::{
        Error,
        utils::images::{save_icon, validate_icon},
    };

    use super::*;

    pub async fn create_server(auth: AuthSession, mut multipart: Multipart) -> impl IntoResponse {
        let mut server_name = None;
        let mut category = None;
        let mut description = None;
        let mut icon_path = None;
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read multipart field: {}", e);
                    return (StatusCode::BAD_REQUEST, "Invalid upload".to_string());
                }
            };
            let name = field.name().unwrap_or("unknown").to_string();
            match name.as_str() {
                "server-name" => match field.text().await {
                    Ok(value) => server_name = Some(value),
                    Err(e) => {
                        tracing::error!("Failed to read server name: {}", e);
                        return (
                            StatusCode::BAD_REQUEST,
                            "Invalid server name".to_string(),
                        );
                    }
                },
                "category" => match field.text().await {
                    Ok(value) => category = Some(value),
                    Err(e) => {
                        tracing::error!("Failed to read category: {}", e);
                        return (StatusCode::BAD_REQUEST, "Invalid category".to_string());
                    }
                },
                "description" => match field.text().await {
                    Ok(value) => description = Some(value),
                    Err(e) => {
                        tracing::error!("Failed to read description: {}", e);
                        return (StatusCode::BAD_REQUEST, "Invalid description".to_string());
                    }
                },
                "server-icon" => {
                    let filename = match field.file_name() {
                        Some(f) => f.to_string(),
                        None => {
                            return (
                                StatusCode::BAD_REQUEST,
                                "Server icon has no filename".to_string(),
                            );
                        }
                    };
                    let content_type = match field.content_type() {
                        Some(ct) => ct.to_string(),
                        None => {
                            return (
                                StatusCode::BAD_REQUEST,
                                "Server icon has no content type".to_string(),
                            );
                        }
                    };
                    if !content_type.starts_with("image/") {
                        return (StatusCode::BAD_REQUEST, "Invalid image type".to_string());
                    }
                    let data = match field.bytes().await {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("Failed to read server icon: {}", e);
                            return (
                                StatusCode::BAD_REQUEST,
                                "Invalid server icon".to_string(),
                            );
                        }
                    };
                    if data.is_empty() {
                        continue;
                    }
                    // The icon must pass the dimension gate before anything
                    // touches the filesystem.
                    if let Err(e) = validate_icon(&data) {
                        tracing::info!("Rejected server icon: {}", e);
                        return (e.status_code(), e.to_string());
                    }
                    match save_icon(&data, &filename).await {
                        Ok(path) => {
                            tracing::info!("Icon stored successfully");
                            icon_path = Some(path);
                        }
                        Err(e) => {
                            tracing::error!("Failed to store icon: {}", e);
                            return (e.status_code(), e.to_string());
                        }
                    }
                }
                _ => {
                    tracing::warn!("Received unknown field: {}", name);
                }
            }
        }
        let (Some(server_name), Some(category)) = (server_name, category) else {
            // remove the icon if it was uploaded
            if let Some(icon) = icon_path {
                let _ = tokio::fs::remove_file(icon).await;
            }
            return (
                StatusCode::BAD_REQUEST,
                "Server name and category are required".to_string(),
            );
        };

        let user = auth.user.unwrap();
        let backend = auth.backend;
        match backend.create_server(
            server_name.as_str(),
            category.as_str(),
            description,
            icon_path.clone(),
            user.id,
        ) {
            Ok(server) => {
                tracing::info!("Server {} created successfully", server.id);
                (StatusCode::OK, serde_json::to_string(&server).unwrap())
            }
            Err(e) => {
                tracing::error!("Failed to create server: {}", e);
                // remove the icon if it was uploaded
                if let Some(icon) = icon_path {
                    let _ = tokio::fs::remove_file(icon).await;
                }
                (e.status_code(), e.to_string())
            }
        }
    }

    #[derive(serde::Deserialize)]
    pub struct JoinServer {
        pub server_id: Uuid,
    }

    pub async fn join_server(auth: AuthSession, Json(join): Json<JoinServer>) -> impl IntoResponse {
        let user = auth.user.unwrap();
        tracing::info!(
            "User {} is attempting to join server {}",
            &user.username,
            join.server_id
        );
        let backend = auth.backend;
        match backend.get_server(join.server_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                let e = Error::ServerNotFound(join.server_id.to_string());
                return (e.status_code(), e.to_string());
            }
            Err(e) => {
                tracing::error!("Failed to look up server {}: {}", join.server_id, e);
                return (e.status_code(), e.to_string());
            }
        }
        match backend.join_user_to_server(user.id, join.server_id) {
            Ok(()) => (StatusCode::OK, "Joined server successfully".to_string()),
            Err(e) => {
                tracing::error!("Failed to join server: {}", e);
                (e.status_code(), e.to_string())
            }
        }
    }
}

mod get {
    use axum::{extract::Query, http::StatusCode};

    use crate::servers::query::{ServerListParams, ServerListQuery};

    use super::*;

    pub async fn select_servers(
        auth: AuthSession,
        Query(params): Query<ServerListParams>,
    ) -> impl IntoResponse {
        let query = ServerListQuery::from(params);
        let backend = auth.backend;
        match backend.list_servers(&query, auth.user.as_ref()) {
            Ok(servers) => {
                tracing::info!("Listed {} servers", servers.len());
                (StatusCode::OK, serde_json::to_string(&servers).unwrap())
            }
            Err(e) => {
                tracing::info!("Failed to list servers: {}", e);
                (e.status_code(), e.to_string())
            }
        }
    }

    pub async fn list_categories(auth: AuthSession) -> impl IntoResponse {
        let backend = auth.backend;
        match backend.list_categories() {
            Ok(categories) => (StatusCode::OK, serde_json::to_string(&categories).unwrap()),
            Err(e) => {
                tracing::error!("Failed to list categories: {}", e);
                (e.status_code(), e.to_string())
            }
        }
    }
}
