pub mod auth;
pub mod models;
pub mod schema;
pub mod servers;
pub mod utils;

use std::path::PathBuf;

use axum::Router;
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{self, MemoryStore, SessionManagerLayer},
};
use diesel::{PgConnection, r2d2::ConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use r2d2::Pool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::sqlx::PgPool;
pub use utils::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub async fn create_router_with_state() -> axum::Router {
    // First get the database URL from the environment
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in the environment");
    // Then create a connection pool
    let session_pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to the database");
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let db_connection_pool = Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool");
    // Create a connection to the database
    let mut conn = db_connection_pool
        .get()
        .expect("Failed to get a connection from the pool");
    // Run the migrations
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    tracing::info!("Migrations completed successfully");
    drop(conn);
    // session manager
    let session_store = tower_sessions_sqlx_store::PostgresStore::new(session_pool.clone());
    session_store
        .migrate()
        .await
        .expect("Failed to migrate session store");
    let session_store =
        tower_sessions::CachingSessionStore::new(MemoryStore::default(), session_store);
    let session_manager_layer = SessionManagerLayer::new(session_store);
    // create auth backend
    let auth_backend = models::Backend::new(db_connection_pool);
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_manager_layer).build();

    let static_files = ServeDir::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("images"));

    Router::new()
        .nest("/servers", crate::servers::web::router())
        .nest("/auth", crate::auth::web::router())
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .nest_service("/static", static_files)
}
