use crate::common::auth::ADMIN_ROLE;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

pub const DEFAULT_FALLBACK_NOTE: &str = "Recorded via SmartLab dynamic form";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: Option<String>,
    pub app_name: String,
    pub keycloak_ui_id: String,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub deployment: String,
    pub admin_role: String,
    pub listen_addr: String,
    /// Note stored on an analysis session when no lot reference was captured
    pub submission_fallback_note: String,
    pub tests_running: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available
        let db_url = env::var("DB_URL").ok().or_else(|| {
            Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").expect("DB_USER must be set"),
                env::var("DB_PASSWORD").expect("DB_PASSWORD must be set"),
                env::var("DB_HOST").expect("DB_HOST must be set"),
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").expect("DB_NAME must be set"),
            ))
        });

        Config {
            app_name: env::var("APP_NAME").expect("APP_NAME must be set"),
            keycloak_ui_id: env::var("KEYCLOAK_UI_ID").expect("KEYCLOAK_UI_ID must be set"),
            keycloak_url: env::var("KEYCLOAK_URL").expect("KEYCLOAK_URL must be set"),
            keycloak_realm: env::var("KEYCLOAK_REALM").expect("KEYCLOAK_REALM must be set"),
            deployment: env::var("DEPLOYMENT")
                .expect("DEPLOYMENT must be set, this can be local, dev, stage, or prod"),
            admin_role: ADMIN_ROLE.to_string(),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            submission_fallback_note: env::var("SUBMISSION_FALLBACK_NOTE")
                .ok()
                .filter(|note| !note.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FALLBACK_NOTE.to_string()),
            tests_running: false,
            db_url,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "smartlab-api-test".to_string(),
            keycloak_ui_id: "test-ui".to_string(),
            keycloak_url: "http://localhost:8080".to_string(),
            keycloak_realm: "test-realm".to_string(),
            deployment: "test".to_string(),
            admin_role: ADMIN_ROLE.to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            submission_fallback_note: DEFAULT_FALLBACK_NOTE.to_string(),
            tests_running: true,
            db_url: None,
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::Config;
    use crate::routes::build_router;
    use axum::Router;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    /// Every test gets its own in-memory SQLite database with the full schema.
    /// A single pooled connection keeps the database alive for the whole test.
    pub async fn setup_test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("Failed to connect to test database");

        use migration::{Migrator, MigratorTrait};
        Migrator::up(&db, None)
            .await
            .expect("Failed to run database migrations");

        db
    }

    pub async fn setup_test_app() -> Router {
        let db = setup_test_db().await;
        setup_test_app_with_db(&db)
    }

    pub fn setup_test_app_with_db(db: &DatabaseConnection) -> Router {
        let mut config = Config::for_tests();
        // Disable Keycloak for tests by setting the URL to empty
        config.keycloak_url = String::new();
        build_router(db, &config).expect("Failed to build router")
    }
}
