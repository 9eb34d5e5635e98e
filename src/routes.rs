use crate::common::state::AppState;
use crate::config::Config;
use crate::{analyses, parameters, products, specifications};
use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit};
use axum_keycloak_auth::{Url, instance::KeycloakAuthInstance, instance::KeycloakConfig};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub fn build_router(db: &DatabaseConnection, config: &Config) -> anyhow::Result<Router> {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "SmartLab API", description = "Specification-driven lab analysis capture"),
        modifiers(&SecurityAddon),
        security(
            ("bearerAuth" = [])
        )
    )]
    struct ApiDoc;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "bearerAuth",
                    utoipa::openapi::security::SecurityScheme::Http(
                        utoipa::openapi::security::HttpBuilder::new()
                            .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                            .bearer_format("JWT")
                            .build(),
                    ),
                );
            }
        }
    }

    let keycloak_instance: Option<Arc<KeycloakAuthInstance>> = if config.keycloak_url.is_empty() {
        // Skip Keycloak initialization for tests
        None
    } else {
        let server = Url::parse(&config.keycloak_url)
            .with_context(|| format!("invalid KEYCLOAK_URL '{}'", config.keycloak_url))?;
        Some(Arc::new(KeycloakAuthInstance::new(
            KeycloakConfig::builder()
                .server(server)
                .realm(String::from(&config.keycloak_realm))
                .build(),
        )))
    };

    let app_state: AppState = AppState::new(db.clone(), config.clone(), keycloak_instance);

    // Build the router with OpenAPI documentation
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Root routes
        .nest("/api/products", products::views::router(&app_state))
        .nest("/api/parameters", parameters::views::router(&app_state))
        .nest(
            "/api/product_parameters",
            specifications::views::router(&app_state),
        )
        .nest("/api/analyses", analyses::views::router(&app_state))
        .split_for_parts();

    Ok(router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)))
}
