mod common;
mod config;
mod routes;

mod analyses;
mod parameters;
mod products;
mod specifications;

#[cfg(test)]
mod test_helpers;

use crate::config::Config;
use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing/logging
    tracing_subscriber::fmt::init();
    tracing::info!("Starting server...");

    // Load configuration and environment variables to pass to the application
    let config: Config = Config::from_env();

    let db_url = config
        .db_url
        .as_ref()
        .context("no database URL configured")?;
    let db: DatabaseConnection = Database::connect(db_url)
        .await
        .context("connecting to the database")?;

    if db.ping().await.is_ok() {
        tracing::info!("Connected to the database");
    } else {
        tracing::warn!("Could not connect to the database");
    }

    // Run migrations
    Migrator::up(&db, None)
        .await
        .context("running database migrations")?;

    tracing::info!("DB migrations complete");

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );

    let addr: std::net::SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid LISTEN_ADDR '{}'", config.listen_addr))?;
    tracing::info!("Listening on {addr}");

    let router = routes::build_router(&db, &config)?;

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?,
        router.into_make_service(),
    )
    .await
    .context("serving HTTP")?;

    Ok(())
}
