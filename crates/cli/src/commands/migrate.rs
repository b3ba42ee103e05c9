//! Database migration command.
//!
//! Runs the storefront schema migrations followed by the tower-sessions
//! table migration, so one `slate migrate` prepares a fresh database.

use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use slate_storefront::db::create_pool;

use super::CommandError;

/// Run all database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    info!("Running session store migration...");
    PostgresStore::new(pool.clone()).migrate().await?;

    info!("Migrations complete");
    Ok(())
}
