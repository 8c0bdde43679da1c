//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! mg-cli migrate
//! ```
//!
//! Applies `crates/admin/migrations/` and creates the tower-sessions table
//! used for cookie sessions. The console never migrates on startup.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run admin database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Creating cookie session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
