//! PostgreSQL connection pooling and schema management.
//!
//! The session store borrows the pool from [`Database`]; migrations ship
//! with the crate and are applied at startup.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::session::{GameError, GameResult, PgSessionStore};

pub mod config;
pub mod timeouts;

pub use config::DatabaseConfig;

use timeouts::{LONG_OPERATION_TIMEOUT, with_timeout};

/// Connection pool for the session tables
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Validate `config` and open the pool
    ///
    /// # Errors
    ///
    /// * `GameError::InvalidArgument` - pool sizing is inconsistent
    /// * `GameError::Database` - the server could not be reached
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use meksikaner::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), meksikaner::GameError> {
    ///     let db = Database::connect(&DatabaseConfig::development()).await?;
    ///     db.migrate().await?;
    ///     let store = db.session_store();
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: &DatabaseConfig) -> GameResult<Self> {
        config.validate().map_err(GameError::InvalidArgument)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        log::info!(
            "Database pool open ({}..{} connections)",
            config.min_connections,
            config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Session store sharing this pool
    pub fn session_store(&self) -> PgSessionStore {
        PgSessionStore::new(self.pool.clone())
    }

    /// Apply the bundled `migrations/` directory
    pub async fn migrate(&self) -> GameResult<()> {
        with_timeout(LONG_OPERATION_TIMEOUT, async {
            sqlx::migrate!("./migrations")
                .run(&self.pool)
                .await
                .map_err(|e| GameError::Storage(format!("Migration failed: {e}")))
        })
        .await
    }

    pub async fn close(self) {
        self.pool.close().await;
        log::info!("Database pool closed");
    }
}
