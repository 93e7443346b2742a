use std::env;

use libsql::{Builder, Connection, Database};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{CatalogError, Result};

/// Owns the libsql database handle. Opened once at process start and shared
/// behind the store implementation for the lifetime of the process.
pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Connect to Turso when `QUIZ_DB_URL` is set, otherwise open the local
    /// database file from the config.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = match env::var("QUIZ_DB_URL") {
            Ok(url) => {
                let auth_token =
                    env::var("QUIZ_DB_AUTH_TOKEN").map_err(|_| CatalogError::Storage {
                        message: "QUIZ_DB_AUTH_TOKEN environment variable not set".to_string(),
                    })?;

                info!("Connecting to remote database at {}", url);
                Builder::new_remote(url, auth_token)
                    .build()
                    .await
                    .map_err(|e| CatalogError::Storage {
                        message: format!("Failed to connect to database: {e}"),
                    })?
            }
            Err(_) => {
                info!("Opening local database at {}", config.path);
                Builder::new_local(&config.path)
                    .build()
                    .await
                    .map_err(|e| CatalogError::Storage {
                        message: format!("Failed to open database file: {e}"),
                    })?
            }
        };

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| CatalogError::Storage {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql = include_str!("../migrations/001_create_themes_and_questions.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| CatalogError::Storage {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}
