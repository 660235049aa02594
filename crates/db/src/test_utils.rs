//! Throwaway `PostgreSQL` databases for the store integration tests.
//!
//! Each test gets its own migrated database so tests can run in parallel.
//! Connection settings come from `TEST_DB_*` environment variables.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::SeaOrmStore;
use crate::migrations::Migrator;

/// Where the test server lives.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database used by [`TestDatabase::connect`].
    pub database: String,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "pitchlane_test"),
            password: env_or("TEST_DB_PASSWORD", "pitchlane_test"),
            database: env_or("TEST_DB_NAME", "pitchlane_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of `database` on the configured server.
    #[must_use]
    pub fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated database holding the pitchlane schema.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    name: String,
    config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured database and bring the schema up to date.
    pub async fn connect(config: TestDbConfig) -> Result<Self, DbErr> {
        let name = config.database.clone();
        let conn = Database::connect(&config.url_for(&name)).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
            name,
            config,
        })
    }

    /// Create and migrate a database no other test uses.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("pitchlane_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %config.database, "Created test database");
        Self::connect(config).await
    }

    /// Shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// A [`SeaOrmStore`] over this database.
    #[must_use]
    pub fn store(&self) -> SeaOrmStore {
        SeaOrmStore::new(self.connection())
    }

    /// Drop the database, disconnecting any store still holding it.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        if let Ok(conn) = Arc::try_unwrap(self.conn) {
            conn.close().await?;
        }

        let admin = Database::connect(&self.config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.name
                ),
            ))
            .await
            .ok();
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.name),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.name, "Dropped test database");
        Ok(())
    }
}
