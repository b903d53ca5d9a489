//! SurrealDB connection management.

use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::error::DbError;
use crate::schema::run_migrations;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address, e.g. `127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Connection attempts before giving up. At least one is made.
    pub connect_attempts: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "taskhub".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            connect_attempts: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// A live, authenticated SurrealDB client scoped to one namespace and
/// database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, retrying while the database is still coming up.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let attempts = config.connect_attempts.max(1);
        let mut attempt = 1;
        loop {
            match Self::connect_once(config).await {
                Ok(manager) => return Ok(manager),
                Err(e) if attempt < attempts => {
                    warn!(
                        url = %config.url,
                        attempt,
                        attempts,
                        error = %e,
                        "SurrealDB not reachable yet"
                    );
                    attempt += 1;
                    tokio::time::sleep(config.retry_delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// [`Self::connect`] followed by [`run_migrations`].
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        run_migrations(&manager.db).await?;
        Ok(manager)
    }

    async fn connect_once(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );
        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        info!("Connected to SurrealDB");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
