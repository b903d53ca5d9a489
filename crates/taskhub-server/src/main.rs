//! taskhub server: configuration, storage and workflow wiring.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use taskhub_auth::AuthConfig;
use taskhub_db::{DbConfig, DbManager};
use taskhub_server::App;
use taskhub_workflow::WorkflowConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "taskhub-server",
    about = "Multi-tenant task tracker core",
    version
)]
struct Cli {
    /// SurrealDB WebSocket address
    #[arg(long, default_value = "127.0.0.1:8000", env = "TASKHUB_DB_URL")]
    db_url: String,

    #[arg(long, default_value = "taskhub", env = "TASKHUB_DB_NAMESPACE")]
    db_namespace: String,

    #[arg(long, default_value = "main", env = "TASKHUB_DB_DATABASE")]
    db_database: String,

    #[arg(long, default_value = "root", env = "TASKHUB_DB_USER")]
    db_user: String,

    #[arg(
        long,
        default_value = "root",
        env = "TASKHUB_DB_PASSWORD",
        hide_env_values = true
    )]
    db_password: String,

    /// Connection attempts while SurrealDB starts up
    #[arg(long, default_value_t = 5, env = "TASKHUB_DB_CONNECT_ATTEMPTS")]
    db_connect_attempts: u32,

    /// PEM file holding the Ed25519 key that signs access tokens
    #[arg(long, env = "TASKHUB_JWT_PRIVATE_KEY")]
    jwt_private_key: PathBuf,

    /// PEM file holding the matching Ed25519 public key
    #[arg(long, env = "TASKHUB_JWT_PUBLIC_KEY")]
    jwt_public_key: PathBuf,

    #[arg(long, default_value = "taskhub", env = "TASKHUB_JWT_ISSUER")]
    jwt_issuer: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = 86_400, env = "TASKHUB_TOKEN_LIFETIME_SECS")]
    token_lifetime_secs: u64,

    /// Secret prepended to passwords before hashing
    #[arg(long, env = "TASKHUB_PASSWORD_PEPPER", hide_env_values = true)]
    password_pepper: Option<String>,

    /// Upper bound for each best-effort side effect, in milliseconds
    #[arg(long, default_value_t = 5_000, env = "TASKHUB_SIDE_EFFECT_TIMEOUT_MS")]
    side_effect_timeout_ms: u64,

    /// Per-session real-time buffer
    #[arg(long, default_value_t = 64, env = "TASKHUB_REALTIME_BUFFER")]
    realtime_buffer: usize,

    #[arg(long, default_value_t = 2_000, env = "TASKHUB_MAX_COMMENT_LENGTH")]
    max_comment_length: usize,
}

impl Cli {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
            connect_attempts: self.db_connect_attempts,
            ..DbConfig::default()
        }
    }

    async fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let jwt_private_key_pem = tokio::fs::read_to_string(&self.jwt_private_key)
            .await
            .with_context(|| format!("reading {}", self.jwt_private_key.display()))?;
        let jwt_public_key_pem = tokio::fs::read_to_string(&self.jwt_public_key)
            .await
            .with_context(|| format!("reading {}", self.jwt_public_key.display()))?;

        Ok(AuthConfig {
            jwt_private_key_pem,
            jwt_public_key_pem,
            access_token_lifetime_secs: self.token_lifetime_secs,
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.password_pepper.clone(),
            ..AuthConfig::default()
        })
    }

    fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            side_effect_timeout: Duration::from_millis(self.side_effect_timeout_ms),
            realtime_buffer: self.realtime_buffer,
            max_comment_length: self.max_comment_length,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskhub=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting taskhub server...");

    let auth = cli.auth_config().await?;
    let db = DbManager::open(&cli.db_config())
        .await
        .context("opening SurrealDB")?;

    let app = App::build(db.client().clone(), auth, &cli.workflow_config());
    info!("taskhub ready");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown requested");
    app.shutdown().await;

    info!("taskhub server stopped.");
    Ok(())
}
