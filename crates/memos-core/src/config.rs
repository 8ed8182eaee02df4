//! Configuration module
//!
//! Process-level settings loaded from the environment. Storage selection, the
//! local path template and the upload size limit are NOT here: they are system
//! settings read per operation through the settings repository.

use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8081;
const DB_MAX_CONNECTIONS: u32 = 10;
const THUMBNAIL_MAX_CONCURRENCY: usize = 32;
const REMOTE_FETCH_TIMEOUT_SECS: u64 = 60;
const MAX_REQUEST_BODY_MB: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    data_dir: PathBuf,
    database_url: String,
    db_max_connections: u32,
    jwt_secret: String,
    environment: String,
    cors_origins: Vec<String>,
    thumbnail_max_concurrency: usize,
    remote_fetch_timeout_secs: u64,
    external_fetch_allow_private_ips: bool,
    max_request_body_bytes: usize,
    log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            data_dir: PathBuf::from(env::var("MEMOS_DATA").unwrap_or_else(|_| "./data".to_string())),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            environment,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            thumbnail_max_concurrency: env::var("THUMBNAIL_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(THUMBNAIL_MAX_CONCURRENCY),
            remote_fetch_timeout_secs: env::var("REMOTE_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(REMOTE_FETCH_TIMEOUT_SECS),
            external_fetch_allow_private_ips: env::var("EXTERNAL_FETCH_ALLOW_PRIVATE_IPS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            max_request_body_bytes: env::var("MAX_REQUEST_BODY_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(MAX_REQUEST_BODY_MB)
                * 1024
                * 1024,
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 16 characters long"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.thumbnail_max_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_MAX_CONCURRENCY must be greater than zero"
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS must list explicit origins in production"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Root for local assets and the thumbnail cache.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn thumbnail_max_concurrency(&self) -> usize {
        self.thumbnail_max_concurrency
    }

    pub fn remote_fetch_timeout_secs(&self) -> u64 {
        self.remote_fetch_timeout_secs
    }

    /// Lets external-link downloads reach loopback and private networks.
    pub fn external_fetch_allow_private_ips(&self) -> bool {
        self.external_fetch_allow_private_ips
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.max_request_body_bytes
    }

    pub fn log_format(&self) -> &LogFormat {
        &self.log_format
    }

    /// Configuration for tests and embedded use, bypassing the environment.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, jwt_secret: impl Into<String>) -> Self {
        Config {
            server_port: DEFAULT_PORT,
            data_dir: data_dir.into(),
            database_url: "postgres://localhost/memos".to_string(),
            db_max_connections: DB_MAX_CONNECTIONS,
            jwt_secret: jwt_secret.into(),
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            thumbnail_max_concurrency: THUMBNAIL_MAX_CONCURRENCY,
            remote_fetch_timeout_secs: REMOTE_FETCH_TIMEOUT_SECS,
            external_fetch_allow_private_ips: false,
            max_request_body_bytes: MAX_REQUEST_BODY_MB * 1024 * 1024,
            log_format: LogFormat::Pretty,
        }
    }

    pub fn with_thumbnail_max_concurrency(mut self, permits: usize) -> Self {
        self.thumbnail_max_concurrency = permits;
        self
    }

    pub fn with_external_fetch_allow_private_ips(mut self, allow: bool) -> Self {
        self.external_fetch_allow_private_ips = allow;
        self
    }
}
