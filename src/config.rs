use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub instance_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    /// Surface unexpected failure messages to clients
    pub verbose_errors: bool,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Failed sign-ins before an account is locked; 0 disables locking
    pub max_failed_attempts: i32,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 20,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Runtime mode, from `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => bail!("unknown environment '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => bail!("unknown log format '{}'", other),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let environment: Environment = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .context("APP_ENV must be one of production, development, test")?;

        let verbose_errors = match env::var("VERBOSE_ERRORS") {
            Ok(value) => value
                .parse::<bool>()
                .context("VERBOSE_ERRORS must be true or false")?,
            Err(_) => !environment.is_production(),
        };

        let default_log_format = if environment.is_production() {
            "json"
        } else {
            "pretty"
        };

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
                acquire_timeout_ms: env::var("DATABASE_ACQUIRE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()
                    .context("DATABASE_ACQUIRE_TIMEOUT_MS must be a valid number")?,
            },
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
                // Used only for debugging/observability. If unset, fall back to HOSTNAME if
                // present (e.g. Docker/Kubernetes), otherwise "unknown".
                instance_id: env::var("INSTANCE_ID")
                    .or_else(|_| env::var("HOSTNAME"))
                    .unwrap_or_else(|_| "unknown".to_string()),
            },
            app: AppConfig {
                environment,
                verbose_errors,
                log_format: env::var("LOG_FORMAT")
                    .unwrap_or_else(|_| default_log_format.to_string())
                    .parse()
                    .context("LOG_FORMAT must be json or pretty")?,
            },
            auth: AuthConfig {
                max_failed_attempts: env::var("AUTH_MAX_FAILED_ATTEMPTS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .context("AUTH_MAX_FAILED_ATTEMPTS must be a valid number")?,
                bcrypt_cost: env::var("AUTH_BCRYPT_COST")
                    .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                    .parse()
                    .context("AUTH_BCRYPT_COST must be a valid number")?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
