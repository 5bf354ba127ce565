use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct LabConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageBackend,
    /// Required when `storage` is `Postgres`.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub password_reset: PasswordResetConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfig {
    pub token_ttl_minutes: i64,
    /// Include the raw token in the reset log line. Dev only.
    pub log_tokens: bool,
}

impl PasswordResetConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub password_reset_attempts: u32,
    pub password_reset_window_seconds: u64,
    /// Key limiters on the first `x-forwarded-for` hop instead of the
    /// socket peer. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl LabConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let storage: StorageBackend = get_env("STORAGE_BACKEND", Some("postgres"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let database = match storage {
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            }),
            StorageBackend::Memory => None,
        };

        let config = LabConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("lab-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),
            storage,
            database,
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", None, is_prod)?,
                expiry_minutes: parse_env("JWT_EXPIRY_MINUTES", "1440", is_prod)?,
            },
            password_reset: PasswordResetConfig {
                token_ttl_minutes: parse_env("PASSWORD_RESET_TOKEN_TTL_MINUTES", "60", is_prod)?,
                log_tokens: !is_prod,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000,http://localhost:5173"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            swagger: SwaggerConfig {
                enabled: parse_env("ENABLE_SWAGGER", "true", is_prod)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("RATE_LIMIT_LOGIN_ATTEMPTS", "5", is_prod)?,
                login_window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", "900", is_prod)?,
                register_attempts: parse_env("RATE_LIMIT_REGISTER_ATTEMPTS", "3", is_prod)?,
                register_window_seconds: parse_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
                password_reset_attempts: parse_env(
                    "RATE_LIMIT_PASSWORD_RESET_ATTEMPTS",
                    "3",
                    is_prod,
                )?,
                password_reset_window_seconds: parse_env(
                    "RATE_LIMIT_PASSWORD_RESET_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
                trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", "false", is_prod)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if self.jwt.expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.password_reset.token_ttl_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PASSWORD_RESET_TOKEN_TTL_MINUTES must be positive"
            )));
        }

        if self.storage == StorageBackend::Postgres && self.database.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres storage backend"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.storage == StorageBackend::Memory {
                tracing::warn!("In-memory storage in production: data is lost on restart");
            }

            if self.swagger.enabled {
                tracing::warn!("Swagger UI is publicly accessible in production");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LabConfig {
        LabConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "lab-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            storage: StorageBackend::Memory,
            database: None,
            jwt: JwtConfig {
                secret: "x".repeat(MIN_JWT_SECRET_BYTES),
                expiry_minutes: 60,
            },
            password_reset: PasswordResetConfig {
                token_ttl_minutes: 60,
                log_tokens: true,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
            swagger: SwaggerConfig { enabled: true },
            rate_limit: RateLimitConfig {
                login_attempts: 5,
                login_window_seconds: 900,
                register_attempts: 3,
                register_window_seconds: 3600,
                password_reset_attempts: 3,
                password_reset_window_seconds: 3600,
                trust_forwarded_for: false,
            },
        }
    }

    #[test]
    fn test_valid_dev_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut c = config();
        c.jwt.secret = "short".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_zero_ttls_rejected() {
        let mut c = config();
        c.password_reset.token_ttl_minutes = 0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.jwt.expiry_minutes = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_prod() {
        let mut c = config();
        c.environment = Environment::Prod;
        assert!(c.validate().is_err());

        c.security.allowed_origins = vec!["https://lab.example.com".to_string()];
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_database() {
        let mut c = config();
        c.storage = StorageBackend::Postgres;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let text = format!("{:?}", config().jwt);
        assert!(!text.contains("xxxx"));
    }
}
