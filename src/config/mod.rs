//! Immutable service configuration, loaded once at startup.

use anyhow::anyhow;
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    /// Base URL used when building reset/verify links in outbound email.
    pub base_url: String,
    pub allowed_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub smtp: Option<SmtpConfig>,
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Process-wide HS256 signing secret. Never rotated at runtime; key
    /// compromise means invalidating every outstanding token.
    pub secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
    pub reset_password_expiry_minutes: i64,
    pub verify_email_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str.parse().map_err(|e: String| anyhow!(e))?;
        let is_prod = environment == Environment::Prod;

        let config = Config {
            environment,
            service_name: get_env("SERVICE_NAME", Some("identity-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| anyhow!("invalid PORT: {}", e))?,
            base_url: get_env("BASE_URL", Some("http://localhost:3000"), is_prod)?,
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", None, is_prod)?,
                access_expiry_minutes: parse_env("JWT_ACCESS_EXPIRY_MINUTES", "30", is_prod)?,
                refresh_expiry_days: parse_env("JWT_REFRESH_EXPIRY_DAYS", "30", is_prod)?,
                reset_password_expiry_minutes: parse_env(
                    "JWT_RESET_PASSWORD_EXPIRY_MINUTES",
                    "10",
                    is_prod,
                )?,
                verify_email_expiry_minutes: parse_env(
                    "JWT_VERIFY_EMAIL_EXPIRY_MINUTES",
                    "10",
                    is_prod,
                )?,
            },
            smtp: match env::var("SMTP_HOST") {
                Ok(host) => Some(SmtpConfig {
                    host,
                    port: parse_env("SMTP_PORT", "587", is_prod)?,
                    username: get_env("SMTP_USERNAME", None, is_prod)?,
                    password: get_env("SMTP_PASSWORD", None, is_prod)?,
                    from_address: get_env("EMAIL_FROM", None, is_prod)?,
                }),
                Err(_) => None,
            },
            bootstrap: match env::var("BOOTSTRAP_ADMIN_EMAIL") {
                Ok(admin_email) => Some(BootstrapConfig {
                    admin_email,
                    admin_password: get_env("BOOTSTRAP_ADMIN_PASSWORD", None, true)?,
                }),
                Err(_) => None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.port == 0 {
            return Err(anyhow!("PORT must be greater than 0"));
        }

        if self.jwt.secret.len() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 bytes"));
        }

        if self.jwt.access_expiry_minutes <= 0 {
            return Err(anyhow!("JWT_ACCESS_EXPIRY_MINUTES must be positive"));
        }

        if self.jwt.refresh_expiry_days <= 0 {
            return Err(anyhow!("JWT_REFRESH_EXPIRY_DAYS must be positive"));
        }

        if self.jwt.reset_password_expiry_minutes <= 0 || self.jwt.verify_email_expiry_minutes <= 0
        {
            return Err(anyhow!("token expiry settings must be positive"));
        }

        if self.environment == Environment::Prod
            && self.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(anyhow!("Wildcard CORS origin not allowed in production"));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, anyhow::Error> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(anyhow!("{} is required in production but not set", key))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(anyhow!("{} is required but not set", key))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e| anyhow!("invalid {}: {}", key, e))
}
