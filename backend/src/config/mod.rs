//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets and lifetimes, and the
//! outbound SMS provider / SMTP endpoints.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// HS256 signing secret. Missing configuration is fatal at startup.
    pub jwt_secret: String,
    /// Session login token lifetime (default 1 day).
    pub session_token_ttl_seconds: u64,
    /// Federated (OAuth) login token lifetime (default 7 days).
    pub federated_token_ttl_seconds: u64,
    /// Password-reset token lifetime (default 15 minutes).
    pub reset_token_ttl_seconds: u64,
    /// Temporary admin-issued passwords expire after this many hours.
    pub temp_password_ttl_hours: u64,
    pub encryption_key: String,
    pub server_port: u16,
    pub sms_provider_base_url: String,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
    /// Base URL of the web frontend, used to build reset links.
    pub base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        let session_token_ttl_seconds = env::var("SESSION_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("SESSION_TOKEN_TTL_SECONDS must be a valid number")?;

        let federated_token_ttl_seconds = env::var("FEDERATED_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("FEDERATED_TOKEN_TTL_SECONDS must be a valid number")?;

        let reset_token_ttl_seconds = env::var("RESET_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("RESET_TOKEN_TTL_SECONDS must be a valid number")?;

        let temp_password_ttl_hours = env::var("TEMP_PASSWORD_TTL_HOURS")
            .unwrap_or_else(|_| "72".to_string())
            .parse::<u64>()
            .context("TEMP_PASSWORD_TTL_HOURS must be a valid number")?;

        let encryption_key = env::var("ENCRYPTION_KEY").context("ENCRYPTION_KEY not set")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let sms_provider_base_url = env::var("SMS_PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://api.telnyx.com/v2".to_string());

        let email = EmailConfig::from_env()?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            session_token_ttl_seconds,
            federated_token_ttl_seconds,
            reset_token_ttl_seconds,
            temp_password_ttl_hours,
            encryption_key,
            server_port,
            sms_provider_base_url,
            email,
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self> {
        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        let smtp_username = env::var("SMTP_USERNAME").unwrap_or_default();
        let smtp_password = env::var("SMTP_PASSWORD").unwrap_or_default();

        let from_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Switchyard".to_string());
        let from_email =
            env::var("EMAIL_FROM_ADDRESS").unwrap_or_else(|_| "no-reply@localhost".to_string());

        let base_url = env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        Ok(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_name,
            from_email,
            base_url,
        })
    }
}
