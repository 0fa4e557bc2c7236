use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use app_error::{AppError, AppResult};

const DEFAULT_JWT_SECRET: &str = "change-me-development-only-jwt-secret-key";
// Upper bounds keep token expiry arithmetic far from overflow
const MAX_ACCESS_TOKEN_SECONDS: u64 = 7 * 24 * 60 * 60;
const MAX_TOKEN_DAYS: u64 = 365;

/// Complete application configuration loaded from JSON file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database: SurrealDbConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    /// Milliseconds
    pub connection_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
    /// Seconds
    pub request_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of access tokens minted by the refresh endpoint
    pub access_token_seconds: u64,
    /// Lifetime of access tokens minted by login
    pub login_access_token_seconds: u64,
    pub refresh_token_days: u64,
    pub email_token_days: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_number: bool,
    pub require_special: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MailConfig {
    /// No SMTP section means confirmation mails are only logged
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    pub from_name: String,
    /// Public origin used to build confirmation links
    pub base_url: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

// Don't accidentally log credentials
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load the embedded configuration, then apply `.env` / environment overrides
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let config_content = include_str!("../res/app-config.json");

        let mut config = match serde_json::from_str::<AppConfig>(config_content) {
            Ok(conf) => {
                info!("Loaded configuration for environment: {}", conf.environment);
                conf
            }
            Err(e) => {
                warn!(
                    "Failed to parse embedded config: {}. Using default configuration.",
                    e
                );
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup; `load` passes the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn set_string(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set_string(&mut self.environment, lookup("APP_ENVIRONMENT"));
        set_string(&mut self.server.host, lookup("SERVER_HOST"));
        if let Some(port) = lookup("SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid SERVER_PORT: {}", port),
            }
        }

        set_string(&mut self.database.endpoint, lookup("DATABASE_ENDPOINT"));
        set_string(&mut self.database.username, lookup("DATABASE_USERNAME"));
        set_string(&mut self.database.password, lookup("DATABASE_PASSWORD"));
        set_string(&mut self.database.namespace, lookup("DATABASE_NAMESPACE"));
        set_string(&mut self.database.database, lookup("DATABASE_NAME"));

        set_string(&mut self.security.jwt.secret, lookup("JWT_SECRET"));

        if let Some(host) = lookup("SMTP_HOST") {
            let smtp = self.mail.smtp.get_or_insert_with(|| SmtpConfig {
                host: String::new(),
                port: 465,
                username: String::new(),
                password: String::new(),
            });
            smtp.host = host;
        }
        if let Some(smtp) = self.mail.smtp.as_mut() {
            if let Some(port) = lookup("SMTP_PORT") {
                match port.parse() {
                    Ok(port) => smtp.port = port,
                    Err(_) => warn!("Ignoring invalid SMTP_PORT: {}", port),
                }
            }
            set_string(&mut smtp.username, lookup("SMTP_USERNAME"));
            set_string(&mut smtp.password, lookup("SMTP_PASSWORD"));
        }
        set_string(&mut self.mail.from_address, lookup("MAIL_FROM"));
        set_string(&mut self.mail.base_url, lookup("APP_BASE_URL"));

        set_string(&mut self.monitoring.sentry.dsn, lookup("SENTRY_DSN"));
        set_string(&mut self.monitoring.logging.level, lookup("LOG_LEVEL"));
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.is_production();

        self.validate_database_config(is_production, &mut errors);

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        let jwt = &self.security.jwt;
        if jwt.secret.trim().is_empty() {
            errors.push("JWT secret cannot be empty".to_string());
        } else if is_production && (jwt.secret.len() < 32 || jwt.secret == DEFAULT_JWT_SECRET) {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if jwt.access_token_seconds == 0
            || jwt.login_access_token_seconds == 0
            || jwt.refresh_token_days == 0
            || jwt.email_token_days == 0
        {
            errors.push("Token lifetimes must be greater than 0".to_string());
        }

        if jwt.access_token_seconds > MAX_ACCESS_TOKEN_SECONDS
            || jwt.login_access_token_seconds > MAX_ACCESS_TOKEN_SECONDS
        {
            errors.push(format!(
                "Access token lifetimes cannot exceed {} seconds",
                MAX_ACCESS_TOKEN_SECONDS
            ));
        }

        if jwt.refresh_token_days > MAX_TOKEN_DAYS || jwt.email_token_days > MAX_TOKEN_DAYS {
            errors.push(format!(
                "Refresh and email token lifetimes cannot exceed {} days",
                MAX_TOKEN_DAYS
            ));
        }

        let password = &self.security.password;
        if password.min_length == 0 || password.min_length > password.max_length {
            errors.push(format!(
                "Password length bounds are inconsistent: {}..{}",
                password.min_length, password.max_length
            ));
        }

        if let Some(ref smtp) = self.mail.smtp {
            if smtp.host.trim().is_empty() {
                errors.push("SMTP host cannot be empty".to_string());
            }
        }

        if self.mail.base_url.trim().is_empty() {
            errors.push("Mail base URL cannot be empty".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_database_config(&self, is_production: bool, errors: &mut Vec<String>) {
        let db_config = &self.database;

        if db_config.endpoint.trim().is_empty() {
            errors.push("Database endpoint cannot be empty".to_string());
        } else if is_production
            && !db_config.endpoint.starts_with("wss://")
            && !db_config.endpoint.starts_with("mem://")
        {
            errors.push(
                "Database should use a secure 'wss://' connection in production".to_string(),
            );
        }

        if db_config.namespace.trim().is_empty() {
            errors.push("Database namespace cannot be empty".to_string());
        }

        if db_config.database.trim().is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if is_production {
            if db_config.username == "root" {
                errors.push(
                    "Using default 'root' database username in production is insecure"
                        .to_string(),
                );
            }

            if db_config.password == "root" {
                errors.push(
                    "Using default 'root' database password in production is insecure"
                        .to_string(),
                );
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: SurrealDbConfig {
                endpoint: "mem://".to_string(),
                username: "root".to_string(),
                password: "root".to_string(),
                namespace: "contacts".to_string(),
                database: "contactsApi".to_string(),
                connection_timeout: 5000,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                body_limit: 1048576, // 1MB
                request_timeout: 30,
            },
            security: SecurityConfig {
                jwt: JwtConfig {
                    secret: DEFAULT_JWT_SECRET.to_string(),
                    access_token_seconds: 900,
                    login_access_token_seconds: 7200,
                    refresh_token_days: 7,
                    email_token_days: 7,
                },
                cors: CorsConfig {
                    allowed_origins: vec!["*".to_string()],
                    allowed_methods: vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "DELETE".to_string(),
                        "OPTIONS".to_string(),
                    ],
                    allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                },
                password: PasswordConfig {
                    min_length: 6,
                    max_length: 64,
                    require_uppercase: false,
                    require_lowercase: false,
                    require_number: false,
                    require_special: false,
                },
            },
            mail: MailConfig {
                smtp: None,
                from_address: "no-reply@contacts.local".to_string(),
                from_name: "Contacts API".to_string(),
                base_url: "http://localhost:8000".to_string(),
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: "".to_string(),
                    sample_rate: 1.0,
                    traces_sample_rate: 0.2,
                    environment: "development".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "full".to_string(),
                },
            },
        }
    }
}
