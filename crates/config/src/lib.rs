//! Application configuration.
//!
//! The JSON file under `res/` is embedded at build time and acts as the base
//! layer; environment variables (optionally from a `.env` file) override
//! individual values. See `AppConfig::load`.

mod config_loader;
pub use config_loader::*;

use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

impl JwtConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_seconds)
    }

    pub fn login_access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.login_access_token_seconds)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn email_token_ttl(&self) -> Duration {
        Duration::from_secs(self.email_token_days.saturating_mul(SECONDS_PER_DAY))
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
