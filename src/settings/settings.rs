use crate::domain_model::{LOCKOUT_MINUTES_LIMIT, LockoutPolicy, Role};
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const ENV_PREFIX: &str = "LOGINGUARD";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub accounts: Accounts,
    pub cache: Cache,
    pub http: Http,
    pub jwt: Jwt,
    pub lockout: LockoutPolicy,
    pub log: Log,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct Accounts {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
    #[serde(default)]
    pub seed: Vec<SeedAccount>,
}

/// Account created at startup by the memory backend.
#[derive(Deserialize)]
pub struct SeedAccount {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    pub backend: String, // "memory" or "redis"
    pub redis_dsn: Option<String>,
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_prefix() -> String {
    "signin".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub issuer: String,
    pub audience: String,
    pub expire_minutes: u64,
    #[serde(default = "default_refresh_expire_minutes")]
    pub refresh_expire_minutes: u64,
    pub signing_key: String,
}

fn default_refresh_expire_minutes() -> u64 {
    7 * 24 * 60
}

impl Jwt {
    pub fn refresh_lifetime(&self) -> Duration {
        Duration::from_secs(self.refresh_expire_minutes.saturating_mul(60))
    }
}

impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwt")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expire_minutes", &self.expire_minutes)
            .field("refresh_expire_minutes", &self.refresh_expire_minutes)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(default = "default_safety_margin_secs")]
    pub safety_margin_secs: u64,
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

fn default_safety_margin_secs() -> u64 {
    60
}

fn default_upstream_timeout_ms() -> u64 {
    5000
}

impl Session {
    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.lockout.validate().map_err(|e| anyhow!(e))?;
        if self.jwt.signing_key.is_empty() {
            return Err(anyhow!("jwt.signing_key must not be empty"));
        }
        for (name, minutes) in [
            ("jwt.expire_minutes", self.jwt.expire_minutes),
            ("jwt.refresh_expire_minutes", self.jwt.refresh_expire_minutes),
        ] {
            if minutes == 0 {
                return Err(anyhow!("{} must be greater than 0", name));
            }
            if minutes > LOCKOUT_MINUTES_LIMIT {
                return Err(anyhow!(
                    "{} must not exceed {} minutes",
                    name,
                    LOCKOUT_MINUTES_LIMIT
                ));
            }
        }
        if self.session.upstream_timeout_ms == 0 {
            return Err(anyhow!("session.upstream_timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Load settings from `path` (or the build's default file), let
/// `LOGINGUARD__SECTION__KEY` variables override it, then validate.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
