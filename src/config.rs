/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, APP_ENV, WATCHDOG_INSTANCES など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One `key=secret` entry of `WATCHDOG_INSTANCES`.
#[derive(Clone, PartialEq, Eq)]
pub struct InstanceEntry {
    pub key: String,
    // None: registered without a secret (not provisioned yet)
    pub secret: Option<String>,
}

impl fmt::Debug for InstanceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceEntry")
            .field("key", &self.key)
            .field("has_secret", &self.secret.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub instances: Vec<InstanceEntry>,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 5000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let instances =
            parse_instances(&std::env::var("WATCHDOG_INSTANCES").unwrap_or_default())?;

        let request_timeout =
            parse_request_timeout(std::env::var("REQUEST_TIMEOUT_SECONDS").ok().as_deref())?;

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()
            .map_err(|_| ConfigError::Invalid("REQUEST_BODY_LIMIT_BYTES"))?
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            instances,
            request_timeout,
            request_body_limit_bytes,
        })
    }
}

/// Seconds, default 30. Zero would time out every request.
pub fn parse_request_timeout(raw: Option<&str>) -> Result<Duration, ConfigError> {
    const KEY: &str = "REQUEST_TIMEOUT_SECONDS";

    let seconds = match raw {
        Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid(KEY))?,
        None => 30,
    };
    if seconds == 0 {
        return Err(ConfigError::Invalid(KEY));
    }

    Ok(Duration::from_secs(seconds))
}

/// Parse `key=secret,key2=secret2`.
///
/// - `key=` registers the instance without a secret
/// - keys are trimmed; secrets are taken verbatim
/// - an entry without `=`, an empty key, a duplicated key or a secret with
///   leading/trailing whitespace is rejected
pub fn parse_instances(raw: &str) -> Result<Vec<InstanceEntry>, ConfigError> {
    const KEY: &str = "WATCHDOG_INSTANCES";

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for item in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let (key, secret) = item.split_once('=').ok_or(ConfigError::Invalid(KEY))?;
        let key = key.trim();

        if key.is_empty() || !seen.insert(key.to_string()) {
            return Err(ConfigError::Invalid(KEY));
        }
        // An instance would have to send the padding too; almost certainly a typo.
        if secret.trim() != secret {
            return Err(ConfigError::Invalid(KEY));
        }

        entries.push(InstanceEntry {
            key: key.to_string(),
            secret: (!secret.is_empty()).then(|| secret.to_string()),
        });
    }

    Ok(entries)
}
