// Application configuration
// Everything the service needs from the environment, loaded once at start-up

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which GUID column of `department_certificate_types` is sent to the inventory system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEnvironment {
    Production,
    Staging,
}

impl FromStr for InventoryEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(InventoryEnvironment::Production),
            "staging" => Ok(InventoryEnvironment::Staging),
            _ => Err(format!("Invalid inventory environment: {}", s)),
        }
    }
}

/// Connection settings for the IBS web member SOAP API
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub endpoint: String,
    pub user: String,
    pub password: String,
    pub namespace: String,
    pub timeout: Duration,
    pub environment: InventoryEnvironment,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub debug: bool,

    /// Maximum number of line items in one batch
    pub batch_limit: usize,
    pub default_membership_number: String,
    pub default_employee_number: String,

    pub site_url: String,
    pub email_from: String,
    pub email_delay: Duration,
    /// How often the delivery worker looks for due emails
    pub delivery_poll_interval: Duration,
    pub mail_relay_url: Option<String>,

    pub inventory: InventoryConfig,

    pub ip_whitelist_enabled: bool,
    pub ip_whitelist: Vec<IpAddr>,

    pub static_root: PathBuf,
    pub media_root: PathBuf,

    /// Sustained downloads per second per client address, 0 disables the limit
    pub download_rate_per_second: u64,
    pub download_rate_burst: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// `dotenv` should already have been applied by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ip_whitelist = optional("GIFT_CERTIFICATE_IP_WHITELIST")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(|ip| {
                        ip.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                            name: "GIFT_CERTIFICATE_IP_WHITELIST",
                            value: ip.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080)?,
            redis_url: optional("REDIS_URL"),
            jwt_secret: required("JWT_SECRET")?,
            debug: parsed("DEBUG", false)?,
            batch_limit: parsed("CERTIFICATES_BATCH_LIMIT", 150)?,
            default_membership_number: required("DEFAULT_CERTIFICATE_MEMBERSHIP_NUMBER")?,
            default_employee_number: required("DEFAULT_CERTIFICATE_EMPLOYEE_NUMBER")?,
            site_url: required("GIFT_CERTIFICATE_SITE_URL")?,
            email_from: required("GIFT_CERTIFICATE_EMAIL_ADDRESS")?,
            email_delay: Duration::from_secs(parsed("GIFT_CERTIFICATE_EMAIL_DELAY_SECS", 300)?),
            delivery_poll_interval: Duration::from_secs(parsed::<u64>("DELIVERY_POLL_INTERVAL_SECS", 15)?.max(1)),
            mail_relay_url: optional("MAIL_RELAY_URL"),
            inventory: InventoryConfig {
                endpoint: required("IBS_API_URL")?,
                user: required("IBS_API_USER")?,
                password: required("IBS_API_PASSWORD")?,
                namespace: optional("IBS_API_NAMESPACE")
                    .unwrap_or_else(|| "http://ibsinc.com/".to_string()),
                timeout: Duration::from_secs(parsed("IBS_API_TIMEOUT_SECS", 30)?),
                environment: parsed("IBS_ENVIRONMENT", InventoryEnvironment::Production)?,
            },
            ip_whitelist_enabled: parsed("GIFT_CERTIFICATE_IP_WHITELIST_ENABLED", false)?,
            ip_whitelist,
            static_root: optional("STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./assets")),
            media_root: optional("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            download_rate_per_second: parsed("DOWNLOAD_RATE_PER_SECOND", 2)?,
            download_rate_burst: parsed("DOWNLOAD_RATE_BURST", 10)?,
        })
    }

    /// Interval after which one download token is replenished
    ///
    /// The governor counts quota in replenish intervals, not requests per second.
    pub fn download_replenish_interval(&self) -> Option<Duration> {
        match self.download_rate_per_second {
            0 => None,
            rate => Some(Duration::from_millis((1000 / rate).max(1))),
        }
    }

    /// Absolute download link for a signed batch reference
    pub fn download_url(&self, download_ref: &str) -> String {
        format!("{}/download/{}/", self.site_url.trim_end_matches('/'), download_ref)
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    /// Configuration used by unit and handler tests
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/gift_certificates_test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            redis_url: None,
            jwt_secret: "test-secret".to_string(),
            debug: false,
            batch_limit: 150,
            default_membership_number: "0000000".to_string(),
            default_employee_number: "9999".to_string(),
            site_url: "https://gc.example.com/".to_string(),
            email_from: "certificates@example.com".to_string(),
            email_delay: Duration::from_millis(0),
            delivery_poll_interval: Duration::from_secs(1),
            mail_relay_url: None,
            inventory: InventoryConfig {
                endpoint: "http://ibs.invalid/webmember.asmx".to_string(),
                user: "user".to_string(),
                password: "password".to_string(),
                namespace: "http://ibsinc.com/".to_string(),
                timeout: Duration::from_secs(1),
                environment: InventoryEnvironment::Production,
            },
            ip_whitelist_enabled: false,
            ip_whitelist: Vec::new(),
            static_root: PathBuf::from("./assets"),
            media_root: PathBuf::from("./media"),
            download_rate_per_second: 2,
            download_rate_burst: 10,
        }
    }
}
