use chrono::Duration;
use domain::models::OtpPolicy;
use domain::services::EdgeRuleTables;
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub edge_filter: EdgeFilterConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Send Strict-Transport-Security on every response.
    #[serde(default)]
    pub hsts: bool,
}

/// Edge request filter settings. The `extra_*` lists are appended to the
/// built-in tables.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    #[serde(default)]
    pub extra_blocked_extensions: Vec<String>,

    #[serde(default)]
    pub extra_blocked_paths: Vec<String>,

    #[serde(default)]
    pub extra_suspicious_queries: Vec<String>,

    #[serde(default)]
    pub extra_suspicious_headers: Vec<String>,

    #[serde(default)]
    pub extra_malicious_user_agents: Vec<String>,

    #[serde(default)]
    pub extra_flagged_user_agents: Vec<String>,

    #[serde(default)]
    pub extra_post_allowed_prefixes: Vec<String>,
}

impl Default for EdgeFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: default_max_body_bytes(),
            extra_blocked_extensions: Vec::new(),
            extra_blocked_paths: Vec::new(),
            extra_suspicious_queries: Vec::new(),
            extra_suspicious_headers: Vec::new(),
            extra_malicious_user_agents: Vec::new(),
            extra_flagged_user_agents: Vec::new(),
            extra_post_allowed_prefixes: Vec::new(),
        }
    }
}

impl EdgeFilterConfig {
    /// Built-in rule tables extended with the configured extras.
    pub fn rule_tables(&self) -> EdgeRuleTables {
        let mut tables = EdgeRuleTables {
            max_body_bytes: self.max_body_bytes,
            ..EdgeRuleTables::default()
        };
        tables.extend(&EdgeRuleTables {
            max_body_bytes: self.max_body_bytes,
            blocked_extensions: self.extra_blocked_extensions.clone(),
            blocked_path_patterns: self.extra_blocked_paths.clone(),
            suspicious_query_patterns: self.extra_suspicious_queries.clone(),
            suspicious_headers: self.extra_suspicious_headers.clone(),
            malicious_user_agents: self.extra_malicious_user_agents.clone(),
            flagged_user_agents: self.extra_flagged_user_agents.clone(),
            post_allowed_prefixes: self.extra_post_allowed_prefixes.clone(),
        });
        tables
    }
}

/// The single admin principal and login policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// The only address that can receive login codes.
    #[serde(default)]
    pub email: String,

    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,

    #[serde(default = "default_max_codes_per_window")]
    pub max_codes_per_window: i64,

    #[serde(default = "default_rate_window_minutes")]
    pub rate_window_minutes: i64,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            code_ttl_minutes: default_code_ttl_minutes(),
            max_codes_per_window: default_max_codes_per_window(),
            rate_window_minutes: default_rate_window_minutes(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl AdminConfig {
    pub fn policy(&self) -> OtpPolicy {
        OtpPolicy {
            code_ttl: Duration::minutes(self.code_ttl_minutes),
            max_codes_per_window: self.max_codes_per_window,
            rate_window: Duration::minutes(self.rate_window_minutes),
            session_ttl: Duration::hours(self.session_ttl_hours),
        }
    }
}

/// Transactional email settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: resend, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// API key for the HTTP provider
    #[serde(default)]
    pub api_key: String,

    /// Send endpoint of the HTTP provider
    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    #[serde(default = "default_email_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            api_key: String::new(),
            api_url: default_email_api_url(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            timeout_secs: default_email_timeout(),
        }
    }
}

/// Contact form settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// Where inquiry notifications go. Falls back to the admin email.
    #[serde(default)]
    pub recipient: String,

    /// Send an acknowledgement to the person who submitted the form.
    #[serde(default = "default_true")]
    pub send_confirmation: bool,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            send_confirmation: true,
        }
    }
}

/// Instagram thumbnail proxy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// Image resize service; receives `url`, `w` and `q` query parameters.
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,

    #[serde(default = "default_thumbnail_width")]
    pub default_width: u32,

    #[serde(default = "default_thumbnail_quality")]
    pub default_quality: u32,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,

    /// User agent sent when fetching post pages.
    #[serde(default = "default_fetch_user_agent")]
    pub user_agent: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            cdn_base: default_cdn_base(),
            default_width: default_thumbnail_width(),
            default_quality: default_thumbnail_quality(),
            fetch_timeout_secs: default_fetch_timeout(),
            cache_max_age_secs: default_cache_max_age(),
            user_agent: default_fetch_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Display name used in outgoing email.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Directory of the prebuilt static site served as the fallback route.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_auth_cleanup_minutes")]
    pub auth_cleanup_minutes: u64,

    #[serde(default = "default_pool_metrics_secs")]
    pub pool_metrics_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_cleanup_minutes: default_auth_cleanup_minutes(),
            pool_metrics_secs: default_pool_metrics_secs(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_max_body_bytes() -> u64 {
    domain::services::edge_filter::DEFAULT_MAX_BODY_BYTES
}
fn default_code_ttl_minutes() -> i64 {
    10
}
fn default_max_codes_per_window() -> i64 {
    5
}
fn default_rate_window_minutes() -> i64 {
    15
}
fn default_session_ttl_hours() -> i64 {
    24
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}
fn default_sender_email() -> String {
    "noreply@atelier.studio".to_string()
}
fn default_sender_name() -> String {
    "Atelier".to_string()
}
fn default_email_timeout() -> u64 {
    10
}
fn default_cdn_base() -> String {
    "https://images.weserv.nl/".to_string()
}
fn default_thumbnail_width() -> u32 {
    640
}
fn default_thumbnail_quality() -> u32 {
    75
}
fn default_fetch_timeout() -> u64 {
    8
}
fn default_cache_max_age() -> u64 {
    86_400
}
fn default_fetch_user_agent() -> String {
    "Mozilla/5.0 (compatible; AtelierThumbnailer/1.0)".to_string()
}
fn default_site_name() -> String {
    "Atelier".to_string()
}
fn default_static_dir() -> String {
    "public".to_string()
}
fn default_auth_cleanup_minutes() -> u64 {
    15
}
fn default_pool_metrics_secs() -> u64 {
    10
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ATELIER__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ATELIER").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = ""

            [logging]
            level = "info"
            format = "json"

            [admin]
            email = ""

            [email]
            enabled = false
            provider = "console"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ATELIER__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.admin.email.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ATELIER__ADMIN__EMAIL environment variable must be set".to_string(),
            ));
        }
        if !shared::validation::is_valid_email(&self.admin.email) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "admin.email is not a valid address: {}",
                self.admin.email
            )));
        }
        if !self.contact.recipient.is_empty()
            && !shared::validation::is_valid_email(&self.contact.recipient)
        {
            return Err(ConfigValidationError::InvalidValue(format!(
                "contact.recipient is not a valid address: {}",
                self.contact.recipient
            )));
        }

        if self.admin.code_ttl_minutes <= 0
            || self.admin.rate_window_minutes <= 0
            || self.admin.session_ttl_hours <= 0
            || self.admin.max_codes_per_window <= 0
        {
            return Err(ConfigValidationError::InvalidValue(
                "admin login policy values must be positive".to_string(),
            ));
        }

        match self.email.provider.as_str() {
            "console" => {}
            "resend" => {
                if self.email.enabled && self.email.api_key.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "email.api_key is required for the resend provider".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown email provider: {}",
                    other
                )));
            }
        }

        if reqwest::Url::parse(&self.thumbnails.cdn_base).is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "thumbnails.cdn_base is not an absolute URL: {}",
                self.thumbnails.cdn_base
            )));
        }

        Ok(())
    }

    /// Address that receives contact form notifications.
    pub fn contact_recipient(&self) -> &str {
        if self.contact.recipient.is_empty() {
            &self.admin.email
        } else {
            &self.contact.recipient
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
