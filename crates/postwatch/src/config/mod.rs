use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Boards watched when `WATCH_SOURCES` is not set.
pub const DEFAULT_SOURCES: [&str; 2] = [
    "vanshb03/Summer2026-Internships",
    "SimplifyJobs/Summer2026-Internships",
];

const DEFAULT_STATE_FILE: &str = "jobs.json";
const DEFAULT_INTERVAL_SECS: u64 = 600;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub watch: WatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            watch: WatchConfig::from_env()?,
        })
    }
}

/// Settings controlling the status server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for the poll cycle and its collaborators.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// `owner/repo` identifiers of the boards to watch.
    pub sources: Vec<String>,
    /// Where the snapshot of previously seen postings is persisted.
    pub state_file: PathBuf,
    /// Delay between poll cycles.
    pub interval: Duration,
    /// Optional token for the source-control API; public boards work without one.
    pub github_token: Option<String>,
    /// Webhook receiving notifications. Required to run the notifier,
    /// not required for offline extraction.
    pub discord_webhook_url: Option<String>,
}

impl WatchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sources = match env::var("WATCH_SOURCES") {
            Ok(raw) => {
                let sources: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|source| !source.is_empty())
                    .map(str::to_string)
                    .collect();
                if sources.is_empty() {
                    return Err(ConfigError::EmptySources);
                }
                sources
            }
            Err(_) => DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
        };

        let state_file = env::var("WATCH_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE));

        let interval_secs = env::var("WATCH_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidInterval)?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        Ok(Self {
            sources,
            state_file,
            interval: Duration::from_secs(interval_secs),
            github_token: non_empty_var("GITHUB_TOKEN"),
            discord_webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidInterval,
    EmptySources,
    MissingWebhook,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidInterval => {
                write!(f, "WATCH_INTERVAL_SECS must be a positive integer number of seconds")
            }
            ConfigError::EmptySources => {
                write!(f, "WATCH_SOURCES is set but contains no source identifiers")
            }
            ConfigError::MissingWebhook => {
                write!(f, "DISCORD_WEBHOOK_URL must be set to deliver notifications")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
