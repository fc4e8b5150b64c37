use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_delivery_base_url")]
    pub delivery_base_url: String,

    #[serde(default)]
    pub cloud_name: String,

    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,

    #[serde(default = "default_upload_folder")]
    pub upload_folder: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_lossy_quality")]
    pub lossy_quality: u8,

    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    #[serde(default = "default_max_pending_downloads")]
    pub max_pending_downloads: usize,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,

    #[serde(default = "default_download_ttl")]
    pub download_ttl_minutes: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Image-Studio".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_delivery_base_url() -> String {
    "https://res.cloudinary.com".to_string()
}
fn default_upload_preset() -> String {
    "studio_unsigned".to_string()
}
fn default_upload_folder() -> String {
    "user_uploads".to_string()
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_lossy_quality() -> u8 {
    90
}
fn default_archive_name() -> String {
    "images.zip".to_string()
}
fn default_max_pending_downloads() -> usize {
    256
}
fn default_session_ttl() -> u64 {
    120
}
fn default_download_ttl() -> u64 {
    10
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").prefix_separator("_").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;
        config.cloud_name = fill_or_env(config.cloud_name, "APP_CLOUD_NAME")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.cloud_name.trim().is_empty() {
            errors.push("CLOUD_NAME cannot be empty");
        }
        if url::Url::parse(&self.delivery_base_url).is_err() {
            errors.push("DELIVERY_BASE_URL must be an absolute URL");
        }
        if !(1..=100).contains(&self.lossy_quality) {
            errors.push("LOSSY_QUALITY must be between 1 and 100");
        }
        if self.archive_name.trim().is_empty() {
            errors.push("ARCHIVE_NAME cannot be empty");
        }
        if self.max_pending_downloads == 0 {
            errors.push("MAX_PENDING_DOWNLOADS must be positive");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }

    pub fn download_ttl(&self) -> Duration {
        Duration::from_secs(self.download_ttl_minutes.saturating_mul(60))
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "studio".into(),
            port: 0,
            host: "127.0.0.1".into(),
            worker_count: 1,
            cors_allowed_origins: vec!["https://a.example.com, https://b.example.com".into()],
            delivery_base_url: default_delivery_base_url(),
            cloud_name: "demo".into(),
            upload_preset: default_upload_preset(),
            upload_folder: default_upload_folder(),
            fetch_timeout_secs: 5,
            lossy_quality: 90,
            archive_name: default_archive_name(),
            max_pending_downloads: 8,
            session_ttl_minutes: 1,
            download_ttl_minutes: 1,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn cors_origins_split_on_commas() {
        assert_eq!(
            config().cors_origins(),
            ["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn collects_every_problem() {
        let broken = AppConfig {
            cloud_name: " ".into(),
            delivery_base_url: "not a url".into(),
            lossy_quality: 0,
            ..config()
        };

        let message = broken.validate().unwrap_err().to_string();
        assert!(message.contains("CLOUD_NAME"));
        assert!(message.contains("DELIVERY_BASE_URL"));
        assert!(message.contains("LOSSY_QUALITY"));
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let prod = AppConfig {
            env: AppEnvironment::Production,
            cors_allowed_origins: vec!["*".into()],
            ..config()
        };

        assert!(prod.validate().is_err());
    }

    #[test]
    fn huge_ttls_saturate() {
        let cfg = AppConfig {
            session_ttl_minutes: u64::MAX,
            download_ttl_minutes: u64::MAX / 2,
            ..config()
        };

        assert_eq!(cfg.session_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(cfg.download_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(config().session_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn environment_names_round_trip() {
        assert_eq!("Production".parse::<AppEnvironment>().unwrap(), AppEnvironment::Production);
        assert_eq!(AppEnvironment::Testing.to_string(), "testing");
        assert!("staging".parse::<AppEnvironment>().is_err());
    }
}
