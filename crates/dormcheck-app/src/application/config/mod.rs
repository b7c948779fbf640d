mod schedule;
mod timeouts;

pub use schedule::ScheduleConfig;
pub use timeouts::TimeoutSettings;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use dormcheck_infrastructure::captcha::DashScopeConfig;
use dormcheck_infrastructure::http::PlatformEndpoints;
use dormcheck_infrastructure::notification::SmtpSettings;

pub const CONFIG_PATH_ENV: &str = "DORMCHECK_CONFIG";
pub const DASHSCOPE_API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
pub const MASTER_PASSWORD_ENV: &str = "DORMCHECK_MASTER_PASSWORD";
pub const SMTP_PASSWORD_ENV: &str = "DORMCHECK_SMTP_PASSWORD";

const DEFAULT_CONFIG_PATH: &str = "./dormcheck.json";

/// Log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Daemon configuration, read from a JSON file with secrets taken from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database, salt file and logs live here
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
    pub platform: PlatformEndpoints,
    pub captcha: DashScopeConfig,
    /// Without this section result emails are not sent
    pub smtp: Option<SmtpSettings>,
    pub schedule: ScheduleConfig,
    pub timeouts: TimeoutSettings,
    #[serde(skip)]
    pub master_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: LogLevel::default(),
            platform: PlatformEndpoints::default(),
            captcha: DashScopeConfig::default(),
            smtp: None,
            schedule: ScheduleConfig::default(),
            timeouts: TimeoutSettings::default(),
            master_password: String::new(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("dormcheck"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

impl AppConfig {
    /// `explicit`, else `DORMCHECK_CONFIG`, else `./dormcheck.json`
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    /// Load `path` with secrets from the process environment
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from(path, |key| std::env::var(key).ok())
    }

    /// A missing file yields defaults; secrets always come from `env`
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<AppConfig>(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            AppConfig::default()
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty(DASHSCOPE_API_KEY_ENV) {
            self.captcha.api_key = key;
        }
        if let Some(password) = non_empty(MASTER_PASSWORD_ENV) {
            self.master_password = password;
        }
        if let (Some(smtp), Some(password)) = (self.smtp.as_mut(), non_empty(SMTP_PASSWORD_ENV)) {
            smtp.password = password;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.captcha.api_key.trim().is_empty() {
            bail!("{} is not set", DASHSCOPE_API_KEY_ENV);
        }
        if self.master_password.is_empty() {
            bail!("{} is not set", MASTER_PASSWORD_ENV);
        }
        if let Some(smtp) = &self.smtp {
            if !smtp.is_configured() {
                bail!("smtp section needs both host and username");
            }
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("dormcheck.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
