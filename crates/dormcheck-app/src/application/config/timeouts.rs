use serde::{Deserialize, Serialize};
use std::time::Duration;

use dormcheck_infrastructure::config::TimeoutConfig;

/// Outbound call timeouts as written in the config file, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub platform_request_secs: u64,
    pub captcha_request_secs: u64,
    pub smtp_secs: u64,
    pub connect_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let defaults = TimeoutConfig::default();
        Self {
            platform_request_secs: defaults.platform_request.as_secs(),
            captcha_request_secs: defaults.captcha_request.as_secs(),
            smtp_secs: defaults.smtp.as_secs(),
            connect_secs: defaults.connect.as_secs(),
        }
    }
}

impl TimeoutSettings {
    /// Zero values are raised to one second so no call runs unbounded
    pub fn to_timeout_config(&self) -> TimeoutConfig {
        let secs = |value: u64| Duration::from_secs(value.max(1));

        let mut config = TimeoutConfig::new()
            .with_platform_request(secs(self.platform_request_secs))
            .with_captcha_request(secs(self.captcha_request_secs))
            .with_smtp(secs(self.smtp_secs));
        config.connect = secs(self.connect_secs);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_infrastructure() {
        assert_eq!(TimeoutSettings::default().to_timeout_config(), TimeoutConfig::default());
    }

    #[test]
    fn test_zero_is_raised() {
        let settings = TimeoutSettings {
            platform_request_secs: 0,
            ..TimeoutSettings::default()
        };

        assert_eq!(
            settings.to_timeout_config().platform_request,
            Duration::from_secs(1)
        );
    }
}
