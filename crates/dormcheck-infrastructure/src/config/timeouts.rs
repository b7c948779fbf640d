use std::time::Duration;

/// Timeouts for every outbound call the daemon makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Any single request to the attendance platform (default: 10 seconds)
    pub platform_request: Duration,

    /// Captcha recognition request (default: 30 seconds)
    pub captcha_request: Duration,

    /// SMTP connect + send (default: 30 seconds)
    pub smtp: Duration,

    /// TCP connect for HTTP clients (default: 5 seconds)
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            platform_request: Duration::from_secs(10),
            captcha_request: Duration::from_secs(30),
            smtp: Duration::from_secs(30),
            connect: Duration::from_secs(5),
        }
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform_request(mut self, duration: Duration) -> Self {
        self.platform_request = duration;
        self
    }

    pub fn with_captcha_request(mut self, duration: Duration) -> Self {
        self.captcha_request = duration;
        self
    }

    pub fn with_smtp(mut self, duration: Duration) -> Self {
        self.smtp = duration;
        self
    }

    /// Connect timeout never exceeds the request timeout it belongs to
    pub fn connect_for(&self, request: Duration) -> Duration {
        self.connect.min(request)
    }
}
