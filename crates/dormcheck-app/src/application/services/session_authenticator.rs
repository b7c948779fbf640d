use std::sync::Arc;
use tracing::{debug, info, warn};

use dormcheck_domain::platform::{CaptchaSolver, PlatformClient, PlatformError};
use dormcheck_domain::session::{CookieSet, SessionTokenExtractor};
use dormcheck_domain::AccountId;

/// Captcha + encrypted login against the platform, producing the session cookie set
pub struct SessionAuthenticator {
    platform: Arc<dyn PlatformClient>,
    solver: Arc<dyn CaptchaSolver>,
}

impl SessionAuthenticator {
    /// Login attempts per call. Only a captcha mismatch consumes another attempt.
    pub const MAX_ATTEMPTS: u32 = 3;

    pub fn new(platform: Arc<dyn PlatformClient>, solver: Arc<dyn CaptchaSolver>) -> Self {
        Self { platform, solver }
    }

    pub async fn authenticate(
        &self,
        account_id: &AccountId,
        secret: &str,
    ) -> Result<CookieSet, PlatformError> {
        let mut last_error = PlatformError::CaptchaMismatch("no attempt made".to_string());

        for attempt in 1..=Self::MAX_ATTEMPTS {
            match self.attempt(account_id, secret).await {
                Ok(cookies) => {
                    info!("[{}] Login succeeded on attempt {}", account_id, attempt);
                    return Ok(cookies);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        "[{}] Captcha rejected (attempt {}/{}): {}",
                        account_id,
                        attempt,
                        Self::MAX_ATTEMPTS,
                        e
                    );
                    last_error = e;
                }
                Err(e) => {
                    warn!("[{}] Login failed: {}", account_id, e);
                    return Err(e);
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, account_id: &AccountId, secret: &str) -> Result<CookieSet, PlatformError> {
        let challenge = self.platform.fetch_captcha().await?;
        let guess = self.solver.recognize(challenge.image_data_uri()).await?;
        debug!("[{}] Submitting login with captcha guess {}", account_id, guess);

        let reply = self
            .platform
            .login(account_id, secret, &guess, challenge.correlation())
            .await?;

        if !reply.is_ok {
            return Err(PlatformError::from_login_message(&reply.message));
        }

        let token = SessionTokenExtractor::extract(&reply.set_cookie_headers)
            .ok_or(PlatformError::MissingSessionCookie)?;

        Ok(Self::session_cookies(account_id, token))
    }

    /// The cookie set the platform expects on authenticated calls
    fn session_cookies(account_id: &AccountId, token: String) -> CookieSet {
        CookieSet::from_pairs([
            ("qyuserid".to_string(), account_id.as_str().to_string()),
            ("utpstr".to_string(), "1".to_string()),
            (SessionTokenExtractor::COOKIE_NAME.to_string(), token),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{FakePlatform, MockSolver};
    use dormcheck_domain::platform::LoginReply;

    fn account() -> AccountId {
        AccountId::new("2023001").unwrap()
    }

    fn solver_returning(guess: &'static str) -> MockSolver {
        let mut solver = MockSolver::new();
        solver
            .expect_recognize()
            .returning(move |_| Ok(guess.to_string()));
        solver
    }

    #[tokio::test]
    async fn test_success_builds_session_cookies() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_login(FakePlatform::login_ok("TOKEN"));
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver_returning("AB3D")));

        let cookies = auth.authenticate(&account(), "pw").await.unwrap();

        assert_eq!(cookies.to_string(), "qyuserid=2023001; utpstr=1; ct_vali=TOKEN");
        let logins = platform.logins();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].captcha_code, "AB3D");
        assert_eq!(logins[0].correlation.get("Vlis"), Some("v"));
        assert_eq!(logins[0].correlation.get("VK_"), Some("k"));
    }

    #[tokio::test]
    async fn test_captcha_mismatch_is_retried() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_login(FakePlatform::login_rejected("验证码错误"));
        platform.push_login(FakePlatform::login_ok("TOKEN"));
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver_returning("abcd")));

        assert!(auth.authenticate(&account(), "pw").await.is_ok());
        assert_eq!(platform.captcha_fetches(), 2);
    }

    #[tokio::test]
    async fn test_captcha_mismatch_gives_up_after_three_attempts() {
        let platform = Arc::new(FakePlatform::new());
        for _ in 0..4 {
            platform.push_login(FakePlatform::login_rejected("验证码错误"));
        }
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver_returning("abcd")));

        let err = auth.authenticate(&account(), "pw").await.unwrap_err();

        assert!(matches!(err, PlatformError::CaptchaMismatch(_)));
        assert_eq!(platform.logins().len(), 3);
    }

    #[tokio::test]
    async fn test_business_rejection_is_terminal() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_login(FakePlatform::login_rejected("用户名或密码错误"));
        platform.push_login(FakePlatform::login_ok("TOKEN"));
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver_returning("abcd")));

        let err = auth.authenticate(&account(), "pw").await.unwrap_err();

        assert_eq!(err, PlatformError::Rejected("用户名或密码错误".to_string()));
        assert_eq!(platform.logins().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_correlation_cookies_skips_login() {
        let platform = Arc::new(FakePlatform::new());
        platform.set_captcha_cookies(&[("Vlis", "v")]);
        let mut solver = MockSolver::new();
        solver.expect_recognize().never();
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver));

        let err = auth.authenticate(&account(), "pw").await.unwrap_err();

        assert_eq!(err, PlatformError::MissingCorrelationCookies);
        assert!(platform.logins().is_empty());
    }

    #[tokio::test]
    async fn test_single_session_cookie_is_not_enough() {
        let platform = Arc::new(FakePlatform::new());
        platform.push_login(LoginReply {
            is_ok: true,
            message: "登录成功".to_string(),
            set_cookie_headers: vec!["ct_vali=only-one; path=/".to_string()],
        });
        let auth = SessionAuthenticator::new(platform, Arc::new(solver_returning("abcd")));

        let err = auth.authenticate(&account(), "pw").await.unwrap_err();

        assert_eq!(err, PlatformError::MissingSessionCookie);
        assert_eq!(err.to_string(), "no valid session cookie");
    }

    #[tokio::test]
    async fn test_unreadable_captcha_is_terminal() {
        let platform = Arc::new(FakePlatform::new());
        let mut solver = MockSolver::new();
        solver
            .expect_recognize()
            .times(1)
            .returning(|_| Err(PlatformError::CaptchaUnreadable("empty".to_string())));
        let auth = SessionAuthenticator::new(platform.clone(), Arc::new(solver));

        let err = auth.authenticate(&account(), "pw").await.unwrap_err();

        assert!(matches!(err, PlatformError::CaptchaUnreadable(_)));
        assert!(platform.logins().is_empty());
    }
}
