mod activities;
mod captcha;
mod endpoints;
mod login;
mod profile;
mod sign_in;
mod types;

pub use endpoints::PlatformEndpoints;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::config::TimeoutConfig;
use crate::security::CredentialCipher;
use dormcheck_domain::platform::{
    Activity, CaptchaChallenge, LoginReply, PlatformClient, PlatformError, SignInForm,
    SignInReply,
};
use dormcheck_domain::session::CookieSet;
use dormcheck_domain::shared::AccountId;
use types::BROWSER_USER_AGENT;

/// reqwest implementation of the platform wire contract.
///
/// No cookie store: every call carries its cookies explicitly so one client
/// can serve every account.
pub struct PlatformHttpClient {
    pub(super) client: Client,
    pub(super) endpoints: PlatformEndpoints,
    pub(super) cipher: CredentialCipher,
}

impl PlatformHttpClient {
    pub fn new(endpoints: PlatformEndpoints, timeouts: &TimeoutConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeouts.platform_request)
            .connect_timeout(timeouts.connect_for(timeouts.platform_request))
            .build()
            .map_err(|e| PlatformError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints,
            cipher: CredentialCipher::platform()?,
        })
    }

    pub fn endpoints(&self) -> &PlatformEndpoints {
        &self.endpoints
    }
}

pub(super) fn transport_error(operation: &str, err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Transport(format!("{operation} timed out"))
    } else {
        PlatformError::Transport(format!("{operation}: {err}"))
    }
}

/// Body text of a 2xx response; anything else is a transport failure
pub(super) async fn read_text(operation: &str, response: Response) -> Result<String, PlatformError> {
    let status = response.status();
    if !status.is_success() {
        return Err(PlatformError::Transport(format!(
            "{operation} returned HTTP {status}"
        )));
    }

    response
        .text()
        .await
        .map_err(|e| transport_error(operation, e))
}

#[async_trait]
impl PlatformClient for PlatformHttpClient {
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, PlatformError> {
        self.fetch_captcha_impl().await
    }

    async fn login(
        &self,
        account_id: &AccountId,
        secret: &str,
        captcha_code: &str,
        correlation: &CookieSet,
    ) -> Result<LoginReply, PlatformError> {
        self.login_impl(account_id, secret, captcha_code, correlation)
            .await
    }

    async fn list_activities(&self, cookies: &CookieSet) -> Result<Vec<Activity>, PlatformError> {
        self.list_activities_impl(cookies).await
    }

    async fn submit_sign_in(
        &self,
        cookies: &CookieSet,
        form: &SignInForm,
    ) -> Result<SignInReply, PlatformError> {
        self.submit_sign_in_impl(cookies, form).await
    }

    async fn fetch_display_name(
        &self,
        cookies: &CookieSet,
    ) -> Result<Option<String>, PlatformError> {
        self.fetch_display_name_impl(cookies).await
    }
}
