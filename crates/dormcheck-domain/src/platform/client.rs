use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::PlatformError;
use crate::session::CookieSet;
use crate::shared::AccountId;
use crate::task::GeoLocation;

/// Captcha image plus the cookies that bind the next login to it
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    image_data_uri: String,
    correlation: CookieSet,
}

impl CaptchaChallenge {
    pub const CORRELATION_COOKIES: [&'static str; 2] = ["Vlis", "VK_"];

    /// Keeps only the correlation cookies and fails unless both are present
    pub fn new(image_data_uri: String, cookies: &CookieSet) -> Result<Self, PlatformError> {
        let correlation = cookies.retain_names(&Self::CORRELATION_COOKIES);
        if correlation.len() < Self::CORRELATION_COOKIES.len() {
            return Err(PlatformError::MissingCorrelationCookies);
        }

        Ok(Self {
            image_data_uri,
            correlation,
        })
    }

    /// `data:image/png;base64,...`
    pub fn image_data_uri(&self) -> &str {
        &self.image_data_uri
    }

    pub fn correlation(&self) -> &CookieSet {
        &self.correlation
    }
}

/// Raw login response: JSON verdict plus every `Set-Cookie` header in order
#[derive(Debug, Clone, Default)]
pub struct LoginReply {
    pub is_ok: bool,
    pub message: String,
    pub set_cookie_headers: Vec<String>,
}

/// Activity as listed by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    /// Daily window start, e.g. `21:00`
    pub start_time: String,
    pub end_time: String,
    pub start_day: String,
    pub end_day: String,
    pub college_view: String,
    pub sign_task_view: String,
}

/// Sign-in submission payload
#[derive(Debug, Clone)]
pub struct SignInForm {
    pub activity_id: String,
    pub location: GeoLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInReply {
    pub is_ok: bool,
    pub message: String,
}

/// Wire operations against the attendance platform.
///
/// Implementations are stateless per call: cookies go in and come out
/// explicitly.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, PlatformError>;

    /// Submit encrypted credentials with the solved captcha
    async fn login(
        &self,
        account_id: &AccountId,
        secret: &str,
        captcha_code: &str,
        correlation: &CookieSet,
    ) -> Result<LoginReply, PlatformError>;

    async fn list_activities(&self, cookies: &CookieSet) -> Result<Vec<Activity>, PlatformError>;

    async fn submit_sign_in(
        &self,
        cookies: &CookieSet,
        form: &SignInForm,
    ) -> Result<SignInReply, PlatformError>;

    /// Name embedded in the profile page, `None` if it could not be found
    async fn fetch_display_name(&self, cookies: &CookieSet)
        -> Result<Option<String>, PlatformError>;
}

/// Turns a captcha image into a short text guess
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn recognize(&self, image_data_uri: &str) -> Result<String, PlatformError>;
}
