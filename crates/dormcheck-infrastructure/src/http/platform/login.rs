use reqwest::header;
use tracing::debug;

use super::types::VerdictResponse;
use super::{read_text, transport_error};
use dormcheck_domain::platform::{LoginReply, PlatformError};
use dormcheck_domain::session::CookieSet;
use dormcheck_domain::shared::AccountId;

impl super::PlatformHttpClient {
    /// POST the login form. Username and password are RSA encrypted separately.
    pub(super) async fn login_impl(
        &self,
        account_id: &AccountId,
        secret: &str,
        captcha_code: &str,
        correlation: &CookieSet,
    ) -> Result<LoginReply, PlatformError> {
        const OP: &str = "Login";

        let user_name = self.cipher.encrypt(account_id.as_str())?;
        let password = self.cipher.encrypt(secret)?;
        let val_code = captcha_code.to_lowercase();

        let form = [
            ("LoginType", "0"),
            ("UserName", user_name.as_str()),
            ("Password", password.as_str()),
            ("Remember", "true"),
            ("ValCode", val_code.as_str()),
            ("IsShowValCode", "true"),
        ];

        let mut request = self.client.post(&self.endpoints.login_url).form(&form);
        if !correlation.is_empty() {
            request = request.header(header::COOKIE, correlation.to_header_value());
        }

        let response = request.send().await.map_err(|e| transport_error(OP, e))?;

        let set_cookie_headers: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = read_text(OP, response).await?;
        debug!("Login response for {}: {}", account_id, body);

        let verdict: VerdictResponse = serde_json::from_str(&body)
            .map_err(|e| PlatformError::Protocol(format!("login response is not JSON: {e}")))?;

        Ok(LoginReply {
            is_ok: verdict.isok,
            message: verdict.message(),
            set_cookie_headers,
        })
    }
}
