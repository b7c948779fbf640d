use reqwest::header;
use tracing::debug;

use super::types::{VerdictResponse, SIGN_IN_USER_AGENT};
use super::{read_text, transport_error};
use dormcheck_domain::platform::{PlatformError, SignInForm, SignInReply};
use dormcheck_domain::session::CookieSet;

impl super::PlatformHttpClient {
    pub(super) async fn submit_sign_in_impl(
        &self,
        cookies: &CookieSet,
        form: &SignInForm,
    ) -> Result<SignInReply, PlatformError> {
        const OP: &str = "Sign-in submit";

        let longitude = form.location.longitude_param();
        let latitude = form.location.latitude_param();
        let fields = [
            ("ActivityId", form.activity_id.as_str()),
            ("ReasonText", ""),
            ("guidValue", ""),
            ("address", form.location.address()),
            ("longitudeGaoDe", longitude.as_str()),
            ("latitudeGaoDe", latitude.as_str()),
            ("RType", "1"),
        ];

        let response = self
            .client
            .post(&self.endpoints.sign_in_url)
            .header(header::USER_AGENT, SIGN_IN_USER_AGENT)
            .header(header::COOKIE, cookies.to_header_value())
            .form(&fields)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;

        let body = read_text(OP, response).await?;
        debug!("Sign-in response for activity {}: {}", form.activity_id, body);

        let verdict: VerdictResponse = serde_json::from_str(&body)
            .map_err(|e| PlatformError::Protocol(format!("sign-in response is not JSON: {e}")))?;

        Ok(SignInReply {
            is_ok: verdict.isok,
            message: verdict.message(),
        })
    }
}
