use reqwest::header;

use super::types::ActivityListResponse;
use super::{read_text, transport_error};
use dormcheck_domain::platform::{Activity, PlatformError};
use dormcheck_domain::session::CookieSet;

impl super::PlatformHttpClient {
    pub(super) async fn list_activities_impl(
        &self,
        cookies: &CookieSet,
    ) -> Result<Vec<Activity>, PlatformError> {
        const OP: &str = "Activity list";

        let response = self
            .client
            .post(&self.endpoints.activity_list_url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, cookies.to_header_value())
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;

        let body = read_text(OP, response).await?;

        // An expired session gets the HTML login page instead of JSON
        let parsed: ActivityListResponse = serde_json::from_str(&body).map_err(|e| {
            PlatformError::Protocol(format!("activity list is not JSON (session expired?): {e}"))
        })?;

        Ok(parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Activity::from)
            .collect())
    }
}
