use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header;
use tracing::{debug, warn};

use super::{read_text, transport_error};
use dormcheck_domain::platform::PlatformError;
use dormcheck_domain::session::CookieSet;

static USER_NAME_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"var\s+userName\s*=\s*'([^']+)'").ok());

/// Name assigned to `userName` in the profile page's inline script
pub(super) fn extract_user_name(html: &str) -> Option<String> {
    USER_NAME_PATTERN
        .as_ref()?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

impl super::PlatformHttpClient {
    pub(super) async fn fetch_display_name_impl(
        &self,
        cookies: &CookieSet,
    ) -> Result<Option<String>, PlatformError> {
        const OP: &str = "Profile fetch";

        let response = self
            .client
            .get(&self.endpoints.profile_url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9")
            .header(header::COOKIE, cookies.to_header_value())
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;

        let html = read_text(OP, response).await?;

        match extract_user_name(&html) {
            Some(name) => {
                debug!("Profile name found: {}", name);
                Ok(Some(name))
            }
            None => {
                warn!("userName not found in profile page, cookies may be stale");
                Ok(None)
            }
        }
    }
}
