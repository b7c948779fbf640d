use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use tracing::debug;
use url::Url;

use super::transport_error;
use dormcheck_domain::platform::{CaptchaChallenge, PlatformError};
use dormcheck_domain::session::CookieSet;

/// Append the cache-busting `v` parameter, keeping any existing query
fn stamped_url(base: &str, millis: i64) -> Result<Url, PlatformError> {
    let mut url = Url::parse(base)
        .map_err(|e| PlatformError::Protocol(format!("invalid captcha url '{base}': {e}")))?;
    url.query_pairs_mut().append_pair("v", &millis.to_string());
    Ok(url)
}

impl super::PlatformHttpClient {
    /// GET a fresh captcha, stamped with the current millisecond time
    pub(super) async fn fetch_captcha_impl(&self) -> Result<CaptchaChallenge, PlatformError> {
        const OP: &str = "Captcha fetch";

        let url = stamped_url(&self.endpoints.captcha_url, Utc::now().timestamp_millis())?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Transport(format!("{OP} returned HTTP {status}")));
        }

        // Read cookies before the body consumes the response
        let cookies = CookieSet::from_pairs(
            response
                .cookies()
                .map(|c| (c.name().to_string(), c.value().to_string())),
        );

        let image = response
            .bytes()
            .await
            .map_err(|e| transport_error(OP, e))?;
        if image.is_empty() {
            return Err(PlatformError::Protocol("captcha image is empty".to_string()));
        }

        debug!(
            "Captcha fetched: {} bytes, cookies: {:?}",
            image.len(),
            cookies.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );

        let data_uri = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&image)
        );

        CaptchaChallenge::new(data_uri, &cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamped_url() {
        let url = stamped_url("http://plat.example/Authentication/GetValidateCode", 1700000000123).unwrap();
        assert_eq!(
            url.as_str(),
            "http://plat.example/Authentication/GetValidateCode?v=1700000000123"
        );

        let url = stamped_url("http://plat.example/code?t=1", 5).unwrap();
        assert_eq!(url.query(), Some("t=1&v=5"));
    }

    #[test]
    fn test_stamped_url_rejects_garbage() {
        assert!(matches!(stamped_url("not a url", 1), Err(PlatformError::Protocol(_))));
    }
}
