/// Pulls the platform session token out of a login response's `Set-Cookie` headers.
///
/// The platform sends `ct_vali` twice and only the second one is a live
/// token. The first is discarded.
pub struct SessionTokenExtractor;

impl SessionTokenExtractor {
    pub const COOKIE_NAME: &'static str = "ct_vali";

    /// Value of the second `ct_vali=` header, up to the first `;`
    pub fn extract<S: AsRef<str>>(set_cookie_headers: &[S]) -> Option<String> {
        let prefix = format!("{}=", Self::COOKIE_NAME);

        set_cookie_headers
            .iter()
            .map(|header| -> &str { header.as_ref() })
            .filter(|header| header.starts_with(&prefix))
            .nth(1)
            .map(|header| {
                let pair = header.split(';').next().unwrap_or(header);
                pair[prefix.len()..].to_string()
            })
            .filter(|value| !value.is_empty())
    }
}
