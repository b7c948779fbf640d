use serde::{Deserialize, Serialize};

use dormcheck_domain::session::Session;

/// Bound account as shown to its owner. Secret and cookies stay server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub account_id: String,
    pub display_name: String,
    pub last_login_at: String,
    pub has_cookies: bool,
}

impl From<&Session> for SessionDto {
    fn from(session: &Session) -> Self {
        Self {
            account_id: session.account_id().to_string(),
            display_name: session.display_name().to_string(),
            last_login_at: session.last_login_at().to_rfc3339(),
            has_cookies: session.is_usable(),
        }
    }
}
